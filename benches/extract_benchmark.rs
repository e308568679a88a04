// benches/extract_benchmark.rs
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use segnrrd_rs::*;

fn sample(edge: usize) -> (Segmentation, VoxelModel) {
    let sizes = [edge, edge, edge];
    let mut layer = LabelLayer::zeros(sizes);
    for k in 0..edge {
        for j in 0..edge {
            for i in 0..edge {
                layer.set([i, j, k], ((i * 5) / edge) as u32 + 1);
            }
        }
    }
    let segments = (1..=5u32)
        .map(|label| {
            let mut segment = Segment::new(format!("Segment_{label}"), format!("organ {label}"))
                .with_label_value(label);
            segment.extent = layer.compute_extent(label);
            segment
        })
        .collect();
    let segmentation = Segmentation::new(segments, Geometry::identity(sizes)).unwrap();
    let voxels = VoxelModel::from_layers(sizes, VoxelType::U8, vec![layer]).unwrap();
    (segmentation, voxels)
}

fn benchmark_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_segments");

    for edge in [32usize, 64, 128].iter() {
        let (segmentation, voxels) = sample(*edge);
        group.throughput(Throughput::Elements((edge * edge * edge) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(edge), edge, |b, _| {
            b.iter(|| extract_segments(&segmentation, &voxels, &["organ 2", "organ 5"]).unwrap());
        });
    }

    group.finish();
}

fn benchmark_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_segmentation");
    let dir = tempfile::tempdir().unwrap();

    for (name, options) in [("raw", WriteOptions::raw()), ("gzip", WriteOptions::default())] {
        let (segmentation, voxels) = sample(96);
        let path = dir.path().join(format!("{name}.seg.nrrd"));
        write_segmentation(&path, &segmentation, &voxels, &options).unwrap();

        group.throughput(Throughput::Elements(96 * 96 * 96));
        group.bench_function(BenchmarkId::new("full", name), |b| {
            b.iter(|| read_segmentation(&path, None).unwrap());
        });
        group.bench_function(BenchmarkId::new("info", name), |b| {
            b.iter(|| read_segmentation_info(&path).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_extract, benchmark_read);
criterion_main!(benches);
