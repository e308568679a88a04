// tests/property_tests.rs
use proptest::prelude::*;
use segnrrd_rs::*;
use std::io::Cursor;

fn volume() -> impl Strategy<Value = ([usize; 3], Vec<u32>)> {
    (1usize..6, 1usize..6, 1usize..5).prop_flat_map(|(x, y, z)| {
        let len = x * y * z;
        (Just([x, y, z]), prop::collection::vec(0u32..4, len))
    })
}

fn options() -> impl Strategy<Value = WriteOptions> {
    (
        prop_oneof![Just(Encoding::Raw), Just(Encoding::Gzip)],
        prop_oneof![Just(Endian::Little), Just(Endian::Big)],
        prop_oneof![
            Just(VoxelType::U8),
            Just(VoxelType::I16),
            Just(VoxelType::U32),
            Just(VoxelType::I64)
        ],
    )
        .prop_map(|(encoding, endian, voxel_type)| {
            WriteOptions::default()
                .with_encoding(encoding)
                .with_endian(endian)
                .with_voxel_type(voxel_type)
        })
}

/// Labels 1..=3 of a single layer, each as its own named segment
fn sample(sizes: [usize; 3], values: Vec<u32>) -> (Segmentation, VoxelModel) {
    let layer = LabelLayer::from_vec(sizes, values).unwrap();
    let segments = (1..=3u32)
        .map(|label| {
            let mut segment = Segment::new(format!("Segment_{label}"), format!("organ {label}"))
                .with_label_value(label)
                .with_color(Color::new(label as f64 / 3.0, 0.5, 1.0 - label as f64 / 4.0));
            segment.extent = Some(layer.compute_extent(label).unwrap_or(Extent::new([0, -1, 0, -1, 0, -1])));
            segment
        })
        .collect();
    let geometry = Geometry::new(
        sizes,
        [0.7, 1.1, 2.5],
        [[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]],
        [-12.25, 3.0, 40.5],
    );
    let segmentation = Segmentation::new(segments, geometry).unwrap();
    let voxels = VoxelModel::from_layers(sizes, VoxelType::U8, vec![layer]).unwrap();
    (segmentation, voxels)
}

fn write_to_memory(segmentation: &Segmentation, voxels: &VoxelModel, options: WriteOptions) -> Vec<u8> {
    let mut writer = SegmentationWriter::new(Vec::new(), options);
    writer.write(segmentation, voxels).unwrap();
    writer.into_inner()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_write_read_roundtrip((sizes, values) in volume(), options in options()) {
        let (segmentation, voxels) = sample(sizes, values);
        let bytes = write_to_memory(&segmentation, &voxels, options);

        let mut reader = SegmentationReader::new(Cursor::new(bytes)).unwrap();
        prop_assert_eq!(reader.segmentation().unwrap(), segmentation);
        prop_assert_eq!(reader.header().layout.voxel_type, options.voxel_type.unwrap());
        let read = reader.load_voxels().unwrap();
        prop_assert_eq!(read.layers(), voxels.layers());
    }

    #[test]
    fn prop_extracted_mask_matches_source((sizes, values) in volume(), label in 1u32..4) {
        let (segmentation, voxels) = sample(sizes, values);
        let name = format!("organ {label}");
        let (extracted, out) = extract_segments(&segmentation, &voxels, &[name.as_str()]).unwrap();

        let expected = voxels.layers()[0].extract_mask(label, None);
        let actual = out.layers()[0].extract_mask(1, None);
        prop_assert_eq!(actual.as_slice(), expected.as_slice());
        prop_assert_eq!(extracted.segments()[0].label_value, 1);
    }

    #[test]
    fn prop_cropped_mask_equals_full_scan((sizes, values) in volume(), label in 1u32..4) {
        let layer = LabelLayer::from_vec(sizes, values).unwrap();
        let full = layer.extract_mask(label, None);
        match layer.compute_extent(label) {
            Some(extent) => {
                let cropped = layer.extract_mask(label, Some(&extent));
                prop_assert_eq!(cropped.count(), full.count());
                prop_assert_eq!(cropped.uncropped(), full);
            }
            None => prop_assert_eq!(full.count(), 0),
        }
    }

    #[test]
    fn prop_extraction_is_idempotent((sizes, values) in volume(), reverse in any::<bool>()) {
        let (segmentation, voxels) = sample(sizes, values);
        let mut selectors = vec!["organ 1", "Segment_3"];
        if reverse {
            selectors.reverse();
        }
        let (once, once_voxels) = extract_segments(&segmentation, &voxels, &selectors).unwrap();
        let names = segment_names(&once).into_iter().map(String::from).collect::<Vec<_>>();
        let (twice, twice_voxels) = extract_segments(&once, &once_voxels, &names).unwrap();

        let options = WriteOptions::default();
        prop_assert_eq!(
            write_to_memory(&once, &once_voxels, options),
            write_to_memory(&twice, &twice_voxels, options)
        );
    }
}
