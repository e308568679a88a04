// src/engine.rs
//! Read, extract and write operations on whole segmentations
//!
//! These functions tie the header codec, the segment registry and the voxel
//! model together. Every call reads from or writes to storage afresh; no
//! state is kept between calls.

use crate::error::{Result, SegError};
use crate::reader::SegmentationReader;
use crate::registry::{Segment, Segmentation};
use crate::types::VoxelType;
use crate::voxel::{LabelLayer, VoxelModel};
use crate::writer::{check_voxels, SegmentationWriter, WriteOptions};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Segments and geometry of a file, without touching its voxel data
pub fn read_segmentation_info(path: impl AsRef<Path>) -> Result<Segmentation> {
    SegmentationReader::open(path)?.segmentation()
}

/// Segments and voxels of a file, optionally reduced to `selection`.
///
/// Selectors are resolved before any voxel data is read, so an unknown
/// selector fails fast.
pub fn read_segmentation(
    path: impl AsRef<Path>,
    selection: Option<&[&str]>,
) -> Result<(Segmentation, VoxelModel)> {
    let mut reader = SegmentationReader::open(path)?;
    let segmentation = reader.segmentation()?;

    match selection {
        None => {
            let voxels = reader.load_voxels()?;
            Ok((segmentation, voxels))
        }
        Some(selectors) => {
            resolve_all(&segmentation, selectors)?;
            let voxels = reader.load_voxels()?;
            extract_segments(&segmentation, &voxels, selectors)
        }
    }
}

fn resolve_all<'a, S: AsRef<str>>(segmentation: &'a Segmentation, selectors: &[S]) -> Result<Vec<&'a Segment>> {
    selectors
        .iter()
        .map(|selector| segmentation.resolve(selector.as_ref()))
        .collect()
}

fn check_sizes(segmentation: &Segmentation, voxels: &VoxelModel) -> Result<()> {
    if voxels.sizes() != segmentation.geometry().sizes() {
        return Err(SegError::IncompleteVoxelData(format!(
            "voxel arrays have sizes {:?}, geometry has {:?}",
            voxels.sizes(),
            segmentation.geometry().sizes()
        )));
    }
    Ok(())
}

fn source_layer<'a>(voxels: &'a VoxelModel, segment: &Segment) -> Result<&'a LabelLayer> {
    voxels.layer(segment.layer).ok_or_else(|| {
        SegError::IncompleteVoxelData(format!(
            "segment {} is in layer {} but only {} layers are loaded",
            segment.name,
            segment.layer,
            voxels.layer_count()
        ))
    })
}

/// Reduce a segmentation to the selected segments.
///
/// Selector `i` (a name, or failing that an identifier) becomes the only
/// segment of output layer `i`, with label value 1. Voxels are copied under
/// the segment's extent, or from the whole volume when it has none. All
/// other segment attributes are carried over unchanged.
pub fn extract_segments<S: AsRef<str>>(
    segmentation: &Segmentation,
    voxels: &VoxelModel,
    selectors: &[S],
) -> Result<(Segmentation, VoxelModel)> {
    check_sizes(segmentation, voxels)?;
    let selected = resolve_all(segmentation, selectors)?;

    let sizes = voxels.sizes();
    let mut segments = Vec::with_capacity(selected.len());
    let mut layers = Vec::with_capacity(selected.len());

    for (out_layer, segment) in selected.into_iter().enumerate() {
        let source = source_layer(voxels, segment)?;
        let mut layer = LabelLayer::zeros(sizes);
        layer.copy_label_from(source, segment.label_value, 1, segment.extent.as_ref());
        layers.push(layer);

        segments.push(Segment {
            layer: out_layer,
            label_value: 1,
            ..segment.clone()
        });
    }

    debug!("Extracted {} segments into separate layers", segments.len());
    let extracted = Segmentation::with_properties(
        segments,
        segmentation.geometry().clone(),
        segmentation.properties().clone(),
    )?;
    let voxels = VoxelModel::from_layers(sizes, voxels.voxel_type(), layers)?;
    Ok((extracted, voxels))
}

/// Pack the selected segments into a single label layer with caller-chosen
/// label values.
///
/// Where selected segments overlap, the later entry wins.
pub fn merge_segments<S: AsRef<str>>(
    segmentation: &Segmentation,
    voxels: &VoxelModel,
    selection: &[(S, u32)],
) -> Result<(Segmentation, VoxelModel)> {
    check_sizes(segmentation, voxels)?;

    let mut used = HashSet::new();
    let mut picked = Vec::with_capacity(selection.len());
    for (selector, label_value) in selection {
        let segment = segmentation.resolve(selector.as_ref())?;
        if *label_value == 0 {
            return Err(SegError::ReservedLabelValue {
                segment: segment.name.clone(),
            });
        }
        if !used.insert(*label_value) {
            return Err(SegError::InvalidLabelAssignment {
                layer: 0,
                label_value: *label_value,
            });
        }
        picked.push((segment, *label_value));
    }

    let sizes = voxels.sizes();
    let mut merged = LabelLayer::zeros(sizes);
    let mut segments = Vec::with_capacity(picked.len());
    for (segment, label_value) in picked {
        let source = source_layer(voxels, segment)?;
        merged.copy_label_from(source, segment.label_value, label_value, segment.extent.as_ref());
        segments.push(Segment {
            layer: 0,
            label_value,
            ..segment.clone()
        });
    }

    let max_label = used.into_iter().max().unwrap_or(0);
    let voxel_type = if u64::from(max_label) <= voxels.voxel_type().max_label() {
        voxels.voxel_type()
    } else {
        VoxelType::smallest_for(max_label)
    };

    debug!("Merged {} segments into one layer", segments.len());
    let merged_segmentation = Segmentation::with_properties(
        segments,
        segmentation.geometry().clone(),
        segmentation.properties().clone(),
    )?;
    let voxels = VoxelModel::from_layers(sizes, voxel_type, vec![merged])?;
    Ok((merged_segmentation, voxels))
}

/// Write a segmentation and its voxels to `path`.
///
/// The voxel model is checked before the file is created, so a failed
/// check leaves storage untouched.
pub fn write_segmentation(
    path: impl AsRef<Path>,
    segmentation: &Segmentation,
    voxels: &VoxelModel,
    options: &WriteOptions,
) -> Result<()> {
    check_voxels(segmentation, voxels)?;
    SegmentationWriter::create(path, *options)?.write(segmentation, voxels)
}

/// Segment names in file order
pub fn segment_names(segmentation: &Segmentation) -> Vec<&str> {
    segmentation.segment_names()
}

/// Attributes of the segment called `name`
pub fn segment_from_name<'a>(segmentation: &'a Segmentation, name: &str) -> Result<&'a Segment> {
    segmentation.find_by_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Geometry;
    use crate::types::Extent;

    fn two_layer_sample() -> (Segmentation, VoxelModel) {
        let sizes = [4, 4, 4];
        let mut layer0 = LabelLayer::zeros(sizes);
        let mut layer1 = LabelLayer::zeros(sizes);
        layer0.set([0, 0, 0], 1);
        layer0.set([1, 0, 0], 2);
        layer1.set([1, 0, 0], 1);
        layer1.set([3, 3, 3], 1);

        let segmentation = Segmentation::new(
            vec![
                Segment::new("Segment_1", "a").with_label_value(1),
                Segment::new("Segment_2", "b").with_label_value(2),
                Segment::new("Segment_3", "c")
                    .with_layer(1)
                    .with_extent(Extent::new([1, 3, 0, 3, 0, 3])),
            ],
            Geometry::identity(sizes),
        )
        .unwrap();
        let voxels = VoxelModel::from_layers(sizes, VoxelType::U8, vec![layer0, layer1]).unwrap();
        (segmentation, voxels)
    }

    #[test]
    fn test_extract_assigns_layers_in_selector_order() {
        let (segmentation, voxels) = two_layer_sample();
        let (extracted, out) = extract_segments(&segmentation, &voxels, &["c", "Segment_1"]).unwrap();

        assert_eq!(extracted.segment_names(), vec!["c", "a"]);
        assert_eq!(extracted.segments()[0].layer, 0);
        assert_eq!(extracted.segments()[1].layer, 1);
        assert!(extracted.segments().iter().all(|s| s.label_value == 1));
        assert_eq!(extracted.segments()[0].extent, Some(Extent::new([1, 3, 0, 3, 0, 3])));

        assert_eq!(out.layer_count(), 2);
        assert_eq!(out.layers()[0].extract_mask(1, None).count(), 2);
        assert_eq!(out.layers()[1].get([0, 0, 0]), 1);
        assert_eq!(out.layers()[1].get([1, 0, 0]), 0);
    }

    #[test]
    fn test_extract_unknown_selector() {
        let (segmentation, voxels) = two_layer_sample();
        let result = extract_segments(&segmentation, &voxels, &["a", "nope"]);
        assert!(matches!(result, Err(SegError::SegmentNotFound(s)) if s == "nope"));
    }

    #[test]
    fn test_extract_same_segment_twice_is_rejected() {
        let (segmentation, voxels) = two_layer_sample();
        let result = extract_segments(&segmentation, &voxels, &["a", "Segment_1"]);
        assert!(matches!(result, Err(SegError::DuplicateName(_))));
    }

    #[test]
    fn test_merge_into_single_layer() {
        let (segmentation, voxels) = two_layer_sample();
        let (merged, out) = merge_segments(&segmentation, &voxels, &[("a", 10), ("c", 20)]).unwrap();

        assert_eq!(merged.layer_count(), 1);
        assert_eq!(merged.find_by_name("c").unwrap().label_value, 20);
        let layer = &out.layers()[0];
        assert_eq!(layer.get([0, 0, 0]), 10);
        assert_eq!(layer.get([1, 0, 0]), 20);
        assert_eq!(layer.get([3, 3, 3]), 20);
    }

    #[test]
    fn test_merge_rejects_bad_labels() {
        let (segmentation, voxels) = two_layer_sample();
        assert!(matches!(
            merge_segments(&segmentation, &voxels, &[("a", 0)]),
            Err(SegError::ReservedLabelValue { .. })
        ));
        assert!(matches!(
            merge_segments(&segmentation, &voxels, &[("a", 3), ("b", 3)]),
            Err(SegError::InvalidLabelAssignment { label_value: 3, .. })
        ));
    }

    #[test]
    fn test_merge_widens_voxel_type() {
        let (segmentation, voxels) = two_layer_sample();
        let (_, out) = merge_segments(&segmentation, &voxels, &[("a", 1000)]).unwrap();
        assert_eq!(out.voxel_type(), VoxelType::U16);
    }

    #[test]
    fn test_mismatched_sizes() {
        let (segmentation, _) = two_layer_sample();
        let voxels = VoxelModel::from_layers([2, 2, 2], VoxelType::U8, vec![LabelLayer::zeros([2, 2, 2])]).unwrap();
        assert!(matches!(
            extract_segments(&segmentation, &voxels, &["a"]),
            Err(SegError::IncompleteVoxelData(_))
        ));
    }
}
