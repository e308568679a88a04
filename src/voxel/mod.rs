// src/voxel/mod.rs
//! Label arrays and segment masks
//!
//! A [`VoxelModel`] owns one [`LabelLayer`] per layer of a segmentation.
//! Each layer is a contiguous buffer indexed by precomputed strides; layers
//! never alias each other.
//!
//! # Example
//!
//! ```
//! use segnrrd_rs::voxel::LabelLayer;
//!
//! let mut layer = LabelLayer::zeros([4, 4, 4]);
//! layer.set([1, 2, 3], 5);
//!
//! let mask = layer.extract_mask(5, None);
//! assert_eq!(mask.count(), 1);
//! assert!(mask.contains([1, 2, 3]));
//! ```

mod codec;
mod layer;
mod mask;

pub use codec::{decode_block, encode_block};
pub use layer::LabelLayer;
pub use mask::Mask;

use crate::error::{Result, SegError};
use crate::registry::Segment;
use crate::types::VoxelType;

/// All label layers of one segmentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelModel {
    sizes: [usize; 3],
    voxel_type: VoxelType,
    layers: Vec<LabelLayer>,
}

impl VoxelModel {
    /// Empty model; add layers with [`VoxelModel::push_layer`]
    pub fn new(sizes: [usize; 3], voxel_type: VoxelType) -> Self {
        VoxelModel {
            sizes,
            voxel_type,
            layers: Vec::new(),
        }
    }

    pub fn from_layers(sizes: [usize; 3], voxel_type: VoxelType, layers: Vec<LabelLayer>) -> Result<Self> {
        let mut model = VoxelModel::new(sizes, voxel_type);
        for layer in layers {
            model.push_layer(layer)?;
        }
        Ok(model)
    }

    /// Build a model from a payload in NRRD order with the layer axis first,
    /// i.e. the labels of all layers for voxel 0, then for voxel 1, and so on.
    pub fn from_interleaved(
        sizes: [usize; 3],
        voxel_type: VoxelType,
        layer_count: usize,
        values: &[u32],
    ) -> Result<Self> {
        let voxels: usize = sizes.iter().product();
        if layer_count == 0 || values.len() % layer_count != 0 || values.len() / layer_count != voxels {
            return Err(SegError::IncompleteVoxelData(format!(
                "{} values do not fill {layer_count} layers of sizes {sizes:?}",
                values.len()
            )));
        }
        let layers = (0..layer_count)
            .map(|index| LabelLayer::from_interleaved(sizes, values, layer_count, index))
            .collect::<Result<Vec<_>>>()?;
        Self::from_layers(sizes, voxel_type, layers)
    }

    /// Labels of all layers interleaved voxel by voxel; inverse of [`VoxelModel::from_interleaved`]
    pub fn interleaved_values(&self) -> Vec<u32> {
        let voxels: usize = self.sizes.iter().product();
        let mut values = Vec::with_capacity(voxels * self.layers.len());
        for voxel in 0..voxels {
            values.extend(self.layers.iter().map(|layer| layer.as_slice()[voxel]));
        }
        values
    }

    pub fn push_layer(&mut self, layer: LabelLayer) -> Result<()> {
        if layer.sizes() != self.sizes {
            return Err(SegError::IncompleteVoxelData(format!(
                "layer {} has sizes {:?}, volume has {:?}",
                self.layers.len(),
                layer.sizes(),
                self.sizes
            )));
        }
        self.layers.push(layer);
        Ok(())
    }

    pub fn sizes(&self) -> [usize; 3] {
        self.sizes
    }

    /// On-disk element type the model was read with or will be written as
    pub fn voxel_type(&self) -> VoxelType {
        self.voxel_type
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> Option<&LabelLayer> {
        self.layers.get(index)
    }

    pub fn layers(&self) -> &[LabelLayer] {
        &self.layers
    }

    pub fn max_label(&self) -> u32 {
        self.layers.iter().map(LabelLayer::max_value).max().unwrap_or(0)
    }

    /// Mask of one segment, scanning only its extent when it has one
    pub fn segment_mask(&self, segment: &Segment) -> Result<Mask> {
        let layer = self.layer(segment.layer).ok_or_else(|| {
            SegError::IncompleteVoxelData(format!(
                "segment {} is in layer {} but only {} layers are loaded",
                segment.name,
                segment.layer,
                self.layers.len()
            ))
        })?;
        Ok(layer.extract_mask(segment.label_value, segment.extent.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Extent;

    fn sample_layer() -> LabelLayer {
        let sizes = [6, 5, 4];
        let mut layer = LabelLayer::zeros(sizes);
        for k in 1..3 {
            for j in 2..4 {
                for i in 1..5 {
                    layer.set([i, j, k], 3);
                }
            }
        }
        layer.set([0, 0, 0], 7);
        layer
    }

    #[test]
    fn test_layer_indexing_is_axis0_fastest() {
        let mut layer = LabelLayer::zeros([3, 2, 2]);
        layer.set([1, 1, 1], 9);
        assert_eq!(layer.as_slice()[1 + 3 * (1 + 2)], 9);
        assert_eq!(layer.get([1, 1, 1]), 9);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(LabelLayer::from_vec([2, 2, 2], vec![0; 8]).is_ok());
        assert!(matches!(
            LabelLayer::from_vec([2, 2, 2], vec![0; 7]),
            Err(SegError::IncompleteVoxelData(_))
        ));
    }

    #[test]
    fn test_mask_same_with_and_without_extent() {
        let layer = sample_layer();
        let extent = layer.compute_extent(3).unwrap();
        assert_eq!(extent, Extent::new([1, 4, 2, 3, 1, 2]));

        let full = layer.extract_mask(3, None);
        let cropped = layer.extract_mask(3, Some(&extent));
        assert!(!full.is_cropped());
        assert!(cropped.is_cropped());
        assert_eq!(cropped.shape(), [4, 2, 2]);
        assert_eq!(cropped.count(), 16);
        assert_eq!(full.count(), 16);
        assert_eq!(cropped.uncropped(), full);
        assert!(cropped.contains([1, 2, 1]));
        assert!(!cropped.contains([0, 0, 0]));
    }

    #[test]
    fn test_empty_extent_gives_empty_mask() {
        let layer = sample_layer();
        let mask = layer.extract_mask(3, Some(&Extent::new([0, -1, 0, -1, 0, -1])));
        assert_eq!(mask.count(), 0);
        assert_eq!(mask.uncropped().count(), 0);
        assert_eq!(layer.compute_extent(42), None);
    }

    #[test]
    fn test_copy_label_from() {
        let source = sample_layer();
        let mut target = LabelLayer::zeros(source.sizes());
        target.copy_label_from(&source, 7, 1, None);
        assert_eq!(target.labels().into_iter().collect::<Vec<_>>(), vec![1]);
        assert_eq!(target.get([0, 0, 0]), 1);
        assert_eq!(target.extract_mask(1, None).count(), 1);
    }

    #[test]
    fn test_model_layer_shapes() {
        let mut model = VoxelModel::new([6, 5, 4], VoxelType::U8);
        model.push_layer(sample_layer()).unwrap();
        assert!(model.push_layer(LabelLayer::zeros([1, 1, 1])).is_err());
        assert_eq!(model.layer_count(), 1);
        assert_eq!(model.max_label(), 7);

        let missing = Segment::new("s", "n").with_layer(1);
        assert!(matches!(model.segment_mask(&missing), Err(SegError::IncompleteVoxelData(_))));

        let present = Segment::new("s", "n").with_label_value(3);
        assert_eq!(model.segment_mask(&present).unwrap().count(), 16);
    }

    #[test]
    fn test_interleaved_layout() {
        let sizes = [2, 2, 1];
        // voxel-major: (layer0, layer1) for each voxel
        let values = [1, 0, 1, 0, 0, 2, 0, 0];
        let model = VoxelModel::from_interleaved(sizes, VoxelType::U8, 2, &values).unwrap();
        assert_eq!(model.layers()[0].as_slice(), &[1, 1, 0, 0]);
        assert_eq!(model.layers()[1].as_slice(), &[0, 0, 2, 0]);
        assert_eq!(model.interleaved_values(), values.to_vec());

        assert!(matches!(
            VoxelModel::from_interleaved(sizes, VoxelType::U8, 3, &values),
            Err(SegError::IncompleteVoxelData(_))
        ));
    }
}
