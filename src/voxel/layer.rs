// src/voxel/layer.rs
use crate::error::{Result, SegError};
use crate::types::Extent;
use crate::voxel::Mask;
use std::collections::BTreeSet;

/// One dense label array in NRRD order (axis 0 varies fastest)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLayer {
    sizes: [usize; 3],
    strides: [usize; 3],
    data: Vec<u32>,
}

impl LabelLayer {
    pub fn zeros(sizes: [usize; 3]) -> Self {
        LabelLayer {
            sizes,
            strides: strides_for(sizes),
            data: vec![0; sizes.iter().product()],
        }
    }

    pub fn from_vec(sizes: [usize; 3], data: Vec<u32>) -> Result<Self> {
        let expected: usize = sizes.iter().product();
        if data.len() != expected {
            return Err(SegError::IncompleteVoxelData(format!(
                "layer of sizes {sizes:?} needs {expected} voxels, got {}",
                data.len()
            )));
        }
        Ok(LabelLayer {
            sizes,
            strides: strides_for(sizes),
            data,
        })
    }

    /// Pick layer `index` out of a payload whose layer index varies fastest
    pub(crate) fn from_interleaved(sizes: [usize; 3], values: &[u32], layer_count: usize, index: usize) -> Result<Self> {
        let data = values.iter().skip(index).step_by(layer_count.max(1)).copied().collect();
        Self::from_vec(sizes, data)
    }

    pub fn sizes(&self) -> [usize; 3] {
        self.sizes
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.data
    }

    #[inline]
    fn offset(&self, index: [usize; 3]) -> usize {
        index[0] * self.strides[0] + index[1] * self.strides[1] + index[2] * self.strides[2]
    }

    pub fn get(&self, index: [usize; 3]) -> u32 {
        self.data[self.offset(index)]
    }

    pub fn set(&mut self, index: [usize; 3], value: u32) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    pub fn max_value(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Distinct non-zero labels present in the layer
    pub fn labels(&self) -> BTreeSet<u32> {
        self.data.iter().copied().filter(|&v| v != 0).collect()
    }

    /// Index box of the voxels scanned for `extent`, clamped to the layer
    fn scan_box(&self, extent: Option<&Extent>) -> ([usize; 3], [usize; 3]) {
        match extent {
            None => ([0; 3], self.sizes),
            Some(extent) if extent.is_empty() => ([0; 3], [0; 3]),
            Some(extent) => {
                let mut start = [0usize; 3];
                let mut shape = [0usize; 3];
                for axis in 0..3 {
                    let size = self.sizes[axis] as i64;
                    let lo = extent.min(axis).clamp(0, size);
                    let hi = (extent.max(axis) + 1).clamp(lo, size);
                    start[axis] = lo as usize;
                    shape[axis] = (hi - lo) as usize;
                }
                if shape.contains(&0) {
                    return ([0; 3], [0; 3]);
                }
                (start, shape)
            }
        }
    }

    /// Mask of voxels equal to `label_value`.
    ///
    /// With an extent only that box is scanned and the mask is cropped to
    /// it; [`Mask::uncropped`] gives the same result as scanning everything.
    pub fn extract_mask(&self, label_value: u32, extent: Option<&Extent>) -> Mask {
        let (start, shape) = self.scan_box(extent);
        let mut data = Vec::with_capacity(shape.iter().product());
        for k in 0..shape[2] {
            for j in 0..shape[1] {
                let row = self.offset([start[0], start[1] + j, start[2] + k]);
                data.extend(self.data[row..row + shape[0]].iter().map(|&v| v == label_value));
            }
        }
        Mask::new(self.sizes, start, shape, data)
    }

    /// Copy voxels equal to `label_value` in `source` into this layer as `target_value`.
    ///
    /// Only the extent box is visited when one is given.
    pub fn copy_label_from(&mut self, source: &LabelLayer, label_value: u32, target_value: u32, extent: Option<&Extent>) {
        let (start, shape) = source.scan_box(extent);
        for k in 0..shape[2] {
            for j in 0..shape[1] {
                let row = source.offset([start[0], start[1] + j, start[2] + k]);
                for offset in row..row + shape[0] {
                    if source.data[offset] == label_value {
                        self.data[offset] = target_value;
                    }
                }
            }
        }
    }

    /// Tight bounding box of `label_value`, or `None` when it is absent
    pub fn compute_extent(&self, label_value: u32) -> Option<Extent> {
        let mut lo = [usize::MAX; 3];
        let mut hi = [0usize; 3];
        let mut found = false;
        for k in 0..self.sizes[2] {
            for j in 0..self.sizes[1] {
                for i in 0..self.sizes[0] {
                    if self.get([i, j, k]) == label_value {
                        found = true;
                        for (axis, value) in [i, j, k].into_iter().enumerate() {
                            lo[axis] = lo[axis].min(value);
                            hi[axis] = hi[axis].max(value);
                        }
                    }
                }
            }
        }
        found.then(|| {
            Extent::new([
                lo[0] as i64, hi[0] as i64, lo[1] as i64, hi[1] as i64, lo[2] as i64, hi[2] as i64,
            ])
        })
    }
}

fn strides_for(sizes: [usize; 3]) -> [usize; 3] {
    [1, sizes[0], sizes[0] * sizes[1]]
}
