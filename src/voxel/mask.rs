// src/voxel/mask.rs

/// Boolean membership array of one segment
///
/// A mask covers either the whole volume or, when extracted under an extent,
/// only the box starting at `offset` with `shape` voxels per axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    volume_sizes: [usize; 3],
    offset: [usize; 3],
    shape: [usize; 3],
    data: Vec<bool>,
}

impl Mask {
    pub(crate) fn new(volume_sizes: [usize; 3], offset: [usize; 3], shape: [usize; 3], data: Vec<bool>) -> Self {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        Mask {
            volume_sizes,
            offset,
            shape,
            data,
        }
    }

    pub fn volume_sizes(&self) -> [usize; 3] {
        self.volume_sizes
    }

    pub fn offset(&self) -> [usize; 3] {
        self.offset
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn is_cropped(&self) -> bool {
        self.shape != self.volume_sizes
    }

    /// Values in NRRD order within the mask's own box
    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    /// Number of voxels set
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&set| set).count()
    }

    /// Membership of a voxel given in volume coordinates
    pub fn contains(&self, index: [usize; 3]) -> bool {
        let mut local = [0usize; 3];
        for axis in 0..3 {
            if index[axis] < self.offset[axis] || index[axis] >= self.offset[axis] + self.shape[axis] {
                return false;
            }
            local[axis] = index[axis] - self.offset[axis];
        }
        self.data[local[0] + self.shape[0] * (local[1] + self.shape[1] * local[2])]
    }

    /// Expand to a mask over the whole volume
    pub fn uncropped(&self) -> Mask {
        if !self.is_cropped() {
            return self.clone();
        }
        let [nx, ny, nz] = self.volume_sizes;
        let mut data = vec![false; nx * ny * nz];
        for k in 0..self.shape[2] {
            for j in 0..self.shape[1] {
                let src = self.shape[0] * (j + self.shape[1] * k);
                let dst = self.offset[0] + nx * ((self.offset[1] + j) + ny * (self.offset[2] + k));
                data[dst..dst + self.shape[0]].copy_from_slice(&self.data[src..src + self.shape[0]]);
            }
        }
        Mask::new(self.volume_sizes, [0; 3], self.volume_sizes, data)
    }
}
