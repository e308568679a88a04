// src/header/geometry.rs
use crate::error::{Result, SegError};

/// Spatial layout of a labelled volume
///
/// The voxel-to-physical mapping is stored as the NRRD `space directions`
/// vectors: the length of each vector is the spacing along that axis and its
/// unit vector is the axis direction. Keeping the raw vectors makes header
/// round-trips exact.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    sizes: [usize; 3],
    space_directions: [[f64; 3]; 3],
    origin: [f64; 3],
    space: Option<String>,
}

impl Geometry {
    /// Build a geometry from spacing and unit axis directions
    pub fn new(sizes: [usize; 3], spacing: [f64; 3], directions: [[f64; 3]; 3], origin: [f64; 3]) -> Self {
        let space_directions = [0, 1, 2].map(|axis| directions[axis].map(|c| c * spacing[axis]));
        Geometry::from_space_directions(sizes, space_directions, origin)
    }

    pub fn from_space_directions(sizes: [usize; 3], space_directions: [[f64; 3]; 3], origin: [f64; 3]) -> Self {
        Geometry {
            sizes,
            space_directions,
            origin,
            space: None,
        }
    }

    /// Axis-aligned geometry with unit spacing at the origin
    pub fn identity(sizes: [usize; 3]) -> Self {
        Geometry::new(
            sizes,
            [1.0; 3],
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [0.0; 3],
        )
    }

    /// Set the anatomical space name, e.g. `left-posterior-superior`
    pub fn with_space(mut self, space: impl Into<String>) -> Self {
        self.space = Some(space.into());
        self
    }

    pub fn sizes(&self) -> [usize; 3] {
        self.sizes
    }

    pub fn voxel_count(&self) -> usize {
        self.sizes.iter().product()
    }

    pub fn space_directions(&self) -> &[[f64; 3]; 3] {
        &self.space_directions
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.space_directions.map(|v| norm(&v))
    }

    /// Unit direction of each axis; a zero-length axis keeps its zero vector
    pub fn directions(&self) -> [[f64; 3]; 3] {
        self.space_directions.map(|v| {
            let length = norm(&v);
            if length == 0.0 {
                v
            } else {
                v.map(|c| c / length)
            }
        })
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn space(&self) -> Option<&str> {
        self.space.as_deref()
    }

    /// Assemble a geometry from already-split header values.
    ///
    /// `sizes` and `directions` cover the spatial axes only.
    pub(crate) fn from_parts(
        sizes: &[usize],
        directions: &[Vec<f64>],
        origin: &[f64],
        space: Option<String>,
    ) -> Result<Self> {
        let sizes: [usize; 3] = sizes.try_into().map_err(|_| {
            SegError::MalformedHeader(format!("expected 3 spatial sizes, found {}", sizes.len()))
        })?;
        if sizes.contains(&0) {
            return Err(SegError::MalformedHeader(format!("sizes must be positive: {sizes:?}")));
        }
        if sizes.iter().try_fold(1usize, |acc, &size| acc.checked_mul(size)).is_none() {
            return Err(SegError::MalformedHeader(format!("voxel count of {sizes:?} overflows")));
        }
        if directions.len() != 3 {
            return Err(SegError::MalformedHeader(format!(
                "expected 3 space directions, found {}",
                directions.len()
            )));
        }

        let mut space_directions = [[0.0; 3]; 3];
        for (axis, vector) in directions.iter().enumerate() {
            space_directions[axis] = to_array3("space direction", vector)?;
        }
        let origin = to_array3("space origin", origin)?;

        Ok(Geometry {
            sizes,
            space_directions,
            origin,
            space,
        })
    }
}

fn norm(v: &[f64; 3]) -> f64 {
    v.iter().map(|c| c * c).sum::<f64>().sqrt()
}

fn to_array3(what: &str, v: &[f64]) -> Result<[f64; 3]> {
    v.try_into().map_err(|_| {
        SegError::MalformedHeader(format!("{what} must have 3 components, found {}", v.len()))
    })
}
