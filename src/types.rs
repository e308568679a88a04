// src/types.rs
use crate::error::{Result, SegError};
use std::fmt;

/// Integer element type of the voxel payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoxelType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl VoxelType {
    /// Size in bytes of one voxel
    pub fn fixed_size(&self) -> usize {
        match self {
            VoxelType::I8 | VoxelType::U8 => 1,
            VoxelType::I16 | VoxelType::U16 => 2,
            VoxelType::I32 | VoxelType::U32 => 4,
            VoxelType::I64 | VoxelType::U64 => 8,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, VoxelType::I8 | VoxelType::I16 | VoxelType::I32 | VoxelType::I64)
    }

    /// Largest label value representable by this type
    pub fn max_label(&self) -> u64 {
        match self {
            VoxelType::I8 => i8::MAX as u64,
            VoxelType::U8 => u8::MAX as u64,
            VoxelType::I16 => i16::MAX as u64,
            VoxelType::U16 => u16::MAX as u64,
            VoxelType::I32 => i32::MAX as u64,
            VoxelType::U32 => u32::MAX as u64,
            VoxelType::I64 => i64::MAX as u64,
            VoxelType::U64 => u64::MAX,
        }
    }

    /// Narrowest unsigned type that holds `max_label`
    pub fn smallest_for(max_label: u32) -> Self {
        if max_label <= u8::MAX as u32 {
            VoxelType::U8
        } else if max_label <= u16::MAX as u32 {
            VoxelType::U16
        } else {
            VoxelType::U32
        }
    }

    /// Parse any of the NRRD spellings of an integer type.
    pub fn from_nrrd_name(name: &str) -> Option<Self> {
        match name.trim() {
            "signed char" | "int8" | "int8_t" => Some(VoxelType::I8),
            "uchar" | "unsigned char" | "uint8" | "uint8_t" => Some(VoxelType::U8),
            "short" | "short int" | "signed short" | "signed short int" | "int16" | "int16_t" => {
                Some(VoxelType::I16)
            }
            "ushort" | "unsigned short" | "unsigned short int" | "uint16" | "uint16_t" => {
                Some(VoxelType::U16)
            }
            "int" | "signed int" | "int32" | "int32_t" => Some(VoxelType::I32),
            "uint" | "unsigned int" | "uint32" | "uint32_t" => Some(VoxelType::U32),
            "longlong" | "long long" | "long long int" | "signed long long"
            | "signed long long int" | "int64" | "int64_t" => Some(VoxelType::I64),
            "ulonglong" | "unsigned long long" | "unsigned long long int" | "uint64"
            | "uint64_t" => Some(VoxelType::U64),
            _ => None,
        }
    }

    /// Canonical NRRD name used when writing
    pub fn nrrd_name(&self) -> &'static str {
        match self {
            VoxelType::I8 => "int8",
            VoxelType::U8 => "uint8",
            VoxelType::I16 => "int16",
            VoxelType::U16 => "uint16",
            VoxelType::I32 => "int32",
            VoxelType::U32 => "uint32",
            VoxelType::I64 => "int64",
            VoxelType::U64 => "uint64",
        }
    }
}

/// Data section encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Raw,
    #[default]
    Gzip,
}

impl Encoding {
    pub fn from_nrrd_name(name: &str) -> Option<Self> {
        match name.trim() {
            "raw" => Some(Encoding::Raw),
            "gzip" | "gz" => Some(Encoding::Gzip),
            _ => None,
        }
    }

    pub fn nrrd_name(&self) -> &'static str {
        match self {
            Encoding::Raw => "raw",
            Encoding::Gzip => "gzip",
        }
    }
}

/// Byte order of multi-byte voxels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub fn from_nrrd_name(name: &str) -> Option<Self> {
        match name.trim() {
            "little" => Some(Endian::Little),
            "big" => Some(Endian::Big),
            _ => None,
        }
    }

    pub fn nrrd_name(&self) -> &'static str {
        match self {
            Endian::Little => "little",
            Endian::Big => "big",
        }
    }
}

/// Split a list of numbers separated by spaces and/or commas
fn split_numbers(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
}

/// Segment display color, RGB in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub [f64; 3]);

impl Color {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Color([r, g, b])
    }

    pub fn parse(s: &str) -> Result<Self> {
        let values = split_numbers(s)
            .map(|part| part.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| SegError::MalformedHeader(format!("non-numeric color: {s:?}")))?;

        match values.as_slice() {
            [r, g, b] => Ok(Color([*r, *g, *b])),
            _ => Err(SegError::MalformedHeader(format!(
                "color needs 3 components, found {}: {s:?}",
                values.len()
            ))),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "{r},{g},{b}")
    }
}

/// Inclusive voxel bounding box: `[min0, max0, min1, max1, min2, max2]`.
///
/// An axis with `max < min` marks an empty segment, which is how Slicer
/// writes segments that have no voxels (`0 -1 0 -1 0 -1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent(pub [i64; 6]);

impl Extent {
    pub fn new(bounds: [i64; 6]) -> Self {
        Extent(bounds)
    }

    /// Extent covering a whole volume
    pub fn full(sizes: [usize; 3]) -> Self {
        Extent([
            0,
            sizes[0] as i64 - 1,
            0,
            sizes[1] as i64 - 1,
            0,
            sizes[2] as i64 - 1,
        ])
    }

    pub fn min(&self, axis: usize) -> i64 {
        self.0[axis * 2]
    }

    pub fn max(&self, axis: usize) -> i64 {
        self.0[axis * 2 + 1]
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.max(axis) < self.min(axis))
    }

    /// Check that a non-empty extent lies inside a volume of `sizes`
    pub fn fits_within(&self, sizes: [usize; 3]) -> bool {
        self.is_empty()
            || (0..3).all(|axis| self.min(axis) >= 0 && self.max(axis) < sizes[axis] as i64)
    }

    /// Number of voxels along each axis (zero for an empty extent)
    pub fn shape(&self) -> [usize; 3] {
        if self.is_empty() {
            return [0; 3];
        }
        [0, 1, 2].map(|axis| (self.max(axis) - self.min(axis) + 1) as usize)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let values = split_numbers(s)
            .map(|part| part.parse::<i64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| SegError::MalformedHeader(format!("non-integer extent: {s:?}")))?;

        let bounds: [i64; 6] = values.as_slice().try_into().map_err(|_| {
            SegError::MalformedHeader(format!(
                "extent needs 6 integers, found {}: {s:?}",
                values.len()
            ))
        })?;
        Ok(Extent(bounds))
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(f, "{} {} {} {} {} {}", b[0], b[1], b[2], b[3], b[4], b[5])
    }
}
