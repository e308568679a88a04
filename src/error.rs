// src/error.rs
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Duplicate segment name: {0}")]
    DuplicateName(String),

    #[error("Duplicate segment identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Label value {label_value} is assigned to more than one segment in layer {layer}")]
    InvalidLabelAssignment { layer: usize, label_value: u32 },

    #[error("Segment {segment} uses reserved label value 0")]
    ReservedLabelValue { segment: String },

    #[error("Segment not found: {0}")]
    SegmentNotFound(String),

    #[error("Incomplete voxel data: {0}")]
    IncompleteVoxelData(String),

    #[error("Extent of segment {segment} is outside the volume: {extent}")]
    InvalidExtent { segment: String, extent: String },

    #[error("Invalid voxel data: {0}")]
    InvalidVoxelData(String),

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

impl SegError {
    /// Attach a path to an I/O failure coming from the file system.
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SegError::Storage { path: path.into(), source }
    }

    /// Turn a bare I/O failure into a storage error for `path`, if known.
    pub(crate) fn with_path(self, path: Option<&Path>) -> Self {
        match (self, path) {
            (SegError::Io(source), Some(path)) => SegError::storage(path, source),
            (err, _) => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, SegError>;
