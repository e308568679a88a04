// src/reader/mod.rs
mod sync_reader;

pub use sync_reader::{ReadSeek, SegmentationReader};
