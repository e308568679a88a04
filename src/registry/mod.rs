// src/registry/mod.rs
mod segment;
mod segmentation;

pub use segment::Segment;
pub use segmentation::{build_segments, Segmentation};
