// src/header/mod.rs
//! Textual NRRD header handling
//!
//! - [`HeaderBlock`] - the complete parsed header, including the data layout
//! - [`Geometry`] - sizes, spacing, directions and origin of the volume
//! - [`AttributeMap`] - raw `Segment<N>_<Key>:=<value>` fields by segment slot
//! - [`parse_header`] / [`serialize_header`] - the attribute/geometry codec pair

mod attributes;
mod codec;
mod fields;
mod geometry;

pub use attributes::{keys, segment_key, split_segment_key, AttributeMap, SEGMENT_PREFIX};
pub use codec::{parse_header, serialize_header, DataLayout, HeaderBlock, LayerAxis};
pub use geometry::Geometry;
