// src/lib.rs
//! # segnrrd-rs
//!
//! A Rust library for reading, extracting and writing labelled-volume
//! segmentation files in the 3D Slicer `.seg.nrrd` convention.
//!
//! ## Features
//!
//! - **Header-only reads**: segment names, colors and geometry without decoding voxels
//! - **Per-layer loading**: read just the label layer you need
//! - **Extraction**: reduce a segmentation to selected segments, one per layer
//! - **Round-trip writing**: segment tags and segmentation properties are preserved
//! - **Compression**: raw or gzip payloads, any integer voxel type
//!
//! ## Quick Start
//!
//! ### Inspecting a Segmentation
//!
//! ```rust,no_run
//! use segnrrd_rs::*;
//!
//! fn main() -> Result<()> {
//!     let segmentation = read_segmentation_info("Segmentation.seg.nrrd")?;
//!     println!("Segments: {}", segment_names(&segmentation).join(", "));
//!
//!     let liver = segment_from_name(&segmentation, "liver")?;
//!     println!("liver is label {} in layer {}", liver.label_value, liver.layer);
//!     Ok(())
//! }
//! ```
//!
//! ### Extracting Segments
//!
//! ```rust,no_run
//! use segnrrd_rs::*;
//!
//! fn main() -> Result<()> {
//!     let (segmentation, voxels) = read_segmentation("Segmentation.seg.nrrd", None)?;
//!     let (kidneys, kidney_voxels) =
//!         extract_segments(&segmentation, &voxels, &["left kidney", "right kidney"])?;
//!
//!     write_segmentation("kidneys.seg.nrrd", &kidneys, &kidney_voxels, &WriteOptions::default())?;
//!     Ok(())
//! }
//! ```

// Modules
pub mod error;
pub mod types;
pub mod header;
pub mod registry;
pub mod voxel;
pub mod reader;
pub mod writer;
pub mod engine;

mod utils;

// Re-export commonly used types at the crate root for convenience
pub use error::{SegError, Result};

// Type exports
pub use types::{
    Color,
    Encoding,
    Endian,
    Extent,
    VoxelType,
};

// Header exports
pub use header::{
    parse_header,
    serialize_header,
    AttributeMap,
    DataLayout,
    Geometry,
    HeaderBlock,
    LayerAxis,
};

// Registry exports
pub use registry::{
    build_segments,
    Segment,
    Segmentation,
};

// Voxel exports
pub use voxel::{
    LabelLayer,
    Mask,
    VoxelModel,
};

// Reader / writer exports
pub use reader::SegmentationReader;
pub use writer::{SegmentationWriter, WriteOptions};

// Operations
pub use engine::{
    extract_segments,
    merge_segments,
    read_segmentation,
    read_segmentation_info,
    segment_from_name,
    segment_names,
    write_segmentation,
};

// Prelude module for glob imports
pub mod prelude {
    //! Convenient imports for common use cases.
    //!
    //! ```rust
    //! use segnrrd_rs::prelude::*;
    //! ```

    pub use crate::engine::{
        extract_segments, read_segmentation, read_segmentation_info, segment_from_name,
        segment_names, write_segmentation,
    };
    pub use crate::error::{Result, SegError};
    pub use crate::registry::{Segment, Segmentation};
    pub use crate::voxel::VoxelModel;
    pub use crate::writer::WriteOptions;
}

// Version information
/// The NRRD format version written by this library
pub const NRRD_VERSION: &str = HeaderBlock::VERSION;

/// The library version
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constants() {
        assert_eq!(NRRD_VERSION, "NRRD0004");
        assert!(!LIBRARY_VERSION.is_empty());
    }

    #[test]
    fn test_voxel_type_sizes() {
        assert_eq!(VoxelType::I8.fixed_size(), 1);
        assert_eq!(VoxelType::U16.fixed_size(), 2);
        assert_eq!(VoxelType::I32.fixed_size(), 4);
        assert_eq!(VoxelType::U64.fixed_size(), 8);
        assert!(VoxelType::I16.is_signed());
        assert!(!VoxelType::U8.is_signed());
    }

    #[test]
    fn test_default_layout() {
        let layout = DataLayout::default();
        assert_eq!(layout.voxel_type, VoxelType::U8);
        assert_eq!(layout.encoding, Encoding::Gzip);
        assert_eq!(layout.endian, Endian::Little);

        let options = WriteOptions::default();
        assert_eq!(options.encoding, Encoding::Gzip);
        assert_eq!(options.compression_level, 6);
        assert_eq!(WriteOptions::raw().with_compression_level(42).compression_level, 9);
    }

    #[test]
    fn test_values_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Segmentation>();
        assert_send_sync::<VoxelModel>();
        assert_send_sync::<SegError>();
    }

    #[test]
    fn test_reader_over_memory() {
        let segmentation = Segmentation::new(
            vec![Segment::new("Segment_1", "tumor").with_color(Color::new(1.0, 0.0, 0.0))],
            Geometry::identity([2, 2, 1]),
        )
        .unwrap();
        let mut layer = LabelLayer::zeros([2, 2, 1]);
        layer.set([1, 1, 0], 1);
        let voxels = VoxelModel::from_layers([2, 2, 1], VoxelType::U8, vec![layer]).unwrap();

        let mut writer = SegmentationWriter::new(Vec::new(), WriteOptions::default());
        writer.write(&segmentation, &voxels).unwrap();

        let mut reader = SegmentationReader::new(std::io::Cursor::new(writer.into_inner())).unwrap();
        let info = reader.segmentation().unwrap();
        assert_eq!(segment_names(&info), vec!["tumor"]);
        assert_eq!(reader.load_layer(0).unwrap().get([1, 1, 0]), 1);
    }
}
