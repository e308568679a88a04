// src/writer/sync_writer.rs
use crate::error::{Result, SegError};
use crate::header::{DataLayout, HeaderBlock};
use crate::registry::Segmentation;
use crate::types::{Encoding, Endian, VoxelType};
use crate::voxel::{encode_block, VoxelModel};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Data section settings used when writing a segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub encoding: Encoding,
    pub endian: Endian,
    /// Element type on disk; `None` keeps the voxel model's own type
    pub voxel_type: Option<VoxelType>,
    /// gzip level, 0 (none) to 9 (best)
    pub compression_level: u32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            encoding: Encoding::Gzip,
            endian: Endian::Little,
            voxel_type: None,
            compression_level: 6,
        }
    }
}

impl WriteOptions {
    /// Uncompressed payload
    pub fn raw() -> Self {
        WriteOptions {
            encoding: Encoding::Raw,
            ..Default::default()
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn with_voxel_type(mut self, voxel_type: VoxelType) -> Self {
        self.voxel_type = Some(voxel_type);
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }
}

/// Check that `voxels` provides an array of the right shape for every layer
/// the segmentation references.
pub fn check_voxels(segmentation: &Segmentation, voxels: &VoxelModel) -> Result<()> {
    let sizes = segmentation.geometry().sizes();
    if voxels.sizes() != sizes {
        return Err(SegError::IncompleteVoxelData(format!(
            "voxel arrays have sizes {:?}, geometry has {:?}",
            voxels.sizes(),
            sizes
        )));
    }
    if voxels.layer_count() < segmentation.layer_count() {
        return Err(SegError::IncompleteVoxelData(format!(
            "segments reference {} layers but only {} arrays were given",
            segmentation.layer_count(),
            voxels.layer_count()
        )));
    }
    Ok(())
}

/// Synchronous segmentation file writer
pub struct SegmentationWriter<W: Write> {
    out: W,
    options: WriteOptions,
    path: Option<PathBuf>,
}

impl SegmentationWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>, options: WriteOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| SegError::storage(path, e))?;
        Ok(SegmentationWriter {
            out: BufWriter::new(file),
            options,
            path: Some(path.to_path_buf()),
        })
    }
}

impl<W: Write> SegmentationWriter<W> {
    pub fn new(out: W, options: WriteOptions) -> Self {
        SegmentationWriter {
            out,
            options,
            path: None,
        }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Write the header followed by the voxel data.
    ///
    /// Several layers are stored Slicer-style, with the layer axis first and
    /// the layers interleaved voxel by voxel. A file always holds at least one
    /// layer: a model without layers is written as a single background layer
    /// and reads back with one layer.
    pub fn write(&mut self, segmentation: &Segmentation, voxels: &VoxelModel) -> Result<()> {
        check_voxels(segmentation, voxels)?;

        let voxel_type = self.resolve_voxel_type(voxels);
        let layout = DataLayout {
            voxel_type,
            encoding: self.options.encoding,
            endian: self.options.endian,
        };

        let values: Cow<'_, [u32]> = match voxels.layers() {
            [] => Cow::Owned(vec![0; segmentation.geometry().voxel_count()]),
            [single] => Cow::Borrowed(single.as_slice()),
            _ => Cow::Owned(voxels.interleaved_values()),
        };
        let layer_count = voxels.layer_count().max(1);

        let mut header = HeaderBlock::new(segmentation.geometry().clone(), layer_count, layout);
        header.attributes = segmentation.to_attributes();
        header.properties = segmentation.properties().clone();
        let header_bytes = header.to_bytes();

        let result = self.write_payload(&header_bytes, &values, layout);
        result.map_err(|e| e.with_path(self.path.as_deref()))?;

        debug!(
            "Wrote {} segments in {} layers as {} {}",
            segmentation.len(),
            layer_count,
            voxel_type.nrrd_name(),
            layout.encoding.nrrd_name()
        );
        Ok(())
    }

    fn write_payload(&mut self, header: &[u8], values: &[u32], layout: DataLayout) -> Result<()> {
        let payload = encode_block(values, layout.voxel_type, layout.endian)?;
        self.out.write_all(header)?;
        match layout.encoding {
            Encoding::Raw => self.out.write_all(&payload)?,
            Encoding::Gzip => {
                let level = Compression::new(self.options.compression_level.min(9));
                let mut encoder = GzEncoder::new(&mut self.out, level);
                encoder.write_all(&payload)?;
                encoder.finish()?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Configured type, widened when the labels present would not fit
    fn resolve_voxel_type(&self, voxels: &VoxelModel) -> VoxelType {
        let requested = self.options.voxel_type.unwrap_or(voxels.voxel_type());
        let max_label = voxels.max_label();
        if u64::from(max_label) <= requested.max_label() {
            return requested;
        }
        let widened = VoxelType::smallest_for(max_label);
        warn!(
            "Label value {max_label} does not fit in {}, writing {} instead",
            requested.nrrd_name(),
            widened.nrrd_name()
        );
        widened
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
