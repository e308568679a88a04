// src/reader/sync_reader.rs
use crate::error::{Result, SegError};
use crate::header::HeaderBlock;
use crate::registry::Segmentation;
use crate::types::Encoding;
use crate::voxel::{decode_block, LabelLayer, VoxelModel};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

#[cfg(feature = "mmap")]
use memmap2::Mmap;
#[cfg(feature = "mmap")]
use std::io::Cursor;

/// Trait alias for Read + Seek
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Synchronous segmentation file reader
///
/// Opening a file parses only the header; voxel data is read on demand,
/// one layer at a time or all at once.
pub struct SegmentationReader<R: ReadSeek> {
    file: R,
    header: HeaderBlock,
    path: Option<PathBuf>,
}

/// Constructor for standard file I/O
impl SegmentationReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SegError::storage(path, e))?;
        debug!("Opening segmentation {}", path.display());
        Self::with_source(BufReader::with_capacity(65536, file), Some(path.to_path_buf()))
    }
}

/// Constructor for memory-mapped file I/O (requires "mmap" feature)
#[cfg(feature = "mmap")]
impl SegmentationReader<Cursor<Mmap>> {
    pub fn open_mmap(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SegError::storage(path, e))?;
        let mmap = unsafe { Mmap::map(&file).map_err(|e| SegError::storage(path, e))? };
        debug!("Mapped segmentation {} ({} bytes)", path.display(), mmap.len());
        Self::with_source(Cursor::new(mmap), Some(path.to_path_buf()))
    }
}

impl<R: ReadSeek> SegmentationReader<R> {
    /// Parse the header of a stream positioned anywhere.
    pub fn new(file: R) -> Result<Self> {
        Self::with_source(file, None)
    }

    fn with_source(mut file: R, path: Option<PathBuf>) -> Result<Self> {
        let header = read_header(&mut file).map_err(|e| e.with_path(path.as_deref()))?;
        Ok(SegmentationReader { file, header, path })
    }

    pub fn header(&self) -> &HeaderBlock {
        &self.header
    }

    /// Number of layers stored in the file
    pub fn layer_count(&self) -> usize {
        self.header.layer_count
    }

    /// Segment registry and geometry, built from the header alone
    pub fn segmentation(&self) -> Result<Segmentation> {
        Segmentation::from_attributes(
            &self.header.attributes,
            self.header.geometry.clone(),
            self.header.properties.clone(),
        )
    }

    /// Read and decode a single layer.
    ///
    /// When layers are stored as consecutive blocks, raw payloads are read by
    /// seeking straight to the block and compressed payloads are streamed up
    /// to the end of the requested block only. Interleaved layers need the
    /// whole data section.
    pub fn load_layer(&mut self, index: usize) -> Result<LabelLayer> {
        let result = self.read_layer(index);
        result.map_err(|e| e.with_path(self.path.as_deref()))
    }

    /// Read every layer in one pass over the data section
    pub fn load_voxels(&mut self) -> Result<VoxelModel> {
        let result = self.read_voxels();
        result.map_err(|e| e.with_path(self.path.as_deref()))
    }

    fn read_layer(&mut self, index: usize) -> Result<LabelLayer> {
        if index >= self.header.layer_count {
            return Err(SegError::IncompleteVoxelData(format!(
                "layer {index} requested but the file has {} layers",
                self.header.layer_count
            )));
        }

        let sizes = self.header.geometry.sizes();
        if self.header.is_interleaved() {
            let values = self.read_payload()?;
            return LabelLayer::from_interleaved(sizes, &values, self.header.layer_count, index);
        }

        let block_len = self.header.layer_byte_len();
        let skip = index * block_len;
        let encoding = self.header.layout.encoding;
        let bytes = match encoding {
            Encoding::Raw => {
                self.ensure_raw_bytes(skip + block_len)?;
                self.file.seek(SeekFrom::Start(self.header.data_offset + skip as u64))?;
                read_exact_len(&mut self.file, block_len, "layer block")?
            }
            Encoding::Gzip => {
                let mut stream = self.data_stream()?;
                let skipped = io::copy(&mut Read::take(&mut stream, skip as u64), &mut io::sink())
                    .map_err(data_error)?;
                if skipped != skip as u64 {
                    return Err(SegError::IncompleteVoxelData(format!(
                        "data ends before layer {index}"
                    )));
                }
                read_exact_len(&mut stream, block_len, "layer block")?
            }
        };

        trace!("Loaded layer {index}: {} bytes", bytes.len());
        let layout = self.header.layout;
        LabelLayer::from_vec(sizes, decode_block(&bytes, layout.voxel_type, layout.endian)?)
    }

    fn read_voxels(&mut self) -> Result<VoxelModel> {
        let values = self.read_payload()?;
        let sizes = self.header.geometry.sizes();
        let voxel_type = self.header.layout.voxel_type;
        let layer_count = self.header.layer_count;

        let voxels = if self.header.is_interleaved() {
            VoxelModel::from_interleaved(sizes, voxel_type, layer_count, &values)?
        } else {
            let layers = values
                .chunks(self.header.layer_voxel_count())
                .map(|block| LabelLayer::from_vec(sizes, block.to_vec()))
                .collect::<Result<Vec<_>>>()?;
            VoxelModel::from_layers(sizes, voxel_type, layers)?
        };
        debug!("Loaded {} layers of {:?}", voxels.layer_count(), sizes);
        Ok(voxels)
    }

    /// Decoded label values of the whole data section, in file order
    fn read_payload(&mut self) -> Result<Vec<u32>> {
        let len = self.header.payload_byte_len();
        if self.header.layout.encoding == Encoding::Raw {
            self.ensure_raw_bytes(len)?;
        }
        let bytes = {
            let mut stream = self.data_stream()?;
            read_exact_len(&mut stream, len, "data section")?
        };
        let layout = self.header.layout;
        decode_block(&bytes, layout.voxel_type, layout.endian)
    }

    /// Fail early when a raw data section is shorter than the header declares
    fn ensure_raw_bytes(&mut self, needed: usize) -> Result<()> {
        let end = self.file.seek(SeekFrom::End(0))?;
        let available = end.saturating_sub(self.header.data_offset);
        if available < needed as u64 {
            return Err(SegError::IncompleteVoxelData(format!(
                "data section holds {available} bytes, header declares at least {needed}"
            )));
        }
        Ok(())
    }

    /// Decoded data section, positioned at its first byte
    fn data_stream(&mut self) -> Result<Box<dyn Read + '_>> {
        self.file.seek(SeekFrom::Start(self.header.data_offset))?;
        let encoding = self.header.layout.encoding;
        Ok(match encoding {
            Encoding::Raw => Box::new(&mut self.file),
            Encoding::Gzip => Box::new(MultiGzDecoder::new(&mut self.file)),
        })
    }
}

fn read_header<R: ReadSeek>(file: &mut R) -> Result<HeaderBlock> {
    file.seek(SeekFrom::Start(0))?;
    HeaderBlock::read_from(&mut BufReader::new(file))
}

/// Read exactly `len` bytes, growing the buffer only as data arrives
fn read_exact_len<S: Read + ?Sized>(stream: &mut S, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    Read::take(&mut *stream, len as u64)
        .read_to_end(&mut bytes)
        .map_err(data_error)?;
    if bytes.len() != len {
        return Err(SegError::IncompleteVoxelData(format!(
            "{what} needs {len} bytes, data ends after {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn data_error(err: io::Error) -> SegError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => SegError::IncompleteVoxelData(err.to_string()),
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
            SegError::Decompression(err.to_string())
        }
        _ => SegError::Io(err),
    }
}
