// src/header/codec.rs
use crate::error::{Result, SegError};
use crate::header::attributes::{
    has_padded_index, layer_count_hint, segment_key, split_segment_key, AttributeMap,
};
use crate::header::fields::{self, names, HeaderLine};
use crate::header::geometry::Geometry;
use crate::types::{Encoding, Endian, VoxelType};
use crate::utils::{decode_header_line, escape_key_value};
use std::collections::BTreeMap;
use std::io::{BufRead, Cursor};
use tracing::{debug, trace};

/// How the voxel payload is stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLayout {
    pub voxel_type: VoxelType,
    pub encoding: Encoding,
    pub endian: Endian,
}

impl Default for DataLayout {
    fn default() -> Self {
        DataLayout {
            voxel_type: VoxelType::U8,
            encoding: Encoding::Gzip,
            endian: Endian::Little,
        }
    }
}

/// Position of the layer (`list`) axis in a 4D file
///
/// NRRD stores axis 0 fastest, so with the layer axis first the layers are
/// interleaved voxel by voxel; with it last each layer is one contiguous block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerAxis {
    /// `sizes: L X Y Z`, as written by 3D Slicer
    #[default]
    First,
    /// `sizes: X Y Z L`
    Last,
}

/// Fully parsed textual header of a segmentation file
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    pub version: String,
    pub geometry: Geometry,
    /// Number of voxel blocks in the payload (1 when there is no layer axis)
    pub layer_count: usize,
    pub layer_axis: LayerAxis,
    pub layout: DataLayout,
    pub attributes: AttributeMap,
    /// Key/value pairs that do not belong to a segment, e.g. `Segmentation_*`
    pub properties: BTreeMap<String, String>,
    /// Standard fields this crate does not interpret, in file order
    pub extra_fields: Vec<(String, String)>,
    /// Byte offset of the attached data section
    pub data_offset: u64,
}

impl HeaderBlock {
    pub const VERSION: &'static str = "NRRD0004";

    pub fn new(geometry: Geometry, layer_count: usize, layout: DataLayout) -> Self {
        HeaderBlock {
            version: Self::VERSION.to_string(),
            geometry,
            layer_count,
            layer_axis: LayerAxis::First,
            layout,
            attributes: AttributeMap::new(),
            properties: BTreeMap::new(),
            extra_fields: Vec::new(),
            data_offset: 0,
        }
    }

    /// Voxels in one layer block
    pub fn layer_voxel_count(&self) -> usize {
        self.geometry.voxel_count()
    }

    /// Decoded (uncompressed) byte length of one layer block
    pub fn layer_byte_len(&self) -> usize {
        self.layer_voxel_count() * self.layout.voxel_type.fixed_size()
    }

    /// Decoded byte length of the whole data section
    pub fn payload_byte_len(&self) -> usize {
        self.layer_byte_len() * self.layer_count
    }

    /// Whether the layers are interleaved voxel by voxel in the payload
    pub fn is_interleaved(&self) -> bool {
        self.layer_count > 1 && self.layer_axis == LayerAxis::First
    }

    /// Read the header up to and including the blank separator line.
    ///
    /// The reader is left positioned at the start of the data section.
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut line = Vec::with_capacity(256);
        let mut consumed = reader.read_until(b'\n', &mut line)? as u64;
        let version = fields::check_magic(decode_header_line(&line)?)?;

        let mut raw_fields: Vec<(String, String)> = Vec::new();
        let mut attributes = AttributeMap::new();
        let mut properties = BTreeMap::new();

        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }
            consumed += n as u64;

            match HeaderLine::parse(decode_header_line(&line)?)? {
                HeaderLine::End => break,
                HeaderLine::Comment => {}
                HeaderLine::Field { name, value } => {
                    if raw_fields.iter().any(|(existing, _)| *existing == name) {
                        return Err(SegError::MalformedHeader(format!("duplicate field {name:?}")));
                    }
                    raw_fields.push((name, value));
                }
                HeaderLine::KeyValue { key, value } => match split_segment_key(&key) {
                    Some((index, attribute)) => {
                        attributes
                            .entry(index)
                            .or_default()
                            .insert(attribute.to_string(), value);
                    }
                    None if has_padded_index(&key) => {
                        return Err(SegError::MalformedHeader(format!(
                            "zero-padded segment index in {key:?}"
                        )));
                    }
                    None => {
                        properties.insert(key, value);
                    }
                },
            }
        }

        let mut block = Self::from_fields(version, raw_fields)?;
        block.attributes = attributes;
        block.properties = properties;
        block.data_offset = consumed;

        debug!(
            "Parsed header: {} segments, {} layers, sizes {:?}, {} {}",
            block.attributes.len(),
            block.layer_count,
            block.geometry.sizes(),
            block.layout.voxel_type.nrrd_name(),
            block.layout.encoding.nrrd_name(),
        );
        Ok(block)
    }

    fn from_fields(version: String, raw_fields: Vec<(String, String)>) -> Result<Self> {
        let mut known: BTreeMap<String, String> = BTreeMap::new();
        let mut extra_fields = Vec::new();
        for (name, value) in raw_fields {
            match name.as_str() {
                names::TYPE | names::DIMENSION | names::SPACE | names::SPACE_DIMENSION | names::SIZES
                | names::SPACE_DIRECTIONS | names::KINDS | names::ENCODING | names::ENDIAN
                | names::SPACE_ORIGIN => {
                    known.insert(name, value);
                }
                names::DATA_FILE => {
                    return Err(SegError::Unsupported("detached data files".to_string()));
                }
                names::LINE_SKIP | names::BYTE_SKIP => {
                    if value.trim() != "0" {
                        return Err(SegError::Unsupported(format!("{name}: {value}")));
                    }
                }
                _ => {
                    trace!("Keeping unrecognized field {name:?}");
                    extra_fields.push((name, value));
                }
            }
        }

        fn require<'a>(known: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str> {
            known
                .get(name)
                .map(String::as_str)
                .ok_or_else(|| SegError::MalformedHeader(format!("missing required field {name:?}")))
        }

        let type_name = require(&known, names::TYPE)?;
        let voxel_type = VoxelType::from_nrrd_name(type_name)
            .ok_or_else(|| SegError::Unsupported(format!("voxel type {type_name:?}")))?;

        let encoding_name = require(&known, names::ENCODING)?;
        let encoding = Encoding::from_nrrd_name(encoding_name)
            .ok_or_else(|| SegError::Unsupported(format!("encoding {encoding_name:?}")))?;

        let endian = match known.get(names::ENDIAN) {
            Some(name) => Endian::from_nrrd_name(name)
                .ok_or_else(|| SegError::MalformedHeader(format!("invalid endian {name:?}")))?,
            None if voxel_type.fixed_size() > 1 => {
                return Err(SegError::MalformedHeader(
                    "missing endian field for multi-byte voxel type".to_string(),
                ));
            }
            None => Endian::Little,
        };

        let dimension: usize = require(&known, names::DIMENSION)?
            .trim()
            .parse()
            .map_err(|_| SegError::MalformedHeader("non-integer dimension".to_string()))?;
        if dimension != 3 && dimension != 4 {
            return Err(SegError::MalformedHeader(format!(
                "dimension must be 3, or 4 with a leading layer axis, found {dimension}"
            )));
        }

        let sizes = fields::parse_usize_list(names::SIZES, require(&known, names::SIZES)?)?;
        let directions = fields::parse_direction_list(require(&known, names::SPACE_DIRECTIONS)?)?;
        let origin = fields::parse_vector(require(&known, names::SPACE_ORIGIN)?)?;

        if sizes.len() != dimension || directions.len() != dimension {
            return Err(SegError::MalformedHeader(format!(
                "dimension is {dimension} but found {} sizes and {} space directions",
                sizes.len(),
                directions.len()
            )));
        }
        if let Some(kinds) = known.get(names::KINDS) {
            let count = kinds.split_whitespace().count();
            if count != dimension {
                return Err(SegError::MalformedHeader(format!(
                    "dimension is {dimension} but found {count} kinds"
                )));
            }
        }
        if let Some(space_dimension) = known.get(names::SPACE_DIMENSION) {
            if space_dimension.trim() != "3" {
                return Err(SegError::MalformedHeader(format!(
                    "space dimension must be 3, found {space_dimension}"
                )));
            }
        }

        // The axis without a space direction is the layer axis.
        let (layer_axis, layer_count, spatial_sizes, spatial_directions) = if dimension == 4 {
            if directions[0].is_none() {
                (LayerAxis::First, sizes[0], &sizes[1..], &directions[1..])
            } else if directions[3].is_none() {
                (LayerAxis::Last, sizes[3], &sizes[..3], &directions[..3])
            } else {
                return Err(SegError::MalformedHeader(
                    "4D volume needs a first or last layer axis with direction none".to_string(),
                ));
            }
        } else {
            (LayerAxis::First, 1, &sizes[..], &directions[..])
        };
        if layer_count == 0 {
            return Err(SegError::MalformedHeader("layer axis has size 0".to_string()));
        }

        let spatial_directions = spatial_directions
            .iter()
            .map(|entry| {
                entry.clone().ok_or_else(|| {
                    SegError::MalformedHeader("spatial axis has no space direction".to_string())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let space = known.get(names::SPACE).map(|s| s.trim().to_string());
        let geometry = Geometry::from_parts(spatial_sizes, &spatial_directions, &origin, space)?;

        let payload_len = geometry
            .sizes()
            .iter()
            .try_fold(voxel_type.fixed_size(), |acc, &size| acc.checked_mul(size))
            .and_then(|len| len.checked_mul(layer_count))
            .ok_or_else(|| SegError::MalformedHeader(format!("data size of {sizes:?} overflows")))?;
        trace!("Declared data section: {payload_len} bytes");

        Ok(HeaderBlock {
            version,
            geometry,
            layer_count,
            layer_axis,
            layout: DataLayout {
                voxel_type,
                encoding,
                endian,
            },
            attributes: AttributeMap::new(),
            properties: BTreeMap::new(),
            extra_fields,
            data_offset: 0,
        })
    }

    /// Serialize the header, including the trailing blank line.
    pub fn to_bytes(&self) -> Vec<u8> {
        let geometry = &self.geometry;
        let layered = self.layer_count > 1;
        let mut lines: Vec<String> = Vec::new();

        lines.push(self.version.clone());
        lines.push("# Complete NRRD file format specification at:".to_string());
        lines.push("# http://teem.sourceforge.net/nrrd/format.html".to_string());
        lines.push(format!("{}: {}", names::TYPE, self.layout.voxel_type.nrrd_name()));
        lines.push(format!("{}: {}", names::DIMENSION, if layered { 4 } else { 3 }));
        if let Some(space) = geometry.space() {
            lines.push(format!("{}: {space}", names::SPACE));
        }

        let mut sizes: Vec<String> = geometry.sizes().iter().map(|s| s.to_string()).collect();
        let mut directions: Vec<String> = geometry
            .space_directions()
            .iter()
            .map(|v| fields::format_vector(v))
            .collect();
        let mut kinds = vec!["domain"; 3];
        if layered {
            let at = match self.layer_axis {
                LayerAxis::First => 0,
                LayerAxis::Last => 3,
            };
            sizes.insert(at, self.layer_count.to_string());
            directions.insert(at, "none".to_string());
            kinds.insert(at, "list");
        }
        lines.push(format!("{}: {}", names::SIZES, sizes.join(" ")));
        lines.push(format!("{}: {}", names::SPACE_DIRECTIONS, directions.join(" ")));
        lines.push(format!("{}: {}", names::KINDS, kinds.join(" ")));
        lines.push(format!("{}: {}", names::ENCODING, self.layout.encoding.nrrd_name()));
        if self.layout.voxel_type.fixed_size() > 1 {
            lines.push(format!("{}: {}", names::ENDIAN, self.layout.endian.nrrd_name()));
        }
        lines.push(format!(
            "{}: {}",
            names::SPACE_ORIGIN,
            fields::format_vector(&geometry.origin())
        ));
        for (name, value) in &self.extra_fields {
            lines.push(format!("{name}: {value}"));
        }

        for (key, value) in &self.properties {
            lines.push(format!("{}:={}", escape_key_value(key), escape_key_value(value)));
        }
        for (index, attrs) in &self.attributes {
            for (attribute, value) in attrs {
                lines.push(format!(
                    "{}:={}",
                    escape_key_value(&segment_key(*index, attribute)),
                    escape_key_value(value)
                ));
            }
        }

        let mut out = lines.join("\n").into_bytes();
        out.extend_from_slice(b"\n\n");
        debug!("Serialized header: {} bytes, {} segments", out.len(), self.attributes.len());
        out
    }
}

/// Parse a header into its segment attribute map and geometry.
pub fn parse_header(raw: &[u8]) -> Result<(AttributeMap, Geometry)> {
    let block = HeaderBlock::read_from(&mut Cursor::new(raw))?;
    Ok((block.attributes, block.geometry))
}

/// Serialize an attribute map and geometry into header bytes.
///
/// The layer axis is sized from the `Layer` attributes; the data layout is
/// the default one (`uint8`, gzip).
pub fn serialize_header(attributes: &AttributeMap, geometry: &Geometry) -> Vec<u8> {
    let layer_count = layer_count_hint(attributes).max(1);
    let mut block = HeaderBlock::new(geometry.clone(), layer_count, DataLayout::default());
    block.attributes = attributes.clone();
    block.to_bytes()
}
