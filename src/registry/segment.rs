// src/registry/segment.rs
use crate::error::{Result, SegError};
use crate::header::keys;
use crate::types::{Color, Extent};
use std::collections::BTreeMap;

/// One segment of a segmentation
///
/// Recognized attributes are typed fields; every other attribute found under
/// the segment's prefix is kept verbatim in `tags` and written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: String,
    pub name: String,
    /// Index of the label layer holding this segment's voxels
    pub layer: usize,
    /// Voxel value marking this segment within its layer (never 0)
    pub label_value: u32,
    pub color: Option<Color>,
    pub extent: Option<Extent>,
    pub tags: BTreeMap<String, String>,
}

impl Segment {
    pub const DEFAULT_LAYER: usize = 0;
    pub const DEFAULT_LABEL_VALUE: u32 = 1;

    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Segment {
            id: id.into(),
            name: name.into(),
            layer: Self::DEFAULT_LAYER,
            label_value: Self::DEFAULT_LABEL_VALUE,
            color: None,
            extent: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_layer(mut self, layer: usize) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_label_value(mut self, label_value: u32) -> Self {
        self.label_value = label_value;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Build a segment from the raw attributes of slot `index`.
    pub fn from_attributes(index: usize, attrs: &BTreeMap<String, String>) -> Result<Self> {
        let required = |key: &str| {
            attrs.get(key).cloned().ok_or_else(|| {
                SegError::MalformedHeader(format!("segment {index} has no {key} attribute"))
            })
        };
        let id = required(keys::ID)?;
        let name = required(keys::NAME)?;

        let layer = match attrs.get(keys::LAYER) {
            Some(value) => parse_integer(index, keys::LAYER, value)?,
            None => Self::DEFAULT_LAYER,
        };
        let label_value = match attrs.get(keys::LABEL_VALUE) {
            Some(value) => parse_integer(index, keys::LABEL_VALUE, value)?,
            None => Self::DEFAULT_LABEL_VALUE,
        };
        if label_value == 0 {
            return Err(SegError::ReservedLabelValue { segment: name });
        }

        let color = attrs.get(keys::COLOR).map(|c| Color::parse(c)).transpose()?;
        let extent = attrs.get(keys::EXTENT).map(|e| Extent::parse(e)).transpose()?;

        let tags = attrs
            .iter()
            .filter(|(key, _)| !is_recognized(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Segment {
            id,
            name,
            layer,
            label_value,
            color,
            extent,
            tags,
        })
    }

    /// Inverse of [`Segment::from_attributes`]
    pub fn to_attributes(&self) -> BTreeMap<String, String> {
        let mut attrs = self.tags.clone();
        attrs.insert(keys::ID.to_string(), self.id.clone());
        attrs.insert(keys::NAME.to_string(), self.name.clone());
        attrs.insert(keys::LAYER.to_string(), self.layer.to_string());
        attrs.insert(keys::LABEL_VALUE.to_string(), self.label_value.to_string());
        if let Some(color) = &self.color {
            attrs.insert(keys::COLOR.to_string(), color.to_string());
        }
        if let Some(extent) = &self.extent {
            attrs.insert(keys::EXTENT.to_string(), extent.to_string());
        }
        attrs
    }

    /// Decode the Slicer `Tags` attribute (`key:value|key:value|`)
    pub fn tag_entries(&self) -> BTreeMap<String, String> {
        let Some(raw) = self.tags.get(keys::TAGS) else {
            return BTreeMap::new();
        };
        raw.split('|')
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (entry.to_string(), String::new()),
            })
            .collect()
    }

    /// The `TerminologyEntry` tag, if the segment carries one
    pub fn terminology(&self) -> Option<String> {
        self.tag_entries().remove("TerminologyEntry")
    }
}

fn is_recognized(key: &str) -> bool {
    matches!(
        key,
        keys::ID | keys::NAME | keys::LAYER | keys::LABEL_VALUE | keys::COLOR | keys::EXTENT
    )
}

fn parse_integer<T: std::str::FromStr>(index: usize, key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        SegError::MalformedHeader(format!("segment {index} has non-integer {key}: {value:?}"))
    })
}
