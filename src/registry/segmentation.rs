// src/registry/segmentation.rs
use crate::error::{Result, SegError};
use crate::header::{AttributeMap, Geometry};
use crate::registry::Segment;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Build typed segments from a raw attribute map, in increasing slot order.
///
/// Slot numbers need not be contiguous; only their order is kept.
pub fn build_segments(attributes: &AttributeMap) -> Result<Vec<Segment>> {
    let segments = attributes
        .iter()
        .map(|(index, attrs)| Segment::from_attributes(*index, attrs))
        .collect::<Result<Vec<_>>>()?;
    validate_segments(&segments)?;
    Ok(segments)
}

/// Check uniqueness of names, identifiers and (layer, label value) pairs
pub(crate) fn validate_segments(segments: &[Segment]) -> Result<()> {
    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    let mut labels = HashSet::new();

    for segment in segments {
        if segment.label_value == 0 {
            return Err(SegError::ReservedLabelValue {
                segment: segment.name.clone(),
            });
        }
        if !names.insert(segment.name.as_str()) {
            return Err(SegError::DuplicateName(segment.name.clone()));
        }
        if !ids.insert(segment.id.as_str()) {
            return Err(SegError::DuplicateIdentifier(segment.id.clone()));
        }
        if !labels.insert((segment.layer, segment.label_value)) {
            return Err(SegError::InvalidLabelAssignment {
                layer: segment.layer,
                label_value: segment.label_value,
            });
        }
    }
    Ok(())
}

/// Segment list plus volume geometry of one segmentation file
///
/// Values are immutable once built: every transformation produces a new
/// `Segmentation`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    segments: Vec<Segment>,
    geometry: Geometry,
    properties: BTreeMap<String, String>,
}

impl Segmentation {
    /// Validate and assemble a segmentation.
    pub fn new(segments: Vec<Segment>, geometry: Geometry) -> Result<Self> {
        Self::with_properties(segments, geometry, BTreeMap::new())
    }

    /// Like [`Segmentation::new`], also keeping non-segment header key/values
    pub fn with_properties(
        segments: Vec<Segment>,
        geometry: Geometry,
        properties: BTreeMap<String, String>,
    ) -> Result<Self> {
        validate_segments(&segments)?;

        let sizes = geometry.sizes();
        for segment in &segments {
            if let Some(extent) = &segment.extent {
                if !extent.fits_within(sizes) {
                    return Err(SegError::InvalidExtent {
                        segment: segment.name.clone(),
                        extent: extent.to_string(),
                    });
                }
            }
        }

        Ok(Segmentation {
            segments,
            geometry,
            properties,
        })
    }

    /// Build from the raw header pieces produced by the header codec
    pub fn from_attributes(
        attributes: &AttributeMap,
        geometry: Geometry,
        properties: BTreeMap<String, String>,
    ) -> Result<Self> {
        let segments = build_segments(attributes)?;
        debug!("Built registry of {} segments", segments.len());
        Self::with_properties(segments, geometry, properties)
    }

    /// Attribute map with segments renumbered `0..n` in registry order
    pub fn to_attributes(&self) -> AttributeMap {
        self.segments
            .iter()
            .enumerate()
            .map(|(index, segment)| (index, segment.to_attributes()))
            .collect()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// `1 + max(layer)`, or 0 without segments
    pub fn layer_count(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.layer + 1)
            .max()
            .unwrap_or(0)
    }

    /// Segment names in registry (file) order
    pub fn segment_names(&self) -> Vec<&str> {
        self.segments.iter().map(|segment| segment.name.as_str()).collect()
    }

    /// Exact, case-sensitive lookup by display name
    pub fn find_by_name(&self, name: &str) -> Result<&Segment> {
        self.segments
            .iter()
            .find(|segment| segment.name == name)
            .ok_or_else(|| SegError::SegmentNotFound(name.to_string()))
    }

    /// Exact, case-sensitive lookup by identifier
    pub fn find_by_identifier(&self, id: &str) -> Result<&Segment> {
        self.segments
            .iter()
            .find(|segment| segment.id == id)
            .ok_or_else(|| SegError::SegmentNotFound(id.to_string()))
    }

    /// Resolve a selector against names first, then identifiers
    pub fn resolve(&self, selector: &str) -> Result<&Segment> {
        self.find_by_name(selector)
            .or_else(|_| self.find_by_identifier(selector))
    }
}
