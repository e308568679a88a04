// src/header/attributes.rs
use std::collections::BTreeMap;

/// Raw segment attributes keyed by segment slot `N`, then by attribute key.
///
/// Both levels are ordered, which gives the serialized header its
/// deterministic order: increasing `N`, then lexicographic key.
pub type AttributeMap = BTreeMap<usize, BTreeMap<String, String>>;

pub const SEGMENT_PREFIX: &str = "Segment";

/// Recognized segment attribute keys
pub mod keys {
    pub const ID: &str = "ID";
    pub const NAME: &str = "Name";
    pub const LAYER: &str = "Layer";
    pub const LABEL_VALUE: &str = "LabelValue";
    pub const COLOR: &str = "Color";
    pub const EXTENT: &str = "Extent";
    pub const TAGS: &str = "Tags";
}

/// Split a custom field key of the form `Segment<N>_<Key>`.
///
/// Returns `None` for anything else, including `Segmentation_*` keys and
/// zero-padded indices such as `Segment01_Name`.
pub fn split_segment_key(key: &str) -> Option<(usize, &str)> {
    let (digits, attribute) = index_parts(key)?;
    if is_padded(digits) {
        return None;
    }
    Some((digits.parse().ok()?, attribute))
}

/// `Segment<N>_<Key>` with a leading zero in `N`, which would alias another slot
pub(crate) fn has_padded_index(key: &str) -> bool {
    index_parts(key).map_or(false, |(digits, _)| is_padded(digits))
}

fn index_parts(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix(SEGMENT_PREFIX)?;
    let digits_end = rest.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let attribute = rest[digits_end..].strip_prefix('_')?;
    if attribute.is_empty() {
        return None;
    }
    Some((&rest[..digits_end], attribute))
}

fn is_padded(digits: &str) -> bool {
    digits.len() > 1 && digits.starts_with('0')
}

pub fn segment_key(index: usize, attribute: &str) -> String {
    format!("{SEGMENT_PREFIX}{index}_{attribute}")
}

/// Number of layers implied by the `Layer` attributes (unparseable values are ignored)
pub(crate) fn layer_count_hint(attributes: &AttributeMap) -> usize {
    attributes
        .values()
        .map(|attrs| {
            attrs
                .get(keys::LAYER)
                .and_then(|layer| layer.trim().parse::<usize>().ok())
                .unwrap_or(0)
        })
        .max()
        .map_or(0, |max_layer| max_layer + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segment_key() {
        assert_eq!(split_segment_key("Segment0_Name"), Some((0, "Name")));
        assert_eq!(split_segment_key("Segment12_LabelValue"), Some((12, "LabelValue")));
        assert_eq!(split_segment_key("Segment3_Custom_Key"), Some((3, "Custom_Key")));
        assert_eq!(split_segment_key("Segmentation_MasterRepresentation"), None);
        assert_eq!(split_segment_key("Segment_Name"), None);
        assert_eq!(split_segment_key("Segment4"), None);
        assert_eq!(split_segment_key("Segment4_"), None);
    }

    #[test]
    fn test_padded_index_is_not_a_segment_key() {
        assert_eq!(split_segment_key("Segment01_Name"), None);
        assert_eq!(split_segment_key("Segment10_Name"), Some((10, "Name")));
        assert!(has_padded_index("Segment01_Name"));
        assert!(has_padded_index("Segment007_ID"));
        assert!(!has_padded_index("Segment0_Name"));
        assert!(!has_padded_index("Segment10_Name"));
        assert!(!has_padded_index("Segmentation_ConversionParameters"));
    }

    #[test]
    fn test_segment_key_roundtrip() {
        let key = segment_key(7, "Extent");
        assert_eq!(key, "Segment7_Extent");
        assert_eq!(split_segment_key(&key), Some((7, "Extent")));
    }

    #[test]
    fn test_layer_count_hint() {
        let mut attributes = AttributeMap::new();
        assert_eq!(layer_count_hint(&attributes), 0);

        attributes.entry(0).or_default().insert("Name".into(), "a".into());
        assert_eq!(layer_count_hint(&attributes), 1);

        attributes.entry(1).or_default().insert("Layer".into(), "2".into());
        assert_eq!(layer_count_hint(&attributes), 3);
    }
}
