//! # Catalogue Document
//!
//! JSON shape of `database.json`:
//!
//! ```text
//! { name, effects: [..], item_tags: [..], conversion_tags: [..],
//!   items: [ { name, image?, tags: [..],
//!              conversions: [ { tags: [..], inputs: [..], outputs: [..] } ] } ] }
//! ```
//!
//! Every cross-reference is by name. Names may repeat; on import the last
//! declaration wins the name lookup.
//!
//! Documents written before tags existed carry no tag arrays, so every tag
//! list defaults to empty when absent.

use serde::{Deserialize, Serialize};

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// The whole catalogue, flattened to names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDocument {
    pub name: String,

    pub effects: Vec<String>,

    #[serde(default)]
    pub item_tags: Vec<String>,

    #[serde(default)]
    pub conversion_tags: Vec<String>,

    pub items: Vec<ItemRecord>,
}

/// One item and the conversions it carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,

    /// Attachment key under `images/`, if the item has an image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub conversions: Vec<ConversionRecord>,
}

/// One conversion, inlined into the item that carries it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    #[serde(default)]
    pub tags: Vec<String>,

    pub inputs: Vec<String>,

    pub outputs: Vec<String>,
}

// =============================================================================
// FILE NAMES
// =============================================================================

/// Lowercase `name`, then replace every character outside `[a-z0-9.]`
/// with `_`.
#[must_use]
pub fn to_file_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Attachment key for an item image: the item name plus the image's
/// extension (see `Blob::extension`), sanitized with `to_file_name`.
#[must_use]
pub fn attachment_name(item_name: &str, extension: &str) -> String {
    to_file_name(&format!("{}{}", item_name, extension))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_each_disallowed_char() {
        assert_eq!(to_file_name("Fire Sword!.PNG"), "fire_sword_.png");
        assert_eq!(to_file_name("a-b_c d"), "a_b_c_d");
        assert_eq!(to_file_name("Potion #3.v2"), "potion__3.v2");
    }

    #[test]
    fn sanitize_non_ascii_becomes_underscore() {
        assert_eq!(to_file_name("Épée"), "_p_e");
    }

    #[test]
    fn sanitize_maps_each_scalar_once() {
        // Characters outside the basic plane still take a single slot.
        assert_eq!(to_file_name("Fire🔥"), "fire_");
    }

    #[test]
    fn attachment_name_lowercases_extension() {
        assert_eq!(attachment_name("Fire Sword!", ".PNG"), "fire_sword_.png");
        assert_eq!(attachment_name("Map", ".GZ"), "map.gz");
    }

    #[test]
    fn attachment_name_without_extension() {
        assert_eq!(attachment_name("Ice Wand", ""), "ice_wand");
    }

    #[test]
    fn image_omitted_when_absent() {
        let record = ItemRecord {
            name: "Ice Wand".to_string(),
            ..ItemRecord::default()
        };
        let json = serde_json::to_string(&record).expect("serialize");
        assert_eq!(json, r#"{"name":"Ice Wand","tags":[],"conversions":[]}"#);
    }

    #[test]
    fn legacy_document_without_tags() {
        let json = r#"{
            "name": "Old",
            "effects": ["Heat"],
            "items": [{"name": "Torch", "conversions": [{"inputs": [], "outputs": ["Heat"]}]}]
        }"#;
        let doc: DatabaseDocument = serde_json::from_str(json).expect("parse");

        assert!(doc.item_tags.is_empty());
        assert!(doc.conversion_tags.is_empty());
        assert!(doc.items[0].tags.is_empty());
        assert!(doc.items[0].image.is_none());
        assert_eq!(doc.items[0].conversions[0].outputs, vec!["Heat".to_string()]);
    }

    #[test]
    fn document_field_order() {
        let doc = DatabaseDocument {
            name: "Alchemy".to_string(),
            effects: vec!["Heat".to_string()],
            ..DatabaseDocument::default()
        };
        let json = serde_json::to_string(&doc).expect("serialize");
        assert_eq!(
            json,
            r#"{"name":"Alchemy","effects":["Heat"],"item_tags":[],"conversion_tags":[],"items":[]}"#
        );
    }
}
