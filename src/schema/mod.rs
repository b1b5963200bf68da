//! Built-in tag schema.
//!
//! A compact dictionary of commonly used EXIF tags, IPTC datasets and XMP
//! properties. It answers the questions a session needs before touching a
//! store: is the key valid, what is it called, what type does it carry, and
//! may it repeat.

pub mod exif;
pub mod iptc;
pub mod xmp;

use serde::Serialize;

use crate::error::EngineError;
use crate::key::{Family, TagKey};

/// Schema information about a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    pub name: String,
    pub label: String,
    pub description: String,
    /// Exiv2-style type name, e.g. `Ascii`, `Short`, `Date`, `XmpBag`.
    pub type_name: String,
    pub repeatable: bool,
}

impl TagInfo {
    pub(crate) fn new(
        name: &str,
        label: &str,
        description: &str,
        type_name: &str,
        repeatable: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            type_name: type_name.to_string(),
            repeatable,
        }
    }
}

/// Look up `key` in the built-in tables.
pub fn lookup(key: &TagKey) -> Result<TagInfo, EngineError> {
    let info = match key.family() {
        Family::Exif => exif::lookup(key),
        Family::Iptc => iptc::lookup(key),
        Family::Xmp => xmp::lookup(key),
    };
    info.ok_or_else(|| EngineError::invalid_key(&key.to_string()))
}

/// Rewrite alternative spellings to the key the stores use.
///
/// IPTC datasets may be addressed by number (`Iptc.Application2.0x0019`);
/// known numbers are mapped back to their names.
pub fn canonicalize(key: TagKey) -> TagKey {
    match key.family() {
        Family::Iptc => iptc::resolve(&key)
            .map(|(record, dataset)| iptc::key_for(record, dataset))
            .unwrap_or(key),
        _ => key,
    }
}

/// "SupplementalCategories" -> "Supplemental Categories".
pub(crate) fn label_from_name(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if let Some(p) = prev {
            if c.is_uppercase() && p.is_lowercase() {
                label.push(' ');
            }
        }
        label.push(c);
        prev = Some(c);
    }
    if let Some(first) = label.get(..1) {
        let upper = first.to_uppercase();
        label.replace_range(..1, &upper);
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorKind;

    fn key(s: &str) -> TagKey {
        s.parse().unwrap()
    }

    #[test]
    fn lookup_dispatches_by_family() {
        assert_eq!(lookup(&key("Exif.Image.Make")).unwrap().type_name, "Ascii");
        assert!(lookup(&key("Iptc.Application2.Keywords")).unwrap().repeatable);
        assert_eq!(lookup(&key("Xmp.dc.subject")).unwrap().type_name, "XmpBag");
    }

    #[test]
    fn unknown_keys_are_invalid() {
        let err = lookup(&key("Exif.Image.NoSuchTag")).unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::InvalidKey);
        assert_eq!(err.message(), "Invalid key 'Exif.Image.NoSuchTag'");
        assert!(lookup(&key("Iptc.Nowhere.Keywords")).is_err());
        assert!(lookup(&key("Xmp.nosuchns.thing")).is_err());
    }

    #[test]
    fn canonicalizes_numeric_iptc_names() {
        let k = canonicalize(key("Iptc.Application2.0x0019"));
        assert_eq!(k.to_string(), "Iptc.Application2.Keywords");
        let unknown = canonicalize(key("Iptc.Application2.0x00c8"));
        assert_eq!(unknown.to_string(), "Iptc.Application2.0x00c8");
    }

    #[test]
    fn labels_split_camel_case() {
        assert_eq!(label_from_name("SupplementalCategories"), "Supplemental Categories");
        assert_eq!(label_from_name("subject"), "Subject");
        assert_eq!(label_from_name("GPSLatitude"), "GPSLatitude");
    }
}
