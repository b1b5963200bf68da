//! Tag keys of the form `Family.Group.Name`.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Metadata family a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Exif,
    Iptc,
    Xmp,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Exif, Family::Iptc, Family::Xmp];

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Exif => "Exif",
            Family::Iptc => "Iptc",
            Family::Xmp => "Xmp",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exif" => Ok(Family::Exif),
            "iptc" => Ok(Family::Iptc),
            "xmp" => Ok(Family::Xmp),
            _ => Err(EngineError::invalid_key(s)),
        }
    }
}

/// A parsed tag key, e.g. `Exif.Image.Make` or `Iptc.Application2.Keywords`.
///
/// For IPTC keys the group is the record name and the name is the dataset.
/// For XMP keys the group is the namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey {
    family: Family,
    group: String,
    name: String,
}

impl TagKey {
    pub fn new(family: Family, group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            family,
            group: group.into(),
            name: name.into(),
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for TagKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');
        let (Some(family), Some(group), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(EngineError::invalid_key(s));
        };
        if group.is_empty() || name.is_empty() {
            return Err(EngineError::invalid_key(s));
        }
        let family = family
            .parse::<Family>()
            .map_err(|_| EngineError::invalid_key(s))?;
        Ok(TagKey::new(family, group, name))
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.family, self.group, self.name)
    }
}

impl Serialize for TagKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorKind;

    #[test]
    fn parses_three_part_keys() {
        let key: TagKey = "Exif.Image.Make".parse().unwrap();
        assert_eq!(key.family(), Family::Exif);
        assert_eq!(key.group(), "Image");
        assert_eq!(key.name(), "Make");
        assert_eq!(key.to_string(), "Exif.Image.Make");
    }

    #[test]
    fn family_is_case_insensitive_but_displayed_canonically() {
        let key: TagKey = "iptc.Application2.Keywords".parse().unwrap();
        assert_eq!(key.family(), Family::Iptc);
        assert_eq!(key.to_string(), "Iptc.Application2.Keywords");
    }

    #[test]
    fn name_keeps_trailing_dots() {
        let key: TagKey = "Xmp.xmpMM.History[1]/stEvt:when.x".parse().unwrap();
        assert_eq!(key.group(), "xmpMM");
        assert_eq!(key.name(), "History[1]/stEvt:when.x");
    }

    #[test]
    fn rejects_malformed_keys() {
        for bad in ["", "Exif", "Exif.Image", "Exif..Make", "Exif.Image.", "Foo.Bar.Baz"] {
            let err = bad.parse::<TagKey>().unwrap_err();
            assert_eq!(err.kind(), EngineErrorKind::InvalidKey, "{bad}");
        }
    }

    #[test]
    fn serializes_as_string() {
        let key: TagKey = "Xmp.dc.subject".parse().unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"Xmp.dc.subject\"");
    }
}
