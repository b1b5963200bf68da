//! Tag descriptors returned by [`ImageMetadata::get_tag`](crate::ImageMetadata::get_tag).

use serde::Serialize;
use std::borrow::Cow;

use crate::key::TagKey;
use crate::schema::TagInfo;

/// A tag with its schema information and values.
///
/// Values borrow from the session's store while the descriptor is alive, so
/// the store cannot be mutated underneath it. Call [`Tag::into_owned`] to get
/// a detached copy that outlives the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag<'a> {
    pub key: TagKey,
    pub info: TagInfo,
    /// Raw values in store order; one entry unless the tag repeats.
    pub values: Vec<Cow<'a, str>>,
    /// Human-readable renderings, parallel to `values`.
    pub human_values: Vec<String>,
}

impl<'a> Tag<'a> {
    /// First raw value.
    pub fn value(&self) -> &str {
        self.values.first().map_or("", |v| &**v)
    }

    /// First human-readable value.
    pub fn human_value(&self) -> &str {
        self.human_values.first().map_or("", String::as_str)
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn label(&self) -> &str {
        &self.info.label
    }

    pub fn description(&self) -> &str {
        &self.info.description
    }

    pub fn type_name(&self) -> &str {
        &self.info.type_name
    }

    pub fn is_repeatable(&self) -> bool {
        self.info.repeatable
    }

    pub fn is_borrowed(&self) -> bool {
        self.values.iter().any(|v| matches!(v, Cow::Borrowed(_)))
    }

    pub fn into_owned(self) -> Tag<'static> {
        Tag {
            key: self.key,
            info: self.info,
            values: self
                .values
                .into_iter()
                .map(|v| Cow::Owned(v.into_owned()))
                .collect(),
            human_values: self.human_values,
        }
    }
}
