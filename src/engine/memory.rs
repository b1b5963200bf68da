use std::collections::HashMap;

use super::{MetadataEngine, MetadataSet, WriteOptions};
use crate::error::EngineError;
use crate::key::TagKey;
use crate::preview::Preview;
use crate::schema::{self, TagInfo, label_from_name};

/// An engine that persists to memory.
///
/// Reading returns a copy of the persisted set; writing replaces it. Schema
/// answers come from the built-in tables, with optional repeatability
/// overrides per key.
///
/// ```rust
/// use image_meta::ImageMetadata;
/// use image_meta::engine::{MemoryEngine, MetadataSet};
///
/// let mut meta = ImageMetadata::with_engine(MemoryEngine::new(MetadataSet::default()));
/// meta.read_metadata().unwrap();
/// meta.set_tag_values("Iptc.Application2.Keywords", &["sky", "sea"]).unwrap();
/// assert_eq!(meta.get_tag("Iptc.Application2.Keywords").unwrap().values, ["sky", "sea"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    persisted: MetadataSet,
    repeatable: HashMap<TagKey, bool>,
    previews: Vec<Preview>,
    dimensions: (u32, u32),
    buffer: Vec<u8>,
}

impl MemoryEngine {
    pub fn new(metadata: MetadataSet) -> Self {
        Self {
            persisted: metadata,
            ..Self::default()
        }
    }

    /// Override the repeatability the schema reports for `key`.
    pub fn with_repeatable(mut self, key: TagKey, repeatable: bool) -> Self {
        self.repeatable.insert(key, repeatable);
        self
    }

    pub fn with_previews(mut self, mut previews: Vec<Preview>) -> Self {
        previews.sort_by_key(|p| p.size);
        self.previews = previews;
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = (width, height);
        self
    }

    /// What the last write persisted (or the initial set).
    pub fn persisted(&self) -> &MetadataSet {
        &self.persisted
    }
}

impl MetadataEngine for MemoryEngine {
    fn read_metadata(&mut self) -> Result<MetadataSet, EngineError> {
        Ok(self.persisted.clone())
    }

    fn write_metadata(
        &mut self,
        metadata: &MetadataSet,
        _options: &WriteOptions,
    ) -> Result<(), EngineError> {
        self.persisted = metadata.clone();
        Ok(())
    }

    fn tag_info(&self, key: &TagKey) -> Result<TagInfo, EngineError> {
        let overridden = self.repeatable.get(key).copied();
        match (schema::lookup(key), overridden) {
            (Ok(mut info), Some(repeatable)) => {
                info.repeatable = repeatable;
                Ok(info)
            }
            (Ok(info), None) => Ok(info),
            (Err(_), Some(repeatable)) => Ok(TagInfo::new(
                key.name(),
                &label_from_name(key.name()),
                "",
                "String",
                repeatable,
            )),
            (Err(e), None) => Err(e),
        }
    }

    fn previews(&self) -> Result<Vec<Preview>, EngineError> {
        Ok(self.previews.clone())
    }

    fn mime_type(&self) -> &str {
        "application/octet-stream"
    }

    fn dimensions(&self) -> Result<(u32, u32), EngineError> {
        Ok(self.dimensions)
    }

    fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}
