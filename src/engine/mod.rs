//! The seam between a session and the code that understands image containers.
//!
//! A [`MetadataEngine`] decodes a container into a [`MetadataSet`], encodes a
//! set back, and answers schema questions. Sessions never touch container
//! bytes themselves.
//!
//! - [`ContainerEngine`] works on real JPEG, PNG, WebP and TIFF data.
//! - [`MemoryEngine`] keeps everything in memory; useful in tests and when
//!   metadata comes from somewhere other than an image.

mod container;
mod memory;

pub use container::ContainerEngine;
pub use memory::MemoryEngine;

use crate::error::EngineError;
use crate::key::{Family, TagKey};
use crate::preview::Preview;
use crate::schema::TagInfo;
use crate::store::MetadataStore;

/// Everything an engine reads from, or writes to, one image.
#[derive(Debug, Clone, Default)]
pub struct MetadataSet {
    pub exif: MetadataStore,
    pub iptc: MetadataStore,
    pub xmp: MetadataStore,
    /// JPEG comment (COM segment).
    pub comment: Option<String>,
}

impl MetadataSet {
    pub fn store(&self, family: Family) -> &MetadataStore {
        match family {
            Family::Exif => &self.exif,
            Family::Iptc => &self.iptc,
            Family::Xmp => &self.xmp,
        }
    }

    pub fn store_mut(&mut self, family: Family) -> &mut MetadataStore {
        match family {
            Family::Exif => &mut self.exif,
            Family::Iptc => &mut self.iptc,
            Family::Xmp => &mut self.xmp,
        }
    }
}

/// Options for [`MetadataEngine::write_metadata`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Restore the file's access and modification times after writing.
    pub preserve_timestamps: bool,
}

pub trait MetadataEngine: Send {
    /// Decode all metadata from the underlying image.
    fn read_metadata(&mut self) -> Result<MetadataSet, EngineError>;

    /// Encode `metadata` into the underlying image and persist it.
    fn write_metadata(
        &mut self,
        metadata: &MetadataSet,
        options: &WriteOptions,
    ) -> Result<(), EngineError>;

    /// Schema information for `key`; fails for keys the engine cannot store.
    fn tag_info(&self, key: &TagKey) -> Result<TagInfo, EngineError>;

    /// Reject values that cannot be encoded for `key`.
    fn check_value(&self, _key: &TagKey, _info: &TagInfo, _value: &str) -> Result<(), EngineError> {
        Ok(())
    }

    /// Human-readable form of a raw value.
    fn render(&self, _key: &TagKey, value: &str) -> String {
        value.to_string()
    }

    /// Embedded previews, smallest first.
    fn previews(&self) -> Result<Vec<Preview>, EngineError>;

    fn mime_type(&self) -> &str;

    /// Pixel dimensions of the main image.
    fn dimensions(&self) -> Result<(u32, u32), EngineError>;

    /// Current bytes of the image, including any written metadata.
    fn buffer(&self) -> &[u8];
}
