//! Image metadata sessions.
//!
//! An [`ImageMetadata`] owns one engine and, once [`read_metadata`] has run,
//! the EXIF, IPTC and XMP stores decoded from the image. Every accessor and
//! mutator works on those in-memory stores; nothing touches the image until
//! [`write_metadata`].
//!
//! [`read_metadata`]: ImageMetadata::read_metadata
//! [`write_metadata`]: ImageMetadata::write_metadata

use std::borrow::Cow;
use std::path::Path;

use crate::engine::{ContainerEngine, MetadataEngine, MetadataSet, WriteOptions};
use crate::error::{MetadataError, Result};
use crate::key::{Family, TagKey};
use crate::preview::Preview;
use crate::schema::{self, TagInfo};
use crate::store::MetadataStore;
use crate::tag::Tag;

/// Which families [`ImageMetadata::copy_to`] copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Families {
    pub exif: bool,
    pub iptc: bool,
    pub xmp: bool,
}

impl Families {
    pub const ALL: Families = Families {
        exif: true,
        iptc: true,
        xmp: true,
    };

    pub fn includes(self, family: Family) -> bool {
        match family {
            Family::Exif => self.exif,
            Family::Iptc => self.iptc,
            Family::Xmp => self.xmp,
        }
    }
}

impl Default for Families {
    fn default() -> Self {
        Self::ALL
    }
}

/// Metadata of one image.
///
/// ```rust,no_run
/// use image_meta::ImageMetadata;
///
/// # fn main() -> image_meta::Result<()> {
/// let mut meta = ImageMetadata::open("photo.jpg")?;
/// meta.read_metadata()?;
/// println!("{}", meta.get_tag("Exif.Image.Make")?.human_value());
/// meta.set_tag_values("Iptc.Application2.Keywords", &["harbour", "boats"])?;
/// meta.write_metadata()?;
/// # Ok(())
/// # }
/// ```
pub struct ImageMetadata {
    engine: Box<dyn MetadataEngine>,
    data: Option<MetadataSet>,
}

impl ImageMetadata {
    /// Open an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_engine(ContainerEngine::open(path)?))
    }

    /// Open an image held in memory.
    pub fn from_buffer(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Ok(Self::with_engine(ContainerEngine::from_buffer(bytes)?))
    }

    pub fn with_engine(engine: impl MetadataEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            data: None,
        }
    }

    /// Decode the image's metadata, replacing any unsaved changes.
    pub fn read_metadata(&mut self) -> Result<()> {
        let data = self.engine.read_metadata()?;
        self.data = Some(data);
        Ok(())
    }

    pub fn is_read(&self) -> bool {
        self.data.is_some()
    }

    /// Persist the current stores back into the image.
    pub fn write_metadata(&mut self) -> Result<()> {
        self.write_metadata_with(&WriteOptions::default())
    }

    pub fn write_metadata_with(&mut self, options: &WriteOptions) -> Result<()> {
        let data = self.data.as_ref().ok_or(MetadataError::MetadataNotRead)?;
        self.engine.write_metadata(data, options)?;
        Ok(())
    }

    fn data(&self) -> Result<&MetadataSet> {
        self.data.as_ref().ok_or(MetadataError::MetadataNotRead)
    }

    fn data_mut(&mut self) -> Result<&mut MetadataSet> {
        self.data.as_mut().ok_or(MetadataError::MetadataNotRead)
    }

    fn parse_key(key: &str) -> Result<TagKey> {
        Ok(schema::canonicalize(key.parse::<TagKey>()?))
    }

    fn resolve(&self, key: &str) -> Result<(TagKey, TagInfo)> {
        let key = Self::parse_key(key)?;
        let info = self.engine.tag_info(&key)?;
        Ok((key, info))
    }

    /// Store of one family.
    pub fn store(&self, family: Family) -> Result<&MetadataStore> {
        Ok(self.data()?.store(family))
    }

    /// Unique keys of `family` in store order.
    pub fn keys(&self, family: Family) -> Result<Vec<&TagKey>> {
        Ok(self.store(family)?.keys())
    }

    pub fn exif_keys(&self) -> Result<Vec<&TagKey>> {
        self.keys(Family::Exif)
    }

    pub fn iptc_keys(&self) -> Result<Vec<&TagKey>> {
        self.keys(Family::Iptc)
    }

    pub fn xmp_keys(&self) -> Result<Vec<&TagKey>> {
        self.keys(Family::Xmp)
    }

    /// The tag for `key` with all its values, borrowed from the store.
    pub fn get_tag(&self, key: &str) -> Result<Tag<'_>> {
        let data = self.data()?;
        let (key, info) = self.resolve(key)?;

        let values: Vec<Cow<'_, str>> = data
            .store(key.family())
            .iter()
            .filter(|d| d.key() == &key)
            .map(|d| Cow::Borrowed(d.value()))
            .collect();
        if values.is_empty() {
            return Err(MetadataError::KeyNotFound(key.to_string()));
        }

        let human_values = values.iter().map(|v| self.engine.render(&key, v)).collect();
        Ok(Tag {
            key,
            info,
            values,
            human_values,
        })
    }

    /// Every tag of `family`, in key order.
    pub fn tags(&self, family: Family) -> Result<Vec<Tag<'_>>> {
        self.keys(family)?
            .into_iter()
            .map(|key| self.get_tag(&key.to_string()))
            .collect()
    }

    /// Create `key` or overwrite its value.
    pub fn set_tag_value(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_tag_values(key, &[value])
    }

    /// Make `values` the values of `key`, in order.
    ///
    /// Existing occurrences are overwritten in place, extra values appended,
    /// and surplus occurrences removed; an empty slice deletes the tag. More
    /// than one value for a non-repeatable tag fails with
    /// [`MetadataError::NonRepeatableTag`]. Nothing changes when any value is
    /// rejected.
    pub fn set_tag_values<S: AsRef<str>>(&mut self, key: &str, values: &[S]) -> Result<()> {
        self.data()?;
        let (key, info) = self.resolve(key)?;
        for value in values {
            self.engine.check_value(&key, &info, value.as_ref())?;
        }
        self.data_mut()?
            .store_mut(key.family())
            .set_values(&key, values, info.repeatable)
    }

    /// Remove every occurrence of `key`.
    pub fn delete_tag(&mut self, key: &str) -> Result<()> {
        self.data()?;
        let (key, _) = self.resolve(key)?;
        let removed = self.data_mut()?.store_mut(key.family()).remove_all(&key);
        if removed == 0 {
            return Err(MetadataError::KeyNotFound(key.to_string()));
        }
        log::debug!("{key}: {removed} removed");
        Ok(())
    }

    /// Embedded previews, smallest first.
    pub fn previews(&self) -> Result<Vec<Preview>> {
        self.data()?;
        Ok(self.engine.previews()?)
    }

    /// Replace the chosen families of `other` with copies of this session's.
    /// Both sessions must have been read.
    pub fn copy_to(&self, other: &mut ImageMetadata, families: Families) -> Result<()> {
        let source = self.data()?;
        let target = other.data_mut()?;
        for family in Family::ALL {
            if families.includes(family) {
                *target.store_mut(family) = source.store(family).clone();
                log::debug!("Copied {} {family} data", source.store(family).len());
            }
        }
        Ok(())
    }

    pub fn comment(&self) -> Result<Option<&str>> {
        Ok(self.data()?.comment.as_deref())
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        self.data_mut()?.comment = Some(comment.into());
        Ok(())
    }

    pub fn clear_comment(&mut self) -> Result<()> {
        self.data_mut()?.comment = None;
        Ok(())
    }

    pub fn mime_type(&self) -> &str {
        self.engine.mime_type()
    }

    /// Pixel dimensions of the main image.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        Ok(self.engine.dimensions()?)
    }

    /// Current image bytes; reflects written metadata for in-memory images.
    pub fn buffer(&self) -> &[u8] {
        self.engine.buffer()
    }
}
