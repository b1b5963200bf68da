//! # image-meta
//!
//! Read, edit and write EXIF, IPTC and XMP metadata of images. Each family is
//! held as an ordered store of `(key, value)` entries; keys may repeat for
//! tags such as `Iptc.Application2.Keywords` or `Xmp.dc.subject`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image_meta::ImageMetadata;
//!
//! fn main() -> image_meta::Result<()> {
//!     let mut meta = ImageMetadata::open("photo.jpg")?;
//!     meta.read_metadata()?;
//!
//!     for key in meta.exif_keys()? {
//!         let tag = meta.get_tag(&key.to_string())?;
//!         println!("{:<36} {}", tag.key, tag.human_value());
//!     }
//!
//!     // Replace every keyword with exactly these, in this order
//!     meta.set_tag_values("Iptc.Application2.Keywords", &["harbour", "boats", "dusk"])?;
//!     meta.set_tag_value("Xmp.dc.title", "Evening in the harbour")?;
//!     meta.delete_tag("Exif.Image.Software")?;
//!
//!     meta.write_metadata()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Copying Between Images
//!
//! ```rust,no_run
//! use image_meta::{Families, ImageMetadata};
//!
//! fn main() -> image_meta::Result<()> {
//!     let mut source = ImageMetadata::open("original.jpg")?;
//!     let mut target = ImageMetadata::open("edited.jpg")?;
//!     source.read_metadata()?;
//!     target.read_metadata()?;
//!
//!     source.copy_to(&mut target, Families { exif: false, ..Families::ALL })?;
//!     target.write_metadata()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Format | EXIF | IPTC | XMP | Comment |
//! |--------|------|------|-----|---------|
//! | JPEG (`.jpg`, `.jpeg`) | read/write | read/write | read/write | read/write |
//! | PNG (`.png`) | read/write | - | - | - |
//! | WebP (`.webp`) | read/write | - | - | - |
//! | TIFF (`.tif`, `.tiff`) | read | - | - | - |
//!
//! ## Modules
//!
//! - [`metadata`]: [`ImageMetadata`] sessions, the main entry point
//! - [`store`]: ordered metadata stores and the multi-value reconciler
//! - [`engine`]: the engine trait plus container and in-memory engines
//! - [`schema`]: built-in tag tables for the three families
//! - [`key`], [`tag`], [`value`]: keys, tag descriptors, value formats
//! - [`preview`]: embedded preview images
//! - [`error`]: error taxonomy and categories
//! - [`config`], [`files`]: CLI configuration and image discovery

pub mod config;
pub mod engine;
pub mod error;
pub(crate) mod exif;
pub mod files;
pub mod format;
pub(crate) mod iptc;
pub mod key;
pub mod metadata;
pub mod preview;
pub mod schema;
pub mod store;
pub mod tag;
pub mod value;
pub(crate) mod xmp;

pub use error::{MetadataError, Result};
pub use key::{Family, TagKey};
pub use metadata::{Families, ImageMetadata};
pub use tag::Tag;
