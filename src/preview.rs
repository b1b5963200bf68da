//! Embedded preview images.

use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// An embedded secondary image, kept as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub mime_type: String,
    /// File extension including the leading dot, e.g. `.jpg`.
    pub extension: String,
    pub size: usize,
    /// `(width, height)` in pixels, `(0, 0)` when unknown.
    pub dimensions: (u32, u32),
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Preview {
    pub fn new(mime_type: &str, extension: &str, dimensions: (u32, u32), data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            extension: extension.to_string(),
            size: data.len(),
            dimensions,
            data,
        }
    }

    /// Write the preview to `path` with the extension appended, returning the
    /// path actually written.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<PathBuf, EngineError> {
        let mut target = OsString::from(path.as_ref().as_os_str());
        target.push(&self.extension);
        let target = PathBuf::from(target);
        std::fs::write(&target, &self.data)?;
        log::debug!("Preview written: {}", target.display());
        Ok(target)
    }
}
