//! Error types for metadata sessions and engines.
//!
//! Wrapper-level failures ([`MetadataError::MetadataNotRead`],
//! [`MetadataError::KeyNotFound`], [`MetadataError::NonRepeatableTag`]) carry
//! fixed messages. Everything the engine reports travels as an
//! [`EngineError`] with its own message preserved verbatim.
//!
//! Every error can be folded into a coarse [`ErrorCategory`] for callers that
//! only care about the broad class of a failure:
//!
//! ```
//! use image_meta::error::{EngineError, EngineErrorKind, ErrorCategory, MetadataError};
//!
//! let err = MetadataError::from(EngineError::new(EngineErrorKind::InvalidKey, "Invalid key 'Foo'"));
//! assert_eq!(err.category(), ErrorCategory::Validation);
//! assert_eq!(err.to_string(), "Invalid key 'Foo'");
//! ```

use std::fmt;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Errors surfaced by an [`ImageMetadata`](crate::ImageMetadata) session.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A tag, preview, comment or copy operation ran before `read_metadata`.
    #[error("Image metadata has not been read yet")]
    MetadataNotRead,

    /// The key is valid but no datum carries it.
    #[error("Tag not set: {0}")]
    KeyNotFound(String),

    /// More than one value was supplied for a non-repeatable tag.
    #[error("Tag is not repeatable: {0}")]
    NonRepeatableTag(String),

    /// Failure reported by the metadata engine.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl MetadataError {
    /// Broad class of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            MetadataError::MetadataNotRead => ErrorCategory::Io,
            MetadataError::KeyNotFound(_) => ErrorCategory::NotFound,
            MetadataError::NonRepeatableTag(_) => ErrorCategory::Validation,
            MetadataError::Engine(e) => e.category(),
        }
    }

    /// The engine error kind, if this error came from the engine.
    pub fn engine_kind(&self) -> Option<EngineErrorKind> {
        match self {
            MetadataError::Engine(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

/// What went wrong inside an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineErrorKind {
    /// Reading or writing the underlying file failed.
    Io,
    /// The image file does not exist.
    NotFound,
    /// The container format is not recognized, or cannot carry the data.
    UnsupportedFormat,
    /// Metadata blocks could not be decoded.
    CorruptData,
    /// The tag key is malformed or unknown to the schema.
    InvalidKey,
    /// The value cannot be encoded for the tag's type.
    InvalidValue,
    /// An allocation failed.
    OutOfMemory,
    /// Anything else, including codec panics.
    Internal,
}

/// Coarse classification used when mapping errors onto caller-facing types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Io,
    Validation,
    NotFound,
    ResourceExhausted,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Io => "io",
            ErrorCategory::Validation => "validation",
            ErrorCategory::NotFound => "not-found",
            ErrorCategory::ResourceExhausted => "resource-exhausted",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(name)
    }
}

const CATEGORY_TABLE: &[(EngineErrorKind, ErrorCategory)] = &[
    (EngineErrorKind::Io, ErrorCategory::Io),
    (EngineErrorKind::NotFound, ErrorCategory::NotFound),
    (EngineErrorKind::UnsupportedFormat, ErrorCategory::Io),
    (EngineErrorKind::CorruptData, ErrorCategory::Validation),
    (EngineErrorKind::InvalidKey, ErrorCategory::Validation),
    (EngineErrorKind::InvalidValue, ErrorCategory::Validation),
    (EngineErrorKind::OutOfMemory, ErrorCategory::ResourceExhausted),
    (EngineErrorKind::Internal, ErrorCategory::Internal),
];

impl EngineErrorKind {
    pub fn category(self) -> ErrorCategory {
        CATEGORY_TABLE
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, category)| *category)
            .unwrap_or(ErrorCategory::Internal)
    }
}

/// An error reported by a [`MetadataEngine`](crate::engine::MetadataEngine).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    kind: EngineErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> EngineErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub(crate) fn invalid_key(key: &str) -> Self {
        Self::new(EngineErrorKind::InvalidKey, format!("Invalid key '{key}'"))
    }

    pub(crate) fn invalid_value(key: &str, value: &str, reason: &str) -> Self {
        Self::new(
            EngineErrorKind::InvalidValue,
            format!("Invalid value '{value}' for {key}: {reason}"),
        )
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::UnsupportedFormat, message)
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::CorruptData, message)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => EngineErrorKind::NotFound,
            std::io::ErrorKind::OutOfMemory => EngineErrorKind::OutOfMemory,
            _ => EngineErrorKind::Io,
        };
        EngineError::new(kind, err.to_string()).with_source(err)
    }
}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Engine(err.into())
    }
}
