//! Container formats and what each can carry.

use image::ImageFormat;
use std::path::Path;

use crate::key::Family;

/// Image container understood by [`ContainerEngine`](crate::engine::ContainerEngine).
///
/// | Format | EXIF | IPTC | XMP | Comment | Previews |
/// |--------|------|------|-----|---------|----------|
/// | JPEG   | read/write | read/write | read/write | read/write | EXIF thumbnail |
/// | PNG    | read/write | - | - | - | - |
/// | WebP   | read/write | - | - | - | - |
/// | TIFF   | read | - | - | - | EXIF thumbnail |
///
/// ```rust
/// use image_meta::format::ImageKind;
/// use std::path::Path;
///
/// assert_eq!(ImageKind::from_path(Path::new("photo.JPG")), Some(ImageKind::Jpeg));
/// assert_eq!(ImageKind::Png.mime_type(), "image/png");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
    Tiff,
}

impl ImageKind {
    /// Determine the image kind from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "jpe" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Sniff the format from the leading bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Tiff => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Tiff => "image/tiff",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::WebP => ImageFormat::WebP,
            Self::Tiff => ImageFormat::Tiff,
        }
    }

    /// Whether metadata of `family` can be written back into this container.
    pub fn can_write(self, family: Family) -> bool {
        match self {
            Self::Jpeg => true,
            Self::Png | Self::WebP => family == Family::Exif,
            Self::Tiff => false,
        }
    }

    /// JPEG COM segments only.
    pub fn supports_comment(self) -> bool {
        self == Self::Jpeg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── ImageKind::from_path ──────────────────────────────────────────

    #[test]
    fn image_kind_jpeg() {
        assert_eq!(ImageKind::from_path(Path::new("photo.jpg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("photo.jpeg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("PHOTO.JPG")), Some(ImageKind::Jpeg));
    }

    #[test]
    fn image_kind_others() {
        assert_eq!(ImageKind::from_path(Path::new("image.png")), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_path(Path::new("image.webp")), Some(ImageKind::WebP));
        assert_eq!(ImageKind::from_path(Path::new("scan.tif")), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::from_path(Path::new("scan.TIFF")), Some(ImageKind::Tiff));
    }

    #[test]
    fn image_kind_unsupported() {
        assert_eq!(ImageKind::from_path(Path::new("doc.pdf")), None);
        assert_eq!(ImageKind::from_path(Path::new("photo.heic")), None);
        assert_eq!(ImageKind::from_path(Path::new("noext")), None);
    }

    // ── ImageKind::from_bytes ─────────────────────────────────────────

    #[test]
    fn sniffs_magic_numbers() {
        assert_eq!(ImageKind::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]), Some(ImageKind::Jpeg));
        assert_eq!(
            ImageKind::from_bytes(b"\x89PNG\r\n\x1a\n\0\0\0\0"),
            Some(ImageKind::Png)
        );
        assert_eq!(ImageKind::from_bytes(b"II*\0\x08\0\0\0"), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::from_bytes(b"MM\0*\0\0\0\x08"), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::from_bytes(b"hello world"), None);
        assert_eq!(ImageKind::from_bytes(&[]), None);
    }

    // ── capabilities ──────────────────────────────────────────────────

    #[test]
    fn write_capabilities() {
        assert!(ImageKind::Jpeg.can_write(Family::Iptc));
        assert!(ImageKind::Png.can_write(Family::Exif));
        assert!(!ImageKind::Png.can_write(Family::Xmp));
        assert!(!ImageKind::WebP.can_write(Family::Iptc));
        assert!(!ImageKind::Tiff.can_write(Family::Exif));
        assert!(ImageKind::Jpeg.supports_comment());
        assert!(!ImageKind::Png.supports_comment());
    }

    #[test]
    fn mime_types() {
        assert_eq!(ImageKind::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageKind::WebP.mime_type(), "image/webp");
        assert_eq!(ImageKind::Tiff.mime_type(), "image/tiff");
    }
}
