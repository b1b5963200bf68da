use image::ImageReader;
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::png::Png;
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF};
use little_exif::exif_tag::ExifTag;
use std::fs::{File, FileTimes};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::{MetadataEngine, MetadataSet, WriteOptions};
use crate::error::{EngineError, EngineErrorKind};
use crate::exif::{self, reader, thumbnail, writer};
use crate::format::ImageKind;
use crate::iptc;
use crate::key::{Family, TagKey};
use crate::preview::Preview;
use crate::schema::{self, TagInfo};
use crate::schema::xmp::XmpKind;
use crate::store::MetadataStore;
use crate::xmp::{self, XmpContext};

const APP1: u8 = 0xE1;
const APP13: u8 = 0xED;
const COM: u8 = 0xFE;
const EXIF_PREFIX: &[u8] = b"Exif\0\0";
// Segment length field (u16) minus its own two bytes
const MAX_SEGMENT_CONTENTS: usize = 65533;

/// Families whose stores differ from the last read.
#[derive(Debug, Clone, Copy, Default)]
struct Dirty {
    exif: bool,
    iptc: bool,
    xmp: bool,
    comment: bool,
}

impl Dirty {
    fn between(previous: &MetadataSet, current: &MetadataSet) -> Self {
        Self {
            exif: !current.exif.same_content(&previous.exif),
            iptc: !current.iptc.same_content(&previous.iptc),
            xmp: !current.xmp.same_content(&previous.xmp),
            comment: current.comment != previous.comment,
        }
    }

    fn family(self, family: Family) -> bool {
        match family {
            Family::Exif => self.exif,
            Family::Iptc => self.iptc,
            Family::Xmp => self.xmp,
        }
    }

    fn any(self) -> bool {
        self.exif || self.iptc || self.xmp || self.comment
    }
}

/// Engine over real image containers, in a file or in memory.
///
/// JPEG carries all families plus the comment. PNG and WebP carry EXIF only.
/// TIFF is read-only. Writing re-encodes only the families that changed
/// since the last read, so untouched segments stay byte-identical.
pub struct ContainerEngine {
    path: Option<PathBuf>,
    kind: ImageKind,
    bytes: Vec<u8>,
    last_read: Option<MetadataSet>,
    /// EXIF tags without a store key and their generic IFD, re-emitted on write.
    passthrough: Vec<(u32, ExifTag)>,
    xmp: XmpContext,
}

impl ContainerEngine {
    /// Open an image file. The file is rewritten in place on write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut engine = Self::from_buffer(bytes)?;
        engine.path = Some(path.to_path_buf());
        log::debug!("Opened {} ({})", path.display(), engine.kind.mime_type());
        Ok(engine)
    }

    /// Work on an in-memory image; writes update [`buffer`](MetadataEngine::buffer).
    pub fn from_buffer(bytes: impl Into<Vec<u8>>) -> Result<Self, EngineError> {
        let bytes = bytes.into();
        let kind = ImageKind::from_bytes(&bytes)
            .ok_or_else(|| EngineError::unsupported("The memory contains data of an unknown image type"))?;
        Ok(Self {
            path: None,
            kind,
            bytes,
            last_read: None,
            passthrough: Vec::new(),
            xmp: XmpContext::default(),
        })
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The raw TIFF block holding EXIF, wherever the container keeps it.
    fn embedded_exif(&self) -> Option<Bytes> {
        let data = Bytes::copy_from_slice(&self.bytes);
        match self.kind {
            ImageKind::Jpeg => Jpeg::from_bytes(data).ok()?.exif(),
            ImageKind::Png => Png::from_bytes(data).ok()?.exif(),
            ImageKind::WebP => WebP::from_bytes(data).ok()?.exif(),
            ImageKind::Tiff => Some(data),
        }
    }

    fn read_exif(&mut self, store: &mut MetadataStore) {
        let loaded = self
            .embedded_exif()
            .and_then(|tiff| reader::load_metadata(tiff.to_vec()));
        let Some(metadata) = loaded else {
            return;
        };

        let decoded = reader::decode(&metadata);
        for (group, name, value) in decoded.entries {
            store.push(TagKey::new(Family::Exif, group, name), value);
        }
        self.passthrough = decoded.passthrough;
    }

    fn read_jpeg_segments(&mut self, set: &mut MetadataSet) -> Result<(), EngineError> {
        let jpeg = parse_jpeg(&self.bytes)?;
        for segment in jpeg.segments() {
            let contents = segment.contents();
            match segment.marker() {
                APP13 if contents.starts_with(iptc::IPTC_HEADER) => {
                    iptc::decode(contents, &mut set.iptc)?;
                }
                APP1 => {
                    if let Some(packet) = xmp::packet_of(contents) {
                        xmp::decode(packet, &mut set.xmp, &mut self.xmp)?;
                    }
                }
                COM if set.comment.is_none() => {
                    let text = String::from_utf8_lossy(contents);
                    set.comment = Some(text.trim_end_matches('\0').to_string());
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn encode_jpeg(&self, metadata: &MetadataSet, dirty: Dirty) -> Result<Vec<u8>, EngineError> {
        let mut jpeg = parse_jpeg(&self.bytes)?;

        if dirty.exif {
            // Remember where the EXIF segment was originally positioned
            let orig_exif_pos = find_segment(jpeg.segments(), APP1, EXIF_PREFIX);
            let payload = writer::encode(&metadata.exif, &self.passthrough)?;
            if let Some(tiff) = &payload {
                check_segment_size("EXIF block", EXIF_PREFIX.len() + tiff.len())?;
            }
            let has_payload = payload.is_some();
            jpeg.set_exif(payload.map(Bytes::from));

            // set_exif() inserts at a fixed position, which may be after XMP APP1.
            // Move the EXIF segment back to where it was.
            if has_payload {
                if let Some(new_pos) = find_segment(jpeg.segments(), APP1, EXIF_PREFIX) {
                    let target_pos = orig_exif_pos.unwrap_or(1); // default: right after APP0
                    if target_pos < new_pos {
                        let segments = jpeg.segments_mut();
                        let seg = segments.remove(new_pos);
                        segments.insert(target_pos, seg);
                    }
                }
            }
        }

        if dirty.iptc {
            let pos = find_segment(jpeg.segments(), APP13, iptc::IPTC_HEADER);
            let existing = pos.map(|p| jpeg.segments()[p].contents().to_vec());
            let contents = iptc::build_segment(existing.as_deref(), &metadata.iptc)?;
            replace_segment(jpeg.segments_mut(), pos, APP13, contents)?;
        }

        if dirty.xmp {
            let pos = find_segment(jpeg.segments(), APP1, xmp::XMP_HEADER);
            let contents = xmp::build_packet(&metadata.xmp, &self.xmp)?
                .map(|packet| xmp::segment_contents(&packet));
            replace_segment(jpeg.segments_mut(), pos, APP1, contents)?;
        }

        if dirty.comment {
            if let Some(text) = &metadata.comment {
                check_segment_size("Comment", text.len())?;
            }
            let segments = jpeg.segments_mut();
            let pos = segments.iter().position(|s| s.marker() == COM);
            segments.retain(|s| s.marker() != COM);
            if let Some(text) = &metadata.comment {
                let at = pos.unwrap_or_else(|| after_app_segments(segments));
                segments.insert(
                    at.min(segments.len()),
                    JpegSegment::new_with_contents(COM, Bytes::from(text.clone().into_bytes())),
                );
            }
        }

        Ok(jpeg.encoder().bytes().to_vec())
    }

    /// Replace the EXIF block of a PNG or WebP container.
    fn encode_exif_only(&self, metadata: &MetadataSet) -> Result<Vec<u8>, EngineError> {
        let payload = writer::encode(&metadata.exif, &self.passthrough)?.map(Bytes::from);
        let data = Bytes::copy_from_slice(&self.bytes);
        let bytes = match self.kind {
            ImageKind::Png => {
                let mut png = Png::from_bytes(data)
                    .map_err(|e| EngineError::corrupt(format!("Failed to parse PNG: {e}")))?;
                png.set_exif(payload);
                png.encoder().bytes()
            }
            ImageKind::WebP => {
                let mut webp = WebP::from_bytes(data)
                    .map_err(|e| EngineError::corrupt(format!("Failed to parse WebP: {e}")))?;
                webp.set_exif(payload);
                webp.encoder().bytes()
            }
            ImageKind::Jpeg | ImageKind::Tiff => {
                return Err(EngineError::unsupported(format!(
                    "EXIF-only encoding does not apply to {}",
                    self.kind.mime_type()
                )));
            }
        };
        Ok(bytes.to_vec())
    }
}

impl MetadataEngine for ContainerEngine {
    fn read_metadata(&mut self) -> Result<MetadataSet, EngineError> {
        let mut set = MetadataSet::default();
        self.passthrough.clear();
        self.xmp = XmpContext::default();

        self.read_exif(&mut set.exif);
        if self.kind == ImageKind::Jpeg {
            self.read_jpeg_segments(&mut set)?;
        }

        log::debug!(
            "Read {} EXIF, {} IPTC, {} XMP data",
            set.exif.len(),
            set.iptc.len(),
            set.xmp.len()
        );
        self.last_read = Some(set.clone());
        Ok(set)
    }

    fn write_metadata(
        &mut self,
        metadata: &MetadataSet,
        options: &WriteOptions,
    ) -> Result<(), EngineError> {
        let previous = self.last_read.clone().unwrap_or_default();
        let dirty = Dirty::between(&previous, metadata);
        if !dirty.any() {
            log::debug!("No metadata changes to write");
            return Ok(());
        }

        for family in Family::ALL {
            if dirty.family(family) && !self.kind.can_write(family) {
                return Err(EngineError::unsupported(format!(
                    "Writing {family} metadata to {} images is not supported",
                    self.kind.mime_type()
                )));
            }
        }
        if dirty.comment && !self.kind.supports_comment() {
            return Err(EngineError::unsupported(format!(
                "{} images do not support comments",
                self.kind.mime_type()
            )));
        }

        let bytes = match self.kind {
            ImageKind::Jpeg => self.encode_jpeg(metadata, dirty)?,
            _ => self.encode_exif_only(metadata)?,
        };

        if let Some(path) = &self.path {
            persist(path, &bytes, options)?;
        }
        self.bytes = bytes;
        self.last_read = Some(metadata.clone());
        Ok(())
    }

    fn tag_info(&self, key: &TagKey) -> Result<TagInfo, EngineError> {
        match key.family() {
            Family::Xmp => {
                if self.xmp.namespace_uri(key.group()).is_none() {
                    return Err(EngineError::invalid_key(&key.to_string()));
                }
                let kind = self.xmp.kind_of(key).unwrap_or(XmpKind::Text);
                Ok(schema::xmp::info_for(key, kind))
            }
            _ => schema::lookup(key),
        }
    }

    fn check_value(&self, key: &TagKey, _info: &TagInfo, value: &str) -> Result<(), EngineError> {
        match key.family() {
            Family::Exif => writer::tag_for(key, value).map(drop),
            Family::Iptc => {
                let (record, number) = schema::iptc::resolve(key)
                    .ok_or_else(|| EngineError::invalid_key(&key.to_string()))?;
                let encoded = iptc::encode_value(key, schema::iptc::kind_of(record, number), value)?;
                if encoded.len() >= 0x8000 {
                    return Err(EngineError::invalid_value(
                        &key.to_string(),
                        value,
                        "value is too long for an IPTC dataset",
                    ));
                }
                Ok(())
            }
            Family::Xmp => Ok(()),
        }
    }

    fn render(&self, key: &TagKey, value: &str) -> String {
        match key.family() {
            Family::Exif => exif::render(key, value),
            _ => value.to_string(),
        }
    }

    fn previews(&self) -> Result<Vec<Preview>, EngineError> {
        let tiff = match self.kind {
            ImageKind::Jpeg | ImageKind::Tiff => self.embedded_exif(),
            ImageKind::Png | ImageKind::WebP => None,
        };
        let Some(tiff) = tiff else {
            return Ok(Vec::new());
        };
        let Some((offset, length)) = thumbnail::locate(&self.bytes) else {
            return Ok(Vec::new());
        };
        let Some(data) = thumbnail::extract(&tiff, offset, length) else {
            log::warn!("EXIF thumbnail at {offset}+{length} is out of bounds or not a JPEG");
            return Ok(Vec::new());
        };

        let dims = image_dimensions(data).unwrap_or_else(|e| {
            log::debug!("Thumbnail dimensions unavailable: {e}");
            (0, 0)
        });
        Ok(vec![Preview::new("image/jpeg", ".jpg", dims, data.to_vec())])
    }

    fn mime_type(&self) -> &str {
        self.kind.mime_type()
    }

    fn dimensions(&self) -> Result<(u32, u32), EngineError> {
        image_dimensions(&self.bytes)
    }

    fn buffer(&self) -> &[u8] {
        &self.bytes
    }
}

fn parse_jpeg(bytes: &[u8]) -> Result<Jpeg, EngineError> {
    Jpeg::from_bytes(Bytes::copy_from_slice(bytes))
        .map_err(|e| EngineError::corrupt(format!("Failed to parse JPEG: {e}")))
}

fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), EngineError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| EngineError::corrupt(format!("Failed to read image dimensions: {e}")))
}

/// Find the first segment with `marker` whose contents start with `prefix`.
fn find_segment(segments: &[JpegSegment], marker: u8, prefix: &[u8]) -> Option<usize> {
    segments
        .iter()
        .position(|s| s.marker() == marker && s.contents().starts_with(prefix))
}

/// Index just past the last APPn segment.
fn after_app_segments(segments: &[JpegSegment]) -> usize {
    segments
        .iter()
        .rposition(|s| (0xE0..=0xEF).contains(&s.marker()))
        .map_or(0, |p| p + 1)
}

/// JPEG segments cannot hold more than 65533 bytes of contents.
fn check_segment_size(what: &str, len: usize) -> Result<(), EngineError> {
    if len > MAX_SEGMENT_CONTENTS {
        return Err(EngineError::new(
            EngineErrorKind::InvalidValue,
            format!("{what} is too large for a JPEG segment ({len} > {MAX_SEGMENT_CONTENTS} bytes)"),
        ));
    }
    Ok(())
}

fn replace_segment(
    segments: &mut Vec<JpegSegment>,
    pos: Option<usize>,
    marker: u8,
    contents: Option<Vec<u8>>,
) -> Result<(), EngineError> {
    if let Some(c) = &contents {
        let what = if marker == APP13 { "IPTC block" } else { "XMP packet" };
        check_segment_size(what, c.len())?;
    }
    match (pos, contents) {
        (Some(p), Some(c)) => segments[p] = JpegSegment::new_with_contents(marker, Bytes::from(c)),
        (Some(p), None) => {
            segments.remove(p);
        }
        (None, Some(c)) => {
            let at = after_app_segments(segments);
            segments.insert(at, JpegSegment::new_with_contents(marker, Bytes::from(c)));
        }
        (None, None) => {}
    }
    Ok(())
}

fn persist(path: &Path, bytes: &[u8], options: &WriteOptions) -> Result<(), EngineError> {
    let times = if options.preserve_timestamps {
        let meta = std::fs::metadata(path)?;
        Some(
            FileTimes::new()
                .set_accessed(meta.accessed()?)
                .set_modified(meta.modified()?),
        )
    } else {
        None
    };

    std::fs::write(path, bytes)?;
    if let Some(times) = times {
        File::options().write(true).open(path)?.set_times(times)?;
    }
    log::info!("Metadata written: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn encoded_sized(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn encoded(format: image::ImageFormat) -> Vec<u8> {
        encoded_sized(32, 24, format)
    }

    fn ifd_entry(tag: u16, format: u16, count: u32, value: u32) -> Vec<u8> {
        let mut entry = tag.to_le_bytes().to_vec();
        entry.extend(format.to_le_bytes());
        entry.extend(count.to_le_bytes());
        entry.extend(value.to_le_bytes());
        entry
    }

    /// Little-endian TIFF: IFD0 with Orientation, IFD1 pointing at `thumb`.
    fn tiff_with_thumbnail(thumb: &[u8]) -> Vec<u8> {
        let mut tiff = b"II*\0".to_vec();
        tiff.extend(8u32.to_le_bytes());
        // IFD0 at 8, 18 bytes
        tiff.extend(1u16.to_le_bytes());
        tiff.extend(ifd_entry(0x0112, 3, 1, 1));
        tiff.extend(26u32.to_le_bytes());
        // IFD1 at 26, 30 bytes; thumbnail at 56
        tiff.extend(2u16.to_le_bytes());
        tiff.extend(ifd_entry(0x0201, 4, 1, 56));
        tiff.extend(ifd_entry(0x0202, 4, 1, thumb.len() as u32));
        tiff.extend(0u32.to_le_bytes());
        tiff.extend_from_slice(thumb);
        tiff
    }

    fn jpeg_with_thumbnail(thumb: &[u8]) -> Vec<u8> {
        let mut jpeg = parse_jpeg(&jpeg()).unwrap();
        jpeg.set_exif(Some(Bytes::from(tiff_with_thumbnail(thumb))));
        jpeg.encoder().bytes().to_vec()
    }

    fn jpeg() -> Vec<u8> {
        encoded(image::ImageFormat::Jpeg)
    }

    fn key(s: &str) -> TagKey {
        s.parse().unwrap()
    }

    fn values(store: &MetadataStore, k: &str) -> Vec<String> {
        let k = key(k);
        store.values(&k).map(|d| d.value().to_string()).collect()
    }

    fn reread(bytes: &[u8]) -> MetadataSet {
        ContainerEngine::from_buffer(bytes.to_vec())
            .unwrap()
            .read_metadata()
            .unwrap()
    }

    // ── opening ───────────────────────────────────────────────────

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ContainerEngine::open(dir.path().join("nope.jpg")).err().unwrap();
        assert_eq!(err.kind(), EngineErrorKind::NotFound);
    }

    #[test]
    fn unknown_data_is_unsupported() {
        let err = ContainerEngine::from_buffer(b"plain text".to_vec()).err().unwrap();
        assert_eq!(err.kind(), EngineErrorKind::UnsupportedFormat);
    }

    #[test]
    fn plain_jpeg_has_no_metadata() {
        let mut engine = ContainerEngine::from_buffer(jpeg()).unwrap();
        let set = engine.read_metadata().unwrap();
        assert!(set.iptc.is_empty());
        assert!(set.xmp.is_empty());
        assert_eq!(set.comment, None);
        assert_eq!(engine.mime_type(), "image/jpeg");
        assert_eq!(engine.dimensions().unwrap(), (32, 24));
        assert!(engine.previews().unwrap().is_empty());
    }

    // ── writing ───────────────────────────────────────────────────

    #[test]
    fn iptc_xmp_and_comment_round_trip() {
        let mut engine = ContainerEngine::from_buffer(jpeg()).unwrap();
        let mut set = engine.read_metadata().unwrap();
        set.iptc.push(key("Iptc.Application2.Keywords"), "sky");
        set.iptc.push(key("Iptc.Application2.Keywords"), "sea");
        set.iptc.push(key("Iptc.Application2.DateCreated"), "2024-03-09");
        set.xmp.push(key("Xmp.dc.subject"), "sky");
        set.xmp.push(key("Xmp.dc.title"), "Coast");
        set.comment = Some("Shot from the pier".into());
        engine.write_metadata(&set, &WriteOptions::default()).unwrap();

        let back = reread(engine.buffer());
        assert_eq!(values(&back.iptc, "Iptc.Application2.Keywords"), ["sky", "sea"]);
        assert_eq!(values(&back.iptc, "Iptc.Application2.DateCreated"), ["2024-03-09"]);
        assert_eq!(values(&back.iptc, "Iptc.Application2.RecordVersion"), ["4"]);
        assert_eq!(values(&back.xmp, "Xmp.dc.subject"), ["sky"]);
        assert_eq!(values(&back.xmp, "Xmp.dc.title"), ["Coast"]);
        assert_eq!(back.comment.as_deref(), Some("Shot from the pier"));
        assert_eq!(engine.dimensions().unwrap(), (32, 24));
    }

    #[test]
    fn exif_round_trip() {
        let mut engine = ContainerEngine::from_buffer(jpeg()).unwrap();
        let mut set = engine.read_metadata().unwrap();
        set.exif.push(key("Exif.Image.Make"), "Canon");
        set.exif.push(key("Exif.Image.Orientation"), "6");
        engine.write_metadata(&set, &WriteOptions::default()).unwrap();

        let back = reread(engine.buffer());
        assert_eq!(values(&back.exif, "Exif.Image.Make"), ["Canon"]);
        assert_eq!(values(&back.exif, "Exif.Image.Orientation"), ["6"]);
    }

    #[test]
    fn gps_round_trip() {
        let mut engine = ContainerEngine::from_buffer(jpeg()).unwrap();
        let mut set = engine.read_metadata().unwrap();
        set.exif.push(key("Exif.GPSInfo.GPSLatitudeRef"), "S");
        set.exif.push(key("Exif.GPSInfo.GPSLatitude"), "33/1 52/1 1234/100");
        set.exif.push(key("Exif.GPSInfo.GPSAltitude"), "58/1");
        engine.write_metadata(&set, &WriteOptions::default()).unwrap();

        let back = reread(engine.buffer());
        assert_eq!(values(&back.exif, "Exif.GPSInfo.GPSLatitudeRef"), ["S"]);
        assert_eq!(values(&back.exif, "Exif.GPSInfo.GPSLatitude"), ["33/1 52/1 1234/100"]);
        assert_eq!(values(&back.exif, "Exif.GPSInfo.GPSAltitude"), ["58/1"]);
    }

    #[test]
    fn oversized_segments_are_rejected() {
        let original = jpeg();
        let mut engine = ContainerEngine::from_buffer(original.clone()).unwrap();
        let mut set = engine.read_metadata().unwrap();
        for _ in 0..3 {
            set.iptc.push(key("Iptc.Application2.Keywords"), "k".repeat(30_000));
        }
        let err = engine.write_metadata(&set, &WriteOptions::default()).unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::InvalidValue);
        assert_eq!(engine.buffer(), &original[..]);

        let mut set = engine.read_metadata().unwrap();
        set.xmp.push(key("Xmp.dc.description"), "d".repeat(70_000));
        assert!(engine.write_metadata(&set, &WriteOptions::default()).is_err());

        let mut set = engine.read_metadata().unwrap();
        set.comment = Some("c".repeat(65_534));
        let err = engine.write_metadata(&set, &WriteOptions::default()).unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::InvalidValue);
        assert_eq!(engine.buffer(), &original[..]);
    }

    #[test]
    fn emptied_families_lose_their_segments() {
        let mut engine = ContainerEngine::from_buffer(jpeg()).unwrap();
        let mut set = engine.read_metadata().unwrap();
        set.iptc.push(key("Iptc.Application2.City"), "Oslo");
        set.xmp.push(key("Xmp.xmp.Rating"), "3");
        set.comment = Some("tmp".into());
        engine.write_metadata(&set, &WriteOptions::default()).unwrap();

        engine.write_metadata(&MetadataSet::default(), &WriteOptions::default()).unwrap();

        let jpeg = parse_jpeg(engine.buffer()).unwrap();
        assert!(find_segment(jpeg.segments(), APP13, iptc::IPTC_HEADER).is_none());
        assert!(find_segment(jpeg.segments(), APP1, xmp::XMP_HEADER).is_none());
        assert!(jpeg.segments().iter().all(|s| s.marker() != COM));
    }

    #[test]
    fn unchanged_metadata_leaves_bytes_alone() {
        let original = jpeg();
        let mut engine = ContainerEngine::from_buffer(original.clone()).unwrap();
        let set = engine.read_metadata().unwrap();
        engine.write_metadata(&set, &WriteOptions::default()).unwrap();
        assert_eq!(engine.buffer(), &original[..]);
    }

    #[test]
    fn png_rejects_iptc() {
        let mut engine = ContainerEngine::from_buffer(encoded(image::ImageFormat::Png)).unwrap();
        let mut set = engine.read_metadata().unwrap();
        set.iptc.push(key("Iptc.Application2.City"), "Oslo");
        let err = engine.write_metadata(&set, &WriteOptions::default()).unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::UnsupportedFormat);
    }

    #[test]
    fn file_writes_keep_timestamps_on_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, jpeg()).unwrap();
        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_times(FileTimes::new().set_modified(old).set_accessed(old))
            .unwrap();

        let mut engine = ContainerEngine::open(&path).unwrap();
        let mut set = engine.read_metadata().unwrap();
        set.comment = Some("kept".into());
        let options = WriteOptions {
            preserve_timestamps: true,
        };
        engine.write_metadata(&set, &options).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), old);
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(reread(&on_disk).comment.as_deref(), Some("kept"));
    }

    // ── previews ──────────────────────────────────────────────────

    #[test]
    fn ifd1_thumbnail_is_a_preview() {
        let thumb = encoded_sized(16, 12, image::ImageFormat::Jpeg);
        let engine = ContainerEngine::from_buffer(jpeg_with_thumbnail(&thumb)).unwrap();

        let previews = engine.previews().unwrap();
        assert_eq!(previews.len(), 1);
        let preview = &previews[0];
        assert_eq!(preview.mime_type, "image/jpeg");
        assert_eq!(preview.extension, ".jpg");
        assert_eq!(preview.dimensions, (16, 12));
        assert_eq!(preview.size, thumb.len());
        assert_eq!(preview.data, thumb);

        let dir = TempDir::new().unwrap();
        let written = preview.write_to_file(dir.path().join("cover")).unwrap();
        assert_eq!(written, dir.path().join("cover.jpg"));
        assert_eq!(std::fs::read(&written).unwrap(), thumb);
    }

    #[test]
    fn exif_edits_keep_the_thumbnail() {
        let thumb = encoded_sized(16, 12, image::ImageFormat::Jpeg);
        let mut engine = ContainerEngine::from_buffer(jpeg_with_thumbnail(&thumb)).unwrap();
        let mut set = engine.read_metadata().unwrap();
        assert_eq!(values(&set.exif, "Exif.Image.Orientation"), ["1"]);
        set.exif.push(key("Exif.Image.Make"), "Canon");
        engine.write_metadata(&set, &WriteOptions::default()).unwrap();

        let back = reread(engine.buffer());
        assert_eq!(values(&back.exif, "Exif.Image.Make"), ["Canon"]);
        let previews = engine.previews().unwrap();
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].data, thumb);
    }

    // ── schema ────────────────────────────────────────────────────

    #[test]
    fn values_are_checked_per_family() {
        let engine = ContainerEngine::from_buffer(jpeg()).unwrap();
        let check = |k: &str, v: &str| {
            let k = key(k);
            let info = engine.tag_info(&k).unwrap();
            engine.check_value(&k, &info, v)
        };
        assert!(check("Iptc.Application2.DateCreated", "2024-03-09").is_ok());
        assert_eq!(
            check("Iptc.Application2.DateCreated", "March").unwrap_err().kind(),
            EngineErrorKind::InvalidValue
        );
        assert!(check("Exif.Image.Orientation", "1").is_ok());
        assert!(check("Exif.Image.Orientation", "up").is_err());
        let long = "x".repeat(0x8000);
        assert!(check("Iptc.Application2.Caption", &long).is_err());
    }

    #[test]
    fn xmp_keys_need_a_known_namespace() {
        let engine = ContainerEngine::from_buffer(jpeg()).unwrap();
        assert_eq!(
            engine.tag_info(&key("Xmp.nope.thing")).unwrap_err().kind(),
            EngineErrorKind::InvalidKey
        );
        let info = engine.tag_info(&key("Xmp.dc.subject")).unwrap();
        assert_eq!(info.type_name, "XmpBag");
        assert!(info.repeatable);
    }

    #[test]
    fn exif_values_render() {
        let engine = ContainerEngine::from_buffer(jpeg()).unwrap();
        assert_eq!(engine.render(&key("Exif.Image.Orientation"), "1"), "top, left");
        assert_eq!(engine.render(&key("Iptc.Application2.City"), "Oslo"), "Oslo");
    }

    // ── helpers ───────────────────────────────────────────────────

    #[test]
    fn segment_size_limit() {
        assert!(check_segment_size("Comment", MAX_SEGMENT_CONTENTS).is_ok());
        let err = check_segment_size("Comment", MAX_SEGMENT_CONTENTS + 1).unwrap_err();
        assert!(err.message().starts_with("Comment is too large"));
    }
}
