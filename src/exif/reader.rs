use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;
use little_exif::rational::uR64;

use crate::value::join_list;

const USER_COMMENT_ASCII: &[u8] = b"ASCII\0\0\0";
const USER_COMMENT_UNICODE: &[u8] = b"UNICODE\0";
const USER_COMMENT_UNDEFINED: &[u8] = b"\0\0\0\0\0\0\0\0";

/// EXIF decoded from one image.
#[derive(Default)]
pub(crate) struct DecodedExif {
    /// `(group, name, value)` for every modelled tag, in file order.
    pub entries: Vec<(&'static str, &'static str, String)>,
    /// `(generic IFD number, tag)` for tags without a store key, re-emitted
    /// unchanged on write. IFD1 and its thumbnail land here.
    pub passthrough: Vec<(u32, ExifTag)>,
}

/// Parse the TIFF block holding EXIF with little_exif.
/// Returns None if it can't parse (or finds nothing) instead of failing the read.
pub(crate) fn load_metadata(tiff: Vec<u8>) -> Option<Metadata> {
    // Suppress panics from little_exif
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let result =
        std::panic::catch_unwind(move || Metadata::new_from_vec(&tiff, FileExtension::TIFF));
    std::panic::set_hook(prev_hook);

    match result {
        Ok(Ok(m)) => {
            let count = (&m).into_iter().count();
            if count == 0 {
                log::debug!("little_exif loaded empty metadata");
                None
            } else {
                log::debug!("little_exif loaded {count} EXIF tags");
                Some(m)
            }
        }
        Ok(Err(e)) => {
            log::debug!("little_exif could not parse EXIF: {e}");
            None
        }
        Err(_) => {
            log::warn!("little_exif panicked parsing EXIF");
            None
        }
    }
}

/// Split the tags of IFD0 and its sub-IFDs into store entries and
/// pass-through tags. Every tag of a later IFD passes through.
pub(crate) fn decode(metadata: &Metadata) -> DecodedExif {
    let mut decoded = DecodedExif::default();
    for ifd in metadata.get_ifds() {
        let nr = ifd.get_generic_ifd_nr();
        for tag in ifd.get_tags() {
            if is_structural(tag) {
                continue;
            }
            match entry_for(tag).filter(|_| nr == 0) {
                Some(entry) => decoded.entries.push(entry),
                None => decoded.passthrough.push((nr, tag.clone())),
            }
        }
    }
    log::debug!(
        "EXIF: {} modelled tags, {} passed through",
        decoded.entries.len(),
        decoded.passthrough.len()
    );
    decoded
}

/// IFD pointers and image strips; little_exif lays the pointers out itself
/// and the strips belong to TIFF image data, which is never rewritten.
fn is_structural(tag: &ExifTag) -> bool {
    matches!(
        tag,
        ExifTag::ExifOffset(_)
            | ExifTag::GPSInfo(_)
            | ExifTag::InteropOffset(_)
            | ExifTag::StripOffsets(..)
            | ExifTag::StripByteCounts(_)
    )
}

fn text(s: &str) -> String {
    s.trim_end_matches('\0').trim_end().to_string()
}

fn rationals(v: &[uR64]) -> String {
    v.iter()
        .map(|r| format!("{}/{}", r.nominator, r.denominator))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip the 8-byte character code of a UserComment.
pub(crate) fn user_comment(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(USER_COMMENT_UNICODE) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        return text(&String::from_utf16_lossy(&units));
    }
    let rest = bytes
        .strip_prefix(USER_COMMENT_ASCII)
        .or_else(|| bytes.strip_prefix(USER_COMMENT_UNDEFINED))
        .unwrap_or(bytes);
    text(&String::from_utf8_lossy(rest))
}

fn non_empty<T>(v: &[T], f: impl FnOnce(&[T]) -> String) -> Option<String> {
    (!v.is_empty()).then(|| f(v))
}

/// Store key and value for a modelled tag.
pub(crate) fn entry_for(tag: &ExifTag) -> Option<(&'static str, &'static str, String)> {
    let (group, name, value) = match tag {
        // -- Image --
        ExifTag::ImageWidth(v) => ("Image", "ImageWidth", non_empty(v, join_list)?),
        ExifTag::ImageHeight(v) => ("Image", "ImageLength", non_empty(v, join_list)?),
        ExifTag::ImageDescription(s) => ("Image", "ImageDescription", text(s)),
        ExifTag::Make(s) => ("Image", "Make", text(s)),
        ExifTag::Model(s) => ("Image", "Model", text(s)),
        ExifTag::Orientation(v) => ("Image", "Orientation", non_empty(v, join_list)?),
        ExifTag::XResolution(v) => ("Image", "XResolution", non_empty(v, rationals)?),
        ExifTag::YResolution(v) => ("Image", "YResolution", non_empty(v, rationals)?),
        ExifTag::ResolutionUnit(v) => ("Image", "ResolutionUnit", non_empty(v, join_list)?),
        ExifTag::Software(s) => ("Image", "Software", text(s)),
        ExifTag::ModifyDate(s) => ("Image", "DateTime", text(s)),
        ExifTag::Artist(s) => ("Image", "Artist", text(s)),
        ExifTag::Copyright(s) => ("Image", "Copyright", text(s)),

        // -- Photo --
        ExifTag::ExposureTime(v) => ("Photo", "ExposureTime", non_empty(v, rationals)?),
        ExifTag::FNumber(v) => ("Photo", "FNumber", non_empty(v, rationals)?),
        ExifTag::ExposureProgram(v) => ("Photo", "ExposureProgram", non_empty(v, join_list)?),
        ExifTag::ISO(v) => ("Photo", "ISOSpeedRatings", non_empty(v, join_list)?),
        ExifTag::DateTimeOriginal(s) => ("Photo", "DateTimeOriginal", text(s)),
        ExifTag::CreateDate(s) => ("Photo", "DateTimeDigitized", text(s)),
        ExifTag::OffsetTime(s) => ("Photo", "OffsetTime", text(s)),
        ExifTag::OffsetTimeOriginal(s) => ("Photo", "OffsetTimeOriginal", text(s)),
        ExifTag::OffsetTimeDigitized(s) => ("Photo", "OffsetTimeDigitized", text(s)),
        ExifTag::ApertureValue(v) => ("Photo", "ApertureValue", non_empty(v, rationals)?),
        ExifTag::MaxApertureValue(v) => ("Photo", "MaxApertureValue", non_empty(v, rationals)?),
        ExifTag::MeteringMode(v) => ("Photo", "MeteringMode", non_empty(v, join_list)?),
        ExifTag::LightSource(v) => ("Photo", "LightSource", non_empty(v, join_list)?),
        ExifTag::Flash(v) => ("Photo", "Flash", non_empty(v, join_list)?),
        ExifTag::FocalLength(v) => ("Photo", "FocalLength", non_empty(v, rationals)?),
        ExifTag::UserComment(v) => ("Photo", "UserComment", user_comment(v)),
        ExifTag::SubSecTime(s) => ("Photo", "SubSecTime", text(s)),
        ExifTag::SubSecTimeOriginal(s) => ("Photo", "SubSecTimeOriginal", text(s)),
        ExifTag::SubSecTimeDigitized(s) => ("Photo", "SubSecTimeDigitized", text(s)),
        ExifTag::ColorSpace(v) => ("Photo", "ColorSpace", non_empty(v, join_list)?),
        ExifTag::ExposureMode(v) => ("Photo", "ExposureMode", non_empty(v, join_list)?),
        ExifTag::WhiteBalance(v) => ("Photo", "WhiteBalance", non_empty(v, join_list)?),
        ExifTag::FocalLengthIn35mmFormat(v) => {
            ("Photo", "FocalLengthIn35mmFilm", non_empty(v, join_list)?)
        }
        ExifTag::SceneCaptureType(v) => ("Photo", "SceneCaptureType", non_empty(v, join_list)?),
        ExifTag::Contrast(v) => ("Photo", "Contrast", non_empty(v, join_list)?),
        ExifTag::Saturation(v) => ("Photo", "Saturation", non_empty(v, join_list)?),
        ExifTag::Sharpness(v) => ("Photo", "Sharpness", non_empty(v, join_list)?),
        ExifTag::OwnerName(s) => ("Photo", "CameraOwnerName", text(s)),
        ExifTag::SerialNumber(s) => ("Photo", "BodySerialNumber", text(s)),
        ExifTag::LensMake(s) => ("Photo", "LensMake", text(s)),
        ExifTag::LensModel(s) => ("Photo", "LensModel", text(s)),
        ExifTag::LensSerialNumber(s) => ("Photo", "LensSerialNumber", text(s)),

        // -- GPSInfo --
        ExifTag::GPSLatitudeRef(s) => ("GPSInfo", "GPSLatitudeRef", text(s)),
        ExifTag::GPSLatitude(v) => ("GPSInfo", "GPSLatitude", non_empty(v, rationals)?),
        ExifTag::GPSLongitudeRef(s) => ("GPSInfo", "GPSLongitudeRef", text(s)),
        ExifTag::GPSLongitude(v) => ("GPSInfo", "GPSLongitude", non_empty(v, rationals)?),
        ExifTag::GPSAltitudeRef(v) => ("GPSInfo", "GPSAltitudeRef", non_empty(v, join_list)?),
        ExifTag::GPSAltitude(v) => ("GPSInfo", "GPSAltitude", non_empty(v, rationals)?),

        _ => return None,
    };
    Some((group, name, value))
}
