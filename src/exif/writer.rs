use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;
use little_exif::rational::uR64;
use std::str::FromStr;

use crate::error::{EngineError, EngineErrorKind};
use crate::key::TagKey;
use crate::store::MetadataStore;
use crate::value::{Rational, parse_list};

fn list<T: FromStr>(key: &TagKey, value: &str, what: &str) -> Result<Vec<T>, EngineError> {
    parse_list(value).ok_or_else(|| EngineError::invalid_value(&key.to_string(), value, what))
}

fn shorts(key: &TagKey, value: &str) -> Result<Vec<u16>, EngineError> {
    list(key, value, "expected unsigned 16-bit integers")
}

fn longs(key: &TagKey, value: &str) -> Result<Vec<u32>, EngineError> {
    list(key, value, "expected unsigned 32-bit integers")
}

fn bytes(key: &TagKey, value: &str) -> Result<Vec<u8>, EngineError> {
    list(key, value, "expected byte values")
}

fn rationals(key: &TagKey, value: &str) -> Result<Vec<uR64>, EngineError> {
    let parsed: Vec<Rational> = list(key, value, "expected rationals such as 72/1")?;
    Ok(parsed
        .into_iter()
        .map(|r| uR64 {
            nominator: r.numerator,
            denominator: r.denominator,
        })
        .collect())
}

fn user_comment(value: &str) -> Vec<u8> {
    let mut comment_bytes = b"ASCII\0\0\0".to_vec();
    comment_bytes.extend_from_slice(value.as_bytes());
    comment_bytes
}

/// The little_exif tag carrying `value` for `key`.
pub(crate) fn tag_for(key: &TagKey, value: &str) -> Result<ExifTag, EngineError> {
    let s = || value.to_string();
    let tag = match (key.group(), key.name()) {
        ("Image", "ImageWidth") => ExifTag::ImageWidth(longs(key, value)?),
        ("Image", "ImageLength") => ExifTag::ImageHeight(longs(key, value)?),
        ("Image", "ImageDescription") => ExifTag::ImageDescription(s()),
        ("Image", "Make") => ExifTag::Make(s()),
        ("Image", "Model") => ExifTag::Model(s()),
        ("Image", "Orientation") => ExifTag::Orientation(shorts(key, value)?),
        ("Image", "XResolution") => ExifTag::XResolution(rationals(key, value)?),
        ("Image", "YResolution") => ExifTag::YResolution(rationals(key, value)?),
        ("Image", "ResolutionUnit") => ExifTag::ResolutionUnit(shorts(key, value)?),
        ("Image", "Software") => ExifTag::Software(s()),
        ("Image", "DateTime") => ExifTag::ModifyDate(s()),
        ("Image", "Artist") => ExifTag::Artist(s()),
        ("Image", "Copyright") => ExifTag::Copyright(s()),

        ("Photo", "ExposureTime") => ExifTag::ExposureTime(rationals(key, value)?),
        ("Photo", "FNumber") => ExifTag::FNumber(rationals(key, value)?),
        ("Photo", "ExposureProgram") => ExifTag::ExposureProgram(shorts(key, value)?),
        ("Photo", "ISOSpeedRatings") => ExifTag::ISO(shorts(key, value)?),
        ("Photo", "DateTimeOriginal") => ExifTag::DateTimeOriginal(s()),
        ("Photo", "DateTimeDigitized") => ExifTag::CreateDate(s()),
        ("Photo", "OffsetTime") => ExifTag::OffsetTime(s()),
        ("Photo", "OffsetTimeOriginal") => ExifTag::OffsetTimeOriginal(s()),
        ("Photo", "OffsetTimeDigitized") => ExifTag::OffsetTimeDigitized(s()),
        ("Photo", "ApertureValue") => ExifTag::ApertureValue(rationals(key, value)?),
        ("Photo", "MaxApertureValue") => ExifTag::MaxApertureValue(rationals(key, value)?),
        ("Photo", "MeteringMode") => ExifTag::MeteringMode(shorts(key, value)?),
        ("Photo", "LightSource") => ExifTag::LightSource(shorts(key, value)?),
        ("Photo", "Flash") => ExifTag::Flash(shorts(key, value)?),
        ("Photo", "FocalLength") => ExifTag::FocalLength(rationals(key, value)?),
        ("Photo", "UserComment") => ExifTag::UserComment(user_comment(value)),
        ("Photo", "SubSecTime") => ExifTag::SubSecTime(s()),
        ("Photo", "SubSecTimeOriginal") => ExifTag::SubSecTimeOriginal(s()),
        ("Photo", "SubSecTimeDigitized") => ExifTag::SubSecTimeDigitized(s()),
        ("Photo", "ColorSpace") => ExifTag::ColorSpace(shorts(key, value)?),
        ("Photo", "ExposureMode") => ExifTag::ExposureMode(shorts(key, value)?),
        ("Photo", "WhiteBalance") => ExifTag::WhiteBalance(shorts(key, value)?),
        ("Photo", "FocalLengthIn35mmFilm") => {
            ExifTag::FocalLengthIn35mmFormat(shorts(key, value)?)
        }
        ("Photo", "SceneCaptureType") => ExifTag::SceneCaptureType(shorts(key, value)?),
        ("Photo", "Contrast") => ExifTag::Contrast(shorts(key, value)?),
        ("Photo", "Saturation") => ExifTag::Saturation(shorts(key, value)?),
        ("Photo", "Sharpness") => ExifTag::Sharpness(shorts(key, value)?),
        ("Photo", "CameraOwnerName") => ExifTag::OwnerName(s()),
        ("Photo", "BodySerialNumber") => ExifTag::SerialNumber(s()),
        ("Photo", "LensMake") => ExifTag::LensMake(s()),
        ("Photo", "LensModel") => ExifTag::LensModel(s()),
        ("Photo", "LensSerialNumber") => ExifTag::LensSerialNumber(s()),

        ("GPSInfo", "GPSLatitudeRef") => ExifTag::GPSLatitudeRef(s()),
        ("GPSInfo", "GPSLatitude") => ExifTag::GPSLatitude(rationals(key, value)?),
        ("GPSInfo", "GPSLongitudeRef") => ExifTag::GPSLongitudeRef(s()),
        ("GPSInfo", "GPSLongitude") => ExifTag::GPSLongitude(rationals(key, value)?),
        ("GPSInfo", "GPSAltitudeRef") => ExifTag::GPSAltitudeRef(bytes(key, value)?),
        ("GPSInfo", "GPSAltitude") => ExifTag::GPSAltitude(rationals(key, value)?),

        _ => return Err(EngineError::invalid_key(&key.to_string())),
    };
    Ok(tag)
}

/// Encode the store plus pass-through tags as a TIFF payload.
///
/// Store tags go to IFD0 and its Exif/GPS sub-IFDs. Pass-through tags return
/// to the generic IFD they were read from, so an IFD1 thumbnail survives.
/// Returns `None` when there is nothing to write, meaning the container's
/// EXIF block should be removed.
pub(crate) fn encode(
    store: &MetadataStore,
    passthrough: &[(u32, ExifTag)],
) -> Result<Option<Vec<u8>>, EngineError> {
    if store.is_empty() && passthrough.is_empty() {
        return Ok(None);
    }

    let mut metadata = Metadata::new();
    for (nr, tag) in passthrough {
        metadata.get_ifd_mut(tag.get_group(), *nr).set_tag(tag.clone());
    }
    for datum in store {
        metadata.set_tag(tag_for(datum.key(), datum.value())?);
    }

    // img-parts wants the bare TIFF block, which is what encode() yields
    let tiff = metadata.encode().map_err(|e| {
        EngineError::new(EngineErrorKind::Internal, format!("Failed to encode EXIF: {e}"))
            .with_source(e)
    })?;
    Ok(Some(tiff))
}
