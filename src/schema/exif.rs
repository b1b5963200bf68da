//! EXIF tag table.
//!
//! Keys follow exiv2 naming (`Exif.Image.*`, `Exif.Photo.*`, `Exif.GPSInfo.*`).
//! EXIF tags never repeat; multi-component values (rationals of a GPS
//! coordinate, for instance) live in one space-separated datum.

use super::TagInfo;
use crate::key::{Family, TagKey};

/// `(group, name, type, label, description)`
type ExifTagDef = (&'static str, &'static str, &'static str, &'static str, &'static str);

pub(crate) const EXIF_TAGS: &[ExifTagDef] = &[
    ("Image", "ImageWidth", "Long", "Image Width", "The number of columns of image data."),
    ("Image", "ImageLength", "Long", "Image Length", "The number of rows of image data."),
    ("Image", "ImageDescription", "Ascii", "Image Description", "A character string giving the title of the image."),
    ("Image", "Make", "Ascii", "Manufacturer", "The manufacturer of the recording equipment."),
    ("Image", "Model", "Ascii", "Model", "The model name or model number of the equipment."),
    ("Image", "Orientation", "Short", "Orientation", "The image orientation viewed in terms of rows and columns."),
    ("Image", "XResolution", "Rational", "X-Resolution", "The number of pixels per ResolutionUnit in the ImageWidth direction."),
    ("Image", "YResolution", "Rational", "Y-Resolution", "The number of pixels per ResolutionUnit in the ImageLength direction."),
    ("Image", "ResolutionUnit", "Short", "Resolution Unit", "The unit for measuring XResolution and YResolution."),
    ("Image", "Software", "Ascii", "Software", "Name and version of the software or firmware that created the image."),
    ("Image", "DateTime", "Ascii", "Date and Time", "The date and time of image creation or last change."),
    ("Image", "Artist", "Ascii", "Artist", "Name of the camera owner, photographer or image creator."),
    ("Image", "Copyright", "Ascii", "Copyright", "Copyright information."),
    ("Photo", "ExposureTime", "Rational", "Exposure Time", "Exposure time, given in seconds."),
    ("Photo", "FNumber", "Rational", "FNumber", "The F number."),
    ("Photo", "ExposureProgram", "Short", "Exposure Program", "The class of the program used by the camera to set exposure."),
    ("Photo", "ISOSpeedRatings", "Short", "ISO Speed Ratings", "The ISO speed and ISO latitude of the camera or input device."),
    ("Photo", "DateTimeOriginal", "Ascii", "Date and Time (original)", "The date and time when the original image data was generated."),
    ("Photo", "DateTimeDigitized", "Ascii", "Date and Time (digitized)", "The date and time when the image was stored as digital data."),
    ("Photo", "OffsetTime", "Ascii", "Offset Time", "Time zone offset of DateTime."),
    ("Photo", "OffsetTimeOriginal", "Ascii", "Offset Time Original", "Time zone offset of DateTimeOriginal."),
    ("Photo", "OffsetTimeDigitized", "Ascii", "Offset Time Digitized", "Time zone offset of DateTimeDigitized."),
    ("Photo", "ApertureValue", "Rational", "Aperture", "The lens aperture, in APEX units."),
    ("Photo", "MaxApertureValue", "Rational", "Max Aperture Value", "The smallest F number of the lens, in APEX units."),
    ("Photo", "MeteringMode", "Short", "Metering Mode", "The metering mode."),
    ("Photo", "LightSource", "Short", "Light Source", "The kind of light source."),
    ("Photo", "Flash", "Short", "Flash", "The status of flash when the image was shot."),
    ("Photo", "FocalLength", "Rational", "Focal Length", "The actual focal length of the lens, in mm."),
    ("Photo", "UserComment", "Comment", "User Comment", "Keywords or comments on the image."),
    ("Photo", "SubSecTime", "Ascii", "Sub-seconds Time", "Fractions of seconds for DateTime."),
    ("Photo", "SubSecTimeOriginal", "Ascii", "Sub-seconds Time Original", "Fractions of seconds for DateTimeOriginal."),
    ("Photo", "SubSecTimeDigitized", "Ascii", "Sub-seconds Time Digitized", "Fractions of seconds for DateTimeDigitized."),
    ("Photo", "ColorSpace", "Short", "Color Space", "The color space information tag."),
    ("Photo", "ExposureMode", "Short", "Exposure Mode", "The exposure mode set when the image was shot."),
    ("Photo", "WhiteBalance", "Short", "White Balance", "The white balance mode set when the image was shot."),
    ("Photo", "FocalLengthIn35mmFilm", "Short", "Focal Length In 35mm Film", "The equivalent focal length assuming a 35mm film camera, in mm."),
    ("Photo", "SceneCaptureType", "Short", "Scene Capture Type", "The type of scene that was shot."),
    ("Photo", "Contrast", "Short", "Contrast", "The direction of contrast processing applied by the camera."),
    ("Photo", "Saturation", "Short", "Saturation", "The direction of saturation processing applied by the camera."),
    ("Photo", "Sharpness", "Short", "Sharpness", "The direction of sharpness processing applied by the camera."),
    ("Photo", "CameraOwnerName", "Ascii", "Camera Owner Name", "The owner of the camera."),
    ("Photo", "BodySerialNumber", "Ascii", "Serial Number", "The serial number of the camera body."),
    ("Photo", "LensMake", "Ascii", "Lens Make", "The lens manufacturer."),
    ("Photo", "LensModel", "Ascii", "Lens Model", "The lens model name and model number."),
    ("Photo", "LensSerialNumber", "Ascii", "Lens Serial Number", "The serial number of the interchangeable lens."),
    ("GPSInfo", "GPSLatitudeRef", "Ascii", "GPS Latitude Reference", "Whether the latitude is north (N) or south (S)."),
    ("GPSInfo", "GPSLatitude", "Rational", "GPS Latitude", "The latitude as degrees, minutes and seconds."),
    ("GPSInfo", "GPSLongitudeRef", "Ascii", "GPS Longitude Reference", "Whether the longitude is east (E) or west (W)."),
    ("GPSInfo", "GPSLongitude", "Rational", "GPS Longitude", "The longitude as degrees, minutes and seconds."),
    ("GPSInfo", "GPSAltitudeRef", "Byte", "GPS Altitude Reference", "0 when above sea level, 1 when below."),
    ("GPSInfo", "GPSAltitude", "Rational", "GPS Altitude", "The altitude in meters relative to GPSAltitudeRef."),
];

pub(crate) fn find(group: &str, name: &str) -> Option<&'static ExifTagDef> {
    EXIF_TAGS.iter().find(|(g, n, ..)| *g == group && *n == name)
}

pub fn lookup(key: &TagKey) -> Option<TagInfo> {
    if key.family() != Family::Exif {
        return None;
    }
    find(key.group(), key.name())
        .map(|(_, name, type_name, label, description)| {
            TagInfo::new(name, label, description, type_name, false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_resolve() {
        let info = lookup(&"Exif.Photo.FNumber".parse().unwrap()).unwrap();
        assert_eq!(info.name, "FNumber");
        assert_eq!(info.type_name, "Rational");
        assert!(!info.repeatable);
    }

    #[test]
    fn group_matters() {
        assert!(lookup(&"Exif.Photo.Make".parse().unwrap()).is_none());
        assert!(lookup(&"Exif.Image.Make".parse().unwrap()).is_some());
    }

    #[test]
    fn table_has_no_duplicates() {
        for (i, (g, n, ..)) in EXIF_TAGS.iter().enumerate() {
            assert!(
                EXIF_TAGS[i + 1..].iter().all(|(g2, n2, ..)| (g, n) != (g2, n2)),
                "duplicate {g}.{n}"
            );
        }
    }
}
