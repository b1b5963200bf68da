//! EXIF conversion between `little_exif` tags and store data.
//!
//! - [`reader`] turns decoded `little_exif` tags into `(key, value)` pairs and
//!   keeps the tags it does not model so they survive a rewrite.
//! - [`writer`] turns store data back into `little_exif` tags and encodes the
//!   TIFF payload that image containers embed.
//! - [`thumbnail`] locates the IFD1 JPEG thumbnail with `nom-exif`.
//!
//! Values are strings: ASCII tags verbatim, integers and rationals as
//! space-separated lists (`"72/1"`, `"48/1 51/1 2963/100"`), `UserComment`
//! without its character-code prefix.

pub(crate) mod reader;
pub(crate) mod thumbnail;
pub(crate) mod writer;

use crate::key::TagKey;
use crate::value::{Rational, parse_list};

/// Coded values rendered as words.
const CODE_LABELS: &[(&str, &[(u32, &str)])] = &[
    (
        "Orientation",
        &[
            (1, "top, left"),
            (2, "top, right"),
            (3, "bottom, right"),
            (4, "bottom, left"),
            (5, "left, top"),
            (6, "right, top"),
            (7, "right, bottom"),
            (8, "left, bottom"),
        ],
    ),
    ("ResolutionUnit", &[(1, "none"), (2, "inch"), (3, "cm")]),
    ("ColorSpace", &[(1, "sRGB"), (65535, "Uncalibrated")]),
    (
        "ExposureProgram",
        &[
            (0, "Not defined"),
            (1, "Manual"),
            (2, "Auto"),
            (3, "Aperture priority"),
            (4, "Shutter priority"),
            (5, "Creative program"),
            (6, "Action program"),
            (7, "Portrait mode"),
            (8, "Landscape mode"),
        ],
    ),
    (
        "MeteringMode",
        &[
            (0, "Unknown"),
            (1, "Average"),
            (2, "Center weighted average"),
            (3, "Spot"),
            (4, "Multi-spot"),
            (5, "Multi-segment"),
            (6, "Partial"),
            (255, "Other"),
        ],
    ),
    ("ExposureMode", &[(0, "Auto"), (1, "Manual"), (2, "Auto bracket")]),
    ("WhiteBalance", &[(0, "Auto"), (1, "Manual")]),
    (
        "SceneCaptureType",
        &[(0, "Standard"), (1, "Landscape"), (2, "Portrait"), (3, "Night scene")],
    ),
    ("Contrast", &[(0, "Normal"), (1, "Soft"), (2, "Hard")]),
    ("Saturation", &[(0, "Normal"), (1, "Low"), (2, "High")]),
    ("Sharpness", &[(0, "Normal"), (1, "Soft"), (2, "Hard")]),
    ("GPSAltitudeRef", &[(0, "Above sea level"), (1, "Below sea level")]),
];

/// Human-readable rendering of an EXIF value. Unmodelled tags and values
/// that fail to parse come back unchanged.
pub(crate) fn render(key: &TagKey, value: &str) -> String {
    let name = key.name();
    if let Some((_, labels)) = CODE_LABELS.iter().find(|(n, _)| *n == name) {
        let label = value
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|code| labels.iter().find(|(c, _)| *c == code))
            .map(|(_, label)| label.to_string());
        return label.unwrap_or_else(|| value.to_string());
    }

    let rendered = match name {
        "Flash" => value.trim().parse::<u16>().ok().map(|code| {
            let fired = (code & 1) == 1;
            (if fired { "Fired" } else { "No flash" }).to_string()
        }),
        "FNumber" => first_float(value).map(|f| format!("F{f:.1}")),
        "ApertureValue" | "MaxApertureValue" => {
            first_float(value).map(|apex| format!("F{:.1}", 2f64.powf(apex / 2.0)))
        }
        "ExposureTime" => first_rational(value).and_then(render_exposure),
        "FocalLength" => first_float(value).map(|f| format!("{f:.1} mm")),
        "GPSAltitude" => first_float(value).map(|f| format!("{f:.1} m")),
        "GPSLatitude" | "GPSLongitude" => render_dms(value),
        _ => None,
    };
    rendered.unwrap_or_else(|| value.to_string())
}

fn first_rational(value: &str) -> Option<Rational> {
    value.split_whitespace().next()?.parse().ok()
}

fn first_float(value: &str) -> Option<f64> {
    first_rational(value)?.to_f64()
}

fn render_exposure(r: Rational) -> Option<String> {
    let seconds = r.to_f64()?;
    if seconds > 0.0 && seconds < 1.0 {
        Some(format!("1/{:.0} s", 1.0 / seconds))
    } else {
        Some(format!("{seconds} s"))
    }
}

fn render_dms(value: &str) -> Option<String> {
    let parts: Vec<Rational> = parse_list(value)?;
    let [d, m, s] = parts.as_slice() else {
        return None;
    };
    Some(format!(
        "{:.0}deg {:.0}' {:.2}\"",
        d.to_f64()?,
        m.to_f64()?,
        s.to_f64()?
    ))
}
