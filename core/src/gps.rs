//! GPS coordinate extraction from embedded image metadata.
//!
//! Coordinates arrive as degree/minute/second rationals with hemisphere
//! letters; they are converted to signed decimal degrees (south and west
//! negative). Altitude uses the sea-level reference byte for its sign.

use kamadak_exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A decimal-degree position, with altitude in meters when present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// Reads the GPS fix embedded in `path`, if any.
///
/// Returns `None` when the file has no metadata, no GPS block, or a block
/// missing either coordinate. A missing altitude does not disqualify the fix.
pub fn extract_geo_fix(path: &Path) -> Option<GeoFix> {
    let file = File::open(path).ok()?;
    let mut buffer = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut buffer).ok()?;

    let latitude = signed_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, "S")?;
    let longitude = signed_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, "W")?;

    Some(GeoFix {
        latitude,
        longitude,
        altitude: altitude(&exif),
    })
}

fn signed_coordinate(
    exif: &Exif,
    value_tag: Tag,
    ref_tag: Tag,
    negative_ref: &str,
) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let rationals = match field.value {
        Value::Rational(ref rationals) if rationals.len() >= 3 => rationals,
        _ => return None,
    };
    let decimal = to_decimal_degrees(
        rationals[0].to_f64(),
        rationals[1].to_f64(),
        rationals[2].to_f64(),
    );

    let hemisphere = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|field| match field.value {
            Value::Ascii(ref lines) => lines.first().map(|line| {
                String::from_utf8_lossy(line).trim().to_uppercase()
            }),
            _ => None,
        })
        .unwrap_or_default();

    if hemisphere == negative_ref {
        Some(-decimal)
    } else {
        Some(decimal)
    }
}

fn altitude(exif: &Exif) -> Option<f64> {
    let field = exif.get_field(Tag::GPSAltitude, In::PRIMARY)?;
    let meters = match field.value {
        Value::Rational(ref rationals) => rationals.first()?.to_f64(),
        _ => return None,
    };

    // Reference byte 1 means below sea level.
    let below_sea_level = exif
        .get_field(Tag::GPSAltitudeRef, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        == Some(1);

    Some(if below_sea_level { -meters } else { meters })
}

/// Converts a degree/minute/second triple to decimal degrees.
pub fn to_decimal_degrees(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn dms_conversion() {
        let decimal = to_decimal_degrees(45.0, 26.0, 21.6);
        assert!((decimal - 45.439333).abs() < 1e-5);
    }

    #[test]
    fn whole_degrees_pass_through() {
        assert_eq!(to_decimal_degrees(11.0, 0.0, 0.0), 11.0);
    }

    #[test]
    fn file_without_metadata_has_no_fix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        fs::write(&path, b"no exif here").unwrap();
        assert!(extract_geo_fix(&path).is_none());
    }

    #[test]
    fn missing_file_has_no_fix() {
        let dir = tempdir().unwrap();
        assert!(extract_geo_fix(&dir.path().join("gone.jpg")).is_none());
    }
}
