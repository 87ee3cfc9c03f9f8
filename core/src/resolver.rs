//! Capture-time resolution from competing evidence sources.
//!
//! Evidence is tried in strict descending-priority order and the first source
//! that yields a valid timestamp wins:
//!
//! 1. EXIF `DateTimeOriginal` (camera-authored capture time)
//! 2. EXIF `DateTime`, trusted more when EXIF `Make` corroborates it
//! 3. Sidecar export metadata keyed by file name
//! 4. Filename-embedded timestamps (see [`stem_pattern_names`])
//! 5. Filesystem modification time
//!
//! Failures to open or parse metadata are never fatal for a file; they fall
//! through to the next tier. Only a file whose mtime is also unreadable
//! resolves to nothing.

use crate::sidecar::SidecarIndex;
use kamadak_exif::{DateTime as ExifDateTime, Exif, In, Reader, Tag, Value};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Provenance of a resolved capture timestamp.
///
/// The tier is not just an annotation: the planner routes the two low-trust
/// tiers into a separate review bucket, so everything else can be trusted as
/// a genuine capture date without re-derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateConfidence {
    /// EXIF DateTimeOriginal.
    EmbeddedOriginal,
    /// EXIF DateTime with camera make present.
    EmbeddedWithCamera,
    /// EXIF DateTime without camera identity; may be a re-encode time.
    EmbeddedUnknownCamera,
    /// Canonical date from the export's sidecar metadata.
    SidecarCanonical,
    /// Timestamp parsed out of the filename itself.
    FilenameTimestamp,
    /// Filesystem last-modified time, the last resort.
    FilesystemMtime,
}

impl DateConfidence {
    /// True for sources that must not be trusted as capture dates.
    pub fn is_low_trust(self) -> bool {
        matches!(
            self,
            DateConfidence::FilesystemMtime | DateConfidence::EmbeddedUnknownCamera
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DateConfidence::EmbeddedOriginal => "embedded_original",
            DateConfidence::EmbeddedWithCamera => "embedded_with_camera",
            DateConfidence::EmbeddedUnknownCamera => "embedded_unknown_camera",
            DateConfidence::SidecarCanonical => "sidecar_canonical",
            DateConfidence::FilenameTimestamp => "filename_timestamp",
            DateConfidence::FilesystemMtime => "filesystem_mtime",
        }
    }
}

/// A resolved capture timestamp and its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub timestamp: PrimitiveDateTime,
    pub confidence: DateConfidence,
}

/// Camera identity read from embedded metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraInfo {
    pub make: Option<String>,
    pub model: Option<String>,
}

/// Resolves the best available capture time for `path`.
///
/// Returns `None` only when no evidence source, including the filesystem
/// mtime, is readable; callers route such files to the unsorted bucket.
pub fn resolve_capture_time(
    path: &Path,
    sidecar: Option<&SidecarIndex>,
) -> Option<ResolvedDate> {
    if let Some(resolved) = embedded_capture_time(path) {
        return Some(resolved);
    }

    if let Some(index) = sidecar {
        if let Some(timestamp) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| index.lookup(name))
            .and_then(|entry| entry.captured_at)
        {
            return Some(ResolvedDate {
                timestamp,
                confidence: DateConfidence::SidecarCanonical,
            });
        }
    }

    if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
        if let Some(timestamp) = date_from_stem(stem) {
            return Some(ResolvedDate {
                timestamp,
                confidence: DateConfidence::FilenameTimestamp,
            });
        }
    }

    filesystem_mtime(path).map(|timestamp| ResolvedDate {
        timestamp,
        confidence: DateConfidence::FilesystemMtime,
    })
}

/// Reads camera make and model, swallowing all metadata errors.
pub fn read_camera_info(path: &Path) -> CameraInfo {
    match open_exif(path) {
        Some(exif) => CameraInfo {
            make: ascii_field(&exif, Tag::Make),
            model: ascii_field(&exif, Tag::Model),
        },
        None => CameraInfo::default(),
    }
}

fn embedded_capture_time(path: &Path) -> Option<ResolvedDate> {
    let exif = open_exif(path)?;

    if let Some(timestamp) = datetime_field(&exif, Tag::DateTimeOriginal) {
        return Some(ResolvedDate {
            timestamp,
            confidence: DateConfidence::EmbeddedOriginal,
        });
    }

    let timestamp = datetime_field(&exif, Tag::DateTime)?;
    let confidence = if ascii_field(&exif, Tag::Make).is_some() {
        DateConfidence::EmbeddedWithCamera
    } else {
        DateConfidence::EmbeddedUnknownCamera
    };
    Some(ResolvedDate {
        timestamp,
        confidence,
    })
}

fn open_exif(path: &Path) -> Option<Exif> {
    let file = File::open(path).ok()?;
    let mut buffer = BufReader::new(file);
    Reader::new().read_from_container(&mut buffer).ok()
}

fn datetime_field(exif: &Exif, tag: Tag) -> Option<PrimitiveDateTime> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    if let Value::Ascii(ref lines) = field.value {
        let raw = lines.first()?;
        let parsed = ExifDateTime::from_ascii(raw).ok()?;
        return build_datetime(
            parsed.year as i32,
            parsed.month,
            parsed.day,
            parsed.hour,
            parsed.minute,
            parsed.second,
        );
    }
    None
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    if let Value::Ascii(ref lines) = field.value {
        let text = String::from_utf8_lossy(lines.first()?).trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

fn filesystem_mtime(path: &Path) -> Option<PrimitiveDateTime> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let moment = OffsetDateTime::from(modified)
        .to_offset(UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC));
    Some(PrimitiveDateTime::new(moment.date(), moment.time()))
}

fn build_datetime(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Option<PrimitiveDateTime> {
    let month = Month::try_from(month).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time))
}

struct StemPattern {
    name: &'static str,
    regex: Regex,
    parse: fn(&Captures) -> Option<PrimitiveDateTime>,
}

/// Filename timestamp patterns in priority order. A pattern that matches
/// syntactically but yields an invalid calendar date falls through to the
/// next entry, so future additions must keep this list ordered from most to
/// least specific.
static STEM_PATTERNS: Lazy<Vec<StemPattern>> = Lazy::new(|| {
    vec![
        // Screenshot-2022-06-07-at-10.42.24-am, Screenshot_2022-01-22-09-13-25,
        // Screenshot-from-2025-03-18-02-57-03, Screen Recording 2024-01-15 at 14.30.25
        StemPattern {
            name: "screenshot",
            regex: Regex::new(
                r"(?i)Screenshot[\s\-_]+(?:from[\s\-_]+)?(\d{4})-(\d{2})-(\d{2})[\s\-_]+(?:at[\s\-_]+)?(\d{2})[\.\-:](\d{2})[\.\-:](\d{2})",
            )
            .expect("invalid screenshot regex"),
            parse: parse_six_part,
        },
        // 2025-09-02 200936 (optionally followed by a description)
        StemPattern {
            name: "spaced",
            regex: Regex::new(r"(\d{4})-(\d{2})-(\d{2})\s+(\d{6})")
                .expect("invalid spaced regex"),
            parse: parse_spaced,
        },
        // 20231215_143022
        StemPattern {
            name: "compact",
            regex: Regex::new(r"(\d{8})_(\d{6})").expect("invalid compact regex"),
            parse: parse_compact,
        },
        // 250710_1519 manual tags, anywhere in the stem; two-digit years are
        // pinned to 2000-2099, which mis-dates anything genuinely from the
        // 1900s. Accepted: the intended domain is phone photos.
        StemPattern {
            name: "short-tag",
            regex: Regex::new(r"(\d{2})(\d{2})(\d{2})_(\d{2})(\d{2})")
                .expect("invalid short-tag regex"),
            parse: parse_short_tag,
        },
    ]
});

/// Pattern names in evaluation order, exposed so the ordering contract can be
/// tested directly.
pub fn stem_pattern_names() -> Vec<&'static str> {
    STEM_PATTERNS.iter().map(|pattern| pattern.name).collect()
}

/// Parses a timestamp out of a filename stem using the ordered pattern list.
pub fn date_from_stem(stem: &str) -> Option<PrimitiveDateTime> {
    for pattern in STEM_PATTERNS.iter() {
        if let Some(captures) = pattern.regex.captures(stem) {
            if let Some(timestamp) = (pattern.parse)(&captures) {
                return Some(timestamp);
            }
        }
    }
    None
}

fn capture_int(captures: &Captures, index: usize) -> Option<i32> {
    captures.get(index)?.as_str().parse().ok()
}

fn parse_six_part(captures: &Captures) -> Option<PrimitiveDateTime> {
    build_datetime(
        capture_int(captures, 1)?,
        capture_int(captures, 2)? as u8,
        capture_int(captures, 3)? as u8,
        capture_int(captures, 4)? as u8,
        capture_int(captures, 5)? as u8,
        capture_int(captures, 6)? as u8,
    )
}

fn parse_spaced(captures: &Captures) -> Option<PrimitiveDateTime> {
    let time = captures.get(4)?.as_str();
    build_datetime(
        capture_int(captures, 1)?,
        capture_int(captures, 2)? as u8,
        capture_int(captures, 3)? as u8,
        time[0..2].parse().ok()?,
        time[2..4].parse().ok()?,
        time[4..6].parse().ok()?,
    )
}

fn parse_compact(captures: &Captures) -> Option<PrimitiveDateTime> {
    let date = captures.get(1)?.as_str();
    let time = captures.get(2)?.as_str();
    build_datetime(
        date[0..4].parse().ok()?,
        date[4..6].parse().ok()?,
        date[6..8].parse().ok()?,
        time[0..2].parse().ok()?,
        time[2..4].parse().ok()?,
        time[4..6].parse().ok()?,
    )
}

fn parse_short_tag(captures: &Captures) -> Option<PrimitiveDateTime> {
    build_datetime(
        2000 + capture_int(captures, 1)?,
        capture_int(captures, 2)? as u8,
        capture_int(captures, 3)? as u8,
        capture_int(captures, 4)? as u8,
        capture_int(captures, 5)? as u8,
        0,
    )
}
