//! Filename stem classification: camera-generated versus descriptive.
//!
//! Camera-generated stems (counters, pure timestamps, export UUIDs) carry no
//! information beyond what the resolved capture date already provides, so the
//! planner is free to discard them. Anything with human-written text is worth
//! preserving, including a timestamp prefix followed by a caption.

use once_cell::sync::Lazy;
use regex::Regex;

/// Auto-generated stem patterns, matched case-insensitively against the whole
/// stem (or prefix, where the camera convention allows trailing counters).
static CAMERA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // IMG_1234
        r"(?i)^IMG_\d+$",
        // DSC01234, DSCN1234
        r"(?i)^DSC[N]?\d+$",
        // 20231215_143022 (pure compact timestamp)
        r"(?i)^\d{8}_\d{6}$",
        // 2023-12-15_143022 (already organized)
        r"(?i)^\d{4}-\d{2}-\d{2}_\d{6}$",
        // IMG-20231215-WA0001
        r"(?i)^IMG-\d+",
        // Pixel phone format (PXL_20231215_143022...)
        r"(?i)^PXL_",
        // Screenshot 2025-07-06 121830 / Screenshot 2025-07-06 at 12:18:30
        r"(?i)^Screenshot \d{4}-\d{2}-\d{2}(( at)? \d{2}[:-]?\d{2}[:-]?\d{2})?$",
        // Screenshot_20231215
        r"(?i)^Screenshot_\d+$",
        // 2025-09-02 200936 (pure spaced timestamp)
        r"(?i)^\d{4}-\d{2}-\d{2} \d{6}$",
        // iCloud UUID exports
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("invalid camera-name regex"))
    .collect()
});

/// Timestamp-prefix patterns with a capture group for the trailing
/// description.
static TIMESTAMP_PREFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // YYYY-MM-DD HHMMSS description
        r"(?i)^\d{4}-\d{2}-\d{2}\s+\d{6}\s+(.+)$",
        // YYYY-MM-DD_HHMMSS description
        r"(?i)^\d{4}-\d{2}-\d{2}_\d{6}\s+(.+)$",
        // YYYYMMDD_HHMMSS description
        r"(?i)^\d{8}_\d{6}\s+(.+)$",
        // Screenshot YYYY-MM-DD at HH-MM-SS description
        r"(?i)^Screenshot\s+\d{4}-\d{2}-\d{2}\s+at\s+\d{2}-\d{2}-\d{2}\s+(.+)$",
        // Screenshot YYYY-MM-DD HHMMSS description
        r"(?i)^Screenshot\s+\d{4}-\d{2}-\d{2}\s+\d{6}\s+(.+)$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("invalid timestamp-prefix regex"))
    .collect()
});

/// Decides whether a stem is worth preserving in the organized filename.
///
/// Returns false for recognized auto-generated conventions and true for
/// everything else. A stem that starts with a timestamp but carries a
/// trailing caption is descriptive; the identical timestamp alone is not.
pub fn is_descriptive_name(stem: &str) -> bool {
    !CAMERA_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(stem))
}

/// Pulls the human-written remainder out of a timestamp-prefixed stem.
///
/// Returns `None` when no timestamp prefix is recognized or nothing but
/// whitespace follows it. Used by the planner to avoid embedding the same
/// timestamp twice.
pub fn extract_description(stem: &str) -> Option<String> {
    for pattern in TIMESTAMP_PREFIX_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(stem) {
            let description = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if !description.is_empty() {
                return Some(description.to_string());
            }
        }
    }
    None
}
