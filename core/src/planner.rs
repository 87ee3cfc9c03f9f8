//! Destination path planning for organized media.
//!
//! The confidence tier decides directory placement, not just labeling:
//! low-trust dates land in `filesystem_dates/` for manual review instead of
//! polluting the year-bucketed timeline, and files with no date at all keep
//! their original name under `unsorted/`.

use crate::media::MediaKind;
use crate::naming;
use crate::resolver::ResolvedDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;

/// Filename preservation strategy, configuration-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreserveMode {
    /// Always keep the original stem alongside the timestamp.
    Always,
    /// Timestamp-only filenames.
    Never,
    /// Keep the stem only when it looks human-written.
    #[default]
    DescriptiveOnly,
}

impl PreserveMode {
    /// Parses a CLI/config value; accepts the same spellings the config file
    /// uses.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "always" => Some(PreserveMode::Always),
            "never" => Some(PreserveMode::Never),
            "descriptive_only" | "descriptive-only" => Some(PreserveMode::DescriptiveOnly),
            _ => None,
        }
    }
}

/// Plans the relative destination path for one file.
///
/// `resolved` is the outcome of timestamp resolution (`None` when no date
/// could be determined), `original_filename` the source basename including
/// extension, and `kind` must be an organizable media kind.
pub fn plan_destination(
    resolved: Option<&ResolvedDate>,
    original_filename: &str,
    preserve: PreserveMode,
    kind: MediaKind,
) -> PathBuf {
    let media_root = kind.media_root().unwrap_or("photos");
    let original = Path::new(original_filename);

    let resolved = match resolved {
        Some(resolved) => resolved,
        // The original name is the only identifying segment left; keep it
        // verbatim, extension case included.
        None => return PathBuf::from(media_root).join("unsorted").join(original_filename),
    };

    let extension = original
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();
    let stem = original
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("");

    let timestamp = format_timestamp(resolved.timestamp);

    let keep_name = match preserve {
        PreserveMode::Always => true,
        PreserveMode::Never => false,
        PreserveMode::DescriptiveOnly => naming::is_descriptive_name(stem),
    };

    let filename = if keep_name {
        // Strip a recognized timestamp prefix so the planned name does not
        // embed the same timestamp twice.
        match naming::extract_description(stem) {
            Some(description) => format!(
                "{}_{}{}",
                timestamp,
                description.replace(' ', "-"),
                extension
            ),
            None => format!("{}_{}{}", timestamp, stem.replace(' ', "-"), extension),
        }
    } else {
        format!("{}{}", timestamp, extension)
    };

    if resolved.confidence.is_low_trust() {
        PathBuf::from(media_root)
            .join("filesystem_dates")
            .join(filename)
    } else {
        PathBuf::from(media_root)
            .join(resolved.timestamp.year().to_string())
            .join(filename)
    }
}

/// Formats a naive timestamp as `YYYY-MM-DD_HHMMSS`.
pub fn format_timestamp(timestamp: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}_{:02}{:02}{:02}",
        timestamp.year(),
        u8::from(timestamp.month()),
        timestamp.day(),
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second()
    )
}
