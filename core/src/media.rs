//! Media kind classification by file extension.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats accepted for organization.
pub const IMAGE_EXTENSIONS: &[&str] = &["heic", "jpg", "jpeg", "png", "webp"];

/// Video formats accepted for organization.
pub const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "avi", "mkv"];

/// Sidecar/metadata formats that travel with an export but are never copied.
/// Plain text files are not metadata and fall through to `Other`.
pub const SIDECAR_EXTENSIONS: &[&str] = &["csv", "json"];

/// Coarse classification of a discovered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    /// Export metadata such as Photo Details CSVs.
    Sidecar,
    Other,
}

impl MediaKind {
    /// Top-level archive directory for organizable media.
    pub fn media_root(self) -> Option<&'static str> {
        match self {
            MediaKind::Image => Some("photos"),
            MediaKind::Video => Some("videos"),
            MediaKind::Sidecar | MediaKind::Other => None,
        }
    }

    /// Returns true if files of this kind are copied into the archive.
    pub fn is_organizable(self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Video)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Sidecar => "sidecar",
            MediaKind::Other => "other",
        }
    }
}

/// Classifies a path by its extension, case-insensitively.
pub fn classify_media(path: &Path) -> MediaKind {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Image,
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Video,
        Some(ext) if SIDECAR_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Sidecar,
        _ => MediaKind::Other,
    }
}
