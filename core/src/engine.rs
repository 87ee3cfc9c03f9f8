//! Source-tree walk: classify, resolve, plan, copy, record.
//!
//! Files are copied, never moved; originals stay intact. Metadata failures
//! degrade a single file's confidence and the walk continues, but a failure
//! to create a destination directory or copy bytes is an environment problem
//! that will recur for every subsequent file, so it halts the run.

use crate::media::{classify_media, MediaKind};
use crate::planner::{plan_destination, PreserveMode};
use crate::resolver::{read_camera_info, resolve_capture_time, DateConfidence};
use crate::sidecar::SidecarIndex;
use indicatif::ProgressBar;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;
use walkdir::WalkDir;

/// Options controlling one organize run.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizeConfig {
    pub preserve_filenames: PreserveMode,
    pub recursive: bool,
}

/// One result entry per discovered file.
///
/// `organized_path` is present exactly when `processed` is true, which in
/// turn happens only for image/video files that were copied successfully.
#[derive(Debug, Clone)]
pub struct MediaRecord {
    pub original_path: PathBuf,
    pub organized_path: Option<PathBuf>,
    pub display_filename: String,
    pub captured_at: Option<PrimitiveDateTime>,
    pub date_confidence: Option<DateConfidence>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub media_kind: MediaKind,
    pub processed: bool,
}

#[derive(Debug)]
pub enum OrganizeError {
    SourceMissing(PathBuf),
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl Display for OrganizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceMissing(path) => {
                write!(f, "source directory not found: {}", path.display())
            }
            Self::Io { source, path } => {
                write!(f, "io error for {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for OrganizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Counts regular files for progress bar sizing, matching what the organize
/// walk actually visits.
pub fn count_entries(root: &Path, recursive: bool) -> u64 {
    walker(root, recursive)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count() as u64
}

fn walker(root: &Path, recursive: bool) -> WalkDir {
    if recursive {
        WalkDir::new(root)
    } else {
        WalkDir::new(root).max_depth(1)
    }
}

/// Walks `source`, organizes every image/video into `dest`, and returns one
/// record per discovered file. Sidecar/other files are recorded but never
/// copied.
pub fn organize(
    source: &Path,
    dest: &Path,
    config: &OrganizeConfig,
    sidecar: Option<&SidecarIndex>,
    progress: &ProgressBar,
) -> Result<Vec<MediaRecord>, OrganizeError> {
    if !source.exists() {
        return Err(OrganizeError::SourceMissing(source.to_path_buf()));
    }

    let mut records = Vec::new();
    for entry in walker(source, config.recursive) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                progress.set_message(format!("Walk error: {}", error));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        progress.inc(1);
        let path = entry.path();
        progress.set_message(format!("Organizing: {}", path.display()));
        records.push(process_file(path, dest, config, sidecar)?);
    }

    Ok(records)
}

fn process_file(
    path: &Path,
    dest: &Path,
    config: &OrganizeConfig,
    sidecar: Option<&SidecarIndex>,
) -> Result<MediaRecord, OrganizeError> {
    let kind = classify_media(path);
    let original_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !kind.is_organizable() {
        return Ok(MediaRecord {
            original_path: path.to_path_buf(),
            organized_path: None,
            display_filename: original_name,
            captured_at: None,
            date_confidence: None,
            camera_make: None,
            camera_model: None,
            media_kind: kind,
            processed: false,
        });
    }

    let resolved = resolve_capture_time(path, sidecar);
    let camera = read_camera_info(path);
    let relative = plan_destination(
        resolved.as_ref(),
        &original_name,
        config.preserve_filenames,
        kind,
    );
    let target = dest.join(&relative);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|source| OrganizeError::Io {
            source,
            path: parent.to_path_buf(),
        })?;
    }
    fs::copy(path, &target).map_err(|source| OrganizeError::Io {
        source,
        path: path.to_path_buf(),
    })?;

    let display_filename = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(MediaRecord {
        original_path: path.to_path_buf(),
        organized_path: Some(target),
        display_filename,
        captured_at: resolved.map(|r| r.timestamp),
        date_confidence: resolved.map(|r| r.confidence),
        camera_make: camera.make,
        camera_model: camera.model,
        media_kind: kind,
        processed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressBar;
    use std::fs;

    use tempfile::tempdir;

    fn run(
        source: &Path,
        dest: &Path,
        config: &OrganizeConfig,
    ) -> Result<Vec<MediaRecord>, OrganizeError> {
        organize(source, dest, config, None, &ProgressBar::hidden())
    }

    #[test]
    fn missing_source_fails_before_walking() {
        let dir = tempdir().unwrap();
        let result = run(
            &dir.path().join("nope"),
            dir.path(),
            &OrganizeConfig::default(),
        );
        assert!(matches!(result, Err(OrganizeError::SourceMissing(_))));
    }

    #[test]
    fn organizes_media_and_records_skips() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        fs::write(
            source.path().join("Screenshot 2025-07-06 121830.png"),
            b"fake png",
        )
        .unwrap();
        fs::write(
            source.path().join("Photo Details.csv"),
            b"filename,originalCreationDate\n",
        )
        .unwrap();
        fs::write(source.path().join("random.txt"), b"notes").unwrap();

        let mut records = run(source.path(), dest.path(), &OrganizeConfig::default()).unwrap();
        records.sort_by(|a, b| a.original_path.cmp(&b.original_path));
        assert_eq!(records.len(), 3);

        let screenshot = records
            .iter()
            .find(|r| r.media_kind == MediaKind::Image)
            .unwrap();
        assert!(screenshot.processed);
        assert_eq!(
            screenshot.date_confidence,
            Some(DateConfidence::FilenameTimestamp)
        );
        let organized = screenshot.organized_path.as_ref().unwrap();
        assert!(organized.ends_with("photos/2025/2025-07-06_121830.png"));
        assert!(organized.exists());

        let sidecar = records
            .iter()
            .find(|r| r.media_kind == MediaKind::Sidecar)
            .unwrap();
        assert!(!sidecar.processed);
        assert!(sidecar.organized_path.is_none());

        let other = records
            .iter()
            .find(|r| r.media_kind == MediaKind::Other)
            .unwrap();
        assert!(!other.processed);
        assert_eq!(other.display_filename, "random.txt");
    }

    #[test]
    fn originals_are_left_in_place() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let original = source.path().join("20231215_143022.jpg");
        fs::write(&original, b"fake jpg").unwrap();

        let records = run(source.path(), dest.path(), &OrganizeConfig::default()).unwrap();
        assert!(records[0].processed);
        assert!(original.exists());
    }

    #[test]
    fn recursion_is_opt_in() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let nested = source.path().join("part2");
        fs::create_dir_all(&nested).unwrap();
        fs::write(source.path().join("top.jpg"), b"top").unwrap();
        fs::write(nested.join("deep.jpg"), b"deep").unwrap();

        let flat = run(source.path(), dest.path(), &OrganizeConfig::default()).unwrap();
        assert_eq!(flat.len(), 1);

        let config = OrganizeConfig {
            recursive: true,
            ..OrganizeConfig::default()
        };
        let deep = run(source.path(), dest.path(), &config).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn rerun_overwrites_same_destination() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        fs::write(source.path().join("20231215_143022.jpg"), b"fake jpg").unwrap();

        let first = run(source.path(), dest.path(), &OrganizeConfig::default()).unwrap();
        let second = run(source.path(), dest.path(), &OrganizeConfig::default()).unwrap();
        assert_eq!(first[0].organized_path, second[0].organized_path);
    }

    #[test]
    fn unsupported_video_like_metadata_is_dated_from_filename() {
        // Videos carry no EXIF readable here; the filename pattern still
        // applies and keeps them out of the review bucket.
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        fs::write(source.path().join("20200315_143530.mov"), b"fake mov").unwrap();

        let records = run(source.path(), dest.path(), &OrganizeConfig::default()).unwrap();
        let record = &records[0];
        assert_eq!(record.media_kind, MediaKind::Video);
        assert_eq!(
            record.date_confidence,
            Some(DateConfidence::FilenameTimestamp)
        );
        assert!(record
            .organized_path
            .as_ref()
            .unwrap()
            .ends_with("videos/2020/2020-03-15_143530.mov"));
    }

    #[test]
    fn count_entries_respects_recursion_flag() {
        let source = tempdir().unwrap();
        let nested = source.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(source.path().join("a.jpg"), b"a").unwrap();
        fs::write(nested.join("b.jpg"), b"b").unwrap();

        assert_eq!(count_entries(source.path(), false), 1);
        assert_eq!(count_entries(source.path(), true), 2);
    }

    #[test]
    fn count_entries_matches_walked_files() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let nested = source.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(source.path().join("a.jpg"), b"a").unwrap();
        fs::write(nested.join("b.jpg"), b"b").unwrap();
        fs::write(nested.join("c.txt"), b"c").unwrap();

        let config = OrganizeConfig {
            recursive: true,
            ..OrganizeConfig::default()
        };
        let records = run(source.path(), dest.path(), &config).unwrap();
        assert_eq!(count_entries(source.path(), true), records.len() as u64);
    }
}
