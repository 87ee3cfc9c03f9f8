//! Run summaries, printed and optionally written as JSON.

use crate::engine::MediaRecord;
use crate::gate::IngestStats;
use crate::planner::format_timestamp;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Serialize)]
struct RecordDescriptor {
    original_path: String,
    organized_path: Option<String>,
    filename: String,
    captured_at: Option<String>,
    date_confidence: Option<&'static str>,
    camera_make: Option<String>,
    camera_model: Option<String>,
    media_kind: &'static str,
    processed: bool,
}

impl RecordDescriptor {
    fn from_record(record: &MediaRecord) -> Self {
        Self {
            original_path: record.original_path.to_string_lossy().into_owned(),
            organized_path: record
                .organized_path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
            filename: record.display_filename.clone(),
            captured_at: record.captured_at.map(format_timestamp),
            date_confidence: record.date_confidence.map(|confidence| confidence.as_str()),
            camera_make: record.camera_make.clone(),
            camera_model: record.camera_model.clone(),
            media_kind: record.media_kind.as_str(),
            processed: record.processed,
        }
    }
}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {}", error),
            Self::Serialization(error) => write!(f, "serialization error: {}", error),
        }
    }
}

impl Error for ReportError {}

/// Prints the end-of-run tally.
pub fn print_summary(records: &[MediaRecord], stats: &IngestStats) {
    let processed = records.iter().filter(|record| record.processed).count();
    let skipped = records.len() - processed;
    let low_trust = records
        .iter()
        .filter(|record| {
            record
                .date_confidence
                .map(|confidence| confidence.is_low_trust())
                .unwrap_or(false)
        })
        .count();

    println!();
    println!("Organized {} files ({} skipped as non-media)", processed, skipped);
    if low_trust > 0 {
        println!("  {} dated from low-trust sources; review filesystem_dates/", low_trust);
    }
    println!(
        "Catalog: {} new, {} already present",
        stats.inserted, stats.skipped
    );
}

/// Writes the per-file records as pretty-printed JSON.
pub fn write_json(records: &[MediaRecord], output_path: &Path) -> Result<(), ReportError> {
    let descriptors: Vec<RecordDescriptor> =
        records.iter().map(RecordDescriptor::from_record).collect();

    let file = File::create(output_path).map_err(ReportError::Io)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &descriptors).map_err(ReportError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use crate::resolver::DateConfidence;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;
    use time::macros::datetime;

    #[test]
    fn json_report_round_trips_through_serde() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("report.json");
        let records = vec![MediaRecord {
            original_path: PathBuf::from("/import/IMG_0001.HEIC"),
            organized_path: Some(PathBuf::from("/library/photos/2024/2024-03-01_101500.heic")),
            display_filename: String::from("2024-03-01_101500.heic"),
            captured_at: Some(datetime!(2024-03-01 10:15:00)),
            date_confidence: Some(DateConfidence::EmbeddedOriginal),
            camera_make: Some(String::from("Apple")),
            camera_model: None,
            media_kind: MediaKind::Image,
            processed: true,
        }];

        write_json(&records, &output).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let entry = &parsed[0];
        assert_eq!(entry["captured_at"], "2024-03-01_101500");
        assert_eq!(entry["date_confidence"], "embedded_original");
        assert_eq!(entry["media_kind"], "image");
        assert_eq!(entry["processed"], true);
    }
}
