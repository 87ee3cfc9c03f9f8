//! iCloud "Photo Details" sidecar metadata.
//!
//! Multi-part iCloud exports ship a CSV per part mapping each file name to
//! its canonical metadata, most usefully `originalCreationDate`. This module
//! builds a filename lookup from one such CSV and consolidates multi-part
//! CSVs into a single file, deduplicating by filename.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use time::{Date, Month, PrimitiveDateTime, Time};

const FILENAME_COLUMN: &str = "filename";
const DATE_COLUMN: &str = "originalCreationDate";
const CHECKSUM_COLUMN: &str = "fileChecksum";

/// Canonical metadata for one exported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarEntry {
    pub captured_at: Option<PrimitiveDateTime>,
    pub checksum: Option<String>,
}

/// Filename-keyed lookup built from a Photo Details CSV.
#[derive(Debug, Clone, Default)]
pub struct SidecarIndex {
    entries: HashMap<String, SidecarEntry>,
}

impl SidecarIndex {
    /// Loads a Photo Details CSV. Rows without a filename and rows whose
    /// date fails to parse are kept usable (the date is simply absent);
    /// a file that cannot be read or lacks the filename column is an error.
    pub fn load(path: &Path) -> Result<Self, SidecarError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(SidecarError::Csv)?;

        let headers = reader.headers().map_err(SidecarError::Csv)?.clone();
        let filename_index = column_index(&headers, FILENAME_COLUMN)
            .ok_or(SidecarError::MissingColumn(FILENAME_COLUMN))?;
        let date_index = column_index(&headers, DATE_COLUMN);
        let checksum_index = column_index(&headers, CHECKSUM_COLUMN);

        let mut entries = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(SidecarError::Csv)?;
            let filename = match record.get(filename_index) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };

            let captured_at = date_index
                .and_then(|index| record.get(index))
                .and_then(parse_export_date);
            let checksum = checksum_index
                .and_then(|index| record.get(index))
                .filter(|value| !value.is_empty())
                .map(String::from);

            entries.insert(
                filename,
                SidecarEntry {
                    captured_at,
                    checksum,
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn lookup(&self, file_name: &str) -> Option<&SidecarEntry> {
        self.entries.get(file_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

/// iCloud export date format: "Friday July 4,2025 3:46 AM GMT". The leading
/// day name and trailing timezone are fixed noise; the hour may be 12-hour
/// with AM/PM or plain 24-hour.
static EXPORT_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*[a-z]+\s+([a-z]+)\s+(\d{1,2}),(\d{4})\s+(\d{1,2}):(\d{2})(?:\s+(AM|PM))?\s+[a-z]+\s*$")
        .expect("invalid export date regex")
});

/// Parses the iCloud export date format, returning `None` for anything that
/// does not fit.
pub fn parse_export_date(raw: &str) -> Option<PrimitiveDateTime> {
    let captures = EXPORT_DATE.captures(raw)?;
    let month = month_from_name(captures.get(1)?.as_str())?;
    let day: u8 = captures.get(2)?.as_str().parse().ok()?;
    let year: i32 = captures.get(3)?.as_str().parse().ok()?;
    let mut hour: u8 = captures.get(4)?.as_str().parse().ok()?;
    let minute: u8 = captures.get(5)?.as_str().parse().ok()?;

    if let Some(period) = captures.get(6) {
        if hour > 12 {
            return None;
        }
        hour %= 12;
        if period.as_str().eq_ignore_ascii_case("pm") {
            hour += 12;
        }
    }

    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, 0).ok()?;
    Some(PrimitiveDateTime::new(date, time))
}

fn month_from_name(name: &str) -> Option<Month> {
    match name.to_ascii_lowercase().as_str() {
        "january" => Some(Month::January),
        "february" => Some(Month::February),
        "march" => Some(Month::March),
        "april" => Some(Month::April),
        "may" => Some(Month::May),
        "june" => Some(Month::June),
        "july" => Some(Month::July),
        "august" => Some(Month::August),
        "september" => Some(Month::September),
        "october" => Some(Month::October),
        "november" => Some(Month::November),
        "december" => Some(Month::December),
        _ => None,
    }
}

/// Merges multiple Photo Details CSVs into one, deduplicating by filename
/// with the last occurrence winning. The header of the first readable CSV is
/// kept. Unreadable inputs are skipped. Returns the number of rows written.
pub fn consolidate(inputs: &[PathBuf], output: &Path) -> Result<usize, SidecarError> {
    if inputs.is_empty() {
        return Err(SidecarError::NoInputs);
    }

    let mut header: Option<csv::StringRecord> = None;
    let mut rows: Vec<csv::StringRecord> = Vec::new();
    let mut index_by_filename: HashMap<String, usize> = HashMap::new();

    for input in inputs {
        let mut reader = match csv::ReaderBuilder::new().has_headers(true).from_path(input) {
            Ok(reader) => reader,
            Err(_) => continue,
        };
        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(_) => continue,
        };
        let filename_index = match column_index(&headers, FILENAME_COLUMN) {
            Some(index) => index,
            None => continue,
        };
        if header.is_none() {
            header = Some(headers);
        }

        for record in reader.records().flatten() {
            let filename = match record.get(filename_index) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            match index_by_filename.get(&filename) {
                Some(&slot) => rows[slot] = record,
                None => {
                    index_by_filename.insert(filename, rows.len());
                    rows.push(record);
                }
            }
        }
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|source| SidecarError::Io {
            source,
            path: parent.to_path_buf(),
        })?;
    }

    let header = match header {
        Some(header) => header,
        // No readable input: still produce an (empty) output file so the
        // caller has something to point the organize stage at.
        None => {
            fs::write(output, b"").map_err(|source| SidecarError::Io {
                source,
                path: output.to_path_buf(),
            })?;
            return Ok(0);
        }
    };

    let mut writer = csv::Writer::from_path(output).map_err(SidecarError::Csv)?;
    writer.write_record(&header).map_err(SidecarError::Csv)?;
    for row in &rows {
        writer.write_record(row).map_err(SidecarError::Csv)?;
    }
    writer.flush().map_err(|source| SidecarError::Io {
        source,
        path: output.to_path_buf(),
    })?;

    Ok(rows.len())
}

#[derive(Debug)]
pub enum SidecarError {
    Csv(csv::Error),
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    MissingColumn(&'static str),
    NoInputs,
}

impl Display for SidecarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(error) => write!(f, "csv error: {}", error),
            Self::Io { source, path } => {
                write!(f, "io error for {}: {}", path.display(), source)
            }
            Self::MissingColumn(column) => {
                write!(f, "sidecar CSV is missing the '{}' column", column)
            }
            Self::NoInputs => write!(f, "no sidecar CSV paths were provided"),
        }
    }
}

impl Error for SidecarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(error) => Some(error),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::datetime;

    #[test]
    fn parses_icloud_export_dates() {
        assert_eq!(
            parse_export_date("Friday July 4,2025 3:46 AM GMT"),
            Some(datetime!(2025-07-04 03:46:00))
        );
        assert_eq!(
            parse_export_date("Monday December 25,2023 11:30 PM GMT"),
            Some(datetime!(2023-12-25 23:30:00))
        );
        // 12 AM is midnight, 12 PM is noon.
        assert_eq!(
            parse_export_date("Sunday January 1,2023 12:05 AM GMT"),
            Some(datetime!(2023-01-01 00:05:00))
        );
        assert_eq!(
            parse_export_date("Sunday January 1,2023 12:05 PM GMT"),
            Some(datetime!(2023-01-01 12:05:00))
        );
    }

    #[test]
    fn parses_24_hour_variant() {
        assert_eq!(
            parse_export_date("Friday July 4,2025 15:46 GMT"),
            Some(datetime!(2025-07-04 15:46:00))
        );
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_export_date(""), None);
        assert_eq!(parse_export_date("2025-07-04 15:46"), None);
        assert_eq!(parse_export_date("Friday Smarch 4,2025 3:46 AM GMT"), None);
    }

    #[test]
    fn loads_index_and_tolerates_bad_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Photo Details.csv");
        fs::write(
            &path,
            "filename,originalCreationDate,fileChecksum\n\
             IMG_1234.HEIC,\"Friday July 4,2025 3:46 AM GMT\",abc123\n\
             ,\"Friday July 4,2025 3:46 AM GMT\",orphan\n\
             broken.png,not a date,def456\n",
        )
        .unwrap();

        let index = SidecarIndex::load(&path).unwrap();
        assert_eq!(index.len(), 2);

        let entry = index.lookup("IMG_1234.HEIC").unwrap();
        assert_eq!(entry.captured_at, Some(datetime!(2025-07-04 03:46:00)));
        assert_eq!(entry.checksum.as_deref(), Some("abc123"));

        let broken = index.lookup("broken.png").unwrap();
        assert_eq!(broken.captured_at, None);
        assert_eq!(broken.checksum.as_deref(), Some("def456"));
    }

    #[test]
    fn load_requires_filename_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "name,date\nIMG_1.jpg,whenever\n").unwrap();
        assert!(matches!(
            SidecarIndex::load(&path),
            Err(SidecarError::MissingColumn(_))
        ));
    }

    #[test]
    fn consolidates_with_last_occurrence_winning() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("part1.csv");
        let second = dir.path().join("part2.csv");
        let output = dir.path().join("consolidated.csv");
        fs::write(
            &first,
            "filename,originalCreationDate,fileChecksum\n\
             a.jpg,\"Friday July 4,2025 3:46 AM GMT\",one\n\
             b.jpg,\"Friday July 4,2025 3:46 AM GMT\",two\n",
        )
        .unwrap();
        fs::write(
            &second,
            "filename,originalCreationDate,fileChecksum\n\
             b.jpg,\"Friday July 4,2025 3:46 AM GMT\",two-updated\n\
             c.jpg,\"Friday July 4,2025 3:46 AM GMT\",three\n",
        )
        .unwrap();

        let written = consolidate(&[first, second], &output).unwrap();
        assert_eq!(written, 3);

        let index = SidecarIndex::load(&output).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(
            index.lookup("b.jpg").unwrap().checksum.as_deref(),
            Some("two-updated")
        );
    }

    #[test]
    fn consolidate_skips_unreadable_inputs() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        let valid = dir.path().join("valid.csv");
        let output = dir.path().join("out.csv");
        fs::write(&valid, "filename,fileChecksum\na.jpg,one\n").unwrap();

        let written = consolidate(&[missing, valid], &output).unwrap();
        assert_eq!(written, 1);
    }

    #[test]
    fn consolidate_requires_inputs() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            consolidate(&[], &dir.path().join("out.csv")),
            Err(SidecarError::NoInputs)
        ));
    }
}
