//! SQLite catalog for organized media.
//!
//! One row per processed file, plus an optional location row per image.
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text so SQLite's date
//! functions and plain string ordering both work on the column.

use crate::engine::MediaRecord;
use crate::gate::{DuplicateGate, IngestStats};
use crate::gps::GeoFix;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use time::PrimitiveDateTime;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original_path TEXT NOT NULL,
    organized_path TEXT,
    filename TEXT NOT NULL,
    captured_at TEXT,
    date_confidence TEXT,
    camera_make TEXT,
    camera_model TEXT,
    media_kind TEXT NOT NULL,
    processed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_media_captured_at ON media(captured_at);
CREATE INDEX IF NOT EXISTS idx_media_camera ON media(camera_make, camera_model);
CREATE TABLE IF NOT EXISTS locations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    media_id INTEGER NOT NULL REFERENCES media(id),
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    altitude REAL
);
CREATE INDEX IF NOT EXISTS idx_locations_media_id ON locations(media_id);
";

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(error) => write!(f, "catalog error: {}", error),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(error) => Some(error),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Sqlite(error)
    }
}

/// Catalog handle wrapping one SQLite connection.
pub struct ArchiveStore {
    conn: Connection,
}

impl ArchiveStore {
    /// Opens (and if needed creates) the catalog at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Inserts one record and returns its row id.
    pub fn insert_record(&self, record: &MediaRecord) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO media (original_path, organized_path, filename, captured_at,
                                date_confidence, camera_make, camera_model, media_kind, processed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.original_path.to_string_lossy().into_owned(),
                record
                    .organized_path
                    .as_ref()
                    .map(|path| path.to_string_lossy().into_owned()),
                record.display_filename,
                record.captured_at.map(sql_datetime),
                record.date_confidence.map(|confidence| confidence.as_str()),
                record.camera_make,
                record.camera_model,
                record.media_kind.as_str(),
                record.processed as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Persists the processed records the gate has not seen, tallying what
    /// was inserted versus skipped. Unprocessed (sidecar/other) records are
    /// reported by the walk but never cataloged, so a rerun over the same
    /// source skips exactly what the previous run inserted.
    pub fn ingest(
        &self,
        gate: &DuplicateGate,
        records: &[MediaRecord],
    ) -> Result<IngestStats, StoreError> {
        let mut stats = IngestStats::default();
        for record in records.iter().filter(|record| record.processed) {
            if !gate.is_new(&record.original_path) {
                stats.skipped += 1;
                continue;
            }
            self.insert_record(record)?;
            stats.inserted += 1;
        }
        Ok(stats)
    }

    /// All original paths ever cataloged, for duplicate gating.
    pub fn original_paths(&self) -> Result<HashSet<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT original_path FROM media")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut paths = HashSet::new();
        for row in rows {
            paths.insert(row?);
        }
        Ok(paths)
    }

    pub fn insert_location(&self, media_id: i64, fix: &GeoFix) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO locations (media_id, latitude, longitude, altitude)
             VALUES (?1, ?2, ?3, ?4)",
            params![media_id, fix.latitude, fix.longitude, fix.altitude],
        )?;
        Ok(())
    }

    /// Organized images that have no location row yet, as (id, organized
    /// path) pairs. Videos are excluded; their containers are not parsed for
    /// geodata.
    pub fn records_without_location(&self) -> Result<Vec<(i64, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.organized_path
             FROM media m
             LEFT JOIN locations l ON l.media_id = m.id
             WHERE l.id IS NULL
               AND m.processed = 1
               AND m.media_kind = 'image'
               AND m.organized_path IS NOT NULL
             ORDER BY m.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn media_count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn sql_datetime(timestamp: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        timestamp.year(),
        u8::from(timestamp.month()),
        timestamp.day(),
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second()
    )
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

    fn record(original: &str, organized: Option<&str>) -> MediaRecord {
        MediaRecord {
            original_path: PathBuf::from(original),
            organized_path: organized.map(PathBuf::from),
            display_filename: String::from("2024-03-01_101500.heic"),
            captured_at: Some(datetime!(2024-03-01 10:15:00)),
            date_confidence: Some(DateConfidence::EmbeddedOriginal),
            camera_make: Some(String::from("Apple")),
            camera_model: Some(String::from("iPhone 15 Pro")),
            media_kind: MediaKind::Image,
            processed: organized.is_some(),
        }
    }

    #[test]
    fn open_creates_schema_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let store = ArchiveStore::open(&path).unwrap();
        assert_eq!(store.media_count().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn insert_and_gate_round_trip() {
        let store = ArchiveStore::open_in_memory().unwrap();
        let id = store
            .insert_record(&record("/src/IMG_0001.HEIC", Some("/lib/photos/x.heic")))
            .unwrap();
        assert!(id > 0);

        let paths = store.original_paths().unwrap();
        assert!(paths.contains("/src/IMG_0001.HEIC"));
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn captured_at_is_stored_as_sql_text() {
        let store = ArchiveStore::open_in_memory().unwrap();
        store
            .insert_record(&record("/src/a.jpg", Some("/lib/a.jpg")))
            .unwrap();
        let stored: String = store
            .conn
            .query_row("SELECT captured_at FROM media", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "2024-03-01 10:15:00");
    }

    #[test]
    fn location_backlog_lists_only_images_without_fix() {
        let store = ArchiveStore::open_in_memory().unwrap();
        let with_fix = store
            .insert_record(&record("/src/a.jpg", Some("/lib/a.jpg")))
            .unwrap();
        let without_fix = store
            .insert_record(&record("/src/b.jpg", Some("/lib/b.jpg")))
            .unwrap();

        let mut video = record("/src/c.mov", Some("/lib/c.mov"));
        video.media_kind = MediaKind::Video;
        store.insert_record(&video).unwrap();

        store
            .insert_location(
                with_fix,
                &GeoFix {
                    latitude: 45.0,
                    longitude: 11.0,
                    altitude: Some(120.0),
                },
            )
            .unwrap();

        let backlog = store.records_without_location().unwrap();
        assert_eq!(backlog, vec![(without_fix, String::from("/lib/b.jpg"))]);
    }

    #[test]
    fn reingest_skips_exactly_what_was_inserted() {
        use crate::engine::{organize, OrganizeConfig};
        use indicatif::ProgressBar;

        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        fs::write(source.path().join("20231215_143022.jpg"), b"one").unwrap();
        fs::write(source.path().join("20200315_143530.mov"), b"two").unwrap();
        fs::write(source.path().join("notes.txt"), b"skip me").unwrap();

        let store = ArchiveStore::open_in_memory().unwrap();
        let config = OrganizeConfig::default();
        let bar = ProgressBar::hidden();

        let records = organize(source.path(), dest.path(), &config, None, &bar).unwrap();
        let gate = DuplicateGate::new(store.original_paths().unwrap());
        let first = store.ingest(&gate, &records).unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.skipped, 0);

        let records = organize(source.path(), dest.path(), &config, None, &bar).unwrap();
        let gate = DuplicateGate::new(store.original_paths().unwrap());
        let second = store.ingest(&gate, &records).unwrap();
        assert_eq!(second.skipped, first.inserted);
        assert_eq!(second.inserted, 0);
        assert_eq!(store.media_count().unwrap(), 2);
    }

    #[test]
    fn unprocessed_records_are_allowed_but_not_in_backlog() {
        let store = ArchiveStore::open_in_memory().unwrap();
        let mut skipped = record("/src/notes.txt", None);
        skipped.media_kind = MediaKind::Sidecar;
        skipped.captured_at = None;
        skipped.date_confidence = None;
        store.insert_record(&skipped).unwrap();

        assert_eq!(store.media_count().unwrap(), 1);
        assert!(store.records_without_location().unwrap().is_empty());
    }
}
