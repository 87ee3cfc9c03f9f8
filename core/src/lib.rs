//! Core organizing engine for Shoebox.
//!
//! This crate exposes the date-resolution, path-planning, and cataloging
//! machinery used by the CLI: walk a source tree, resolve each file's capture
//! time from the best available evidence, copy it into a date-structured
//! library, and record the outcome in a SQLite catalog.

pub mod config;
pub mod engine;
pub mod gate;
pub mod gps;
pub mod media;
pub mod naming;
pub mod planner;
pub mod progress;
pub mod report;
pub mod resolver;
pub mod sidecar;
pub mod store;

pub use config::{expand_tilde, AppConfig, ConfigError, DEFAULT_CONFIG_FILE};
pub use engine::{count_entries, organize, MediaRecord, OrganizeConfig, OrganizeError};
pub use gate::{DuplicateGate, IngestStats};
pub use gps::{extract_geo_fix, to_decimal_degrees, GeoFix};
pub use media::{classify_media, MediaKind};
pub use naming::{extract_description, is_descriptive_name};
pub use planner::{format_timestamp, plan_destination, PreserveMode};
pub use report::{print_summary, write_json, ReportError};
pub use resolver::{
    date_from_stem, read_camera_info, resolve_capture_time, CameraInfo, DateConfidence,
    ResolvedDate,
};
pub use sidecar::{consolidate, SidecarEntry, SidecarError, SidecarIndex};
pub use store::{ArchiveStore, StoreError};
