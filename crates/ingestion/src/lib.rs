//! Data ingestion and output for the weekly workload pipeline.
//!
//! This crate handles:
//! - CSV/JSON loading with schema and contract checks
//! - Joining workload stats with injury flags
//! - Writing the augmented table

pub mod loader;
pub mod merge;

pub use loader::{
    load_injuries_csv, load_records_csv, load_records_json, load_stats_csv, read_injuries_csv,
    read_records_csv, read_records_json, read_stats_csv, write_augmented, write_augmented_csv, write_augmented_json,
    OutputRow,
};
pub use merge::{join_injuries, InjuryRecord, WeeklyStats};
