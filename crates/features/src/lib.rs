//! Derived workload features for weekly per-entity records.
//!
//! This crate handles:
//! - Chronological grouping by entity
//! - Trailing-window means and sums
//! - First differences
//! - Per-entity cumulative counters
//! - Assembly of the augmented table
//! - Projection onto model predictors

pub mod grouping;
pub mod rolling;
pub mod delta;
pub mod cumulative;
pub mod engine;
pub mod assembler;
pub mod model_input;

pub use grouping::{EntityGroup, EntityGroups, IndexedRecord};
pub use rolling::{RollingStat, RollingWindow};
pub use delta::DeltaTracker;
pub use cumulative::CumulativeCounter;
pub use engine::FeatureEngine;
pub use assembler::{engineer_features, AugmentedTable, FeatureTableAssembler};
pub use model_input::{ModelInput, FEATURE_NAMES};
