//! Predictor matrix for the injury classifier.
//!
//! Projects the augmented table onto the columns the model-training side
//! consumes, with `injured` as the label.

use injury_core::{AugmentedRecord, RecordKey};
use serde::Serialize;

/// Predictor columns, in matrix column order.
pub const FEATURE_NAMES: [&str; 6] = [
    "season",
    "week",
    "workload",
    "games_played_recent",
    "games_missed_recent",
    "injury_history_score",
];

/// Number of predictor columns.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Row-major predictors plus labels.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelInput {
    pub features: Vec<[f64; FEATURE_COUNT]>,
    pub labels: Vec<u8>,
    pub keys: Vec<RecordKey>,
    /// Rows dropped because a windowed feature was absent.
    pub skipped: usize,
}

impl ModelInput {
    /// Build the matrix from augmented rows, preserving their order.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a AugmentedRecord>,
    {
        let mut input = ModelInput::default();

        for row in rows {
            let f = &row.features;
            let (Some(played), Some(missed)) = (f.games_played_recent, f.games_missed_recent)
            else {
                input.skipped += 1;
                continue;
            };

            input.features.push([
                row.record.season as f64,
                row.record.week as f64,
                f.workload,
                played,
                missed,
                f.injury_history_score as f64,
            ]);
            input.labels.push(row.record.injured);
            input.keys.push(row.key());
        }

        input
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Values of one named predictor column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = FEATURE_NAMES.iter().position(|&n| n == name)?;
        Some(self.features.iter().map(|row| row[idx]).collect())
    }

    /// Fraction of rows labelled injured.
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        positives as f64 / self.labels.len() as f64
    }
}
