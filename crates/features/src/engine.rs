//! Per-entity feature computation.
//!
//! Combines the rolling, delta and cumulative components into a single
//! streaming pass over one entity's ordered records.

use crate::{
    cumulative::CumulativeCounter,
    delta::DeltaTracker,
    grouping::EntityGroup,
    rolling::RollingWindow,
};
use injury_core::{config::FeatureConfig, AugmentedRecord, DerivedFeatureSet, TemporalRecord};

/// Feature computation engine for one entity at a time.
///
/// State must be cleared between entities; [`FeatureEngine::process_group`]
/// does this itself.
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    /// Trailing mean of touches.
    rolling_touches: RollingWindow,
    /// Trailing mean of routes.
    rolling_routes: RollingWindow,
    /// Trailing sum of healthy weeks.
    games_played: RollingWindow,
    /// Trailing sum of injured weeks.
    games_missed: RollingWindow,
    /// First difference of touches.
    delta_touches: DeltaTracker,
    /// Running injury count.
    injury_history: CumulativeCounter,
    /// Records seen since the last clear.
    processed: usize,
}

impl FeatureEngine {
    /// Create a new feature engine from configuration.
    pub fn new(config: &FeatureConfig) -> Self {
        let (window, min_periods) = (config.window, config.min_periods);

        Self {
            rolling_touches: RollingWindow::mean(window, min_periods),
            rolling_routes: RollingWindow::mean(window, min_periods),
            games_played: RollingWindow::sum(window, min_periods),
            games_missed: RollingWindow::sum(window, min_periods),
            delta_touches: DeltaTracker::new(config.delta_fill),
            injury_history: CumulativeCounter::new(),
            processed: 0,
        }
    }

    /// Advance by one record and return its features.
    ///
    /// Records must arrive in (season, week) order for a single entity.
    pub fn update(&mut self, record: &TemporalRecord) -> DerivedFeatureSet {
        let touches = record.touches();
        let injured = record.injured_f64();
        self.processed += 1;

        DerivedFeatureSet {
            touches,
            workload: record.workload(),
            rolling_touches: self.rolling_touches.push(touches),
            rolling_routes: self.rolling_routes.push(record.routes),
            delta_touches: self.delta_touches.push(touches),
            games_played_recent: self.games_played.push(1.0 - injured),
            games_missed_recent: self.games_missed.push(injured),
            injury_history_score: self.injury_history.push(record.is_injured()),
        }
    }

    /// Compute features for a whole entity group, starting from fresh state.
    pub fn process_group(&mut self, group: EntityGroup) -> Vec<AugmentedRecord> {
        self.clear();

        group
            .records
            .into_iter()
            .map(|indexed| {
                let features = self.update(&indexed.record);
                AugmentedRecord {
                    record: indexed.record,
                    features,
                    source_row: indexed.source_row,
                }
            })
            .collect()
    }

    /// Records seen since the last clear.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Clear all state.
    pub fn clear(&mut self) {
        self.rolling_touches.clear();
        self.rolling_routes.clear();
        self.games_played.clear();
        self.games_missed.clear();
        self.delta_touches.clear();
        self.injury_history.reset();
        self.processed = 0;
    }
}
