//! Feature table assembly.
//!
//! Validates the input, groups it by entity, runs one [`FeatureEngine`] per
//! group and merges the results into the canonical
//! (entity_id, season, week) order.

use crate::{
    engine::FeatureEngine,
    grouping::{EntityGroup, EntityGroups},
};
use injury_core::{config::FeatureConfig, AugmentedRecord, Config, Error, Result, TemporalRecord};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Output of one assembly run.
#[derive(Debug, Clone, Default)]
pub struct AugmentedTable {
    rows: Vec<AugmentedRecord>,
    entity_count: usize,
}

impl AugmentedTable {
    /// Rows in canonical order.
    pub fn rows(&self) -> &[AugmentedRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<AugmentedRecord> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct entities.
    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AugmentedRecord> {
        self.rows.iter()
    }

    /// Rows of one entity in (season, week) order.
    pub fn entity_rows<'a>(
        &'a self,
        entity_id: &'a str,
    ) -> impl Iterator<Item = &'a AugmentedRecord> + 'a {
        self.rows
            .iter()
            .filter(move |r| r.record.entity_id == entity_id)
    }

    /// Re-sort rows into the order the records were supplied in.
    pub fn into_input_order(mut self) -> Vec<AugmentedRecord> {
        self.rows.sort_by_key(|r| r.source_row);
        self.rows
    }
}

impl<'a> IntoIterator for &'a AugmentedTable {
    type Item = &'a AugmentedRecord;
    type IntoIter = std::slice::Iter<'a, AugmentedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Builds the augmented table from raw weekly records.
#[derive(Debug, Clone)]
pub struct FeatureTableAssembler {
    config: Config,
    /// Dedicated worker pool when a fixed worker count is configured;
    /// shared by every `assemble` call on this assembler.
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl FeatureTableAssembler {
    /// Create an assembler, rejecting invalid configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let workers = config.execution.workers;
        let pool = if workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers as usize)
                .build()
                .map_err(|e| Error::config(format!("failed to build worker pool: {}", e)))?;
            debug!(workers, "Built dedicated worker pool");
            Some(Arc::new(pool))
        } else {
            None
        };

        Ok(Self { config, pool })
    }

    /// Threads in the dedicated pool, or `None` when the global pool is used.
    pub fn worker_threads(&self) -> Option<usize> {
        self.pool.as_ref().map(|pool| pool.current_num_threads())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compute derived features for every record.
    ///
    /// Returns exactly one row per input record, sorted by
    /// (entity_id, season, week). Fails on the first invalid record.
    pub fn assemble(&self, records: Vec<TemporalRecord>) -> Result<AugmentedTable> {
        if records.is_empty() {
            return Err(Error::EmptyInput);
        }
        for record in &records {
            record.validate(&self.config.schedule)?;
        }

        let input_len = records.len();
        let groups = EntityGroups::from_records(records)?;
        let entity_count = groups.len();
        let parallel = self.config.execution.use_parallel(input_len);

        info!(
            records = input_len,
            entities = entity_count,
            parallel,
            "Assembling feature table"
        );

        let groups = groups.into_groups();
        let per_entity = if parallel {
            self.run_parallel(groups)
        } else {
            run_sequential(&self.config.features, groups)
        };

        // Groups come out ascending by entity id and each group is already
        // time-ordered, so concatenation is the canonical order.
        let rows: Vec<AugmentedRecord> = per_entity.into_iter().flatten().collect();
        debug_assert_eq!(rows.len(), input_len);
        debug_assert!(rows.windows(2).all(|w| w[0].key() < w[1].key()));

        debug!(rows = rows.len(), "Feature table assembled");

        Ok(AugmentedTable { rows, entity_count })
    }

    fn run_parallel(&self, groups: Vec<EntityGroup>) -> Vec<Vec<AugmentedRecord>> {
        let features = &self.config.features;
        match &self.pool {
            Some(pool) => pool.install(|| process_par(features, groups)),
            None => process_par(features, groups),
        }
    }
}

impl Default for FeatureTableAssembler {
    fn default() -> Self {
        Self {
            config: Config::default(),
            pool: None,
        }
    }
}

fn run_sequential(features: &FeatureConfig, groups: Vec<EntityGroup>) -> Vec<Vec<AugmentedRecord>> {
    let mut engine = FeatureEngine::new(features);
    groups
        .into_iter()
        .map(|group| engine.process_group(group))
        .collect()
}

fn process_par(features: &FeatureConfig, groups: Vec<EntityGroup>) -> Vec<Vec<AugmentedRecord>> {
    // Each worker owns its engine; collect keeps group order.
    groups
        .into_par_iter()
        .map_init(
            || FeatureEngine::new(features),
            |engine, group| engine.process_group(group),
        )
        .collect()
}

/// Compute the augmented table with the given configuration.
pub fn engineer_features(records: Vec<TemporalRecord>, config: &Config) -> Result<AugmentedTable> {
    FeatureTableAssembler::new(config.clone())?.assemble(records)
}
