//! PyO3 bindings for the weekly workload feature engine.
//!
//! Exposes the Rust feature pipeline to Python:
//! - Weekly record and augmented record types
//! - Feature table assembly
//! - CSV loading plus assembly in one call
//! - Model predictor projection

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use injury_core::{
    AugmentedRecord as RustAugmentedRecord, Config as RustConfig,
    DerivedFeatureSet as RustDerivedFeatureSet, Error as RustError,
    TemporalRecord as RustTemporalRecord,
};
use injury_features::{engineer_features as rust_engineer_features, ModelInput, FEATURE_NAMES};
use injury_ingestion::load_records_csv;

fn to_py_err(err: RustError) -> PyErr {
    match err {
        RustError::Io(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One weekly observation for one entity.
#[pyclass]
#[derive(Clone)]
pub struct WeeklyRecord {
    #[pyo3(get, set)]
    pub entity_id: String,
    #[pyo3(get, set)]
    pub season: i32,
    #[pyo3(get, set)]
    pub week: u32,
    #[pyo3(get, set)]
    pub carries: f64,
    #[pyo3(get, set)]
    pub targets: f64,
    #[pyo3(get, set)]
    pub routes: f64,
    #[pyo3(get, set)]
    pub pass_att: f64,
    #[pyo3(get, set)]
    pub rush_yds: f64,
    #[pyo3(get, set)]
    pub rec_yds: f64,
    #[pyo3(get, set)]
    pub snaps: f64,
    #[pyo3(get, set)]
    pub fantasy_points: f64,
    #[pyo3(get, set)]
    pub injured: u8,
    #[pyo3(get, set)]
    pub name: Option<String>,
    #[pyo3(get, set)]
    pub category: Option<String>,
}

#[pymethods]
impl WeeklyRecord {
    #[new]
    #[pyo3(signature = (
        entity_id, season, week, carries, targets, routes,
        pass_att=0.0, rush_yds=0.0, rec_yds=0.0, snaps=0.0, fantasy_points=0.0,
        injured=0, name=None, category=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        entity_id: String,
        season: i32,
        week: u32,
        carries: f64,
        targets: f64,
        routes: f64,
        pass_att: f64,
        rush_yds: f64,
        rec_yds: f64,
        snaps: f64,
        fantasy_points: f64,
        injured: u8,
        name: Option<String>,
        category: Option<String>,
    ) -> Self {
        WeeklyRecord {
            entity_id,
            season,
            week,
            carries,
            targets,
            routes,
            pass_att,
            rush_yds,
            rec_yds,
            snaps,
            fantasy_points,
            injured,
            name,
            category,
        }
    }

    #[getter]
    fn touches(&self) -> f64 {
        self.carries + self.targets
    }

    #[getter]
    fn workload(&self) -> f64 {
        self.carries + self.targets + self.routes
    }

    fn __repr__(&self) -> String {
        format!(
            "WeeklyRecord(entity_id={:?}, season={}, week={}, injured={})",
            self.entity_id, self.season, self.week, self.injured
        )
    }
}

impl From<WeeklyRecord> for RustTemporalRecord {
    fn from(r: WeeklyRecord) -> Self {
        RustTemporalRecord {
            entity_id: r.entity_id,
            name: r.name,
            category: r.category,
            season: r.season,
            week: r.week,
            carries: r.carries,
            targets: r.targets,
            routes: r.routes,
            pass_att: r.pass_att,
            rush_yds: r.rush_yds,
            rec_yds: r.rec_yds,
            snaps: r.snaps,
            fantasy_points: r.fantasy_points,
            injured: r.injured,
        }
    }
}

impl From<RustTemporalRecord> for WeeklyRecord {
    fn from(r: RustTemporalRecord) -> Self {
        WeeklyRecord {
            entity_id: r.entity_id,
            season: r.season,
            week: r.week,
            carries: r.carries,
            targets: r.targets,
            routes: r.routes,
            pass_att: r.pass_att,
            rush_yds: r.rush_yds,
            rec_yds: r.rec_yds,
            snaps: r.snaps,
            fantasy_points: r.fantasy_points,
            injured: r.injured,
            name: r.name,
            category: r.category,
        }
    }
}

/// A weekly record with its derived features.
#[pyclass]
#[derive(Clone)]
pub struct AugmentedRecord {
    #[pyo3(get)]
    pub record: WeeklyRecord,
    #[pyo3(get)]
    pub touches: f64,
    #[pyo3(get)]
    pub workload: f64,
    #[pyo3(get)]
    pub rolling_touches: Option<f64>,
    #[pyo3(get)]
    pub rolling_routes: Option<f64>,
    #[pyo3(get)]
    pub delta_touches: f64,
    #[pyo3(get)]
    pub games_played_recent: Option<f64>,
    #[pyo3(get)]
    pub games_missed_recent: Option<f64>,
    #[pyo3(get)]
    pub injury_history_score: u32,
    #[pyo3(get)]
    pub source_row: usize,
}

#[pymethods]
impl AugmentedRecord {
    fn __repr__(&self) -> String {
        format!(
            "AugmentedRecord(entity_id={:?}, season={}, week={}, rolling_touches={:?}, injury_history_score={})",
            self.record.entity_id,
            self.record.season,
            self.record.week,
            self.rolling_touches,
            self.injury_history_score
        )
    }
}

impl From<RustAugmentedRecord> for AugmentedRecord {
    fn from(row: RustAugmentedRecord) -> Self {
        let f = row.features;
        AugmentedRecord {
            record: row.record.into(),
            touches: f.touches,
            workload: f.workload,
            rolling_touches: f.rolling_touches,
            rolling_routes: f.rolling_routes,
            delta_touches: f.delta_touches,
            games_played_recent: f.games_played_recent,
            games_missed_recent: f.games_missed_recent,
            injury_history_score: f.injury_history_score,
            source_row: row.source_row,
        }
    }
}

impl From<AugmentedRecord> for RustAugmentedRecord {
    fn from(row: AugmentedRecord) -> Self {
        RustAugmentedRecord {
            record: row.record.into(),
            features: RustDerivedFeatureSet {
                touches: row.touches,
                workload: row.workload,
                rolling_touches: row.rolling_touches,
                rolling_routes: row.rolling_routes,
                delta_touches: row.delta_touches,
                games_played_recent: row.games_played_recent,
                games_missed_recent: row.games_missed_recent,
                injury_history_score: row.injury_history_score,
            },
            source_row: row.source_row,
        }
    }
}

// ============================================================================
// Python-exposed Functions
// ============================================================================

/// Compute derived features, sorted by (entity_id, season, week).
#[pyfunction]
#[pyo3(signature = (records, window=3, min_periods=1, workers=0))]
fn engineer_features(
    py: Python<'_>,
    records: Vec<WeeklyRecord>,
    window: usize,
    min_periods: usize,
    workers: u32,
) -> PyResult<Vec<AugmentedRecord>> {
    let mut config = RustConfig::default();
    config.features.window = window;
    config.features.min_periods = min_periods;
    config.execution.workers = workers;

    let records: Vec<RustTemporalRecord> = records.into_iter().map(Into::into).collect();
    let table = py
        .allow_threads(|| rust_engineer_features(records, &config))
        .map_err(to_py_err)?;

    Ok(table.into_rows().into_iter().map(Into::into).collect())
}

/// Load a weekly CSV table and compute derived features.
#[pyfunction]
#[pyo3(signature = (path, config_path=None))]
fn load_and_engineer(
    py: Python<'_>,
    path: &str,
    config_path: Option<&str>,
) -> PyResult<Vec<AugmentedRecord>> {
    let config = match config_path {
        Some(p) => RustConfig::from_file(p).map_err(to_py_err)?,
        None => RustConfig::default(),
    };

    let table = py
        .allow_threads(|| {
            let records = load_records_csv(path, &config.schedule)?;
            rust_engineer_features(records, &config)
        })
        .map_err(to_py_err)?;

    Ok(table.into_rows().into_iter().map(Into::into).collect())
}

/// Predictor rows and labels for the injury classifier.
#[pyfunction]
fn model_input(rows: Vec<AugmentedRecord>) -> (Vec<Vec<f64>>, Vec<u8>) {
    let rows: Vec<RustAugmentedRecord> = rows.into_iter().map(Into::into).collect();
    let input = ModelInput::from_rows(&rows);
    let features = input.features.iter().map(|r| r.to_vec()).collect();
    (features, input.labels)
}

// ============================================================================
// Module Definition
// ============================================================================

/// Weekly workload features - Rust feature engine for Python.
#[pymodule]
fn injury_workload_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<WeeklyRecord>()?;
    m.add_class::<AugmentedRecord>()?;

    // Functions
    m.add_function(wrap_pyfunction!(engineer_features, m)?)?;
    m.add_function(wrap_pyfunction!(load_and_engineer, m)?)?;
    m.add_function(wrap_pyfunction!(model_input, m)?)?;

    m.add("FEATURE_NAMES", FEATURE_NAMES.to_vec())?;

    Ok(())
}
