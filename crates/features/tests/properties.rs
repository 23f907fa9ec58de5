//! End-to-end checks of the augmented table.

use approx::assert_relative_eq;
use injury_core::{AugmentedRecord, Config, Error, TemporalRecord};
use injury_features::{engineer_features, FeatureTableAssembler, ModelInput, FEATURE_NAMES};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn make_record(entity: &str, season: i32, week: u32, carries: f64, targets: f64, injured: u8) -> TemporalRecord {
    TemporalRecord {
        entity_id: entity.to_string(),
        name: Some(format!("Player_{}", entity)),
        category: Some("RB".to_string()),
        season,
        week,
        carries,
        targets,
        routes: 10.0 + week as f64,
        pass_att: 0.0,
        rush_yds: carries * 4.0,
        rec_yds: targets * 8.0,
        snaps: 40.0,
        fantasy_points: 11.0,
        injured,
    }
}

/// Deterministic pseudo-random league: `entities` players over two seasons.
fn league(entities: usize) -> Vec<TemporalRecord> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut records = Vec::new();
    for season in [2022, 2023] {
        for week in 1..=18 {
            for e in 0..entities {
                let carries = (next() % 20) as f64;
                let targets = (next() % 10) as f64;
                let injured = u8::from(next() % 10 == 0);
                records.push(make_record(&format!("P{:04}", e), season, week, carries, targets, injured));
            }
        }
    }
    records
}

fn rows_for<'a>(rows: &'a [AugmentedRecord], entity: &str) -> Vec<&'a AugmentedRecord> {
    rows.iter().filter(|r| r.record.entity_id == entity).collect()
}

#[test]
fn worked_example() {
    init_tracing();
    let records: Vec<TemporalRecord> = [0u8, 1, 0, 0, 1]
        .iter()
        .enumerate()
        .map(|(i, &inj)| make_record("E", 2023, i as u32 + 1, 6.0, 2.0, inj))
        .collect();

    let table = engineer_features(records, &Config::default()).unwrap();
    let history: Vec<u32> = table.iter().map(|r| r.features.injury_history_score).collect();
    let missed: Vec<f64> = table.iter().map(|r| r.features.games_missed_recent.unwrap()).collect();
    let played: Vec<f64> = table.iter().map(|r| r.features.games_played_recent.unwrap()).collect();

    assert_eq!(history, vec![0, 1, 1, 1, 2]);
    assert_eq!(missed, vec![0.0, 1.0, 1.0, 1.0, 1.0]);
    assert_eq!(played, vec![1.0, 1.0, 2.0, 2.0, 2.0]);
}

#[test]
fn rolling_touches_matches_trailing_mean() {
    let table = engineer_features(league(12), &Config::default()).unwrap();
    let rows = table.rows();

    for e in 0..12 {
        let entity = rows_for(rows, &format!("P{:04}", e));
        assert_eq!(entity.len(), 36);

        let first = &entity[0].features;
        assert_eq!(first.rolling_touches, Some(first.touches));

        for i in 2..entity.len() {
            let expected = (entity[i - 2].features.touches
                + entity[i - 1].features.touches
                + entity[i].features.touches)
                / 3.0;
            assert_relative_eq!(entity[i].features.rolling_touches.unwrap(), expected, epsilon = 1e-9);

            let routes = (entity[i - 2].record.routes + entity[i - 1].record.routes + entity[i].record.routes) / 3.0;
            assert_relative_eq!(entity[i].features.rolling_routes.unwrap(), routes, epsilon = 1e-9);
        }
    }
}

#[test]
fn delta_touches_is_first_difference() {
    let table = engineer_features(league(5), &Config::default()).unwrap();

    for e in 0..5 {
        let entity = rows_for(table.rows(), &format!("P{:04}", e));
        assert_eq!(entity[0].features.delta_touches, 0.0);
        for i in 1..entity.len() {
            assert_eq!(
                entity[i].features.delta_touches,
                entity[i].features.touches - entity[i - 1].features.touches
            );
        }
    }
}

#[test]
fn window_occupancy_identity() {
    let table = engineer_features(league(8), &Config::default()).unwrap();

    for e in 0..8 {
        let entity = rows_for(table.rows(), &format!("P{:04}", e));
        for (i, row) in entity.iter().enumerate() {
            let f = &row.features;
            let occupancy = (i + 1).min(3) as f64;
            assert_eq!(f.games_played_recent.unwrap() + f.games_missed_recent.unwrap(), occupancy);
        }
    }
}

#[test]
fn injury_history_is_monotone_and_isolated() {
    let base = league(6);
    let before = engineer_features(base.clone(), &Config::default()).unwrap();

    // Flip every injury flag of one entity.
    let altered: Vec<TemporalRecord> = base
        .into_iter()
        .map(|mut r| {
            if r.entity_id == "P0003" {
                r.injured = 1 - r.injured;
            }
            r
        })
        .collect();
    let after = engineer_features(altered, &Config::default()).unwrap();

    for e in 0..6 {
        let id = format!("P{:04}", e);
        let a = rows_for(before.rows(), &id);
        assert!(a
            .windows(2)
            .all(|w| w[0].features.injury_history_score <= w[1].features.injury_history_score));

        if id != "P0003" {
            let b = rows_for(after.rows(), &id);
            let sa: Vec<u32> = a.iter().map(|r| r.features.injury_history_score).collect();
            let sb: Vec<u32> = b.iter().map(|r| r.features.injury_history_score).collect();
            assert_eq!(sa, sb);
        }
    }
}

#[test]
fn rerun_is_bit_identical() {
    let records = league(10);
    let first = engineer_features(records.clone(), &Config::default()).unwrap();
    let second = engineer_features(records, &Config::default()).unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.key(), b.key());
        assert_eq!(
            a.features.rolling_touches.map(f64::to_bits),
            b.features.rolling_touches.map(f64::to_bits)
        );
        assert_eq!(a.features, b.features);
    }
}

#[test]
fn parallel_matches_sequential() {
    init_tracing();
    let records = league(40);

    let mut sequential = Config::default();
    sequential.execution.workers = 1;

    let mut parallel = Config::default();
    parallel.execution.workers = 4;
    parallel.execution.parallel_threshold = 0;

    let a = engineer_features(records.clone(), &sequential).unwrap();
    let b = engineer_features(records.clone(), &parallel).unwrap();

    let mut auto = Config::default();
    auto.execution.parallel_threshold = 0;
    let c = engineer_features(records, &auto).unwrap();

    assert_eq!(a.rows(), b.rows());
    assert_eq!(a.rows(), c.rows());
}

#[test]
fn cardinality_and_input_order() {
    let mut records = league(4);
    records.reverse();
    let n = records.len();
    let first_key = records[0].key();

    let table = FeatureTableAssembler::default().assemble(records).unwrap();
    assert_eq!(table.len(), n);
    assert_eq!(table.entity_count(), 4);
    assert!(table.rows().windows(2).all(|w| w[0].key() < w[1].key()));

    let restored = table.into_input_order();
    assert_eq!(restored[0].key(), first_key);
    assert!(restored.iter().enumerate().all(|(i, r)| r.source_row == i));
}

#[test]
fn errors_fail_fast() {
    let err = engineer_features(vec![], &Config::default()).unwrap_err();
    assert!(matches!(err, Error::EmptyInput));

    let mut records = league(2);
    records.push(records[5].clone());
    let err = engineer_features(records, &Config::default()).unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }));
}

#[test]
fn model_input_from_table() {
    let table = engineer_features(league(3), &Config::default()).unwrap();
    let input = ModelInput::from_rows(&table);

    assert_eq!(input.len(), table.len());
    assert_eq!(input.skipped, 0);
    assert_eq!(FEATURE_NAMES.len(), input.features[0].len());

    let workload = input.column("workload").unwrap();
    for (w, row) in workload.iter().zip(table.iter()) {
        assert_eq!(*w, row.record.carries + row.record.targets + row.record.routes);
    }
}

#[test]
fn csv_pipeline_roundtrip() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("weekly.csv");
    let output = dir.path().join("augmented.csv");

    std::fs::write(
        &input,
        "player_id,player_name,position,season,week,carries,targets,pass_att,rush_yds,rec_yds,routes,snaps,fantasy_points,injured\n\
         P0001,Player_1,WR,2023,2,0,9,0,0,88,31,60,15.8,1\n\
         P0001,Player_1,WR,2023,1,1,7,0,4,70,29,58,12.0,0\n\
         P0000,Player_0,RB,2023,1,14,3,0,61,19,15,47,17.2,0\n",
    )?;

    let config = Config::default();
    let records = injury_ingestion::load_records_csv(&input, &config.schedule)?;
    let table = engineer_features(records, &config)?;
    injury_ingestion::write_augmented_csv(&output, &table)?;

    let text = std::fs::read_to_string(&output)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("P0000,Player_0,RB,2023,1"));
    assert!(lines[3].starts_with("P0001,Player_1,WR,2023,2"));
    // delta of touches 9 - 8, history 1
    assert!(lines[3].ends_with(",1.0,1.0,1.0,1"));
    Ok(())
}
