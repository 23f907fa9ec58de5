//! Core data types for the workload feature pipeline.

use crate::config::ScheduleConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Season identifier (e.g. 2023).
pub type Season = i32;

/// Week number within a season, starting at 1.
pub type Week = u32;

/// Identity of one weekly observation: (entity_id, season, week).
///
/// The derived ordering is the canonical table order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub entity_id: String,
    pub season: Season,
    pub week: Week,
}

impl RecordKey {
    pub fn new(entity_id: impl Into<String>, season: Season, week: Week) -> Self {
        Self {
            entity_id: entity_id.into(),
            season,
            week,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entity {} season {} week {}",
            self.entity_id, self.season, self.week
        )
    }
}

/// A tracked subject (e.g. a player) with static attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub name: Option<String>,
    pub category: Option<String>,
}

impl Entity {
    /// Distinct entities present in a record set, ordered by id.
    ///
    /// The first record seen for an entity supplies its attributes.
    pub fn roster(records: &[TemporalRecord]) -> Vec<Entity> {
        let mut entities: BTreeMap<&str, Entity> = BTreeMap::new();
        for record in records {
            entities
                .entry(record.entity_id.as_str())
                .or_insert_with(|| Entity {
                    entity_id: record.entity_id.clone(),
                    name: record.name.clone(),
                    category: record.category.clone(),
                });
        }
        entities.into_values().collect()
    }
}

/// One weekly observation for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalRecord {
    #[serde(alias = "player_id")]
    pub entity_id: String,
    /// Display name, carried through untouched.
    #[serde(default, alias = "player_name")]
    pub name: Option<String>,
    /// Grouping attribute (e.g. position), carried through untouched.
    #[serde(default, alias = "position")]
    pub category: Option<String>,
    pub season: Season,
    pub week: Week,
    pub carries: f64,
    pub targets: f64,
    pub routes: f64,
    pub pass_att: f64,
    pub rush_yds: f64,
    pub rec_yds: f64,
    pub snaps: f64,
    pub fantasy_points: f64,
    /// 1 if the entity was injured that week, else 0.
    pub injured: u8,
}

impl TemporalRecord {
    /// Key of this record.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.entity_id.clone(), self.season, self.week)
    }

    /// Carries plus targets.
    #[inline]
    pub fn touches(&self) -> f64 {
        self.carries + self.targets
    }

    /// Carries plus targets plus routes.
    #[inline]
    pub fn workload(&self) -> f64 {
        self.carries + self.targets + self.routes
    }

    /// Injury flag as a number, for windowed sums.
    #[inline]
    pub fn injured_f64(&self) -> f64 {
        self.injured as f64
    }

    pub fn is_injured(&self) -> bool {
        self.injured == 1
    }

    /// Numeric workload columns with their names.
    pub fn numeric_columns(&self) -> [(&'static str, f64); 8] {
        [
            ("carries", self.carries),
            ("targets", self.targets),
            ("routes", self.routes),
            ("pass_att", self.pass_att),
            ("rush_yds", self.rush_yds),
            ("rec_yds", self.rec_yds),
            ("snaps", self.snaps),
            ("fantasy_points", self.fantasy_points),
        ]
    }

    /// Check the input contract for a single record.
    pub fn validate(&self, schedule: &ScheduleConfig) -> Result<()> {
        if self.entity_id.is_empty() {
            return Err(Error::schema(
                "entity_id",
                format!("empty entity id (season {} week {})", self.season, self.week),
            ));
        }
        if self.week < 1 || self.week > schedule.weeks_per_season {
            return Err(Error::schema(
                "week",
                format!(
                    "week must be in 1..={} for {}",
                    schedule.weeks_per_season,
                    self.key()
                ),
            ));
        }
        for (column, value) in self.numeric_columns() {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::schema(
                    column,
                    format!("expected a non-negative number, got {} for {}", value, self.key()),
                ));
            }
        }
        if self.injured > 1 {
            return Err(Error::invalid_flag(self.key(), self.injured as f64));
        }
        Ok(())
    }
}

/// Features derived for one record.
///
/// Windowed values are `None` only when the window holds fewer values than
/// the configured minimum; with the default minimum of 1 they are always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatureSet {
    pub touches: f64,
    pub workload: f64,
    /// Trailing-window mean of touches.
    pub rolling_touches: Option<f64>,
    /// Trailing-window mean of routes.
    pub rolling_routes: Option<f64>,
    /// First difference of touches within the entity.
    pub delta_touches: f64,
    /// Trailing-window count of healthy weeks.
    pub games_played_recent: Option<f64>,
    /// Trailing-window count of injured weeks.
    pub games_missed_recent: Option<f64>,
    /// Running count of injured weeks for the entity, inclusive.
    pub injury_history_score: u32,
}

/// An input record with its derived features attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedRecord {
    pub record: TemporalRecord,
    pub features: DerivedFeatureSet,
    /// Position of the record in the caller's input.
    pub source_row: usize,
}

impl AugmentedRecord {
    pub fn key(&self) -> RecordKey {
        self.record.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity: &str, season: Season, week: Week) -> TemporalRecord {
        TemporalRecord {
            entity_id: entity.to_string(),
            name: None,
            category: None,
            season,
            week,
            carries: 10.0,
            targets: 5.0,
            routes: 20.0,
            pass_att: 0.0,
            rush_yds: 40.0,
            rec_yds: 30.0,
            snaps: 50.0,
            fantasy_points: 12.5,
            injured: 0,
        }
    }

    #[test]
    fn test_key_ordering_is_canonical() {
        let mut keys = vec![
            RecordKey::new("B", 2022, 1),
            RecordKey::new("A", 2023, 1),
            RecordKey::new("A", 2022, 10),
            RecordKey::new("A", 2022, 2),
        ];
        keys.sort();
        assert_eq!(keys[0], RecordKey::new("A", 2022, 2));
        assert_eq!(keys[1], RecordKey::new("A", 2022, 10));
        assert_eq!(keys[2], RecordKey::new("A", 2023, 1));
        assert_eq!(keys[3], RecordKey::new("B", 2022, 1));
    }

    #[test]
    fn test_basic_sums() {
        let r = record("P0001", 2023, 1);
        assert_eq!(r.touches(), 15.0);
        assert_eq!(r.workload(), 35.0);
    }

    #[test]
    fn test_validate_week_range() {
        let schedule = ScheduleConfig::default();
        let mut r = record("P0001", 2023, 0);
        assert!(matches!(r.validate(&schedule), Err(Error::Schema { .. })));
        r.week = schedule.weeks_per_season + 1;
        assert!(matches!(r.validate(&schedule), Err(Error::Schema { .. })));
        r.week = schedule.weeks_per_season;
        assert!(r.validate(&schedule).is_ok());
    }

    #[test]
    fn test_validate_negative_numeric() {
        let mut r = record("P0001", 2023, 3);
        r.snaps = -1.0;
        match r.validate(&ScheduleConfig::default()) {
            Err(Error::Schema { column, .. }) => assert_eq!(column, "snaps"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validate_flag() {
        let mut r = record("P0001", 2023, 3);
        r.injured = 2;
        match r.validate(&ScheduleConfig::default()) {
            Err(Error::InvalidFlag { key, value }) => {
                assert_eq!(key, RecordKey::new("P0001", 2023, 3));
                assert_eq!(value, 2.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_roster_first_occurrence_wins() {
        let mut a = record("P0002", 2023, 1);
        a.name = Some("Player_2".to_string());
        a.category = Some("RB".to_string());
        let mut b = record("P0002", 2023, 2);
        b.category = Some("WR".to_string());
        let c = record("P0001", 2023, 1);

        let roster = Entity::roster(&[a, b, c]);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].entity_id, "P0001");
        assert_eq!(roster[1].category.as_deref(), Some("RB"));
        assert_eq!(roster[1].name.as_deref(), Some("Player_2"));
    }
}
