//! Joining weekly workload rows with weekly injury flags.

use crate::loader::coerce_flag;
use injury_core::{
    config::ScheduleConfig, Error, RecordKey, Result, Season, TemporalRecord, Week,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Workload observations for one entity-week, without the injury flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    #[serde(alias = "player_id")]
    pub entity_id: String,
    #[serde(default, alias = "player_name")]
    pub name: Option<String>,
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
}

impl WeeklyStats {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.entity_id.clone(), self.season, self.week)
    }

    fn with_flag(self, injured: u8) -> TemporalRecord {
        TemporalRecord {
            entity_id: self.entity_id,
            name: self.name.filter(|s| !s.is_empty()),
            category: self.category.filter(|s| !s.is_empty()),
            season: self.season,
            week: self.week,
            carries: self.carries,
            targets: self.targets,
            routes: self.routes,
            pass_att: self.pass_att,
            rush_yds: self.rush_yds,
            rec_yds: self.rec_yds,
            snaps: self.snaps,
            fantasy_points: self.fantasy_points,
            injured,
        }
    }
}

/// Injury flag for one entity-week, as read from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryRecord {
    #[serde(alias = "player_id")]
    pub entity_id: String,
    pub season: Season,
    pub week: Week,
    pub injured: f64,
}

impl InjuryRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.entity_id.clone(), self.season, self.week)
    }
}

/// Left-join stats with injury flags on (entity_id, season, week).
///
/// Output follows the order of `stats`. Injury rows with no stats row are
/// dropped; a stats row with no injury row is an error, as is a repeated key
/// on either side. Every joined record is validated.
pub fn join_injuries(
    stats: Vec<WeeklyStats>,
    injuries: Vec<InjuryRecord>,
    schedule: &ScheduleConfig,
) -> Result<Vec<TemporalRecord>> {
    let mut flags: HashMap<RecordKey, f64> = HashMap::with_capacity(injuries.len());
    for injury in injuries {
        let key = injury.key();
        if flags.insert(key.clone(), injury.injured).is_some() {
            return Err(Error::duplicate_key(key));
        }
    }

    let mut seen: HashSet<RecordKey> = HashSet::with_capacity(stats.len());
    let mut records = Vec::with_capacity(stats.len());

    for row in stats {
        let key = row.key();
        let value = match flags.get(&key) {
            Some(&value) => value,
            None => return Err(Error::missing_injury(key)),
        };
        let injured = coerce_flag(value).ok_or_else(|| Error::invalid_flag(key.clone(), value))?;
        if !seen.insert(key.clone()) {
            return Err(Error::duplicate_key(key));
        }

        let record = row.with_flag(injured);
        record.validate(schedule)?;
        records.push(record);
    }

    debug!(
        joined = records.len(),
        unmatched_injuries = flags.len() - records.len(),
        "Joined stats with injury flags"
    );

    Ok(records)
}
