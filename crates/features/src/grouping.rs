//! Chronological grouping of records by entity.
//!
//! Each entity owns its records outright; groups share no state, so they
//! can be processed independently and in any order.

use injury_core::{Error, Result, TemporalRecord};
use std::collections::BTreeMap;

/// A record tagged with its position in the caller's input.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub source_row: usize,
    pub record: TemporalRecord,
}

/// All records of one entity, ascending by (season, week).
#[derive(Debug, Clone)]
pub struct EntityGroup {
    pub entity_id: String,
    pub records: Vec<IndexedRecord>,
}

impl EntityGroup {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Partition of a record set keyed by entity id.
#[derive(Debug, Clone, Default)]
pub struct EntityGroups {
    groups: BTreeMap<String, Vec<IndexedRecord>>,
    record_count: usize,
}

impl EntityGroups {
    /// Partition records by entity and order each partition by (season, week).
    ///
    /// Fails with `DuplicateKey` if two records share (entity_id, season, week).
    pub fn from_records(records: Vec<TemporalRecord>) -> Result<Self> {
        let record_count = records.len();
        let mut groups: BTreeMap<String, Vec<IndexedRecord>> = BTreeMap::new();

        for (source_row, record) in records.into_iter().enumerate() {
            groups
                .entry(record.entity_id.clone())
                .or_default()
                .push(IndexedRecord { source_row, record });
        }

        for rows in groups.values_mut() {
            rows.sort_by_key(|r| (r.record.season, r.record.week));

            if let Some(pair) = rows.windows(2).find(|pair| {
                pair[0].record.season == pair[1].record.season
                    && pair[0].record.week == pair[1].record.week
            }) {
                return Err(Error::duplicate_key(pair[1].record.key()));
            }
        }

        Ok(Self {
            groups,
            record_count,
        })
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total records across all groups.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Records of one entity, if present.
    pub fn get(&self, entity_id: &str) -> Option<&[IndexedRecord]> {
        self.groups.get(entity_id).map(|rows| rows.as_slice())
    }

    /// Entity ids in ascending order.
    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|k| k.as_str())
    }

    /// Consume into owned groups, ascending by entity id.
    pub fn into_groups(self) -> Vec<EntityGroup> {
        self.groups
            .into_iter()
            .map(|(entity_id, records)| EntityGroup { entity_id, records })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use injury_core::RecordKey;

    fn make_record(entity: &str, season: i32, week: u32) -> TemporalRecord {
        TemporalRecord {
            entity_id: entity.to_string(),
            name: None,
            category: None,
            season,
            week,
            carries: week as f64,
            targets: 0.0,
            routes: 0.0,
            pass_att: 0.0,
            rush_yds: 0.0,
            rec_yds: 0.0,
            snaps: 0.0,
            fantasy_points: 0.0,
            injured: 0,
        }
    }

    #[test]
    fn test_groups_sorted_by_season_then_week() {
        let records = vec![
            make_record("B", 2023, 2),
            make_record("A", 2024, 1),
            make_record("A", 2023, 10),
            make_record("B", 2023, 1),
            make_record("A", 2023, 2),
        ];

        let groups = EntityGroups::from_records(records).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.record_count(), 5);
        assert_eq!(groups.entity_ids().collect::<Vec<_>>(), vec!["A", "B"]);

        let a: Vec<(i32, u32)> = groups
            .get("A")
            .unwrap()
            .iter()
            .map(|r| (r.record.season, r.record.week))
            .collect();
        assert_eq!(a, vec![(2023, 2), (2023, 10), (2024, 1)]);
    }

    #[test]
    fn test_source_rows_kept() {
        let records = vec![make_record("A", 2023, 3), make_record("A", 2023, 1)];
        let groups = EntityGroups::from_records(records).unwrap();
        let rows: Vec<usize> = groups.get("A").unwrap().iter().map(|r| r.source_row).collect();
        assert_eq!(rows, vec![1, 0]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let records = vec![
            make_record("A", 2023, 1),
            make_record("B", 2023, 4),
            make_record("B", 2023, 4),
        ];

        match EntityGroups::from_records(records) {
            Err(Error::DuplicateKey { key }) => assert_eq!(key, RecordKey::new("B", 2023, 4)),
            other => panic!("expected duplicate key, got {:?}", other),
        }
    }

    #[test]
    fn test_same_week_different_season_allowed() {
        let records = vec![make_record("A", 2023, 1), make_record("A", 2024, 1)];
        assert!(EntityGroups::from_records(records).is_ok());
    }

    #[test]
    fn test_into_groups() {
        let records = vec![make_record("Z", 2023, 1), make_record("M", 2023, 1)];
        let groups = EntityGroups::from_records(records).unwrap().into_groups();
        assert_eq!(groups[0].entity_id, "M");
        assert_eq!(groups[1].entity_id, "Z");
        assert_eq!(groups[1].len(), 1);
    }
}
