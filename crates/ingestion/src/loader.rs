//! Loading weekly tables and writing augmented tables.
//!
//! CSV is the interchange format with the data-source and modelling sides;
//! JSON is supported for the same shapes.

use crate::merge::{InjuryRecord, WeeklyStats};
use injury_core::{
    config::ScheduleConfig, AugmentedRecord, Error, RecordKey, Result, Season, TemporalRecord,
    Week,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Columns every weekly record table must carry.
pub const RECORD_COLUMNS: [&str; 12] = [
    "entity_id",
    "season",
    "week",
    "carries",
    "targets",
    "routes",
    "pass_att",
    "rush_yds",
    "rec_yds",
    "snaps",
    "fantasy_points",
    "injured",
];

/// Columns of a workload-only table (before the injury join).
pub const STATS_COLUMNS: [&str; 11] = [
    "entity_id",
    "season",
    "week",
    "carries",
    "targets",
    "routes",
    "pass_att",
    "rush_yds",
    "rec_yds",
    "snaps",
    "fantasy_points",
];

/// Columns of an injury table.
pub const INJURY_COLUMNS: [&str; 4] = ["entity_id", "season", "week", "injured"];

/// Alternate header names and the column they stand for.
const COLUMN_ALIASES: [(&str, &str); 3] = [
    ("player_id", "entity_id"),
    ("player_name", "name"),
    ("position", "category"),
];

fn canonical_column(header: &str) -> &str {
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == header)
        .map(|(_, column)| *column)
        .unwrap_or(header)
}

/// Convert a numeric injury value to a 0/1 flag.
pub fn coerce_flag(value: f64) -> Option<u8> {
    if value == 0.0 {
        Some(0)
    } else if value == 1.0 {
        Some(1)
    } else {
        None
    }
}

/// A weekly record as it appears in a file, before flag coercion.
#[derive(Debug, Clone, Deserialize)]
struct RawRecord {
    #[serde(alias = "player_id")]
    entity_id: String,
    #[serde(default, alias = "player_name")]
    name: Option<String>,
    #[serde(default, alias = "position")]
    category: Option<String>,
    season: Season,
    week: Week,
    carries: f64,
    targets: f64,
    routes: f64,
    pass_att: f64,
    rush_yds: f64,
    rec_yds: f64,
    snaps: f64,
    fantasy_points: f64,
    injured: f64,
}

impl RawRecord {
    fn into_record(self) -> Result<TemporalRecord> {
        let injured = match coerce_flag(self.injured) {
            Some(flag) => flag,
            None => {
                let key = RecordKey::new(self.entity_id, self.season, self.week);
                return Err(Error::invalid_flag(key, self.injured));
            }
        };

        Ok(TemporalRecord {
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
        })
    }
}

fn csv_row_error(row: usize, headers: &csv::StringRecord, err: csv::Error) -> Error {
    if let csv::ErrorKind::Deserialize { err: de, .. } = err.kind() {
        let column = de
            .field()
            .and_then(|i| headers.get(i as usize))
            .map(canonical_column)
            .unwrap_or("<unknown>");
        return Error::schema(column, format!("row {}: {}", row + 1, de.kind()));
    }
    Error::csv(format!("row {}: {}", row + 1, err))
}

/// Deserialize every row after checking the header carries `required`.
fn read_rows<T, R>(reader: R, required: &[&str]) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| Error::csv(format!("failed to read header: {}", e)))?
        .clone();

    for column in required {
        if !headers.iter().any(|h| canonical_column(h) == *column) {
            return Err(Error::schema(*column, "missing column"));
        }
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<T>().enumerate() {
        rows.push(result.map_err(|e| csv_row_error(i, &headers, e))?);
    }
    Ok(rows)
}

/// Read weekly records from CSV, validating each against the input contract.
pub fn read_records_csv<R: Read>(reader: R, schedule: &ScheduleConfig) -> Result<Vec<TemporalRecord>> {
    let raw: Vec<RawRecord> = read_rows(reader, &RECORD_COLUMNS)?;

    raw.into_iter()
        .map(|r| {
            let record = r.into_record()?;
            record.validate(schedule)?;
            Ok(record)
        })
        .collect()
}

/// Load weekly records from a CSV file.
pub fn load_records_csv(path: impl AsRef<Path>, schedule: &ScheduleConfig) -> Result<Vec<TemporalRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let records = read_records_csv(BufReader::new(file), schedule)?;
    info!(path = %path.display(), rows = records.len(), "Loaded weekly records");
    Ok(records)
}

/// Check that a JSON row carries every record column with the right kind of value.
fn check_json_row(row: usize, value: &serde_json::Value) -> Result<()> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::schema("<row>", format!("row {}: expected an object", row + 1)))?;

    for column in RECORD_COLUMNS {
        let field = object.get(column).or_else(|| {
            COLUMN_ALIASES
                .iter()
                .filter(|(_, canonical)| *canonical == column)
                .find_map(|(alias, _)| object.get(*alias))
        });

        let Some(field) = field else {
            return Err(Error::schema(column, format!("row {}: missing field", row + 1)));
        };
        let well_typed = if column == "entity_id" {
            field.is_string()
        } else {
            field.is_number()
        };
        if !well_typed {
            return Err(Error::schema(
                column,
                format!("row {}: unexpected value {}", row + 1, field),
            ));
        }
    }
    Ok(())
}

/// Read weekly records from a JSON array, validating each against the input contract.
pub fn read_records_json<R: Read>(reader: R, schedule: &ScheduleConfig) -> Result<Vec<TemporalRecord>> {
    let rows: Vec<serde_json::Value> = serde_json::from_reader(reader).map_err(|e| {
        if e.is_data() {
            Error::schema("<table>", format!("expected an array of records: {}", e))
        } else {
            Error::Json(e)
        }
    })?;

    rows.into_iter()
        .enumerate()
        .map(|(i, value)| {
            check_json_row(i, &value)?;
            let raw: RawRecord = serde_json::from_value(value)
                .map_err(|e| Error::schema("<row>", format!("row {}: {}", i + 1, e)))?;
            let record = raw.into_record()?;
            record.validate(schedule)?;
            Ok(record)
        })
        .collect()
}

/// Load weekly records from a JSON array.
pub fn load_records_json(path: impl AsRef<Path>, schedule: &ScheduleConfig) -> Result<Vec<TemporalRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let records = read_records_json(BufReader::new(file), schedule)?;
    info!(path = %path.display(), rows = records.len(), "Loaded weekly records");
    Ok(records)
}

/// Read a workload-only table from CSV.
pub fn read_stats_csv<R: Read>(reader: R) -> Result<Vec<WeeklyStats>> {
    read_rows(reader, &STATS_COLUMNS)
}

/// Load a workload-only table from a CSV file.
pub fn load_stats_csv(path: impl AsRef<Path>) -> Result<Vec<WeeklyStats>> {
    let path = path.as_ref();
    let rows = read_stats_csv(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), rows = rows.len(), "Loaded weekly stats");
    Ok(rows)
}

/// Read an injury table from CSV.
pub fn read_injuries_csv<R: Read>(reader: R) -> Result<Vec<InjuryRecord>> {
    read_rows(reader, &INJURY_COLUMNS)
}

/// Load an injury table from a CSV file.
pub fn load_injuries_csv(path: impl AsRef<Path>) -> Result<Vec<InjuryRecord>> {
    let path = path.as_ref();
    let rows = read_injuries_csv(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), rows = rows.len(), "Loaded injury flags");
    Ok(rows)
}

/// One line of the augmented table: input columns followed by derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub entity_id: String,
    pub name: Option<String>,
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
    pub injured: u8,
    pub touches: f64,
    pub workload: f64,
    pub rolling_touches: Option<f64>,
    pub rolling_routes: Option<f64>,
    pub delta_touches: f64,
    pub games_played_recent: Option<f64>,
    pub games_missed_recent: Option<f64>,
    pub injury_history_score: u32,
}

impl From<&AugmentedRecord> for OutputRow {
    fn from(row: &AugmentedRecord) -> Self {
        let r = &row.record;
        let f = &row.features;
        OutputRow {
            entity_id: r.entity_id.clone(),
            name: r.name.clone(),
            category: r.category.clone(),
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
            touches: f.touches,
            workload: f.workload,
            rolling_touches: f.rolling_touches,
            rolling_routes: f.rolling_routes,
            delta_touches: f.delta_touches,
            games_played_recent: f.games_played_recent,
            games_missed_recent: f.games_missed_recent,
            injury_history_score: f.injury_history_score,
        }
    }
}

/// Write augmented rows as CSV, in the order given.
pub fn write_augmented<'a, W, I>(writer: W, rows: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a AugmentedRecord>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(OutputRow::from(row))
            .map_err(|e| Error::csv(format!("failed to write {}: {}", row.key(), e)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write augmented rows to a CSV file.
pub fn write_augmented_csv<'a, I>(path: impl AsRef<Path>, rows: I) -> Result<()>
where
    I: IntoIterator<Item = &'a AugmentedRecord>,
{
    let path = path.as_ref();
    write_augmented(BufWriter::new(File::create(path)?), rows)?;
    info!(path = %path.display(), "Wrote augmented table");
    Ok(())
}

/// Write augmented rows to a JSON file as an array of flat objects.
pub fn write_augmented_json<'a, I>(path: impl AsRef<Path>, rows: I) -> Result<()>
where
    I: IntoIterator<Item = &'a AugmentedRecord>,
{
    let path = path.as_ref();
    let out: Vec<OutputRow> = rows.into_iter().map(OutputRow::from).collect();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &out)?;
    writer.flush()?;
    info!(path = %path.display(), rows = out.len(), "Wrote augmented table");
    Ok(())
}
