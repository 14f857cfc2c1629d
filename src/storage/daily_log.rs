//! Daily log: a CSV file holding at most one row per calendar date.
//!
//! Saving a day reads every row, drops the one for the same date (if any),
//! appends the new row last and replaces the file atomically. Storage order
//! is therefore not chronological; sort by timestamp before charting.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{read_optional, write_atomic};
use crate::error::ServiceResult;
use crate::nutrition::{EnergyBalance, Meal, descriptor};

pub const LOG_COLUMNS: [&str; 16] = [
    "timestamp",
    "intake_kcal",
    "burned_kcal",
    "base_burn_kcal",
    "workout_adjust_kcal",
    "net_kcal",
    "burned_error_kcal",
    "weight_kg",
    "protein_g",
    "fat_g",
    "carb_g",
    "fiber_g",
    "added_sugar_g",
    "sodium_mg",
    "potassium_mg",
    "foods",
];

/// Column names written by earlier versions of the log.
const LEGACY_COLUMNS: [(&str, &str); 6] = [
    ("datetime", "timestamp"),
    ("calories", "intake_kcal"),
    ("burned_calories", "burned_kcal"),
    ("base_burn_calories", "base_burn_kcal"),
    ("workout_adjust_calories", "workout_adjust_kcal"),
    ("net_calories", "net_kcal"),
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp '{raw}'")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(lenient_opt_f64(d)?.unwrap_or(0.0))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let raw = String::deserialize(d)?;
    Ok(raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
}

/// One saved day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub intake_kcal: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub burned_kcal: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub base_burn_kcal: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub workout_adjust_kcal: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_kcal: f64,
    /// Empty when no workouts were logged.
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub burned_error_kcal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein_g: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fat_g: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carb_g: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fiber_g: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub added_sugar_g: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sodium_mg: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub potassium_mg: f64,
    #[serde(default)]
    pub foods: String,
}

impl LogRow {
    pub fn for_day(
        timestamp: NaiveDateTime,
        meal: &Meal<'_>,
        balance: &EnergyBalance,
        weight_kg: f64,
    ) -> Self {
        let totals = meal.totals();
        let intake_kcal = totals.calories();
        Self {
            timestamp,
            intake_kcal,
            burned_kcal: balance.burned_kcal,
            base_burn_kcal: balance.base_burn_kcal,
            workout_adjust_kcal: balance.workout_adjust_kcal,
            net_kcal: balance.net_kcal(intake_kcal),
            burned_error_kcal: balance.burned_error_kcal,
            weight_kg: Some(weight_kg).filter(|w| *w > 0.0),
            protein_g: totals.protein_g,
            fat_g: totals.fat_g,
            carb_g: totals.carb_g,
            fiber_g: totals.fiber_g,
            added_sugar_g: totals.added_sugar_g,
            sodium_mg: totals.sodium_mg,
            potassium_mg: totals.potassium_mg,
            foods: descriptor::encode(meal),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

fn record_date(record: &StringRecord) -> Option<NaiveDate> {
    record.get(0).and_then(timestamp::parse).map(|ts| ts.date())
}

fn current_header() -> StringRecord {
    StringRecord::from(LOG_COLUMNS.to_vec())
}

fn canonical_column(name: &str) -> &str {
    let name = name.trim_start_matches('\u{feff}').trim();
    LEGACY_COLUMNS
        .iter()
        .find(|(legacy, _)| *legacy == name)
        .map_or(name, |(_, current)| *current)
}

/// Maps a record from an older header layout onto [`LOG_COLUMNS`];
/// columns the old layout lacks come out empty.
fn reshape(record: &StringRecord, positions: &[Option<usize>]) -> StringRecord {
    positions
        .iter()
        .map(|pos| pos.and_then(|i| record.get(i)).unwrap_or(""))
        .collect()
}

pub struct DailyLog {
    path: PathBuf,
}

impl DailyLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Existing rows in the current column layout. A missing or empty store
    /// is initialized with just the header.
    fn read_records(&self) -> ServiceResult<Vec<StringRecord>> {
        let text = read_optional(&self.path)?.unwrap_or_default();
        if text.trim().is_empty() {
            tracing::debug!(path = %self.path.display(), "log missing, initializing");
            self.write_records(&[], None)?;
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());
        let header = reader.headers()?.clone();
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;

        if header.iter().eq(LOG_COLUMNS.iter().copied()) {
            return Ok(records);
        }

        tracing::warn!(
            path = %self.path.display(),
            "log header differs from the current layout, mapping columns by name"
        );
        let positions: Vec<Option<usize>> = LOG_COLUMNS
            .iter()
            .map(|column| header.iter().position(|h| canonical_column(h) == *column))
            .collect();
        Ok(records.iter().map(|r| reshape(r, &positions)).collect())
    }

    fn write_records(&self, kept: &[StringRecord], new_row: Option<&LogRow>) -> ServiceResult<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(Vec::new());
        writer.write_record(&current_header())?;
        for record in kept {
            writer.write_record(record)?;
        }
        if let Some(row) = new_row {
            writer.serialize(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }

    /// Saves `row`, replacing any row with the same calendar date. Returns
    /// whether an earlier row for that date was replaced.
    pub fn append_or_replace(&self, row: &LogRow) -> ServiceResult<bool> {
        let date = row.date();
        let mut replaced = false;
        let mut kept = Vec::new();
        for record in self.read_records()? {
            if record_date(&record) == Some(date) {
                replaced = true;
            } else {
                kept.push(record);
            }
        }

        self.write_records(&kept, Some(row))?;
        tracing::info!(%date, replaced, rows = kept.len() + 1, "daily log saved");
        Ok(replaced)
    }

    /// Every decodable row in storage order. Rows that fail to decode are
    /// skipped with a warning.
    pub fn read_all(&self) -> ServiceResult<Vec<LogRow>> {
        let header = current_header();
        let rows = self
            .read_records()?
            .iter()
            .filter_map(|record| match record.deserialize::<LogRow>(Some(&header)) {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable log row");
                    None
                }
            })
            .collect();
        Ok(rows)
    }

    pub fn load_by_date(&self, date: NaiveDate) -> ServiceResult<Option<LogRow>> {
        Ok(self
            .read_all()?
            .into_iter()
            .rev()
            .find(|row| row.date() == date))
    }

    /// Distinct saved dates, newest first.
    pub fn dates(&self) -> ServiceResult<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self.read_all()?.iter().map(LogRow::date).collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        Ok(dates)
    }
}
