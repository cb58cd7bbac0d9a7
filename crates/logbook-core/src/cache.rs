//! Cache entry types and the pure upsert rules behind the cache.
//!
//! The store holds immutable value snapshots; every mutation goes through
//! one of the decisions below.
//!
//! # Daily upsert
//!
//! ```text
//! fingerprint(raw) ─▶ lookup by date ─┬─ absent            ─▶ Insert
//!                                     ├─ same fingerprint  ─▶ Unchanged (no write)
//!                                     └─ other fingerprint ─▶ Update (replace entry)
//! ```
//!
//! # Personal records
//!
//! Each maximum (weight, reps, single-session volume) moves only on a strict
//! improvement; `last_used` never moves backward.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::fingerprint;
use crate::models::{DailyRecord, StrengthEntry};

/// Natural key of a daily entry: `yyyy-MM-dd`.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Denormalized copy of one Daily Record plus the fingerprint of its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCacheEntry {
    pub date: NaiveDate,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub weight: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: Option<f64>,
    pub mood_am: Option<f64>,
    pub mood_pm: Option<f64>,
    pub energy: Option<f64>,
    pub focus: Option<f64>,
    pub todo_completion: Option<f64>,
    pub habit_completion: Option<f64>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub training_minutes: Option<f64>,
    pub strength_volume: Option<f64>,
    /// SHA-256 of the exact source text.
    pub content_hash: String,
    /// Full record as JSON, for detail lookups.
    pub snapshot_json: String,
    pub source_path: Option<String>,
    pub updated_at: i64,
}

impl DailyCacheEntry {
    /// Build an entry from a parsed record and the text it came from.
    pub fn build(
        date: NaiveDate,
        record: &DailyRecord,
        raw: &str,
        source_path: Option<&str>,
    ) -> Result<Self> {
        let snapshot_json =
            serde_json::to_string(record).context("Failed to serialize daily snapshot")?;
        let q = &record.quick_log;
        Ok(Self {
            date,
            title: record.title.clone(),
            tags: record.tags.clone(),
            weight: q.weight,
            sleep_hours: q.sleep_hours,
            sleep_quality: q.sleep_quality,
            mood_am: q.mood_am,
            mood_pm: q.mood_pm,
            energy: q.energy,
            focus: q.focus,
            todo_completion: record.todo_completion_rate(),
            habit_completion: record.habit_completion_rate(),
            calories: record.nutrition.calories,
            protein_g: record.nutrition.protein_g,
            training_minutes: record.training_minutes(),
            strength_volume: record.strength_volume(),
            content_hash: fingerprint(raw),
            snapshot_json,
            source_path: source_path.map(str::to_string),
            updated_at: Utc::now().timestamp(),
        })
    }

    pub fn key(&self) -> String {
        date_key(self.date)
    }

    /// Decode the stored snapshot.
    pub fn record(&self) -> Result<DailyRecord> {
        serde_json::from_str(&self.snapshot_json)
            .with_context(|| format!("Corrupt daily snapshot for {}", self.key()))
    }
}

/// Result of a daily upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyUpsert {
    Inserted,
    Unchanged,
    Updated,
}

impl DailyUpsert {
    pub fn as_str(&self) -> &'static str {
        match self {
            DailyUpsert::Inserted => "inserted",
            DailyUpsert::Unchanged => "unchanged",
            DailyUpsert::Updated => "updated",
        }
    }
}

/// Decide what a daily upsert must do, from the fingerprint alone.
pub fn plan_daily_upsert(existing: Option<&DailyCacheEntry>, incoming_hash: &str) -> DailyUpsert {
    match existing {
        None => DailyUpsert::Inserted,
        Some(e) if e.content_hash == incoming_hash => DailyUpsert::Unchanged,
        Some(_) => DailyUpsert::Updated,
    }
}

/// A logged workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    pub entries: Vec<StrengthEntry>,
    pub duration_minutes: Option<f64>,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl WorkoutEntry {
    pub fn new(date: NaiveDate, name: &str, entries: Vec<StrengthEntry>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            name: name.to_string(),
            entries,
            duration_minutes: None,
            notes: None,
            created_at: Utc::now().timestamp(),
        }
    }

    pub fn total_volume(&self) -> f64 {
        self.entries.iter().map(StrengthEntry::volume).sum()
    }
}

/// Best-ever observations for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub name: String,
    pub max_weight: f64,
    pub max_reps: u32,
    pub max_volume: f64,
    pub last_used: NaiveDate,
}

/// Store key for an exercise name (case-insensitive).
pub fn exercise_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Which maxima a PR update moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrImprovements {
    pub weight: bool,
    pub reps: bool,
    pub volume: bool,
}

impl PrImprovements {
    pub fn any(&self) -> bool {
        self.weight || self.reps || self.volume
    }
}

/// One exercise's share of a session: its heaviest weight, its most reps,
/// and the summed volume of every line logged for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLift {
    pub exercise: String,
    pub weight: f64,
    pub reps: u32,
    pub volume: f64,
}

impl From<&StrengthEntry> for SessionLift {
    fn from(entry: &StrengthEntry) -> Self {
        Self {
            exercise: entry.exercise.trim().to_string(),
            weight: entry.weight,
            reps: entry.reps,
            volume: entry.volume(),
        }
    }
}

/// Group a session's entries by exercise (case-insensitive), in the order
/// each exercise first appears.
pub fn session_lifts(entries: &[StrengthEntry]) -> Vec<SessionLift> {
    let mut lifts: Vec<SessionLift> = Vec::new();
    for entry in entries {
        let key = exercise_key(&entry.exercise);
        match lifts.iter_mut().find(|l| exercise_key(&l.exercise) == key) {
            Some(lift) => {
                lift.weight = lift.weight.max(entry.weight);
                lift.reps = lift.reps.max(entry.reps);
                lift.volume += entry.volume();
            }
            None => lifts.push(SessionLift::from(entry)),
        }
    }
    lifts
}

/// Fold a single strength entry, performed on `date`, into an exercise
/// record. Same as a session holding only that entry.
pub fn apply_observation(
    existing: Option<&ExerciseRecord>,
    entry: &StrengthEntry,
    date: NaiveDate,
) -> (ExerciseRecord, PrImprovements) {
    apply_session(existing, &SessionLift::from(entry), date)
}

/// Fold one session's lift into an exercise record.
///
/// A first observation sets all three maxima and counts as an improvement
/// on each.
pub fn apply_session(
    existing: Option<&ExerciseRecord>,
    lift: &SessionLift,
    date: NaiveDate,
) -> (ExerciseRecord, PrImprovements) {
    let Some(current) = existing else {
        let record = ExerciseRecord {
            name: lift.exercise.clone(),
            max_weight: lift.weight,
            max_reps: lift.reps,
            max_volume: lift.volume,
            last_used: date,
        };
        let all = PrImprovements {
            weight: true,
            reps: true,
            volume: true,
        };
        return (record, all);
    };

    let improved = PrImprovements {
        weight: lift.weight > current.max_weight,
        reps: lift.reps > current.max_reps,
        volume: lift.volume > current.max_volume,
    };
    let record = ExerciseRecord {
        name: current.name.clone(),
        max_weight: if improved.weight { lift.weight } else { current.max_weight },
        max_reps: if improved.reps { lift.reps } else { current.max_reps },
        max_volume: if improved.volume { lift.volume } else { current.max_volume },
        last_used: current.last_used.max(date),
    };
    (record, improved)
}
