//! Storage abstraction for Logbook caches.
//!
//! The [`Store`] trait is a key-addressed store of immutable snapshots. It
//! makes no upsert decisions of its own: callers compute the next value with
//! the pure rules in [`crate::cache`] and write it back whole.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::cache::{DailyCacheEntry, ExerciseRecord, WorkoutEntry};
use crate::metrics::{MetricField, MetricPoint};

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_daily`](Store::get_daily) | Daily entry by date |
/// | [`put_daily`](Store::put_daily) | Insert or replace a daily entry |
/// | [`put_daily_with_metrics`](Store::put_daily_with_metrics) | Daily entry plus its parsed points, atomically |
/// | [`list_daily`](Store::list_daily) | Daily entries in a date range |
/// | [`upsert_metric`](Store::upsert_metric) | Overwrite one `date\|field` point |
/// | [`get_metric`](Store::get_metric) | One metric point |
/// | [`metrics_for_date`](Store::metrics_for_date) | All points of a day |
/// | [`replace_daily_and_metrics`](Store::replace_daily_and_metrics) | Atomic rebuild swap |
/// | [`insert_workout`](Store::insert_workout) | Append a workout |
/// | [`list_workouts`](Store::list_workouts) | Workouts, optionally for one day |
/// | [`get_exercise`](Store::get_exercise) | PR entry by exercise name |
/// | [`put_exercise`](Store::put_exercise) | Insert or replace a PR entry |
/// | [`list_exercises`](Store::list_exercises) | All PR entries |
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_daily(&self, date: NaiveDate) -> Result<Option<DailyCacheEntry>>;

    async fn put_daily(&self, entry: &DailyCacheEntry) -> Result<()>;

    /// Write a daily entry together with the points derived from it, in one
    /// atomic step. `parsed` points already stored for that date are
    /// replaced by `metrics`; manual and wearable points are kept. On error
    /// nothing is written, so the old fingerprint stays in place.
    async fn put_daily_with_metrics(
        &self,
        entry: &DailyCacheEntry,
        metrics: &[MetricPoint],
    ) -> Result<()>;

    /// Entries ordered by date; both bounds inclusive.
    async fn list_daily(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyCacheEntry>>;

    /// Overwrite value, source and date for the point's composite key.
    async fn upsert_metric(&self, point: &MetricPoint) -> Result<()>;

    async fn get_metric(&self, date: NaiveDate, field: MetricField)
        -> Result<Option<MetricPoint>>;

    async fn metrics_for_date(&self, date: NaiveDate) -> Result<Vec<MetricPoint>>;

    /// Clear the daily and metric caches and repopulate them in one atomic
    /// step. Readers see either the old contents or the new, never an empty
    /// intermediate state. Workouts and exercises are untouched.
    async fn replace_daily_and_metrics(
        &self,
        entries: &[DailyCacheEntry],
        metrics: &[MetricPoint],
    ) -> Result<()>;

    async fn insert_workout(&self, workout: &WorkoutEntry) -> Result<()>;

    async fn list_workouts(&self, date: Option<NaiveDate>) -> Result<Vec<WorkoutEntry>>;

    /// Lookup is case-insensitive on the exercise name.
    async fn get_exercise(&self, name: &str) -> Result<Option<ExerciseRecord>>;

    async fn put_exercise(&self, record: &ExerciseRecord) -> Result<()>;

    async fn list_exercises(&self) -> Result<Vec<ExerciseRecord>>;
}
