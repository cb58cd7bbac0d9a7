//! In-memory [`Store`] implementation for tests and embedding.
//!
//! The daily and metric caches share one `RwLock` so that a rebuild swaps
//! both under a single write guard. Workouts and exercises have their own
//! locks.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::cache::{exercise_key, DailyCacheEntry, ExerciseRecord, WorkoutEntry};
use crate::metrics::{metric_key, MetricField, MetricPoint, MetricSource};

use super::Store;

#[derive(Default)]
struct DailyTables {
    daily: BTreeMap<NaiveDate, DailyCacheEntry>,
    metrics: HashMap<String, MetricPoint>,
}

/// In-memory store.
pub struct InMemoryStore {
    tables: RwLock<DailyTables>,
    workouts: RwLock<Vec<WorkoutEntry>>,
    exercises: RwLock<HashMap<String, ExerciseRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(DailyTables::default()),
            workouts: RwLock::new(Vec::new()),
            exercises: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_daily(&self, date: NaiveDate) -> Result<Option<DailyCacheEntry>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.daily.get(&date).cloned())
    }

    async fn put_daily(&self, entry: &DailyCacheEntry) -> Result<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.daily.insert(entry.date, entry.clone());
        Ok(())
    }

    async fn put_daily_with_metrics(
        &self,
        entry: &DailyCacheEntry,
        metrics: &[MetricPoint],
    ) -> Result<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables
            .metrics
            .retain(|_, p| !(p.date == entry.date && p.source == MetricSource::Parsed));
        for p in metrics {
            tables.metrics.insert(p.key(), p.clone());
        }
        tables.daily.insert(entry.date, entry.clone());
        Ok(())
    }

    async fn list_daily(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyCacheEntry>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .daily
            .values()
            .filter(|e| from.map_or(true, |f| e.date >= f))
            .filter(|e| to.map_or(true, |t| e.date <= t))
            .cloned()
            .collect())
    }

    async fn upsert_metric(&self, point: &MetricPoint) -> Result<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.metrics.insert(point.key(), point.clone());
        Ok(())
    }

    async fn get_metric(
        &self,
        date: NaiveDate,
        field: MetricField,
    ) -> Result<Option<MetricPoint>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.metrics.get(&metric_key(date, field)).cloned())
    }

    async fn metrics_for_date(&self, date: NaiveDate) -> Result<Vec<MetricPoint>> {
        let tables = self.tables.read().map_err(poisoned)?;
        let mut points: Vec<MetricPoint> = tables
            .metrics
            .values()
            .filter(|p| p.date == date)
            .cloned()
            .collect();
        points.sort_by(|a, b| a.field.as_str().cmp(b.field.as_str()));
        Ok(points)
    }

    async fn replace_daily_and_metrics(
        &self,
        entries: &[DailyCacheEntry],
        metrics: &[MetricPoint],
    ) -> Result<()> {
        let mut next = DailyTables::default();
        for e in entries {
            next.daily.insert(e.date, e.clone());
        }
        for p in metrics {
            next.metrics.insert(p.key(), p.clone());
        }
        let mut tables = self.tables.write().map_err(poisoned)?;
        *tables = next;
        Ok(())
    }

    async fn insert_workout(&self, workout: &WorkoutEntry) -> Result<()> {
        let mut workouts = self.workouts.write().map_err(poisoned)?;
        workouts.push(workout.clone());
        Ok(())
    }

    async fn list_workouts(&self, date: Option<NaiveDate>) -> Result<Vec<WorkoutEntry>> {
        let workouts = self.workouts.read().map_err(poisoned)?;
        let mut out: Vec<WorkoutEntry> = workouts
            .iter()
            .filter(|w| date.map_or(true, |d| w.date == d))
            .cloned()
            .collect();
        out.sort_by(|a, b| (a.date, a.created_at).cmp(&(b.date, b.created_at)));
        Ok(out)
    }

    async fn get_exercise(&self, name: &str) -> Result<Option<ExerciseRecord>> {
        let exercises = self.exercises.read().map_err(poisoned)?;
        Ok(exercises.get(&exercise_key(name)).cloned())
    }

    async fn put_exercise(&self, record: &ExerciseRecord) -> Result<()> {
        let mut exercises = self.exercises.write().map_err(poisoned)?;
        exercises.insert(exercise_key(&record.name), record.clone());
        Ok(())
    }

    async fn list_exercises(&self) -> Result<Vec<ExerciseRecord>> {
        let exercises = self.exercises.read().map_err(poisoned)?;
        let mut out: Vec<ExerciseRecord> = exercises.values().cloned().collect();
        out.sort_by_key(|r| exercise_key(&r.name));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::apply_observation;
    use crate::daily::parse_daily;
    use crate::models::StrengthEntry;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn entry(day: u32, raw: &str) -> DailyCacheEntry {
        DailyCacheEntry::build(d(day), &parse_daily(raw), raw, None).unwrap()
    }

    #[tokio::test]
    async fn test_daily_put_get_list() {
        let store = InMemoryStore::new();
        store.put_daily(&entry(3, "## Briefing\nc")).await.unwrap();
        store.put_daily(&entry(1, "## Briefing\na")).await.unwrap();
        store.put_daily(&entry(2, "## Briefing\nb")).await.unwrap();

        assert!(store.get_daily(d(2)).await.unwrap().is_some());
        assert!(store.get_daily(d(9)).await.unwrap().is_none());

        let all = store.list_daily(None, None).await.unwrap();
        let dates: Vec<NaiveDate> = all.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);

        let ranged = store.list_daily(Some(d(2)), Some(d(3))).await.unwrap();
        assert_eq!(ranged.len(), 2);
    }

    #[tokio::test]
    async fn test_metric_last_write_wins() {
        let store = InMemoryStore::new();
        let first = MetricPoint::new(d(1), MetricField::Weight, 245.0, MetricSource::Parsed);
        let second = MetricPoint::new(d(1), MetricField::Weight, 244.0, MetricSource::Manual);
        store.upsert_metric(&first).await.unwrap();
        store.upsert_metric(&second).await.unwrap();

        let got = store
            .get_metric(d(1), MetricField::Weight)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.value, 244.0);
        assert_eq!(got.source, MetricSource::Manual);
        assert_eq!(store.metrics_for_date(d(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_keeps_workouts_and_exercises() {
        let store = InMemoryStore::new();
        store.put_daily(&entry(1, "## Briefing\nold")).await.unwrap();
        store
            .upsert_metric(&MetricPoint::new(d(1), MetricField::Energy, 5.0, MetricSource::Manual))
            .await
            .unwrap();

        let lift = StrengthEntry {
            exercise: "Squat".into(),
            sets: 5,
            reps: 5,
            weight: 225.0,
        };
        let workout = WorkoutEntry::new(d(1), "Legs", vec![lift.clone()]);
        store.insert_workout(&workout).await.unwrap();
        let (pr, _) = apply_observation(None, &lift, d(1));
        store.put_exercise(&pr).await.unwrap();

        store
            .replace_daily_and_metrics(&[entry(2, "## Briefing\nnew")], &[])
            .await
            .unwrap();

        assert!(store.get_daily(d(1)).await.unwrap().is_none());
        assert!(store.get_daily(d(2)).await.unwrap().is_some());
        assert!(store.metrics_for_date(d(1)).await.unwrap().is_empty());
        assert_eq!(store.list_workouts(None).await.unwrap().len(), 1);
        assert!(store.get_exercise("SQUAT").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_with_metrics_drops_stale_parsed_points() {
        let store = InMemoryStore::new();
        let first = [
            MetricPoint::new(d(1), MetricField::Weight, 244.0, MetricSource::Parsed),
            MetricPoint::new(d(1), MetricField::Energy, 6.0, MetricSource::Parsed),
        ];
        store
            .put_daily_with_metrics(&entry(1, "## Quick Log\nWeight:: 244\nEnergy:: 6\n"), &first)
            .await
            .unwrap();
        store
            .upsert_metric(&MetricPoint::new(d(1), MetricField::Hrv, 48.0, MetricSource::Wearable))
            .await
            .unwrap();
        store
            .upsert_metric(&MetricPoint::new(d(2), MetricField::Weight, 243.0, MetricSource::Parsed))
            .await
            .unwrap();

        let second = [MetricPoint::new(d(1), MetricField::Energy, 7.0, MetricSource::Parsed)];
        store
            .put_daily_with_metrics(&entry(1, "## Quick Log\nEnergy:: 7\n"), &second)
            .await
            .unwrap();

        let fields: Vec<MetricField> = store
            .metrics_for_date(d(1))
            .await
            .unwrap()
            .iter()
            .map(|p| p.field)
            .collect();
        assert_eq!(fields, vec![MetricField::Energy, MetricField::Hrv]);
        assert!(store.get_metric(d(2), MetricField::Weight).await.unwrap().is_some());
        assert_eq!(store.get_daily(d(1)).await.unwrap().unwrap().energy, Some(7.0));
    }

    #[tokio::test]
    async fn test_list_workouts_by_date() {
        let store = InMemoryStore::new();
        store
            .insert_workout(&WorkoutEntry::new(d(1), "A", vec![]))
            .await
            .unwrap();
        store
            .insert_workout(&WorkoutEntry::new(d(2), "B", vec![]))
            .await
            .unwrap();
        let day_two = store.list_workouts(Some(d(2))).await.unwrap();
        assert_eq!(day_two.len(), 1);
        assert_eq!(day_two[0].name, "B");
    }
}
