//! Serialized write access to the cache store.
//!
//! Every mutation (daily upsert, metric upsert, PR update, workout logging,
//! rebuild) goes through one [`Cache`], which holds a single async write
//! gate. Reads go straight to the store and may run concurrently.
//!
//! The decisions themselves are the pure rules in
//! [`logbook_core::cache`]; this module only sequences them against a
//! [`Store`].

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::debug;

use logbook_core::cache::{
    apply_session, plan_daily_upsert, session_lifts, DailyCacheEntry, DailyUpsert,
    PrImprovements, SessionLift, WorkoutEntry,
};
use logbook_core::fingerprint::fingerprint;
use logbook_core::metrics::{points_from_record, MetricPoint};
use logbook_core::models::{DailyRecord, StrengthEntry};
use logbook_core::parse_daily;
use logbook_core::store::Store;

/// Raw text of one daily document, as read from the vault.
#[derive(Debug, Clone)]
pub struct DailySource {
    pub date: NaiveDate,
    pub raw: String,
    pub path: Option<String>,
}

impl DailySource {
    /// Parse the text; a date taken from the file name fills a missing
    /// header date.
    pub fn record(&self) -> DailyRecord {
        let mut record = parse_daily(&self.raw);
        record.date.get_or_insert(self.date);
        record
    }
}

/// A PR update for one exercise.
#[derive(Debug, Clone)]
pub struct PrUpdate {
    pub exercise: String,
    pub improved: PrImprovements,
}

/// Counts from a rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub daily: usize,
    pub metrics: usize,
}

pub struct Cache {
    store: Arc<dyn Store>,
    write_gate: Mutex<()>,
}

impl Cache {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            write_gate: Mutex::new(()),
        }
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Upsert the daily entry for `date` from its raw text.
    ///
    /// An unchanged fingerprint short-circuits before any write, including
    /// the derived metric points. Otherwise the entry and its parsed points
    /// are written in one atomic store call, and parsed points for fields
    /// no longer in the document are dropped.
    pub async fn upsert_daily(
        &self,
        date: NaiveDate,
        record: &DailyRecord,
        raw: &str,
        source_path: Option<&str>,
    ) -> Result<DailyUpsert> {
        let _gate = self.write_gate.lock().await;

        let existing = self.store.get_daily(date).await?;
        let outcome = plan_daily_upsert(existing.as_ref(), &fingerprint(raw));
        if outcome == DailyUpsert::Unchanged {
            debug!(%date, "daily entry unchanged");
            return Ok(outcome);
        }

        let entry = DailyCacheEntry::build(date, record, raw, source_path)?;
        let points = points_from_record(date, record);
        self.store.put_daily_with_metrics(&entry, &points).await?;
        debug!(%date, outcome = outcome.as_str(), "daily entry written");
        Ok(outcome)
    }

    /// Overwrite one metric point. Metrics are not fingerprint-gated.
    pub async fn upsert_metric(&self, point: &MetricPoint) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        self.store.upsert_metric(point).await
    }

    pub async fn upsert_metrics(&self, points: &[MetricPoint]) -> Result<usize> {
        let _gate = self.write_gate.lock().await;
        for point in points {
            self.store.upsert_metric(point).await?;
        }
        Ok(points.len())
    }

    /// Fold one strength observation into its exercise's personal record.
    pub async fn update_pr(&self, entry: &StrengthEntry, date: NaiveDate) -> Result<PrImprovements> {
        let _gate = self.write_gate.lock().await;
        self.apply_pr(&SessionLift::from(entry), date).await
    }

    /// Store a workout and update the PR of every exercise in it. Lines for
    /// the same exercise count as one session, so their volumes add up.
    pub async fn log_workout(&self, workout: &WorkoutEntry) -> Result<Vec<PrUpdate>> {
        let _gate = self.write_gate.lock().await;
        self.store.insert_workout(workout).await?;

        let lifts = session_lifts(&workout.entries);
        let mut updates = Vec::with_capacity(lifts.len());
        for lift in &lifts {
            let improved = self.apply_pr(lift, workout.date).await?;
            updates.push(PrUpdate {
                exercise: lift.exercise.clone(),
                improved,
            });
        }
        Ok(updates)
    }

    /// Caller must hold the write gate.
    async fn apply_pr(&self, lift: &SessionLift, date: NaiveDate) -> Result<PrImprovements> {
        let existing = self.store.get_exercise(&lift.exercise).await?;
        let (next, improved) = apply_session(existing.as_ref(), lift, date);
        if existing.as_ref() != Some(&next) {
            self.store.put_exercise(&next).await?;
        }
        Ok(improved)
    }

    /// Replace the daily and metric caches with the contents of `sources`.
    ///
    /// All sources are parsed before the store is touched, and the swap is
    /// one atomic store call. Dropping the future before the swap leaves the
    /// previous contents in place. A date that appears twice keeps its last
    /// source.
    pub async fn rebuild(&self, sources: &[DailySource]) -> Result<RebuildSummary> {
        let mut entries: Vec<DailyCacheEntry> = Vec::with_capacity(sources.len());
        let mut points: Vec<MetricPoint> = Vec::new();
        for source in sources {
            let record = source.record();
            entries.retain(|e| e.date != source.date);
            points.retain(|p| p.date != source.date);
            entries.push(DailyCacheEntry::build(
                source.date,
                &record,
                &source.raw,
                source.path.as_deref(),
            )?);
            points.extend(points_from_record(source.date, &record));
        }

        let _gate = self.write_gate.lock().await;
        self.store
            .replace_daily_and_metrics(&entries, &points)
            .await?;

        Ok(RebuildSummary {
            daily: entries.len(),
            metrics: points.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use logbook_core::cache::ExerciseRecord;
    use logbook_core::metrics::{MetricField, MetricSource};
    use logbook_core::store::memory::InMemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory store whose next daily write fails.
    struct FailNextDailyWrite {
        inner: InMemoryStore,
        fail: AtomicBool,
    }

    #[async_trait]
    impl Store for FailNextDailyWrite {
        async fn get_daily(&self, date: NaiveDate) -> Result<Option<DailyCacheEntry>> {
            self.inner.get_daily(date).await
        }
        async fn put_daily(&self, entry: &DailyCacheEntry) -> Result<()> {
            self.inner.put_daily(entry).await
        }
        async fn put_daily_with_metrics(
            &self,
            entry: &DailyCacheEntry,
            metrics: &[MetricPoint],
        ) -> Result<()> {
            if self.fail.swap(false, Ordering::SeqCst) {
                bail!("disk full");
            }
            self.inner.put_daily_with_metrics(entry, metrics).await
        }
        async fn list_daily(
            &self,
            from: Option<NaiveDate>,
            to: Option<NaiveDate>,
        ) -> Result<Vec<DailyCacheEntry>> {
            self.inner.list_daily(from, to).await
        }
        async fn upsert_metric(&self, point: &MetricPoint) -> Result<()> {
            self.inner.upsert_metric(point).await
        }
        async fn get_metric(
            &self,
            date: NaiveDate,
            field: MetricField,
        ) -> Result<Option<MetricPoint>> {
            self.inner.get_metric(date, field).await
        }
        async fn metrics_for_date(&self, date: NaiveDate) -> Result<Vec<MetricPoint>> {
            self.inner.metrics_for_date(date).await
        }
        async fn replace_daily_and_metrics(
            &self,
            entries: &[DailyCacheEntry],
            metrics: &[MetricPoint],
        ) -> Result<()> {
            self.inner.replace_daily_and_metrics(entries, metrics).await
        }
        async fn insert_workout(&self, workout: &WorkoutEntry) -> Result<()> {
            self.inner.insert_workout(workout).await
        }
        async fn list_workouts(&self, date: Option<NaiveDate>) -> Result<Vec<WorkoutEntry>> {
            self.inner.list_workouts(date).await
        }
        async fn get_exercise(&self, name: &str) -> Result<Option<ExerciseRecord>> {
            self.inner.get_exercise(name).await
        }
        async fn put_exercise(&self, record: &ExerciseRecord) -> Result<()> {
            self.inner.put_exercise(record).await
        }
        async fn list_exercises(&self) -> Result<Vec<ExerciseRecord>> {
            self.inner.list_exercises().await
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn cache() -> Cache {
        Cache::new(Arc::new(InMemoryStore::new()))
    }

    async fn upsert(cache: &Cache, day: u32, raw: &str) -> DailyUpsert {
        cache
            .upsert_daily(d(day), &parse_daily(raw), raw, None)
            .await
            .unwrap()
    }

    const DAY: &str = "## Quick Log\nWeight:: 244\nSleep:: 6:35\n\n## Today's Todos\n- [x] A\n- [ ] B\n";

    #[tokio::test]
    async fn test_identical_text_is_a_no_op() {
        let cache = cache();
        assert_eq!(upsert(&cache, 15, DAY).await, DailyUpsert::Inserted);
        let before = cache.store().get_daily(d(15)).await.unwrap().unwrap();

        assert_eq!(upsert(&cache, 15, DAY).await, DailyUpsert::Unchanged);
        let after = cache.store().get_daily(d(15)).await.unwrap().unwrap();
        assert_eq!(before, after);
        assert_eq!(after.content_hash, fingerprint(DAY));
    }

    #[tokio::test]
    async fn test_changed_text_replaces_every_field() {
        let cache = cache();
        upsert(&cache, 15, DAY).await;
        let edited = DAY.replace("Weight:: 244", "Weight:: 242.5");
        assert_eq!(upsert(&cache, 15, &edited).await, DailyUpsert::Updated);

        let entry = cache.store().get_daily(d(15)).await.unwrap().unwrap();
        assert_eq!(entry.weight, Some(242.5));
        assert_eq!(entry.content_hash, fingerprint(&edited));
        assert_eq!(entry.record().unwrap().quick_log.weight, Some(242.5));

        let weight = cache
            .store()
            .get_metric(d(15), MetricField::Weight)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(weight.value, 242.5);
        assert_eq!(weight.source, MetricSource::Parsed);
    }

    #[tokio::test]
    async fn test_failed_write_is_retried_on_next_sync() {
        let cache = Cache::new(Arc::new(FailNextDailyWrite {
            inner: InMemoryStore::new(),
            fail: AtomicBool::new(true),
        }));
        let err = cache
            .upsert_daily(d(15), &parse_daily(DAY), DAY, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(cache.store().get_daily(d(15)).await.unwrap().is_none());

        assert_eq!(upsert(&cache, 15, DAY).await, DailyUpsert::Inserted);
        let weight = cache
            .store()
            .get_metric(d(15), MetricField::Weight)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(weight.value, 244.0);
    }

    #[tokio::test]
    async fn test_removed_field_drops_its_parsed_metric() {
        let cache = cache();
        upsert(&cache, 15, DAY).await;
        cache
            .upsert_metric(&MetricPoint::new(d(15), MetricField::Hrv, 48.0, MetricSource::Manual))
            .await
            .unwrap();

        let edited = DAY.replace("Weight:: 244\n", "");
        assert_eq!(upsert(&cache, 15, &edited).await, DailyUpsert::Updated);

        let entry = cache.store().get_daily(d(15)).await.unwrap().unwrap();
        assert_eq!(entry.weight, None);
        let store = cache.store();
        assert!(store.get_metric(d(15), MetricField::Weight).await.unwrap().is_none());
        assert!(store.get_metric(d(15), MetricField::SleepHours).await.unwrap().is_some());
        let hrv = store.get_metric(d(15), MetricField::Hrv).await.unwrap().unwrap();
        assert_eq!(hrv.source, MetricSource::Manual);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_same_key() {
        let cache = Arc::new(cache());
        let texts: Vec<String> = (0..16)
            .map(|i| format!("## Quick Log\nWeight:: {}\n", 200 + i))
            .collect();

        let mut handles = Vec::new();
        for text in texts.clone() {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .upsert_daily(d(1), &parse_daily(&text), &text, None)
                    .await
                    .unwrap()
            }));
        }
        let mut inserted = 0;
        for h in handles {
            if h.await.unwrap() == DailyUpsert::Inserted {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);

        // Whatever text won, the entry is internally consistent.
        let entry = cache.store().get_daily(d(1)).await.unwrap().unwrap();
        let winner = texts
            .iter()
            .find(|t| fingerprint(t) == entry.content_hash)
            .unwrap();
        assert_eq!(entry.record().unwrap(), parse_daily(winner));
        assert_eq!(entry.weight, parse_daily(winner).quick_log.weight);
    }

    #[tokio::test]
    async fn test_pr_updates_are_monotonic() {
        let cache = cache();
        let lift = |reps: u32, weight: f64| StrengthEntry {
            exercise: "Bench press".into(),
            sets: 3,
            reps,
            weight,
        };

        let first = cache.update_pr(&lift(10, 60.0), d(10)).await.unwrap();
        assert!(first.any());
        let worse = cache.update_pr(&lift(8, 50.0), d(12)).await.unwrap();
        assert!(!worse.any());
        let heavier = cache.update_pr(&lift(5, 80.0), d(3)).await.unwrap();
        assert!(heavier.weight && !heavier.reps && !heavier.volume);

        let pr = cache.store().get_exercise("bench press").await.unwrap().unwrap();
        assert_eq!(pr.max_weight, 80.0);
        assert_eq!(pr.max_reps, 10);
        assert_eq!(pr.max_volume, 1800.0);
        assert_eq!(pr.last_used, d(12));
    }

    #[tokio::test]
    async fn test_log_workout_feeds_prs() {
        let cache = cache();
        let workout = WorkoutEntry::new(
            d(5),
            "Upper A",
            vec![
                StrengthEntry { exercise: "Row".into(), sets: 3, reps: 12, weight: 50.0 },
                StrengthEntry { exercise: "Press".into(), sets: 3, reps: 8, weight: 40.0 },
            ],
        );
        let updates = cache.log_workout(&workout).await.unwrap();
        assert_eq!(updates.len(), 2);
        assert!(updates.iter().all(|u| u.improved.any()));
        assert_eq!(cache.store().list_workouts(Some(d(5))).await.unwrap().len(), 1);
        assert_eq!(cache.store().list_exercises().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_exercise_counts_as_one_session() {
        let cache = cache();
        let bench = |sets: u32, reps: u32, weight: f64| StrengthEntry {
            exercise: "Bench press".into(),
            sets,
            reps,
            weight,
        };
        let workout = WorkoutEntry::new(d(6), "Push", vec![bench(3, 10, 60.0), bench(2, 8, 70.0)]);
        let updates = cache.log_workout(&workout).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].exercise, "Bench press");

        let pr = cache.store().get_exercise("bench press").await.unwrap().unwrap();
        assert_eq!(pr.max_volume, 1800.0 + 1120.0);
        assert_eq!(pr.max_weight, 70.0);
        assert_eq!(pr.max_reps, 10);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_caches_only() {
        let cache = cache();
        upsert(&cache, 1, DAY).await;
        cache
            .update_pr(
                &StrengthEntry { exercise: "Squat".into(), sets: 5, reps: 5, weight: 225.0 },
                d(1),
            )
            .await
            .unwrap();

        let sources = vec![
            DailySource { date: d(2), raw: "## Quick Log\nEnergy:: 7\n".into(), path: None },
            DailySource { date: d(3), raw: "## Quick Log\nFocus:: 6\n".into(), path: None },
            DailySource { date: d(3), raw: "## Quick Log\nFocus:: 8\n".into(), path: None },
        ];
        let summary = cache.rebuild(&sources).await.unwrap();
        assert_eq!(summary, RebuildSummary { daily: 2, metrics: 2 });

        assert!(cache.store().get_daily(d(1)).await.unwrap().is_none());
        let focus = cache
            .store()
            .get_metric(d(3), MetricField::Focus)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(focus.value, 8.0);
        assert!(cache.store().get_exercise("squat").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_readers_never_see_empty_cache_during_rebuild() {
        let cache = Arc::new(cache());
        upsert(&cache, 1, DAY).await;

        let sources: Vec<DailySource> = (1..=28)
            .map(|day| DailySource {
                date: d(day),
                raw: format!("## Quick Log\nEnergy:: {}\n", day % 10),
                path: None,
            })
            .collect();

        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for _ in 0..200 {
                    let n = cache.store().list_daily(None, None).await.unwrap().len();
                    assert!(n == 1 || n == 28, "observed partial state: {}", n);
                    tokio::task::yield_now().await;
                }
            })
        };
        for _ in 0..5 {
            cache.rebuild(&sources).await.unwrap();
        }
        reader.await.unwrap();
    }
}
