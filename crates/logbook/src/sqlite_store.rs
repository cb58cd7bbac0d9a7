//! SQLite-backed [`Store`] implementation.
//!
//! Dates are stored as `yyyy-MM-dd` text, lists as JSON text. The rebuild
//! swap runs in one transaction, so WAL readers keep seeing the old rows
//! until it commits.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

use logbook_core::cache::{date_key, exercise_key, DailyCacheEntry, ExerciseRecord, WorkoutEntry};
use logbook_core::metrics::{metric_key, MetricField, MetricPoint, MetricSource};
use logbook_core::models::StrengthEntry;
use logbook_core::store::Store;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

const DAILY_COLUMNS: &str = "date, title, tags_json, weight, sleep_hours, sleep_quality, \
    mood_am, mood_pm, energy, focus, todo_completion, habit_completion, calories, protein_g, \
    training_minutes, strength_volume, content_hash, snapshot_json, source_path, updated_at";

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid stored date: '{}'", raw))
}

async fn write_daily<'e, E>(executor: E, entry: &DailyCacheEntry) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let tags_json = serde_json::to_string(&entry.tags)?;
    sqlx::query(
        r#"
        INSERT INTO daily_cache (date, title, tags_json, weight, sleep_hours, sleep_quality,
                                 mood_am, mood_pm, energy, focus, todo_completion,
                                 habit_completion, calories, protein_g, training_minutes,
                                 strength_volume, content_hash, snapshot_json, source_path,
                                 updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(date) DO UPDATE SET
            title = excluded.title,
            tags_json = excluded.tags_json,
            weight = excluded.weight,
            sleep_hours = excluded.sleep_hours,
            sleep_quality = excluded.sleep_quality,
            mood_am = excluded.mood_am,
            mood_pm = excluded.mood_pm,
            energy = excluded.energy,
            focus = excluded.focus,
            todo_completion = excluded.todo_completion,
            habit_completion = excluded.habit_completion,
            calories = excluded.calories,
            protein_g = excluded.protein_g,
            training_minutes = excluded.training_minutes,
            strength_volume = excluded.strength_volume,
            content_hash = excluded.content_hash,
            snapshot_json = excluded.snapshot_json,
            source_path = excluded.source_path,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(entry.key())
    .bind(&entry.title)
    .bind(&tags_json)
    .bind(entry.weight)
    .bind(entry.sleep_hours)
    .bind(entry.sleep_quality)
    .bind(entry.mood_am)
    .bind(entry.mood_pm)
    .bind(entry.energy)
    .bind(entry.focus)
    .bind(entry.todo_completion)
    .bind(entry.habit_completion)
    .bind(entry.calories)
    .bind(entry.protein_g)
    .bind(entry.training_minutes)
    .bind(entry.strength_volume)
    .bind(&entry.content_hash)
    .bind(&entry.snapshot_json)
    .bind(&entry.source_path)
    .bind(entry.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

async fn write_metric<'e, E>(executor: E, point: &MetricPoint) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        r#"
        INSERT INTO metric_cache (key, date, field, value, source, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            date = excluded.date,
            value = excluded.value,
            source = excluded.source,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(point.key())
    .bind(date_key(point.date))
    .bind(point.field.as_str())
    .bind(point.value)
    .bind(point.source.as_str())
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

fn daily_from_row(row: &SqliteRow) -> Result<DailyCacheEntry> {
    let date: String = row.get("date");
    let tags_json: String = row.get("tags_json");
    Ok(DailyCacheEntry {
        date: parse_date(&date)?,
        title: row.get("title"),
        tags: serde_json::from_str(&tags_json)
            .with_context(|| format!("Corrupt tags for {}", date))?,
        weight: row.get("weight"),
        sleep_hours: row.get("sleep_hours"),
        sleep_quality: row.get("sleep_quality"),
        mood_am: row.get("mood_am"),
        mood_pm: row.get("mood_pm"),
        energy: row.get("energy"),
        focus: row.get("focus"),
        todo_completion: row.get("todo_completion"),
        habit_completion: row.get("habit_completion"),
        calories: row.get("calories"),
        protein_g: row.get("protein_g"),
        training_minutes: row.get("training_minutes"),
        strength_volume: row.get("strength_volume"),
        content_hash: row.get("content_hash"),
        snapshot_json: row.get("snapshot_json"),
        source_path: row.get("source_path"),
        updated_at: row.get("updated_at"),
    })
}

fn metric_from_row(row: &SqliteRow) -> Result<MetricPoint> {
    let date: String = row.get("date");
    let field: String = row.get("field");
    let source: String = row.get("source");
    Ok(MetricPoint {
        date: parse_date(&date)?,
        field: field.parse::<MetricField>()?,
        value: row.get("value"),
        source: source.parse::<MetricSource>()?,
    })
}

fn workout_from_row(row: &SqliteRow) -> Result<WorkoutEntry> {
    let date: String = row.get("date");
    let entries_json: String = row.get("entries_json");
    let id: String = row.get("id");
    let entries: Vec<StrengthEntry> = serde_json::from_str(&entries_json)
        .with_context(|| format!("Corrupt entries for workout {}", id))?;
    Ok(WorkoutEntry {
        id,
        date: parse_date(&date)?,
        name: row.get("name"),
        entries,
        duration_minutes: row.get("duration_minutes"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    })
}

fn exercise_from_row(row: &SqliteRow) -> Result<ExerciseRecord> {
    let last_used: String = row.get("last_used");
    let max_reps: i64 = row.get("max_reps");
    Ok(ExerciseRecord {
        name: row.get("name"),
        max_weight: row.get("max_weight"),
        max_reps: u32::try_from(max_reps).context("Stored max_reps out of range")?,
        max_volume: row.get("max_volume"),
        last_used: parse_date(&last_used)?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_daily(&self, date: NaiveDate) -> Result<Option<DailyCacheEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM daily_cache WHERE date = ?",
            DAILY_COLUMNS
        ))
        .bind(date_key(date))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(daily_from_row).transpose()
    }

    async fn put_daily(&self, entry: &DailyCacheEntry) -> Result<()> {
        write_daily(&self.pool, entry).await
    }

    async fn put_daily_with_metrics(
        &self,
        entry: &DailyCacheEntry,
        metrics: &[MetricPoint],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM metric_cache WHERE date = ? AND source = ?")
            .bind(entry.key())
            .bind(MetricSource::Parsed.as_str())
            .execute(&mut *tx)
            .await?;
        for point in metrics {
            write_metric(&mut *tx, point).await?;
        }
        write_daily(&mut *tx, entry).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_daily(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyCacheEntry>> {
        // `yyyy-MM-dd` sorts lexicographically in date order.
        let rows = sqlx::query(&format!(
            "SELECT {} FROM daily_cache \
             WHERE (? IS NULL OR date >= ?) AND (? IS NULL OR date <= ?) \
             ORDER BY date ASC",
            DAILY_COLUMNS
        ))
        .bind(from.map(date_key))
        .bind(from.map(date_key))
        .bind(to.map(date_key))
        .bind(to.map(date_key))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(daily_from_row).collect()
    }

    async fn upsert_metric(&self, point: &MetricPoint) -> Result<()> {
        write_metric(&self.pool, point).await
    }

    async fn get_metric(
        &self,
        date: NaiveDate,
        field: MetricField,
    ) -> Result<Option<MetricPoint>> {
        let row = sqlx::query("SELECT date, field, value, source FROM metric_cache WHERE key = ?")
            .bind(metric_key(date, field))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(metric_from_row).transpose()
    }

    async fn metrics_for_date(&self, date: NaiveDate) -> Result<Vec<MetricPoint>> {
        let rows = sqlx::query(
            "SELECT date, field, value, source FROM metric_cache WHERE date = ? ORDER BY field ASC",
        )
        .bind(date_key(date))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(metric_from_row).collect()
    }

    async fn replace_daily_and_metrics(
        &self,
        entries: &[DailyCacheEntry],
        metrics: &[MetricPoint],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM daily_cache")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM metric_cache")
            .execute(&mut *tx)
            .await?;

        for entry in entries {
            write_daily(&mut *tx, entry).await?;
        }
        for point in metrics {
            write_metric(&mut *tx, point).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_workout(&self, workout: &WorkoutEntry) -> Result<()> {
        let entries_json = serde_json::to_string(&workout.entries)?;
        sqlx::query(
            r#"
            INSERT INTO workouts (id, date, name, duration_minutes, notes, entries_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&workout.id)
        .bind(date_key(workout.date))
        .bind(&workout.name)
        .bind(workout.duration_minutes)
        .bind(&workout.notes)
        .bind(&entries_json)
        .bind(workout.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_workouts(&self, date: Option<NaiveDate>) -> Result<Vec<WorkoutEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, name, duration_minutes, notes, entries_json, created_at
            FROM workouts
            WHERE (? IS NULL OR date = ?)
            ORDER BY date ASC, created_at ASC
            "#,
        )
        .bind(date.map(date_key))
        .bind(date.map(date_key))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(workout_from_row).collect()
    }

    async fn get_exercise(&self, name: &str) -> Result<Option<ExerciseRecord>> {
        let row = sqlx::query(
            "SELECT name, max_weight, max_reps, max_volume, last_used FROM exercises WHERE key = ?",
        )
        .bind(exercise_key(name))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(exercise_from_row).transpose()
    }

    async fn put_exercise(&self, record: &ExerciseRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO exercises (key, name, max_weight, max_reps, max_volume, last_used)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                name = excluded.name,
                max_weight = excluded.max_weight,
                max_reps = excluded.max_reps,
                max_volume = excluded.max_volume,
                last_used = excluded.last_used
            "#,
        )
        .bind(exercise_key(&record.name))
        .bind(&record.name)
        .bind(record.max_weight)
        .bind(i64::from(record.max_reps))
        .bind(record.max_volume)
        .bind(date_key(record.last_used))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_exercises(&self) -> Result<Vec<ExerciseRecord>> {
        let rows = sqlx::query(
            "SELECT name, max_weight, max_reps, max_volume, last_used FROM exercises ORDER BY key ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(exercise_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbook_core::cache::apply_observation;
    use logbook_core::parse_daily;
    use tempfile::TempDir;

    async fn store(dir: &TempDir) -> SqliteStore {
        let pool = crate::db::connect_path(&dir.path().join("lb.sqlite"))
            .await
            .unwrap();
        crate::migrate::apply(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn entry(day: u32, raw: &str) -> DailyCacheEntry {
        DailyCacheEntry::build(d(day), &parse_daily(raw), raw, Some("x.md")).unwrap()
    }

    #[tokio::test]
    async fn test_daily_round_trips_through_sqlite() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let raw = "---\ntags: [a, b]\n---\n## Quick Log\nWeight:: 244\nSleep:: 6:35\n";
        let e = entry(15, raw);
        store.put_daily(&e).await.unwrap();

        let got = store.get_daily(d(15)).await.unwrap().unwrap();
        assert_eq!(got, e);
        assert_eq!(got.tags, vec!["a", "b"]);
        assert_eq!(got.record().unwrap(), parse_daily(raw));
        assert!(store.get_daily(d(16)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_daily_range() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        for day in [3, 1, 2] {
            store
                .put_daily(&entry(day, &format!("## Briefing\n{}", day)))
                .await
                .unwrap();
        }
        let all = store.list_daily(None, None).await.unwrap();
        assert_eq!(all.iter().map(|e| e.date).collect::<Vec<_>>(), vec![d(1), d(2), d(3)]);
        let tail = store.list_daily(Some(d(2)), None).await.unwrap();
        assert_eq!(tail.len(), 2);
    }

    #[tokio::test]
    async fn test_metric_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        store
            .upsert_metric(&MetricPoint::new(d(1), MetricField::Hrv, 40.0, MetricSource::Wearable))
            .await
            .unwrap();
        store
            .upsert_metric(&MetricPoint::new(d(1), MetricField::Hrv, 48.0, MetricSource::Manual))
            .await
            .unwrap();
        let points = store.metrics_for_date(d(1)).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 48.0);
        assert_eq!(points[0].source, MetricSource::Manual);
    }

    #[tokio::test]
    async fn test_daily_write_replaces_parsed_points_only() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let weight = MetricPoint::new(d(1), MetricField::Weight, 244.0, MetricSource::Parsed);
        store
            .put_daily_with_metrics(&entry(1, "## Quick Log\nWeight:: 244\n"), &[weight])
            .await
            .unwrap();
        store
            .upsert_metric(&MetricPoint::new(d(1), MetricField::Hrv, 48.0, MetricSource::Manual))
            .await
            .unwrap();

        let energy = MetricPoint::new(d(1), MetricField::Energy, 7.0, MetricSource::Parsed);
        store
            .put_daily_with_metrics(&entry(1, "## Quick Log\nEnergy:: 7\n"), &[energy])
            .await
            .unwrap();

        assert!(store.get_metric(d(1), MetricField::Weight).await.unwrap().is_none());
        let points = store.metrics_for_date(d(1)).await.unwrap();
        let fields: Vec<&str> = points.iter().map(|p| p.field.as_str()).collect();
        assert_eq!(fields, vec!["energy", "hrv"]);
        assert_eq!(store.get_daily(d(1)).await.unwrap().unwrap().energy, Some(7.0));
    }

    #[tokio::test]
    async fn test_replace_is_scoped_to_caches() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        store.put_daily(&entry(1, "## Briefing\nold")).await.unwrap();

        let lift = StrengthEntry {
            exercise: "Deadlift".into(),
            sets: 1,
            reps: 5,
            weight: 315.0,
        };
        store
            .insert_workout(&WorkoutEntry::new(d(1), "Pull", vec![lift.clone()]))
            .await
            .unwrap();
        let (pr, _) = apply_observation(None, &lift, d(1));
        store.put_exercise(&pr).await.unwrap();

        let fresh = entry(2, "## Briefing\nnew");
        let point = MetricPoint::new(d(2), MetricField::Energy, 7.0, MetricSource::Parsed);
        store
            .replace_daily_and_metrics(&[fresh.clone()], &[point])
            .await
            .unwrap();

        assert!(store.get_daily(d(1)).await.unwrap().is_none());
        assert_eq!(store.get_daily(d(2)).await.unwrap().unwrap(), fresh);
        assert_eq!(store.metrics_for_date(d(2)).await.unwrap().len(), 1);

        let workouts = store.list_workouts(Some(d(1))).await.unwrap();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].entries, vec![lift]);
        let pr = store.get_exercise("deadlift").await.unwrap().unwrap();
        assert_eq!(pr.max_weight, 315.0);
        assert_eq!(pr.max_reps, 5);
    }
}
