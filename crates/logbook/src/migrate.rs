//! Idempotent schema setup.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index if missing. Safe to run repeatedly.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // One row per calendar day, keyed by `yyyy-MM-dd`.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_cache (
            date TEXT PRIMARY KEY,
            title TEXT,
            tags_json TEXT NOT NULL DEFAULT '[]',
            weight REAL,
            sleep_hours REAL,
            sleep_quality REAL,
            mood_am REAL,
            mood_pm REAL,
            energy REAL,
            focus REAL,
            todo_completion REAL,
            habit_completion REAL,
            calories REAL,
            protein_g REAL,
            training_minutes REAL,
            strength_volume REAL,
            content_hash TEXT NOT NULL,
            snapshot_json TEXT NOT NULL,
            source_path TEXT,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Composite key `yyyy-MM-dd|field`; last write wins.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metric_cache (
            key TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            field TEXT NOT NULL,
            value REAL NOT NULL,
            source TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workouts (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            name TEXT NOT NULL,
            duration_minutes REAL,
            notes TEXT,
            entries_json TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS exercises (
            key TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            max_weight REAL NOT NULL,
            max_reps INTEGER NOT NULL,
            max_volume REAL NOT NULL,
            last_used TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_metric_cache_date ON metric_cache(date)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts(date)")
        .execute(pool)
        .await?;

    Ok(())
}
