//! Workout logging and personal-record listing.
//!
//! Strength entries come either from `--set` arguments written in strength
//! notation (`Bench press:: 3x10 @ 60`) or from the strength log of a daily
//! document. Every logged entry feeds the PR update.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use logbook_core::cache::{date_key, WorkoutEntry};
use logbook_core::fields::parse_field;
use logbook_core::models::StrengthEntry;
use logbook_core::normalize::parse_strength;
use logbook_core::parse_daily;
use logbook_core::serialize::format_number;
use logbook_core::store::Store;

use crate::cache::{Cache, PrUpdate};
use crate::config::Config;
use crate::db;
use crate::vault;

/// Options for `lb workout log`.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub date: Option<NaiveDate>,
    pub name: String,
    pub sets: Vec<String>,
    pub from_daily: Option<std::path::PathBuf>,
    pub duration_minutes: Option<f64>,
    pub notes: Option<String>,
}

/// Parse one `Exercise:: SETSxREPS @ WEIGHT` argument.
pub fn parse_set_arg(arg: &str) -> Result<StrengthEntry> {
    parse_field(arg)
        .and_then(|f| parse_strength(&f.name, &f.value))
        .with_context(|| format!("Invalid set '{}'. Expected 'Exercise:: 3x10 @ 60'", arg))
}

/// Strength entries and date from a daily document's strength log.
pub fn entries_from_daily(path: &Path) -> Result<(Option<NaiveDate>, Vec<StrengthEntry>)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let record = parse_daily(&raw);
    let date = record.date.or_else(|| vault::date_from_stem(path));
    Ok((date, record.strength))
}

/// Assemble the workout described by `opts`, without storing it.
pub fn build_workout(opts: &LogOptions) -> Result<WorkoutEntry> {
    let mut entries = Vec::new();
    let mut date = opts.date;

    if let Some(ref path) = opts.from_daily {
        let (doc_date, doc_entries) = entries_from_daily(path)?;
        date = date.or(doc_date);
        entries.extend(doc_entries);
    }
    for arg in &opts.sets {
        entries.push(parse_set_arg(arg)?);
    }

    if entries.is_empty() {
        bail!("workout has no strength entries; pass --set or --from-daily");
    }
    let Some(date) = date else {
        bail!("workout date is unknown; pass --date");
    };

    let mut workout = WorkoutEntry::new(date, &opts.name, entries);
    workout.duration_minutes = opts.duration_minutes;
    workout.notes = opts.notes.clone();
    Ok(workout)
}

pub async fn log_workout(cache: &Cache, opts: &LogOptions) -> Result<(WorkoutEntry, Vec<PrUpdate>)> {
    let workout = build_workout(opts)?;
    let updates = cache.log_workout(&workout).await?;
    Ok((workout, updates))
}

pub async fn run_log(config: &Config, opts: &LogOptions) -> Result<()> {
    let store = Arc::new(db::open_store(config).await?);
    let cache = Cache::new(store.clone());
    let result = log_workout(&cache, opts).await;
    store.close().await;
    let (workout, updates) = result?;

    println!("workout {} {}", date_key(workout.date), workout.name);
    println!("  id: {}", workout.id);
    println!("  entries: {}", workout.entries.len());
    println!("  volume: {}", format_number(workout.total_volume()));
    for update in updates.iter().filter(|u| u.improved.any()) {
        let mut moved = Vec::new();
        if update.improved.weight {
            moved.push("weight");
        }
        if update.improved.reps {
            moved.push("reps");
        }
        if update.improved.volume {
            moved.push("volume");
        }
        println!("  PR {}: {}", update.exercise, moved.join(", "));
    }
    println!("ok");
    Ok(())
}

pub async fn run_list(config: &Config, date: Option<NaiveDate>) -> Result<()> {
    let store = db::open_store(config).await?;
    let workouts = store.list_workouts(date).await;
    store.close().await;
    let workouts = workouts?;

    if workouts.is_empty() {
        println!("No workouts.");
        return Ok(());
    }
    for w in &workouts {
        println!("{}  {}  ({} entries)", date_key(w.date), w.name, w.entries.len());
        for e in &w.entries {
            println!(
                "    {}:: {}x{} @ {}",
                e.exercise,
                e.sets,
                e.reps,
                format_number(e.weight)
            );
        }
    }
    Ok(())
}

pub async fn run_pr(config: &Config, exercise: Option<&str>) -> Result<()> {
    let store = db::open_store(config).await?;
    let records = match exercise {
        Some(name) => store
            .get_exercise(name)
            .await
            .map(|r| r.into_iter().collect::<Vec<_>>()),
        None => store.list_exercises().await,
    };
    store.close().await;
    let records = records?;

    if records.is_empty() {
        match exercise {
            Some(name) => bail!("no personal record for '{}'", name),
            None => println!("No personal records."),
        }
        return Ok(());
    }

    println!(
        "{:<28} {:>10} {:>6} {:>12}  {}",
        "EXERCISE", "WEIGHT", "REPS", "VOLUME", "LAST USED"
    );
    for r in &records {
        println!(
            "{:<28} {:>10} {:>6} {:>12}  {}",
            r.name,
            format_number(r.max_weight),
            r.max_reps,
            format_number(r.max_volume),
            date_key(r.last_used)
        );
    }
    Ok(())
}
