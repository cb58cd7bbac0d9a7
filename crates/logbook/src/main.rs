//! # Logbook CLI (`lb`)
//!
//! ## Usage
//!
//! ```bash
//! lb --config ./config/logbook.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lb init` | Create the SQLite database and run schema migrations |
//! | `lb sync [--full]` | Upsert changed daily documents from the vault |
//! | `lb rebuild` | Re-derive the daily and metric cache in one swap |
//! | `lb get <date>` | Show the cached entry and metrics for a day |
//! | `lb fmt <file> [--check]` | Rewrite a document in canonical form |
//! | `lb metric set <date> <field> <value>` | Record a manual metric |
//! | `lb metric show <date>` | List metric points for a day |
//! | `lb import daily\|wearable [<path>]` | Load metric points from JSON |
//! | `lb export daily-metrics [--out <path>]` | Write the daily-metrics file |
//! | `lb workout log ...` | Store a workout and update personal records |
//! | `lb workout list [--date]` | List stored workouts |
//! | `lb pr [<exercise>]` | Show personal records |

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use logbook::import::ImportKind;
use logbook::workout::LogOptions;
use logbook::{config, export, fmt, get, import, ingest, logging, metric, migrate, workout};

/// Logbook: a fingerprint-gated cache over a plain-text daily log vault.
///
/// All commands except `fmt` read a TOML configuration file. See
/// `config/logbook.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "lb", version, about = "Logbook: plain-text daily log cache and tools")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/logbook.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Upsert every daily document whose content changed since the last sync.
    Sync {
        /// Rebuild the whole cache instead of upserting.
        #[arg(long)]
        full: bool,
    },

    /// Replace the daily and metric cache with one derived from the vault.
    ///
    /// Every document is parsed before anything is written; the cache is
    /// swapped in a single transaction.
    Rebuild,

    /// Show the cached daily entry for a date (YYYY-MM-DD).
    Get {
        date: NaiveDate,

        /// Output format: `text` or `json`.
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Rewrite a document in canonical form.
    Fmt {
        file: PathBuf,

        /// Fail instead of writing when the file is not canonical.
        #[arg(long)]
        check: bool,
    },

    /// Manual metric entry.
    Metric {
        #[command(subcommand)]
        action: MetricAction,
    },

    /// Load metric points from a JSON interchange file.
    Import {
        #[command(subcommand)]
        kind: ImportAction,
    },

    /// Write a JSON interchange file from the cache.
    Export {
        #[command(subcommand)]
        kind: ExportAction,
    },

    /// Workout logging.
    Workout {
        #[command(subcommand)]
        action: WorkoutAction,
    },

    /// Show personal records, optionally for one exercise.
    Pr { exercise: Option<String> },
}

#[derive(Subcommand)]
enum MetricAction {
    /// Set a metric value for a day, e.g. `lb metric set 2025-01-15 hrv 48`.
    Set {
        date: NaiveDate,
        field: String,
        value: f64,
    },
    /// List every metric point for a day.
    Show { date: NaiveDate },
}

#[derive(Subcommand)]
enum ImportAction {
    /// Daily-metrics file; defaults to `[interchange].daily_metrics`.
    Daily { path: Option<PathBuf> },
    /// Wearable-metrics file; defaults to `[interchange].wearable_metrics`.
    Wearable { path: Option<PathBuf> },
}

#[derive(Subcommand)]
enum ExportAction {
    /// Daily-metrics file (`version` 1).
    DailyMetrics {
        /// Output path; defaults to `[interchange].daily_metrics`, then stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum WorkoutAction {
    /// Store a workout. Entries come from `--set` and/or `--from-daily`.
    Log {
        /// Workout date; defaults to the date of `--from-daily`.
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        name: String,

        /// Strength entry, e.g. `--set "Bench press:: 3x10 @ 60"`. Repeatable.
        #[arg(long = "set")]
        sets: Vec<String>,

        /// Take entries from a daily document's strength log.
        #[arg(long)]
        from_daily: Option<PathBuf>,

        /// Duration in minutes.
        #[arg(long)]
        duration: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },
    /// List stored workouts.
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // fmt works on a single file and needs no config
    if let Commands::Fmt { file, check } = &cli.command {
        logging::init("info");
        return fmt::run_fmt(file, *check);
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging.level);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sync { full } => {
            ingest::run_sync(&cfg, full).await?;
        }
        Commands::Rebuild => {
            ingest::run_rebuild(&cfg).await?;
        }
        Commands::Get { date, format } => {
            get::run_get(&cfg, date, &format).await?;
        }
        Commands::Fmt { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
        Commands::Metric { action } => match action {
            MetricAction::Set { date, field, value } => {
                metric::run_set(&cfg, date, &field, value).await?;
            }
            MetricAction::Show { date } => {
                metric::run_show(&cfg, date).await?;
            }
        },
        Commands::Import { kind } => match kind {
            ImportAction::Daily { path } => {
                import::run_import(&cfg, ImportKind::Daily, path.as_deref()).await?;
            }
            ImportAction::Wearable { path } => {
                import::run_import(&cfg, ImportKind::Wearable, path.as_deref()).await?;
            }
        },
        Commands::Export { kind } => match kind {
            ExportAction::DailyMetrics { out } => {
                export::run_export(&cfg, out.as_deref()).await?;
            }
        },
        Commands::Workout { action } => match action {
            WorkoutAction::Log {
                date,
                name,
                sets,
                from_daily,
                duration,
                notes,
            } => {
                let opts = LogOptions {
                    date,
                    name,
                    sets,
                    from_daily,
                    duration_minutes: duration,
                    notes,
                };
                workout::run_log(&cfg, &opts).await?;
            }
            WorkoutAction::List { date } => {
                workout::run_list(&cfg, date).await?;
            }
        },
        Commands::Pr { exercise } => {
            workout::run_pr(&cfg, exercise.as_deref()).await?;
        }
    }

    Ok(())
}
