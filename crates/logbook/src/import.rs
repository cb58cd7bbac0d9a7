//! Import metric points from JSON interchange files.
//!
//! Decoding is strict: a malformed file fails the whole import and nothing
//! is written.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use logbook_core::interchange::{decode_daily_metrics, decode_wearable_metrics};
use logbook_core::metrics::MetricPoint;

use crate::cache::Cache;
use crate::config::Config;
use crate::db;

/// Which interchange file to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Daily,
    Wearable,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Daily => "daily",
            ImportKind::Wearable => "wearable",
        }
    }
}

/// Decode a file into metric points without touching the store.
pub fn read_points(kind: ImportKind, path: &Path) -> Result<(usize, Vec<MetricPoint>)> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let decoded = match kind {
        ImportKind::Daily => decode_daily_metrics(&json).map(|file| {
            let points = file.entries.iter().flat_map(|e| e.metric_points()).collect();
            (file.entries.len(), points)
        }),
        ImportKind::Wearable => decode_wearable_metrics(&json).map(|file| {
            let points = file.entries.iter().flat_map(|e| e.metric_points()).collect();
            (file.entries.len(), points)
        }),
    };
    decoded.with_context(|| format!("Failed to import {}", path.display()))
}

fn resolve_path(config: &Config, kind: ImportKind, path: Option<&Path>) -> Result<PathBuf> {
    let configured = match kind {
        ImportKind::Daily => config.interchange.daily_metrics.as_ref(),
        ImportKind::Wearable => config.interchange.wearable_metrics.as_ref(),
    };
    match path.map(Path::to_path_buf).or_else(|| configured.cloned()) {
        Some(p) => Ok(p),
        None => bail!(
            "No {} metrics file given and [interchange] has no default",
            kind.as_str()
        ),
    }
}

pub async fn run_import(config: &Config, kind: ImportKind, path: Option<&Path>) -> Result<()> {
    let path = resolve_path(config, kind, path)?;
    let (entries, points) = read_points(kind, &path)?;

    let store = Arc::new(db::open_store(config).await?);
    let cache = Cache::new(store.clone());
    let written = cache.upsert_metrics(&points).await;
    store.close().await;
    let written = written?;

    println!("import {}", kind.as_str());
    println!("  entries: {}", entries);
    println!("  metric points: {}", written);
    println!("ok");
    Ok(())
}
