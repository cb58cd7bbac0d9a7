//! Export cached daily entries as a daily-metrics interchange file.
//!
//! The output is the same `{version, entries}` shape the mobile client
//! reads, so a synced vault can be handed to it without re-parsing.

use anyhow::{Context, Result};
use std::path::Path;

use logbook_core::interchange::{encode_daily_metrics, DailyMetricsEntry, DailyMetricsFile};
use logbook_core::store::Store;

use crate::config::Config;
use crate::db;

/// Build the daily-metrics file from every cached daily entry, by date.
pub async fn export_daily_metrics(store: &dyn Store) -> Result<DailyMetricsFile> {
    let mut entries = Vec::new();
    for cached in store.list_daily(None, None).await? {
        let record = cached.record()?;
        entries.push(DailyMetricsEntry::from_record(cached.date, &record));
    }
    Ok(DailyMetricsFile::new(entries))
}

/// If `output` is `None`, falls back to `[interchange].daily_metrics`, and
/// then to stdout.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = db::open_store(config).await?;
    let file = export_daily_metrics(&store).await;
    store.close().await;
    let file = file?;
    let json = encode_daily_metrics(&file)?;

    match output.or(config.interchange.daily_metrics.as_deref()) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} daily entries to {}",
                file.entries.len(),
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use logbook_core::cache::DailyCacheEntry;
    use logbook_core::interchange::decode_daily_metrics;
    use logbook_core::parse_daily;
    use logbook_core::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_export_orders_by_date() {
        let store = InMemoryStore::new();
        for (day, raw) in [(2, "## Quick Log\nWeight:: 243\n"), (1, "## Quick Log\nWeight:: 244\n")] {
            let date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
            let entry = DailyCacheEntry::build(date, &parse_daily(raw), raw, None).unwrap();
            store.put_daily(&entry).await.unwrap();
        }

        let file = export_daily_metrics(&store).await.unwrap();
        assert_eq!(file.version, 1);
        assert_eq!(file.entries.len(), 2);
        assert_eq!(file.entries[0].weight_lbs, Some(244.0));

        let json = encode_daily_metrics(&file).unwrap();
        let back = decode_daily_metrics(&json).unwrap();
        assert_eq!(back.entries[1].date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }
}
