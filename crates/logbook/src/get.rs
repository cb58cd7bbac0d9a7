//! Daily entry lookup by date.
//!
//! Reads the cached snapshot and metric points for one day. Used by the
//! `lb get` command.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Serialize;

use logbook_core::cache::date_key;
use logbook_core::metrics::MetricPoint;
use logbook_core::models::DailyRecord;
use logbook_core::serialize::{format_number, serialize_daily};
use logbook_core::store::Store;

use crate::config::Config;
use crate::db;

#[derive(Debug, Clone, Serialize)]
pub struct DailyResponse {
    pub date: String,
    pub source_path: Option<String>,
    pub content_hash: String,
    pub updated_at: String,
    pub record: DailyRecord,
    pub metrics: Vec<MetricPoint>,
}

/// Fetch a day from any store. Errors when the day has no daily entry.
pub async fn get_daily(store: &dyn Store, date: NaiveDate) -> Result<DailyResponse> {
    let Some(entry) = store.get_daily(date).await? else {
        bail!("no daily entry for {}", date_key(date));
    };
    let record = entry.record()?;
    let metrics = store.metrics_for_date(date).await?;

    Ok(DailyResponse {
        date: entry.key(),
        source_path: entry.source_path,
        content_hash: entry.content_hash,
        updated_at: format_ts_iso(entry.updated_at),
        record,
        metrics,
    })
}

pub async fn run_get(config: &Config, date: NaiveDate, format: &str) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = get_daily(&store, date).await;
    store.close().await;
    let day = result?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&day)?),
        "text" => print_text(&day),
        other => bail!("Unknown format: '{}'. Must be text or json.", other),
    }
    Ok(())
}

fn print_text(day: &DailyResponse) {
    println!("--- Daily ---");
    println!("date:         {}", day.date);
    println!(
        "title:        {}",
        day.record.title.as_deref().unwrap_or("(untitled)")
    );
    if let Some(ref path) = day.source_path {
        println!("source:       {}", path);
    }
    println!("content_hash: {}", day.content_hash);
    println!("updated_at:   {}", day.updated_at);
    println!();

    println!("--- Metrics ({}) ---", day.metrics.len());
    for point in &day.metrics {
        println!(
            "{:<20} {:>10}  ({})",
            point.field.as_str(),
            format_number(point.value),
            point.source
        );
    }
    println!();

    println!("--- Document ---");
    print!("{}", serialize_daily(&day.record));
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbook_core::cache::DailyCacheEntry;
    use logbook_core::parse_daily;
    use logbook_core::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_get_missing_day_errors() {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let err = get_daily(&store, date).await.unwrap_err();
        assert!(err.to_string().contains("2025-01-01"));
    }

    #[tokio::test]
    async fn test_get_returns_snapshot_and_metrics() {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let raw = "## Quick Log\nWeight:: 244\n";
        let record = parse_daily(raw);
        store
            .put_daily(&DailyCacheEntry::build(date, &record, raw, None).unwrap())
            .await
            .unwrap();

        let day = get_daily(&store, date).await.unwrap();
        assert_eq!(day.date, "2025-01-15");
        assert_eq!(day.record, record);
        assert!(day.metrics.is_empty());

        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["record"]["quick_log"]["weight"], 244.0);
    }
}
