//! Manual metric entry and per-day metric listing.

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;

use logbook_core::cache::date_key;
use logbook_core::metrics::{MetricField, MetricPoint, MetricSource};
use logbook_core::serialize::format_number;
use logbook_core::store::Store;

use crate::cache::Cache;
use crate::config::Config;
use crate::db;

/// Record a hand-entered value. The last write for a day and field wins.
pub async fn set_metric(
    cache: &Cache,
    date: NaiveDate,
    field: MetricField,
    value: f64,
) -> Result<MetricPoint> {
    if !value.is_finite() {
        bail!("metric value must be a finite number");
    }
    let point = MetricPoint::new(date, field, value, MetricSource::Manual);
    cache.upsert_metric(&point).await?;
    Ok(point)
}

pub async fn run_set(config: &Config, date: NaiveDate, field: &str, value: f64) -> Result<()> {
    let field: MetricField = field.parse()?;
    let store = Arc::new(db::open_store(config).await?);
    let cache = Cache::new(store.clone());
    let result = set_metric(&cache, date, field, value).await;
    store.close().await;
    let point = result?;

    println!(
        "set {} {} = {} ({})",
        date_key(point.date),
        point.field,
        format_number(point.value),
        point.source
    );
    Ok(())
}

pub async fn run_show(config: &Config, date: NaiveDate) -> Result<()> {
    let store = db::open_store(config).await?;
    let points = store.metrics_for_date(date).await;
    store.close().await;
    let points = points?;

    println!("metrics {} ({})", date_key(date), points.len());
    for point in &points {
        println!(
            "  {:<20} {:>10}  ({})",
            point.field.as_str(),
            format_number(point.value),
            point.source
        );
    }
    Ok(())
}
