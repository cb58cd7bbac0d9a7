//! Vault ingestion.
//!
//! `sync` walks the vault and upserts every daily document through the
//! fingerprint-gated [`Cache`]; `rebuild` re-derives the whole daily and
//! metric cache in one atomic swap.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use logbook_core::cache::DailyUpsert;
use logbook_core::parse_protocol;

use crate::cache::{Cache, DailySource, RebuildSummary};
use crate::config::Config;
use crate::db;
use crate::vault::{self, DocumentKind, VaultDocument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub scanned: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub protocols: usize,
    pub undated: usize,
}

fn daily_source(doc: &VaultDocument) -> Option<DailySource> {
    match doc.kind {
        DocumentKind::Daily { date } => Some(DailySource {
            date,
            raw: doc.raw.clone(),
            path: Some(doc.relative.clone()),
        }),
        _ => None,
    }
}

/// Upsert every daily document; protocol documents are parsed and counted.
pub async fn sync_documents(cache: &Cache, docs: &[VaultDocument]) -> Result<SyncSummary> {
    let mut summary = SyncSummary {
        scanned: docs.len(),
        ..Default::default()
    };

    for doc in docs {
        match &doc.kind {
            DocumentKind::Daily { date } => {
                let source = DailySource {
                    date: *date,
                    raw: doc.raw.clone(),
                    path: Some(doc.relative.clone()),
                };
                let record = source.record();
                let outcome = cache
                    .upsert_daily(source.date, &record, &source.raw, source.path.as_deref())
                    .await?;
                match outcome {
                    DailyUpsert::Inserted => summary.inserted += 1,
                    DailyUpsert::Updated => summary.updated += 1,
                    DailyUpsert::Unchanged => summary.unchanged += 1,
                }
            }
            DocumentKind::Protocol { week_of } => {
                let protocol = parse_protocol(&doc.raw);
                info!(
                    path = %doc.relative,
                    week_of = ?week_of,
                    schedule_days = protocol.schedule.len(),
                    "protocol document"
                );
                summary.protocols += 1;
            }
            DocumentKind::Undated => {
                warn!(path = %doc.relative, "no date in header block or file name; skipped");
                summary.undated += 1;
            }
        }
    }

    Ok(summary)
}

pub async fn rebuild_documents(cache: &Cache, docs: &[VaultDocument]) -> Result<RebuildSummary> {
    let sources: Vec<DailySource> = docs.iter().filter_map(daily_source).collect();
    cache.rebuild(&sources).await
}

pub async fn run_sync(config: &Config, full: bool) -> Result<()> {
    if full {
        return run_rebuild(config).await;
    }

    let store = Arc::new(db::open_store(config).await?);
    let cache = Cache::new(store.clone());
    let docs = vault::scan_vault(config)?;
    let summary = sync_documents(&cache, &docs).await?;

    println!("sync vault");
    println!("  scanned: {} documents", summary.scanned);
    println!("  inserted: {}", summary.inserted);
    println!("  updated: {}", summary.updated);
    println!("  unchanged: {}", summary.unchanged);
    println!("  protocols: {}", summary.protocols);
    if summary.undated > 0 {
        println!("  undated (skipped): {}", summary.undated);
    }
    println!("ok");

    store.close().await;
    Ok(())
}

pub async fn run_rebuild(config: &Config) -> Result<()> {
    let store = Arc::new(db::open_store(config).await?);
    let cache = Cache::new(store.clone());
    let docs = vault::scan_vault(config)?;
    let summary = rebuild_documents(&cache, &docs).await?;

    println!("rebuild vault");
    println!("  scanned: {} documents", docs.len());
    println!("  daily entries: {}", summary.daily);
    println!("  metric points: {}", summary.metrics);
    println!("ok");

    store.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use logbook_core::store::memory::InMemoryStore;
    use std::path::PathBuf;

    fn doc(relative: &str, raw: &str) -> VaultDocument {
        let path = PathBuf::from(relative);
        VaultDocument {
            kind: vault::classify(raw, &path),
            path,
            relative: relative.to_string(),
            raw: raw.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sync_counts_outcomes() {
        let cache = Cache::new(Arc::new(InMemoryStore::new()));
        let docs = vec![
            doc("2025-01-01.md", "## Quick Log\nWeight:: 244\n"),
            doc("2025-01-02.md", "## Quick Log\nWeight:: 243\n"),
            doc("week-03.md", "---\ntype: protocol\nweek_of: 2025-01-13\n---\n"),
            doc("ideas.md", "random"),
        ];
        let first = sync_documents(&cache, &docs).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.protocols, 1);
        assert_eq!(first.undated, 1);

        let mut edited = docs.clone();
        edited[1] = doc("2025-01-02.md", "## Quick Log\nWeight:: 242\n");
        let second = sync_documents(&cache, &edited).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 1);
        assert_eq!(second.unchanged, 1);
    }

    #[tokio::test]
    async fn test_stem_date_lands_in_snapshot() {
        let cache = Cache::new(Arc::new(InMemoryStore::new()));
        sync_documents(&cache, &[doc("2025-03-04.md", "## Briefing\nhello")])
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let entry = cache.store().get_daily(date).await.unwrap().unwrap();
        assert_eq!(entry.record().unwrap().date, Some(date));
        assert_eq!(entry.source_path.as_deref(), Some("2025-03-04.md"));
    }

    #[tokio::test]
    async fn test_rebuild_skips_non_daily() {
        let cache = Cache::new(Arc::new(InMemoryStore::new()));
        let docs = vec![
            doc("2025-01-01.md", "## Quick Log\nEnergy:: 6\n"),
            doc("week.md", "---\nweek_of: 2025-01-13\n---\n"),
        ];
        let summary = rebuild_documents(&cache, &docs).await.unwrap();
        assert_eq!(summary.daily, 1);
        assert_eq!(summary.metrics, 1);
    }
}
