//! Vault discovery and document classification.
//!
//! Walks `[vault].root`, applies include/exclude globs, and sorts every
//! matching file into a daily document, a protocol document, or neither.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use logbook_core::frontmatter;

use crate::config::Config;

/// What a vault file holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Daily { date: NaiveDate },
    Protocol { week_of: Option<NaiveDate> },
    /// A daily-looking document with no resolvable date.
    Undated,
}

#[derive(Debug, Clone)]
pub struct VaultDocument {
    pub path: PathBuf,
    /// Path relative to the vault root, `/`-separated.
    pub relative: String,
    pub raw: String,
    pub kind: DocumentKind,
}

/// Classify a document by its header block, falling back to a
/// `yyyy-MM-dd` file stem for the date of a daily document.
pub fn classify(raw: &str, path: &Path) -> DocumentKind {
    let fm = frontmatter::extract(raw);
    if fm.is_protocol() {
        return DocumentKind::Protocol {
            week_of: fm.week_of,
        };
    }
    match fm.date.or_else(|| date_from_stem(path)) {
        Some(date) => DocumentKind::Daily { date },
        None => DocumentKind::Undated,
    }
}

pub fn date_from_stem(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem.trim(), "%Y-%m-%d").ok()
}

/// Read a single file and classify it.
pub fn load_document(path: &Path, relative: &str) -> Result<VaultDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let kind = classify(&raw, path);
    Ok(VaultDocument {
        path: path.to_path_buf(),
        relative: relative.to_string(),
        raw,
        kind,
    })
}

/// Every matching document under the vault root, sorted by relative path.
pub fn scan_vault(config: &Config) -> Result<Vec<VaultDocument>> {
    let vault = &config.vault;
    let root = &vault.root;
    if !root.exists() {
        bail!("Vault root does not exist: {}", root.display());
    }

    let include_set = build_globset(&vault.include_globs)?;

    let mut excludes = vec!["**/.git/**".to_string(), "**/.obsidian/**".to_string()];
    excludes.extend(vault.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut docs = Vec::new();
    for entry in WalkDir::new(root).follow_links(vault.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match load_document(path, &rel_str) {
            Ok(doc) => {
                debug!(path = %rel_str, kind = ?doc.kind, "discovered document");
                docs.push(doc);
            }
            // Non-UTF-8 files are skipped rather than failing the scan.
            Err(e) => warn!(path = %rel_str, error = %e, "skipping unreadable file"),
        }
    }

    docs.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(docs)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
