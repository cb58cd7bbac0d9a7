//! # Logbook
//!
//! A local-first cache and command-line tool for a plain-text daily log
//! vault. Daily and protocol documents stay the source of truth; Logbook
//! parses them into typed records, keeps a fingerprint-gated SQLite cache
//! of the derived data, and moves metrics in and out through JSON
//! interchange files.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │    Vault    │──▶│ logbook-core │──▶│    Cache     │
//! │  *.md docs  │   │ parse/render │   │ write gate   │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!                     ┌───────────────────────┤
//!                     ▼                       ▼
//!               ┌───────────┐          ┌─────────────┐
//!               │  SQLite   │          │ JSON files  │
//!               │  (sqlx)   │          │ interchange │
//!               └───────────┘          └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lb init                       # create database
//! lb sync                       # ingest changed daily documents
//! lb get 2025-01-15 --format json
//! lb metric set 2025-01-15 hrv 48
//! lb export daily-metrics --out ./data/daily_metrics.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite-backed `Store` |
//! | [`cache`] | Serialized writes, PR updates, atomic rebuild |
//! | [`vault`] | Document discovery and classification |
//! | [`ingest`] | `sync` and `rebuild` |
//! | [`get`] | Daily entry lookup |
//! | [`metric`] | Manual metric entry |
//! | [`workout`] | Workout logging and personal records |
//! | [`import`] | Interchange file import |
//! | [`export`] | Interchange file export |
//! | [`fmt`] | Canonical re-formatting |

pub mod cache;
pub mod config;
pub mod db;
pub mod export;
pub mod fmt;
pub mod get;
pub mod import;
pub mod ingest;
pub mod logging;
pub mod metric;
pub mod migrate;
pub mod sqlite_store;
pub mod vault;
pub mod workout;
