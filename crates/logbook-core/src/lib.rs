//! # Logbook Core
//!
//! Pure parsing, serialization, and storage abstractions for Logbook's
//! plain-text daily log and weekly protocol documents.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Parsing and
//! serialization are synchronous and stateless; the [`store::Store`] trait
//! is async so that SQLite and in-memory backends share one interface.
//!
//! ## Pipeline
//!
//! ```text
//! raw text ──▶ frontmatter + sections ──▶ fields ──▶ normalize ──▶ DailyRecord
//!                                                                    │
//! canonical text ◀──────────────── serialize ◀───────────────────────┘
//! ```
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`fields`] | `Name:: value` inline field tokenizer |
//! | [`frontmatter`] | `---` delimited header block extractor |
//! | [`normalize`] | Clock, quality, training and strength value normalizers |
//! | [`sections`] | `## Section` splitter |
//! | [`blocks`] | Checkbox, numbered, bullet and pipe-table line grammars |
//! | [`daily`] | Daily Record assembler |
//! | [`protocol`] | Protocol Record assembler |
//! | [`serialize`] | Canonical text rendering |
//! | [`fingerprint`] | SHA-256 content fingerprints |
//! | [`cache`] | Cache entry types and pure upsert decisions |
//! | [`metrics`] | Metric identifiers and derivation from records |
//! | [`interchange`] | Daily-metrics and wearable-metrics JSON files |
//! | [`store`] | Storage trait and in-memory backend |

pub mod blocks;
pub mod cache;
pub mod daily;
pub mod fields;
pub mod fingerprint;
pub mod frontmatter;
pub mod interchange;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod protocol;
pub mod sections;
pub mod serialize;
pub mod store;

pub use daily::parse_daily;
pub use models::{DailyRecord, ProtocolRecord};
pub use protocol::parse_protocol;
pub use serialize::{serialize_daily, serialize_protocol};
