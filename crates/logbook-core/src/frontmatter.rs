//! Header-block (frontmatter) extractor.
//!
//! A header block exists only when the very first line of the document is
//! `---` and a second `---` line appears later. Lines between the two
//! delimiters are `key: value` pairs split on the first colon.
//!
//! Values come in four shapes, interpreted per key:
//!
//! | Shape | Example | Result |
//! |-------|---------|--------|
//! | quoted string | `"Base week 3"` | `Base week 3` |
//! | calendar date | `2025-01-15` | [`NaiveDate`] (UTC calendar day) |
//! | inline array | `[ "a", b ]` | `["a", "b"]` |
//! | percentage / ratio | `"85%"`, `85`, `0.85` | `0.85` |
//!
//! Unknown keys are ignored. A missing or unterminated block yields an empty
//! [`Frontmatter`], never an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The header-block delimiter line.
pub const DELIMITER: &str = "---";

/// Typed header-block fields shared by daily and protocol documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub tags: Vec<String>,
    /// Document kind from the `type` key (e.g. `protocol`).
    pub kind: Option<String>,
    pub week_of: Option<NaiveDate>,
    pub week: Option<String>,
    pub phase: Option<String>,
    pub focus: Option<String>,
    pub target_compliance: Option<f64>,
}

impl Frontmatter {
    pub fn is_protocol(&self) -> bool {
        self.week_of.is_some()
            || self
                .kind
                .as_deref()
                .is_some_and(|k| k.eq_ignore_ascii_case("protocol"))
    }
}

/// Locate the header block.
///
/// Returns the zero-based line index of the closing delimiter, or `None`
/// when the document has no header block.
pub fn closing_delimiter(doc: &str) -> Option<usize> {
    let mut lines = doc.lines();
    if !lines.next().is_some_and(is_delimiter) {
        return None;
    }
    lines.position(is_delimiter).map(|pos| pos + 1)
}

/// A delimiter line is exactly `---`; only a CRLF's `\r` is tolerated.
fn is_delimiter(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == DELIMITER
}

/// Raw `(key, value)` pairs of the header block, in source order.
pub fn raw_entries(doc: &str) -> Vec<(String, String)> {
    let Some(end) = closing_delimiter(doc) else {
        return Vec::new();
    };
    doc.lines()
        .take(end)
        .skip(1)
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Extract the typed header block from a document.
pub fn extract(doc: &str) -> Frontmatter {
    let mut fm = Frontmatter::default();
    for (key, raw) in raw_entries(doc) {
        match key.to_ascii_lowercase().as_str() {
            "date" => fm.date = parse_date(&raw),
            "title" => fm.title = non_empty(unquote(&raw)),
            "tags" => fm.tags = parse_inline_array(&raw),
            "type" => fm.kind = non_empty(unquote(&raw)),
            "week_of" | "week_start" => fm.week_of = parse_date(&raw),
            "week" => fm.week = non_empty(unquote(&raw)),
            "phase" => fm.phase = non_empty(unquote(&raw)),
            "focus" => fm.focus = non_empty(unquote(&raw)),
            "target_compliance" | "compliance" => fm.target_compliance = parse_ratio(&raw),
            _ => {}
        }
    }
    fm
}

/// Strip one layer of matching single or double quotes.
pub fn unquote(raw: &str) -> String {
    let s = raw.trim();
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return s[1..s.len() - 1].to_string();
        }
    }
    s.to_string()
}

/// Parse a `yyyy-MM-dd` date, optionally quoted.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(unquote(raw).trim(), "%Y-%m-%d").ok()
}

/// Parse `[a, "b", 'c']` into its unquoted, non-empty elements.
///
/// A value without brackets is treated as a single-element list.
pub fn parse_inline_array(raw: &str) -> Vec<String> {
    let s = raw.trim();
    let inner = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(s);
    inner
        .split(',')
        .map(unquote)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Parse a percentage or ratio into `0..=1` form.
///
/// `"85%"` → 0.85. A bare number above 1 is taken as a percentage; a number
/// at or below 1 is already a ratio.
pub fn parse_ratio(raw: &str) -> Option<f64> {
    let s = unquote(raw);
    let s = s.trim();
    if let Some(pct) = s.strip_suffix('%') {
        return pct.trim().parse::<f64>().ok().map(|v| v / 100.0);
    }
    let v = s.parse::<f64>().ok()?;
    Some(if v > 1.0 { v / 100.0 } else { v })
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
