//! Line-level list and table grammars used inside section bodies.
//!
//! - checkbox: `- [ ] text`, `- [x] text`, `- [X] text`
//! - numbered: `N. text`
//! - bullet: `- text` / `* text`
//! - pipe table: header row, a separator row of dashes/colons (discarded),
//!   then data rows. Leading and trailing pipes are optional.

use once_cell::sync::Lazy;
use regex::Regex;

static CHECKBOX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*] \[([ xX])\]\s+(.*\S)\s*$").unwrap());

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+(.*\S)\s*$").unwrap());

static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*+]\s+(.*\S)\s*$").unwrap());

/// A `- [x] text` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkbox {
    pub done: bool,
    pub text: String,
}

pub fn parse_checkbox(line: &str) -> Option<Checkbox> {
    let caps = CHECKBOX.captures(line.trim())?;
    Some(Checkbox {
        done: &caps[1] != " ",
        text: caps[2].trim().to_string(),
    })
}

/// Every checkbox item in `text`, in order. Other lines are skipped.
pub fn checkboxes(text: &str) -> Vec<Checkbox> {
    text.lines().filter_map(parse_checkbox).collect()
}

pub fn parse_numbered(line: &str) -> Option<(u32, String)> {
    let caps = NUMBERED.captures(line.trim())?;
    let n = caps[1].parse().ok()?;
    Some((n, caps[2].trim().to_string()))
}

/// Text of every `N. text` line, in source order (numbers are not re-sorted).
pub fn numbered_items(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(parse_numbered)
        .map(|(_, item)| item)
        .collect()
}

pub fn parse_bullet(line: &str) -> Option<String> {
    let caps = BULLET.captures(line.trim())?;
    Some(caps[1].trim().to_string())
}

pub fn bullet_items(text: &str) -> Vec<String> {
    text.lines().filter_map(parse_bullet).collect()
}

/// A markdown pipe table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of the header column named `name` (case-insensitive).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }
}

/// Parse the first pipe table in `text`.
///
/// Lines without a `|` end the table once it has started.
pub fn parse_table(text: &str) -> Option<Table> {
    let mut table: Option<Table> = None;
    for line in text.lines() {
        let line = line.trim();
        if !line.contains('|') {
            if table.is_some() {
                break;
            }
            continue;
        }
        let cells = split_row(line);
        match table.as_mut() {
            None => {
                table = Some(Table {
                    header: cells,
                    rows: Vec::new(),
                })
            }
            Some(t) => {
                if is_separator_row(line) {
                    continue;
                }
                t.rows.push(cells);
            }
        }
    }
    table
}

fn split_row(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

fn is_separator_row(line: &str) -> bool {
    line.chars().any(|c| c == '-')
        && line
            .chars()
            .all(|c| matches!(c, '-' | ':' | '|' | ' ' | '\t'))
}

/// Render a pipe table with leading and trailing pipes.
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    let sep: Vec<&str> = header.iter().map(|_| "---").collect();
    out.push_str(&format!("| {} |", sep.join(" | ")));
    for row in rows {
        out.push('\n');
        out.push_str(&format!("| {} |", row.join(" | ")));
    }
    out
}
