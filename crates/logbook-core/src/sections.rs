//! Section splitter.
//!
//! Partitions the document body into named blocks introduced by `## Name`
//! lines. The header block is skipped. Body text that appears before the
//! first section marker belongs to no section and is discarded.
//!
//! Section bodies are kept verbatim (blank lines included) and joined with
//! `\n`; assemblers trim them as needed.

use crate::frontmatter;

/// Marker that starts a section line.
pub const SECTION_MARKER: &str = "## ";

/// Named section bodies in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    sections: Vec<(String, String)>,
}

impl SectionMap {
    /// Body of the section called `name` (case-insensitive).
    ///
    /// When a name repeats, the last section wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, body)| body.as_str())
    }

    /// First section matching any of `names`, tried in order.
    pub fn get_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|n| self.get(n))
    }

    /// Section names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().map(|(n, b)| (n.as_str(), b.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[derive(Clone, Copy)]
enum State {
    Header { closes_at: usize },
    Body,
}

/// Split a document into its named sections.
pub fn split_sections(doc: &str) -> SectionMap {
    let mut state = match frontmatter::closing_delimiter(doc) {
        Some(closes_at) => State::Header { closes_at },
        None => State::Body,
    };

    let mut map = SectionMap::default();
    let mut current: Option<String> = None;
    let mut buf: Vec<&str> = Vec::new();

    for (idx, line) in doc.lines().enumerate() {
        if let State::Header { closes_at } = state {
            if idx == closes_at {
                state = State::Body;
            }
            continue;
        }

        if let Some(name) = line.strip_prefix(SECTION_MARKER) {
            if let Some(prev) = current.take() {
                map.sections.push((prev, buf.join("\n")));
            }
            buf.clear();
            current = Some(name.trim().to_string());
        } else if current.is_some() {
            buf.push(line);
        }
    }

    if let Some(prev) = current {
        map.sections.push((prev, buf.join("\n")));
    }
    map
}
