//! Inline field tokenizer.
//!
//! Recognizes the `Name:: value` notation that can appear on any line of a
//! section body. Only the double-colon delimiter is meaningful; a line such
//! as `Time: 07:30` is ordinary text.
//!
//! # Grammar
//!
//! ```text
//! field := name "::" [ \t]* value
//! name  := [A-Za-z][A-Za-z0-9_ ]*
//! value := rest of line (may be empty)
//! ```
//!
//! Both name and value are trimmed. Tokenizing never fails: a line that does
//! not match simply yields `None`.

use once_cell::sync::Lazy;
use regex::Regex;

static FIELD_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_ ]*)::[ \t]*(.*)$").unwrap());

/// One `(name, value)` pair extracted from a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Tokenize a single line into a [`Field`].
///
/// ```rust
/// use logbook_core::fields::parse_field;
///
/// let f = parse_field("Sleep:: 6:35").unwrap();
/// assert_eq!(f.name, "Sleep");
/// assert_eq!(f.value, "6:35");
/// assert!(parse_field("Sleep: 6:35").is_none());
/// ```
pub fn parse_field(line: &str) -> Option<Field> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let caps = FIELD_LINE.captures(line)?;
    Some(Field {
        name: caps[1].trim().to_string(),
        value: caps[2].trim().to_string(),
    })
}

/// Fields of one section, in source order.
///
/// Lookups are last-occurrence-wins and compare names case-insensitively,
/// treating spaces and underscores as the same character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<Field>,
}

impl FieldMap {
    /// Tokenize every line of `text`.
    pub fn parse(text: &str) -> Self {
        Self {
            fields: text.lines().filter_map(parse_field).collect(),
        }
    }

    /// Value of the last field named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let wanted = field_key(name);
        self.fields
            .iter()
            .rev()
            .find(|f| field_key(&f.name) == wanted)
            .map(|f| f.value.as_str())
    }

    /// Like [`get`](Self::get) but treats an empty value as absent.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Canonical lookup key for a field name.
pub fn field_key(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_field() {
        let f = parse_field("Weight:: 244").unwrap();
        assert_eq!(f.name, "Weight");
        assert_eq!(f.value, "244");
    }

    #[test]
    fn test_name_with_spaces() {
        let f = parse_field("Dumbbell bench press:: 3x10 @ 60 lbs").unwrap();
        assert_eq!(f.name, "Dumbbell bench press");
        assert_eq!(f.value, "3x10 @ 60 lbs");
    }

    #[test]
    fn test_empty_value_matches() {
        let f = parse_field("Mood_PM::").unwrap();
        assert_eq!(f.name, "Mood_PM");
        assert_eq!(f.value, "");
    }

    #[test]
    fn test_tab_separator() {
        let f = parse_field("Energy::\t7").unwrap();
        assert_eq!(f.value, "7");
    }

    #[test]
    fn test_single_colon_never_matches() {
        assert!(parse_field("Time: 07:30").is_none());
        assert!(parse_field("Note: see 6:35").is_none());
    }

    #[test]
    fn test_rejects_bad_names() {
        assert!(parse_field("1st:: value").is_none());
        assert!(parse_field("- Sleep:: 7").is_none());
        assert!(parse_field(":: value").is_none());
        assert!(parse_field("").is_none());
        assert!(parse_field("   ").is_none());
    }

    #[test]
    fn test_value_keeps_inner_colons() {
        let f = parse_field("Swim:: 750m/33:39").unwrap();
        assert_eq!(f.value, "750m/33:39");
    }

    #[test]
    fn test_last_occurrence_wins() {
        let map = FieldMap::parse("Energy:: 5\nFocus:: 6\nEnergy:: 8");
        assert_eq!(map.get("Energy"), Some("8"));
        assert_eq!(map.get("Focus"), Some("6"));
    }

    #[test]
    fn test_lookup_ignores_case_and_separator() {
        let map = FieldMap::parse("sleep quality:: 7");
        assert_eq!(map.get("Sleep_Quality"), Some("7"));
        assert_eq!(map.get("SLEEP QUALITY"), Some("7"));
        assert!(map.get("Sleep").is_none());
    }

    #[test]
    fn test_get_non_empty() {
        let map = FieldMap::parse("Energy::\nFocus:: 4");
        assert_eq!(map.get("Energy"), Some(""));
        assert!(map.get_non_empty("Energy").is_none());
        assert_eq!(map.get_non_empty("Focus"), Some("4"));
    }
}
