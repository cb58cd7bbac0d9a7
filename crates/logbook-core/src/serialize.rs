//! Canonical serializer.
//!
//! The inverse of the assemblers: a record renders to exactly one text form,
//! which the parsers read back without loss.
//!
//! # Formatting rules
//!
//! - Numbers use the shortest decimal that reproduces the value
//!   (`244.0` → `244`, `7.25` → `7.25`).
//! - Fractional hours render as `H:MM`; fractional minutes as `MM:SS`
//!   (seconds rounded).
//! - Daily sections are emitted in a fixed order: header block, planned
//!   workout, briefing, todos, habits, quick log, training output, strength
//!   log, fuel log, top three. A section with no content is omitted.
//!
//! The cache compares fingerprints of document text, so this ordering and
//! the omission rule are part of its contract.

use crate::blocks::render_table;
use crate::daily::{
    BRIEFING, FIELD_AVG_HR, FIELD_CALORIES, FIELD_ENERGY, FIELD_FOCUS, FIELD_MOOD_AM,
    FIELD_MOOD_PM, FIELD_PROTEIN, FIELD_SLEEP, FIELD_SLEEP_QUALITY, FIELD_WEIGHT, FUEL_LOG,
    HABITS, PLANNED_WORKOUT, QUICK_LOG, STRENGTH_LOG, TODOS, TOP_THREE, TRAINING_OUTPUT,
};
use crate::frontmatter::DELIMITER;
use crate::models::{
    ActivityType, DailyRecord, Nutrition, ProtocolRecord, QuickLog, StrengthEntry,
    TrainingActivity,
};
use crate::protocol::{
    CARDIO_TARGETS, RATIONALE, SCHEDULE_COLUMNS, STRENGTH_TARGETS, TRAINING_GOALS,
    WEEKLY_SCHEDULE,
};
use crate::normalize::{clock_to_minutes, duration_from_clock, quality_score};
use crate::sections::SECTION_MARKER;

/// Shortest decimal rendering that parses back to the same value.
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Fractional hours as `H:MM`.
pub fn format_hours_clock(hours: f64) -> String {
    let total = (hours * 60.0).round() as i64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Fractional minutes as `MM:SS`.
pub fn format_minutes_clock(minutes: f64) -> String {
    let total = (minutes * 60.0).round() as i64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Sleep duration text. The `H:MM` clock is used when it reads back to the
/// same hours; other values keep their decimal form.
pub fn sleep_text(hours: f64) -> String {
    let clock = format_hours_clock(hours);
    if duration_from_clock(&clock) == Some(hours) {
        clock
    } else {
        format_number(hours)
    }
}

/// Training duration text, `MM:SS` when that reads back exactly.
pub fn duration_text(minutes: f64) -> String {
    let clock = format_minutes_clock(minutes);
    if clock_to_minutes(&clock) == Some(minutes) {
        clock
    } else {
        format_number(minutes)
    }
}

/// Sleep quality text. Scores above 10 only arise from the 100-point scale,
/// so they are written back on that scale.
pub fn quality_text(score: f64) -> String {
    if score <= 10.0 {
        return format_number(score);
    }
    let scaled = score * 10.0;
    let bits = scaled.to_bits();
    [scaled, f64::from_bits(bits + 1), f64::from_bits(bits - 1)]
        .into_iter()
        .find(|s| quality_score(*s) == score)
        .map(format_number)
        .unwrap_or_else(|| format_number(scaled))
}

/// Incrementally assembled document: header lines plus ordered sections.
#[derive(Default)]
struct DocumentWriter {
    header: Vec<String>,
    blocks: Vec<String>,
}

impl DocumentWriter {
    fn header(&mut self, key: &str, value: impl Into<String>) {
        self.header.push(format!("{}: {}", key, value.into()));
    }

    fn section(&mut self, name: &str, body: &str) {
        if body.trim().is_empty() {
            return;
        }
        self.blocks
            .push(format!("{}{}\n{}", SECTION_MARKER, name, body.trim_end()));
    }

    fn finish(self) -> String {
        let mut parts = Vec::with_capacity(self.blocks.len() + 1);
        if !self.header.is_empty() {
            parts.push(format!(
                "{}\n{}\n{}",
                DELIMITER,
                self.header.join("\n"),
                DELIMITER
            ));
        }
        parts.extend(self.blocks);
        if parts.is_empty() {
            return String::new();
        }
        let mut out = parts.join("\n\n");
        out.push('\n');
        out
    }
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s)
}

fn field_line(name: &str, value: &str) -> String {
    format!("{}:: {}", name, value)
}

/// Render a Daily Record to canonical text.
pub fn serialize_daily(record: &DailyRecord) -> String {
    let mut w = DocumentWriter::default();

    if let Some(date) = record.date {
        w.header("date", date.format("%Y-%m-%d").to_string());
    }
    if let Some(title) = &record.title {
        w.header("title", quoted(title));
    }
    if !record.tags.is_empty() {
        w.header("tags", format!("[{}]", record.tags.join(", ")));
    }

    w.section(
        PLANNED_WORKOUT,
        record.planned_workout.as_deref().unwrap_or_default(),
    );
    w.section(BRIEFING, record.briefing.as_deref().unwrap_or_default());

    let todos: Vec<String> = record
        .todos
        .iter()
        .map(|t| checkbox_line(t.done, &t.text))
        .collect();
    w.section(TODOS, &todos.join("\n"));

    let habits: Vec<String> = record
        .habits
        .iter()
        .map(|h| checkbox_line(h.done, &h.name))
        .collect();
    w.section(HABITS, &habits.join("\n"));

    w.section(QUICK_LOG, &quick_log_body(&record.quick_log));
    w.section(TRAINING_OUTPUT, &training_body(&record.training));

    let strength: Vec<String> = record.strength.iter().map(strength_line).collect();
    w.section(STRENGTH_LOG, &strength.join("\n"));

    w.section(FUEL_LOG, &fuel_body(&record.nutrition));

    let top: Vec<String> = record
        .top_three
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect();
    w.section(TOP_THREE, &top.join("\n"));

    w.finish()
}

fn checkbox_line(done: bool, text: &str) -> String {
    format!("- [{}] {}", if done { "x" } else { " " }, text)
}

fn quick_log_body(q: &QuickLog) -> String {
    let rows = [
        (FIELD_WEIGHT, q.weight.map(format_number)),
        (FIELD_SLEEP, q.sleep_hours.map(sleep_text)),
        (FIELD_SLEEP_QUALITY, q.sleep_quality.map(quality_text)),
        (FIELD_MOOD_AM, q.mood_am.map(format_number)),
        (FIELD_MOOD_PM, q.mood_pm.map(format_number)),
        (FIELD_ENERGY, q.energy.map(format_number)),
        (FIELD_FOCUS, q.focus.map(format_number)),
    ];
    rows.iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| field_line(name, v)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Training notation for one activity, `None` when it has neither distance
/// nor duration.
pub fn training_value(activity: &TrainingActivity) -> Option<String> {
    let distance = activity
        .distance
        .map(|d| format!("{}{}", format_number(d), activity.unit.suffix()));
    let duration = activity.duration_minutes.map(duration_text);
    match (distance, duration) {
        (Some(d), Some(t)) => Some(format!("{}/{}", d, t)),
        (None, Some(t)) => Some(t),
        (Some(d), None) => Some(d),
        (None, None) => None,
    }
}

fn training_body(activities: &[TrainingActivity]) -> String {
    // Only field-named activity types can be read back.
    let emitted: Vec<(&TrainingActivity, String)> = activities
        .iter()
        .filter(|a| !matches!(a.activity_type, ActivityType::Other(_)))
        .filter_map(|a| training_value(a).map(|v| (a, v)))
        .collect();

    let mut lines: Vec<String> = emitted
        .iter()
        .map(|(a, v)| field_line(&a.activity_type.field_name(), v))
        .collect();

    let first_hr = emitted.first().and_then(|(a, _)| a.avg_hr);
    let shared = first_hr.filter(|hr| emitted.iter().all(|(a, _)| a.avg_hr == Some(*hr)));
    match shared {
        Some(hr) => lines.push(field_line(FIELD_AVG_HR, &hr.to_string())),
        None => {
            for (a, _) in &emitted {
                if let Some(hr) = a.avg_hr {
                    let name = format!("{}_HR", a.activity_type.field_name());
                    lines.push(field_line(&name, &hr.to_string()));
                }
            }
        }
    }
    lines.join("\n")
}

fn strength_line(entry: &StrengthEntry) -> String {
    field_line(
        &entry.exercise,
        &format!(
            "{}x{} @ {} lbs",
            entry.sets,
            entry.reps,
            format_number(entry.weight)
        ),
    )
}

fn fuel_body(n: &Nutrition) -> String {
    let mut lines = Vec::new();
    if let Some(cal) = n.calories {
        lines.push(field_line(FIELD_CALORIES, &format_number(cal)));
    }
    if let Some(protein) = n.protein_g {
        lines.push(field_line(FIELD_PROTEIN, &format!("{}g", format_number(protein))));
    }
    for entry in &n.entries {
        match &entry.time {
            Some(time) => lines.push(format!("{} - {}", time, entry.description)),
            None => lines.push(format!("- {}", entry.description)),
        }
    }
    lines.join("\n")
}

/// Render a Protocol Record to canonical text.
pub fn serialize_protocol(record: &ProtocolRecord) -> String {
    let mut w = DocumentWriter::default();

    w.header("type", "protocol");
    if let Some(week_of) = record.week_of {
        w.header("week_of", week_of.format("%Y-%m-%d").to_string());
    }
    if let Some(title) = &record.title {
        w.header("title", quoted(title));
    }
    if let Some(week) = &record.week {
        w.header("week", quoted(week));
    }
    if let Some(phase) = &record.phase {
        w.header("phase", quoted(phase));
    }
    if let Some(focus) = &record.focus {
        w.header("focus", quoted(focus));
    }
    if let Some(ratio) = record.target_compliance {
        let pct = (ratio * 100.0 * 10_000.0).round() / 10_000.0;
        w.header("target_compliance", quoted(&format!("{}%", format_number(pct))));
    }

    let rows: Vec<Vec<String>> = record
        .schedule
        .iter()
        .map(|d| vec![d.day.clone(), d.workout_type.clone(), d.workout.clone()])
        .collect();
    if !rows.is_empty() {
        w.section(WEEKLY_SCHEDULE, &render_table(&SCHEDULE_COLUMNS, &rows));
    }

    w.section(TRAINING_GOALS, &bullets(&record.training_goals));
    let cardio: Vec<String> = record
        .cardio_targets
        .iter()
        .map(|t| field_line(&t.activity, &t.target))
        .collect();
    w.section(CARDIO_TARGETS, &cardio.join("\n"));
    w.section(STRENGTH_TARGETS, &bullets(&record.strength_targets));
    w.section(RATIONALE, record.rationale.as_deref().unwrap_or_default());

    w.finish()
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}
