//! Protocol Record assembler.
//!
//! A protocol document describes one training week. Its header block
//! carries `week_of`, `title`, `week`, `phase`, `focus` and
//! `target_compliance`; the body carries the schedule table and target
//! lists.

use crate::blocks::{self, Table};
use crate::daily::free_text;
use crate::fields::{field_key, FieldMap};
use crate::frontmatter::{self, Frontmatter};
use crate::models::{CardioTarget, ProtocolRecord, ScheduledDay};
use crate::sections::{split_sections, SectionMap};

pub const WEEKLY_SCHEDULE: &str = "Weekly Schedule";
pub const TRAINING_GOALS: &str = "Training Goals";
pub const CARDIO_TARGETS: &str = "Cardio Targets";
pub const STRENGTH_TARGETS: &str = "Strength Targets";
pub const RATIONALE: &str = "Rationale";
pub const FOCUS: &str = "Focus";

pub const SCHEDULE_COLUMNS: [&str; 3] = ["Day", "Type", "Workout"];

const SCHEDULE_ALIASES: &[&str] = &[WEEKLY_SCHEDULE, "Schedule"];
const GOAL_ALIASES: &[&str] = &[TRAINING_GOALS, "Goals"];

pub fn parse_protocol(doc: &str) -> ProtocolRecord {
    let fm = frontmatter::extract(doc);
    let sections = split_sections(doc);
    assemble_protocol(&fm, &sections)
}

pub fn assemble_protocol(fm: &Frontmatter, sections: &SectionMap) -> ProtocolRecord {
    ProtocolRecord {
        week_of: fm.week_of,
        title: fm.title.clone(),
        week: fm.week.clone(),
        phase: fm.phase.clone(),
        focus: fm
            .focus
            .clone()
            .or_else(|| sections.get(FOCUS).and_then(free_text)),
        target_compliance: fm.target_compliance,
        schedule: sections
            .get_any(SCHEDULE_ALIASES)
            .and_then(blocks::parse_table)
            .map(|t| schedule_from_table(&t))
            .unwrap_or_default(),
        training_goals: sections
            .get_any(GOAL_ALIASES)
            .map(list_items)
            .unwrap_or_default(),
        cardio_targets: sections
            .get(CARDIO_TARGETS)
            .map(parse_cardio_targets)
            .unwrap_or_default(),
        strength_targets: sections
            .get(STRENGTH_TARGETS)
            .map(list_items)
            .unwrap_or_default(),
        rationale: sections.get(RATIONALE).and_then(free_text),
    }
}

/// Rows of the schedule table. Columns are located by header name, falling
/// back to position when a header is missing.
fn schedule_from_table(table: &Table) -> Vec<ScheduledDay> {
    let day = table.column("Day").unwrap_or(0);
    let kind = table
        .column("Type")
        .or_else(|| table.column("Workout Type"))
        .unwrap_or(1);
    let workout = table
        .column("Workout")
        .or_else(|| table.column("Session"))
        .or_else(|| table.column("Details"))
        .unwrap_or(2);

    let cell = |row: &[String], idx: usize| row.get(idx).cloned().unwrap_or_default();
    table
        .rows
        .iter()
        .filter(|row| !cell(row.as_slice(), day).is_empty())
        .map(|row| ScheduledDay {
            day: cell(row.as_slice(), day),
            workout_type: cell(row.as_slice(), kind),
            workout: cell(row.as_slice(), workout),
        })
        .collect()
}

/// Bullet items, or numbered items when the section has no bullets.
fn list_items(body: &str) -> Vec<String> {
    let bullets = blocks::bullet_items(body);
    if bullets.is_empty() {
        blocks::numbered_items(body)
    } else {
        bullets
    }
}

/// `Activity:: target` lines in source order; a repeated activity keeps its
/// last value at its last position.
fn parse_cardio_targets(body: &str) -> Vec<CardioTarget> {
    let mut targets: Vec<CardioTarget> = Vec::new();
    for field in FieldMap::parse(body).iter() {
        if field.value.is_empty() {
            continue;
        }
        let key = field_key(&field.name);
        targets.retain(|t| field_key(&t.activity) != key);
        targets.push(CardioTarget {
            activity: field.name.clone(),
            target: field.value.clone(),
        });
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "---
type: protocol
week_of: 2025-01-13
title: \"Base Build\"
week: \"Week 3\"
phase: Base
focus: Aerobic volume
target_compliance: 85%
---

## Weekly Schedule
| Day | Type | Workout |
|-----|------|---------|
| Mon | Swim | 2000m technique |
| Tue | Strength | Upper body A |
| Wed | Run | 5mi easy |
| Thu | Rest | |
| Fri | Bike | 40km tempo |
| Sat | Run | Long run 8mi |
| Sun | Rest | Walk |

## Training Goals
- Hold Z2 on all easy days
- Three strength sessions

## Cardio Targets
Swim:: 6000m/week
Run:: 20mi/week
Swim:: 6500m/week

## Strength Targets
- Bench 3x8 @ 185

## Rationale
Volume before intensity.

Recovery looks good.
";

    #[test]
    fn test_header() {
        let p = parse_protocol(SAMPLE);
        assert_eq!(p.week_of, NaiveDate::from_ymd_opt(2025, 1, 13));
        assert_eq!(p.title.as_deref(), Some("Base Build"));
        assert_eq!(p.week.as_deref(), Some("Week 3"));
        assert_eq!(p.phase.as_deref(), Some("Base"));
        assert_eq!(p.focus.as_deref(), Some("Aerobic volume"));
        assert!((p.target_compliance.unwrap() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_schedule_table() {
        let p = parse_protocol(SAMPLE);
        assert_eq!(p.schedule.len(), 7);
        assert_eq!(p.schedule[0].day, "Mon");
        assert_eq!(p.schedule[0].workout_type, "Swim");
        assert_eq!(p.schedule[0].workout, "2000m technique");
        assert_eq!(p.schedule[3].workout, "");
    }

    #[test]
    fn test_lists_and_targets() {
        let p = parse_protocol(SAMPLE);
        assert_eq!(p.training_goals.len(), 2);
        assert_eq!(p.strength_targets, vec!["Bench 3x8 @ 185"]);
        assert_eq!(p.cardio_targets.len(), 2);
        assert_eq!(p.cardio_targets[0].activity, "Run");
        assert_eq!(p.cardio_targets[1].target, "6500m/week");
    }

    #[test]
    fn test_rationale_multi_paragraph() {
        let p = parse_protocol(SAMPLE);
        assert_eq!(
            p.rationale.as_deref(),
            Some("Volume before intensity.\n\nRecovery looks good.")
        );
    }

    #[test]
    fn test_focus_falls_back_to_section() {
        let p = parse_protocol("## Focus\nSleep and mobility\n");
        assert_eq!(p.focus.as_deref(), Some("Sleep and mobility"));
    }

    #[test]
    fn test_numbered_goals() {
        let p = parse_protocol("## Goals\n1. First\n2. Second");
        assert_eq!(p.training_goals, vec!["First", "Second"]);
    }
}
