//! Value normalizers.
//!
//! Pure functions turning raw field text into numbers. None of them fail;
//! text that does not fit the notation yields `None`.
//!
//! | Function | Accepts | Produces |
//! |----------|---------|----------|
//! | [`duration_from_clock`] | `H:MM`, `7.5` | fractional hours |
//! | [`quality_score`] | any number | 1–10 scale (values > 10 divided by 10) |
//! | [`parse_training_value`] | `750m/33:39`, `33:39`, `45`, `5km` | distance / unit / minutes |
//! | [`parse_strength`] | `3x10 @ 60 lbs` | sets, reps, weight |

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DistanceUnit, StrengthEntry};

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?(?:\d+(?:\.\d*)?|\.\d+))\s*[A-Za-z%]*$").unwrap());

static DISTANCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?|\.\d+)\s*(km|mi|m)?$").unwrap());

static BARE_MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(?:min|mins|minutes)?$").unwrap());

static CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):([0-5]?\d)(?::([0-5]?\d(?:\.\d+)?))?$").unwrap());

static STRENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+)\s*[x×]\s*(\d+)\s*@\s*(\d+(?:\.\d+)?|\.\d+)\s*(?:lbs?)?$").unwrap()
});

/// Parse a plain number, tolerating a trailing unit word (`244 lbs`, `180g`).
pub fn parse_number(raw: &str) -> Option<f64> {
    let caps = NUMBER.captures(raw.trim())?;
    caps[1].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse `H:MM` or a bare decimal into fractional hours.
///
/// Empty input and anything that evaluates to zero are `None`: zero sleep
/// means "not entered", not "slept zero hours".
pub fn duration_from_clock(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let hours = match s.split_once(':') {
        Some((h, m)) => {
            let h: f64 = h.trim().parse().ok()?;
            let m: f64 = m.trim().parse().ok()?;
            if !(0.0..60.0).contains(&m) {
                return None;
            }
            h + m / 60.0
        }
        None => parse_number(s)?,
    };
    if hours <= 0.0 {
        None
    } else {
        Some(hours)
    }
}

/// Coerce a score onto the 1–10 scale.
///
/// Values above 10 are assumed to be on a 0–100 scale. Nothing else is
/// clamped.
pub fn quality_score(value: f64) -> f64 {
    if value > 10.0 {
        value / 10.0
    } else {
        value
    }
}

pub fn parse_quality(raw: &str) -> Option<f64> {
    parse_number(raw).map(quality_score)
}

/// Parse `MM:SS` (or `H:MM:SS`) into fractional minutes.
pub fn clock_to_minutes(raw: &str) -> Option<f64> {
    let caps = CLOCK.captures(raw.trim())?;
    let a: f64 = caps[1].parse().ok()?;
    let b: f64 = caps[2].parse().ok()?;
    match caps.get(3) {
        Some(c) => {
            let c: f64 = c.as_str().parse().ok()?;
            Some(a * 60.0 + b + c / 60.0)
        }
        None => Some(a + b / 60.0),
    }
}

/// Result of parsing training notation.
///
/// `unit` is `None` when the distance carried no suffix. The daily
/// assembler resolves it from the activity type.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrainingValue {
    pub distance: Option<f64>,
    pub unit: Option<DistanceUnit>,
    pub duration_minutes: Option<f64>,
}

/// Parse training notation.
///
/// Accepted forms:
///
/// - `DISTANCE[UNIT]/DURATION` — `750m/33:39`, `3.1/28:00`, `20km/45`
/// - `MM:SS` — duration only
/// - a bare number — minutes
/// - `DISTANCE UNIT` — distance only (`5km`); the unit is required here
///   since a bare number already means minutes
pub fn parse_training_value(raw: &str) -> Option<TrainingValue> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some((dist, dur)) = s.split_once('/') {
        let (distance, unit) = parse_distance(dist)?;
        let duration = parse_duration_minutes(dur)?;
        return Some(TrainingValue {
            distance: Some(distance),
            unit,
            duration_minutes: Some(duration),
        });
    }

    if let Some(minutes) = parse_duration_minutes(s) {
        return Some(TrainingValue {
            duration_minutes: Some(minutes),
            ..Default::default()
        });
    }

    match parse_distance(s)? {
        (distance, Some(unit)) => Some(TrainingValue {
            distance: Some(distance),
            unit: Some(unit),
            duration_minutes: None,
        }),
        (_, None) => None,
    }
}

fn parse_distance(raw: &str) -> Option<(f64, Option<DistanceUnit>)> {
    let caps = DISTANCE.captures(raw.trim())?;
    let distance: f64 = caps[1].parse().ok()?;
    let unit = caps.get(2).and_then(|u| DistanceUnit::from_suffix(u.as_str()));
    Some((distance, unit))
}

fn parse_duration_minutes(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.contains(':') {
        return clock_to_minutes(s);
    }
    let caps = BARE_MINUTES.captures(s)?;
    caps[1].parse().ok()
}

/// Parse `SETS x REPS @ WEIGHT [lbs]` for the named exercise.
///
/// All three numbers are required; partial entries are rejected.
pub fn parse_strength(exercise: &str, raw: &str) -> Option<StrengthEntry> {
    let exercise = exercise.trim();
    if exercise.is_empty() {
        return None;
    }
    let caps = STRENGTH.captures(raw.trim())?;
    Some(StrengthEntry {
        exercise: exercise.to_string(),
        sets: caps[1].parse().ok()?,
        reps: caps[2].parse().ok()?,
        weight: caps[3].parse().ok()?,
    })
}

/// Turn a display name into a stable identifier.
///
/// Lowercases and maps spaces and hyphens to underscores.
pub fn slugify(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
