//! Metric points and their identifiers.
//!
//! A [`MetricPoint`] is one `(date, field, value, source)` scalar. The metric
//! cache stores at most one point per `date|field` composite key; the last
//! write wins regardless of source.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::DailyRecord;

/// Identifier of a tracked metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Weight,
    SleepHours,
    SleepQuality,
    MoodAm,
    MoodPm,
    Energy,
    Focus,
    TodoCompletion,
    HabitCompletion,
    Calories,
    ProteinG,
    TrainingMinutes,
    StrengthVolume,
    Hrv,
    RestingHr,
    StressAvg,
    BodyBatteryHigh,
    BodyBatteryLow,
    TrainingReadiness,
    DeepSleepHours,
    RemSleepHours,
    SleepScore,
}

impl MetricField {
    pub const ALL: [MetricField; 22] = [
        MetricField::Weight,
        MetricField::SleepHours,
        MetricField::SleepQuality,
        MetricField::MoodAm,
        MetricField::MoodPm,
        MetricField::Energy,
        MetricField::Focus,
        MetricField::TodoCompletion,
        MetricField::HabitCompletion,
        MetricField::Calories,
        MetricField::ProteinG,
        MetricField::TrainingMinutes,
        MetricField::StrengthVolume,
        MetricField::Hrv,
        MetricField::RestingHr,
        MetricField::StressAvg,
        MetricField::BodyBatteryHigh,
        MetricField::BodyBatteryLow,
        MetricField::TrainingReadiness,
        MetricField::DeepSleepHours,
        MetricField::RemSleepHours,
        MetricField::SleepScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Weight => "weight",
            MetricField::SleepHours => "sleep_hours",
            MetricField::SleepQuality => "sleep_quality",
            MetricField::MoodAm => "mood_am",
            MetricField::MoodPm => "mood_pm",
            MetricField::Energy => "energy",
            MetricField::Focus => "focus",
            MetricField::TodoCompletion => "todo_completion",
            MetricField::HabitCompletion => "habit_completion",
            MetricField::Calories => "calories",
            MetricField::ProteinG => "protein_g",
            MetricField::TrainingMinutes => "training_minutes",
            MetricField::StrengthVolume => "strength_volume",
            MetricField::Hrv => "hrv",
            MetricField::RestingHr => "resting_hr",
            MetricField::StressAvg => "stress_avg",
            MetricField::BodyBatteryHigh => "body_battery_high",
            MetricField::BodyBatteryLow => "body_battery_low",
            MetricField::TrainingReadiness => "training_readiness",
            MetricField::DeepSleepHours => "deep_sleep_hours",
            MetricField::RemSleepHours => "rem_sleep_hours",
            MetricField::SleepScore => "sleep_score",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        MetricField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| anyhow!("Unknown metric field: '{}'", s))
    }
}

/// Where a metric value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    /// Entered by hand.
    Manual,
    /// Synced from a wearable device.
    Wearable,
    /// Derived from a parsed document.
    Parsed,
}

impl MetricSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricSource::Manual => "manual",
            MetricSource::Wearable => "wearable",
            MetricSource::Parsed => "parsed",
        }
    }
}

impl fmt::Display for MetricSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(MetricSource::Manual),
            "wearable" => Ok(MetricSource::Wearable),
            "parsed" => Ok(MetricSource::Parsed),
            other => Err(anyhow!("Unknown metric source: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub date: NaiveDate,
    pub field: MetricField,
    pub value: f64,
    pub source: MetricSource,
}

impl MetricPoint {
    pub fn new(date: NaiveDate, field: MetricField, value: f64, source: MetricSource) -> Self {
        Self {
            date,
            field,
            value,
            source,
        }
    }

    /// Composite cache key: `yyyy-MM-dd|field`.
    pub fn key(&self) -> String {
        metric_key(self.date, self.field)
    }
}

pub fn metric_key(date: NaiveDate, field: MetricField) -> String {
    format!("{}|{}", date.format("%Y-%m-%d"), field.as_str())
}

/// Collects present values into points, skipping absent ones.
pub(crate) struct PointSink {
    date: NaiveDate,
    source: MetricSource,
    points: Vec<MetricPoint>,
}

impl PointSink {
    pub(crate) fn new(date: NaiveDate, source: MetricSource) -> Self {
        Self {
            date,
            source,
            points: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, field: MetricField, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.points
                .push(MetricPoint::new(self.date, field, v, self.source));
        }
    }

    pub(crate) fn finish(self) -> Vec<MetricPoint> {
        self.points
    }
}

/// Metric points derived from a parsed Daily Record.
pub fn points_from_record(date: NaiveDate, record: &DailyRecord) -> Vec<MetricPoint> {
    let q = &record.quick_log;
    let mut sink = PointSink::new(date, MetricSource::Parsed);
    sink.add(MetricField::Weight, q.weight);
    sink.add(MetricField::SleepHours, q.sleep_hours);
    sink.add(MetricField::SleepQuality, q.sleep_quality);
    sink.add(MetricField::MoodAm, q.mood_am);
    sink.add(MetricField::MoodPm, q.mood_pm);
    sink.add(MetricField::Energy, q.energy);
    sink.add(MetricField::Focus, q.focus);
    sink.add(MetricField::TodoCompletion, record.todo_completion_rate());
    sink.add(MetricField::HabitCompletion, record.habit_completion_rate());
    sink.add(MetricField::Calories, record.nutrition.calories);
    sink.add(MetricField::ProteinG, record.nutrition.protein_g);
    sink.add(MetricField::TrainingMinutes, record.training_minutes());
    sink.add(MetricField::StrengthVolume, record.strength_volume());
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily::parse_daily;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in MetricField::ALL {
            assert_eq!(field.as_str().parse::<MetricField>().unwrap(), field);
        }
        assert!("steps".parse::<MetricField>().is_err());
        assert_eq!("Sleep_Hours".parse::<MetricField>().unwrap(), MetricField::SleepHours);
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&MetricField::BodyBatteryHigh).unwrap();
        assert_eq!(json, "\"body_battery_high\"");
    }

    #[test]
    fn test_composite_key() {
        let p = MetricPoint::new(day(), MetricField::Weight, 244.0, MetricSource::Manual);
        assert_eq!(p.key(), "2025-01-15|weight");
    }

    #[test]
    fn test_points_skip_absent_values() {
        let record = parse_daily("## Quick Log\nWeight:: 244\nSleep::\n## Today's Todos\n- [x] A\n- [ ] B");
        let points = points_from_record(day(), &record);
        let fields: Vec<MetricField> = points.iter().map(|p| p.field).collect();
        assert_eq!(fields, vec![MetricField::Weight, MetricField::TodoCompletion]);
        assert!(points.iter().all(|p| p.source == MetricSource::Parsed));
        assert_eq!(points[1].value, 0.5);
    }

    #[test]
    fn test_source_parse() {
        assert_eq!("Wearable".parse::<MetricSource>().unwrap(), MetricSource::Wearable);
        assert!("fitbit".parse::<MetricSource>().is_err());
    }
}
