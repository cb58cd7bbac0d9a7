//! JSON interchange files shared with the mobile client and wearable sync.
//!
//! Two shapes are supported:
//!
//! - **daily-metrics**: `{version, entries: [...]}` with one entry per day
//!   summarizing the quick log, training, checklist rates and nutrition.
//! - **wearable-metrics**: `{version, entries: [...]}` with sleep stages,
//!   HRV, body battery, training readiness, stress, resting heart rate and
//!   an activity list.
//!
//! Decoding is strict. A structurally invalid file is an error; there is no
//! partial recovery. Dates are `yyyy-MM-dd`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricField, MetricPoint, MetricSource, PointSink};
use crate::models::{ActivityType, DailyRecord, DistanceUnit, TrainingActivity};

/// Format version written by [`DailyMetricsFile::new`].
pub const DAILY_METRICS_VERSION: u32 = 1;

// ============ daily-metrics ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricsFile {
    pub version: u32,
    pub entries: Vec<DailyMetricsEntry>,
}

impl DailyMetricsFile {
    pub fn new(entries: Vec<DailyMetricsEntry>) -> Self {
        Self {
            version: DAILY_METRICS_VERSION,
            entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricsEntry {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_lbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<MoodSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training: Option<TrainingSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todos: Option<CompletionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habits: Option<CompletionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedtime: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    #[serde(default)]
    pub activities: Vec<ActivitySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_unit: Option<DistanceUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_hr: Option<f64>,
}

impl ActivitySummary {
    fn from_activity(a: &TrainingActivity) -> Self {
        Self {
            activity_type: a.activity_type.as_str().to_string(),
            distance: a.distance,
            distance_unit: a.distance.map(|_| a.unit),
            duration_minutes: a.duration_minutes,
            avg_hr: a.avg_hr.map(f64::from),
        }
    }

    /// Convert to a training activity, resolving a missing unit from the
    /// activity type.
    pub fn to_activity(&self) -> TrainingActivity {
        let activity_type = ActivityType::from_name(&self.activity_type);
        let unit = self
            .distance_unit
            .unwrap_or_else(|| activity_type.default_unit());
        TrainingActivity {
            activity_type,
            distance: self.distance,
            unit,
            duration_minutes: self.duration_minutes,
            avg_hr: self.avg_hr.and_then(heart_rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
}

impl DailyMetricsEntry {
    /// Summarize a Daily Record. Empty groups are left out.
    pub fn from_record(date: NaiveDate, record: &DailyRecord) -> Self {
        let q = &record.quick_log;
        let sleep = (q.sleep_hours.is_some() || q.sleep_quality.is_some()).then(|| SleepSummary {
            hours: q.sleep_hours,
            quality: q.sleep_quality,
        });
        let mood = (q.mood_am.is_some() || q.mood_pm.is_some()).then(|| MoodSummary {
            morning: q.mood_am,
            bedtime: q.mood_pm,
        });
        let training = (!record.training.is_empty()).then(|| TrainingSummary {
            activities: record
                .training
                .iter()
                .map(ActivitySummary::from_activity)
                .collect(),
        });
        let n = &record.nutrition;
        let nutrition = (n.calories.is_some() || n.protein_g.is_some()).then(|| NutritionSummary {
            calories: n.calories,
            protein_g: n.protein_g,
        });

        Self {
            date,
            sleep,
            weight_lbs: q.weight,
            mood,
            energy: q.energy,
            focus: q.focus,
            training,
            todos: record
                .todo_completion_rate()
                .map(|completion_rate| CompletionSummary { completion_rate }),
            habits: record
                .habit_completion_rate()
                .map(|completion_rate| CompletionSummary { completion_rate }),
            nutrition,
        }
    }

    pub fn activities(&self) -> Vec<TrainingActivity> {
        self.training
            .as_ref()
            .map(|t| t.activities.iter().map(ActivitySummary::to_activity).collect())
            .unwrap_or_default()
    }

    /// Metric points carried by this entry, tagged `parsed`.
    pub fn metric_points(&self) -> Vec<MetricPoint> {
        let mut sink = PointSink::new(self.date, MetricSource::Parsed);
        sink.add(MetricField::Weight, self.weight_lbs);
        if let Some(sleep) = &self.sleep {
            sink.add(MetricField::SleepHours, sleep.hours);
            sink.add(MetricField::SleepQuality, sleep.quality);
        }
        if let Some(mood) = &self.mood {
            sink.add(MetricField::MoodAm, mood.morning);
            sink.add(MetricField::MoodPm, mood.bedtime);
        }
        sink.add(MetricField::Energy, self.energy);
        sink.add(MetricField::Focus, self.focus);
        sink.add(
            MetricField::TodoCompletion,
            self.todos.as_ref().map(|t| t.completion_rate),
        );
        sink.add(
            MetricField::HabitCompletion,
            self.habits.as_ref().map(|h| h.completion_rate),
        );
        if let Some(n) = &self.nutrition {
            sink.add(MetricField::Calories, n.calories);
            sink.add(MetricField::ProteinG, n.protein_g);
        }
        sink.add(
            MetricField::TrainingMinutes,
            total_minutes(self.activities().iter().filter_map(|a| a.duration_minutes)),
        );
        sink.finish()
    }
}

pub fn decode_daily_metrics(json: &str) -> Result<DailyMetricsFile> {
    serde_json::from_str(json).context("Invalid daily-metrics file")
}

pub fn encode_daily_metrics(file: &DailyMetricsFile) -> Result<String> {
    serde_json::to_string_pretty(file).context("Failed to encode daily-metrics file")
}

// ============ wearable-metrics ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableMetricsFile {
    pub version: u32,
    pub entries: Vec<WearableEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub sleep: Option<WearableSleep>,
    #[serde(default)]
    pub hrv: Option<Hrv>,
    #[serde(default)]
    pub body_battery: Option<BodyBattery>,
    #[serde(default)]
    pub training_readiness: Option<TrainingReadiness>,
    #[serde(default)]
    pub stress: Option<Stress>,
    #[serde(default)]
    pub resting_hr: Option<f64>,
    #[serde(default)]
    pub activities: Vec<WearableActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableSleep {
    #[serde(default)]
    pub total_hours: Option<f64>,
    #[serde(default)]
    pub deep_hours: Option<f64>,
    #[serde(default)]
    pub rem_hours: Option<f64>,
    #[serde(default)]
    pub light_hours: Option<f64>,
    #[serde(default)]
    pub awake_hours: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hrv {
    #[serde(default)]
    pub last_night_avg: Option<f64>,
    #[serde(default)]
    pub weekly_avg: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyBattery {
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub charged: Option<f64>,
    #[serde(default)]
    pub drained: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReadiness {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stress {
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableActivity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub distance_unit: Option<DistanceUnit>,
    #[serde(default)]
    pub avg_hr: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
}

impl WearableEntry {
    /// Metric points carried by this entry, tagged `wearable`.
    pub fn metric_points(&self) -> Vec<MetricPoint> {
        let mut sink = PointSink::new(self.date, MetricSource::Wearable);
        if let Some(s) = &self.sleep {
            sink.add(MetricField::SleepHours, s.total_hours);
            sink.add(MetricField::DeepSleepHours, s.deep_hours);
            sink.add(MetricField::RemSleepHours, s.rem_hours);
            sink.add(MetricField::SleepScore, s.score);
        }
        sink.add(
            MetricField::Hrv,
            self.hrv.as_ref().and_then(|h| h.last_night_avg),
        );
        if let Some(b) = &self.body_battery {
            sink.add(MetricField::BodyBatteryHigh, b.high);
            sink.add(MetricField::BodyBatteryLow, b.low);
        }
        sink.add(
            MetricField::TrainingReadiness,
            self.training_readiness.as_ref().and_then(|r| r.score),
        );
        sink.add(MetricField::StressAvg, self.stress.as_ref().and_then(|s| s.avg));
        sink.add(MetricField::RestingHr, self.resting_hr);
        sink.add(
            MetricField::TrainingMinutes,
            total_minutes(self.activities.iter().filter_map(|a| a.duration_minutes)),
        );
        sink.finish()
    }
}

pub fn decode_wearable_metrics(json: &str) -> Result<WearableMetricsFile> {
    serde_json::from_str(json).context("Invalid wearable-metrics file")
}

fn total_minutes(durations: impl Iterator<Item = f64>) -> Option<f64> {
    durations.fold(None, |acc, d| Some(acc.unwrap_or(0.0) + d))
}

fn heart_rate(v: f64) -> Option<u32> {
    (v.is_finite() && v > 0.0).then(|| v.round() as u32)
}
