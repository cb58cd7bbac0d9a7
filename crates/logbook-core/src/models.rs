//! Typed records produced by the assemblers and consumed by the serializer.
//!
//! Every list preserves source order. Optional scalars are `None` when not
//! entered; a zero is never used as a stand-in for "absent".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Distance unit of a training activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    #[serde(alias = "m", alias = "meter")]
    Meters,
    #[serde(alias = "km", alias = "kilometer")]
    Kilometers,
    #[serde(alias = "mi", alias = "mile")]
    Miles,
}

impl DistanceUnit {
    /// Suffix used in training notation (`750m`, `20km`, `3.1mi`).
    pub fn suffix(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }

    pub fn from_suffix(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "m" => Some(DistanceUnit::Meters),
            "km" => Some(DistanceUnit::Kilometers),
            "mi" => Some(DistanceUnit::Miles),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "meters",
            DistanceUnit::Kilometers => "kilometers",
            DistanceUnit::Miles => "miles",
        }
    }
}

/// Kind of training activity.
///
/// Only swim, bike and run have a field name in the training section.
/// Other types arrive through interchange files and keep their name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    Swim,
    Bike,
    Run,
    Other(String),
}

impl ActivityType {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "swim" | "swimming" => ActivityType::Swim,
            "bike" | "cycle" | "cycling" | "ride" => ActivityType::Bike,
            "run" | "running" => ActivityType::Run,
            other => ActivityType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Swim => "swim",
            ActivityType::Bike => "bike",
            ActivityType::Run => "run",
            ActivityType::Other(name) => name,
        }
    }

    /// Field name used in the training section (`Swim::`).
    pub fn field_name(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Conventional unit for a bare distance of this type.
    ///
    /// Unrecognized types fall back to meters with no further signal.
    pub fn default_unit(&self) -> DistanceUnit {
        match self {
            ActivityType::Swim => DistanceUnit::Meters,
            ActivityType::Run => DistanceUnit::Miles,
            ActivityType::Bike => DistanceUnit::Kilometers,
            ActivityType::Other(_) => DistanceUnit::Meters,
        }
    }
}

impl From<String> for ActivityType {
    fn from(s: String) -> Self {
        ActivityType::from_name(&s)
    }
}

impl From<ActivityType> for String {
    fn from(t: ActivityType) -> Self {
        t.as_str().to_string()
    }
}

/// One cardio session from the training section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingActivity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub distance: Option<f64>,
    pub unit: DistanceUnit,
    pub duration_minutes: Option<f64>,
    pub avg_hr: Option<u32>,
}

/// One `SETS x REPS @ WEIGHT` line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthEntry {
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
}

impl StrengthEntry {
    /// Total load moved: sets × reps × weight.
    pub fn volume(&self) -> f64 {
        f64::from(self.sets) * f64::from(self.reps) * self.weight
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitItem {
    /// Stable slug derived from the name (`Cold shower` → `cold_shower`).
    pub id: String,
    pub name: String,
    pub done: bool,
}

/// The seven quick-log scalars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickLog {
    pub weight: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: Option<f64>,
    pub mood_am: Option<f64>,
    pub mood_pm: Option<f64>,
    pub energy: Option<f64>,
    pub focus: Option<f64>,
}

impl QuickLog {
    pub fn is_empty(&self) -> bool {
        self == &QuickLog::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub time: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub entries: Vec<FoodEntry>,
}

impl Nutrition {
    pub fn is_empty(&self) -> bool {
        self.calories.is_none() && self.protein_g.is_none() && self.entries.is_empty()
    }
}

/// Everything recorded for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub planned_workout: Option<String>,
    pub briefing: Option<String>,
    pub todos: Vec<TodoItem>,
    pub habits: Vec<HabitItem>,
    pub quick_log: QuickLog,
    pub training: Vec<TrainingActivity>,
    pub strength: Vec<StrengthEntry>,
    pub nutrition: Nutrition,
    pub top_three: Vec<String>,
}

impl DailyRecord {
    /// Fraction of todos checked off, `None` when there are no todos.
    pub fn todo_completion_rate(&self) -> Option<f64> {
        completion_rate(self.todos.iter().map(|t| t.done))
    }

    pub fn habit_completion_rate(&self) -> Option<f64> {
        completion_rate(self.habits.iter().map(|h| h.done))
    }

    /// Sum of training durations, `None` when no activity has a duration.
    pub fn training_minutes(&self) -> Option<f64> {
        let durations: Vec<f64> = self
            .training
            .iter()
            .filter_map(|a| a.duration_minutes)
            .collect();
        if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum())
        }
    }

    pub fn strength_volume(&self) -> Option<f64> {
        if self.strength.is_empty() {
            None
        } else {
            Some(self.strength.iter().map(StrengthEntry::volume).sum())
        }
    }
}

fn completion_rate(flags: impl Iterator<Item = bool>) -> Option<f64> {
    let (done, total) = flags.fold((0usize, 0usize), |(d, t), f| (d + usize::from(f), t + 1));
    if total == 0 {
        None
    } else {
        Some(done as f64 / total as f64)
    }
}

/// One row of a protocol's weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDay {
    pub day: String,
    pub workout_type: String,
    pub workout: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardioTarget {
    pub activity: String,
    pub target: String,
}

/// A weekly training protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolRecord {
    pub week_of: Option<NaiveDate>,
    pub title: Option<String>,
    pub week: Option<String>,
    pub phase: Option<String>,
    pub focus: Option<String>,
    /// Ratio in `0..=1`.
    pub target_compliance: Option<f64>,
    pub schedule: Vec<ScheduledDay>,
    pub training_goals: Vec<String>,
    pub cardio_targets: Vec<CardioTarget>,
    pub strength_targets: Vec<String>,
    pub rationale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_aliases() {
        assert_eq!(ActivityType::from_name("Cycling"), ActivityType::Bike);
        assert_eq!(ActivityType::from_name("RUN"), ActivityType::Run);
        assert_eq!(
            ActivityType::from_name("Rowing"),
            ActivityType::Other("rowing".to_string())
        );
    }

    #[test]
    fn test_default_units() {
        assert_eq!(ActivityType::Swim.default_unit(), DistanceUnit::Meters);
        assert_eq!(ActivityType::Run.default_unit(), DistanceUnit::Miles);
        assert_eq!(ActivityType::Bike.default_unit(), DistanceUnit::Kilometers);
        assert_eq!(
            ActivityType::Other("rowing".into()).default_unit(),
            DistanceUnit::Meters
        );
    }

    #[test]
    fn test_field_name() {
        assert_eq!(ActivityType::Swim.field_name(), "Swim");
        assert_eq!(ActivityType::Other("rowing".into()).field_name(), "Rowing");
    }

    #[test]
    fn test_completion_rates() {
        let record = DailyRecord {
            todos: vec![
                TodoItem { text: "A".into(), done: true },
                TodoItem { text: "B".into(), done: false },
            ],
            ..Default::default()
        };
        assert_eq!(record.todo_completion_rate(), Some(0.5));
        assert_eq!(record.habit_completion_rate(), None);
    }

    #[test]
    fn test_strength_volume() {
        let entry = StrengthEntry {
            exercise: "Dumbbell bench press".into(),
            sets: 3,
            reps: 10,
            weight: 60.0,
        };
        assert_eq!(entry.volume(), 1800.0);
    }

    #[test]
    fn test_activity_type_serde_as_string() {
        let json = serde_json::to_string(&ActivityType::Bike).unwrap();
        assert_eq!(json, "\"bike\"");
        let back: ActivityType = serde_json::from_str("\"Ride\"").unwrap();
        assert_eq!(back, ActivityType::Bike);
    }
}
