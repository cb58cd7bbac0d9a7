//! Daily Record assembler.
//!
//! Pulls each named section through the matching grammar and normalizer.
//! Malformed lines are skipped; assembling never fails.
//!
//! | Section | Grammar | Record field |
//! |---------|---------|--------------|
//! | `Planned Workout` | free text | `planned_workout` |
//! | `Briefing` | free text | `briefing` |
//! | `Today's Todos` | checkboxes | `todos` |
//! | `Habits` | checkboxes | `habits` |
//! | `Quick Log` | inline fields | `quick_log` |
//! | `Training Output` | inline fields + training notation | `training` |
//! | `Strength Log` | inline fields + strength notation | `strength` |
//! | `Fuel Log` | totals + food lines | `nutrition` |
//! | `Top 3 for Tomorrow` | numbered list | `top_three` |

use once_cell::sync::Lazy;
use regex::Regex;

use crate::blocks;
use crate::fields::{parse_field, FieldMap};
use crate::frontmatter::{self, Frontmatter};
use crate::models::{
    ActivityType, DailyRecord, FoodEntry, HabitItem, Nutrition, QuickLog, StrengthEntry,
    TodoItem, TrainingActivity,
};
use crate::normalize::{
    duration_from_clock, parse_number, parse_quality, parse_strength, parse_training_value,
    slugify,
};
use crate::sections::{split_sections, SectionMap};

pub const PLANNED_WORKOUT: &str = "Planned Workout";
pub const BRIEFING: &str = "Briefing";
pub const TODOS: &str = "Today's Todos";
pub const HABITS: &str = "Habits";
pub const QUICK_LOG: &str = "Quick Log";
pub const TRAINING_OUTPUT: &str = "Training Output";
pub const STRENGTH_LOG: &str = "Strength Log";
pub const FUEL_LOG: &str = "Fuel Log";
pub const TOP_THREE: &str = "Top 3 for Tomorrow";

const TODO_ALIASES: &[&str] = &[TODOS, "Todos", "Todo"];
const TOP_THREE_ALIASES: &[&str] = &[TOP_THREE, "Top Three for Tomorrow", "Tomorrow's Top 3"];

pub const FIELD_WEIGHT: &str = "Weight";
pub const FIELD_SLEEP: &str = "Sleep";
pub const FIELD_SLEEP_QUALITY: &str = "Sleep_Quality";
pub const FIELD_MOOD_AM: &str = "Mood_AM";
pub const FIELD_MOOD_PM: &str = "Mood_PM";
pub const FIELD_ENERGY: &str = "Energy";
pub const FIELD_FOCUS: &str = "Focus";
pub const FIELD_AVG_HR: &str = "Avg_HR";
pub const FIELD_CALORIES: &str = "Calories";
pub const FIELD_PROTEIN: &str = "Protein";

/// Words that mark a free-form fuel-log line as food.
///
/// Part of the food-line heuristic; see [`is_food_like`].
const FOOD_KEYWORDS: &[&str] = &[
    "egg", "oat", "chicken", "beef", "turkey", "fish", "salmon", "tuna", "rice", "bread",
    "toast", "pasta", "potato", "salad", "shake", "protein", "yogurt", "cheese", "milk",
    "banana", "apple", "berries", "fruit", "nuts", "peanut", "almond", "avocado", "coffee",
    "bar", "smoothie", "soup", "sandwich", "wrap", "burrito", "pizza", "steak", "tofu",
    "beans", "veggies", "vegetables", "snack", "breakfast", "lunch", "dinner", "cal", "kcal",
];

static TIMED_FOOD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-*]\s+)?(\d{1,2}(?::\d{2})?\s*(?:[aApP][mM])?)\s+[-–—]\s+(.*\S)\s*$")
        .unwrap()
});

/// Parse a full daily document.
pub fn parse_daily(doc: &str) -> DailyRecord {
    let fm = frontmatter::extract(doc);
    let sections = split_sections(doc);
    assemble_daily(&fm, &sections)
}

/// Assemble a record from an already-split document.
pub fn assemble_daily(fm: &Frontmatter, sections: &SectionMap) -> DailyRecord {
    DailyRecord {
        date: fm.date,
        title: fm.title.clone(),
        tags: fm.tags.clone(),
        planned_workout: sections.get(PLANNED_WORKOUT).and_then(free_text),
        briefing: sections.get(BRIEFING).and_then(free_text),
        todos: sections
            .get_any(TODO_ALIASES)
            .map(parse_todos)
            .unwrap_or_default(),
        habits: sections.get(HABITS).map(parse_habits).unwrap_or_default(),
        quick_log: sections.get(QUICK_LOG).map(parse_quick_log).unwrap_or_default(),
        training: sections
            .get(TRAINING_OUTPUT)
            .map(parse_training)
            .unwrap_or_default(),
        strength: sections
            .get(STRENGTH_LOG)
            .map(parse_strength_log)
            .unwrap_or_default(),
        nutrition: sections.get(FUEL_LOG).map(parse_fuel_log).unwrap_or_default(),
        top_three: sections
            .get_any(TOP_THREE_ALIASES)
            .map(blocks::numbered_items)
            .unwrap_or_default(),
    }
}

/// Trimmed section text, `None` when blank.
pub fn free_text(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_todos(body: &str) -> Vec<TodoItem> {
    blocks::checkboxes(body)
        .into_iter()
        .map(|c| TodoItem {
            text: c.text,
            done: c.done,
        })
        .collect()
}

pub fn parse_habits(body: &str) -> Vec<HabitItem> {
    blocks::checkboxes(body)
        .into_iter()
        .map(|c| HabitItem {
            id: slugify(&c.text),
            name: c.text,
            done: c.done,
        })
        .collect()
}

pub fn parse_quick_log(body: &str) -> QuickLog {
    let fields = FieldMap::parse(body);
    let number = |name: &str| fields.get_non_empty(name).and_then(parse_number);
    QuickLog {
        weight: number(FIELD_WEIGHT),
        sleep_hours: fields.get(FIELD_SLEEP).and_then(duration_from_clock),
        sleep_quality: fields.get_non_empty(FIELD_SLEEP_QUALITY).and_then(parse_quality),
        mood_am: number(FIELD_MOOD_AM),
        mood_pm: number(FIELD_MOOD_PM),
        energy: number(FIELD_ENERGY),
        focus: number(FIELD_FOCUS),
    }
}

/// One activity per recognized activity field, in source order.
///
/// A repeated activity field replaces the earlier one and takes its later
/// position. `<Type>_HR` sets an activity's own heart rate; `Avg_HR` fills
/// every activity still without one.
pub fn parse_training(body: &str) -> Vec<TrainingActivity> {
    let fields = FieldMap::parse(body);
    let mut activities: Vec<TrainingActivity> = Vec::new();

    for field in fields.iter() {
        let activity_type = ActivityType::from_name(&field.name);
        if matches!(activity_type, ActivityType::Other(_)) {
            continue;
        }
        activities.retain(|a| a.activity_type != activity_type);
        let Some(value) = parse_training_value(&field.value) else {
            continue;
        };
        let own_hr = fields
            .get_non_empty(&format!("{}_HR", activity_type.field_name()))
            .and_then(parse_heart_rate);
        activities.push(TrainingActivity {
            // Bare distances take the activity's conventional unit.
            unit: value.unit.unwrap_or_else(|| activity_type.default_unit()),
            activity_type,
            distance: value.distance,
            duration_minutes: value.duration_minutes,
            avg_hr: own_hr,
        });
    }

    if let Some(shared) = fields.get_non_empty(FIELD_AVG_HR).and_then(parse_heart_rate) {
        for activity in activities.iter_mut().filter(|a| a.avg_hr.is_none()) {
            activity.avg_hr = Some(shared);
        }
    }
    activities
}

fn parse_heart_rate(raw: &str) -> Option<u32> {
    parse_number(raw)
        .filter(|bpm| *bpm > 0.0)
        .map(|bpm| bpm.round() as u32)
}

/// Every line tried independently; lines that are not complete strength
/// entries are skipped.
pub fn parse_strength_log(body: &str) -> Vec<StrengthEntry> {
    body.lines()
        .filter_map(parse_field)
        .filter_map(|f| {
            let entry = parse_strength(&f.name, &f.value);
            if entry.is_none() {
                tracing::trace!(exercise = %f.name, value = %f.value, "skipping strength line");
            }
            entry
        })
        .collect()
}

pub fn parse_fuel_log(body: &str) -> Nutrition {
    let fields = FieldMap::parse(body);
    let calories = fields
        .get_non_empty(FIELD_CALORIES)
        .and_then(|v| parse_number(&v.replace(',', "")));
    let protein_g = fields.get_non_empty(FIELD_PROTEIN).and_then(parse_number);

    let entries = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && parse_field(line).is_none())
        .filter_map(parse_food_line)
        .collect();

    Nutrition {
        calories,
        protein_g,
        entries,
    }
}

/// Classify one free-form fuel-log line.
///
/// A leading time token followed by a dash splits into time + description.
/// Anything else is kept only if [`is_food_like`] says so.
pub fn parse_food_line(line: &str) -> Option<FoodEntry> {
    if let Some(caps) = TIMED_FOOD_LINE.captures(line) {
        return Some(FoodEntry {
            time: Some(caps[1].trim().to_string()),
            description: caps[2].trim().to_string(),
        });
    }
    if !is_food_like(line) {
        return None;
    }
    let description = blocks::parse_bullet(line).unwrap_or_else(|| line.to_string());
    Some(FoodEntry {
        time: None,
        description,
    })
}

/// Food-line heuristic.
///
/// A line counts as food when it is a list bullet, contains a comma, or
/// contains one of [`FOOD_KEYWORDS`]. This is approximate and existing
/// documents depend on its exact behavior.
pub fn is_food_like(line: &str) -> bool {
    if blocks::parse_bullet(line).is_some() || line.contains(',') {
        return true;
    }
    let lower = line.to_lowercase();
    FOOD_KEYWORDS.iter().any(|kw| lower.contains(kw))
}
