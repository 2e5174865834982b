use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Storage format for workout timestamps (local wall-clock time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A finished training session.
///
/// `total_volume` is denormalized: it is computed once by the caller when the
/// workout is created and is never recomputed from the log entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub total_volume: f64,
    /// Name of the routine the workout followed, if any.
    pub session_name: Option<String>,
    pub duration_minutes: i64,
}

impl Workout {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Reads a stored routine name. Blank text and the literal `None` mean the
/// workout followed no routine; surrounding whitespace is dropped.
pub fn session_name(text: &str) -> Option<String> {
    match text.trim() {
        "" | "None" => None,
        name => Some(name.to_string()),
    }
}

/// Input for creating a workout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateWorkoutInput {
    pub total_volume: f64,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub duration_minutes: i64,
}

impl CreateWorkoutInput {
    /// Same input with `session_name` in the form every backend reads back.
    pub fn normalized(self) -> Self {
        Self {
            session_name: self.session_name.as_deref().and_then(session_name),
            ..self
        }
    }
}

/// One recorded set within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub order: i64,
    pub weight: f64,
    pub reps: i64,
}

/// Input for logging a set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSetInput {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub weight: f64,
    pub reps: i64,
    pub order: i64,
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a stored timestamp. A bare date reads as midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Parses the calendar-date portion (text before the first space).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.trim().split(' ').next()?;
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}
