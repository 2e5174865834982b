use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::Workout;

/// Most recent recorded set of an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPerformance {
    pub weight: f64,
    pub reps: i64,
    /// Calendar date of the workout the set belongs to.
    pub date: NaiveDate,
}

/// The latest workout with its sets joined to exercise names, for sharing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub workout_id: i64,
    pub timestamp: NaiveDateTime,
    pub total_volume: f64,
    pub sets: Vec<SummarySet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySet {
    pub exercise: String,
    pub weight: f64,
    pub reps: i64,
}

impl WorkoutSummary {
    /// Plain-text export grouping sets per exercise in first-appearance order.
    pub fn share_text(&self) -> String {
        let mut grouped: Vec<(&str, Vec<String>)> = Vec::new();
        for set in &self.sets {
            let entry = format!("{}x{}", set.weight, set.reps);
            match grouped.iter_mut().find(|(name, _)| *name == set.exercise) {
                Some((_, sets)) => sets.push(entry),
                None => grouped.push((&set.exercise, vec![entry])),
            }
        }

        let mut text = format!(
            "WLog Workout - {}\nTotal Volume: {} kg\n\n",
            self.timestamp.format(super::TIMESTAMP_FORMAT),
            format_volume(self.total_volume)
        );
        for (name, sets) in grouped {
            text.push_str(&format!("- {}: {}\n", name, sets.join(", ")));
        }
        text.push_str("\n#WLog #TrainingStreak");
        text
    }
}

/// A workout with its sets, as listed in the history view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub workout: Workout,
    /// Ordered by the stored set order.
    pub sets: Vec<HistorySet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySet {
    pub exercise: String,
    pub muscle: String,
    pub weight: f64,
    pub reps: i64,
}

/// Outcome of seeding the default weekly schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    /// True when routines already existed and nothing was written.
    pub skipped: bool,
    pub exercises_created: usize,
    pub routines_created: usize,
    pub items_created: usize,
}

/// Rounds to whole units with thousands separators, e.g. `12,345`.
pub fn format_volume(volume: f64) -> String {
    let rounded = volume.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_gets_thousands_separators() {
        assert_eq!(format_volume(0.0), "0");
        assert_eq!(format_volume(999.4), "999");
        assert_eq!(format_volume(12345.6), "12,346");
        assert_eq!(format_volume(1_000_000.0), "1,000,000");
    }

    #[test]
    fn share_text_groups_sets_by_exercise() {
        let summary = WorkoutSummary {
            workout_id: 7,
            timestamp: super::super::parse_timestamp("2024-01-03 18:30:00").unwrap(),
            total_volume: 1500.0,
            sets: vec![
                SummarySet { exercise: "Bench".into(), weight: 100.0, reps: 5 },
                SummarySet { exercise: "Row".into(), weight: 62.5, reps: 8 },
                SummarySet { exercise: "Bench".into(), weight: 100.0, reps: 4 },
            ],
        };

        let text = summary.share_text();
        assert!(text.starts_with("WLog Workout - 2024-01-03 18:30:00\nTotal Volume: 1,500 kg"));
        assert!(text.contains("- Bench: 100x5, 100x4\n"));
        assert!(text.contains("- Row: 62.5x8\n"));
        assert!(text.find("Bench").unwrap() < text.find("Row").unwrap());
    }
}
