use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named, ordered template of exercises the user intends to repeat.
///
/// Stored in the `sessions` collection; the items live in `session_items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDate,
}

/// One slot in a routine. `order` is 0-based and contiguous per routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineItem {
    pub id: i64,
    pub routine_id: i64,
    pub exercise_id: i64,
    pub order: i64,
}

/// A routine item joined to its exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineExercise {
    pub exercise_id: i64,
    pub name: String,
    pub muscle: String,
    pub order: i64,
}

/// Builds the item rows for a routine from a contiguous id block.
pub fn routine_items(routine_id: i64, first_id: i64, exercise_ids: &[i64]) -> Vec<RoutineItem> {
    exercise_ids
        .iter()
        .enumerate()
        .map(|(idx, &exercise_id)| RoutineItem {
            id: first_id + idx as i64,
            routine_id,
            exercise_id,
            order: idx as i64,
        })
        .collect()
}
