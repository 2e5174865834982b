//! Saving a finished training session.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CreateWorkoutInput, LogSetInput, Workout};
use crate::store::WorkoutStore;

/// One set as performed, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedSet {
    pub exercise_id: i64,
    pub weight: f64,
    pub reps: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinishWorkout {
    /// Routine the session followed.
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub duration_minutes: i64,
    pub sets: Vec<FinishedSet>,
    /// Rewrite the followed routine to the exercises actually logged.
    #[serde(default)]
    pub update_routine: bool,
}

impl FinishWorkout {
    pub fn total_volume(&self) -> f64 {
        self.sets.iter().map(|s| s.weight * s.reps as f64).sum()
    }

    /// Distinct exercise ids in the order they were first logged.
    pub fn exercise_order(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::new();
        for set in &self.sets {
            if !ids.contains(&set.exercise_id) {
                ids.push(set.exercise_id);
            }
        }
        ids
    }
}

/// Stores the workout and its sets in logged order.
///
/// With `update_routine` set and a routine of that name present, the routine's
/// items are replaced by the logged exercises. Returns `None` without writing
/// when no set was logged.
pub fn finish_workout(
    store: &mut dyn WorkoutStore,
    input: FinishWorkout,
) -> Result<Option<Workout>> {
    if input.sets.is_empty() {
        return Ok(None);
    }

    let workout = store.create_workout(CreateWorkoutInput {
        total_volume: input.total_volume(),
        session_name: input.session_name.clone(),
        duration_minutes: input.duration_minutes,
    })?;

    for (idx, set) in input.sets.iter().enumerate() {
        store.log_set(LogSetInput {
            workout_id: workout.id,
            exercise_id: set.exercise_id,
            weight: set.weight,
            reps: set.reps,
            order: idx as i64,
        })?;
    }

    if input.update_routine {
        if let Some(name) = &input.session_name {
            match store.routine_by_name(name)? {
                Some(routine) => {
                    store.update_routine(routine.id, &routine.name, &input.exercise_order())?;
                    tracing::info!("Updated routine '{}' from workout {}", name, workout.id);
                }
                None => tracing::warn!("Routine '{}' not found, not updated", name),
            }
        }
    }

    tracing::info!(
        "Saved workout {} with {} sets",
        workout.id,
        input.sets.len()
    );
    Ok(Some(workout))
}
