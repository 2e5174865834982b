//! Backend-independent query logic.
//!
//! The spreadsheet backend has no join or index, so every joined view is built
//! here by scanning one table and matching rows of the other. Cost grows with
//! the product of the table sizes. The relational backend answers the same
//! questions with SQL joins and must agree with these functions row for row.

use chrono::NaiveDate;

use crate::models::*;

/// Counts consecutive calendar days with at least one workout, ending today
/// or yesterday. Several workouts on one day count once.
pub fn streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut days = dates.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(latest) = days.first() else {
        return 0;
    };
    if (today - *latest).num_days() > 1 {
        return 0;
    }

    let mut count = 1;
    for pair in days.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            count += 1;
        } else {
            break;
        }
    }
    count
}

/// Latest set of an exercise, where "latest" means the owning workout with the
/// highest id. Within that workout the first-logged set wins.
pub fn last_performance(
    exercise_id: i64,
    entries: &[LogEntry],
    workouts: &[Workout],
) -> Option<LastPerformance> {
    let mut best: Option<(&LogEntry, &Workout)> = None;
    for entry in entries.iter().filter(|e| e.exercise_id == exercise_id) {
        let Some(workout) = workouts.iter().find(|w| w.id == entry.workout_id) else {
            continue;
        };
        let better = match best {
            None => true,
            Some((b_entry, b_workout)) => {
                (workout.id, -entry.order, -entry.id) > (b_workout.id, -b_entry.order, -b_entry.id)
            }
        };
        if better {
            best = Some((entry, workout));
        }
    }

    best.map(|(entry, workout)| LastPerformance {
        weight: entry.weight,
        reps: entry.reps,
        date: workout.date(),
    })
}

/// The workout with the highest id, its sets joined to exercise names.
pub fn last_workout_summary(
    workouts: &[Workout],
    entries: &[LogEntry],
    exercises: &[Exercise],
) -> Option<WorkoutSummary> {
    let last = workouts.iter().max_by_key(|w| w.id)?;
    let sets = workout_sets(last.id, entries, exercises)
        .map(|(entry, exercise)| SummarySet {
            exercise: exercise.name.clone(),
            weight: entry.weight,
            reps: entry.reps,
        })
        .collect();

    Some(WorkoutSummary {
        workout_id: last.id,
        timestamp: last.timestamp,
        total_volume: last.total_volume,
        sets,
    })
}

/// All workouts, newest id first, each with its ordered sets.
pub fn history(
    workouts: &[Workout],
    entries: &[LogEntry],
    exercises: &[Exercise],
) -> Vec<HistoryEntry> {
    let mut ordered: Vec<&Workout> = workouts.iter().collect();
    ordered.sort_by(|a, b| b.id.cmp(&a.id));

    ordered
        .into_iter()
        .map(|workout| HistoryEntry {
            workout: workout.clone(),
            sets: workout_sets(workout.id, entries, exercises)
                .map(|(entry, exercise)| HistorySet {
                    exercise: exercise.name.clone(),
                    muscle: exercise.muscle.clone(),
                    weight: entry.weight,
                    reps: entry.reps,
                })
                .collect(),
        })
        .collect()
}

/// Items of a routine in order, joined to their exercises. Items pointing at a
/// deleted exercise are dropped.
pub fn routine_exercises(
    routine_id: i64,
    items: &[RoutineItem],
    exercises: &[Exercise],
) -> Vec<RoutineExercise> {
    let mut own: Vec<&RoutineItem> = items.iter().filter(|i| i.routine_id == routine_id).collect();
    own.sort_by_key(|i| (i.order, i.id));

    own.into_iter()
        .filter_map(|item| {
            let exercise = exercises.iter().find(|e| e.id == item.exercise_id)?;
            Some(RoutineExercise {
                exercise_id: exercise.id,
                name: exercise.name.clone(),
                muscle: exercise.muscle.clone(),
                order: item.order,
            })
        })
        .collect()
}

/// Sets of one workout ordered by set order, inner-joined to exercises.
fn workout_sets<'a>(
    workout_id: i64,
    entries: &'a [LogEntry],
    exercises: &'a [Exercise],
) -> impl Iterator<Item = (&'a LogEntry, &'a Exercise)> {
    let mut own: Vec<&LogEntry> = entries.iter().filter(|e| e.workout_id == workout_id).collect();
    own.sort_by_key(|e| (e.order, e.id));
    own.into_iter().filter_map(move |entry| {
        exercises
            .iter()
            .find(|ex| ex.id == entry.exercise_id)
            .map(|ex| (entry, ex))
    })
}
