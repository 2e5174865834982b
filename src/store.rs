//! The repository and query contract shared by both backends.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

use crate::error::Result;
use crate::models::*;

/// Persistence for exercises, routines, workouts and sets.
///
/// Implemented by [`crate::db::Database`] (SQLite) and
/// [`crate::sheets::SheetStore`] (spreadsheet as document store). Given the same
/// call sequence both return the same results, except that
/// [`list_exercises`](Self::list_exercises) is name-sorted on SQLite and in
/// insertion order on the spreadsheet.
///
/// Every call blocks until the backing store answers. Multi-row operations
/// are sequences of independent writes with no rollback: an interrupted
/// sequence leaves whatever was already written.
pub trait WorkoutStore {
    /// Short backend label for logs and CLI output.
    fn backend_name(&self) -> &'static str;

    // Exercises

    /// Fails with `DuplicateName` if a name matches case-insensitively.
    fn create_exercise(&mut self, input: CreateExerciseInput) -> Result<Exercise>;
    fn list_exercises(&mut self) -> Result<Vec<Exercise>>;
    /// Removes the exercise plus every routine item and set that references it.
    fn delete_exercise(&mut self, id: i64) -> Result<bool>;

    // Routines

    fn create_routine(&mut self, name: &str, exercise_ids: &[i64]) -> Result<Routine>;
    fn list_routines(&mut self) -> Result<Vec<Routine>>;
    fn routine_by_name(&mut self, name: &str) -> Result<Option<Routine>>;
    /// Items ordered by their `order` field.
    fn routine_items(&mut self, routine_id: i64) -> Result<Vec<RoutineItem>>;
    fn routine_exercises(&mut self, routine_id: i64) -> Result<Vec<RoutineExercise>>;
    /// Renames the routine and replaces all of its items with fresh rows.
    /// Returns false, writing nothing, when the routine does not exist.
    fn update_routine(&mut self, id: i64, name: &str, exercise_ids: &[i64]) -> Result<bool>;
    fn delete_routine(&mut self, id: i64) -> Result<bool>;

    // Workouts

    fn create_workout_at(
        &mut self,
        input: CreateWorkoutInput,
        timestamp: NaiveDateTime,
    ) -> Result<Workout>;

    /// Creates a workout stamped with the current local time.
    fn create_workout(&mut self, input: CreateWorkoutInput) -> Result<Workout> {
        let now = Local::now().naive_local();
        // stored with second precision
        self.create_workout_at(input, now.with_nanosecond(0).unwrap_or(now))
    }

    fn log_set(&mut self, input: LogSetInput) -> Result<LogEntry>;
    /// Newest id first.
    fn list_workouts(&mut self) -> Result<Vec<Workout>>;
    fn delete_workout(&mut self, id: i64) -> Result<bool>;

    // Queries

    fn last_performance(&mut self, exercise_id: i64) -> Result<Option<LastPerformance>>;
    /// Calendar dates of every workout, duplicates allowed.
    fn workout_dates(&mut self) -> Result<Vec<NaiveDate>>;

    fn streak_on(&mut self, today: NaiveDate) -> Result<u32> {
        Ok(crate::query::streak(&self.workout_dates()?, today))
    }

    fn streak(&mut self) -> Result<u32> {
        self.streak_on(Local::now().date_naive())
    }

    fn last_workout_summary(&mut self) -> Result<Option<WorkoutSummary>>;
    fn history(&mut self) -> Result<Vec<HistoryEntry>>;

    /// Writes the default weekly schedule, but only when no routine exists yet.
    fn seed_default_schedule(&mut self) -> Result<SeedReport>;
}
