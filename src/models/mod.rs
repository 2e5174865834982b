//! Domain models for WLog.
//!
//! # Core Concepts
//!
//! - [`Exercise`]: A movement in the library, unique by name (case-insensitive).
//! - [`Routine`]: A named, ordered template of exercises (stored as a "session").
//!   Its [`RoutineItem`]s carry a 0-based, contiguous `order`.
//! - [`Workout`]: One finished training session. `total_volume` is computed once
//!   when the workout is created and never recomputed from its entries.
//! - [`LogEntry`]: One recorded set (weight x reps) of an exercise within a workout.
//!
//! Report types ([`LastPerformance`], [`WorkoutSummary`], [`HistoryEntry`]) are the
//! joined views produced by the query operations.

mod exercise;
mod report;
mod routine;
mod workout;

pub use exercise::*;
pub use report::*;
pub use routine::*;
pub use workout::*;
