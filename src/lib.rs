//! Workout log storage.
//!
//! Exercises, routines, workouts and logged sets behind one [`WorkoutStore`]
//! contract, backed either by a local SQLite file ([`db::Database`]) or by a
//! Google Sheets document ([`sheets::SheetStore`]).

pub mod config;
pub mod db;
pub mod error;
pub mod finish;
pub mod ids;
pub mod models;
pub mod query;
pub mod seed;
pub mod sheets;
pub mod store;

pub use error::{Result, StoreError};
pub use store::WorkoutStore;
