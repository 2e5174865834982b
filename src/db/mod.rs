mod schema;

pub use schema::MigrationReport;

use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::{Result, StoreError};
use crate::ids::{self, IdBlock};
use crate::models::*;
use crate::seed;
use crate::store::WorkoutStore;

/// SQLite backend.
///
/// Tables mirror the spreadsheet collections column for column. Ids come from
/// `AUTOINCREMENT`, so they are never reused after a delete; multi-row writes
/// reserve explicit id blocks above both the current maximum and the
/// `sqlite_sequence` high-water mark.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self { conn })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Creates missing tables and adds missing columns.
    pub fn migrate(&self) -> Result<MigrationReport> {
        schema::run_migrations(&self.conn)
    }

    /// Migrates, then fills a freshly created exercise table with the starter
    /// catalog. Returns the number of catalog exercises written.
    pub fn init(&self) -> Result<usize> {
        let report = self.migrate()?;
        if report.created("exercises") {
            return self.install_starter_catalog();
        }
        Ok(0)
    }

    /// Adds every catalog exercise whose name is not in the library yet.
    pub fn install_starter_catalog(&self) -> Result<usize> {
        let existing = self.exercise_names()?;
        let mut added = 0;
        for def in seed::STARTER_CATALOG {
            if existing.iter().any(|name| same_name(name, def.name)) {
                continue;
            }
            self.insert_exercise(None, &def.to_new())?;
            added += 1;
        }
        tracing::info!("Installed {} starter exercises", added);
        Ok(added)
    }

    // ============================================================
    // Id allocation
    // ============================================================

    fn reserve_ids(&self, table: &str, len: usize) -> Result<IdBlock> {
        let max_id: Option<i64> =
            self.conn
                .query_row(&format!("SELECT MAX(id) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
        let seq: Option<i64> = self
            .conn
            .query_row(
                "SELECT seq FROM sqlite_sequence WHERE name = ?",
                [table],
                |row| row.get(0),
            )
            .optional()?;

        let start = ids::next_after(max_id.max(seq))
            .ok_or_else(|| StoreError::IdsExhausted(table.to_string()))?;
        IdBlock::new(table, start, len)
    }

    // ============================================================
    // Row writers
    // ============================================================

    fn exercise_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM exercises")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn insert_exercise(&self, id: Option<i64>, new: &NewExercise) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO exercises (id, name, target_muscle, instructions, difficulty, category)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id,
                &new.name,
                &new.muscle,
                &new.instructions,
                new.difficulty.get() as i64,
                &new.category,
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_routine(&self, id: Option<i64>, name: &str, created_at: NaiveDate) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (id, name, created_at) VALUES (?, ?, ?)",
            (id, name, format_date(&created_at)),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_items(&self, items: &[RoutineItem]) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO session_items (id, session_id, exercise_id, item_order) VALUES (?, ?, ?, ?)",
        )?;
        for item in items {
            stmt.execute((item.id, item.routine_id, item.exercise_id, item.order))?;
        }
        Ok(())
    }

    fn get_routine(&self, id: i64) -> Result<Option<Routine>> {
        let routine = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM sessions WHERE id = ?",
                [id],
                routine_from_row,
            )
            .optional()?;
        Ok(routine)
    }
}

impl WorkoutStore for Database {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    // ============================================================
    // Exercise operations
    // ============================================================

    fn create_exercise(&mut self, input: CreateExerciseInput) -> Result<Exercise> {
        if self
            .exercise_names()?
            .iter()
            .any(|name| same_name(name, &input.name))
        {
            return Err(StoreError::DuplicateName(input.name));
        }

        let new = NewExercise::from(input);
        let id = self.insert_exercise(None, &new)?;
        Ok(new.with_id(id))
    }

    fn list_exercises(&mut self) -> Result<Vec<Exercise>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, target_muscle, instructions, difficulty, category
             FROM exercises ORDER BY name",
        )?;

        let exercises = stmt
            .query_map([], exercise_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(exercises)
    }

    fn delete_exercise(&mut self, id: i64) -> Result<bool> {
        self.conn
            .execute("DELETE FROM session_items WHERE exercise_id = ?", [id])?;
        self.conn
            .execute("DELETE FROM log_entries WHERE exercise_id = ?", [id])?;
        let rows = self.conn.execute("DELETE FROM exercises WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Routine operations
    // ============================================================

    fn create_routine(&mut self, name: &str, exercise_ids: &[i64]) -> Result<Routine> {
        let created_at = Local::now().date_naive();
        let routine_id = self.insert_routine(None, name, created_at)?;

        let block = self.reserve_ids("session_items", exercise_ids.len())?;
        self.insert_items(&routine_items(routine_id, block.start, exercise_ids))?;

        Ok(Routine {
            id: routine_id,
            name: name.to_string(),
            created_at,
        })
    }

    fn list_routines(&mut self) -> Result<Vec<Routine>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM sessions ORDER BY id")?;

        let routines = stmt
            .query_map([], routine_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(routines)
    }

    fn routine_by_name(&mut self, name: &str) -> Result<Option<Routine>> {
        let routine = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM sessions WHERE name = ? ORDER BY id LIMIT 1",
                [name],
                routine_from_row,
            )
            .optional()?;
        Ok(routine)
    }

    fn routine_items(&mut self, routine_id: i64) -> Result<Vec<RoutineItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, exercise_id, item_order
             FROM session_items WHERE session_id = ? ORDER BY item_order, id",
        )?;

        let items = stmt
            .query_map([routine_id], |row| {
                Ok(RoutineItem {
                    id: row.get(0)?,
                    routine_id: row.get(1)?,
                    exercise_id: row.get(2)?,
                    order: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn routine_exercises(&mut self, routine_id: i64) -> Result<Vec<RoutineExercise>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.name, e.target_muscle, si.item_order
             FROM session_items si
             JOIN exercises e ON si.exercise_id = e.id
             WHERE si.session_id = ?
             ORDER BY si.item_order, si.id",
        )?;

        let joined = stmt
            .query_map([routine_id], |row| {
                Ok(RoutineExercise {
                    exercise_id: row.get(0)?,
                    name: row.get(1)?,
                    muscle: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    order: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(joined)
    }

    fn update_routine(&mut self, id: i64, name: &str, exercise_ids: &[i64]) -> Result<bool> {
        if self.get_routine(id)?.is_none() {
            return Ok(false);
        }

        self.conn
            .execute("UPDATE sessions SET name = ? WHERE id = ?", (name, id))?;

        // Reserved before the delete so fresh ids land above the old items
        let block = self.reserve_ids("session_items", exercise_ids.len())?;
        self.conn
            .execute("DELETE FROM session_items WHERE session_id = ?", [id])?;
        self.insert_items(&routine_items(id, block.start, exercise_ids))?;

        Ok(true)
    }

    fn delete_routine(&mut self, id: i64) -> Result<bool> {
        self.conn
            .execute("DELETE FROM session_items WHERE session_id = ?", [id])?;
        let rows = self.conn.execute("DELETE FROM sessions WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Workout operations
    // ============================================================

    fn create_workout_at(
        &mut self,
        input: CreateWorkoutInput,
        timestamp: NaiveDateTime,
    ) -> Result<Workout> {
        let input = input.normalized();
        self.conn.execute(
            "INSERT INTO workouts (timestamp, total_volume, session_name, duration_minutes)
             VALUES (?, ?, ?, ?)",
            (
                format_timestamp(&timestamp),
                input.total_volume,
                &input.session_name,
                input.duration_minutes,
            ),
        )?;

        Ok(Workout {
            id: self.conn.last_insert_rowid(),
            timestamp,
            total_volume: input.total_volume,
            session_name: input.session_name,
            duration_minutes: input.duration_minutes,
        })
    }

    fn log_set(&mut self, input: LogSetInput) -> Result<LogEntry> {
        self.conn.execute(
            "INSERT INTO log_entries (workout_id, exercise_id, set_order, weight, reps)
             VALUES (?, ?, ?, ?, ?)",
            (
                input.workout_id,
                input.exercise_id,
                input.order,
                input.weight,
                input.reps,
            ),
        )?;

        Ok(LogEntry {
            id: self.conn.last_insert_rowid(),
            workout_id: input.workout_id,
            exercise_id: input.exercise_id,
            order: input.order,
            weight: input.weight,
            reps: input.reps,
        })
    }

    fn list_workouts(&mut self) -> Result<Vec<Workout>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, total_volume, session_name, duration_minutes
             FROM workouts ORDER BY id DESC",
        )?;

        let workouts = stmt
            .query_map([], workout_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(workouts)
    }

    fn delete_workout(&mut self, id: i64) -> Result<bool> {
        self.conn
            .execute("DELETE FROM log_entries WHERE workout_id = ?", [id])?;
        let rows = self.conn.execute("DELETE FROM workouts WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Queries
    // ============================================================

    fn last_performance(&mut self, exercise_id: i64) -> Result<Option<LastPerformance>> {
        let last = self
            .conn
            .query_row(
                "SELECT l.weight, l.reps, w.timestamp
                 FROM log_entries l
                 JOIN workouts w ON l.workout_id = w.id
                 WHERE l.exercise_id = ?
                 ORDER BY w.id DESC, l.set_order ASC, l.id ASC
                 LIMIT 1",
                [exercise_id],
                |row| {
                    Ok(LastPerformance {
                        weight: row.get::<_, Option<f64>>(0)?.unwrap_or_default(),
                        reps: row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
                        date: parse_date(&row.get::<_, String>(2)?).unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(last)
    }

    fn workout_dates(&mut self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare("SELECT timestamp FROM workouts")?;
        let stamps = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stamps.iter().filter_map(|s| parse_date(s)).collect())
    }

    fn last_workout_summary(&mut self) -> Result<Option<WorkoutSummary>> {
        let Some(workout) = self
            .conn
            .query_row(
                "SELECT id, timestamp, total_volume, session_name, duration_minutes
                 FROM workouts ORDER BY id DESC LIMIT 1",
                [],
                workout_from_row,
            )
            .optional()?
        else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT e.name, l.weight, l.reps
             FROM log_entries l
             JOIN exercises e ON l.exercise_id = e.id
             WHERE l.workout_id = ?
             ORDER BY l.set_order, l.id",
        )?;
        let sets = stmt
            .query_map([workout.id], |row| {
                Ok(SummarySet {
                    exercise: row.get(0)?,
                    weight: row.get::<_, Option<f64>>(1)?.unwrap_or_default(),
                    reps: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(WorkoutSummary {
            workout_id: workout.id,
            timestamp: workout.timestamp,
            total_volume: workout.total_volume,
            sets,
        }))
    }

    fn history(&mut self) -> Result<Vec<HistoryEntry>> {
        let workouts = self.list_workouts()?;

        let mut stmt = self.conn.prepare(
            "SELECT e.name, e.target_muscle, l.weight, l.reps
             FROM log_entries l
             JOIN exercises e ON l.exercise_id = e.id
             WHERE l.workout_id = ?
             ORDER BY l.set_order, l.id",
        )?;

        let mut history = Vec::with_capacity(workouts.len());
        for workout in workouts {
            let sets = stmt
                .query_map([workout.id], |row| {
                    Ok(HistorySet {
                        exercise: row.get(0)?,
                        muscle: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        weight: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
                        reps: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            history.push(HistoryEntry { workout, sets });
        }

        Ok(history)
    }

    // ============================================================
    // Seeding
    // ============================================================

    fn seed_default_schedule(&mut self) -> Result<SeedReport> {
        if !self.list_routines()?.is_empty() {
            tracing::info!("Routines already exist, skipping default schedule");
            return Ok(SeedReport {
                skipped: true,
                ..Default::default()
            });
        }

        let existing = self.list_exercises()?;
        let resolution = seed::resolve(seed::DEFAULT_SCHEDULE, &existing);

        let exercise_ids = self.reserve_ids("exercises", resolution.new_exercises.len())?;
        let routine_ids = self.reserve_ids("sessions", resolution.routines.len())?;
        let item_ids = self.reserve_ids("session_items", resolution.item_count())?;
        let plan = resolution.into_plan(
            exercise_ids,
            routine_ids,
            item_ids,
            Local::now().date_naive(),
        );

        for exercise in &plan.exercises {
            self.insert_exercise(
                Some(exercise.id),
                &NewExercise {
                    name: exercise.name.clone(),
                    muscle: exercise.muscle.clone(),
                    instructions: exercise.instructions.clone(),
                    difficulty: exercise.difficulty,
                    category: exercise.category.clone(),
                },
            )?;
        }
        for routine in &plan.routines {
            self.insert_routine(Some(routine.id), &routine.name, routine.created_at)?;
        }
        self.insert_items(&plan.items)?;

        let report = plan.report();
        tracing::info!(
            "Seeded default schedule: {} routines, {} new exercises",
            report.routines_created,
            report.exercises_created
        );
        Ok(report)
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "wlog").ok_or_else(|| {
        StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })?;
    Ok(dirs.data_dir().join("wlog.db"))
}

fn exercise_from_row(row: &Row) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        id: row.get(0)?,
        name: row.get(1)?,
        muscle: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        instructions: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        difficulty: Difficulty::new(row.get::<_, Option<i64>>(4)?.unwrap_or(1)),
        category: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}

fn routine_from_row(row: &Row) -> rusqlite::Result<Routine> {
    Ok(Routine {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row
            .get::<_, Option<String>>(2)?
            .as_deref()
            .and_then(parse_date)
            .unwrap_or_default(),
    })
}

fn workout_from_row(row: &Row) -> rusqlite::Result<Workout> {
    Ok(Workout {
        id: row.get(0)?,
        timestamp: parse_timestamp(&row.get::<_, String>(1)?).unwrap_or_default(),
        total_volume: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
        session_name: row.get::<_, Option<String>>(3)?.as_deref().and_then(session_name),
        duration_minutes: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
    })
}
