//! Spreadsheet backend: one worksheet per collection, used as a document store.
//!
//! The store handle owns the remote client, a [`TableCache`] and an
//! [`IdAllocator`]. Every read goes through the cache. Every update or delete
//! rewrites the affected worksheet in full. Joins are linear scans over cached
//! tables (see [`crate::query`]).

mod cache;
pub mod client;
pub mod credentials;
mod memory;
mod table;

pub use cache::TableCache;
pub use client::{GoogleSheetsClient, SheetClient};
pub use credentials::ServiceAccountKey;
pub use memory::{CallCounts, MemorySheets};
pub use table::{Collection, HeaderCheck, Record, Table, COLLECTIONS};

use std::collections::HashMap;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::error::{Result, StoreError};
use crate::ids::{IdAllocator, IdBlock};
use crate::models::*;
use crate::query;
use crate::seed;
use crate::store::WorkoutStore;
use table::{EXERCISES, LOG_ENTRIES, SESSIONS, SESSION_ITEMS, WORKOUTS};

/// Default document name of the spreadsheet.
pub const DEFAULT_SPREADSHEET: &str = "WLog_DB";

type Cells = Vec<(&'static str, String)>;

pub struct SheetStore<C: SheetClient> {
    client: C,
    cache: TableCache,
    ids: IdAllocator,
    /// Collection name to live worksheet title.
    titles: HashMap<&'static str, String>,
}

impl<C: SheetClient> SheetStore<C> {
    /// Opens the store, creating missing worksheets and writing the header
    /// into empty ones. Every collection is read once here and cached.
    pub fn open(mut client: C) -> Result<Self> {
        let existing = client.worksheet_titles()?;
        let mut titles = HashMap::new();

        for collection in COLLECTIONS {
            let title = match existing
                .iter()
                .find(|t| t.eq_ignore_ascii_case(collection.name))
            {
                Some(title) => title.clone(),
                None => {
                    client.add_worksheet(collection.name)?;
                    tracing::info!("Created worksheet {}", collection.name);
                    collection.name.to_string()
                }
            };
            titles.insert(collection.name, title);
        }

        let mut store = Self {
            client,
            cache: TableCache::new(),
            ids: IdAllocator::new(),
            titles,
        };

        for collection in COLLECTIONS {
            if !store.table(&collection)?.has_header() {
                let table = Table::with_header(&collection);
                store.rewrite(&collection, table)?;
                tracing::info!("Wrote header row to {}", collection.name);
            }
        }

        Ok(store)
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Forgets the cached copy of one collection.
    pub fn invalidate(&mut self, collection: &str) {
        self.cache.invalidate(collection);
    }

    /// Forgets every cached table; the next reads go to the remote.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    // ============================================================
    // Table access
    // ============================================================

    fn title(&self, collection: &Collection) -> String {
        self.titles
            .get(collection.name)
            .cloned()
            .unwrap_or_else(|| collection.name.to_string())
    }

    fn table(&mut self, collection: &Collection) -> Result<&Table> {
        let title = self.title(collection);
        let client = &mut self.client;
        self.cache
            .get_or_fetch(collection.name, || fetch(client, &title, collection))
    }

    /// Appends rows remotely, then mirrors them into the cache.
    fn append(&mut self, collection: &Collection, rows: &[Cells]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let table = self.table(collection)?;
        let arranged: Vec<Vec<String>> = rows
            .iter()
            .map(|cells| table.arrange(collection, cells))
            .collect();

        // A sheet emptied since it was cached gets its header back first
        let payload = if table.has_header() {
            arranged.clone()
        } else {
            let mut payload = vec![collection.header()];
            payload.extend(arranged.iter().cloned());
            payload
        };

        let title = self.title(collection);
        self.client.append_rows(&title, &payload)?;
        self.cache.appended(collection.name, &arranged);
        Ok(())
    }

    fn rewrite(&mut self, collection: &Collection, table: Table) -> Result<()> {
        let title = self.title(collection);
        self.client.replace_values(&title, &table.to_values())?;
        self.cache.store(collection.name, table);
        Ok(())
    }

    /// Deletes rows whose `column` holds `id`. Rewrites only if any matched.
    fn remove_where(&mut self, collection: &Collection, column: &str, id: i64) -> Result<usize> {
        let mut table = self.table(collection)?.clone();
        let removed = table.retain(|r| r.id(column) != Some(id));
        if removed > 0 {
            self.rewrite(collection, table)?;
        }
        Ok(removed)
    }

    fn reserve(&mut self, collection: &Collection, len: usize) -> Result<IdBlock> {
        let next = self
            .table(collection)?
            .next_id()
            .ok_or_else(|| StoreError::IdsExhausted(collection.name.to_string()))?;
        self.ids.reserve(collection.name, next, len)
    }

    // ============================================================
    // Typed reads
    // ============================================================

    fn exercises(&mut self) -> Result<Vec<Exercise>> {
        Ok(decode(self.table(&EXERCISES)?, &EXERCISES, |r, id| Exercise {
            id,
            name: r.text("name").to_string(),
            muscle: r.text("target_muscle").to_string(),
            instructions: r.text("instructions").to_string(),
            difficulty: Difficulty::from_str(r.text("difficulty")),
            category: r.text("category").to_string(),
        }))
    }

    fn workouts(&mut self) -> Result<Vec<Workout>> {
        Ok(decode(self.table(&WORKOUTS)?, &WORKOUTS, |r, id| Workout {
            id,
            timestamp: parse_timestamp(r.text("timestamp")).unwrap_or_default(),
            total_volume: r.float("total_volume"),
            session_name: r.optional_text("session_name"),
            duration_minutes: r.int("duration_minutes"),
        }))
    }

    fn log_entries(&mut self) -> Result<Vec<LogEntry>> {
        Ok(decode(self.table(&LOG_ENTRIES)?, &LOG_ENTRIES, |r, id| LogEntry {
            id,
            workout_id: r.int("workout_id"),
            exercise_id: r.int("exercise_id"),
            order: r.int("set_order"),
            weight: r.float("weight"),
            reps: r.int("reps"),
        }))
    }

    fn routines(&mut self) -> Result<Vec<Routine>> {
        let mut routines = decode(self.table(&SESSIONS)?, &SESSIONS, |r, id| Routine {
            id,
            name: r.text("name").to_string(),
            created_at: parse_date(r.text("created_at")).unwrap_or_default(),
        });
        routines.sort_by_key(|r| r.id);
        Ok(routines)
    }

    fn items(&mut self) -> Result<Vec<RoutineItem>> {
        Ok(decode(self.table(&SESSION_ITEMS)?, &SESSION_ITEMS, |r, id| RoutineItem {
            id,
            routine_id: r.int("session_id"),
            exercise_id: r.int("exercise_id"),
            order: r.int("item_order"),
        }))
    }
}

impl<C: SheetClient> WorkoutStore for SheetStore<C> {
    fn backend_name(&self) -> &'static str {
        "sheets"
    }

    // ============================================================
    // Exercise operations
    // ============================================================

    fn create_exercise(&mut self, input: CreateExerciseInput) -> Result<Exercise> {
        if self
            .exercises()?
            .iter()
            .any(|e| same_name(&e.name, &input.name))
        {
            return Err(StoreError::DuplicateName(input.name));
        }

        let block = self.reserve(&EXERCISES, 1)?;
        let exercise = NewExercise::from(input).with_id(block.start);
        self.append(&EXERCISES, &[exercise_cells(&exercise)])?;
        Ok(exercise)
    }

    fn list_exercises(&mut self) -> Result<Vec<Exercise>> {
        self.exercises()
    }

    fn delete_exercise(&mut self, id: i64) -> Result<bool> {
        self.remove_where(&SESSION_ITEMS, "exercise_id", id)?;
        self.remove_where(&LOG_ENTRIES, "exercise_id", id)?;
        Ok(self.remove_where(&EXERCISES, "id", id)? > 0)
    }

    // ============================================================
    // Routine operations
    // ============================================================

    fn create_routine(&mut self, name: &str, exercise_ids: &[i64]) -> Result<Routine> {
        let block = self.reserve(&SESSIONS, 1)?;
        let routine = Routine {
            id: block.start,
            name: name.to_string(),
            created_at: Local::now().date_naive(),
        };
        self.append(&SESSIONS, &[routine_cells(&routine)])?;

        let items = self.reserve(&SESSION_ITEMS, exercise_ids.len())?;
        let rows: Vec<Cells> = routine_items(routine.id, items.start, exercise_ids)
            .iter()
            .map(item_cells)
            .collect();
        self.append(&SESSION_ITEMS, &rows)?;

        Ok(routine)
    }

    fn list_routines(&mut self) -> Result<Vec<Routine>> {
        self.routines()
    }

    fn routine_by_name(&mut self, name: &str) -> Result<Option<Routine>> {
        Ok(self.routines()?.into_iter().find(|r| r.name == name))
    }

    fn routine_items(&mut self, routine_id: i64) -> Result<Vec<RoutineItem>> {
        let mut items: Vec<RoutineItem> = self
            .items()?
            .into_iter()
            .filter(|i| i.routine_id == routine_id)
            .collect();
        items.sort_by_key(|i| (i.order, i.id));
        Ok(items)
    }

    fn routine_exercises(&mut self, routine_id: i64) -> Result<Vec<RoutineExercise>> {
        let items = self.items()?;
        let exercises = self.exercises()?;
        Ok(query::routine_exercises(routine_id, &items, &exercises))
    }

    fn update_routine(&mut self, id: i64, name: &str, exercise_ids: &[i64]) -> Result<bool> {
        let mut sessions = self.table(&SESSIONS)?.clone();
        if !sessions.set_by_id(id, "name", name) {
            return Ok(false);
        }
        self.rewrite(&SESSIONS, sessions)?;

        // Reserved against the full table so fresh ids land above the old items
        let block = self.reserve(&SESSION_ITEMS, exercise_ids.len())?;
        let mut items = self.table(&SESSION_ITEMS)?.clone();
        if !items.has_header() {
            items = Table::with_header(&SESSION_ITEMS);
        }
        items.retain(|r| r.id("session_id") != Some(id));
        for item in routine_items(id, block.start, exercise_ids) {
            let row = items.arrange(&SESSION_ITEMS, &item_cells(&item));
            items.push(row);
        }
        self.rewrite(&SESSION_ITEMS, items)?;

        Ok(true)
    }

    fn delete_routine(&mut self, id: i64) -> Result<bool> {
        self.remove_where(&SESSION_ITEMS, "session_id", id)?;
        Ok(self.remove_where(&SESSIONS, "id", id)? > 0)
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
        let block = self.reserve(&WORKOUTS, 1)?;
        let workout = Workout {
            id: block.start,
            timestamp,
            total_volume: input.total_volume,
            session_name: input.session_name,
            duration_minutes: input.duration_minutes,
        };
        self.append(&WORKOUTS, &[workout_cells(&workout)])?;
        Ok(workout)
    }

    fn log_set(&mut self, input: LogSetInput) -> Result<LogEntry> {
        let block = self.reserve(&LOG_ENTRIES, 1)?;
        let entry = LogEntry {
            id: block.start,
            workout_id: input.workout_id,
            exercise_id: input.exercise_id,
            order: input.order,
            weight: input.weight,
            reps: input.reps,
        };
        self.append(&LOG_ENTRIES, &[log_entry_cells(&entry)])?;
        Ok(entry)
    }

    fn list_workouts(&mut self) -> Result<Vec<Workout>> {
        let mut workouts = self.workouts()?;
        workouts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(workouts)
    }

    fn delete_workout(&mut self, id: i64) -> Result<bool> {
        self.remove_where(&LOG_ENTRIES, "workout_id", id)?;
        Ok(self.remove_where(&WORKOUTS, "id", id)? > 0)
    }

    // ============================================================
    // Queries
    // ============================================================

    fn last_performance(&mut self, exercise_id: i64) -> Result<Option<LastPerformance>> {
        let entries = self.log_entries()?;
        let workouts = self.workouts()?;
        Ok(query::last_performance(exercise_id, &entries, &workouts))
    }

    fn workout_dates(&mut self) -> Result<Vec<NaiveDate>> {
        Ok(self.workouts()?.iter().map(Workout::date).collect())
    }

    fn last_workout_summary(&mut self) -> Result<Option<WorkoutSummary>> {
        let workouts = self.workouts()?;
        let entries = self.log_entries()?;
        let exercises = self.exercises()?;
        Ok(query::last_workout_summary(&workouts, &entries, &exercises))
    }

    fn history(&mut self) -> Result<Vec<HistoryEntry>> {
        let workouts = self.workouts()?;
        let entries = self.log_entries()?;
        let exercises = self.exercises()?;
        Ok(query::history(&workouts, &entries, &exercises))
    }

    // ============================================================
    // Seeding
    // ============================================================

    fn seed_default_schedule(&mut self) -> Result<SeedReport> {
        if !self.routines()?.is_empty() {
            tracing::info!("Routines already exist, skipping default schedule");
            return Ok(SeedReport {
                skipped: true,
                ..Default::default()
            });
        }

        let existing = self.exercises()?;
        let resolution = seed::resolve(seed::DEFAULT_SCHEDULE, &existing);

        let exercise_ids = self.reserve(&EXERCISES, resolution.new_exercises.len())?;
        let routine_ids = self.reserve(&SESSIONS, resolution.routines.len())?;
        let item_ids = self.reserve(&SESSION_ITEMS, resolution.item_count())?;
        let plan = resolution.into_plan(
            exercise_ids,
            routine_ids,
            item_ids,
            Local::now().date_naive(),
        );

        // One append per collection
        let exercises: Vec<Cells> = plan.exercises.iter().map(exercise_cells).collect();
        self.append(&EXERCISES, &exercises)?;
        let routines: Vec<Cells> = plan.routines.iter().map(routine_cells).collect();
        self.append(&SESSIONS, &routines)?;
        let items: Vec<Cells> = plan.items.iter().map(item_cells).collect();
        self.append(&SESSION_ITEMS, &items)?;

        let report = plan.report();
        tracing::info!(
            "Seeded default schedule: {} routines, {} new exercises",
            report.routines_created,
            report.exercises_created
        );
        Ok(report)
    }
}

/// Reads a worksheet and checks its header, healing routine sheets that lost
/// their id column.
fn fetch<C: SheetClient>(client: &mut C, title: &str, collection: &Collection) -> Result<Table> {
    let table = Table::from_values(client.read_values(title)?);

    match collection.check(&table) {
        HeaderCheck::Valid => Ok(table),
        HeaderCheck::Heal => {
            tracing::warn!(
                "Worksheet {} has no id column; rebuilding it empty, discarding {} rows",
                title,
                table.len()
            );
            let healed = Table::with_header(collection);
            client.replace_values(title, &healed.to_values())?;
            Ok(healed)
        }
        HeaderCheck::Missing(column) => Err(StoreError::SchemaMismatch {
            sheet: collection.name.to_string(),
            missing: column.to_string(),
        }),
    }
}

/// Typed rows of a table. Rows without a readable id are skipped.
fn decode<T>(
    table: &Table,
    collection: &Collection,
    mut read: impl FnMut(&Record, i64) -> T,
) -> Vec<T> {
    table
        .records()
        .filter_map(|record| match record.id("id") {
            Some(id) => Some(read(&record, id)),
            None => {
                tracing::warn!(
                    "Skipping {} row with unreadable id '{}'",
                    collection.name,
                    record.text("id")
                );
                None
            }
        })
        .collect()
}

fn exercise_cells(exercise: &Exercise) -> Cells {
    vec![
        ("id", exercise.id.to_string()),
        ("name", exercise.name.clone()),
        ("target_muscle", exercise.muscle.clone()),
        ("instructions", exercise.instructions.clone()),
        ("difficulty", exercise.difficulty.get().to_string()),
        ("category", exercise.category.clone()),
    ]
}

fn workout_cells(workout: &Workout) -> Cells {
    vec![
        ("id", workout.id.to_string()),
        ("timestamp", format_timestamp(&workout.timestamp)),
        ("total_volume", workout.total_volume.to_string()),
        ("session_name", workout.session_name.clone().unwrap_or_default()),
        ("duration_minutes", workout.duration_minutes.to_string()),
    ]
}

fn log_entry_cells(entry: &LogEntry) -> Cells {
    vec![
        ("id", entry.id.to_string()),
        ("workout_id", entry.workout_id.to_string()),
        ("exercise_id", entry.exercise_id.to_string()),
        ("set_order", entry.order.to_string()),
        ("weight", entry.weight.to_string()),
        ("reps", entry.reps.to_string()),
    ]
}

fn routine_cells(routine: &Routine) -> Cells {
    vec![
        ("id", routine.id.to_string()),
        ("name", routine.name.clone()),
        ("created_at", format_date(&routine.created_at)),
    ]
}

fn item_cells(item: &RoutineItem) -> Cells {
    vec![
        ("id", item.id.to_string()),
        ("session_id", item.routine_id.to_string()),
        ("exercise_id", item.exercise_id.to_string()),
        ("item_order", item.order.to_string()),
    ]
}
