use rusqlite::Connection;

use crate::error::Result;

struct Column {
    name: &'static str,
    /// Declaration used both in CREATE TABLE and ALTER TABLE ADD COLUMN,
    /// so every column carries a default.
    decl: &'static str,
}

struct Table {
    name: &'static str,
    columns: &'static [Column],
    foreign_keys: &'static [&'static str],
}

const fn col(name: &'static str, decl: &'static str) -> Column {
    Column { name, decl }
}

const TABLES: &[Table] = &[
    Table {
        name: "exercises",
        columns: &[
            col("name", "TEXT NOT NULL DEFAULT ''"),
            col("target_muscle", "TEXT"),
            col("instructions", "TEXT"),
            col("difficulty", "INTEGER DEFAULT 1"),
            col("category", "TEXT DEFAULT 'Strength'"),
        ],
        foreign_keys: &[],
    },
    Table {
        name: "workouts",
        columns: &[
            col("timestamp", "TEXT NOT NULL DEFAULT ''"),
            col("total_volume", "REAL DEFAULT 0"),
            col("session_name", "TEXT"),
            col("duration_minutes", "INTEGER DEFAULT 0"),
        ],
        foreign_keys: &[],
    },
    Table {
        name: "sessions",
        columns: &[
            col("name", "TEXT NOT NULL DEFAULT ''"),
            col("created_at", "TEXT"),
        ],
        foreign_keys: &[],
    },
    Table {
        name: "session_items",
        columns: &[
            col("session_id", "INTEGER"),
            col("exercise_id", "INTEGER"),
            col("item_order", "INTEGER DEFAULT 0"),
        ],
        foreign_keys: &[
            "FOREIGN KEY (session_id) REFERENCES sessions (id)",
            "FOREIGN KEY (exercise_id) REFERENCES exercises (id)",
        ],
    },
    Table {
        name: "log_entries",
        columns: &[
            col("workout_id", "INTEGER"),
            col("exercise_id", "INTEGER"),
            col("set_order", "INTEGER DEFAULT 0"),
            col("weight", "REAL DEFAULT 0"),
            col("reps", "INTEGER DEFAULT 0"),
        ],
        foreign_keys: &[
            "FOREIGN KEY (workout_id) REFERENCES workouts (id)",
            "FOREIGN KEY (exercise_id) REFERENCES exercises (id)",
        ],
    },
];

/// What a migration run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub created_tables: Vec<&'static str>,
    /// `table.column` for every column added to an existing table.
    pub added_columns: Vec<String>,
}

impl MigrationReport {
    pub fn created(&self, table: &str) -> bool {
        self.created_tables.iter().any(|t| *t == table)
    }
}

/// Creates missing tables and adds missing columns. Never drops or renames.
pub fn run_migrations(conn: &Connection) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    for table in TABLES {
        if !table_exists(conn, table.name)? {
            create_table(conn, table)?;
            tracing::info!("Created table {}", table.name);
            report.created_tables.push(table.name);
            continue;
        }

        let existing = table_columns(conn, table.name)?;
        for column in table.columns {
            if existing.iter().any(|c| c == column.name) {
                continue;
            }
            add_column(conn, table, column)?;
            tracing::info!("Added column {}.{}", table.name, column.name);
            report
                .added_columns
                .push(format!("{}.{}", table.name, column.name));
        }
    }

    Ok(report)
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

fn create_table(conn: &Connection, table: &Table) -> Result<()> {
    let mut parts = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    parts.extend(
        table
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.decl)),
    );
    parts.extend(table.foreign_keys.iter().map(|fk| fk.to_string()));

    let sql = format!("CREATE TABLE {} ({})", table.name, parts.join(", "));
    conn.execute_batch(&sql)?;
    Ok(())
}

fn add_column(conn: &Connection, table: &Table, column: &Column) -> Result<()> {
    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table.name, column.name, column.decl
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(conn: &Connection, table: &str) -> Vec<String> {
        table_columns(conn, table).unwrap()
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        let report = run_migrations(&conn).unwrap();

        assert_eq!(
            report.created_tables,
            vec!["exercises", "workouts", "sessions", "session_items", "log_entries"]
        );
        assert_eq!(
            columns(&conn, "log_entries"),
            vec!["id", "workout_id", "exercise_id", "set_order", "weight", "reps"]
        );
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let second = run_migrations(&conn).unwrap(); // Should not fail

        assert!(second.created_tables.is_empty());
        assert!(second.added_columns.is_empty());
    }

    #[test]
    fn test_existing_db_gets_missing_columns() {
        let conn = Connection::open_in_memory().unwrap();

        // Simulate a database from before difficulty/category and workout metadata existed
        conn.execute_batch(
            "
            CREATE TABLE exercises (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, target_muscle TEXT, instructions TEXT);
            INSERT INTO exercises (name, target_muscle, instructions) VALUES ('Deadlift', 'Back', 'Lift');
            CREATE TABLE workouts (id INTEGER PRIMARY KEY AUTOINCREMENT, timestamp TEXT NOT NULL);
            INSERT INTO workouts (timestamp) VALUES ('2024-01-01 10:00:00');
        ",
        )
        .unwrap();

        let report = run_migrations(&conn).unwrap();

        assert!(report.added_columns.contains(&"exercises.difficulty".to_string()));
        assert!(report.added_columns.contains(&"workouts.duration_minutes".to_string()));
        assert!(report.created("sessions"));
        assert!(!report.created("exercises"));

        // Existing rows survive and pick up the defaults
        let (difficulty, category): (i64, String) = conn
            .query_row(
                "SELECT difficulty, category FROM exercises WHERE name = 'Deadlift'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(difficulty, 1);
        assert_eq!(category, "Strength");

        let volume: f64 = conn
            .query_row("SELECT total_volume FROM workouts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(volume, 0.0);
    }
}
