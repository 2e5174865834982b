//! Text tables read from worksheets, and the column schema of each collection.
//!
//! Row 1 of every worksheet is the header. Cells are always text; typed values
//! are parsed on read and rendered back to text on write. Columns are found by
//! header name, never by position.

use crate::ids;
use crate::models::session_name;

/// A worksheet-backed collection and its canonical header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    /// Routine sheets are rebuilt empty when their id column is missing.
    pub self_heal: bool,
}

pub const EXERCISES: Collection = Collection {
    name: "exercises",
    columns: &["id", "name", "target_muscle", "instructions", "difficulty", "category"],
    self_heal: false,
};

pub const WORKOUTS: Collection = Collection {
    name: "workouts",
    columns: &["id", "timestamp", "total_volume", "session_name", "duration_minutes"],
    self_heal: false,
};

pub const LOG_ENTRIES: Collection = Collection {
    name: "log_entries",
    columns: &["id", "workout_id", "exercise_id", "set_order", "weight", "reps"],
    self_heal: false,
};

pub const SESSIONS: Collection = Collection {
    name: "sessions",
    columns: &["id", "name", "created_at"],
    self_heal: true,
};

pub const SESSION_ITEMS: Collection = Collection {
    name: "session_items",
    columns: &["id", "session_id", "exercise_id", "item_order"],
    self_heal: true,
};

pub const COLLECTIONS: [Collection; 5] = [EXERCISES, WORKOUTS, LOG_ENTRIES, SESSIONS, SESSION_ITEMS];

/// Outcome of checking a live header against a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderCheck {
    Valid,
    /// Routine sheet without an id column; must be rebuilt.
    Heal,
    Missing(&'static str),
}

impl Collection {
    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.to_string()).collect()
    }

    pub fn check(&self, table: &Table) -> HeaderCheck {
        // An empty sheet has no header to check and no rows to misread
        if !table.has_header() {
            return HeaderCheck::Valid;
        }
        if self.self_heal && table.column("id").is_none() {
            return HeaderCheck::Heal;
        }
        match self.columns.iter().find(|c| table.column(c).is_none()) {
            Some(missing) => HeaderCheck::Missing(*missing),
            None => HeaderCheck::Valid,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from raw sheet values. Header cells are trimmed and
    /// short rows are padded to the header width.
    pub fn from_values(values: Vec<Vec<String>>) -> Self {
        let mut values = values.into_iter();
        let Some(header) = values.next() else {
            return Self::default();
        };
        let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();
        let width = header.len();
        let rows = values
            .map(|mut row| {
                row.resize(width.max(row.len()), String::new());
                row
            })
            .collect();
        Self { header, rows }
    }

    pub fn with_header(collection: &Collection) -> Self {
        Self {
            header: collection.header(),
            rows: Vec::new(),
        }
    }

    pub fn has_header(&self) -> bool {
        !self.header.is_empty()
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |row| Record {
            header: &self.header,
            row,
        })
    }

    /// Every cell of a column, in row order.
    pub fn column_values(&self, name: &str) -> Vec<&str> {
        self.records().map(|r| r.text(name)).collect()
    }

    /// Next free id according to this table's id column.
    pub fn next_id(&self) -> Option<i64> {
        ids::next_id(self.column_values("id"))
    }

    /// Lays named cells out in this table's column order. Columns the table
    /// does not know are dropped; columns without a value are left blank.
    /// Without a header the collection's canonical order is used.
    pub fn arrange(&self, collection: &Collection, cells: &[(&str, String)]) -> Vec<String> {
        let header = if self.has_header() {
            self.header.clone()
        } else {
            collection.header()
        };
        header
            .iter()
            .map(|h| {
                cells
                    .iter()
                    .find(|(name, _)| *name == h.as_str())
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Keeps rows for which `keep` returns true; returns how many were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Record) -> bool) -> usize {
        let before = self.rows.len();
        let header = &self.header;
        self.rows.retain(|row| keep(&Record { header, row }));
        before - self.rows.len()
    }

    /// Sets `column` on every row whose id equals `id`. Returns whether any matched.
    pub fn set_by_id(&mut self, id: i64, column: &str, value: &str) -> bool {
        let (Some(id_col), Some(col)) = (self.column("id"), self.column(column)) else {
            return false;
        };
        let mut matched = false;
        for row in &mut self.rows {
            if ids::parse_id(&row[id_col]) == Some(id) {
                row[col] = value.to_string();
                matched = true;
            }
        }
        matched
    }

    /// Header plus rows, as written back to a worksheet.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        if self.has_header() {
            values.push(self.header.clone());
        }
        values.extend(self.rows.iter().cloned());
        values
    }
}

/// One row, read by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    header: &'a [String],
    row: &'a [String],
}

impl<'a> Record<'a> {
    /// Cell text, or "" when the column is absent.
    pub fn text(&self, column: &str) -> &'a str {
        self.header
            .iter()
            .position(|h| h == column)
            .and_then(|idx| self.row.get(idx))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn id(&self, column: &str) -> Option<i64> {
        ids::parse_id(self.text(column))
    }

    pub fn int(&self, column: &str) -> i64 {
        self.id(column).unwrap_or_default()
    }

    pub fn float(&self, column: &str) -> f64 {
        self.text(column).trim().parse().unwrap_or_default()
    }

    /// Blank cells and the literal "None" read as absent.
    pub fn optional_text(&self, column: &str) -> Option<String> {
        session_name(self.text(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn reads_columns_by_name_not_position() {
        let table = Table::from_values(values(&[
            &["name", " id ", "created_at"],
            &["Push Day", "4", "2024-01-01"],
        ]));

        let record = table.records().next().unwrap();
        assert_eq!(record.id("id"), Some(4));
        assert_eq!(record.text("name"), "Push Day");
        assert_eq!(record.text("missing"), "");
    }

    #[test]
    fn short_rows_are_padded() {
        let table = Table::from_values(values(&[&["id", "name", "created_at"], &["1"]]));
        let record = table.records().next().unwrap();
        assert_eq!(record.text("created_at"), "");
    }

    #[test]
    fn empty_sheet_has_no_header() {
        let table = Table::from_values(Vec::new());
        assert!(!table.has_header());
        assert_eq!(SESSIONS.check(&table), HeaderCheck::Valid);
        assert_eq!(table.next_id(), Some(1));
    }

    #[test]
    fn routine_sheet_without_id_needs_healing() {
        let table = Table::from_values(values(&[&["name", "created_at"], &["Legs", ""]]));
        assert_eq!(SESSIONS.check(&table), HeaderCheck::Heal);
        assert_eq!(WORKOUTS.check(&table), HeaderCheck::Missing("id"));
    }

    #[test]
    fn missing_non_id_column_is_reported() {
        let table = Table::from_values(values(&[&["id", "name", "target_muscle"]]));
        assert_eq!(EXERCISES.check(&table), HeaderCheck::Missing("instructions"));
    }

    #[test]
    fn arrange_follows_live_header() {
        let table = Table::from_values(values(&[&["name", "id", "created_at"]]));
        let row = table.arrange(
            &SESSIONS,
            &[("id", "3".into()), ("name", "Arms".into()), ("created_at", "2024-01-01".into())],
        );
        assert_eq!(row, vec!["Arms", "3", "2024-01-01"]);

        let headerless = Table::default().arrange(&SESSIONS, &[("name", "Arms".into())]);
        assert_eq!(headerless, vec!["", "Arms", ""]);
    }

    #[test]
    fn retain_and_set_by_id() {
        let mut table = Table::from_values(values(&[
            &["id", "name", "created_at"],
            &["1", "A", ""],
            &["2", "B", ""],
            &["3.0", "C", ""],
        ]));

        assert!(table.set_by_id(3, "name", "C2"));
        assert!(!table.set_by_id(9, "name", "X"));
        let removed = table.retain(|r| r.id("id") != Some(2));

        assert_eq!(removed, 1);
        assert_eq!(table.column_values("name"), vec!["A", "C2"]);
        assert_eq!(table.next_id(), Some(4));
    }

    #[test]
    fn optional_text_treats_blank_as_absent() {
        let table = Table::from_values(values(&[
            &["id", "session_name"],
            &["1", ""],
            &["2", "None"],
            &["3", "Legs"],
        ]));
        let names: Vec<_> = table.records().map(|r| r.optional_text("session_name")).collect();
        assert_eq!(names, vec![None, None, Some("Legs".to_string())]);
    }
}
