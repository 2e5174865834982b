//! Per-handle snapshot of worksheet tables.
//!
//! A table stays cached for the life of the [`SheetStore`](super::SheetStore)
//! that owns it. There is no expiry and no change detection: edits made to the
//! spreadsheet elsewhere stay invisible until the entry is invalidated.
//!
//! Appends are written through as the same text that was sent, which assumes
//! the remote returns exactly that text when read back. Values are sent as raw
//! strings so no number or date formatting is applied on the remote side.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::table::Table;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct TableCache {
    tables: HashMap<String, Table>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sheet: &str) -> Option<&Table> {
        self.tables.get(sheet)
    }

    pub fn contains(&self, sheet: &str) -> bool {
        self.tables.contains_key(sheet)
    }

    /// Cached table, or the result of `fetch` stored for next time.
    pub fn get_or_fetch(
        &mut self,
        sheet: &str,
        fetch: impl FnOnce() -> Result<Table>,
    ) -> Result<&Table> {
        match self.tables.entry(sheet.to_string()) {
            Entry::Occupied(entry) => {
                tracing::debug!("Cache hit for {}", sheet);
                Ok(&*entry.into_mut())
            }
            Entry::Vacant(entry) => {
                tracing::debug!("Cache miss for {}", sheet);
                Ok(&*entry.insert(fetch()?))
            }
        }
    }

    /// Replaces the entry, as after a fetch or a whole-table rewrite.
    pub fn store(&mut self, sheet: &str, table: Table) {
        self.tables.insert(sheet.to_string(), table);
    }

    /// Mirrors rows that were just appended remotely.
    ///
    /// An entry cached before the sheet had a header cannot place the rows, so
    /// it is dropped and the next read fetches the sheet again.
    pub fn appended(&mut self, sheet: &str, rows: &[Vec<String>]) {
        let Some(table) = self.tables.get_mut(sheet) else {
            return;
        };
        if !table.has_header() {
            tracing::debug!("Dropping headerless cache entry for {}", sheet);
            self.tables.remove(sheet);
            return;
        }
        for row in rows {
            table.push(row.clone());
        }
    }

    pub fn invalidate(&mut self, sheet: &str) {
        self.tables.remove(sheet);
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}
