use super::client::SheetClient;
use crate::error::{Result, StoreError};

/// Number of calls made to a [`MemorySheets`], per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub lists: usize,
    pub adds: usize,
    pub reads: usize,
    pub appends: usize,
    pub replaces: usize,
}

impl CallCounts {
    /// Calls that change the spreadsheet.
    pub fn writes(&self) -> usize {
        self.adds + self.appends + self.replaces
    }
}

/// In-process spreadsheet. Worksheets keep their creation order.
#[derive(Debug, Default)]
pub struct MemorySheets {
    sheets: Vec<(String, Vec<Vec<String>>)>,
    calls: CallCounts,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a worksheet's contents, creating it if needed, without counting
    /// a call. Stands in for someone editing the document by hand.
    pub fn put_values(&mut self, title: &str, values: Vec<Vec<String>>) {
        match self.sheet_mut(title) {
            Some(existing) => *existing = values,
            None => self.sheets.push((title.to_string(), values)),
        }
    }

    pub fn with_sheet(mut self, title: &str, values: Vec<Vec<String>>) -> Self {
        self.put_values(title, values);
        self
    }

    pub fn values(&self, title: &str) -> Option<&[Vec<String>]> {
        self.sheets
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, v)| v.as_slice())
    }

    pub fn titles(&self) -> Vec<&str> {
        self.sheets.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn calls(&self) -> CallCounts {
        self.calls
    }

    pub fn reset_calls(&mut self) {
        self.calls = CallCounts::default();
    }

    fn sheet_mut(&mut self, title: &str) -> Option<&mut Vec<Vec<String>>> {
        self.sheets
            .iter_mut()
            .find(|(t, _)| t == title)
            .map(|(_, v)| v)
    }

    fn existing(&mut self, title: &str) -> Result<&mut Vec<Vec<String>>> {
        self.sheet_mut(title).ok_or_else(|| StoreError::Api {
            status: 400,
            body: format!("Unable to parse range: '{}'", title),
        })
    }
}

impl SheetClient for MemorySheets {
    fn worksheet_titles(&mut self) -> Result<Vec<String>> {
        self.calls.lists += 1;
        Ok(self.sheets.iter().map(|(t, _)| t.clone()).collect())
    }

    fn add_worksheet(&mut self, title: &str) -> Result<()> {
        self.calls.adds += 1;
        if self.sheets.iter().any(|(t, _)| t.eq_ignore_ascii_case(title)) {
            return Err(StoreError::Api {
                status: 400,
                body: format!("A sheet with the name \"{}\" already exists.", title),
            });
        }
        self.sheets.push((title.to_string(), Vec::new()));
        Ok(())
    }

    fn read_values(&mut self, title: &str) -> Result<Vec<Vec<String>>> {
        self.calls.reads += 1;
        Ok(self.existing(title)?.clone())
    }

    fn append_rows(&mut self, title: &str, rows: &[Vec<String>]) -> Result<()> {
        self.calls.appends += 1;
        self.existing(title)?.extend(rows.iter().cloned());
        Ok(())
    }

    fn replace_values(&mut self, title: &str, values: &[Vec<String>]) -> Result<()> {
        self.calls.replaces += 1;
        *self.existing(title)? = values.to_vec();
        Ok(())
    }
}
