//! Per-patient trial metadata table.
//!
//! A tab-separated file with a header row of column names and one row per
//! trial, in trial order matching the cue-event file. Cells may be empty;
//! queries yield an empty-string sentinel for missing cells.

use std::fs;
use std::path::Path;

use crate::error::{EaError, EaResult};

#[derive(Debug, Clone)]
pub struct TrialTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TrialTable {
    pub fn load(path: &Path) -> EaResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> EaResult<Self> {
        let mut lines = text.lines();
        let header = lines.next().ok_or_else(|| {
            EaError::parse(path, 1, "trial table is empty (missing header row)")
        })?;
        let columns: Vec<String> = header.split('\t').map(|c| c.trim().to_owned()).collect();

        let mut rows = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let mut row: Vec<String> =
                line.split('\t').map(|c| c.trim().to_owned()).collect();
            // Short rows are padded so every cell access sees the sentinel.
            row.resize(columns.len(), String::new());
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    /// Number of trials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One cell per trial for a named column.
    pub fn column_by_name(&self, name: &str) -> EaResult<Vec<&str>> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| {
                EaError::DataIntegrity(format!("trial table has no column named `{name}`"))
            })?;
        self.column_by_index(idx)
    }

    /// One cell per trial for a positional column.
    pub fn column_by_index(&self, index: usize) -> EaResult<Vec<&str>> {
        if index >= self.columns.len() {
            return Err(EaError::DataIntegrity(format!(
                "trial table column index {index} out of range ({} columns)",
                self.columns.len()
            )));
        }
        Ok(self.rows.iter().map(|row| row[index].as_str()).collect())
    }
}
