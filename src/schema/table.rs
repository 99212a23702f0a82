//! Minimal comma-separated table reader shared by the data loaders.

use std::io::BufRead;

use super::DataError;

/// A parsed table: one header row and string cells.
#[derive(Debug, Clone)]
pub(crate) struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a table, skipping blank lines. The first non-blank line is the header.
    pub fn read<R: BufRead>(reader: R, source: &str) -> Result<Self, DataError> {
        let mut lines = reader.lines();
        let mut header = None;

        for line in lines.by_ref() {
            let line = line.map_err(|e| DataError::io(source, e))?;
            if !line.trim().is_empty() {
                header = Some(split_row(&line));
                break;
            }
        }

        let header = header.ok_or_else(|| DataError::Empty(source.to_string()))?;
        let mut rows = Vec::new();
        for line in lines {
            let line = line.map_err(|e| DataError::io(source, e))?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(split_row(&line));
        }

        Ok(Self { header, rows })
    }

    /// Index of the first header cell matching any of `names` (case-insensitive).
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        self.header.iter().position(|h| {
            let h = h.trim_matches('"').to_ascii_lowercase();
            names.iter().any(|n| h == *n)
        })
    }

    /// Parse the cell at `(row, col)` as a number.
    pub fn number(&self, source: &str, row: usize, col: usize) -> Result<f64, DataError> {
        let cell = self.rows[row]
            .get(col)
            .ok_or_else(|| DataError::MissingCell {
                file: source.to_string(),
                row: row + 1,
                column: col,
            })?;
        cell.trim_matches('"')
            .parse::<f64>()
            .map_err(|_| DataError::InvalidNumber {
                file: source.to_string(),
                row: row + 1,
                value: cell.clone(),
            })
    }
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',').map(|c| c.trim().to_string()).collect()
}
