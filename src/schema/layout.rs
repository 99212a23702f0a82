//! Turbine layouts and their CSV persistence format.
//!
//! A layout file has an `x,y` header followed by one row per turbine.
//! Files written by dataframe tools with a leading index column are read too.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::table::Table;
use super::{DataError, TURBINE_COUNT};

/// Turbine coordinates in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurbineLayout {
    positions: Vec<[f64; 2]>,
}

impl TurbineLayout {
    /// Wrap a list of `[x, y]` positions.
    pub fn new(positions: Vec<[f64; 2]>) -> Self {
        Self { positions }
    }

    /// All positions.
    #[inline]
    pub fn positions(&self) -> &[[f64; 2]] {
        &self.positions
    }

    /// Position of turbine `idx`.
    #[inline]
    pub fn position(&self, idx: usize) -> [f64; 2] {
        self.positions[idx]
    }

    /// Move turbine `idx` to `(x, y)`.
    #[inline]
    pub fn set(&mut self, idx: usize, x: f64, y: f64) {
        self.positions[idx] = [x, y];
    }

    /// Number of turbines.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True if `(x, y)` is at least `min_distance` from every turbine in
    /// `self.positions[..count]`, ignoring index `skip`.
    pub fn clear_of(&self, x: f64, y: f64, count: usize, skip: Option<usize>, min_distance: f64) -> bool {
        self.positions[..count]
            .iter()
            .enumerate()
            .filter(|(j, _)| Some(*j) != skip)
            .all(|(_, p)| distance(p[0], p[1], x, y) >= min_distance)
    }

    /// Smallest distance between any two turbines, or `None` for fewer than two.
    pub fn min_spacing(&self) -> Option<f64> {
        let n = self.positions.len();
        let mut min: Option<f64> = None;
        for i in 0..n {
            for j in (i + 1)..n {
                let [xi, yi] = self.positions[i];
                let [xj, yj] = self.positions[j];
                let d = distance(xi, yi, xj, yj);
                min = Some(min.map_or(d, |m| m.min(d)));
            }
        }
        min
    }

    /// Write the layout as CSV.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "x,y")?;
        for [x, y] in &self.positions {
            writeln!(writer, "{},{}", x, y)?;
        }
        writer.flush()
    }

    /// Save the layout to a CSV file, creating parent directories.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), DataError> {
        let path = path.as_ref();
        let source = path.display().to_string();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DataError::io(&source, e))?;
        }
        let file = File::create(path).map_err(|e| DataError::io(&source, e))?;
        self.write_csv(std::io::BufWriter::new(file))
            .map_err(|e| DataError::io(&source, e))
    }

    /// Parse a layout of exactly [`TURBINE_COUNT`] turbines.
    pub fn read_csv<R: BufRead>(reader: R, source: &str) -> Result<Self, DataError> {
        let table = Table::read(reader, source)?;
        let x_col = table.column(&["x"]).ok_or_else(|| DataError::MissingColumn {
            file: source.to_string(),
            column: "x",
        })?;
        let y_col = table.column(&["y"]).ok_or_else(|| DataError::MissingColumn {
            file: source.to_string(),
            column: "y",
        })?;

        if table.rows.len() != TURBINE_COUNT {
            return Err(DataError::TurbineCount {
                file: source.to_string(),
                expected: TURBINE_COUNT,
                found: table.rows.len(),
            });
        }

        let positions = (0..table.rows.len())
            .map(|row| {
                Ok([
                    table.number(source, row, x_col)?,
                    table.number(source, row, y_col)?,
                ])
            })
            .collect::<Result<Vec<_>, DataError>>()?;

        Ok(Self { positions })
    }

    /// Load a layout from a CSV file.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let file = File::open(path).map_err(|e| DataError::io(&source, e))?;
        Self::read_csv(BufReader::new(file), &source)
    }
}

#[inline]
fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
}
