//! Wind resource records and turbine power curve tables.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::table::Table;

/// A single raw wind observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    /// Direction the wind blows from (degrees).
    pub direction: f64,
    /// Wind speed (m/s).
    pub speed: f64,
}

impl WindSample {
    pub fn new(direction: f64, speed: f64) -> Self {
        Self { direction, speed }
    }
}

/// Load wind samples from a CSV file with `direction`/`drct` and `speed`/`sped` columns.
pub fn load_wind_samples<P: AsRef<Path>>(path: P) -> Result<Vec<WindSample>, DataError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = File::open(path).map_err(|e| DataError::io(&source, e))?;
    read_wind_samples(BufReader::new(file), &source)
}

/// Parse wind samples from any buffered reader.
pub fn read_wind_samples<R: BufRead>(reader: R, source: &str) -> Result<Vec<WindSample>, DataError> {
    let table = Table::read(reader, source)?;
    let direction = table
        .column(&["direction", "drct"])
        .ok_or_else(|| DataError::MissingColumn {
            file: source.to_string(),
            column: "direction",
        })?;
    let speed = table
        .column(&["speed", "sped"])
        .ok_or_else(|| DataError::MissingColumn {
            file: source.to_string(),
            column: "speed",
        })?;

    if table.rows.is_empty() {
        return Err(DataError::Empty(source.to_string()));
    }

    (0..table.rows.len())
        .map(|row| {
            Ok(WindSample {
                direction: table.number(source, row, direction)?,
                speed: table.number(source, row, speed)?,
            })
        })
        .collect()
}

/// One row of a power curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerCurveRow {
    /// Wind speed (m/s).
    pub wind_speed: f64,
    /// Thrust coefficient (dimensionless).
    pub thrust_coefficient: f64,
    /// Electrical power output (MW).
    pub power: f64,
}

/// Power curve stored column-wise, sorted by ascending wind speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerCurve {
    speeds: Vec<f64>,
    thrust: Vec<f64>,
    power: Vec<f64>,
}

impl PowerCurve {
    /// Build a power curve from rows, validating ordering and ranges.
    pub fn new(rows: &[PowerCurveRow]) -> Result<Self, DataError> {
        if rows.is_empty() {
            return Err(DataError::InvalidPowerCurve("no rows".to_string()));
        }
        for (i, row) in rows.iter().enumerate() {
            if !(row.wind_speed.is_finite() && row.thrust_coefficient.is_finite() && row.power.is_finite()) {
                return Err(DataError::InvalidPowerCurve(format!("row {} is not finite", i + 1)));
            }
            if !(0.0..=1.0).contains(&row.thrust_coefficient) {
                return Err(DataError::InvalidPowerCurve(format!(
                    "row {} thrust coefficient {} outside [0, 1]",
                    i + 1,
                    row.thrust_coefficient
                )));
            }
        }
        if rows.windows(2).any(|w| w[1].wind_speed < w[0].wind_speed) {
            return Err(DataError::InvalidPowerCurve(
                "wind speeds must be ascending".to_string(),
            ));
        }

        Ok(Self {
            speeds: rows.iter().map(|r| r.wind_speed).collect(),
            thrust: rows.iter().map(|r| r.thrust_coefficient).collect(),
            power: rows.iter().map(|r| r.power).collect(),
        })
    }

    /// Tabulated wind speeds.
    #[inline]
    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    /// Thrust coefficient at row `idx`.
    #[inline]
    pub fn thrust_at(&self, idx: usize) -> f64 {
        self.thrust[idx]
    }

    /// Power output at row `idx`.
    #[inline]
    pub fn power_at(&self, idx: usize) -> f64 {
        self.power[idx]
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    /// Always false for a validated curve.
    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }
}

/// Load a power curve CSV: header row, then `speed, thrust, power` columns.
pub fn load_power_curve<P: AsRef<Path>>(path: P) -> Result<PowerCurve, DataError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = File::open(path).map_err(|e| DataError::io(&source, e))?;
    read_power_curve(BufReader::new(file), &source)
}

/// Parse a power curve from any buffered reader.
pub fn read_power_curve<R: BufRead>(reader: R, source: &str) -> Result<PowerCurve, DataError> {
    let table = Table::read(reader, source)?;
    if table.header.len() < 3 {
        return Err(DataError::MissingColumn {
            file: source.to_string(),
            column: "power",
        });
    }

    let rows = (0..table.rows.len())
        .map(|row| {
            Ok(PowerCurveRow {
                wind_speed: table.number(source, row, 0)?,
                thrust_coefficient: table.number(source, row, 1)?,
                power: table.number(source, row, 2)?,
            })
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    PowerCurve::new(&rows)
}

/// Errors raised while reading external data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("I/O error on {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: io::Error,
    },
    #[error("{0} contains no data")]
    Empty(String),
    #[error("{file} has no `{column}` column")]
    MissingColumn { file: String, column: &'static str },
    #[error("{file} row {row} has no column {column}")]
    MissingCell {
        file: String,
        row: usize,
        column: usize,
    },
    #[error("{file} row {row}: `{value}` is not a number")]
    InvalidNumber {
        file: String,
        row: usize,
        value: String,
    },
    #[error("{file} holds {found} turbines, expected {expected}")]
    TurbineCount {
        file: String,
        expected: usize,
        found: usize,
    },
    #[error("Invalid power curve: {0}")]
    InvalidPowerCurve(String),
}

impl DataError {
    pub(crate) fn io(file: &str, source: io::Error) -> Self {
        Self::Io {
            file: file.to_string(),
            source,
        }
    }
}
