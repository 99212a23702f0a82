//! Wind resource binning.
//!
//! Raw observations are trapped in a fixed 36 x 15 grid of direction/speed
//! cells. Direction cells are centred on multiples of 10 degrees and ordered
//! `[360, 10, 20, ..., 350]`; speed cells are `[0, 2), [2, 4), ..., [28, 30)`.

use crate::schema::WindSample;

/// Number of direction sectors.
pub const DIRECTION_BINS: usize = 36;
/// Number of speed intervals.
pub const SPEED_BINS: usize = 15;
/// Total number of histogram cells.
pub const HISTOGRAM_CELLS: usize = DIRECTION_BINS * SPEED_BINS;

const SECTOR_WIDTH: f64 = 10.0;
const SPEED_BIN_WIDTH: f64 = 2.0;

/// Centre direction (degrees) of sector `idx`. Sector 0 is 360.
#[inline]
pub fn direction_center(idx: usize) -> f64 {
    if idx == 0 {
        360.0
    } else {
        idx as f64 * SECTOR_WIDTH
    }
}

/// Midpoint speed (m/s) of speed interval `idx`.
#[inline]
pub fn speed_midpoint(idx: usize) -> f64 {
    (idx as f64 + 0.5) * SPEED_BIN_WIDTH
}

/// Sector of a direction given exactly on a multiple of 10 degrees.
fn direction_index(direction: f64) -> Option<usize> {
    if !direction.is_finite() || direction.fract() != 0.0 || !(0.0..=360.0).contains(&direction) {
        return None;
    }
    let degrees = direction as u32;
    if degrees % 10 != 0 {
        return None;
    }
    Some((degrees / 10) as usize % DIRECTION_BINS)
}

/// Interval of a speed, using half-open `[lo, hi)` bounds.
fn speed_index(speed: f64) -> Option<usize> {
    if !(speed >= 0.0) {
        return None;
    }
    let idx = (speed / SPEED_BIN_WIDTH).floor() as usize;
    (idx < SPEED_BINS).then_some(idx)
}

/// A representative wind condition with its probability of occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindInstance {
    /// Freestream speed (m/s).
    pub speed: f64,
    /// Direction the wind blows from (degrees).
    pub direction: f64,
    /// Probability weight.
    pub probability: f64,
}

/// Binned wind resource, flattened direction-major.
#[derive(Debug, Clone)]
pub struct WindHistogram {
    counts: Vec<u64>,
    probabilities: Vec<f64>,
    discarded: usize,
}

impl WindHistogram {
    /// Bin raw samples. Samples outside every cell are discarded.
    ///
    /// With no binned samples all probabilities are zero.
    pub fn from_samples(samples: &[WindSample]) -> Self {
        let mut counts = vec![0u64; HISTOGRAM_CELLS];
        let mut discarded = 0;

        for sample in samples {
            match (direction_index(sample.direction), speed_index(sample.speed)) {
                (Some(d), Some(s)) => counts[d * SPEED_BINS + s] += 1,
                _ => discarded += 1,
            }
        }

        if discarded > 0 {
            log::warn!(
                "{} of {} wind samples fell outside the histogram",
                discarded,
                samples.len()
            );
        }

        let total: u64 = counts.iter().sum();
        let probabilities = if total == 0 {
            vec![0.0; HISTOGRAM_CELLS]
        } else {
            counts.iter().map(|&c| c as f64 / total as f64).collect()
        };

        Self {
            counts,
            probabilities,
            discarded,
        }
    }

    /// Probability of each cell, flattened direction-major.
    #[inline]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Probability of the cell at sector `direction` and interval `speed`.
    #[inline]
    pub fn probability(&self, direction: usize, speed: usize) -> f64 {
        self.probabilities[direction * SPEED_BINS + speed]
    }

    /// Raw count of the cell at sector `direction` and interval `speed`.
    #[inline]
    pub fn count(&self, direction: usize, speed: usize) -> u64 {
        self.counts[direction * SPEED_BINS + speed]
    }

    /// Number of samples that were binned.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of samples that fell outside every cell.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Wind instances for every non-empty cell, in histogram order.
    pub fn instances(&self) -> Vec<WindInstance> {
        self.probabilities
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > 0.0)
            .map(|(cell, &probability)| WindInstance {
                speed: speed_midpoint(cell % SPEED_BINS),
                direction: direction_center(cell / SPEED_BINS),
                probability,
            })
            .collect()
    }
}
