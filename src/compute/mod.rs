//! Compute module - Wind binning, wake model and layout search.

mod binning;
mod constraints;
mod lookup;
pub mod wake;

pub mod evolution;

pub use binning::*;
pub use constraints::*;
pub use lookup::*;
pub use wake::{AepError, HOURS_PER_YEAR, WAKE_DECAY, WindModelContext, compute_aep, wake_deficit};
