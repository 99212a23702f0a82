//! Wake Layout - Wind farm energy yield and turbine layout optimization.
//!
//! This crate computes the annual energy production (AEP) of a 50-turbine
//! wind farm under a Jensen wake model and searches for high-yield layouts
//! with an evolutionary algorithm.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration types, input tables and layout persistence
//! - `compute`: Wind binning, power curve lookup, the wake model, constraint
//!   checks and the evolutionary search
//!
//! # Example
//!
//! ```rust,no_run
//! use wake_layout::{
//!     compute::{WindHistogram, WindModelContext, compute_aep, validate},
//!     schema::{FarmConfig, TurbineLayout, load_power_curve, load_wind_samples},
//! };
//!
//! let farm = FarmConfig::default();
//! let curve = load_power_curve("power_curve.csv").unwrap();
//! let samples = load_wind_samples("wind_data_2007.csv").unwrap();
//! let histogram = WindHistogram::from_samples(&samples);
//! let context = WindModelContext::new(farm.turbine.radius(), curve, &histogram);
//!
//! let layout = TurbineLayout::load_csv("turbine_loc_test.csv").unwrap();
//! println!("{}", validate(&layout, &farm.boundary, farm.turbine.diameter));
//! println!("AEP: {:.6} GWh", compute_aep(&layout, &context).unwrap());
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, SearchError};
pub use compute::{AepError, WindHistogram, WindModelContext, compute_aep};
pub use schema::{EvolutionConfig, FarmConfig, RunConfig, TurbineLayout};
