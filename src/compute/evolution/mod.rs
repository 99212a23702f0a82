//! Evolutionary search over turbine layouts.
//!
//! # Overview
//!
//! The search system consists of:
//!
//! - **Genome Operations** (`genome`): random placement, blend crossover and turbine displacement
//! - **Fitness** (`fitness`): parallel AEP scoring of a population
//! - **Search** (`search`): the generational loop with elitism and tournament selection
//! - **Archive** (`archive`): per-generation best layouts, seed loading and result export
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wake_layout::compute::{WindHistogram, WindModelContext};
//! use wake_layout::compute::evolution::EvolutionEngine;
//! use wake_layout::schema::{EvolutionConfig, load_power_curve, load_wind_samples};
//!
//! let curve = load_power_curve("power_curve.csv").unwrap();
//! let histogram = WindHistogram::from_samples(&load_wind_samples("wind_2007.csv").unwrap());
//!
//! let config = EvolutionConfig::default();
//! let context = WindModelContext::new(config.farm.turbine.radius(), curve, &histogram);
//!
//! let mut engine = EvolutionEngine::new(config, Arc::new(context)).unwrap();
//! let result = engine
//!     .run_with_callback(|progress| {
//!         println!("Generation {}: best AEP = {:.3} GWh", progress.generation, progress.best_aep);
//!     })
//!     .unwrap();
//!
//! println!("Best AEP: {:.3} GWh", result.best.aep);
//! ```

mod archive;
mod fitness;
mod genome;
mod search;

pub use archive::{ArchivedLayout, LayoutArchive, load_result, load_seed_layouts, save_result};
pub use fitness::FitnessEvaluator;
pub use genome::{LayoutRng, MutationPlan, Offspring, PlacementError};
pub use search::{Candidate, EvolutionEngine, SearchError};
