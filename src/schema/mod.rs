//! Schema module - Configuration, data tables and layout types.

mod config;
mod evolution;
mod layout;
mod resource;
mod run;
mod table;

pub use config::*;
pub use evolution::*;
pub use layout::*;
pub use resource::*;
pub use run::*;
