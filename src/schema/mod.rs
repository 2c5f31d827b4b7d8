//! Schema module - Configuration, genome and reporting types for evolution runs.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;
