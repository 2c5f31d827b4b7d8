//! Compute module - World templates, simulation and evolutionary search.

mod simulator;
mod world;

pub mod evolution;

pub use simulator::*;
pub use world::*;
