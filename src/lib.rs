//! Grid Evolve - Genetic search for action sequences in a grid world.
//!
//! This crate evolves fixed-length sequences of movement actions that steer
//! a player around a small deterministic grid. Each cell has a terrain cost,
//! a handful of cells hold items, and a sequence is scored by how many items
//! it collects, how cheaply it moves and how much of the grid it explores.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Configuration, genome and result types
//! - `compute`: World templates, the simulator and the evolutionary search
//! - `replay`: Step-by-step playback of a single genome
//!
//! # Example
//!
//! ```rust,no_run
//! use grid_evolve::{
//!     compute::evolution::EvolutionEngine,
//!     replay::ReplayPlayer,
//!     schema::EvolutionConfig,
//! };
//!
//! let config = EvolutionConfig {
//!     population_size: 200,
//!     generations: 30,
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//!
//! let mut engine = EvolutionEngine::new(config).expect("valid config");
//! let result = engine.run();
//! println!("Best fitness: {:.2}", result.best.fitness);
//!
//! // Walk through the winning sequence
//! for frame in ReplayPlayer::new(engine.template(), &result.best.genome) {
//!     println!("{:?} score={}", frame.position, frame.score);
//! }
//! ```

pub mod compute;
pub mod replay;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{AgentExport, EvolutionEngine};
pub use compute::{Evaluation, GridSimulation, WorldTemplate, evaluate_genome};
pub use schema::{EvolutionConfig, EvolutionResult, Genome, SelectionMethod, WorldConfig};
