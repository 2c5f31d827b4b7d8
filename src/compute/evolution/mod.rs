//! Evolutionary search over grid world action sequences.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Genome Operations** (`genome`): Random generation, two-point crossover, swap mutation
//! - **Selection** (`selection`): Adaptive tournament and rank-based parent picking
//! - **Agents** (`agent`): Genome plus evaluation outputs
//! - **Search** (`search`): The generational engine and mutation-rate schedule
//! - **Agent Export** (`archive`): JSON hand-off of evolved agents
//!
//! # Example
//!
//! ```rust,no_run
//! use grid_evolve::schema::EvolutionConfig;
//! use grid_evolve::compute::evolution::EvolutionEngine;
//!
//! let config = EvolutionConfig {
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut engine = EvolutionEngine::new(config).expect("valid config");
//! let result = engine.run_with_callback(|report| {
//!     println!("Generation {}: best fitness = {:.2}",
//!         report.generation, report.best_fitness);
//! });
//!
//! println!("Best agent fitness: {:.2}", result.best.fitness);
//! ```

mod agent;
mod archive;
mod genome;
mod search;
mod selection;

pub use agent::{Agent, rank_population};
pub use archive::{AgentExport, AgentMetadata, load_agent, save_agent, save_agent_in};
pub use genome::{
    ACTION_CODES, GenomeRng, random_genome, splice, swap_mutation, two_point_crossover,
};
pub use search::{EvolutionEngine, EvolutionError, MutationSchedule};
pub use selection::{Selector, tournament_size};
