//! Configuration types for grid world evolution runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level configuration for an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Number of actions in every genome.
    #[serde(default = "default_genome_length")]
    pub genome_length: usize,
    /// Number of agents in the population.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Number of generations to run.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Swap-mutation probability at generation 0.
    #[serde(default = "default_initial_mutation_rate")]
    pub initial_mutation_rate: f64,
    /// Floor applied after each decay.
    #[serde(default = "default_min_mutation_rate")]
    pub min_mutation_rate: f64,
    /// Multiplicative decay applied after every generation.
    #[serde(default = "default_mutation_decay")]
    pub mutation_decay: f64,
    /// Multiplier applied to the mutation rate when stagnation is detected.
    #[serde(default = "default_stagnation_boost")]
    pub stagnation_boost: f64,
    /// Number of top agents carried into the next generation unchanged.
    #[serde(default = "default_elite_size")]
    pub elite_size: usize,
    /// Fraction of the population injected as fresh random agents.
    #[serde(default = "default_immigration_rate")]
    pub immigration_rate: f64,
    /// Generations without strict improvement before the mutation rate spikes.
    #[serde(default = "default_stagnation_threshold")]
    pub stagnation_threshold: usize,
    /// Tournament size at generation 0.
    #[serde(default = "default_tournament_size_min")]
    pub tournament_size_min: usize,
    /// Tournament size reached at the last generation.
    #[serde(default = "default_tournament_size_max")]
    pub tournament_size_max: usize,
    /// Parent selection strategy.
    #[serde(default)]
    pub selection: SelectionMethod,
    /// World template settings.
    #[serde(default)]
    pub world: WorldConfig,
    /// Seed for the search RNG. `None` draws from entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            genome_length: default_genome_length(),
            population_size: default_population_size(),
            generations: default_generations(),
            initial_mutation_rate: default_initial_mutation_rate(),
            min_mutation_rate: default_min_mutation_rate(),
            mutation_decay: default_mutation_decay(),
            stagnation_boost: default_stagnation_boost(),
            elite_size: default_elite_size(),
            immigration_rate: default_immigration_rate(),
            stagnation_threshold: default_stagnation_threshold(),
            tournament_size_min: default_tournament_size_min(),
            tournament_size_max: default_tournament_size_max(),
            selection: SelectionMethod::default(),
            world: WorldConfig::default(),
            random_seed: None,
        }
    }
}

fn default_genome_length() -> usize {
    500
}
fn default_population_size() -> usize {
    1000
}
fn default_generations() -> usize {
    110
}
fn default_initial_mutation_rate() -> f64 {
    0.05
}
fn default_min_mutation_rate() -> f64 {
    0.001
}
fn default_mutation_decay() -> f64 {
    0.99
}
fn default_stagnation_boost() -> f64 {
    1.5
}
fn default_elite_size() -> usize {
    50
}
fn default_immigration_rate() -> f64 {
    0.1
}
fn default_stagnation_threshold() -> usize {
    20
}
fn default_tournament_size_min() -> usize {
    20
}
fn default_tournament_size_max() -> usize {
    70
}

/// Parent selection strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Tournament whose size grows linearly over the run.
    #[default]
    AdaptiveTournament,
    /// Linear rank weighting, best agent weighted `N`, worst weighted `1`.
    RankBased,
}

impl SelectionMethod {
    /// Configuration name of the strategy.
    pub fn name(self) -> &'static str {
        match self {
            SelectionMethod::AdaptiveTournament => "adaptive_tournament",
            SelectionMethod::RankBased => "rank_based",
        }
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SelectionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adaptive_tournament" => Ok(SelectionMethod::AdaptiveTournament),
            "rank_based" => Ok(SelectionMethod::RankBased),
            other => Err(ConfigError::UnknownSelection(other.to_string())),
        }
    }
}

/// Grid world template settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    #[serde(default = "default_grid_size")]
    pub width: usize,
    /// Grid height in cells.
    #[serde(default = "default_grid_size")]
    pub height: usize,
    /// Number of items placed on the grid.
    #[serde(default = "default_item_count")]
    pub item_count: usize,
    /// Seed for terrain and item placement.
    #[serde(default = "default_world_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_grid_size(),
            height: default_grid_size(),
            item_count: default_item_count(),
            seed: default_world_seed(),
        }
    }
}

fn default_grid_size() -> usize {
    10
}
fn default_item_count() -> usize {
    5
}
fn default_world_seed() -> u64 {
    42
}

impl WorldConfig {
    /// Total number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Validate world parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        // The start cell never holds an item.
        if self.item_count >= self.cell_count() {
            return Err(ConfigError::TooManyItems {
                items: self.item_count,
                cells: self.cell_count(),
            });
        }
        Ok(())
    }
}

impl EvolutionConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world.validate()?;

        if self.genome_length == 0 {
            return Err(ConfigError::EmptyGenome);
        }
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.elite_size > self.population_size {
            return Err(ConfigError::EliteTooLarge {
                elite: self.elite_size,
                population: self.population_size,
            });
        }

        let check_rate = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidRate { name, value })
            }
        };
        check_rate(self.initial_mutation_rate, "initial_mutation_rate")?;
        check_rate(self.min_mutation_rate, "min_mutation_rate")?;
        check_rate(self.immigration_rate, "immigration_rate")?;

        if self.min_mutation_rate > self.initial_mutation_rate {
            return Err(ConfigError::InvalidRate {
                name: "min_mutation_rate",
                value: self.min_mutation_rate,
            });
        }
        if !(self.mutation_decay > 0.0 && self.mutation_decay <= 1.0) {
            return Err(ConfigError::InvalidRate {
                name: "mutation_decay",
                value: self.mutation_decay,
            });
        }
        if !(self.stagnation_boost >= 1.0) {
            return Err(ConfigError::InvalidBoost(self.stagnation_boost));
        }

        if self.selection == SelectionMethod::AdaptiveTournament {
            if self.tournament_size_min == 0 || self.tournament_size_min > self.tournament_size_max
            {
                return Err(ConfigError::InvalidTournament {
                    min: self.tournament_size_min,
                    max: self.tournament_size_max,
                });
            }
            if self.tournament_size_max > self.population_size {
                return Err(ConfigError::TournamentTooLarge {
                    size: self.tournament_size_max,
                    population: self.population_size,
                });
            }
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Unknown selection method '{0}' (expected 'adaptive_tournament' or 'rank_based')")]
    UnknownSelection(String),
    #[error("Grid dimensions must be non-zero")]
    InvalidDimensions,
    #[error("{items} items do not fit on a grid of {cells} cells")]
    TooManyItems { items: usize, cells: usize },
    #[error("Genome length must be positive")]
    EmptyGenome,
    #[error("Population size must be positive")]
    EmptyPopulation,
    #[error("Elite size {elite} exceeds population size {population}")]
    EliteTooLarge { elite: usize, population: usize },
    #[error("Invalid {name}: {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("Stagnation boost must be at least 1.0, got {0}")]
    InvalidBoost(f64),
    #[error("Invalid tournament size range [{min}, {max}]")]
    InvalidTournament { min: usize, max: usize },
    #[error("Tournament size {size} exceeds population size {population}")]
    TournamentTooLarge { size: usize, population: usize },
}
