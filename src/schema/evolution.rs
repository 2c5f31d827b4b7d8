//! Genome, progress and result types for evolution runs.

use serde::{Deserialize, Serialize};

// ============================================================================
// Genome Representation
// ============================================================================

/// Fixed-length sequence of action codes driving one simulation run.
///
/// Codes `0..=3` map to unit moves; any other code is a zero-delta move.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome {
    genes: Vec<u8>,
}

impl Genome {
    /// Wrap a sequence of action codes.
    pub fn new(genes: Vec<u8>) -> Self {
        Self { genes }
    }

    /// Action codes in order.
    pub fn genes(&self) -> &[u8] {
        &self.genes
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn into_genes(self) -> Vec<u8> {
        self.genes
    }
}

impl From<Vec<u8>> for Genome {
    fn from(genes: Vec<u8>) -> Self {
        Self::new(genes)
    }
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Read-only statistics for one ranked generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Generation index (0-based).
    pub generation: usize,
    /// Fitness of the top-ranked agent.
    pub best_fitness: f64,
    /// Mean fitness over the population.
    pub avg_fitness: f64,
    /// Fitness of the bottom-ranked agent.
    pub worst_fitness: f64,
    /// Items collected by the top-ranked agent.
    pub items_collected: u32,
    /// Movement cost paid by the top-ranked agent.
    pub total_movement_cost: u64,
    /// Distinct cells visited by the top-ranked agent.
    pub unique_visited: usize,
    /// Visits beyond the first to any cell, for the top-ranked agent.
    pub revisits: u64,
    /// Mutation rate in effect when this generation was ranked.
    pub mutation_rate: f64,
    /// Generations since the last strict improvement, after this ranking.
    pub stagnation_count: usize,
}

/// Evolution history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f64>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f64>,
    /// Worst fitness per generation.
    pub worst_fitness: Vec<f64>,
    /// Unique cells visited by the best agent per generation.
    pub unique_positions: Vec<usize>,
    /// Revisits by the best agent per generation.
    pub revisits: Vec<u64>,
}

impl EvolutionHistory {
    /// Append one generation's statistics.
    pub fn record(&mut self, report: &GenerationReport) {
        self.best_fitness.push(report.best_fitness);
        self.avg_fitness.push(report.avg_fitness);
        self.worst_fitness.push(report.worst_fitness);
        self.unique_positions.push(report.unique_visited);
        self.revisits.push(report.revisits);
    }

    /// Number of recorded generations.
    pub fn len(&self) -> usize {
        self.best_fitness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_fitness.is_empty()
    }
}

/// Current phase of the evolution state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// Building the population and world template.
    #[default]
    Initializing,
    /// Scoring every agent against the template.
    Evaluating,
    /// Population sorted and statistics recorded.
    Ranked,
    /// Producing the next generation.
    Breeding,
    /// All generations run.
    Complete,
    /// Stopped early through the cancel handle.
    Stopped,
}

/// Snapshot of an evaluated agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub genome: Genome,
    pub fitness: f64,
    pub items_collected: u32,
    pub total_movement_cost: u64,
    pub unique_visited: usize,
    pub revisits: u64,
    /// Genes applied before the run ended.
    pub actions_taken: usize,
    pub won: bool,
}

/// Final result of an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Top-ranked agent of the final population.
    pub best: AgentSnapshot,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Per-generation history.
    pub history: EvolutionHistory,
}

/// Statistics from an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations completed.
    pub generations: usize,
    /// Simulator runs performed, including the final ranking pass.
    pub total_evaluations: u64,
    /// Best fitness seen in any ranked generation.
    pub best_fitness: f64,
    /// Average fitness of the final population.
    pub final_avg_fitness: f64,
    /// Mutation rate after the last generation.
    pub final_mutation_rate: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Ran the configured number of generations.
    MaxGenerations,
    /// User cancelled.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genome_serializes_as_plain_array() {
        let genome = Genome::new(vec![0, 1, 2, 3]);
        let json = serde_json::to_string(&genome).unwrap();
        assert_eq!(json, "[0,1,2,3]");
        let parsed: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, genome);
    }

    #[test]
    fn test_history_record() {
        let mut history = EvolutionHistory::default();
        history.record(&GenerationReport {
            generation: 0,
            best_fitness: 10.0,
            avg_fitness: 5.0,
            worst_fitness: -1.0,
            items_collected: 1,
            total_movement_cost: 4,
            unique_visited: 3,
            revisits: 2,
            mutation_rate: 0.05,
            stagnation_count: 0,
        });
        assert_eq!(history.len(), 1);
        assert_eq!(history.worst_fitness, vec![-1.0]);
        assert_eq!(history.revisits, vec![2]);
    }
}
