//! Agents: a genome plus its evaluation outputs.

use crate::compute::simulator::{Evaluation, VisitStats};
use crate::schema::{AgentSnapshot, Genome};

/// A member of the population.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Action sequence. Replaced only by operator output, never edited.
    pub genome: Genome,
    /// Fitness from the latest evaluation; `None` until evaluated.
    pub fitness: Option<f64>,
    /// Items picked up in the latest evaluation.
    pub items_collected: u32,
    /// Terrain cost paid in the latest evaluation.
    pub total_movement_cost: u64,
    /// Per-cell visit counts from the latest evaluation.
    pub visits: Option<VisitStats>,
    /// Genes applied before the latest run ended.
    pub actions_taken: usize,
    /// Whether the latest run reached the win condition.
    pub won: bool,
}

impl Agent {
    /// Unevaluated agent owning `genome`.
    pub fn new(genome: Genome) -> Self {
        Self {
            genome,
            fitness: None,
            items_collected: 0,
            total_movement_cost: 0,
            visits: None,
            actions_taken: 0,
            won: false,
        }
    }

    /// Store the outputs of a simulator run.
    pub fn apply(&mut self, evaluation: Evaluation) {
        self.fitness = Some(evaluation.fitness);
        self.items_collected = evaluation.items_collected;
        self.total_movement_cost = evaluation.total_movement_cost;
        self.visits = Some(evaluation.visits);
        self.actions_taken = evaluation.actions_taken;
        self.won = evaluation.won;
    }

    /// Fitness for ranking; unevaluated agents sort last.
    #[inline]
    pub fn fitness_or_min(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Number of distinct cells visited.
    pub fn unique_visited(&self) -> usize {
        self.visits.as_ref().map_or(0, VisitStats::unique)
    }

    /// Visits beyond the first to any cell.
    pub fn revisits(&self) -> u64 {
        self.visits.as_ref().map_or(0, VisitStats::revisits)
    }

    /// Convert to snapshot for reporting and export.
    pub fn to_snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            genome: self.genome.clone(),
            fitness: self.fitness_or_min(),
            items_collected: self.items_collected,
            total_movement_cost: self.total_movement_cost,
            unique_visited: self.unique_visited(),
            revisits: self.revisits(),
            actions_taken: self.actions_taken,
            won: self.won,
        }
    }
}

/// Sort agents by fitness, best first. Ties keep their current order.
pub fn rank_population(population: &mut [Agent]) {
    population.sort_by(|a, b| b.fitness_or_min().total_cmp(&a.fitness_or_min()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::simulator::evaluate_genome;
    use crate::compute::world::{Item, Terrain, WorldTemplate};

    #[test]
    fn test_apply_evaluation() {
        let mut items = vec![None; 100];
        items[0] = Some(Item::Positive);
        let template =
            WorldTemplate::from_parts(10, 10, vec![Terrain::Normal; 100], items).unwrap();
        let mut agent = Agent::new(Genome::new(vec![0, 0, 1, 1]));
        assert!(!agent.is_evaluated());
        assert_eq!(agent.unique_visited(), 0);

        agent.apply(evaluate_genome(&template, &agent.genome));
        assert!(agent.is_evaluated());
        assert_eq!(agent.unique_visited(), 3);
        assert_eq!(agent.revisits(), 2);
        assert_eq!(agent.actions_taken, 4);
        assert!(!agent.won);

        let snapshot = agent.to_snapshot();
        assert_eq!(snapshot.actions_taken, 4);
        assert!(!snapshot.won);

        let visits = agent.visits.as_ref().unwrap();
        assert!(visits.total() >= visits.unique() as u64);
        assert!(visits.visited().all(|(_, count)| count >= 1));
    }

    #[test]
    fn test_apply_records_early_stop() {
        // 3x3 grid: picking up the only item wins on the first move.
        let mut items = vec![None; 9];
        items[5] = Some(Item::Positive);
        let template = WorldTemplate::from_parts(3, 3, vec![Terrain::Normal; 9], items).unwrap();
        let mut agent = Agent::new(Genome::new(vec![3, 2, 2, 0]));
        agent.apply(evaluate_genome(&template, &agent.genome));
        assert_eq!(agent.actions_taken, 1);
        assert!(agent.won);
        assert!(agent.to_snapshot().won);
    }

    #[test]
    fn test_rank_population() {
        let mut population: Vec<Agent> = [Some(1.0), None, Some(5.0), Some(1.0)]
            .into_iter()
            .enumerate()
            .map(|(i, fitness)| {
                let mut agent = Agent::new(Genome::new(vec![i as u8]));
                agent.fitness = fitness;
                agent
            })
            .collect();
        rank_population(&mut population);
        let order: Vec<u8> = population.iter().map(|a| a.genome.genes()[0]).collect();
        assert_eq!(order, vec![2, 0, 3, 1]);
    }
}
