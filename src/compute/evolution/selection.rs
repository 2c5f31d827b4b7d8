//! Parent selection over a ranked population.

use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::*;

use super::agent::Agent;
use crate::schema::{EvolutionConfig, SelectionMethod};

/// Tournament size for a generation.
///
/// Grows linearly from `min` toward `max` with `generation / total`,
/// truncated and clamped to `[min, max]`. An inverted range yields `min`.
pub fn tournament_size(generation: usize, total: usize, min: usize, max: usize) -> usize {
    let progress = if total == 0 {
        0.0
    } else {
        generation as f64 / total as f64
    };
    let k = min + (max.saturating_sub(min) as f64 * progress) as usize;
    k.min(max).max(min)
}

/// Parent picker prepared once per generation from a ranked population.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Pick the fittest of `size` distinct agents drawn uniformly.
    Tournament { size: usize },
    /// Sample by linear rank weight. `order[r]` is the agent at rank `r + 1`.
    RankBased {
        order: Vec<usize>,
        weights: WeightedIndex<usize>,
    },
}

impl Selector {
    /// Prepare the configured strategy for `generation`.
    ///
    /// Returns `None` for an empty population.
    pub fn prepare(
        config: &EvolutionConfig,
        population: &[Agent],
        generation: usize,
    ) -> Option<Self> {
        if population.is_empty() {
            return None;
        }

        match config.selection {
            SelectionMethod::AdaptiveTournament => {
                let size = tournament_size(
                    generation,
                    config.generations,
                    config.tournament_size_min,
                    config.tournament_size_max,
                );
                Some(Selector::Tournament {
                    size: size.clamp(1, population.len()),
                })
            }
            SelectionMethod::RankBased => {
                let mut order: Vec<usize> = (0..population.len()).collect();
                // Stable: equal fitness keeps population order.
                order.sort_by(|&a, &b| {
                    population[b]
                        .fitness_or_min()
                        .total_cmp(&population[a].fitness_or_min())
                });
                let n = order.len();
                let weights = WeightedIndex::new((1..=n).map(|rank| n - rank + 1)).ok()?;
                Some(Selector::RankBased { order, weights })
            }
        }
    }

    /// Pick one parent and return its index into `population`.
    pub fn select<R: Rng + ?Sized>(&self, population: &[Agent], rng: &mut R) -> usize {
        match self {
            Selector::Tournament { size } => {
                let size = (*size).min(population.len());
                let mut best_idx = 0;
                let mut best_fitness = f64::NEG_INFINITY;
                let mut first = true;
                for idx in rand::seq::index::sample(rng, population.len(), size) {
                    let fitness = population[idx].fitness_or_min();
                    if first || fitness > best_fitness {
                        best_idx = idx;
                        best_fitness = fitness;
                        first = false;
                    }
                }
                best_idx
            }
            Selector::RankBased { order, weights } => order[weights.sample(rng)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Genome;

    fn scored(fitness: &[f64]) -> Vec<Agent> {
        fitness
            .iter()
            .map(|&f| {
                let mut agent = Agent::new(Genome::new(vec![0]));
                agent.fitness = Some(f);
                agent
            })
            .collect()
    }

    #[test]
    fn test_tournament_size_schedule() {
        assert_eq!(tournament_size(0, 110, 20, 70), 20);
        assert_eq!(tournament_size(55, 110, 20, 70), 45);
        assert_eq!(tournament_size(109, 110, 20, 70), 69);
        assert_eq!(tournament_size(500, 110, 20, 70), 70);

        let mut last = 0;
        for generation in 0..110 {
            let k = tournament_size(generation, 110, 20, 70);
            assert!((20..=70).contains(&k));
            assert!(k >= last);
            last = k;
        }
    }

    #[test]
    fn test_tournament_size_inverted_range() {
        assert_eq!(tournament_size(0, 10, 8, 3), 8);
        assert_eq!(tournament_size(10, 10, 8, 3), 8);
        assert_eq!(tournament_size(5, 0, 4, 4), 4);
    }

    #[test]
    fn test_full_tournament_returns_best() {
        let population = scored(&[3.0, 9.0, -1.0, 9.0, 4.0]);
        let selector = Selector::Tournament { size: 5 };
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            let idx = selector.select(&population, &mut rng);
            assert_eq!(population[idx].fitness, Some(9.0));
        }
    }

    #[test]
    fn test_tournament_of_one_is_uniform() {
        let population = scored(&[1.0, 2.0, 3.0, 4.0]);
        let selector = Selector::Tournament { size: 1 };
        let mut rng = StdRng::seed_from_u64(9);
        let mut seen = [0usize; 4];
        for _ in 0..4000 {
            seen[selector.select(&population, &mut rng)] += 1;
        }
        assert!(seen.iter().all(|&c| c > 800));
    }

    #[test]
    fn test_rank_based_weights() {
        // Unsorted on purpose: ranking happens inside prepare.
        let population = scored(&[1.0, 3.0, 2.0]);
        let config = EvolutionConfig {
            selection: SelectionMethod::RankBased,
            ..Default::default()
        };
        let selector = Selector::prepare(&config, &population, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let mut seen = [0usize; 3];
        let draws = 60_000;
        for _ in 0..draws {
            seen[selector.select(&population, &mut rng)] += 1;
        }
        // Weights 3:2:1 for ranks 1..3.
        let share = |c: usize| c as f64 / draws as f64;
        assert!((share(seen[1]) - 3.0 / 6.0).abs() < 0.02);
        assert!((share(seen[2]) - 2.0 / 6.0).abs() < 0.02);
        assert!((share(seen[0]) - 1.0 / 6.0).abs() < 0.02);
    }

    #[test]
    fn test_prepare_clamps_tournament_to_population() {
        let population = scored(&[1.0, 2.0]);
        let config = EvolutionConfig::default();
        match Selector::prepare(&config, &population, 0) {
            Some(Selector::Tournament { size }) => assert_eq!(size, 2),
            other => panic!("unexpected selector {other:?}"),
        }
        assert!(Selector::prepare(&config, &[], 0).is_none());
    }
}
