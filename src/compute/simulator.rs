//! Deterministic grid simulation and fitness scoring for one genome.

use serde::{Deserialize, Serialize};

use super::world::{Item, WorldTemplate};
use crate::schema::Genome;

/// Score at the start of every run.
pub const INITIAL_SCORE: i64 = 100;

const ITEM_WEIGHT: i64 = 300;
const MOVEMENT_COST_WEIGHT: i64 = 2;
const SCORE_WEIGHT: f64 = 1.5;
const MISSING_ITEM_PENALTY: i64 = 150;
const UNIQUE_VISIT_WEIGHT: i64 = 15;
/// Item count the missing-item penalty is measured against, independent of
/// how many items a template actually holds.
pub const FITNESS_ITEM_COUNT: i64 = 5;
const REVISIT_PENALTY: i64 = 10;

/// Unit move encoded by a gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions in code order.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Decode an action code. Unknown codes yield `None`.
    #[inline]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Displacement `(dx, dy)`; `y` grows downward.
    #[inline]
    pub fn delta(self) -> (i64, i64) {
        match self {
            Action::Up => (0, -1),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }
}

/// Displacement for a raw gene; unknown codes do not move.
#[inline]
fn code_delta(code: u8) -> (i64, i64) {
    Action::from_code(code).map_or((0, 0), Action::delta)
}

/// Result of applying a single gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Target cell was off the grid; nothing changed.
    Blocked,
    /// Player entered the target cell.
    Moved {
        /// Terrain cost paid.
        cost: i64,
        /// Whether an item was picked up.
        picked_up: bool,
    },
}

/// Per-cell visit counts for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitStats {
    width: usize,
    counts: Vec<u32>,
}

impl VisitStats {
    /// Empty statistics for a grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            counts: vec![0; width * height],
        }
    }

    fn clear(&mut self) {
        self.counts.fill(0);
    }

    #[inline]
    fn record(&mut self, index: usize) {
        self.counts[index] += 1;
    }

    /// Visit count for a cell (0 if never visited).
    pub fn count(&self, x: usize, y: usize) -> u32 {
        if x >= self.width {
            return 0;
        }
        self.counts.get(y * self.width + x).copied().unwrap_or(0)
    }

    /// Number of distinct cells visited.
    pub fn unique(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Sum of all visit counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Visits beyond the first to any cell.
    pub fn revisits(&self) -> u64 {
        self.total() - self.unique() as u64
    }

    /// Visited cells with their counts, row-major order.
    pub fn visited(&self) -> impl Iterator<Item = ((usize, usize), u32)> + '_ {
        let width = self.width;
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(move |(idx, c)| ((idx % width, idx / width), *c))
    }
}

/// Outputs of scoring one genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub fitness: f64,
    pub items_collected: u32,
    pub total_movement_cost: u64,
    /// Remaining score at termination.
    pub score: i64,
    pub visits: VisitStats,
    /// Genes consumed before termination.
    pub actions_taken: usize,
    pub won: bool,
}

/// Combine run statistics into a fitness value.
///
/// Integer terms are exact; only the remaining score is scaled by a
/// fractional weight, so equal inputs always give bit-identical output.
pub fn compute_fitness(
    items_collected: u32,
    total_movement_cost: u64,
    score: i64,
    unique_visited: usize,
    total_visits: u64,
) -> f64 {
    let items = items_collected as i64;
    let missing = FITNESS_ITEM_COUNT - items;
    let unique = unique_visited as i64;
    let revisits = total_visits as i64 - unique;

    (items * ITEM_WEIGHT) as f64 - (total_movement_cost as i64 * MOVEMENT_COST_WEIGHT) as f64
        + score as f64 * SCORE_WEIGHT
        - (missing * MISSING_ITEM_PENALTY) as f64
        + (unique * UNIQUE_VISIT_WEIGHT) as f64
        - (revisits * REVISIT_PENALTY) as f64
}

/// Mutable world state for one run against a shared template.
#[derive(Debug, Clone)]
pub struct GridSimulation<'a> {
    template: &'a WorldTemplate,
    x: usize,
    y: usize,
    score: i64,
    items: Vec<Option<Item>>,
    items_remaining: usize,
    visible: Vec<bool>,
    visible_count: usize,
    items_collected: u32,
    total_movement_cost: u64,
    visits: VisitStats,
    won: bool,
}

impl<'a> GridSimulation<'a> {
    /// Create a simulation in its reset state.
    pub fn new(template: &'a WorldTemplate) -> Self {
        let cells = template.cell_count();
        let (x, y) = template.start();
        let mut sim = Self {
            template,
            x,
            y,
            score: INITIAL_SCORE,
            items: Vec::with_capacity(cells),
            items_remaining: 0,
            visible: vec![false; cells],
            visible_count: 0,
            items_collected: 0,
            total_movement_cost: 0,
            visits: VisitStats::new(template.width(), template.height()),
            won: false,
        };
        sim.reset();
        sim
    }

    /// Restore the start state: player at the center, fresh item copy,
    /// start neighbourhood visible and the start cell visited once.
    pub fn reset(&mut self) {
        let (x, y) = self.template.start();
        self.x = x;
        self.y = y;
        self.score = INITIAL_SCORE;
        self.items.clear();
        self.items.extend_from_slice(self.template.items());
        self.items_remaining = self.template.item_count();
        self.visible.fill(false);
        self.visible_count = 0;
        self.items_collected = 0;
        self.total_movement_cost = 0;
        self.visits.clear();
        self.won = false;

        self.reveal_neighbourhood();
        self.visits.record(self.template.index(x, y));
    }

    /// Apply one gene.
    pub fn step(&mut self, code: u8) -> StepOutcome {
        let (dx, dy) = code_delta(code);
        let nx = self.x as i64 + dx;
        let ny = self.y as i64 + dy;
        if nx < 0
            || ny < 0
            || nx >= self.template.width() as i64
            || ny >= self.template.height() as i64
        {
            return StepOutcome::Blocked;
        }
        let (nx, ny) = (nx as usize, ny as usize);

        let cost = self.template.terrain_at(nx, ny).movement_cost();
        self.score -= cost;
        self.total_movement_cost += cost as u64;
        self.x = nx;
        self.y = ny;

        let index = self.template.index(nx, ny);
        let picked_up = match self.items[index].take() {
            Some(item) => {
                self.score += item.reward();
                self.items_collected += 1;
                self.items_remaining -= 1;
                true
            }
            None => false,
        };

        self.reveal_neighbourhood();
        if self.score <= 0 {
            self.score = 0;
        }
        self.visits.record(index);

        StepOutcome::Moved { cost, picked_up }
    }

    /// Set the win flag once every item is gone and every cell has been seen.
    pub fn check_win(&mut self) -> bool {
        if self.items_remaining == 0 && self.visible_count == self.template.cell_count() {
            self.won = true;
        }
        self.won
    }

    /// True once no further genes may be applied.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.score <= 0 || self.won
    }

    /// Run a genome from the reset state and score it.
    pub fn run(&mut self, genome: &Genome) -> Evaluation {
        self.reset();
        self.check_win();

        let mut actions_taken = 0;
        for &code in genome.genes() {
            if self.is_finished() {
                break;
            }
            self.step(code);
            actions_taken += 1;
            self.check_win();
        }

        self.evaluation(actions_taken)
    }

    /// Score the current state.
    pub fn fitness(&self) -> f64 {
        compute_fitness(
            self.items_collected,
            self.total_movement_cost,
            self.score,
            self.visits.unique(),
            self.visits.total(),
        )
    }

    fn evaluation(&self, actions_taken: usize) -> Evaluation {
        Evaluation {
            fitness: self.fitness(),
            items_collected: self.items_collected,
            total_movement_cost: self.total_movement_cost,
            score: self.score,
            visits: self.visits.clone(),
            actions_taken,
            won: self.won,
        }
    }

    fn reveal_neighbourhood(&mut self) {
        let width = self.template.width();
        let height = self.template.height();
        let x_range = self.x.saturating_sub(1)..=(self.x + 1).min(width - 1);
        for ny in self.y.saturating_sub(1)..=(self.y + 1).min(height - 1) {
            for nx in x_range.clone() {
                let idx = ny * width + nx;
                if !self.visible[idx] {
                    self.visible[idx] = true;
                    self.visible_count += 1;
                }
            }
        }
    }

    /// Player position.
    #[inline]
    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    #[inline]
    pub fn score(&self) -> i64 {
        self.score
    }

    #[inline]
    pub fn items_collected(&self) -> u32 {
        self.items_collected
    }

    #[inline]
    pub fn items_remaining(&self) -> usize {
        self.items_remaining
    }

    #[inline]
    pub fn total_movement_cost(&self) -> u64 {
        self.total_movement_cost
    }

    /// Number of cells seen so far.
    #[inline]
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    #[inline]
    pub fn is_visible(&self, x: usize, y: usize) -> bool {
        self.visible[self.template.index(x, y)]
    }

    /// Item still lying on a cell.
    #[inline]
    pub fn item_at(&self, x: usize, y: usize) -> Option<Item> {
        self.items[self.template.index(x, y)]
    }

    #[inline]
    pub fn visits(&self) -> &VisitStats {
        &self.visits
    }

    #[inline]
    pub fn is_won(&self) -> bool {
        self.won
    }

    #[inline]
    pub fn template(&self) -> &'a WorldTemplate {
        self.template
    }
}

/// Score a genome against a template from a fresh state.
pub fn evaluate_genome(template: &WorldTemplate, genome: &Genome) -> Evaluation {
    GridSimulation::new(template).run(genome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::world::Terrain;
    use crate::schema::WorldConfig;

    const UP: u8 = 0;
    const DOWN: u8 = 1;
    const LEFT: u8 = 2;
    const RIGHT: u8 = 3;

    /// 10x10 all-normal grid with the given overrides. Start is (5, 5).
    fn template(terrain: &[((usize, usize), Terrain)], items: &[(usize, usize)]) -> WorldTemplate {
        let mut t = vec![Terrain::Normal; 100];
        for &((x, y), kind) in terrain {
            t[y * 10 + x] = kind;
        }
        let mut i = vec![None; 100];
        for &(x, y) in items {
            i[y * 10 + x] = Some(Item::Positive);
        }
        WorldTemplate::from_parts(10, 10, t, i).unwrap()
    }

    #[test]
    fn test_empty_genome_fitness() {
        let template = WorldTemplate::generate(&WorldConfig::default()).unwrap();
        let eval = evaluate_genome(&template, &Genome::new(Vec::new()));
        assert_eq!(eval.fitness, -585.0);
        assert_eq!(eval.score, 100);
        assert_eq!(eval.items_collected, 0);
        assert_eq!(eval.total_movement_cost, 0);
        assert_eq!(eval.visits.unique(), 1);
        assert_eq!(eval.visits.revisits(), 0);
        assert_eq!(eval.actions_taken, 0);
    }

    #[test]
    fn test_terrain_costs() {
        let cases = [
            (Terrain::Normal, 1),
            (Terrain::Mud, 10),
            (Terrain::Water, 50),
        ];
        for (kind, cost) in cases {
            let template = template(&[((5, 4), kind)], &[(0, 0)]);
            let mut sim = GridSimulation::new(&template);
            let outcome = sim.step(UP);
            assert_eq!(
                outcome,
                StepOutcome::Moved {
                    cost,
                    picked_up: false
                }
            );
            assert_eq!(sim.score(), 100 - cost);
            assert_eq!(sim.total_movement_cost(), cost as u64);
            assert_eq!(sim.position(), (5, 4));
        }
    }

    #[test]
    fn test_off_grid_is_noop() {
        let template = template(&[], &[(9, 9)]);
        let mut sim = GridSimulation::new(&template);
        for _ in 0..5 {
            sim.step(LEFT);
        }
        assert_eq!(sim.position(), (0, 5));
        let score = sim.score();
        let cost = sim.total_movement_cost();
        let visits = sim.visits().clone();
        let visible = sim.visible_count();

        assert_eq!(sim.step(LEFT), StepOutcome::Blocked);
        assert_eq!(sim.position(), (0, 5));
        assert_eq!(sim.score(), score);
        assert_eq!(sim.total_movement_cost(), cost);
        assert_eq!(sim.visits(), &visits);
        assert_eq!(sim.visible_count(), visible);
    }

    #[test]
    fn test_unknown_code_stays_and_pays() {
        let template = template(&[((5, 5), Terrain::Mud)], &[(0, 0)]);
        let mut sim = GridSimulation::new(&template);
        assert_eq!(
            sim.step(7),
            StepOutcome::Moved {
                cost: 10,
                picked_up: false
            }
        );
        assert_eq!(sim.position(), (5, 5));
        assert_eq!(sim.visits().count(5, 5), 2);
        assert_eq!(sim.visits().revisits(), 1);
    }

    #[test]
    fn test_item_pickup_once() {
        let template = template(&[], &[(6, 5)]);
        let mut sim = GridSimulation::new(&template);

        assert_eq!(
            sim.step(RIGHT),
            StepOutcome::Moved {
                cost: 1,
                picked_up: true
            }
        );
        assert_eq!(sim.score(), 100 - 1 + 15);
        assert_eq!(sim.items_collected(), 1);
        assert_eq!(sim.item_at(6, 5), None);

        sim.step(LEFT);
        assert_eq!(
            sim.step(RIGHT),
            StepOutcome::Moved {
                cost: 1,
                picked_up: false
            }
        );
        assert_eq!(sim.items_collected(), 1);
        assert_eq!(sim.score(), 100 - 3 + 15);

        // Template is untouched; a reset restores the item.
        assert_eq!(template.item_at(6, 5), Some(Item::Positive));
        sim.reset();
        assert_eq!(sim.item_at(6, 5), Some(Item::Positive));
    }

    #[test]
    fn test_score_clamps_and_stops() {
        // Water wall to the right: 2 steps cost 100.
        let template = template(
            &[((6, 5), Terrain::Water), ((7, 5), Terrain::Water)],
            &[(0, 0)],
        );
        let genome = Genome::new(vec![RIGHT, RIGHT, RIGHT, RIGHT]);
        let eval = evaluate_genome(&template, &genome);
        assert_eq!(eval.score, 0);
        assert_eq!(eval.actions_taken, 2);
        assert_eq!(eval.total_movement_cost, 100);
    }

    #[test]
    fn test_score_floor() {
        let template = template(
            &[
                ((6, 5), Terrain::Water),
                ((7, 5), Terrain::Mud),
                ((8, 5), Terrain::Water),
            ],
            &[(0, 0)],
        );
        let mut sim = GridSimulation::new(&template);
        sim.step(RIGHT);
        sim.step(RIGHT);
        assert_eq!(sim.score(), 40);
        sim.step(RIGHT);
        assert_eq!(sim.score(), 0);
        assert_eq!(sim.total_movement_cost(), 110);
        assert!(sim.is_finished());
    }

    #[test]
    fn test_win_condition() {
        // 3x3 grid: the start neighbourhood covers everything.
        let mut items = vec![None; 9];
        items[5] = Some(Item::Positive); // (2, 1)
        let template = WorldTemplate::from_parts(3, 3, vec![Terrain::Normal; 9], items).unwrap();

        let genome = Genome::new(vec![RIGHT, LEFT, LEFT, UP]);
        let eval = evaluate_genome(&template, &genome);
        assert!(eval.won);
        assert_eq!(eval.actions_taken, 1);
        assert_eq!(eval.items_collected, 1);
        assert_eq!(eval.score, 114);
        // 300 - 2 + 171 - 600 + 30 - 0
        assert_eq!(eval.fitness, -101.0);
    }

    #[test]
    fn test_no_win_without_full_visibility() {
        let template = template(&[], &[(6, 5)]);
        let mut sim = GridSimulation::new(&template);
        sim.step(RIGHT);
        assert_eq!(sim.items_remaining(), 0);
        assert!(!sim.check_win());
        assert_eq!(sim.visible_count(), 12);
    }

    #[test]
    fn test_visibility_monotonic_and_bounded() {
        let template = WorldTemplate::generate(&WorldConfig::default()).unwrap();
        let mut sim = GridSimulation::new(&template);
        assert_eq!(sim.visible_count(), 9);
        let mut last = sim.visible_count();
        for code in [UP, UP, UP, UP, UP, LEFT, LEFT, DOWN, RIGHT, RIGHT] {
            sim.step(code);
            assert!(sim.visible_count() >= last);
            assert!(sim.visible_count() <= 100);
            last = sim.visible_count();
        }
    }

    #[test]
    fn test_visit_stats() {
        let template = template(&[], &[(0, 0)]);
        let genome = Genome::new(vec![UP, DOWN, UP, RIGHT]);
        let eval = evaluate_genome(&template, &genome);
        // (5,5) x2, (5,4) x2, (6,4) x1
        assert_eq!(eval.visits.unique(), 3);
        assert_eq!(eval.visits.total(), 5);
        assert_eq!(eval.visits.revisits(), 2);
        assert_eq!(eval.visits.count(5, 4), 2);
        let visited: Vec<_> = eval.visits.visited().collect();
        assert_eq!(visited, vec![((5, 4), 2), ((6, 4), 1), ((5, 5), 2)]);

        let expected = 0.0 - 8.0 + 96.0 * 1.5 - 750.0 + 45.0 - 20.0;
        assert_eq!(eval.fitness, expected);
    }

    #[test]
    fn test_missing_item_penalty_uses_fixed_count() {
        // One item on the grid still leaves four missing after pickup.
        let template = template(&[], &[(6, 5)]);
        let eval = evaluate_genome(&template, &Genome::new(vec![RIGHT]));
        assert_eq!(eval.items_collected, 1);
        // 300 - 2 + 114 * 1.5 - 600 + 30 - 0
        assert_eq!(eval.fitness, -101.0);

        assert_eq!(compute_fitness(5, 0, 100, 1, 1), 1500.0 + 150.0 + 15.0);
        assert_eq!(compute_fitness(0, 0, 100, 1, 1), 150.0 - 750.0 + 15.0);
    }

    #[test]
    fn test_visit_count_off_grid() {
        let template = template(&[], &[(0, 0)]);
        let sim = GridSimulation::new(&template);
        assert_eq!(sim.visits().count(5, 5), 1);
        // x past the right edge must not alias into the next row.
        assert_eq!(sim.visits().count(15, 4), 0);
        assert_eq!(sim.visits().count(10, 5), 0);
        assert_eq!(sim.visits().count(5, 10), 0);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let template = WorldTemplate::generate(&WorldConfig::default()).unwrap();
        let genome = Genome::new((0..500).map(|i| ((i * 7 + i / 3) % 4) as u8).collect());
        let a = evaluate_genome(&template, &genome);

        let mut sim = GridSimulation::new(&template);
        sim.run(&Genome::new(vec![RIGHT; 20]));
        let b = sim.run(&genome);

        assert_eq!(a, b);
        assert_eq!(a.fitness.to_bits(), b.fitness.to_bits());
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(Action::from_code(0), Some(Action::Up));
        assert_eq!(Action::from_code(3), Some(Action::Right));
        assert_eq!(Action::from_code(4), None);
        assert_eq!(Action::Left.code(), 2);
        assert_eq!(Action::Down.delta(), (0, 1));
    }
}
