//! Step-by-step playback of a genome for inspection.
//!
//! A replay applies genes exactly like [`GridSimulation::run`] and stops at
//! the same point, yielding one frame per applied gene.
//!
//! ```rust,no_run
//! use grid_evolve::compute::WorldTemplate;
//! use grid_evolve::replay::ReplayPlayer;
//! use grid_evolve::schema::{Genome, WorldConfig};
//!
//! let template = WorldTemplate::generate(&WorldConfig::default()).unwrap();
//! let genome = Genome::new(vec![0, 3, 3, 1]);
//! for frame in ReplayPlayer::new(&template, &genome) {
//!     println!("{:?} -> {:?} score {}", frame.action, frame.position, frame.score);
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::compute::{Action, Evaluation, GridSimulation, StepOutcome, WorldTemplate};
use crate::schema::Genome;

/// State after one applied gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Index of the gene within the genome.
    pub index: usize,
    /// Raw action code.
    pub code: u8,
    /// Decoded action; `None` for codes outside the action set.
    pub action: Option<Action>,
    pub outcome: StepOutcome,
    /// Player position after the gene.
    pub position: (usize, usize),
    pub score: i64,
    pub items_collected: u32,
    pub total_movement_cost: u64,
    /// Cells seen so far.
    pub visible_cells: usize,
    /// True when this frame ends the run.
    pub finished: bool,
    pub won: bool,
}

/// Iterator over the frames of one genome run.
pub struct ReplayPlayer<'a> {
    sim: GridSimulation<'a>,
    genome: &'a Genome,
    cursor: usize,
}

impl<'a> ReplayPlayer<'a> {
    /// Start a replay from the reset state.
    pub fn new(template: &'a WorldTemplate, genome: &'a Genome) -> Self {
        let mut sim = GridSimulation::new(template);
        sim.check_win();
        Self {
            sim,
            genome,
            cursor: 0,
        }
    }

    /// Simulation state at the current frame.
    pub fn simulation(&self) -> &GridSimulation<'a> {
        &self.sim
    }

    /// Genes applied so far.
    pub fn actions_taken(&self) -> usize {
        self.cursor
    }

    /// Whether another frame is available.
    pub fn is_done(&self) -> bool {
        self.sim.is_finished() || self.cursor >= self.genome.len()
    }

    /// Score the state reached so far.
    pub fn evaluation(&self) -> Evaluation {
        Evaluation {
            fitness: self.sim.fitness(),
            items_collected: self.sim.items_collected(),
            total_movement_cost: self.sim.total_movement_cost(),
            score: self.sim.score(),
            visits: self.sim.visits().clone(),
            actions_taken: self.cursor,
            won: self.sim.is_won(),
        }
    }

    /// Play out the remaining genes and score the result.
    pub fn finish(mut self) -> Evaluation {
        while self.next().is_some() {}
        self.evaluation()
    }
}

impl Iterator for ReplayPlayer<'_> {
    type Item = ReplayFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_done() {
            return None;
        }

        let index = self.cursor;
        let code = self.genome.genes()[index];
        let outcome = self.sim.step(code);
        self.sim.check_win();
        self.cursor += 1;

        Some(ReplayFrame {
            index,
            code,
            action: Action::from_code(code),
            outcome,
            position: self.sim.position(),
            score: self.sim.score(),
            items_collected: self.sim.items_collected(),
            total_movement_cost: self.sim.total_movement_cost(),
            visible_cells: self.sim.visible_count(),
            finished: self.sim.is_finished(),
            won: self.sim.is_won(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.genome.len() - self.cursor))
    }
}
