//! Grid world template: terrain and initial item placement.
//!
//! A template is generated once per run and shared read-only by every
//! evaluation. Cells are stored row-major at `y * width + x`.

use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::*;

use crate::schema::WorldConfig;

/// Terrain kinds and their sampling weights.
const TERRAIN_WEIGHTS: [(Terrain, f64); 3] = [
    (Terrain::Normal, 0.7),
    (Terrain::Mud, 0.2),
    (Terrain::Water, 0.1),
];

/// Terrain type of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Terrain {
    #[default]
    Normal,
    Mud,
    Water,
}

impl Terrain {
    /// Score deducted for entering a cell of this terrain.
    #[inline]
    pub fn movement_cost(self) -> i64 {
        match self {
            Terrain::Normal => 1,
            Terrain::Mud => 10,
            Terrain::Water => 50,
        }
    }
}

/// An item lying on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    Positive,
}

impl Item {
    /// Score awarded on pickup.
    #[inline]
    pub fn reward(self) -> i64 {
        match self {
            Item::Positive => 15,
        }
    }
}

/// Template construction errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WorldError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Immutable terrain and item layout shared by all evaluations in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldTemplate {
    width: usize,
    height: usize,
    terrain: Vec<Terrain>,
    items: Vec<Option<Item>>,
    item_count: usize,
}

impl WorldTemplate {
    /// Generate a template deterministically from `config.seed`.
    ///
    /// Items are placed first on distinct cells other than the start cell,
    /// then terrain is drawn independently per cell.
    pub fn generate(config: &WorldConfig) -> Result<Self, WorldError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::generate_with_rng(config.width, config.height, config.item_count, &mut rng)
    }

    /// Generate a template from an explicit RNG.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        item_count: usize,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvariantViolation(
                "grid dimensions must be non-zero".to_string(),
            ));
        }

        let cells = width * height;
        let start = start_index(width, height);
        let eligible: Vec<usize> = (0..cells).filter(|&idx| idx != start).collect();
        if item_count > eligible.len() {
            return Err(WorldError::InvariantViolation(format!(
                "cannot place {} distinct items on {} free cells",
                item_count,
                eligible.len()
            )));
        }

        let mut items = vec![None; cells];
        for pick in rand::seq::index::sample(rng, eligible.len(), item_count) {
            items[eligible[pick]] = Some(Item::Positive);
        }

        let weights = WeightedIndex::new(TERRAIN_WEIGHTS.iter().map(|(_, w)| *w))
            .map_err(|e| WorldError::InvariantViolation(format!("terrain weights: {e}")))?;
        let mut terrain = vec![Terrain::Normal; cells];
        for x in 0..width {
            for y in 0..height {
                terrain[y * width + x] = TERRAIN_WEIGHTS[weights.sample(rng)].0;
            }
        }

        log::debug!(
            "Generated {}x{} world template with {} items",
            width,
            height,
            item_count
        );

        Ok(Self {
            width,
            height,
            terrain,
            items,
            item_count,
        })
    }

    /// Build a template from explicit layers.
    ///
    /// `terrain` and `items` are row-major and must both hold
    /// `width * height` cells; the start cell must be empty.
    pub fn from_parts(
        width: usize,
        height: usize,
        terrain: Vec<Terrain>,
        items: Vec<Option<Item>>,
    ) -> Result<Self, WorldError> {
        let cells = width * height;
        if cells == 0 || terrain.len() != cells || items.len() != cells {
            return Err(WorldError::InvariantViolation(format!(
                "layers must hold {}x{} cells (terrain {}, items {})",
                width,
                height,
                terrain.len(),
                items.len()
            )));
        }
        if items[start_index(width, height)].is_some() {
            return Err(WorldError::InvariantViolation(
                "start cell must not hold an item".to_string(),
            ));
        }

        let item_count = items.iter().filter(|i| i.is_some()).count();
        Ok(Self {
            width,
            height,
            terrain,
            items,
            item_count,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Number of items placed at generation time.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Start cell (grid center).
    #[inline]
    pub fn start(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Flat index of a cell.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Terrain at a cell.
    #[inline]
    pub fn terrain_at(&self, x: usize, y: usize) -> Terrain {
        self.terrain[self.index(x, y)]
    }

    /// Item placed at a cell, if any.
    #[inline]
    pub fn item_at(&self, x: usize, y: usize) -> Option<Item> {
        self.items[self.index(x, y)]
    }

    /// Row-major terrain layer.
    pub fn terrain(&self) -> &[Terrain] {
        &self.terrain
    }

    /// Row-major initial item layer.
    pub fn items(&self) -> &[Option<Item>] {
        &self.items
    }

    /// Coordinates of every placed item, row-major order.
    pub fn item_positions(&self) -> Vec<(usize, usize)> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_some())
            .map(|(idx, _)| (idx % self.width, idx / self.width))
            .collect()
    }
}

fn start_index(width: usize, height: usize) -> usize {
    (height / 2) * width + width / 2
}
