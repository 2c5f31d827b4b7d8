//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random generation, two-point crossover, and swap mutation.

use rand::prelude::*;

use crate::schema::Genome;

/// Number of distinct action codes drawn for random genomes.
pub const ACTION_CODES: u8 = 4;

/// Random number generator wrapper for genome operations.
///
/// Every stochastic step of a run draws from one of these, so a fixed seed
/// reproduces the run.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate a genome of uniformly random action codes.
    pub fn random_genome(&mut self, length: usize) -> Genome {
        random_genome(&mut self.rng, length)
    }

    /// Two-point crossover of two equal-length parents.
    pub fn crossover(&mut self, parent1: &Genome, parent2: &Genome) -> Genome {
        two_point_crossover(&mut self.rng, parent1, parent2)
    }

    /// Swap mutation of a copy of `genome`.
    pub fn mutate(&mut self, genome: &Genome, rate: f64) -> Genome {
        swap_mutation(&mut self.rng, genome, rate)
    }
}

impl RngCore for GenomeRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Generate a genome of uniformly random action codes.
pub fn random_genome<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Genome {
    Genome::new((0..length).map(|_| rng.gen_range(0..ACTION_CODES)).collect())
}

/// Two-point crossover.
///
/// Picks `p1` in `[1, L-2]` and `p2` in `[p1+1, L-1]`; the child is
/// `parent1[..p1] ++ parent2[p1..p2] ++ parent1[p2..]`. Parents shorter than
/// three genes are returned as a copy of `parent1`.
pub fn two_point_crossover<R: Rng + ?Sized>(
    rng: &mut R,
    parent1: &Genome,
    parent2: &Genome,
) -> Genome {
    let len = parent1.len();
    debug_assert_eq!(len, parent2.len(), "crossover parents differ in length");
    if len < 3 || parent2.len() < len {
        return parent1.clone();
    }

    let p1 = rng.gen_range(1..=len - 2);
    let p2 = rng.gen_range(p1 + 1..=len - 1);
    splice(parent1, parent2, p1, p2)
}

/// Child built from `parent1` with `parent2[p1..p2]` spliced in.
pub fn splice(parent1: &Genome, parent2: &Genome, p1: usize, p2: usize) -> Genome {
    let a = parent1.genes();
    let b = parent2.genes();
    let mut child = Vec::with_capacity(a.len());
    child.extend_from_slice(&a[..p1]);
    child.extend_from_slice(&b[p1..p2]);
    child.extend_from_slice(&a[p2..]);
    Genome::new(child)
}

/// Swap mutation.
///
/// Each position is, with probability `rate`, swapped with a uniformly
/// chosen position (possibly itself). The input genome is left untouched.
pub fn swap_mutation<R: Rng + ?Sized>(rng: &mut R, genome: &Genome, rate: f64) -> Genome {
    let mut genes = genome.genes().to_vec();
    let len = genes.len();
    for i in 0..len {
        if rng.r#gen::<f64>() < rate {
            let j = rng.gen_range(0..len);
            genes.swap(i, j);
        }
    }
    Genome::new(genes)
}
