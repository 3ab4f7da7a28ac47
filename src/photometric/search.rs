//! Greedy stochastic refinement of an integer light matrix.
//!
//! Starting from a random (or supplied) [`CalibrationMatrix`], each iteration
//! redraws one cell, reconstructs the normal map and keeps the candidate only
//! if its [`score`](crate::photometric::cost::score) is strictly lower. Worse
//! or equal candidates are discarded and singular candidates count as
//! rejected. Iterations are sequential: each neighbour derives from the
//! current best.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::photometric::common::error::Result;
use crate::photometric::cost::score;
use crate::photometric::field::IntensityField;
use crate::photometric::reconstruct::reconstruct_with_inverse;
use crate::photometric::solver::CalibrationMatrix;

/// Cost assigned to candidates whose light matrix cannot be inverted.
pub const REJECTED_COST: u64 = u64::MAX;

/// Uniform integer source driving the search.
pub trait RandomSource {
    /// Draws uniformly from `range`, both ends included.
    fn uniform(&mut self, range: RangeInclusive<i32>) -> i32;
}

/// [`RandomSource`] backed by a seedable [`StdRng`].
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, range: RangeInclusive<i32>) -> i32 {
        self.rng.random_range(range)
    }
}

/// Configuration for a search run
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of neighbour evaluations after the initial one
    pub iterations: u64,
    /// Seed for reproducible runs; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Starting matrix; `None` draws a random one
    pub initial: Option<CalibrationMatrix>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: None,
            initial: None,
        }
    }
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    pub fn random_source(&self) -> SeededRandom {
        match self.seed {
            Some(seed) => SeededRandom::new(seed),
            None => SeededRandom::from_entropy(),
        }
    }
}

/// Builder for SearchConfig
#[derive(Default)]
pub struct SearchConfigBuilder {
    iterations: Option<u64>,
    seed: Option<Option<u64>>,
    initial: Option<Option<CalibrationMatrix>>,
}

impl SearchConfigBuilder {
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn initial(mut self, initial: Option<CalibrationMatrix>) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn build(self) -> SearchConfig {
        let default = SearchConfig::default();
        SearchConfig {
            iterations: self.iterations.unwrap_or(default.iterations),
            seed: self.seed.unwrap_or(default.seed),
            initial: self.initial.unwrap_or(default.initial),
        }
    }
}

/// Snapshot handed to the stop predicate after every iteration.
#[derive(Debug, Clone, Copy)]
pub struct SearchProgress {
    /// Zero-based index of the iteration that just finished
    pub iteration: u64,
    pub best_matrix: CalibrationMatrix,
    pub best_cost: u64,
    /// Whether this iteration replaced the best matrix
    pub improved: bool,
}

/// An accepted move. `iteration` is `None` for the starting matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Improvement {
    pub iteration: Option<u64>,
    pub cost: u64,
    pub matrix: CalibrationMatrix,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_matrix: CalibrationMatrix,
    /// [`REJECTED_COST`] if no evaluated matrix was invertible
    pub best_cost: u64,
    pub iterations_run: u64,
    /// Every accepted state in order, starting with the initial matrix;
    /// costs are strictly decreasing.
    pub improvements: Vec<Improvement>,
}

impl SearchOutcome {
    pub fn found_invertible(&self) -> bool {
        self.best_cost != REJECTED_COST
    }
}

/// Local search over calibration matrices for one set of photographs.
pub struct CalibrationSearch<'a> {
    fields: [&'a IntensityField; 3],
    threshold: u8,
    lit_pixels: usize,
}

impl<'a> CalibrationSearch<'a> {
    /// `threshold` decides shadowing for every candidate this search
    /// evaluates. Fails with `DimensionMismatch` if the photographs differ
    /// in size.
    pub fn new(
        a: &'a IntensityField,
        b: &'a IntensityField,
        c: &'a IntensityField,
        threshold: u8,
    ) -> Result<Self> {
        a.ensure_same_dimensions(b)?;
        a.ensure_same_dimensions(c)?;

        let mut lit_pixels = 0;
        for row in 0..a.height() {
            for col in 0..a.width() {
                if a.get(row, col) > threshold && b.get(row, col) > threshold && c.get(row, col) > threshold {
                    lit_pixels += 1;
                }
            }
        }

        Ok(Self { fields: [a, b, c], threshold, lit_pixels })
    }

    /// Pixels lit above the threshold in all three photographs. The shadow
    /// mask does not depend on the light matrix.
    pub fn lit_pixels(&self) -> usize {
        self.lit_pixels
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Cost of reconstructing with `matrix`, [`REJECTED_COST`] if singular.
    pub fn evaluate(&self, matrix: &CalibrationMatrix) -> u64 {
        let [a, b, c] = self.fields;
        let inverse = match matrix.to_light_matrix().invert() {
            Ok(inverse) => inverse,
            Err(e) => {
                debug!(%matrix, "Candidate rejected: {}", e);
                return REJECTED_COST;
            }
        };
        match reconstruct_with_inverse(a, b, c, self.threshold, &inverse) {
            Ok(map) => score(&map),
            Err(e) => {
                warn!("Candidate reconstruction failed: {}", e);
                REJECTED_COST
            }
        }
    }

    /// Fresh matrix with every cell drawn from its column's range, row-major.
    pub fn random_matrix(rng: &mut dyn RandomSource) -> CalibrationMatrix {
        let mut matrix = CalibrationMatrix::identity();
        for row in 0..3 {
            for col in 0..3 {
                let value = rng.uniform(CalibrationMatrix::column_range(col));
                matrix = matrix.with_cell(row, col, value);
            }
        }
        matrix
    }

    /// Copy of `matrix` with one uniformly chosen cell redrawn.
    pub fn random_neighbor(matrix: &CalibrationMatrix, rng: &mut dyn RandomSource) -> CalibrationMatrix {
        let row = rng.uniform(0..=2) as usize;
        let col = rng.uniform(0..=2) as usize;
        let value = rng.uniform(CalibrationMatrix::column_range(col));
        matrix.with_cell(row, col, value)
    }

    pub fn run(&self, config: &SearchConfig) -> SearchOutcome {
        let mut rng = config.random_source();
        self.run_with(config.initial, config.iterations, &mut rng, |_| false)
    }

    /// Runs up to `iterations` neighbour evaluations, stopping early once
    /// `stop` returns `true`.
    #[instrument(skip(self, initial, rng, stop), fields(threshold = self.threshold, lit_pixels = self.lit_pixels))]
    pub fn run_with(
        &self,
        initial: Option<CalibrationMatrix>,
        iterations: u64,
        rng: &mut dyn RandomSource,
        mut stop: impl FnMut(&SearchProgress) -> bool,
    ) -> SearchOutcome {
        let mut best_matrix = initial.unwrap_or_else(|| Self::random_matrix(rng));
        let mut best_cost = self.evaluate(&best_matrix);
        let mut improvements = vec![Improvement { iteration: None, cost: best_cost, matrix: best_matrix }];
        debug!(%best_matrix, best_cost, "Initial calibration evaluated");

        // With nothing lit every invertible matrix scores the same, so only
        // a singular starting point is worth moving away from.
        let all_shadow = self.lit_pixels == 0;
        if all_shadow && best_cost != REJECTED_COST {
            warn!("No pixel is lit in all three images; every candidate scores the same, skipping search");
            return SearchOutcome { best_matrix, best_cost, iterations_run: 0, improvements };
        }

        let mut iterations_run = 0;
        for iteration in 0..iterations {
            iterations_run += 1;
            let candidate = Self::random_neighbor(&best_matrix, rng);
            let candidate_cost = self.evaluate(&candidate);

            let improved = candidate_cost < best_cost;
            if improved {
                debug!(iteration, cost = candidate_cost, previous = best_cost, "Accepted candidate");
                best_matrix = candidate;
                best_cost = candidate_cost;
                improvements.push(Improvement { iteration: Some(iteration), cost: best_cost, matrix: best_matrix });
            }

            let progress = SearchProgress { iteration, best_matrix, best_cost, improved };
            if stop(&progress) {
                debug!(iteration, "Search stopped early");
                break;
            }
            if all_shadow && improved {
                warn!(iteration, "No pixel is lit in all three images; stopping at the first invertible matrix");
                break;
            }
        }

        if best_cost == REJECTED_COST {
            warn!(iterations_run, "Search found no invertible calibration matrix");
        } else {
            info!(iterations_run, best_cost, accepted = improvements.len() - 1, "Calibration search finished");
        }

        SearchOutcome { best_matrix, best_cost, iterations_run, improvements }
    }
}
