//! Return types shared by the minimizers in this crate.
use ndarray::prelude::*;
use std::time::Duration;

use crate::vector::Simplex;

/// Minimizer states at the end of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The spread of objective values over the simplex fell below the tolerance.
    Converged,
    /// The evaluation budget ran out first. The final simplex is still the
    /// best one found.
    BudgetExhausted,
}

/// A minimization result, storing various details of the run and the final simplex.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimResult {
    /// The runtime of the minimization according to the system clock.
    pub runtime: Duration,
    /// The number of function evaluations performed, including the ones
    /// needed to set up the initial simplex.
    pub f_evals: usize,
    /// The number of iterations run.
    pub iterations: usize,
    /// How often the simplex had to be shrunk toward its best vertex.
    pub restarts: usize,
    /// The final simplex, sorted so that index 0 holds the best vertex.
    pub simplex: Simplex,
    /// The minimizer convergence status.
    pub status: RunStatus,
}

impl OptimResult {
    /// The parameters with the smallest function value found.
    pub fn minimum(&self) -> ArrayView1<f64> {
        self.simplex.best().x.view()
    }

    /// The function value at the found minimum.
    pub fn minimum_value(&self) -> f64 {
        self.simplex.best().f
    }

    pub fn converged(&self) -> bool {
        self.status == RunStatus::Converged
    }
}
