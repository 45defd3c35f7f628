//! Small dense linear algebra on augmented matrices.
//!
//! Gauss-Jordan elimination reduces `[A|b]` to `[I|x]` in place, where `x`
//! solves `A.x = b`. Passing `[A|I]` yields the inverse in the right-hand
//! block. This is meant for the small systems that appear next to a
//! minimization run; use a real LAPACK binding for anything big.

use derive_builder::Builder;
use ndarray::prelude::*;
use thiserror::Error;

use super::DimensionError;

/// Errors from the elimination routines.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum LinalgError {
    #[error("matrix has no rows or no columns")]
    Empty,

    #[error("augmented matrix needs at least as many columns as rows ({rows}x{cols})")]
    Shape { rows: usize, cols: usize },

    #[error("matrix is singular, pivot = {pivot}")]
    Singular { pivot: f64 },

    #[error(transparent)]
    Dimension(#[from] DimensionError),
}

#[derive(Builder, Debug, Clone, Copy)]
/// Gauss-Jordan elimination with partial pivoting.
pub struct GaussJordan {
    /// Pivots with a magnitude below this value are treated as zero and the
    /// matrix is reported singular.
    #[builder(default = "1e-16")]
    pub very_small: f64,
}

impl Default for GaussJordan {
    fn default() -> Self {
        GaussJordan { very_small: 1e-16 }
    }
}

impl GaussJordan {
    /// Reduces the augmented matrix `c = [A|b]` in place so that it becomes
    /// `[I|x]`. `c` may carry any number of right-hand-side columns.
    pub fn eliminate(&self, mut c: ArrayViewMut2<f64>) -> Result<(), LinalgError> {
        let (nrows, ncols) = c.dim();
        if nrows == 0 || ncols == 0 {
            return Err(LinalgError::Empty);
        }
        if ncols < nrows {
            return Err(LinalgError::Shape { rows: nrows, cols: ncols });
        }
        for j in 0..nrows {
            // pivot: largest magnitude in column j at or below the diagonal
            let mut p = j;
            for i in j + 1..nrows {
                if c[[i, j]].abs() > c[[p, j]].abs() {
                    p = i;
                }
            }
            if c[[p, j]].abs() < self.very_small {
                return Err(LinalgError::Singular { pivot: c[[p, j]] });
            }
            if p != j {
                for col in 0..ncols {
                    c.swap([p, col], [j, col]);
                }
            }
            let cjj = c[[j, j]];
            c.row_mut(j).mapv_inplace(|v| v / cjj);
            for i in 0..nrows {
                if i == j {
                    continue;
                }
                let cij = c[[i, j]];
                for col in 0..ncols {
                    let d = cij * c[[j, col]];
                    c[[i, col]] -= d;
                }
            }
        }
        Ok(())
    }

    /// Solves `A.x = b` for square `A`, leaving the inputs untouched.
    pub fn solve(&self, a: ArrayView2<f64>, b: ArrayView1<f64>) -> Result<Array1<f64>, LinalgError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(DimensionError { expected: n, found: a.ncols() }.into());
        }
        if b.len() != n {
            return Err(DimensionError { expected: n, found: b.len() }.into());
        }
        let mut c = Array2::<f64>::zeros((n, n + 1));
        c.slice_mut(s![.., ..n]).assign(&a);
        c.column_mut(n).assign(&b);
        self.eliminate(c.view_mut())?;
        Ok(c.column(n).to_owned())
    }

    /// Inverts a square matrix.
    pub fn inverse(&self, a: ArrayView2<f64>) -> Result<Array2<f64>, LinalgError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(DimensionError { expected: n, found: a.ncols() }.into());
        }
        let mut c = Array2::<f64>::zeros((n, 2 * n));
        c.slice_mut(s![.., ..n]).assign(&a);
        c.slice_mut(s![.., n..]).assign(&Array2::eye(n));
        self.eliminate(c.view_mut())?;
        Ok(c.slice(s![.., n..]).to_owned())
    }
}

/// Infinity norm: the largest absolute row sum.
pub fn norm_inf(a: ArrayView2<f64>) -> f64 {
    a.outer_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}
