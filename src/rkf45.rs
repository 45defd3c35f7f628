//! A single fixed step of the Runge-Kutta-Fehlberg 4(5) method.
//!
//! The stepper keeps its intermediate stage arrays in a preallocated
//! workspace, so repeated steps do not allocate. The caller decides the step
//! size; the per-component error estimate is returned for information only.

use ndarray::prelude::*;
use ndarray::Zip;

use crate::array::{check_len, DimensionError};

/// Stage storage for systems of `n` equations.
#[derive(Debug, Clone)]
pub struct Rkf45 {
    ytmp: Array1<f64>,
    k: [Array1<f64>; 6],
}

impl Rkf45 {
    pub fn new(n: usize) -> Self {
        Rkf45 {
            ytmp: Array1::zeros(n),
            k: [
                Array1::zeros(n),
                Array1::zeros(n),
                Array1::zeros(n),
                Array1::zeros(n),
                Array1::zeros(n),
                Array1::zeros(n),
            ],
        }
    }

    /// Number of equations this workspace was sized for.
    pub fn len(&self) -> usize {
        self.ytmp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ytmp.is_empty()
    }

    /// Advances `y0` at `t0` by one step `h`, writing the new state into `y1`
    /// and absolute error estimates into `err`. Returns `t0 + h`.
    ///
    /// `f(t, y, dydt)` must fill `dydt` with the derivatives at `(t, y)`.
    pub fn step<F>(
        &mut self,
        f: F,
        t0: f64,
        h: f64,
        y0: ArrayView1<f64>,
        mut y1: ArrayViewMut1<f64>,
        mut err: ArrayViewMut1<f64>,
    ) -> Result<f64, DimensionError>
    where
        F: Fn(f64, ArrayView1<f64>, ArrayViewMut1<f64>),
    {
        let n = self.len();
        check_len(n, y0.len())?;
        check_len(n, y1.len())?;
        check_len(n, err.len())?;

        let [k1, k2, k3, k4, k5, k6] = &mut self.k;
        let ytmp = &mut self.ytmp;

        f(t0, y0, k1.view_mut());
        Zip::from(&mut *ytmp)
            .and(&y0)
            .and(&*k1)
            .for_each(|yt, &y, &k1| *yt = y + 0.25 * h * k1);
        f(t0 + h / 4.0, ytmp.view(), k2.view_mut());

        Zip::from(&mut *ytmp)
            .and(&y0)
            .and(&*k1)
            .and(&*k2)
            .for_each(|yt, &y, &k1, &k2| *yt = y + 3.0 * h * k1 / 32.0 + 9.0 * h * k2 / 32.0);
        f(t0 + 3.0 * h / 8.0, ytmp.view(), k3.view_mut());

        Zip::from(&mut *ytmp)
            .and(&y0)
            .and(&*k1)
            .and(&*k2)
            .and(&*k3)
            .for_each(|yt, &y, &k1, &k2, &k3| {
                *yt = y + 1932.0 * h * k1 / 2197.0 - 7200.0 * h * k2 / 2197.0
                    + 7296.0 * h * k3 / 2197.0
            });
        f(t0 + 12.0 * h / 13.0, ytmp.view(), k4.view_mut());

        Zip::from(&mut *ytmp)
            .and(&y0)
            .and(&*k1)
            .and(&*k2)
            .and(&*k3)
            .and(&*k4)
            .for_each(|yt, &y, &k1, &k2, &k3, &k4| {
                *yt = y + 439.0 * h * k1 / 216.0 - 8.0 * h * k2 + 3680.0 * h * k3 / 513.0
                    - 845.0 * h * k4 / 4104.0
            });
        f(t0 + h, ytmp.view(), k5.view_mut());

        for j in 0..n {
            ytmp[j] = y0[j] - 8.0 * h * k1[j] / 27.0 + 2.0 * h * k2[j]
                - 3544.0 * h * k3[j] / 2565.0
                + 1859.0 * h * k4[j] / 4104.0
                - 11.0 * h * k5[j] / 40.0;
        }
        f(t0 + h / 2.0, ytmp.view(), k6.view_mut());

        // weighted combination of the six samples
        for j in 0..n {
            y1[j] = y0[j] + 16.0 * h * k1[j] / 135.0 + 6656.0 * h * k3[j] / 12825.0
                + 28561.0 * h * k4[j] / 56430.0
                - 9.0 * h * k5[j] / 50.0
                + 2.0 * h * k6[j] / 55.0;
            err[j] = (h * k1[j] / 360.0 - 128.0 * h * k3[j] / 4275.0
                - 2197.0 * h * k4[j] / 75240.0
                + h * k5[j] / 50.0
                + 2.0 * h * k6[j] / 55.0)
                .abs();
        }
        Ok(t0 + h)
    }
}
