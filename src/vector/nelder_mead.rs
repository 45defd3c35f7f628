//! This implementation of Nelder-Mead follows
//!
//! R. O'Neill. Algorithm AS47. Function minimization using a simplex
//! algorithm. 1971. Applied Statistics. 20, pp 338--345
//!
//! with the stepping described in
//!
//! D. Lee and M. Wiswall. A parallel implementation of the simplex function
//! minimization routine. 2007. Computational Economics. 30, pp 171--187
//!
//! Each iteration tries to replace the `replace` worst vertices, all moved
//! about one shared centroid of the remaining vertices. When none of them can
//! be improved, the whole simplex shrinks toward its best vertex. Convergence
//! is judged between batches of iterations by the standard deviation of the
//! objective values over the simplex.
//!
//! # Use case
//!
//! The Nelder-Mead algorithm does not require a gradient or a hessian.
//! As a tradeoff it typically requires a lot of function evaluations to
//! find a minimum, which is why the evaluation budget is the only hard limit.
//!
//! # Examples
//!
//! ```
//! # extern crate ndarray;
//! # extern crate nelmin;
//! # use ndarray::prelude::*;
//! # use nelmin::vector::NelderMeadBuilder;
//!
//! let function = |x: ArrayView1<f64>| x.iter().map(|xi| (xi - 1.0).powi(2)).sum::<f64>();
//! let minimizer = NelderMeadBuilder::default()
//!     .tol(1e-8)
//!     .max_evaluations(1000usize)
//!     .build()
//!     .unwrap();
//! let x0 = Array::from_vec(vec![0.0, 0.0]);
//! let dx = Array::from_vec(vec![0.1, 0.1]);
//! let res = minimizer.minimize(&function, x0.view(), dx.view()).unwrap();
//! println!("res: {}", res.simplex);
//! assert!((res.minimum()[0] - 1.0).abs() < 1e-3);
//! ```

use std::time::Instant;

use derive_builder::Builder;
use ndarray::prelude::*;
use tracing::{debug, info};

use crate::array;
use crate::error::{ConfigError, Degeneracy, Error};
use crate::minimizer::{OptimResult, RunStatus};
use crate::utils::WrappedFunction;
use crate::vector::simplex::{build_simplex, Simplex, Vertex};

/// A reflected point that is worse than the best vertex is still accepted
/// when more than this many vertices are worse than it. Otherwise a
/// contraction toward the worst point is tried instead.
pub const CONTRACTION_THRESHOLD: usize = 1;

/// How the replacements within one iteration see each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacementMode {
    /// Worst slot first, each accepted replacement is written back before the
    /// next slot is tried.
    #[default]
    Sequential,
    /// Every slot is tried against the simplex as it was at the start of the
    /// iteration and all results are written back together. The candidates
    /// are then independent of each other and could be evaluated in parallel.
    Snapshot,
}

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
/// A minimizer for a scalar function of one or more variables using the Nelder-Mead algorithm.
pub struct NelderMead {
    /// Reflection coefficient, the distance of the reflected point from the
    /// centroid relative to the worst point.
    #[builder(default = "1.0")]
    pub reflect: f64,

    /// Extension coefficient, applied to the reflected point when it beats the best vertex.
    #[builder(default = "2.0")]
    pub extend: f64,

    /// Contraction coefficient, the fraction of the way from the centroid toward the worst point.
    #[builder(default = "0.5")]
    pub contract: f64,

    /// Number of worst vertices to replace in each iteration.
    #[builder(default = "1")]
    pub replace: usize,

    /// Iterations between two convergence checks.
    #[builder(default = "20")]
    pub steps: usize,

    /// Function evaluations after which no further batch is started.
    #[builder(default = "300")]
    pub max_evaluations: usize,

    /// The run has converged once the standard deviation of the function
    /// values over the simplex drops below this value.
    #[builder(default = "1e-6")]
    pub tol: f64,

    #[builder(default)]
    pub mode: ReplacementMode,
}

impl Default for NelderMead {
    fn default() -> Self {
        NelderMead {
            reflect: 1.0,
            extend: 2.0,
            contract: 0.5,
            replace: 1,
            steps: 20,
            max_evaluations: 300,
            tol: 1e-6,
            mode: ReplacementMode::Sequential,
        }
    }
}

impl NelderMeadBuilder {
    fn validate(&self) -> Result<(), String> {
        let defaults = NelderMead::default();
        NelderMead {
            reflect: self.reflect.unwrap_or(defaults.reflect),
            extend: self.extend.unwrap_or(defaults.extend),
            contract: self.contract.unwrap_or(defaults.contract),
            replace: self.replace.unwrap_or(defaults.replace),
            steps: self.steps.unwrap_or(defaults.steps),
            max_evaluations: self.max_evaluations.unwrap_or(defaults.max_evaluations),
            tol: self.tol.unwrap_or(defaults.tol),
            mode: self.mode.unwrap_or(defaults.mode),
        }
        .check()
        .map_err(|e| e.to_string())
    }
}

impl NelderMead {
    /// Checks the coefficients and limits. Called by the builder and again
    /// before every run, since the fields are public.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !(self.reflect.is_finite() && self.reflect > 0.0) {
            return Err(ConfigError::Coefficient { name: "reflect", value: self.reflect });
        }
        if !(self.extend.is_finite() && self.extend > 1.0) {
            return Err(ConfigError::Coefficient { name: "extend", value: self.extend });
        }
        if !(self.contract > 0.0 && self.contract < 1.0) {
            return Err(ConfigError::Coefficient { name: "contract", value: self.contract });
        }
        if self.replace == 0 {
            return Err(ConfigError::ZeroExclusion);
        }
        if self.steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        if !(self.tol.is_finite() && self.tol >= 0.0) {
            return Err(ConfigError::Tolerance(self.tol));
        }
        Ok(())
    }

    /// Search for the value minimizing `func`, starting from a simplex built
    /// around `x0` with per-axis offsets `dx`.
    ///
    /// Running out of evaluations is not an error; check
    /// [`OptimResult::status`] to tell it apart from convergence.
    pub fn minimize<F>(
        &self,
        func: F,
        x0: ArrayView1<f64>,
        dx: ArrayView1<f64>,
    ) -> Result<OptimResult, Error>
    where
        F: Fn(ArrayView1<f64>) -> f64,
    {
        let mut minimizer = Minimizer::from_point(self.clone(), func, x0, dx)?;
        minimizer.run()?;
        Ok(minimizer.into_result())
    }
}

/// The outcome of trying to replace one vertex.
///
/// Produced without touching the simplex, so that several proposals can be
/// computed against the same state before any of them is written back.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    /// Index of the vertex to replace.
    pub slot: usize,
    /// The replacement, or `None` when no candidate was good enough.
    pub vertex: Option<Vertex>,
    /// Objective evaluations spent on this proposal.
    pub evaluations: usize,
}

/// The state of one Nelder-Mead run: objective, live simplex and counters.
pub struct Minimizer<F> {
    func: F,
    config: NelderMead,
    simplex: Simplex,
    evaluations: usize,
    restarts: usize,
    iterations: usize,
    started: Instant,
}

impl<F> Minimizer<F>
where
    F: Fn(ArrayView1<f64>) -> f64,
{
    /// Builds the initial simplex around `x0`, spending `x0.len() + 1` evaluations.
    pub fn from_point(
        config: NelderMead,
        func: F,
        x0: ArrayView1<f64>,
        dx: ArrayView1<f64>,
    ) -> Result<Self, Error> {
        config.check()?;
        let started = Instant::now();
        let (simplex, evaluations) = build_simplex(x0, dx, &func)?;
        Ok(Minimizer {
            func,
            config,
            simplex,
            evaluations,
            restarts: 0,
            iterations: 0,
            started,
        })
    }

    pub fn simplex(&self) -> &Simplex {
        &self.simplex
    }

    pub fn config(&self) -> &NelderMead {
        &self.config
    }

    /// Objective evaluations so far, including the initial simplex.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Tries to find a better point for the vertex at `slot`, moving it about
    /// the centroid `mid`. Only reads the simplex. Fails when there is no
    /// vertex at `slot`.
    pub fn propose(&self, slot: usize, mid: ArrayView1<f64>) -> Result<Proposal, Error> {
        let NelderMead { reflect, extend, contract, .. } = self.config;
        let high = self.simplex.vertices().get(slot).ok_or(Degeneracy::NoSuchVertex {
            slot,
            vertices: self.simplex.len(),
        })?;
        let mut func = WrappedFunction::new(&self.func);
        let f_min = self.simplex.best().f;

        // move away from the high point, through the centroid
        let x_refl = array::blend(mid, high.x.view(), 1.0 + reflect, -reflect)?;
        let f_refl = func.call(x_refl.view());

        let vertex = if f_refl < f_min {
            // good direction, try going further
            let x_ext = array::blend(mid, x_refl.view(), 1.0 - extend, extend)?;
            let f_ext = func.call(x_ext.view());
            if f_ext < f_refl {
                Some(Vertex::new(x_ext, f_ext))
            } else {
                Some(Vertex::new(x_refl, f_refl))
            }
        } else {
            let worse = self.simplex.iter().filter(|v| v.f > f_refl).count();
            if worse <= CONTRACTION_THRESHOLD {
                let x_con = array::blend(mid, high.x.view(), 1.0 - contract, contract)?;
                let f_con = func.call(x_con.view());
                if f_con < high.f {
                    Some(Vertex::new(x_con, f_con))
                } else {
                    None
                }
            } else {
                // most vertices are worse anyway, keep the simplex moving
                Some(Vertex::new(x_refl, f_refl))
            }
        };

        Ok(Proposal { slot, vertex, evaluations: func.num })
    }

    /// Writes an accepted proposal into its slot and books its evaluations.
    /// Returns whether the vertex was replaced. Leaves the simplex unsorted.
    fn commit(&mut self, proposal: Proposal) -> bool {
        self.evaluations += proposal.evaluations;
        match proposal.vertex {
            Some(v) => {
                let target = &mut self.simplex.vertices_mut()[proposal.slot];
                target.x.assign(&v.x);
                target.f = v.f;
                true
            }
            None => false,
        }
    }

    /// Moves every vertex but the best halfway toward the best one and
    /// re-evaluates it.
    pub fn shrink_toward_best(&mut self) -> Result<(), Error> {
        let mut func = WrappedFunction::new(&self.func);
        if let Some((best, rest)) = self.simplex.vertices_mut().split_first_mut() {
            for v in rest {
                array::blend_assign(v.x.view_mut(), best.x.view(), 0.5, 0.5)?;
                v.f = func.call(v.x.view());
            }
        }
        self.evaluations += func.num;
        self.restarts += 1;
        debug!(restarts = self.restarts, "no vertex improved, shrinking toward best");
        Ok(())
    }

    /// Runs `nsteps` iterations. On return the simplex is sorted.
    pub fn take_steps(&mut self, nsteps: usize) -> Result<(), Error> {
        let nv = self.simplex.len();
        let p = self.config.replace;
        for _ in 0..nsteps {
            let mid = self.simplex.centroid(p)?;
            let slots = (0..p).map(|i| nv - 1 - i);

            let mut any_accepted = false;
            match self.config.mode {
                ReplacementMode::Sequential => {
                    for slot in slots {
                        let proposal = self.propose(slot, mid.x.view())?;
                        any_accepted |= self.commit(proposal);
                    }
                }
                ReplacementMode::Snapshot => {
                    let proposals = slots
                        .map(|slot| self.propose(slot, mid.x.view()))
                        .collect::<Result<Vec<_>, _>>()?;
                    for proposal in proposals {
                        any_accepted |= self.commit(proposal);
                    }
                }
            }
            if !any_accepted {
                self.shrink_toward_best()?;
            }
            self.simplex.order();
            self.iterations += 1;
        }
        Ok(())
    }

    /// Takes batches of steps until the simplex has converged or the
    /// evaluation budget is used up.
    pub fn run(&mut self) -> Result<RunStatus, Error> {
        while self.evaluations < self.config.max_evaluations {
            self.take_steps(self.config.steps)?;
            let (mean, sdev) = self.simplex.f_stats();
            debug!(
                evaluations = self.evaluations,
                restarts = self.restarts,
                mean,
                sdev,
                "finished batch"
            );
            if sdev < self.config.tol {
                break;
            }
        }
        let status = self.status();
        info!(
            ?status,
            evaluations = self.evaluations,
            restarts = self.restarts,
            f_min = self.simplex.best().f,
            "nelder-mead finished"
        );
        Ok(status)
    }

    /// Convergence judged from the current simplex.
    pub fn status(&self) -> RunStatus {
        if self.simplex.f_stats().1 < self.config.tol {
            RunStatus::Converged
        } else {
            RunStatus::BudgetExhausted
        }
    }

    pub fn into_result(self) -> OptimResult {
        OptimResult {
            runtime: self.started.elapsed(),
            f_evals: self.evaluations,
            iterations: self.iterations,
            restarts: self.restarts,
            status: self.status(),
            simplex: self.simplex,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use float_cmp::ApproxEq;
    use ndarray::array;

    fn quadratic(x: ArrayView1<f64>) -> f64 {
        x.iter().map(|xi| (xi - 1.0) * (xi - 1.0)).sum()
    }

    #[test]
    fn simplex() {
        let minimizer = NelderMead::default();
        let res = minimizer
            .minimize(&quadratic, array![0.0, 0.0, 0.0].view(), array![0.1, 0.1, 0.1].view())
            .unwrap();
        println!("res: {}", res.simplex);
        assert_eq!(res.f_evals, 106);
        assert_eq!(res.restarts, 0);
        assert_eq!(res.status, RunStatus::Converged);
        let expected = Vertex::new(array![1.0, 1.0, 1.0], 0.0);
        assert!(res.simplex.best().approx_equals(&expected, 1e-3));
        assert!(res.minimum_value().approx_eq(0.0, (1e-3, 10)));
    }

    #[test]
    fn rosenbrock() {
        let function =
            |x: ArrayView1<f64>| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2);
        let minimizer = NelderMeadBuilder::default()
            .tol(1e-10)
            .max_evaluations(10000usize)
            .build()
            .unwrap();
        let res = minimizer
            .minimize(&function, array![-1.2, 1.0].view(), array![0.5, 0.5].view())
            .unwrap();
        println!("res: {}", res.simplex);
        assert!(res.converged());
        assert!(res.minimum()[0].approx_eq(1.0, (1e-3, 10)));
        assert!(res.minimum()[1].approx_eq(1.0, (1e-3, 10)));
    }

    #[test]
    fn budget_exhaustion_is_not_an_error() {
        let minimizer = NelderMeadBuilder::default()
            .tol(0.0)
            .steps(5usize)
            .max_evaluations(30usize)
            .build()
            .unwrap();
        let res = minimizer
            .minimize(&quadratic, array![5.0, -3.0].view(), array![0.1, 0.1].view())
            .unwrap();
        assert_eq!(res.status, RunStatus::BudgetExhausted);
        assert!(res.f_evals >= 30);
        assert!(res.iterations % 5 == 0 && res.iterations > 0);
    }

    #[test]
    fn no_steps_when_budget_is_spent_on_setup() {
        let minimizer = NelderMeadBuilder::default()
            .max_evaluations(3usize)
            .build()
            .unwrap();
        let res = minimizer
            .minimize(&quadratic, array![5.0, -3.0].view(), array![0.1, 0.1].view())
            .unwrap();
        assert_eq!(res.f_evals, 3);
        assert_eq!(res.iterations, 0);
        assert_eq!(res.status, RunStatus::BudgetExhausted);
    }

    #[test]
    fn shrink_halves_distances_to_best() {
        let mut minimizer = Minimizer::from_point(
            NelderMead::default(),
            quadratic,
            array![0.3, -0.7, 2.0].view(),
            array![0.4, 0.25, -0.6].view(),
        )
        .unwrap();
        let before = minimizer.simplex().clone();
        minimizer.shrink_toward_best().unwrap();
        let after = minimizer.simplex();

        assert_eq!(minimizer.restarts(), 1);
        assert_eq!(minimizer.evaluations(), 4 + 3);
        assert_eq!(after.best(), before.best());
        let best = before.best().x.view();
        for (old, new) in before.iter().zip(after.iter()).skip(1) {
            let d_old = array::mag(array::sub(old.x.view(), best).unwrap().view());
            let d_new = array::mag(array::sub(new.x.view(), best).unwrap().view());
            assert!(d_new.approx_eq(0.5 * d_old, (1e-14, 4)));
            assert_eq!(new.f, quadratic(new.x.view()));
        }
    }

    #[test]
    fn reflection_beyond_best_is_extended() {
        // a plane: moving away from the worst vertex keeps going downhill
        let plane = |x: ArrayView1<f64>| x[0] + 2.0 * x[1];
        let minimizer = Minimizer::from_point(
            NelderMead::default(),
            plane,
            array![0.0, 0.0].view(),
            array![1.0, 1.0].view(),
        )
        .unwrap();
        // vertices (0, 0), (1, 0), (0, 1); centroid of the best two is (0.5, 0)
        let mid = minimizer.simplex().centroid(1).unwrap();
        let proposal = minimizer.propose(2, mid.x.view()).unwrap();
        assert_eq!(proposal.evaluations, 2);
        let vertex = proposal.vertex.unwrap();
        assert_eq!(vertex.x, array![1.5, -2.0]);
        assert_eq!(vertex.f, -2.5);
    }

    #[test]
    fn failed_contraction_proposes_nothing() {
        // the worst vertex sits in a narrow well that nothing else can reach
        let well = |x: ArrayView1<f64>| {
            if (x[0] - 1.0).abs() < 1e-9 {
                -10.0
            } else {
                x[0] * x[0]
            }
        };
        let minimizer = Minimizer::from_point(
            NelderMead::default(),
            well,
            array![0.0].view(),
            array![1.0].view(),
        )
        .unwrap();
        // sorted: x = 1 (f = -10) then x = 0 (f = 0)
        assert_eq!(minimizer.simplex().best().x[0], 1.0);
        let mid = minimizer.simplex().centroid(1).unwrap();
        let proposal = minimizer.propose(1, mid.x.view()).unwrap();
        // no vertex is worse than the reflection at x = 2 (f = 4), and the
        // contraction to x = 0.5 (f = 0.25) is not below f = 0
        assert_eq!(proposal.vertex, None);
        assert_eq!(proposal.evaluations, 2);
    }

    #[test]
    fn proposal_for_missing_slot_is_an_error() {
        let minimizer = Minimizer::from_point(
            NelderMead::default(),
            quadratic,
            array![0.0, 0.0].view(),
            array![0.1, 0.1].view(),
        )
        .unwrap();
        let mid = minimizer.simplex().centroid(1).unwrap();
        assert_eq!(
            minimizer.propose(3, mid.x.view()),
            Err(Error::DegenerateSimplex(Degeneracy::NoSuchVertex { slot: 3, vertices: 3 }))
        );
        assert_eq!(minimizer.evaluations(), 3);
    }

    #[test]
    fn take_steps_shrinks_when_nothing_improves() {
        let well = |x: ArrayView1<f64>| {
            if (x[0] - 1.0).abs() < 1e-9 {
                -10.0
            } else {
                x[0] * x[0]
            }
        };
        let mut minimizer = Minimizer::from_point(
            NelderMead::default(),
            well,
            array![0.0].view(),
            array![1.0].view(),
        )
        .unwrap();
        minimizer.take_steps(1).unwrap();
        assert_eq!(minimizer.restarts(), 1);
        // 2 to build, 2 for the failed proposal, 1 for the shrink
        assert_eq!(minimizer.evaluations(), 5);
        assert_eq!(minimizer.simplex()[1].x[0], 0.5);
        assert_eq!(minimizer.iterations(), 1);
    }

    #[test]
    fn modes_agree_for_single_replacement() {
        let run = |mode: ReplacementMode| {
            let minimizer = NelderMeadBuilder::default().mode(mode).build().unwrap();
            minimizer
                .minimize(&quadratic, array![0.0, 0.0, 0.0].view(), array![0.1, 0.1, 0.1].view())
                .unwrap()
        };
        let sequential = run(ReplacementMode::Sequential);
        let snapshot = run(ReplacementMode::Snapshot);
        assert_eq!(sequential.simplex, snapshot.simplex);
        assert_eq!(sequential.f_evals, snapshot.f_evals);
    }

    #[test]
    fn snapshot_mode_converges_with_several_replacements() {
        let minimizer = NelderMeadBuilder::default()
            .replace(2usize)
            .mode(ReplacementMode::Snapshot)
            .max_evaluations(5000usize)
            .tol(1e-10)
            .build()
            .unwrap();
        let res = minimizer
            .minimize(&quadratic, array![0.0, 0.0, 0.0, 0.0].view(), array![0.1, 0.1, 0.1, 0.1].view())
            .unwrap();
        assert!(res.converged());
        for xi in res.minimum() {
            assert!((*xi).approx_eq(1.0, (1e-3, 10)));
        }
    }

    #[test]
    fn too_many_replacements_degenerate() {
        let minimizer = NelderMeadBuilder::default().replace(3usize).build().unwrap();
        let err = minimizer
            .minimize(&quadratic, array![0.0, 0.0].view(), array![0.1, 0.1].view())
            .unwrap_err();
        assert!(matches!(err, Error::DegenerateSimplex(_)));
    }

    #[test]
    fn builder_rejects_bad_coefficients() {
        assert!(NelderMeadBuilder::default().contract(1.5).build().is_err());
        assert!(NelderMeadBuilder::default().extend(0.5).build().is_err());
        assert!(NelderMeadBuilder::default().reflect(f64::NAN).build().is_err());
        assert!(NelderMeadBuilder::default().replace(0usize).build().is_err());
        assert!(NelderMeadBuilder::default().steps(0usize).build().is_err());
        assert!(NelderMeadBuilder::default().tol(-1.0).build().is_err());

        let mut config = NelderMead::default();
        config.contract = 0.0;
        let err = config
            .minimize(&quadratic, array![0.0].view(), array![0.1].view())
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidConfiguration(ConfigError::Coefficient { name: "contract", value: 0.0 })
        );
    }

    #[test]
    fn default_matches_builder() {
        assert_eq!(NelderMeadBuilder::default().build().unwrap(), NelderMead::default());
    }
}
