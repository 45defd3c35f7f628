//! Derivative-free minimization of multivariate functions with the
//! Nelder-Mead simplex method.
//!
//! The main entry point is [`NelderMead`], configured through
//! [`NelderMeadBuilder`]. For finer control, a [`Minimizer`] can be driven
//! batch by batch and its [`Simplex`] inspected between batches.
//!
//! The [`array`] and [`rkf45`] modules hold the small numeric helpers the
//! minimizer is usually combined with: vector arithmetic, Gauss-Jordan
//! elimination and a fixed-step Runge-Kutta-Fehlberg integrator.

pub mod array;
pub mod error;
pub mod minimizer;
pub mod rkf45;
mod utils;
pub mod vector;

pub use error::{ConfigError, Degeneracy, Error};
pub use minimizer::{OptimResult, RunStatus};
pub use vector::{
    build_simplex, Minimizer, NelderMead, NelderMeadBuilder, ReplacementMode, Simplex, Vertex,
};
