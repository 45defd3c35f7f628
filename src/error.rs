//! Error types shared by the simplex code.

use thiserror::Error;

use crate::array::DimensionError;

/// Errors raised by simplex construction and iteration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("degenerate simplex: {0}")]
    DegenerateSimplex(#[from] Degeneracy),

    #[error(transparent)]
    Dimension(#[from] DimensionError),
}

/// Caller-supplied settings or start data that cannot be used.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("start point has no parameters")]
    Empty,

    #[error("{steps} step sizes given for {params} parameters")]
    LengthMismatch { params: usize, steps: usize },

    #[error("step size for axis {axis} is zero")]
    ZeroStep { axis: usize },

    #[error("centroid exclusion count must be positive")]
    ZeroExclusion,

    #[error("at least one iteration per batch is required")]
    ZeroSteps,

    #[error("{name} coefficient {value} is out of range")]
    Coefficient { name: &'static str, value: f64 },

    #[error("tolerance {0} must be finite and non-negative")]
    Tolerance(f64),
}

/// Ways in which a set of vertices fails to form a usable simplex.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    #[error("no vertices")]
    NoVertices,

    #[error("excluding {excluded} of {vertices} vertices leaves none for the centroid")]
    NoneRemaining { vertices: usize, excluded: usize },

    #[error("{vertices} vertices cannot span {dim} dimensions")]
    WrongCount { vertices: usize, dim: usize },

    #[error("no vertex at index {slot} of {vertices}")]
    NoSuchVertex { slot: usize, vertices: usize },
}
