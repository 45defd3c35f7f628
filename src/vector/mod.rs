//! Algorithms that search for local minima of functions along multiple dimensions.

mod nelder_mead;
mod simplex;

pub use self::nelder_mead::{
    Minimizer, NelderMead, NelderMeadBuilder, NelderMeadBuilderError, Proposal, ReplacementMode,
    CONTRACTION_THRESHOLD,
};
pub use self::simplex::{build_simplex, Simplex, Vertex};
