//! Fatal error taxonomy: invalid configuration and solver non-convergence.
//!
//! Indexing faults (a non-bijective encode/decode, an out-of-range successor)
//! are a programming-defect class: they are guarded by `debug_assert!` and the
//! invariant tests, never surfaced as a runtime variant here.

use thiserror::Error;

/// Errors raised while building or solving a link model.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("probability {value} for {name} is outside [0, 1]")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("{name} must contain at least one phase")]
    EmptyDistribution { name: &'static str },

    #[error("staleness bound must be at least one query period")]
    DegenerateStateSpace,

    #[error("discount factor {0} must lie in [0, 1)")]
    InvalidDiscount(f64),

    #[error("policy iteration did not stabilize within {sweeps} improvement sweeps")]
    NonConvergence { sweeps: usize },
}
