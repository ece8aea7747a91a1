//! Monte Carlo validation of solved policies.
//!
//! - [`engine`]: replay the link dynamics under a fixed policy, producing
//!   steady-state age histograms or raw per-slot traces.

pub mod engine;

pub use engine::{simulate_histograms, simulate_trace, AgeHistograms, AgeTrace};
