//! Channel-error sweep: solve and characterize every swept error setting.
//!
//! Each grid value is fully independent (its own model, its own two solves,
//! its own simulations), so the sweep parallelizes across the grid with
//! rayon while everything inside one setting stays sequential. Results are
//! collected in grid order — `points[g]` always belongs to `error_grid[g]`,
//! a contract the downstream plotting stage depends on.

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::simulation::{simulate_histograms, simulate_trace};
use crate::types::{Action, LinkModel, ModelParams, Objective};

/// Experiment configuration for one sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Error probabilities applied to phase 0 of the channel-error cycle.
    pub error_grid: Vec<f64>,
    pub error_period: usize,
    pub query_period: usize,
    pub token_prob: f64,
    pub bucket_size: usize,
    pub max_query_multiple: usize,
    pub discount: f64,
    /// Slots simulated per histogram run.
    pub histogram_steps: usize,
    /// Slots recorded per trace run.
    pub trace_steps: usize,
    pub seed: u64,
}

impl SweepConfig {
    /// Model parameters for one swept error value: phase 0 of the error
    /// cycle carries `eps`, every other phase always fails; queries arrive
    /// deterministically every `query_period` slots.
    pub fn params_for(&self, eps: f64) -> Result<ModelParams, ModelError> {
        let mut channel_error = vec![1.0; self.error_period];
        if let Some(first) = channel_error.first_mut() {
            *first = eps;
        }
        let mut query_dist = vec![0.0; self.query_period];
        if let Some(last) = query_dist.last_mut() {
            *last = 1.0;
        }
        ModelParams::new(
            channel_error,
            query_dist,
            self.token_prob,
            self.bucket_size,
            self.max_query_multiple,
        )
    }
}

/// Empirical characterization of one policy at one error setting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyEvaluation {
    /// Normalized AoI distribution over ages `1 ..= M·T_q`.
    pub aoi_dist: Vec<f64>,
    /// Normalized QAoI distribution (ages observed at query instants).
    pub qaoi_dist: Vec<f64>,
    pub mean_aoi: f64,
    pub mean_qaoi: f64,
    /// Realized age per slot, `trace_steps` long.
    pub age_trace: Vec<u32>,
    /// Query-arrival indicator per slot, aligned with `age_trace`.
    pub query_trace: Vec<u8>,
}

/// Everything measured at one swept error value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub error_prob: f64,
    /// Measurements under the AoI-optimal policy.
    pub aoi_policy: PolicyEvaluation,
    /// Measurements under the QAoI-optimal policy.
    pub qaoi_policy: PolicyEvaluation,
}

/// The persisted result bundle of a full sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    pub config: SweepConfig,
    /// One entry per `config.error_grid` value, in grid order.
    pub points: Vec<SweepPoint>,
}

/// Run the full sweep, parallel across the error grid.
pub fn run_sweep(config: &SweepConfig) -> Result<SweepResults, ModelError> {
    let total = Instant::now();
    let points: Result<Vec<SweepPoint>, ModelError> = config
        .error_grid
        .par_iter()
        .enumerate()
        .map(|(g, &eps)| sweep_point(config, g, eps))
        .collect();
    let points = points?;
    println!(
        "Sweep finished: {} error settings in {:.1}s",
        points.len(),
        total.elapsed().as_secs_f64()
    );
    Ok(SweepResults {
        config: config.clone(),
        points,
    })
}

fn sweep_point(config: &SweepConfig, g: usize, eps: f64) -> Result<SweepPoint, ModelError> {
    let t0 = Instant::now();
    let model = LinkModel::new(config.params_for(eps)?)?;
    let aoi = model.solve(Objective::Aoi, config.discount)?;
    let qaoi = model.solve(Objective::Qaoi, config.discount)?;

    let mut rng = SmallRng::seed_from_u64(config.seed.wrapping_add(g as u64));
    let aoi_policy = evaluate_policy(model.params(), &aoi.policy, config, &mut rng);
    let qaoi_policy = evaluate_policy(model.params(), &qaoi.policy, config, &mut rng);

    println!(
        "  eps={eps:.3}: solved in {}/{} sweeps (AoI/QAoI), simulated in {:.2}s",
        aoi.sweeps,
        qaoi.sweeps,
        t0.elapsed().as_secs_f64()
    );

    Ok(SweepPoint {
        error_prob: eps,
        aoi_policy,
        qaoi_policy,
    })
}

fn evaluate_policy(
    params: &ModelParams,
    policy: &[Action],
    config: &SweepConfig,
    rng: &mut SmallRng,
) -> PolicyEvaluation {
    let hist = simulate_histograms(params, policy, config.histogram_steps, rng);
    let aoi_dist = normalize(&hist.aoi);
    let qaoi_dist = normalize(&hist.qaoi);
    let mean_aoi = mean_age(&aoi_dist);
    let mean_qaoi = mean_age(&qaoi_dist);
    let trace = simulate_trace(params, policy, config.trace_steps, rng);
    PolicyEvaluation {
        aoi_dist,
        qaoi_dist,
        mean_aoi,
        mean_qaoi,
        age_trace: trace.age,
        query_trace: trace.query,
    }
}

/// Normalize counts to a probability mass function; all-zero counts stay
/// zero instead of dividing by zero.
pub fn normalize(counts: &[u64]) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

/// Expectation of a mass function indexed by `age − 1`.
pub fn mean_age(dist: &[f64]) -> f64 {
    dist.iter()
        .enumerate()
        .map(|(i, &p)| (i + 1) as f64 * p)
        .sum()
}

/// Evenly spaced grid of `n` values, rounded to avoid float drift in labels
/// (0.1 + 0.1 + 0.1 != 0.3).
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![lo];
    }
    let step = (hi - lo) / (n - 1) as f64;
    (0..n)
        .map(|i| ((lo + i as f64 * step) * 1e4).round() / 1e4)
        .collect()
}
