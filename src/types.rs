//! Core model types: link parameters, actions, objectives, and the
//! [`LinkModel`] context.
//!
//! [`ModelParams`] is validated once at construction and then passed by shared
//! reference into every component — there is no process-wide mutable state.
//! [`LinkModel`] plays the role of the build-once context: parameters plus the
//! derived transition table, shared immutably by the solver, the simulator,
//! and parallel sweep workers.

use serde::{Deserialize, Serialize};

use crate::dynamics::{build_transitions, reward_vector, TransitionTable};
use crate::error::ModelError;
use crate::policy_iteration::{self, Solution};

/// Freshness objective the solver optimizes for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Age of Information, penalized at every slot.
    Aoi,
    /// Query Age of Information, penalized only at query instants.
    Qaoi,
}

/// Per-slot transmission decision.
///
/// `Transmit` is structurally feasible only with a non-empty token bucket;
/// the attempt consumes a token even when the channel drops the update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Action {
    Idle = 0,
    Transmit = 1,
}

impl Action {
    /// Row offset of this action within the transition table.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Immutable model parameters, validated at construction.
///
/// - `channel_error[t_e]`: probability a transmission in error phase `t_e`
///   fails; the error process is periodic with period `T_e`.
/// - `query_dist[t_q]`: probability a query arrives `t_q` slots after the
///   previous one; periodic with period `T_q`.
/// - `token_prob`: per-slot probability one token is added to the bucket.
/// - `bucket_size`: maximum token count `B`.
/// - `max_query_multiple`: staleness bound `M`, in query periods; the tracked
///   age saturates at `M·T_q`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub channel_error: Vec<f64>,
    pub query_dist: Vec<f64>,
    pub token_prob: f64,
    pub bucket_size: usize,
    pub max_query_multiple: usize,
}

impl ModelParams {
    /// Build and validate a parameter set.
    pub fn new(
        channel_error: Vec<f64>,
        query_dist: Vec<f64>,
        token_prob: f64,
        bucket_size: usize,
        max_query_multiple: usize,
    ) -> Result<Self, ModelError> {
        let params = Self {
            channel_error,
            query_dist,
            token_prob,
            bucket_size,
            max_query_multiple,
        };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.channel_error.is_empty() {
            return Err(ModelError::EmptyDistribution {
                name: "channel_error",
            });
        }
        if self.query_dist.is_empty() {
            return Err(ModelError::EmptyDistribution { name: "query_dist" });
        }
        for &p in &self.channel_error {
            if !(0.0..=1.0).contains(&p) {
                return Err(ModelError::InvalidProbability {
                    name: "channel_error",
                    value: p,
                });
            }
        }
        for &p in &self.query_dist {
            if !(0.0..=1.0).contains(&p) {
                return Err(ModelError::InvalidProbability {
                    name: "query_dist",
                    value: p,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.token_prob) {
            return Err(ModelError::InvalidProbability {
                name: "token_prob",
                value: self.token_prob,
            });
        }
        if self.max_query_multiple == 0 {
            return Err(ModelError::DegenerateStateSpace);
        }
        Ok(())
    }

    /// Error-process period `T_e`.
    #[inline(always)]
    pub fn error_period(&self) -> usize {
        self.channel_error.len()
    }

    /// Query-process period `T_q`.
    #[inline(always)]
    pub fn query_period(&self) -> usize {
        self.query_dist.len()
    }

    /// Saturated maximum age `M·T_q`.
    #[inline(always)]
    pub fn max_age(&self) -> usize {
        self.max_query_multiple * self.query_period()
    }

    /// Total number of states `T_q·(B+1)·M·T_q·T_e`.
    #[inline(always)]
    pub fn num_states(&self) -> usize {
        self.query_period() * (self.bucket_size + 1) * self.max_age() * self.error_period()
    }
}

/// A validated model plus its transition table, built once and then read-only.
pub struct LinkModel {
    params: ModelParams,
    transitions: TransitionTable,
}

impl LinkModel {
    /// Validate `params` and build the transition table.
    pub fn new(params: ModelParams) -> Result<Self, ModelError> {
        params.validate()?;
        let transitions = build_transitions(&params);
        Ok(Self {
            params,
            transitions,
        })
    }

    #[inline(always)]
    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    #[inline(always)]
    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Solve for the optimal stationary policy under `objective`.
    pub fn solve(&self, objective: Objective, discount: f64) -> Result<Solution, ModelError> {
        let reward = reward_vector(&self.params, objective);
        policy_iteration::solve(&self.params, &self.transitions, &reward, discount)
    }
}
