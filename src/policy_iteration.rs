//! Modified policy iteration over the link MDP.
//!
//! Each outer sweep runs ONE synchronous Bellman backup of the current policy
//! (not an inner solve to convergence), then a greedy improvement pass using
//! the freshly evaluated values. The value vector starts from a pessimistic
//! floor, so successive evaluation sweeps improve monotonically from below.
//! Termination is "no action changed in an improvement sweep", not a
//! value-delta threshold.

use crate::dynamics::TransitionTable;
use crate::error::ModelError;
use crate::state_codec::decode;
use crate::types::{Action, ModelParams};

/// Margin a candidate action must exceed before it replaces the incumbent.
/// Ties and near-ties keep the incumbent, biasing the policy toward idling.
pub const IMPROVEMENT_TOLERANCE: f64 = 1e-3;

/// Outer-sweep cap. Discounts close to 1 can stall the improvement margin;
/// exceeding the cap is reported as a configuration fault, never truncated
/// silently.
pub const MAX_SWEEPS: usize = 10_000;

/// An optimal stationary policy with its value vector.
#[derive(Debug)]
pub struct Solution {
    /// One action per state index; read-only once returned.
    pub policy: Vec<Action>,
    /// Discounted value of every state under `policy`.
    pub values: Vec<f64>,
    /// Outer sweeps until no improvement changed an action.
    pub sweeps: usize,
}

/// Solve for the optimal stationary policy.
///
/// `reward` is one of the [`crate::dynamics::reward_vector`] objectives;
/// `discount` must lie in `[0, 1)`.
pub fn solve(
    params: &ModelParams,
    transitions: &TransitionTable,
    reward: &[f64],
    discount: f64,
) -> Result<Solution, ModelError> {
    if !(0.0..1.0).contains(&discount) {
        return Err(ModelError::InvalidDiscount(discount));
    }
    let n = params.num_states();
    debug_assert_eq!(reward.len(), n);
    debug_assert_eq!(transitions.num_rows(), 2 * n);

    let mut policy = vec![Action::Idle; n];
    let floor = -(((params.max_query_multiple + 1) * params.query_period()) as f64)
        / (1.0 - discount);
    let mut values = vec![floor; n];

    for sweep in 1..=MAX_SWEEPS {
        values = evaluation_sweep(transitions, reward, &values, &policy, discount);

        let mut changed = false;
        for s in 0..n {
            let state = decode(params, s);
            let mut q_best = values[s];
            for action in [Action::Idle, Action::Transmit] {
                let feasible = match action {
                    Action::Idle => true,
                    // Never consider spending a token when the bucket is
                    // empty or delivery is impossible in this error phase.
                    Action::Transmit => {
                        state.bucket_level > 0
                            && params.channel_error[state.error_phase] < 1.0
                    }
                };
                if !feasible {
                    continue;
                }
                let q = action_value(transitions, reward, &values, s, action, discount);
                if q > q_best + IMPROVEMENT_TOLERANCE {
                    policy[s] = action;
                    q_best = q;
                    changed = true;
                }
            }
        }

        if !changed {
            return Ok(Solution {
                policy,
                values,
                sweeps: sweep,
            });
        }
    }

    Err(ModelError::NonConvergence { sweeps: MAX_SWEEPS })
}

/// One synchronous Bellman backup of every state under a fixed policy.
///
/// Starting from a vector that underestimates every state (such as the
/// solver's pessimistic floor), repeated sweeps are elementwise
/// non-decreasing.
pub fn evaluation_sweep(
    transitions: &TransitionTable,
    reward: &[f64],
    values: &[f64],
    policy: &[Action],
    discount: f64,
) -> Vec<f64> {
    (0..policy.len())
        .map(|s| action_value(transitions, reward, values, s, policy[s], discount))
        .collect()
}

/// Expected one-step reward plus discounted successor value.
#[inline(always)]
fn action_value(
    transitions: &TransitionTable,
    reward: &[f64],
    values: &[f64],
    state: usize,
    action: Action,
    discount: f64,
) -> f64 {
    transitions
        .row(state, action)
        .map(|(succ, p)| p * (reward[succ] + discount * values[succ]))
        .sum()
}
