//! Per-slot stochastic dynamics of the link.
//!
//! Three independent stochastic events can occur in a slot — a token arrival,
//! a query arrival, and (only under a transmission) the channel outcome —
//! plus one deterministic event, the error-phase advance. [`advance`] applies
//! one fully-resolved slot to a state; it is the single source of truth for
//! the saturation clamps and the token-consumption rule, called both by
//! [`build_transitions`] (which enumerates event combinations with their
//! probabilities) and by the Monte Carlo engine (which samples each event
//! once). The solver and the simulator therefore cannot drift apart.
//!
//! The transition table uses sparse CSR storage: only branches with non-zero
//! probability are kept, at most 8 per (state, action) row.

use crate::state_codec::{decode, encode, LinkState};
use crate::types::{Action, ModelParams, Objective};

/// Resolved outcome of the per-slot stochastic events.
#[derive(Clone, Copy, Debug)]
pub struct SlotEvents {
    /// A replenishment token arrived.
    pub token: bool,
    /// A query arrived.
    pub query: bool,
    /// The transmitted update reached the receiver. Only read under
    /// [`Action::Transmit`].
    pub delivered: bool,
}

/// Apply one slot to `s` under `action` with the given event outcomes.
///
/// - age: resets to 1 on a delivered transmission, else increments,
///   saturating at `M·T_q`;
/// - query phase: resets to 0 on a query arrival, else advances, saturating
///   at `T_q − 1`;
/// - bucket: gains the token, loses one on a transmission attempt (even a
///   failed one), clamped to `B`;
/// - error phase: always advances modulo `T_e`.
#[inline(always)]
pub fn advance(params: &ModelParams, s: LinkState, action: Action, ev: SlotEvents) -> LinkState {
    debug_assert!(
        action == Action::Idle || s.bucket_level > 0,
        "transmit with an empty bucket"
    );
    let delivered = action == Action::Transmit && ev.delivered;
    let age = if delivered {
        1
    } else {
        (s.age + 1).min(params.max_age())
    };
    let query_phase = if ev.query {
        0
    } else {
        (s.query_phase + 1).min(params.query_period() - 1)
    };
    let bucket_level = (s.bucket_level + ev.token as usize - action.index()).min(params.bucket_size);
    let error_phase = (s.error_phase + 1) % params.error_period();
    LinkState {
        query_phase,
        bucket_level,
        age,
        error_phase,
    }
}

/// Transition probabilities in sparse CSR form, one row per (state, action).
///
/// Layout (row `r = state·2 + action`):
/// - `probs[row_start[r]..row_start[r+1]]` — branch probabilities
/// - `succ[row_start[r]..row_start[r+1]]` — successor state indices
///
/// Every feasible row sums to 1; the row for a transmission with an empty
/// bucket is empty. Built once per parameter set, read-only afterwards, and
/// safe to share across parallel sweep workers.
pub struct TransitionTable {
    pub probs: Vec<f64>,
    pub succ: Vec<u32>,
    pub row_start: Vec<u32>,
}

impl TransitionTable {
    /// Successor `(index, probability)` pairs for one (state, action) row.
    #[inline(always)]
    pub fn row(&self, state: usize, action: Action) -> impl Iterator<Item = (usize, f64)> + '_ {
        let r = state * 2 + action.index();
        let lo = self.row_start[r] as usize;
        let hi = self.row_start[r + 1] as usize;
        self.succ[lo..hi]
            .iter()
            .zip(&self.probs[lo..hi])
            .map(|(&s, &p)| (s as usize, p))
    }

    /// Number of (state, action) rows.
    #[inline(always)]
    pub fn num_rows(&self) -> usize {
        self.row_start.len() - 1
    }
}

/// Enumerate every (state, action) row of the transition table.
///
/// Branch structure per action:
/// - Idle, bucket not full: {token} × {query}, 4 branches;
/// - Idle, bucket full: the token arrival cannot change the successor, so the
///   token sub-event collapses and only {query} remains, 2 branches;
/// - Transmit (bucket > 0): {token} × {channel outcome} × {query}, 8 branches.
///
/// Successors are expanded from a pre-clamped age: any state already at or
/// past `M·T_q − 1` expands as if its age were `M·T_q − 2`, keeping the
/// age-increment branch inside the representable range. The clamp slightly
/// concentrates probability mass at the two top age values; it is a fixed
/// saturation policy of the model, matched exactly by consumers of the table.
pub fn build_transitions(params: &ModelParams) -> TransitionTable {
    let n = params.num_states();
    let max_age = params.max_age();
    let p_b = params.token_prob;

    let mut probs = Vec::with_capacity(n * 12);
    let mut succ = Vec::with_capacity(n * 12);
    let mut row_start = Vec::with_capacity(2 * n + 1);
    row_start.push(0u32);

    for index in 0..n {
        let s = decode(params, index);
        let p_q = params.query_dist[s.query_phase];
        let p_e = params.channel_error[s.error_phase];

        let mut base = s;
        if base.age >= max_age.saturating_sub(1) {
            base.age = max_age.saturating_sub(2);
        }

        // Idle row.
        if s.bucket_level < params.bucket_size {
            for (token, p_token) in [(false, 1.0 - p_b), (true, p_b)] {
                for (query, p_query) in [(false, 1.0 - p_q), (true, p_q)] {
                    push_branch(
                        &mut probs,
                        &mut succ,
                        params,
                        base,
                        Action::Idle,
                        SlotEvents {
                            token,
                            query,
                            delivered: false,
                        },
                        p_token * p_query,
                    );
                }
            }
        } else {
            for (query, p_query) in [(false, 1.0 - p_q), (true, p_q)] {
                push_branch(
                    &mut probs,
                    &mut succ,
                    params,
                    base,
                    Action::Idle,
                    SlotEvents {
                        token: false,
                        query,
                        delivered: false,
                    },
                    p_query,
                );
            }
        }
        row_start.push(succ.len() as u32);

        // Transmit row; empty when the bucket is empty.
        if s.bucket_level > 0 {
            for (token, p_token) in [(false, 1.0 - p_b), (true, p_b)] {
                for (delivered, p_outcome) in [(false, p_e), (true, 1.0 - p_e)] {
                    for (query, p_query) in [(false, 1.0 - p_q), (true, p_q)] {
                        push_branch(
                            &mut probs,
                            &mut succ,
                            params,
                            base,
                            Action::Transmit,
                            SlotEvents {
                                token,
                                query,
                                delivered,
                            },
                            p_token * p_outcome * p_query,
                        );
                    }
                }
            }
        }
        row_start.push(succ.len() as u32);
    }

    TransitionTable {
        probs,
        succ,
        row_start,
    }
}

#[inline(always)]
fn push_branch(
    probs: &mut Vec<f64>,
    succ: &mut Vec<u32>,
    params: &ModelParams,
    base: LinkState,
    action: Action,
    ev: SlotEvents,
    prob: f64,
) {
    if prob == 0.0 {
        return;
    }
    let next = advance(params, base, action, ev);
    succ.push(encode(params, next) as u32);
    probs.push(prob);
}

/// Per-state one-step reward under the given objective.
///
/// A state costs its age: `reward = 1 − age` (0 when perfectly fresh). Under
/// QAoI the cost is realized only at query instants (`query_phase == 0`).
pub fn reward_vector(params: &ModelParams, objective: Objective) -> Vec<f64> {
    (0..params.num_states())
        .map(|index| {
            let s = decode(params, index);
            let r = 1.0 - s.age as f64;
            match objective {
                Objective::Aoi => r,
                Objective::Qaoi => {
                    if s.query_phase == 0 {
                        r
                    } else {
                        0.0
                    }
                }
            }
        })
        .collect()
}
