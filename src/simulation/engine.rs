//! Monte Carlo engine — replays the link dynamics under a fixed policy.
//!
//! Each slot draws one uniform per structurally relevant event: the query and
//! token arrivals always, the channel outcome only when the policy picks a
//! transmission. The drawn events feed the same [`advance`] function the
//! transition table is built from, so the sampled process and the solver's
//! probability model are the same dynamics by construction.
//!
//! Runs are deterministic under a fixed seed; run-to-run variation across
//! seeds is expected and is not an error.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::dynamics::{advance, SlotEvents};
use crate::state_codec::{encode, LinkState};
use crate::types::{Action, ModelParams};

/// Unnormalized steady-state age counts, indexed by `age − 1`.
pub struct AgeHistograms {
    /// Slots spent at each age value.
    pub aoi: Vec<u64>,
    /// Counts restricted to slots where a query arrived.
    pub qaoi: Vec<u64>,
}

/// Raw per-slot record of a simulation run.
pub struct AgeTrace {
    /// Realized age after each slot.
    pub age: Vec<u32>,
    /// 1 where a query arrived in that slot.
    pub query: Vec<u8>,
}

/// Simulation entry point: fresh update just delivered, empty bucket, one
/// slot since the last query.
fn initial_state(params: &ModelParams) -> LinkState {
    LinkState {
        query_phase: 1.min(params.query_period() - 1),
        bucket_level: 0,
        age: 1,
        error_phase: 0,
    }
}

/// Draw the slot events relevant to `action`.
#[inline(always)]
fn draw_events(
    params: &ModelParams,
    s: &LinkState,
    action: Action,
    rng: &mut SmallRng,
) -> SlotEvents {
    let query = rng.random::<f64>() < params.query_dist[s.query_phase];
    let token = rng.random::<f64>() < params.token_prob;
    let delivered = match action {
        Action::Transmit => rng.random::<f64>() >= params.channel_error[s.error_phase],
        Action::Idle => false,
    };
    SlotEvents {
        token,
        query,
        delivered,
    }
}

/// Run `steps` slots under `policy`, accumulating age histograms.
///
/// The AoI histogram counts the realized age at every slot; the QAoI
/// histogram counts it only at query slots. Counts are unnormalized —
/// normalization and expectations are the caller's concern.
pub fn simulate_histograms(
    params: &ModelParams,
    policy: &[Action],
    steps: usize,
    rng: &mut SmallRng,
) -> AgeHistograms {
    debug_assert_eq!(policy.len(), params.num_states());
    let mut aoi = vec![0u64; params.max_age()];
    let mut qaoi = vec![0u64; params.max_age()];

    let mut s = initial_state(params);
    for _ in 0..steps {
        let action = policy[encode(params, s)];
        let ev = draw_events(params, &s, action, rng);
        s = advance(params, s, action, ev);
        aoi[s.age - 1] += 1;
        if ev.query {
            qaoi[s.age - 1] += 1;
        }
    }

    AgeHistograms { aoi, qaoi }
}

/// Run `steps` slots under `policy`, recording the full age trace and the
/// query-arrival indicator, with no aggregation.
pub fn simulate_trace(
    params: &ModelParams,
    policy: &[Action],
    steps: usize,
    rng: &mut SmallRng,
) -> AgeTrace {
    debug_assert_eq!(policy.len(), params.num_states());
    let mut age = Vec::with_capacity(steps);
    let mut query = Vec::with_capacity(steps);

    let mut s = initial_state(params);
    for _ in 0..steps {
        let action = policy[encode(params, s)];
        let ev = draw_events(params, &s, action, rng);
        s = advance(params, s, action, ev);
        age.push(s.age as u32);
        query.push(ev.query as u8);
    }

    AgeTrace { age, query }
}
