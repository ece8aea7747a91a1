//! Property-based tests for the state codec and the transition model.

use proptest::prelude::*;

use qaoi::dynamics::{advance, build_transitions, SlotEvents};
use qaoi::state_codec::{decode, encode, LinkState};
use qaoi::types::{Action, ModelParams};

/// Strategy: a valid small parameter set.
fn params_strategy() -> impl Strategy<Value = ModelParams> {
    (1usize..=4, 1usize..=3, 1usize..=3, 0usize..=3).prop_flat_map(|(t_q, t_e, m, b)| {
        (
            prop::collection::vec(0.0..=1.0f64, t_e),
            prop::collection::vec(0.0..=1.0f64, t_q),
            0.0..=1.0f64,
            Just(b),
            Just(m),
        )
            .prop_map(|(p_e, p_q, p_b, b, m)| ModelParams::new(p_e, p_q, p_b, b, m).unwrap())
    })
}

/// Strategy: a parameter set plus one of its valid state indices.
fn params_and_index() -> impl Strategy<Value = (ModelParams, usize)> {
    params_strategy().prop_flat_map(|p| {
        let n = p.num_states();
        (Just(p), 0..n)
    })
}

/// Strategy: a parameter set plus one of its valid state tuples.
fn params_and_state() -> impl Strategy<Value = (ModelParams, LinkState)> {
    params_strategy().prop_flat_map(|p| {
        let t_q = p.query_period();
        let b_max = p.bucket_size;
        let max_age = p.max_age();
        let t_e = p.error_period();
        (Just(p), 0..t_q, 0..=b_max, 1..=max_age, 0..t_e).prop_map(
            |(p, query_phase, bucket_level, age, error_phase)| {
                (
                    p,
                    LinkState {
                        query_phase,
                        bucket_level,
                        age,
                        error_phase,
                    },
                )
            },
        )
    })
}

proptest! {
    // 1. Every index decodes to a tuple that encodes back to it.
    #[test]
    fn index_round_trip((p, index) in params_and_index()) {
        prop_assert_eq!(encode(&p, decode(&p, index)), index);
    }

    // 2. Every valid tuple encodes to an in-range index that decodes back.
    #[test]
    fn tuple_round_trip((p, s) in params_and_state()) {
        let index = encode(&p, s);
        prop_assert!(index < p.num_states());
        prop_assert_eq!(decode(&p, index), s);
    }

    // 3. Every structurally feasible transition row sums to 1.
    #[test]
    fn rows_are_stochastic(p in params_strategy()) {
        let t = build_transitions(&p);
        for index in 0..p.num_states() {
            let s = decode(&p, index);
            for action in [Action::Idle, Action::Transmit] {
                if action == Action::Transmit && s.bucket_level == 0 {
                    prop_assert_eq!(t.row(index, action).count(), 0);
                    continue;
                }
                let sum: f64 = t.row(index, action).map(|(_, prob)| prob).sum();
                prop_assert!((sum - 1.0).abs() < 1e-9,
                    "row ({}, {:?}) sums to {}", index, action, sum);
            }
        }
    }

    // 4. A sampled step always lands inside the valid state domain.
    #[test]
    fn advance_stays_in_range(
        (p, s) in params_and_state(),
        token in any::<bool>(),
        query in any::<bool>(),
        delivered in any::<bool>(),
        try_transmit in any::<bool>(),
    ) {
        let action = if try_transmit && s.bucket_level > 0 {
            Action::Transmit
        } else {
            Action::Idle
        };
        let next = advance(&p, s, action, SlotEvents { token, query, delivered });
        prop_assert!(next.query_phase < p.query_period());
        prop_assert!(next.bucket_level <= p.bucket_size);
        prop_assert!((1..=p.max_age()).contains(&next.age));
        prop_assert!(next.error_phase < p.error_period());
    }

    // 5. At the saturated top age, an undelivered slot stays at the top —
    //    it never wraps back to 1.
    #[test]
    fn saturated_age_never_wraps(
        (p, s) in params_and_state(),
        token in any::<bool>(),
        query in any::<bool>(),
    ) {
        let top = LinkState { age: p.max_age(), ..s };
        let next = advance(&p, top, Action::Idle, SlotEvents { token, query, delivered: false });
        prop_assert_eq!(next.age, p.max_age());
    }
}

// 6. Exhaustive bijection check over a grid of small parameter sets
//    (non-proptest, walks the full domain in both directions).
#[test]
fn codec_is_a_bijection_on_small_models() {
    for t_q in 1..=3usize {
        for t_e in 1..=3usize {
            for m in 1..=2usize {
                for b in 0..=2usize {
                    let p = ModelParams::new(vec![0.5; t_e], vec![0.5; t_q], 0.5, b, m).unwrap();
                    for index in 0..p.num_states() {
                        assert_eq!(encode(&p, decode(&p, index)), index);
                    }
                    let mut seen = vec![false; p.num_states()];
                    for query_phase in 0..t_q {
                        for bucket_level in 0..=b {
                            for age in 1..=p.max_age() {
                                for error_phase in 0..t_e {
                                    let s = LinkState {
                                        query_phase,
                                        bucket_level,
                                        age,
                                        error_phase,
                                    };
                                    let index = encode(&p, s);
                                    assert!(!seen[index], "index {index} hit twice");
                                    seen[index] = true;
                                    assert_eq!(decode(&p, index), s);
                                }
                            }
                        }
                    }
                    assert!(seen.iter().all(|&v| v), "encoding left gaps");
                }
            }
        }
    }
}
