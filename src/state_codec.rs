//! Bijective mapping between link states and dense array indices.
//!
//! Mixed-radix layout with radices `T_q`, `B+1`, `M·T_q`, `T_e` (innermost to
//! outermost): `index = t_q + T_q·b + T_q·(B+1)·(age−1) + T_q·(B+1)·M·T_q·t_e`.
//!
//! The age digit is stored as `age − 1`, so decoded ages live in `[1, M·T_q]`
//! rather than `[0, M·T_q−1]`: the decoder wraps the digit that would read as
//! age 0 up to the saturated top value. The top and bottom age values are
//! therefore adjacent in the encoding and must never be conflated — the round
//! trip at both boundaries is covered by tests below and in
//! `tests/test_properties.rs`.

use crate::types::ModelParams;

/// Full state of the link at a slot boundary.
///
/// - `query_phase`: slots since the last query, saturating at `T_q − 1`
/// - `bucket_level`: tokens available, `0 ..= B`
/// - `age`: slots since the last delivered update, `1 ..= M·T_q` (saturating)
/// - `error_phase`: position in the periodic channel-error cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkState {
    pub query_phase: usize,
    pub bucket_level: usize,
    pub age: usize,
    pub error_phase: usize,
}

/// Map a state tuple to its flat array index.
#[inline(always)]
pub fn encode(params: &ModelParams, s: LinkState) -> usize {
    let t_q = params.query_period();
    let buckets = params.bucket_size + 1;
    let max_age = params.max_age();
    debug_assert!(s.query_phase < t_q, "query_phase {} out of range", s.query_phase);
    debug_assert!(
        s.bucket_level < buckets,
        "bucket_level {} out of range",
        s.bucket_level
    );
    debug_assert!(
        (1..=max_age).contains(&s.age),
        "age {} out of range",
        s.age
    );
    debug_assert!(
        s.error_phase < params.error_period(),
        "error_phase {} out of range",
        s.error_phase
    );
    s.query_phase
        + t_q * s.bucket_level
        + t_q * buckets * (s.age - 1)
        + t_q * buckets * max_age * s.error_phase
}

/// Expand a flat array index back into its state tuple.
#[inline(always)]
pub fn decode(params: &ModelParams, index: usize) -> LinkState {
    let t_q = params.query_period();
    let buckets = params.bucket_size + 1;
    let max_age = params.max_age();
    debug_assert!(index < params.num_states(), "index {} out of range", index);
    let query_phase = index % t_q;
    let bucket_level = (index / t_q) % buckets;
    // The age digit reads one below the actual age; a digit of max_age − 1
    // shifts to 0 here and means the saturated top value, not age 0.
    let mut age = (index / (t_q * buckets) + 1) % max_age;
    if age == 0 {
        age = max_age;
    }
    let error_phase = index / (t_q * buckets * max_age);
    LinkState {
        query_phase,
        bucket_level,
        age,
        error_phase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelParams {
        ModelParams::new(vec![0.2, 0.8], vec![0.1, 0.0, 1.0], 0.3, 2, 2).unwrap()
    }

    #[test]
    fn round_trip_exhaustive() {
        let p = params();
        for index in 0..p.num_states() {
            assert_eq!(encode(&p, decode(&p, index)), index);
        }
        for t_q in 0..p.query_period() {
            for b in 0..=p.bucket_size {
                for age in 1..=p.max_age() {
                    for t_e in 0..p.error_period() {
                        let s = LinkState {
                            query_phase: t_q,
                            bucket_level: b,
                            age,
                            error_phase: t_e,
                        };
                        assert_eq!(decode(&p, encode(&p, s)), s);
                    }
                }
            }
        }
    }

    #[test]
    fn age_boundary_not_conflated() {
        // age = 1 and age = M·T_q occupy adjacent digit values; they must map
        // to distinct indices and decode back unchanged.
        let p = params();
        let bottom = LinkState {
            query_phase: 0,
            bucket_level: 0,
            age: 1,
            error_phase: 0,
        };
        let top = LinkState {
            age: p.max_age(),
            ..bottom
        };
        let (i_bottom, i_top) = (encode(&p, bottom), encode(&p, top));
        assert_ne!(i_bottom, i_top);
        assert_eq!(decode(&p, i_bottom).age, 1);
        assert_eq!(decode(&p, i_top).age, p.max_age());
    }

    #[test]
    fn index_zero_is_freshest_state() {
        let p = params();
        let s = decode(&p, 0);
        assert_eq!(
            s,
            LinkState {
                query_phase: 0,
                bucket_level: 0,
                age: 1,
                error_phase: 0,
            }
        );
    }
}
