//! Property-based checks for invariants that are better exercised over generated inputs than a
//! handful of fixed scenarios: clock monotonicity and tie-break totality.

use proptest::prelude::*;
use ra_dme::Clock;

#[derive(Debug, Clone)]
enum Op {
    Tick,
    Observe(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Tick), (0u64..1_000_000).prop_map(Op::Observe)]
}

proptest! {
    #[test]
    fn clock_never_decreases_and_dominates_incoming(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let mut clock = Clock::new();
        let mut previous = clock.get();
        for op in ops {
            let incoming = match op {
                Op::Tick => None,
                Op::Observe(ts) => Some(ts),
            };
            let next = clock.observe(incoming);
            prop_assert!(next > previous, "clock must strictly increase on every event");
            if let Some(ts) = incoming {
                prop_assert!(next >= ts + 1, "observed clock must dominate the incoming timestamp");
            }
            previous = next;
        }
    }

    #[test]
    fn tie_break_is_a_strict_total_order(
        ts_a in 0u64..100,
        id_a in "[a-z]{1,8}",
        ts_b in 0u64..100,
        id_b in "[a-z]{1,8}",
    ) {
        let key_a = (ts_a, id_a.clone());
        let key_b = (ts_b, id_b.clone());

        if key_a == key_b {
            prop_assert!(!(key_a < key_b) && !(key_b < key_a));
        } else {
            // exactly one direction holds - totality plus antisymmetry
            prop_assert!((key_a < key_b) ^ (key_b < key_a));
        }

        // ts dominates id: a strictly smaller timestamp always wins regardless of id
        if ts_a != ts_b {
            prop_assert_eq!(ts_a < ts_b, key_a < key_b);
        }
    }
}
