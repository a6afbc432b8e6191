//! Model-based property test: for any sequence of claim/unclaim/resize
//! operations, the stored claimed count always equals the number of claim
//! records and never exceeds the capacity.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

mod common;

use common::SlotDetails;
use huddle_core::{Capacity, ParentId, UserId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Claim(usize),
    Unclaim(usize),
    Resize(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4_usize).prop_map(Op::Claim),
        (0..4_usize).prop_map(Op::Unclaim),
        (1..6_u32).prop_map(Op::Resize),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn claimed_count_always_matches_claim_records(
        capacity in 1..5_u32,
        ops in proptest::collection::vec(op_strategy(), 1..24),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async move {
            let engine = common::engine();
            let parent = ParentId::new();
            let owner = UserId::new();
            let users: Vec<UserId> = (0..4).map(|_| UserId::new()).collect();

            let offer = engine
                .create(parent, owner, Capacity::new(capacity), SlotDetails::default())
                .await
                .unwrap();

            for op in ops {
                let result = match op {
                    Op::Claim(i) => engine
                        .claim(parent, offer.offer_id, users[i], ())
                        .await
                        .map(|_| ()),
                    Op::Unclaim(i) => engine.unclaim(parent, offer.offer_id, users[i]).await,
                    Op::Resize(c) => engine
                        .update_capacity(parent, offer.offer_id, owner, Capacity::new(c))
                        .await
                        .map(|_| ()),
                };

                // business rejections are expected; transient failures are not
                if let Err(err) = result {
                    assert!(!err.is_retryable(), "unexpected transient failure: {err}");
                }

                let state = engine.get(parent, offer.offer_id).await.unwrap();
                assert_eq!(
                    state.claimed_count(),
                    u32::try_from(state.claims.len()).unwrap()
                );
                assert!(state.claimed_count() <= state.pool.total().value());
            }
        });
    }
}
