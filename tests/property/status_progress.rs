//! Batch status transitions never move backwards

use chrono::NaiveDate;
use mealplan::batch::{GenerationStatus, StatusState};
use mealplan::store::StatusKey;
use mealplan::types::UserId;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Begin,
    RecordDay,
    AdvanceTo(u32),
    Fail,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Begin),
        Just(Op::RecordDay),
        (0u32..10).prop_map(Op::AdvanceTo),
        Just(Op::Fail),
    ]
}

proptest! {
    #[test]
    fn progress_is_monotonic_and_terminal_states_stick(ops in prop::collection::vec(op(), 0..30)) {
        let key = StatusKey::new(UserId::new("u1"), NaiveDate::from_ymd_opt(2026, 10, 21).unwrap());
        let mut status = GenerationStatus::new(&key, 7, 0).unwrap();

        for (step, op) in ops.into_iter().enumerate() {
            let now = step as u64 + 1;
            let result = match op {
                Op::Begin => status.begin(now),
                Op::RecordDay => status.record_day(now),
                Op::AdvanceTo(days) => status.advance_to(days, now),
                Op::Fail => status.fail("boom", now),
            };
            if let Ok(next) = result {
                prop_assert!(next.completed_days >= status.completed_days);
                prop_assert!(next.completed_days <= next.total_days);
                if status.is_terminal() {
                    prop_assert_eq!(next.state, status.state);
                }
                if next.state == StatusState::Completed {
                    prop_assert_eq!(next.completed_days, 7);
                }
                status = next;
            }
        }
    }
}
