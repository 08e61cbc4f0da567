//! Property-based invariant tests for the query debouncer.
//!
//! 1. Latest-wins: after any burst, the released value is the last pushed.
//! 2. Quiet window: nothing is released before `delay_ms` after the last push.
//! 3. Accounting: pushed == released + superseded + pending.

use std::time::{Duration, Instant};

use picklist_core::debounce::{DebounceConfig, Debouncer};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn gaps_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..=250, 1..40)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Latest-wins
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn latest_value_survives_burst(gaps in gaps_strategy(), delay in 1u64..=200) {
        let mut debouncer = Debouncer::new(DebounceConfig::with_delay_ms(delay));
        let t0 = Instant::now();
        let mut now = t0;
        let mut last_released = None;

        for (value, gap) in gaps.iter().enumerate() {
            now += Duration::from_millis(*gap);
            if let Some(v) = debouncer.poll_at(now) {
                last_released = Some(v);
            }
            prop_assert!(debouncer.push_at(value, now).is_none());
        }

        let final_value = gaps.len() - 1;
        let released = debouncer.poll_at(now + Duration::from_millis(delay));
        prop_assert_eq!(released, Some(final_value));
        prop_assert!(last_released.is_none_or(|v| v < final_value));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Quiet window
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn never_released_early(delay in 1u64..=200, elapsed in 0u64..200) {
        let mut debouncer = Debouncer::new(DebounceConfig::with_delay_ms(delay));
        let t0 = Instant::now();
        debouncer.push_at("q", t0);
        let released = debouncer.poll_at(t0 + Duration::from_millis(elapsed));
        if elapsed < delay {
            prop_assert!(released.is_none());
        } else {
            prop_assert_eq!(released, Some("q"));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Accounting
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn counters_balance(gaps in gaps_strategy(), delay in 0u64..=120) {
        let mut debouncer = Debouncer::new(DebounceConfig::with_delay_ms(delay));
        let mut now = Instant::now();
        for (value, gap) in gaps.iter().enumerate() {
            now += Duration::from_millis(*gap);
            debouncer.poll_at(now);
            debouncer.push_at(value, now);
        }
        let stats = debouncer.stats();
        let pending = u64::from(debouncer.is_pending());
        prop_assert_eq!(stats.pushed, stats.released + stats.superseded + pending);
    }
}
