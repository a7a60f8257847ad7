//! Property tests for load planning and watermark invariants.
//!
//! Uses proptest to verify:
//! 1. Range correctness: incremental requests cover exactly (watermark, current]
//! 2. Finalization guard: the recorded watermark never passes the latest
//!    finalized gameweek
//! 3. Monotonicity: watermark reads never decrease as the ledger grows

use fpl_core::clock::FixedClock;
use fpl_core::domain::{DatasetKind, LoadStrategy};
use fpl_core::events::RunLog;
use fpl_core::ledger::{MemoryLedger, WatermarkStore};
use fpl_core::planner::LoadPlan;
use proptest::prelude::*;

// ── 1. Range correctness ────────────────────

proptest! {
    #[test]
    fn incremental_requests_cover_exactly_the_gap(watermark in 0u32..60, current in 1u32..60) {
        let plan = LoadPlan::new(LoadStrategy::Incremental, watermark, current);
        let requested: Vec<u32> = plan
            .requests(DatasetKind::GameweekLive)
            .into_iter()
            .map(|s| s.unwrap())
            .collect();

        let expected: Vec<u32> = ((watermark + 1)..=current).collect();
        prop_assert_eq!(&requested, &expected);
        prop_assert!(requested.iter().all(|&s| s > watermark));
        prop_assert_eq!(plan.is_empty(), watermark >= current);
    }

    #[test]
    fn full_plan_is_a_single_request(watermark in 0u32..60, current in 1u32..60) {
        let plan = LoadPlan::new(LoadStrategy::Full, watermark, current);
        prop_assert_eq!(plan.requests(DatasetKind::Players), vec![None]);
        prop_assert_eq!(plan.requests(DatasetKind::GameweekLive), vec![Some(current)]);
        prop_assert_eq!(plan.next_watermark(0), current);
    }
}

// ── 2. Finalization guard ────────────────────

proptest! {
    #[test]
    fn incremental_watermark_never_passes_finalized(
        watermark in 0u32..38,
        ahead in 1u32..5,
        unfinalized in 0u32..3,
    ) {
        let current = watermark + ahead;
        let latest_finalized = current.saturating_sub(unfinalized).max(watermark);
        let plan = LoadPlan::new(LoadStrategy::Incremental, watermark, current);

        let next = plan.next_watermark(latest_finalized);
        prop_assert!(next <= latest_finalized);
        prop_assert!(next <= current);
        prop_assert!(next >= watermark);
    }
}

#[test]
fn provisional_current_gameweek_is_not_recorded() {
    let plan = LoadPlan::new(LoadStrategy::Incremental, 3, 5);
    assert_eq!(plan.next_watermark(4), 4);
}

// ── 3. Monotonicity ────────────────────

proptest! {
    #[test]
    fn watermark_reads_never_decrease(recorded in prop::collection::vec(0u32..40, 1..12)) {
        let clock = FixedClock::on(2025, 3, 1);
        let log = RunLog::new(&clock);
        let ledger = MemoryLedger::new();
        let store = WatermarkStore::new(&ledger, "fpl-api", &clock, &log);

        let mut previous = store.get_watermark(DatasetKind::GameweekLive);
        for watermark in recorded {
            store
                .record(DatasetKind::GameweekLive, LoadStrategy::Incremental, 10, Some(watermark))
                .unwrap();
            let read = store.get_watermark(DatasetKind::GameweekLive);
            prop_assert!(read >= previous);
            prop_assert!(read >= watermark);
            previous = read;
        }
    }
}
