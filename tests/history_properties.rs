use proptest::prelude::*;
use sharedinfo::system::history::{HistoryPolicy, SnapshotHistory};
use sharedinfo::system::rate::compute;
use sharedinfo::system::selector::{SelectionWindow, select};
use sharedinfo::system::snapshot::{CompleteTicks, Snapshot};

fn ticks_strategy() -> impl Strategy<Value = CompleteTicks> {
    prop::array::uniform10(0u64..10_000_000).prop_map(|t| CompleteTicks {
        user: t[0],
        nice: t[1],
        system: t[2],
        idle: t[3],
        io_wait: t[4],
        irq: t[5],
        soft_irq: t[6],
        steal: t[7],
        guest: t[8],
        guest_nice: t[9],
    })
}

fn history_of(times: &[i64]) -> SnapshotHistory {
    SnapshotHistory::from_snapshots(times.iter().copied().map(Snapshot::at), 0, 5)
}

proptest! {
    #[test]
    fn busy_and_idle_sum_to_hundred(
        reference in ticks_strategy(),
        growth in ticks_strategy(),
    ) {
        let current = CompleteTicks {
            user: reference.user + growth.user,
            nice: reference.nice + growth.nice,
            system: reference.system + growth.system,
            idle: reference.idle + growth.idle,
            io_wait: reference.io_wait + growth.io_wait,
            irq: reference.irq + growth.irq,
            soft_irq: reference.soft_irq + growth.soft_irq,
            steal: reference.steal + growth.steal,
            guest: reference.guest + growth.guest,
            guest_nice: reference.guest_nice + growth.guest_nice,
        };
        let a = Snapshot::at(2000).with_cpu(current.into());
        let b = Snapshot::at(1400).with_cpu(reference.into());

        match compute(&a, &b) {
            Some(rate) => {
                prop_assert!(
                    (rate.busy_percent + rate.idle_percent - 100.0).abs() < 1e-9,
                    "busy {} + idle {} != 100", rate.busy_percent, rate.idle_percent
                );
                prop_assert!(rate.idle_percent >= 0.0 && rate.busy_percent <= 100.0);
                prop_assert_eq!(rate.timespan_seconds, 600);
            }
            // only when nothing moved at all
            None => prop_assert_eq!(current, reference),
        }
    }

    #[test]
    fn counter_regression_never_yields_rate(
        current in ticks_strategy(),
        drop in 1u64..1_000_000,
    ) {
        let mut reference = current;
        reference.idle += drop;
        let a = Snapshot::at(2000).with_cpu(current.into());
        let b = Snapshot::at(1400).with_cpu(reference.into());
        prop_assert!(compute(&a, &b).is_none());
    }

    #[test]
    fn in_window_snapshot_beats_closer_ones(
        others in prop::collection::vec(
            prop_oneof![0i64..600, 1801i64..100_000],
            0..4,
        ),
    ) {
        let now = 200_000;
        let mut times: Vec<i64> = others.iter().map(|age| now - age).collect();
        times.push(now - 900);
        let history = history_of(&times);

        let chosen = select(&history, now, &SelectionWindow::default()).unwrap();
        prop_assert_eq!(chosen.captured_at, now - 900);
    }

    #[test]
    fn without_window_match_most_recent_wins(
        ages in prop::collection::vec(
            prop_oneof![0i64..600, 1801i64..100_000],
            1..6,
        ),
    ) {
        let now = 200_000;
        let times: Vec<i64> = ages.iter().map(|age| now - age).collect();
        let history = history_of(&times);

        let chosen = select(&history, now, &SelectionWindow::default()).unwrap();
        prop_assert_eq!(Some(chosen.captured_at), times.iter().copied().max());
    }

    #[test]
    fn history_stays_bounded_and_strictly_descending(
        steps in prop::collection::vec(0i64..2_000, 0..40),
    ) {
        let policy = HistoryPolicy::default();
        let mut history = SnapshotHistory::new();
        let mut now = 0;
        for step in steps {
            now += step;
            history.insert(Snapshot::at(now), &policy);

            prop_assert!(history.len() <= policy.capacity);
            let times: Vec<i64> = history.iter().map(|s| s.captured_at).collect();
            prop_assert!(times.windows(2).all(|w| w[0] > w[1]), "not descending: {:?}", times);
        }
    }

    #[test]
    fn appends_within_interval_add_one_entry(
        start in 0i64..1_000_000,
        gap in 0i64..600,
    ) {
        let policy = HistoryPolicy::default();
        let mut history = SnapshotHistory::new();
        prop_assert!(history.insert(Snapshot::at(start), &policy));
        prop_assert!(!history.insert(Snapshot::at(start + gap), &policy));
        prop_assert_eq!(history.len(), 1);
    }
}
