//! CPU utilization over the window between two cumulative tick readings.

use serde::{Deserialize, Serialize};

use super::snapshot::Snapshot;

/// Utilization percentages derived from two snapshots.
///
/// Values are not clamped: tick granularity and steal accounting can push a
/// figure slightly below 0 or above 100.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWindow {
    pub timespan_seconds: i64,
    pub busy_percent: f64,
    pub idle_percent: f64,
    pub io_wait_percent: f64,
    pub steal_percent: f64,
}

/// Returns `None` when either snapshot lacks a counter or when the total tick
/// delta is not positive (reboot between snapshots, reference newer than
/// `current`, or no elapsed ticks).
pub fn compute(current: &Snapshot, reference: &Snapshot) -> Option<RateWindow> {
    let now = current.complete_ticks()?;
    let then = reference.complete_ticks()?;

    let delta = |a: u128, b: u128| a as i128 - b as i128;
    let idle_delta = delta(now.idle.into(), then.idle.into());
    let busy_delta = delta(now.busy(), then.busy());
    let io_wait_delta = delta(now.io_wait.into(), then.io_wait.into());
    let steal_delta = delta(now.steal.into(), then.steal.into());

    let total_delta = idle_delta + busy_delta;
    if total_delta <= 0 {
        tracing::debug!(
            current = current.captured_at,
            reference = reference.captured_at,
            %total_delta,
            "degenerate rate window"
        );
        return None;
    }

    let total = total_delta as f64;
    let share = |d: i128| 100.0 * d as f64 / total;
    let idle_percent = share(idle_delta);

    Some(RateWindow {
        timespan_seconds: current.captured_at.saturating_sub(reference.captured_at),
        busy_percent: 100.0 - idle_percent,
        idle_percent,
        io_wait_percent: share(io_wait_delta),
        steal_percent: share(steal_delta),
    })
}
