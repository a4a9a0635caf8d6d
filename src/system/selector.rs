use super::history::SnapshotHistory;
use super::snapshot::Snapshot;

const DEFAULT_MIN_WINDOW_SECS: i64 = 10 * 60;
const DEFAULT_MAX_WINDOW_SECS: i64 = 30 * 60;

/// Acceptable age range of a reference snapshot, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionWindow {
    pub min_secs: i64,
    pub max_secs: i64,
}

impl Default for SelectionWindow {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_MIN_WINDOW_SECS,
            max_secs: DEFAULT_MAX_WINDOW_SECS,
        }
    }
}

impl SelectionWindow {
    pub fn contains_age(&self, age: i64) -> bool {
        (self.min_secs..=self.max_secs).contains(&age)
    }
}

/// Picks the reference snapshot for a rate at `now`: the most recent entry
/// whose age falls inside `window`, else the most recent entry of any age.
pub fn select<'a>(
    history: &'a SnapshotHistory,
    now: i64,
    window: &SelectionWindow,
) -> Option<&'a Snapshot> {
    history
        .iter()
        .find(|s| window.contains_age(now.saturating_sub(s.captured_at)))
        .or_else(|| history.latest())
}
