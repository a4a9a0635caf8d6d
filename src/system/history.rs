use super::snapshot::Snapshot;

const DEFAULT_CAPACITY: usize = 5;
const DEFAULT_WRITE_INTERVAL_SECS: i64 = 10 * 60;

/// When a snapshot may join the history and how many are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryPolicy {
    pub write_interval_secs: i64,
    pub capacity: usize,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            write_interval_secs: DEFAULT_WRITE_INTERVAL_SECS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Bounded snapshot history, newest first, unique by capture time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapshotHistory {
    entries: Vec<Snapshot>,
    last_write: i64,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(
        snapshots: impl IntoIterator<Item = Snapshot>,
        last_write: i64,
        capacity: usize,
    ) -> Self {
        let mut history = Self {
            entries: snapshots.into_iter().collect(),
            last_write,
        };
        history.normalize(capacity);
        history
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capture time of the snapshot most recently written to storage.
    pub fn last_write(&self) -> i64 {
        self.last_write
    }

    /// A snapshot is accepted once the write interval has elapsed since the
    /// latest entry. A capture time already present never is.
    pub fn accepts(&self, snapshot: &Snapshot, policy: &HistoryPolicy) -> bool {
        match self.latest() {
            Some(latest) => {
                let gap = snapshot.captured_at.saturating_sub(latest.captured_at);
                gap > 0 && gap >= policy.write_interval_secs
            }
            None => true,
        }
    }

    /// Inserts `snapshot` if the write interval has elapsed since the latest
    /// entry. Returns whether it was inserted.
    pub fn insert(&mut self, snapshot: Snapshot, policy: &HistoryPolicy) -> bool {
        if !self.accepts(&snapshot, policy) {
            return false;
        }
        self.last_write = snapshot.captured_at;
        self.entries.push(snapshot);
        self.normalize(policy.capacity);
        true
    }

    /// Union of both histories. On equal capture times the entry from `self`
    /// is kept.
    pub fn merge(mut self, other: SnapshotHistory, capacity: usize) -> Self {
        self.last_write = self.last_write.max(other.last_write);
        self.entries.extend(other.entries);
        self.normalize(capacity);
        self
    }

    fn normalize(&mut self, capacity: usize) {
        // stable sort keeps the first of two equal keys ahead for dedup
        self.entries.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        self.entries.dedup_by_key(|s| s.captured_at);
        self.entries.truncate(capacity);
    }
}

impl<'a> IntoIterator for &'a SnapshotHistory {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
