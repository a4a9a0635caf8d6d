//! On-disk snapshot history.
//!
//! The file is a cache, not a source of truth: anything unreadable is treated
//! as an empty history. Concurrent invocations are serialized by an exclusive
//! lock on a sibling `.lock` file held across reload, decide and write, and the
//! write itself replaces the file atomically so plain readers never see a
//! partial document.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use super::history::{HistoryPolicy, SnapshotHistory};
use super::snapshot::Snapshot;

/// Last second of year 9999; later capture times are treated as corrupt.
const MAX_CAPTURED_AT: i64 = 253_402_300_799;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HistoryDocument {
    last_write_timestamp: i64,
    snapshots: BTreeMap<i64, Snapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteStatus {
    /// The write interval has not elapsed; storage was not touched.
    Skipped,
    Written,
    /// The snapshot is in the returned history but could not be persisted.
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct AppendOutcome {
    pub history: SnapshotHistory,
    pub status: WriteStatus,
}

pub struct SnapshotStore {
    path: PathBuf,
    policy: HistoryPolicy,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>, policy: HistoryPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> SnapshotHistory {
        match self.read() {
            Ok(history) => history,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "ignoring unreadable snapshot history"
                );
                SnapshotHistory::new()
            }
        }
    }

    fn read(&self) -> Result<SnapshotHistory> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no snapshot history yet");
                return Ok(SnapshotHistory::new());
            }
            Err(err) => return Err(err.into()),
        };
        let document: HistoryDocument =
            serde_json::from_str(&contents).wrap_err("malformed snapshot history")?;
        let stored = document.snapshots.len();
        let snapshots: Vec<Snapshot> = document
            .snapshots
            .into_iter()
            .filter(|(captured_at, _)| plausible_capture_time(*captured_at))
            .map(|(captured_at, snapshot)| Snapshot {
                captured_at,
                ..snapshot
            })
            .collect();
        if snapshots.len() < stored {
            tracing::warn!(
                path = %self.path.display(),
                dropped = stored - snapshots.len(),
                "ignoring snapshots with implausible capture times"
            );
        }
        let last_write = Some(document.last_write_timestamp)
            .filter(|&t| plausible_capture_time(t))
            .unwrap_or_default();
        Ok(SnapshotHistory::from_snapshots(
            snapshots,
            last_write,
            self.policy.capacity,
        ))
    }

    /// Adds `snapshot` when the write interval has elapsed since the newest
    /// entry of `history`, then persists the result. A skipped append leaves
    /// storage untouched; a failed write still returns the updated history.
    pub fn maybe_append(&self, history: SnapshotHistory, snapshot: Snapshot) -> AppendOutcome {
        if !history.accepts(&snapshot, &self.policy) {
            return AppendOutcome {
                history,
                status: WriteStatus::Skipped,
            };
        }

        match self.append_locked(&history, snapshot.clone()) {
            Ok(outcome) => outcome,
            Err(err) => {
                let message = format!("{err:#}");
                tracing::warn!(
                    path = %self.path.display(),
                    error = %message,
                    "failed to persist snapshot history"
                );
                let mut history = history;
                history.insert(snapshot, &self.policy);
                AppendOutcome {
                    history,
                    status: WriteStatus::Failed(message),
                }
            }
        }
    }

    fn append_locked(
        &self,
        history: &SnapshotHistory,
        snapshot: Snapshot,
    ) -> Result<AppendOutcome> {
        ensure_parent_dir(&self.path)?;
        let _lock = StoreLock::acquire(&self.lock_path())?;

        // another invocation may have written since `history` was loaded
        let mut merged = history.clone().merge(self.load(), self.policy.capacity);
        if !merged.insert(snapshot, &self.policy) {
            tracing::debug!("snapshot for this interval already stored by another writer");
            return Ok(AppendOutcome {
                history: merged,
                status: WriteStatus::Skipped,
            });
        }

        self.write(&merged)?;
        tracing::info!(
            path = %self.path.display(),
            entries = merged.len(),
            "snapshot history written"
        );
        Ok(AppendOutcome {
            history: merged,
            status: WriteStatus::Written,
        })
    }

    fn write(&self, history: &SnapshotHistory) -> Result<()> {
        let document = HistoryDocument {
            last_write_timestamp: history.last_write(),
            snapshots: history
                .iter()
                .map(|s| (s.captured_at, s.clone()))
                .collect(),
        };
        let json = serde_json::to_string(&document)?;

        let tmp_path = self.path.with_extension("tmp");
        let mut file = File::create(&tmp_path)
            .wrap_err_with(|| format!("creating {}", tmp_path.display()))?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)
            .wrap_err_with(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }
}

/// Exclusive advisory lock, released when dropped.
struct StoreLock {
    file: File,
}

impl StoreLock {
    fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .wrap_err_with(|| format!("opening lock file {}", path.display()))?;
        file.lock()
            .wrap_err_with(|| format!("locking {}", path.display()))?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn plausible_capture_time(captured_at: i64) -> bool {
    (1..=MAX_CAPTURED_AT).contains(&captured_at)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::selector::{SelectionWindow, select};
    use crate::system::snapshot::CpuTicks;

    fn store_in(dir: &tempfile::TempDir) -> SnapshotStore {
        SnapshotStore::new(dir.path().join("snapshots.json"), HistoryPolicy::default())
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().is_empty());
    }

    #[test]
    fn malformed_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());

        fs::write(store.path(), r#"{"snapshots": [1, 2, 3]}"#).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn implausible_capture_times_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{"lastWriteTimestamp":-1,"snapshots":{
                "-9223372036854775808":{},
                "0":{},
                "9223372036854775807":{},
                "1000":{}
            }}"#,
        )
        .unwrap();

        let history = store.load();
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().captured_at, 1000);
        assert_eq!(history.last_write(), 0);
    }

    #[test]
    fn extreme_capture_time_on_disk_does_not_block_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{"lastWriteTimestamp":0,"snapshots":{"-9223372036854775808":{}}}"#,
        )
        .unwrap();

        let history = store.load();
        assert!(history.is_empty());
        assert!(select(&history, 1_700_000_000, &SelectionWindow::default()).is_none());

        let outcome = store.maybe_append(history, Snapshot::at(1_700_000_000));
        assert_eq!(outcome.status, WriteStatus::Written);
        assert_eq!(store.load().latest().unwrap().captured_at, 1_700_000_000);
    }

    #[test]
    fn repeated_capture_time_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(
            dir.path().join("snapshots.json"),
            HistoryPolicy {
                write_interval_secs: 0,
                capacity: 5,
            },
        );
        let first = store.maybe_append(SnapshotHistory::new(), Snapshot::at(1000));
        assert_eq!(first.status, WriteStatus::Written);

        let second = store.maybe_append(first.history, Snapshot::at(1000));
        assert_eq!(second.status, WriteStatus::Skipped);
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn append_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let snapshot = Snapshot::at(1000).with_cpu(CpuTicks {
            idle: Some(5),
            ..CpuTicks::default()
        });

        let outcome = store.maybe_append(store.load(), snapshot.clone());
        assert_eq!(outcome.status, WriteStatus::Written);
        assert_eq!(outcome.history.len(), 1);

        let reloaded = store.load();
        assert_eq!(reloaded.latest(), Some(&snapshot));
        assert_eq!(reloaded.last_write(), 1000);
        assert!(!dir.path().join("snapshots.tmp").exists());
    }

    #[test]
    fn document_is_keyed_by_capture_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.maybe_append(SnapshotHistory::new(), Snapshot::at(1000));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["lastWriteTimestamp"], 1000);
        assert_eq!(raw["snapshots"]["1000"]["capturedAt"], 1000);
    }

    #[test]
    fn throttled_append_does_not_touch_storage() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let first = store.maybe_append(SnapshotHistory::new(), Snapshot::at(1000));
        fs::remove_file(store.path()).unwrap();

        let second = store.maybe_append(first.history, Snapshot::at(1300));
        assert_eq!(second.status, WriteStatus::Skipped);
        assert_eq!(second.history.len(), 1);
        assert!(!store.path().exists());
    }

    #[test]
    fn stale_writer_sees_concurrent_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let stale = store.load();

        let first = store.maybe_append(stale.clone(), Snapshot::at(1000));
        assert_eq!(first.status, WriteStatus::Written);

        // second writer loaded before the first wrote
        let second = store.maybe_append(stale, Snapshot::at(1001));
        assert_eq!(second.status, WriteStatus::Skipped);
        assert_eq!(second.history.latest().unwrap().captured_at, 1000);
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn write_failure_keeps_snapshot_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        // parent "directory" is a regular file
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = SnapshotStore::new(blocker.join("snapshots.json"), HistoryPolicy::default());

        let outcome = store.maybe_append(SnapshotHistory::new(), Snapshot::at(1000));
        assert!(matches!(outcome.status, WriteStatus::Failed(_)));
        assert_eq!(outcome.history.latest().unwrap().captured_at, 1000);
    }

    #[test]
    fn concurrent_writers_store_one_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = SnapshotStore::new(path, HistoryPolicy::default());
                    store.maybe_append(store.load(), Snapshot::at(1000 + i)).status
                })
            })
            .collect();
        let written = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|status| *status == WriteStatus::Written)
            .count();

        assert_eq!(written, 1);
        let store = SnapshotStore::new(path, HistoryPolicy::default());
        assert_eq!(store.load().len(), 1);
    }
}
