use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::config::Config;
use crate::system::collector::Collector;
use crate::system::rate::{self, RateWindow};
use crate::system::selector::{self, SelectionWindow};
use crate::system::snapshot::Snapshot;
use crate::system::source::MetricSource;
use crate::system::store::{SnapshotStore, WriteStatus};

/// Everything one report needs, threaded explicitly through the pipeline.
pub struct ReportContext {
    pub collector: Collector,
    pub store: SnapshotStore,
    pub window: SelectionWindow,
    /// When false the history is read for the rate but never written.
    pub persist: bool,
}

impl ReportContext {
    pub fn from_config(config: &Config) -> Self {
        let source = MetricSource::new(&config.source.proc_root, config.source.command_fallback);
        ReportContext {
            collector: Collector::new(source, config.source.system_fallback),
            store: SnapshotStore::new(
                config.snapshots.resolved_path(),
                config.snapshots.policy(),
            ),
            window: config.snapshots.window(),
            persist: config.snapshots.persist,
        }
    }
}

/// The current snapshot plus everything derived from it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub uptime_seconds: Option<i64>,
    pub rate_window: Option<RateWindow>,
    pub processing_time_seconds: f64,
    #[serde(skip)]
    pub write_status: Option<WriteStatus>,
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

impl Report {
    /// Collects the current snapshot, derives the rate against the stored
    /// history and records the snapshot when due. Never fails: every missing
    /// piece shows up as an absent field.
    pub fn build(ctx: &ReportContext, now: i64) -> Report {
        let started = Instant::now();
        let _build_span = tracing::debug_span!("report.build", now).entered();

        let snapshot = ctx.collector.collect(now);
        let history = ctx.store.load();

        // chosen before the append so the current snapshot is never its own reference
        let rate_window = selector::select(&history, now, &ctx.window).and_then(|reference| {
            tracing::debug!(reference = reference.captured_at, "reference snapshot selected");
            rate::compute(&snapshot, reference)
        });

        let write_status = ctx.persist.then(|| {
            ctx.store
                .maybe_append(history, snapshot.clone())
                .status
        });

        let uptime_seconds = snapshot
            .boot_time
            .filter(|&boot| boot > 0)
            .map(|boot| now.saturating_sub(boot));

        Report {
            snapshot,
            uptime_seconds,
            rate_window,
            processing_time_seconds: started.elapsed().as_secs_f64(),
            write_status,
        }
    }
}
