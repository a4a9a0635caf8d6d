use color_eyre::eyre::{Result, eyre};
use sysinfo::System;

use super::parse;
use super::snapshot::{LoadAverage, MemoryInfo, Snapshot};
use super::source::{Attempt, MetricSource, attempt, first_success};

/// Builds the current [`Snapshot`] from the kernel text files, falling back to
/// `sysinfo` for the sections it can report.
pub struct Collector {
    source: MetricSource,
    system_fallback: bool,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(MetricSource::default(), true)
    }
}

impl Collector {
    pub fn new(source: MetricSource, system_fallback: bool) -> Self {
        Collector {
            source,
            system_fallback,
        }
    }

    pub fn collect(&self, now: i64) -> Snapshot {
        let _collect_span = tracing::debug_span!("collector.collect").entered();

        let stat = self.source.stat();
        let cpu = stat.as_deref().and_then(parse::cpu_ticks);
        if cpu.is_some_and(|ticks| ticks.complete().is_none()) {
            tracing::warn!("cpu tick counters are incomplete, no utilization rate can be derived");
        }

        let cpu_identity = self
            .source
            .cpu_info()
            .as_deref()
            .and_then(parse::cpu_identity);

        let load_average = self.first_available(
            "load average",
            |source| {
                let text = source.load_average().ok_or_else(|| eyre!("unreadable"))?;
                parse::load_average(&text).ok_or_else(|| eyre!("unparsable"))
            },
            system_load_average,
        );

        let memory = self.first_available(
            "memory",
            |source| {
                let text = source.mem_info().ok_or_else(|| eyre!("unreadable"))?;
                parse::memory(&text).ok_or_else(|| eyre!("unparsable"))
            },
            system_memory,
        );

        let boot_time = self.first_available(
            "boot time",
            |_| {
                stat.as_deref()
                    .and_then(parse::boot_time)
                    .ok_or_else(|| eyre!("no btime line"))
            },
            system_boot_time,
        );

        Snapshot {
            captured_at: now,
            cpu,
            memory,
            cpu_identity,
            load_average,
            boot_time,
        }
    }

    fn first_available<'a, T: 'a>(
        &'a self,
        what: &str,
        from_text: impl FnOnce(&MetricSource) -> Result<T> + 'a,
        from_system: fn() -> Result<T>,
    ) -> Option<T> {
        let mut attempts: Vec<Attempt<'a, T>> =
            vec![attempt("procfs", move || from_text(&self.source))];
        if self.system_fallback {
            attempts.push(attempt("sysinfo", from_system));
        }
        first_success(what, attempts)
    }
}

fn system_load_average() -> Result<LoadAverage> {
    let load = System::load_average();
    Ok(LoadAverage {
        one_minute: load.one,
        five_minutes: load.five,
        fifteen_minutes: load.fifteen,
        runnable_entities: None,
        total_entities: None,
    })
}

fn system_memory() -> Result<MemoryInfo> {
    let mut sys = System::new();
    sys.refresh_memory();
    if sys.total_memory() == 0 {
        return Err(eyre!("sysinfo reports no memory"));
    }
    Ok(MemoryInfo {
        total_kb: Some(sys.total_memory() / 1024),
        free_kb: Some(sys.free_memory() / 1024),
        available_kb: Some(sys.available_memory() / 1024),
        ..MemoryInfo::default()
    })
}

fn system_boot_time() -> Result<i64> {
    match System::boot_time() {
        0 => Err(eyre!("sysinfo reports no boot time")),
        secs => Ok(i64::try_from(secs)?),
    }
}
