//! Extract typed fields from the text of `/proc` files.
//!
//! Every function is pure and returns `None` when the text holds nothing
//! usable, so a garbled file degrades to an absent section.

use super::snapshot::{CpuIdentity, CpuTicks, LoadAverage, MemoryInfo};

/// Value of the first `key : value` line in `/proc/cpuinfo`.
fn cpuinfo_field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        (name.trim_end() == key).then(|| value.trim())
    })
}

fn word_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

pub fn cpu_identity(text: &str) -> Option<CpuIdentity> {
    let non_empty = |key| cpuinfo_field(text, key).filter(|v| !v.is_empty());
    let identity = CpuIdentity {
        vendor: non_empty("vendor_id").map(str::to_string),
        model: non_empty("model name").map(str::to_string),
        microcode_version: non_empty("microcode").map(str::to_string),
        bugs: cpuinfo_field(text, "bugs").map(word_list),
        core_count: cpuinfo_field(text, "cpu cores").and_then(|v| v.parse().ok()),
        core_mhz: cpuinfo_field(text, "cpu MHz").and_then(|v| v.parse().ok()),
        flags: cpuinfo_field(text, "flags").map(word_list),
    };
    (!identity.is_empty()).then_some(identity)
}

/// Parse `/proc/loadavg`, e.g. `0.45 0.52 0.48 2/512 12345`.
pub fn load_average(text: &str) -> Option<LoadAverage> {
    let mut parts = text.split_whitespace();
    let one_minute = parts.next()?.parse().ok()?;
    let five_minutes = parts.next()?.parse().ok()?;
    let fifteen_minutes = parts.next()?.parse().ok()?;
    let (runnable_entities, total_entities) = match parts.next().and_then(|p| p.split_once('/'))
    {
        Some((runnable, total)) => (runnable.parse().ok(), total.parse().ok()),
        None => (None, None),
    };
    Some(LoadAverage {
        one_minute,
        five_minutes,
        fifteen_minutes,
        runnable_entities,
        total_entities,
    })
}

/// Aggregate `cpu ` line of `/proc/stat`. Columns are positional; a column the
/// kernel does not print stays `None`.
pub fn cpu_ticks(text: &str) -> Option<CpuTicks> {
    let line = text.lines().find(|line| line.starts_with("cpu "))?;
    let mut columns = line.split_whitespace().skip(1).map(|c| c.parse::<u64>().ok());
    let mut next = || columns.next().flatten();
    let ticks = CpuTicks {
        user: next(),
        nice: next(),
        system: next(),
        idle: next(),
        io_wait: next(),
        irq: next(),
        soft_irq: next(),
        steal: next(),
        guest: next(),
        guest_nice: next(),
    };
    (ticks != CpuTicks::default()).then_some(ticks)
}

/// `btime` line of `/proc/stat`: boot time in seconds since the epoch.
pub fn boot_time(text: &str) -> Option<i64> {
    text.lines()
        .find_map(|line| line.strip_prefix("btime"))
        .and_then(|v| v.trim().parse().ok())
}

fn meminfo_kb(text: &str, key: &str) -> Option<u64> {
    text.lines().find_map(|line| {
        let value = line.strip_prefix(key)?.strip_prefix(':')?;
        value.trim().strip_suffix("kB")?.trim().parse().ok()
    })
}

pub fn memory(text: &str) -> Option<MemoryInfo> {
    let info = MemoryInfo {
        total_kb: meminfo_kb(text, "MemTotal"),
        free_kb: meminfo_kb(text, "MemFree"),
        available_kb: meminfo_kb(text, "MemAvailable"),
        buffers_kb: meminfo_kb(text, "Buffers"),
        cached_kb: meminfo_kb(text, "Cached"),
        committed_kb: meminfo_kb(text, "Committed_AS"),
    };
    (!info.is_empty()).then_some(info)
}
