use std::fmt::Write;

use chrono::{Local, TimeZone};

use crate::format::{
    escape_html, format_mbytes, format_number, format_percent, format_timestamp_in,
};
use crate::report::Report;

/// Human-readable `(label, value)` rows, boot time shown in `tz`. A row is
/// left out when any input it needs is missing.
pub fn properties_in<Tz>(report: &Report, tz: &Tz) -> Vec<(String, String)>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let snapshot = &report.snapshot;
    let mut rows: Vec<(String, String)> = Vec::new();
    let mut push = |label: &str, value: String| rows.push((label.to_string(), value));

    if let Some(boot) = snapshot.boot_time.and_then(|b| format_timestamp_in(b, tz)) {
        push("Bootup Time", boot);
    }

    let cores = snapshot.cpu_identity.as_ref().and_then(|id| id.core_count);
    if let Some(cores) = cores {
        if let Some(mhz) = snapshot.cpu_identity.as_ref().and_then(|id| id.core_mhz) {
            push("CPU Clock", format!("{mhz} MHz"));
        }
        push("CPU Core Count", cores.to_string());
    }

    if let Some(load) = &snapshot.load_average {
        push(
            "Load Average",
            format!(
                "{} (1m); {} (5m); {} (15m)",
                load.one_minute, load.five_minutes, load.fifteen_minutes
            ),
        );
        if let Some(cores) = cores.filter(|&c| c > 0) {
            let usage = 100.0 / f64::from(cores) * load.five_minutes;
            push("System usage (5 minutes load average)", format_percent(usage));
        }
    }

    if let Some(rate) = &report.rate_window {
        push(
            &format!("System Usage ({} seconds average)", rate.timespan_seconds),
            format!(
                "{} busy, {} idle, {} iowait, {} steal",
                format_percent(rate.busy_percent),
                format_percent(rate.idle_percent),
                format_percent(rate.io_wait_percent),
                format_percent(rate.steal_percent)
            ),
        );
    }

    if let Some(memory) = &snapshot.memory
        && let Some(total) = memory.total_kb
    {
        push("Total Memory", format_mbytes(total));
        if let Some(available) = memory.available_kb {
            push("Available Memory", format_mbytes(available));
            let used = (total as f64 - available as f64) / 1024.0;
            push("Used Memory", format!("{} MByte", format_number(used)));
        }
        if let Some(committed) = memory.committed_kb {
            push("Committed Memory", format_mbytes(committed));
        }
    }

    rows
}

pub fn properties(report: &Report) -> Vec<(String, String)> {
    properties_in(report, &Local)
}

pub fn render(report: &Report) -> String {
    render_rows(&properties(report))
}

pub fn render_rows(rows: &[(String, String)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, r#"<html lang="en">"#);
    let _ = writeln!(out, "  <head>");
    let _ = writeln!(out, r#"    <meta charset="utf-8">"#);
    let _ = writeln!(
        out,
        r#"    <meta name="viewport" content="width=device-width, initial-scale=1.0">"#
    );
    let _ = writeln!(out, "    <title>System information</title>");
    let _ = writeln!(
        out,
        "    <style>body {{ font-size: 14px; }} dt {{ font-weight: bold; }}</style>"
    );
    let _ = writeln!(out, "  </head>");
    let _ = writeln!(out, "  <body>");
    let _ = writeln!(out, "    <dl>");
    for (label, value) in rows {
        let _ = writeln!(out, "      <dt>{}:</dt>", escape_html(label));
        let _ = writeln!(out, "      <dd>{}</dd>", escape_html(value));
    }
    let _ = writeln!(out, "    </dl>");
    let _ = writeln!(out, "    <hr>");
    let _ = writeln!(out, r#"    <a href="?json">Show raw JSON (more details)</a>"#);
    let _ = writeln!(out, "  </body>");
    let _ = writeln!(out, "</html>");
    out
}
