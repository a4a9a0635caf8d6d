use color_eyre::Result;

use crate::report::Report;

pub fn render(report: &Report) -> Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}
