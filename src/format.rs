use chrono::{DateTime, TimeZone};

/// Fixed two-decimal rendering with `,` thousands separators: `12345.678`
/// becomes `12,345.68`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // -0.001 rounds to "0.00", which should not carry a sign
    let sign = if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

pub fn format_mbytes(kbytes: u64) -> String {
    format!("{} MByte", format_number(kbytes as f64 / 1024.0))
}

pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(value))
}

/// `YYYY-MM-DD HH:MM` in the given zone.
pub fn format_timestamp_in<Tz>(secs: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let utc = DateTime::from_timestamp(secs, 0)?;
    Some(utc.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
