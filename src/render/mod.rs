pub mod html;
pub mod json;

use crate::report::Report;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Html => "text/html; charset=utf-8",
            OutputFormat::Json => "application/json; charset=utf-8",
        }
    }

    /// A CGI query string asks for JSON when it carries a `json` key,
    /// with or without a value (`?json`, `?json=1`).
    pub fn from_query(query: &str) -> Self {
        let wants_json = query
            .split('&')
            .any(|pair| pair.split('=').next() == Some("json"));
        if wants_json {
            OutputFormat::Json
        } else {
            OutputFormat::Html
        }
    }
}

pub fn render(report: &Report, format: OutputFormat) -> color_eyre::Result<String> {
    match format {
        OutputFormat::Html => Ok(html::render(report)),
        OutputFormat::Json => json::render(report),
    }
}
