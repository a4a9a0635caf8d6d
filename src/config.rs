use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::system::history::HistoryPolicy;
use crate::system::selector::SelectionWindow;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub snapshots: SnapshotsConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SnapshotsConfig {
    /// History file; `None` means the per-user cache directory.
    pub path: Option<PathBuf>,
    pub persist: bool,
    pub write_interval_secs: i64,
    pub min_window_secs: i64,
    pub max_window_secs: i64,
    pub history_cap: usize,
}

impl Default for SnapshotsConfig {
    fn default() -> Self {
        let policy = HistoryPolicy::default();
        let window = SelectionWindow::default();
        SnapshotsConfig {
            path: None,
            persist: true,
            write_interval_secs: policy.write_interval_secs,
            min_window_secs: window.min_secs,
            max_window_secs: window.max_secs,
            history_cap: policy.capacity,
        }
    }
}

impl SnapshotsConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_snapshot_path)
    }

    pub fn policy(&self) -> HistoryPolicy {
        HistoryPolicy {
            write_interval_secs: self.write_interval_secs.max(0),
            capacity: self.history_cap.max(1),
        }
    }

    pub fn window(&self) -> SelectionWindow {
        SelectionWindow {
            min_secs: self.min_window_secs,
            max_secs: self.max_window_secs.max(self.min_window_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub proc_root: PathBuf,
    pub command_fallback: bool,
    pub system_fallback: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            proc_root: PathBuf::from("/proc"),
            command_fallback: true,
            system_fallback: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
            format: "text".to_string(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sharedinfo").join("config.toml"))
}

pub fn default_snapshot_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sharedinfo")
        .join("snapshots.json")
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}
