use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use color_eyre::eyre::{Result, eyre};

/// One way of fetching the text of a kernel file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    /// Read the file directly.
    File,
    /// Run `cat` on it, for hosts that forbid direct reads from the web user.
    Command,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::File => "file",
            Provider::Command => "command",
        }
    }

    fn read(self, path: &Path) -> Result<String> {
        let text = match self {
            Provider::File => std::fs::read_to_string(path)?,
            Provider::Command => {
                let output = Command::new("cat")
                    .arg(path)
                    .stdin(Stdio::null())
                    .stderr(Stdio::null())
                    .output()?;
                if !output.status.success() {
                    return Err(eyre!("cat exited with {}", output.status));
                }
                String::from_utf8_lossy(&output.stdout).into_owned()
            }
        };
        if text.trim().is_empty() {
            return Err(eyre!("no data"));
        }
        Ok(text)
    }
}

/// A named, fallible way of producing a value.
pub type Attempt<'a, T> = (&'static str, Box<dyn FnOnce() -> Result<T> + 'a>);

pub fn attempt<'a, T>(
    name: &'static str,
    f: impl FnOnce() -> Result<T> + 'a,
) -> Attempt<'a, T> {
    (name, Box::new(f))
}

/// Runs `attempts` in order and returns the first success. Failures are
/// logged at debug level and otherwise discarded.
pub fn first_success<'a, T>(
    what: &str,
    attempts: impl IntoIterator<Item = Attempt<'a, T>>,
) -> Option<T> {
    for (name, run) in attempts {
        match run() {
            Ok(value) => return Some(value),
            Err(err) => tracing::debug!(what, provider = name, error = %err, "provider failed"),
        }
    }
    tracing::info!(what, "no provider succeeded, section unavailable");
    None
}

/// Raw text of the kernel's `/proc` files.
#[derive(Clone, Debug)]
pub struct MetricSource {
    root: PathBuf,
    providers: Vec<Provider>,
}

impl Default for MetricSource {
    fn default() -> Self {
        Self::new("/proc", true)
    }
}

impl MetricSource {
    pub fn new(root: impl Into<PathBuf>, command_fallback: bool) -> Self {
        let mut providers = vec![Provider::File];
        if command_fallback {
            providers.push(Provider::Command);
        }
        Self {
            root: root.into(),
            providers,
        }
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn cpu_info(&self) -> Option<String> {
        self.read("cpuinfo")
    }

    pub fn load_average(&self) -> Option<String> {
        self.read("loadavg")
    }

    /// `/proc/stat`: aggregate tick counters and boot time.
    pub fn stat(&self) -> Option<String> {
        self.read("stat")
    }

    pub fn mem_info(&self) -> Option<String> {
        self.read("meminfo")
    }

    fn read(&self, file: &str) -> Option<String> {
        let path = self.root.join(file);
        first_success(
            file,
            self.providers.iter().map(|&provider| {
                let path = &path;
                attempt(provider.name(), move || provider.read(path))
            }),
        )
    }
}
