use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use sharedinfo::config::{self, load_config, load_config_from_path};
use sharedinfo::logging;
use sharedinfo::render::{self, OutputFormat};
use sharedinfo::report::{Report, ReportContext, unix_now};

#[derive(Parser)]
#[command(
    name = "sharedinfo",
    about = "Host CPU, memory, load and uptime report as HTML or JSON"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print JSON instead of HTML
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Snapshot history file
    #[arg(long)]
    snapshot_file: Option<PathBuf>,

    /// Root of the proc filesystem
    #[arg(long)]
    proc_root: Option<PathBuf>,

    /// Read the snapshot history but never write to it
    #[arg(long, default_value_t = false)]
    no_persist: bool,

    /// Emit a CGI header block even outside a CGI environment
    #[arg(long, default_value_t = false)]
    cgi: bool,

    /// Log level or filter directive, e.g. `debug` (RUST_LOG wins)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let in_cgi = std::env::var_os("GATEWAY_INTERFACE").is_some();
    // web servers pass an `=`-less query string (`?json`) as argv, so CGI
    // invocations take no flags
    let cli = if in_cgi {
        Cli::parse_from(std::env::args_os().take(1))
    } else {
        Cli::parse()
    };
    let config = load_config_for_cli(&cli);
    logging::init(&config.logging)?;

    let format = if in_cgi {
        OutputFormat::from_query(&std::env::var("QUERY_STRING").unwrap_or_default())
    } else if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Html
    };

    let ctx = ReportContext::from_config(&config);
    let report = Report::build(&ctx, unix_now());
    tracing::debug!(
        seconds = report.processing_time_seconds,
        write_status = ?report.write_status,
        "report built"
    );
    let body = render::render(&report, format)?;

    let mut stdout = std::io::stdout().lock();
    if in_cgi || cli.cgi {
        write!(stdout, "Content-Type: {}\r\n\r\n", format.content_type())?;
    }
    stdout.write_all(body.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ref path) = cli.snapshot_file {
        config.snapshots.path = Some(path.clone());
    }
    if let Some(ref root) = cli.proc_root {
        config.source.proc_root = root.clone();
    }
    if cli.no_persist {
        config.snapshots.persist = false;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    config
}
