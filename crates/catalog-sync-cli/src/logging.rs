use anyhow::Result;
use std::io::{self, IsTerminal};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// `-q` shows errors only; `-v` is debug without HTTP connection noise; `-vv` is everything.
/// `RUST_LOG` wins unless quiet.
fn filter(verbose_level: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    let default = match verbose_level {
        0 => "info",
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn,reqwest=info",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn json_enabled() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal())
}

pub fn init_logging(verbose_level: u8, quiet: bool) -> Result<()> {
    let registry = Registry::default().with(filter(verbose_level, quiet));
    let layer = fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr);
    if json_enabled() {
        registry.with(layer.json()).try_init()?;
    } else {
        registry.with(layer).try_init()?;
    }
    Ok(())
}

/// Daemon logging: a daily-rotated file next to `log_file`, e.g. `catalogsync.2024-06-01`.
pub fn init_file_logging(verbose_level: u8, quiet: bool, log_file: &Path) -> Result<()> {
    let log_dir = log_file
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;
    let prefix = log_file
        .file_stem()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename: {}", log_file.display()))?;

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, prefix);
    let registry = Registry::default().with(filter(verbose_level, quiet));
    let layer = fmt::layer()
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false)
        .with_writer(appender);
    if json_enabled() {
        registry.with(layer.json()).try_init()?;
    } else {
        registry.with(layer).try_init()?;
    }
    Ok(())
}
