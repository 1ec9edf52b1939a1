use crate::infrastructure::error::InfraError;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const COMMAND_LOG_FILE: &str = "commands.log";

/// Routes `tracing` output to `<logs_dir>/commands.log` as JSON lines.
///
/// `RUST_LOG` overrides the default `info` filter. Only the first call in a
/// process installs the subscriber; later calls are no-ops.
pub fn init_logging(logs_dir: &Path) -> Result<(), InfraError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(logs_dir.join(COMMAND_LOG_FILE))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
