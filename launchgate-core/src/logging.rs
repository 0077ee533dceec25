use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;

use crate::errors::{LaunchGateError, Result};

/// Stream the subscriber writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    /// Keeps stdout free for command output.
    Stderr,
}

/// Installs the global subscriber on stdout. `RUST_LOG` overrides `level`.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
    init_tracing_to(level, LogOutput::Stdout)
}

pub fn init_tracing_to(level: Option<&str>, output: LogOutput) -> Result<()> {
    let default_level = level.unwrap_or("info");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = fmt().with_env_filter(filter).with_target(true);

    let installed = match output {
        LogOutput::Stdout => builder
            .with_ansi(atty::is(atty::Stream::Stdout))
            .try_init(),
        LogOutput::Stderr => builder
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
            .try_init(),
    };

    installed.map_err(|err| {
        LaunchGateError::GeneralError(format!("failed to install tracing subscriber: {err}"))
    })
}
