//! Diagnostic logging setup.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to binaries. [`init`] installs a `FmtSubscriber` writing to the target
//! selected on the command line. `RUST_LOG`, when set, overrides the level.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    /// Append to a file, without ANSI colours.
    File(PathBuf),
}

impl LogTarget {
    /// `0`/`off`, `1`/`stdout`, `2`/`stderr`, anything else is a filename.
    pub fn parse(value: &str) -> Self {
        match value {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            path => LogTarget::File(PathBuf::from(path)),
        }
    }
}

#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("failed to open log file {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber. `verbose` raises the level to DEBUG.
pub fn init(target: &LogTarget, verbose: bool) -> Result<(), LogInitError> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    match target {
        LogTarget::Off => Ok(()),
        LogTarget::Stdout => install(std::io::stdout, level, true),
        LogTarget::Stderr => install(std::io::stderr, level, true),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LogInitError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
            install(Mutex::new(file), level, false)
        }
    }
}

fn install<W>(writer: W, level: Level, ansi: bool) -> Result<(), LogInitError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(LogTarget::parse("0"), LogTarget::Off);
        assert_eq!(LogTarget::parse("off"), LogTarget::Off);
        assert_eq!(LogTarget::parse("1"), LogTarget::Stdout);
        assert_eq!(LogTarget::parse("stderr"), LogTarget::Stderr);
        assert_eq!(
            LogTarget::parse("buildcfg.log"),
            LogTarget::File(PathBuf::from("buildcfg.log"))
        );
    }

    #[test]
    fn test_off_installs_nothing() {
        assert!(init(&LogTarget::Off, true).is_ok());
    }

    #[test]
    fn test_unopenable_log_file() {
        let target = LogTarget::File(PathBuf::from("/nonexistent-dir/buildcfg.log"));
        assert!(matches!(
            init(&target, false),
            Err(LogInitError::OpenFile { .. })
        ));
    }
}
