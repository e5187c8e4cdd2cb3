use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

use super::{RegistryError, RegistryResult};

pub const LOG_FILE: &str = "logs.ndjson";

/// Console verbosity selected by `-v` / `-q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogVerbosity {
    Quiet,
    Normal,
    Verbose,
}

impl LogVerbosity {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            LogVerbosity::Quiet
        } else if verbose > 0 {
            LogVerbosity::Verbose
        } else {
            LogVerbosity::Normal
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            LogVerbosity::Quiet => "warn",
            LogVerbosity::Normal => "info",
            LogVerbosity::Verbose => "debug",
        }
    }
}

/// Install the global subscriber: human output on stderr and, when `log_dir`
/// is given, JSON lines appended to `<log_dir>/logs.ndjson`.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn init_logging(verbosity: LogVerbosity, log_dir: Option<&Path>) -> RegistryResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);

    let json = match log_dir {
        Some(dir) => {
            create_dir_all(dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))?;
            let file = Arc::new(Mutex::new(file));
            let make_writer = BoxMakeWriter::new(move || SharedWriter {
                file: Arc::clone(&file),
            });
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(make_writer),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(json)
        .try_init()
        .map_err(|err| RegistryError::Logging(err.to_string()))?;

    Ok(())
}

struct SharedWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("failed to lock log file"))?;
        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("failed to lock log file"))?;
        file.flush()
    }
}
