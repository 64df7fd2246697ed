//! Logging setup using tracing.
//!
//! Verbose runs log to stderr at `debug`. Otherwise events at `info` go to
//! the configured log file, or to stderr when it cannot be opened.
//! `RUST_LOG` overrides the level in both cases.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. Calling it twice keeps the first one.
pub fn init_logging(verbose: bool, logpath: &Path) {
    if verbose {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter("debug"))
            .with_writer(io::stderr)
            .with_target(true)
            .try_init();
        return;
    }

    match open_log_file(logpath) {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter("info"))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .try_init();
        }
        Err(e) => {
            eprintln!(
                "Warning: cannot open log file {}: {}; logging to stderr",
                logpath.display(),
                e
            );
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter("info"))
                .with_writer(io::stderr)
                .with_target(false)
                .try_init();
        }
    }
}

/// Open the log file for appending, creating it with mode 0640.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o640);
    }

    options.open(path)
}
