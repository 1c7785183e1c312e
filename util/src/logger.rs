//! Generic logger utility functions
//!
//! Log lines are timestamped with the number of seconds elapsed since the
//! session epoch, so the logger must be initialised after the [`Session`]
//! which owns the log file.
//!
//! [`Session`]: crate::session::Session

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern;
use log::{self, info};
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// Records are written to both stdout and the given log file.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: LevelFilter,
    log_file_path: &Path,
) -> Result<(), LoggerInitError> {
    let log_file =
        fern::log_file(log_file_path).map_err(LoggerInitError::LogFileInitError)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            // Targets are only worth printing when debugging
            let target = if record.level() > log::Level::Info {
                format!("{}: ", record.target())
            } else {
                String::new()
            };

            out.finish(format_args!(
                "[{:10.6} {}] {}{}",
                session::get_elapsed_seconds(),
                level_to_str(record.level()),
                target,
                message
            ))
        })
        .level(min_level)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::Session;

    /// The session epoch and fern's global logger can only be initialised
    /// once per process, so the whole session/logger startup sequence is
    /// exercised in a single test.
    #[test]
    fn test_session_and_logger_init() {
        // Same root as the params test, so concurrent env var writes agree
        let root = std::env::temp_dir().join("util_test_root");
        std::fs::create_dir_all(&root).unwrap();
        std::env::set_var(crate::host::SW_ROOT_ENV_VAR, &root);

        let session = Session::new("test_exec", "sessions").unwrap();
        assert!(session.session_root.is_dir());
        assert!(session.log_file_path.ends_with("test_exec.log"));

        // The epoch is set exactly once per process
        assert!(Session::new("test_exec", "sessions").is_err());
        assert!(session::get_elapsed_seconds() >= 0.0);

        logger_init(LevelFilter::Info, &session.log_file_path).unwrap();
        info!("logger smoke test");

        let log = std::fs::read_to_string(&session.log_file_path).unwrap();
        assert!(log.contains("Logging initialised"));
        assert!(log.contains("logger smoke test"));
    }
}
