//! Structured logging for the archipel generator.
//!
//! Wires the `tracing` ecosystem: console output with timestamps, module paths
//! and thread names (workers are named, so per-worker activity is readable),
//! plus JSON file logging in debug builds. The configured log level is used
//! unless `RUST_LOG` is set.

use archipel_config::Config;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "archipel.log";

/// Resolve the filter directive string from an optional config.
///
/// An empty configured level falls back to the default.
pub fn filter_directives(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create `log_dir` and truncate the JSON log file inside it.
///
/// Returns `None` when either step fails; file logging is then skipped.
pub fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

/// Initialize the global tracing subscriber.
///
/// Console output always carries the target, the thread name and the time
/// since startup. In debug builds with a `log_dir`, the same events are also
/// written as JSON lines to [`LOG_FILE_NAME`].
///
/// # Examples
///
/// ```no_run
/// use archipel_log::init_logging;
///
/// init_logging(None, false, None);
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let json_layer = log_dir
        .filter(|_| debug_build)
        .and_then(open_log_file)
        .map(|file| {
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime())
                .json()
        });
    let file_logging = json_layer.is_some();
    let directives = env_filter.to_string();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(json_layer)
        .init();

    log_startup(&directives, file_logging);
}

/// First event after the subscriber is installed.
fn log_startup(directives: &str, file_logging: bool) {
    tracing::info!(filter = %directives, file_logging, "logging initialized");
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();
        assert!(format!("{filter}").contains("info"));
    }

    #[test]
    fn test_filter_from_config() {
        let mut config = Config::default();
        config.debug.log_level = "debug,archipel_pipeline=trace".to_string();
        assert_eq!(
            filter_directives(Some(&config)),
            "debug,archipel_pipeline=trace"
        );
    }

    #[test]
    fn test_empty_config_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level.clear();
        assert_eq!(filter_directives(Some(&config)), "info");
        assert_eq!(filter_directives(None), "info");
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,archipel_world=trace",
            "warn,archipel_pipeline=debug,archipel_terrain=trace",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {filter_str}");
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_startup_event_reports_filter_and_file_layer() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            log_startup("debug,archipel_world=trace", true)
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("logging initialized"));
        assert!(output.contains("debug,archipel_world=trace"));
        assert!(output.contains("file_logging=true"));
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_dir = temp_dir.path().join("nested").join("logs");
        assert!(open_log_file(&log_dir).is_some());
        assert!(log_dir.join("archipel.log").exists());
    }
}
