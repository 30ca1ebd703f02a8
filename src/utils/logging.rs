use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Directory of the rotating log files
const LOG_DIR: &str = "logs";
/// File name prefix of the rotating log files
const LOG_FILE: &str = "anyforecast.log";

/// Initialize the logging system with the specified filter.
///
/// # Arguments
///
/// * `log_level` - A level (`info`) or a full filter (`anyforecast=debug,axum=warn`)
/// * `with_file` - Whether to also log to a daily rotating file in `logs/`
pub fn init_logging(log_level: &str, with_file: bool) {
    let filter = match EnvFilter::try_new(log_level) {
        Ok(f) => f,
        Err(_) => {
            eprintln!("Invalid log level '{}', defaulting to 'info'", log_level);
            EnvFilter::new("info")
        }
    };

    let stdout_layer = fmt::layer().with_line_number(true).with_target(true);

    if with_file {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE);

        let file_layer = fmt::layer()
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .init();
    }
}
