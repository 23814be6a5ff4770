use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File logging settings read from the environment.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub log_dir: String,
    pub file_log_level: String,
    pub error_file_log_level: String,
}

impl LoggerConfig {
    pub fn from_env() -> Self {
        LoggerConfig {
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            file_log_level: std::env::var("FILE_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
            error_file_log_level: std::env::var("ERROR_FILE_LOG_LEVEL").unwrap_or_else(|_| "error".to_string()),
        }
    }
}

/// Console + rolling file logging. Keep the value alive for the whole
/// process; dropping it flushes and stops the background writers.
pub struct Logger {
    pub guards: Vec<WorkerGuard>,
}

impl Logger {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let guards = Self::setup_logging(&LoggerConfig::from_env())?;
        Ok(Logger { guards })
    }

    pub fn setup_logging(config: &LoggerConfig) -> Result<Vec<WorkerGuard>, Box<dyn std::error::Error>> {
        let error_dir = format!("{}/error", config.log_dir);
        std::fs::create_dir_all(&config.log_dir)?;
        std::fs::create_dir_all(&error_dir)?;

        let console_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,billing_backend=debug"));

        let (general, general_guard) = non_blocking(rolling::daily(&config.log_dir, "billing-backend.log"));
        let (errors, errors_guard) = non_blocking(rolling::daily(&error_dir, "billing-backend-error.log"));
        let (general_json, general_json_guard) = non_blocking(rolling::daily(&config.log_dir, "billing-backend.json"));
        let (errors_json, errors_json_guard) = non_blocking(rolling::daily(&error_dir, "billing-backend-error.json"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(true)
                    .with_filter(console_filter),
            )
            .with(
                fmt::layer()
                    .with_writer(general)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&config.file_log_level)),
            )
            .with(
                fmt::layer()
                    .with_writer(errors)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&config.error_file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(general_json)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&config.file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(errors_json)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&config.error_file_log_level)),
            )
            .try_init()?;

        Ok(vec![general_guard, errors_guard, general_json_guard, errors_json_guard])
    }

    /// Console-only logging, used when the log directory is unusable.
    pub fn console_only() {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init();
    }
}
