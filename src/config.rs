use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::clock::DayRollover;
use crate::errors::QuizError;
use crate::quiz_source::EXAM_DATES_FILE_NAME;
use crate::scheduler::DEFAULT_HISTORY_LIMIT;
use crate::shuffler::DEFAULT_CONJUNCTIONS;

// Import logging macros
use crate::{log_system_event, log_validation};

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub data: DataConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Where quiz content and the stores live
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub data_folder: PathBuf,
    pub index_file: PathBuf,
    pub performance_file: PathBuf,
    pub exam_dates_file: PathBuf,
}

/// Study session behaviour
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub day_rollover: DayRollover,
    pub shuffle_seed: Option<u64>,
    pub conjunctions: Vec<String>,
    pub history_limit: usize,
}

/// Logging system configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            data: DataConfig::from_env()?,
            session: SessionConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Log a summary of loaded configuration. Call after the subscriber is installed.
    pub fn log_configuration_summary(&self) {
        log_system_event!(config, "Configuration loaded successfully");
        info!(
            data_folder = %self.data.data_folder.display(),
            index_file = %self.data.index_file.display(),
            performance_file = %self.data.performance_file.display(),
            exam_dates_file = %self.data.exam_dates_file.display(),
            day_cutover = %self.session.day_rollover.cutover().format("%H:%M"),
            shuffle_seed = ?self.session.shuffle_seed,
            conjunctions = ?self.session.conjunctions,
            history_limit = self.session.history_limit,
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.data.data_folder.as_os_str().is_empty() {
            return Err(Self::invalid("QUIZ_DATA_FOLDER must not be empty"));
        }

        if self.session.history_limit == 0 {
            return Err(Self::invalid("QUIZ_HISTORY_LIMIT must be greater than 0"));
        }

        if self.session.conjunctions.is_empty() {
            warn!("No conjunctions configured, letter lists in explanations will not be reordered");
        }

        let base_level = self
            .logging
            .level
            .split(',')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&base_level.as_str()) {
            warn!("Invalid log level '{}', using 'info' as fallback", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }

    fn invalid(message: &str) -> QuizError {
        log_validation!(failure, "configuration", error = message);
        QuizError::Config(message.to_string())
    }
}

impl DataConfig {
    fn from_env() -> Result<Self> {
        let data_folder = PathBuf::from(
            env::var("QUIZ_DATA_FOLDER").unwrap_or_else(|_| "quiz_data".to_string()),
        );

        let index_name = env::var("QUIZ_INDEX_FILE").unwrap_or_else(|_| ".quiz_index.json".to_string());
        let index_file = data_folder.join(index_name);

        let performance_file = PathBuf::from(
            env::var("QUIZ_PERFORMANCE_FILE").unwrap_or_else(|_| "quiz_performance.json".to_string()),
        );

        let exam_dates_file = env::var("QUIZ_EXAM_DATES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_folder.join(EXAM_DATES_FILE_NAME));

        Ok(DataConfig {
            data_folder,
            index_file,
            performance_file,
            exam_dates_file,
        })
    }
}

impl SessionConfig {
    fn from_env() -> Result<Self> {
        let day_rollover = match env::var("QUIZ_DAY_CUTOVER") {
            Ok(value) => DayRollover::parse(&value)?,
            Err(_) => DayRollover::default(),
        };

        let shuffle_seed = match env::var("QUIZ_SHUFFLE_SEED") {
            Ok(value) => Some(
                value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid QUIZ_SHUFFLE_SEED value: '{}'", value))?,
            ),
            Err(_) => None,
        };

        let conjunctions = match env::var("QUIZ_CONJUNCTIONS") {
            Ok(value) => value
                .split(',')
                .map(str::trim)
                .filter(|word| !word.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => DEFAULT_CONJUNCTIONS.iter().map(|word| word.to_string()).collect(),
        };

        let history_limit = match env::var("QUIZ_HISTORY_LIMIT") {
            Ok(value) => value.trim().parse::<usize>().map_err(|_| {
                anyhow!("Invalid QUIZ_HISTORY_LIMIT value: '{}'. Must be a positive number", value)
            })?,
            Err(_) => DEFAULT_HISTORY_LIMIT,
        };

        Ok(SessionConfig {
            day_rollover,
            shuffle_seed,
            conjunctions,
            history_limit,
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            day_rollover: DayRollover::default(),
            shuffle_seed: None,
            conjunctions: DEFAULT_CONJUNCTIONS.iter().map(|word| word.to_string()).collect(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self> {
        let level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info,quiz_scheduler=debug".to_string());

        let file_enabled = env::var("LOG_FILE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        // Console logs share the terminal with the prompts, so they are opt-in.
        let console_enabled = env::var("LOG_CONSOLE_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let log_directory = env::var("LOG_DIRECTORY")
            .unwrap_or_else(|_| "logs".to_string());

        Ok(LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        })
    }
}
