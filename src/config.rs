// src/config.rs
use crate::domain::errors::{AppError, AppResult};
use crate::exchange::gamemaster::DEFAULT_GM_URL;
use crate::exchange::stockfighter::DEFAULT_API_URL;
use crate::trading::accumulator::{AccumulatorConfig, CancellationToken};
use crate::trading::levels::LevelSettings;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Endpoints and credentials
    pub exchange: ExchangeConfig,

    /// Which level to play and how hard to push
    pub trading: TradingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Exchange API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// API key, shared by the trading venue and the game master
    pub api_key: String,

    /// Trading API base URL
    pub api_url: String,

    /// Game-master base URL
    pub gm_url: String,

    /// Upper bound on any single request, in seconds
    pub request_timeout_secs: u64,
}

/// Trading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Level to start (e.g., "first_steps", "chock_a_block")
    pub level: String,

    /// Shares to accumulate; the level's own target when unset
    pub target_quantity: Option<u64>,

    /// Largest single order
    pub chunk_size: u64,

    /// Limit price in cents used when no ask is quoted
    pub fallback_price: u64,

    pub max_consecutive_failures: u32,

    pub max_no_progress: u32,

    /// Pause between retries, in milliseconds
    pub retry_backoff_ms: u64,

    /// Cancel orders left open after each attempt
    pub cancel_open_remainder: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Log file path
    pub file_path: Option<String>,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let exchange_config = ExchangeConfig {
            api_key: env::var("STOCKFIGHTER_API_KEY").map_err(|_| {
                AppError::Config("Missing STOCKFIGHTER_API_KEY environment variable".to_string())
            })?,
            api_url: env::var("STOCKFIGHTER_API_URL").unwrap_or(defaults.exchange.api_url),
            gm_url: env::var("STOCKFIGHTER_GM_URL").unwrap_or(defaults.exchange.gm_url),
            request_timeout_secs: env_or(
                "REQUEST_TIMEOUT_SECS",
                defaults.exchange.request_timeout_secs,
            ),
        };

        let trading_config = TradingConfig {
            level: env::var("LEVEL").unwrap_or(defaults.trading.level),
            target_quantity: env::var("TARGET_QUANTITY")
                .ok()
                .and_then(|value| value.trim().parse().ok()),
            chunk_size: env_or("CHUNK_SIZE", defaults.trading.chunk_size),
            fallback_price: env_or("FALLBACK_PRICE", defaults.trading.fallback_price),
            max_consecutive_failures: env_or(
                "MAX_CONSECUTIVE_FAILURES",
                defaults.trading.max_consecutive_failures,
            ),
            max_no_progress: env_or("MAX_NO_PROGRESS", defaults.trading.max_no_progress),
            retry_backoff_ms: env_or("RETRY_BACKOFF_MS", defaults.trading.retry_backoff_ms),
            cancel_open_remainder: env_or(
                "CANCEL_OPEN_REMAINDER",
                defaults.trading.cancel_open_remainder,
            ),
        };

        let logging_config = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            to_file: env_or("LOG_TO_FILE", false),
            file_path: env::var("LOG_FILE_PATH").ok(),
        };

        let config = Config {
            exchange: exchange_config,
            trading: trading_config,
            logging: logging_config,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut file = File::open(path).map_err(|e| {
            AppError::Config(format!("Failed to open config file: {}", e))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::Config(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, contents).map_err(|e| {
            AppError::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    fn validate(&self) -> AppResult<()> {
        if self.exchange.api_key.trim().is_empty() {
            return Err(AppError::Config("API key is empty".to_string()));
        }
        if self.exchange.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "Request timeout must be at least one second".to_string(),
            ));
        }
        if self.trading.chunk_size == 0 {
            return Err(AppError::Config("Chunk size must be positive".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange.request_timeout_secs)
    }

    /// Strategy settings for the configured level.
    pub fn level_settings(&self, cancel: CancellationToken) -> LevelSettings {
        LevelSettings {
            target: self.trading.target_quantity,
            fallback_price: self.trading.fallback_price,
            accumulator: AccumulatorConfig {
                chunk_size: self.trading.chunk_size,
                max_consecutive_failures: self.trading.max_consecutive_failures,
                max_no_progress: self.trading.max_no_progress,
                backoff: Duration::from_millis(self.trading.retry_backoff_ms),
                cancel_open_remainder: self.trading.cancel_open_remainder,
            },
            cancel,
        }
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        // Set log level
        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);

        // Configure output
        if self.logging.to_file {
            if let Some(file_path) = &self.logging.file_path {
                let file = File::create(file_path).map_err(|e| {
                    AppError::Config(format!("Failed to create log file: {}", e))
                })?;

                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }

        builder.try_init().map_err(|e| {
            AppError::Config(format!("Failed to initialize logger: {}", e))
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let accumulator = AccumulatorConfig::default();
        Self {
            exchange: ExchangeConfig {
                api_key: "".to_string(),
                api_url: DEFAULT_API_URL.to_string(),
                gm_url: DEFAULT_GM_URL.to_string(),
                request_timeout_secs: 10,
            },
            trading: TradingConfig {
                level: "first_steps".to_string(),
                target_quantity: None,
                chunk_size: accumulator.chunk_size,
                fallback_price: 0,
                max_consecutive_failures: accumulator.max_consecutive_failures,
                max_no_progress: accumulator.max_no_progress,
                retry_backoff_ms: accumulator.backoff.as_millis() as u64,
                cancel_open_remainder: accumulator.cancel_open_remainder,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                to_file: false,
                file_path: None,
            },
        }
    }
}
