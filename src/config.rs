use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_CONCURRENCY: usize = 16;
const DEFAULT_MAX_ROWS: usize = 1_000;
const DEFAULT_CIRCUIT_BREAKER_FAILURES: u32 = 5;
const DEFAULT_CIRCUIT_BREAKER_TIMEOUT_SECS: u64 = 30;

/// Report engine configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ReportConfig {
    /// Default tracing filter level for the crate
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Timeout for each related-collection lookup, in milliseconds
    #[serde(default = "default_lookup_timeout_ms")]
    #[validate(range(min = 1, max = 60000))]
    pub lookup_timeout_ms: u64,

    /// Lots enriched concurrently within one batch
    #[serde(default = "default_max_concurrency")]
    #[validate(range(min = 1, max = 256))]
    pub max_concurrency: usize,

    /// Upper bound on primary records per batch; requests may ask for fewer
    #[serde(default = "default_max_rows")]
    #[validate(range(min = 1, max = 10000))]
    pub max_rows: usize,

    /// Consecutive lookup failures before the circuit opens
    #[serde(default = "default_circuit_breaker_failures")]
    #[validate(range(min = 1, max = 1000))]
    pub circuit_breaker_failure_threshold: u32,

    /// Seconds the circuit stays open before probing again
    #[serde(default = "default_circuit_breaker_timeout_secs")]
    #[validate(range(min = 1, max = 3600))]
    pub circuit_breaker_timeout_secs: u64,

    /// Let non-approved events supply rate/insurer when approved ones don't
    #[serde(default)]
    pub surface_unapproved_descriptors: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_rows: DEFAULT_MAX_ROWS,
            circuit_breaker_failure_threshold: DEFAULT_CIRCUIT_BREAKER_FAILURES,
            circuit_breaker_timeout_secs: DEFAULT_CIRCUIT_BREAKER_TIMEOUT_SECS,
            surface_unapproved_descriptors: false,
        }
    }
}

impl ReportConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_lookup_timeout_ms() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_MS
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_circuit_breaker_failures() -> u32 {
    DEFAULT_CIRCUIT_BREAKER_FAILURES
}

fn default_circuit_breaker_timeout_secs() -> u64 {
    DEFAULT_CIRCUIT_BREAKER_TIMEOUT_SECS
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("warehouse_recon={},lot_report={}", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let builder = fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Loads report configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<ReportConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    load_config_from(Path::new(CONFIG_DIR), &run_env, None)
}

/// Loads configuration from `dir` for the `run_env` profile.
///
/// `env_overrides` replaces the process environment as the source of
/// `APP__*` variables when given.
pub fn load_config_from(
    dir: &Path,
    run_env: &str,
    env_overrides: Option<HashMap<String, String>>,
) -> Result<ReportConfig, AppConfigError> {
    let defaults = ReportConfig::default();
    let config = Config::builder()
        .set_default("log_level", defaults.log_level.as_str())?
        .set_default("log_json", defaults.log_json)?
        .set_default("lookup_timeout_ms", defaults.lookup_timeout_ms as i64)?
        .set_default("max_concurrency", defaults.max_concurrency as i64)?
        .set_default("max_rows", defaults.max_rows as i64)?
        .set_default(
            "circuit_breaker_failure_threshold",
            i64::from(defaults.circuit_breaker_failure_threshold),
        )?
        .set_default(
            "circuit_breaker_timeout_secs",
            defaults.circuit_breaker_timeout_secs as i64,
        )?
        .set_default(
            "surface_unapproved_descriptors",
            defaults.surface_unapproved_descriptors,
        )?
        .add_source(File::from(dir.join("default")).required(false))
        .add_source(File::from(dir.join(run_env)).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true)
                .source(env_overrides),
        )
        .build()?;

    let report_config: ReportConfig = config.try_deserialize()?;

    report_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(report_config)
}
