use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_PDF_URL_TTL_SECS: u64 = 3600;
const DEFAULT_PDF_LOCAL_DIR: &str = "storage/invoices";

/// Application configuration with validation.
///
/// Layered from `config/default.toml`, `config/{env}.toml` and
/// `HYDROPAK__*` environment variables, in that order.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key (minimum 32 characters)
    #[validate(length(min = 32), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// JWT expiration time in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Development bypass: skip bearer-token validation and act as a
    /// synthetic admin. Refused outside the development environment.
    #[serde(default)]
    pub auth_disabled: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    /// Default tax rate applied when invoicing an order (decimal, e.g. 0.08)
    #[serde(default = "default_tax_rate")]
    #[validate(custom = "validate_tax_rate")]
    pub default_tax_rate: f64,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// S3 bucket for rendered invoice PDFs. When unset, PDFs are written
    /// to `pdf_local_dir` and served from the static route instead.
    #[serde(default)]
    pub pdf_s3_bucket: Option<String>,

    /// Key prefix inside the bucket
    #[serde(default = "default_pdf_s3_prefix")]
    pub pdf_s3_prefix: String,

    /// Lifetime of presigned PDF URLs (seconds)
    #[serde(default = "default_pdf_url_ttl_secs")]
    pub pdf_url_ttl_secs: u64,

    /// Local directory for PDFs when S3 is not configured
    #[serde(default = "default_pdf_local_dir")]
    pub pdf_local_dir: String,

    /// Public base path under which local PDFs are served
    #[serde(default = "default_pdf_public_base")]
    pub pdf_public_base: String,
}

fn default_jwt_expiration() -> u64 {
    3600
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_tax_rate() -> f64 {
    0.0
}
fn default_event_channel_capacity() -> usize {
    1024
}
fn default_pdf_s3_prefix() -> String {
    "invoices".to_string()
}
fn default_pdf_url_ttl_secs() -> u64 {
    DEFAULT_PDF_URL_TTL_SECS
}
fn default_pdf_local_dir() -> String {
    DEFAULT_PDF_LOCAL_DIR.to_string()
}
fn default_pdf_public_base() -> String {
    "/static/invoices".to_string()
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let distinct = secret
        .chars()
        .collect::<std::collections::HashSet<_>>()
        .len();
    // A secret of repeated characters passes the length check but is guessable.
    if distinct < 8 {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("jwt_secret must contain at least 8 distinct characters".into());
        return Err(err);
    }
    Ok(())
}

fn validate_tax_rate(rate: f64) -> Result<(), ValidationError> {
    if !rate.is_finite() || rate < 0.0 || rate > 1.0 {
        let mut err = ValidationError::new("default_tax_rate");
        err.message = Some("default_tax_rate must be a finite value between 0.0 and 1.0".into());
        return Err(err);
    }
    Ok(())
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// The dev auth bypass is only honored in the development environment;
    /// anywhere else the flag is ignored and logged.
    pub fn auth_bypass_enabled(&self) -> bool {
        if self.auth_disabled && !self.is_development() {
            error!("auth_disabled is set outside development; ignoring");
            return false;
        }
        self.auth_disabled
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads application configuration.
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (HYDROPAK__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
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

    let builder = Config::builder()
        .set_default("database_url", "sqlite://hydropak.db?mode=rwc")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("HYDROPAK").separator("__"))
        .build()?;

    // jwt_secret has no default on purpose: fail loudly rather than ship a
    // guessable signing key.
    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set HYDROPAK__JWT_SECRET with a secure random string (minimum 32 characters).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set HYDROPAK__JWT_SECRET.".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

/// Install the global tracing subscriber.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("hydropak_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt_secret: "an-adequately-long-signing-secret-for-tests".into(),
            jwt_expiration: 3600,
            host: default_host(),
            port: default_port(),
            environment: "development".into(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            auth_disabled: false,
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            default_tax_rate: 0.08,
            event_channel_capacity: default_event_channel_capacity(),
            pdf_s3_bucket: None,
            pdf_s3_prefix: default_pdf_s3_prefix(),
            pdf_url_ttl_secs: default_pdf_url_ttl_secs(),
            pdf_local_dir: default_pdf_local_dir(),
            pdf_public_base: default_pdf_public_base(),
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let mut cfg = base_config();
        cfg.jwt_secret = "short".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn tax_rate_above_one_is_rejected() {
        let mut cfg = base_config();
        cfg.default_tax_rate = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn auth_bypass_ignored_outside_development() {
        let mut cfg = base_config();
        cfg.auth_disabled = true;
        cfg.environment = "production".into();
        assert!(!cfg.auth_bypass_enabled());

        cfg.environment = "development".into();
        assert!(cfg.auth_bypass_enabled());
    }
}
