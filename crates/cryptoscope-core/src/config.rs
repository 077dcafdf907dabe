use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the process environment so tests can drive it
/// with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("CRYPTOSCOPE_ENV", "development"));
    let bind_addr = parse_addr("CRYPTOSCOPE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("CRYPTOSCOPE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("CRYPTOSCOPE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CRYPTOSCOPE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CRYPTOSCOPE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let http_timeout_secs = parse_u64("CRYPTOSCOPE_HTTP_TIMEOUT_SECS", "30")?;
    let sync_max_retries = parse_u32("CRYPTOSCOPE_SYNC_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("CRYPTOSCOPE_RETRY_BACKOFF_BASE_MS", "1000")?;

    let sync_cron = or_default("CRYPTOSCOPE_SYNC_CRON", "0 0 */4 * * *");
    let alert_scan_cron = or_default("CRYPTOSCOPE_ALERT_SCAN_CRON", "0 */30 * * * *");
    let weekly_report_cron = or_default("CRYPTOSCOPE_WEEKLY_REPORT_CRON", "0 0 9 * * MON");

    let twitter_bearer_token = optional("TWITTER_BEARER_TOKEN");
    let resend_api_key = optional("RESEND_API_KEY");
    let email_from = or_default("EMAIL_FROM", "CryptoScope <noreply@cryptoscope.ai>");
    let app_url = or_default("APP_URL", "https://app.cryptoscope.ai");
    let automation_base_url = or_default("AUTOMATION_BASE_URL", "https://moltbook.com");
    let api_keys = or_default("CRYPTOSCOPE_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        http_timeout_secs,
        sync_max_retries,
        retry_backoff_base_ms,
        sync_cron,
        alert_scan_cron,
        weekly_report_cron,
        twitter_bearer_token,
        resend_api_key,
        email_from,
        app_url,
        automation_base_url,
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
