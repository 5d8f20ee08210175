use crate::app_config::{AppConfig, Environment};
use crate::similarity::DEFAULT_SIMILARITY_THRESHOLD;
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
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("AIVIS_ENV", "development"));
    let log_level = or_default("AIVIS_LOG_LEVEL", "info");
    let tracked_path = PathBuf::from(or_default("AIVIS_TRACKED_PATH", "./config/tracked.yaml"));

    let db_max_connections = parse_u32("AIVIS_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("AIVIS_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("AIVIS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let threshold_var = "AIVIS_SIMILARITY_THRESHOLD";
    let similarity_threshold = match lookup(threshold_var) {
        Ok(raw) => {
            let value = raw
                .parse::<f64>()
                .map_err(|e| invalid(threshold_var, e.to_string()))?;
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(
                    threshold_var,
                    format!("{value} is outside (0, 1]"),
                ));
            }
            value
        }
        Err(_) => DEFAULT_SIMILARITY_THRESHOLD,
    };

    let max_concurrent_answers = parse_usize("AIVIS_MAX_CONCURRENT_ANSWERS", "4")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        tracked_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        similarity_threshold,
        max_concurrent_answers,
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

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
