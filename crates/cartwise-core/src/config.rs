use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Loads `.env` (if present) and then reads the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Reads the process environment only; no `.env` file is consulted.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Resolves every `CARTWISE_*` variable through `lookup`, falling back to
/// defaults when a variable is unset. Only malformed values are rejected.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let text = |var: &str, default: &str| lookup(var).unwrap_or_else(|_| default.to_owned());

    let env = parse_environment(&text("CARTWISE_ENV", "development"))?;
    let fetch_timeout_secs: u64 = number(&lookup, "CARTWISE_FETCH_TIMEOUT_SECS", 60)?;
    let task_timeout_secs: u64 = number(&lookup, "CARTWISE_TASK_TIMEOUT_SECS", 180)?;
    if task_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CARTWISE_TASK_TIMEOUT_SECS".to_owned(),
            reason: "must be greater than zero".to_owned(),
        });
    }

    Ok(AppConfig {
        env,
        log_level: text("CARTWISE_LOG_LEVEL", "info"),
        fetch_timeout_secs,
        task_timeout_secs,
        user_agent: text("CARTWISE_USER_AGENT", "cartwise/0.1 (price-transparency)"),
        max_concurrent_fetches: number::<usize, _>(&lookup, "CARTWISE_MAX_CONCURRENT_FETCHES", 4)?
            .max(1),
        max_retries: number(&lookup, "CARTWISE_MAX_RETRIES", 2)?,
        retry_backoff_base_secs: number(&lookup, "CARTWISE_RETRY_BACKOFF_BASE_SECS", 2)?,
    })
}

/// Parses `var` as a number, or returns `default` when it is unset.
fn number<T, F>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    match lookup(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar {
            var: var.to_owned(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    [Environment::Development, Environment::Test, Environment::Production]
        .into_iter()
        .find(|env| env.as_str() == s.trim())
        .ok_or_else(|| ConfigError::InvalidEnvVar {
            var: "CARTWISE_ENV".to_owned(),
            reason: format!("unknown environment \"{s}\""),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
