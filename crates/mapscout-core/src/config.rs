use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse or the delay window is
/// inverted (`MIN_DELAY > MAX_DELAY`).
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse or the delay window is
/// inverted.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed. Every option has a default; lookup
/// failures never error, only unparseable values do.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got \"{other}\""),
            }),
        }
    };

    let output_dir = PathBuf::from(or_default("OUTPUT_DIR", "data/results"));
    let default_limit = parse_usize("DEFAULT_LIMIT", "50")?;
    let min_delay_secs = parse_f64("MIN_DELAY", "0.5")?;
    let max_delay_secs = parse_f64("MAX_DELAY", "1.5")?;
    let headless = parse_bool("HEADLESS", "false")?;
    let block_images = parse_bool("BLOCK_IMAGES", "true")?;
    let max_attempts = parse_u32("MAX_ATTEMPTS", "3")?;
    let scroll_stall_threshold = parse_u32("SCROLL_STALL_THRESHOLD", "3")?;
    let results_timeout_secs = parse_u64("RESULTS_TIMEOUT_SECS", "15")?;
    let detail_timeout_secs = parse_u64("DETAIL_TIMEOUT_SECS", "20")?;
    let max_concurrent_sessions = parse_usize("MAX_CONCURRENT_SESSIONS", "1")?;

    if !min_delay_secs.is_finite() || min_delay_secs < 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MIN_DELAY".to_string(),
            reason: "must be a non-negative number of seconds".to_string(),
        });
    }
    if !max_delay_secs.is_finite() || max_delay_secs < 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MAX_DELAY".to_string(),
            reason: "must be a non-negative number of seconds".to_string(),
        });
    }
    if min_delay_secs > max_delay_secs {
        return Err(ConfigError::DelayWindow {
            min: min_delay_secs,
            max: max_delay_secs,
        });
    }
    if default_limit == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "DEFAULT_LIMIT".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if scroll_stall_threshold == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SCROLL_STALL_THRESHOLD".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        output_dir,
        default_limit,
        min_delay_secs,
        max_delay_secs,
        headless,
        block_images,
        max_attempts,
        scroll_stall_threshold,
        results_timeout_secs,
        detail_timeout_secs,
        max_concurrent_sessions,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
