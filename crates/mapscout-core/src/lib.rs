pub mod app_config;
pub mod config;
pub mod record;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use record::BusinessRecord;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("MIN_DELAY ({min}) must not exceed MAX_DELAY ({max})")]
    DelayWindow { min: f64, max: f64 },
}
