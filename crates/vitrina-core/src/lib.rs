mod app_config;
mod config;

pub mod catalog;
pub mod category;

pub use app_config::{AppConfig, Environment};
pub use catalog::NormalizedEntry;
pub use category::{resolve_category, CategoryName, CANONICAL_CATEGORIES};
pub use config::{load_app_config, load_app_config_from_env};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
