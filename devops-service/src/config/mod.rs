// Configuration Module
// Data models and loading for .git-local-devops.yml

pub mod loader;
pub mod models;

pub use loader::{parse_config, validate, ConfigError, ConfigLoader, CONFIG_FILE, ENV_FILE};
pub use models::*;
