//! Layered configuration loading.
//!
//! Every binary reads `config/base.yaml`, then an optional
//! `config/{APP_ENVIRONMENT}.yaml`, then `APP_`-prefixed environment
//! variables (`APP_BACKEND__BASE_URL=...`).

use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable selecting the overlay file.
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

const DEFAULT_ENVIRONMENT: &str = "local";

/// Resolve the `config/` directory of a crate.
///
/// Binaries run either from the crate directory or from the workspace root.
pub fn configuration_directory(base_path: &Path, crate_dir: &str) -> PathBuf {
    if base_path.ends_with(crate_dir) {
        base_path.join("config")
    } else {
        base_path.join(crate_dir).join("config")
    }
}

/// Name of the active environment overlay (`local` when unset).
pub fn environment() -> String {
    std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
}

/// Load settings for `crate_dir` from the current working directory.
pub fn load_configuration<T: DeserializeOwned>(crate_dir: &str) -> Result<T, ConfigError> {
    dotenvy::dotenv().ok();

    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("failed to determine current directory: {e}")))?;

    load_from_directory(&configuration_directory(&base_path, crate_dir))
}

/// Load settings from an explicit `config/` directory.
pub fn load_from_directory<T: DeserializeOwned>(directory: &Path) -> Result<T, ConfigError> {
    let overlay = directory.join(format!("{}.yaml", environment()));

    let settings = Config::builder()
        .add_source(File::from(directory.join("base.yaml")).required(true))
        .add_source(File::from(overlay).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<T>()
}
