//! Configuration loading.
//!
//! Layers, lowest priority first: built-in development defaults, an optional
//! `storefront.{toml,yaml,json}` file (or an explicit path), then
//! `STOREFRONT_*` environment variables. Nested keys use `__`, e.g.
//! `STOREFRONT_KEYCLOAK__REALM=shop`.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use storefront_domain::{AppConfig, DomainError};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "STOREFRONT";

/// Base name of the optional config file in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "storefront";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// A source could not be read or did not match the schema.
    #[error("failed to load configuration: {0}")]
    Source(#[from] ConfigError),

    /// The merged configuration is not usable.
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Loads configuration from file and process environment.
///
/// With `path`, that file must exist; without it, `storefront.*` in the
/// working directory is used when present.
///
/// # Errors
///
/// Returns an error if a source cannot be parsed or the result fails
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigLoadError> {
    load_with_environment(path, environment())
}

fn load_with_environment(
    path: Option<&Path>,
    environment: Environment,
) -> Result<AppConfig, ConfigLoadError> {
    let file = path.map_or_else(
        || File::with_name(DEFAULT_CONFIG_NAME).required(false),
        |path| File::from(path).required(true),
    );

    let config: AppConfig = Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}
