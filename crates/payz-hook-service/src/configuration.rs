//! Layered configuration loading and logging initialisation.
//!
//! Sources, later ones overriding earlier ones:
//!  1. `/etc/payz-hook/service.yaml`: system-wide defaults
//!  2. `./config/service.yaml`: deployment-local override
//!  3. the file named by `PAYZ_HOOK_CONFIG_FILE`
//!  4. `PAYZ_HOOK__*` environment variables, double-underscore separated,
//!     e.g. `PAYZ_HOOK__SERVER__PORT=9090` sets `server.port`
//!
//! Absent files are fine because every field has a default. A malformed
//! file, or a variable that cannot be coerced to the field type, is an error.

use payz_hook_api::{ConfigError, LoggingConfig, ServiceConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable naming an explicit configuration file
pub const CONFIG_FILE_ENV: &str = "PAYZ_HOOK_CONFIG_FILE";

/// Prefix of configuration override variables
pub const ENV_PREFIX: &str = "PAYZ_HOOK";

/// Load the service configuration from every source
pub fn load_config(explicit_path: Option<&str>) -> Result<ServiceConfig, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/payz-hook/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Some(path) = explicit_path.filter(|p| !p.is_empty()) {
        builder = builder.add_source(
            config::File::with_name(path)
                .required(true)
                .format(config::FileFormat::Yaml),
        );
        info!(path = %path, "Loading configuration from explicit path");
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("webhook.events"),
        )
        .build()
        .map_err(|e| ConfigError::Loading {
            message: e.to_string(),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::Loading {
            message: e.to_string(),
        })
}

/// Default filter directive for the configured level
pub fn default_filter(logging: &LoggingConfig) -> String {
    let level = &logging.level;
    format!(
        "payz_hook_service={level},payz_hook_api={level},payz_hook_core={level},tower_http=debug"
    )
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(logging).into());

    let json = logging.json_format;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

#[cfg(test)]
#[path = "configuration_tests.rs"]
mod tests;
