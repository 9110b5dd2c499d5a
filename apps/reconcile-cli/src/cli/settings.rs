//! # Settings
//!
//! Settings are layered, later sources winning:
//!
//! 1. `~/.ch-reconcile/config.toml`, or the file given with `--config`
//! 2. `CH_RECONCILE_*` environment variables, `__` separating sections,
//!    e.g. `CH_RECONCILE_CONNECTION__HOST=ch1` or `CH_RECONCILE_LOGGER__LEVEL=debug`
//!
//! Connection values given on the command line or in a parameter record are applied
//! on top of the `[connection]` section afterwards.
//!
//! ```toml
//! [logger]
//! level = "Debug"
//! format = "Json"
//!
//! [connection]
//! host = "ch1.internal"
//! port = 8443
//! ssl = true
//! login_user = "admin"
//! ```

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::logger::LoggerSettings;
use crate::infrastructure::olap::clickhouse::config::ConnectionParams;
use crate::utilities::constants::{CLI_CONFIG_FILE, CLI_USER_DIRECTORY, ENV_SETTINGS_PREFIX};

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub connection: ConnectionParams,
}

pub fn user_directory() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(CLI_USER_DIRECTORY))
}

fn default_config_file() -> Option<PathBuf> {
    user_directory().map(|dir| dir.join(CLI_CONFIG_FILE))
}

/// Reads the settings. An explicit `config_file` must exist, the default one may not.
pub fn read_settings(config_file: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    match config_file {
        Some(path) => {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }
        None => {
            if let Some(path) = default_config_file() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }
    }

    builder
        .add_source(
            Environment::with_prefix(ENV_SETTINGS_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
