use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File};
use eyre::{Context, Result};
use serde::de::DeserializeOwned;

/// Prefix of environment variables overriding config values.
pub const ENV_PREFIX: &str = "VIBC";
/// Separates the levels of the config hierarchy in environment variable
/// names, e.g. `VIBC__ORIGIN__RPC_URL`.
pub const ENV_SEPARATOR: &str = "__";

/// Load a settings object from the config locations.
/// Further documentation can be found in the `settings` module.
pub(crate) fn load_settings_object<T>(config_dir: &Path, env: HashMap<String, String>) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut base_config_sources = vec![];
    let mut builder = Config::builder();

    // Load the default config files (`config/*.json`) when the directory exists
    if config_dir.is_dir() {
        let mut paths = config_dir
            .read_dir()
            .with_context(|| format!("Failed to open config directory {config_dir:?}"))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("Failed to list config directory {config_dir:?}"))?;
        paths.sort();
        for path in paths {
            if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
                base_config_sources.push(format!("{path:?}"));
                builder = builder.add_source(File::from(path));
            }
        }
    }

    // Load a set of additional user specified config files
    let config_file_paths: Vec<String> = env
        .get("CONFIG_FILES")
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let builder = config_file_paths.iter().fold(builder, |builder, path| {
        builder.add_source(File::with_name(path))
    });

    let config_deserializer = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .source(Some(env)),
        )
        .build()
        .context("Failed to read config sources")?;

    let mut result = config_deserializer
        .try_deserialize::<T>()
        .context("Config deserialization error");
    for cfg_path in base_config_sources.iter().chain(config_file_paths.iter()) {
        result = result.with_context(|| format!("Config loaded: {cfg_path}"));
    }
    result
}
