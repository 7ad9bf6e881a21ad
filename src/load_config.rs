/// `load_config` module: reads the optional YAML run configuration.
///
/// The file only carries limits, fan-out policy and an optional provider catalog. Secrets
/// never live here: provider keys come from `<PROVIDER>_API_KEY` and the GitHub token from
/// `GITHUB_TOKEN`, both read from the environment (a `.env` file is loaded at startup).
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use docbench_core::config::RunConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Loads a YAML config file. Every section and field is optional.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    // An empty file is a valid, all-defaults config.
    if config_content.trim().is_empty() {
        return Ok(RunConfig::default());
    }

    let config: RunConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Some(providers) = &config.providers {
        if let Some(empty) = providers.iter().find(|p| p.models.is_empty()) {
            return Err(anyhow::anyhow!("Provider '{}' in config lists no models", empty.name));
        }
    }
    Ok(config)
}

/// Load from `path` when given, otherwise use the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<RunConfig> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => {
            info!("No config file given, using defaults");
            RunConfig::default()
        }
    };
    config.trace_loaded();
    Ok(config)
}
