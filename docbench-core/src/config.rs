use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::catalog::{ProviderCatalog, ProviderSpec};
use crate::fanout::{DispatchMode, FanOutConfig};
use crate::ingest::IngestLimits;

/// Everything a comparison run needs besides secrets and the input itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ingest: IngestLimits,
    pub generation: GenerationSettings,
    /// Replaces the built-in provider catalog when present.
    pub providers: Option<Vec<ProviderSpec>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    #[default]
    Sequential,
    Parallel,
}

/// Fan-out policy as written in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub call_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub global_deadline_secs: u64,
    pub dispatch_delay_ms: u64,
    pub mode: ModeSetting,
    pub max_in_flight: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            call_timeout_secs: 60,
            max_attempts: 2,
            retry_backoff_ms: 500,
            global_deadline_secs: 300,
            dispatch_delay_ms: 100,
            mode: ModeSetting::Sequential,
            max_in_flight: 4,
        }
    }
}

impl GenerationSettings {
    pub fn fan_out_config(&self) -> FanOutConfig {
        FanOutConfig {
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            max_attempts: self.max_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            global_deadline: Duration::from_secs(self.global_deadline_secs),
            dispatch_delay: Duration::from_millis(self.dispatch_delay_ms),
            mode: match self.mode {
                ModeSetting::Sequential => DispatchMode::Sequential,
                ModeSetting::Parallel => DispatchMode::Parallel {
                    max_in_flight: self.max_in_flight.max(1),
                },
            },
        }
    }
}

impl RunConfig {
    pub fn catalog(&self) -> ProviderCatalog {
        match &self.providers {
            Some(providers) => ProviderCatalog::from_providers(providers.clone()),
            None => ProviderCatalog::builtin(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            max_files = self.ingest.max_files,
            max_remote_files = self.ingest.max_remote_files,
            mode = ?self.generation.mode,
            call_timeout_secs = self.generation.call_timeout_secs,
            global_deadline_secs = self.generation.global_deadline_secs,
            custom_providers = self.providers.as_ref().map(Vec::len).unwrap_or(0),
            "Loaded RunConfig"
        );
        debug!(?self, "RunConfig loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_mode_carries_in_flight_limit() {
        let settings = GenerationSettings {
            mode: ModeSetting::Parallel,
            max_in_flight: 0,
            ..GenerationSettings::default()
        };
        assert_eq!(
            settings.fan_out_config().mode,
            DispatchMode::Parallel { max_in_flight: 1 }
        );
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = RunConfig::default().generation.fan_out_config();
        assert_eq!(config, FanOutConfig::default());
        assert!(RunConfig::default().catalog().get("groq").is_some());
    }
}
