//! Provider catalog, credential discovery and task planning.
//!
//! The catalog and the credential table are built once per process and handed to the
//! pipeline by reference. A provider is available exactly when `<NAME>_API_KEY` is set to a
//! non-empty value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::contract::GenerationTask;
use crate::error::PipelineError;

/// Upper bound on the output tokens requested from any single call.
pub const MAX_OUTPUT_TOKENS: u32 = 4000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    /// Root of the provider's OpenAI-compatible API, e.g. `https://api.groq.com/openai/v1`.
    pub base_url: String,
    pub models: Vec<ModelSpec>,
}

type BuiltinProvider = (&'static str, &'static str, &'static [(&'static str, u32)]);

const BUILTIN_PROVIDERS: &[BuiltinProvider] = &[
    (
        "groq",
        "https://api.groq.com/openai/v1",
        &[
            ("llama-3.3-70b-versatile", 12000),
            ("llama-3.1-8b-instant", 8000),
            ("gemma2-9b-it", 10000),
            ("qwen-qwq-32b", 10000),
            ("llama3-70b-8192", 8000),
            ("mixtral-8x7b-32768", 15000),
        ],
    ),
    (
        "openai",
        "https://api.openai.com/v1",
        &[("gpt-4o-mini", 8000), ("gpt-3.5-turbo", 4000), ("gpt-4", 8000), ("gpt-4-turbo", 8000)],
    ),
    (
        "deepinfra",
        "https://api.deepinfra.com/v1/openai",
        &[
            ("meta-llama/Llama-3.3-70B-Instruct", 8000),
            ("meta-llama/Llama-3.1-8B-Instruct", 6000),
            ("microsoft/WizardLM-2-8x22B", 10000),
            ("Qwen/Qwen2.5-72B-Instruct", 8000),
            ("nvidia/Llama-3.1-Nemotron-70B-Instruct", 8000),
        ],
    ),
    (
        "together",
        "https://api.together.xyz/v1",
        &[
            ("meta-llama/Llama-3.2-11B-Vision-Instruct-Turbo", 8000),
            ("meta-llama/Llama-3.1-8B-Instruct-Turbo", 6000),
            ("Qwen/Qwen2.5-7B-Instruct-Turbo", 6000),
            ("meta-llama/Llama-3.1-70B-Instruct-Turbo", 8000),
            ("mistralai/Mixtral-8x7B-Instruct-v0.1", 6000),
        ],
    ),
    (
        "fireworks",
        "https://api.fireworks.ai/inference/v1",
        &[
            ("accounts/fireworks/models/llama-v3p1-8b-instruct", 6000),
            ("accounts/fireworks/models/qwen2p5-7b-instruct", 6000),
            ("accounts/fireworks/models/llama-v3p1-70b-instruct", 8000),
            ("accounts/fireworks/models/mixtral-8x7b-instruct", 6000),
        ],
    ),
    (
        "cerebras",
        "https://api.cerebras.ai/v1",
        &[("llama3.1-8b", 5000), ("llama3.3-70b", 8000), ("llama3.1-70b", 8000)],
    ),
    (
        "openrouter",
        "https://openrouter.ai/api/v1",
        &[
            ("meta-llama/llama-3.1-8b-instruct:free", 5000),
            ("microsoft/wizardlm-2-8x22b:free", 8000),
            ("google/gemma-2-9b-it:free", 6000),
            ("qwen/qwen-2.5-7b-instruct:free", 6000),
            ("anthropic/claude-3-haiku:beta", 8000),
            ("mistralai/mistral-7b-instruct:free", 6000),
            ("openchat/openchat-7b:free", 6000),
        ],
    ),
    (
        "xai",
        "https://api.x.ai/v1",
        &[("grok-beta", 10000), ("grok-vision-beta", 8000), ("grok-2-latest", 8000)],
    ),
    (
        "huggingface",
        "https://api-inference.huggingface.co/v1",
        &[
            ("microsoft/DialoGPT-large", 4000),
            ("google/flan-t5-large", 4000),
            ("bigscience/bloom-7b1", 5000),
            ("bigcode/starcoder", 8000),
        ],
    ),
    (
        "mistral",
        "https://api.mistral.ai/v1",
        &[
            ("mistral-tiny", 4000),
            ("mistral-small", 6000),
            ("mistral-medium", 8000),
            ("open-mistral-7b", 5000),
        ],
    ),
    (
        "replicate",
        "https://api.replicate.com/v1",
        &[
            ("meta/llama-2-70b-chat", 8000),
            ("meta/llama-2-13b-chat", 6000),
            ("meta/llama-2-7b-chat", 4000),
            ("mistralai/mixtral-8x7b-instruct-v0.1", 6000),
        ],
    ),
    (
        "perplexity",
        "https://api.perplexity.ai",
        &[
            ("llama-3.1-sonar-small-128k-online", 8000),
            ("llama-3.1-sonar-large-128k-online", 10000),
            ("llama-3.1-8b-instruct", 6000),
            ("llama-3.1-70b-instruct", 8000),
        ],
    ),
    (
        "anyscale",
        "https://api.endpoints.anyscale.com/v1",
        &[
            ("meta-llama/Llama-2-7b-chat-hf", 4000),
            ("meta-llama/Llama-2-13b-chat-hf", 6000),
            ("meta-llama/Llama-2-70b-chat-hf", 8000),
            ("codellama/CodeLlama-34b-Instruct-hf", 6000),
            ("mistralai/Mistral-7B-Instruct-v0.1", 6000),
        ],
    ),
    (
        "cohere",
        "https://api.cohere.ai/v1",
        &[("command", 4000), ("command-light", 3000), ("command-nightly", 5000), ("command-r", 6000)],
    ),
    (
        "anthropic",
        "https://api.anthropic.com/v1",
        &[
            ("claude-3-5-sonnet-20241022", 8000),
            ("claude-3-haiku-20240307", 6000),
            ("claude-3-opus-20240229", 8000),
            ("claude-3-sonnet-20240229", 8000),
        ],
    ),
    (
        "gemini",
        "https://generativelanguage.googleapis.com/v1beta/openai",
        &[
            ("gemini-1.5-flash", 8000),
            ("gemini-1.5-pro", 8000),
            ("gemini-pro", 6000),
        ],
    ),
    (
        "aleph",
        "https://api.aleph-alpha.com/v1",
        &[
            ("luminous-base", 4000),
            ("luminous-extended", 6000),
            ("luminous-supreme", 8000),
            ("luminous-supreme-control", 8000),
        ],
    ),
    (
        "stability",
        "https://api.stability.ai/v1",
        &[
            ("stable-code-instruct-3b", 6000),
            ("stablelm-2-1_6b", 4000),
            ("stablelm-2-12b", 6000),
            ("stable-beluga-7b", 6000),
        ],
    ),
    (
        "claude",
        "https://api.anthropic.com/v1",
        &[
            ("claude-3-5-sonnet-20241022", 8000),
            ("claude-3-haiku-20240307", 6000),
            ("claude-3-opus-20240229", 8000),
        ],
    ),
];

/// Read-only provider → model table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCatalog {
    providers: Vec<ProviderSpec>,
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderCatalog {
    pub fn builtin() -> Self {
        let providers = BUILTIN_PROVIDERS
            .iter()
            .map(|(name, base_url, models)| ProviderSpec {
                name: name.to_string(),
                base_url: base_url.to_string(),
                models: models
                    .iter()
                    .map(|(model, max_tokens)| ModelSpec {
                        name: model.to_string(),
                        max_tokens: *max_tokens,
                    })
                    .collect(),
            })
            .collect();
        Self { providers }
    }

    pub fn from_providers(providers: Vec<ProviderSpec>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[ProviderSpec] {
        &self.providers
    }

    pub fn get(&self, name: &str) -> Option<&ProviderSpec> {
        self.providers.iter().find(|p| p.name == name)
    }
}

/// Environment variable holding a provider's API key, e.g. `GROQ_API_KEY`.
pub fn api_key_variable(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_uppercase().replace('-', "_"))
}

/// API keys for the providers that have one. Keys are never printed.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: BTreeMap<String, String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("providers", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Credentials {
    pub fn from_env(catalog: &ProviderCatalog) -> Self {
        Self::from_lookup(catalog, |var| std::env::var(var).ok())
    }

    /// Build from any variable lookup. Empty or whitespace-only values count as absent.
    pub fn from_lookup(catalog: &ProviderCatalog, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let keys = catalog
            .providers()
            .iter()
            .filter_map(|provider| {
                let variable = api_key_variable(&provider.name);
                let value = lookup(&variable).filter(|v| !v.trim().is_empty())?;
                debug!(provider = %provider.name, variable = %variable, "Found API key");
                Some((provider.name.clone(), value))
            })
            .collect();
        Self { keys }
    }

    pub fn with_key(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.keys.insert(provider.into(), key.into());
        self
    }

    pub fn is_available(&self, provider: &str) -> bool {
        self.keys.contains_key(provider)
    }

    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.keys.get(provider).map(String::as_str)
    }
}

/// Output tokens requested for a model: 80% of its budget, never more than
/// [`MAX_OUTPUT_TOKENS`].
pub fn output_token_budget(max_tokens: u32) -> u32 {
    let scaled = (u64::from(max_tokens) * 4 / 5) as u32;
    scaled.min(MAX_OUTPUT_TOKENS)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAvailability {
    pub name: String,
    pub available: bool,
    pub model_count: usize,
}

pub fn availability(catalog: &ProviderCatalog, credentials: &Credentials) -> Vec<ProviderAvailability> {
    catalog
        .providers()
        .iter()
        .map(|p| ProviderAvailability {
            name: p.name.clone(),
            available: credentials.is_available(&p.name),
            model_count: p.models.len(),
        })
        .collect()
}

/// Expand credentialed providers into tasks, in catalog order.
///
/// `selected` restricts the plan to one provider, which must exist in the catalog.
pub fn plan_tasks(
    catalog: &ProviderCatalog,
    credentials: &Credentials,
    selected: Option<&str>,
) -> Result<Vec<GenerationTask>, PipelineError> {
    if let Some(name) = selected {
        if catalog.get(name).is_none() {
            return Err(PipelineError::UnknownProvider(name.to_string()));
        }
    }
    let tasks: Vec<GenerationTask> = catalog
        .providers()
        .iter()
        .filter(|p| selected.map_or(true, |name| p.name == name))
        .filter(|p| credentials.is_available(&p.name))
        .flat_map(|p| {
            p.models.iter().map(move |m| GenerationTask {
                provider_name: p.name.clone(),
                model_name: m.name.clone(),
                max_tokens: m.max_tokens,
            })
        })
        .collect();
    if tasks.is_empty() {
        return Err(PipelineError::NoProvidersAvailable);
    }
    info!(tasks = tasks.len(), "Planned generation tasks");
    Ok(tasks)
}
