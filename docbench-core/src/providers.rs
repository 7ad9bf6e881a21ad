//! Concrete [`Generator`] for providers that expose an OpenAI-compatible
//! `POST {base_url}/chat/completions` endpoint.
//!
//! HTTP outcomes are mapped onto [`GenerationError`] so the orchestrator can decide whether
//! to retry: 404 and "model does not exist" bodies become `ModelNotFound`, 429 is
//! `RateLimited`, 401/403 are `Authentication` and 5xx is `ServiceUnavailable`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

use crate::catalog::{Credentials, ProviderCatalog};
use crate::contract::{GenerationRequest, Generator};
use crate::error::GenerationError;

const TEMPERATURE: f32 = 0.3;
/// Longest slice of an error body kept in a failure message.
const MAX_ERROR_BODY_CHARS: usize = 300;

struct Endpoint {
    base_url: String,
    api_key: String,
}

pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    endpoints: BTreeMap<String, Endpoint>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    /// Wire up every credentialed provider in the catalog.
    pub fn new(catalog: &ProviderCatalog, credentials: &Credentials) -> Self {
        let endpoints: BTreeMap<String, Endpoint> = catalog
            .providers()
            .iter()
            .filter_map(|p| {
                credentials.api_key(&p.name).map(|key| {
                    (
                        p.name.clone(),
                        Endpoint {
                            base_url: p.base_url.trim_end_matches('/').to_string(),
                            api_key: key.to_string(),
                        },
                    )
                })
            })
            .collect();
        info!(providers = endpoints.len(), "Initialized generation client");
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }
}

#[async_trait]
impl Generator for OpenAiCompatibleClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let endpoint = self.endpoints.get(&request.provider).ok_or_else(|| {
            GenerationError::Authentication(format!("no API key configured for {}", request.provider))
        })?;
        let url = format!("{}/chat/completions", endpoint.base_url);
        let body = ChatRequest {
            model: &request.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_output_tokens,
            temperature: TEMPERATURE,
        };
        debug!(url = %url, model = %request.model, "Sending chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&endpoint.api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, &request))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(e, &request))?;
        if !status.is_success() {
            let failure = classify_failure(status, &text, &request.model);
            error!(status = status.as_u16(), error = %failure, "Provider returned an error");
            return Err(failure);
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GenerationError::InvalidResponse("response contained no text".into()))
    }
}

fn transport_error(err: reqwest::Error, request: &GenerationRequest) -> GenerationError {
    if err.is_timeout() {
        GenerationError::timeout(request.timeout)
    } else {
        GenerationError::Network(err.to_string())
    }
}

/// Map a non-success response onto the error taxonomy.
pub fn classify_failure(status: StatusCode, body: &str, model: &str) -> GenerationError {
    let lowered = body.to_lowercase();
    let excerpt = crate::ingest::truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS);
    if status == StatusCode::NOT_FOUND
        || lowered.contains("model_not_found")
        || lowered.contains("does not exist")
    {
        return GenerationError::ModelNotFound(model.to_string());
    }
    match status {
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(excerpt),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Authentication(excerpt),
        s if s.is_server_error() => GenerationError::ServiceUnavailable(format!("HTTP {}: {excerpt}", s.as_u16())),
        s => GenerationError::Http {
            status: s.as_u16(),
            message: excerpt,
        },
    }
}
