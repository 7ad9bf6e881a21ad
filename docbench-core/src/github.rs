//! Concrete [`RepositoryClient`] for the GitHub contents API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::contract::{DirectoryListing, RemoteEntry, RepositoryClient};
use crate::error::RemoteError;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, token)
    }

    /// Point the client at another API root (GitHub Enterprise, or a test server).
    pub fn with_api_base(api_base: impl Into<String>, token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        info!(authenticated = token.is_some(), "Initialized GitHub client");
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Reads `GITHUB_TOKEN`; an unset or empty token means anonymous access.
    pub fn from_env() -> Self {
        Self::new(std::env::var("GITHUB_TOKEN").ok())
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, RemoteError> {
        let mut request = self
            .http
            .get(url)
            .header(USER_AGENT, concat!("docbench/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        debug!(url = %url, status = status.as_u16(), "GitHub request failed");
        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(RemoteError::RateLimited(format!("HTTP {}", status.as_u16())))
            }
            s => Err(RemoteError::Status {
                status: s.as_u16(),
                message: crate::ingest::truncate_chars(message.trim(), 200),
            }),
        }
    }
}

fn rate_limit_remaining(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(RATE_LIMIT_REMAINING)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl RepositoryClient for GithubClient {
    fn contents_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{owner}/{repo}/contents", self.api_base)
    }

    async fn list_directory(&self, url: &str) -> Result<DirectoryListing, RemoteError> {
        let response = self.get(url).await?;
        let rate_limit_remaining = rate_limit_remaining(response.headers());
        let entries: Vec<RemoteEntry> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        debug!(url = %url, entries = entries.len(), rate_limit_remaining, "Listed directory");
        Ok(DirectoryListing {
            entries,
            rate_limit_remaining,
        })
    }

    async fn fetch_file(&self, url: &str) -> Result<String, RemoteError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}
