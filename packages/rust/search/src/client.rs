//! Broad compliance search against the search endpoint.

use std::time::Duration;

use edd_shared::{
    ApiKey, Query, SearchConfig, SearchReport, SearchResult, TokenCount, error_chain,
};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::error::SearchError;
use crate::prompt;
use crate::wire::{CompletionResponse, SearchContextSize, SearchPayload};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("edd-research/", env!("CARGO_PKG_VERSION"));

/// Placeholder for metadata the backend did not report.
const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// SearchEndpoint
// ---------------------------------------------------------------------------

/// HTTP transport shared by [`SearchClient`] and
/// [`DeepDiveTool`](crate::DeepDiveTool). Cheap to clone.
#[derive(Debug, Clone)]
pub struct SearchEndpoint {
    http: Client,
    url: String,
}

impl SearchEndpoint {
    /// Build a reqwest client with appropriate settings.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Client(e.to_string()))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Send one payload and parse the answer.
    pub(crate) async fn execute(
        &self,
        payload: &SearchPayload,
        api_key: Option<&ApiKey>,
    ) -> Result<SearchReport, SearchError> {
        let api_key = api_key.ok_or(SearchError::MissingApiKey)?;

        debug!(
            url = %self.url,
            model = %payload.model,
            context = ?payload.web_search_options.search_context_size,
            "sending search request"
        );

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key.expose())
            .json(payload)
            .send()
            .await
            .map_err(|e| SearchError::Transport(error_chain(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                SearchError::Transport(format!("failed to read body: {}", error_chain(&e)))
            })?;

        debug!(%status, bytes = body.len(), "search response received");

        if !status.is_success() {
            return Err(upstream_error(status, &self.url, &body));
        }

        parse_report(&body)
    }
}

/// Status description plus decoded body detail; detail is dropped silently
/// when the body is not JSON.
fn upstream_error(status: reqwest::StatusCode, url: &str, body: &str) -> SearchError {
    let mut message = format!("{status} for url: {url}");
    if let Ok(detail) = serde_json::from_str::<serde_json::Value>(body) {
        message.push_str(&format!(" - Details: {detail}"));
    }
    SearchError::Upstream {
        status: status.as_u16(),
        message,
    }
}

fn parse_report(body: &str) -> Result<SearchReport, SearchError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Decode(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(SearchError::NoResults)?;

    Ok(SearchReport {
        content,
        citations: response.citations.unwrap_or_default(),
        model: response.model.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        token_count: TokenCount(response.usage.and_then(|u| u.total_tokens)),
    })
}

// ---------------------------------------------------------------------------
// SearchClient
// ---------------------------------------------------------------------------

/// Stateless wrapper around the broad compliance search.
#[derive(Debug, Clone)]
pub struct SearchClient {
    endpoint: SearchEndpoint,
    model: String,
}

impl SearchClient {
    pub fn new(endpoint: SearchEndpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self::new(SearchEndpoint::from_config(config)?, &config.model))
    }

    /// The exact body [`search`](Self::search) sends for `query`.
    pub fn build_payload(&self, query: &Query) -> SearchPayload {
        SearchPayload::new(
            &self.model,
            prompt::compliance_prompt(query.target()),
            SearchContextSize::Medium,
            query.region().as_str(),
        )
    }

    /// Run one compliance search. Never fails as a Rust error: transport,
    /// HTTP, and decode problems come back as `SearchResult::Failure`.
    #[instrument(skip_all, fields(entity = %query.target(), region = %query.region()))]
    pub async fn search(&self, query: &Query, api_key: Option<&ApiKey>) -> SearchResult {
        let payload = self.build_payload(query);

        match self.endpoint.execute(&payload, api_key).await {
            Ok(report) => {
                info!(
                    citations = report.citations.len(),
                    tokens = %report.token_count,
                    "compliance search complete"
                );
                SearchResult::Success(report)
            }
            Err(e) => {
                warn!(error = %e, "compliance search failed");
                e.into()
            }
        }
    }
}
