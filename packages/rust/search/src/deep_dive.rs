//! Category-scoped follow-up search.

use edd_shared::{ApiKey, Region, SearchResult};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::category::RiskCategory;
use crate::client::SearchEndpoint;
use crate::error::SearchError;
use crate::prompt;
use crate::wire::{SearchContextSize, SearchPayload};

/// A validated deep-dive request.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepDiveRequest {
    region: Region,
    category: RiskCategory,
    target: String,
    sub_prompt: String,
}

/// Loosely-typed arguments as an agent supplies them.
#[derive(Debug, Deserialize)]
struct DeepDiveArgs {
    #[serde(default)]
    region: Option<String>,
    compliance_category: String,
    individual_business_name: String,
    perplexity_search_prompt: String,
}

impl DeepDiveRequest {
    pub fn new(
        region: Region,
        category: RiskCategory,
        target: &str,
        sub_prompt: &str,
    ) -> Result<Self, SearchError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(SearchError::InvalidRequest(
                "target name must not be empty".into(),
            ));
        }
        let sub_prompt = sub_prompt.trim();
        if sub_prompt.is_empty() {
            return Err(SearchError::InvalidRequest(
                "search prompt must not be empty".into(),
            ));
        }

        Ok(Self {
            region,
            category,
            target: target.to_string(),
            sub_prompt: sub_prompt.to_string(),
        })
    }

    /// Decode and validate tool-call arguments. A missing region defaults to `AE`.
    pub fn from_tool_args(args: serde_json::Value) -> Result<Self, SearchError> {
        let args: DeepDiveArgs = serde_json::from_value(args)
            .map_err(|e| SearchError::InvalidRequest(e.to_string()))?;

        let region = match args.region.as_deref().map(str::trim) {
            None | Some("") => Region::default(),
            Some(raw) => {
                Region::parse(raw).map_err(|e| SearchError::InvalidRequest(e.to_string()))?
            }
        };
        let category = RiskCategory::parse(&args.compliance_category).ok_or_else(|| {
            SearchError::InvalidRequest("compliance category must not be empty".into())
        })?;

        Self::new(
            region,
            category,
            &args.individual_business_name,
            &args.perplexity_search_prompt,
        )
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn category(&self) -> &RiskCategory {
        &self.category
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn sub_prompt(&self) -> &str {
        &self.sub_prompt
    }
}

/// Narrow, more exhaustive variant of [`SearchClient`](crate::SearchClient).
#[derive(Debug, Clone)]
pub struct DeepDiveTool {
    endpoint: SearchEndpoint,
    model: String,
}

impl DeepDiveTool {
    pub fn new(endpoint: SearchEndpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }

    pub fn build_payload(&self, request: &DeepDiveRequest) -> SearchPayload {
        SearchPayload::new(
            &self.model,
            prompt::deep_dive_prompt(&request.category, &request.target, &request.sub_prompt),
            SearchContextSize::High,
            request.region.as_str(),
        )
    }

    /// Run one deep dive. Failures degrade to `SearchResult::Failure`.
    #[instrument(skip_all, fields(entity = %request.target, category = %request.category))]
    pub async fn deep_dive(&self, request: &DeepDiveRequest, api_key: Option<&ApiKey>) -> SearchResult {
        let payload = self.build_payload(request);

        match self.endpoint.execute(&payload, api_key).await {
            Ok(report) => {
                info!(citations = report.citations.len(), "deep dive complete");
                SearchResult::Success(report)
            }
            Err(e) => {
                warn!(error = %e, "deep dive failed");
                e.into()
            }
        }
    }
}
