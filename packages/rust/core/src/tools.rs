//! Agent-facing adapters over the search backend.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use edd_agents::{AgentTool, ToolDefinition};
use edd_search::{DeepDiveRequest, DeepDiveTool, RiskCategory, SearchClient};
use edd_shared::{ApiKey, Query, Region, SearchResult};
use tracing::{debug, warn};

/// Text handed back to an agent for a search result.
fn tool_text(result: &SearchResult) -> String {
    match result {
        SearchResult::Success(report) => {
            let mut text = report.content.clone();
            if !report.citations.is_empty() {
                text.push_str("\n\nSources:");
                for (i, url) in report.citations.iter().enumerate() {
                    let _ = write!(text, "\n[{}] {url}", i + 1);
                }
            }
            text
        }
        SearchResult::Failure(failure) => format!("Error: {}", failure.message),
    }
}

// ---------------------------------------------------------------------------
// Broad search
// ---------------------------------------------------------------------------

/// Lets the research agent run the broad compliance search.
pub struct SearchAgentTool {
    client: SearchClient,
    region: Region,
    api_key: Option<ApiKey>,
}

impl SearchAgentTool {
    pub const NAME: &'static str = "compliance_search";

    pub fn new(client: SearchClient, region: Region, api_key: Option<ApiKey>) -> Self {
        Self {
            client,
            region,
            api_key,
        }
    }
}

#[async_trait]
impl AgentTool for SearchAgentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.into(),
            description: "Search the web for Enhanced Due Diligence (EDD) compliance checks. \
                Input is an entity or person name. Returns a compliance report with a risk \
                assessment and numbered sources."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The entity or person name to search for"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> String {
        let target = match &arguments {
            serde_json::Value::String(s) => s.as_str(),
            other => other["query"].as_str().unwrap_or_default(),
        };

        let query = match Query::new(target, self.region.clone()) {
            Ok(q) => q,
            Err(e) => return format!("Error: {e}"),
        };

        debug!(entity = %query.target(), "agent invoked compliance search");
        tool_text(&self.client.search(&query, self.api_key.as_ref()).await)
    }
}

// ---------------------------------------------------------------------------
// Deep dive
// ---------------------------------------------------------------------------

/// Lets the analysis agent request bounded, category-scoped follow-up research.
pub struct DeepDiveAgentTool {
    tool: DeepDiveTool,
    api_key: Option<ApiKey>,
    budget: u32,
    remaining: AtomicU32,
}

impl DeepDiveAgentTool {
    pub const NAME: &'static str = "deep_dive";

    pub fn new(tool: DeepDiveTool, api_key: Option<ApiKey>, budget: u32) -> Self {
        Self {
            tool,
            api_key,
            budget,
            remaining: AtomicU32::new(budget),
        }
    }

    /// Deep dives performed so far.
    pub fn used(&self) -> u32 {
        self.budget - self.remaining.load(Ordering::SeqCst)
    }

    fn take_budget(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl AgentTool for DeepDiveAgentTool {
    fn definition(&self) -> ToolDefinition {
        let categories: Vec<&str> = RiskCategory::STANDARD.iter().map(|c| c.label()).collect();

        ToolDefinition {
            name: Self::NAME.into(),
            description: "If not enough information has been collected or doubts remain, run \
                a focused search on one compliance category for one entity or person. Provide \
                region, compliance category, entity/person name, and a specific search prompt."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "region": {
                        "type": "string",
                        "description": "Two-letter country code of the individual or business (default AE)"
                    },
                    "compliance_category": {
                        "type": "string",
                        "description": format!("Compliance category to investigate, e.g. one of: {}", categories.join("; "))
                    },
                    "individual_business_name": {
                        "type": "string",
                        "description": "The name of the individual or business"
                    },
                    "perplexity_search_prompt": {
                        "type": "string",
                        "description": "What specifically to look for"
                    }
                },
                "required": ["compliance_category", "individual_business_name", "perplexity_search_prompt"]
            }),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> String {
        let request = match DeepDiveRequest::from_tool_args(arguments) {
            Ok(r) => r,
            Err(e) => return format!("Error: {e}"),
        };

        if !self.take_budget() {
            warn!(budget = self.budget, "deep dive budget exhausted");
            return format!(
                "Error: deep dive budget exhausted ({} per analysis). Conclude with the \
                 information already gathered and state any remaining gaps explicitly.",
                self.budget
            );
        }

        debug!(
            entity = %request.target(),
            category = %request.category(),
            "agent invoked deep dive"
        );
        tool_text(&self.tool.deep_dive(&request, self.api_key.as_ref()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edd_search::SearchEndpoint;
    use edd_shared::{FailureKind, SearchReport, TokenCount};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(server: &MockServer) -> SearchEndpoint {
        SearchEndpoint::new(format!("{}/chat/completions", server.uri()), Duration::from_secs(5))
            .unwrap()
    }

    async fn answering_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "Findings [1]" } }],
                "citations": ["https://a.example"]
            })))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn tool_text_lists_sources_in_order() {
        let text = tool_text(&SearchResult::Success(SearchReport {
            content: "body".into(),
            citations: vec!["https://a.example".into(), "https://b.example".into()],
            model: "sonar".into(),
            token_count: TokenCount(None),
        }));
        assert_eq!(text, "body\n\nSources:\n[1] https://a.example\n[2] https://b.example");

        let text = tool_text(&SearchResult::failure(FailureKind::Transport, "refused"));
        assert_eq!(text, "Error: refused");
    }

    #[tokio::test]
    async fn test_search_tool_accepts_object_or_string() {
        let server = answering_server().await;
        let tool = SearchAgentTool::new(
            SearchClient::new(endpoint(&server), "sonar"),
            Region::default(),
            ApiKey::new("k"),
        );

        let out = tool.invoke(serde_json::json!({"query": "Acme"})).await;
        assert!(out.starts_with("Findings [1]"));
        assert!(out.contains("[1] https://a.example"));

        let out = tool.invoke(serde_json::json!("Acme")).await;
        assert!(out.starts_with("Findings"));

        let out = tool.invoke(serde_json::json!({"query": "  "})).await;
        assert!(out.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_deep_dive_budget_is_enforced() {
        let server = answering_server().await;
        let tool = DeepDiveAgentTool::new(
            DeepDiveTool::new(endpoint(&server), "sonar-pro"),
            ApiKey::new("k"),
            1,
        );
        let args = serde_json::json!({
            "compliance_category": "Sanctions",
            "individual_business_name": "Acme",
            "perplexity_search_prompt": "OFAC?"
        });

        let first = tool.invoke(args.clone()).await;
        assert!(first.starts_with("Findings"));

        let second = tool.invoke(args).await;
        assert!(second.contains("budget exhausted"));
        assert_eq!(tool.used(), 1);
    }

    #[tokio::test]
    async fn test_deep_dive_invalid_args_do_not_consume_budget() {
        let server = MockServer::start().await;
        let tool = DeepDiveAgentTool::new(
            DeepDiveTool::new(endpoint(&server), "sonar-pro"),
            ApiKey::new("k"),
            2,
        );

        let out = tool.invoke(serde_json::json!({"region": "AE"})).await;
        assert!(out.starts_with("Error: invalid deep-dive request"));
        assert_eq!(tool.used(), 0);
    }
}
