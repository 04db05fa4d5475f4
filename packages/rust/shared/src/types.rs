//! Request-scoped domain types.
//!
//! Every value here lives for one orchestration call; none is persisted or
//! shared across concurrent requests.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{EddError, Result};

/// Region used when the caller does not supply one.
pub const DEFAULT_REGION: &str = "AE";

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Two-letter ISO 3166 country code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    /// Parse and normalise a country code (`"ae"` → `"AE"`).
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(EddError::validation(format!(
                "region must be a two-letter country code, got '{raw}'"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Region {
    fn default() -> Self {
        Self(DEFAULT_REGION.to_string())
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Region {
    type Error = EddError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A validated research target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    target: String,
    region: Region,
}

impl Query {
    /// Build a query, rejecting targets that are empty after trimming.
    pub fn new(target: &str, region: Region) -> Result<Self> {
        let target = target.trim();
        if target.is_empty() {
            return Err(EddError::validation("query must not be empty"));
        }
        Ok(Self {
            target: target.to_string(),
            region,
        })
    }

    /// Person, company, or topic name being researched.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn region(&self) -> &Region {
        &self.region
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which backends a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    AgentPipeline,
    DirectSearch,
    Both,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgentPipeline => "agent_pipeline",
            Self::DirectSearch => "direct_search",
            Self::Both => "both",
        }
    }

    /// Whether the agent pipeline is requested.
    pub fn runs_pipeline(&self) -> bool {
        matches!(self, Self::AgentPipeline | Self::Both)
    }

    /// Whether the direct search is requested.
    pub fn runs_search(&self) -> bool {
        matches!(self, Self::DirectSearch | Self::Both)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = EddError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "agent_pipeline" | "crewai" => Ok(Self::AgentPipeline),
            "direct_search" | "perplexity" => Ok(Self::DirectSearch),
            "both" => Ok(Self::Both),
            other => Err(EddError::validation(format!(
                "unknown mode '{other}' (expected agent_pipeline, direct_search, or both)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SearchResult
// ---------------------------------------------------------------------------

/// Token usage reported by the search backend; `N/A` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenCount(pub Option<u64>);

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{n}"),
            None => f.write_str("N/A"),
        }
    }
}

impl Serialize for TokenCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_str("N/A"),
        }
    }
}

/// Parsed output of a successful search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    /// Narrative text of the first completion.
    pub content: String,
    /// Source URLs in the order the backend cited them.
    pub citations: Vec<String>,
    /// Model identifier reported by the backend (`N/A` when absent).
    pub model: String,
    pub token_count: TokenCount,
}

/// Why a search failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network error or timeout before a response arrived.
    Transport,
    /// Non-2xx HTTP status.
    Upstream,
    /// 2xx response that could not be decoded or carried no completion.
    Decode,
    /// No API key could be resolved for the request.
    MissingCredentials,
}

/// A failed search, with the message surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchFailure {
    pub kind: FailureKind,
    pub message: String,
    /// HTTP status for [`FailureKind::Upstream`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Outcome of one search or deep-dive call. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchResult {
    Success(SearchReport),
    Failure(SearchFailure),
}

impl SearchResult {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(SearchFailure {
            kind,
            message: message.into(),
            status: None,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn report(&self) -> Option<&SearchReport> {
        match self {
            Self::Success(report) => Some(report),
            Self::Failure(_) => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(&f.message),
        }
    }
}

impl From<SearchFailure> for EddError {
    fn from(failure: SearchFailure) -> Self {
        match failure.kind {
            FailureKind::Transport => EddError::Transport(failure.message),
            FailureKind::Upstream => EddError::Upstream {
                status: failure.status.unwrap_or_default(),
                message: failure.message,
            },
            FailureKind::Decode => EddError::Decode(failure.message),
            FailureKind::MissingCredentials => EddError::config(failure.message),
        }
    }
}

// ---------------------------------------------------------------------------
// StageOutput
// ---------------------------------------------------------------------------

/// Text produced by a pipeline stage. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StageOutput(String);

impl StageOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// BackendOutcome / AggregatedResponse
// ---------------------------------------------------------------------------

/// Why a backend did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    #[serde(rename = "not requested")]
    NotRequested,
    #[serde(rename = "framework unavailable")]
    FrameworkUnavailable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotRequested => "not requested",
            Self::FrameworkUnavailable => "framework unavailable",
        })
    }
}

/// What a backend that ran produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendResult {
    /// Final text of the agent pipeline.
    StageOutput(StageOutput),
    /// Parsed direct-search result (success or failure).
    Search(SearchResult),
    /// The backend ran and failed before producing a result.
    Error(String),
}

/// Per-backend slot of the aggregated response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendOutcome {
    pub ran: bool,
    pub result: Option<BackendResult>,
    pub skipped_reason: Option<SkipReason>,
}

impl BackendOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            ran: false,
            result: None,
            skipped_reason: Some(reason),
        }
    }

    pub fn stage_output(output: StageOutput) -> Self {
        Self::ran(BackendResult::StageOutput(output))
    }

    pub fn search(result: SearchResult) -> Self {
        Self::ran(BackendResult::Search(result))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::ran(BackendResult::Error(message.into()))
    }

    fn ran(result: BackendResult) -> Self {
        Self {
            ran: true,
            result: Some(result),
            skipped_reason: None,
        }
    }

    /// Error text when the backend ran and failed.
    pub fn error_message(&self) -> Option<&str> {
        match &self.result {
            Some(BackendResult::Error(message)) => Some(message),
            Some(BackendResult::Search(result)) => result.failure_message(),
            _ => None,
        }
    }
}

/// The single object returned to the caller. Both slots are always filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedResponse {
    pub pipeline_outcome: BackendOutcome,
    pub search_outcome: BackendOutcome,
    pub mode: Mode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_trims_and_rejects_empty() {
        let q = Query::new("  Acme Holdings  ", Region::default()).unwrap();
        assert_eq!(q.target(), "Acme Holdings");
        assert_eq!(q.region().as_str(), "AE");

        let err = Query::new("   \t", Region::default()).unwrap_err();
        assert!(matches!(err, EddError::Validation { .. }));
    }

    #[test]
    fn region_normalises_case() {
        assert_eq!(Region::parse("gb").unwrap().as_str(), "GB");
        assert!(Region::parse("GBR").is_err());
        assert!(Region::parse("1A").is_err());
        assert!(Region::parse("").is_err());
    }

    #[test]
    fn mode_parses_canonical_names_and_aliases() {
        assert_eq!("both".parse::<Mode>().unwrap(), Mode::Both);
        assert_eq!("crewai".parse::<Mode>().unwrap(), Mode::AgentPipeline);
        assert_eq!("perplexity".parse::<Mode>().unwrap(), Mode::DirectSearch);
        assert_eq!("direct-search".parse::<Mode>().unwrap(), Mode::DirectSearch);
        assert!("all".parse::<Mode>().is_err());
    }

    #[test]
    fn mode_backend_selection() {
        assert!(Mode::Both.runs_pipeline() && Mode::Both.runs_search());
        assert!(!Mode::DirectSearch.runs_pipeline());
        assert!(!Mode::AgentPipeline.runs_search());
    }

    #[test]
    fn token_count_serializes_sentinel() {
        let json = serde_json::to_value(TokenCount(None)).unwrap();
        assert_eq!(json, serde_json::json!("N/A"));
        let json = serde_json::to_value(TokenCount(Some(42))).unwrap();
        assert_eq!(json, serde_json::json!(42));
    }

    #[test]
    fn search_success_serializes_content_key() {
        let result = SearchResult::Success(SearchReport {
            content: "clear".into(),
            citations: vec![],
            model: "sonar".into(),
            token_count: TokenCount(Some(10)),
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "success");
        assert_eq!(json["content"], "clear");
        assert_eq!(json["citations"], serde_json::json!([]));
    }

    #[test]
    fn skipped_outcome_shape() {
        let outcome = BackendOutcome::skipped(SkipReason::NotRequested);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["ran"], false);
        assert_eq!(json["skipped_reason"], "not requested");
        assert!(json["result"].is_null());
    }

    #[test]
    fn outcome_error_message_covers_both_failure_shapes() {
        let failed = BackendOutcome::failed("boom");
        assert_eq!(failed.error_message(), Some("boom"));

        let search_failed =
            BackendOutcome::search(SearchResult::failure(FailureKind::Transport, "refused"));
        assert_eq!(search_failed.error_message(), Some("refused"));
        assert!(search_failed.ran);

        let ok = BackendOutcome::stage_output(StageOutput::new("report"));
        assert_eq!(ok.error_message(), None);
    }

    #[test]
    fn search_failure_maps_to_error_kind() {
        let failure = SearchFailure {
            kind: FailureKind::Upstream,
            message: "401 Unauthorized".into(),
            status: Some(401),
        };
        match EddError::from(failure) {
            EddError::Upstream { status, .. } => assert_eq!(status, 401),
            other => panic!("expected Upstream, got {other:?}"),
        }
    }
}
