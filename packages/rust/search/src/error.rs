use edd_shared::{FailureKind, SearchFailure, SearchResult};

/// Failure of a single search request. Converted into
/// [`SearchResult::Failure`] before leaving this crate's public calls.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search API key not configured; set the key env var or pass an override")]
    MissingApiKey,

    #[error("{0}")]
    Transport(String),

    /// `message` already carries the status line and any decoded body detail.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("failed to decode search response: {0}")]
    Decode(String),

    #[error("No results found")]
    NoResults,

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("invalid deep-dive request: {0}")]
    InvalidRequest(String),
}

impl SearchError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::MissingApiKey => FailureKind::MissingCredentials,
            Self::Transport(_) | Self::Client(_) => FailureKind::Transport,
            Self::Upstream { .. } => FailureKind::Upstream,
            Self::Decode(_) | Self::NoResults | Self::InvalidRequest(_) => FailureKind::Decode,
        }
    }
}

impl From<SearchError> for SearchResult {
    fn from(err: SearchError) -> Self {
        let status = match &err {
            SearchError::Upstream { status, .. } => Some(*status),
            _ => None,
        };
        SearchResult::Failure(SearchFailure {
            kind: err.kind(),
            message: err.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_keeps_status() {
        let result = SearchResult::from(SearchError::Upstream {
            status: 429,
            message: "429 Too Many Requests".into(),
        });
        match result {
            SearchResult::Failure(f) => {
                assert_eq!(f.kind, FailureKind::Upstream);
                assert_eq!(f.status, Some(429));
                assert_eq!(f.message, "429 Too Many Requests");
            }
            SearchResult::Success(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn missing_key_is_its_own_kind() {
        let result = SearchResult::from(SearchError::MissingApiKey);
        assert!(matches!(
            result,
            SearchResult::Failure(SearchFailure {
                kind: FailureKind::MissingCredentials,
                ..
            })
        ));
    }
}
