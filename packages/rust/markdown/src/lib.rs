//! Markdown rendering for EDD research results.
//!
//! Turns a [`SearchReport`] or a whole [`AggregatedResponse`] into a
//! Markdown document: inline citation markers become links, model output is
//! tidied to nest under the report's own headings, and every backend slot
//! renders as content, an error, or an explicit placeholder.

mod citations;
mod cleanup;

use std::fmt::Write as _;

use edd_shared::{
    AggregatedResponse, BackendOutcome, BackendResult, SearchReport, SearchResult, SkipReason,
};
use tracing::{debug, instrument};

pub use citations::substitute_citations;

/// Heading level of the per-backend sections.
const SECTION_LEVEL: usize = 2;

/// Heading of the agent pipeline section.
pub const PIPELINE_SECTION: &str = "AI Analysis";

/// Heading of the direct search section.
pub const SEARCH_SECTION: &str = "EDD Compliance Report";

// ---------------------------------------------------------------------------
// Search report
// ---------------------------------------------------------------------------

/// Render one search report: content with linked citations, then a
/// metadata block (model, tokens, numbered citation list).
pub fn render_search_report(report: &SearchReport) -> String {
    let body = substitute_citations(&report.content, &report.citations);
    let mut md = cleanup::run_pipeline(&body, SECTION_LEVEL);

    md.push_str("\n\n### Response Metadata\n\n");
    let _ = writeln!(md, "- **Model:** {}", report.model);
    let _ = writeln!(md, "- **Tokens Used:** {}", report.token_count);

    if !report.citations.is_empty() {
        md.push_str("\n#### Citations\n\n");
        for (i, url) in report.citations.iter().enumerate() {
            let _ = writeln!(md, "{}. [{url}]({url})", i + 1);
        }
    }

    md.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Aggregated response
// ---------------------------------------------------------------------------

/// Render the full response for `target`, one section per backend.
#[instrument(skip_all, fields(mode = %response.mode))]
pub fn render_response(target: &str, response: &AggregatedResponse) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# EDD Research: {}\n", target.trim());
    let _ = writeln!(md, "_Mode: {}_\n", response.mode);

    let _ = writeln!(md, "## {PIPELINE_SECTION}\n");
    let _ = writeln!(md, "{}\n", render_pipeline_slot(&response.pipeline_outcome));

    let _ = writeln!(md, "## {SEARCH_SECTION}\n");
    let _ = writeln!(md, "{}", render_search_slot(&response.search_outcome));

    debug!(chars = md.len(), "rendered research report");
    cleanup::ensure_trailing_newline(&md)
}

fn render_pipeline_slot(outcome: &BackendOutcome) -> String {
    if let Some(reason) = outcome.skipped_reason {
        return match reason {
            SkipReason::NotRequested => "_Agent analysis not requested in this mode._".into(),
            SkipReason::FrameworkUnavailable => {
                "_Agent framework is not available in this process. Use direct search mode._"
                    .into()
            }
        };
    }

    match &outcome.result {
        Some(BackendResult::StageOutput(output)) => {
            cleanup::run_pipeline(output.as_str(), SECTION_LEVEL)
        }
        Some(BackendResult::Error(message)) => {
            format!("**Error:** agent analysis failed: {message}")
        }
        Some(BackendResult::Search(result)) => render_search_result(result),
        None => "_No output._".into(),
    }
}

fn render_search_slot(outcome: &BackendOutcome) -> String {
    if let Some(reason) = outcome.skipped_reason {
        return match reason {
            SkipReason::NotRequested => "_Compliance search not requested in this mode._".into(),
            SkipReason::FrameworkUnavailable => "_Compliance search unavailable._".into(),
        };
    }

    match &outcome.result {
        Some(BackendResult::Search(result)) => render_search_result(result),
        Some(BackendResult::Error(message)) => format!("**Error:** {message}"),
        Some(BackendResult::StageOutput(output)) => {
            cleanup::run_pipeline(output.as_str(), SECTION_LEVEL)
        }
        None => "_No output._".into(),
    }
}

fn render_search_result(result: &SearchResult) -> String {
    match result {
        SearchResult::Success(report) => render_search_report(report),
        SearchResult::Failure(failure) => format!("**Error:** {}", failure.message),
    }
}
