//! Progress callbacks for long-running research requests.

use edd_shared::BackendOutcome;

use crate::pipeline::PipelineState;

/// The two independent research backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    AgentPipeline,
    DirectSearch,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::AgentPipeline => "agent pipeline",
            Self::DirectSearch => "direct search",
        })
    }
}

/// Progress callback for reporting dispatch status.
pub trait DispatchProgress: Send + Sync {
    /// Called when a requested backend begins running.
    fn backend_started(&self, backend: Backend);
    /// Called once per backend with its final outcome, skipped ones included.
    fn backend_finished(&self, backend: Backend, outcome: &BackendOutcome);
    /// Called on every pipeline state transition.
    fn pipeline_state(&self, state: PipelineState);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl DispatchProgress for SilentProgress {
    fn backend_started(&self, _backend: Backend) {}
    fn backend_finished(&self, _backend: Backend, _outcome: &BackendOutcome) {}
    fn pipeline_state(&self, _state: PipelineState) {}
}
