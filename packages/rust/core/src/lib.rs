//! Core orchestration for EDD research.
//!
//! This crate ties the search client and the agent framework together: the
//! two-stage agent [`Pipeline`] (research, then analysis) and the
//! [`Dispatcher`] that runs it and/or the direct search per request mode.

pub mod backends;
pub mod dispatcher;
pub mod pipeline;
pub mod progress;
pub mod stages;
pub mod tools;

pub use backends::{AgentPipelineBackend, DirectSearchBackend, PipelineBackend, SearchBackend};
pub use dispatcher::{Dispatcher, ResearchRequest};
pub use pipeline::{Pipeline, PipelineError, PipelineState};
pub use progress::{Backend, DispatchProgress, SilentProgress};
