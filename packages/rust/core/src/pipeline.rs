//! Two-stage agent pipeline: query → research → analysis → report.

use std::time::{Duration, Instant};

use edd_agents::AgentError;
use edd_shared::{EddError, Query, StageOutput};
use tracing::{error, info, instrument};

use crate::progress::DispatchProgress;
use crate::stages::{AnalysisStage, ResearchStage};

/// Default wall-clock bound for one pipeline run.
pub const DEFAULT_PIPELINE_TIMEOUT: Duration = Duration::from_secs(600);

/// Where a pipeline run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Researching,
    Analyzing,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "not started",
            Self::Researching => "researching",
            Self::Analyzing => "analyzing",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Why a pipeline run did not produce a report.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("research stage failed: {0}")]
    Research(#[source] AgentError),

    #[error("analysis stage failed: {0}")]
    Analysis(#[source] AgentError),

    #[error("pipeline exceeded its {secs}s deadline while {stage}")]
    Timeout { secs: u64, stage: PipelineState },

    #[error("agent model could not be set up: {0}")]
    Setup(#[source] AgentError),
}

impl From<PipelineError> for EddError {
    fn from(err: PipelineError) -> Self {
        match &err {
            PipelineError::Setup(AgentError::MissingApiKey) => {
                EddError::BackendUnavailable(err.to_string())
            }
            _ => EddError::Pipeline(err.to_string()),
        }
    }
}

/// Research then analysis, strictly in that order, under one deadline.
pub struct Pipeline {
    research: Box<dyn ResearchStage>,
    analysis: Box<dyn AnalysisStage>,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(research: Box<dyn ResearchStage>, analysis: Box<dyn AnalysisStage>) -> Self {
        Self {
            research,
            analysis,
            timeout: DEFAULT_PIPELINE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run both stages. Analysis only starts after research succeeded and
    /// receives its output; the final output is the analysis output.
    #[instrument(skip_all, fields(entity = %query.target(), region = %query.region()))]
    pub async fn run(
        &self,
        query: &Query,
        progress: &dyn DispatchProgress,
    ) -> Result<StageOutput, PipelineError> {
        let start = Instant::now();
        // A deadline too far out to represent means no deadline at all.
        let deadline = tokio::time::Instant::now().checked_add(self.timeout);
        progress.pipeline_state(PipelineState::NotStarted);

        // --- Stage 1: Research ---
        progress.pipeline_state(PipelineState::Researching);
        let findings = match before(deadline, self.research.research(query)).await {
            Some(Ok(findings)) => findings,
            Some(Err(e)) => return Err(self.fail(progress, PipelineError::Research(e))),
            None => return Err(self.fail(progress, self.timed_out(PipelineState::Researching))),
        };
        info!(chars = findings.as_str().len(), "research stage complete");

        // --- Stage 2: Analysis ---
        progress.pipeline_state(PipelineState::Analyzing);
        let report = match before(deadline, self.analysis.analyze(query, &findings)).await {
            Some(Ok(report)) => report,
            Some(Err(e)) => return Err(self.fail(progress, PipelineError::Analysis(e))),
            None => return Err(self.fail(progress, self.timed_out(PipelineState::Analyzing))),
        };

        progress.pipeline_state(PipelineState::Done);
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = report.as_str().len(),
            "pipeline complete"
        );
        Ok(report)
    }

    fn timed_out(&self, stage: PipelineState) -> PipelineError {
        PipelineError::Timeout {
            secs: self.timeout.as_secs(),
            stage,
        }
    }

    fn fail(&self, progress: &dyn DispatchProgress, err: PipelineError) -> PipelineError {
        error!(error = %err, "pipeline failed");
        progress.pipeline_state(PipelineState::Failed);
        err
    }
}

/// Run `fut` until `deadline`; `None` once the deadline passes first.
async fn before<F: Future>(deadline: Option<tokio::time::Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Backend;
    use async_trait::async_trait;
    use edd_shared::{BackendOutcome, Region};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingProgress {
        states: Mutex<Vec<PipelineState>>,
    }

    impl DispatchProgress for RecordingProgress {
        fn backend_started(&self, _backend: Backend) {}
        fn backend_finished(&self, _backend: Backend, _outcome: &BackendOutcome) {}
        fn pipeline_state(&self, state: PipelineState) {
            self.states.lock().unwrap().push(state);
        }
    }

    struct FixedResearch(Result<&'static str, AgentError>);

    #[async_trait]
    impl ResearchStage for FixedResearch {
        async fn research(&self, _query: &Query) -> Result<StageOutput, AgentError> {
            self.0.clone().map(StageOutput::new)
        }
    }

    struct SlowResearch;

    #[async_trait]
    impl ResearchStage for SlowResearch {
        async fn research(&self, _query: &Query) -> Result<StageOutput, AgentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(StageOutput::new("late"))
        }
    }

    #[derive(Default)]
    struct EchoAnalysis {
        calls: AtomicUsize,
        seen: Mutex<Option<String>>,
    }

    #[async_trait]
    impl AnalysisStage for std::sync::Arc<EchoAnalysis> {
        async fn analyze(
            &self,
            _query: &Query,
            findings: &StageOutput,
        ) -> Result<StageOutput, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some(findings.as_str().to_string());
            Ok(StageOutput::new(format!("analysis of {}", findings.as_str())))
        }
    }

    struct FailingAnalysis;

    #[async_trait]
    impl AnalysisStage for FailingAnalysis {
        async fn analyze(
            &self,
            _query: &Query,
            _findings: &StageOutput,
        ) -> Result<StageOutput, AgentError> {
            Err(AgentError::Transport("model unreachable".into()))
        }
    }

    struct SlowAnalysis;

    #[async_trait]
    impl AnalysisStage for SlowAnalysis {
        async fn analyze(
            &self,
            _query: &Query,
            _findings: &StageOutput,
        ) -> Result<StageOutput, AgentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(StageOutput::new("late"))
        }
    }

    fn query() -> Query {
        Query::new("Acme Holdings", Region::default()).unwrap()
    }

    #[tokio::test]
    async fn test_analysis_consumes_research_output() {
        let analysis = std::sync::Arc::new(EchoAnalysis::default());
        let pipeline = Pipeline::new(
            Box::new(FixedResearch(Ok("raw findings"))),
            Box::new(analysis.clone()),
        );
        let progress = RecordingProgress::default();

        let out = pipeline.run(&query(), &progress).await.unwrap();

        assert_eq!(out.as_str(), "analysis of raw findings");
        assert_eq!(analysis.seen.lock().unwrap().as_deref(), Some("raw findings"));
        assert_eq!(
            *progress.states.lock().unwrap(),
            vec![
                PipelineState::NotStarted,
                PipelineState::Researching,
                PipelineState::Analyzing,
                PipelineState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_research_failure_skips_analysis() {
        let analysis = std::sync::Arc::new(EchoAnalysis::default());
        let pipeline = Pipeline::new(
            Box::new(FixedResearch(Err(AgentError::Transport("refused".into())))),
            Box::new(analysis.clone()),
        );
        let progress = RecordingProgress::default();

        let err = pipeline.run(&query(), &progress).await.unwrap_err();

        assert!(matches!(err, PipelineError::Research(_)));
        assert_eq!(analysis.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            progress.states.lock().unwrap().last(),
            Some(&PipelineState::Failed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fails_the_run() {
        let analysis = std::sync::Arc::new(EchoAnalysis::default());
        let pipeline = Pipeline::new(Box::new(SlowResearch), Box::new(analysis.clone()))
            .with_timeout(Duration::from_secs(5));

        let err = pipeline.run(&query(), &crate::SilentProgress).await.unwrap_err();

        match err {
            PipelineError::Timeout { secs, stage } => {
                assert_eq!(secs, 5);
                assert_eq!(stage, PipelineState::Researching);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(analysis.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analysis_failure_fails_the_run() {
        let pipeline = Pipeline::new(
            Box::new(FixedResearch(Ok("raw findings"))),
            Box::new(FailingAnalysis),
        );
        let progress = RecordingProgress::default();

        let err = pipeline.run(&query(), &progress).await.unwrap_err();

        assert!(matches!(err, PipelineError::Analysis(_)));
        assert_eq!(
            *progress.states.lock().unwrap(),
            vec![
                PipelineState::NotStarted,
                PipelineState::Researching,
                PipelineState::Analyzing,
                PipelineState::Failed,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_spans_both_stages() {
        let pipeline = Pipeline::new(
            Box::new(FixedResearch(Ok("raw findings"))),
            Box::new(SlowAnalysis),
        )
        .with_timeout(Duration::from_secs(5));
        let progress = RecordingProgress::default();

        let err = pipeline.run(&query(), &progress).await.unwrap_err();

        match err {
            PipelineError::Timeout { secs, stage } => {
                assert_eq!(secs, 5);
                assert_eq!(stage, PipelineState::Analyzing);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(
            progress.states.lock().unwrap().last(),
            Some(&PipelineState::Failed)
        );
    }

    #[tokio::test]
    async fn test_unrepresentable_deadline_runs_unbounded() {
        let pipeline = Pipeline::new(
            Box::new(FixedResearch(Ok("raw findings"))),
            Box::new(std::sync::Arc::new(EchoAnalysis::default())),
        )
        .with_timeout(Duration::from_secs(u64::MAX));

        let out = pipeline.run(&query(), &crate::SilentProgress).await.unwrap();

        assert_eq!(out.as_str(), "analysis of raw findings");
    }

    #[test]
    fn missing_key_maps_to_backend_unavailable() {
        let err: EddError = PipelineError::Setup(AgentError::MissingApiKey).into();
        assert!(matches!(err, EddError::BackendUnavailable(_)));

        let err: EddError = PipelineError::Timeout {
            secs: 600,
            stage: PipelineState::Analyzing,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "pipeline error: pipeline exceeded its 600s deadline while analyzing"
        );
    }
}
