//! Request dispatcher: validate, fan out to the selected backends, aggregate.

use std::sync::Arc;
use std::time::Instant;

use edd_agents::FrameworkAvailability;
use edd_shared::{
    AggregatedResponse, AppConfig, BackendOutcome, CredentialOverrides, DefaultCredentials,
    EddError, EffectiveCredentials, Mode, Query, Region, Result, SearchResult, SkipReason,
};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::backends::{AgentPipelineBackend, DirectSearchBackend, PipelineBackend, SearchBackend};
use crate::progress::{Backend, DispatchProgress};

/// One research request as received from the caller.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    /// Entity or person name(s). Validated by the dispatcher.
    pub target: String,
    /// ISO country code; the configured default when absent.
    pub region: Option<String>,
    pub mode: Mode,
    /// Per-request keys; never written back to the process defaults.
    pub credentials: CredentialOverrides,
}

impl ResearchRequest {
    pub fn new(target: impl Into<String>, mode: Mode) -> Self {
        Self {
            target: target.into(),
            region: None,
            mode,
            credentials: CredentialOverrides::default(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialOverrides) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Routes requests to the agent pipeline and/or the direct search.
///
/// Holds only read-only state after construction; concurrent requests share
/// nothing mutable.
pub struct Dispatcher {
    framework: FrameworkAvailability,
    defaults: DefaultCredentials,
    default_region: Region,
    pipeline: Arc<dyn PipelineBackend>,
    search: Arc<dyn SearchBackend>,
}

impl Dispatcher {
    pub fn new(
        framework: FrameworkAvailability,
        defaults: DefaultCredentials,
        default_region: Region,
        pipeline: Arc<dyn PipelineBackend>,
        search: Arc<dyn SearchBackend>,
    ) -> Self {
        Self {
            framework,
            defaults,
            default_region,
            pipeline,
            search,
        }
    }

    /// Build the production backends from config.
    pub fn from_config(
        config: &AppConfig,
        defaults: DefaultCredentials,
        framework: FrameworkAvailability,
    ) -> Result<Self> {
        Ok(Self::new(
            framework,
            defaults,
            Region::parse(&config.defaults.region)?,
            Arc::new(AgentPipelineBackend::from_config(config)?),
            Arc::new(DirectSearchBackend::from_config(config)?),
        ))
    }

    /// Serve one request.
    ///
    /// Input is validated before any backend runs. Selected backends run
    /// concurrently and independently; a pipeline failure is captured in its
    /// outcome slot. Only a failed search in [`Mode::DirectSearch`] turns
    /// into an `Err`, since there is nothing else to return.
    pub async fn dispatch(
        &self,
        request: ResearchRequest,
        progress: &dyn DispatchProgress,
    ) -> Result<AggregatedResponse> {
        let region = match request.region.as_deref() {
            Some(raw) => Region::parse(raw)?,
            None => self.default_region.clone(),
        };
        let query = Query::new(&request.target, region)?;
        let mode = request.mode;
        let credentials = request.credentials.resolve(&self.defaults);

        let request_id = Uuid::now_v7();
        let span = info_span!(
            "dispatch",
            %request_id,
            entity = %query.target(),
            region = %query.region(),
            mode = %mode,
        );

        async move {
            let start = Instant::now();
            info!("dispatching research request");

            let (pipeline_outcome, search_outcome) = tokio::join!(
                self.pipeline_outcome(&query, mode, &credentials, progress),
                self.search_outcome(&query, mode, &credentials, progress),
            );

            info!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                pipeline_ran = pipeline_outcome.ran,
                search_ran = search_outcome.ran,
                "research request complete"
            );

            if mode == Mode::DirectSearch {
                if let Some(edd_shared::BackendResult::Search(SearchResult::Failure(failure))) =
                    &search_outcome.result
                {
                    warn!(error = %failure.message, "sole requested backend failed");
                    return Err(EddError::from(failure.clone()));
                }
            }

            Ok(AggregatedResponse {
                pipeline_outcome,
                search_outcome,
                mode,
            })
        }
        .instrument(span)
        .await
    }

    async fn pipeline_outcome(
        &self,
        query: &Query,
        mode: Mode,
        credentials: &EffectiveCredentials,
        progress: &dyn DispatchProgress,
    ) -> BackendOutcome {
        let outcome = if !mode.runs_pipeline() {
            BackendOutcome::skipped(SkipReason::NotRequested)
        } else if let FrameworkAvailability::Unavailable { reason } = &self.framework {
            info!(%reason, "skipping agent pipeline");
            BackendOutcome::skipped(SkipReason::FrameworkUnavailable)
        } else {
            progress.backend_started(Backend::AgentPipeline);
            match self.pipeline.run(query, credentials, progress).await {
                Ok(output) => BackendOutcome::stage_output(output),
                Err(e) => BackendOutcome::failed(EddError::from(e).to_string()),
            }
        };

        progress.backend_finished(Backend::AgentPipeline, &outcome);
        outcome
    }

    async fn search_outcome(
        &self,
        query: &Query,
        mode: Mode,
        credentials: &EffectiveCredentials,
        progress: &dyn DispatchProgress,
    ) -> BackendOutcome {
        let outcome = if !mode.runs_search() {
            BackendOutcome::skipped(SkipReason::NotRequested)
        } else {
            progress.backend_started(Backend::DirectSearch);
            BackendOutcome::search(self.search.search(query, credentials).await)
        };

        progress.backend_finished(Backend::DirectSearch, &outcome);
        outcome
    }
}
