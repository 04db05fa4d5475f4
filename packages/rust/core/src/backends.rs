//! The two research backends the dispatcher fans out to.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use edd_agents::{ChatModel, OpenAiChatModel};
use edd_search::{DeepDiveTool, SearchClient, SearchEndpoint};
use edd_shared::{
    AgentsConfig, AppConfig, EddError, EffectiveCredentials, Query, Result, SearchResult,
    StageOutput,
};

use crate::pipeline::{Pipeline, PipelineError};
use crate::progress::DispatchProgress;
use crate::stages::{AgentAnalysisStage, AgentResearchStage};
use crate::tools::{DeepDiveAgentTool, SearchAgentTool};

/// Runs the agent pipeline for one request.
#[async_trait]
pub trait PipelineBackend: Send + Sync {
    async fn run(
        &self,
        query: &Query,
        credentials: &EffectiveCredentials,
        progress: &dyn DispatchProgress,
    ) -> std::result::Result<StageOutput, PipelineError>;
}

/// Runs the direct compliance search for one request.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &Query, credentials: &EffectiveCredentials) -> SearchResult;
}

fn search_setup_error(e: edd_search::SearchError) -> EddError {
    EddError::config(format!("search backend: {e}"))
}

// ---------------------------------------------------------------------------
// Direct search
// ---------------------------------------------------------------------------

/// [`SearchBackend`] backed by [`SearchClient`].
pub struct DirectSearchBackend {
    client: SearchClient,
}

impl DirectSearchBackend {
    pub fn new(client: SearchClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            SearchClient::from_config(&config.search).map_err(search_setup_error)?,
        ))
    }
}

#[async_trait]
impl SearchBackend for DirectSearchBackend {
    async fn search(&self, query: &Query, credentials: &EffectiveCredentials) -> SearchResult {
        self.client
            .search(query, credentials.search_api_key.as_ref())
            .await
    }
}

// ---------------------------------------------------------------------------
// Agent pipeline
// ---------------------------------------------------------------------------

/// [`PipelineBackend`] that assembles fresh agents per request, so each
/// request's keys flow into its own tools and model client.
pub struct AgentPipelineBackend {
    agents: AgentsConfig,
    search: SearchClient,
    deep_dive: DeepDiveTool,
}

impl AgentPipelineBackend {
    pub fn new(agents: AgentsConfig, search: SearchClient, deep_dive: DeepDiveTool) -> Self {
        Self {
            agents,
            search,
            deep_dive,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let endpoint = SearchEndpoint::from_config(&config.search).map_err(search_setup_error)?;
        Ok(Self::new(
            config.agents.clone(),
            SearchClient::new(endpoint.clone(), &config.search.model),
            DeepDiveTool::new(endpoint, &config.search.deep_dive_model),
        ))
    }

    /// Wire both stages to `model`, with tools bound to this request's
    /// search key and region.
    pub fn build_pipeline(
        &self,
        model: Arc<dyn ChatModel>,
        query: &Query,
        credentials: &EffectiveCredentials,
    ) -> Pipeline {
        let search_tool = Arc::new(SearchAgentTool::new(
            self.search.clone(),
            query.region().clone(),
            credentials.search_api_key.clone(),
        ));
        let deep_dive_tool = Arc::new(DeepDiveAgentTool::new(
            self.deep_dive.clone(),
            credentials.search_api_key.clone(),
            self.agents.max_deep_dives,
        ));

        Pipeline::new(
            Box::new(AgentResearchStage::new(
                model.clone(),
                search_tool,
                self.agents.max_iterations,
            )),
            Box::new(AgentAnalysisStage::new(
                model,
                deep_dive_tool,
                self.agents.max_iterations,
            )),
        )
        .with_timeout(Duration::from_secs(self.agents.pipeline_timeout_secs))
    }
}

#[async_trait]
impl PipelineBackend for AgentPipelineBackend {
    async fn run(
        &self,
        query: &Query,
        credentials: &EffectiveCredentials,
        progress: &dyn DispatchProgress,
    ) -> std::result::Result<StageOutput, PipelineError> {
        let model = OpenAiChatModel::from_config(&self.agents, credentials.llm_api_key.clone())
            .map_err(PipelineError::Setup)?;
        self.build_pipeline(Arc::new(model), query, credentials)
            .run(query, progress)
            .await
    }
}
