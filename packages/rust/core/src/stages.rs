//! The two agent stages of the research pipeline.
//!
//! Research gathers raw public-domain findings; analysis turns those
//! findings into a definitive compliance verdict.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use edd_agents::{Agent, AgentError, AgentTool, ChatModel, Task};
use edd_search::RiskCategory;
use edd_search::prompt::{FINDINGS_TABLE_HEADER, NO_ADVERSE_RESULTS};
use edd_shared::{Query, StageOutput};
use tracing::instrument;

/// Produces raw findings for a query.
#[async_trait]
pub trait ResearchStage: Send + Sync {
    async fn research(&self, query: &Query) -> Result<StageOutput, AgentError>;
}

/// Turns research findings into the final report. Never sees the raw query
/// without findings.
#[async_trait]
pub trait AnalysisStage: Send + Sync {
    async fn analyze(&self, query: &Query, findings: &StageOutput)
    -> Result<StageOutput, AgentError>;
}

// ---------------------------------------------------------------------------
// Research
// ---------------------------------------------------------------------------

pub struct AgentResearchStage {
    agent: Agent,
    model: Arc<dyn ChatModel>,
}

impl AgentResearchStage {
    pub fn new(model: Arc<dyn ChatModel>, search_tool: Arc<dyn AgentTool>, max_iterations: u32) -> Self {
        let agent = Agent::new(
            "Senior Research Analyst",
            "Find and analyze information about the given query from public domain sources and present raw data",
            "You are an expert researcher with years of experience in finding and analyzing \
             information from various sources. You excel at identifying key facts, verifying \
             information, and presenting findings in a clear and organized manner.",
        )
        .with_tool(search_tool)
        .with_max_iterations(max_iterations);

        Self { agent, model }
    }

    fn task(query: &Query) -> Task {
        Task::new(
            format!(
                "Conduct a thorough compliance search about: {target} (region {region}).\n\n\
                 Your task is to:\n\
                 1. Use the compliance search tool to find information from public domain sources\n\
                 2. Focus on key details, history, and recent developments\n\
                 3. Verify the accuracy of the information\n\
                 4. Identify the most important and relevant facts\n\n\
                 Be comprehensive but concise in your findings.",
                target = query.target(),
                region = query.region(),
            ),
            "A detailed report containing:\n\
             - Overview of the subject\n\
             - Key facts and details\n\
             - Historical context (if relevant)\n\
             - Recent developments or news\n\
             - Sources of information, as numbered links",
        )
    }
}

#[async_trait]
impl ResearchStage for AgentResearchStage {
    #[instrument(skip_all, fields(entity = %query.target()))]
    async fn research(&self, query: &Query) -> Result<StageOutput, AgentError> {
        let text = self
            .agent
            .perform(self.model.as_ref(), &Self::task(query), None)
            .await?;
        Ok(StageOutput::new(text))
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

pub struct AgentAnalysisStage {
    agent: Agent,
    model: Arc<dyn ChatModel>,
}

impl AgentAnalysisStage {
    pub fn new(model: Arc<dyn ChatModel>, deep_dive_tool: Arc<dyn AgentTool>, max_iterations: u32) -> Self {
        let agent = Agent::new(
            "Compliance Intelligence Analyst",
            "Analyse compliance reports for a new entity and summarise it for onboarding agents in markdown format",
            "You are an experienced analyst who can read publicly available information and \
             summarise it for onboarding agents. You are exceptional at highlighting crucial \
             information and seeing the risks in customers. You know when to raise red flags and \
             when to be cautious. You know when to research further and when you have enough \
             information to draw a conclusion.",
        )
        .with_tool(deep_dive_tool)
        .with_max_iterations(max_iterations);

        Self { agent, model }
    }

    fn task(query: &Query) -> Task {
        let mut description = format!(
            "Analyze the information collected about: {}.\n\n\
             Your task is to:\n\
             1. Review all the information gathered by the researcher\n\
             2. Use the deep dive tool only where a category remains unclear\n\
             3. Resolve every risk category below for every entity or person:\n",
            query.target()
        );
        for category in &RiskCategory::STANDARD {
            let _ = writeln!(description, "   - {}", category.label());
        }
        let _ = write!(
            description,
            "4. Give a definitive verdict per entity; never leave a category undecided\n\
             5. Where nothing adverse exists, state \"{NO_ADVERSE_RESULTS}\" explicitly"
        );

        Task::new(
            description,
            format!(
                "A markdown compliance report containing, for each entity or person:\n\
                 - Executive summary with a clear verdict\n\
                 - Findings table with header {FINDINGS_TABLE_HEADER}\n\
                 - Notable concerns, or \"{NO_ADVERSE_RESULTS}\"\n\
                 - Reference links"
            ),
        )
    }
}

#[async_trait]
impl AnalysisStage for AgentAnalysisStage {
    #[instrument(skip_all, fields(entity = %query.target(), findings_chars = findings.as_str().len()))]
    async fn analyze(
        &self,
        query: &Query,
        findings: &StageOutput,
    ) -> Result<StageOutput, AgentError> {
        let text = self
            .agent
            .perform(self.model.as_ref(), &Self::task(query), Some(findings.as_str()))
            .await?;
        Ok(StageOutput::new(text))
    }
}
