use std::sync::Arc;

use crate::analysis::Analysis;
use crate::error::Result;
use crate::ports::LlmPort;
use crate::repo::AnalysisRepo;
use crate::stage::StageProcessor;
use crate::state::{Stage, StateUpdate, WorkflowState};

/// Analyze stage: PRD text in, persisted [`Analysis`] out.
pub struct AnalyzeStage {
    llm: Arc<dyn LlmPort>,
    analyses: Arc<dyn AnalysisRepo>,
}

impl AnalyzeStage {
    pub fn new(llm: Arc<dyn LlmPort>, analyses: Arc<dyn AnalysisRepo>) -> Self {
        Self { llm, analyses }
    }
}

impl StageProcessor for AnalyzeStage {
    fn stage(&self) -> Stage {
        Stage::Analyze
    }

    fn process(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let draft = self.llm.analyze_prd(&state.prd)?;
        let analysis = Analysis::from_draft(state.project_id, draft);
        self.analyses.create_analysis(&analysis)?;
        Ok(StateUpdate {
            analysis: Some(analysis),
            ..Default::default()
        })
    }
}
