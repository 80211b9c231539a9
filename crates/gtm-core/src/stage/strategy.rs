use std::sync::Arc;

use crate::analysis::Analysis;
use crate::error::Result;
use crate::ports::LlmPort;
use crate::repo::{AnalysisRepo, StrategyRepo};
use crate::stage::StageProcessor;
use crate::state::{Stage, StateUpdate, WorkflowState};
use crate::strategy::Strategy;

/// Strategy stage: requires a prior analysis, produces a persisted
/// [`Strategy`]. Invoked without an analysis anywhere, it fails with a
/// not-found error and publishes nothing.
pub struct StrategyStage {
    llm: Arc<dyn LlmPort>,
    analyses: Arc<dyn AnalysisRepo>,
    strategies: Arc<dyn StrategyRepo>,
}

impl StrategyStage {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        analyses: Arc<dyn AnalysisRepo>,
        strategies: Arc<dyn StrategyRepo>,
    ) -> Self {
        Self {
            llm,
            analyses,
            strategies,
        }
    }

    fn required_analysis(&self, state: &WorkflowState) -> Result<Analysis> {
        match &state.analysis {
            Some(analysis) => Ok(analysis.clone()),
            None => self.analyses.analysis_for_project(state.project_id),
        }
    }
}

impl StageProcessor for StrategyStage {
    fn stage(&self) -> Stage {
        Stage::Strategy
    }

    fn process(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let analysis = self.required_analysis(state)?;
        let draft = self.llm.craft_strategy(&analysis)?;
        let strategy = Strategy::from_draft(state.project_id, draft);
        self.strategies.create_strategy(&strategy)?;
        Ok(StateUpdate {
            strategy: Some(strategy),
            ..Default::default()
        })
    }
}
