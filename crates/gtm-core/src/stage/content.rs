use std::sync::Arc;

use crate::content::ContentPlan;
use crate::error::Result;
use crate::ports::LlmPort;
use crate::repo::{ContentPlanRepo, StrategyRepo};
use crate::stage::StageProcessor;
use crate::state::{Stage, StateUpdate, WorkflowState};
use crate::strategy::Strategy;

/// Content stage: strategy in, persisted [`ContentPlan`] out.
pub struct ContentStage {
    llm: Arc<dyn LlmPort>,
    strategies: Arc<dyn StrategyRepo>,
    plans: Arc<dyn ContentPlanRepo>,
}

impl ContentStage {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        strategies: Arc<dyn StrategyRepo>,
        plans: Arc<dyn ContentPlanRepo>,
    ) -> Self {
        Self {
            llm,
            strategies,
            plans,
        }
    }

    fn required_strategy(&self, state: &WorkflowState) -> Result<Strategy> {
        match &state.strategy {
            Some(strategy) => Ok(strategy.clone()),
            None => self.strategies.strategy_for_project(state.project_id),
        }
    }
}

impl StageProcessor for ContentStage {
    fn stage(&self) -> Stage {
        Stage::Content
    }

    fn process(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let strategy = self.required_strategy(state)?;
        let draft = self.llm.plan_content(&strategy)?;
        let plan = ContentPlan::from_draft(state.project_id, draft);
        self.plans.create_plan(&plan)?;
        Ok(StateUpdate {
            content_plan: Some(plan),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GtmError;
    use crate::mock::MockLlm;
    use crate::repo::MemoryDb;
    use crate::state::WorkflowState;
    use uuid::Uuid;

    #[test]
    fn fails_not_found_without_strategy() {
        let db = Arc::new(MemoryDb::new());
        let stage = ContentStage::new(Arc::new(MockLlm::new()), db.clone(), db.clone());
        let state = WorkflowState::new(Uuid::new_v4(), "prd");
        assert!(matches!(
            stage.process(&state),
            Err(GtmError::StrategyNotFound(_))
        ));
    }

    #[test]
    fn plan_is_persisted_and_returned() {
        let db = Arc::new(MemoryDb::new());
        let llm = Arc::new(MockLlm::new());
        let project_id = Uuid::new_v4();
        let mut state = WorkflowState::new(project_id, "prd");
        state.strategy = Some(Strategy::from_draft(project_id, llm.canned_strategy()));

        let stage = ContentStage::new(llm, db.clone(), db.clone());
        let update = stage.process(&state).unwrap();
        let plan = update.content_plan.expect("plan populated");
        assert!(!plan.calendar.is_empty());
        assert_eq!(db.plan_for_project(project_id).unwrap().id, plan.id);
    }
}
