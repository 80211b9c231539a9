//! Direct-call pipeline runner.
//!
//! Runs the six stages in order against the accumulated state without going
//! through the bus, writing the same event log a bus-driven run would. Used
//! by the CLI for one-shot runs where subscription fan-out buys nothing.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::event::DomainEvent;
use crate::stage::StageProcessor;
use crate::state::{StateTable, WorkflowState};
use crate::store::EventStore;
use crate::workflow::{next_payload, step_after};

pub struct Pipeline {
    processors: Vec<Arc<dyn StageProcessor>>,
    store: Arc<dyn EventStore>,
    states: StateTable,
}

impl Pipeline {
    /// Processors run in the order given; callers pass them in stage order.
    pub fn new(processors: Vec<Arc<dyn StageProcessor>>, store: Arc<dyn EventStore>) -> Self {
        Self {
            processors,
            store,
            states: StateTable::new(),
        }
    }

    /// Run every stage front to back for one project. The first stage
    /// failure aborts the run; events appended so far stay in the log.
    pub fn run(&self, project_id: Uuid, prd: &str) -> Result<WorkflowState> {
        self.states.seed(project_id, prd);
        self.store
            .append(&DomainEvent::prd_submitted(project_id, prd))?;

        for processor in &self.processors {
            let snapshot = self.states.snapshot(project_id)?;
            let update = processor.process(&snapshot)?;

            let stage = processor.stage();
            let follow_up = next_payload(stage, &update);
            self.states.update(project_id, |state| {
                state.merge(stage, update)?;
                if let Some(step) = step_after(stage) {
                    state.step = step;
                }
                Ok(())
            })?;
            if let Some(payload) = follow_up {
                self.store.append(&DomainEvent::new(project_id, payload))?;
            }
        }

        self.states.snapshot(project_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockChannel, MockLlm, RecordingNotifier};
    use crate::repo::MemoryDb;
    use crate::stage::{
        AnalyzeStage, ContentStage, FeedbackStage, MetricsStage, PublishStage, StrategyStage,
    };
    use crate::state::WorkflowStep;
    use crate::store::MemoryEventStore;

    fn full_pipeline(store: Arc<MemoryEventStore>) -> Pipeline {
        let llm: Arc<MockLlm> = Arc::new(MockLlm::new());
        let channel: Arc<MockChannel> = Arc::new(MockChannel::new());
        let db = Arc::new(MemoryDb::new());
        Pipeline::new(
            vec![
                Arc::new(AnalyzeStage::new(llm.clone(), db.clone())),
                Arc::new(StrategyStage::new(llm.clone(), db.clone(), db.clone())),
                Arc::new(ContentStage::new(llm.clone(), db.clone(), db.clone())),
                Arc::new(PublishStage::new(channel.clone(), db.clone(), db.clone())),
                Arc::new(MetricsStage::new(
                    channel,
                    db.clone(),
                    db.clone(),
                    db.clone(),
                )),
                Arc::new(FeedbackStage::new(llm, Arc::new(RecordingNotifier::new()))),
            ],
            store,
        )
    }

    #[test]
    fn run_front_to_back_fills_every_slot() {
        let store = Arc::new(MemoryEventStore::new());
        let pipeline = full_pipeline(store.clone());
        let project_id = Uuid::new_v4();

        let state = pipeline.run(project_id, "a PRD").unwrap();
        assert_eq!(state.step, WorkflowStep::MetricsIngested);
        assert!(state.analysis.is_some());
        assert!(state.strategy.is_some());
        assert!(state.content_plan.is_some());
        assert!(state.content_items.is_some());
        assert!(state.engagements.is_some());
        assert!(state.feedback.is_some());
    }

    #[test]
    fn run_writes_the_same_log_as_a_bus_run() {
        let store = Arc::new(MemoryEventStore::new());
        let pipeline = full_pipeline(store.clone());
        let project_id = Uuid::new_v4();
        pipeline.run(project_id, "a PRD").unwrap();

        let kinds: Vec<_> = store
            .events_for(project_id)
            .unwrap()
            .iter()
            .map(|e| e.kind().to_string())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "prd_submitted",
                "analysis_completed",
                "strategy_generated",
                "content_plan_created",
                "content_posted",
                "metrics_ingested",
            ]
        );
    }
}
