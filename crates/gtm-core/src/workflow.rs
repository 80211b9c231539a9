//! Workflow coordinator: owns stage ordering, starts the chain, replays it.
//!
//! The coordinator holds the event bus, the event store, and the shared
//! state table. Each stage is wired as a [`StageHandler`] subscribed to the
//! event kind that triggers it; publishing `PrdSubmitted` therefore drives
//! the whole pipeline through the bus. There is no automatic retry and no
//! rollback of earlier stages: a stage failure is isolated by the bus,
//! logged, and the chain stops there for that run.

use std::sync::Arc;

use uuid::Uuid;

use crate::bus::{EventBus, EventHandler, PipelineContext};
use crate::error::{GtmError, Result};
use crate::event::{DomainEvent, EventPayload};
use crate::ports::{ChannelPort, LlmPort, NotificationPort};
use crate::repo::{
    AnalysisRepo, ContentItemRepo, ContentPlanRepo, EngagementRepo, StrategyRepo,
};
use crate::stage::{
    trigger_for, AnalyzeStage, ContentStage, FeedbackStage, MetricsStage, PublishStage,
    StageProcessor, StrategyStage,
};
use crate::state::{Stage, StateTable, StateUpdate, WorkflowState, WorkflowStep};
use crate::store::EventStore;

// ---------------------------------------------------------------------------
// Step mapping
// ---------------------------------------------------------------------------

/// The coordinator step a completed stage advances the workflow to.
/// Feedback is terminal and leaves the step unchanged.
pub(crate) fn step_after(stage: Stage) -> Option<WorkflowStep> {
    match stage {
        Stage::Analyze => Some(WorkflowStep::Analyzing),
        Stage::Strategy => Some(WorkflowStep::StrategyReady),
        Stage::Content => Some(WorkflowStep::ContentPlanReady),
        Stage::Publish => Some(WorkflowStep::ContentPosted),
        Stage::Metrics => Some(WorkflowStep::MetricsIngested),
        Stage::Feedback => None,
    }
}

/// The follow-up event a completed stage publishes, built from its update.
/// Feedback publishes nothing; it ends the chain with a notification.
pub(crate) fn next_payload(stage: Stage, update: &StateUpdate) -> Option<EventPayload> {
    match stage {
        Stage::Analyze => update.analysis.clone().map(|analysis| {
            EventPayload::AnalysisCompleted { analysis }
        }),
        Stage::Strategy => update.strategy.clone().map(|strategy| {
            EventPayload::StrategyGenerated { strategy }
        }),
        Stage::Content => update.content_plan.clone().map(|plan| {
            EventPayload::ContentPlanCreated { plan }
        }),
        Stage::Publish => update.content_items.clone().map(|items| {
            EventPayload::ContentPosted { items }
        }),
        Stage::Metrics => update.engagements.clone().map(|engagements| {
            EventPayload::MetricsIngested { engagements }
        }),
        Stage::Feedback => None,
    }
}

// ---------------------------------------------------------------------------
// Log folding
// ---------------------------------------------------------------------------

/// Rebuild accumulated state purely from a stored log, without re-running
/// any stage. Merges go through the same ownership rules the live path
/// uses, so a log that was written by well-behaved stages always folds.
///
/// The Feedback stage publishes no event, so a folded state never carries a
/// feedback report.
pub fn fold_events(project_id: Uuid, events: &[DomainEvent]) -> Result<WorkflowState> {
    let mut state: Option<WorkflowState> = None;
    for event in events {
        let (stage, update) = match &event.payload {
            EventPayload::PrdSubmitted { prd } => {
                state.get_or_insert_with(|| WorkflowState::new(event.aggregate_id, prd));
                continue;
            }
            EventPayload::AnalysisCompleted { analysis } => (
                Stage::Analyze,
                StateUpdate {
                    analysis: Some(analysis.clone()),
                    ..Default::default()
                },
            ),
            EventPayload::StrategyGenerated { strategy } => (
                Stage::Strategy,
                StateUpdate {
                    strategy: Some(strategy.clone()),
                    ..Default::default()
                },
            ),
            EventPayload::ContentPlanCreated { plan } => (
                Stage::Content,
                StateUpdate {
                    content_plan: Some(plan.clone()),
                    ..Default::default()
                },
            ),
            EventPayload::ContentPosted { items } => (
                Stage::Publish,
                StateUpdate {
                    content_items: Some(items.clone()),
                    ..Default::default()
                },
            ),
            EventPayload::MetricsIngested { engagements } => (
                Stage::Metrics,
                StateUpdate {
                    engagements: Some(engagements.clone()),
                    ..Default::default()
                },
            ),
        };
        let current = state
            .as_mut()
            .ok_or(GtmError::WorkflowNotFound(project_id))?;
        current.merge(stage, update)?;
        if let Some(step) = step_after(stage) {
            current.step = step;
        }
    }
    state.ok_or(GtmError::WorkflowNotFound(project_id))
}

// ---------------------------------------------------------------------------
// StageHandler
// ---------------------------------------------------------------------------

/// Bus glue around one stage processor: on its trigger event, run the
/// processor against the accumulated state, merge through the ownership
/// check, advance the step, and emit the follow-up event.
pub struct StageHandler {
    processor: Arc<dyn StageProcessor>,
    states: Arc<StateTable>,
}

impl StageHandler {
    pub fn new(processor: Arc<dyn StageProcessor>, states: Arc<StateTable>) -> Self {
        Self { processor, states }
    }
}

impl EventHandler for StageHandler {
    fn handle(&self, event: &DomainEvent, ctx: &PipelineContext<'_>) -> Result<()> {
        let project_id = event.aggregate_id;
        if let EventPayload::PrdSubmitted { prd } = &event.payload {
            self.states.seed(project_id, prd);
        }

        let snapshot = self.states.snapshot(project_id)?;
        let update = self.processor.process(&snapshot)?;

        let stage = self.processor.stage();
        let follow_up = next_payload(stage, &update);
        self.states.update(project_id, |state| {
            state.merge(stage, update)?;
            if let Some(step) = step_after(stage) {
                state.step = step;
            }
            Ok(())
        })?;

        if let Some(payload) = follow_up {
            ctx.emit(DomainEvent::new(project_id, payload))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.processor.stage().as_str()
    }
}

// ---------------------------------------------------------------------------
// WorkflowCoordinator
// ---------------------------------------------------------------------------

pub struct WorkflowCoordinator {
    bus: EventBus,
    store: Arc<dyn EventStore>,
    states: Arc<StateTable>,
}

impl WorkflowCoordinator {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            bus: EventBus::new(),
            store,
            states: Arc::new(StateTable::new()),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Current accumulated state for a project, if a run has started.
    pub fn state(&self, project_id: Uuid) -> Result<WorkflowState> {
        self.states.snapshot(project_id)
    }

    /// Subscribe one handler per processor, keyed by the stage's trigger.
    pub fn register_stages(&self, processors: Vec<Arc<dyn StageProcessor>>) {
        for processor in processors {
            let kind = trigger_for(processor.stage());
            let handler: Arc<dyn EventHandler> =
                Arc::new(StageHandler::new(processor, Arc::clone(&self.states)));
            self.bus.subscribe(kind, handler);
        }
    }

    /// Wire the full six-stage pipeline against one repository backend.
    pub fn register_default_stages<R>(
        &self,
        llm: Arc<dyn LlmPort>,
        channel: Arc<dyn ChannelPort>,
        notifier: Arc<dyn NotificationPort>,
        db: Arc<R>,
    ) where
        R: AnalysisRepo
            + StrategyRepo
            + ContentPlanRepo
            + ContentItemRepo
            + EngagementRepo
            + 'static,
    {
        self.register_stages(vec![
            Arc::new(AnalyzeStage::new(Arc::clone(&llm), db.clone())),
            Arc::new(StrategyStage::new(
                Arc::clone(&llm),
                db.clone(),
                db.clone(),
            )),
            Arc::new(ContentStage::new(Arc::clone(&llm), db.clone(), db.clone())),
            Arc::new(PublishStage::new(
                Arc::clone(&channel),
                db.clone(),
                db.clone(),
            )),
            Arc::new(MetricsStage::new(
                channel,
                db.clone(),
                db.clone(),
                db.clone(),
            )),
            Arc::new(FeedbackStage::new(llm, notifier)),
        ]);
    }

    /// Construct and store the initial `PrdSubmitted` event, then publish
    /// it. The append happens strictly before any handler runs.
    pub fn start_workflow(&self, project_id: Uuid, prd: &str) -> Result<()> {
        let ctx = PipelineContext {
            store: self.store.as_ref(),
            bus: &self.bus,
        };
        ctx.emit(DomainEvent::prd_submitted(project_id, prd))
    }

    /// Republish the stored log for a project in original order, without
    /// re-appending. Returns the number of events republished.
    ///
    /// Handler idempotence is not guaranteed: replaying over an already
    /// accumulated state trips the write-once merge rule, which the bus
    /// isolates and logs per handler.
    pub fn replay(&self, project_id: Uuid) -> Result<usize> {
        let events = self.store.events_for(project_id)?;
        let ctx = PipelineContext {
            store: self.store.as_ref(),
            bus: &self.bus,
        };
        for event in &events {
            self.bus.publish(event, &ctx);
        }
        Ok(events.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
