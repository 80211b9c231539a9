//! Stage processors: one per pipeline stage.
//!
//! A processor receives a read-only view of the accumulated workflow state,
//! calls its external capability, persists the entity it produced, and
//! returns a partial update containing only the fields its stage owns.
//! Fields owned by earlier stages are never touched; required fields are
//! never silently defaulted on failure.

pub mod analyze;
pub mod content;
pub mod feedback;
pub mod metrics;
pub mod publish;
pub mod strategy;

pub use analyze::AnalyzeStage;
pub use content::ContentStage;
pub use feedback::FeedbackStage;
pub use metrics::MetricsStage;
pub use publish::PublishStage;
pub use strategy::StrategyStage;

use crate::error::Result;
use crate::event::EventKind;
use crate::state::{Stage, StateUpdate, WorkflowState};

/// Contract for one pipeline stage.
pub trait StageProcessor: Send + Sync {
    fn stage(&self) -> Stage;

    /// Run the stage against the current accumulated state.
    ///
    /// The returned update may only populate keys in
    /// [`Stage::owned_keys`]; the accumulator rejects anything else.
    fn process(&self, state: &WorkflowState) -> Result<StateUpdate>;
}

/// The event kind whose arrival triggers a stage in the event-driven
/// execution style.
pub fn trigger_for(stage: Stage) -> EventKind {
    match stage {
        Stage::Analyze => EventKind::PrdSubmitted,
        Stage::Strategy => EventKind::AnalysisCompleted,
        Stage::Content => EventKind::StrategyGenerated,
        Stage::Publish => EventKind::ContentPlanCreated,
        Stage::Metrics => EventKind::ContentPosted,
        Stage::Feedback => EventKind::MetricsIngested,
    }
}
