use std::sync::Arc;

use tracing::warn;

use crate::engagement::Engagement;
use crate::error::{GtmError, Result};
use crate::ports::{LlmPort, Notification, NotificationPort};
use crate::stage::StageProcessor;
use crate::state::{Stage, StateUpdate, WorkflowState};

/// Feedback stage: turns the run's engagement metrics into insights and
/// recommendations, then sends a summary notification.
///
/// The notification is fire-and-forget: a send failure is logged and the
/// stage still succeeds, so a flaky mail hook never fails the pipeline.
pub struct FeedbackStage {
    llm: Arc<dyn LlmPort>,
    notifier: Arc<dyn NotificationPort>,
}

impl FeedbackStage {
    pub fn new(llm: Arc<dyn LlmPort>, notifier: Arc<dyn NotificationPort>) -> Self {
        Self { llm, notifier }
    }

    fn summary(insights: &[String], recommendations: &[String]) -> Notification {
        Notification {
            subject: "Content performance analysis complete".into(),
            body: format!(
                "Insights:\n{}\n\nRecommendations:\n{}",
                insights.join("\n"),
                recommendations.join("\n")
            ),
        }
    }
}

impl StageProcessor for FeedbackStage {
    fn stage(&self) -> Stage {
        Stage::Feedback
    }

    fn process(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let engagements: &[Engagement] = state
            .engagements
            .as_deref()
            .ok_or(GtmError::EngagementsNotFound(state.project_id))?;

        let report = self.llm.analyze_feedback(engagements)?;

        let notification = Self::summary(&report.insights, &report.recommendations);
        if let Err(err) = self.notifier.send(&notification) {
            warn!(project_id = %state.project_id, %err, "feedback notification failed");
        }

        Ok(StateUpdate {
            feedback: Some(report),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::Engagement;
    use crate::mock::{MockLlm, RecordingNotifier};
    use crate::ports::EngagementSnapshot;
    use crate::state::WorkflowState;
    use uuid::Uuid;

    struct FailingNotifier;

    impl NotificationPort for FailingNotifier {
        fn send(&self, _notification: &Notification) -> Result<()> {
            Err(GtmError::Transport {
                capability: "email".into(),
                detail: "smtp down".into(),
            })
        }
    }

    fn state_with_metrics() -> WorkflowState {
        let mut state = WorkflowState::new(Uuid::new_v4(), "prd");
        state.engagements = Some(vec![Engagement::from_snapshot(
            Uuid::new_v4(),
            EngagementSnapshot {
                impressions: 1000,
                clicks: 50,
                likes: 80,
                shares: 12,
                comments: 7,
                conversions: 5,
            },
        )]);
        state
    }

    #[test]
    fn produces_report_and_sends_summary() {
        let notifier = Arc::new(RecordingNotifier::new());
        let stage = FeedbackStage::new(Arc::new(MockLlm::new()), notifier.clone());

        let update = stage.process(&state_with_metrics()).unwrap();
        let report = update.feedback.expect("report populated");
        assert!(!report.insights.is_empty());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[test]
    fn notification_failure_does_not_fail_the_stage() {
        let stage = FeedbackStage::new(Arc::new(MockLlm::new()), Arc::new(FailingNotifier));
        let update = stage.process(&state_with_metrics()).unwrap();
        assert!(update.feedback.is_some());
    }

    #[test]
    fn missing_engagements_is_an_error() {
        let stage = FeedbackStage::new(
            Arc::new(MockLlm::new()),
            Arc::new(RecordingNotifier::new()),
        );
        let project_id = Uuid::new_v4();
        let state = WorkflowState::new(project_id, "prd");
        assert!(matches!(
            stage.process(&state),
            Err(GtmError::EngagementsNotFound(id)) if id == project_id
        ));
    }
}
