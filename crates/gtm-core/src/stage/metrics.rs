use std::sync::Arc;

use crate::content::ContentItem;
use crate::engagement::Engagement;
use crate::error::{GtmError, Result};
use crate::ports::ChannelPort;
use crate::repo::{ContentItemRepo, ContentPlanRepo, EngagementRepo};
use crate::stage::StageProcessor;
use crate::state::{Stage, StateUpdate, WorkflowState};

/// Metrics stage: fetches engagement for every posted item and persists one
/// [`Engagement`] capture per item.
pub struct MetricsStage {
    channel: Arc<dyn ChannelPort>,
    plans: Arc<dyn ContentPlanRepo>,
    items: Arc<dyn ContentItemRepo>,
    engagements: Arc<dyn EngagementRepo>,
}

impl MetricsStage {
    pub fn new(
        channel: Arc<dyn ChannelPort>,
        plans: Arc<dyn ContentPlanRepo>,
        items: Arc<dyn ContentItemRepo>,
        engagements: Arc<dyn EngagementRepo>,
    ) -> Self {
        Self {
            channel,
            plans,
            items,
            engagements,
        }
    }

    fn posted_items(&self, state: &WorkflowState) -> Result<Vec<ContentItem>> {
        if let Some(items) = &state.content_items {
            return Ok(items.clone());
        }
        let plan = self.plans.plan_for_project(state.project_id)?;
        self.items.items_for_plan(plan.id)
    }
}

impl StageProcessor for MetricsStage {
    fn stage(&self) -> Stage {
        Stage::Metrics
    }

    fn process(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let items = self.posted_items(state)?;

        let mut captured = Vec::with_capacity(items.len());
        for item in &items {
            let post_id = item
                .external_post_id
                .as_deref()
                .ok_or(GtmError::NotPublished(item.id))?;
            let snap = self.channel.fetch_metrics(post_id)?;
            let engagement = Engagement::from_snapshot(item.id, snap);
            self.engagements.create_engagement(&engagement)?;
            captured.push(engagement);
        }

        Ok(StateUpdate {
            engagements: Some(captured),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChannel;
    use crate::repo::MemoryDb;
    use crate::state::WorkflowState;
    use uuid::Uuid;

    #[test]
    fn captures_one_engagement_per_item() {
        let db = Arc::new(MemoryDb::new());
        let stage = MetricsStage::new(
            Arc::new(MockChannel::new()),
            db.clone(),
            db.clone(),
            db.clone(),
        );

        let project_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let items: Vec<ContentItem> = (0..3)
            .map(|i| {
                ContentItem::draft(plan_id, "youtube", format!("copy {i}"))
                    .published(format!("post-{i}"))
            })
            .collect();
        let mut state = WorkflowState::new(project_id, "prd");
        state.content_items = Some(items.clone());

        let update = stage.process(&state).unwrap();
        let engagements = update.engagements.expect("engagements populated");
        assert_eq!(engagements.len(), 3);
        assert_eq!(db.engagements_for_item(items[0].id).unwrap().len(), 1);
    }

    #[test]
    fn unpublished_item_is_an_error() {
        let db = Arc::new(MemoryDb::new());
        let stage = MetricsStage::new(
            Arc::new(MockChannel::new()),
            db.clone(),
            db.clone(),
            db,
        );

        let draft_item = ContentItem::draft(Uuid::new_v4(), "tiktok", "never posted");
        let mut state = WorkflowState::new(Uuid::new_v4(), "prd");
        state.content_items = Some(vec![draft_item.clone()]);

        assert!(matches!(
            stage.process(&state),
            Err(GtmError::NotPublished(id)) if id == draft_item.id
        ));
    }
}
