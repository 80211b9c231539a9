use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::content::{ContentItem, ContentPlan};
use crate::error::Result;
use crate::ports::{ChannelPort, PostDraft};
use crate::repo::{ContentItemRepo, ContentPlanRepo};
use crate::stage::StageProcessor;
use crate::state::{Stage, StateUpdate, WorkflowState};

/// Publish stage: pushes every calendar item to its channel and records the
/// resulting [`ContentItem`]s with their external post ids.
pub struct PublishStage {
    channel: Arc<dyn ChannelPort>,
    plans: Arc<dyn ContentPlanRepo>,
    items: Arc<dyn ContentItemRepo>,
}

impl PublishStage {
    pub fn new(
        channel: Arc<dyn ChannelPort>,
        plans: Arc<dyn ContentPlanRepo>,
        items: Arc<dyn ContentItemRepo>,
    ) -> Self {
        Self {
            channel,
            plans,
            items,
        }
    }

    fn required_plan(&self, state: &WorkflowState) -> Result<ContentPlan> {
        match &state.content_plan {
            Some(plan) => Ok(plan.clone()),
            None => self.plans.plan_for_project(state.project_id),
        }
    }

    /// Compose the post body from the calendar title and the channel guide's
    /// call-to-action, when one exists for that channel.
    fn compose_body(plan: &ContentPlan, channel: &str, title: &str) -> String {
        match plan.channel_guides.iter().find(|g| g.channel == channel) {
            Some(guide) => format!("{}\n\n{}", title, guide.cta),
            None => title.to_string(),
        }
    }
}

impl StageProcessor for PublishStage {
    fn stage(&self) -> Stage {
        Stage::Publish
    }

    fn process(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let plan = self.required_plan(state)?;

        let mut published = Vec::with_capacity(plan.calendar.len());
        for entry in &plan.calendar {
            let scheduled_at: Option<DateTime<Utc>> = entry
                .date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc());
            let draft = PostDraft {
                channel: entry.channel.clone(),
                title: entry.title.clone(),
                body: Self::compose_body(&plan, &entry.channel, &entry.title),
                scheduled_at,
            };
            let post = self.channel.publish(&draft)?;
            info!(channel = %entry.channel, post_id = %post.post_id, "published content");

            let mut item = ContentItem::draft(plan.id, &entry.channel, &draft.body)
                .published(post.post_id);
            item.scheduled_at = scheduled_at;
            self.items.create_item(&item)?;
            published.push(item);
        }

        Ok(StateUpdate {
            content_items: Some(published),
            ..Default::default()
        })
    }
}
