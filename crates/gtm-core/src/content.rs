use crate::ports::ContentPlanDraft;
use crate::types::{ContentStatus, ContentType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarItem {
    pub id: Uuid,
    pub date: NaiveDate,
    pub channel: String,
    pub title: String,
    pub content_type: ContentType,
    pub status: ContentStatus,
    #[serde(default)]
    pub priority: u32,
}

/// Per-channel authoring guide: hooks, hashtags, call-to-action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGuide {
    pub channel: String,
    #[serde(default)]
    pub hooks: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub cta: String,
    #[serde(default)]
    pub best_practices: Vec<String>,
}

// ---------------------------------------------------------------------------
// ContentPlan
// ---------------------------------------------------------------------------

/// Content calendar produced by the Content stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPlan {
    pub id: Uuid,
    pub project_id: Uuid,
    pub calendar: Vec<CalendarItem>,
    pub channel_guides: Vec<ChannelGuide>,
    pub created_at: DateTime<Utc>,
}

impl ContentPlan {
    pub fn from_draft(project_id: Uuid, draft: ContentPlanDraft) -> Self {
        let calendar = draft
            .calendar
            .into_iter()
            .map(|item| CalendarItem {
                id: Uuid::new_v4(),
                date: item.date,
                channel: item.channel,
                title: item.title,
                content_type: item.content_type,
                status: ContentStatus::Draft,
                priority: item.priority,
            })
            .collect();
        Self {
            id: Uuid::new_v4(),
            project_id,
            calendar,
            channel_guides: draft.channel_guides,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContentItem
// ---------------------------------------------------------------------------

/// A single piece of content tied to one plan, tracked through publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub channel: String,
    pub copy: String,
    pub media_prompt: Option<String>,
    pub status: ContentStatus,
    /// Set once the channel accepts the post.
    pub external_post_id: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn draft(plan_id: Uuid, channel: impl Into<String>, copy: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan_id,
            channel: channel.into(),
            copy: copy.into(),
            media_prompt: None,
            status: ContentStatus::Draft,
            external_post_id: None,
            scheduled_at: None,
            published_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark published with the channel-assigned post id.
    pub fn published(mut self, external_post_id: impl Into<String>) -> Self {
        self.status = ContentStatus::Published;
        self.external_post_id = Some(external_post_id.into());
        self.published_at = Some(Utc::now());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::CalendarItemDraft;

    #[test]
    fn from_draft_starts_all_items_as_draft() {
        let draft = ContentPlanDraft {
            calendar: vec![CalendarItemDraft {
                date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                channel: "youtube".into(),
                title: "Launch teaser".into(),
                content_type: ContentType::Promotional,
                priority: 1,
            }],
            channel_guides: vec![],
        };
        let plan = ContentPlan::from_draft(Uuid::new_v4(), draft);
        assert_eq!(plan.calendar.len(), 1);
        assert_eq!(plan.calendar[0].status, ContentStatus::Draft);
    }

    #[test]
    fn published_sets_post_id_and_timestamp() {
        let item = ContentItem::draft(Uuid::new_v4(), "instagram", "hello").published("ig-42");
        assert_eq!(item.status, ContentStatus::Published);
        assert_eq!(item.external_post_id.as_deref(), Some("ig-42"));
        assert!(item.published_at.is_some());
    }
}
