//! Capability contracts consumed by the pipeline stages.
//!
//! Each port is a trait at the seam between a stage and the outside world:
//! the language-model completion capability, the channel publish/metrics
//! capability, and the notification capability. Adapters live in
//! [`llm`](crate::llm) and [`mock`](crate::mock).

use crate::analysis::{Analysis, Competitor, Persona, SolutionMapping};
use crate::engagement::{Engagement, FeedbackReport};
use crate::content::ChannelGuide;
use crate::error::Result;
use crate::strategy::{ChannelStrategy, FunnelHypothesis, KeyMessage, Positioning, Strategy};
use crate::types::ContentType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LLM drafts
// ---------------------------------------------------------------------------

/// Shape the Analyze stage expects back from the model.
///
/// Required fields are required: a missing `domain` is a parse failure, not
/// an empty string. Only genuinely optional list fields default to empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisDraft {
    pub domain: String,
    pub personas: Vec<Persona>,
    pub pains: Vec<String>,
    pub solution_map: Vec<SolutionMapping>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyDraft {
    pub positioning: Positioning,
    pub key_messages: Vec<KeyMessage>,
    pub channel_mix: Vec<ChannelStrategy>,
    pub funnel_hypothesis: FunnelHypothesis,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalendarItemDraft {
    pub date: NaiveDate,
    pub channel: String,
    pub title: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub priority: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentPlanDraft {
    pub calendar: Vec<CalendarItemDraft>,
    #[serde(default)]
    pub channel_guides: Vec<ChannelGuide>,
}

// ---------------------------------------------------------------------------
// LlmPort
// ---------------------------------------------------------------------------

/// Language-model completion capability, one operation per pipeline stage
/// that needs a completion. Transport failures and schema-mismatched output
/// both surface as typed errors; required fields are never defaulted.
pub trait LlmPort: Send + Sync {
    fn analyze_prd(&self, prd: &str) -> Result<AnalysisDraft>;
    fn craft_strategy(&self, analysis: &Analysis) -> Result<StrategyDraft>;
    fn plan_content(&self, strategy: &Strategy) -> Result<ContentPlanDraft>;
    fn analyze_feedback(&self, engagements: &[Engagement]) -> Result<FeedbackReport>;
}

// ---------------------------------------------------------------------------
// ChannelPort
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDraft {
    pub channel: String,
    pub title: String,
    pub body: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPost {
    pub post_id: String,
    pub url: String,
}

/// Raw metrics as reported by a channel; the Metrics stage derives ctr
/// itself rather than trusting the channel's arithmetic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    pub impressions: u64,
    pub clicks: u64,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub conversions: u64,
}

/// Channel publish and metrics-fetch capability.
pub trait ChannelPort: Send + Sync {
    fn publish(&self, draft: &PostDraft) -> Result<PublishedPost>;
    fn fetch_metrics(&self, post_id: &str) -> Result<EngagementSnapshot>;
}

// ---------------------------------------------------------------------------
// NotificationPort
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Summary-message capability, fire-and-forget from the pipeline's
/// perspective: a send failure is logged by the caller, never propagated.
pub trait NotificationPort: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<()>;
}
