use crate::ports::StrategyDraft;
use crate::types::{ContentType, Frequency, Tone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Positioning statement: who the product is for and why it wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Positioning {
    pub target: String,
    pub benefit: String,
    pub differentiation: String,
    #[serde(default)]
    pub proof: Vec<String>,
    pub value_proposition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMessage {
    pub message: String,
    pub tone: Tone,
    pub use_case: String,
    pub channel: Option<String>,
    #[serde(default)]
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStrategy {
    pub channel: String,
    pub strategy: String,
    #[serde(default)]
    pub content_types: Vec<ContentType>,
    pub frequency: Frequency,
    #[serde(default)]
    pub goals: Vec<String>,
    pub budget: f64,
    pub expected_roi: f64,
}

/// One narrative per funnel stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelHypothesis {
    pub awareness: String,
    pub interest: String,
    pub consideration: String,
    pub conversion: String,
    pub retention: String,
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Go-to-market strategy produced by the Strategy stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: Uuid,
    pub project_id: Uuid,
    pub positioning: Positioning,
    pub key_messages: Vec<KeyMessage>,
    pub channel_mix: Vec<ChannelStrategy>,
    pub funnel_hypothesis: FunnelHypothesis,
    pub created_at: DateTime<Utc>,
}

impl Strategy {
    pub fn from_draft(project_id: Uuid, draft: StrategyDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            positioning: draft.positioning,
            key_messages: draft.key_messages,
            channel_mix: draft.channel_mix,
            funnel_hypothesis: draft.funnel_hypothesis,
            created_at: Utc::now(),
        }
    }
}
