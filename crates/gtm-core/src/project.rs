use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product project: the aggregate root that owns the event history.
///
/// Projects are immutable value snapshots. Updating the PRD produces a new
/// snapshot with `updated_at` set rather than mutating the stored text, so
/// the inputs of any prior analysis remain auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    /// Raw product requirements document text.
    pub prd: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(owner_id: Uuid, name: impl Into<String>, prd: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            prd: prd.into(),
            industry: None,
            targets: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// New snapshot with replaced PRD text. The id is preserved; the caller
    /// is responsible for emitting a fresh `PrdSubmitted` event so the
    /// change is never silent.
    pub fn with_prd(&self, prd: impl Into<String>) -> Self {
        Self {
            prd: prd.into(),
            updated_at: Some(Utc::now()),
            ..self.clone()
        }
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }
}
