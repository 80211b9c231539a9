//! Domain events for the go-to-market pipeline.
//!
//! Each event carries the owning project id (the aggregate id), an
//! occurrence timestamp, and a tag-specific payload. Events are append-only:
//! they are written to the [`EventStore`](crate::store::EventStore) before
//! being fanned out on the [`EventBus`](crate::bus::EventBus).

use crate::analysis::Analysis;
use crate::content::{ContentItem, ContentPlan};
use crate::engagement::Engagement;
use crate::strategy::Strategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// EventPayload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    PrdSubmitted { prd: String },
    AnalysisCompleted { analysis: Analysis },
    StrategyGenerated { strategy: Strategy },
    ContentPlanCreated { plan: ContentPlan },
    ContentPosted { items: Vec<ContentItem> },
    MetricsIngested { engagements: Vec<Engagement> },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::PrdSubmitted { .. } => EventKind::PrdSubmitted,
            EventPayload::AnalysisCompleted { .. } => EventKind::AnalysisCompleted,
            EventPayload::StrategyGenerated { .. } => EventKind::StrategyGenerated,
            EventPayload::ContentPlanCreated { .. } => EventKind::ContentPlanCreated,
            EventPayload::ContentPosted { .. } => EventKind::ContentPosted,
            EventPayload::MetricsIngested { .. } => EventKind::MetricsIngested,
        }
    }
}

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// Payload-free event tag, used as the bus subscription key and for
/// type-filtered store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PrdSubmitted,
    AnalysisCompleted,
    StrategyGenerated,
    ContentPlanCreated,
    ContentPosted,
    MetricsIngested,
}

impl EventKind {
    pub fn all() -> &'static [EventKind] {
        &[
            EventKind::PrdSubmitted,
            EventKind::AnalysisCompleted,
            EventKind::StrategyGenerated,
            EventKind::ContentPlanCreated,
            EventKind::ContentPosted,
            EventKind::MetricsIngested,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PrdSubmitted => "prd_submitted",
            EventKind::AnalysisCompleted => "analysis_completed",
            EventKind::StrategyGenerated => "strategy_generated",
            EventKind::ContentPlanCreated => "content_plan_created",
            EventKind::ContentPosted => "content_posted",
            EventKind::MetricsIngested => "metrics_ingested",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = crate::error::GtmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prd_submitted" => Ok(EventKind::PrdSubmitted),
            "analysis_completed" => Ok(EventKind::AnalysisCompleted),
            "strategy_generated" => Ok(EventKind::StrategyGenerated),
            "content_plan_created" => Ok(EventKind::ContentPlanCreated),
            "content_posted" => Ok(EventKind::ContentPosted),
            "metrics_ingested" => Ok(EventKind::MetricsIngested),
            _ => Err(crate::error::GtmError::InvalidEnum {
                what: "event kind",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: Uuid,
    /// The project that owns this event's history.
    pub aggregate_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl DomainEvent {
    pub fn new(aggregate_id: Uuid, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            aggregate_id,
            occurred_at: Utc::now(),
            payload,
        }
    }

    pub fn prd_submitted(project_id: Uuid, prd: impl Into<String>) -> Self {
        Self::new(project_id, EventPayload::PrdSubmitted { prd: prd.into() })
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn payload_tag_roundtrip() {
        let event = DomainEvent::prd_submitted(Uuid::new_v4(), "launch a thing");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "prd_submitted");

        let back: DomainEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn kind_matches_payload() {
        let event = DomainEvent::prd_submitted(Uuid::new_v4(), "prd");
        assert_eq!(event.kind(), EventKind::PrdSubmitted);
        assert_eq!(
            EventKind::from_str(event.kind().as_str()).unwrap(),
            EventKind::PrdSubmitted
        );
    }

    #[test]
    fn all_kinds_covered() {
        assert_eq!(EventKind::all().len(), 6);
    }
}
