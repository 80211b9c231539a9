use crate::ports::AnalysisDraft;
use crate::types::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: String,
    pub gender: String,
    pub income: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub description: String,
    pub pain: String,
    pub need: String,
    #[serde(default)]
    pub behavior: Vec<String>,
    pub demographics: Option<Demographics>,
}

/// Pairs one customer pain with the solution addressing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionMapping {
    pub pain: String,
    pub solution: String,
    pub priority: Level,
    pub effort: Level,
    pub impact: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    pub market_share: Option<f64>,
    pub pricing: Option<String>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// PRD analysis produced by the Analyze stage. Belongs to exactly one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Product domain in free text, e.g. "Creator SaaS".
    pub domain: String,
    pub personas: Vec<Persona>,
    pub pains: Vec<String>,
    pub solution_map: Vec<SolutionMapping>,
    /// Optional: the model may legitimately return no competitors.
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    pub created_at: DateTime<Utc>,
}

impl Analysis {
    /// Build the entity from a parsed LLM draft.
    pub fn from_draft(project_id: Uuid, draft: AnalysisDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            domain: draft.domain,
            personas: draft.personas,
            pains: draft.pains,
            solution_map: draft.solution_map,
            competitors: draft.competitors,
            created_at: Utc::now(),
        }
    }
}
