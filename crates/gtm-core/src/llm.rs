//! OpenAI-backed adapter for the language-model port.
//!
//! Each stage gets its own prompt pair that pins the exact JSON shape the
//! stage deserializes into. Completions that come back off-schema surface
//! as [`GtmError::ResponseShape`] naming the stage; nothing is defaulted
//! into place.

use llm_client::{extract_json, ChatClient, ChatMessage};
use serde::de::DeserializeOwned;

use crate::analysis::Analysis;
use crate::engagement::{Engagement, FeedbackReport};
use crate::error::{GtmError, Result};
use crate::ports::{AnalysisDraft, ContentPlanDraft, LlmPort, StrategyDraft};
use crate::state::Stage;
use crate::strategy::Strategy;

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

const ANALYZE_SYSTEM: &str = "You are a product marketing analyst. Respond with a single JSON \
object and nothing else. The object has these fields: \
\"domain\" (string, the product's market domain), \
\"personas\" (array of {\"name\", \"description\", \"pain\", \"need\", \"behavior\": [string], \
\"demographics\"?: {\"age\", \"gender\", \"income\", \"location\"}}), \
\"pains\" (array of strings), \
\"solution_map\" (array of {\"pain\", \"solution\", \"priority\", \"effort\", \"impact\"} \
where priority/effort/impact are \"low\", \"medium\" or \"high\"), \
\"competitors\" (array of {\"name\", \"strengths\": [string], \"weaknesses\": [string], \
\"market_share\"?: number, \"pricing\"?: string}).";

const STRATEGY_SYSTEM: &str = "You are a go-to-market strategist. Respond with a single JSON \
object and nothing else. The object has these fields: \
\"positioning\" ({\"target\", \"benefit\", \"differentiation\", \"proof\": [string], \
\"value_proposition\"?: string}), \
\"key_messages\" (array of {\"message\", \"tone\", \"use_case\", \"channel\"?: string, \
\"priority\": number} where tone is \"professional\", \"casual\", \"friendly\" or \"authoritative\"), \
\"channel_mix\" (array of {\"channel\", \"strategy\", \"content_types\": [content type], \
\"frequency\", \"goals\": [string], \"budget\": number, \"expected_roi\": number} where \
frequency is \"daily\", \"weekly\", \"biweekly\" or \"monthly\"), \
\"funnel_hypothesis\" ({\"awareness\", \"interest\", \"consideration\", \"conversion\", \"retention\"}). \
Content types are \"educational\", \"entertainment\", \"behind-scenes\", \"promotional\" or \
\"user-generated\".";

const CONTENT_SYSTEM: &str = "You are a content planner. Respond with a single JSON object and \
nothing else. The object has these fields: \
\"calendar\" (array of {\"date\" in YYYY-MM-DD, \"channel\", \"title\", \"content_type\", \
\"priority\": number} where content_type is \"educational\", \"entertainment\", \
\"behind-scenes\", \"promotional\" or \"user-generated\"), \
\"channel_guides\" (array of {\"channel\", \"hooks\": [string], \"hashtags\": [string], \
\"cta\", \"best_practices\": [string]}).";

const FEEDBACK_SYSTEM: &str = "You are a marketing performance analyst. Respond with a single \
JSON object and nothing else. The object has these fields: \
\"insights\" (array of strings, what the engagement numbers show), \
\"recommendations\" (array of strings, concrete next actions).";

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

pub struct OpenAiLlm {
    client: ChatClient,
}

impl OpenAiLlm {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// One completion round-trip parsed into the stage's expected shape.
    fn completion<T: DeserializeOwned>(
        &self,
        stage: Stage,
        system: &str,
        user: String,
    ) -> Result<T> {
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        let raw = self.client.complete(&messages)?;
        let json = extract_json(&raw)?;
        serde_json::from_str(json).map_err(|e| GtmError::ResponseShape {
            stage,
            detail: e.to_string(),
        })
    }
}

impl LlmPort for OpenAiLlm {
    fn analyze_prd(&self, prd: &str) -> Result<AnalysisDraft> {
        self.completion(
            Stage::Analyze,
            ANALYZE_SYSTEM,
            format!("Analyze this product requirements document:\n\n{prd}"),
        )
    }

    fn craft_strategy(&self, analysis: &Analysis) -> Result<StrategyDraft> {
        self.completion(
            Stage::Strategy,
            STRATEGY_SYSTEM,
            format!(
                "Craft a go-to-market strategy from this product analysis:\n\n{}",
                serde_json::to_string_pretty(analysis)?
            ),
        )
    }

    fn plan_content(&self, strategy: &Strategy) -> Result<ContentPlanDraft> {
        self.completion(
            Stage::Content,
            CONTENT_SYSTEM,
            format!(
                "Plan a two-week content calendar executing this strategy:\n\n{}",
                serde_json::to_string_pretty(strategy)?
            ),
        )
    }

    fn analyze_feedback(&self, engagements: &[Engagement]) -> Result<FeedbackReport> {
        self.completion(
            Stage::Feedback,
            FEEDBACK_SYSTEM,
            format!(
                "Analyze these per-post engagement metrics:\n\n{}",
                serde_json::to_string_pretty(engagements)?
            ),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ChannelStrategy;

    // Prompt/schema agreement is covered by deserializing documents written
    // to the prompts' stated shapes.

    #[test]
    fn analyze_schema_round_trips() {
        let doc = r#"{
            "domain": "creator tooling",
            "personas": [{
                "name": "Solo creator",
                "description": "publishes weekly",
                "pain": "no time to plan",
                "need": "a schedule that fills itself",
                "behavior": ["posts on weekends"]
            }],
            "pains": ["manual scheduling"],
            "solution_map": [{
                "pain": "manual scheduling",
                "solution": "auto-queue",
                "priority": "high",
                "effort": "low",
                "impact": "high"
            }],
            "competitors": []
        }"#;
        let draft: AnalysisDraft = serde_json::from_str(doc).unwrap();
        assert_eq!(draft.domain, "creator tooling");
        assert_eq!(draft.solution_map.len(), 1);
    }

    #[test]
    fn channel_mix_requires_budget_and_roi() {
        // A channel entry without its budget fields is a schema miss, not
        // a strategy with blanks.
        let doc = r#"{
            "channel": "youtube",
            "strategy": "weekly deep dives",
            "content_types": ["educational"],
            "frequency": "weekly",
            "goals": ["authority"],
            "expected_roi": 1.8
        }"#;
        assert!(serde_json::from_str::<ChannelStrategy>(doc).is_err());

        let full = r#"{
            "channel": "youtube",
            "strategy": "weekly deep dives",
            "content_types": ["educational"],
            "frequency": "weekly",
            "goals": ["authority"],
            "budget": 500.0,
            "expected_roi": 1.8
        }"#;
        let parsed: ChannelStrategy = serde_json::from_str(full).unwrap();
        assert_eq!(parsed.budget, 500.0);
    }

    #[test]
    fn analyze_schema_rejects_missing_domain() {
        let doc = r#"{"personas": [], "pains": [], "solution_map": []}"#;
        assert!(serde_json::from_str::<AnalysisDraft>(doc).is_err());
    }

    #[test]
    fn feedback_schema_tolerates_sparse_reports() {
        let report: FeedbackReport = serde_json::from_str(r#"{"insights": ["ctr is flat"]}"#).unwrap();
        assert_eq!(report.insights.len(), 1);
        assert!(report.recommendations.is_empty());
    }
}
