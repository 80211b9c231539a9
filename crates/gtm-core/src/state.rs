//! Accumulated workflow state and the stage ownership map.
//!
//! Every pipeline stage contributes exactly the fields it owns. The merge
//! rule is write-once: a stage writing a key outside its ownership set, or
//! a key that is already populated, is a logic error surfaced immediately
//! rather than silently ignored.

use crate::analysis::Analysis;
use crate::content::{ContentItem, ContentPlan};
use crate::engagement::{Engagement, FeedbackReport};
use crate::error::{GtmError, Result};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One step of the fixed pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Analyze,
    Strategy,
    Content,
    Publish,
    Metrics,
    Feedback,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Analyze,
            Stage::Strategy,
            Stage::Content,
            Stage::Publish,
            Stage::Metrics,
            Stage::Feedback,
        ]
    }

    /// The state keys this stage is allowed to write.
    pub fn owned_keys(self) -> &'static [StateKey] {
        match self {
            Stage::Analyze => &[StateKey::Analysis],
            Stage::Strategy => &[StateKey::Strategy],
            Stage::Content => &[StateKey::ContentPlan],
            Stage::Publish => &[StateKey::ContentItems],
            Stage::Metrics => &[StateKey::Engagements],
            Stage::Feedback => &[StateKey::Feedback],
        }
    }

    pub fn owns(self, key: StateKey) -> bool {
        self.owned_keys().contains(&key)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Analyze => "analyze",
            Stage::Strategy => "strategy",
            Stage::Content => "content",
            Stage::Publish => "publish",
            Stage::Metrics => "metrics",
            Stage::Feedback => "feedback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StateKey
// ---------------------------------------------------------------------------

/// Names the writable slots of [`WorkflowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKey {
    Analysis,
    Strategy,
    ContentPlan,
    ContentItems,
    Engagements,
    Feedback,
}

impl StateKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StateKey::Analysis => "analysis",
            StateKey::Strategy => "strategy",
            StateKey::ContentPlan => "content_plan",
            StateKey::ContentItems => "content_items",
            StateKey::Engagements => "engagements",
            StateKey::Feedback => "feedback",
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WorkflowStep
// ---------------------------------------------------------------------------

/// Coordinator state machine position: one successor per state, no branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    PrdSubmitted,
    Analyzing,
    StrategyReady,
    ContentPlanReady,
    ContentPosted,
    MetricsIngested,
}

impl WorkflowStep {
    pub fn all() -> &'static [WorkflowStep] {
        &[
            WorkflowStep::PrdSubmitted,
            WorkflowStep::Analyzing,
            WorkflowStep::StrategyReady,
            WorkflowStep::ContentPlanReady,
            WorkflowStep::ContentPosted,
            WorkflowStep::MetricsIngested,
        ]
    }

    pub fn next(self) -> Option<WorkflowStep> {
        let all = WorkflowStep::all();
        all.get(self as usize + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStep::PrdSubmitted => "prd_submitted",
            WorkflowStep::Analyzing => "analyzing",
            WorkflowStep::StrategyReady => "strategy_ready",
            WorkflowStep::ContentPlanReady => "content_plan_ready",
            WorkflowStep::ContentPosted => "content_posted",
            WorkflowStep::MetricsIngested => "metrics_ingested",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WorkflowState
// ---------------------------------------------------------------------------

/// The growing record a workflow run accumulates, one slot per stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub project_id: Uuid,
    pub prd: String,
    pub step: WorkflowStep,
    pub analysis: Option<Analysis>,
    pub strategy: Option<Strategy>,
    pub content_plan: Option<ContentPlan>,
    pub content_items: Option<Vec<ContentItem>>,
    pub engagements: Option<Vec<Engagement>>,
    pub feedback: Option<FeedbackReport>,
}

impl WorkflowState {
    pub fn new(project_id: Uuid, prd: impl Into<String>) -> Self {
        Self {
            project_id,
            prd: prd.into(),
            step: WorkflowStep::PrdSubmitted,
            analysis: None,
            strategy: None,
            content_plan: None,
            content_items: None,
            engagements: None,
            feedback: None,
        }
    }

    pub fn has(&self, key: StateKey) -> bool {
        match key {
            StateKey::Analysis => self.analysis.is_some(),
            StateKey::Strategy => self.strategy.is_some(),
            StateKey::ContentPlan => self.content_plan.is_some(),
            StateKey::ContentItems => self.content_items.is_some(),
            StateKey::Engagements => self.engagements.is_some(),
            StateKey::Feedback => self.feedback.is_some(),
        }
    }

    /// Merge a stage's partial update, fail-fast on ownership violations.
    ///
    /// Checks every populated key of the update before writing anything, so
    /// a rejected merge leaves the state untouched.
    pub fn merge(&mut self, stage: Stage, update: StateUpdate) -> Result<()> {
        for key in update.keys() {
            if !stage.owns(key) {
                return Err(GtmError::OwnershipViolation { stage, key });
            }
            if self.has(key) {
                return Err(GtmError::DuplicateWrite { stage, key });
            }
        }

        if let Some(analysis) = update.analysis {
            self.analysis = Some(analysis);
        }
        if let Some(strategy) = update.strategy {
            self.strategy = Some(strategy);
        }
        if let Some(plan) = update.content_plan {
            self.content_plan = Some(plan);
        }
        if let Some(items) = update.content_items {
            self.content_items = Some(items);
        }
        if let Some(engagements) = update.engagements {
            self.engagements = Some(engagements);
        }
        if let Some(feedback) = update.feedback {
            self.feedback = Some(feedback);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StateUpdate
// ---------------------------------------------------------------------------

/// Partial update produced by one stage. Only the fields the stage owns may
/// be populated; [`WorkflowState::merge`] enforces this.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub analysis: Option<Analysis>,
    pub strategy: Option<Strategy>,
    pub content_plan: Option<ContentPlan>,
    pub content_items: Option<Vec<ContentItem>>,
    pub engagements: Option<Vec<Engagement>>,
    pub feedback: Option<FeedbackReport>,
}

impl StateUpdate {
    pub fn keys(&self) -> Vec<StateKey> {
        let mut keys = Vec::new();
        if self.analysis.is_some() {
            keys.push(StateKey::Analysis);
        }
        if self.strategy.is_some() {
            keys.push(StateKey::Strategy);
        }
        if self.content_plan.is_some() {
            keys.push(StateKey::ContentPlan);
        }
        if self.content_items.is_some() {
            keys.push(StateKey::ContentItems);
        }
        if self.engagements.is_some() {
            keys.push(StateKey::Engagements);
        }
        if self.feedback.is_some() {
            keys.push(StateKey::Feedback);
        }
        keys
    }
}

// ---------------------------------------------------------------------------
// StateTable
// ---------------------------------------------------------------------------

/// In-memory map of project id to accumulated workflow state, shared by the
/// event handlers. The single mutex makes each merge atomic; there is no
/// cross-process arbitration for concurrent workflows on one project.
#[derive(Debug, Default)]
pub struct StateTable {
    states: Mutex<HashMap<Uuid, WorkflowState>>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the state for a project if absent. Re-seeding an existing
    /// project is a no-op so replay does not wipe accumulated work.
    pub fn seed(&self, project_id: Uuid, prd: &str) {
        let mut states = self.states.lock().expect("state table poisoned");
        states
            .entry(project_id)
            .or_insert_with(|| WorkflowState::new(project_id, prd));
    }

    pub fn snapshot(&self, project_id: Uuid) -> Result<WorkflowState> {
        let states = self.states.lock().expect("state table poisoned");
        states
            .get(&project_id)
            .cloned()
            .ok_or(GtmError::WorkflowNotFound(project_id))
    }

    /// Apply `f` to the project's state under the lock.
    pub fn update<R>(
        &self,
        project_id: Uuid,
        f: impl FnOnce(&mut WorkflowState) -> Result<R>,
    ) -> Result<R> {
        let mut states = self.states.lock().expect("state table poisoned");
        let state = states
            .get_mut(&project_id)
            .ok_or(GtmError::WorkflowNotFound(project_id))?;
        f(state)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
