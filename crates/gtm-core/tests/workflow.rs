//! End-to-end runs of the event-driven pipeline over real storage.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use uuid::Uuid;

use gtm_core::analysis::Analysis;
use gtm_core::bus::{EventHandler, PipelineContext};
use gtm_core::engagement::{Engagement, FeedbackReport};
use gtm_core::error::GtmError;
use gtm_core::event::{DomainEvent, EventKind};
use gtm_core::mock::{MockChannel, MockLlm, RecordingNotifier};
use gtm_core::ports::{AnalysisDraft, ContentPlanDraft, LlmPort, StrategyDraft};
use gtm_core::repo::{AnalysisRepo, ContentPlanRepo, MemoryDb, RedbDb, StrategyRepo};
use gtm_core::state::WorkflowStep;
use gtm_core::store::{EventStore, MemoryEventStore, RedbEventStore};
use gtm_core::strategy::Strategy;
use gtm_core::workflow::WorkflowCoordinator;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Counts invocations per operation, delegating to the canned adapter.
struct CountingLlm {
    inner: MockLlm,
    analyze_calls: AtomicUsize,
}

impl CountingLlm {
    fn new() -> Self {
        Self {
            inner: MockLlm::new(),
            analyze_calls: AtomicUsize::new(0),
        }
    }
}

impl LlmPort for CountingLlm {
    fn analyze_prd(&self, prd: &str) -> gtm_core::Result<AnalysisDraft> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.analyze_prd(prd)
    }

    fn craft_strategy(&self, analysis: &Analysis) -> gtm_core::Result<StrategyDraft> {
        self.inner.craft_strategy(analysis)
    }

    fn plan_content(&self, strategy: &Strategy) -> gtm_core::Result<ContentPlanDraft> {
        self.inner.plan_content(strategy)
    }

    fn analyze_feedback(&self, engagements: &[Engagement]) -> gtm_core::Result<FeedbackReport> {
        self.inner.analyze_feedback(engagements)
    }
}

/// Fails every completion, simulating a model that returns prose instead
/// of the pinned JSON shape.
struct BrokenLlm;

impl LlmPort for BrokenLlm {
    fn analyze_prd(&self, _prd: &str) -> gtm_core::Result<AnalysisDraft> {
        Err(GtmError::ResponseShape {
            stage: gtm_core::state::Stage::Analyze,
            detail: "missing field `domain`".into(),
        })
    }

    fn craft_strategy(&self, _analysis: &Analysis) -> gtm_core::Result<StrategyDraft> {
        unreachable!("strategy stage must not run after a failed analysis")
    }

    fn plan_content(&self, _strategy: &Strategy) -> gtm_core::Result<ContentPlanDraft> {
        unreachable!("content stage must not run after a failed analysis")
    }

    fn analyze_feedback(&self, _engagements: &[Engagement]) -> gtm_core::Result<FeedbackReport> {
        unreachable!("feedback stage must not run after a failed analysis")
    }
}

/// Asserts that any event it sees is already in the store when delivered.
struct AppendBeforePublishProbe {
    store: Arc<MemoryEventStore>,
    verified: AtomicUsize,
}

impl EventHandler for AppendBeforePublishProbe {
    fn handle(&self, event: &DomainEvent, _ctx: &PipelineContext<'_>) -> gtm_core::Result<()> {
        let stored = self.store.events_for(event.aggregate_id)?;
        assert!(
            stored.iter().any(|e| e.id == event.id),
            "event {} delivered before it was appended",
            event.id
        );
        self.verified.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "append-before-publish-probe"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn full_run_over_redb_storage() {
    let dir = TempDir::new().unwrap();
    let db = Arc::new(RedbDb::open(&dir.path().join("entities.redb")).unwrap());
    let store = Arc::new(RedbEventStore::open(&dir.path().join("events.redb")).unwrap());
    let notifier = Arc::new(RecordingNotifier::new());

    let coordinator = WorkflowCoordinator::new(store.clone());
    coordinator.register_default_stages(
        Arc::new(MockLlm::new()),
        Arc::new(MockChannel::new()),
        notifier.clone(),
        db.clone(),
    );

    let project_id = Uuid::new_v4();
    coordinator
        .start_workflow(project_id, "제품명: CreatorFlow. 크리에이터를 위한 도구.")
        .unwrap();

    // The whole chain ran and every stage's entity landed in the store.
    let state = coordinator.state(project_id).unwrap();
    assert_eq!(state.step, WorkflowStep::MetricsIngested);

    let analysis = db.analysis_for_project(project_id).unwrap();
    assert!(!analysis.domain.is_empty());
    assert!(db.strategy_for_project(project_id).is_ok());
    assert!(db.plan_for_project(project_id).is_ok());

    // The feedback summary went out exactly once.
    assert_eq!(notifier.sent().len(), 1);

    // The log survives a reopen.
    drop(coordinator);
    drop(store);
    let reopened = RedbEventStore::open(&dir.path().join("events.redb")).unwrap();
    let events = reopened.events_for(project_id).unwrap();
    assert_eq!(events.len(), 6);
    assert_eq!(events[0].kind(), EventKind::PrdSubmitted);
}

#[test]
fn prd_submission_stores_one_event_and_runs_analyze_once() {
    let store = Arc::new(MemoryEventStore::new());
    let llm = Arc::new(CountingLlm::new());
    let coordinator = WorkflowCoordinator::new(store.clone());
    coordinator.register_default_stages(
        llm.clone(),
        Arc::new(MockChannel::new()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(MemoryDb::new()),
    );

    let project_id = Uuid::new_v4();
    coordinator.start_workflow(project_id, "a PRD").unwrap();

    assert_eq!(llm.analyze_calls.load(Ordering::SeqCst), 1);
    let submissions = store.events_by_kind(EventKind::PrdSubmitted).unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].aggregate_id, project_id);
}

#[test]
fn events_are_appended_before_handlers_see_them() {
    let store = Arc::new(MemoryEventStore::new());
    let coordinator = WorkflowCoordinator::new(store.clone());
    coordinator.register_default_stages(
        Arc::new(MockLlm::new()),
        Arc::new(MockChannel::new()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(MemoryDb::new()),
    );

    let probe = Arc::new(AppendBeforePublishProbe {
        store: store.clone(),
        verified: AtomicUsize::new(0),
    });
    for kind in EventKind::all() {
        coordinator
            .bus()
            .subscribe(*kind, probe.clone() as Arc<dyn EventHandler>);
    }

    let project_id = Uuid::new_v4();
    coordinator.start_workflow(project_id, "a PRD").unwrap();
    assert_eq!(probe.verified.load(Ordering::SeqCst), 6);
}

#[test]
fn a_failed_stage_stops_the_chain_and_keeps_the_log() {
    let store = Arc::new(MemoryEventStore::new());
    let coordinator = WorkflowCoordinator::new(store.clone());
    coordinator.register_default_stages(
        Arc::new(BrokenLlm),
        Arc::new(MockChannel::new()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(MemoryDb::new()),
    );

    let project_id = Uuid::new_v4();
    // The submission itself succeeds; the analyze handler's failure is
    // isolated by the bus.
    coordinator.start_workflow(project_id, "a PRD").unwrap();

    let events = store.events_for(project_id).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::PrdSubmitted);

    let state = coordinator.state(project_id).unwrap();
    assert_eq!(state.step, WorkflowStep::PrdSubmitted);
    assert!(state.analysis.is_none());
}

#[test]
fn replay_does_not_grow_the_log() {
    let store = Arc::new(MemoryEventStore::new());
    let coordinator = WorkflowCoordinator::new(store.clone());
    coordinator.register_default_stages(
        Arc::new(MockLlm::new()),
        Arc::new(MockChannel::new()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(MemoryDb::new()),
    );

    let project_id = Uuid::new_v4();
    coordinator.start_workflow(project_id, "a PRD").unwrap();
    let before = store.events_for(project_id).unwrap();

    // Re-running stages over accumulated state trips the write-once rule;
    // the bus isolates those failures and nothing new is appended.
    let replayed = coordinator.replay(project_id).unwrap();
    assert_eq!(replayed, before.len());
    assert_eq!(store.events_for(project_id).unwrap(), before);
}

#[test]
fn two_projects_keep_separate_logs() {
    let store = Arc::new(MemoryEventStore::new());
    let coordinator = WorkflowCoordinator::new(store.clone());
    coordinator.register_default_stages(
        Arc::new(MockLlm::new()),
        Arc::new(MockChannel::new()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(MemoryDb::new()),
    );

    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    coordinator.start_workflow(first, "first PRD").unwrap();
    coordinator.start_workflow(second, "second PRD").unwrap();

    let first_events = store.events_for(first).unwrap();
    let second_events = store.events_for(second).unwrap();
    assert_eq!(first_events.len(), 6);
    assert_eq!(second_events.len(), 6);
    assert!(first_events.iter().all(|e| e.aggregate_id == first));
    assert!(second_events.iter().all(|e| e.aggregate_id == second));
}
