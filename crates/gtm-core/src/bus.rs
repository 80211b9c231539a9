//! Synchronous fan-out event bus.
//!
//! `publish` invokes every handler registered for the event's kind, in
//! subscription order, to completion before returning. Handler failures are
//! caught and logged individually: one handler failing never prevents its
//! siblings from running and never reaches the publisher. Ordering across
//! independently published events is not defined here.

use crate::error::Result;
use crate::event::{DomainEvent, EventKind};
use crate::store::EventStore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error};

// ---------------------------------------------------------------------------
// EventHandler
// ---------------------------------------------------------------------------

/// A subscriber for one or more event kinds.
///
/// Handlers receive the pipeline context so they can emit follow-up events
/// without holding a reference back to the bus.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &DomainEvent, ctx: &PipelineContext<'_>) -> Result<()>;

    /// Short name used in failure logs.
    fn name(&self) -> &str {
        "handler"
    }
}

// ---------------------------------------------------------------------------
// PipelineContext
// ---------------------------------------------------------------------------

/// Store and bus handles passed through every `publish` call.
pub struct PipelineContext<'a> {
    pub store: &'a dyn EventStore,
    pub bus: &'a EventBus,
}

impl PipelineContext<'_> {
    /// Append the event to the store, then fan it out.
    ///
    /// The append happens strictly before any handler runs, so the log is
    /// always at least as complete as the side effects derived from it.
    pub fn emit(&self, event: DomainEvent) -> Result<()> {
        self.store.append(&event)?;
        self.bus.publish(&event, self);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event kind.
    ///
    /// Subscribing the same handler instance twice is permitted and results
    /// in two invocations per event; there is no deduplication.
    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().expect("bus registry poisoned");
        handlers.entry(kind).or_default().push(handler);
    }

    /// Remove the first registration of `handler` for `kind`, matched by
    /// pointer identity.
    pub fn unsubscribe(&self, kind: EventKind, handler: &Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().expect("bus registry poisoned");
        if let Some(list) = handlers.get_mut(&kind) {
            if let Some(pos) = list.iter().position(|h| Arc::ptr_eq(h, handler)) {
                list.remove(pos);
            }
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.read().expect("bus registry poisoned");
        handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Synchronous fan-out: every handler for the event's kind runs to
    /// completion, in subscription order, before this returns.
    ///
    /// The handler list is snapshotted outside the lock so handlers may
    /// publish follow-up events or change subscriptions re-entrantly.
    pub fn publish(&self, event: &DomainEvent, ctx: &PipelineContext<'_>) {
        let snapshot: Vec<Arc<dyn EventHandler>> = {
            let handlers = self.handlers.read().expect("bus registry poisoned");
            handlers.get(&event.kind()).cloned().unwrap_or_default()
        };

        debug!(
            kind = %event.kind(),
            aggregate_id = %event.aggregate_id,
            handlers = snapshot.len(),
            "publishing event"
        );

        for handler in snapshot {
            if let Err(err) = handler.handle(event, ctx) {
                // Partial-failure isolation: log and keep going.
                error!(
                    kind = %event.kind(),
                    aggregate_id = %event.aggregate_id,
                    handler = handler.name(),
                    %err,
                    "event handler failed"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GtmError;
    use crate::event::DomainEvent;
    use crate::store::MemoryEventStore;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct Recording {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl EventHandler for Recording {
        fn handle(&self, _event: &DomainEvent, _ctx: &PipelineContext<'_>) -> Result<()> {
            self.log.lock().unwrap().push(self.label);
            if self.fail {
                return Err(GtmError::Store("boom".into()));
            }
            Ok(())
        }

        fn name(&self) -> &str {
            self.label
        }
    }

    fn recorder(
        label: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    ) -> Arc<dyn EventHandler> {
        Arc::new(Recording {
            label,
            log: Arc::clone(log),
            fail,
        })
    }

    fn publish_prd(bus: &EventBus) {
        let store = MemoryEventStore::new();
        let ctx = PipelineContext {
            store: &store,
            bus,
        };
        let event = DomainEvent::prd_submitted(Uuid::new_v4(), "prd");
        bus.publish(&event, &ctx);
    }

    #[test]
    fn fan_out_runs_in_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::PrdSubmitted, recorder("a", &log, false));
        bus.subscribe(EventKind::PrdSubmitted, recorder("b", &log, false));
        bus.subscribe(EventKind::PrdSubmitted, recorder("c", &log, false));

        publish_prd(&bus);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn failing_handler_does_not_stop_siblings() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::PrdSubmitted, recorder("first", &log, false));
        bus.subscribe(EventKind::PrdSubmitted, recorder("boom", &log, true));
        bus.subscribe(EventKind::PrdSubmitted, recorder("last", &log, false));

        publish_prd(&bus);
        assert_eq!(*log.lock().unwrap(), vec!["first", "boom", "last"]);
    }

    #[test]
    fn duplicate_subscription_is_invoked_twice() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = recorder("dup", &log, false);
        bus.subscribe(EventKind::PrdSubmitted, Arc::clone(&handler));
        bus.subscribe(EventKind::PrdSubmitted, handler);

        publish_prd(&bus);
        assert_eq!(*log.lock().unwrap(), vec!["dup", "dup"]);
    }

    #[test]
    fn unsubscribe_removes_one_registration() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = recorder("h", &log, false);
        bus.subscribe(EventKind::PrdSubmitted, Arc::clone(&handler));
        bus.subscribe(EventKind::PrdSubmitted, Arc::clone(&handler));
        bus.unsubscribe(EventKind::PrdSubmitted, &handler);

        assert_eq!(bus.handler_count(EventKind::PrdSubmitted), 1);
        publish_prd(&bus);
        assert_eq!(*log.lock().unwrap(), vec!["h"]);
    }

    #[test]
    fn publish_with_no_handlers_is_a_no_op() {
        let bus = EventBus::new();
        publish_prd(&bus);
        assert_eq!(bus.handler_count(EventKind::PrdSubmitted), 0);
    }
}
