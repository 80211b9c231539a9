//! Append-only persistence for domain events.
//!
//! # Table design
//!
//! A single `EVENTS` table uses a 32-byte composite key:
//! ```text
//! [ occurred_at_ms: u64 BE (8) | sequence: u64 BE (8) | event uuid (16) ]
//! ```
//!
//! Because the timestamp occupies the high bytes in big-endian encoding,
//! byte ordering equals occurrence ordering: a plain iteration yields the
//! full log oldest-first, and `events_since` is a single range scan. The
//! sequence is a per-store monotonic counter breaking ties between events
//! in the same millisecond, the normal case when a whole stage chain runs
//! synchronously; without it same-millisecond events would sort by their
//! random uuid bytes. The per-aggregate and per-kind views filter the
//! scan; there is no secondary index, no compaction, and no snapshotting —
//! replay walks the whole log.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::error::{GtmError, Result};
use crate::event::{DomainEvent, EventKind};

// ---------------------------------------------------------------------------
// EventStore trait
// ---------------------------------------------------------------------------

/// Append-only event log keyed by aggregate (project) id.
pub trait EventStore: Send + Sync {
    /// Append one event. Events are never updated or deleted.
    fn append(&self, event: &DomainEvent) -> Result<()>;

    /// All events for an aggregate, ordered by occurrence time ascending.
    fn events_for(&self, aggregate_id: Uuid) -> Result<Vec<DomainEvent>>;

    /// All events of one kind across aggregates, oldest first.
    fn events_by_kind(&self, kind: EventKind) -> Result<Vec<DomainEvent>>;

    /// All events with `occurred_at >= since`, oldest first.
    fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<DomainEvent>>;
}

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

/// Key: 32-byte composite (occurred_at_ms BE ++ sequence BE ++ event uuid)
/// Value: JSON-encoded DomainEvent
const EVENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("events");

const KEY_LEN: usize = 32;

fn event_key(ts: DateTime<Utc>, seq: u64, id: Uuid) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    let ms = ts.timestamp_millis().max(0) as u64;
    key[..8].copy_from_slice(&ms.to_be_bytes());
    key[8..16].copy_from_slice(&seq.to_be_bytes());
    key[16..].copy_from_slice(id.as_bytes());
    key
}

/// Lower bound for a range scan returning all events at or after `since`.
/// The zeroed sequence and uuid suffix sorts before any real event at the
/// same millisecond.
fn since_lower_bound(since: DateTime<Utc>) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    let ms = since.timestamp_millis().max(0) as u64;
    key[..8].copy_from_slice(&ms.to_be_bytes());
    key
}

/// Sequence component of a stored key. Keys are always [`KEY_LEN`] bytes.
fn key_seq(key: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    if key.len() == KEY_LEN {
        buf.copy_from_slice(&key[8..16]);
    }
    u64::from_be_bytes(buf)
}

// ---------------------------------------------------------------------------
// RedbEventStore
// ---------------------------------------------------------------------------

/// Durable event log backed by redb.
pub struct RedbEventStore {
    db: Database,
    /// Next append sequence; resumes past the last stored key on reopen.
    next_seq: AtomicU64,
}

impl RedbEventStore {
    /// Open or create the redb database at `path`.
    ///
    /// Creates the `EVENTS` table if it doesn't already exist.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(|e| GtmError::Store(e.to_string()))?;
        let wt = db.begin_write().map_err(|e| GtmError::Store(e.to_string()))?;
        let next_seq = {
            let table = wt
                .open_table(EVENTS)
                .map_err(|e| GtmError::Store(e.to_string()))?;
            let next = match table.last().map_err(|e| GtmError::Store(e.to_string()))? {
                Some((key, _)) => key_seq(key.value()) + 1,
                None => 0,
            };
            next
        };
        wt.commit().map_err(|e| GtmError::Store(e.to_string()))?;
        Ok(Self {
            db,
            next_seq: AtomicU64::new(next_seq),
        })
    }

    fn scan<F>(&self, lower: Option<[u8; KEY_LEN]>, mut keep: F) -> Result<Vec<DomainEvent>>
    where
        F: FnMut(&DomainEvent) -> bool,
    {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| GtmError::Store(e.to_string()))?;
        let table = rt
            .open_table(EVENTS)
            .map_err(|e| GtmError::Store(e.to_string()))?;

        let mut result = Vec::new();
        let range = match &lower {
            Some(lower) => table.range(lower.as_slice()..),
            None => table.range::<&[u8]>(..),
        }
        .map_err(|e| GtmError::Store(e.to_string()))?;

        for entry in range {
            let (_, v) = entry.map_err(|e| GtmError::Store(e.to_string()))?;
            let event: DomainEvent = serde_json::from_slice(v.value())?;
            if keep(&event) {
                result.push(event);
            }
        }
        Ok(result)
    }
}

impl EventStore for RedbEventStore {
    fn append(&self, event: &DomainEvent) -> Result<()> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let key = event_key(event.occurred_at, seq, event.id);
        let value = serde_json::to_vec(event)?;
        let wt = self
            .db
            .begin_write()
            .map_err(|e| GtmError::Store(e.to_string()))?;
        {
            let mut table = wt
                .open_table(EVENTS)
                .map_err(|e| GtmError::Store(e.to_string()))?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(|e| GtmError::Store(e.to_string()))?;
        }
        wt.commit().map_err(|e| GtmError::Store(e.to_string()))?;
        Ok(())
    }

    fn events_for(&self, aggregate_id: Uuid) -> Result<Vec<DomainEvent>> {
        self.scan(None, |e| e.aggregate_id == aggregate_id)
    }

    fn events_by_kind(&self, kind: EventKind) -> Result<Vec<DomainEvent>> {
        self.scan(None, |e| e.kind() == kind)
    }

    fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<DomainEvent>> {
        self.scan(Some(since_lower_bound(since)), |_| true)
    }
}

// ---------------------------------------------------------------------------
// MemoryEventStore
// ---------------------------------------------------------------------------

/// In-memory event log for tests and mock runs. Same ordering contract as
/// the redb store: append order is occurrence order.
#[derive(Default)]
pub struct MemoryEventStore {
    events: std::sync::Mutex<Vec<DomainEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("event log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventStore for MemoryEventStore {
    fn append(&self, event: &DomainEvent) -> Result<()> {
        let mut events = self.events.lock().expect("event log poisoned");
        events.push(event.clone());
        Ok(())
    }

    fn events_for(&self, aggregate_id: Uuid) -> Result<Vec<DomainEvent>> {
        let events = self.events.lock().expect("event log poisoned");
        Ok(events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    fn events_by_kind(&self, kind: EventKind) -> Result<Vec<DomainEvent>> {
        let events = self.events.lock().expect("event log poisoned");
        Ok(events.iter().filter(|e| e.kind() == kind).cloned().collect())
    }

    fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<DomainEvent>> {
        let events = self.events.lock().expect("event log poisoned");
        Ok(events
            .iter()
            .filter(|e| e.occurred_at >= since)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
