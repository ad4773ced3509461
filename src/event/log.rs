//! Session event log
//!
//! Append-only audit trail of one form session:
//! - Event: envelope with id + timestamp + kind
//! - EventKind: session, host, form and completion events
//! - EventLog: thread-safe, append-only log

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single event in the session log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since session start (ms)
    pub timestamp_ms: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // SESSION
    // ═══════════════════════════════════════════
    SessionStarted {
        field_count: usize,
    },
    /// Host subscription could not be registered; preview mode
    SubscriptionFailed {
        error: String,
    },

    // ═══════════════════════════════════════════
    // HOST → FORM
    // ═══════════════════════════════════════════
    EnvelopeReceived {
        has_data: bool,
        read_only: Option<bool>,
    },
    HostDataApplied {
        field_count: usize,
    },
    SettingsChanged {
        theme: String,
        language: String,
    },
    CredentialsApplied {
        base_url: String,
    },
    TokenRefreshed,

    // ═══════════════════════════════════════════
    // FORM → HOST
    // ═══════════════════════════════════════════
    FieldsChanged {
        fields: Vec<String>,
    },
    FormReset,
    /// A "data changed" notification could not be delivered
    NotificationDropped {
        error: String,
    },
    TaskCompleted {
        outcome: String,
        data: Value,
    },
    /// Host absent at completion; payload surfaced locally
    FallbackShown {
        outcome: String,
        data: Value,
    },
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    /// Create a new event log (call at session start)
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        self.events.write().push(event);
        id
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Events matching a predicate on the kind
    pub fn filter<F>(&self, predicate: F) -> Vec<Event>
    where
        F: Fn(&EventKind) -> bool,
    {
        self.events
            .read()
            .iter()
            .filter(|e| predicate(&e.kind))
            .cloned()
            .collect()
    }

    /// Serialize to JSON for debugging / replay transcripts
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.events()).unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eventkind_serializes_with_type_tag() {
        let kind = EventKind::TaskCompleted {
            outcome: "Approve".into(),
            data: json!({"comments": "ok"}),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "task_completed");
        assert_eq!(json["outcome"], "Approve");
    }

    #[test]
    fn eventkind_deserializes_unit_variant() {
        let kind: EventKind = serde_json::from_value(json!({"type": "token_refreshed"})).unwrap();
        assert_eq!(kind, EventKind::TokenRefreshed);
    }

    #[test]
    fn emit_returns_monotonic_ids() {
        let log = EventLog::new();
        let id1 = log.emit(EventKind::SessionStarted { field_count: 2 });
        let id2 = log.emit(EventKind::FormReset);
        assert_eq!((id1, id2), (0, 1));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn filter_selects_by_kind() {
        let log = EventLog::new();
        log.emit(EventKind::FormReset);
        log.emit(EventKind::NotificationDropped {
            error: "no host".into(),
        });
        log.emit(EventKind::FormReset);

        let dropped = log.filter(|k| matches!(k, EventKind::NotificationDropped { .. }));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].id, 1);
    }

    #[test]
    fn clones_share_storage() {
        let log = EventLog::new();
        let clone = log.clone();
        clone.emit(EventKind::FormReset);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn to_json_is_an_array() {
        let log = EventLog::new();
        log.emit(EventKind::SessionStarted { field_count: 0 });
        assert!(log.to_json().is_array());
    }
}
