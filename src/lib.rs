//! action-form - form/host synchronization runtime for Action App forms
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  schema/    Declared fields + outcomes (ActionSchema)        │
//! │  controls/  Type → control mapping, display, coercion        │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  host/      HostBridge state machine, envelopes, fallback    │
//! │  page       Sections of controls + outcome buttons           │
//! │  runtime/   FormSession event loop, scripted replay          │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  store/     Form state (watch-published FormView)            │
//! │  event/     Session audit trail (EventLog, EventKind)        │
//! │  config     ~/.config/action-form/config.toml + env          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`schema`] | Schema document parsing and validation |
//! | [`controls`] | `select_control`, `FieldControl::render` / `coerce` |
//! | [`store`] | Snapshot, baseline, read-only and host-data flags |
//! | [`host`] | Host protocol: subscribe, ready, data changed, complete |
//! | [`page`] | Composition of controls into a page |
//! | [`runtime`] | Single-threaded session loop |
//! | [`event`] | Event log for transcripts and tests |
//! | [`config`] | Preview defaults |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod controls;
pub mod schema;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER
// ═══════════════════════════════════════════════════════════════
pub mod host;
pub mod page;
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;
pub mod event;
pub mod store;

pub use config::FormConfig;
pub use controls::{select_control, ControlKind, FieldControl};
pub use error::{ActionFormError, FixSuggestion, Result};
pub use event::{Event, EventKind, EventLog};
pub use host::{BridgeState, Completion, HostBridge, HostClient, HostEnvelope, OfflineHost};
pub use page::Page;
pub use runtime::{FormSession, UserAction};
pub use schema::{ActionSchema, FieldRole, FieldType, FormField, ScalarType};
pub use store::{FormStore, FormView, SetOutcome, Snapshot};
