//! Event Module - session audit trail
//!
//! - `log`: `EventLog`, `Event`, `EventKind`
//! - `emitter`: `EventEmitter` trait + `NoopEmitter`

mod emitter;
mod log;

pub use emitter::{EventEmitter, NoopEmitter};
pub use log::{Event, EventKind, EventLog};
