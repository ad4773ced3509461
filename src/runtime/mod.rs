//! Runtime Module - driving a form session
//!
//! - `session`: `FormSession` event loop over host envelopes and user actions
//! - `replay`: scripted sessions against the mock host

mod replay;
mod session;

pub use replay::{replay, ReplayReport, ReplayScript, ScriptStep};
pub use session::{initial_snapshot, ActionResult, FormSession, SessionReport, UserAction};
