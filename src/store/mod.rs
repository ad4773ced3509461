//! Store Module - form state management
//!
//! Key types:
//! - `FormStore`: owner of the working snapshot and its flags
//! - `FormView`: one consistent published state
//! - `SetOutcome`: applied snapshot or silent no-op

mod form_store;

pub use form_store::{FormStore, FormView, IgnoreReason, SetOutcome, Snapshot};
