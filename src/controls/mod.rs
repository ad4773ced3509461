//! Controls Module - schema-driven field controls
//!
//! - `mapper`: declared type → `ControlKind`
//! - `control`: `FieldControl` rendering and input coercion

mod control;
mod mapper;

pub use control::{FieldControl, RenderedControl, INVALID_VALUE, NOT_PROVIDED};
pub use mapper::{select_control, ControlKind};
