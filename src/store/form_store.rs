//! Form state store
//!
//! Single owner of the session's field values. The current state lives in a
//! `tokio::sync::watch` channel so every mutation is published as ONE
//! `FormView`: observers never see `has_host_data = true` next to values
//! from before the host payload.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{ActionFormError, Result};
use crate::schema::ActionSchema;

/// Field values at rest: name → dynamic value
pub type Snapshot = Map<String, Value>;

/// Everything an observer (page, host notifier) can read at once
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub values: Snapshot,
    pub has_host_data: bool,
    pub is_read_only: bool,
}

/// Why a write was dropped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Host marked the task read-only, or the task is completed
    ReadOnly,
    /// Input-role fields are host-owned
    InputField,
}

/// Result of a store write
#[derive(Debug, Clone, PartialEq)]
pub enum SetOutcome {
    /// Write applied; carries the full updated snapshot
    Applied(Snapshot),
    /// Silent no-op
    Ignored(IgnoreReason),
}

impl SetOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SetOutcome::Applied(_))
    }
}

pub struct FormStore {
    state: watch::Sender<FormView>,
    /// Last externally supplied values (initial default or host data)
    baseline: Snapshot,
    /// Set once the task is completed; read-only can no longer be lifted
    finalized: bool,
    schema: Option<Arc<ActionSchema>>,
}

impl FormStore {
    /// Start a session with the caller's default snapshot
    pub fn initialize(default: Snapshot) -> Self {
        let (state, _) = watch::channel(FormView {
            values: default.clone(),
            has_host_data: false,
            is_read_only: false,
        });
        Self {
            state,
            baseline: default,
            finalized: false,
            schema: None,
        }
    }

    /// Validate writes against a declared schema
    pub fn with_schema(mut self, schema: Arc<ActionSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn schema(&self) -> Option<&Arc<ActionSchema>> {
        self.schema.as_ref()
    }

    /// Observe every published state
    pub fn subscribe(&self) -> watch::Receiver<FormView> {
        self.state.subscribe()
    }

    pub fn view(&self) -> FormView {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().values.clone()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.state.borrow().values.get(name).cloned()
    }

    pub fn has_host_data(&self) -> bool {
        self.state.borrow().has_host_data
    }

    pub fn is_read_only(&self) -> bool {
        self.state.borrow().is_read_only
    }

    /// Values `reset` would restore
    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    /// Apply a host payload: values (if any), read-only flag (if any), and
    /// `has_host_data = true`, published together. `false` if the task is
    /// already completed and nothing was applied.
    pub fn apply_host_snapshot(
        &mut self,
        data: Option<Snapshot>,
        read_only: Option<bool>,
    ) -> bool {
        if self.finalized {
            debug!("Ignoring host snapshot: task already completed");
            return false;
        }

        if let (Some(schema), Some(values)) = (&self.schema, &data) {
            for (name, value) in values {
                match schema.field(name) {
                    Some(field) if !field.field_type.accepts(value) => warn!(
                        field = %name,
                        expected = %field.field_type,
                        "Host value does not match declared type"
                    ),
                    None => debug!(field = %name, "Host sent undeclared field"),
                    _ => {}
                }
            }
        }

        if let Some(values) = &data {
            self.baseline = values.clone();
        }

        self.state.send_modify(|view| {
            if let Some(values) = data {
                view.values = values;
            }
            if let Some(read_only) = read_only {
                view.is_read_only = read_only;
            }
            view.has_host_data = true;
        });
        true
    }

    /// Merge one field. No-op while read-only.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<SetOutcome> {
        if self.is_read_only() {
            debug!(field = %name, "Ignoring edit: form is read-only");
            return Ok(SetOutcome::Ignored(IgnoreReason::ReadOnly));
        }
        if let Some(reason) = self.check_write(name, &value)? {
            return Ok(SetOutcome::Ignored(reason));
        }

        self.state.send_modify(|view| {
            view.values.insert(name.to_string(), value);
        });
        Ok(SetOutcome::Applied(self.snapshot()))
    }

    /// Merge several fields atomically: every key is checked before any is
    /// written, and observers see a single update.
    pub fn set_fields(&mut self, partial: Snapshot) -> Result<SetOutcome> {
        if self.is_read_only() {
            debug!(fields = partial.len(), "Ignoring edits: form is read-only");
            return Ok(SetOutcome::Ignored(IgnoreReason::ReadOnly));
        }
        for (name, value) in &partial {
            if let Some(reason) = self.check_write(name, value)? {
                return Ok(SetOutcome::Ignored(reason));
            }
        }

        self.state.send_modify(|view| {
            for (name, value) in partial {
                view.values.insert(name, value);
            }
        });
        Ok(SetOutcome::Applied(self.snapshot()))
    }

    /// Restore the last externally supplied baseline. `None` while read-only.
    pub fn reset(&mut self) -> Option<Snapshot> {
        if self.is_read_only() {
            debug!("Ignoring reset: form is read-only");
            return None;
        }
        let baseline = self.baseline.clone();
        self.state.send_modify(|view| view.values = baseline);
        Some(self.snapshot())
    }

    /// Lock the form permanently (task completed)
    pub fn finalize(&mut self) {
        self.finalized = true;
        self.state.send_if_modified(|view| {
            let changed = !view.is_read_only;
            view.is_read_only = true;
            changed
        });
    }

    fn check_write(&self, name: &str, value: &Value) -> Result<Option<IgnoreReason>> {
        let Some(schema) = &self.schema else {
            return Ok(None);
        };
        let field = schema
            .field(name)
            .ok_or_else(|| ActionFormError::UnknownField {
                name: name.to_string(),
            })?;
        if !field.role.is_editable() {
            debug!(field = %name, "Ignoring edit: input fields are host-owned");
            return Ok(Some(IgnoreReason::InputField));
        }
        if !field.field_type.accepts(value) {
            return Err(ActionFormError::TypeMismatch {
                name: name.to_string(),
                expected: field.field_type.to_string(),
                actual: value.to_string(),
            });
        }
        Ok(None)
    }
}

impl std::fmt::Debug for FormStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let view = self.state.borrow();
        f.debug_struct("FormStore")
            .field("fields", &view.values.len())
            .field("has_host_data", &view.has_host_data)
            .field("is_read_only", &view.is_read_only)
            .field("finalized", &self.finalized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldRole, FieldType, FormField, ScalarType};
    use serde_json::json;

    fn snap(value: Value) -> Snapshot {
        value.as_object().cloned().unwrap()
    }

    fn review_schema() -> Arc<ActionSchema> {
        Arc::new(
            ActionSchema::new(
                vec![
                    FormField::new("patientName", FieldType::scalar(ScalarType::Text), FieldRole::Input),
                    FormField::new("comments", FieldType::scalar(ScalarType::Text), FieldRole::Output),
                    FormField::new("days", FieldType::scalar(ScalarType::Integer), FieldRole::InOut),
                ],
                vec!["Approve".into()],
            )
            .unwrap(),
        )
    }

    // ═══════════════════════════════════════════════════════════════
    // initialize / set_field
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn initialize_uses_default_snapshot() {
        let store = FormStore::initialize(snap(json!({"patientName": "Sarah Johnson"})));
        assert_eq!(store.get("patientName"), Some(json!("Sarah Johnson")));
        assert!(!store.has_host_data());
        assert!(!store.is_read_only());
    }

    #[test]
    fn set_field_merges_and_returns_full_snapshot() {
        let mut store = FormStore::initialize(snap(json!({"patientName": "Sarah Johnson"})));
        let outcome = store.set_field("comments", json!("looks fine")).unwrap();
        assert_eq!(
            outcome,
            SetOutcome::Applied(snap(json!({"patientName": "Sarah Johnson", "comments": "looks fine"})))
        );
    }

    #[test]
    fn set_field_is_noop_when_read_only() {
        let mut store = FormStore::initialize(snap(json!({"a": 1})));
        store.apply_host_snapshot(None, Some(true));

        let outcome = store.set_field("a", json!(2)).unwrap();
        assert_eq!(outcome, SetOutcome::Ignored(IgnoreReason::ReadOnly));
        assert_eq!(store.get("a"), Some(json!(1)));
    }

    #[test]
    fn schema_rejects_type_mismatch_without_storing() {
        let mut store = FormStore::initialize(Snapshot::new()).with_schema(review_schema());
        let err = store.set_field("days", json!("three")).unwrap_err();
        assert!(matches!(err, ActionFormError::TypeMismatch { .. }));
        assert_eq!(store.get("days"), None);
    }

    #[test]
    fn schema_rejects_unknown_field() {
        let mut store = FormStore::initialize(Snapshot::new()).with_schema(review_schema());
        let err = store.set_field("nope", json!(1)).unwrap_err();
        assert!(matches!(err, ActionFormError::UnknownField { .. }));
    }

    #[test]
    fn input_fields_are_never_editable() {
        let mut store =
            FormStore::initialize(snap(json!({"patientName": "Alice"}))).with_schema(review_schema());
        let outcome = store.set_field("patientName", json!("Mallory")).unwrap();
        assert_eq!(outcome, SetOutcome::Ignored(IgnoreReason::InputField));
        assert_eq!(store.get("patientName"), Some(json!("Alice")));
    }

    // ═══════════════════════════════════════════════════════════════
    // set_fields
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn set_fields_is_all_or_nothing() {
        let mut store = FormStore::initialize(Snapshot::new()).with_schema(review_schema());
        let err = store
            .set_fields(snap(json!({"comments": "ok", "days": 1.5})))
            .unwrap_err();
        assert!(matches!(err, ActionFormError::TypeMismatch { .. }));
        assert_eq!(store.get("comments"), None);
    }

    #[test]
    fn set_fields_publishes_one_update() {
        let mut store = FormStore::initialize(Snapshot::new());
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.set_fields(snap(json!({"a": 1, "b": 2}))).unwrap();

        assert!(rx.has_changed().unwrap());
        let view = rx.borrow_and_update().clone();
        assert_eq!(view.values, snap(json!({"a": 1, "b": 2})));
        assert!(!rx.has_changed().unwrap());
    }

    // ═══════════════════════════════════════════════════════════════
    // apply_host_snapshot / reset / finalize
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn host_snapshot_replaces_values_wholesale() {
        let mut store = FormStore::initialize(snap(json!({"patientName": "Sarah Johnson", "x": 1})));
        store.apply_host_snapshot(Some(snap(json!({"patientName": "Alice"}))), Some(false));
        assert_eq!(store.snapshot(), snap(json!({"patientName": "Alice"})));
        assert!(store.has_host_data());
    }

    #[test]
    fn host_flag_and_values_arrive_together() {
        let mut store = FormStore::initialize(snap(json!({"patientName": "Sarah Johnson"})));
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.apply_host_snapshot(Some(snap(json!({"patientName": "Alice"}))), None);

        let view = rx.borrow_and_update().clone();
        assert!(view.has_host_data);
        assert_eq!(view.values["patientName"], "Alice");
    }

    #[test]
    fn read_only_only_update_keeps_values() {
        let mut store = FormStore::initialize(snap(json!({"a": 1})));
        store.apply_host_snapshot(Some(snap(json!({"a": 2}))), Some(false));
        store.apply_host_snapshot(None, Some(true));
        assert_eq!(store.get("a"), Some(json!(2)));
        assert!(store.is_read_only());
    }

    #[test]
    fn reset_restores_latest_host_baseline() {
        let mut store = FormStore::initialize(snap(json!({"a": "default"})));
        store.apply_host_snapshot(Some(snap(json!({"a": "host"}))), None);
        store.set_field("a", json!("edited")).unwrap();

        let restored = store.reset().unwrap();
        assert_eq!(restored, snap(json!({"a": "host"})));
    }

    #[test]
    fn reset_without_host_restores_default() {
        let mut store = FormStore::initialize(snap(json!({"a": "default"})));
        store.set_field("a", json!("edited")).unwrap();
        store.set_field("b", json!(true)).unwrap();
        assert_eq!(store.reset().unwrap(), snap(json!({"a": "default"})));
    }

    #[test]
    fn finalize_cannot_be_lifted_by_host() {
        let mut store = FormStore::initialize(snap(json!({"a": 1})));
        assert!(store.apply_host_snapshot(None, None));
        store.finalize();
        assert!(!store.apply_host_snapshot(Some(snap(json!({"a": 9}))), Some(false)));

        assert!(store.is_read_only());
        assert_eq!(store.get("a"), Some(json!(1)));
        assert!(store.reset().is_none());
    }
}
