//! Form session - the single-threaded event loop
//!
//! One session owns the bridge (and through it the store) plus the page.
//! Host envelopes arrive on the subscription stream with unbounded delay;
//! user actions arrive on an mpsc channel. `run` serializes both.

use std::future;

use futures::{FutureExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::host::{Completion, EnvelopeStream, HostBridge, HostEnvelope};
use crate::page::{Page, RenderedPage};
use crate::schema::ActionSchema;
use crate::store::{SetOutcome, Snapshot};

/// Something the user did on the page
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    /// Raw text typed into a field's control
    Edit { field: String, input: String },
    /// Several already-typed values at once
    Update(Snapshot),
    Reset,
    Complete(String),
    Close,
}

/// What a dispatched action did
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    Field(SetOutcome),
    Reset(bool),
    Completed(Completion),
    Closed,
}

/// How `run` ended
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub completion: Option<Completion>,
    /// Actions refused with an error, as display strings
    pub rejected: Vec<String>,
}

/// Default values for every declared field, overlaid with caller values
pub fn initial_snapshot(schema: &ActionSchema, defaults: Snapshot) -> Snapshot {
    let mut snapshot = schema.empty_snapshot();
    for (name, value) in defaults {
        snapshot.insert(name, value);
    }
    snapshot
}

pub struct FormSession {
    bridge: HostBridge,
    page: Page,
    envelopes: Option<EnvelopeStream>,
}

impl FormSession {
    pub fn new(bridge: HostBridge, page: Page) -> Self {
        Self {
            bridge,
            page,
            envelopes: None,
        }
    }

    pub fn bridge(&self) -> &HostBridge {
        &self.bridge
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Register with the host. The form is usable whether or not it answers.
    pub async fn start(&mut self) {
        if let Some(stream) = self.bridge.start().await {
            self.envelopes = Some(stream);
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.envelopes.is_some()
    }

    /// Wait for the next envelope and apply it. `false` once the host
    /// stream is closed or was never opened.
    pub async fn next_envelope(&mut self) -> bool {
        let Some(stream) = self.envelopes.as_mut() else {
            return false;
        };
        let next = stream.next().await;
        match next {
            Some(envelope) => {
                self.bridge.handle_envelope(envelope).await;
                true
            }
            None => {
                self.close_stream();
                false
            }
        }
    }

    /// Apply every envelope already delivered, without waiting
    pub async fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(stream) = self.envelopes.as_mut() else {
                return applied;
            };
            let next = stream.next().now_or_never();
            match next {
                Some(Some(envelope)) => {
                    self.bridge.handle_envelope(envelope).await;
                    applied += 1;
                }
                Some(None) => self.close_stream(),
                None => return applied,
            }
        }
    }

    fn close_stream(&mut self) {
        debug!("Host envelope stream closed");
        self.envelopes = None;
    }

    /// Raw input for one field, coerced by its control
    pub async fn edit(&mut self, field: &str, input: &str) -> Result<SetOutcome> {
        self.page.apply_input(&mut self.bridge, field, input).await
    }

    pub async fn dispatch(&mut self, action: UserAction) -> Result<ActionResult> {
        match action {
            UserAction::Edit { field, input } => {
                self.edit(&field, &input).await.map(ActionResult::Field)
            }
            UserAction::Update(partial) => self
                .bridge
                .update_form_data(partial)
                .await
                .map(ActionResult::Field),
            UserAction::Reset => Ok(ActionResult::Reset(self.bridge.reset_form().await)),
            UserAction::Complete(outcome) => self
                .page
                .press(&mut self.bridge, &outcome)
                .await
                .map(ActionResult::Completed),
            UserAction::Close => Ok(ActionResult::Closed),
        }
    }

    /// Serve host envelopes and user actions until the task is completed,
    /// the user closes the form, or the action channel is dropped.
    pub async fn run(&mut self, mut actions: mpsc::UnboundedReceiver<UserAction>) -> SessionReport {
        self.start().await;
        let mut report = SessionReport::default();

        loop {
            tokio::select! {
                biased;

                envelope = recv_envelope(&mut self.envelopes) => match envelope {
                    Some(envelope) => self.bridge.handle_envelope(envelope).await,
                    None => self.close_stream(),
                },
                action = actions.recv() => {
                    let Some(action) = action else {
                        debug!("Action channel closed");
                        break;
                    };
                    match self.dispatch(action).await {
                        Ok(ActionResult::Closed) => break,
                        Ok(ActionResult::Completed(completion)) => {
                            report.completion = Some(completion);
                            if matches!(completion, Completion::Delivered | Completion::Fallback) {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "Action rejected");
                            report.rejected.push(e.to_string());
                        }
                    }
                }
            }
        }

        info!(completion = ?report.completion, "Session ended");
        report
    }

    pub fn render(&self) -> RenderedPage {
        self.page.render(
            &self.bridge.view(),
            self.bridge.theme(),
            self.bridge.language(),
        )
    }

    pub fn value(&self, field: &str) -> Option<Value> {
        self.bridge.store().get(field)
    }
}

/// Next envelope, or never if there is no open stream
async fn recv_envelope(stream: &mut Option<EnvelopeStream>) -> Option<HostEnvelope> {
    match stream {
        Some(stream) => stream.next().await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::host::mock::{HostCall, MockHost, RecordingFallback};
    use crate::host::OfflineHost;
    use crate::schema::{FieldRole, FieldType, FormField, ScalarType};
    use crate::store::FormStore;
    use serde_json::json;

    fn schema() -> Arc<ActionSchema> {
        Arc::new(
            ActionSchema::new(
                vec![
                    FormField::new("name", FieldType::scalar(ScalarType::Text), FieldRole::Input),
                    FormField::new("score", FieldType::scalar(ScalarType::Integer), FieldRole::Output),
                ],
                vec!["Approve".into()],
            )
            .unwrap(),
        )
    }

    fn session(host: Arc<MockHost>) -> FormSession {
        let schema = schema();
        let store = FormStore::initialize(initial_snapshot(&schema, Snapshot::new()))
            .with_schema(Arc::clone(&schema));
        FormSession::new(HostBridge::new(host, store), Page::compose(&schema))
    }

    #[test]
    fn initial_snapshot_covers_declared_fields() {
        let defaults = json!({"name": "Sarah"}).as_object().cloned().unwrap();
        let snapshot = initial_snapshot(&schema(), defaults);
        assert_eq!(snapshot, *json!({"name": "Sarah", "score": null}).as_object().unwrap());
    }

    #[tokio::test]
    async fn pump_applies_buffered_envelopes_only() {
        let host = Arc::new(MockHost::new());
        let mut session = session(host.clone());
        session.start().await;
        assert_eq!(session.pump().await, 0);

        host.push(HostEnvelope::with_data(json!({"name": "Alice"}).as_object().cloned().unwrap()));
        host.push(HostEnvelope::default().read_only(true));
        assert_eq!(session.pump().await, 2);
        assert_eq!(session.value("name"), Some(json!("Alice")));
        assert!(session.bridge().is_read_only());
    }

    #[tokio::test]
    async fn edit_goes_through_the_control() {
        let host = Arc::new(MockHost::new());
        let mut session = session(host.clone());
        session.start().await;

        session.edit("score", "3.7").await.unwrap();
        assert_eq!(session.value("score"), Some(json!(4)));
        assert!(session.edit("score", "abc").await.is_err());
        assert_eq!(session.value("score"), Some(json!(4)));
    }

    #[tokio::test]
    async fn run_serves_actions_until_completion() {
        let host = Arc::new(MockHost::new());
        let mut session = session(host.clone());
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(UserAction::Edit {
            field: "score".into(),
            input: "nope".into(),
        })
        .unwrap();
        tx.send(UserAction::Edit {
            field: "score".into(),
            input: "2".into(),
        })
        .unwrap();
        tx.send(UserAction::Complete("Approve".into())).unwrap();

        let report = session.run(rx).await;
        assert_eq!(report.completion, Some(Completion::Delivered));
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(
            host.count(|c| matches!(c, HostCall::CompleteTask { data, .. } if data["score"] == json!(2))),
            1
        );
    }

    #[tokio::test]
    async fn run_without_host_uses_fallback() {
        let schema = schema();
        let fallback = Arc::new(RecordingFallback::new());
        let store = FormStore::initialize(initial_snapshot(&schema, Snapshot::new()));
        let bridge = HostBridge::new(Arc::new(OfflineHost::new()), store)
            .with_fallback(Box::new(Arc::clone(&fallback)));
        let mut session = FormSession::new(bridge, Page::compose(&schema));

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(UserAction::Complete("Approve".into())).unwrap();
        drop(tx);

        let report = session.run(rx).await;
        assert!(!session.is_subscribed());
        assert_eq!(report.completion, Some(Completion::Fallback));
        assert_eq!(fallback.shown().len(), 1);
    }

    #[tokio::test]
    async fn dropped_action_channel_ends_the_loop() {
        let host = Arc::new(MockHost::new());
        let mut session = session(host);
        let (tx, rx) = mpsc::unbounded_channel::<UserAction>();
        drop(tx);

        let report = session.run(rx).await;
        assert_eq!(report, SessionReport::default());
    }
}
