//! Host bridge - the form/host synchronization protocol
//!
//! ```text
//! Uninitialized ──start()──▶ AwaitingHost ──first envelope──▶ Connected
//!                                  │                              │
//!                                  └──────── complete_task() ─────┴──▶ Completed
//! ```
//!
//! - `start` registers one subscription and sends one `ready` signal; it is
//!   guarded by the state so re-running it does nothing.
//! - Every envelope is applied independently (data, read-only flag,
//!   theme/language, credentials, token refresh).
//! - Host failures never roll back form state: notifications are dropped,
//!   completions fall back to a local display.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::client::{EnvelopeStream, HostClient};
use super::envelope::{HostEnvelope, HostSettings};
use super::fallback::{CompletionFallback, ConsoleFallback};
use super::service::{HttpServiceFactory, ServiceClient, ServiceClientFactory};
use crate::error::{ActionFormError, Result};
use crate::event::{EventEmitter, EventKind, NoopEmitter};
use crate::store::{FormStore, FormView, SetOutcome, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    Uninitialized,
    AwaitingHost,
    Connected,
    Completed,
}

/// How a `complete_task` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Host accepted the outcome
    Delivered,
    /// Host absent; payload surfaced through the fallback
    Fallback,
    /// Task was already completed; nothing sent
    AlreadyCompleted,
    /// Host marked the form read-only; nothing sent
    ReadOnly,
}

pub struct HostBridge {
    host: Arc<dyn HostClient>,
    store: FormStore,
    state: BridgeState,
    settings: HostSettings,
    service_factory: Box<dyn ServiceClientFactory>,
    service: Option<Box<dyn ServiceClient>>,
    fallback: Box<dyn CompletionFallback>,
    events: Arc<dyn EventEmitter>,
}

impl HostBridge {
    pub fn new(host: Arc<dyn HostClient>, store: FormStore) -> Self {
        Self {
            host,
            store,
            state: BridgeState::Uninitialized,
            settings: HostSettings::default(),
            service_factory: Box::new(HttpServiceFactory::new()),
            service: None,
            fallback: Box::new(ConsoleFallback::default()),
            events: Arc::new(NoopEmitter::new()),
        }
    }

    /// Theme/language used until the host says otherwise
    pub fn with_settings(mut self, settings: HostSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_service_factory(mut self, factory: Box<dyn ServiceClientFactory>) -> Self {
        self.service_factory = factory;
        self
    }

    pub fn with_fallback(mut self, fallback: Box<dyn CompletionFallback>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventEmitter>) -> Self {
        self.events = events;
        self
    }

    // ═══════════════════════════════════════════════════════════════
    // State exposed to page composition
    // ═══════════════════════════════════════════════════════════════

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    pub fn view(&self) -> FormView {
        self.store.view()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn is_read_only(&self) -> bool {
        self.store.is_read_only()
    }

    pub fn has_host_data(&self) -> bool {
        self.store.has_host_data()
    }

    pub fn theme(&self) -> &str {
        &self.settings.theme
    }

    pub fn language(&self) -> &str {
        &self.settings.language
    }

    /// Authenticated client, once full credentials have arrived
    pub fn service(&self) -> Option<&dyn ServiceClient> {
        self.service.as_deref()
    }

    // ═══════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════

    /// Register the host subscription and signal readiness, once.
    ///
    /// Returns the envelope stream on the first call if the host accepted
    /// the subscription; `None` otherwise (preview mode or repeated call).
    #[instrument(skip(self), fields(host = self.host.name()))]
    pub async fn start(&mut self) -> Option<EnvelopeStream> {
        if self.state != BridgeState::Uninitialized {
            debug!(state = ?self.state, "Bridge already started");
            return None;
        }
        self.state = BridgeState::AwaitingHost;
        self.events.emit(EventKind::SessionStarted {
            field_count: self.store.snapshot().len(),
        });

        let stream = match self.host.subscribe().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Host subscription failed, continuing with default data");
                self.events.emit(EventKind::SubscriptionFailed {
                    error: e.to_string(),
                });
                return None;
            }
        };

        if let Err(e) = self.host.ready().await {
            debug!(error = %e, "Ready signal not delivered");
        }
        info!("Waiting for host data");
        Some(stream)
    }

    /// Apply one host-pushed envelope
    #[instrument(skip(self, envelope), fields(state = ?self.state))]
    pub async fn handle_envelope(&mut self, envelope: HostEnvelope) {
        let first = self.state == BridgeState::AwaitingHost;
        if first {
            self.state = BridgeState::Connected;
            info!("Host connected");
        }
        self.events.emit(EventKind::EnvelopeReceived {
            has_data: envelope.data.is_some(),
            read_only: envelope.is_read_only,
        });

        self.apply_settings(&envelope);
        self.apply_credentials(&envelope);

        let HostEnvelope {
            data, is_read_only, ..
        } = envelope;
        if first || data.is_some() || is_read_only.is_some() {
            let field_count = data.as_ref().map(|d| d.len());
            let applied = self.store.apply_host_snapshot(data, is_read_only);
            if let Some(field_count) = field_count.filter(|_| applied) {
                debug!(field_count, "Host data applied");
                self.events.emit(EventKind::HostDataApplied { field_count });
            }
        }
    }

    fn apply_settings(&mut self, envelope: &HostEnvelope) {
        let mut changed = false;
        if let Some(theme) = envelope.theme_update() {
            changed |= self.settings.theme != theme;
            self.settings.theme = theme.to_string();
        }
        if let Some(language) = envelope.language_update() {
            changed |= self.settings.language != language;
            self.settings.language = language.to_string();
        }
        if changed {
            debug!(theme = %self.settings.theme, language = %self.settings.language, "Settings changed");
            self.events.emit(EventKind::SettingsChanged {
                theme: self.settings.theme.clone(),
                language: self.settings.language.clone(),
            });
        }
    }

    fn apply_credentials(&mut self, envelope: &HostEnvelope) {
        if let Some(credentials) = envelope.credentials() {
            match self.service_factory.connect(&credentials) {
                Ok(client) => {
                    info!(root = %client.root(), "Service client initialized");
                    self.events.emit(EventKind::CredentialsApplied {
                        base_url: credentials.base_url.clone(),
                    });
                    self.service = Some(client);
                }
                Err(e) => warn!(error = %e, "Could not initialize service client"),
            }
        }

        if let Some(token) = envelope.refreshed_token() {
            match self.service.as_mut() {
                Some(client) => {
                    client.update_token(token);
                    debug!("Service token refreshed");
                    self.events.emit(EventKind::TokenRefreshed);
                }
                None => debug!("Token refresh before credentials, ignored"),
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Operations exposed to page composition
    // ═══════════════════════════════════════════════════════════════

    /// Set one field and notify the host with the full snapshot
    pub async fn update_field(&mut self, name: &str, value: Value) -> Result<SetOutcome> {
        let outcome = self.store.set_field(name, value)?;
        if let SetOutcome::Applied(snapshot) = &outcome {
            self.events.emit(EventKind::FieldsChanged {
                fields: vec![name.to_string()],
            });
            self.notify_data_changed(snapshot).await;
        }
        Ok(outcome)
    }

    /// Set several fields atomically and notify once
    pub async fn update_form_data(&mut self, partial: Snapshot) -> Result<SetOutcome> {
        let fields: Vec<String> = partial.keys().cloned().collect();
        let outcome = self.store.set_fields(partial)?;
        if let SetOutcome::Applied(snapshot) = &outcome {
            self.events.emit(EventKind::FieldsChanged { fields });
            self.notify_data_changed(snapshot).await;
        }
        Ok(outcome)
    }

    /// Restore the last externally supplied baseline. `false` if read-only.
    pub async fn reset_form(&mut self) -> bool {
        match self.store.reset() {
            Some(snapshot) => {
                self.events.emit(EventKind::FormReset);
                self.notify_data_changed(&snapshot).await;
                true
            }
            None => false,
        }
    }

    /// Commit an outcome with the current snapshot
    #[instrument(skip(self))]
    pub async fn complete_task(&mut self, outcome: &str) -> Result<Completion> {
        if self.state == BridgeState::Completed {
            debug!("Task already completed");
            return Ok(Completion::AlreadyCompleted);
        }
        if self.store.is_read_only() {
            debug!("Form is read-only, completion ignored");
            return Ok(Completion::ReadOnly);
        }

        let data = self.store.snapshot();
        if let Some(schema) = self.store.schema() {
            if !schema.has_outcome(outcome) {
                return Err(ActionFormError::UnknownOutcome {
                    outcome: outcome.to_string(),
                    declared: schema.outcomes().join(", "),
                });
            }
            let missing = schema.missing_required(&data);
            if !missing.is_empty() {
                return Err(ActionFormError::MissingRequired { fields: missing });
            }
        }

        let completion = match self.host.complete_task(outcome, &data).await {
            Ok(()) => {
                info!(outcome, "Task completed");
                self.events.emit(EventKind::TaskCompleted {
                    outcome: outcome.to_string(),
                    data: Value::Object(data),
                });
                Completion::Delivered
            }
            Err(e) => {
                debug!(error = %e, "Host did not take completion, showing it locally");
                self.fallback.show(outcome, &data);
                self.events.emit(EventKind::FallbackShown {
                    outcome: outcome.to_string(),
                    data: Value::Object(data),
                });
                Completion::Fallback
            }
        };

        self.state = BridgeState::Completed;
        self.store.finalize();
        Ok(completion)
    }

    /// Send the full snapshot; failure is expected without a host
    async fn notify_data_changed(&self, snapshot: &Snapshot) {
        if let Err(e) = self.host.data_changed(snapshot).await {
            debug!(error = %e, "Data change notification dropped");
            self.events.emit(EventKind::NotificationDropped {
                error: e.to_string(),
            });
        }
    }
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge")
            .field("host", &self.host.name())
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("store", &self.store)
            .field("service", &self.service)
            .finish()
    }
}
