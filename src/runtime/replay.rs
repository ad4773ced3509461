//! Scripted replay against the in-process mock host
//!
//! A script interleaves host envelopes and user actions:
//!
//! ```yaml
//! defaults: { patientName: "Sarah Johnson" }
//! steps:
//!   - host: { data: { patientName: "Alice" }, isReadOnly: false }
//!   - edit: { field: reviewerComments, input: "ok" }
//!   - reset
//!   - complete: Approve
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::session::{initial_snapshot, FormSession, UserAction};
use crate::error::Result;
use crate::event::{Event, EventLog};
use crate::host::mock::{HostCall, MockHost, MockServiceFactory, RecordingFallback};
use crate::host::{HostBridge, HostEnvelope};
use crate::page::{Page, RenderedPage};
use crate::schema::ActionSchema;
use crate::store::{FormStore, Snapshot};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Host(HostEnvelope),
    Edit { field: String, input: Value },
    Update(Snapshot),
    Reset,
    Complete(String),
}

impl ScriptStep {
    fn into_action(self) -> Option<UserAction> {
        match self {
            ScriptStep::Host(_) => None,
            ScriptStep::Edit { field, input } => Some(UserAction::Edit {
                field,
                input: match input {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                },
            }),
            ScriptStep::Update(partial) => Some(UserAction::Update(partial)),
            ScriptStep::Reset => Some(UserAction::Reset),
            ScriptStep::Complete(outcome) => Some(UserAction::Complete(outcome)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    #[serde(default)]
    pub defaults: Snapshot,
    /// Simulate a host that drops "data changed" notifications
    #[serde(default)]
    pub fail_notifications: bool,
    /// Simulate a host that cannot take the completion
    #[serde(default)]
    pub fail_completion: bool,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl ReplayScript {
    /// Parse YAML (or JSON) script text
    pub fn parse(text: &str) -> Result<Self> {
        // Through serde_json so single-key maps select enum variants
        let value: Value = serde_yaml::from_str(text)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub events: Vec<Event>,
    pub calls: Vec<HostCall>,
    pub fallback: Vec<(String, Snapshot)>,
    pub rejected: Vec<String>,
    pub page: RenderedPage,
}

#[instrument(skip_all, fields(steps = script.steps.len()))]
pub async fn replay(schema: Arc<ActionSchema>, script: ReplayScript) -> Result<ReplayReport> {
    let host = Arc::new(MockHost::new());
    host.set_fail_notifications(script.fail_notifications);
    host.set_fail_completion(script.fail_completion);
    let fallback = Arc::new(RecordingFallback::new());
    let log = EventLog::new();

    let store = FormStore::initialize(initial_snapshot(&schema, script.defaults))
        .with_schema(Arc::clone(&schema));
    let bridge = HostBridge::new(host.clone(), store)
        .with_service_factory(Box::new(Arc::new(MockServiceFactory::new())))
        .with_fallback(Box::new(Arc::clone(&fallback)))
        .with_events(Arc::new(log.clone()));
    let mut session = FormSession::new(bridge, Page::compose(&schema));
    session.start().await;

    let mut rejected = Vec::new();
    for (index, step) in script.steps.into_iter().enumerate() {
        if let ScriptStep::Host(envelope) = step {
            host.push(envelope);
            session.pump().await;
            continue;
        }
        if let Some(action) = step.into_action() {
            if let Err(e) = session.dispatch(action).await {
                debug!(step = index, error = %e, "Step rejected");
                rejected.push(format!("step {}: {}", index + 1, e));
            }
        }
    }

    Ok(ReplayReport {
        events: log.events(),
        calls: host.calls(),
        fallback: fallback.shown(),
        rejected,
        page: session.render(),
    })
}
