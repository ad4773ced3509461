//! In-process host for tests and scripted replays
//!
//! Records every outbound call and lets the caller push envelopes as the
//! host would. Notification and completion failures can be switched on to
//! exercise the host-absent paths.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

use super::client::{EnvelopeStream, HostClient};
use super::envelope::{Credentials, HostEnvelope};
use super::fallback::CompletionFallback;
use super::service::{service_root, ServiceClient, ServiceClientFactory};
use crate::error::{ActionFormError, Result};
use crate::store::Snapshot;

/// One outbound call received by the mock host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    Subscribe,
    Ready,
    DataChanged { data: Snapshot },
    CompleteTask { outcome: String, data: Snapshot },
}

pub struct MockHost {
    sender: UnboundedSender<HostEnvelope>,
    receiver: Mutex<Option<UnboundedReceiver<HostEnvelope>>>,
    calls: Mutex<Vec<HostCall>>,
    fail_notifications: Mutex<bool>,
    fail_completion: Mutex<bool>,
}

impl MockHost {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            calls: Mutex::new(Vec::new()),
            fail_notifications: Mutex::new(false),
            fail_completion: Mutex::new(false),
        }
    }

    /// Push an envelope as the host would. Envelopes pushed before
    /// `subscribe` are buffered; after the stream is dropped they are lost.
    pub fn push(&self, envelope: HostEnvelope) {
        let _ = self.sender.send(envelope);
    }

    pub fn set_fail_notifications(&self, fail: bool) {
        *self.fail_notifications.lock() = fail;
    }

    pub fn set_fail_completion(&self, fail: bool) {
        *self.fail_completion.lock() = fail;
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    /// Last snapshot received through `data_changed`
    pub fn last_data(&self) -> Option<Snapshot> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            HostCall::DataChanged { data } => Some(data.clone()),
            _ => None,
        })
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostClient for MockHost {
    fn name(&self) -> &str {
        "mock"
    }

    async fn subscribe(&self) -> Result<EnvelopeStream> {
        self.record(HostCall::Subscribe);
        let receiver = self
            .receiver
            .lock()
            .take()
            .ok_or_else(|| ActionFormError::HostCall {
                call: "subscribe".to_string(),
                reason: "already subscribed".to_string(),
            })?;
        Ok(UnboundedReceiverStream::new(receiver).boxed())
    }

    async fn ready(&self) -> Result<()> {
        self.record(HostCall::Ready);
        Ok(())
    }

    async fn data_changed(&self, data: &Snapshot) -> Result<()> {
        if *self.fail_notifications.lock() {
            return Err(ActionFormError::HostCall {
                call: "data_changed".to_string(),
                reason: "host unreachable".to_string(),
            });
        }
        self.record(HostCall::DataChanged { data: data.clone() });
        Ok(())
    }

    async fn complete_task(&self, outcome: &str, data: &Snapshot) -> Result<()> {
        if *self.fail_completion.lock() {
            return Err(ActionFormError::HostCall {
                call: "complete_task".to_string(),
                reason: "host unreachable".to_string(),
            });
        }
        self.record(HostCall::CompleteTask {
            outcome: outcome.to_string(),
            data: data.clone(),
        });
        Ok(())
    }
}

/// Service client that only remembers its root and token
#[derive(Debug)]
pub struct MockServiceClient {
    root: Url,
    token: Arc<Mutex<String>>,
}

#[async_trait]
impl ServiceClient for MockServiceClient {
    fn root(&self) -> &Url {
        &self.root
    }

    fn update_token(&mut self, token: &str) {
        *self.token.lock() = token.to_string();
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        Ok(serde_json::json!({ "path": path, "token": *self.token.lock() }))
    }
}

/// Factory recording every connect and exposing the live token
#[derive(Debug, Default)]
pub struct MockServiceFactory {
    connects: Mutex<Vec<String>>,
    token: Arc<Mutex<String>>,
}

impl MockServiceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots of every client built, in order
    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().clone()
    }

    /// Token currently held by the latest client
    pub fn current_token(&self) -> String {
        self.token.lock().clone()
    }
}

impl ServiceClientFactory for Arc<MockServiceFactory> {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn ServiceClient>> {
        let root = service_root(credentials)?;
        self.connects.lock().push(root.to_string());
        *self.token.lock() = credentials.token.clone();
        Ok(Box::new(MockServiceClient {
            root,
            token: Arc::clone(&self.token),
        }))
    }
}

/// Fallback that records what would have been shown
#[derive(Debug, Default)]
pub struct RecordingFallback {
    shown: Mutex<Vec<(String, Snapshot)>>,
}

impl RecordingFallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<(String, Snapshot)> {
        self.shown.lock().clone()
    }
}

impl CompletionFallback for Arc<RecordingFallback> {
    fn show(&self, outcome: &str, data: &Snapshot) {
        self.shown.lock().push((outcome.to_string(), data.clone()));
    }
}
