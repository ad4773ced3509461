//! Host client abstraction
//!
//! The host is the workflow system embedding the form. It may be absent
//! (preview), in which case every call fails and the bridge swallows it.

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::envelope::HostEnvelope;
use crate::error::{ActionFormError, Result};
use crate::store::Snapshot;

/// Host-pushed envelopes, in arrival order. Unbounded wait, no timeout.
pub type EnvelopeStream = BoxStream<'static, HostEnvelope>;

/// Calls consumed from the host
#[async_trait]
pub trait HostClient: Send + Sync {
    /// Host name for logs (e.g., "offline", "mock")
    fn name(&self) -> &str;

    /// Register the single envelope subscription
    async fn subscribe(&self) -> Result<EnvelopeStream>;

    /// One-shot signal: the form can receive data
    async fn ready(&self) -> Result<()>;

    /// Full current snapshot after a change
    async fn data_changed(&self, data: &Snapshot) -> Result<()>;

    /// Commit an outcome with the full current snapshot
    async fn complete_task(&self, outcome: &str, data: &Snapshot) -> Result<()>;
}

/// No host at all: the preview / offline mode
#[derive(Debug, Clone, Default)]
pub struct OfflineHost;

impl OfflineHost {
    pub fn new() -> Self {
        Self
    }

    fn unavailable() -> ActionFormError {
        ActionFormError::HostUnavailable {
            reason: "no host connected (preview mode)".to_string(),
        }
    }
}

#[async_trait]
impl HostClient for OfflineHost {
    fn name(&self) -> &str {
        "offline"
    }

    async fn subscribe(&self) -> Result<EnvelopeStream> {
        Err(Self::unavailable())
    }

    async fn ready(&self) -> Result<()> {
        Err(Self::unavailable())
    }

    async fn data_changed(&self, _data: &Snapshot) -> Result<()> {
        Err(Self::unavailable())
    }

    async fn complete_task(&self, _outcome: &str, _data: &Snapshot) -> Result<()> {
        Err(Self::unavailable())
    }
}
