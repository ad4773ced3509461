//! Host Module - everything that talks to the embedding workflow host
//!
//! - `bridge`: `HostBridge` state machine (subscription, envelopes, completion)
//! - `client`: `HostClient` trait + `OfflineHost`
//! - `envelope`: `HostEnvelope`, `Credentials`, `HostSettings`
//! - `service`: authenticated `ServiceClient` built from credentials
//! - `fallback`: local completion display when the host is absent
//! - `mock`: in-process host for tests and scripted replays

mod bridge;
mod client;
mod envelope;
mod fallback;
pub mod mock;
mod service;

pub use bridge::{BridgeState, Completion, HostBridge};
pub use client::{EnvelopeStream, HostClient, OfflineHost};
pub use envelope::{
    mask_token, Credentials, HostEnvelope, HostSettings, DEFAULT_LANGUAGE, DEFAULT_THEME,
};
pub use fallback::{describe_completion, CompletionFallback, ConsoleFallback};
pub use service::{
    service_root, HttpServiceClient, HttpServiceFactory, ServiceClient, ServiceClientFactory,
};
