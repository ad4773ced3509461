//! Authenticated service client
//!
//! Built from host-provided credentials. The bridge owns at most one client
//! and replaces it when new full credentials arrive; a bare token refresh
//! updates the existing client in place.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::envelope::{mask_token, Credentials};
use crate::error::{ActionFormError, Result};

/// Client for network-dependent form features
#[async_trait]
pub trait ServiceClient: Send + Sync + fmt::Debug {
    /// Root URL: `{baseUrl}/{orgName}/{tenantName}/`
    fn root(&self) -> &Url;

    /// Swap the bearer token without rebuilding the client
    fn update_token(&mut self, token: &str);

    /// GET a JSON resource relative to the root
    async fn get_json(&self, path: &str) -> Result<Value>;
}

/// Builds service clients from full credentials
pub trait ServiceClientFactory: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn ServiceClient>>;
}

/// Resolve `{baseUrl}/{orgName}/{tenantName}/`
pub fn service_root(credentials: &Credentials) -> Result<Url> {
    let invalid = |reason: String| ActionFormError::InvalidBaseUrl {
        url: credentials.base_url.clone(),
        reason,
    };

    let mut base = Url::parse(&credentials.base_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!(
        "{}/{}/",
        credentials.org_name.trim_matches('/'),
        credentials.tenant_name.trim_matches('/')
    ))
    .map_err(|e| invalid(e.to_string()))
}

/// reqwest-backed service client
pub struct HttpServiceClient {
    http: Client,
    root: Url,
    token: String,
}

impl HttpServiceClient {
    pub fn new(http: Client, credentials: &Credentials) -> Result<Self> {
        Ok(Self {
            http,
            root: service_root(credentials)?,
            token: credentials.token.clone(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for HttpServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServiceClient")
            .field("root", &self.root.as_str())
            .field("token", &mask_token(&self.token, 4))
            .finish()
    }
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    fn root(&self) -> &Url {
        &self.root
    }

    fn update_token(&mut self, token: &str) {
        self.token = token.to_string();
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self
            .root
            .join(path.trim_start_matches('/'))
            .map_err(|e| ActionFormError::InvalidBaseUrl {
                url: format!("{}{}", self.root, path),
                reason: e.to_string(),
            })?;
        debug!(url = %url, "GET");

        let value = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(value)
    }
}

/// Factory sharing one reqwest connection pool across reconnects
#[derive(Debug, Clone, Default)]
pub struct HttpServiceFactory {
    http: Client,
}

impl HttpServiceFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServiceClientFactory for HttpServiceFactory {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn ServiceClient>> {
        Ok(Box::new(HttpServiceClient::new(self.http.clone(), credentials)?))
    }
}
