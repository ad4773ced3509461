//! Host envelope - the payload pushed by the host
//!
//! Every attribute is optional: the first envelope usually carries `data`,
//! later ones may carry only a theme change or a refreshed token.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::Snapshot;

pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_language: Option<String>,
}

impl HostEnvelope {
    /// Envelope carrying a data snapshot
    pub fn with_data(data: Snapshot) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.is_read_only = Some(read_only);
        self
    }

    /// Full connection credentials, or `None` if any part is missing
    pub fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            base_url: non_empty(&self.base_url)?.to_string(),
            org_name: non_empty(&self.org_name)?.to_string(),
            tenant_name: non_empty(&self.tenant_name)?.to_string(),
            token: non_empty(&self.token)?.to_string(),
        })
    }

    /// Refreshed token, if present
    pub fn refreshed_token(&self) -> Option<&str> {
        non_empty(&self.new_token)
    }

    /// Theme to apply: live override first, then initial theme
    pub fn theme_update(&self) -> Option<&str> {
        non_empty(&self.new_theme).or_else(|| non_empty(&self.theme))
    }

    /// Language to apply: live override first, then initial language
    pub fn language_update(&self) -> Option<&str> {
        non_empty(&self.new_language).or_else(|| non_empty(&self.language))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Complete connection credential set
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub base_url: String,
    pub org_name: String,
    pub tenant_name: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("org_name", &self.org_name)
            .field("tenant_name", &self.tenant_name)
            .field("token", &mask_token(&self.token, 4))
            .finish()
    }
}

/// Mask a token for display
///
/// Shows first N chars + asterisks, e.g. "eyJh***"
pub fn mask_token(token: &str, visible_chars: usize) -> String {
    if token.is_empty() {
        return String::new();
    }
    let visible: String = token.chars().take(visible_chars).collect();
    format!("{}***", visible)
}

/// Presentation settings pushed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSettings {
    pub theme: String,
    pub language: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_credentials() -> HostEnvelope {
        serde_json::from_value(json!({
            "baseUrl": "https://cloud.example.com",
            "orgName": "acme",
            "tenantName": "default",
            "token": "eyJhbGciOi"
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_camel_case_envelope() {
        let env: HostEnvelope = serde_json::from_value(json!({
            "data": {"patientName": "Alice", "reviewerComments": ""},
            "isReadOnly": false,
            "newTheme": "dark"
        }))
        .unwrap();
        assert_eq!(env.data.unwrap()["patientName"], "Alice");
        assert_eq!(env.is_read_only, Some(false));
        assert_eq!(env.new_theme.as_deref(), Some("dark"));
    }

    #[test]
    fn full_credentials_are_extracted() {
        let creds = full_credentials().credentials().unwrap();
        assert_eq!(creds.org_name, "acme");
        assert_eq!(creds.token, "eyJhbGciOi");
    }

    #[test]
    fn partial_credentials_are_absent() {
        let mut env = full_credentials();
        env.tenant_name = None;
        assert!(env.credentials().is_none());

        let mut env = full_credentials();
        env.token = Some("  ".into());
        assert!(env.credentials().is_none());
    }

    #[test]
    fn token_refresh_stands_alone() {
        let env: HostEnvelope = serde_json::from_value(json!({"newToken": "fresh"})).unwrap();
        assert!(env.credentials().is_none());
        assert_eq!(env.refreshed_token(), Some("fresh"));
    }

    #[test]
    fn live_theme_override_wins() {
        let env = HostEnvelope {
            theme: Some("light".into()),
            new_theme: Some("dark".into()),
            ..HostEnvelope::default()
        };
        assert_eq!(env.theme_update(), Some("dark"));
        assert_eq!(env.language_update(), None);
    }

    #[test]
    fn credentials_debug_masks_token() {
        let creds = full_credentials().credentials().unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("eyJh***"));
        assert!(!debug.contains("eyJhbGciOi"));
    }

    #[test]
    fn mask_token_handles_short_values() {
        assert_eq!(mask_token("", 4), "");
        assert_eq!(mask_token("ab", 4), "ab***");
    }

    #[test]
    fn empty_envelope_serializes_to_empty_object() {
        assert_eq!(serde_json::to_value(HostEnvelope::default()).unwrap(), json!({}));
    }
}
