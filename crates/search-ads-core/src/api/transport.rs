//! Blocking HTTPS transport for the Search Ads API.
//!
//! Requests authenticate with a client certificate pair. The pair is never
//! read from process-wide state during a call: every request receives a
//! [`CredentialContext`] by reference and materializes its own TLS identity
//! from it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::{Identity, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::error::ConfigError;

/// Credential variable naming the client certificate PEM file.
pub const PEM_VAR: &str = "SEARCH_ADS_PEM";
/// Credential variable naming the client private key file.
pub const KEY_VAR: &str = "SEARCH_ADS_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.searchads.apple.com/api";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Certificate material for one call, keyed by variable name.
///
/// This replaces temporarily exporting the certificate paths into the
/// process environment: a context is an ordinary value, layered with
/// [`CredentialContext::overlay`] and dropped when the call ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialContext {
    vars: BTreeMap<String, String>,
}

impl CredentialContext {
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Context holding just the certificate and key paths.
    pub fn from_paths(pem: impl Into<String>, key: impl Into<String>) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(PEM_VAR.to_string(), pem.into());
        vars.insert(KEY_VAR.to_string(), key.into());
        Self { vars }
    }

    /// Snapshot the certificate variables currently set in the environment.
    /// The environment is only read, never written.
    pub fn from_env() -> Self {
        let vars = [PEM_VAR, KEY_VAR]
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| (name.to_string(), value))
            })
            .collect();
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Layer `scoped` on top of `self`; entries in `scoped` win.
    pub fn overlay(&self, scoped: &CredentialContext) -> CredentialContext {
        let mut vars = self.vars.clone();
        vars.extend(scoped.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        CredentialContext { vars }
    }

    /// Resolve the certificate and key paths.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] when either variable is absent.
    pub fn certificate_paths(&self) -> Result<(PathBuf, PathBuf), ConfigError> {
        let pem = self
            .get(PEM_VAR)
            .ok_or_else(|| ConfigError::MissingKey(PEM_VAR.to_string()))?;
        let key = self
            .get(KEY_VAR)
            .ok_or_else(|| ConfigError::MissingKey(KEY_VAR.to_string()))?;
        Ok((PathBuf::from(pem), PathBuf::from(key)))
    }

    fn identity(&self) -> Result<Identity, ConfigError> {
        let (pem_path, key_path) = self.certificate_paths()?;
        let mut pem = std::fs::read(&pem_path).map_err(|e| ConfigError::Certificate {
            path: pem_path.clone(),
            message: e.to_string(),
        })?;
        let key = std::fs::read(&key_path).map_err(|e| ConfigError::Certificate {
            path: key_path.clone(),
            message: e.to_string(),
        })?;
        pem.push(b'\n');
        pem.extend_from_slice(&key);
        Identity::from_pem(&pem).map_err(|e| ConfigError::Certificate {
            path: pem_path,
            message: e.to_string(),
        })
    }
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Response is not valid JSON ({message}): {body}")]
    Decode { body: String, message: String },

    #[error("Credentials error: {0}")]
    Credentials(#[from] ConfigError),

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl TransportError {
    /// Raw response text, when the server produced one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            TransportError::Status { body, .. } | TransportError::Decode { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }
}

/// Everything the entity model needs from the network.
///
/// Paths are relative to the API root and already carry the API version
/// (e.g. `v1/campaigns/42`). When `org_id` is given the implementation must
/// send `Authorization: orgId=<id>`.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        credentials: &CredentialContext,
        path: &str,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError>;

    fn put(
        &self,
        credentials: &CredentialContext,
        path: &str,
        body: &Value,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError>;

    fn post(
        &self,
        credentials: &CredentialContext,
        path: &str,
        body: &Value,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError>;
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    timeout: Duration,
    client_certificate: bool,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "base_url".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client_certificate: true,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skip the client identity. Only useful against local mock servers.
    pub fn without_client_certificate(mut self) -> Self {
        self.client_certificate = false;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let raw = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })
    }

    fn client(&self, credentials: &CredentialContext) -> Result<Client, TransportError> {
        let mut builder = Client::builder().timeout(self.timeout);
        if self.client_certificate {
            builder = builder.identity(credentials.identity()?);
        }
        Ok(builder.build()?)
    }

    fn execute(
        &self,
        method: Method,
        credentials: &CredentialContext,
        path: &str,
        body: Option<&Value>,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError> {
        let url = self.url_for(path)?;
        tracing::debug!(%method, %url, "search ads request");

        let client = self.client(credentials)?;
        let mut request = client.request(method, url);
        if let Some(org_id) = org_id {
            request = request.header(AUTHORIZATION, format!("orgId={org_id}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode {
            message: e.to_string(),
            body: text,
        })
    }
}

impl Transport for HttpTransport {
    fn get(
        &self,
        credentials: &CredentialContext,
        path: &str,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.execute(Method::GET, credentials, path, None, org_id)
    }

    fn put(
        &self,
        credentials: &CredentialContext,
        path: &str,
        body: &Value,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.execute(Method::PUT, credentials, path, Some(body), org_id)
    }

    fn post(
        &self,
        credentials: &CredentialContext,
        path: &str,
        body: &Value,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.execute(Method::POST, credentials, path, Some(body), org_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_prefers_scoped_entries() {
        let base = CredentialContext::from_paths("/base.pem", "/base.key");
        let mut vars = BTreeMap::new();
        vars.insert(PEM_VAR.to_string(), "/scoped.pem".to_string());
        let scoped = CredentialContext::new(vars);

        let merged = base.overlay(&scoped);
        assert_eq!(merged.get(PEM_VAR), Some("/scoped.pem"));
        assert_eq!(merged.get(KEY_VAR), Some("/base.key"));
        // inputs are untouched
        assert_eq!(base.get(PEM_VAR), Some("/base.pem"));
    }

    #[test]
    fn certificate_paths_requires_both_entries() {
        let mut vars = BTreeMap::new();
        vars.insert(PEM_VAR.to_string(), "/cert.pem".to_string());
        let ctx = CredentialContext::new(vars);
        assert!(matches!(
            ctx.certificate_paths(),
            Err(ConfigError::MissingKey(key)) if key == KEY_VAR
        ));
    }

    #[test]
    fn missing_certificate_file_is_reported_with_path() {
        let ctx = CredentialContext::from_paths("/nonexistent/cert.pem", "/nonexistent/key.pem");
        match ctx.identity() {
            Err(ConfigError::Certificate { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/cert.pem"));
            }
            Err(other) => panic!("expected certificate error, got {other}"),
            Ok(_) => panic!("identity built from missing files"),
        }
    }

    #[test]
    fn url_for_joins_without_double_slashes() {
        let transport = HttpTransport::new("https://example.test/api/").unwrap();
        let url = transport.url_for("/v1/campaigns?limit=10").unwrap();
        assert_eq!(url.as_str(), "https://example.test/api/v1/campaigns?limit=10");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(ConfigError::InvalidValue { key, .. }) if key == "base_url"
        ));
    }
}
