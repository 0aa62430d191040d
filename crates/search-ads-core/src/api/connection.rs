//! A transport bound to credentials, an organization and an API version.

use serde_json::Value;

use super::transport::{CredentialContext, Transport, TransportError};
use crate::error::{Result, SearchAdsError};

pub const DEFAULT_API_VERSION: &str = "v1";

/// Everything a save or query needs to reach the API.
///
/// Cloning is cheap; the transport is borrowed.
#[derive(Clone)]
pub struct Connection<'a> {
    transport: &'a dyn Transport,
    credentials: CredentialContext,
    org_id: Option<String>,
    api_version: String,
}

impl<'a> Connection<'a> {
    pub fn new(transport: &'a dyn Transport, credentials: CredentialContext) -> Self {
        Self {
            transport,
            credentials,
            org_id: None,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Account-wide calls such as `acls` go out without an organization.
    pub fn without_org_id(mut self) -> Self {
        self.org_id = None;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Same connection under different credentials.
    pub fn with_credentials(&self, credentials: CredentialContext) -> Self {
        Self {
            credentials,
            ..self.clone()
        }
    }

    /// Same connection addressed to `org_id` when one is given.
    pub fn for_org(&self, org_id: Option<&str>) -> Self {
        match org_id {
            Some(org_id) => self.clone().with_org_id(org_id),
            None => self.clone(),
        }
    }

    pub fn org_id(&self) -> Option<&str> {
        self.org_id.as_deref()
    }

    pub fn credentials(&self) -> &CredentialContext {
        &self.credentials
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// `campaigns/1` -> `v1/campaigns/1`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_version, path.trim_start_matches('/'))
    }

    pub fn get(&self, path: &str) -> Result<Value> {
        let endpoint = self.endpoint(path);
        self.transport
            .get(&self.credentials, &endpoint, self.org_id())
            .map_err(|source| SearchAdsError::Transport { endpoint, source })
    }

    /// Update an entity. Any rejection becomes [`SearchAdsError::RemoteWrite`].
    pub fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let endpoint = self.endpoint(path);
        let response = self
            .transport
            .put(&self.credentials, &endpoint, body, self.org_id());
        check_write(endpoint, response)
    }

    /// Create entities. Any rejection becomes [`SearchAdsError::RemoteWrite`].
    pub fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let endpoint = self.endpoint(path);
        let response = self
            .transport
            .post(&self.credentials, &endpoint, body, self.org_id());
        check_write(endpoint, response)
    }

    /// A read that happens to be a POST, such as a report query.
    pub fn query(&self, path: &str, body: &Value) -> Result<Value> {
        let endpoint = self.endpoint(path);
        self.transport
            .post(&self.credentials, &endpoint, body, self.org_id())
            .map_err(|source| SearchAdsError::Transport { endpoint, source })
    }
}

fn check_write(
    endpoint: String,
    response: std::result::Result<Value, TransportError>,
) -> Result<Value> {
    match response {
        Ok(value) => match value.get("error") {
            Some(error) if !error.is_null() => {
                tracing::warn!(%endpoint, %error, "remote write rejected");
                Err(SearchAdsError::RemoteWrite {
                    endpoint,
                    response: value.to_string(),
                })
            }
            _ => Ok(value),
        },
        Err(source) => match source.response_body() {
            Some(body) => {
                tracing::warn!(%endpoint, %source, "remote write failed");
                Err(SearchAdsError::RemoteWrite {
                    response: body.to_string(),
                    endpoint,
                })
            }
            None => Err(SearchAdsError::Transport { endpoint, source }),
        },
    }
}
