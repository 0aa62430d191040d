//! Core error types for search-ads-core.
//!
//! Every failure the library can hit is funneled into [`SearchAdsError`].
//! Nothing here is retried or suppressed; callers decide what to do.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::transport::TransportError;
use crate::sync::ReplayReport;

/// Core error type for search-ads-core.
#[derive(Error, Debug)]
pub enum SearchAdsError {
    /// Configuration-related errors (including unknown organizations)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A create or update call was rejected by the remote API
    #[error("Remote write to '{endpoint}' failed: {response}")]
    RemoteWrite { endpoint: String, response: String },

    /// One or more queued actions failed while flushing the sync queue
    #[error("Replay failed: {} of {} pending actions failed", .0.failed_count, .0.total_actions)]
    Replay(Box<ReplayReport>),

    /// The report endpoint answered without the expected row structure
    #[error("Malformed report response from '{endpoint}': {response}")]
    MalformedReportResponse {
        endpoint: String,
        response: serde_json::Value,
    },

    /// Read-path and network failures reported by the transport
    #[error("Transport error for '{endpoint}': {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// Local validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The organization name is not among the accounts the certificate can see
    #[error("Organization '{org_name}' does not exist on this account")]
    OrganizationNotFound { org_name: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Certificate material is missing or unreadable
    #[error("Client certificate error for {path}: {message}")]
    Certificate { path: PathBuf, message: String },

    /// The data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Ad groups are addressed under their campaign and cannot be saved without it
    #[error("Ad group '{ad_group}' has no campaign id")]
    MissingCampaignId { ad_group: String },

    /// The operation needs a remote identity the entity does not have yet
    #[error("{entity} '{name}' has no remote id")]
    MissingId { entity: String, name: String },

    /// A stored pending action names a type that cannot be replayed
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for SearchAdsError
pub type Result<T, E = SearchAdsError> = std::result::Result<T, E>;
