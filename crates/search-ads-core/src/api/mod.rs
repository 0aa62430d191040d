//! Search Ads API access.

pub mod client;
pub mod connection;
pub mod transport;

pub use client::{NewCampaign, SearchAds, StoreReportsOptions, DEFAULT_CAMPAIGN_LIMIT};
pub use connection::{Connection, DEFAULT_API_VERSION};
pub use transport::{CredentialContext, HttpTransport, Transport, TransportError};
