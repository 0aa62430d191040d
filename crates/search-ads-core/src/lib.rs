//! # Search Ads Core Library
//!
//! Client library and local object model for the Apple Search Ads campaign
//! management API.
//!
//! ## Architecture
//!
//! - **API**: certificate-authenticated transport, a [`Connection`] binding
//!   it to credentials and an organization, and the [`SearchAds`] client
//! - **Models**: [`Campaign`], [`AdGroup`] and [`Keyword`], mutated locally
//!   and written back with `save`
//! - **Sync**: a [`SyncManager`] queue that defers saves and replays them
//!   later under its own credentials
//! - **Reports**: report queries flattened into [`ReportTable`]s
//! - **Storage**: TOML configuration and a flat JSON store
//!
//! ## Keyword renames
//!
//! The API cannot change a keyword's text. Setting the text of an existing
//! keyword is exported as two bulk fragments: one pausing the old term and
//! one creating the new term.

pub mod api;
pub mod error;
pub mod models;
pub mod reports;
pub mod storage;
pub mod sync;

pub use api::{Connection, CredentialContext, HttpTransport, NewCampaign, SearchAds, Transport};
pub use error::{ConfigError, Result, SearchAdsError, ValidationError};
pub use models::{AdGroup, Campaign, Keyword, MatchType, Money, RemoteId, Status, WireSerializable};
pub use reports::{Granularity, ReportKind, ReportRequest, ReportTable};
pub use storage::{Config, DataBase};
pub use sync::{ReplayPolicy, ReplayReport, SaveOptions, SaveOutcome, SyncManager, Synchronizable};
