//! Local object model for campaigns, ad groups and keywords.

pub mod ad_group;
pub mod campaign;
pub mod casing;
pub mod keyword;
pub mod types;
pub mod wire;

pub use ad_group::AdGroup;
pub use campaign::Campaign;
pub use casing::{to_external_name, to_local_name};
pub use keyword::{BulkKeywordFragment, ImportAction, Keyword};
pub use types::{MatchType, Money, RemoteId, Status};
pub use wire::WireSerializable;
