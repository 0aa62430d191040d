//! Keywords and the text-rename protocol.
//!
//! The API cannot rename a keyword in place. A keyword therefore keeps the
//! text it was loaded with (`original_text`) separate from the text the
//! caller asked for (`pending_text`); at export time a pending rename of a
//! keyword that already exists remotely becomes "pause the old term, create
//! the new term", so the old term keeps its performance history.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{optional_id, MatchType, Money, RemoteId, Status};
use super::wire::WireSerializable;

/// What a bulk fragment asks the keyword-targeting endpoint to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportAction {
    Create,
    Update,
}

/// One element of the bulk keyword-targeting payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkKeywordFragment {
    pub import_action: ImportAction,
    pub campaign_id: RemoteId,
    pub ad_group_id: RemoteId,
    pub bid_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    pub match_type: Option<MatchType>,
    pub status: Option<Status>,
    pub text: String,
}

/// A targeting keyword owned by exactly one ad group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "KeywordWire", into = "KeywordWire")]
pub struct Keyword {
    id: Option<RemoteId>,
    ad_group_id: Option<RemoteId>,
    pub match_type: Option<MatchType>,
    pub status: Option<Status>,
    pub bid_amount: Option<Money>,
    modification_time: Option<String>,
    original_text: String,
    pending_text: Option<String>,
}

/// Wire shape of a keyword.
///
/// `text` always carries the visible text. While a rename is pending the
/// pre-rename spelling rides along as `originalText`, so a keyword queued
/// for a deferred save comes back with its rename intact. Stores written by
/// older tooling used the key `" text"` (leading space); it is read as an
/// alias.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeywordWire {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<RemoteId>,
    #[serde(default, deserialize_with = "optional_id")]
    ad_group_id: Option<RemoteId>,
    #[serde(default)]
    match_type: Option<MatchType>,
    #[serde(default)]
    status: Option<Status>,
    #[serde(default)]
    bid_amount: Option<Money>,
    #[serde(default)]
    modification_time: Option<String>,
    #[serde(alias = " text")]
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_text: Option<String>,
}

impl From<KeywordWire> for Keyword {
    fn from(wire: KeywordWire) -> Self {
        let (original_text, pending_text) = match wire.original_text {
            Some(original) => (original, Some(wire.text)),
            None => (wire.text, None),
        };
        Keyword {
            id: wire.id,
            ad_group_id: wire.ad_group_id,
            match_type: wire.match_type,
            status: wire.status,
            bid_amount: wire.bid_amount,
            modification_time: wire.modification_time,
            original_text,
            pending_text,
        }
    }
}

impl From<Keyword> for KeywordWire {
    fn from(keyword: Keyword) -> Self {
        let (text, original_text) = match keyword.pending_text {
            Some(pending) => (pending, Some(keyword.original_text)),
            None => (keyword.original_text, None),
        };
        KeywordWire {
            id: keyword.id,
            ad_group_id: keyword.ad_group_id,
            match_type: keyword.match_type,
            status: keyword.status,
            bid_amount: keyword.bid_amount,
            modification_time: keyword.modification_time,
            text,
            original_text,
        }
    }
}

impl Keyword {
    /// A keyword that does not exist remotely yet.
    pub fn new(text: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            id: None,
            ad_group_id: None,
            match_type: Some(match_type),
            status: Some(Status::Enabled),
            bid_amount: None,
            modification_time: None,
            original_text: text.into(),
            pending_text: None,
        }
    }

    pub fn with_bid_amount(mut self, bid_amount: Money) -> Self {
        self.bid_amount = Some(bid_amount);
        self
    }

    pub fn id(&self) -> Option<&RemoteId> {
        self.id.as_ref()
    }

    pub fn ad_group_id(&self) -> Option<&RemoteId> {
        self.ad_group_id.as_ref()
    }

    pub fn modification_time(&self) -> Option<&str> {
        self.modification_time.as_deref()
    }

    /// The visible text: the pending rename if there is one.
    pub fn text(&self) -> &str {
        self.pending_text.as_deref().unwrap_or(&self.original_text)
    }

    /// Request a rename. Calling again replaces the previous request; the
    /// original text never changes.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.pending_text = Some(text.into());
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn pending_text(&self) -> Option<&str> {
        self.pending_text.as_deref()
    }

    pub fn is_renamed(&self) -> bool {
        self.pending_text.is_some()
    }

    pub fn pause(&mut self) {
        self.status = Some(Status::Paused);
    }

    pub fn activate(&mut self) {
        self.status = Some(Status::Enabled);
    }

    /// Fragments for the bulk keyword-targeting write.
    ///
    /// A keyword with no rename, or a brand-new keyword, is a single upsert.
    /// A rename of an existing keyword is two fragments: an UPDATE pausing
    /// the existing id under its original text, then a CREATE carrying the
    /// new text and the caller's status. Setting the text to its current
    /// value still counts as a rename.
    pub fn prepare_for_bulk_export(
        &self,
        campaign_id: &RemoteId,
        ad_group_id: &RemoteId,
    ) -> Vec<BulkKeywordFragment> {
        match (&self.pending_text, &self.id) {
            (Some(pending), Some(id)) => {
                if *pending == self.original_text {
                    tracing::warn!(
                        keyword_id = %id,
                        text = %pending,
                        "keyword text set to its current value; exporting pause and recreate anyway"
                    );
                }
                vec![
                    self.fragment(
                        ImportAction::Update,
                        campaign_id,
                        ad_group_id,
                        Some(Status::Paused),
                        &self.original_text,
                    ),
                    self.fragment(
                        ImportAction::Create,
                        campaign_id,
                        ad_group_id,
                        self.status.clone(),
                        pending,
                    ),
                ]
            }
            _ => {
                let action = if self.id.is_some() {
                    ImportAction::Update
                } else {
                    ImportAction::Create
                };
                vec![self.fragment(
                    action,
                    campaign_id,
                    ad_group_id,
                    self.status.clone(),
                    self.text(),
                )]
            }
        }
    }

    fn fragment(
        &self,
        import_action: ImportAction,
        campaign_id: &RemoteId,
        ad_group_id: &RemoteId,
        status: Option<Status>,
        text: &str,
    ) -> BulkKeywordFragment {
        BulkKeywordFragment {
            import_action,
            campaign_id: campaign_id.clone(),
            ad_group_id: ad_group_id.clone(),
            bid_amount: self.bid_amount.clone(),
            id: self.id.clone(),
            match_type: self.match_type.clone(),
            status,
            text: text.to_string(),
        }
    }
}

impl WireSerializable for Keyword {
    const EDITABLE_FIELDS: &'static [&'static str] =
        &["ad_group_id", "bid_amount", "match_type", "status", "text"];

    fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} (Keyword id: {id})", self.text()),
            None => write!(f, "{} (Keyword id: unsaved)", self.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn existing(id: u64, text: &str, status: &str) -> Keyword {
        Keyword::from_wire(json!({
            "id": id,
            "adGroupId": 7,
            "matchType": "EXACT",
            "status": status,
            "text": text,
            "bidAmount": {"amount": "1.5", "currency": "USD"},
        }))
        .unwrap()
    }

    fn ids() -> (RemoteId, RemoteId) {
        (RemoteId::from("100"), RemoteId::from("7"))
    }

    #[test]
    fn text_reads_pending_over_original() {
        let mut keyword = existing(42, "shoes", "ENABLED");
        assert_eq!(keyword.text(), "shoes");
        assert!(!keyword.is_renamed());

        keyword.set_text("sneakers");
        keyword.set_text("trainers");
        assert_eq!(keyword.text(), "trainers");
        assert_eq!(keyword.original_text(), "shoes");
    }

    #[test]
    fn rename_of_existing_keyword_pauses_then_creates() {
        let mut keyword = existing(42, "shoes", "ENABLED");
        keyword.set_text("sneakers");
        let (campaign_id, ad_group_id) = ids();

        let fragments = keyword.prepare_for_bulk_export(&campaign_id, &ad_group_id);
        let payload = serde_json::to_value(&fragments).unwrap();

        assert_eq!(
            payload,
            json!([
                {
                    "importAction": "UPDATE",
                    "campaignId": "100",
                    "adGroupId": "7",
                    "bidAmount": {"amount": "1.5", "currency": "USD"},
                    "id": "42",
                    "matchType": "EXACT",
                    "status": "PAUSED",
                    "text": "shoes",
                },
                {
                    "importAction": "CREATE",
                    "campaignId": "100",
                    "adGroupId": "7",
                    "bidAmount": {"amount": "1.5", "currency": "USD"},
                    "id": "42",
                    "matchType": "EXACT",
                    "status": "ENABLED",
                    "text": "sneakers",
                },
            ])
        );
    }

    #[test]
    fn export_leaves_keyword_state_alone() {
        let mut keyword = existing(42, "shoes", "ENABLED");
        keyword.set_text("sneakers");
        let before = keyword.clone();
        let (campaign_id, ad_group_id) = ids();
        let _ = keyword.prepare_for_bulk_export(&campaign_id, &ad_group_id);
        assert_eq!(keyword, before);
    }

    #[test]
    fn unchanged_existing_keyword_is_one_update() {
        let keyword = existing(42, "shoes", "PAUSED");
        let (campaign_id, ad_group_id) = ids();
        let fragments = keyword.prepare_for_bulk_export(&campaign_id, &ad_group_id);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].import_action, ImportAction::Update);
        assert_eq!(fragments[0].text, "shoes");
        assert_eq!(fragments[0].status, Some(Status::Paused));
    }

    #[test]
    fn renaming_to_same_text_still_produces_two_fragments() {
        let mut keyword = existing(42, "shoes", "ENABLED");
        keyword.set_text("shoes");
        let (campaign_id, ad_group_id) = ids();
        assert_eq!(keyword.prepare_for_bulk_export(&campaign_id, &ad_group_id).len(), 2);
    }

    #[test]
    fn new_keyword_omits_id_in_fragment() {
        let keyword = Keyword::new("running shoes", MatchType::Broad);
        let (campaign_id, ad_group_id) = ids();
        let payload =
            serde_json::to_value(keyword.prepare_for_bulk_export(&campaign_id, &ad_group_id))
                .unwrap();
        assert!(payload[0].get("id").is_none());
        assert_eq!(payload[0]["importAction"], "CREATE");
    }

    #[test]
    fn wire_round_trip_preserves_pending_rename() {
        let mut keyword = existing(42, "shoes", "ENABLED");
        keyword.set_text("sneakers");

        let wire = keyword.to_wire().unwrap();
        assert_eq!(wire["text"], "sneakers");
        assert_eq!(wire["originalText"], "shoes");

        let restored = Keyword::from_wire(wire).unwrap();
        assert_eq!(restored, keyword);
    }

    #[test]
    fn wire_omits_original_text_without_rename() {
        let wire = existing(42, "shoes", "ENABLED").to_wire().unwrap();
        assert!(wire.get("originalText").is_none());
    }

    #[test]
    fn legacy_space_prefixed_text_key_is_accepted() {
        let keyword = Keyword::from_wire(json!({
            "id": "9",
            "adGroupId": "7",
            "matchType": "BROAD",
            "status": "ENABLED",
            " text": "legacy",
            "sync_manager": null,
        }))
        .unwrap();
        assert_eq!(keyword.text(), "legacy");
        assert!(!keyword.is_renamed());
    }

    #[test]
    fn display_matches_remote_listing_format() {
        assert_eq!(existing(5, "shoes", "ENABLED").to_string(), "shoes (Keyword id: 5)");
    }

    proptest! {
        #[test]
        fn existing_keyword_with_any_rename_yields_pause_then_create(
            id in 1u64..1_000_000,
            original in "[a-z ]{1,20}",
            renamed in "[a-z ]{1,20}",
            paused in any::<bool>(),
        ) {
            let status = if paused { "PAUSED" } else { "ENABLED" };
            let mut keyword = existing(id, &original, status);
            keyword.set_text(renamed.clone());
            let (campaign_id, ad_group_id) = ids();

            let fragments = keyword.prepare_for_bulk_export(&campaign_id, &ad_group_id);
            prop_assert_eq!(fragments.len(), 2);
            prop_assert_eq!(fragments[0].import_action, ImportAction::Update);
            prop_assert_eq!(&fragments[0].text, &original);
            prop_assert_eq!(fragments[0].status.clone(), Some(Status::Paused));
            prop_assert_eq!(fragments[1].import_action, ImportAction::Create);
            prop_assert_eq!(&fragments[1].text, &renamed);
            prop_assert_eq!(fragments[1].status.clone(), keyword.status.clone());
        }

        #[test]
        fn new_keyword_is_always_a_single_create(
            text in "[a-z ]{1,20}",
            rename in proptest::option::of("[a-z ]{1,20}"),
        ) {
            let mut keyword = Keyword::new(text, MatchType::Exact);
            if let Some(rename) = rename.clone() {
                keyword.set_text(rename);
            }
            let (campaign_id, ad_group_id) = ids();

            let fragments = keyword.prepare_for_bulk_export(&campaign_id, &ad_group_id);
            prop_assert_eq!(fragments.len(), 1);
            prop_assert_eq!(fragments[0].import_action, ImportAction::Create);
            prop_assert_eq!(fragments[0].text.as_str(), keyword.text());
        }

        #[test]
        fn untouched_existing_keyword_is_a_single_update(id in 1u64..1_000_000, text in "[a-z ]{1,20}") {
            let keyword = existing(id, &text, "ENABLED");
            let (campaign_id, ad_group_id) = ids();

            let fragments = keyword.prepare_for_bulk_export(&campaign_id, &ad_group_id);
            prop_assert_eq!(fragments.len(), 1);
            prop_assert_eq!(fragments[0].import_action, ImportAction::Update);
            prop_assert_eq!(&fragments[0].text, &text);
        }
    }
}
