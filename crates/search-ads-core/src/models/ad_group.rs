//! Ad groups.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::keyword::{BulkKeywordFragment, Keyword};
use super::types::{nullable, optional_id, Money, RemoteId, Status};
use super::wire::{response_id, WireSerializable};
use crate::api::Connection;
use crate::error::{Result, ValidationError};
use crate::sync::{EntityKind, SaveOptions, SyncManager, Synchronizable};

const KEYWORD_TARGETING_PATH: &str = "keywords/targeting";

/// An ad group, addressed under its campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdGroup {
    #[serde(deserialize_with = "optional_id")]
    id: Option<RemoteId>,
    #[serde(deserialize_with = "optional_id")]
    campaign_id: Option<RemoteId>,
    pub name: Option<String>,
    pub default_cpc_bid: Option<Money>,
    pub cpa_goal: Option<Money>,
    pub status: Option<Status>,
    pub automated_keywords_opt_in: Option<bool>,
    pub targeting_dimensions: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub keywords: Vec<Keyword>,
    #[serde(deserialize_with = "nullable")]
    negative_keywords: Vec<Keyword>,
    start_time: Option<String>,
    end_time: Option<String>,
    #[serde(deserialize_with = "nullable")]
    storefronts: Vec<String>,
    serving_status: Option<String>,
    serving_state_reasons: Option<Value>,
    display_status: Option<String>,
    modification_time: Option<String>,
    #[serde(skip)]
    sync_manager: Option<SyncManager>,
}

impl Default for AdGroup {
    fn default() -> Self {
        Self {
            id: None,
            campaign_id: None,
            name: None,
            default_cpc_bid: None,
            cpa_goal: None,
            status: None,
            automated_keywords_opt_in: None,
            targeting_dimensions: None,
            keywords: Vec::new(),
            negative_keywords: Vec::new(),
            start_time: None,
            end_time: None,
            storefronts: vec!["US".to_string()],
            serving_status: None,
            serving_state_reasons: None,
            display_status: None,
            modification_time: None,
            sync_manager: None,
        }
    }
}

impl AdGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    pub fn id(&self) -> Option<&RemoteId> {
        self.id.as_ref()
    }

    pub fn campaign_id(&self) -> Option<&RemoteId> {
        self.campaign_id.as_ref()
    }

    pub fn set_campaign_id(&mut self, campaign_id: RemoteId) {
        self.campaign_id = Some(campaign_id);
    }

    pub fn negative_keywords(&self) -> &[Keyword] {
        &self.negative_keywords
    }

    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    pub fn storefronts(&self) -> &[String] {
        &self.storefronts
    }

    pub fn serving_status(&self) -> Option<&str> {
        self.serving_status.as_deref()
    }

    pub fn display_status(&self) -> Option<&str> {
        self.display_status.as_deref()
    }

    pub fn modification_time(&self) -> Option<&str> {
        self.modification_time.as_deref()
    }

    pub fn pause(&mut self) {
        self.status = Some(Status::Paused);
    }

    pub fn activate(&mut self) {
        self.status = Some(Status::Enabled);
    }

    pub fn get_keyword_by_text(&self, text: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|keyword| keyword.text() == text)
    }

    pub fn get_keyword_by_text_mut(&mut self, text: &str) -> Option<&mut Keyword> {
        self.keywords.iter_mut().find(|keyword| keyword.text() == text)
    }

    /// Every owned keyword's bulk fragments, in keyword order.
    pub fn keyword_fragments(
        &self,
        campaign_id: &RemoteId,
        ad_group_id: &RemoteId,
    ) -> Vec<BulkKeywordFragment> {
        self.keywords
            .iter()
            .flat_map(|keyword| keyword.prepare_for_bulk_export(campaign_id, ad_group_id))
            .collect()
    }

    fn label(&self) -> String {
        self.name.clone().unwrap_or_default()
    }

    fn export_keywords(
        &self,
        connection: &Connection<'_>,
        campaign_id: &RemoteId,
        ad_group_id: &RemoteId,
    ) -> Result<()> {
        let fragments = self.keyword_fragments(campaign_id, ad_group_id);
        if fragments.is_empty() {
            return Ok(());
        }
        tracing::debug!(ad_group = %ad_group_id, fragments = fragments.len(), "exporting keywords");
        connection.post(KEYWORD_TARGETING_PATH, &serde_json::to_value(&fragments)?)?;
        Ok(())
    }
}

impl WireSerializable for AdGroup {
    const EDITABLE_FIELDS: &'static [&'static str] = &[
        "name",
        "default_cpc_bid",
        "cpa_goal",
        "automated_keywords_opt_in",
        "targeting_dimensions",
        "status",
    ];
    const CREATE_ONLY_FIELDS: &'static [&'static str] = &["start_time"];

    fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

impl Synchronizable for AdGroup {
    const ENTITY: EntityKind = EntityKind::AdGroup;

    fn sync_manager(&self) -> Option<&SyncManager> {
        self.sync_manager.as_ref()
    }

    fn set_sync_manager(&mut self, manager: Option<SyncManager>) {
        self.sync_manager = manager;
    }

    fn remote_id(&self) -> Option<&RemoteId> {
        self.id.as_ref()
    }

    /// Keywords go out in one bulk write before the group's own fields. A
    /// group that does not exist yet is created first so the keywords can
    /// reference its id.
    fn execute_save(&mut self, connection: &Connection<'_>, _options: &SaveOptions<'_>) -> Result<()> {
        let campaign_id = self
            .campaign_id
            .clone()
            .ok_or_else(|| ValidationError::MissingCampaignId {
                ad_group: self.label(),
            })?;
        let fields = Value::Object(self.editable_fields()?);

        match self.id.clone() {
            Some(id) => {
                self.export_keywords(connection, &campaign_id, &id)?;
                connection.put(&format!("campaigns/{campaign_id}/adgroups/{id}"), &fields)?;
            }
            None => {
                let response =
                    connection.post(&format!("campaigns/{campaign_id}/adgroups"), &fields)?;
                self.id = response_id(&response);
                if self.keywords.is_empty() {
                    return Ok(());
                }
                let id = self.id.clone().ok_or_else(|| ValidationError::MissingId {
                    entity: "Ad group".to_string(),
                    name: self.label(),
                })?;
                self.export_keywords(connection, &campaign_id, &id)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AdGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("");
        match &self.id {
            Some(id) => write!(f, "{name} (Ad Group id: {id})"),
            None => write!(f, "{name} (Ad Group id: unsaved)"),
        }
    }
}
