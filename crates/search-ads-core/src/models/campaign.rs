//! Campaigns.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ad_group::AdGroup;
use super::keyword::Keyword;
use super::types::{nullable, optional_id, Money, RemoteId, Status};
use super::wire::{response_id, WireSerializable};
use crate::api::Connection;
use crate::error::Result;
use crate::sync::{CascadeOrder, EntityKind, SaveOptions, SyncManager, Synchronizable};

/// A campaign and the ad groups it owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Campaign {
    #[serde(deserialize_with = "optional_id")]
    id: Option<RemoteId>,
    #[serde(deserialize_with = "optional_id")]
    org_id: Option<RemoteId>,
    pub name: Option<String>,
    pub budget_amount: Option<Money>,
    pub daily_budget_amount: Option<Money>,
    #[serde(deserialize_with = "optional_id")]
    adam_id: Option<RemoteId>,
    payment_model: Option<String>,
    pub loc_invoice_details: Option<Value>,
    pub budget_orders: Option<Value>,
    pub status: Option<Status>,
    serving_status: Option<String>,
    display_status: Option<String>,
    serving_state_reasons: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    negative_keywords: Vec<Keyword>,
    #[serde(deserialize_with = "nullable")]
    storefront: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub ad_groups: Vec<AdGroup>,
    modification_time: Option<String>,
    #[serde(skip)]
    sync_manager: Option<SyncManager>,
}

impl Campaign {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_org_id(mut self, org_id: impl Into<RemoteId>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    pub fn with_adam_id(mut self, adam_id: impl Into<RemoteId>) -> Self {
        self.adam_id = Some(adam_id.into());
        self
    }

    pub fn with_payment_model(mut self, payment_model: impl Into<String>) -> Self {
        self.payment_model = Some(payment_model.into());
        self
    }

    pub fn id(&self) -> Option<&RemoteId> {
        self.id.as_ref()
    }

    pub fn org_id(&self) -> Option<&RemoteId> {
        self.org_id.as_ref()
    }

    pub fn adam_id(&self) -> Option<&RemoteId> {
        self.adam_id.as_ref()
    }

    pub fn payment_model(&self) -> Option<&str> {
        self.payment_model.as_deref()
    }

    pub fn serving_status(&self) -> Option<&str> {
        self.serving_status.as_deref()
    }

    pub fn display_status(&self) -> Option<&str> {
        self.display_status.as_deref()
    }

    pub fn serving_state_reasons(&self) -> Option<&Value> {
        self.serving_state_reasons.as_ref()
    }

    pub fn negative_keywords(&self) -> &[Keyword] {
        &self.negative_keywords
    }

    pub fn storefront(&self) -> &[String] {
        &self.storefront
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

    /// First ad group whose name matches exactly.
    pub fn get_ad_group_by_name(&self, name: &str) -> Option<&AdGroup> {
        self.ad_groups
            .iter()
            .find(|ad_group| ad_group.name.as_deref() == Some(name))
    }

    pub fn get_ad_group_by_name_mut(&mut self, name: &str) -> Option<&mut AdGroup> {
        self.ad_groups
            .iter_mut()
            .find(|ad_group| ad_group.name.as_deref() == Some(name))
    }

    /// Create payload: the editable projection with every ad group's own
    /// projection nested under `adGroups`.
    fn create_payload(&self) -> Result<Value> {
        let mut body = self.editable_fields()?;
        let ad_groups = self
            .ad_groups
            .iter()
            .map(|ad_group| ad_group.editable_fields().map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        body.insert("adGroups".to_string(), Value::Array(ad_groups));
        Ok(Value::Object(body))
    }

    fn save_ad_groups(
        &mut self,
        connection: &Connection<'_>,
        options: &SaveOptions<'_>,
    ) -> Result<()> {
        let child_options = SaveOptions {
            cascade: false,
            force_sync: false,
            ..*options
        };
        let campaign_id = self.id.clone();
        for ad_group in &mut self.ad_groups {
            if ad_group.campaign_id().is_none() {
                if let Some(campaign_id) = &campaign_id {
                    ad_group.set_campaign_id(campaign_id.clone());
                }
            }
            ad_group.save(connection, &child_options)?;
        }
        Ok(())
    }
}

impl WireSerializable for Campaign {
    const EDITABLE_FIELDS: &'static [&'static str] = &[
        "name",
        "budget_amount",
        "loc_invoice_details",
        "budget_orders",
        "daily_budget_amount",
        "status",
    ];
    const CREATE_ONLY_FIELDS: &'static [&'static str] = &["org_id", "adam_id", "payment_model"];

    fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

impl Synchronizable for Campaign {
    const ENTITY: EntityKind = EntityKind::Campaign;

    fn sync_manager(&self) -> Option<&SyncManager> {
        self.sync_manager.as_ref()
    }

    fn set_sync_manager(&mut self, manager: Option<SyncManager>) {
        self.sync_manager = manager;
    }

    fn remote_id(&self) -> Option<&RemoteId> {
        self.id.as_ref()
    }

    fn execute_save(&mut self, connection: &Connection<'_>, options: &SaveOptions<'_>) -> Result<()> {
        let connection = connection.for_org(self.org_id.as_ref().map(RemoteId::as_str));

        let Some(id) = self.id.clone() else {
            // Ad groups ride along in the create payload.
            let response = connection.post("campaigns", &self.create_payload()?)?;
            self.id = response_id(&response);
            if let Some(id) = &self.id {
                tracing::info!(campaign = %id, "created campaign");
                for ad_group in &mut self.ad_groups {
                    ad_group.set_campaign_id(id.clone());
                }
            }
            return Ok(());
        };

        let cascade_first = options.cascade && options.cascade_order == CascadeOrder::ChildrenFirst;
        let cascade_last = options.cascade && options.cascade_order == CascadeOrder::ParentFirst;

        if cascade_first {
            self.save_ad_groups(&connection, options)?;
        }
        connection.put(
            &format!("campaigns/{id}"),
            &Value::Object(self.editable_fields()?),
        )?;
        if cascade_last {
            self.save_ad_groups(&connection, options)?;
        }
        Ok(())
    }
}

impl fmt::Display for Campaign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("");
        match &self.id {
            Some(id) => write!(f, "{name} (Campaign id: {id})"),
            None => write!(f, "{name} (Campaign id: unsaved)"),
        }
    }
}
