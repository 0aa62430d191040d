//! Flat JSON store.
//!
//! One file holds campaign snapshots, downloaded reports and the persisted
//! sync queue. It is read and written whole; there is no indexing and no
//! partial update.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::{Campaign, WireSerializable};
use crate::reports::{ReportKind, ReportTable};
use crate::sync::{PendingAction, SyncManager};

/// Reports of one campaign, keyed by report kind (`keywords`, ...).
pub type CampaignReports = BTreeMap<String, ReportTable>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataBase {
    /// Campaigns in wire form.
    pub campaigns: Vec<Value>,
    /// Per-campaign reports keyed by campaign id.
    pub reports: BTreeMap<String, CampaignReports>,
    /// Account-level campaign report.
    pub campaign_report: Option<ReportTable>,
    /// Deferred saves not yet replayed.
    pub pending_actions: Vec<PendingAction>,
}

impl DataBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serialize_database(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn restore_database(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from `path`; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::restore_database(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.serialize_database()?)?;
        Ok(())
    }

    pub fn push_campaign(&mut self, campaign: &Campaign) -> Result<()> {
        self.campaigns.push(campaign.to_wire()?);
        Ok(())
    }

    /// Rebuild the stored campaigns.
    pub fn load_campaigns(&self) -> Result<Vec<Campaign>> {
        self.campaigns
            .iter()
            .cloned()
            .map(Campaign::from_wire)
            .collect()
    }

    pub fn set_report(&mut self, campaign_id: &str, kind: ReportKind, table: ReportTable) {
        self.reports
            .entry(campaign_id.to_string())
            .or_default()
            .insert(kind.as_str().to_string(), table);
    }

    pub fn report(&self, campaign_id: &str, kind: ReportKind) -> Option<&ReportTable> {
        self.reports.get(campaign_id)?.get(kind.as_str())
    }

    /// Copy the manager's queue into the store.
    pub fn capture_queue(&mut self, manager: &SyncManager) {
        self.pending_actions = manager.pending_actions();
    }

    /// Move the stored queue into `manager`, leaving the store's copy empty.
    pub fn restore_queue(&mut self, manager: &SyncManager) {
        manager.restore(std::mem::take(&mut self.pending_actions));
    }
}
