//! Queued saves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::synchronizable::{DeferredSaveOptions, EntityKind};
use crate::models::RemoteId;

/// A save captured at deferral time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Position in the queue; strictly increasing per manager.
    pub sequence: u64,
    /// Type name the entity is rebuilt from (`Campaign`, `AdGroup`).
    pub entity_type: String,
    /// Remote id at deferral time, if the entity had one.
    #[serde(default)]
    pub entity_id: Option<RemoteId>,
    /// Wire JSON of the entity.
    pub entity_json: String,
    #[serde(default)]
    pub options: DeferredSaveOptions,
    pub queued_at: DateTime<Utc>,
}

impl PendingAction {
    /// Identity used to keep replay FIFO per entity. Entities that were not
    /// saved yet have no identity and never block each other.
    pub fn identity(&self) -> Option<(&str, &RemoteId)> {
        self.entity_id
            .as_ref()
            .map(|id| (self.entity_type.as_str(), id))
    }

    /// Every remote entity a replay of this action writes: its own identity
    /// plus, for a cascading campaign save, each embedded ad group that
    /// already has an id.
    pub fn touched_identities(&self) -> Vec<(String, RemoteId)> {
        let mut touched: Vec<(String, RemoteId)> = self
            .identity()
            .map(|(entity_type, id)| (entity_type.to_string(), id.clone()))
            .into_iter()
            .collect();
        if self.entity_type == EntityKind::Campaign.as_str() && self.options.cascade {
            touched.extend(
                cascaded_ad_group_ids(&self.entity_json)
                    .into_iter()
                    .map(|id| (EntityKind::AdGroup.as_str().to_string(), id)),
            );
        }
        touched
    }

    /// Whether the two actions write to at least one common entity.
    pub fn shares_identity_with(&self, other: &PendingAction) -> bool {
        let theirs = other.touched_identities();
        self.touched_identities()
            .iter()
            .any(|identity| theirs.contains(identity))
    }
}

fn cascaded_ad_group_ids(entity_json: &str) -> Vec<RemoteId> {
    let Ok(value) = serde_json::from_str::<Value>(entity_json) else {
        return Vec::new();
    };
    value
        .get("adGroups")
        .and_then(Value::as_array)
        .map(|ad_groups| {
            ad_groups
                .iter()
                .filter_map(|ad_group| ad_group.get("id").and_then(RemoteId::from_json))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(sequence: u64, entity_type: &str, id: Option<&str>) -> PendingAction {
        PendingAction {
            sequence,
            entity_type: entity_type.to_string(),
            entity_id: id.map(RemoteId::from),
            entity_json: "{}".to_string(),
            options: DeferredSaveOptions::default(),
            queued_at: Utc::now(),
        }
    }

    fn campaign_with_ad_groups(sequence: u64, cascade: bool) -> PendingAction {
        PendingAction {
            entity_json: r#"{"id": "100", "adGroups": [{"id": "11"}, {"id": null}, {"name": "new"}]}"#
                .to_string(),
            options: DeferredSaveOptions {
                cascade,
                ..DeferredSaveOptions::default()
            },
            ..action(sequence, "Campaign", Some("100"))
        }
    }

    #[test]
    fn identity_needs_type_and_id() {
        assert!(action(1, "Campaign", Some("1")).shares_identity_with(&action(2, "Campaign", Some("1"))));
        assert!(!action(1, "Campaign", Some("1")).shares_identity_with(&action(2, "AdGroup", Some("1"))));
        assert!(!action(1, "Campaign", None).shares_identity_with(&action(2, "Campaign", None)));
    }

    #[test]
    fn cascading_campaign_touches_its_saved_ad_groups() {
        let campaign = campaign_with_ad_groups(1, true);
        assert_eq!(
            campaign.touched_identities(),
            [
                ("Campaign".to_string(), RemoteId::from("100")),
                ("AdGroup".to_string(), RemoteId::from("11")),
            ]
        );
        assert!(campaign.shares_identity_with(&action(2, "AdGroup", Some("11"))));
        assert!(action(2, "AdGroup", Some("11")).shares_identity_with(&campaign));
        assert!(!campaign.shares_identity_with(&action(2, "AdGroup", Some("12"))));
    }

    #[test]
    fn campaign_without_cascade_touches_only_itself() {
        let campaign = campaign_with_ad_groups(1, false);
        assert_eq!(campaign.touched_identities().len(), 1);
        assert!(!campaign.shares_identity_with(&action(2, "AdGroup", Some("11"))));
    }
}
