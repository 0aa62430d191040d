//! Wire-format serialization shared by every entity.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::casing::{to_external_name, to_local_name};
use super::types::RemoteId;
use crate::error::Result;

/// An entity that can be written to and rebuilt from the API's JSON shape.
///
/// Rebuilding ignores keys the entity does not model; the API adds fields
/// over time and older stores carry fields this crate dropped.
pub trait WireSerializable: Serialize + DeserializeOwned {
    /// Local (snake_case) names of the fields a create or update may carry.
    const EDITABLE_FIELDS: &'static [&'static str];

    /// Local names of fields that are only sent when creating.
    const CREATE_ONLY_FIELDS: &'static [&'static str] = &[];

    /// Whether the entity has never been saved remotely.
    fn is_new(&self) -> bool;

    fn to_wire(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn to_wire_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_wire()?)?)
    }

    fn from_wire(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    fn from_wire_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The editable-field projection: identity and server-assigned fields
    /// are left out, and so are unset values.
    fn editable_fields(&self) -> Result<Map<String, Value>> {
        let wire = self.to_wire()?;
        let mut fields = project(&wire, Self::EDITABLE_FIELDS);
        if self.is_new() {
            fields.extend(project(&wire, Self::CREATE_ONLY_FIELDS));
        }
        Ok(fields)
    }

    /// Every set top-level field under its local (snake_case) name, in
    /// key order.
    fn local_fields(&self) -> Result<Vec<(String, Value)>> {
        let fields = match self.to_wire()? {
            Value::Object(map) => map
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (to_local_name(&key), value))
                .collect(),
            _ => Vec::new(),
        };
        Ok(fields)
    }
}

/// Pick the named local fields out of a wire object.
pub(crate) fn project(wire: &Value, local_names: &[&str]) -> Map<String, Value> {
    local_names
        .iter()
        .map(|name| to_external_name(name))
        .filter_map(|key| match wire.get(&key) {
            Some(value) if !value.is_null() => Some((key, value.clone())),
            _ => None,
        })
        .collect()
}

/// The id a create call answered with, under `data.id`.
pub(crate) fn response_id(response: &Value) -> Option<RemoteId> {
    response
        .get("data")
        .and_then(|data| data.get("id"))
        .and_then(RemoteId::from_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_maps_local_names_and_skips_nulls() {
        let wire = json!({
            "name": "Promo",
            "budgetAmount": {"amount": "10", "currency": "USD"},
            "status": null,
            "servingStatus": "RUNNING",
        });
        let fields = project(&wire, &["name", "budget_amount", "status"]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["budgetAmount"]["amount"], "10");
        assert!(!fields.contains_key("servingStatus"));
    }

    #[test]
    fn local_fields_use_snake_case_and_skip_unset() {
        let campaign = crate::models::Campaign::from_wire(json!({
            "id": 100,
            "name": "Promo",
            "dailyBudgetAmount": {"amount": "10", "currency": "USD"},
            "servingStatus": null,
        }))
        .unwrap();
        let fields = campaign.local_fields().unwrap();
        let names: Vec<_> = fields.iter().map(|(name, _)| name.as_str()).collect();
        assert!(names.contains(&"daily_budget_amount"));
        assert!(names.contains(&"name"));
        assert!(!names.contains(&"serving_status"));
        assert!(!names.iter().any(|name| name.chars().any(|c| c.is_ascii_uppercase())));
    }

    #[test]
    fn response_id_reads_numeric_ids() {
        assert_eq!(
            response_id(&json!({"data": {"id": 77}})),
            Some(RemoteId::from("77"))
        );
        assert_eq!(response_id(&json!({"data": null})), None);
    }
}
