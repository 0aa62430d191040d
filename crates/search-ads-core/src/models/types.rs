//! Value types shared by campaigns, ad groups and keywords.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned by the remote API.
///
/// The API sends ids as JSON numbers; they are kept as strings locally so
/// they can be spliced into paths without caring about width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an id out of an arbitrary JSON value (number or string).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(Self(n.to_string())),
            serde_json::Value::String(s) if is_present(s) => Some(Self(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RemoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RemoteId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(serde_json::Number),
    Text(String),
}

impl RawId {
    fn into_id(self) -> Option<RemoteId> {
        match self {
            RawId::Number(n) => Some(RemoteId(n.to_string())),
            RawId::Text(s) if is_present(&s) => Some(RemoteId(s)),
            RawId::Text(_) => None,
        }
    }
}

// Older stores wrote missing ids as the literal string "None".
fn is_present(raw: &str) -> bool {
    !raw.is_empty() && raw != "None"
}

impl<'de> Deserialize<'de> for RemoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer)?
            .into_id()
            .ok_or_else(|| serde::de::Error::custom("empty remote id"))
    }
}

/// `deserialize_with` helper: absent, null, empty and "None" ids are all `None`.
pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<RemoteId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.and_then(RawId::into_id))
}

/// `deserialize_with` helper: treat an explicit `null` like a missing field.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A currency amount as the API represents it: a decimal string plus an
/// ISO currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    #[serde(deserialize_with = "amount_string")]
    pub amount: String,
    pub currency: String,
}

impl Money {
    pub fn new(amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
        }
    }

    pub fn usd(amount: f64) -> Self {
        Self::new(amount.to_string(), "USD")
    }

    /// Amount as a float, if it parses.
    pub fn value(&self) -> Option<f64> {
        self.amount.parse().ok()
    }
}

fn amount_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected amount string, got {other}"
        ))),
    }
}

/// Serving status of a campaign, ad group or keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Enabled,
    Paused,
    /// Any value this crate does not model; kept verbatim.
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Enabled => "ENABLED",
            Status::Paused => "PAUSED",
            Status::Other(raw) => raw,
        }
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "ENABLED" => Status::Enabled,
            "PAUSED" => Status::Paused,
            _ => Status::Other(raw),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword match type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchType {
    Exact,
    Broad,
    Other(String),
}

impl MatchType {
    pub fn as_str(&self) -> &str {
        match self {
            MatchType::Exact => "EXACT",
            MatchType::Broad => "BROAD",
            MatchType::Other(raw) => raw,
        }
    }
}

impl From<String> for MatchType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "EXACT" => MatchType::Exact,
            "BROAD" => MatchType::Broad,
            _ => MatchType::Other(raw),
        }
    }
}

impl From<MatchType> for String {
    fn from(match_type: MatchType) -> Self {
        match match_type {
            MatchType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remote_id_accepts_numbers_and_strings() {
        let from_number: RemoteId = serde_json::from_value(json!(42)).unwrap();
        let from_string: RemoteId = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(serde_json::to_value(&from_number).unwrap(), json!("42"));
    }

    #[test]
    fn legacy_none_string_is_no_id() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "optional_id")]
            id: Option<RemoteId>,
        }
        let holder: Holder = serde_json::from_value(json!({"id": "None"})).unwrap();
        assert!(holder.id.is_none());
        let holder: Holder = serde_json::from_value(json!({"id": null})).unwrap();
        assert!(holder.id.is_none());
        let holder: Holder = serde_json::from_value(json!({})).unwrap();
        assert!(holder.id.is_none());
    }

    #[test]
    fn status_keeps_unknown_values() {
        let status: Status = serde_json::from_value(json!("DELETED")).unwrap();
        assert_eq!(status, Status::Other("DELETED".to_string()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("DELETED"));
        assert_eq!(serde_json::to_value(Status::Paused).unwrap(), json!("PAUSED"));
    }

    #[test]
    fn money_formats_whole_and_fractional_amounts() {
        assert_eq!(Money::usd(100.0).amount, "100");
        assert_eq!(Money::usd(0.5).amount, "0.5");
        let numeric: Money = serde_json::from_value(json!({"amount": 1.25, "currency": "EUR"})).unwrap();
        assert_eq!(numeric.value(), Some(1.25));
    }
}
