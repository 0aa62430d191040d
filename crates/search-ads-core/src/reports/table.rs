//! Flat report tables.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Result, SearchAdsError};
use crate::models::Campaign;

/// One flattened report row: field name to value.
pub type ReportRow = Map<String, Value>;

/// Ordered rows of a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportTable {
    rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ReportRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    /// Move every row of `other` to the end of this table.
    pub fn append(&mut self, other: ReportTable) {
        self.rows.extend(other.rows);
    }

    /// Column names in first-seen order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }
}

impl FromIterator<ReportRow> for ReportTable {
    fn from_iter<I: IntoIterator<Item = ReportRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<ReportTable> for ReportTable {
    fn from_iter<I: IntoIterator<Item = ReportTable>>(iter: I) -> Self {
        let mut table = ReportTable::new();
        for part in iter {
            table.append(part);
        }
        table
    }
}

/// Turn a report response into one row per granularity bucket.
///
/// Each row merges the row metadata, the row totals when requested, and the
/// bucket's own metrics. Per-campaign rows are tagged with the campaign's
/// `adamId` and `campaignId`; account-level rows get `adamId` and `appName`
/// lifted out of their `app` object. Amount objects become plain floats.
///
/// # Errors
///
/// [`SearchAdsError::MalformedReportResponse`] when the response has no row
/// list or a row has no granularity list.
pub fn flatten_report(
    response: &Value,
    endpoint: &str,
    campaign: Option<&Campaign>,
    include_totals: bool,
) -> Result<ReportTable> {
    let malformed = || SearchAdsError::MalformedReportResponse {
        endpoint: endpoint.to_string(),
        response: response.clone(),
    };
    let rows = response
        .pointer("/data/reportingDataResponse/row")
        .and_then(Value::as_array)
        .ok_or_else(malformed)?;

    let mut table = ReportTable::new();
    for row in rows {
        let mut base = ReportRow::new();
        if let Some(Value::Object(metadata)) = row.get("metadata") {
            base.extend(metadata.clone());
        }
        if include_totals {
            if let Some(Value::Object(total)) = row.get("total") {
                base.extend(total.clone());
            }
        }
        match campaign {
            Some(campaign) => {
                base.insert("adamId".to_string(), id_value(campaign.adam_id()));
                base.insert("campaignId".to_string(), id_value(campaign.id()));
            }
            None => lift_app_fields(&mut base),
        }

        let buckets = row
            .get("granularity")
            .and_then(Value::as_array)
            .ok_or_else(malformed)?;
        for bucket in buckets {
            let mut flat = base.clone();
            if let Value::Object(metrics) = bucket {
                flat.extend(metrics.clone());
            }
            convert_amounts(&mut flat);
            table.push(flat);
        }
    }
    Ok(table)
}

fn id_value(id: Option<&crate::models::RemoteId>) -> Value {
    id.map(|id| Value::String(id.to_string()))
        .unwrap_or(Value::Null)
}

fn lift_app_fields(row: &mut ReportRow) {
    if let Some(Value::Object(app)) = row.remove("app") {
        for key in ["adamId", "appName"] {
            row.insert(key.to_string(), app.get(key).cloned().unwrap_or(Value::Null));
        }
    }
}

/// `{"amount": "1.5", "currency": "USD"}` -> `1.5`.
fn convert_amounts(row: &mut ReportRow) {
    for value in row.values_mut() {
        let amount = match value {
            Value::Object(obj) if obj.contains_key("currency") => match obj.get("amount") {
                Some(Value::String(s)) => s.parse::<f64>().ok(),
                Some(Value::Number(n)) => n.as_f64(),
                _ => None,
            },
            _ => None,
        };
        if let Some(number) = amount.and_then(Number::from_f64) {
            *value = Value::Number(number);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WireSerializable;
    use serde_json::json;

    fn response(rows: Value) -> Value {
        json!({"data": {"reportingDataResponse": {"row": rows}}})
    }

    #[test]
    fn one_row_per_bucket_with_metadata_merged() {
        let body = response(json!([{
            "metadata": {"keyword": "shoes", "keywordId": 42},
            "total": {"impressions": 30},
            "granularity": [
                {"date": "2024-01-01", "impressions": 10, "localSpend": {"amount": "1.25", "currency": "USD"}},
                {"date": "2024-01-02", "impressions": 20, "localSpend": {"amount": "2", "currency": "USD"}},
            ],
        }]));
        let campaign = Campaign::from_wire(json!({"id": 100, "adamId": 555})).unwrap();

        let table = flatten_report(&body, "v1/reports", Some(&campaign), false).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first["keyword"], "shoes");
        assert_eq!(first["impressions"], 10);
        assert_eq!(first["localSpend"], json!(1.25));
        assert_eq!(first["campaignId"], "100");
        assert_eq!(first["adamId"], "555");
        assert_eq!(table.rows()[1]["localSpend"], json!(2.0));
    }

    #[test]
    fn totals_only_merged_when_requested() {
        let body = response(json!([{
            "metadata": {"campaignId": 1, "app": {"adamId": 9, "appName": "Demo"}},
            "total": {"taps": 4},
            "granularity": [{"hour": 1, "taps": 1}],
        }]));
        let with = flatten_report(&body, "e", None, true).unwrap();
        assert_eq!(with.rows()[0]["taps"], 1);
        let without = flatten_report(
            &response(json!([{"metadata": {}, "total": {"spendTotal": 4}, "granularity": [{}]}])),
            "e",
            None,
            false,
        )
        .unwrap();
        assert!(!without.rows()[0].contains_key("spendTotal"));
    }

    #[test]
    fn account_rows_lift_app_fields() {
        let body = response(json!([{
            "metadata": {"campaignId": 1, "app": {"adamId": 9, "appName": "Demo"}},
            "granularity": [{"date": "2024-01-01"}],
        }]));
        let table = flatten_report(&body, "e", None, false).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row["adamId"], 9);
        assert_eq!(row["appName"], "Demo");
        assert!(!row.contains_key("app"));
    }

    #[test]
    fn missing_row_structure_is_malformed() {
        let body = json!({"data": null, "error": {"errors": [{"message": "bad"}]}});
        match flatten_report(&body, "v1/reports/campaigns", None, false) {
            Err(SearchAdsError::MalformedReportResponse { endpoint, response }) => {
                assert_eq!(endpoint, "v1/reports/campaigns");
                assert_eq!(response, body);
            }
            other => panic!("expected malformed response, got {other:?}"),
        }
    }

    #[test]
    fn columns_keep_first_seen_order() {
        let mut table = ReportTable::new();
        let mut a = ReportRow::new();
        a.insert("b".into(), json!(1));
        let mut b = ReportRow::new();
        b.insert("a".into(), json!(1));
        b.insert("b".into(), json!(2));
        table.push(a);
        table.push(b);
        assert_eq!(table.columns(), ["b", "a"]);
    }
}
