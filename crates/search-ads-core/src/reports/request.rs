//! Report request bodies.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ValidationError;
use crate::models::RemoteId;

/// Bucket size of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    #[default]
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hourly => "HOURLY",
            Granularity::Daily => "DAILY",
            Granularity::Weekly => "WEEKLY",
            Granularity::Monthly => "MONTHLY",
        }
    }

    /// Widest date range the API serves in one request at this granularity.
    pub fn window_days(&self) -> i64 {
        match self {
            Granularity::Hourly => 7,
            Granularity::Daily => 90,
            Granularity::Weekly | Granularity::Monthly => 365,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HOURLY" => Ok(Granularity::Hourly),
            "DAILY" => Ok(Granularity::Daily),
            "WEEKLY" => Ok(Granularity::Weekly),
            "MONTHLY" => Ok(Granularity::Monthly),
            _ => Err(ValidationError::InvalidValue {
                field: "granularity".to_string(),
                message: format!("unknown granularity '{s}'"),
            }),
        }
    }
}

/// Which report endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Account level: one row set across every campaign.
    Campaigns,
    AdGroups,
    Keywords,
    SearchTerms,
}

impl ReportKind {
    pub const PER_CAMPAIGN: [ReportKind; 3] =
        [ReportKind::Keywords, ReportKind::SearchTerms, ReportKind::AdGroups];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Campaigns => "campaigns",
            ReportKind::AdGroups => "adgroups",
            ReportKind::Keywords => "keywords",
            ReportKind::SearchTerms => "searchterms",
        }
    }

    pub fn is_account_level(&self) -> bool {
        matches!(self, ReportKind::Campaigns)
    }

    /// Path under the API version. Per-campaign kinds need `campaign_id`.
    pub fn path(&self, campaign_id: Option<&RemoteId>) -> Result<String, ValidationError> {
        if self.is_account_level() {
            return Ok("reports/campaigns".to_string());
        }
        let campaign_id = campaign_id.ok_or_else(|| ValidationError::InvalidValue {
            field: "campaign".to_string(),
            message: format!("{} reports need a saved campaign", self.as_str()),
        })?;
        Ok(format!("reports/campaigns/{campaign_id}/{}", self.as_str()))
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "campaigns" | "campaign" => Ok(ReportKind::Campaigns),
            "adgroups" | "adgroup" => Ok(ReportKind::AdGroups),
            "keywords" => Ok(ReportKind::Keywords),
            "searchterms" => Ok(ReportKind::SearchTerms),
            other => Err(ValidationError::InvalidValue {
                field: "report".to_string(),
                message: format!("unknown report kind '{other}'"),
            }),
        }
    }
}

/// Newest-modified first, 1000 rows.
pub fn default_selector() -> Value {
    json!({
        "orderBy": [{"field": "modificationTime", "sortOrder": "DESCENDING"}],
        "conditions": [],
        "pagination": {"offset": 0, "limit": 1000},
    })
}

/// Most impressions first.
pub fn impressions_selector(limit: u32) -> Value {
    json!({
        "orderBy": [{"field": "impressions", "sortOrder": "DESCENDING"}],
        "pagination": {"offset": 0, "limit": limit},
    })
}

/// Body of a report query. Dates serialize as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub start_time: NaiveDate,
    pub end_time: NaiveDate,
    pub time_zone: String,
    pub granularity: Granularity,
    pub selector: Value,
    pub group_by: Vec<String>,
    pub return_row_totals: bool,
    pub return_records_with_no_metrics: bool,
}

impl Default for ReportRequest {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self::new(today, today)
    }
}

impl ReportRequest {
    pub fn new(start_time: NaiveDate, end_time: NaiveDate) -> Self {
        Self {
            start_time,
            end_time,
            time_zone: "UTC".to_string(),
            granularity: Granularity::default(),
            selector: default_selector(),
            group_by: Vec::new(),
            return_row_totals: false,
            return_records_with_no_metrics: true,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    pub fn with_selector(mut self, selector: Value) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_group_by(mut self, group_by: Vec<String>) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_row_totals(mut self, return_row_totals: bool) -> Self {
        self.return_row_totals = return_row_totals;
        self
    }

    pub fn with_records_with_no_metrics(mut self, include: bool) -> Self {
        self.return_records_with_no_metrics = include;
        self
    }

    /// Copy of this request covering a different date range.
    pub fn for_window(&self, window: DateWindow) -> Self {
        Self {
            start_time: window.start,
            end_time: window.end,
            ..self.clone()
        }
    }
}

/// One request-sized slice of a longer date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Split `[start, end)` into consecutive windows of at most `step_days`.
/// The last window is clipped to `end`; an empty or inverted range yields
/// no windows.
pub fn date_windows(start: NaiveDate, end: NaiveDate, step_days: i64) -> Vec<DateWindow> {
    let step = Duration::days(step_days.max(1));
    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let next = (cursor + step).min(end);
        windows.push(DateWindow {
            start: cursor,
            end: next,
        });
        cursor = next;
    }
    windows
}
