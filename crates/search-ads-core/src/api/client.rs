//! Organization-scoped entry point.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::connection::Connection;
use super::transport::TransportError;
use crate::error::{ConfigError, Result, SearchAdsError};
use crate::models::{AdGroup, Campaign, Money, RemoteId, Status, WireSerializable};
use crate::reports::{
    fetch_report, fetch_windowed_report, impressions_selector, Granularity, ReportKind,
    ReportRequest, ReportTable,
};
use crate::storage::DataBase;
use crate::sync::{SaveOptions, Synchronizable};

/// Page size used when listing every campaign.
pub const DEFAULT_CAMPAIGN_LIMIT: usize = 2000;

const STORE_REPORT_ROW_LIMIT: u32 = 5000;
const STORE_REPORT_DEFAULT_DAYS: i64 = 30;

/// Client bound to one organization.
pub struct SearchAds<'a> {
    connection: Connection<'a>,
}

impl<'a> SearchAds<'a> {
    /// Resolve `org_name` through the account's access list and bind the
    /// client to that organization.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OrganizationNotFound`] when the certificate cannot see
    /// an organization of that name.
    pub fn connect(connection: Connection<'a>, org_name: &str) -> Result<Self> {
        let connection = connection.without_org_id();
        let orgs = data_array(&connection, "acls", connection.get("acls")?)?;

        let org_id = orgs
            .iter()
            .filter(|org| org.get("orgName").and_then(Value::as_str) == Some(org_name))
            .find_map(|org| org.get("orgId").and_then(RemoteId::from_json))
            .ok_or_else(|| ConfigError::OrganizationNotFound {
                org_name: org_name.to_string(),
            })?;

        tracing::info!(org_name, org_id = %org_id, "connected to organization");
        Ok(Self {
            connection: connection.with_org_id(org_id.as_str()),
        })
    }

    /// Wrap a connection whose organization is already known.
    pub fn from_connection(connection: Connection<'a>) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Connection<'a> {
        &self.connection
    }

    pub fn org_id(&self) -> Option<&str> {
        self.connection.org_id()
    }

    pub fn get_campaigns(&self, limit: usize) -> Result<Vec<Campaign>> {
        let path = format!("campaigns?limit={limit}&offset=0");
        let response = self.connection.get(&path)?;
        data_array(&self.connection, &path, response)?
            .into_iter()
            .map(Campaign::from_wire)
            .collect()
    }

    pub fn get_campaign(&self, id: &RemoteId) -> Result<Campaign> {
        let path = format!("campaigns/{id}");
        let response = self.connection.get(&path)?;
        match response.get("data") {
            Some(data) if data.is_object() => Campaign::from_wire(data.clone()),
            _ => Err(missing_data(&self.connection, &path, &response)),
        }
    }

    /// Campaigns whose name contains `query`, ignoring case.
    pub fn get_campaigns_by_name(&self, query: &str) -> Result<Vec<Campaign>> {
        let query = query.to_lowercase();
        Ok(self
            .get_campaigns(DEFAULT_CAMPAIGN_LIMIT)?
            .into_iter()
            .filter(|campaign| {
                campaign
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&query))
            })
            .collect())
    }

    /// The first campaign named exactly `name`.
    pub fn get_campaign_by_name(&self, name: &str) -> Result<Option<Campaign>> {
        Ok(self
            .get_campaigns(DEFAULT_CAMPAIGN_LIMIT)?
            .into_iter()
            .find(|campaign| campaign.name.as_deref() == Some(name)))
    }

    /// Create a campaign with its default ad group in one request, then read
    /// it back by name.
    pub fn create_campaign(&self, new: &NewCampaign) -> Result<Option<Campaign>> {
        let mut campaign = new.build(self.org_id());
        campaign.save(&self.connection, &SaveOptions::default().with_cascade(false))?;
        self.get_campaign_by_name(&new.campaign_name)
    }

    pub fn report(
        &self,
        kind: ReportKind,
        request: &ReportRequest,
        campaign: Option<&Campaign>,
    ) -> Result<ReportTable> {
        fetch_report(&self.connection, kind, request, campaign)
    }

    pub fn get_campaign_report(&self, request: &ReportRequest) -> Result<ReportTable> {
        self.report(ReportKind::Campaigns, request, None)
    }

    pub fn get_campaign_adgroups_report(
        &self,
        campaign: &Campaign,
        request: &ReportRequest,
    ) -> Result<ReportTable> {
        self.report(ReportKind::AdGroups, request, Some(campaign))
    }

    pub fn get_campaign_keywords_report(
        &self,
        campaign: &Campaign,
        request: &ReportRequest,
    ) -> Result<ReportTable> {
        self.report(ReportKind::Keywords, request, Some(campaign))
    }

    pub fn get_campaign_searchterms_report(
        &self,
        campaign: &Campaign,
        request: &ReportRequest,
    ) -> Result<ReportTable> {
        self.report(ReportKind::SearchTerms, request, Some(campaign))
    }

    /// Snapshot every campaign into `database`. Returns how many were stored.
    pub fn store_campaigns(&self, database: &mut DataBase) -> Result<usize> {
        let campaigns = self.get_campaigns(DEFAULT_CAMPAIGN_LIMIT)?;
        for campaign in &campaigns {
            database.push_campaign(campaign)?;
        }
        Ok(campaigns.len())
    }

    /// Download the keyword, search-term and ad-group reports of every
    /// campaign, then the account-level campaign report, into `database`.
    pub fn store_reports(
        &self,
        campaigns: &[Campaign],
        database: &mut DataBase,
        options: &StoreReportsOptions,
    ) -> Result<()> {
        for (index, campaign) in campaigns.iter().enumerate() {
            let Some(id) = campaign.id() else {
                tracing::warn!(campaign = %campaign, "skipping unsaved campaign");
                continue;
            };
            tracing::info!(campaign = %id, progress = index + 1, total = campaigns.len(), "storing reports");
            for kind in ReportKind::PER_CAMPAIGN {
                let table = fetch_windowed_report(
                    &self.connection,
                    kind,
                    &options.request_for(kind),
                    Some(campaign),
                )?;
                database.set_report(id.as_str(), kind, table);
            }
        }

        let kind = ReportKind::Campaigns;
        database.campaign_report = Some(fetch_windowed_report(
            &self.connection,
            kind,
            &options.request_for(kind),
            None,
        )?);
        Ok(())
    }
}

/// Inputs for [`SearchAds::create_campaign`]. Amounts are in USD.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCampaign {
    pub campaign_name: String,
    pub ad_group_name: String,
    pub app_id: RemoteId,
    pub automated_keywords_opt_in: bool,
    pub default_cpc_bid: f64,
    pub budget: f64,
    pub daily_budget: f64,
    pub cpa_goal: Option<f64>,
    pub payment_model: String,
    pub start_time: NaiveDateTime,
    /// ENABLED when set, PAUSED otherwise.
    pub active: bool,
}

impl NewCampaign {
    pub fn new(
        campaign_name: impl Into<String>,
        ad_group_name: impl Into<String>,
        app_id: impl Into<RemoteId>,
    ) -> Self {
        Self {
            campaign_name: campaign_name.into(),
            ad_group_name: ad_group_name.into(),
            app_id: app_id.into(),
            automated_keywords_opt_in: false,
            default_cpc_bid: 0.0,
            budget: 0.0,
            daily_budget: 0.0,
            cpa_goal: None,
            payment_model: "PAYG".to_string(),
            start_time: Utc::now().naive_utc(),
            active: true,
        }
    }

    /// The unsaved campaign, with its default ad group attached.
    pub fn build(&self, org_id: Option<&str>) -> Campaign {
        let status = if self.active {
            Status::Enabled
        } else {
            Status::Paused
        };

        let mut ad_group = AdGroup::new(self.ad_group_name.clone()).with_start_time(
            self.start_time
                .format("%Y-%m-%dT%H:%M:%S.000")
                .to_string(),
        );
        ad_group.automated_keywords_opt_in = Some(self.automated_keywords_opt_in);
        ad_group.cpa_goal = self.cpa_goal.map(Money::usd);
        ad_group.default_cpc_bid = Some(Money::usd(self.default_cpc_bid));
        ad_group.status = Some(status.clone());

        let mut campaign = Campaign::new(self.campaign_name.clone())
            .with_adam_id(self.app_id.clone())
            .with_payment_model(self.payment_model.clone());
        if let Some(org_id) = org_id {
            campaign = campaign.with_org_id(org_id);
        }
        campaign.budget_amount = Some(Money::usd(self.budget));
        campaign.daily_budget_amount = Some(Money::usd(self.daily_budget));
        campaign.status = Some(status);
        campaign.ad_groups = vec![ad_group];
        campaign
    }
}

/// Date range and granularity for [`SearchAds::store_reports`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreReportsOptions {
    pub granularity: Granularity,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for StoreReportsOptions {
    fn default() -> Self {
        let end = Utc::now().date_naive();
        Self {
            granularity: Granularity::Hourly,
            start: end - Duration::days(STORE_REPORT_DEFAULT_DAYS),
            end,
        }
    }
}

impl StoreReportsOptions {
    /// Request used for `kind`: most impressions first, no zero-metric rows,
    /// no totals. Search terms have no hourly breakdown and fall back to
    /// daily.
    pub fn request_for(&self, kind: ReportKind) -> ReportRequest {
        let granularity = match (kind, self.granularity) {
            (ReportKind::SearchTerms, Granularity::Hourly) => {
                tracing::warn!("forcing daily granularity for search terms");
                Granularity::Daily
            }
            (_, granularity) => granularity,
        };
        ReportRequest::new(self.start, self.end)
            .with_granularity(granularity)
            .with_selector(impressions_selector(STORE_REPORT_ROW_LIMIT))
            .with_records_with_no_metrics(false)
            .with_row_totals(false)
    }
}

fn missing_data(connection: &Connection<'_>, path: &str, response: &Value) -> SearchAdsError {
    SearchAdsError::Transport {
        endpoint: connection.endpoint(path),
        source: TransportError::Decode {
            body: response.to_string(),
            message: "response has no data field".to_string(),
        },
    }
}

fn data_array(connection: &Connection<'_>, path: &str, response: Value) -> Result<Vec<Value>> {
    match response.get("data") {
        Some(Value::Array(items)) => Ok(items.clone()),
        _ => Err(missing_data(connection, path, &response)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_campaign() -> NewCampaign {
        let mut new = NewCampaign::new("Spring Promo", "Default", 123456u64);
        new.budget = 100.0;
        new.daily_budget = 10.0;
        new.default_cpc_bid = 0.5;
        new.start_time = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        new
    }

    #[test]
    fn build_fills_campaign_and_default_ad_group() {
        let campaign = new_campaign().build(Some("42"));
        assert_eq!(campaign.name.as_deref(), Some("Spring Promo"));
        assert_eq!(campaign.org_id(), Some(&RemoteId::from("42")));
        assert_eq!(campaign.payment_model(), Some("PAYG"));
        assert_eq!(campaign.budget_amount, Some(Money::new("100", "USD")));
        assert_eq!(campaign.daily_budget_amount, Some(Money::new("10", "USD")));
        assert_eq!(campaign.status, Some(Status::Enabled));

        let ad_group = campaign.get_ad_group_by_name("Default").unwrap();
        assert_eq!(ad_group.start_time(), Some("2024-03-01T09:05:07.000"));
        assert_eq!(ad_group.default_cpc_bid, Some(Money::new("0.5", "USD")));
        assert!(ad_group.cpa_goal.is_none());
    }

    #[test]
    fn inactive_campaign_is_paused_throughout() {
        let mut new = new_campaign();
        new.active = false;
        new.cpa_goal = Some(2.0);
        let campaign = new.build(None);
        assert_eq!(campaign.status, Some(Status::Paused));
        assert_eq!(campaign.ad_groups[0].status, Some(Status::Paused));
        assert_eq!(campaign.ad_groups[0].cpa_goal, Some(Money::new("2", "USD")));
    }

    #[test]
    fn store_requests_sort_by_impressions_without_empty_rows() {
        let options = StoreReportsOptions::default();
        let request = options.request_for(ReportKind::Keywords);
        assert_eq!(request.granularity, Granularity::Hourly);
        assert!(!request.return_records_with_no_metrics);
        assert!(!request.return_row_totals);
        assert_eq!(request.selector["orderBy"][0]["field"], "impressions");
        assert_eq!(request.selector["pagination"]["limit"], 5000);
        assert_eq!(options.end - options.start, Duration::days(30));
    }

    #[test]
    fn search_terms_never_go_hourly() {
        let options = StoreReportsOptions::default();
        assert_eq!(
            options.request_for(ReportKind::SearchTerms).granularity,
            Granularity::Daily
        );
        let weekly = StoreReportsOptions {
            granularity: Granularity::Weekly,
            ..options
        };
        assert_eq!(
            weekly.request_for(ReportKind::SearchTerms).granularity,
            Granularity::Weekly
        );
    }
}
