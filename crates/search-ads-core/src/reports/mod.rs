//! Performance reports.

pub mod request;
pub mod table;

pub use request::{
    date_windows, default_selector, impressions_selector, DateWindow, Granularity, ReportKind,
    ReportRequest,
};
pub use table::{flatten_report, ReportRow, ReportTable};

use crate::api::Connection;
use crate::error::Result;
use crate::models::Campaign;

/// Query one report and flatten it.
///
/// `campaign` is required for every kind except [`ReportKind::Campaigns`],
/// where it is ignored.
pub fn fetch_report(
    connection: &Connection<'_>,
    kind: ReportKind,
    request: &ReportRequest,
    campaign: Option<&Campaign>,
) -> Result<ReportTable> {
    let campaign = if kind.is_account_level() { None } else { campaign };
    let path = kind.path(campaign.and_then(Campaign::id))?;
    let body = serde_json::to_value(request)?;

    tracing::debug!(report = %kind, start = %request.start_time, end = %request.end_time, "fetching report");
    let response = connection.query(&path, &body)?;
    flatten_report(
        &response,
        &connection.endpoint(&path),
        campaign,
        request.return_row_totals,
    )
}

/// Query a report over a long range, one request per window, and
/// concatenate the results in window order.
pub fn fetch_windowed_report(
    connection: &Connection<'_>,
    kind: ReportKind,
    request: &ReportRequest,
    campaign: Option<&Campaign>,
) -> Result<ReportTable> {
    date_windows(
        request.start_time,
        request.end_time,
        request.granularity.window_days(),
    )
    .into_iter()
    .map(|window| fetch_report(connection, kind, &request.for_window(window), campaign))
    .collect()
}
