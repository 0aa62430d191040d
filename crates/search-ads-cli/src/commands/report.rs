use chrono::{Duration, NaiveDate, Utc};
use clap::{Args, Subcommand};
use search_ads_core::reports::fetch_windowed_report;
use search_ads_core::{Granularity, RemoteId, ReportKind, ReportRequest, ReportTable};

use super::{display_value, Session};

#[derive(Args)]
pub struct ReportArgs {
    /// First day (YYYY-MM-DD); defaults to a week before --end
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day (YYYY-MM-DD); defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,
    /// HOURLY, DAILY, WEEKLY or MONTHLY
    #[arg(long, default_value = "DAILY")]
    granularity: Granularity,
    /// Include row totals
    #[arg(long)]
    totals: bool,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl ReportArgs {
    fn request(&self) -> ReportRequest {
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        let start = self.start.unwrap_or(end - Duration::days(7));
        ReportRequest::new(start, end)
            .with_granularity(self.granularity)
            .with_row_totals(self.totals)
    }
}

#[derive(Subcommand)]
pub enum ReportAction {
    /// Account-level campaign report
    Campaigns {
        #[command(flatten)]
        args: ReportArgs,
    },
    /// Ad group report of one campaign
    #[command(name = "adgroups")]
    AdGroups {
        /// Campaign id
        campaign_id: String,
        #[command(flatten)]
        args: ReportArgs,
    },
    /// Keyword report of one campaign
    Keywords {
        /// Campaign id
        campaign_id: String,
        #[command(flatten)]
        args: ReportArgs,
    },
    /// Search term report of one campaign
    #[command(name = "searchterms")]
    SearchTerms {
        /// Campaign id
        campaign_id: String,
        #[command(flatten)]
        args: ReportArgs,
    },
}

pub fn run(action: ReportAction) -> Result<(), Box<dyn std::error::Error>> {
    let (kind, campaign_id, args) = match action {
        ReportAction::Campaigns { args } => (ReportKind::Campaigns, None, args),
        ReportAction::AdGroups { campaign_id, args } => (ReportKind::AdGroups, Some(campaign_id), args),
        ReportAction::Keywords { campaign_id, args } => (ReportKind::Keywords, Some(campaign_id), args),
        ReportAction::SearchTerms { campaign_id, args } => {
            (ReportKind::SearchTerms, Some(campaign_id), args)
        }
    };

    let session = Session::open()?;
    let client = session.client()?;
    let campaign = match campaign_id {
        Some(id) => Some(client.get_campaign(&RemoteId::new(id))?),
        None => None,
    };

    let request = args.request();
    let table = if request.start_time < request.end_time {
        fetch_windowed_report(client.connection(), kind, &request, campaign.as_ref())?
    } else {
        // single day
        client.report(kind, &request, campaign.as_ref())?
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print_table(&table);
    }
    Ok(())
}

fn print_table(table: &ReportTable) {
    let columns = table.columns();
    println!("{}", columns.join("\t"));
    for row in table.rows() {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| row.get(column).map(display_value).unwrap_or_default())
            .collect();
        println!("{}", cells.join("\t"));
    }
}
