use chrono::NaiveDate;
use clap::Subcommand;
use search_ads_core::api::{StoreReportsOptions, DEFAULT_CAMPAIGN_LIMIT};
use search_ads_core::Granularity;

use super::{open_store, Session};

#[derive(Subcommand)]
pub enum StoreAction {
    /// Snapshot every campaign into the local store
    Campaigns,
    /// Download per-campaign and account reports into the local store
    Reports {
        /// First day (YYYY-MM-DD); defaults to 30 days ago
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD); defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
        /// HOURLY, DAILY, WEEKLY or MONTHLY
        #[arg(long, default_value = "HOURLY")]
        granularity: Granularity,
    },
}

pub fn run(action: StoreAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;
    let client = session.client()?;
    let (path, mut database) = open_store(&session.config)?;

    match action {
        StoreAction::Campaigns => {
            let count = client.store_campaigns(&mut database)?;
            database.save(&path)?;
            println!("stored {count} campaign(s) in {}", path.display());
        }
        StoreAction::Reports {
            start,
            end,
            granularity,
        } => {
            let defaults = StoreReportsOptions::default();
            let options = StoreReportsOptions {
                granularity,
                start: start.unwrap_or(defaults.start),
                end: end.unwrap_or(defaults.end),
            };

            // Reuse the snapshot when there is one.
            let mut campaigns = database.load_campaigns()?;
            if campaigns.is_empty() {
                campaigns = client.get_campaigns(DEFAULT_CAMPAIGN_LIMIT)?;
            }

            client.store_reports(&campaigns, &mut database, &options)?;
            database.save(&path)?;
            println!(
                "stored reports for {} campaign(s) from {} to {}",
                campaigns.len(),
                options.start,
                options.end
            );
        }
    }
    Ok(())
}
