//! Campaign listing and status changes.
//!
//! `pause` and `activate` write immediately unless `--defer` is given, in
//! which case the save is queued in the local store for `queue sync`.

use clap::Subcommand;
use search_ads_core::api::DEFAULT_CAMPAIGN_LIMIT;
use search_ads_core::{
    Campaign, RemoteId, SaveOptions, SaveOutcome, SearchAds, Synchronizable, WireSerializable,
};

use super::{display_value, open_store, Session};

#[derive(Subcommand)]
pub enum CampaignsAction {
    /// List campaigns
    List {
        /// Only campaigns whose name contains this text (case-insensitive)
        #[arg(long)]
        name: Option<String>,
        /// Maximum number of campaigns to fetch
        #[arg(long, default_value_t = DEFAULT_CAMPAIGN_LIMIT)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one campaign's fields
    Show {
        /// Campaign id
        id: String,
        /// Output the API's JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Pause a campaign
    Pause {
        /// Campaign id
        id: String,
        /// Queue the save instead of writing now
        #[arg(long)]
        defer: bool,
    },
    /// Enable a campaign
    Activate {
        /// Campaign id
        id: String,
        /// Queue the save instead of writing now
        #[arg(long)]
        defer: bool,
    },
}

pub fn run(action: CampaignsAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;
    let client = session.client()?;

    match action {
        CampaignsAction::List { name, limit, json } => {
            let campaigns = match name {
                Some(query) => client.get_campaigns_by_name(&query)?,
                None => client.get_campaigns(limit)?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&campaigns)?);
            } else {
                for campaign in &campaigns {
                    let status = campaign
                        .status
                        .as_ref()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default();
                    println!("{campaign}\t{status}");
                }
            }
        }
        CampaignsAction::Show { id, json } => {
            let campaign = client.get_campaign(&RemoteId::new(id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&campaign)?);
            } else {
                for (name, value) in campaign.local_fields()? {
                    println!("{name}\t{}", display_value(&value));
                }
            }
        }
        CampaignsAction::Pause { id, defer } => {
            update_status(&session, &client, &id, defer, Campaign::pause)?;
        }
        CampaignsAction::Activate { id, defer } => {
            update_status(&session, &client, &id, defer, Campaign::activate)?;
        }
    }
    Ok(())
}

fn update_status(
    session: &Session,
    client: &SearchAds<'_>,
    id: &str,
    defer: bool,
    change: fn(&mut Campaign),
) -> Result<(), Box<dyn std::error::Error>> {
    let mut campaign = client.get_campaign(&RemoteId::new(id))?;
    change(&mut campaign);
    let options = SaveOptions::default().with_cascade(false);

    if !defer {
        campaign.save(client.connection(), &options)?;
        println!("saved: {campaign}");
        return Ok(());
    }

    let (path, mut database) = open_store(&session.config)?;
    tracing::debug!(store = %path.display(), "deferring campaign save");
    let manager = session.sync_manager();
    database.restore_queue(&manager);
    campaign.set_sync_manager(Some(manager.clone()));

    match campaign.save(client.connection(), &options)? {
        SaveOutcome::Deferred => println!("queued: {campaign} ({} pending)", manager.len()),
        SaveOutcome::Executed => println!("saved: {campaign}"),
    }
    database.capture_queue(&manager);
    database.save(&path)?;
    Ok(())
}
