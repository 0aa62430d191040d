//! Deferred save queue kept in the local store.

use clap::Subcommand;
use search_ads_core::sync::{HoldReason, ReplayOutcome};
use search_ads_core::{ReplayReport, SearchAdsError};

use super::{open_store, Session};

#[derive(Subcommand)]
pub enum QueueAction {
    /// List queued saves
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay queued saves against the API
    Sync,
    /// Drop every queued save
    Clear,
}

pub fn run(action: QueueAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;
    let (path, mut database) = open_store(&session.config)?;

    match action {
        QueueAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&database.pending_actions)?);
            } else if database.pending_actions.is_empty() {
                println!("queue is empty");
            } else {
                for action in &database.pending_actions {
                    let id = action
                        .entity_id
                        .as_ref()
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "unsaved".to_string());
                    println!(
                        "#{}\t{} {}\t{}",
                        action.sequence,
                        action.entity_type,
                        id,
                        action.queued_at.to_rfc3339()
                    );
                }
            }
        }
        QueueAction::Sync => {
            let client = session.client()?;
            let manager = session.sync_manager();
            database.restore_queue(&manager);
            tracing::debug!(pending = manager.len(), policy = %manager.policy(), "syncing queue");

            let result = manager.synchronize(client.connection());
            database.capture_queue(&manager);
            database.save(&path)?;

            match result {
                Ok(report) => print_report(&report),
                Err(SearchAdsError::Replay(report)) => {
                    print_report(&report);
                    return Err(format!("{} deferred save(s) failed", report.failed_count).into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        QueueAction::Clear => {
            let manager = session.sync_manager();
            database.restore_queue(&manager);
            let dropped = manager.clear();
            database.capture_queue(&manager);
            database.save(&path)?;
            println!("dropped {dropped} queued save(s)");
        }
    }
    Ok(())
}

fn print_report(report: &ReplayReport) {
    for outcome in &report.outcomes {
        match outcome {
            ReplayOutcome::Replayed { sequence } => println!("#{sequence}\treplayed"),
            ReplayOutcome::Failed { sequence, error } => println!("#{sequence}\tfailed: {error}"),
            ReplayOutcome::Held { sequence, reason } => {
                let failed_sequence = match reason {
                    HoldReason::Aborted { failed_sequence }
                    | HoldReason::SameEntityFailed { failed_sequence } => failed_sequence,
                };
                println!("#{sequence}\theld after #{failed_sequence}");
            }
        }
    }
    println!(
        "replayed {}/{} ({} failed, {} held)",
        report.replayed_count, report.total_actions, report.failed_count, report.held_count
    );
}
