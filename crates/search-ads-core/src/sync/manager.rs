//! Pending-action queue and replay.
//!
//! Entities hold a cheap [`SyncManager`] handle; the manager only ever
//! stores serialized snapshots, never the entities themselves. Replay works
//! on a snapshot of the queue and never holds the lock across network I/O,
//! so entities may keep queueing while a flush is in flight.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::pending::PendingAction;
use super::synchronizable::{DeferredSaveOptions, EntityKind, SaveOptions, Synchronizable};
use crate::api::transport::CredentialContext;
use crate::api::Connection;
use crate::error::{Result, SearchAdsError, ValidationError};
use crate::models::{AdGroup, Campaign, RemoteId, WireSerializable};

/// What replay does after an action fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPolicy {
    /// Stop; the failed action and everything after it stay queued.
    #[default]
    AbortRemaining,
    /// Keep going. Later actions for the same entity as a failed one are
    /// held back so that entity's saves still land in order.
    SkipAndContinue,
}

impl ReplayPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplayPolicy::AbortRemaining => "abort_remaining",
            ReplayPolicy::SkipAndContinue => "skip_and_continue",
        }
    }
}

impl FromStr for ReplayPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort_remaining" | "abort" => Ok(ReplayPolicy::AbortRemaining),
            "skip_and_continue" | "skip" => Ok(ReplayPolicy::SkipAndContinue),
            other => Err(ValidationError::InvalidValue {
                field: "replay_policy".to_string(),
                message: format!("unknown policy '{other}'"),
            }),
        }
    }
}

impl fmt::Display for ReplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an action was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// An earlier action failed under [`ReplayPolicy::AbortRemaining`].
    Aborted { failed_sequence: u64 },
    /// An earlier action for the same entity failed.
    SameEntityFailed { failed_sequence: u64 },
}

/// Result of one queued action.
#[derive(Debug)]
pub enum ReplayOutcome {
    Replayed { sequence: u64 },
    Failed { sequence: u64, error: SearchAdsError },
    Held { sequence: u64, reason: HoldReason },
}

impl ReplayOutcome {
    pub fn sequence(&self) -> u64 {
        match self {
            ReplayOutcome::Replayed { sequence }
            | ReplayOutcome::Failed { sequence, .. }
            | ReplayOutcome::Held { sequence, .. } => *sequence,
        }
    }
}

/// Summary of a replay.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Actions in the snapshot.
    pub total_actions: usize,
    pub replayed_count: usize,
    pub failed_count: usize,
    pub held_count: usize,
    /// One outcome per action, in queue order.
    pub outcomes: Vec<ReplayOutcome>,
}

impl ReplayReport {
    fn new(total_actions: usize) -> Self {
        Self {
            total_actions,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: ReplayOutcome) {
        match &outcome {
            ReplayOutcome::Replayed { .. } => self.replayed_count += 1,
            ReplayOutcome::Failed { .. } => self.failed_count += 1,
            ReplayOutcome::Held { .. } => self.held_count += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Whether every action was replayed.
    pub fn is_complete(&self) -> bool {
        self.failed_count == 0 && self.held_count == 0
    }

    /// Errors of the failed actions, by sequence.
    pub fn failures(&self) -> impl Iterator<Item = (u64, &SearchAdsError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ReplayOutcome::Failed { sequence, error } => Some((*sequence, error)),
            _ => None,
        })
    }
}

#[derive(Debug)]
struct SyncState {
    certs: CredentialContext,
    policy: ReplayPolicy,
    pending_actions: Vec<PendingAction>,
    next_sequence: u64,
}

/// Shared queue of deferred saves plus the credentials to replay them with.
#[derive(Debug, Clone)]
pub struct SyncManager {
    inner: Arc<Mutex<SyncState>>,
}

impl SyncManager {
    pub fn new(certs: CredentialContext) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SyncState {
                certs,
                policy: ReplayPolicy::default(),
                pending_actions: Vec::new(),
                next_sequence: 1,
            })),
        }
    }

    pub fn with_policy(self, policy: ReplayPolicy) -> Self {
        self.set_policy(policy);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        // The state is only ever mutated by short, non-panicking sections.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn certs(&self) -> CredentialContext {
        self.lock().certs.clone()
    }

    pub fn policy(&self) -> ReplayPolicy {
        self.lock().policy
    }

    pub fn set_policy(&self, policy: ReplayPolicy) {
        self.lock().policy = policy;
    }

    /// Whether both handles point at the same queue.
    pub fn ptr_eq(&self, other: &SyncManager) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Append a serialized save. Returns its sequence number.
    pub fn enqueue(
        &self,
        entity: EntityKind,
        entity_id: Option<RemoteId>,
        entity_json: String,
        options: DeferredSaveOptions,
    ) -> u64 {
        let mut state = self.lock();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        tracing::debug!(sequence, entity = %entity, "queued deferred save");
        state.pending_actions.push(PendingAction {
            sequence,
            entity_type: entity.as_str().to_string(),
            entity_id,
            entity_json,
            options,
            queued_at: Utc::now(),
        });
        sequence
    }

    /// Copy of the queue in insertion order.
    pub fn pending_actions(&self) -> Vec<PendingAction> {
        self.lock().pending_actions.clone()
    }

    /// Append previously persisted actions, keeping their order.
    pub fn restore(&self, actions: Vec<PendingAction>) {
        let mut state = self.lock();
        for mut action in actions {
            if action.sequence < state.next_sequence {
                action.sequence = state.next_sequence;
            }
            state.next_sequence = action.sequence + 1;
            state.pending_actions.push(action);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().pending_actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending_actions.is_empty()
    }

    /// Drop every queued action. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let dropped = state.pending_actions.len();
        state.pending_actions.clear();
        dropped
    }

    fn remove(&self, sequence: u64) {
        self.lock()
            .pending_actions
            .retain(|action| action.sequence != sequence);
    }

    /// Write the queue to `path` as JSON.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.pending_actions())?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Append the actions stored at `path`. A missing file restores nothing.
    pub fn load(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }
        let content = std::fs::read_to_string(path)?;
        let actions: Vec<PendingAction> = serde_json::from_str(&content)?;
        let count = actions.len();
        self.restore(actions);
        Ok(count)
    }

    /// Replay every queued action through `connection`.
    ///
    /// The stored certificate context is layered over the connection's own
    /// credentials for the duration of the call. Actions leave the queue
    /// only once their save succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`SearchAdsError::Replay`] with the full report when any
    /// action failed.
    pub fn synchronize(&self, connection: &Connection<'_>) -> Result<ReplayReport> {
        let (snapshot, certs, policy) = {
            let state = self.lock();
            (
                state.pending_actions.clone(),
                state.certs.clone(),
                state.policy,
            )
        };
        let scoped = connection.with_credentials(connection.credentials().overlay(&certs));

        tracing::info!(actions = snapshot.len(), policy = %policy, "replaying sync queue");
        let mut report = ReplayReport::new(snapshot.len());
        let mut failed: Vec<&PendingAction> = Vec::new();
        let mut aborted_by: Option<u64> = None;

        for action in &snapshot {
            let sequence = action.sequence;
            if let Some(failed_sequence) = aborted_by {
                report.record(ReplayOutcome::Held {
                    sequence,
                    reason: HoldReason::Aborted { failed_sequence },
                });
                continue;
            }
            if let Some(blocker) = failed.iter().find(|f| f.shares_identity_with(action)) {
                report.record(ReplayOutcome::Held {
                    sequence,
                    reason: HoldReason::SameEntityFailed {
                        failed_sequence: blocker.sequence,
                    },
                });
                continue;
            }

            match replay_action(action, &scoped) {
                Ok(()) => {
                    self.remove(sequence);
                    tracing::info!(sequence, entity = %action.entity_type, "replayed deferred save");
                    report.record(ReplayOutcome::Replayed { sequence });
                }
                Err(error) => {
                    tracing::warn!(sequence, entity = %action.entity_type, %error, "deferred save failed");
                    failed.push(action);
                    report.record(ReplayOutcome::Failed { sequence, error });
                    if policy == ReplayPolicy::AbortRemaining {
                        aborted_by = Some(sequence);
                    }
                }
            }
        }

        if report.failed_count == 0 {
            Ok(report)
        } else {
            Err(SearchAdsError::Replay(Box::new(report)))
        }
    }
}

fn replay_action(action: &PendingAction, connection: &Connection<'_>) -> Result<()> {
    let options = SaveOptions::replay(action.options);
    match action.entity_type.parse::<EntityKind>()? {
        EntityKind::Campaign => {
            let mut campaign = Campaign::from_wire_str(&action.entity_json)?;
            campaign.save(connection, &options)?;
        }
        EntityKind::AdGroup => {
            let mut ad_group = AdGroup::from_wire_str(&action.entity_json)?;
            ad_group.save(connection, &options)?;
        }
    }
    Ok(())
}
