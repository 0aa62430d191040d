//! The per-save "now or later" decision shared by campaigns and ad groups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::manager::SyncManager;
use crate::api::Connection;
use crate::error::{Result, ValidationError};
use crate::models::{RemoteId, WireSerializable};

/// Entity types that can sit in the pending-action queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Campaign,
    AdGroup,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Campaign => "Campaign",
            EntityKind::AdGroup => "AdGroup",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Campaign" => Ok(EntityKind::Campaign),
            "AdGroup" => Ok(EntityKind::AdGroup),
            other => Err(ValidationError::UnknownEntityType(other.to_string())),
        }
    }
}

/// When a cascading campaign save writes its ad groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeOrder {
    /// Ad groups first, then the campaign.
    #[default]
    ChildrenFirst,
    ParentFirst,
}

/// The part of [`SaveOptions`] that survives in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredSaveOptions {
    pub cascade: bool,
    #[serde(default)]
    pub cascade_order: CascadeOrder,
}

impl Default for DeferredSaveOptions {
    fn default() -> Self {
        Self {
            cascade: true,
            cascade_order: CascadeOrder::default(),
        }
    }
}

/// Options for a single save.
#[derive(Clone, Copy)]
pub struct SaveOptions<'a> {
    /// Campaigns only: also save every owned ad group.
    pub cascade: bool,
    /// Write now even when a sync manager is attached.
    pub force_sync: bool,
    pub cascade_order: CascadeOrder,
    /// Called with the serialized entity right before it is queued.
    pub on_local_serialize: Option<&'a dyn Fn(&str)>,
}

impl Default for SaveOptions<'_> {
    fn default() -> Self {
        Self {
            cascade: true,
            force_sync: false,
            cascade_order: CascadeOrder::default(),
            on_local_serialize: None,
        }
    }
}

impl<'a> SaveOptions<'a> {
    pub fn forced() -> Self {
        Self::default().with_force_sync(true)
    }

    pub fn with_cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn with_force_sync(mut self, force_sync: bool) -> Self {
        self.force_sync = force_sync;
        self
    }

    pub fn with_cascade_order(mut self, cascade_order: CascadeOrder) -> Self {
        self.cascade_order = cascade_order;
        self
    }

    pub fn with_on_local_serialize(mut self, callback: &'a dyn Fn(&str)) -> Self {
        self.on_local_serialize = Some(callback);
        self
    }

    pub fn deferred(&self) -> DeferredSaveOptions {
        DeferredSaveOptions {
            cascade: self.cascade,
            cascade_order: self.cascade_order,
        }
    }

    /// Options for a replayed save: the stored options with `force_sync` set.
    pub fn replay(deferred: DeferredSaveOptions) -> Self {
        Self::default()
            .with_cascade(deferred.cascade)
            .with_cascade_order(deferred.cascade_order)
            .with_force_sync(true)
    }
}

impl fmt::Debug for SaveOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveOptions")
            .field("cascade", &self.cascade)
            .field("force_sync", &self.force_sync)
            .field("cascade_order", &self.cascade_order)
            .field("on_local_serialize", &self.on_local_serialize.is_some())
            .finish()
    }
}

/// What a save did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The remote write happened.
    Executed,
    /// The save was queued on the attached sync manager.
    Deferred,
}

/// An entity whose saves may be deferred to a [`SyncManager`].
pub trait Synchronizable: WireSerializable {
    const ENTITY: EntityKind;

    fn sync_manager(&self) -> Option<&SyncManager>;

    fn set_sync_manager(&mut self, manager: Option<SyncManager>);

    fn remote_id(&self) -> Option<&RemoteId>;

    /// Perform the remote write unconditionally.
    fn execute_save(&mut self, connection: &Connection<'_>, options: &SaveOptions<'_>)
        -> Result<()>;

    /// Returns `true` when the caller should write now. With a manager
    /// attached the entity is serialized, handed to `on_local_serialize`,
    /// queued, and `false` is returned.
    fn synchronize(&self, options: &SaveOptions<'_>) -> Result<bool> {
        let Some(manager) = self.sync_manager() else {
            return Ok(true);
        };

        let json = self.to_wire_string()?;
        if let Some(callback) = options.on_local_serialize {
            callback(&json);
        }
        manager.enqueue(
            Self::ENTITY,
            self.remote_id().cloned(),
            json,
            options.deferred(),
        );
        Ok(false)
    }

    fn save(&mut self, connection: &Connection<'_>, options: &SaveOptions<'_>) -> Result<SaveOutcome> {
        if options.force_sync || self.synchronize(options)? {
            self.execute_save(connection, options)?;
            Ok(SaveOutcome::Executed)
        } else {
            Ok(SaveOutcome::Deferred)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_parses_its_own_names() {
        for kind in [EntityKind::Campaign, EntityKind::AdGroup] {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!(matches!(
            "Keyword".parse::<EntityKind>(),
            Err(ValidationError::UnknownEntityType(name)) if name == "Keyword"
        ));
    }

    #[test]
    fn replay_options_force_and_keep_cascade() {
        let deferred = DeferredSaveOptions {
            cascade: false,
            cascade_order: CascadeOrder::ParentFirst,
        };
        let options = SaveOptions::replay(deferred);
        assert!(options.force_sync);
        assert!(!options.cascade);
        assert_eq!(options.cascade_order, CascadeOrder::ParentFirst);
        assert_eq!(options.deferred(), deferred);
    }

    #[test]
    fn default_options_cascade_children_first() {
        let options = SaveOptions::default();
        assert!(options.cascade);
        assert!(!options.force_sync);
        assert_eq!(options.cascade_order, CascadeOrder::ChildrenFirst);
    }
}
