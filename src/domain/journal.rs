use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EventRecord};
use crate::impl_aggregate;

use super::error::KernelError;
use super::manifest::{ItemRef, ManifestContainer, Timestamp};

/// The materialised, replay-only view of a `Journal`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalManifest {
    pub id: String,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub metadata: std::collections::BTreeMap<String, String>,
    pub items: Vec<ItemRef>,
    pub deleted: bool,
}

/// A periodical: open metadata plus an ordered, id-unique list of
/// bundle references. Reconstructed entirely by replaying its event
/// history; mutators only ever append to that history.
#[derive(Default)]
pub struct Journal {
    entity: Entity,
    container: ManifestContainer,
}

impl Journal {
    pub fn create(id: impl Into<String>) -> Self {
        let mut journal = Journal::default();
        let id = id.into();
        journal.entity.set_id(&id);
        journal.entity.digest("JournalCreated", &id);
        journal
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }

    pub fn manifest(&self) -> JournalManifest {
        JournalManifest {
            id: self.entity.id().to_string(),
            created: first_event_time(&self.entity),
            updated: last_event_time(&self.entity),
            metadata: self.container.metadata.clone(),
            items: self.container.items.clone(),
            deleted: self.container.deleted,
        }
    }

    fn ensure_live(&self) -> Result<(), KernelError> {
        if self.container.deleted {
            return Err(KernelError::AlreadyDeleted {
                entity: "journal",
                id: self.id().to_string(),
            });
        }
        Ok(())
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), KernelError> {
        self.ensure_live()?;
        let (key, value) = (key.into(), value.into());
        self.entity.digest("MetadataSet", &(key.clone(), value.clone()));
        self.container.set_metadata(key, value);
        Ok(())
    }

    pub fn clear_metadata(&mut self, key: &str) -> Result<(), KernelError> {
        self.ensure_live()?;
        self.entity.digest("MetadataCleared", &key.to_string());
        self.container.clear_metadata(key);
        Ok(())
    }

    /// Idempotent: adding a bundle id already present is a no-op.
    pub fn add_item(&mut self, item: ItemRef) -> Result<(), KernelError> {
        self.ensure_live()?;
        if self.container.contains(&item.id) {
            return Ok(());
        }
        self.entity.digest("ItemAdded", &item);
        self.container.add_item(item);
        Ok(())
    }

    pub fn insert_item(&mut self, index: usize, item: ItemRef) -> Result<(), KernelError> {
        self.ensure_live()?;
        let id = self.id().to_string();
        self.container.insert_item(index, item.clone(), &id)?;
        self.entity.digest("ItemInserted", &(index as u64, item));
        Ok(())
    }

    pub fn remove_item(&mut self, id: &str) -> Result<(), KernelError> {
        self.ensure_live()?;
        let self_id = self.id().to_string();
        self.container.remove_item(id, &self_id)?;
        self.entity.digest("ItemRemoved", &id.to_string());
        Ok(())
    }

    pub fn mark_deleted(&mut self) -> Result<(), KernelError> {
        self.ensure_live()?;
        self.entity.digest_empty("JournalDeleted");
        self.container.deleted = true;
        Ok(())
    }

    fn replay(&mut self, event: &EventRecord) -> Result<(), String> {
        match event.event_name.as_str() {
            "JournalCreated" => {
                let id: String = event.decode().map_err(|e| e.to_string())?;
                self.entity.set_id(id);
            }
            "MetadataSet" => {
                let (key, value): (String, String) = event.decode().map_err(|e| e.to_string())?;
                self.container.set_metadata(key, value);
            }
            "MetadataCleared" => {
                let key: String = event.decode().map_err(|e| e.to_string())?;
                self.container.clear_metadata(&key);
            }
            "ItemAdded" => {
                let item: ItemRef = event.decode().map_err(|e| e.to_string())?;
                self.container.add_item(item);
            }
            "ItemInserted" => {
                let (index, item): (u64, ItemRef) = event.decode().map_err(|e| e.to_string())?;
                let id = self.id().to_string();
                self.container
                    .insert_item(index as usize, item, &id)
                    .map_err(|e| e.to_string())?;
            }
            "ItemRemoved" => {
                let id_ref: String = event.decode().map_err(|e| e.to_string())?;
                let owner_id = self.id().to_string();
                self.container
                    .remove_item(&id_ref, &owner_id)
                    .map_err(|e| e.to_string())?;
            }
            "JournalDeleted" => {
                self.container.deleted = true;
            }
            other => return Err(format!("unknown journal event {other}")),
        }
        Ok(())
    }
}

impl_aggregate!(Journal, entity, replay);

fn first_event_time(entity: &Entity) -> Timestamp {
    entity
        .events()
        .first()
        .map(|e| Timestamp::from(e.timestamp))
        .unwrap_or_else(chrono::Utc::now)
}

fn last_event_time(entity: &Entity) -> Timestamp {
    entity
        .events()
        .last()
        .map(|e| Timestamp::from(e.timestamp))
        .unwrap_or_else(chrono::Utc::now)
}
