use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EventRecord};
use crate::impl_aggregate;

use super::error::KernelError;
use super::manifest::{ItemRef, ManifestContainer, Timestamp};

/// The materialised, replay-only view of a `DocumentsBundle`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentsBundleManifest {
    pub id: String,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub metadata: std::collections::BTreeMap<String, String>,
    pub items: Vec<ItemRef>,
    pub deleted: bool,
}

/// A grouping of documents (an issue, a special number, ...). Shares
/// the `ManifestContainer` shape with `Journal` but is its own entity
/// kind with its own id space and event vocabulary.
#[derive(Default)]
pub struct DocumentsBundle {
    entity: Entity,
    container: ManifestContainer,
}

impl DocumentsBundle {
    pub fn create(id: impl Into<String>) -> Self {
        let mut bundle = DocumentsBundle::default();
        let id = id.into();
        bundle.entity.set_id(&id);
        bundle.entity.digest("BundleCreated", &id);
        bundle
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }

    pub fn manifest(&self) -> DocumentsBundleManifest {
        DocumentsBundleManifest {
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
                entity: "documents_bundle",
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

    /// Idempotent: adding a document id already present is a no-op.
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
        self.entity.digest_empty("BundleDeleted");
        self.container.deleted = true;
        Ok(())
    }

    fn replay(&mut self, event: &EventRecord) -> Result<(), String> {
        match event.event_name.as_str() {
            "BundleCreated" => {
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
            "BundleDeleted" => {
                self.container.deleted = true;
            }
            other => return Err(format!("unknown documents_bundle event {other}")),
        }
        Ok(())
    }
}

impl_aggregate!(DocumentsBundle, entity, replay);

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{hydrate, Aggregate};

    #[test]
    fn add_document_twice_is_noop() {
        let mut bundle = DocumentsBundle::create("b1");
        bundle.add_item(ItemRef::new("d1")).unwrap();
        bundle.add_item(ItemRef::new("d1")).unwrap();
        assert_eq!(bundle.manifest().items.len(), 1);
    }

    #[test]
    fn replay_reconstructs_state() {
        let mut bundle = DocumentsBundle::create("b1");
        bundle.add_item(ItemRef::new("d1")).unwrap();
        bundle.remove_item("d1").unwrap();

        let entity = bundle.entity().clone();
        let rehydrated: DocumentsBundle = hydrate(entity).unwrap();
        assert!(rehydrated.manifest().items.is_empty());
    }
}
