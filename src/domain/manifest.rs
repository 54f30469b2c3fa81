use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::KernelError;

/// UTC instant with microsecond resolution, the wire format used by
/// `version_at`, change log cursors and manifest `created`/`updated` fields.
pub type Timestamp = DateTime<Utc>;

/// A reference to a bundle or a document held by a `Journal` or a
/// `DocumentsBundle`. `ns` is an optional ordered grouping label, e.g.
/// `["2019", "v21", "n1"]` for a journal's issue namespace.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRef {
    pub id: String,
    #[serde(default)]
    pub ns: Vec<String>,
}

impl ItemRef {
    pub fn new(id: impl Into<String>) -> Self {
        ItemRef { id: id.into(), ns: Vec::new() }
    }

    pub fn with_ns(id: impl Into<String>, ns: Vec<String>) -> Self {
        ItemRef { id: id.into(), ns }
    }
}

/// The shape shared by `Journal` and `DocumentsBundle`: an open metadata
/// map plus an ordered, id-unique list of item references. Neither
/// `Journal` nor `DocumentsBundle` wraps this as a public field — each
/// owns one privately and replays its own event vocabulary into it, so
/// the two stay independent entity kinds with independent id spaces.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestContainer {
    pub metadata: BTreeMap<String, String>,
    pub items: Vec<ItemRef>,
    pub deleted: bool,
}

impl ManifestContainer {
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position_of(id).is_some()
    }

    /// Appends `item` to the end of `items`. A no-op (idempotent) if an
    /// item with the same id is already present.
    pub fn add_item(&mut self, item: ItemRef) {
        if !self.contains(&item.id) {
            self.items.push(item);
        }
    }

    /// Inserts `item` at `index`. Idempotent when an item with the same
    /// id already sits at `index`; otherwise fails with
    /// `DuplicateReference` when the id exists elsewhere in the list.
    pub fn insert_item(
        &mut self,
        index: usize,
        item: ItemRef,
        owner_id: &str,
    ) -> Result<(), KernelError> {
        if let Some(pos) = self.position_of(&item.id) {
            if pos == index {
                return Ok(());
            }
            return Err(KernelError::DuplicateReference {
                id: owner_id.to_string(),
                reference: item.id,
            });
        }
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        Ok(())
    }

    pub fn remove_item(&mut self, id: &str, owner_id: &str) -> Result<(), KernelError> {
        match self.position_of(id) {
            Some(pos) => {
                self.items.remove(pos);
                Ok(())
            }
            None => Err(KernelError::UnknownReference {
                id: owner_id.to_string(),
                reference: id.to_string(),
            }),
        }
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn clear_metadata(&mut self, key: &str) {
        self.metadata.remove(key);
    }
}
