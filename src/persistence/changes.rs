use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::domain::{KernelError, Timestamp};

/// One entry in the append-only change log: a pointer to an entity's
/// latest known state, not a full event. Two updates to the same
/// entity between polls may collapse into a single entry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Change {
    pub timestamp: Timestamp,
    pub entity: &'static str,
    pub id: String,
    pub deleted: bool,
}

impl Change {
    pub fn new(timestamp: Timestamp, entity: &'static str, id: impl Into<String>, deleted: bool) -> Self {
        Change { timestamp, entity, id: id.into(), deleted }
    }
}

/// The append-only change feed port.
pub trait ChangesStore: Send + Sync {
    fn add(&self, change: Change) -> Result<(), KernelError>;

    /// Entries with `timestamp > since` (or all entries if `since` is
    /// `None`), ordered by timestamp ascending, capped at `limit`.
    fn filter(&self, since: Option<Timestamp>, limit: usize) -> Result<Vec<Change>, KernelError>;
}

#[derive(Default)]
pub struct InMemoryChangesStore {
    changes: RwLock<Vec<Change>>,
}

impl InMemoryChangesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangesStore for InMemoryChangesStore {
    fn add(&self, change: Change) -> Result<(), KernelError> {
        let mut changes = self
            .changes
            .write()
            .map_err(|_| KernelError::Transient("changes store lock poisoned".to_string()))?;
        let pos = changes.partition_point(|c| c.timestamp <= change.timestamp);
        changes.insert(pos, change);
        Ok(())
    }

    fn filter(&self, since: Option<Timestamp>, limit: usize) -> Result<Vec<Change>, KernelError> {
        let changes = self
            .changes
            .read()
            .map_err(|_| KernelError::Transient("changes store lock poisoned".to_string()))?;
        let filtered = changes
            .iter()
            .filter(|c| since.map(|s| c.timestamp > s).unwrap_or(true))
            .take(limit)
            .cloned()
            .collect();
        Ok(filtered)
    }
}

/// Default page size for `fetch_changes`, matching the documented feed
/// contract.
pub const DEFAULT_CHANGES_LIMIT: usize = 500;

/// A client-side task derived from a reduced change feed: the last
/// entry per `(entity, id)` tells a consumer whether to refetch or
/// delete its local copy. Not used by the core itself, but specified
/// precisely enough to ship as a reference helper for tests and
/// downstream clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeTask {
    Refetch { entity: &'static str, id: String },
    Delete { entity: &'static str, id: String },
}

/// Reduces a timestamp-ordered change feed page to one task per
/// `(entity, id)`, keeping only the latest state for each.
pub fn reduce_to_tasks(changes: &[Change]) -> Vec<ChangeTask> {
    use std::collections::BTreeMap;

    let mut latest: BTreeMap<(&'static str, String), &Change> = BTreeMap::new();
    for change in changes {
        latest.insert((change.entity, change.id.clone()), change);
    }
    latest
        .into_values()
        .map(|c| {
            if c.deleted {
                ChangeTask::Delete { entity: c.entity, id: c.id.clone() }
            } else {
                ChangeTask::Refetch { entity: c.entity, id: c.id.clone() }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn ts(offset_secs: i64) -> Timestamp {
        Utc::now() + Duration::seconds(offset_secs)
    }

    #[test]
    fn filter_orders_by_timestamp_ascending() {
        let store = InMemoryChangesStore::new();
        store.add(Change::new(ts(5), "document", "d1", false)).unwrap();
        store.add(Change::new(ts(1), "document", "d2", false)).unwrap();
        let page = store.filter(None, 10).unwrap();
        assert_eq!(page[0].id, "d2");
        assert_eq!(page[1].id, "d1");
    }

    #[test]
    fn filter_respects_since_cursor() {
        let store = InMemoryChangesStore::new();
        let first = ts(0);
        store.add(Change::new(first, "document", "d1", false)).unwrap();
        store.add(Change::new(ts(10), "document", "d2", false)).unwrap();
        let page = store.filter(Some(first), 10).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "d2");
    }

    #[test]
    fn reduce_to_tasks_keeps_only_latest_per_entity() {
        let changes = vec![
            Change::new(ts(0), "document", "d1", false),
            Change::new(ts(1), "document", "d1", true),
        ];
        let tasks = reduce_to_tasks(&changes);
        assert_eq!(tasks, vec![ChangeTask::Delete { entity: "document", id: "d1".into() }]);
    }
}
