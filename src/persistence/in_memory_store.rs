use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::KernelError;
use crate::entity::EventRecord;

use super::entity_store::EntityStore;

/// In-memory document-oriented adapter. Models the same shape a real
/// backend would: one event stream per id, with the stored stream
/// length standing in for a document-oriented store's native version
/// field.
#[derive(Default)]
pub struct InMemoryEntityStore {
    streams: RwLock<HashMap<String, Vec<EventRecord>>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for InMemoryEntityStore {
    fn get(&self, id: &str) -> Result<Option<Vec<EventRecord>>, KernelError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| KernelError::Transient("in-memory store lock poisoned".to_string()))?;
        Ok(streams.get(id).cloned())
    }

    fn commit(
        &self,
        id: &str,
        expected_version: u64,
        new_events: &[EventRecord],
    ) -> Result<(), KernelError> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| KernelError::Transient("in-memory store lock poisoned".to_string()))?;
        let stream = streams.entry(id.to_string()).or_default();
        let actual = stream.len() as u64;
        if actual != expected_version {
            return Err(KernelError::ConcurrentWrite {
                id: id.to_string(),
                expected: expected_version,
                actual,
            });
        }
        stream.extend_from_slice(new_events);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, KernelError> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| KernelError::Transient("in-memory store lock poisoned".to_string()))?;
        Ok(streams.remove(id).is_some())
    }
}
