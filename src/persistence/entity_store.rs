use crate::domain::KernelError;
use crate::entity::EventRecord;

/// The port every persistence adapter implements: a document-oriented
/// backend keyed by entity id, storing one event stream per id.
///
/// `commit` is optimistic: `expected_version` is the number of events
/// the caller last observed (`Entity::committed_version`), and the
/// adapter must reject the write with `ConcurrentWrite` if the stored
/// stream has since grown past it.
pub trait EntityStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<Vec<EventRecord>>, KernelError>;

    fn commit(
        &self,
        id: &str,
        expected_version: u64,
        new_events: &[EventRecord],
    ) -> Result<(), KernelError>;

    fn delete(&self, id: &str) -> Result<bool, KernelError>;
}
