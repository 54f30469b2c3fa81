use std::marker::PhantomData;

use crate::aggregate::{hydrate, Aggregate};
use crate::domain::KernelError;
use crate::entity::Entity;

use super::entity_store::EntityStore;

/// Typed `add`/`update`/`fetch`/`delete` port for one aggregate kind,
/// built over a generic `EntityStore`. One instance lives in a
/// `Session` per entity kind (`journals`, `bundles`, `documents`).
pub struct AggregateDataStore<A, S> {
    store: S,
    entity_name: &'static str,
    _marker: PhantomData<A>,
}

impl<A: Aggregate, S: EntityStore> AggregateDataStore<A, S>
where
    A::ReplayError: std::fmt::Display,
{
    pub fn new(store: S, entity_name: &'static str) -> Self {
        AggregateDataStore { store, entity_name, _marker: PhantomData }
    }

    pub fn fetch(&self, id: &str) -> Result<Option<A>, KernelError> {
        let Some(history) = self.store.get(id)? else {
            return Ok(None);
        };
        let mut entity = Entity::with_id(id);
        entity.load_from_history(history);
        let aggregate = hydrate::<A>(entity)
            .map_err(|e| KernelError::Replay { message: e.to_string() })?;
        Ok(Some(aggregate))
    }

    /// Persists a freshly created aggregate. Fails with `AlreadyExists`
    /// if the id is already present in the backend, live or deleted.
    pub fn add(&self, aggregate: &mut A) -> Result<(), KernelError> {
        let id = aggregate.entity().id().to_string();
        if self.store.get(&id)?.map(|h| !h.is_empty()).unwrap_or(false) {
            return Err(KernelError::AlreadyExists { entity: self.entity_name, id });
        }
        self.persist(aggregate)
    }

    /// Persists pending events on an aggregate previously loaded via
    /// `fetch`. A no-op if nothing changed since it was loaded.
    pub fn update(&self, aggregate: &mut A) -> Result<(), KernelError> {
        self.persist(aggregate)
    }

    fn persist(&self, aggregate: &mut A) -> Result<(), KernelError> {
        let id = aggregate.entity().id().to_string();
        let expected = aggregate.entity().committed_version();
        let new_events = aggregate.entity().new_events().to_vec();
        if new_events.is_empty() {
            return Ok(());
        }
        self.store.commit(&id, expected, &new_events)?;
        aggregate.entity_mut().mark_committed();
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<bool, KernelError> {
        self.store.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::journal::Journal;
    use crate::domain::manifest::ItemRef;
    use crate::persistence::in_memory_store::InMemoryEntityStore;

    fn store() -> AggregateDataStore<Journal, InMemoryEntityStore> {
        AggregateDataStore::new(InMemoryEntityStore::new(), "journal")
    }

    #[test]
    fn add_then_fetch_round_trips() {
        let store = store();
        let mut journal = Journal::create("j1");
        store.add(&mut journal).unwrap();

        let fetched = store.fetch("j1").unwrap().unwrap();
        assert_eq!(fetched.manifest().id, "j1");
    }

    #[test]
    fn add_twice_rejected() {
        let store = store();
        let mut journal = Journal::create("j1");
        store.add(&mut journal).unwrap();

        let mut other = Journal::create("j1");
        let err = store.add(&mut other).unwrap_err();
        assert!(matches!(err, KernelError::AlreadyExists { .. }));
    }

    #[test]
    fn update_persists_only_new_events() {
        let store = store();
        let mut journal = Journal::create("j1");
        store.add(&mut journal).unwrap();

        journal.add_item(ItemRef::new("b1")).unwrap();
        store.update(&mut journal).unwrap();

        let fetched = store.fetch("j1").unwrap().unwrap();
        assert_eq!(fetched.manifest().items.len(), 1);
    }

    #[test]
    fn update_with_no_pending_events_is_noop() {
        let store = store();
        let mut journal = Journal::create("j1");
        store.add(&mut journal).unwrap();
        store.update(&mut journal).unwrap();
    }

    #[test]
    fn fetch_missing_id_returns_none() {
        let store = store();
        assert!(store.fetch("ghost").unwrap().is_none());
    }
}
