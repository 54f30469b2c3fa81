use chrono::Utc;

use crate::domain::document::Document;
use crate::domain::documents_bundle::DocumentsBundle;
use crate::domain::journal::Journal;
use crate::domain::KernelError;
use crate::persistence::{
    AggregateDataStore, Change, ChangeObserver, ChangesStore, EntityStore, InMemoryChangesStore,
    InMemoryEntityStore,
};

/// The unit of work: one `AggregateDataStore` per entity kind, the
/// change log, and the registry of observers notified after every
/// committed mutation. `DomainService` borrows a `Session` for the
/// duration of a use case.
pub struct Session<S: EntityStore, C: ChangesStore> {
    pub journals: AggregateDataStore<Journal, S>,
    pub bundles: AggregateDataStore<DocumentsBundle, S>,
    pub documents: AggregateDataStore<Document, S>,
    pub changes: C,
    observers: Vec<Box<dyn ChangeObserver>>,
}

impl<S: EntityStore, C: ChangesStore> Session<S, C> {
    pub fn new(journals: S, bundles: S, documents: S, changes: C) -> Self {
        Session {
            journals: AggregateDataStore::new(journals, "journal"),
            bundles: AggregateDataStore::new(bundles, "documents_bundle"),
            documents: AggregateDataStore::new(documents, "document"),
            changes,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    fn notify(&self, change: &Change) {
        for observer in &self.observers {
            observer.on_change(change);
        }
    }

    /// Appends a change-log entry and notifies observers. Called by
    /// services as the last step of every write use case.
    pub(crate) fn record_change(
        &self,
        entity: &'static str,
        id: impl Into<String>,
        deleted: bool,
    ) -> Result<(), KernelError> {
        let change = Change::new(Utc::now(), entity, id, deleted);
        self.changes
            .add(change.clone())
            .map_err(|e| KernelError::ChangeLogAppendFailed { message: e.to_string() })?;
        self.notify(&change);
        Ok(())
    }
}

/// A ready-to-use, in-process session backed by the in-memory adapters.
/// The natural default for tests and local development.
pub fn in_memory_session() -> Session<InMemoryEntityStore, InMemoryChangesStore> {
    Session::new(
        InMemoryEntityStore::new(),
        InMemoryEntityStore::new(),
        InMemoryEntityStore::new(),
        InMemoryChangesStore::new(),
    )
}

/// Session-scoped facade exposing one method per use case. Methods take
/// explicit arguments; cross-entity orchestration (fetch, mutate,
/// persist, log) happens here, never inside the domain aggregates.
pub struct DomainService<'a, S: EntityStore, C: ChangesStore> {
    pub(crate) session: &'a Session<S, C>,
}

impl<'a, S: EntityStore, C: ChangesStore> DomainService<'a, S, C> {
    pub fn new(session: &'a Session<S, C>) -> Self {
        DomainService { session }
    }
}
