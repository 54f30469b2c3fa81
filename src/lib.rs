//! Event-sourced core for a scientific-periodicals catalog: journals,
//! document bundles and versioned documents, persisted through
//! pluggable ports with a retrying decorator and an append-only
//! change log for replication.

extern crate self as biblio_kernel;

pub mod aggregate;
pub mod domain;
pub mod entity;
pub mod persistence;
pub mod service;

pub use aggregate::{hydrate, Aggregate};
pub use entity::{Entity, EventRecord, PayloadError};

pub use domain::{
    Document, DocumentManifest, DocumentsBundle, DocumentsBundleManifest, ItemRef, Journal,
    JournalManifest, KernelError, KernelResult, ManifestContainer, Timestamp, Version,
};

pub use persistence::{
    AggregateDataStore, BackendConfig, Change, ChangeObserver, ChangeTask, ChangesStore,
    EntityStore, InMemoryChangesStore, InMemoryEntityStore, LogObserver, MetricsConfig,
    RetryConfig, RetryingEntityStore,
};

pub use service::{in_memory_session, DiffEntry, DomainService, Session};
