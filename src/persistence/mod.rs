pub mod changes;
pub mod config;
pub mod data_store;
pub mod entity_store;
pub mod in_memory_store;
pub mod observer;
pub mod retry;

pub use changes::{Change, ChangeTask, ChangesStore, InMemoryChangesStore, DEFAULT_CHANGES_LIMIT};
pub use config::{BackendConfig, MetricsConfig, RetryConfig};
pub use data_store::AggregateDataStore;
pub use entity_store::EntityStore;
pub use in_memory_store::InMemoryEntityStore;
pub use observer::{ChangeObserver, LogObserver};
pub use retry::RetryingEntityStore;
