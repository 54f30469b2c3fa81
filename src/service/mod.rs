mod bundles;
mod changes;
mod diff;
mod documents;
mod journals;
mod session;

pub use diff::DiffEntry;
pub use session::{in_memory_session, DomainService, Session};
