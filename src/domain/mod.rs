pub mod document;
pub mod documents_bundle;
pub mod error;
pub mod journal;
pub mod manifest;
pub mod pid;

pub use document::{Document, DocumentManifest, Version};
pub use documents_bundle::{DocumentsBundle, DocumentsBundleManifest};
pub use error::{KernelError, KernelResult};
pub use journal::{Journal, JournalManifest};
pub use manifest::{ItemRef, ManifestContainer, Timestamp};
