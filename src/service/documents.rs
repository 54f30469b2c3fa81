use crate::aggregate::Aggregate;
use crate::domain::document::{Document, Version};
use crate::domain::manifest::Timestamp;
use crate::domain::pid::generate_v3;
use crate::domain::{DocumentManifest, KernelError};
use crate::persistence::{ChangesStore, EntityStore};

use super::session::DomainService;

impl<'a, S: EntityStore, C: ChangesStore> DomainService<'a, S, C> {
    /// Registers a new document and its first version. `v1`/`v2` are
    /// free-form legacy identifiers recorded verbatim; the `v3` PID is
    /// always generated here.
    pub fn register_document(
        &self,
        id: &str,
        data: &str,
        assets: &[&str],
        renditions: &[&str],
    ) -> Result<DocumentManifest, KernelError> {
        self.register_document_with_legacy_ids(id, data, assets, renditions, None, None)
    }

    pub fn register_document_with_legacy_ids(
        &self,
        id: &str,
        data: &str,
        assets: &[&str],
        renditions: &[&str],
        v1: Option<String>,
        v2: Option<String>,
    ) -> Result<DocumentManifest, KernelError> {
        let mut doc = Document::create(id, generate_v3(), v1, v2);
        doc.new_version(
            data,
            assets.iter().map(|s| s.to_string()).collect(),
            renditions.iter().map(|s| s.to_string()).collect(),
            chrono::Utc::now(),
        )?;
        self.session.documents.add(&mut doc)?;
        self.session.record_change("document", id, false)?;
        Ok(doc.manifest())
    }

    /// Appends a new version. Idempotent: a version identical to the
    /// current latest (same data URI, same declared slot sets) returns
    /// the unchanged manifest rather than an error.
    pub fn register_document_version(
        &self,
        id: &str,
        data: &str,
        assets: &[&str],
        renditions: &[&str],
    ) -> Result<DocumentManifest, KernelError> {
        let mut doc = self.fetch_document(id)?;
        match doc.new_version(
            data,
            assets.iter().map(|s| s.to_string()).collect(),
            renditions.iter().map(|s| s.to_string()).collect(),
            chrono::Utc::now(),
        ) {
            Ok(()) => {
                self.session.documents.update(&mut doc)?;
                self.session.record_change("document", id, false)?;
                Ok(doc.manifest())
            }
            Err(KernelError::VersionAlreadyExists { .. }) => Ok(doc.manifest()),
            Err(other) => Err(other),
        }
    }

    pub fn register_asset_version(
        &self,
        id: &str,
        slot: &str,
        uri: &str,
    ) -> Result<DocumentManifest, KernelError> {
        let mut doc = self.fetch_document(id)?;
        doc.new_asset_version(slot, uri, chrono::Utc::now())?;
        let wrote = !doc.entity().new_events().is_empty();
        self.session.documents.update(&mut doc)?;
        if wrote {
            self.session.record_change("document", id, false)?;
        }
        Ok(doc.manifest())
    }

    pub fn register_rendition_version(
        &self,
        id: &str,
        slot: &str,
        uri: &str,
    ) -> Result<DocumentManifest, KernelError> {
        let mut doc = self.fetch_document(id)?;
        doc.new_rendition_version(slot, uri, chrono::Utc::now())?;
        let wrote = !doc.entity().new_events().is_empty();
        self.session.documents.update(&mut doc)?;
        if wrote {
            self.session.record_change("document", id, false)?;
        }
        Ok(doc.manifest())
    }

    pub fn delete_document(&self, id: &str) -> Result<(), KernelError> {
        let mut doc = self.fetch_document(id)?;
        doc.mark_deleted(chrono::Utc::now())?;
        self.session.documents.update(&mut doc)?;
        self.session.record_change("document", id, true)?;
        Ok(())
    }

    pub fn fetch_document_manifest(&self, id: &str) -> Result<DocumentManifest, KernelError> {
        Ok(self.fetch_document(id)?.manifest())
    }

    /// Resolves a version by 0-based `version_index`, by `version_at`
    /// as-of timestamp, or the latest version when both are `None`.
    pub fn resolve_version(
        &self,
        id: &str,
        version_index: Option<usize>,
        version_at: Option<Timestamp>,
    ) -> Result<Version, KernelError> {
        let doc = self.fetch_document(id)?;
        if let Some(at) = version_at {
            return doc
                .version_at(at)
                .ok_or_else(|| KernelError::NotFound { entity: "document_version", id: id.to_string() });
        }
        doc.version(version_index)
            .cloned()
            .ok_or_else(|| KernelError::NotFound { entity: "document_version", id: id.to_string() })
    }

    pub fn fetch_document_data(
        &self,
        id: &str,
        version_index: Option<usize>,
        version_at: Option<Timestamp>,
    ) -> Result<String, KernelError> {
        Ok(self.resolve_version(id, version_index, version_at)?.data)
    }

    pub fn fetch_assets_list(
        &self,
        id: &str,
        version_index: Option<usize>,
        version_at: Option<Timestamp>,
    ) -> Result<std::collections::BTreeMap<String, Vec<(Timestamp, String)>>, KernelError> {
        Ok(self.resolve_version(id, version_index, version_at)?.assets)
    }

    pub(crate) fn fetch_document(&self, id: &str) -> Result<Document, KernelError> {
        self.session
            .documents
            .fetch(id)?
            .ok_or_else(|| KernelError::NotFound { entity: "document", id: id.to_string() })
    }
}
