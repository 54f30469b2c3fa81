use crate::aggregate::Aggregate;
use crate::domain::documents_bundle::DocumentsBundle;
use crate::domain::manifest::ItemRef;
use crate::domain::{DocumentsBundleManifest, KernelError};
use crate::persistence::{ChangesStore, EntityStore};

use super::session::DomainService;

impl<'a, S: EntityStore, C: ChangesStore> DomainService<'a, S, C> {
    pub fn create_documents_bundle(
        &self,
        id: &str,
        metadata: &[(&str, &str)],
    ) -> Result<DocumentsBundleManifest, KernelError> {
        let mut bundle = DocumentsBundle::create(id);
        for (key, value) in metadata {
            bundle.set_metadata(*key, *value)?;
        }
        self.session.bundles.add(&mut bundle)?;
        self.session.record_change("documents_bundle", id, false)?;
        Ok(bundle.manifest())
    }

    pub fn update_documents_bundle_metadata(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<DocumentsBundleManifest, KernelError> {
        let mut bundle = self.fetch_bundle(id)?;
        bundle.set_metadata(key, value)?;
        self.session.bundles.update(&mut bundle)?;
        self.session.record_change("documents_bundle", id, false)?;
        Ok(bundle.manifest())
    }

    pub fn add_document_to_documents_bundle(
        &self,
        bundle_id: &str,
        document_id: &str,
        ns: Vec<String>,
    ) -> Result<DocumentsBundleManifest, KernelError> {
        self.fetch_document(document_id)?;

        let mut bundle = self.fetch_bundle(bundle_id)?;
        bundle.add_item(ItemRef::with_ns(document_id, ns))?;
        let wrote = !bundle.entity().new_events().is_empty();
        self.session.bundles.update(&mut bundle)?;
        if wrote {
            self.session.record_change("documents_bundle", bundle_id, false)?;
        }
        Ok(bundle.manifest())
    }

    pub fn insert_document_to_documents_bundle(
        &self,
        bundle_id: &str,
        index: usize,
        document_id: &str,
        ns: Vec<String>,
    ) -> Result<DocumentsBundleManifest, KernelError> {
        self.fetch_document(document_id)?;

        let mut bundle = self.fetch_bundle(bundle_id)?;
        bundle.insert_item(index, ItemRef::with_ns(document_id, ns))?;
        self.session.bundles.update(&mut bundle)?;
        self.session.record_change("documents_bundle", bundle_id, false)?;
        Ok(bundle.manifest())
    }

    pub fn remove_document_from_documents_bundle(
        &self,
        bundle_id: &str,
        document_id: &str,
    ) -> Result<DocumentsBundleManifest, KernelError> {
        let mut bundle = self.fetch_bundle(bundle_id)?;
        bundle.remove_item(document_id)?;
        self.session.bundles.update(&mut bundle)?;
        self.session.record_change("documents_bundle", bundle_id, false)?;
        Ok(bundle.manifest())
    }

    pub fn delete_documents_bundle(&self, id: &str) -> Result<(), KernelError> {
        let mut bundle = self.fetch_bundle(id)?;
        bundle.mark_deleted()?;
        self.session.bundles.update(&mut bundle)?;
        self.session.record_change("documents_bundle", id, true)?;
        Ok(())
    }

    pub fn fetch_documents_bundle_manifest(&self, id: &str) -> Result<DocumentsBundleManifest, KernelError> {
        Ok(self.fetch_bundle(id)?.manifest())
    }

    pub(crate) fn fetch_bundle(&self, id: &str) -> Result<DocumentsBundle, KernelError> {
        self.session
            .bundles
            .fetch(id)?
            .ok_or_else(|| KernelError::NotFound { entity: "documents_bundle", id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::session::in_memory_session;

    #[test]
    fn add_document_twice_is_idempotent() {
        let session = in_memory_session();
        let service = DomainService::new(&session);
        service.create_documents_bundle("b1", &[]).unwrap();
        service
            .register_document("d1", "uri", &[], &[])
            .unwrap();

        service.add_document_to_documents_bundle("b1", "d1", vec![]).unwrap();
        service.add_document_to_documents_bundle("b1", "d1", vec![]).unwrap();

        let manifest = service.fetch_documents_bundle_manifest("b1").unwrap();
        assert_eq!(manifest.items.len(), 1);
    }

    #[test]
    fn adding_same_document_twice_does_not_append_a_change() {
        let session = in_memory_session();
        let service = DomainService::new(&session);
        service.create_documents_bundle("b1", &[]).unwrap();
        service.register_document("d1", "uri", &[], &[]).unwrap();

        service.add_document_to_documents_bundle("b1", "d1", vec![]).unwrap();
        let after_first = service.fetch_changes(None, None).unwrap().len();

        service.add_document_to_documents_bundle("b1", "d1", vec![]).unwrap();
        let after_second = service.fetch_changes(None, None).unwrap().len();

        assert_eq!(after_first, after_second);
    }

    #[test]
    fn add_unknown_document_rejected() {
        let session = in_memory_session();
        let service = DomainService::new(&session);
        service.create_documents_bundle("b1", &[]).unwrap();

        let err = service.add_document_to_documents_bundle("b1", "ghost", vec![]).unwrap_err();
        assert!(matches!(err, KernelError::NotFound { .. }));
    }
}
