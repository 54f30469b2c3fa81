use crate::aggregate::Aggregate;
use crate::domain::manifest::ItemRef;
use crate::domain::{JournalManifest, KernelError};
use crate::persistence::{ChangesStore, EntityStore};

use super::session::DomainService;

use crate::domain::journal::Journal;

impl<'a, S: EntityStore, C: ChangesStore> DomainService<'a, S, C> {
    pub fn create_journal(&self, id: &str, metadata: &[(&str, &str)]) -> Result<JournalManifest, KernelError> {
        let mut journal = Journal::create(id);
        for (key, value) in metadata {
            journal.set_metadata(*key, *value)?;
        }
        self.session.journals.add(&mut journal)?;
        self.session.record_change("journal", id, false)?;
        Ok(journal.manifest())
    }

    pub fn update_journal_metadata(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<JournalManifest, KernelError> {
        let mut journal = self.fetch_journal(id)?;
        journal.set_metadata(key, value)?;
        self.session.journals.update(&mut journal)?;
        self.session.record_change("journal", id, false)?;
        Ok(journal.manifest())
    }

    pub fn clear_journal_metadata(&self, id: &str, key: &str) -> Result<JournalManifest, KernelError> {
        let mut journal = self.fetch_journal(id)?;
        journal.clear_metadata(key)?;
        self.session.journals.update(&mut journal)?;
        self.session.record_change("journal", id, false)?;
        Ok(journal.manifest())
    }

    pub fn add_documents_bundle_to_journal(
        &self,
        journal_id: &str,
        bundle_id: &str,
        ns: Vec<String>,
    ) -> Result<JournalManifest, KernelError> {
        // referential integrity: the target bundle must currently exist
        self.fetch_bundle(bundle_id)?;

        let mut journal = self.fetch_journal(journal_id)?;
        journal.add_item(ItemRef::with_ns(bundle_id, ns))?;
        let wrote = !journal.entity().new_events().is_empty();
        self.session.journals.update(&mut journal)?;
        if wrote {
            self.session.record_change("journal", journal_id, false)?;
        }
        Ok(journal.manifest())
    }

    pub fn remove_documents_bundle_from_journal(
        &self,
        journal_id: &str,
        bundle_id: &str,
    ) -> Result<JournalManifest, KernelError> {
        let mut journal = self.fetch_journal(journal_id)?;
        journal.remove_item(bundle_id)?;
        self.session.journals.update(&mut journal)?;
        self.session.record_change("journal", journal_id, false)?;
        Ok(journal.manifest())
    }

    pub fn delete_journal(&self, id: &str) -> Result<(), KernelError> {
        let mut journal = self.fetch_journal(id)?;
        journal.mark_deleted()?;
        self.session.journals.update(&mut journal)?;
        self.session.record_change("journal", id, true)?;
        Ok(())
    }

    pub fn fetch_journal_manifest(&self, id: &str) -> Result<JournalManifest, KernelError> {
        Ok(self.fetch_journal(id)?.manifest())
    }

    pub(crate) fn fetch_journal(&self, id: &str) -> Result<Journal, KernelError> {
        self.session
            .journals
            .fetch(id)?
            .ok_or_else(|| KernelError::NotFound { entity: "journal", id: id.to_string() })
    }
}
