use crate::domain::manifest::Timestamp;
use crate::domain::KernelError;
use crate::persistence::{Change, ChangesStore, EntityStore, DEFAULT_CHANGES_LIMIT};

use super::session::DomainService;

impl<'a, S: EntityStore, C: ChangesStore> DomainService<'a, S, C> {
    /// Reads a page of the change feed: entries with `timestamp >
    /// since`, ordered ascending, capped at `limit` (defaults to 500).
    pub fn fetch_changes(
        &self,
        since: Option<Timestamp>,
        limit: Option<usize>,
    ) -> Result<Vec<Change>, KernelError> {
        self.session.changes.filter(since, limit.unwrap_or(DEFAULT_CHANGES_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::session::in_memory_session;

    #[test]
    fn fetch_changes_reflects_mutations_in_order() {
        let session = in_memory_session();
        let service = DomainService::new(&session);
        service.create_journal("j1", &[]).unwrap();
        service.register_document("d1", "uri1", &["gf01"], &[]).unwrap();
        service.register_asset_version("d1", "gf01", "gf01-v2").unwrap();

        let page = service.fetch_changes(None, None).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].entity, "journal");
        assert_eq!(page[2].entity, "document");
    }

    #[test]
    fn pagination_via_since_cursor_covers_every_later_entry() {
        let session = in_memory_session();
        let service = DomainService::new(&session);
        service.create_journal("j1", &[]).unwrap();
        service.create_documents_bundle("b1", &[]).unwrap();

        let first_page = service.fetch_changes(None, Some(1)).unwrap();
        assert_eq!(first_page.len(), 1);

        let since = first_page[0].timestamp;
        let second_page = service.fetch_changes(Some(since), None).unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].entity, "documents_bundle");
    }
}
