use crate::aggregate::Aggregate;
use crate::domain::manifest::ItemRef;
use crate::domain::KernelError;
use crate::entity::EventRecord;
use crate::persistence::{ChangesStore, EntityStore};

use super::session::DomainService;

/// One entry in an event-list diff between two history-index cursors:
/// the event's name plus a best-effort decoded summary of its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub index: usize,
    pub event_name: String,
    pub summary: String,
}

fn describe(event: &EventRecord) -> String {
    match event.event_name.as_str() {
        "JournalCreated" | "BundleCreated" | "DocumentCreated" | "MetadataCleared" | "ItemRemoved" => {
            event
                .decode::<String>()
                .map(|s| format!("{s:?}"))
                .unwrap_or_else(|e| e.to_string())
        }
        "MetadataSet" => event
            .decode::<(String, String)>()
            .map(|pair| format!("{pair:?}"))
            .unwrap_or_else(|e| e.to_string()),
        "ItemAdded" => event
            .decode::<ItemRef>()
            .map(|item| format!("{item:?}"))
            .unwrap_or_else(|e| e.to_string()),
        "ItemInserted" => event
            .decode::<(u64, ItemRef)>()
            .map(|pair| format!("{pair:?}"))
            .unwrap_or_else(|e| e.to_string()),
        "JournalDeleted" | "BundleDeleted" => "()".to_string(),
        other => format!("<{other} payload, {} bytes>", event.payload_bytes().len()),
    }
}

fn diff_events(events: &[EventRecord], from_index: usize, to_index: usize) -> Vec<DiffEntry> {
    let (lo, hi) = if from_index <= to_index { (from_index, to_index) } else { (to_index, from_index) };
    events
        .iter()
        .enumerate()
        .filter(|(i, _)| *i > lo && *i <= hi)
        .map(|(i, event)| DiffEntry { index: i, event_name: event.event_name.clone(), summary: describe(event) })
        .collect()
}

impl<'a, S: EntityStore, C: ChangesStore> DomainService<'a, S, C> {
    pub fn diff_journal_versions(
        &self,
        id: &str,
        from_index: usize,
        to_index: usize,
    ) -> Result<Vec<DiffEntry>, KernelError> {
        let journal = self.fetch_journal(id)?;
        Ok(diff_events(journal.entity().events(), from_index, to_index))
    }

    pub fn diff_documents_bundle_versions(
        &self,
        id: &str,
        from_index: usize,
        to_index: usize,
    ) -> Result<Vec<DiffEntry>, KernelError> {
        let bundle = self.fetch_bundle(id)?;
        Ok(diff_events(bundle.entity().events(), from_index, to_index))
    }
}
