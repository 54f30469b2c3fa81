use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EventRecord};
use crate::impl_aggregate;

use super::error::KernelError;
use super::manifest::Timestamp;

/// One bound-or-unbound asset/rendition slot: an append-only,
/// oldest-first list of `(timestamp, uri)` pairs. The current URI is
/// the last entry; an empty list means the slot is declared but unbound.
pub type SlotHistory = Vec<(Timestamp, String)>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Version {
    pub data: String,
    pub timestamp: Timestamp,
    pub assets: BTreeMap<String, SlotHistory>,
    pub renditions: BTreeMap<String, SlotHistory>,
}

impl Version {
    fn declared_slots(&self, renditions: bool) -> Vec<&str> {
        let map = if renditions { &self.renditions } else { &self.assets };
        map.keys().map(|s| s.as_str()).collect()
    }

    /// Truncates every slot's history to entries at or before `at`,
    /// used by `version_at` to answer as-of queries.
    fn truncated_to(&self, at: Timestamp) -> Version {
        let cut = |map: &BTreeMap<String, SlotHistory>| -> BTreeMap<String, SlotHistory> {
            map.iter()
                .map(|(slot, history)| {
                    let truncated: SlotHistory =
                        history.iter().filter(|(ts, _)| *ts <= at).cloned().collect();
                    (slot.clone(), truncated)
                })
                .collect()
        };
        Version {
            data: self.data.clone(),
            timestamp: self.timestamp,
            assets: cut(&self.assets),
            renditions: cut(&self.renditions),
        }
    }
}

/// The materialised, replay-only view of a `Document`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentManifest {
    pub id: String,
    pub v3: String,
    pub v1: Option<String>,
    pub v2: Option<String>,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub versions: Vec<Version>,
    pub deleted: bool,
}

/// A scholarly document: an append-only list of versions, each with a
/// frozen set of declared asset/rendition slots whose URIs may only be
/// bound or rebound while that version remains the latest.
#[derive(Default)]
pub struct Document {
    entity: Entity,
    v3: String,
    v1: Option<String>,
    v2: Option<String>,
    versions: Vec<Version>,
    deleted: bool,
}

#[derive(Clone, Serialize, Deserialize)]
struct CreatedPayload {
    id: String,
    v3: String,
    v1: Option<String>,
    v2: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
struct VersionAddedPayload {
    data: String,
    asset_slots: Vec<String>,
    rendition_slots: Vec<String>,
    timestamp: Timestamp,
}

#[derive(Clone, Serialize, Deserialize)]
struct SlotVersionAddedPayload {
    slot: String,
    uri: String,
    timestamp: Timestamp,
}

impl Document {
    pub fn create(
        id: impl Into<String>,
        v3: impl Into<String>,
        v1: Option<String>,
        v2: Option<String>,
    ) -> Self {
        let mut doc = Document::default();
        let id = id.into();
        doc.entity.set_id(&id);
        let payload = CreatedPayload { id, v3: v3.into(), v1, v2 };
        doc.entity.digest("DocumentCreated", &payload);
        doc.v3 = payload.v3;
        doc.v1 = payload.v1;
        doc.v2 = payload.v2;
        doc
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }

    pub fn manifest(&self) -> DocumentManifest {
        DocumentManifest {
            id: self.entity.id().to_string(),
            v3: self.v3.clone(),
            v1: self.v1.clone(),
            v2: self.v2.clone(),
            created: first_event_time(&self.entity),
            updated: last_event_time(&self.entity),
            versions: self.versions.clone(),
            deleted: self.deleted,
        }
    }

    fn ensure_live(&self) -> Result<(), KernelError> {
        if self.deleted {
            return Err(KernelError::AlreadyDeleted { entity: "document", id: self.id().to_string() });
        }
        Ok(())
    }

    fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    /// Appends a new version. A no-op (surfaced as `VersionAlreadyExists`)
    /// when `data` and the declared slot sets match the current latest
    /// version exactly.
    pub fn new_version(
        &mut self,
        data: impl Into<String>,
        asset_slots: Vec<String>,
        rendition_slots: Vec<String>,
        timestamp: Timestamp,
    ) -> Result<(), KernelError> {
        self.ensure_live()?;
        let data = data.into();

        if let Some(current) = self.latest() {
            let same_data = current.data == data;
            let mut current_assets = current.declared_slots(false);
            let mut wanted_assets: Vec<&str> = asset_slots.iter().map(|s| s.as_str()).collect();
            current_assets.sort_unstable();
            wanted_assets.sort_unstable();
            let mut current_renditions = current.declared_slots(true);
            let mut wanted_renditions: Vec<&str> = rendition_slots.iter().map(|s| s.as_str()).collect();
            current_renditions.sort_unstable();
            wanted_renditions.sort_unstable();

            if same_data && current_assets == wanted_assets && current_renditions == wanted_renditions {
                return Err(KernelError::VersionAlreadyExists { id: self.id().to_string() });
            }
        }

        let payload = VersionAddedPayload {
            data,
            asset_slots,
            rendition_slots,
            timestamp,
        };
        self.entity.digest("VersionAdded", &payload);
        self.push_version(payload);
        Ok(())
    }

    fn push_version(&mut self, payload: VersionAddedPayload) {
        let assets = payload.asset_slots.into_iter().map(|s| (s, SlotHistory::new())).collect();
        let renditions = payload.rendition_slots.into_iter().map(|s| (s, SlotHistory::new())).collect();
        self.versions.push(Version {
            data: payload.data,
            timestamp: payload.timestamp,
            assets,
            renditions,
        });
    }

    fn new_slot_version(&mut self, event_name: &'static str, renditions: bool, slot: &str, uri: impl Into<String>, timestamp: Timestamp) -> Result<(), KernelError> {
        self.ensure_live()?;
        let uri = uri.into();
        let id = self.id().to_string();
        let version = self.versions.last_mut().ok_or_else(|| KernelError::AssetSlotUnknown { id: id.clone(), slot: slot.to_string() })?;
        let map = if renditions { &mut version.renditions } else { &mut version.assets };
        let history = map.get_mut(slot).ok_or_else(|| KernelError::AssetSlotUnknown { id: id.clone(), slot: slot.to_string() })?;

        if history.last().map(|(_, last_uri)| last_uri == &uri).unwrap_or(false) {
            return Ok(());
        }

        history.push((timestamp, uri.clone()));
        let payload = SlotVersionAddedPayload { slot: slot.to_string(), uri, timestamp };
        self.entity.digest(event_name, &payload);
        Ok(())
    }

    pub fn new_asset_version(&mut self, slot: &str, uri: impl Into<String>, timestamp: Timestamp) -> Result<(), KernelError> {
        self.new_slot_version("AssetVersionAdded", false, slot, uri, timestamp)
    }

    pub fn new_rendition_version(&mut self, slot: &str, uri: impl Into<String>, timestamp: Timestamp) -> Result<(), KernelError> {
        self.new_slot_version("RenditionVersionAdded", true, slot, uri, timestamp)
    }

    /// Returns the version at `index` (0-based), or the latest when `None`.
    pub fn version(&self, index: Option<usize>) -> Option<&Version> {
        match index {
            Some(i) => self.versions.get(i),
            None => self.latest(),
        }
    }

    /// Returns the version whose timestamp is the greatest that is `<=
    /// at`, with every slot truncated to entries at or before `at`.
    /// `None` if every version postdates `at`.
    pub fn version_at(&self, at: Timestamp) -> Option<Version> {
        self.versions
            .iter()
            .filter(|v| v.timestamp <= at)
            .max_by_key(|v| v.timestamp)
            .map(|v| v.truncated_to(at))
    }

    pub fn mark_deleted(&mut self, timestamp: Timestamp) -> Result<(), KernelError> {
        self.ensure_live()?;
        self.entity.digest("DocumentDeleted", &timestamp);
        self.deleted = true;
        Ok(())
    }

    fn replay(&mut self, event: &EventRecord) -> Result<(), String> {
        match event.event_name.as_str() {
            "DocumentCreated" => {
                let payload: CreatedPayload = event.decode().map_err(|e| e.to_string())?;
                self.entity.set_id(&payload.id);
                self.v3 = payload.v3;
                self.v1 = payload.v1;
                self.v2 = payload.v2;
            }
            "VersionAdded" => {
                let payload: VersionAddedPayload = event.decode().map_err(|e| e.to_string())?;
                self.push_version(payload);
            }
            "AssetVersionAdded" | "RenditionVersionAdded" => {
                let payload: SlotVersionAddedPayload = event.decode().map_err(|e| e.to_string())?;
                let renditions = event.event_name == "RenditionVersionAdded";
                let version = self.versions.last_mut().ok_or("slot version with no version present")?;
                let map = if renditions { &mut version.renditions } else { &mut version.assets };
                map.entry(payload.slot).or_default().push((payload.timestamp, payload.uri));
            }
            "DocumentDeleted" => {
                self.deleted = true;
            }
            other => return Err(format!("unknown document event {other}")),
        }
        Ok(())
    }
}

impl_aggregate!(Document, entity, replay);

fn first_event_time(entity: &Entity) -> Timestamp {
    entity.events().first().map(|e| Timestamp::from(e.timestamp)).unwrap_or_else(chrono::Utc::now)
}

fn last_event_time(entity: &Entity) -> Timestamp {
    entity.events().last().map(|e| Timestamp::from(e.timestamp)).unwrap_or_else(chrono::Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{hydrate, Aggregate};
    use chrono::{Duration, Utc};

    fn ts(offset_secs: i64) -> Timestamp {
        Utc::now() + Duration::seconds(offset_secs)
    }

    #[test]
    fn register_document_and_version() {
        let mut doc = Document::create("0034-8910-rsp-48-2-0347", "pid-v3", None, None);
        doc.new_version("s3://doc/0347.xml", vec!["gf01".into()], vec![], ts(0)).unwrap();
        let manifest = doc.manifest();
        assert_eq!(manifest.versions.len(), 1);
        assert!(manifest.versions[0].assets.get("gf01").unwrap().is_empty());
    }

    #[test]
    fn asset_binding_appends_and_is_idempotent() {
        let mut doc = Document::create("d1", "pid", None, None);
        doc.new_version("uri1", vec!["gf01".into()], vec![], ts(0)).unwrap();
        doc.new_asset_version("gf01", "uri-gf01-v1", ts(1)).unwrap();
        doc.new_asset_version("gf01", "uri-gf01-v1", ts(2)).unwrap(); // no-op
        let manifest = doc.manifest();
        assert_eq!(manifest.versions[0].assets["gf01"].len(), 1);

        doc.new_asset_version("gf01", "uri-gf01-v2", ts(3)).unwrap();
        let manifest = doc.manifest();
        assert_eq!(manifest.versions[0].assets["gf01"].len(), 2);
    }

    #[test]
    fn unknown_slot_rejected() {
        let mut doc = Document::create("d1", "pid", None, None);
        doc.new_version("uri1", vec![], vec![], ts(0)).unwrap();
        let err = doc.new_asset_version("missing", "uri", ts(1)).unwrap_err();
        assert!(matches!(err, KernelError::AssetSlotUnknown { .. }));
    }

    #[test]
    fn identical_version_is_noop() {
        let mut doc = Document::create("d1", "pid", None, None);
        doc.new_version("uri1", vec!["gf01".into()], vec![], ts(0)).unwrap();
        let err = doc
            .new_version("uri1", vec!["gf01".into()], vec![], ts(1))
            .unwrap_err();
        assert_eq!(err, KernelError::VersionAlreadyExists { id: "d1".into() });
    }

    #[test]
    fn earlier_versions_are_frozen() {
        let mut doc = Document::create("d1", "pid", None, None);
        doc.new_version("uri1", vec!["gf01".into()], vec![], ts(0)).unwrap();
        doc.new_asset_version("gf01", "uri-a", ts(1)).unwrap();
        doc.new_version("uri2", vec!["gf01".into()], vec![], ts(2)).unwrap();

        // new binding only touches the latest version's slot
        doc.new_asset_version("gf01", "uri-b", ts(3)).unwrap();
        let manifest = doc.manifest();
        assert_eq!(manifest.versions[0].assets["gf01"].len(), 1);
        assert_eq!(manifest.versions[1].assets["gf01"].len(), 1);
    }

    #[test]
    fn version_at_truncates_slot_history() {
        let mut doc = Document::create("d1", "pid", None, None);
        let t0 = ts(0);
        let t1 = ts(10);
        doc.new_version("uri1", vec!["gf01".into()], vec![], t0).unwrap();
        doc.new_asset_version("gf01", "first", t1).unwrap();

        let before = doc.version_at(ts(5)).unwrap();
        assert!(before.assets["gf01"].is_empty());

        let after = doc.version_at(ts(20)).unwrap();
        assert_eq!(after.assets["gf01"].len(), 1);
    }

    #[test]
    fn version_at_before_any_version_returns_none() {
        let mut doc = Document::create("d1", "pid", None, None);
        doc.new_version("uri1", vec![], vec![], ts(100)).unwrap();
        assert!(doc.version_at(ts(0)).is_none());
    }

    #[test]
    fn replay_reconstructs_full_state() {
        let mut doc = Document::create("d1", "pid-3", Some("legacy-v1".into()), None);
        doc.new_version("uri1", vec!["gf01".into()], vec![], ts(0)).unwrap();
        doc.new_asset_version("gf01", "bound", ts(1)).unwrap();

        let entity = doc.entity().clone();
        let rehydrated: Document = hydrate(entity).unwrap();
        let manifest = rehydrated.manifest();
        assert_eq!(manifest.v3, "pid-3");
        assert_eq!(manifest.v1, Some("legacy-v1".to_string()));
        assert_eq!(manifest.versions[0].assets["gf01"][0].1, "bound");
    }

    #[test]
    fn mutation_after_delete_rejected() {
        let mut doc = Document::create("d1", "pid", None, None);
        doc.mark_deleted(ts(0)).unwrap();
        let err = doc.new_version("uri1", vec![], vec![], ts(1)).unwrap_err();
        assert!(matches!(err, KernelError::AlreadyDeleted { .. }));
    }
}
