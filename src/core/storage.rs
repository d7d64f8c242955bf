//! Whole-document persistence over a string key-value backend.
//!
//! Every operation loads the full document, edits it in memory and writes the
//! whole thing back. There are no partial writes and no concurrent-writer
//! protection; the backend is a single browser tab's `localStorage`.

use hashbrown::HashMap;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::error::{Result, ValidationError};
use crate::record::{lenient, Record, RecordKind, User};

pub const STORAGE_KEY: &str = "jirolog:v2";

/// The simple variant kept a bare array of records under this key.
pub const LEGACY_STORAGE_KEY: &str = "jirolog:v1";

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Fails when the backend refuses the write (e.g. quota exceeded).
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&mut self, key: &str);
}

/// In-process backend for native use and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, deserialize_with = "lenient_records")]
    pub community_records: Vec<Record>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub personal_records: Vec<Record>,
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<User>,
    #[serde(default, deserialize_with = "lenient")]
    pub skip_auth: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub selected_shop: String,
}

impl PersistedState {
    pub fn records(&self, kind: RecordKind) -> &Vec<Record> {
        match kind {
            RecordKind::Community => &self.community_records,
            RecordKind::Personal => &self.personal_records,
        }
    }

    pub fn records_mut(&mut self, kind: RecordKind) -> &mut Vec<Record> {
        match kind {
            RecordKind::Community => &mut self.community_records,
            RecordKind::Personal => &mut self.personal_records,
        }
    }
}

/// Keep the records that parse; drop the rest with a warning.
fn lenient_records<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<Record>, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::Array(values) => Ok(parse_records(values)),
        serde_json::Value::Null => Ok(Vec::new()),
        other => {
            warn!("Expected a record array, found {}", other);
            Ok(Vec::new())
        }
    }
}

fn parse_records(values: Vec<serde_json::Value>) -> Vec<Record> {
    values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<Record>(v) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("Dropping unreadable record: {}", e);
                None
            }
        })
        .collect()
}

pub struct Store<S> {
    backend: S,
    key: String,
    legacy_key: String,
}

impl<S: KeyValueStore> Store<S> {
    pub fn new(backend: S) -> Self {
        Self::with_keys(backend, STORAGE_KEY, LEGACY_STORAGE_KEY)
    }

    pub fn with_keys(backend: S, key: &str, legacy_key: &str) -> Self {
        Self {
            backend,
            key: key.to_string(),
            legacy_key: legacy_key.to_string(),
        }
    }

    /// The full persisted state. Missing or corrupt data yields the default.
    pub fn load(&self) -> PersistedState {
        match self.backend.get_item(&self.key) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Stored state under {} is corrupt, using defaults: {}", self.key, e);
                PersistedState::default()
            }),
            None => self.load_legacy().unwrap_or_default(),
        }
    }

    fn load_legacy(&self) -> Option<PersistedState> {
        let raw = self.backend.get_item(&self.legacy_key)?;
        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Legacy records under {} are unreadable: {}", self.legacy_key, e);
                return None;
            }
        };
        let community_records = parse_records(values);
        info!(
            "Imported {} legacy records from {}",
            community_records.len(),
            self.legacy_key
        );
        Some(PersistedState {
            community_records,
            ..PersistedState::default()
        })
    }

    /// Write the whole document. The legacy key is dropped once the current
    /// document holds its imported records.
    pub fn save(&mut self, state: &PersistedState) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        self.backend.set_item(&self.key, &raw)?;
        if self.backend.get_item(&self.legacy_key).is_some() {
            self.backend.remove_item(&self.legacy_key);
            info!("Removed legacy records under {}", self.legacy_key);
        }
        Ok(())
    }

    pub fn records(&self, kind: RecordKind) -> Vec<Record> {
        let mut state = self.load();
        std::mem::take(state.records_mut(kind))
    }

    pub fn get_by_id(&self, kind: RecordKind, id: &str) -> Option<Record> {
        self.load()
            .records(kind)
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Replace the record with the same id, or prepend it if new.
    pub fn upsert(&mut self, kind: RecordKind, record: Record) -> Result<Vec<Record>> {
        let mut state = self.upsert_into(&[kind], record)?;
        Ok(std::mem::take(state.records_mut(kind)))
    }

    /// [`Store::upsert`] into several collections with a single write, so a
    /// refused write leaves every collection untouched.
    pub fn upsert_many(&mut self, kinds: &[RecordKind], record: Record) -> Result<()> {
        self.upsert_into(kinds, record).map(|_| ())
    }

    fn upsert_into(&mut self, kinds: &[RecordKind], record: Record) -> Result<PersistedState> {
        if record.shop_name.trim().is_empty() {
            return Err(ValidationError::MissingShopName.into());
        }
        let mut state = self.load();
        for &kind in kinds {
            let records = state.records_mut(kind);
            match records.iter().position(|r| r.id == record.id) {
                Some(i) => records[i] = record.clone(),
                None => records.insert(0, record.clone()),
            }
        }
        self.save(&state)?;
        Ok(state)
    }

    pub fn remove(&mut self, kind: RecordKind, id: &str) -> Result<Vec<Record>> {
        let mut state = self.load();
        state.records_mut(kind).retain(|r| r.id != id);
        self.save(&state)?;
        Ok(std::mem::take(state.records_mut(kind)))
    }

    pub fn user(&self) -> Option<User> {
        self.load().user
    }

    pub fn set_user(&mut self, user: Option<User>) -> Result<()> {
        self.update(|s| s.user = user)
    }

    pub fn skip_auth(&self) -> bool {
        self.load().skip_auth
    }

    pub fn set_skip_auth(&mut self, skip: bool) -> Result<()> {
        self.update(|s| s.skip_auth = skip)
    }

    pub fn selected_shop(&self) -> String {
        self.load().selected_shop
    }

    pub fn set_selected_shop(&mut self, shop: &str) -> Result<()> {
        let shop = shop.trim().to_string();
        self.update(|s| s.selected_shop = shop)
    }

    fn update(&mut self, f: impl FnOnce(&mut PersistedState)) -> Result<()> {
        let mut state = self.load();
        f(&mut state);
        self.save(&state)
    }
}

/// Backend wrapper that refuses writes, standing in for a full `localStorage`.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FullStore(pub(crate) MemoryStore);

#[cfg(test)]
impl KeyValueStore for FullStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.0.get_item(key)
    }

    fn set_item(&mut self, _key: &str, _value: &str) -> Result<()> {
        Err(crate::error::Error::Storage("quota exceeded".to_string()))
    }

    fn remove_item(&mut self, key: &str) {
        self.0.remove_item(key)
    }
}

/// Backend that accepts a fixed number of writes and refuses the rest.
#[cfg(test)]
pub(crate) struct LimitedStore {
    pub(crate) inner: MemoryStore,
    pub(crate) writes_left: usize,
}

#[cfg(test)]
impl KeyValueStore for LimitedStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        if self.writes_left == 0 {
            return Err(crate::error::Error::Storage("quota exceeded".to_string()));
        }
        self.writes_left -= 1;
        self.inner.set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) {
        self.inner.remove_item(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, shop: &str) -> Record {
        let mut r = Record::new(None, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        r.id = id.to_string();
        r.shop_name = shop.to_string();
        r
    }

    #[test]
    fn missing_document_loads_as_default() {
        let store = Store::new(MemoryStore::new());
        assert_eq!(store.load(), PersistedState::default());
    }

    #[test]
    fn corrupt_document_loads_as_default() {
        let mut backend = MemoryStore::new();
        backend.set_item(STORAGE_KEY, "{not json").unwrap();
        let store = Store::new(backend);
        let state = store.load();
        assert!(state.community_records.is_empty());
        assert!(state.personal_records.is_empty());
        assert_eq!(state.user, None);
    }

    #[test]
    fn wrong_typed_settings_keep_the_records() {
        let mut backend = MemoryStore::new();
        let raw = serde_json::json!({
            "communityRecords": [
                { "id": "a", "shopName": "三田本店" },
                { "id": "b", "shopName": "目黒店" }
            ],
            "personalRecords": [{ "id": "c", "shopName": "目黒店" }],
            "user": "jiro",
            "skipAuth": "yes",
            "selectedShop": null
        });
        backend.set_item(STORAGE_KEY, &raw.to_string()).unwrap();
        let mut store = Store::new(backend);

        let state = store.load();
        assert_eq!(state.community_records.len(), 2);
        assert_eq!(state.personal_records.len(), 1);
        assert_eq!(state.user, None);
        assert!(!state.skip_auth);
        assert_eq!(state.selected_shop, "");

        store.set_skip_auth(true).unwrap();
        let state = store.load();
        assert!(state.skip_auth);
        assert_eq!(state.community_records.len(), 2);
        assert_eq!(state.personal_records.len(), 1);
    }

    #[test]
    fn non_array_collection_loads_empty() {
        let mut backend = MemoryStore::new();
        let raw = serde_json::json!({
            "communityRecords": { "id": "a" },
            "personalRecords": [{ "id": "c", "shopName": "目黒店" }]
        });
        backend.set_item(STORAGE_KEY, &raw.to_string()).unwrap();
        let state = Store::new(backend).load();
        assert!(state.community_records.is_empty());
        assert_eq!(state.personal_records.len(), 1);
    }

    #[test]
    fn record_with_null_fields_survives_a_settings_write() {
        let mut backend = MemoryStore::new();
        let raw = serde_json::json!({
            "communityRecords": [{
                "id": "keep-me",
                "shopName": "三田本店",
                "notes": null,
                "createdAt": "",
                "userId": 5
            }]
        });
        backend.set_item(STORAGE_KEY, &raw.to_string()).unwrap();
        let mut store = Store::new(backend);

        store.set_selected_shop("目黒店").unwrap();
        let kept = store.get_by_id(RecordKind::Community, "keep-me").unwrap();
        assert_eq!(kept.shop_name, "三田本店");
        assert_eq!(kept.notes, "");
        assert_eq!(kept.user_id, None);
        assert_eq!(store.selected_shop(), "目黒店");
    }

    #[test]
    fn upsert_then_get_then_remove() {
        let mut store = Store::new(MemoryStore::new());
        let r = record("a", "三田本店");
        store.upsert(RecordKind::Community, r.clone()).unwrap();
        assert_eq!(store.get_by_id(RecordKind::Community, "a"), Some(r));
        assert_eq!(store.get_by_id(RecordKind::Personal, "a"), None);

        store.remove(RecordKind::Community, "a").unwrap();
        assert_eq!(store.get_by_id(RecordKind::Community, "a"), None);
    }

    #[test]
    fn upsert_replaces_instead_of_duplicating() {
        let mut store = Store::new(MemoryStore::new());
        let mut r = record("a", "三田本店");
        store.upsert(RecordKind::Community, r.clone()).unwrap();
        r.notes = "second visit".to_string();
        let all = store.upsert(RecordKind::Community, r.clone()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].notes, "second visit");
    }

    #[test]
    fn new_records_are_prepended() {
        let mut store = Store::new(MemoryStore::new());
        store.upsert(RecordKind::Personal, record("a", "目黒店")).unwrap();
        store.upsert(RecordKind::Personal, record("b", "目黒店")).unwrap();
        let ids: Vec<String> = store
            .records(RecordKind::Personal)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn blank_shop_name_is_not_persisted() {
        let mut store = Store::new(MemoryStore::new());
        let err = store.upsert(RecordKind::Community, record("a", "   "));
        assert!(matches!(err, Err(Error::Validation(_))));
        assert!(store.records(RecordKind::Community).is_empty());
    }

    #[test]
    fn unreadable_records_are_dropped_individually() {
        let mut backend = MemoryStore::new();
        let raw = serde_json::json!({
            "communityRecords": [
                { "id": "ok", "shopName": "三田本店" },
                { "shopName": "no id" },
                "garbage"
            ],
            "selectedShop": "三田本店"
        });
        backend.set_item(STORAGE_KEY, &raw.to_string()).unwrap();
        let store = Store::new(backend);
        let state = store.load();
        assert_eq!(state.community_records.len(), 1);
        assert_eq!(state.community_records[0].id, "ok");
        assert_eq!(state.selected_shop, "三田本店");
    }

    #[test]
    fn legacy_array_imports_as_community_records() {
        let mut backend = MemoryStore::new();
        let raw = serde_json::json!([
            { "id": "old", "shopName": "ひばりヶ丘駅前店", "metrics": { "noodles": 2 } }
        ]);
        backend.set_item(LEGACY_STORAGE_KEY, &raw.to_string()).unwrap();
        let store = Store::new(backend);
        let records = store.records(RecordKind::Community);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metrics.noodles.option, "小");
        assert!(store.records(RecordKind::Personal).is_empty());
    }

    #[test]
    fn current_document_wins_over_legacy() {
        let mut backend = MemoryStore::new();
        backend
            .set_item(LEGACY_STORAGE_KEY, r#"[{"id":"old","shopName":"x"}]"#)
            .unwrap();
        backend.set_item(STORAGE_KEY, "{}").unwrap();
        let store = Store::new(backend);
        assert!(store.records(RecordKind::Community).is_empty());
    }

    #[test]
    fn first_write_drops_the_legacy_key() {
        let mut backend = MemoryStore::new();
        backend
            .set_item(LEGACY_STORAGE_KEY, r#"[{"id":"old","shopName":"x"}]"#)
            .unwrap();
        let mut store = Store::new(backend);
        store.set_skip_auth(true).unwrap();

        assert_eq!(store.backend.get_item(LEGACY_STORAGE_KEY), None);
        let records = store.records(RecordKind::Community);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "old");
    }

    #[test]
    fn refused_write_keeps_the_legacy_key() {
        let mut backend = FullStore::default();
        backend
            .0
            .set_item(LEGACY_STORAGE_KEY, r#"[{"id":"old","shopName":"x"}]"#)
            .unwrap();
        let mut store = Store::new(backend);
        assert!(store.set_skip_auth(true).is_err());
        assert!(store.backend.get_item(LEGACY_STORAGE_KEY).is_some());
    }

    #[test]
    fn upsert_many_writes_every_collection_once() {
        let mut store = Store::new(LimitedStore {
            inner: MemoryStore::new(),
            writes_left: 1,
        });
        let r = record("a", "三田本店");
        store
            .upsert_many(&[RecordKind::Community, RecordKind::Personal], r.clone())
            .unwrap();
        assert_eq!(store.get_by_id(RecordKind::Community, "a"), Some(r.clone()));
        assert_eq!(store.get_by_id(RecordKind::Personal, "a"), Some(r));
    }

    #[test]
    fn refused_upsert_many_leaves_both_collections_empty() {
        let mut store = Store::new(FullStore::default());
        let err = store.upsert_many(
            &[RecordKind::Community, RecordKind::Personal],
            record("a", "三田本店"),
        );
        assert!(matches!(err, Err(Error::Storage(_))));
        assert!(store.records(RecordKind::Community).is_empty());
        assert!(store.records(RecordKind::Personal).is_empty());
    }

    #[test]
    fn settings_round_trip() {
        let mut store = Store::new(MemoryStore::new());
        assert!(!store.skip_auth());
        store.set_skip_auth(true).unwrap();
        store.set_selected_shop(" 神田神保町店 ").unwrap();
        store.set_user(User::from_nickname("Jiro")).unwrap();
        assert!(store.skip_auth());
        assert_eq!(store.selected_shop(), "神田神保町店");
        assert_eq!(store.user().map(|u| u.id), Some("jiro".to_string()));
    }

    #[test]
    fn failed_write_surfaces_as_error() {
        let mut store = Store::new(FullStore::default());
        let err = store.upsert(RecordKind::Community, record("a", "三田本店"));
        assert!(matches!(err, Err(Error::Storage(_))));
    }
}
