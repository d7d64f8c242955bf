use jirolog::storage::KeyValueStore;
use jirolog::{Error, Result};

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

/// `window.localStorage` as a record backend.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct LocalStorage;

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        local_storage().and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let storage =
            local_storage().ok_or_else(|| Error::Storage("localStorage unavailable".to_string()))?;
        // Throws QuotaExceededError once photos fill the origin's quota.
        storage
            .set_item(key, value)
            .map_err(|e| Error::Storage(format!("{key}: {e:?}")))
    }

    fn remove_item(&mut self, key: &str) {
        if let Some(s) = local_storage() {
            let _ = s.remove_item(key);
        }
    }
}
