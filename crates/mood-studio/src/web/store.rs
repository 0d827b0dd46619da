use super::js_error_text;
use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    /// `None` when storage is disabled (private mode, sandboxed frame).
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Backend(js_error_text(&e)))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Backend(js_error_text(&e)))
    }
}
