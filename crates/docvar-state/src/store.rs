//! Typed access to persisted placeholder state
//!
//! Every placeholder aspect has its own key so that changing the kind of a
//! placeholder never misreads an older value:
//!
//! | Aspect | Key |
//! |--------|-----|
//! | textbox text | `<prefix><NAME>_TEXT` |
//! | checkbox flag | `<prefix><NAME>_IS_CHECKED` |
//! | dropdown index | `<prefix><NAME>_INDEX` |
//! | setting | `<prefix>SETTINGS_<KEY>` |

use crate::backend::{MemoryStorage, StorageBackend};
use crate::error::{StateError, StateResult};
use tracing::{debug, info, warn};

/// Default namespace prefix for all keys
pub const DEFAULT_PREFIX: &str = "PLACEHOLDER_";

const SETTINGS_NAMESPACE: &str = "SETTINGS_";

/// State store over a storage backend
pub struct StateStore {
    backend: Box<dyn StorageBackend>,
    prefix: String,
}

impl StateStore {
    /// Create store with the default prefix
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self::with_prefix(backend, DEFAULT_PREFIX)
    }

    /// Create store with a custom prefix
    #[must_use]
    pub fn with_prefix(backend: Box<dyn StorageBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// Create store backed by memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Key namespace prefix
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of a textbox value
    #[must_use]
    pub fn text_key(&self, name: &str) -> String {
        format!("{}{name}_TEXT", self.prefix)
    }

    /// Key of a checkbox flag
    #[must_use]
    pub fn checked_key(&self, name: &str) -> String {
        format!("{}{name}_IS_CHECKED", self.prefix)
    }

    /// Key of a dropdown index
    #[must_use]
    pub fn index_key(&self, name: &str) -> String {
        format!("{}{name}_INDEX", self.prefix)
    }

    /// Key of a setting
    #[must_use]
    pub fn setting_key(&self, key: &str) -> String {
        format!("{}{SETTINGS_NAMESPACE}{key}", self.prefix)
    }

    /// Stored textbox value, `None` if absent or empty
    #[must_use]
    pub fn load_text(&self, name: &str) -> Option<String> {
        let value = self.backend.get(&self.text_key(name)).filter(|v| !v.is_empty());
        debug!("Read textbox {name}: {value:?}");
        value
    }

    /// Persist a textbox value
    pub fn store_text(&mut self, name: &str, value: &str) -> StateResult<()> {
        info!("Set textbox {name} to '{value}'");
        self.backend.set(&self.text_key(name), value)
    }

    /// Stored checkbox flag
    ///
    /// Returns `None` if absent. Values other than `0`/`1` are logged and
    /// treated as absent.
    #[must_use]
    pub fn load_checked(&self, name: &str) -> Option<bool> {
        let key = self.checked_key(name);
        match self.backend.get(&key)?.as_str() {
            "1" => Some(true),
            "0" => Some(false),
            other => {
                warn!("{}", StateError::corrupt(&key, other, "'0' or '1'"));
                None
            }
        }
    }

    /// Persist a checkbox flag
    pub fn store_checked(&mut self, name: &str, checked: bool) -> StateResult<()> {
        info!("Set checkbox {name} to {checked}");
        self.backend
            .set(&self.checked_key(name), if checked { "1" } else { "0" })
    }

    /// Stored dropdown index for a list of `len` options
    ///
    /// Returns `None` if absent. Non-numeric or out-of-range values are
    /// logged and treated as absent.
    #[must_use]
    pub fn load_index(&self, name: &str, len: usize) -> Option<usize> {
        let key = self.index_key(name);
        let raw = self.backend.get(&key)?;
        match raw.trim().parse::<usize>() {
            Ok(index) if index < len => Some(index),
            _ => {
                let expected = format!("a whole number N, where 0 <= N < {len}");
                warn!("{}", StateError::corrupt(&key, raw, expected));
                None
            }
        }
    }

    /// Persist a dropdown index for a list of `len` options
    ///
    /// # Errors
    /// Returns [`StateError::IndexOutOfRange`] if `index >= len`
    pub fn store_index(&mut self, name: &str, index: usize, len: usize) -> StateResult<()> {
        if index >= len {
            return Err(StateError::IndexOutOfRange {
                name: name.to_string(),
                index,
                len,
            });
        }
        info!("Set dropdown {name} to index {index}");
        self.backend.set(&self.index_key(name), &index.to_string())
    }

    /// Stored setting
    #[must_use]
    pub fn load_setting(&self, key: &str) -> Option<String> {
        self.backend.get(&self.setting_key(key))
    }

    /// Stored boolean setting, corrupt values are logged and ignored
    #[must_use]
    pub fn load_bool_setting(&self, key: &str) -> Option<bool> {
        match self.load_setting(key)?.as_str() {
            "1" => Some(true),
            "0" => Some(false),
            other => {
                warn!("{}", StateError::corrupt(self.setting_key(key), other, "'0' or '1'"));
                None
            }
        }
    }

    /// Persist a setting
    pub fn store_setting(&mut self, key: &str, value: &str) -> StateResult<()> {
        self.backend.set(&self.setting_key(key), value)
    }

    /// Persist a boolean setting
    pub fn store_bool_setting(&mut self, key: &str, value: bool) -> StateResult<()> {
        self.store_setting(key, if value { "1" } else { "0" })
    }

    /// Remove a setting override
    pub fn remove_setting(&mut self, key: &str) -> StateResult<()> {
        self.backend.remove(&self.setting_key(key))
    }

    /// Remove every placeholder value, keeping settings
    ///
    /// Returns the number of removed keys.
    pub fn clear_placeholders(&mut self) -> StateResult<usize> {
        let settings = format!("{}{SETTINGS_NAMESPACE}", self.prefix);
        let doomed: Vec<String> = self
            .backend
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix) && !k.starts_with(&settings))
            .collect();
        for key in &doomed {
            self.backend.remove(key)?;
        }
        info!("Cleared {} stored placeholder values", doomed.len());
        Ok(doomed.len())
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("prefix", &self.prefix)
            .field("keys", &self.backend.keys().len())
            .finish_non_exhaustive()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
