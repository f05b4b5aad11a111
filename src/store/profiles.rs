//! Profile items, documents and pointers.
//!
//! # Responsibilities
//! - Own the ordered profile list (display order)
//! - Own one document per profile
//! - Track which profile is being edited
//! - Persist the global switch and the CORS option
//!
//! # Design Decisions
//! - Profile "0" always exists, cannot be deleted and stays active
//! - Unknown ids are logged and ignored, never errors
//! - Reordering is a pairwise swap

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::rules::document::DEFAULT_DOCUMENT;
use crate::store::kv::KeyValueStore;
use crate::store::{StoreError, StoreResult};

/// Id of the built-in profile.
pub const DEFAULT_PROFILE_ID: &str = "0";

const DEFAULT_PROFILE_NAME: &str = "Default";
const ITEMS_KEY: &str = "config_items";
const EDITING_KEY: &str = "editing_config_key";
const ENABLED_KEY: &str = "enabled";
const CORS_ENABLED_KEY: &str = "cors_enabled";
const DOCUMENT_PREFIX: &str = "config/";

/// Metadata of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileItem {
    pub id: String,
    pub name: String,
    pub active: bool,
}

impl ProfileItem {
    fn default_item() -> Self {
        Self {
            id: DEFAULT_PROFILE_ID.to_string(),
            name: DEFAULT_PROFILE_NAME.to_string(),
            active: true,
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_PROFILE_ID
    }
}

/// Editable text of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub jsonc_config: String,
}

/// The profile store.
pub struct ProfileStore {
    kv: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl ProfileStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| StoreError::Poisoned)
    }

    // ---- items -------------------------------------------------------------

    /// Current profile list. An empty store is bootstrapped with the default
    /// profile.
    pub fn list_profiles(&self) -> StoreResult<Vec<ProfileItem>> {
        let _guard = self.guard()?;
        self.load_items()
    }

    /// Alias of `list_profiles` for editor collaborators.
    pub fn get_config_items(&self) -> StoreResult<Vec<ProfileItem>> {
        self.list_profiles()
    }

    /// Replace the whole item list.
    ///
    /// Duplicate ids are dropped (first kept) and the default profile is
    /// re-inserted at the front if missing. Returns the list as stored.
    pub fn set_config_items(&self, items: Vec<ProfileItem>) -> StoreResult<Vec<ProfileItem>> {
        let _guard = self.guard()?;
        let items = normalize(items);
        self.write_items(&items)?;
        Ok(items)
    }

    /// Create a profile at the end of the list, active, and start editing it.
    pub fn add_profile(&self, name: &str) -> StoreResult<ProfileItem> {
        let name = name.trim();
        if name.is_empty() {
            tracing::warn!("Rejected profile with empty name");
            return Err(StoreError::EmptyName);
        }

        let _guard = self.guard()?;
        let mut items = self.load_items()?;
        let documents: Vec<String> = self
            .kv
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(DOCUMENT_PREFIX).map(str::to_string))
            .collect();
        let item = ProfileItem {
            id: fresh_id(&items, &documents),
            name: name.to_string(),
            active: true,
        };
        items.push(item.clone());
        self.write_items(&items)?;
        self.kv.set(EDITING_KEY, Value::String(item.id.clone()))?;

        tracing::info!(id = %item.id, name = %item.name, "Profile added");
        Ok(item)
    }

    /// Rename a profile. Returns false if the id is unknown.
    pub fn rename_profile(&self, id: &str, name: &str) -> StoreResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }

        let _guard = self.guard()?;
        let mut items = self.load_items()?;
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            tracing::warn!(id, "Rename of unknown profile ignored");
            return Ok(false);
        };
        item.name = name.to_string();
        self.write_items(&items)?;
        Ok(true)
    }

    /// Remove a profile. The default profile is never removed.
    ///
    /// If the removed profile was being edited, editing moves to the
    /// preceding profile, or is unset when there is none. The document is
    /// left for `garbage_collect`.
    pub fn remove_profile(&self, id: &str) -> StoreResult<bool> {
        if id == DEFAULT_PROFILE_ID {
            tracing::debug!("Default profile cannot be removed");
            return Ok(false);
        }

        let _guard = self.guard()?;
        let mut items = self.load_items()?;
        let Some(index) = items.iter().position(|item| item.id == id) else {
            tracing::warn!(id, "Removal of unknown profile ignored");
            return Ok(false);
        };
        items.remove(index);
        self.write_items(&items)?;

        if self.stored_editing()?.as_deref() == Some(id) {
            match index.checked_sub(1).and_then(|prev| items.get(prev)) {
                Some(prev) => self.kv.set(EDITING_KEY, Value::String(prev.id.clone()))?,
                None => self.kv.remove(EDITING_KEY)?,
            }
        }

        tracing::info!(id, "Profile removed");
        Ok(true)
    }

    /// Exchange the positions of two profiles.
    pub fn swap_profiles(&self, a: &str, b: &str) -> StoreResult<bool> {
        let _guard = self.guard()?;
        let mut items = self.load_items()?;
        let a_index = items.iter().position(|item| item.id == a);
        let b_index = items.iter().position(|item| item.id == b);

        let (Some(a_index), Some(b_index)) = (a_index, b_index) else {
            tracing::warn!(a, b, "Swap aborted, profile not found");
            return Ok(false);
        };
        items.swap(a_index, b_index);
        self.write_items(&items)?;
        Ok(true)
    }

    /// Flip a profile's active flag. Other profiles are untouched.
    ///
    /// Returns the new flag, or `None` for an unknown id. The default profile
    /// stays active.
    pub fn toggle_active(&self, id: &str) -> StoreResult<Option<bool>> {
        let _guard = self.guard()?;
        let mut items = self.load_items()?;
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            tracing::warn!(id, "Toggle of unknown profile ignored");
            return Ok(None);
        };
        if item.is_default() {
            tracing::debug!("Default profile is always active");
            return Ok(Some(true));
        }
        item.active = !item.active;
        let active = item.active;
        self.write_items(&items)?;
        Ok(Some(active))
    }

    // ---- editing pointer ---------------------------------------------------

    /// Id of the profile shown in the editor. Falls back to the default
    /// profile when unset.
    pub fn editing_profile(&self) -> StoreResult<String> {
        let _guard = self.guard()?;
        Ok(self
            .stored_editing()?
            .unwrap_or_else(|| DEFAULT_PROFILE_ID.to_string()))
    }

    /// Point the editor at a profile. Unknown ids are ignored.
    pub fn set_editing_profile(&self, id: &str) -> StoreResult<bool> {
        let _guard = self.guard()?;
        if !self.load_items()?.iter().any(|item| item.id == id) {
            tracing::warn!(id, "Editing pointer not moved, profile not found");
            return Ok(false);
        }
        self.kv.set(EDITING_KEY, Value::String(id.to_string()))?;
        Ok(true)
    }

    pub fn get_editing_config_key(&self) -> StoreResult<String> {
        self.editing_profile()
    }

    pub fn set_editing_config_key(&self, id: &str) -> StoreResult<bool> {
        self.set_editing_profile(id)
    }

    fn stored_editing(&self) -> StoreResult<Option<String>> {
        Ok(self
            .kv
            .get(EDITING_KEY)?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    // ---- documents ---------------------------------------------------------

    /// Stored document of a profile, if one was ever saved.
    pub fn get_config(&self, id: &str) -> StoreResult<Option<ProfileDocument>> {
        match self.kv.get(&document_key(id))? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Document text of a profile, or the built-in template.
    pub fn document_text(&self, id: &str) -> StoreResult<String> {
        Ok(self
            .get_config(id)?
            .map(|doc| doc.jsonc_config)
            .unwrap_or_else(|| DEFAULT_DOCUMENT.to_string()))
    }

    /// Save a profile's document. Unknown ids are ignored.
    pub fn save_config(&self, text: &str, id: &str) -> StoreResult<bool> {
        let _guard = self.guard()?;
        if !self.load_items()?.iter().any(|item| item.id == id) {
            tracing::warn!(id, "Document not saved, profile not found");
            return Ok(false);
        }
        let doc = ProfileDocument {
            jsonc_config: text.to_string(),
        };
        self.kv.set(&document_key(id), serde_json::to_value(doc)?)?;
        Ok(true)
    }

    /// Active profiles in display order, with their document text.
    pub fn active_documents(&self) -> StoreResult<Vec<(ProfileItem, String)>> {
        let _guard = self.guard()?;
        let mut documents = Vec::new();
        for item in self.load_items()?.into_iter().filter(|item| item.active) {
            let text = self.document_text(&item.id)?;
            documents.push((item, text));
        }
        Ok(documents)
    }

    /// Delete documents whose profile no longer exists. Returns how many were
    /// removed; a second run removes nothing.
    pub fn garbage_collect(&self) -> StoreResult<usize> {
        let _guard = self.guard()?;
        let items = self.load_items()?;
        let mut removed = 0;

        for key in self.kv.keys()? {
            let Some(id) = key.strip_prefix(DOCUMENT_PREFIX) else {
                continue;
            };
            if !items.iter().any(|item| item.id == id) {
                self.kv.remove(&key)?;
                removed += 1;
                tracing::debug!(id, "Removed orphaned profile document");
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Garbage collected profile documents");
        }
        Ok(removed)
    }

    pub fn remove_unused_items(&self) -> StoreResult<usize> {
        self.garbage_collect()
    }

    // ---- switches ----------------------------------------------------------

    /// Seed the switches from settings, leaving values already stored alone.
    pub fn init_switches(&self, enabled: bool, cors_enabled: bool) -> StoreResult<()> {
        let _guard = self.guard()?;
        if self.kv.get(ENABLED_KEY)?.is_none() {
            self.kv.set(ENABLED_KEY, Value::Bool(enabled))?;
        }
        if self.kv.get(CORS_ENABLED_KEY)?.is_none() {
            self.kv.set(CORS_ENABLED_KEY, Value::Bool(cors_enabled))?;
        }
        Ok(())
    }

    /// Global switch: when off, no rules are installed.
    pub fn is_enabled(&self) -> StoreResult<bool> {
        self.flag(ENABLED_KEY)
    }

    pub fn set_enabled(&self, enabled: bool) -> StoreResult<()> {
        let _guard = self.guard()?;
        self.kv.set(ENABLED_KEY, Value::Bool(enabled))
    }

    /// When off, CORS header rules are not compiled.
    pub fn cors_enabled(&self) -> StoreResult<bool> {
        self.flag(CORS_ENABLED_KEY)
    }

    pub fn set_cors_enabled(&self, enabled: bool) -> StoreResult<()> {
        let _guard = self.guard()?;
        self.kv.set(CORS_ENABLED_KEY, Value::Bool(enabled))
    }

    fn flag(&self, key: &str) -> StoreResult<bool> {
        Ok(self.kv.get(key)?.and_then(|v| v.as_bool()).unwrap_or(true))
    }

    // ---- internals ---------------------------------------------------------

    /// Read the item list. Callers must hold the lock.
    fn load_items(&self) -> StoreResult<Vec<ProfileItem>> {
        let stored: Vec<ProfileItem> = match self.kv.get(ITEMS_KEY)? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };

        if stored.is_empty() {
            let items = vec![ProfileItem::default_item()];
            self.write_items(&items)?;
            return Ok(items);
        }
        Ok(normalize(stored))
    }

    fn write_items(&self, items: &[ProfileItem]) -> StoreResult<()> {
        self.kv.set(ITEMS_KEY, serde_json::to_value(items)?)
    }
}

fn document_key(id: &str) -> String {
    format!("{}{}", DOCUMENT_PREFIX, id)
}

/// Drop duplicate ids and make sure the default profile exists and is active.
fn normalize(items: Vec<ProfileItem>) -> Vec<ProfileItem> {
    let mut out: Vec<ProfileItem> = Vec::with_capacity(items.len() + 1);
    for item in items {
        if out.iter().any(|seen| seen.id == item.id) {
            tracing::warn!(id = %item.id, "Dropping duplicate profile id");
            continue;
        }
        out.push(item);
    }

    match out.iter_mut().find(|item| item.is_default()) {
        Some(default) => default.active = true,
        None => {
            tracing::warn!("Default profile missing, restoring it");
            out.insert(0, ProfileItem::default_item());
        }
    }
    out
}

/// Timestamp-derived id, bumped until no item and no leftover document uses it.
fn fresh_id(items: &[ProfileItem], documents: &[String]) -> String {
    let mut candidate = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    loop {
        let id = candidate.to_string();
        if !items.iter().any(|item| item.id == id) && !documents.contains(&id) {
            return id;
        }
        candidate += 1;
    }
}
