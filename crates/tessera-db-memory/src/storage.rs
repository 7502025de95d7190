use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tessera_core::{Setting, SettingsFilter, SettingsStore, StoreError};

/// In-memory settings store keyed by setting key.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    settings: DashMap<String, Setting>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `settings`.
    pub fn with_settings(settings: impl IntoIterator<Item = Setting>) -> Self {
        let store = Self::new();
        store.seed(settings);
        store
    }

    /// Inserts or replaces rows directly, bypassing conflict checks.
    pub fn seed(&self, settings: impl IntoIterator<Item = Setting>) {
        for setting in settings {
            self.settings.insert(setting.key.clone(), setting);
        }
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<Setting>, StoreError> {
        Ok(self.settings.get(key).map(|entry| entry.value().clone()))
    }

    async fn find_all(&self, filter: &SettingsFilter) -> Result<Vec<Setting>, StoreError> {
        let mut rows: Vec<Setting> = self
            .settings
            .iter()
            .filter(|entry| {
                let s = entry.value();
                filter.matches(&s.key, &s.category, s.is_public)
            })
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.key.cmp(&b.key)));
        Ok(rows)
    }

    async fn update(
        &self,
        key: &str,
        value: &str,
        updated_by: Option<&str>,
    ) -> Result<u64, StoreError> {
        match self.settings.get_mut(key) {
            Some(mut entry) => {
                let setting = entry.value_mut();
                setting.value = value.to_string();
                setting.updated_by = updated_by.map(String::from);
                setting.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn create(&self, setting: &Setting) -> Result<Setting, StoreError> {
        match self.settings.entry(setting.key.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict {
                key: setting.key.clone(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(setting.clone());
                Ok(setting.clone())
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.settings.remove(key).is_some())
    }
}
