//! Test doubles shared by the service integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tessera_cache::{CachePolicy, SettingsService};
use tessera_core::{
    DistributedCache, DistributedCacheError, Setting, SettingType, SettingsFilter, SettingsStore,
    StoreError,
};
use tessera_db_memory::InMemorySettingsStore;

pub fn setting(
    key: &str,
    value: &str,
    setting_type: SettingType,
    category: &str,
    is_public: bool,
) -> Setting {
    let now = Utc::now();
    Setting {
        key: key.to_string(),
        value: value.to_string(),
        setting_type,
        category: category.to_string(),
        is_public,
        description: None,
        updated_by: None,
        created_at: now,
        updated_at: now,
    }
}

/// A small catalogue spanning three categories.
pub fn seed_settings() -> Vec<Setting> {
    vec![
        setting("max_bet_amount", "10000", SettingType::Number, "betting", true),
        setting("min_bet_amount", "1", SettingType::Number, "betting", true),
        setting("site_name", "Acme", SettingType::String, "general", true),
        setting("maintenance_mode", "false", SettingType::Boolean, "general", true),
        setting("live_chat_enabled", "false", SettingType::Boolean, "features", true),
        setting("max_daily_deposit", "5000", SettingType::Number, "payments", false),
    ]
}

// ==================== Store doubles ====================

/// In-memory store that counts calls and records `find_all` filters.
///
/// Can be switched to fail `find_all` or to report zero affected rows on
/// `update` while still applying nothing.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemorySettingsStore,
    pub find_by_key_calls: AtomicUsize,
    pub find_all_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    filters: Mutex<Vec<SettingsFilter>>,
    fail_find_all: AtomicBool,
    zero_row_updates: AtomicBool,
}

impl CountingStore {
    pub fn seeded() -> Arc<Self> {
        let store = Self::default();
        store.inner.seed(seed_settings());
        Arc::new(store)
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inner(&self) -> &InMemorySettingsStore {
        &self.inner
    }

    pub fn find_by_key_count(&self) -> usize {
        self.find_by_key_calls.load(Ordering::SeqCst)
    }

    pub fn find_all_count(&self) -> usize {
        self.find_all_calls.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn filters(&self) -> Vec<SettingsFilter> {
        self.filters.lock().unwrap().clone()
    }

    /// Make every later `find_all` fail.
    pub fn fail_find_all(&self) {
        self.fail_find_all.store(true, Ordering::SeqCst);
    }

    /// Make every later `update` match no rows, as if the row vanished
    /// between lookup and write.
    pub fn match_no_rows_on_update(&self) {
        self.zero_row_updates.store(true, Ordering::SeqCst);
    }

    pub fn reset_counts(&self) {
        self.find_by_key_calls.store(0, Ordering::SeqCst);
        self.find_all_calls.store(0, Ordering::SeqCst);
        self.update_calls.store(0, Ordering::SeqCst);
        self.filters.lock().unwrap().clear();
    }
}

#[async_trait]
impl SettingsStore for CountingStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<Setting>, StoreError> {
        self.find_by_key_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_key(key).await
    }

    async fn find_all(&self, filter: &SettingsFilter) -> Result<Vec<Setting>, StoreError> {
        self.find_all_calls.fetch_add(1, Ordering::SeqCst);
        self.filters.lock().unwrap().push(filter.clone());
        if self.fail_find_all.load(Ordering::SeqCst) {
            return Err(StoreError::database("statement timeout"));
        }
        self.inner.find_all(filter).await
    }

    async fn update(
        &self,
        key: &str,
        value: &str,
        updated_by: Option<&str>,
    ) -> Result<u64, StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.zero_row_updates.load(Ordering::SeqCst) {
            return Ok(0);
        }
        self.inner.update(key, value, updated_by).await
    }

    async fn create(&self, setting: &Setting) -> Result<Setting, StoreError> {
        self.inner.create(setting).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.delete(key).await
    }
}

/// A store whose every call fails.
pub struct FailingStore;

#[async_trait]
impl SettingsStore for FailingStore {
    async fn find_by_key(&self, _key: &str) -> Result<Option<Setting>, StoreError> {
        Err(StoreError::database("connection refused"))
    }

    async fn find_all(&self, _filter: &SettingsFilter) -> Result<Vec<Setting>, StoreError> {
        Err(StoreError::database("connection refused"))
    }

    async fn update(
        &self,
        _key: &str,
        _value: &str,
        _updated_by: Option<&str>,
    ) -> Result<u64, StoreError> {
        Err(StoreError::database("connection refused"))
    }

    async fn create(&self, _setting: &Setting) -> Result<Setting, StoreError> {
        Err(StoreError::database("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::database("connection refused"))
    }
}

// ==================== Distributed tier doubles ====================

/// In-memory distributed tier recording every write and delete.
#[derive(Default)]
pub struct RecordingCache {
    entries: Mutex<HashMap<String, String>>,
    sets: Mutex<Vec<(String, Duration)>>,
    deletes: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, key: &str, payload: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), payload.to_string());
    }

    pub fn payload(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// TTL of the most recent write to `key`.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.sets
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, ttl)| *ttl)
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl DistributedCache for RecordingCache {
    fn name(&self) -> &str {
        "recording"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DistributedCacheError> {
        Ok(self.payload(key))
    }

    async fn set(
        &self,
        key: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), DistributedCacheError> {
        self.insert(key, payload);
        self.sets.lock().unwrap().push((key.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DistributedCacheError> {
        self.entries.lock().unwrap().remove(key);
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// A distributed tier whose every call fails.
pub struct FailingCache;

#[async_trait]
impl DistributedCache for FailingCache {
    fn name(&self) -> &str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, DistributedCacheError> {
        Err(DistributedCacheError::Connection("connection reset".into()))
    }

    async fn set(
        &self,
        _key: &str,
        _payload: &str,
        _ttl: Duration,
    ) -> Result<(), DistributedCacheError> {
        Err(DistributedCacheError::Timeout(250))
    }

    async fn delete(&self, _key: &str) -> Result<(), DistributedCacheError> {
        Err(DistributedCacheError::Command("READONLY".into()))
    }

    async fn is_available(&self) -> bool {
        false
    }
}

// ==================== Service construction ====================

pub fn service_with(
    store: Arc<CountingStore>,
    cache: Arc<RecordingCache>,
    policy: CachePolicy,
) -> SettingsService {
    SettingsService::builder(store)
        .distributed(cache)
        .policy(policy)
        .build()
}
