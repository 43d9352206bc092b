use crate::services::github::FetchError;
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
    fn clear(&self);
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).remove(key);
    }

    fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

pub mod cache_key {
    use chrono::NaiveDate;

    pub fn repos(username: &str) -> String {
        format!("repos:{}", username)
    }

    pub fn orgs(username: &str) -> String {
        format!("orgs:{}", username)
    }

    pub fn contributions(username: &str, year: i32, through: NaiveDate) -> String {
        format!("contributions:{}:{}:{}", username, year, through)
    }

    pub fn readme(full_name: &str) -> String {
        format!("readme:{}", full_name)
    }

    pub fn languages(full_name: &str) -> String {
        format!("languages:{}", full_name)
    }

    pub fn contributors(full_name: &str) -> String {
        format!("contributors:{}", full_name)
    }
}

pub struct SessionCache {
    store: Arc<dyn SessionStore>,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.store.remove(key);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.store.set(key, json),
            Err(e) => warn!("Not caching {}: {}", key, e),
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.store.remove(key);
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, producer: F) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        if let Some(value) = self.get(key) {
            debug!("cache hit {}", key);
            return Ok(value);
        }

        let flight = self.flight(key);
        let _guard = flight.lock.lock().await;

        // someone else may have filled it while we waited
        if let Some(value) = self.get(key) {
            debug!("cache hit {} after wait", key);
            return Ok(value);
        }

        debug!("cache miss {}", key);
        let value = producer().await?;
        self.set(key, &value);
        Ok(value)
    }

    fn flight<'a>(&'a self, key: &'a str) -> Flight<'a> {
        let lock = self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .clone();
        Flight { cache: self, key, lock }
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

struct Flight<'a> {
    cache: &'a SessionCache,
    key: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut inflight = self.cache.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        // clones are only taken under this lock: one for the map, one for us
        let last = inflight.get(self.key).is_some_and(|lock| Arc::ptr_eq(lock, &self.lock))
            && Arc::strong_count(&self.lock) <= 2;
        if last {
            inflight.remove(self.key);
        }
    }
}
