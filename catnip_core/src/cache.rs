use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Identifies one cache slot. The same logical request must always land in the
/// same slot, so equality is structural and exhaustive over the known request
/// shapes rather than an ad-hoc string tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Paginated pool of random images.
    RandomImages,
    /// Paginated pool filtered by breeds, keyed by the joined id list.
    RandomBreedImages { breed_ids: String },
    /// The full breeds list.
    Breeds,
    /// A single image by id.
    Image { image_id: String },
    /// One-shot random listing of the given size.
    Images { limit: u32 },
    /// One-shot breed-filtered listing of the given size.
    BreedImages { breed_ids: String, limit: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Fetching,
    Resolved,
    Errored,
}

#[derive(Debug)]
struct Slot {
    state: QueryState,
    data: Option<Value>,
    fetched_at: Option<Instant>,
    stale_after: Duration,
    error: Option<String>,
    /// Bumped every time a fetch completes, successfully or not. A requester
    /// that queued behind the fetch lock compares generations to tell whether
    /// someone else finished a fetch while it waited.
    generation: u64,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: QueryState::Idle,
            data: None,
            fetched_at: None,
            stale_after: Duration::ZERO,
            error: None,
            generation: 0,
        }
    }

    fn is_fresh(&self) -> bool {
        match (self.state, self.fetched_at) {
            (QueryState::Resolved, Some(fetched_at)) => fetched_at.elapsed() < self.stale_after,
            _ => false,
        }
    }

    fn resolve(&mut self, data: Value, stale_after: Duration) {
        self.state = QueryState::Resolved;
        self.data = Some(data);
        self.fetched_at = Some(Instant::now());
        self.stale_after = stale_after;
        self.error = None;
        self.generation += 1;
    }

    // Keeps any previous data, so a failed "load more" doesn't wipe the pages
    // already on screen.
    fn fail(&mut self, message: String) {
        self.state = QueryState::Errored;
        self.error = Some(message);
        self.generation += 1;
    }
}

#[derive(Debug)]
struct Entry {
    /// Serializes fetches for this key. Held across the network call, so at
    /// most one request per key is ever outstanding.
    fetch_lock: tokio::sync::Mutex<()>,
    slot: Mutex<Slot>,
}

impl Entry {
    fn new() -> Self {
        Self {
            fetch_lock: tokio::sync::Mutex::new(()),
            slot: Mutex::new(Slot::new()),
        }
    }
}

/// Keyed cache for remote query results.
///
/// Constructed once at process start and shared by `Arc`, never as ambient
/// global state, so every test can run against a fresh instance. Entries are
/// created on first request for a key and live until the process exits; the
/// only refresh mechanism is the staleness window.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<CacheKey, Arc<Entry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a single-shot query. Fresh cached data is returned without a
    /// network call. Otherwise the per-key fetch lock is taken and `fetch`
    /// runs; requesters that queued behind an in-flight fetch adopt its
    /// outcome, data or error, instead of issuing a duplicate call.
    ///
    /// A failed fetch leaves the slot `Errored` with the error text retained.
    /// The cache never retries on its own; the next `request` for the key
    /// starts over.
    pub async fn request<T, F, Fut>(&self, key: &CacheKey, stale_after: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let entry = self.entry(key);

        let generation = {
            let slot = entry.slot.lock().unwrap();
            if slot.is_fresh() {
                tracing::debug!("Cache hit for {:?}", key);
                return decode(slot.data.as_ref());
            }
            slot.generation
        };

        let _guard = entry.fetch_lock.lock().await;

        {
            let slot = entry.slot.lock().unwrap();
            if slot.generation != generation {
                // Someone else fetched while we queued; share their outcome.
                return match slot.state {
                    QueryState::Resolved => decode(slot.data.as_ref()),
                    _ => Err(Error::FetchFailed(slot.error.clone().unwrap_or_default())),
                };
            }
        }

        entry.slot.lock().unwrap().state = QueryState::Fetching;
        tracing::debug!("Cache miss for {:?}, fetching", key);

        match fetch().await {
            Ok(value) => {
                let data = serde_json::to_value(&value)?;
                entry.slot.lock().unwrap().resolve(data, stale_after);
                Ok(value)
            }
            Err(error) => {
                entry.slot.lock().unwrap().fail(error.to_string());
                Err(error)
            }
        }
    }

    /// Write a value through to a slot without fetching, e.g. an image object
    /// already known from a listing response.
    pub fn seed<T: Serialize>(&self, key: &CacheKey, value: &T, stale_after: Duration) -> Result<()> {
        let entry = self.entry(key);
        let data = serde_json::to_value(value)?;
        entry.slot.lock().unwrap().resolve(data, stale_after);
        tracing::debug!("Seeded cache for {:?}", key);
        Ok(())
    }

    /// Resident data for a key regardless of staleness, or `None` if the slot
    /// is empty or holds something else. This is the "is data already there"
    /// predicate used to disable a query altogether.
    pub fn get_cached<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        let data = entry.slot.lock().unwrap().data.clone()?;
        serde_json::from_value(data).ok()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map_or(false, |entry| entry.slot.lock().unwrap().data.is_some())
    }

    pub fn state(&self, key: &CacheKey) -> QueryState {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map_or(QueryState::Idle, |entry| entry.slot.lock().unwrap().state)
    }

    pub fn error(&self, key: &CacheKey) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|entry| entry.slot.lock().unwrap().error.clone())
    }

    /// Pages fetched so far for a paginated key, oldest first.
    pub fn pages<T: DeserializeOwned>(&self, key: &CacheKey) -> Vec<Vec<T>> {
        self.get_cached(key).unwrap_or_default()
    }

    /// Fetch the next page for a paginated key and append it to the slot.
    ///
    /// The page number passed to `fetch_page` is 1-based and derived from the
    /// pages already resident, and the per-key fetch lock is held throughout,
    /// so page N+1 can only ever be requested after page N has resolved.
    pub async fn fetch_next_page<T, F, Fut>(&self, key: &CacheKey, fetch_page: F) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let entry = self.entry(key);
        let _guard = entry.fetch_lock.lock().await;

        let mut pages: Vec<Vec<Value>> = {
            let slot = entry.slot.lock().unwrap();
            match slot.data.clone() {
                Some(data) => serde_json::from_value(data)?,
                None => Vec::new(),
            }
        };
        let page_number = pages.len() as u32 + 1;

        entry.slot.lock().unwrap().state = QueryState::Fetching;
        tracing::debug!("Fetching page {} for {:?}", page_number, key);

        match fetch_page(page_number).await {
            Ok(page) => {
                let encoded = page
                    .iter()
                    .map(serde_json::to_value)
                    .collect::<std::result::Result<Vec<Value>, _>>()?;
                pages.push(encoded);
                // Paginated slots are session-resident, never staleness-refetched.
                entry.slot.lock().unwrap().resolve(serde_json::to_value(&pages)?, Duration::MAX);
                Ok(page)
            }
            Err(error) => {
                entry.slot.lock().unwrap().fail(error.to_string());
                Err(error)
            }
        }
    }

    fn entry(&self, key: &CacheKey) -> Arc<Entry> {
        let mut entries = self.entries.lock().unwrap();
        entries.entry(key.clone()).or_insert_with(|| Arc::new(Entry::new())).clone()
    }
}

fn decode<T: DeserializeOwned>(data: Option<&Value>) -> Result<T> {
    let value = data.cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}
