// ABOUTME: Result cache for generated decks, keyed by the request brief
// ABOUTME: Provides an in-process store and a Redis-backed store behind one trait

use crate::deck::{Deck, DeckRequest};
use crate::errors::{DeckError, Result};
use log::{info, warn};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Prefix for keys written to the shared store, so unrelated keys in the
/// same database are never touched by [`DeckCache::clear`].
const REDIS_KEY_PREFIX: &str = "deck:";

/// Derives the cache key for a request. The key is the SHA-256 digest of
/// the four brief fields joined with '|', rendered as lowercase hex, so
/// equal briefs always map to the same entry regardless of backend.
pub fn cache_key(request: &DeckRequest) -> String {
    let raw = format!(
        "{}|{}|{}|{}",
        request.topic, request.audience, request.tone, request.slide_count
    );
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A store for finished decks. The cache is the one resource shared across
/// concurrent generation calls, so implementations must be safe to share.
///
/// Lookups and writes never fail loudly: a backend that cannot be reached
/// reports a miss on read and drops the write, and generation proceeds
/// without it.
pub trait DeckCache: Send + Sync {
    /// Returns the cached deck for this request, if a fresh entry exists.
    fn get(&self, request: &DeckRequest) -> Option<Deck>;

    /// Stores a deck for this request, replacing any previous entry.
    fn set(&self, request: &DeckRequest, deck: &Deck);

    /// Removes every cached deck.
    fn clear(&self);
}

/// In-process cache with a fixed time-to-live. Entries are evicted lazily:
/// an expired entry is dropped when a lookup touches it.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Deck, Instant)>>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        MemoryCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of entries currently held, including any not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DeckCache for MemoryCache {
    fn get(&self, request: &DeckRequest) -> Option<Deck> {
        let key = cache_key(request);
        let mut entries = self.entries.lock();

        let mut expired = false;
        if let Some((deck, inserted_at)) = entries.get(&key) {
            if inserted_at.elapsed() < self.ttl {
                info!("Cache hit for key {}...", &key[..8]);
                return Some(deck.clone());
            }
            expired = true;
        }

        if expired {
            entries.remove(&key);
            info!("Cache entry expired for key {}...", &key[..8]);
        } else {
            info!("Cache miss for key {}...", &key[..8]);
        }
        None
    }

    fn set(&self, request: &DeckRequest, deck: &Deck) {
        let key = cache_key(request);
        self.entries
            .lock()
            .insert(key.clone(), (deck.clone(), Instant::now()));
        info!("Cached deck for key {}... (ttl {}s)", &key[..8], self.ttl.as_secs());
    }

    fn clear(&self) {
        self.entries.lock().clear();
        info!("Cache cleared");
    }
}

/// Cache backed by a shared Redis store, for deployments where several
/// processes should see the same entries. Decks are stored as JSON strings
/// under prefixed keys, with expiry delegated to the server via SETEX.
#[derive(Debug)]
pub struct RedisCache {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisCache {
    /// Creates a cache against the given Redis URL. The URL is validated
    /// here, but no connection is opened until the first operation.
    pub fn new(url: &str, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| DeckError::ConfigError(format!("Invalid Redis URL {}: {}", url, e)))?;
        Ok(RedisCache {
            client,
            ttl_secs: ttl.as_secs().max(1),
        })
    }

    fn store_key(request: &DeckRequest) -> String {
        format!("{}{}", REDIS_KEY_PREFIX, cache_key(request))
    }
}

impl DeckCache for RedisCache {
    fn get(&self, request: &DeckRequest) -> Option<Deck> {
        let key = Self::store_key(request);

        let payload: Option<String> = match self
            .client
            .get_connection()
            .and_then(|mut con| redis::cmd("GET").arg(&key).query(&mut con))
        {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Redis get failed for key {}...: {}", &key[..17], e);
                return None;
            }
        };

        let payload = match payload {
            Some(payload) => payload,
            None => {
                info!("Cache miss for key {}...", &key[..17]);
                return None;
            }
        };

        match serde_json::from_str::<Deck>(&payload) {
            Ok(deck) => {
                info!("Cache hit for key {}...", &key[..17]);
                Some(deck)
            }
            Err(e) => {
                warn!("Discarding unreadable cache entry for key {}...: {}", &key[..17], e);
                None
            }
        }
    }

    fn set(&self, request: &DeckRequest, deck: &Deck) {
        let key = Self::store_key(request);

        let payload = match serde_json::to_string(deck) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not serialize deck for key {}...: {}", &key[..17], e);
                return;
            }
        };

        match self.client.get_connection().and_then(|mut con| {
            redis::cmd("SETEX")
                .arg(&key)
                .arg(self.ttl_secs)
                .arg(payload)
                .query::<()>(&mut con)
        }) {
            Ok(()) => info!("Cached deck for key {}... (ttl {}s)", &key[..17], self.ttl_secs),
            Err(e) => warn!("Redis set failed for key {}...: {}", &key[..17], e),
        }
    }

    fn clear(&self) {
        let mut con = match self.client.get_connection() {
            Ok(con) => con,
            Err(e) => {
                warn!("Redis clear failed: {}", e);
                return;
            }
        };

        let mut scan = redis::cmd("SCAN");
        scan.cursor_arg(0)
            .arg("MATCH")
            .arg(format!("{}*", REDIS_KEY_PREFIX));

        let keys: Vec<String> = match scan.iter(&mut con) {
            Ok(iter) => iter.collect(),
            Err(e) => {
                warn!("Redis scan failed: {}", e);
                return;
            }
        };

        for key in &keys {
            if let Err(e) = redis::cmd("DEL").arg(key).query::<()>(&mut con) {
                warn!("Redis delete failed for key {}: {}", key, e);
            }
        }
        info!("Cache cleared ({} keys removed)", keys.len());
    }
}
