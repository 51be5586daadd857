//! Thread-Safe Cache Store with Lazy Expiry
//!
//! This module implements the core storage engine for flashcache.
//! It maps keys to values that carry an absolute expiry instant, and decides
//! liveness only when a key is read.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: Instead of one big lock, we use multiple shards to reduce contention.
//! 2. **Lazy Expiry**: An expired entry is removed by the `get` that observes it.
//! 3. **RwLock**: Multiple concurrent readers with exclusive writers.
//! 4. **Every entry expires**: the text protocol always carries a TTL, so there is
//!    no "persistent" entry. A TTL of zero or less is stored already expired.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are distributed across shards using a hash function. The
//! check-expiry-then-delete sequence of `get` is re-validated under the
//! shard's write lock, so it is atomic with respect to every other
//! operation on the same key.

use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Number of shards for the storage engine.
/// More shards = less lock contention, but more memory overhead.
const NUM_SHARDS: usize = 64;

/// Upper bound applied to positive TTLs (100 years).
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Computes the absolute expiry for a TTL given in (possibly negative) seconds.
///
/// A TTL of zero or less yields an instant at or before `now`, which reads back
/// as expired. Negative values that would underflow the monotonic clock clamp
/// to `now`.
pub fn expiry_from_ttl(now: Instant, ttl_secs: i64) -> Instant {
    let magnitude = Duration::from_secs(ttl_secs.unsigned_abs());
    if ttl_secs > 0 {
        now + magnitude.min(MAX_TTL)
    } else {
        now.checked_sub(magnitude).unwrap_or(now)
    }
}

/// Represents a stored value with its expiry time.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// When this entry stops being live
    pub expires_at: Instant,
}

impl Entry {
    /// Creates a new entry expiring at `expires_at`.
    pub fn new(value: Bytes, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    /// An entry is live only while its expiry is strictly after `now`.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A single shard containing a portion of the key-value pairs.
#[derive(Debug, Default)]
struct Shard {
    data: RwLock<HashMap<Bytes, Entry>>,
}

impl Shard {
    // Entries are plain data and every write is a single map call, so a
    // panicking holder cannot leave a half-written entry behind.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Bytes, Entry>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Bytes, Entry>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Point-in-time snapshot of the engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Resident keys, including expired entries nobody has read yet
    pub keys: u64,
    pub get_ops: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub set_ops: u64,
    /// Entries removed because they were found expired
    pub expired: u64,
}

/// The cache store shared by every connection.
///
/// This struct is designed to be wrapped in an `Arc` and shared across
/// all client handler tasks. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use flashcache::storage::StorageEngine;
/// use bytes::Bytes;
///
/// let engine = StorageEngine::new();
///
/// engine.set(Bytes::from("name"), Bytes::from("Ariz"), 60);
/// assert_eq!(engine.get(b"name"), Some(Bytes::from("Ariz")));
///
/// // Zero or negative TTLs are stored already expired
/// engine.set(Bytes::from("gone"), Bytes::from("soon"), 0);
/// assert_eq!(engine.get(b"gone"), None);
/// ```
pub struct StorageEngine {
    shards: Vec<Shard>,

    /// Number of resident entries
    key_count: AtomicU64,

    get_count: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    set_count: AtomicU64,

    /// Number of expired entries removed (lazily or by the sweeper)
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("key_count", &self.key_count.load(Ordering::Relaxed))
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates an empty storage engine.
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Shard::default()).collect();

        Self {
            shards,
            key_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }

    #[inline]
    fn get_shard(&self, key: &[u8]) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Stores `value` under `key` for `ttl_secs` seconds.
    ///
    /// This is an unconditional upsert: an existing entry has both its value
    /// and its expiry replaced. A TTL of zero or less stores an entry that is
    /// already expired, so the next `get` evicts it and reports a miss.
    pub fn set(&self, key: Bytes, value: Bytes, ttl_secs: i64) {
        let expires_at = expiry_from_ttl(Instant::now(), ttl_secs);
        self.insert(key, Entry::new(value, expires_at));
    }

    /// Stores `value` under `key` for a positive duration.
    pub fn set_with_ttl(&self, key: Bytes, value: Bytes, ttl: Duration) {
        let expires_at = Instant::now() + ttl.min(MAX_TTL);
        self.insert(key, Entry::new(value, expires_at));
    }

    fn insert(&self, key: Bytes, entry: Entry) {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let mut data = self.get_shard(&key).write();
        if data.insert(key, entry).is_none() {
            self.key_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired. An expired
    /// entry is removed as a side effect.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.get_at(key, Instant::now())
    }

    /// Gets the value for a key as observed at `now`.
    pub fn get_at(&self, key: &[u8], now: Instant) -> Option<Bytes> {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        let shard = self.get_shard(key);

        // Fast path: a read lock is enough for hits and plain misses
        {
            let data = shard.read();
            match data.get(key) {
                Some(entry) if !entry.is_expired_at(now) => {
                    self.hit_count.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    self.miss_count.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Expired: re-check under the write lock, another task may have
        // replaced or already evicted the entry in between.
        let mut data = shard.write();
        let value = match data.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                data.remove(key);
                self.key_count.fetch_sub(1, Ordering::Relaxed);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        };
        drop(data);

        match value {
            Some(_) => self.hit_count.fetch_add(1, Ordering::Relaxed),
            None => self.miss_count.fetch_add(1, Ordering::Relaxed),
        };
        value
    }

    /// Returns true if an entry for `key` is resident, live or not.
    ///
    /// Unlike `get`, this never evicts.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get_shard(key).read().contains_key(key)
    }

    /// Removes every expired entry. Returns the number removed.
    ///
    /// Only the background sweeper calls this; the request path relies on
    /// lazy expiry alone.
    pub fn cleanup_expired(&self) -> u64 {
        self.cleanup_expired_at(Instant::now())
    }

    /// Removes every entry expired as of `now`.
    pub fn cleanup_expired_at(&self, now: Instant) -> u64 {
        let mut cleaned = 0u64;

        for shard in &self.shards {
            let mut data = shard.write();
            let before = data.len();
            data.retain(|_, entry| !entry.is_expired_at(now));
            cleaned += (before - data.len()) as u64;
        }

        if cleaned > 0 {
            self.key_count.fetch_sub(cleaned, Ordering::Relaxed);
            self.expired_count.fetch_add(cleaned, Ordering::Relaxed);
        }

        cleaned
    }

    /// Returns the number of resident entries, expired-but-unread included.
    pub fn len(&self) -> u64 {
        self.key_count.load(Ordering::Relaxed)
    }

    /// Returns true if no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the engine counters.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.key_count.load(Ordering::Relaxed),
            get_ops: self.get_count.load(Ordering::Relaxed),
            get_hits: self.hit_count.load(Ordering::Relaxed),
            get_misses: self.miss_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    impl StorageEngine {
        /// Counts entries by walking every shard.
        fn resident_entries(&self) -> u64 {
            self.shards.iter().map(|s| s.read().len() as u64).sum()
        }
    }

    #[test]
    fn test_set_and_get() {
        let engine = StorageEngine::new();

        engine.set(Bytes::from("key1"), Bytes::from("value1"), 10);
        assert_eq!(engine.get(b"key1"), Some(Bytes::from("value1")));
    }

    #[test]
    fn test_entry_expires_at_its_deadline() {
        let now = Instant::now();
        let entry = Entry::new(Bytes::from("v"), now + Duration::from_secs(1));

        assert!(!entry.is_expired_at(now));
        assert!(entry.is_expired_at(now + Duration::from_secs(1)));
        assert!(entry.is_expired_at(now + Duration::from_secs(2)));
    }

    #[test]
    fn test_get_nonexistent() {
        let engine = StorageEngine::new();
        assert_eq!(engine.get(b"nonexistent"), None);
        assert_eq!(engine.stats().get_misses, 1);
    }

    #[test]
    fn test_negative_ttl_is_stored_expired() {
        let engine = StorageEngine::new();

        engine.set(Bytes::from("key1"), Bytes::from("value1"), -10);
        assert!(engine.contains_key(b"key1"));
        assert_eq!(engine.len(), 1);

        assert_eq!(engine.get(b"key1"), None);
        assert!(!engine.contains_key(b"key1"));
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn test_zero_ttl_is_stored_expired() {
        let engine = StorageEngine::new();

        engine.set(Bytes::from("key"), Bytes::from("value"), 0);
        assert_eq!(engine.get(b"key"), None);
        assert_eq!(engine.stats().expired, 1);
    }

    #[test]
    fn test_overwrite_replaces_value_and_expiry() {
        let engine = StorageEngine::new();

        engine.set(Bytes::from("key"), Bytes::from("old"), -1);
        engine.set(Bytes::from("key"), Bytes::from("new"), 60);

        assert_eq!(engine.len(), 1);
        assert_eq!(engine.get(b"key"), Some(Bytes::from("new")));

        engine.set(Bytes::from("key"), Bytes::from("newer"), -1);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.get(b"key"), None);
    }

    #[test]
    fn test_expired_entry_stays_until_read() {
        let engine = StorageEngine::new();

        engine.set_with_ttl(
            Bytes::from("key"),
            Bytes::from("value"),
            Duration::from_millis(20),
        );
        thread::sleep(Duration::from_millis(50));

        // Nothing reclaims it until somebody looks
        assert!(engine.contains_key(b"key"));
        assert_eq!(engine.get(b"key"), None);
        assert!(!engine.contains_key(b"key"));
    }

    #[test]
    fn test_simulated_elapse() {
        let engine = StorageEngine::new();
        let start = Instant::now();

        engine.set(Bytes::from("key"), Bytes::from("value"), 10);

        let before = start + Duration::from_secs(9);
        assert_eq!(engine.get_at(b"key", before), Some(Bytes::from("value")));

        let after = start + Duration::from_secs(11);
        assert_eq!(engine.get_at(b"key", after), None);
        assert!(!engine.contains_key(b"key"));
    }

    #[test]
    fn test_expiry_from_ttl_clamps() {
        let now = Instant::now();

        assert_eq!(expiry_from_ttl(now, 0), now);
        assert_eq!(expiry_from_ttl(now, 5), now + Duration::from_secs(5));
        assert_eq!(expiry_from_ttl(now, i64::MAX), now + MAX_TTL);
        assert!(expiry_from_ttl(now, i64::MIN) <= now);
    }

    #[test]
    fn test_cleanup_expired() {
        let engine = StorageEngine::new();

        engine.set(Bytes::from("key1"), Bytes::from("value1"), -1);
        engine.set(Bytes::from("key2"), Bytes::from("value2"), -1);
        engine.set(Bytes::from("key3"), Bytes::from("value3"), 60);

        assert_eq!(engine.cleanup_expired(), 2);
        assert_eq!(engine.len(), 1);
        assert!(engine.contains_key(b"key3"));
        assert_eq!(engine.stats().expired, 2);
    }

    #[test]
    fn test_stats() {
        let engine = StorageEngine::new();

        engine.set(Bytes::from("a"), Bytes::from("1"), 60);
        engine.get(b"a");
        engine.get(b"b");

        let stats = engine.stats();
        assert_eq!(stats.keys, 1);
        assert_eq!(stats.set_ops, 1);
        assert_eq!(stats.get_ops, 2);
        assert_eq!(stats.get_hits, 1);
        assert_eq!(stats.get_misses, 1);
    }

    #[test]
    fn test_concurrent_access() {
        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        // Spawn multiple writers
        for i in 0..10 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    engine.set(Bytes::from(key.clone()), Bytes::from("value"), 60);
                    engine.get(key.as_bytes());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 1000);
    }

    #[test]
    fn test_concurrent_same_key_stress() {
        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        // Writers flip a handful of hot keys between live and expired while
        // readers race the lazy eviction path.
        for i in 0..16 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                for j in 0..2_000 {
                    let key = format!("hot-{}", j % 4);
                    if (i + j) % 3 == 0 {
                        let ttl = if j % 2 == 0 { -1 } else { 60 };
                        engine.set(Bytes::from(key), Bytes::from(format!("v{}", i)), ttl);
                    } else if let Some(value) = engine.get(key.as_bytes()) {
                        assert!(value.starts_with(b"v"));
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(engine.len() <= 4);
        assert_eq!(engine.len(), engine.resident_entries());

        let stats = engine.stats();
        assert_eq!(stats.get_ops, stats.get_hits + stats.get_misses);
    }

    proptest! {
        #[test]
        fn prop_live_ttl_reads_back(
            key in "[a-zA-Z0-9_:]{1,32}",
            value in "[a-zA-Z0-9_]{1,64}",
            ttl in 1i64..1_000_000,
        ) {
            let engine = StorageEngine::new();
            engine.set(Bytes::from(key.clone()), Bytes::from(value.clone()), ttl);
            prop_assert_eq!(engine.get(key.as_bytes()), Some(Bytes::from(value)));
        }

        #[test]
        fn prop_non_positive_ttl_reads_absent(
            key in "[a-zA-Z0-9_:]{1,32}",
            value in "[a-zA-Z0-9_]{1,64}",
            ttl in i64::MIN..=0,
        ) {
            let engine = StorageEngine::new();
            engine.set(Bytes::from(key.clone()), Bytes::from(value), ttl);
            prop_assert_eq!(engine.get(key.as_bytes()), None);
            prop_assert!(!engine.contains_key(key.as_bytes()));
        }

        #[test]
        fn prop_elapsed_ttl_evicts(
            key in "[a-zA-Z0-9_:]{1,32}",
            ttl in 1i64..100_000,
            extra in 0u64..1_000,
        ) {
            let engine = StorageEngine::new();
            engine.set(Bytes::from(key.clone()), Bytes::from("v"), ttl);
            let stored = Instant::now();

            let later = stored + Duration::from_secs(ttl as u64 + extra);
            prop_assert_eq!(engine.get_at(key.as_bytes(), later), None);
            prop_assert!(!engine.contains_key(key.as_bytes()));
            prop_assert_eq!(engine.len(), 0);
        }
    }
}
