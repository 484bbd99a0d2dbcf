//! TTL-bounded in-memory caches for tag accounts and the blacklist
//!
//! Entries expire lazily: an expired entry is evicted on the read that
//! observes it. `insert` resets the deadline, in-place modification
//! does not.

use dashmap::DashMap;
use tokio::time::{Duration, Instant};
use toll_model::{BlacklistEntry, TagAccount, TagId};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Generic string-keyed cache with per-cache TTL
pub struct TtlCache<V> {
    entries: DashMap<String, Entry<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache whose entries live for `ttl` after insertion
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Insert or replace, resetting the entry's deadline
    pub fn insert(&self, key: String, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Fetch a live entry, evicting it if expired
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove(key);
        None
    }

    /// Mutate a live entry in place, keeping its deadline.
    /// Returns `false` when the entry is absent or expired.
    pub fn modify(&self, key: &str, f: impl FnOnce(&mut V)) -> bool {
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.expires_at > Instant::now() => {
                f(&mut entry.value);
                true
            }
            _ => false,
        }
    }

    /// Drop an entry
    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Live keys (expired entries excluded, not evicted)
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|e| e.expires_at > now)
            .map(|e| e.key().clone())
            .collect()
    }
}

/// Tag account cache (`TAG:<tagId>` entries)
pub struct TagCache {
    inner: TtlCache<TagAccount>,
}

impl TagCache {
    /// Create with the account TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: TtlCache::new(ttl),
        }
    }

    fn key(tag_id: &TagId) -> String {
        format!("TAG:{}", tag_id)
    }

    /// Cached account for a tag, if live
    pub fn get(&self, tag_id: &TagId) -> Option<TagAccount> {
        self.inner.get(&Self::key(tag_id))
    }

    /// Cache an account, resetting its TTL
    pub fn put(&self, account: TagAccount) {
        self.inner.insert(Self::key(&account.tag_id), account);
    }

    /// Mutate a cached account in place (balance, trip context).
    /// Returns `false` when the account is no longer cached.
    pub fn modify(&self, tag_id: &TagId, f: impl FnOnce(&mut TagAccount)) -> bool {
        self.inner.modify(&Self::key(tag_id), f)
    }

    /// Evict a tag
    pub fn remove(&self, tag_id: &TagId) {
        self.inner.remove(&Self::key(tag_id));
    }

    /// Tags currently cached
    pub fn cached_tags(&self) -> Vec<TagId> {
        self.inner
            .keys()
            .into_iter()
            .filter_map(|k| k.strip_prefix("TAG:").map(TagId::new))
            .collect()
    }
}

/// Blacklist cache (`BLACKLIST:<tagId>` entries, TTL-bounded so a block
/// ages out on its own)
pub struct BlacklistCache {
    inner: TtlCache<BlacklistEntry>,
}

impl BlacklistCache {
    /// Create with the blacklist TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: TtlCache::new(ttl),
        }
    }

    fn key(tag_id: &TagId) -> String {
        format!("BLACKLIST:{}", tag_id)
    }

    /// Whether the tag has a live blacklist entry
    pub fn is_blacklisted(&self, tag_id: &TagId) -> bool {
        self.inner.get(&Self::key(tag_id)).is_some()
    }

    /// Blacklist entry for a tag, if live
    pub fn get(&self, tag_id: &TagId) -> Option<BlacklistEntry> {
        self.inner.get(&Self::key(tag_id))
    }

    /// Block a tag
    pub fn add(&self, tag_id: TagId, reason: impl Into<String>) {
        let entry = BlacklistEntry {
            tag_id: tag_id.clone(),
            reason: reason.into(),
            timestamp: chrono::Utc::now(),
        };
        self.inner.insert(Self::key(&tag_id), entry);
    }

    /// Unblock a tag (manual collection clears the block immediately,
    /// ahead of TTL expiry)
    pub fn remove(&self, tag_id: &TagId) {
        self.inner.remove(&Self::key(tag_id));
    }
}
