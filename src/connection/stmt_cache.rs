//! Per-connection prepared-statement cache (spec §6 `statement_cache_capacity`).
//!
//! The teacher's `sqlx-core/src/cache.rs` caches every prepared statement with no eviction
//! (its own comment admits the cache can "live-leak memory"). This crate's
//! `statement_cache_capacity` option promises LRU eviction instead, so the shape here follows
//! the teacher's `StatementCache` naming but the eviction itself is grounded on the broader
//! pack's `sqlmodel-query/src/cache.rs`, which tracks a last-used `Instant` per entry and evicts
//! by scanning for the minimum — no `hashbrown`/`lru` dependency required.

use std::collections::HashMap;
use std::time::Instant;

use crate::statement::MySqlStatement;

struct CacheEntry {
    statement: MySqlStatement,
    last_used: Instant,
}

/// Caches prepared statements by their SQL text, keyed per connection.
///
/// A capacity of `0` disables caching: `get` never hits and `insert` is a no-op, so every
/// `execute` re-prepares (spec §6).
pub struct StatementCache {
    capacity: usize,
    entries: HashMap<Box<str>, CacheEntry>,
}

impl StatementCache {
    pub fn new(capacity: usize) -> Self {
        StatementCache {
            capacity,
            entries: HashMap::new(),
        }
    }

    /// Returns the cached handle for `sql`, refreshing its recency, or `None` on a cache miss.
    pub fn get(&mut self, sql: &str) -> Option<MySqlStatement> {
        let entry = self.entries.get_mut(sql)?;
        entry.last_used = Instant::now();
        Some(entry.statement.clone())
    }

    /// Inserts a freshly-prepared statement. If the cache is at capacity and `sql` isn't
    /// already present, evicts the least-recently-used entry first and returns its statement id
    /// so the caller can issue `close-statement` for it server-side.
    pub fn insert(&mut self, sql: Box<str>, statement: MySqlStatement) -> Option<u32> {
        if self.capacity == 0 {
            return None;
        }

        let evicted = if !self.entries.contains_key(&sql) && self.entries.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        self.entries.insert(
            sql,
            CacheEntry {
                statement,
                last_used: Instant::now(),
            },
        );
        evicted
    }

    fn evict_lru(&mut self) -> Option<u32> {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(sql, _)| sql.clone())?;
        self.entries.remove(&lru_key).map(|entry| entry.statement.id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached handle, e.g. after `reset-connection` invalidates them server-side
    /// (spec §4.9). Returns nothing: by the time this is called the server has already closed
    /// the statements, so there is nothing left to `close-statement` for.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn dummy_statement(id: u32) -> MySqlStatement {
        MySqlStatement::new(id, Arc::from("select 1"), Arc::from([]), Arc::from([]))
    }

    #[test]
    fn zero_capacity_never_caches() {
        let mut cache = StatementCache::new(0);
        assert_eq!(cache.insert("select 1".into(), dummy_statement(1)), None);
        assert!(cache.get("select 1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_least_recently_used_entry() {
        let mut cache = StatementCache::new(2);
        assert_eq!(cache.insert("a".into(), dummy_statement(1)), None);
        assert_eq!(cache.insert("b".into(), dummy_statement(2)), None);

        // Touch "a" so "b" becomes the least-recently-used entry.
        assert!(cache.get("a").is_some());

        let evicted = cache.insert("c".into(), dummy_statement(3));
        assert_eq!(evicted, Some(2));
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn reinserting_a_cached_key_does_not_evict() {
        let mut cache = StatementCache::new(1);
        assert_eq!(cache.insert("a".into(), dummy_statement(1)), None);
        assert_eq!(cache.insert("a".into(), dummy_statement(2)), None);
        assert_eq!(cache.get("a").unwrap().id(), 2);
    }
}
