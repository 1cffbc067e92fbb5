//! Sharded concurrent map for parallel relevance accumulation.
//!
//! Keys hash to one of N independently locked shards, so writers touching
//! different shards never contend. Every operation locks exactly one shard
//! at a time, which rules out deadlock by construction.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use parking_lot::{Mutex, MutexGuard};

/// Integer-keyed map partitioned into independently locked shards
#[derive(Debug)]
pub struct ShardedMap<K, V> {
    shards: Vec<Mutex<BTreeMap<K, V>>>,
}

/// Scoped write access to a single value.
///
/// The guard holds its shard's lock for its entire lifetime; dropping the
/// guard releases the shard.
pub struct ValueGuard<'a, K: Ord, V> {
    shard: MutexGuard<'a, BTreeMap<K, V>>,
    key: K,
}

impl<K, V> ShardedMap<K, V>
where
    K: Copy + Ord + Into<i64>,
    V: Default,
{
    /// Create a map with a fixed number of shards (at least one).
    pub fn new(shard_count: usize) -> Self {
        assert!(shard_count >= 1, "shard count must be at least 1");
        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shards.push(Mutex::new(BTreeMap::new()));
        }
        Self { shards }
    }

    /// Lock the key's shard and return scoped write access to its value,
    /// inserting a default value if the key is absent.
    pub fn access(&self, key: K) -> ValueGuard<'_, K, V> {
        let mut shard = self.shards[self.shard_index(key)].lock();
        shard.entry(key).or_default();
        ValueGuard { shard, key }
    }

    /// Remove the key if present.
    pub fn erase(&self, key: K) {
        self.shards[self.shard_index(key)].lock().remove(&key);
    }

    /// Assemble an ordered map containing the union of all shards.
    ///
    /// Shards are locked one at a time, so each shard's contribution is
    /// atomic with respect to its writers, while the union as a whole is
    /// only a snapshot.
    pub fn snapshot(&self) -> BTreeMap<K, V>
    where
        V: Clone,
    {
        let mut ordinary = BTreeMap::new();
        for shard in &self.shards {
            for (key, value) in shard.lock().iter() {
                ordinary.insert(*key, value.clone());
            }
        }
        ordinary
    }

    fn shard_index(&self, key: K) -> usize {
        (key.into().unsigned_abs() as usize) % self.shards.len()
    }
}

impl<K: Ord, V> Deref for ValueGuard<'_, K, V> {
    type Target = V;

    fn deref(&self) -> &V {
        // access() inserts the entry before handing out the guard
        self.shard
            .get(&self.key)
            .expect("entry inserted before guard construction")
    }
}

impl<K: Ord, V> DerefMut for ValueGuard<'_, K, V> {
    fn deref_mut(&mut self) -> &mut V {
        self.shard
            .get_mut(&self.key)
            .expect("entry inserted before guard construction")
    }
}
