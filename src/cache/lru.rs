//! LRU Cache Module
//!
//! Implements a byte-bounded store with Least Recently Used eviction.

use std::collections::HashMap;

use crate::cache::{CacheEntry, SizedValue};

/// Called with the key and value of every entry removed by `remove_oldest`.
pub type EvictionCallback<V> = Box<dyn FnMut(&str, &V) + Send>;

// == Node ==
/// One slot of the recency list. Links are slab indices.
#[derive(Debug)]
struct Node<V> {
    entry: CacheEntry<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Cache ==
/// Byte-bounded key/value store with LRU eviction.
///
/// Entries live in a slab and are chained into a doubly linked list:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Not thread-safe; see `LocalCache` for the locked wrapper.
pub struct LruCache<V> {
    /// Capacity in bytes, 0 = unbounded
    max_bytes: usize,
    /// Sum of `key.len() + value.len()` over live entries
    used_bytes: usize,
    /// Entry storage, `None` marks a free slot
    slots: Vec<Option<Node<V>>>,
    /// Free slot indices for reuse
    free: Vec<usize>,
    /// Key to slot index
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Number of entries removed by `remove_oldest`
    evictions: u64,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: SizedValue> LruCache<V> {
    // == Constructor ==
    /// Creates an empty store holding at most `max_bytes` (0 = unbounded).
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            evictions: 0,
            on_evicted: None,
        }
    }

    /// Creates an empty store that reports every eviction to `on_evicted`.
    pub fn with_eviction_callback(max_bytes: usize, on_evicted: EvictionCallback<V>) -> Self {
        let mut cache = Self::new(max_bytes);
        cache.on_evicted = Some(on_evicted);
        cache
    }

    // == Add ==
    /// Inserts or replaces `key`, marks it most recently used, then evicts
    /// from the LRU end until the store fits its capacity again.
    ///
    /// A single entry larger than the capacity is inserted and immediately
    /// evicted by the same loop.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();

        if let Some(&idx) = self.index.get(&key) {
            self.detach(idx);
            self.push_front(idx);
            let node = self.node_mut(idx);
            let old_len = node.entry.value.len();
            let new_len = value.len();
            node.entry.value = value;
            self.used_bytes = self.used_bytes + new_len - old_len;
        } else {
            let entry = CacheEntry::new(key.clone(), value);
            self.used_bytes += entry.size();
            let idx = self.allocate(entry);
            self.push_front(idx);
            self.index.insert(key, idx);
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            if self.remove_oldest().is_none() {
                break;
            }
        }
    }

    // == Get ==
    /// Returns a copy of the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let idx = *self.index.get(key)?;
        self.detach(idx);
        self.push_front(idx);
        Some(self.node_mut(idx).entry.value.clone())
    }

    // == Remove Oldest ==
    /// Removes the least recently used entry, if any, and returns it.
    pub fn remove_oldest(&mut self) -> Option<CacheEntry<V>> {
        let idx = self.tail?;
        let entry = self.release(idx);
        self.evictions += 1;

        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&entry.key, &entry.value);
        }

        Some(entry)
    }

    // == Remove ==
    /// Removes `key` without counting it as an eviction.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = *self.index.get(key)?;
        Some(self.release(idx).value)
    }

    // == Contains ==
    /// Checks presence without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    // == Length ==
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = self.node(idx);
            keys.push(node.entry.key.clone());
            cursor = node.next;
        }
        keys
    }

    // == Slab Internals ==
    fn allocate(&mut self, entry: CacheEntry<V>) -> usize {
        let node = Node {
            entry,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Unlinks `idx`, frees its slot and drops it from the index.
    fn release(&mut self, idx: usize) -> CacheEntry<V> {
        self.detach(idx);
        let node = self.slots[idx]
            .take()
            .unwrap_or_else(|| unreachable!("linked slot {idx} is vacant"));
        self.free.push(idx);
        self.index.remove(&node.entry.key);
        self.used_bytes -= node.entry.size();
        node.entry
    }

    fn node(&self, idx: usize) -> &Node<V> {
        self.slots[idx]
            .as_ref()
            .unwrap_or_else(|| unreachable!("linked slot {idx} is vacant"))
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        self.slots[idx]
            .as_mut()
            .unwrap_or_else(|| unreachable!("linked slot {idx} is vacant"))
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node_mut(idx);
            (node.prev.take(), node.next.take())
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None if self.head == Some(idx) => self.head = next,
            None => {}
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None if self.tail == Some(idx) => self.tail = prev,
            None => {}
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            self.node_mut(h).prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}

impl<V> std::fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.index.len())
            .field("evictions", &self.evictions)
            .finish()
    }
}
