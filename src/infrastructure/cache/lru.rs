//! Bounded, thread-safe, per-process LRU map.
//!
//! Nodes live in a slab (`Vec`) and link to each other by index, forming a
//! doubly linked list between two sentinel nodes. The most recently used
//! entry sits right after the head sentinel, the eviction candidate right
//! before the tail sentinel.
//!
//! `get`, `put`, `delete` and `clear` take the write lock (`get` reorders the
//! list). `peek`, `contains` and `len` only take the read lock.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Capacity used when a non-positive capacity is requested.
pub const DEFAULT_CAPACITY: usize = 1000;

const HEAD: usize = 0;
const TAIL: usize = 1;

struct Node<V> {
    key: String,
    value: Option<V>,
    prev: usize,
    next: usize,
}

struct Inner<V> {
    map: HashMap<String, usize>,
    nodes: Vec<Node<V>>,
    free: Vec<usize>,
    capacity: usize,
}

impl<V> Inner<V> {
    fn new(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.min(1 << 16) + 2);
        nodes.push(Node {
            key: String::new(),
            value: None,
            prev: HEAD,
            next: TAIL,
        });
        nodes.push(Node {
            key: String::new(),
            value: None,
            prev: HEAD,
            next: TAIL,
        });

        Self {
            map: HashMap::new(),
            nodes,
            free: Vec::new(),
            capacity,
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    fn push_front(&mut self, idx: usize) {
        let first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = first;
        self.nodes[first].prev = idx;
        self.nodes[HEAD].next = idx;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.nodes[HEAD].next != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn remove(&mut self, idx: usize) -> Option<V> {
        self.unlink(idx);
        let node = &mut self.nodes[idx];
        let key = std::mem::take(&mut node.key);
        let value = node.value.take();
        self.map.remove(&key);
        self.free.push(idx);
        value
    }

    fn allocate(&mut self, key: String, value: V) -> usize {
        let node = Node {
            key,
            value: Some(value),
            prev: HEAD,
            next: TAIL,
        };

        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }
}

/// Recency-ordered cache with string keys and a fixed capacity.
pub struct LruCache<V> {
    inner: RwLock<Inner<V>>,
}

impl<V: Clone> LruCache<V> {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero falls back to [`DEFAULT_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };

        Self {
            inner: RwLock::new(Inner::new(capacity)),
        }
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.write();
        let idx = *inner.map.get(key)?;
        inner.move_to_front(idx);
        inner.nodes[idx].value.clone()
    }

    /// Returns the value for `key` without touching recency.
    pub fn peek(&self, key: &str) -> Option<V> {
        let inner = self.inner.read();
        let idx = *inner.map.get(key)?;
        inner.nodes[idx].value.clone()
    }

    /// Returns true if `key` is cached, without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().map.contains_key(key)
    }

    /// Inserts or replaces `key`, marking it most recently used.
    ///
    /// Inserting a new key into a full cache evicts the least recently used
    /// entry, which is returned together with its key.
    pub fn put(&self, key: impl Into<String>, value: V) -> Option<(String, V)> {
        let key = key.into();
        let mut inner = self.inner.write();

        if let Some(&idx) = inner.map.get(&key) {
            inner.nodes[idx].value = Some(value);
            inner.move_to_front(idx);
            return None;
        }

        let evicted = if inner.map.len() >= inner.capacity {
            let lru = inner.nodes[TAIL].prev;
            let lru_key = inner.nodes[lru].key.clone();
            inner.remove(lru).map(|v| (lru_key, v))
        } else {
            None
        };

        let idx = inner.allocate(key.clone(), value);
        inner.push_front(idx);
        inner.map.insert(key, idx);

        evicted
    }

    /// Removes `key`. Returns true if it was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.map.get(key).copied() {
            Some(idx) => {
                inner.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let capacity = inner.capacity;
        *inner = Inner::new(capacity);
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut keys = Vec::with_capacity(inner.map.len());
        let mut idx = inner.nodes[HEAD].next;
        while idx != TAIL {
            keys.push(inner.nodes[idx].key.clone());
            idx = inner.nodes[idx].next;
        }
        keys
    }
}
