//! # Weighted Hash Index
//!
//! A key → value store with separate chaining and batch rehashing, used for
//! every id lookup in the crate (listeners, tracks, graph adjacency,
//! propagation confidences).
//!
//! ## Layout
//!
//! - Bucket array with a power-of-two capacity (16 by default)
//! - A key lives in bucket `hash(key) mod capacity`
//! - Each bucket is a singly linked chain; new entries are prepended
//! - Once `len / capacity` reaches 0.75 the capacity doubles and every entry
//!   is rehashed into the new table in one pass
//!
//! Iteration order is unspecified. The index is not synchronized; wrap it or
//! keep it per-owner when threads are involved.
//!
//! "Absent" keys are modelled with `Option<K>` as the key type, where `None`
//! behaves like any other key:
//!
//! ```
//! use tastemap::hash_index::WeightedHashIndex;
//!
//! let mut index: WeightedHashIndex<Option<&str>, u32> = WeightedHashIndex::new();
//! index.put(None, 1);
//! index.put(Some("jazz"), 2);
//! assert_eq!(index.get(&None), Some(&1));
//! assert_eq!(index.put(None, 3), Some(1));
//! ```

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

const DEFAULT_CAPACITY: usize = 16;
const MAX_LOAD_FACTOR: f64 = 0.75;

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    next: Link<K, V>,
}

/// Separate-chaining hash map with eager doubling.
pub struct WeightedHashIndex<K, V> {
    buckets: Vec<Link<K, V>>,
    len: usize,
    hasher: RandomState,
}

impl<K: Hash + Eq, V> WeightedHashIndex<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an index with at least `capacity` buckets, rounded up to a
    /// power of two.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            buckets: empty_buckets(capacity),
            len: 0,
            hasher: RandomState::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets currently allocated.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }

        let index = self.bucket_index(&key);
        let next = self.buckets[index].take();
        self.buckets[index] = Some(Box::new(Node { key, value, next }));
        self.len += 1;

        #[allow(clippy::cast_precision_loss)]
        let load = self.len as f64 / self.buckets.len() as f64;
        if load >= MAX_LOAD_FACTOR {
            self.grow(self.buckets.len() * 2);
        }
        None
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut cursor = self.buckets[self.bucket_index(key)].as_deref();
        while let Some(node) = cursor {
            if node.key.borrow() == key {
                return Some(&node.value);
            }
            cursor = node.next.as_deref();
        }
        None
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        let mut cursor = self.buckets[index].as_deref_mut();
        while let Some(node) = cursor {
            if node.key.borrow() == key {
                return Some(&mut node.value);
            }
            cursor = node.next.as_deref_mut();
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        let removed = unlink(&mut self.buckets[index], key);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Drops every entry but keeps the current bucket allocation.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            drop_chain(bucket.take());
        }
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            current: None,
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            buckets: self.buckets.iter_mut(),
            current: None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, value)| value)
    }

    fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        #[allow(clippy::cast_possible_truncation)]
        let hash = self.hasher.hash_one(key) as usize;
        hash % self.buckets.len()
    }

    /// Batch migration into a table of `new_capacity` buckets.
    fn grow(&mut self, new_capacity: usize) {
        log::trace!(
            "Growing hash index from {} to {} buckets ({} entries)",
            self.buckets.len(),
            new_capacity,
            self.len
        );
        let old = std::mem::replace(&mut self.buckets, empty_buckets(new_capacity));
        for mut chain in old {
            while let Some(mut node) = chain {
                chain = node.next.take();
                let index = self.bucket_index(&node.key);
                node.next = self.buckets[index].take();
                self.buckets[index] = Some(node);
            }
        }
    }
}

fn empty_buckets<K, V>(capacity: usize) -> Vec<Link<K, V>> {
    (0..capacity).map(|_| None).collect()
}

fn unlink<K, V, Q>(link: &mut Link<K, V>, key: &Q) -> Option<V>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    let mut cursor = link;
    while cursor.as_ref().is_some_and(|node| node.key.borrow() != key) {
        cursor = &mut cursor.as_mut()?.next;
    }
    let node = cursor.take()?;
    let Node { value, next, .. } = *node;
    *cursor = next;
    Some(value)
}

/// Frees a chain node by node; the default `Box` drop recurses per node.
fn drop_chain<K, V>(mut chain: Link<K, V>) {
    while let Some(mut node) = chain {
        chain = node.next.take();
    }
}

impl<K, V> Drop for WeightedHashIndex<K, V> {
    fn drop(&mut self) {
        for bucket in &mut self.buckets {
            drop_chain(bucket.take());
        }
    }
}

impl<K: Hash + Eq, V> Default for WeightedHashIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug> fmt::Debug for WeightedHashIndex<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for WeightedHashIndex<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

impl<K: Hash + Eq, V> Extend<(K, V)> for WeightedHashIndex<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

/// Borrowing iterator over `(key, value)` pairs in bucket order.
pub struct Iter<'a, K, V> {
    buckets: std::slice::Iter<'a, Link<K, V>>,
    current: Option<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.current {
                self.current = node.next.as_deref();
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            self.current = self.buckets.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Iterator yielding mutable values alongside their keys.
pub struct IterMut<'a, K, V> {
    buckets: std::slice::IterMut<'a, Link<K, V>>,
    current: Option<&'a mut Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.current.take() {
                let Node { key, value, next } = node;
                self.current = next.as_deref_mut();
                return Some((&*key, value));
            }
            self.current = self.buckets.next()?.as_deref_mut();
        }
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a WeightedHashIndex<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
