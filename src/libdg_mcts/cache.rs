// Copyright 2019 Karl Sundequist Blomdahl <karl.sundequist.blomdahl@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// A fingerprint -> (policy, value) cache with strict LRU eviction. There is
// no `lru` crate in this workspace's dependency set, so the doubly-linked
// list is hand-rolled over a slab of slots addressed by index, which avoids
// the aliasing problems of an actual intrusive pointer list in safe Rust.

use dg_utils::types::f16;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;
use std::sync::Mutex;

pub type Fingerprint = u128;

/// Combines a model identity token with the symmetry-applied feature bytes
/// into a 128-bit fingerprint. Two requests with the same fingerprint are
/// guaranteed to have asked the same model the same question.
pub fn fingerprint(model_name: &str, features: &[f16]) -> Fingerprint {
    let mut lo = DefaultHasher::new();
    model_name.hash(&mut lo);
    0u8.hash(&mut lo);
    features.hash(&mut lo);

    let mut hi = DefaultHasher::new();
    features.hash(&mut hi);
    1u8.hash(&mut hi);
    model_name.hash(&mut hi);

    ((hi.finish() as u128) << 64) | (lo.finish() as u128)
}

struct Entry {
    fingerprint: Fingerprint,
    policy: Vec<f32>,
    value: f32,
    prev: Option<usize>,
    next: Option<usize>
}

/// Rough per-entry footprint used to convert a capacity in megabytes into a
/// maximum entry count: the fingerprint, a `f32` policy vector over `n*n+1`
/// actions, the value, and the linkage overhead of the LRU list.
fn entry_size_bytes(num_moves: usize) -> usize {
    16 + 4 * num_moves + 4 + 2 * 8
}

struct Lru {
    slots: Vec<Entry>,
    free: Vec<usize>,
    index: HashMap<Fingerprint, usize>,
    head: Option<usize>, // most recently used
    tail: Option<usize>, // least recently used
    capacity: usize
}

impl Lru {
    fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            capacity: capacity.max(1)
        }
    }

    fn detach(&mut self, i: usize) {
        let (prev, next) = (self.slots[i].prev, self.slots[i].next);

        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev
        }

        self.slots[i].prev = None;
        self.slots[i].next = None;
    }

    fn push_front(&mut self, i: usize) {
        self.slots[i].prev = None;
        self.slots[i].next = self.head;

        if let Some(h) = self.head {
            self.slots[h].prev = Some(i);
        }
        self.head = Some(i);

        if self.tail.is_none() {
            self.tail = Some(i);
        }
    }

    fn touch(&mut self, i: usize) {
        if self.head == Some(i) {
            return;
        }
        self.detach(i);
        self.push_front(i);
    }

    fn evict_lru(&mut self) {
        if let Some(t) = self.tail {
            self.detach(t);
            self.index.remove(&self.slots[t].fingerprint);
            self.free.push(t);
        }
    }

    fn get(&mut self, fp: Fingerprint) -> Option<(Vec<f32>, f32)> {
        let i = *self.index.get(&fp)?;
        self.touch(i);
        let entry = &self.slots[i];
        Some((entry.policy.clone(), entry.value))
    }

    fn insert(&mut self, fp: Fingerprint, policy: Vec<f32>, value: f32) {
        if let Some(&i) = self.index.get(&fp) {
            self.slots[i].policy = policy;
            self.slots[i].value = value;
            self.touch(i);
            return;
        }

        while self.index.len() >= self.capacity {
            self.evict_lru();
        }

        let entry = Entry { fingerprint: fp, policy, value, prev: None, next: None };
        let i = if let Some(free) = self.free.pop() {
            self.slots[free] = entry;
            free
        } else {
            self.slots.push(entry);
            self.slots.len() - 1
        };

        self.index.insert(fp, i);
        self.push_front(i);
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

/// The shared inference cache. Safe to use concurrently from many search
/// threads; the critical section guarded by the mutex never crosses a
/// suspension point (no network call happens while it is held).
pub struct InferenceCache {
    lru: Mutex<Lru>
}

impl InferenceCache {
    /// `capacity_mb` is converted to a maximum entry count using the size of
    /// one policy vector over `num_moves` actions.
    pub fn with_capacity_mb(capacity_mb: usize, num_moves: usize) -> Self {
        let per_entry = entry_size_bytes(num_moves).max(1);
        let capacity = (capacity_mb * 1024 * 1024) / per_entry;

        Self { lru: Mutex::new(Lru::new(capacity.max(1))) }
    }

    pub fn lookup(&self, fp: Fingerprint) -> Option<(Vec<f32>, f32)> {
        self.lru.lock().expect("cache lock poisoned").get(fp)
    }

    pub fn insert(&self, fp: Fingerprint, policy: Vec<f32>, value: f32) {
        self.lru.lock().expect("cache lock poisoned").insert(fp, policy, value);
    }

    pub fn len(&self) -> usize {
        self.lru.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(seed: u8) -> Fingerprint {
        fingerprint("random:1", &[f16::from(seed as f32)])
    }

    #[test]
    fn insert_then_lookup_hits() {
        let cache = InferenceCache::with_capacity_mb(1, 362);
        let key = fp(1);

        cache.insert(key, vec![0.5; 362], 0.1);
        assert_eq!(cache.lookup(key), Some((vec![0.5; 362], 0.1)));
    }

    #[test]
    fn miss_returns_none() {
        let cache = InferenceCache::with_capacity_mb(1, 362);
        assert_eq!(cache.lookup(fp(9)), None);
    }

    #[test]
    fn eviction_removes_the_least_recently_used_entry() {
        let mut lru = Lru::new(2);

        lru.insert(1, vec![0.0], 0.0);
        lru.insert(2, vec![0.0], 0.0);
        lru.get(1); // touches 1, making 2 the least recently used
        lru.insert(3, vec![0.0], 0.0); // evicts 2

        assert!(lru.get(2).is_none());
        assert!(lru.get(1).is_some());
        assert!(lru.get(3).is_some());
    }

    #[test]
    fn distinct_model_names_never_collide_by_coincidence() {
        let a = fingerprint("model-a", &[f16::from(1.0)]);
        let b = fingerprint("model-b", &[f16::from(1.0)]);

        assert_ne!(a, b);
    }
}
