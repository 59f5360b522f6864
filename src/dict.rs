//! Incrementally-rehashed hash table with separate chaining.
//!
//! A C hash table's callback struct (hash/key-dup/value-dup/key-compare/
//! destructors) collapses here onto ownership and trait bounds: moving
//! `K`/`V` by value takes the place of pointer-copy "dup" callbacks, and
//! `Drop` takes the place of the destructor callback. Only the hash function
//! survives as an explicit collaborator, via `BuildHasher` — defaulted to
//! `fxhash`, already in the dependency graph for exactly this purpose.

use fxhash::FxBuildHasher;
use std::cell::Cell;
use std::hash::{BuildHasher, Hash, Hasher};

const DICT_HT_INITIAL_SIZE: usize = 4;
const DICT_FORCE_RESIZE_RATIO: usize = 5;
const EMPTY_VISITS_BUDGET: usize = 10;

struct Node<K, V> {
    key: K,
    value: V,
    next: Option<Box<Node<K, V>>>,
}

struct SubTable<K, V> {
    buckets: Vec<Option<Box<Node<K, V>>>>,
    size: usize,
    mask: u64,
    used: usize,
}

impl<K, V> SubTable<K, V> {
    fn new(size: usize) -> Self {
        if size == 0 {
            return Self {
                buckets: Vec::new(),
                size: 0,
                mask: 0,
                used: 0,
            };
        }
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, || None);
        Self {
            buckets,
            size,
            mask: (size - 1) as u64,
            used: 0,
        }
    }
}

fn next_pow2(n: usize) -> usize {
    let mut p = 1usize;
    while p < n {
        p <<= 1;
    }
    p
}

fn delete_from_chain<K: Eq, V>(
    head: Option<Box<Node<K, V>>>,
    key: &K,
) -> (Option<Box<Node<K, V>>>, Option<V>) {
    match head {
        None => (None, None),
        Some(mut node) => {
            if &node.key == key {
                (node.next.take(), Some(node.value))
            } else {
                let (new_next, removed) = delete_from_chain(node.next.take(), key);
                node.next = new_next;
                (Some(node), removed)
            }
        }
    }
}

fn find_in_chain<'a, K: Eq, V>(head: &'a Option<Box<Node<K, V>>>, key: &K) -> Option<&'a V> {
    match head {
        Some(node) if &node.key == key => Some(&node.value),
        Some(node) => find_in_chain(&node.next, key),
        None => None,
    }
}

fn find_in_chain_mut<'a, K: Eq, V>(
    head: &'a mut Option<Box<Node<K, V>>>,
    key: &K,
) -> Option<&'a mut V> {
    match head {
        Some(node) if &node.key == key => Some(&mut node.value),
        Some(node) => find_in_chain_mut(&mut node.next, key),
        None => None,
    }
}

fn advance_cursor(v: u64, mask: u64) -> u64 {
    let x = v | !mask;
    x.reverse_bits().wrapping_add(1).reverse_bits()
}

/// A hash table of `K -> V` with two sub-tables and an incremental,
/// interruptible rehash driven by a `rehashidx` cursor.
pub struct Dict<K, V, S = FxBuildHasher> {
    tables: [SubTable<K, V>; 2],
    rehashidx: isize,
    iterators: Cell<usize>,
    can_resize: bool,
    hash_builder: S,
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> Default for Dict<K, V, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> Dict<K, V, S> {
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Dict<K, V, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            tables: [SubTable::new(0), SubTable::new(0)],
            rehashidx: -1,
            iterators: Cell::new(0),
            can_resize: true,
            hash_builder,
        }
    }

    pub fn enable_resize(&mut self) {
        self.can_resize = true;
    }

    pub fn disable_resize(&mut self) {
        self.can_resize = false;
    }

    pub fn is_rehashing(&self) -> bool {
        self.rehashidx >= 0
    }

    pub fn len(&self) -> usize {
        self.tables[0].used + self.tables[1].used
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn hash_of(&self, key: &K) -> u64 {
        let mut h = self.hash_builder.build_hasher();
        key.hash(&mut h);
        h.finish()
    }

    fn rehash_budget(&mut self) {
        if self.iterators.get() == 0 && self.is_rehashing() {
            self.rehash_step();
        }
    }

    /// Migrates entries from one non-empty bucket of `T[0]` into `T[1]`,
    /// skipping up to `EMPTY_VISITS_BUDGET` empty buckets to cap tail
    /// latency. Returns whether rehashing is still in progress.
    fn rehash_step(&mut self) -> bool {
        if self.rehashidx < 0 {
            return false;
        }
        if self.tables[0].used == 0 {
            self.finish_rehash();
            return false;
        }

        let mut empty_visits = EMPTY_VISITS_BUDGET;
        loop {
            if empty_visits == 0 {
                break;
            }
            let idx = self.rehashidx as usize;
            if idx >= self.tables[0].size {
                self.finish_rehash();
                return false;
            }
            if self.tables[0].buckets[idx].is_none() {
                self.rehashidx += 1;
                empty_visits -= 1;
                continue;
            }

            let mask1 = self.tables[1].mask;
            let mut node = self.tables[0].buckets[idx].take();
            while let Some(mut boxed) = node {
                node = boxed.next.take();
                let h = {
                    let mut hasher = self.hash_builder.build_hasher();
                    boxed.key.hash(&mut hasher);
                    hasher.finish()
                };
                let idx1 = (h & mask1) as usize;
                boxed.next = self.tables[1].buckets[idx1].take();
                self.tables[0].used -= 1;
                self.tables[1].buckets[idx1] = Some(boxed);
                self.tables[1].used += 1;
            }
            self.rehashidx += 1;
            break;
        }
        true
    }

    fn finish_rehash(&mut self) {
        self.tables[0] = std::mem::replace(&mut self.tables[1], SubTable::new(0));
        self.rehashidx = -1;
    }

    /// Runs up to `n` rehash steps, returning whether work remains.
    pub fn rehash_n(&mut self, n: usize) -> bool {
        for _ in 0..n {
            if !self.rehash_step() {
                return false;
            }
        }
        true
    }

    /// Rehashes in 100-bucket batches for up to `ms` milliseconds, returning
    /// the number of batches executed.
    pub fn rehash_for_ms(&mut self, ms: u64) -> usize {
        let start = std::time::Instant::now();
        let mut batches = 0usize;
        loop {
            let more = self.rehash_n(100);
            batches += 1;
            if !more || start.elapsed().as_millis() as u64 >= ms {
                break;
            }
        }
        batches
    }

    fn expand_if_needed(&mut self) {
        if self.is_rehashing() {
            return;
        }
        if self.tables[0].size == 0 {
            self.expand(DICT_HT_INITIAL_SIZE);
            return;
        }
        if self.tables[0].used >= self.tables[0].size
            && (self.can_resize || self.tables[0].used >= self.tables[0].size * DICT_FORCE_RESIZE_RATIO)
        {
            self.expand(self.tables[0].used * 2);
        }
    }

    /// Starts rehashing into a new sub-table sized to hold `size_hint`
    /// (rounded up to a power of two, floored at `DICT_HT_INITIAL_SIZE`).
    pub fn expand(&mut self, size_hint: usize) -> bool {
        if self.is_rehashing() {
            return false;
        }
        let realsize = next_pow2(size_hint.max(DICT_HT_INITIAL_SIZE));
        if self.tables[0].size == realsize {
            return false;
        }
        if self.tables[0].size == 0 {
            self.tables[0] = SubTable::new(realsize);
            return true;
        }
        self.tables[1] = SubTable::new(realsize);
        self.rehashidx = 0;
        true
    }

    /// Shrinks to the smallest power of two that still holds every live
    /// entry (floored at `DICT_HT_INITIAL_SIZE`).
    pub fn resize_to_min(&mut self) -> bool {
        if self.is_rehashing() || self.tables[0].used == 0 {
            return false;
        }
        self.expand(self.tables[0].used)
    }

    fn insert_new(&mut self, key: K, value: V) -> &V {
        self.expand_if_needed();
        self.rehash_budget();
        let ti = if self.is_rehashing() { 1 } else { 0 };
        let h = self.hash_of(&key);
        let idx = (h & self.tables[ti].mask) as usize;
        let node = Box::new(Node {
            key,
            value,
            next: self.tables[ti].buckets[idx].take(),
        });
        self.tables[ti].buckets[idx] = Some(node);
        self.tables[ti].used += 1;
        match self.tables[ti].buckets[idx].as_deref() {
            Some(node) => &node.value,
            None => unreachable!("just inserted"),
        }
    }

    /// Inserts `key`/`value` if `key` is absent. Returns `false` without
    /// touching the table if `key` already exists.
    pub fn add(&mut self, key: K, value: V) -> bool {
        if self.find(&key).is_some() {
            return false;
        }
        self.insert_new(key, value);
        true
    }

    /// Inserts `key`/`value` if `key` is absent; otherwise leaves the
    /// existing entry untouched. Returns a reference to the entry for `key`
    /// either way (`dictAddOrFind`).
    pub fn add_or_find(&mut self, key: K, value: V) -> &V {
        self.rehash_budget();
        if self.find_ref(&key).is_none() {
            return self.insert_new(key, value);
        }
        self.find_ref(&key).unwrap()
    }

    /// Inserts or overwrites. Returns `true` if `key` was newly inserted.
    pub fn replace(&mut self, key: K, value: V) -> bool {
        self.rehash_budget();
        if let Some(slot) = self.find_mut(&key) {
            *slot = value;
            return false;
        }
        self.insert_new(key, value);
        true
    }

    pub fn find(&mut self, key: &K) -> Option<&V> {
        self.rehash_budget();
        self.find_ref(key)
    }

    fn find_ref(&self, key: &K) -> Option<&V> {
        if self.tables[0].size == 0 {
            return None;
        }
        let h = self.hash_of(key);
        for ti in 0..=1 {
            if ti == 1 && !self.is_rehashing() {
                break;
            }
            let t = &self.tables[ti];
            if t.size == 0 {
                continue;
            }
            let idx = (h & t.mask) as usize;
            if let Some(v) = find_in_chain(&t.buckets[idx], key) {
                return Some(v);
            }
        }
        None
    }

    pub fn fetch_value(&mut self, key: &K) -> Option<&V> {
        self.find(key)
    }

    fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.tables[0].size == 0 {
            return None;
        }
        let h = self.hash_of(key);
        let rehashing = self.is_rehashing();
        for ti in 0..=1 {
            if ti == 1 && !rehashing {
                break;
            }
            if self.tables[ti].size == 0 {
                continue;
            }
            let idx = (h & self.tables[ti].mask) as usize;
            if let Some(v) = find_in_chain_mut(&mut self.tables[ti].buckets[idx], key) {
                return Some(v);
            }
        }
        None
    }

    pub fn contains_key(&mut self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Removes `key`, dropping its value.
    pub fn delete(&mut self, key: &K) -> bool {
        self.delete_take(key).is_some()
    }

    /// Removes `key`, handing the value back instead of dropping it —
    /// the Rust-native equivalent of `dictDeleteNoFree`.
    pub fn delete_take(&mut self, key: &K) -> Option<V> {
        self.rehash_budget();
        if self.tables[0].size == 0 {
            return None;
        }
        let h = self.hash_of(key);
        let rehashing = self.is_rehashing();
        for ti in 0..=1 {
            if ti == 1 && !rehashing {
                break;
            }
            if self.tables[ti].size == 0 {
                continue;
            }
            let idx = (h & self.tables[ti].mask) as usize;
            let head = self.tables[ti].buckets[idx].take();
            let (new_head, removed) = delete_from_chain(head, key);
            self.tables[ti].buckets[idx] = new_head;
            if removed.is_some() {
                self.tables[ti].used -= 1;
                return removed;
            }
        }
        None
    }

    pub fn clear(&mut self) {
        self.tables = [SubTable::new(0), SubTable::new(0)];
        self.rehashidx = -1;
    }

    fn fingerprint(&self) -> u64 {
        let mut h = self.tables[0].buckets.as_ptr() as u64;
        for t in &self.tables {
            h = h.wrapping_mul(1_000_003) ^ t.buckets.as_ptr() as u64;
            h = h.wrapping_mul(1_000_003) ^ t.size as u64;
            h = h.wrapping_mul(1_000_003) ^ t.used as u64;
        }
        h
    }

    /// A uniformly random live entry, or `None` if empty.
    pub fn random_entry(&mut self) -> Option<(&K, &V)> {
        self.rehash_budget();
        if self.len() == 0 {
            return None;
        }
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let (ti, idx) = loop {
            let ti = if self.is_rehashing() && rng.gen_bool(0.5) { 1 } else { 0 };
            let size = self.tables[ti].size;
            if size == 0 {
                continue;
            }
            let idx = rng.gen_range(0, size);
            if ti == 0 && self.is_rehashing() && idx < self.rehashidx as usize {
                continue;
            }
            if self.tables[ti].buckets[idx].is_some() {
                break (ti, idx);
            }
        };
        let chain_len = {
            let mut n = 0usize;
            let mut cur = self.tables[ti].buckets[idx].as_deref();
            while let Some(node) = cur {
                n += 1;
                cur = node.next.as_deref();
            }
            n
        };
        let target = rng.gen_range(0, chain_len);
        let mut cur = self.tables[ti].buckets[idx].as_deref();
        for _ in 0..target {
            cur = cur.unwrap().next.as_deref();
        }
        cur.map(|n| (&n.key, &n.value))
    }

    /// Cluster-aware sampling: walks consecutive buckets from a random
    /// start, collecting up to `n` entries. Cheaper and more biased than
    /// `n` independent `random_entry` calls; intended for eviction
    /// candidates, not uniform sampling.
    pub fn sample_n_keys(&mut self, n: usize) -> Vec<(&K, &V)> {
        self.rehash_budget();
        let mut out = Vec::new();
        if n == 0 {
            return out;
        }
        let size = self.tables[0].size.max(self.tables[1].size);
        if size == 0 {
            return out;
        }
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let start = rng.gen_range(0, size);
        let mut idx = start;
        let rehashing = self.is_rehashing();
        for _ in 0..size {
            for ti in 0..=1 {
                if ti == 1 && !rehashing {
                    continue;
                }
                if idx >= self.tables[ti].size {
                    continue;
                }
                let mut cur = self.tables[ti].buckets[idx].as_deref();
                while let Some(node) = cur {
                    out.push((&node.key, &node.value));
                    if out.len() >= n {
                        return out;
                    }
                    cur = node.next.as_deref();
                }
            }
            idx = (idx + 1) % size;
        }
        out
    }

    fn visit_bucket<F: FnMut(&K, &V)>(&self, ti: usize, idx: usize, f: &mut F) {
        if idx >= self.tables[ti].size {
            return;
        }
        let mut cur = self.tables[ti].buckets[idx].as_deref();
        while let Some(node) = cur {
            f(&node.key, &node.value);
            cur = node.next.as_deref();
        }
    }

    /// Reverse-binary-iteration scan: visits every entry present at both
    /// the start and end of a full cycle (cursor returns to 0), tolerating
    /// concurrent resizes.
    pub fn scan<F: FnMut(&K, &V)>(&self, cursor: u64, mut f: F) -> u64 {
        if self.tables[0].size == 0 {
            return 0;
        }
        if !self.is_rehashing() {
            let m0 = self.tables[0].mask;
            self.visit_bucket(0, (cursor & m0) as usize, &mut f);
            return advance_cursor(cursor, m0);
        }

        let (small, big) = if self.tables[0].size <= self.tables[1].size {
            (0, 1)
        } else {
            (1, 0)
        };
        let m0 = self.tables[small].mask;
        let m1 = self.tables[big].mask;
        self.visit_bucket(small, (cursor & m0) as usize, &mut f);
        let mut v = cursor;
        loop {
            self.visit_bucket(big, (v & m1) as usize, &mut f);
            v = advance_cursor(v, m1);
            if v & (m0 ^ m1) == 0 {
                break;
            }
        }
        advance_cursor(cursor, m0)
    }

    /// Opens a safe cursor: suspends incremental rehashing (`rehash_budget`'s
    /// gate) for as long as any safe cursor is open. Unlike `unsafe_iter`,
    /// `SafeIter` carries no borrow of the dict, so `add`/`replace`/`find`/
    /// `delete` can all interleave with stepping it via `iter_next` — only
    /// the rehash step itself is gated while the cursor is alive. Must be
    /// handed back to `iter_finish` to resume rehashing.
    pub fn iter(&self) -> SafeIter {
        self.iterators.set(self.iterators.get() + 1);
        SafeIter {
            ti: 0,
            idx: 0,
            depth: 0,
            done: false,
        }
    }

    /// Advances a safe cursor, returning the next entry or `None` once every
    /// bucket in both sub-tables has been visited. Borrows `self` only for
    /// the duration of this call, so the dict is free to mutate in between
    /// calls.
    pub fn iter_next<'a>(&'a self, cursor: &mut SafeIter) -> Option<(&'a K, &'a V)> {
        if cursor.done {
            return None;
        }
        loop {
            if cursor.idx >= self.tables[cursor.ti].size {
                if cursor.ti == 0 && self.is_rehashing() {
                    cursor.ti = 1;
                    cursor.idx = 0;
                    cursor.depth = 0;
                    continue;
                }
                cursor.done = true;
                return None;
            }
            if self.tables[cursor.ti].size == 0 {
                cursor.done = true;
                return None;
            }
            let mut node = self.tables[cursor.ti].buckets[cursor.idx].as_deref();
            for _ in 0..cursor.depth {
                node = node.and_then(|n| n.next.as_deref());
            }
            match node {
                Some(n) => {
                    cursor.depth += 1;
                    return Some((&n.key, &n.value));
                }
                None => {
                    cursor.idx += 1;
                    cursor.depth = 0;
                }
            }
        }
    }

    /// Closes a safe cursor, resuming incremental rehashing once no other
    /// safe cursor remains open.
    pub fn iter_finish(&self, _cursor: SafeIter) {
        self.iterators.set(self.iterators.get().saturating_sub(1));
    }

    /// Position of the rehash cursor, or a negative value when not
    /// rehashing. Exposed for diagnostics and tests.
    pub fn rehash_cursor(&self) -> isize {
        self.rehashidx
    }

    /// An unsafe iterator: must not be interleaved with mutation. Records a
    /// fingerprint at creation and `finish()` reports whether it changed.
    pub fn unsafe_iter(&self) -> UnsafeIter<'_, K, V, S> {
        UnsafeIter {
            dict: self,
            ti: 0,
            idx: 0,
            cur: None,
            fingerprint: self.fingerprint(),
        }
    }
}

/// An open position in a safe, rehash-suspending traversal. Carries no
/// borrow of the dict it walks — see `Dict::iter`/`iter_next`/`iter_finish`.
pub struct SafeIter {
    ti: usize,
    idx: usize,
    depth: usize,
    done: bool,
}

pub struct UnsafeIter<'a, K, V, S> {
    dict: &'a Dict<K, V, S>,
    ti: usize,
    idx: usize,
    cur: Option<&'a Node<K, V>>,
    fingerprint: u64,
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> Iterator for UnsafeIter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.cur {
                self.cur = node.next.as_deref();
                return Some((&node.key, &node.value));
            }
            if self.idx >= self.dict.tables[self.ti].size {
                if self.ti == 0 && self.dict.is_rehashing() {
                    self.ti = 1;
                    self.idx = 0;
                } else {
                    return None;
                }
            }
            if self.dict.tables[self.ti].size == 0 {
                return None;
            }
            self.cur = self.dict.tables[self.ti].buckets[self.idx].as_deref();
            self.idx += 1;
        }
    }
}

impl<'a, K, V, S> UnsafeIter<'a, K, V, S> {
    pub fn finish(self) -> crate::error::Result<()> {
        if self.fingerprint == self.dict.fingerprint() {
            Ok(())
        } else {
            Err(crate::error::CollectionError::Usage(
                "unsafe iterator fingerprint mismatch",
            ))
        }
    }
}
