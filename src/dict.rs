//! Dict: chained hash dictionary over byte keys with prime-sized tables.
//!
//! Layout, every block owned by the injected allocator:
//! - `entries`: append-only arena of fixed-size records. Chains are
//!   singly-linked lists of arena indices threaded through `Entry::next`;
//!   a new entry is prepended to its chain.
//! - `keys`: one byte array holding every key back to back. An entry
//!   records where its key starts and how long it is.
//! - `buckets`: the table of chain heads, 8 bytes per bucket. Zero encodes
//!   an empty bucket, anything else is the head's index plus one.
//!
//! Each entry keeps the full 64-bit hash computed at insert, so a resize
//! moves entries between tables without calling the hash function again.
//!
//! Values are borrowed: the dictionary stores `Option<&'v T>` and never
//! drops, copies or looks at the pointee.

use crate::alloc::{Allocator, Arena, Heap, RawBuf};
use crate::array::Array;
use crate::error::{Error, Result};
use crate::hash::{bytes_eq, fnv1a64, next_prime, EqFn, HashFn};
use crate::string::{ScopedStr, StrKey};

/// Resize once `len * LOAD_FACTOR >= bucket_count`.
pub const LOAD_FACTOR: usize = 2;

const HEAD_SIZE: usize = core::mem::size_of::<u64>();

struct Entry<'v, T: ?Sized> {
    key_at: usize,
    key_len: usize,
    hash: u64,
    value: Option<&'v T>,
    next: Option<usize>,
}

// not derived: the derive would bound `T: Copy`
impl<T: ?Sized> Clone for Entry<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Entry<'_, T> {}

/// Table of chain heads.
struct Buckets<'a, A: ?Sized + Allocator> {
    heads: RawBuf<'a, A>,
}

impl<'a, A: ?Sized + Allocator> Buckets<'a, A> {
    fn with_count(count: usize, alloc: &'a A) -> Result<Self> {
        let size = count
            .checked_mul(HEAD_SIZE)
            .ok_or(Error::CapacityOverflow)?;
        Ok(Self {
            heads: RawBuf::zeroed(size, alloc)?,
        })
    }

    fn count(&self) -> usize {
        self.heads.len() / HEAD_SIZE
    }

    fn index_of(&self, hash: u64) -> usize {
        (hash % self.count() as u64) as usize
    }

    fn head(&self, bucket: usize) -> Option<usize> {
        let at = bucket * HEAD_SIZE;
        let mut raw = [0u8; HEAD_SIZE];
        raw.copy_from_slice(&self.heads.as_slice()[at..at + HEAD_SIZE]);
        match u64::from_ne_bytes(raw) {
            0 => None,
            slot => Some((slot - 1) as usize),
        }
    }

    fn set_head(&mut self, bucket: usize, head: Option<usize>) {
        let slot = head.map_or(0, |i| i as u64 + 1);
        let at = bucket * HEAD_SIZE;
        self.heads.as_mut_slice()[at..at + HEAD_SIZE].copy_from_slice(&slot.to_ne_bytes());
    }

    /// First non-empty bucket at or after `from`.
    fn first_head_from(&self, from: usize) -> Option<usize> {
        (from..self.count()).find_map(|b| self.head(b))
    }
}

pub struct Dict<'a, 'v, T: ?Sized, A: ?Sized + Allocator = Heap> {
    alloc: &'a A,
    buckets: Buckets<'a, A>,
    entries: Arena<'a, Entry<'v, T>, A>,
    keys: Array<'a, A>,
    hash_fn: HashFn,
    eq_fn: EqFn,
}

impl<'v, T: ?Sized> Dict<'static, 'v, T, Heap> {
    /// Dictionary on the process heap with the default hash and equality.
    pub fn new(bucket_hint: usize) -> Result<Self> {
        Self::new_in(bucket_hint, &Heap)
    }
}

impl<'a, 'v, T: ?Sized, A: ?Sized + Allocator> Dict<'a, 'v, T, A> {
    pub fn new_in(bucket_hint: usize, alloc: &'a A) -> Result<Self> {
        Self::with_fns_in(bucket_hint, alloc, None, None)
    }

    /// `bucket_count` becomes `next_prime(bucket_hint)`. Missing functions
    /// fall back to FNV-1a and byte equality.
    pub fn with_fns_in(
        bucket_hint: usize,
        alloc: &'a A,
        hash_fn: Option<HashFn>,
        eq_fn: Option<EqFn>,
    ) -> Result<Self> {
        if !alloc.is_complete() {
            return Err(Error::IncompleteAllocator);
        }
        Ok(Self {
            alloc,
            buckets: Buckets::with_count(next_prime(bucket_hint), alloc)?,
            entries: Arena::new(alloc),
            keys: Array::new_in(1, alloc)?,
            hash_fn: hash_fn.unwrap_or(fnv1a64),
            eq_fn: eq_fn.unwrap_or(bytes_eq),
        })
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.count()
    }

    pub fn allocator(&self) -> &'a A {
        self.alloc
    }

    pub fn hash_fn(&self) -> HashFn {
        self.hash_fn
    }

    pub fn eq_fn(&self) -> EqFn {
        self.eq_fn
    }

    fn key_of(&self, e: &Entry<'v, T>) -> &[u8] {
        &self.keys.as_bytes()[e.key_at..e.key_at + e.key_len]
    }

    /// Bucket index and matching entry, if any.
    fn locate(&self, key: &[u8], hash: u64) -> (usize, Option<usize>) {
        let bucket = self.buckets.index_of(hash);
        let mut cur = self.buckets.head(bucket);
        while let Some(i) = cur {
            let e = self.entries.get(i);
            // Length first: eq_fn only sees slices of equal length.
            if e.key_len == key.len() && (self.eq_fn)(key, self.key_of(&e)) {
                return (bucket, Some(i));
            }
            cur = e.next;
        }
        (bucket, None)
    }

    fn find(&self, key: &[u8]) -> Option<(usize, usize)> {
        let hash = (self.hash_fn)(key);
        match self.locate(key, hash) {
            (bucket, Some(k)) => Some((bucket, k)),
            (_, None) => None,
        }
    }

    /// Value stored under `key`. A key stored with a `None` value also
    /// yields `None`; use [`Dict::contains_key`] to tell them apart.
    pub fn get(&self, key: &[u8]) -> Option<&'v T> {
        self.find(key).and_then(|(_, i)| self.entries.get(i).value)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    /// Insert or overwrite. The key bytes are copied; the value reference is
    /// stored as is, and an overwritten reference is simply forgotten.
    ///
    /// Everything that can fail (room for the entry, the key bytes and, when
    /// this insert will trigger a resize, the new table) is allocated before
    /// the dictionary is touched, so on error the dictionary is exactly as it
    /// was.
    ///
    /// ```
    /// use chained_collections::Dict;
    ///
    /// let (a, b) = (1, 2);
    /// let mut d: Dict<i32> = Dict::new(12).unwrap();
    /// d.set(b"key\0", &a).unwrap();
    /// d.set(b"key\0", &b).unwrap();
    /// assert_eq!(d.get(b"key\0"), Some(&2));
    /// assert_eq!(d.len(), 1);
    /// ```
    pub fn set(&mut self, key: &[u8], value: impl Into<Option<&'v T>>) -> Result<()> {
        let value = value.into();
        let hash = (self.hash_fn)(key);
        let (bucket, found) = self.locate(key, hash);
        if let Some(i) = found {
            let mut e = self.entries.get(i);
            e.value = value;
            self.entries.set(i, e);
            return Ok(());
        }

        let new_len = self.len() + 1;
        let key_at = self.keys.len();
        let key_end = key_at
            .checked_add(key.len())
            .ok_or(Error::CapacityOverflow)?;
        let grown = if new_len * LOAD_FACTOR >= self.bucket_count() {
            Some(Buckets::with_count(
                next_prime(new_len * LOAD_FACTOR),
                self.alloc,
            )?)
        } else {
            None
        };
        self.entries.reserve_one()?;
        if let Err(e) = self.keys.resize(key_end) {
            self.entries.release_if_empty();
            return Err(e);
        }
        self.keys.as_bytes_mut()[key_at..].copy_from_slice(key);

        let next = self.buckets.head(bucket);
        let i = self.entries.push(Entry {
            key_at,
            key_len: key.len(),
            hash,
            value,
            next,
        });
        self.buckets.set_head(bucket, Some(i));

        if let Some(fresh) = grown {
            self.relink(fresh);
        }
        Ok(())
    }

    /// Rebuild the table with `next_prime(len * LOAD_FACTOR)` buckets. Also
    /// runs automatically from [`Dict::set`]. On failure the current table is
    /// left in place.
    pub fn resize(&mut self) -> Result<()> {
        let fresh = Buckets::with_count(next_prime(self.len() * LOAD_FACTOR), self.alloc)?;
        self.relink(fresh);
        Ok(())
    }

    /// Move every entry into `fresh` by its stored hash, then swap tables.
    /// Chains are walked from bucket 0 upward, head first, and each entry is
    /// prepended to its new chain.
    fn relink(&mut self, mut fresh: Buckets<'a, A>) {
        log::trace!(
            "resizing dict: {} -> {} buckets, {} entries",
            self.buckets.count(),
            fresh.count(),
            self.entries.len()
        );
        for bucket in 0..self.buckets.count() {
            let mut cur = self.buckets.head(bucket);
            while let Some(i) = cur {
                let mut e = self.entries.get(i);
                cur = e.next;
                let target = fresh.index_of(e.hash);
                e.next = fresh.head(target);
                self.entries.set(i, e);
                fresh.set_head(target, Some(i));
            }
        }
        self.buckets = fresh;
    }

    /// Stateless iteration: the key following `previous`, or the first key
    /// when `previous` is `None`.
    ///
    /// Order is bucket order, and within a bucket most-recent-insert first.
    /// Each step re-locates `previous`, so a full pass is quadratic in the
    /// worst case. A `previous` key that is not present ends the iteration.
    /// Inserting between steps may trigger a resize, after which the
    /// traversal order is unrelated to the one before.
    ///
    /// ```
    /// use chained_collections::Dict;
    ///
    /// let mut d: Dict<()> = Dict::new(0).unwrap();
    /// d.set(b"x", None).unwrap();
    /// d.set(b"y", None).unwrap();
    ///
    /// let mut seen = 0;
    /// let mut key = d.next_key(None);
    /// while let Some(k) = key {
    ///     seen += 1;
    ///     key = d.next_key(Some(k));
    /// }
    /// assert_eq!(seen, 2);
    /// ```
    pub fn next_key(&self, previous: Option<&[u8]>) -> Option<&[u8]> {
        self.next_entry(previous)
            .map(|i| self.key_of(&self.entries.get(i)))
    }

    fn next_entry(&self, previous: Option<&[u8]>) -> Option<usize> {
        let Some(prev) = previous else {
            return self.buckets.first_head_from(0);
        };
        let (bucket, i) = self.find(prev)?;
        self.entries
            .get(i)
            .next
            .or_else(|| self.buckets.first_head_from(bucket + 1))
    }

    /// Borrowing iterator over `(key, value)` in the same order as
    /// [`Dict::next_key`], carrying a bucket + chain cursor instead of
    /// re-hashing the previous key.
    pub fn iter(&self) -> Iter<'_, 'a, 'v, T, A> {
        Iter {
            dict: self,
            bucket: 0,
            cur: None,
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> Keys<'_, 'a, 'v, T, A> {
        Keys { inner: self.iter() }
    }

    /// [`Dict::set`] with the string's bytes plus its NUL as the key.
    pub fn set_str<S>(&mut self, key: &S, value: impl Into<Option<&'v T>>) -> Result<()>
    where
        S: ?Sized + StrKey,
    {
        self.set(key.bytes_with_nul(), value)
    }

    pub fn get_str<S: ?Sized + StrKey>(&self, key: &S) -> Option<&'v T> {
        self.get(key.bytes_with_nul())
    }

    pub fn contains_str<S: ?Sized + StrKey>(&self, key: &S) -> bool {
        self.contains_key(key.bytes_with_nul())
    }

    /// [`Dict::next_key`] over string keys. The returned view's `len()`
    /// excludes the NUL. Keys that do not end in NUL were not inserted as
    /// strings and are skipped.
    pub fn next_str_key(&self, previous: Option<ScopedStr<'_>>) -> Option<ScopedStr<'_>> {
        let mut key = self.next_key(previous.map(|p| p.as_bytes_with_nul()));
        while let Some(k) = key {
            if let Some(s) = ScopedStr::from_bytes_with_nul(k) {
                return Some(s);
            }
            key = self.next_key(Some(k));
        }
        None
    }
}

impl<T: ?Sized, A: ?Sized + Allocator> core::fmt::Debug for Dict<'_, '_, T, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dict")
            .field("len", &self.len())
            .field("bucket_count", &self.bucket_count())
            .finish()
    }
}

/// Iterator over `(key, value)` pairs of a [`Dict`].
pub struct Iter<'d, 'a, 'v, T: ?Sized, A: ?Sized + Allocator> {
    dict: &'d Dict<'a, 'v, T, A>,
    // next bucket to scan once the current chain runs out
    bucket: usize,
    cur: Option<usize>,
    remaining: usize,
}

impl<'d, 'a, 'v, T: ?Sized, A: ?Sized + Allocator> Iterator for Iter<'d, 'a, 'v, T, A> {
    type Item = (&'d [u8], Option<&'v T>);

    fn next(&mut self) -> Option<Self::Item> {
        let dict = self.dict;
        while self.cur.is_none() && self.bucket < dict.buckets.count() {
            self.cur = dict.buckets.head(self.bucket);
            self.bucket += 1;
        }
        let i = self.cur?;
        let e = dict.entries.get(i);
        self.cur = e.next;
        self.remaining -= 1;
        Some((dict.key_of(&e), e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: ?Sized, A: ?Sized + Allocator> ExactSizeIterator for Iter<'_, '_, '_, T, A> {}

/// Iterator over the keys of a [`Dict`].
pub struct Keys<'d, 'a, 'v, T: ?Sized, A: ?Sized + Allocator> {
    inner: Iter<'d, 'a, 'v, T, A>,
}

impl<'d, 'a, 'v, T: ?Sized, A: ?Sized + Allocator> Iterator for Keys<'d, 'a, 'v, T, A> {
    type Item = &'d [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: ?Sized, A: ?Sized + Allocator> ExactSizeIterator for Keys<'_, '_, '_, T, A> {}

impl<'d, 'a, 'v, T: ?Sized, A: ?Sized + Allocator> IntoIterator for &'d Dict<'a, 'v, T, A> {
    type Item = (&'d [u8], Option<&'v T>);
    type IntoIter = Iter<'d, 'a, 'v, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Tracking;
    use crate::hash::is_prime;
    use std::collections::BTreeSet;

    fn zero_hash(_: &[u8]) -> u64 {
        0
    }

    /// Walk every chain and check each entry sits at `hash mod bucket_count`.
    fn assert_placement<T: ?Sized, A: ?Sized + Allocator>(d: &Dict<'_, '_, T, A>) {
        let mut reachable = 0;
        for b in 0..d.bucket_count() {
            let mut cur = d.buckets.head(b);
            while let Some(i) = cur {
                let e = d.entries.get(i);
                assert_eq!((d.hash_fn)(d.key_of(&e)), e.hash);
                assert_eq!(d.buckets.index_of(e.hash), b);
                reachable += 1;
                cur = e.next;
            }
        }
        assert_eq!(reachable, d.len());
    }

    /// Invariant: the bucket count is the next prime above the hint.
    #[test]
    fn init_rounds_hint_to_prime() {
        assert_eq!(Dict::<()>::new(12).unwrap().bucket_count(), 13);
        assert_eq!(Dict::<()>::new(0).unwrap().bucket_count(), 2);
        assert_eq!(Dict::<()>::new(1).unwrap().bucket_count(), 2);
        let d = Dict::<()>::new(12).unwrap();
        assert!(d.is_empty());
        assert_eq!((d.hash_fn())(b"abc\0"), fnv1a64(b"abc\0"));
        assert!((d.eq_fn())(b"abc", b"abc"));
    }

    /// Invariant: the seventh insert into a 13-bucket table resizes to 17
    /// buckets, and every key stays reachable.
    #[test]
    fn seventh_insert_resizes_to_seventeen() {
        let values: Vec<u32> = (0..7).collect();
        let mut d = Dict::new(12).unwrap();
        for (i, v) in values.iter().enumerate() {
            let key = format!("key{i}\0");
            d.set(key.as_bytes(), v).unwrap();
            if i < 6 {
                assert_eq!(d.bucket_count(), 13);
            }
        }
        assert_eq!(d.len(), 7);
        assert_eq!(d.bucket_count(), 17);
        for (i, v) in values.iter().enumerate() {
            assert_eq!(d.get(format!("key{i}\0").as_bytes()), Some(v));
        }
        assert_placement(&d);
    }

    /// Invariant: after any resize the table is prime and strictly more than
    /// twice the entry count.
    #[test]
    fn load_factor_restored_after_resize() {
        let mut d: Dict<()> = Dict::new(0).unwrap();
        let mut last = d.bucket_count();
        for i in 0u32..500 {
            d.set(&i.to_le_bytes(), None).unwrap();
            if d.bucket_count() != last {
                assert!(d.len() * LOAD_FACTOR < d.bucket_count());
                last = d.bucket_count();
            }
            assert!(is_prime(d.bucket_count() as u64));
        }
        assert_placement(&d);
    }

    /// Invariant: overwriting keeps the length and replaces the value.
    #[test]
    fn overwrite_replaces_value_only() {
        let (a, b) = (String::from("a"), String::from("b"));
        let mut d = Dict::new(4).unwrap();
        d.set(b"k", &a).unwrap();
        d.set(b"k", &b).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.get(b"k"), Some(&b));
        // the forgotten value is untouched
        assert_eq!(a, "a");
    }

    /// Invariant: a key stored with no value is present but has no value.
    #[test]
    fn none_value_is_present() {
        let mut d: Dict<i32> = Dict::new(4).unwrap();
        d.set(b"key\0", None).unwrap();
        assert!(d.contains_key(b"key\0"));
        assert_eq!(d.get(b"key\0"), None);
        assert!(!d.contains_key(b"key"));
    }

    /// Invariant: the empty key is a valid key distinct from any other.
    #[test]
    fn empty_key_allowed() {
        let v = 5;
        let mut d = Dict::new(4).unwrap();
        d.set(b"", &v).unwrap();
        d.set(b"\0", None).unwrap();
        assert_eq!(d.get(b""), Some(&5));
        assert_eq!(d.len(), 2);
    }

    /// Invariant: colliding keys share a chain, stay retrievable, and are
    /// visited most-recent first.
    #[test]
    fn full_collisions_chain() {
        let (x, y, z) = (1, 2, 3);
        let mut d = Dict::with_fns_in(100, &Heap, Some(zero_hash), None).unwrap();
        d.set(b"x", &x).unwrap();
        d.set(b"y", &y).unwrap();
        d.set(b"z", &z).unwrap();
        assert_eq!(d.get(b"x"), Some(&1));
        assert_eq!(d.get(b"y"), Some(&2));
        assert_eq!(d.get(b"z"), Some(&3));
        let order: Vec<&[u8]> = d.keys().collect();
        assert_eq!(order, vec![&b"z"[..], &b"y"[..], &b"x"[..]]);
        assert_placement(&d);
    }

    /// Invariant: equality is only consulted for keys of equal length.
    #[test]
    fn eq_fn_sees_equal_lengths_only() {
        fn strict_eq(a: &[u8], b: &[u8]) -> bool {
            assert_eq!(a.len(), b.len());
            a == b
        }
        let mut d: Dict<()> = Dict::with_fns_in(3, &Heap, Some(zero_hash), Some(strict_eq)).unwrap();
        for key in [&b"a"[..], &b"bb"[..], &b"ccc"[..], &b""[..], &b"bb"[..]] {
            d.set(key, None).unwrap();
        }
        assert_eq!(d.len(), 4);
        assert!(d.contains_key(b"ccc"));
        assert!(!d.contains_key(b"dddd"));
    }

    /// Invariant: a custom equality defines key identity (case-insensitive keys).
    #[test]
    fn custom_eq_and_hash_define_identity() {
        fn ci_hash(b: &[u8]) -> u64 {
            fnv1a64(&b.to_ascii_lowercase())
        }
        fn ci_eq(a: &[u8], b: &[u8]) -> bool {
            a.eq_ignore_ascii_case(b)
        }
        let (one, two) = (1, 2);
        let mut d = Dict::with_fns_in(8, &Heap, Some(ci_hash), Some(ci_eq)).unwrap();
        d.set(b"Key", &one).unwrap();
        d.set(b"KEY", &two).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.get(b"key"), Some(&2));
    }

    /// Invariant: stateless iteration and `iter` visit every key exactly once,
    /// in the same order.
    #[test]
    fn iteration_visits_each_key_once() {
        let mut d: Dict<()> = Dict::new(0).unwrap();
        for i in 0u16..200 {
            d.set(&i.to_be_bytes(), None).unwrap();
        }
        let mut stateless = Vec::new();
        let mut key = d.next_key(None);
        while let Some(k) = key {
            stateless.push(k.to_vec());
            key = d.next_key(Some(k));
        }
        let cursor: Vec<Vec<u8>> = d.keys().map(<[u8]>::to_vec).collect();
        assert_eq!(stateless, cursor);
        assert_eq!(d.iter().len(), 200);
        let distinct: BTreeSet<Vec<u8>> = cursor.into_iter().collect();
        assert_eq!(distinct.len(), 200);
    }

    #[test]
    fn iteration_of_empty_and_unknown_previous() {
        let mut d: Dict<()> = Dict::new(12).unwrap();
        assert_eq!(d.next_key(None), None);
        assert_eq!(d.iter().next(), None);
        d.set(b"present", None).unwrap();
        assert_eq!(d.next_key(Some(b"absent")), None);
    }

    /// Invariant: string wrappers include the NUL in the key and strip it
    /// when iterating.
    #[test]
    fn string_keys_include_terminator() {
        let v = 99;
        let mut d = Dict::new(12).unwrap();
        d.set_str(c"key", &v).unwrap();
        assert_eq!(d.get(b"key\0"), Some(&99));
        assert_eq!(d.get(b"key"), None);
        assert!(d.contains_str(c"key"));
        assert_eq!(d.get_str(c"key"), Some(&99));

        d.set(b"raw", None).unwrap();
        let first = d.next_str_key(None).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first.as_bytes(), b"key");
        assert!(d.next_str_key(Some(first)).is_none());
    }

    /// Invariant: a failed insert leaves length, table and contents unchanged
    /// and leaks nothing.
    #[test]
    fn failed_insert_unwinds() {
        let alloc = Tracking::new(Heap);
        let mut d: Dict<(), _> = Dict::new_in(2, &alloc).unwrap();
        d.set(b"a", None).unwrap();
        let blocks = alloc.live_blocks();

        // second insert triggers a resize: table allocation fails
        alloc.fail_after(0);
        assert!(matches!(d.set(b"b", None), Err(Error::AllocFailed { .. })));
        // table succeeds, key copy fails
        alloc.fail_after(1);
        assert!(matches!(d.set(b"b", None), Err(Error::AllocFailed { .. })));
        alloc.never_fail();

        assert_eq!(alloc.live_blocks(), blocks);
        assert_eq!(d.len(), 1);
        assert_eq!(d.bucket_count(), 3);
        assert!(!d.contains_key(b"b"));
        assert_placement(&d);

        d.set(b"b", None).unwrap();
        assert_eq!(d.len(), 2);
        drop(d);
        assert_eq!(alloc.live_blocks(), 0);
    }

    /// Invariant: when the very first insert fails part-way, every block it
    /// obtained is handed back.
    #[test]
    fn failed_first_insert_releases_everything() {
        let alloc = Tracking::new(Heap);
        let mut d: Dict<(), _> = Dict::new_in(0, &alloc).unwrap();
        assert_eq!(alloc.live_blocks(), 1);

        // new table, then the entry arena, then the key bytes
        for successes in 0..3 {
            alloc.fail_after(successes);
            assert!(matches!(d.set(b"first", None), Err(Error::AllocFailed { .. })));
            assert_eq!(alloc.live_blocks(), 1);
            assert!(d.is_empty());
            assert_eq!(d.bucket_count(), 2);
        }
        alloc.never_fail();

        d.set(b"first", None).unwrap();
        // table, entry arena, key bytes
        assert_eq!(alloc.live_blocks(), 3);
        assert_placement(&d);
    }

    /// Invariant: an explicit resize keeps every entry reachable.
    #[test]
    fn explicit_resize() {
        let mut d: Dict<()> = Dict::new(100).unwrap();
        for k in [&b"a"[..], &b"b"[..], &b"c"[..]] {
            d.set(k, None).unwrap();
        }
        d.resize().unwrap();
        assert_eq!(d.bucket_count(), 7);
        assert_placement(&d);
        assert!(d.contains_key(b"c"));
    }

    #[test]
    fn incomplete_allocator_rejected() {
        let none = crate::alloc::FnAllocator::default();
        assert!(matches!(
            Dict::<(), _>::new_in(4, &none),
            Err(Error::IncompleteAllocator)
        ));
    }
}
