//! The lock-free trie engine and its public map facade.
//!
//! All three traversals (lookup, insert, delete) descend from the root
//! indirection node and mutate the trie only by CAS on an `INode`'s main
//! reference. A failed CAS restarts the whole operation from the root; a
//! tombed main encountered on the way down obligates the observer to help
//! contract it before restarting. Progress is lock-free: every contention
//! cycle either commits some CAS or advances cleanup.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crossbeam_epoch::{self as epoch, Guard};
use foldhash::fast::FixedState;

use crate::hash::{self, flag_pos, FlagPos, DEFAULT_WIDTH, MAX_WIDTH, MIN_WIDTH};
use crate::iter::{Iter, Keys};
use crate::node::{Branch, CNode, INode, MainNode, SNode};

/// Outcome of one descent from the root.
///
/// `Restart` bubbles to the top-level retry loop; `Rejected` reports a
/// constraint miss together with the observed value.
enum Outcome<T> {
    Done(Option<T>),
    Restart,
    Rejected(Option<T>),
}

/// Precondition attached to a write.
enum Constraint<'a, V> {
    None,
    IfAbsent,
    IfMapped,
    IfMappedTo(&'a V),
}

impl<'a, V> Clone for Constraint<'a, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, V> Copy for Constraint<'a, V> {}

impl<V> Constraint<'_, V> {
    fn requires_mapping(&self) -> bool {
        matches!(self, Constraint::IfMapped | Constraint::IfMappedTo(_))
    }
}

/// Spin delay between restarts of a top-level operation.
///
/// A restart means the descent lost an `INode` CAS race or stopped to help
/// contract a tombed subtree, so the same path is about to be retraced from
/// the root. Widening the pause with each consecutive restart keeps lockstep
/// losers from re-colliding on the same contended indirection.
struct Backoff {
    restarts: u32,
}

impl Backoff {
    /// Longest pause, as a power of two spin hints.
    const CEILING: u32 = 8;

    #[inline]
    fn new() -> Self {
        Self { restarts: 0 }
    }

    #[inline]
    fn spin(&mut self) {
        if self.restarts < Self::CEILING {
            self.restarts += 1;
        }
        for _ in 0..(1u32 << self.restarts) {
            std::hint::spin_loop();
        }
    }
}

/// Lock-free concurrent map backed by a hash array mapped trie.
///
/// Every operation takes `&self`; the map is meant to be shared across
/// threads behind an [`Arc`]. Lookups, inserts, conditional updates and
/// removals are linearizable at the CAS (or atomic load) that commits them.
/// Iteration is weakly consistent: it never blocks writers and never yields
/// the same key twice, but entries inserted or removed mid-iteration may or
/// may not appear.
///
/// Keys and values are cloned into the trie's immutable leaves, so both must
/// be `Clone`; cheap-to-clone types (or [`Arc`]-wrapped payloads) work best.
pub struct TrieMap<K, V, S = FixedState> {
    root: INode<K, V>,
    width: u32,
    hasher: S,
}

impl<K, V> TrieMap<K, V, FixedState> {
    /// Creates an empty map with the default fan-out of 64 children per
    /// level.
    pub fn new() -> Self {
        Self::with_width(DEFAULT_WIDTH)
    }

    /// Creates an empty map consuming `width` hash bits per level.
    ///
    /// `width` is clamped to `[1, 6]`. Small widths make a deep, narrow trie
    /// and are mostly useful for testing the deep-structure paths.
    pub fn with_width(width: u32) -> Self {
        Self::with_width_and_hasher(width, FixedState::default())
    }
}

impl<K, V, S> TrieMap<K, V, S> {
    /// Creates an empty map that hashes keys with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_width_and_hasher(DEFAULT_WIDTH, hasher)
    }

    /// Creates an empty map with both the fan-out exponent and the hasher
    /// supplied by the caller. `width` is clamped to `[1, 6]`.
    pub fn with_width_and_hasher(width: u32, hasher: S) -> Self {
        TrieMap {
            root: INode::new(MainNode::Branches(CNode::empty())),
            width: width.clamp(MIN_WIDTH, MAX_WIDTH),
            hasher,
        }
    }

    /// The fan-out exponent this map was built with.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        let guard = epoch::pin();
        match unsafe { self.root.load(&guard).deref() } {
            MainNode::Branches(cn) => cn.bitmap == 0,
            MainNode::Tomb(_) => unreachable!("tombed main at the root"),
        }
    }

    /// Removes every entry.
    ///
    /// Concurrent writers may repopulate the map before this returns; each
    /// root swap is itself atomic.
    pub fn clear(&self) {
        let guard = epoch::pin();
        loop {
            let main = self.root.load(&guard);
            if self.root.cas(main, MainNode::Branches(CNode::empty()), &guard) {
                return;
            }
        }
    }

    fn hash_of<Q>(&self, key: &Q) -> u32
    where
        Q: Hash + ?Sized,
        S: BuildHasher,
    {
        hash::mix(hash::fold(self.hasher.hash_one(key)))
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

impl<K, V, S> TrieMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Returns the value mapped to `key`, or `None` when absent.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        let guard = epoch::pin();
        let mut backoff = Backoff::new();
        loop {
            match self.lookup_at(&self.root, hash, key, 0, None, &guard) {
                Outcome::Done(value) => return value,
                Outcome::Restart => backoff.spin(),
                Outcome::Rejected(_) => unreachable!("lookup evaluates no constraint"),
            }
        }
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    fn lookup_at<Q>(
        &self,
        i: &INode<K, V>,
        hash: u32,
        key: &Q,
        level: u32,
        parent: Option<&INode<K, V>>,
        guard: &Guard,
    ) -> Outcome<V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let main = i.load(guard);
        match unsafe { main.deref() } {
            MainNode::Branches(cn) => {
                let fp = flag_pos(hash, level, cn.bitmap, self.width);
                if cn.bitmap & fp.flag == 0 {
                    return Outcome::Done(None);
                }
                match &cn.array[fp.pos] {
                    Branch::Indirect(sub) => {
                        self.lookup_at(sub, hash, key, level + self.width, Some(i), guard)
                    }
                    Branch::Leaf(sn) if sn.hash() == hash => Outcome::Done(sn.get(key).cloned()),
                    Branch::Leaf(_) => Outcome::Done(None),
                }
            }
            MainNode::Tomb(_) => {
                let parent = parent.expect("tombed main at the root");
                self.clean(parent, level - self.width, guard);
                Outcome::Restart
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

impl<K, V, S> TrieMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
    S: BuildHasher,
{
    /// Maps `key` to `value`, returning the previously mapped value if any.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.insert_with(key, value, Constraint::None)
    }

    /// Maps `key` to `value` only if `key` is currently unmapped.
    ///
    /// Returns `None` when the insert took effect, or the existing value
    /// when it did not.
    pub fn insert_if_absent(&self, key: K, value: V) -> Option<V> {
        self.insert_with(key, value, Constraint::IfAbsent)
    }

    /// Replaces the value mapped to `key` only if `key` is currently mapped.
    ///
    /// Returns the previous value, or `None` when `key` was unmapped and
    /// nothing happened.
    pub fn replace(&self, key: K, value: V) -> Option<V> {
        self.insert_with(key, value, Constraint::IfMapped)
    }

    /// Replaces the value mapped to `key` only if it currently equals
    /// `expected`. Returns `true` iff the replacement took effect.
    pub fn replace_if(&self, key: K, expected: &V, value: V) -> bool {
        let hash = self.hash_of(&key);
        let guard = epoch::pin();
        let mut backoff = Backoff::new();
        loop {
            let cons = Constraint::IfMappedTo(expected);
            match self.insert_at(&self.root, hash, &key, &value, 0, None, cons, &guard) {
                Outcome::Done(prev) => return prev.is_some(),
                Outcome::Restart => backoff.spin(),
                Outcome::Rejected(_) => return false,
            }
        }
    }

    /// Unmaps `key`, returning the value it was mapped to.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        let guard = epoch::pin();
        let mut backoff = Backoff::new();
        loop {
            match self.remove_at(&self.root, hash, key, 0, None, Constraint::None, &guard) {
                Outcome::Done(prev) => return prev,
                Outcome::Restart => backoff.spin(),
                Outcome::Rejected(_) => unreachable!("unconditional remove rejected"),
            }
        }
    }

    /// Unmaps `key` only if it is currently mapped to `expected`. Returns
    /// `true` iff the removal took effect.
    pub fn remove_if<Q>(&self, key: &Q, expected: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        let guard = epoch::pin();
        let mut backoff = Backoff::new();
        loop {
            let cons = Constraint::IfMappedTo(expected);
            match self.remove_at(&self.root, hash, key, 0, None, cons, &guard) {
                Outcome::Done(prev) => return prev.is_some(),
                Outcome::Restart => backoff.spin(),
                Outcome::Rejected(_) => return false,
            }
        }
    }

    fn insert_with(&self, key: K, value: V, cons: Constraint<'_, V>) -> Option<V> {
        let hash = self.hash_of(&key);
        let guard = epoch::pin();
        let mut backoff = Backoff::new();
        loop {
            match self.insert_at(&self.root, hash, &key, &value, 0, None, cons, &guard) {
                Outcome::Done(prev) => return prev,
                Outcome::Restart => backoff.spin(),
                // IfAbsent reports the existing value, IfMapped reports the
                // absence that blocked the write.
                Outcome::Rejected(prev) => return prev,
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_at(
        &self,
        i: &INode<K, V>,
        hash: u32,
        key: &K,
        value: &V,
        level: u32,
        parent: Option<&INode<K, V>>,
        cons: Constraint<'_, V>,
        guard: &Guard,
    ) -> Outcome<V> {
        let main = i.load(guard);
        match unsafe { main.deref() } {
            MainNode::Branches(cn) => {
                let fp = flag_pos(hash, level, cn.bitmap, self.width);
                if cn.bitmap & fp.flag == 0 {
                    if cons.requires_mapping() {
                        return Outcome::Rejected(None);
                    }
                    let sn = SNode::single(hash, key.clone(), value.clone());
                    let ncn = cn.inserted(&fp, sn);
                    return if i.cas(main, MainNode::Branches(ncn), guard) {
                        Outcome::Done(None)
                    } else {
                        Outcome::Restart
                    };
                }
                match &cn.array[fp.pos] {
                    Branch::Indirect(sub) => {
                        self.insert_at(sub, hash, key, value, level + self.width, Some(i), cons, guard)
                    }
                    Branch::Leaf(sn) if sn.hash() == hash => {
                        let prev = sn.get(key);
                        match cons {
                            Constraint::IfAbsent if prev.is_some() => {
                                return Outcome::Rejected(prev.cloned());
                            }
                            Constraint::IfMapped | Constraint::IfMappedTo(_)
                                if prev.is_none() =>
                            {
                                return Outcome::Rejected(None);
                            }
                            Constraint::IfMappedTo(expected) if prev != Some(expected) => {
                                return Outcome::Rejected(prev.cloned());
                            }
                            _ => {}
                        }
                        let prev = prev.cloned();
                        let ncn = cn.updated(fp.pos, Branch::Leaf(sn.put(key, value)));
                        if i.cas(main, MainNode::Branches(ncn), guard) {
                            Outcome::Done(prev)
                        } else {
                            Outcome::Restart
                        }
                    }
                    Branch::Leaf(sn) => {
                        // Same slot by hash prefix, different full hash: the
                        // two leaves move one level down together.
                        if cons.requires_mapping() {
                            return Outcome::Rejected(None);
                        }
                        let nsn = SNode::single(hash, key.clone(), value.clone());
                        let sub = CNode::merging(sn.clone(), nsn, level + self.width, self.width);
                        let branch = Branch::Indirect(Arc::new(INode::new(MainNode::Branches(sub))));
                        let ncn = cn.updated(fp.pos, branch);
                        if i.cas(main, MainNode::Branches(ncn), guard) {
                            Outcome::Done(None)
                        } else {
                            Outcome::Restart
                        }
                    }
                }
            }
            MainNode::Tomb(_) => {
                let parent = parent.expect("tombed main at the root");
                self.clean(parent, level - self.width, guard);
                Outcome::Restart
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn remove_at<Q>(
        &self,
        i: &INode<K, V>,
        hash: u32,
        key: &Q,
        level: u32,
        parent: Option<&INode<K, V>>,
        cons: Constraint<'_, V>,
        guard: &Guard,
    ) -> Outcome<V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let main = i.load(guard);
        match unsafe { main.deref() } {
            MainNode::Branches(cn) => {
                let fp = flag_pos(hash, level, cn.bitmap, self.width);
                if cn.bitmap & fp.flag == 0 {
                    return Outcome::Done(None);
                }
                let res = match &cn.array[fp.pos] {
                    Branch::Indirect(sub) => {
                        self.remove_at(sub, hash, key, level + self.width, Some(i), cons, guard)
                    }
                    Branch::Leaf(sn) if sn.hash() == hash => {
                        self.remove_leaf(i, main, cn, &fp, sn, key, level, cons, guard)
                    }
                    Branch::Leaf(_) => Outcome::Done(None),
                };
                if matches!(res, Outcome::Done(Some(_)) | Outcome::Rejected(_)) {
                    // The removal may have tombed this node; splice it out
                    // of the parent before reporting.
                    if let Some(parent) = parent {
                        if matches!(unsafe { i.load(guard).deref() }, MainNode::Tomb(_)) {
                            self.clean_parent(parent, i, hash, level - self.width, guard);
                        }
                    }
                }
                res
            }
            MainNode::Tomb(_) => {
                let parent = parent.expect("tombed main at the root");
                self.clean(parent, level - self.width, guard);
                Outcome::Restart
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn remove_leaf<Q>(
        &self,
        i: &INode<K, V>,
        main: epoch::Shared<'_, MainNode<K, V>>,
        cn: &CNode<K, V>,
        fp: &FlagPos,
        sn: &SNode<K, V>,
        key: &Q,
        level: u32,
        cons: Constraint<'_, V>,
        guard: &Guard,
    ) -> Outcome<V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let Some(prev) = sn.get(key) else {
            return Outcome::Done(None);
        };
        if let Constraint::IfMappedTo(expected) = cons {
            if prev != expected {
                return Outcome::Rejected(Some(prev.clone()));
            }
        }
        let prev = prev.clone();
        let replacement = match sn.removed(key) {
            Some(nsn) => MainNode::Branches(cn.updated(fp.pos, Branch::Leaf(nsn))),
            // The slot vanishes; the node may now contract to a tomb.
            None => self.to_contracted(cn.removed(fp), level),
        };
        if i.cas(main, replacement, guard) {
            Outcome::Done(Some(prev))
        } else {
            Outcome::Restart
        }
    }
}

// ---------------------------------------------------------------------------
// Compression protocol
// ---------------------------------------------------------------------------

impl<K: Clone, V: Clone, S> TrieMap<K, V, S> {
    /// Helps compress an indirection whose subtree was observed tombed.
    /// CAS failure means some other thread already helped.
    pub(crate) fn clean(&self, i: &INode<K, V>, level: u32, guard: &Guard) {
        let main = i.load(guard);
        if let MainNode::Branches(cn) = unsafe { main.deref() } {
            let _ = i.cas(main, self.to_compressed(cn, level, guard), guard);
        }
    }

    /// Copy of `cn` with every tombed child indirection resurrected back to
    /// its leaf, then contracted if only a single leaf is left.
    fn to_compressed(&self, cn: &CNode<K, V>, level: u32, guard: &Guard) -> MainNode<K, V> {
        let array: Vec<Branch<K, V>> = cn
            .array
            .iter()
            .map(|branch| {
                if let Branch::Indirect(sub) = branch {
                    if let MainNode::Tomb(sn) = unsafe { sub.load(guard).deref() } {
                        return Branch::Leaf(sn.clone());
                    }
                }
                branch.clone()
            })
            .collect();
        let ncn = CNode {
            bitmap: cn.bitmap,
            array: array.into_boxed_slice(),
        };
        self.to_contracted(ncn, level)
    }

    /// A non-root node left holding a single leaf becomes that leaf's tomb,
    /// signalling the parent to splice the leaf in directly. The root is
    /// never contracted.
    fn to_contracted(&self, cn: CNode<K, V>, level: u32) -> MainNode<K, V> {
        if level > 0 && cn.array.len() == 1 {
            if let Branch::Leaf(_) = &cn.array[0] {
                let Some(Branch::Leaf(sn)) = cn.array.into_vec().pop() else {
                    unreachable!("length-one leaf array");
                };
                return MainNode::Tomb(sn);
            }
        }
        MainNode::Branches(cn)
    }

    /// Splices a tombed child out of `parent`: the tomb's leaf replaces the
    /// indirection in the parent's array. Retries until the parent no longer
    /// references `i` or the splice lands.
    fn clean_parent(
        &self,
        parent: &INode<K, V>,
        i: &INode<K, V>,
        hash: u32,
        level: u32,
        guard: &Guard,
    ) {
        loop {
            let main = i.load(guard);
            let pmain = parent.load(guard);
            let MainNode::Branches(pcn) = (unsafe { pmain.deref() }) else {
                return;
            };
            let fp = flag_pos(hash, level, pcn.bitmap, self.width);
            if pcn.bitmap & fp.flag == 0 {
                return;
            }
            let Branch::Indirect(sub) = &pcn.array[fp.pos] else {
                return;
            };
            if !std::ptr::eq(Arc::as_ptr(sub), i) {
                return;
            }
            let MainNode::Tomb(sn) = (unsafe { main.deref() }) else {
                return;
            };
            let ncn = pcn.updated(fp.pos, Branch::Leaf(sn.clone()));
            if parent.cas(pmain, self.to_contracted(ncn, level), guard) {
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Iteration support
// ---------------------------------------------------------------------------

impl<K, V, S> TrieMap<K, V, S>
where
    K: Eq + Clone,
    V: Clone,
{
    /// Returns an iterator over `(K, V)` clones in mixed-hash order.
    ///
    /// The iterator is weakly consistent: it tolerates concurrent writers,
    /// never yields the same key twice in one traversal, and makes no
    /// snapshot guarantee for entries mutated mid-iteration.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self)
    }

    /// Returns an iterator over the keys, with [`iter`](Self::iter)'s
    /// consistency.
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys::new(self)
    }

    /// Counts the entries by iterating the whole trie.
    ///
    /// O(N), best-effort under concurrent mutation; prefer
    /// [`is_empty`](Self::is_empty) for the emptiness check.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// The first leaf in hash order, or `None` for an empty trie.
    pub(crate) fn first_snode(&self) -> Option<SNode<K, V>> {
        let guard = epoch::pin();
        let mut backoff = Backoff::new();
        loop {
            match self.lookup_first_at(&self.root, 0, None, &guard) {
                Outcome::Done(sn) => return sn,
                Outcome::Restart => backoff.spin(),
                Outcome::Rejected(_) => unreachable!("iteration evaluates no constraint"),
            }
        }
    }

    /// The first leaf whose hash is strictly greater than `hash`.
    pub(crate) fn snode_after(&self, hash: u32) -> Option<SNode<K, V>> {
        let guard = epoch::pin();
        let mut backoff = Backoff::new();
        loop {
            match self.lookup_next_at(&self.root, hash, 0, None, &guard) {
                Outcome::Done(sn) => return sn,
                Outcome::Restart => backoff.spin(),
                Outcome::Rejected(_) => unreachable!("iteration evaluates no constraint"),
            }
        }
    }

    fn lookup_first_at(
        &self,
        i: &INode<K, V>,
        level: u32,
        parent: Option<&INode<K, V>>,
        guard: &Guard,
    ) -> Outcome<SNode<K, V>> {
        let main = i.load(guard);
        match unsafe { main.deref() } {
            MainNode::Branches(cn) => {
                if cn.bitmap == 0 {
                    Outcome::Done(None)
                } else {
                    self.pickup_first(&cn.array[0], level, i, guard)
                }
            }
            MainNode::Tomb(_) => {
                let parent = parent.expect("tombed main at the root");
                self.clean(parent, level - self.width, guard);
                Outcome::Restart
            }
        }
    }

    /// Descends as if looking up `hash`, but where the search would bottom
    /// out it backs up and takes the next sibling slot instead.
    fn lookup_next_at(
        &self,
        i: &INode<K, V>,
        hash: u32,
        level: u32,
        parent: Option<&INode<K, V>>,
        guard: &Guard,
    ) -> Outcome<SNode<K, V>> {
        let main = i.load(guard);
        match unsafe { main.deref() } {
            MainNode::Branches(cn) => {
                let fp = flag_pos(hash, level, cn.bitmap, self.width);
                if cn.bitmap & fp.flag == 0 {
                    return self.pickup_sibling(cn, &fp, 0, level, i, guard);
                }
                match &cn.array[fp.pos] {
                    Branch::Indirect(sub) => {
                        match self.lookup_next_at(sub, hash, level + self.width, Some(i), guard) {
                            Outcome::Done(Some(sn)) => Outcome::Done(Some(sn)),
                            Outcome::Done(None) => self.pickup_sibling(cn, &fp, 1, level, i, guard),
                            Outcome::Restart => Outcome::Restart,
                            Outcome::Rejected(_) => {
                                unreachable!("iteration evaluates no constraint")
                            }
                        }
                    }
                    Branch::Leaf(sn) => {
                        if hash >= sn.hash() {
                            self.pickup_sibling(cn, &fp, 1, level, i, guard)
                        } else {
                            Outcome::Done(Some(sn.clone()))
                        }
                    }
                }
            }
            MainNode::Tomb(_) => {
                let parent = parent.expect("tombed main at the root");
                self.clean(parent, level - self.width, guard);
                Outcome::Restart
            }
        }
    }

    fn pickup_sibling(
        &self,
        cn: &CNode<K, V>,
        fp: &FlagPos,
        offset: usize,
        level: u32,
        parent: &INode<K, V>,
        guard: &Guard,
    ) -> Outcome<SNode<K, V>> {
        if fp.pos + offset < cn.array.len() {
            self.pickup_first(&cn.array[fp.pos + offset], level, parent, guard)
        } else {
            Outcome::Done(None)
        }
    }

    fn pickup_first(
        &self,
        branch: &Branch<K, V>,
        level: u32,
        parent: &INode<K, V>,
        guard: &Guard,
    ) -> Outcome<SNode<K, V>> {
        match branch {
            Branch::Indirect(sub) => self.lookup_first_at(sub, level + self.width, Some(parent), guard),
            Branch::Leaf(sn) => Outcome::Done(Some(sn.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V> Default for TrieMap<K, V, FixedState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for TrieMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrieMap")
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl<K, V, S> Extend<(K, V)> for TrieMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for TrieMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_width_and_hasher(DEFAULT_WIDTH, S::default());
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a TrieMap<K, V, S>
where
    K: Eq + Clone,
    V: Clone,
{
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Iter<'a, K, V, S> {
        self.iter()
    }
}
