//! Trie node taxonomy.
//!
//! Every node except [`INode`] is immutable once published. Mutation happens
//! exclusively by CAS on an `INode`'s main reference; displaced main nodes
//! are handed to the epoch collector so in-flight readers stay valid.

use std::borrow::Borrow;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam_epoch::{Atomic, Guard, Owned, Shared};

use crate::hash::{flag, FlagPos};

/// One key/value pair held in a leaf.
#[derive(Clone)]
pub(crate) struct Pair<K, V> {
    pub key: K,
    pub value: V,
}

/// Leaf node: one or more pairs sharing one mixed hash.
///
/// A `Multi` leaf is a collision bucket; its pairs keep insertion order,
/// which is only observable through iteration.
#[derive(Clone)]
pub(crate) enum SNode<K, V> {
    Single { hash: u32, pair: Pair<K, V> },
    Multi { hash: u32, pairs: Box<[Pair<K, V>]> },
}

impl<K, V> SNode<K, V> {
    pub(crate) fn single(hash: u32, key: K, value: V) -> Self {
        SNode::Single {
            hash,
            pair: Pair { key, value },
        }
    }

    /// The mixed hash shared by every pair in this leaf.
    pub(crate) fn hash(&self) -> u32 {
        match self {
            SNode::Single { hash, .. } | SNode::Multi { hash, .. } => *hash,
        }
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            SNode::Single { pair, .. } => (pair.key.borrow() == key).then_some(&pair.value),
            SNode::Multi { pairs, .. } => {
                pairs.iter().find(|p| p.key.borrow() == key).map(|p| &p.value)
            }
        }
    }
}

impl<K: Clone + Eq, V: Clone> SNode<K, V> {
    /// Returns a copy in which `key` maps to `value`, widening a singleton
    /// into a collision bucket when a second key arrives.
    pub(crate) fn put(&self, key: &K, value: &V) -> SNode<K, V> {
        match self {
            SNode::Single { hash, pair } => {
                if pair.key == *key {
                    SNode::single(*hash, key.clone(), value.clone())
                } else {
                    let pairs = vec![
                        pair.clone(),
                        Pair {
                            key: key.clone(),
                            value: value.clone(),
                        },
                    ];
                    SNode::Multi {
                        hash: *hash,
                        pairs: pairs.into_boxed_slice(),
                    }
                }
            }
            SNode::Multi { hash, pairs } => {
                let mut pairs = pairs.to_vec();
                match pairs.iter_mut().find(|p| p.key == *key) {
                    Some(p) => p.value = value.clone(),
                    None => pairs.push(Pair {
                        key: key.clone(),
                        value: value.clone(),
                    }),
                }
                SNode::Multi {
                    hash: *hash,
                    pairs: pairs.into_boxed_slice(),
                }
            }
        }
    }

    /// Returns a copy with `key` gone, or `None` when the last pair goes and
    /// the slot itself must vanish. A two-pair bucket collapses back to a
    /// singleton.
    ///
    /// Callers only invoke this for a key they have just observed in the
    /// leaf.
    pub(crate) fn removed<Q>(&self, key: &Q) -> Option<SNode<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            SNode::Single { .. } => None,
            SNode::Multi { hash, pairs } => {
                let idx = pairs
                    .iter()
                    .position(|p| p.key.borrow() == key)
                    .expect("leaf removal of an absent key");
                if pairs.len() == 2 {
                    let survivor = pairs[(idx + 1) % 2].clone();
                    Some(SNode::Single {
                        hash: *hash,
                        pair: survivor,
                    })
                } else {
                    let mut pairs = pairs.to_vec();
                    pairs.remove(idx);
                    Some(SNode::Multi {
                        hash: *hash,
                        pairs: pairs.into_boxed_slice(),
                    })
                }
            }
        }
    }

    /// Iterator stepping: the first pair when `current` is `None`, otherwise
    /// the pair after the one whose key equals `current`. A `current` no
    /// longer present yields `None`.
    pub(crate) fn next_entry(&self, current: Option<&K>) -> Option<&Pair<K, V>> {
        match self {
            SNode::Single { pair, .. } => match current {
                None => Some(pair),
                Some(_) => None,
            },
            SNode::Multi { pairs, .. } => match current {
                None => pairs.first(),
                Some(key) => {
                    let idx = pairs.iter().position(|p| p.key == *key)?;
                    pairs.get(idx + 1)
                }
            },
        }
    }
}

/// A slot in a `CNode`'s child array.
///
/// Indirections are reference-counted so copy-on-write generations of the
/// parent alias the same `INode`; the trie's identity semantics depend on
/// that sharing.
#[derive(Clone)]
pub(crate) enum Branch<K, V> {
    Indirect(Arc<INode<K, V>>),
    Leaf(SNode<K, V>),
}

/// What an `INode` may point at: a branching node or a tombed leaf awaiting
/// contraction into its parent.
pub(crate) enum MainNode<K, V> {
    Branches(CNode<K, V>),
    Tomb(SNode<K, V>),
}

/// Branching node: occupancy bitmap plus compact, hash-ordered child array.
pub(crate) struct CNode<K, V> {
    pub bitmap: u64,
    pub array: Box<[Branch<K, V>]>,
}

impl<K, V> CNode<K, V> {
    pub(crate) fn empty() -> Self {
        CNode {
            bitmap: 0,
            array: Vec::new().into_boxed_slice(),
        }
    }

    /// Joins two leaves whose hashes collide at `level` into a subtree that
    /// separates them, descending a level at a time until their flags differ.
    ///
    /// Never called with equal hashes; a full 32-bit collision is handled by
    /// widening the leaf instead.
    pub(crate) fn merging(sn1: SNode<K, V>, sn2: SNode<K, V>, level: u32, width: u32) -> CNode<K, V> {
        debug_assert_ne!(sn1.hash(), sn2.hash());
        let f1 = flag(sn1.hash(), level, width);
        let f2 = flag(sn2.hash(), level, width);
        if f1 == f2 {
            let deeper = CNode::merging(sn1, sn2, level + width, width);
            let sub = INode::new(MainNode::Branches(deeper));
            CNode {
                bitmap: f1,
                array: vec![Branch::Indirect(Arc::new(sub))].into_boxed_slice(),
            }
        } else {
            // u64 comparison is already unsigned, so slot 0 sorts before the
            // sign-bit slots without any bias.
            let (first, second) = if f1 < f2 { (sn1, sn2) } else { (sn2, sn1) };
            CNode {
                bitmap: f1 | f2,
                array: vec![Branch::Leaf(first), Branch::Leaf(second)].into_boxed_slice(),
            }
        }
    }
}

impl<K: Clone, V: Clone> CNode<K, V> {
    /// Copy with `sn` inserted at the flag's position. The flag must be
    /// unset.
    pub(crate) fn inserted(&self, fp: &FlagPos, sn: SNode<K, V>) -> CNode<K, V> {
        debug_assert_eq!(self.bitmap & fp.flag, 0);
        let mut array = Vec::with_capacity(self.array.len() + 1);
        array.extend_from_slice(&self.array[..fp.pos]);
        array.push(Branch::Leaf(sn));
        array.extend_from_slice(&self.array[fp.pos..]);
        CNode {
            bitmap: self.bitmap | fp.flag,
            array: array.into_boxed_slice(),
        }
    }

    /// Copy with the child at `pos` replaced.
    pub(crate) fn updated(&self, pos: usize, branch: Branch<K, V>) -> CNode<K, V> {
        let mut array = self.array.to_vec();
        array[pos] = branch;
        CNode {
            bitmap: self.bitmap,
            array: array.into_boxed_slice(),
        }
    }

    /// Copy with the child at the flag's position removed and the flag
    /// cleared.
    pub(crate) fn removed(&self, fp: &FlagPos) -> CNode<K, V> {
        debug_assert_ne!(self.bitmap & fp.flag, 0);
        let mut array = self.array.to_vec();
        array.remove(fp.pos);
        CNode {
            bitmap: self.bitmap ^ fp.flag,
            array: array.into_boxed_slice(),
        }
    }
}

/// Indirection node: the only mutable node in the trie.
///
/// Holds a single atomic reference to the current [`MainNode`]. Loads are
/// acquire and the CAS publishes with release, so a reader that sees a new
/// main also sees every write that built it.
pub(crate) struct INode<K, V> {
    main: Atomic<MainNode<K, V>>,
}

impl<K, V> INode<K, V> {
    pub(crate) fn new(main: MainNode<K, V>) -> Self {
        INode {
            main: Atomic::new(main),
        }
    }

    pub(crate) fn load<'g>(&self, guard: &'g Guard) -> Shared<'g, MainNode<K, V>> {
        self.main.load(Ordering::Acquire, guard)
    }

    /// Swings the main reference from `current` to `update`. On success the
    /// displaced main is retired to the collector; concurrent readers that
    /// still hold it stay pinned until their guards drop.
    pub(crate) fn cas(
        &self,
        current: Shared<'_, MainNode<K, V>>,
        update: MainNode<K, V>,
        guard: &Guard,
    ) -> bool {
        match self.main.compare_exchange(
            current,
            Owned::new(update),
            Ordering::Release,
            Ordering::Relaxed,
            guard,
        ) {
            Ok(_) => {
                unsafe { guard.defer_destroy(current) };
                true
            }
            Err(_) => false,
        }
    }
}

impl<K, V> Drop for INode<K, V> {
    fn drop(&mut self) {
        // The last reference holder frees the current main directly. Any
        // reader that could still observe it pinned an epoch before the
        // retirement that scheduled this drop.
        let main = std::mem::replace(&mut self.main, Atomic::null());
        unsafe { drop(main.into_owned()) };
    }
}
