//! Weakly consistent, hash-ordered iteration.
//!
//! The iterator never holds a pointer into the live trie between steps.
//! It remembers the leaf it is walking as an owned clone and re-descends
//! from the root (by the leaf's hash) to find the next one, so concurrent
//! writers are never blocked and reclamation is never pinned across user
//! code. Entries that live through the whole traversal are yielded exactly
//! once; entries mutated mid-traversal may or may not appear.

use crate::node::{Pair, SNode};
use crate::trie::TrieMap;

/// Iterator over `(K, V)` clones of a [`TrieMap`], in mixed-hash order.
///
/// Created by [`TrieMap::iter`].
pub struct Iter<'a, K, V, S> {
    map: &'a TrieMap<K, V, S>,
    snode: Option<SNode<K, V>>,
    pair: Option<Pair<K, V>>,
}

impl<'a, K, V, S> Iter<'a, K, V, S>
where
    K: Eq + Clone,
    V: Clone,
{
    pub(crate) fn new(map: &'a TrieMap<K, V, S>) -> Self {
        let mut iter = Iter {
            map,
            snode: None,
            pair: None,
        };
        iter.advance();
        iter
    }

    fn advance(&mut self) {
        if self.snode.is_none() {
            self.snode = self.map.first_snode();
        }
        let Some(sn) = &self.snode else {
            self.pair = None;
            return;
        };
        match sn.next_entry(self.pair.as_ref().map(|p| &p.key)) {
            Some(pair) => self.pair = Some(pair.clone()),
            None => {
                // Current leaf exhausted; hop to the next one by hash.
                let hash = sn.hash();
                self.snode = self.map.snode_after(hash);
                self.pair = self
                    .snode
                    .as_ref()
                    .and_then(|sn| sn.next_entry(None))
                    .cloned();
            }
        }
    }
}

impl<K, V, S> Iterator for Iter<'_, K, V, S>
where
    K: Eq + Clone,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let pair = self.pair.clone()?;
        self.advance();
        Some((pair.key, pair.value))
    }
}

/// Iterator over the keys of a [`TrieMap`].
///
/// Created by [`TrieMap::keys`].
pub struct Keys<'a, K, V, S> {
    iter: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Keys<'a, K, V, S>
where
    K: Eq + Clone,
    V: Clone,
{
    pub(crate) fn new(map: &'a TrieMap<K, V, S>) -> Self {
        Keys {
            iter: Iter::new(map),
        }
    }
}

impl<K, V, S> Iterator for Keys<'_, K, V, S>
where
    K: Eq + Clone,
    V: Clone,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.iter.next().map(|(k, _)| k)
    }
}
