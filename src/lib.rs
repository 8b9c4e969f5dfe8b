//! Lock-free concurrent hash array mapped trie.
//!
//! A [`TrieMap`] is a concurrent map whose shape follows the hash bits of
//! its keys: each level of the trie consumes a few bits of the mixed hash
//! and branches up to 64 ways. All mutation happens by compare-and-swap on
//! indirection nodes, so there are no locks anywhere — readers never wait,
//! and a writer that loses a race restarts from the root after helping any
//! pending cleanup it ran into.
//!
//! # Key Features
//!
//! - **Lock-Free Progress**: every contention cycle commits at least one
//!   operation or advances trie cleanup
//! - **Linearizable Operations**: insert, lookup, remove and the conditional
//!   updates take effect atomically at a single CAS or load
//! - **Self-Shaping**: removals contract the trie back to canonical form,
//!   with no resize or rehash phases
//! - **Weakly Consistent Iteration**: iterators tolerate concurrent writers
//!   and never yield a key twice
//!
//! Displaced nodes are reclaimed through epoch-based reclamation
//! (`crossbeam-epoch`), so readers traversing a replaced path stay valid
//! until their guard drops.
//!
//! # Example
//!
//! ```rust
//! use ctrie::TrieMap;
//!
//! let map = TrieMap::new();
//!
//! map.insert("a", 1);
//! map.insert("b", 2);
//!
//! assert_eq!(map.get("a"), Some(1));
//! assert_eq!(map.insert_if_absent("a", 9), Some(1));
//! assert_eq!(map.remove("b"), Some(2));
//! assert_eq!(map.get("b"), None);
//! ```

#![warn(missing_docs)]

mod hash;
mod iter;
mod node;
mod trie;

pub use iter::{Iter, Keys};
pub use trie::TrieMap;
