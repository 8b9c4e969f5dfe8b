//! Multi-threaded stress: linearizable final state, progress under
//! contention, shape health after churn.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ctrie::TrieMap;

const THREADS: u64 = 8;
const OPS_PER_THREAD: usize = 10_000;
const KEYS_PER_THREAD: u64 = 512;

/// One thread's deterministic op tape: `Some(v)` inserts, `None` removes.
fn op_tape(tid: u64) -> Vec<(u64, Option<u64>)> {
    let mut rng = StdRng::seed_from_u64(0xC71E * (tid + 1));
    let base = tid * KEYS_PER_THREAD;
    (0..OPS_PER_THREAD)
        .map(|_| {
            let key = base + rng.gen_range(0..KEYS_PER_THREAD);
            if rng.gen_bool(0.6) {
                (key, Some(rng.gen_range(0..1_000_000)))
            } else {
                (key, None)
            }
        })
        .collect()
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_final_state_matches_serial_replay() {
    let map = Arc::new(TrieMap::new());

    let mut handles = vec![];
    for tid in 0..THREADS {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for (key, op) in op_tape(tid) {
                match op {
                    Some(v) => {
                        m.insert(key, v);
                    }
                    None => {
                        m.remove(&key);
                    }
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    // Key ranges are disjoint per thread, so replaying each tape serially
    // reproduces the linearized outcome exactly.
    let mut reference = HashMap::new();
    for tid in 0..THREADS {
        for (key, op) in op_tape(tid) {
            match op {
                Some(v) => {
                    reference.insert(key, v);
                }
                None => {
                    reference.remove(&key);
                }
            }
        }
    }

    for key in 0..THREADS * KEYS_PER_THREAD {
        assert_eq!(
            map.get(&key),
            reference.get(&key).copied(),
            "divergence at key {}",
            key
        );
    }
    assert_eq!(map.len(), reference.len());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_heavy_contention_same_key() {
    let map = Arc::new(TrieMap::new());

    let mut handles = vec![];
    for t in 0..8u64 {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..5000 {
                m.insert(0u64, t * 5000 + i);
                let _ = m.get(&0);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    // The surviving value must be the last write of some thread.
    let v = map.get(&0).unwrap();
    assert!((0..8).any(|t| v == t * 5000 + 4999));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_replace_if_counter() {
    // Conditional replace as a CAS loop: no increment may be lost.
    let map = Arc::new(TrieMap::new());
    map.insert(0u64, 0u64);

    let mut handles = vec![];
    for _ in 0..THREADS {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..1_000 {
                loop {
                    let v = m.get(&0).unwrap();
                    if m.replace_if(0, &v, v + 1) {
                        break;
                    }
                }
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(map.get(&0), Some(THREADS * 1_000));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_insert_remove_cycle_drains() {
    let map = Arc::new(TrieMap::new());

    let mut handles = vec![];
    for t in 0..4u64 {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..2000 {
                let key = t * 2000 + i;
                m.insert(key, key);
                if i % 2 == 0 {
                    assert_eq!(m.remove(&key), Some(key));
                }
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    // Survivors are exactly the odd iterations of each thread.
    assert_eq!(map.len(), 4 * 1000);
    for t in 0..4u64 {
        for i in 0..2000 {
            let key = t * 2000 + i;
            assert_eq!(map.get(&key), (i % 2 == 1).then_some(key));
        }
    }

    for t in 0..4u64 {
        for i in (1..2000).step_by(2) {
            let key = t * 2000 + i;
            assert_eq!(map.remove(&key), Some(key));
        }
    }
    assert!(map.is_empty());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_mixed_readers_and_writers() {
    let map = Arc::new(TrieMap::new());
    for i in 0..1000u64 {
        map.insert(i, i * 2);
    }

    let mut handles = vec![];

    // Stable range readers: their keys are never touched.
    for _ in 0..4 {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for round in 0..10_000u64 {
                let key = round % 1000;
                assert_eq!(m.get(&key), Some(key * 2));
            }
        }));
    }

    // Writers churn a disjoint upper range.
    for t in 0..4u64 {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..2000 {
                let key = 1000 + t * 2000 + i;
                m.insert(key, key);
                m.remove(&key);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(map.len(), 1000);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_contended_narrow_trie() {
    // Width 1 maximizes depth and therefore CAS/restart traffic on shared
    // prefixes; the randomized tape must still linearize.
    let map = Arc::new(TrieMap::with_width(1));

    let mut handles = vec![];
    for tid in 0..4u64 {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(tid);
            for _ in 0..5_000 {
                let key = rng.gen_range(0..64u64);
                if rng.gen_bool(0.5) {
                    m.insert(key, tid);
                } else {
                    m.remove(&key);
                }
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    // Whatever survived must be readable and consistent.
    let entries: Vec<_> = map.iter().collect();
    assert!(entries.len() <= 64);
    for (k, v) in entries {
        assert!(k < 64);
        assert!(v < 4);
        assert_eq!(map.get(&k), Some(v));
    }
}
