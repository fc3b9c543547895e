//! CRDT Module Tests
//!
//! Validates the Merge Rule and the LWW store.
//!
//! ## Test Scopes
//! - **Merge Rule**: timestamp precedence, replica-id tie-break and the equal-version tie policy.
//! - **Store Operations**: put, merge and snapshot semantics on a single store.
//! - **CRDT Properties**: commutativity, idempotence and associativity over randomised batches.
//! - **Concurrency**: snapshots never observe a partially merged batch.

#[cfg(test)]
mod tests {
    use crate::crdt::merge::supersedes;
    use crate::crdt::store::LwwStore;
    use crate::crdt::types::{Entry, Record, ReplicaId, Snapshot, snapshot_entries};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn record(ts: i64, id: u64, value: f64) -> Record {
        Record::new(ts, ReplicaId(id), value)
    }

    fn entry(key: &str, ts: i64, id: u64, value: f64) -> Entry {
        Entry::new(key, ts, ReplicaId(id), value)
    }

    fn merged(batches: &[Vec<Entry>]) -> Snapshot {
        let store = LwwStore::new();
        for batch in batches {
            store.merge(batch.clone());
        }
        store.snapshot()
    }

    /// Random batch over a small key space. Values are derived from the version so two entries with the
    /// same `(ts, id)` always carry the same value.
    fn random_batch(rng: &mut StdRng, len: usize) -> Vec<Entry> {
        let keys = ["disp0:temperatura", "disp0:vibracao", "disp1:temperatura", "disp2:vibracao"];
        (0..len)
            .map(|_| {
                let key = keys[rng.gen_range(0..keys.len())];
                let ts = rng.gen_range(0..20);
                let id = rng.gen_range(1..5);
                entry(key, ts, id, ts as f64 * 10.0 + id as f64)
            })
            .collect()
    }

    // ============================================================
    // MERGE RULE TESTS
    // ============================================================

    #[test]
    fn test_higher_timestamp_supersedes() {
        assert!(supersedes(&record(11, 1, 0.0), &record(10, 9, 0.0)));
        assert!(!supersedes(&record(10, 9, 0.0), &record(11, 1, 0.0)));
    }

    #[test]
    fn test_equal_timestamp_higher_replica_supersedes() {
        assert!(supersedes(&record(5, 3, 2.0), &record(5, 2, 1.0)));
        assert!(!supersedes(&record(5, 2, 1.0), &record(5, 3, 2.0)));
    }

    #[test]
    fn test_equal_version_never_supersedes() {
        // Same version, different value: the stored record is kept.
        assert!(!supersedes(&record(5, 2, 9.0), &record(5, 2, 1.0)));
        assert!(!supersedes(&record(5, 2, 1.0), &record(5, 2, 1.0)));
    }

    #[test]
    fn test_version_orders_like_supersedes() {
        let a = record(7, 1, 0.0);
        let b = record(7, 4, 0.0);
        assert_eq!(a.version() < b.version(), supersedes(&b, &a));
    }

    // ============================================================
    // STORE OPERATION TESTS
    // ============================================================

    #[test]
    fn test_put_inserts_unknown_key() {
        let store = LwwStore::new();
        assert!(store.is_empty());

        assert!(store.put_value("disp1:temperatura", 100, ReplicaId(1), 30.0));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("disp1:temperatura"), Some(record(100, 1, 30.0)));
    }

    #[test]
    fn test_put_ignores_older_write() {
        let store = LwwStore::new();
        store.put("k", record(10, 1, 1.0));

        assert!(!store.put("k", record(9, 99, 9.9)));

        assert_eq!(store.get("k"), Some(record(10, 1, 1.0)));
    }

    #[test]
    fn test_put_replaces_with_newer_write() {
        let store = LwwStore::new();
        store.put("k", record(10, 1, 1.0));

        assert!(store.put("k", record(11, 1, 2.0)));

        assert_eq!(store.get("k").unwrap().value, 2.0);
    }

    #[test]
    fn test_merge_lower_timestamp_never_wins() {
        let store = LwwStore::new();
        store.merge(vec![entry("k", 10, 1, 1.0)]);
        let before = store.snapshot();

        let applied = store.merge(vec![entry("k", 9, 99, 9.9)]);

        assert_eq!(applied, 0);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_merge_tie_break_in_either_order() {
        let a = entry("k", 5, 2, 1.0);
        let b = entry("k", 5, 3, 2.0);

        let ab = merged(&[vec![a.clone(), b.clone()]]);
        let ba = merged(&[vec![b], vec![a]]);

        assert_eq!(ab.get("k"), Some(&record(5, 3, 2.0)));
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_merge_equal_version_keeps_stored_value() {
        let store = LwwStore::new();
        store.merge(vec![entry("k", 5, 2, 1.0)]);

        store.merge(vec![entry("k", 5, 2, 42.0)]);

        assert_eq!(store.get("k").unwrap().value, 1.0);
    }

    #[test]
    fn test_merge_empty_batch_is_noop() {
        let store = LwwStore::new();
        store.put("k", record(1, 1, 1.0));

        assert_eq!(store.merge(Vec::new()), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_counts_applied_entries() {
        let store = LwwStore::new();
        store.put("a", record(10, 1, 1.0));

        let applied = store.merge(vec![
            entry("a", 9, 1, 0.0),  // older, ignored
            entry("b", 1, 1, 0.0),  // new key
            entry("a", 11, 1, 2.0), // newer
        ]);

        assert_eq!(applied, 2);
        assert_eq!(store.get("a").unwrap().value, 2.0);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let store = LwwStore::new();
        store.put("k", record(1, 1, 1.0));

        let snapshot = store.snapshot();
        store.put("k", record(2, 1, 2.0));
        store.put("other", record(1, 1, 1.0));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("k"), Some(&record(1, 1, 1.0)));
    }

    #[test]
    fn test_snapshot_entries_sorted_by_key() {
        let store = LwwStore::new();
        store.put("b", record(1, 1, 1.0));
        store.put("a", record(2, 2, 2.0));

        let entries = snapshot_entries(store.snapshot());

        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(entries[0], entry("a", 2, 2, 2.0));
    }

    // ============================================================
    // CRDT PROPERTY TESTS
    // ============================================================

    #[test]
    fn test_merge_is_commutative() {
        let a = entry("disp0:temperatura", 3, 1, 1.0);
        let b = entry("disp0:vibracao", 4, 2, 2.0);

        let ab = merged(&[vec![a.clone(), b.clone()], vec![]]);
        let ba = merged(&[vec![b, a], vec![]]);

        assert_eq!(ab, ba);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(7);
        let batch = random_batch(&mut rng, 50);

        let once = merged(&[batch.clone()]);
        let twice = merged(&[batch.clone(), batch]);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_order_independent_over_shuffles() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let batch = random_batch(&mut rng, 40);
            let expected = merged(&[batch.clone()]);

            let mut shuffled = batch;
            shuffled.shuffle(&mut rng);

            assert_eq!(merged(&[shuffled]), expected);
        }
    }

    #[test]
    fn test_merge_is_associative_over_partitions() {
        let mut rng = StdRng::seed_from_u64(1234);

        for _ in 0..50 {
            let batch = random_batch(&mut rng, 40);
            let expected = merged(&[batch.clone()]);

            // Split into random sub-batches and apply them in a random order.
            let mut parts: Vec<Vec<Entry>> = Vec::new();
            let mut rest = batch.as_slice();
            while !rest.is_empty() {
                let take = rng.gen_range(1..=rest.len());
                parts.push(rest[..take].to_vec());
                rest = &rest[take..];
            }
            parts.shuffle(&mut rng);

            assert_eq!(merged(&parts), expected);
        }
    }

    #[test]
    fn test_two_stores_converge_after_exchanging_state() {
        let mut rng = StdRng::seed_from_u64(99);
        let node_a = LwwStore::new();
        let node_b = LwwStore::new();

        node_a.merge(random_batch(&mut rng, 30));
        node_b.merge(random_batch(&mut rng, 30));

        node_b.merge(snapshot_entries(node_a.snapshot()));
        node_a.merge(snapshot_entries(node_b.snapshot()));

        assert_eq!(node_a.snapshot(), node_b.snapshot());
    }

    // ============================================================
    // CONCURRENCY TESTS
    // ============================================================

    #[test]
    fn test_snapshot_never_sees_partial_batch() {
        const KEYS: usize = 32;
        const GENERATIONS: i64 = 2_000;

        let store = Arc::new(LwwStore::new());
        let generation = |g: i64| -> Vec<Entry> {
            (0..KEYS)
                .map(|k| entry(&format!("disp{}:temperatura", k), g, 1, g as f64))
                .collect()
        };
        store.merge(generation(0));

        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = store.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                for g in 1..=GENERATIONS {
                    store.merge(generation(g));
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let reader = {
            let store = store.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut observed = 0usize;
                while !done.load(Ordering::SeqCst) || observed == 0 {
                    let snapshot = store.snapshot();
                    let timestamps: Vec<i64> = snapshot.values().map(|r| r.timestamp).collect();
                    assert_eq!(timestamps.len(), KEYS);
                    assert!(
                        timestamps.iter().all(|ts| *ts == timestamps[0]),
                        "snapshot mixed generations: {:?}",
                        timestamps
                    );
                    observed += 1;
                }
                observed
            })
        };

        writer.join().unwrap();
        assert!(reader.join().unwrap() > 0);
        assert_eq!(store.get("disp0:temperatura").unwrap().timestamp, GENERATIONS);
    }

    #[test]
    fn test_concurrent_puts_converge_to_maximum() {
        let store = Arc::new(LwwStore::new());

        let handles: Vec<_> = (1..=8u64)
            .map(|id| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for ts in 0..500 {
                        store.put_value("shared", ts, ReplicaId(id), id as f64);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("shared"), Some(record(499, 8, 8.0)));
    }
}
