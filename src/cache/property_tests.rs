//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the engine against a plain map model and the
//! TTL/refresh rules.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use crate::cache::{CacheEngine, Refresher, Ttl};
use crate::config::Config;
use crate::store::{MemoryStore, MokaStore, ValueStore};

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

fn engine_over(store: Arc<dyn ValueStore<String>>) -> CacheEngine<String> {
    CacheEngine::new(store, &Config::default()).unwrap()
}

fn memory_engine() -> CacheEngine<String> {
    engine_over(Arc::new(MemoryStore::new()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations on eternal entries, the engine behaves
    // like a plain map and the hit/miss counters match what callers saw.
    #[test]
    fn prop_matches_map_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let engine = memory_engine();
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    engine.put(key.clone(), value.clone(), Ttl::Forever);
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = engine.get(&key);
                    prop_assert_eq!(got.as_ref(), model.get(&key));
                    if got.is_some() {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                }
                CacheOp::Remove { key } => {
                    engine.remove(&key);
                    model.remove(&key);
                }
            }
        }

        let keys: HashSet<String> = engine.keys().into_iter().collect();
        let model_keys: HashSet<String> = model.keys().cloned().collect();
        prop_assert_eq!(keys, model_keys);
        prop_assert_eq!(engine.size(), model.len());

        let stats = engine.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
    }

    // Both backends give the same observable results for the same operations.
    #[test]
    fn prop_backends_agree(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let memory = memory_engine();
        let moka = engine_over(Arc::new(MokaStore::new(16, None)));

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    memory.put(key.clone(), value.clone(), Ttl::Forever);
                    moka.put(key, value, Ttl::Forever);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(memory.get(&key), moka.get(&key));
                }
                CacheOp::Remove { key } => {
                    memory.remove(&key);
                    moka.remove(&key);
                }
            }
        }

        prop_assert_eq!(memory.size(), moka.size());
    }

    // Storing V1 then V2 under one key leaves exactly one entry holding V2.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let engine = memory_engine();
        engine.put(key.clone(), value1, Ttl::Forever);
        engine.put(key.clone(), value2.clone(), Ttl::Forever);

        prop_assert_eq!(engine.get(&key), Some(value2));
        prop_assert_eq!(engine.size(), 1);
    }

    // Removing any key, present or not, never fails and leaves it absent.
    #[test]
    fn prop_remove_is_idempotent(key in key_strategy(), value in value_strategy(), present in any::<bool>()) {
        let engine = memory_engine();
        if present {
            engine.put(key.clone(), value, Ttl::Forever);
        }

        engine.remove(&key);
        engine.remove(&key);

        prop_assert!(engine.get(&key).is_none());
        prop_assert_eq!(engine.size(), 0);
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // Any plain entry is gone once its TTL has elapsed, without a sweep.
    #[test]
    fn prop_ttl_expiration_behavior(key in key_strategy(), value in value_strategy()) {
        let engine = memory_engine();
        engine.put(key.clone(), value.clone(), Duration::from_millis(20));

        prop_assert_eq!(engine.get(&key), Some(value));

        sleep(Duration::from_millis(30));

        prop_assert!(engine.get(&key).is_none(), "Entry should not be found after TTL expires");
    }

    // size() counts raw entries; keys() filters and evicts expired ones.
    #[test]
    fn prop_size_keys_asymmetry(
        keys in prop::collection::hash_set(key_strategy(), 1..8)
    ) {
        let engine = memory_engine();
        for key in &keys {
            engine.put(key.clone(), "v".to_string(), Duration::from_millis(1));
        }

        sleep(Duration::from_millis(10));

        prop_assert_eq!(engine.size(), keys.len());
        prop_assert!(engine.keys().is_empty());
        prop_assert_eq!(engine.size(), 0);
    }

    // A read refreshable entry survives expiry with its regenerated value.
    #[test]
    fn prop_refreshed_value_is_served(value in value_strategy(), suffix in "[a-z]{1,4}") {
        let engine = memory_engine();
        let appended = suffix.clone();
        engine.put_refreshable(
            "k",
            value.clone(),
            Duration::from_millis(10),
            Refresher::new(move |prev: &String| Ok(format!("{prev}{appended}"))),
        );
        prop_assert_eq!(engine.get("k"), Some(value.clone()));

        sleep(Duration::from_millis(20));

        prop_assert_eq!(engine.get("k"), Some(format!("{value}{suffix}")));
    }
}
