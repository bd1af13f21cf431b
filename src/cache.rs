use crate::value::{shallow_equal, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

struct CacheEntry {
    first: Value,
    second: Value,
    result: Value,
}

/// Single-slot memoization cell.
///
/// Holds the most recent argument pair and its result. A lookup hits when both
/// arguments are shallow-equal to the stored ones. Each selector owns its own
/// cell; cells are never shared between compiled mappings.
///
/// The lock is held only while reading or replacing the slot, never while the
/// wrapped computation runs, so read/compute/write is not atomic.
#[derive(Default)]
pub struct MemoCache {
    slot: Mutex<Option<CacheEntry>>,
    recomputations: AtomicU64,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, first: &Value, second: &Value) -> Option<Value> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .filter(|entry| shallow_equal(&entry.first, first) && shallow_equal(&entry.second, second))
            .map(|entry| entry.result.clone())
    }

    /// Replaces the slot after a miss and counts the recomputation.
    pub fn set(&self, first: Value, second: Value, result: Value) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(CacheEntry {
            first,
            second,
            result,
        });
        self.recomputations.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the cached result or computes, stores and returns a fresh one.
    pub fn get_or_compute(
        &self,
        first: &Value,
        second: &Value,
        compute: impl FnOnce() -> Value,
    ) -> Value {
        if let Some(hit) = self.get(first, second) {
            return hit;
        }
        let result = compute();
        self.set(first.clone(), second.clone(), result.clone());
        result
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }

    pub fn reset_recomputations(&self) {
        self.recomputations.store(0, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_returns_same_allocation() {
        let cache = MemoCache::new();
        let state = Value::from(json!({ "a": [1] }));
        let first = cache.get_or_compute(&state, &Value::Absent, || state.get("a"));
        let second = cache.get_or_compute(&state, &Value::Absent, || Value::empty_list());

        assert!(crate::value::identical(&first, &second));
        assert_eq!(cache.recomputations(), 1);
    }

    #[test]
    fn test_single_slot_is_replaced() {
        let cache = MemoCache::new();
        let a = Value::from(json!({ "n": 1 }));
        let b = Value::from(json!({ "n": 2 }));

        cache.get_or_compute(&a, &Value::Absent, || a.get("n"));
        cache.get_or_compute(&b, &Value::Absent, || b.get("n"));
        // `a` was evicted by `b`
        cache.get_or_compute(&a, &Value::Absent, || a.get("n"));

        assert_eq!(cache.recomputations(), 3);
    }

    #[test]
    fn test_second_argument_participates() {
        let cache = MemoCache::new();
        let state = Value::from(json!({}));

        cache.get_or_compute(&state, &Value::from(json!({ "id": "x" })), || Value::Null);
        assert!(cache.get(&state, &Value::from(json!({ "id": "x" }))).is_some());
        assert!(cache.get(&state, &Value::from(json!({ "id": "y" }))).is_none());
        assert!(cache.get(&state, &Value::Absent).is_none());
    }

    #[test]
    fn test_reset_and_clear() {
        let cache = MemoCache::new();
        let state = Value::Null;
        cache.get_or_compute(&state, &Value::Absent, || Value::Null);
        cache.reset_recomputations();
        assert_eq!(cache.recomputations(), 0);

        cache.clear();
        assert!(cache.get(&state, &Value::Absent).is_none());
    }
}
