// Single-flight memo table.
//
// Every expensive pure lookup in the crate (morphological analysis, topic
// mixtures, topic word rankings, suitability checks) goes through a `Memo`.
// Entries only ever grow: once a key has a value it never changes.
//
// Each key owns its own slot lock. The table lock is held just long enough to
// find or create the slot, so a slow first computation for one key never
// blocks readers of other keys, and two callers racing on the same key run
// the computation at most once.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;

type Slot<V> = Arc<Mutex<Option<V>>>;

/// A lazily populated, thread-safe cache keyed by `K`.
pub struct Memo<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table with already-computed values (used when restoring state).
    pub fn from_entries(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        let slots = entries
            .into_iter()
            .map(|(k, v)| (k, Arc::new(Mutex::new(Some(v)))))
            .collect();
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Return the cached value for `key`, computing it with `compute` on the
    /// first request.
    ///
    /// If `compute` fails the error is returned and nothing is cached, so a
    /// later call will try again.
    pub fn get_or_try_insert_with<F>(&self, key: &K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        let slot = Arc::clone(self.lock_slots()?.entry(key.clone()).or_default());

        let mut value = slot
            .lock()
            .map_err(|e| anyhow::anyhow!("Memo slot lock poisoned: {}", e))?;
        if let Some(cached) = value.as_ref() {
            return Ok(cached.clone());
        }

        match compute() {
            Ok(computed) => {
                *value = Some(computed.clone());
                // A waiter whose slot was dropped by a failed attempt puts it back.
                self.lock_slots()?
                    .entry(key.clone())
                    .or_insert_with(|| Arc::clone(&slot));
                Ok(computed)
            }
            Err(e) => {
                // The slot lock is still held, so nobody has filled it.
                let mut slots = self.lock_slots()?;
                if slots.get(key).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                    slots.remove(key);
                }
                Err(e)
            }
        }
    }

    fn lock_slots(&self) -> Result<MutexGuard<'_, HashMap<K, Slot<V>>>> {
        self.slots
            .lock()
            .map_err(|e| anyhow::anyhow!("Memo table lock poisoned: {}", e))
    }

    /// Look up a value without computing it.
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = {
            let slots = self.slots.lock().ok()?;
            Arc::clone(slots.get(key)?)
        };
        let value = slot.lock().ok()?;
        value.clone()
    }

    /// Number of keys with a computed value.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out every populated entry.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        let slots: Vec<(K, Slot<V>)> = match self.slots.lock() {
            Ok(slots) => slots
                .iter()
                .map(|(k, slot)| (k.clone(), Arc::clone(slot)))
                .collect(),
            Err(_) => return Vec::new(),
        };

        slots
            .into_iter()
            .filter_map(|(k, slot)| {
                let value = slot.lock().ok()?;
                value.clone().map(|v| (k, v))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_computes_once_per_key() {
        let memo: Memo<String, usize> = Memo::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = memo
                .get_or_try_insert_with(&"a".to_string(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .unwrap();
            assert_eq!(v, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_failed_computation_is_not_cached() {
        let memo: Memo<u32, u32> = Memo::new();
        let first = memo.get_or_try_insert_with(&1, || anyhow::bail!("boom"));
        assert!(first.is_err());
        assert!(memo.get(&1).is_none());
        assert!(memo.is_empty());

        let second = memo.get_or_try_insert_with(&1, || Ok(7)).unwrap();
        assert_eq!(second, 7);
    }

    #[test]
    fn test_failing_keys_leave_no_slots_behind() {
        let memo: Memo<u32, u32> = Memo::new();
        for key in 0..50 {
            assert!(memo
                .get_or_try_insert_with(&key, || anyhow::bail!("unavailable"))
                .is_err());
        }
        assert_eq!(memo.slots.lock().unwrap().len(), 0);

        memo.get_or_try_insert_with(&3, || Ok(9)).unwrap();
        assert_eq!(memo.slots.lock().unwrap().len(), 1);
        assert_eq!(memo.get(&3), Some(9));
    }

    #[test]
    fn test_concurrent_first_computation_is_single_flight() {
        let memo: Arc<Memo<u32, u32>> = Arc::new(Memo::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = Arc::clone(&memo);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    memo.get_or_try_insert_with(&5, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(20));
                        Ok(25)
                    })
                    .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 25);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_entries_seeds_values() {
        let memo = Memo::from_entries(vec![("x".to_string(), 1), ("y".to_string(), 2)]);
        assert_eq!(memo.get(&"x".to_string()), Some(1));
        let v = memo
            .get_or_try_insert_with(&"y".to_string(), || anyhow::bail!("should not run"))
            .unwrap();
        assert_eq!(v, 2);
    }
}
