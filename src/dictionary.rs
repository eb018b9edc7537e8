//! Append-only dictionaries backing categorical columns.
//!
//! A [`Dictionary`] is an ordered sequence of distinct values with a null
//! sentinel fixed at index 0. Interning is append-only: looking up a value
//! already present returns its existing index, otherwise the value is
//! appended and its new index returned.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// A comparator over resolved dictionary values, used by the sort operator.
pub type Comparator<V> = Arc<dyn Fn(&V, &V) -> Ordering + Send + Sync>;

/// An ordered, append-only sequence of distinct values with a null sentinel
/// at index 0.
///
/// `V` must be `Eq + Hash + Clone` so values can be interned via a reverse
/// lookup map. Every concrete column/buffer in this crate instantiates
/// `V = String`.
pub struct Dictionary<V: Eq + Hash + Clone + Send + Sync> {
    inner: Mutex<Inner<V>>,
    comparator: Option<Comparator<V>>,
}

impl<V: Eq + Hash + Clone + Send + Sync + std::fmt::Debug> std::fmt::Debug for Dictionary<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("Dictionary")
            .field("values", &inner.values)
            .field("has_comparator", &self.comparator.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct Inner<V: Eq + Hash + Clone + Send + Sync> {
    values: Vec<V>,
    index_of: HashMap<V, u32>,
}

impl<V: Eq + Hash + Clone + Send + Sync> Dictionary<V> {
    /// Creates an empty dictionary (just the null sentinel at index 0).
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                values: Vec::new(),
                index_of: HashMap::new(),
            }),
            comparator: None,
        }
    }

    /// Creates an empty dictionary with a comparator for sort support.
    pub fn with_comparator(comparator: Comparator<V>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                values: Vec::new(),
                index_of: HashMap::new(),
            }),
            comparator: Some(comparator),
        }
    }

    /// Interns `value`, returning its dictionary index (1-based; 0 is null).
    ///
    /// Linearizable: a successful call observes a stable index for `value`
    /// such that every subsequent `get` of that index yields an equal value.
    pub fn intern(&self, value: &V) -> u32 {
        let mut inner = self.inner.lock().expect("dictionary intern lock poisoned");
        if let Some(&idx) = inner.index_of.get(value) {
            return idx;
        }
        inner.values.push(value.clone());
        let idx = inner.values.len() as u32;
        inner.index_of.insert(value.clone(), idx);
        idx
    }

    /// Interns `value` unless doing so would bring the dictionary's non-null
    /// entry count above `max_non_null`.
    ///
    /// Returns `None` when `value` is new and the dictionary is already at
    /// capacity; the dictionary is left unmodified in that case. An
    /// existing value always succeeds, regardless of `max_non_null`, since
    /// no new entry is created.
    pub fn intern_bounded(&self, value: &V, max_non_null: u64) -> Option<u32> {
        let mut inner = self.inner.lock().expect("dictionary intern lock poisoned");
        if let Some(&idx) = inner.index_of.get(value) {
            return Some(idx);
        }
        if inner.values.len() as u64 >= max_non_null {
            return None;
        }
        inner.values.push(value.clone());
        let idx = inner.values.len() as u32;
        inner.index_of.insert(value.clone(), idx);
        Some(idx)
    }

    /// Looks up `value`'s index without interning it. Returns `None` if
    /// absent.
    pub fn index_of(&self, value: &V) -> Option<u32> {
        let inner = self.inner.lock().expect("dictionary intern lock poisoned");
        inner.index_of.get(value).copied()
    }

    /// Resolves `index` to its value. Index 0 (null) resolves to `None`; an
    /// out-of-range index also resolves to `None`.
    pub fn get(&self, index: u32) -> Option<V> {
        if index == 0 {
            return None;
        }
        let inner = self.inner.lock().expect("dictionary intern lock poisoned");
        inner.values.get((index - 1) as usize).cloned()
    }

    /// Number of distinct non-null entries.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("dictionary intern lock poisoned").values.len()
    }

    /// True when the dictionary holds no non-null entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all non-null values in index order (index 1 first).
    pub fn snapshot(&self) -> Vec<V> {
        self.inner.lock().expect("dictionary intern lock poisoned").values.clone()
    }

    /// The dictionary's comparator, if any.
    pub fn comparator(&self) -> Option<&Comparator<V>> {
        self.comparator.as_ref()
    }

    /// Compares two resolved values (`None` meaning null, which sorts
    /// greatest) using the dictionary's comparator.
    ///
    /// Returns `None` if the dictionary has no comparator.
    pub fn compare(&self, a: Option<&V>, b: Option<&V>) -> Option<Ordering> {
        let cmp = self.comparator.as_ref()?;
        Some(match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => cmp(x, y),
        })
    }
}

impl<V: Eq + Hash + Clone + Send + Sync> Default for Dictionary<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Eq + Hash + Clone + Send + Sync> PartialEq for Dictionary<V> {
    /// Two dictionaries are equal as mappings iff they have the same length
    /// and agree at every index.
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_append_only_and_idempotent() {
        let dict: Dictionary<String> = Dictionary::new();
        assert_eq!(dict.intern(&"a".to_string()), 1);
        assert_eq!(dict.intern(&"b".to_string()), 2);
        assert_eq!(dict.intern(&"a".to_string()), 1);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn index_zero_resolves_to_null() {
        let dict: Dictionary<String> = Dictionary::new();
        dict.intern(&"x".to_string());
        assert_eq!(dict.get(0), None);
        assert_eq!(dict.get(1), Some("x".to_string()));
        assert_eq!(dict.get(2), None);
    }

    #[test]
    fn equality_compares_full_sequence() {
        let a: Dictionary<String> = Dictionary::new();
        let b: Dictionary<String> = Dictionary::new();
        a.intern(&"p".to_string());
        a.intern(&"q".to_string());
        b.intern(&"p".to_string());
        assert_ne!(a, b);
        b.intern(&"q".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn comparator_orders_resolved_values_with_nulls_last() {
        let dict: Dictionary<String> =
            Dictionary::with_comparator(Arc::new(|a: &String, b: &String| a.cmp(b)));
        let ia = dict.intern(&"b".to_string());
        let ib = dict.intern(&"a".to_string());
        let va = dict.get(ia);
        let vb = dict.get(ib);
        assert_eq!(dict.compare(va.as_ref(), vb.as_ref()), Some(Ordering::Greater));
        assert_eq!(dict.compare(None, va.as_ref()), Some(Ordering::Greater));
        assert_eq!(dict.compare(va.as_ref(), None), Some(Ordering::Less));
        assert_eq!(dict.compare(None, None), Some(Ordering::Equal));
    }

    #[test]
    fn no_comparator_means_compare_returns_none() {
        let dict: Dictionary<String> = Dictionary::new();
        dict.intern(&"x".to_string());
        assert_eq!(dict.compare(Some(&"x".to_string()), Some(&"x".to_string())), None);
    }

    #[test]
    fn concurrent_interning_is_linearizable() {
        use std::thread;

        let dict: Arc<Dictionary<String>> = Arc::new(Dictionary::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let dict = dict.clone();
            handles.push(thread::spawn(move || {
                let mut indices = Vec::new();
                for i in 0..50 {
                    let value = format!("v{}", i % 10);
                    indices.push((t, dict.intern(&value)));
                }
                indices
            }));
        }
        let mut seen: HashMap<u32, String> = HashMap::new();
        for h in handles {
            for (_t, idx) in h.join().unwrap() {
                let resolved = dict.get(idx).unwrap();
                if let Some(prev) = seen.get(&idx) {
                    assert_eq!(prev, &resolved);
                } else {
                    seen.insert(idx, resolved);
                }
            }
        }
        assert_eq!(dict.len(), 10);
    }
}
