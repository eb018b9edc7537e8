//! The mapped overlay: a row-permutation view over an underlying column.
//!
//! `map_column` is a free function rather than a `Column` trait method
//! because a dyn-compatible trait cannot have a method returning an
//! arbitrary concrete `Self`; see `SPEC_FULL.md` §4 implementation notes.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{Column, ColumnRef, ObjectValue, TypeDescriptor};

/// A column whose logical row `i` is `variant[row_map[i]]`. An index outside
/// `[0, variant.size())` yields missing.
pub struct MappedColumn {
    variant: ColumnRef,
    row_map: Vec<i32>,
}

impl MappedColumn {
    /// Builds a mapped overlay directly. Prefer [`map_column`] at call
    /// sites so nested `Mapped` columns are flattened.
    pub fn new(variant: ColumnRef, row_map: Vec<i32>) -> Self {
        Self { variant, row_map }
    }

    /// The underlying (non-mapped) column.
    pub fn underlying(&self) -> &ColumnRef {
        &self.variant
    }

    /// The row-map array: logical row `i` reads underlying row
    /// `row_map()[i]`.
    pub fn row_map(&self) -> &[i32] {
        &self.row_map
    }

    fn resolve(&self, row: i64) -> Option<i64> {
        if row < 0 || row as usize >= self.row_map.len() {
            return None;
        }
        let underlying = self.row_map[row as usize];
        if underlying < 0 || underlying as usize >= self.variant.size() {
            None
        } else {
            Some(underlying as i64)
        }
    }
}

impl Column for MappedColumn {
    fn size(&self) -> usize {
        self.row_map.len()
    }

    fn column_type(&self) -> &TypeDescriptor {
        self.variant.column_type()
    }

    fn fill_f64(&self, dst: &mut [f64], start_row: i64) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = match self.resolve(start_row + k as i64) {
                Some(r) => {
                    let mut one = [0.0f64; 1];
                    self.variant.fill_f64(&mut one, r);
                    one[0]
                }
                None => f64::NAN,
            };
        }
    }

    fn get_object(&self, row: i64) -> Option<ObjectValue> {
        self.resolve(row).and_then(|r| self.variant.get_object(r))
    }

    fn get_index(&self, row: i64) -> Option<u32> {
        // `get_index(-1)` is out of range for every variant; categorical
        // columns still answer `Some(0)` (missing), which tells us this
        // overlay sits over a categorical column without touching a real row.
        self.variant.get_index(-1)?;
        Some(self.resolve(row).and_then(|r| self.variant.get_index(r)).unwrap_or(0))
    }

    fn is_missing(&self, row: i64) -> bool {
        match self.resolve(row) {
            Some(r) => self.variant.is_missing(r),
            None => true,
        }
    }

    fn compare_rows(&self, a: i64, b: i64) -> Option<Ordering> {
        let ra = self.resolve(a);
        let rb = self.resolve(b);
        match (ra, rb) {
            (None, None) => Some(Ordering::Equal),
            (None, Some(_)) => Some(Ordering::Greater),
            (Some(_), None) => Some(Ordering::Less),
            (Some(x), Some(y)) => self.variant.compare_rows(x, y),
        }
    }

    fn supports_sort(&self) -> bool {
        self.variant.supports_sort()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Produces a new column whose logical row `i` equals `col[row_map[i]]`.
///
/// If `col` is itself a [`MappedColumn`], the two row-maps are flattened
/// into one composed map over the shared underlying column, rather than
/// nesting overlays. `prefer_view` only *suggests* an overlay; the result's
/// observable semantics are identical either way, so this implementation
/// always produces an overlay.
pub fn map_column(col: &ColumnRef, row_map: Vec<i32>, _prefer_view: bool) -> ColumnRef {
    if let Some(existing) = col.as_any().downcast_ref::<MappedColumn>() {
        let composed = compose(existing.row_map(), &row_map);
        return Arc::new(MappedColumn::new(existing.underlying().clone(), composed));
    }
    Arc::new(MappedColumn::new(col.clone(), row_map))
}

/// `composed[i] = underlying[row_map[i]]` when `row_map[i]` is in range of
/// `underlying`, `-1` otherwise.
fn compose(underlying: &[i32], row_map: &[i32]) -> Vec<i32> {
    row_map
        .iter()
        .map(|&r| {
            if r < 0 || r as usize >= underlying.len() {
                -1
            } else {
                underlying[r as usize]
            }
        })
        .collect()
}

/// Cache key: identity of the underlying column's row-map and of the
/// caller-supplied external row-map, used to amortize composition across
/// consumers sharing the same external row-map.
type CacheKey = (usize, usize);

/// Amortizes row-map composition for consumers sharing the same external
/// row-map applied to the same underlying mapped column.
///
/// Entries are published once and never evicted or overwritten: readers
/// observe whichever entry was present at the time of their first lookup of
/// a key.
#[derive(Default)]
pub struct ComposeCache {
    entries: Mutex<HashMap<CacheKey, Arc<Vec<i32>>>>,
}

impl ComposeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Like [`map_column`], but composed row-maps are cached by the
    /// identity of `col`'s underlying row-map together with the identity of
    /// `row_map`, so repeated calls with the same pair reuse the prior
    /// composition.
    pub fn map_column(
        &self,
        col: &ColumnRef,
        row_map: &Arc<Vec<i32>>,
        _prefer_view: bool,
    ) -> ColumnRef {
        if let Some(existing) = col.as_any().downcast_ref::<MappedColumn>() {
            let key = (existing.row_map().as_ptr() as usize, Arc::as_ptr(row_map) as usize);
            let composed = {
                let mut entries = self.entries.lock().expect("compose cache lock poisoned");
                entries
                    .entry(key)
                    .or_insert_with(|| Arc::new(compose(existing.row_map(), row_map)))
                    .clone()
            };
            return Arc::new(MappedColumn::new(existing.underlying().clone(), (*composed).clone()));
        }
        Arc::new(MappedColumn::new(col.clone(), (**row_map).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::dense::DenseDoubleColumn;

    #[test]
    fn out_of_range_row_map_entries_yield_missing() {
        let base: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![10.0, 20.0, 30.0]));
        let mapped = map_column(&base, vec![2, -1, 5, 0], true);
        assert_eq!(mapped.size(), 4);
        let mut dst = [0.0; 4];
        mapped.fill_f64(&mut dst, 0);
        assert_eq!(dst[0], 30.0);
        assert!(dst[1].is_nan());
        assert!(dst[2].is_nan());
        assert_eq!(dst[3], 10.0);
    }

    #[test]
    fn nested_maps_are_flattened_not_double_wrapped() {
        let base: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![1.0, 2.0, 3.0]));
        let once = map_column(&base, vec![2, 1, 0], true);
        let twice = map_column(&once, vec![1, 0], true);
        let flattened = twice.as_any().downcast_ref::<MappedColumn>().unwrap();
        assert!(Arc::ptr_eq(flattened.underlying(), &base));
        assert_eq!(flattened.row_map(), &[1, 2]);
    }

    #[test]
    fn compose_cache_reuses_entries_for_identical_identity_pair() {
        let base: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![1.0, 2.0, 3.0]));
        let once = map_column(&base, vec![2, 1, 0], true);
        let external = Arc::new(vec![0, 1]);
        let cache = ComposeCache::new();
        let a = cache.map_column(&once, &external, true);
        let b = cache.map_column(&once, &external, true);
        let ma = a.as_any().downcast_ref::<MappedColumn>().unwrap();
        let mb = b.as_any().downcast_ref::<MappedColumn>().unwrap();
        assert_eq!(ma.row_map(), mb.row_map());
        assert_eq!(ma.row_map(), &[2, 1]);
    }
}
