//! Mutable, concurrently-writable categorical buffers, parameterized by
//! index bit-width.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use crate::column::categorical::{CategoricalColumn, CategoricalPayload};
use crate::column::{Column, ColumnRef};
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::packed;

/// Maximum number of non-null dictionary entries representable at a given
/// index width.
fn max_non_null(width: u8) -> u64 {
    match width {
        2 => 3,
        4 => 15,
        8 => 255,
        16 => 65_535,
        32 => (i32::MAX) as u64,
        _ => panic!("unsupported categorical width {width}"),
    }
}

#[derive(Debug)]
enum Storage {
    W2(Vec<AtomicU8>, usize),
    W4(Vec<AtomicU8>, usize),
    W8(Vec<AtomicU8>),
    W16(Vec<AtomicU16>),
    W32(Vec<AtomicU32>),
}

impl Storage {
    fn new(width: u8, size: usize) -> Self {
        match width {
            2 => Storage::W2((0..packed::byte_len(2, size)).map(|_| AtomicU8::new(0)).collect(), size),
            4 => Storage::W4((0..packed::byte_len(4, size)).map(|_| AtomicU8::new(0)).collect(), size),
            8 => Storage::W8((0..size).map(|_| AtomicU8::new(0)).collect()),
            16 => Storage::W16((0..size).map(|_| AtomicU16::new(0)).collect()),
            32 => Storage::W32((0..size).map(|_| AtomicU32::new(0)).collect()),
            _ => panic!("unsupported categorical width {width}"),
        }
    }

    fn width(&self) -> u8 {
        match self {
            Storage::W2(..) => 2,
            Storage::W4(..) => 4,
            Storage::W8(_) => 8,
            Storage::W16(_) => 16,
            Storage::W32(_) => 32,
        }
    }

    fn len(&self) -> usize {
        match self {
            Storage::W2(_, n) => *n,
            Storage::W4(_, n) => *n,
            Storage::W8(v) => v.len(),
            Storage::W16(v) => v.len(),
            Storage::W32(v) => v.len(),
        }
    }

    fn get(&self, i: usize) -> u32 {
        match self {
            Storage::W2(buf, _) => packed::atomic::read2(buf, i) as u32,
            Storage::W4(buf, _) => packed::atomic::read4(buf, i) as u32,
            Storage::W8(buf) => packed::atomic::read8(buf, i) as u32,
            Storage::W16(buf) => packed::atomic::read16(buf, i) as u32,
            Storage::W32(buf) => packed::atomic::read32(buf, i) as u32,
        }
    }

    fn set(&self, i: usize, v: u32) {
        match self {
            Storage::W2(buf, _) => packed::atomic::write2(buf, i, v as u8),
            Storage::W4(buf, _) => packed::atomic::write4(buf, i, v as u8),
            Storage::W8(buf) => packed::atomic::write8(buf, i, v as u8),
            Storage::W16(buf) => packed::atomic::write16(buf, i, v as u16),
            Storage::W32(buf) => packed::atomic::write32(buf, i, v as i32),
        }
    }

    fn into_payload(self) -> CategoricalPayload {
        match self {
            Storage::W2(buf, n) => {
                CategoricalPayload::W2(buf.into_iter().map(|a| a.into_inner()).collect(), n)
            }
            Storage::W4(buf, n) => {
                CategoricalPayload::W4(buf.into_iter().map(|a| a.into_inner()).collect(), n)
            }
            Storage::W8(buf) => {
                CategoricalPayload::W8(buf.into_iter().map(|a| a.into_inner()).collect())
            }
            Storage::W16(buf) => {
                CategoricalPayload::W16(buf.into_iter().map(|a| a.into_inner()).collect())
            }
            Storage::W32(buf) => CategoricalPayload::W32(
                buf.into_iter().map(|a| a.into_inner() as i32).collect(),
            ),
        }
    }
}

/// A mutable builder for a [`CategoricalColumn`] at a fixed index width.
///
/// Setters may be called concurrently from multiple writers. For width 2/4,
/// lanes sharing a byte are updated through a CAS loop
/// ([`crate::packed::atomic`]); for width 8/16/32, distinct lanes never
/// conflict. Dictionary interning is linearizable ([`Dictionary::intern`]).
#[derive(Debug)]
pub struct CategoricalBuffer {
    storage: Storage,
    dict: Arc<Dictionary<String>>,
    frozen: AtomicBool,
    type_id: u32,
}

impl CategoricalBuffer {
    /// Allocates a buffer of `size` lanes at the given index width, backed
    /// by a fresh empty dictionary.
    pub fn new(width: u8, size: usize, type_id: u32) -> Self {
        Self {
            storage: Storage::new(width, size),
            dict: Arc::new(Dictionary::new()),
            frozen: AtomicBool::new(false),
            type_id,
        }
    }

    /// Allocates a buffer sharing an existing dictionary (used by widening
    /// conversions and multi-column builds with a common category set).
    pub fn with_dictionary(width: u8, size: usize, type_id: u32, dict: Arc<Dictionary<String>>) -> Self {
        Self { storage: Storage::new(width, size), dict, frozen: AtomicBool::new(false), type_id }
    }

    /// Builds a width-`width` buffer from an existing categorical column,
    /// copying both its payload and its dictionary into independent
    /// storage, so writes to the new buffer never affect the source.
    ///
    /// Fails with [`Error::FormatNarrowing`] if the source's width exceeds
    /// `width`, or [`Error::TypeMismatch`] if `col` is not categorical.
    pub fn from_column(width: u8, type_id: u32, col: &ColumnRef) -> Result<Self> {
        let source = col.as_any().downcast_ref::<CategoricalColumn>().ok_or_else(|| {
            Error::TypeMismatch { expected: "categorical".to_string(), actual: "other".to_string() }
        })?;
        if source.index_format() > width {
            return Err(Error::FormatNarrowing { from: source.index_format(), to: width });
        }
        let size = source.size();
        let storage = Storage::new(width, size);
        for i in 0..size {
            storage.set(i, source.get_index(i as i64).unwrap_or(0));
        }
        let dict = Arc::new(Dictionary::new());
        for value in source.dictionary().snapshot() {
            dict.intern(&value);
        }
        Ok(Self {
            storage,
            dict,
            frozen: AtomicBool::new(false),
            type_id,
        })
    }

    /// Number of lanes.
    pub fn size(&self) -> usize {
        self.storage.len()
    }

    /// The index width in bits.
    pub fn index_format(&self) -> u8 {
        self.storage.width()
    }

    /// Current number of distinct non-null categories.
    pub fn different_values(&self) -> usize {
        self.dict.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.frozen.load(Ordering::Acquire) {
            Err(Error::Frozen)
        } else {
            Ok(())
        }
    }

    fn check_bounds(&self, i: usize) -> Result<()> {
        if i >= self.storage.len() {
            Err(Error::OutOfBounds { index: i as i64, size: self.storage.len() })
        } else {
            Ok(())
        }
    }

    /// Interns `value` and writes its index to lane `i`.
    ///
    /// Fails with [`Error::Frozen`] if the buffer has been frozen,
    /// [`Error::OutOfBounds`] if `i >= size`, or [`Error::CategoryOverflow`]
    /// if a new distinct value would exceed this buffer's index width.
    pub fn set(&self, i: usize, value: &str) -> Result<()> {
        self.check_writable()?;
        self.check_bounds(i)?;
        let max = max_non_null(self.storage.width());
        let idx = self
            .dict
            .intern_bounded(&value.to_string(), max)
            .ok_or(Error::CategoryOverflow { width: self.storage.width(), max })?;
        self.storage.set(i, idx);
        Ok(())
    }

    /// Like [`set`](Self::set) but returns `false` instead of failing on
    /// overflow, leaving the lane unmodified.
    pub fn set_save(&self, i: usize, value: &str) -> Result<bool> {
        self.check_writable()?;
        self.check_bounds(i)?;
        let max = max_non_null(self.storage.width());
        match self.dict.intern_bounded(&value.to_string(), max) {
            Some(idx) => {
                self.storage.set(i, idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reads the category value at lane `i` (`None` for the null index).
    ///
    /// Fails with [`Error::OutOfBounds`] if `i >= size`.
    pub fn get(&self, i: usize) -> Result<Option<String>> {
        self.check_bounds(i)?;
        Ok(self.dict.get(self.storage.get(i)))
    }

    /// Freezes the buffer; subsequent `set`/`set_save` calls fail with
    /// [`Error::Frozen`].
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
        tracing::debug!(
            target: "tablecore::buffer::categorical",
            type_id = self.type_id,
            width = self.storage.width(),
            size = self.storage.len(),
            distinct = self.dict.len(),
            "froze categorical buffer"
        );
    }

    /// Freezes the buffer (if not already) and consumes it into an
    /// immutable [`CategoricalColumn`].
    pub fn to_column(self) -> CategoricalColumn {
        self.freeze();
        let payload = self.storage.into_payload();
        CategoricalColumn::new(self.type_id, payload, self.dict)
    }

    /// Freezes the buffer and consumes it into a boolean-declared
    /// [`CategoricalColumn`]. See [`CategoricalColumn::new_boolean`].
    pub fn to_boolean_column(self, positive_value: &str) -> Result<CategoricalColumn> {
        self.freeze();
        let type_id = self.type_id;
        let payload = self.storage.into_payload();
        CategoricalColumn::new_boolean(type_id, payload, self.dict, positive_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn width8_roundtrips_any_sequence_of_distinct_categories(
            labels in prop::collection::vec("[a-z]{1,8}", 0..200)
        ) {
            let buf = CategoricalBuffer::new(8, labels.len(), 1);
            for (i, label) in labels.iter().enumerate() {
                prop_assume!(buf.set(i, label).is_ok());
            }
            for (i, label) in labels.iter().enumerate() {
                prop_assert_eq!(buf.get(i).unwrap(), Some(label.clone()));
            }
        }

        #[test]
        fn narrow_width_never_exceeds_its_declared_capacity(
            labels in prop::collection::vec("[a-z]{1,4}", 0..20)
        ) {
            let buf = CategoricalBuffer::new(2, labels.len(), 1);
            for (i, label) in labels.iter().enumerate() {
                let _ = buf.set_save(i, label);
            }
            prop_assert!(buf.different_values() <= 3);
        }
    }

    #[test]
    fn set_interns_and_writes_lane() {
        let buf = CategoricalBuffer::new(8, 3, 1);
        buf.set(0, "a").unwrap();
        buf.set(1, "b").unwrap();
        buf.set(2, "a").unwrap();
        assert_eq!(buf.get(0).unwrap(), Some("a".to_string()));
        assert_eq!(buf.get(1).unwrap(), Some("b".to_string()));
        assert_eq!(buf.different_values(), 2);
    }

    #[test]
    fn overflow_fails_for_narrow_width() {
        let buf = CategoricalBuffer::new(2, 4, 1);
        buf.set(0, "a").unwrap();
        buf.set(1, "b").unwrap();
        buf.set(2, "c").unwrap();
        let err = buf.set(3, "d").unwrap_err();
        assert!(matches!(err, Error::CategoryOverflow { width: 2, max: 3 }));
    }

    #[test]
    fn set_save_reports_overflow_without_mutating_lane() {
        let buf = CategoricalBuffer::new(2, 1, 1);
        assert!(buf.set_save(0, "a").unwrap());
        assert!(buf.set_save(0, "b").unwrap());
        assert!(buf.set_save(0, "c").unwrap());
        assert_eq!(buf.different_values(), 3);
        assert!(!buf.set_save(0, "d").unwrap());
        assert_eq!(buf.different_values(), 3);
        assert_eq!(buf.get(0).unwrap(), Some("c".to_string()));
    }

    #[test]
    fn frozen_buffer_rejects_writes() {
        let buf = CategoricalBuffer::new(8, 1, 1);
        buf.set(0, "a").unwrap();
        buf.freeze();
        assert!(matches!(buf.set(0, "b"), Err(Error::Frozen)));
    }

    #[test]
    fn from_column_rejects_narrowing() {
        let buf = CategoricalBuffer::new(16, 1, 1);
        buf.set(0, "a").unwrap();
        let col: ColumnRef = Arc::new(buf.to_column());
        let err = CategoricalBuffer::from_column(8, 1, &col).unwrap_err();
        assert!(matches!(err, Error::FormatNarrowing { from: 16, to: 8 }));
    }

    #[test]
    fn from_column_widens_and_copies_payload() {
        let buf = CategoricalBuffer::new(8, 2, 1);
        buf.set(0, "a").unwrap();
        buf.set(1, "b").unwrap();
        let col: ColumnRef = Arc::new(buf.to_column());
        let widened = CategoricalBuffer::from_column(16, 1, &col).unwrap();
        assert_eq!(widened.get(0).unwrap(), Some("a".to_string()));
        assert_eq!(widened.get(1).unwrap(), Some("b".to_string()));
    }

    #[test]
    fn from_column_widening_does_not_grow_the_frozen_source_dictionary() {
        let buf = CategoricalBuffer::new(2, 1, 1);
        buf.set(0, "a").unwrap();
        let col: ColumnRef = Arc::new(buf.to_column());
        let widened = CategoricalBuffer::from_column(8, 1, &col).unwrap();
        widened.set(0, "a").unwrap();
        // Adding three more distinct categories would overflow width 2 if
        // the source column's dictionary were shared rather than copied.
        widened.set(0, "b").unwrap();
        widened.set(0, "c").unwrap();
        widened.set(0, "d").unwrap();

        let source = col.as_any().downcast_ref::<CategoricalColumn>().unwrap();
        assert_eq!(source.dictionary().len(), 1);
    }

    #[test]
    fn set_and_get_reject_out_of_range_index() {
        let buf = CategoricalBuffer::new(8, 2, 1);
        assert!(matches!(
            buf.set(2, "a"),
            Err(Error::OutOfBounds { index: 2, size: 2 })
        ));
        assert!(matches!(
            buf.set_save(2, "a"),
            Err(Error::OutOfBounds { index: 2, size: 2 })
        ));
        assert!(matches!(
            buf.get(2),
            Err(Error::OutOfBounds { index: 2, size: 2 })
        ));
    }

    #[test]
    fn from_column_rejects_non_categorical() {
        use crate::column::dense::DenseDoubleColumn;
        let col: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![1.0]));
        let err = CategoricalBuffer::from_column(8, 1, &col).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn concurrent_setters_on_disjoint_lanes_never_lose_updates() {
        let buf = Arc::new(CategoricalBuffer::new(8, 100, 1));
        let mut handles = Vec::new();
        for t in 0..4 {
            let buf = buf.clone();
            handles.push(thread::spawn(move || {
                for i in (t..100).step_by(4) {
                    buf.set(i, &format!("v{i}")).unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..100 {
            assert_eq!(buf.get(i).unwrap(), Some(format!("v{i}")));
        }
    }
}
