//! Mutable builder for object columns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::column::object::ObjectColumn;
use crate::column::{ObjectComparator, ObjectValue};
use crate::error::{Error, Result};

/// A fixed-size, nullable object buffer.
pub struct ObjectBuffer {
    slots: Mutex<Vec<Option<ObjectValue>>>,
    frozen: AtomicBool,
    type_id: u32,
    comparator: Option<ObjectComparator>,
}

impl ObjectBuffer {
    /// Allocates a buffer of `size` null slots.
    pub fn new(size: usize, type_id: u32) -> Self {
        Self {
            slots: Mutex::new(vec![None; size]),
            frozen: AtomicBool::new(false),
            type_id,
            comparator: None,
        }
    }

    /// Allocates a buffer with a comparator carried through to the frozen
    /// column (needed for `sort` support on object columns).
    pub fn with_comparator(size: usize, type_id: u32, comparator: ObjectComparator) -> Self {
        Self {
            slots: Mutex::new(vec![None; size]),
            frozen: AtomicBool::new(false),
            type_id,
            comparator: Some(comparator),
        }
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.slots.lock().expect("object buffer lock poisoned").len()
    }

    fn check_bounds(&self, i: usize, size: usize) -> Result<()> {
        if i >= size {
            Err(Error::OutOfBounds { index: i as i64, size })
        } else {
            Ok(())
        }
    }

    /// Sets slot `i`. Fails with [`Error::Frozen`] if frozen, or
    /// [`Error::OutOfBounds`] if `i >= size`.
    pub fn set(&self, i: usize, value: Option<ObjectValue>) -> Result<()> {
        if self.frozen.load(Ordering::Acquire) {
            return Err(Error::Frozen);
        }
        let mut slots = self.slots.lock().expect("object buffer lock poisoned");
        self.check_bounds(i, slots.len())?;
        slots[i] = value;
        Ok(())
    }

    /// Reads slot `i`. Fails with [`Error::OutOfBounds`] if `i >= size`.
    pub fn get(&self, i: usize) -> Result<Option<ObjectValue>> {
        let slots = self.slots.lock().expect("object buffer lock poisoned");
        self.check_bounds(i, slots.len())?;
        Ok(slots[i].clone())
    }

    /// Freezes the buffer; subsequent `set` calls fail with
    /// [`Error::Frozen`].
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
        tracing::debug!(
            target: "tablecore::buffer::object",
            type_id = self.type_id,
            size = self.size(),
            "froze object buffer"
        );
    }

    /// Freezes the buffer (if not already) and consumes it into an
    /// immutable [`ObjectColumn`].
    pub fn to_column(self) -> ObjectColumn {
        self.freeze();
        let payload = self.slots.into_inner().expect("object buffer lock poisoned");
        match self.comparator {
            Some(cmp) => ObjectColumn::with_comparator(self.type_id, payload, cmp),
            None => ObjectColumn::new(self.type_id, payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let buf = ObjectBuffer::new(2, 1);
        buf.set(0, Some(ObjectValue::Str("x".to_string()))).unwrap();
        assert_eq!(buf.get(0).unwrap(), Some(ObjectValue::Str("x".to_string())));
        assert_eq!(buf.get(1).unwrap(), None);
    }

    #[test]
    fn frozen_buffer_rejects_writes() {
        let buf = ObjectBuffer::new(1, 1);
        buf.freeze();
        assert!(matches!(buf.set(0, None), Err(Error::Frozen)));
    }

    #[test]
    fn set_and_get_reject_out_of_range_index() {
        let buf = ObjectBuffer::new(2, 1);
        assert!(matches!(buf.set(2, None), Err(Error::OutOfBounds { index: 2, size: 2 })));
        assert!(matches!(buf.get(2), Err(Error::OutOfBounds { index: 2, size: 2 })));
    }
}
