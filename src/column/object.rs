//! Object columns: an ordered sequence of nullable, caller-defined values.

use std::any::Any;
use std::cmp::Ordering;

use super::{Column, ObjectComparator, ObjectValue, TypeDescriptor, ValueClass};

/// A frozen column of nullable [`ObjectValue`]s.
pub struct ObjectColumn {
    ty: TypeDescriptor,
    payload: Vec<Option<ObjectValue>>,
    comparator: Option<ObjectComparator>,
}

impl ObjectColumn {
    /// Builds an object column with no comparator (sort fails with
    /// `Unordered` on this column until one is supplied).
    pub fn new(type_id: u32, payload: Vec<Option<ObjectValue>>) -> Self {
        Self { ty: TypeDescriptor::new(type_id, ValueClass::Object), payload, comparator: None }
    }

    /// Builds an object column with a caller-supplied comparator.
    pub fn with_comparator(
        type_id: u32,
        payload: Vec<Option<ObjectValue>>,
        comparator: ObjectComparator,
    ) -> Self {
        Self {
            ty: TypeDescriptor::new(type_id, ValueClass::Object),
            payload,
            comparator: Some(comparator),
        }
    }

    fn value_at(&self, row: i64) -> Option<&ObjectValue> {
        if row < 0 || row as usize >= self.payload.len() {
            return None;
        }
        self.payload[row as usize].as_ref()
    }
}

impl Column for ObjectColumn {
    fn size(&self) -> usize {
        self.payload.len()
    }

    fn column_type(&self) -> &TypeDescriptor {
        &self.ty
    }

    fn fill_f64(&self, dst: &mut [f64], start_row: i64) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = match self.value_at(start_row + k as i64) {
                Some(ObjectValue::Int(i)) => *i as f64,
                Some(ObjectValue::Float(f)) => *f,
                _ => f64::NAN,
            };
        }
    }

    fn get_object(&self, row: i64) -> Option<ObjectValue> {
        self.value_at(row).cloned()
    }

    fn get_index(&self, _row: i64) -> Option<u32> {
        None
    }

    fn is_missing(&self, row: i64) -> bool {
        self.value_at(row).is_none()
    }

    fn compare_rows(&self, a: i64, b: i64) -> Option<Ordering> {
        let cmp = self.comparator.as_ref()?;
        Some(match (self.value_at(a), self.value_at(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => cmp(x, y),
        })
    }

    fn supports_sort(&self) -> bool {
        self.comparator.is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
