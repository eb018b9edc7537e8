//! Dense double-precision columns (`real`/`integer` value classes).
//!
//! Missing is represented by the quiet NaN bit pattern. Any NaN payload
//! value is treated as missing regardless of its exact bit pattern.

use std::any::Any;
use std::cmp::Ordering;

use super::{Column, ObjectValue, TypeDescriptor, ValueClass};

/// The type id used for dense-double columns declared as `real`.
pub const TYPE_REAL: u32 = 1;
/// The type id used for dense-double columns declared as `integer`.
pub const TYPE_INTEGER: u32 = 2;

/// A frozen, dense, row-ordered sequence of `f64` values.
pub struct DenseDoubleColumn {
    ty: TypeDescriptor,
    payload: Vec<f64>,
}

impl DenseDoubleColumn {
    /// Builds a `real`-typed column from `payload`.
    pub fn from_values(payload: Vec<f64>) -> Self {
        Self { ty: TypeDescriptor::new(TYPE_REAL, ValueClass::Real), payload }
    }

    /// Builds a column with an explicit [`TypeDescriptor`] (`real` or
    /// `integer`).
    pub fn with_type(ty: TypeDescriptor, payload: Vec<f64>) -> Self {
        Self { ty, payload }
    }

    /// Raw payload slice.
    pub fn payload(&self) -> &[f64] {
        &self.payload
    }

    fn value_at(&self, row: i64) -> f64 {
        if row < 0 || row as usize >= self.payload.len() {
            return f64::NAN;
        }
        self.payload[row as usize]
    }
}

impl Column for DenseDoubleColumn {
    fn size(&self) -> usize {
        self.payload.len()
    }

    fn column_type(&self) -> &TypeDescriptor {
        &self.ty
    }

    fn fill_f64(&self, dst: &mut [f64], start_row: i64) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = self.value_at(start_row + k as i64);
        }
    }

    fn get_object(&self, row: i64) -> Option<ObjectValue> {
        let v = self.value_at(row);
        if v.is_nan() {
            None
        } else if self.ty.value_class == ValueClass::Integer {
            Some(ObjectValue::Int(v.round() as i64))
        } else {
            Some(ObjectValue::Float(v))
        }
    }

    fn get_index(&self, _row: i64) -> Option<u32> {
        None
    }

    fn is_missing(&self, row: i64) -> bool {
        self.value_at(row).is_nan()
    }

    fn compare_rows(&self, a: i64, b: i64) -> Option<Ordering> {
        Some(total_order_nulls_last(self.value_at(a), self.value_at(b)))
    }

    fn supports_sort(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// IEEE total order with NaN (≡ missing) sorting greatest.
pub fn total_order_nulls_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
