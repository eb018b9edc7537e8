//! Time-of-day columns.

use std::any::Any;
use std::cmp::Ordering;

use super::{Column, ObjectValue, TypeDescriptor, ValueClass};

/// Sentinel nano-of-day value denoting a missing time.
pub const MISSING_NANO_OF_DAY: u64 = u64::MAX;

/// Number of nanoseconds in a day, the exclusive upper bound of a valid
/// nano-of-day value.
pub const NANOS_PER_DAY: u64 = 86_400_000_000_000;

/// The type id used for time-of-day columns.
pub const TYPE_TIME: u32 = 21;

/// A frozen column of times-of-day, stored as nanoseconds since midnight.
pub struct TimeColumn {
    ty: TypeDescriptor,
    nano_of_day: Vec<u64>,
}

impl TimeColumn {
    /// Builds a column from raw nano-of-day values. Values must be `<
    /// NANOS_PER_DAY` or equal to [`MISSING_NANO_OF_DAY`].
    pub fn from_nanos(nano_of_day: Vec<u64>) -> Self {
        Self { ty: TypeDescriptor::new(TYPE_TIME, ValueClass::Time), nano_of_day }
    }

    fn value_at(&self, row: i64) -> Option<u64> {
        if row < 0 || row as usize >= self.nano_of_day.len() {
            return None;
        }
        let v = self.nano_of_day[row as usize];
        if v == MISSING_NANO_OF_DAY {
            None
        } else {
            Some(v)
        }
    }
}

impl Column for TimeColumn {
    fn size(&self) -> usize {
        self.nano_of_day.len()
    }

    fn column_type(&self) -> &TypeDescriptor {
        &self.ty
    }

    fn fill_f64(&self, dst: &mut [f64], start_row: i64) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = match self.value_at(start_row + k as i64) {
                Some(v) => v as f64,
                None => f64::NAN,
            };
        }
    }

    fn get_object(&self, row: i64) -> Option<ObjectValue> {
        self.value_at(row).map(|v| ObjectValue::Int(v as i64))
    }

    fn get_index(&self, _row: i64) -> Option<u32> {
        None
    }

    fn is_missing(&self, row: i64) -> bool {
        self.value_at(row).is_none()
    }

    fn compare_rows(&self, a: i64, b: i64) -> Option<Ordering> {
        Some(match (self.value_at(a), self.value_at(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.cmp(&y),
        })
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
