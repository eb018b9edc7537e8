//! Calendar date-time columns.

use std::any::Any;
use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::{Column, ObjectValue, TypeDescriptor, ValueClass};

/// Sentinel seconds-of-epoch value denoting a missing date-time.
pub const MISSING_SECONDS: i64 = i64::MIN;

/// The type id used for date-time columns.
pub const TYPE_DATETIME: u32 = 20;

/// A frozen column of calendar date-times, stored as seconds-of-epoch with
/// an optional nanosecond-of-second component.
pub struct DateTimeColumn {
    ty: TypeDescriptor,
    seconds: Vec<i64>,
    nanos: Option<Vec<u32>>,
}

impl DateTimeColumn {
    /// Builds a column with second resolution only.
    pub fn from_seconds(seconds: Vec<i64>) -> Self {
        Self { ty: TypeDescriptor::new(TYPE_DATETIME, ValueClass::DateTime), seconds, nanos: None }
    }

    /// Builds a column with nanosecond resolution. `nanos[i]` is ignored
    /// when `seconds[i]` is the missing sentinel.
    pub fn from_seconds_and_nanos(seconds: Vec<i64>, nanos: Vec<u32>) -> Self {
        assert_eq!(seconds.len(), nanos.len());
        Self {
            ty: TypeDescriptor::new(TYPE_DATETIME, ValueClass::DateTime),
            seconds,
            nanos: Some(nanos),
        }
    }

    fn seconds_at(&self, row: i64) -> Option<i64> {
        if row < 0 || row as usize >= self.seconds.len() {
            return None;
        }
        let s = self.seconds[row as usize];
        if s == MISSING_SECONDS {
            None
        } else {
            Some(s)
        }
    }

    fn nanos_at(&self, row: i64) -> u32 {
        match &self.nanos {
            Some(n) if row >= 0 && (row as usize) < n.len() => n[row as usize],
            _ => 0,
        }
    }

    /// Reads row `row` as a [`chrono::DateTime<Utc>`], or `None` if missing.
    pub fn get_chrono(&self, row: i64) -> Option<DateTime<Utc>> {
        let secs = self.seconds_at(row)?;
        DateTime::from_timestamp(secs, self.nanos_at(row))
    }

    /// Raw seconds-of-epoch storage, sentinel included, for the binary
    /// format writer.
    pub fn seconds_raw(&self) -> &[i64] {
        &self.seconds
    }

    /// Raw nanosecond-of-second storage, if this column carries sub-second
    /// resolution, for the binary format writer.
    pub fn nanos_raw(&self) -> Option<&[u32]> {
        self.nanos.as_deref()
    }
}

impl Column for DateTimeColumn {
    fn size(&self) -> usize {
        self.seconds.len()
    }

    fn column_type(&self) -> &TypeDescriptor {
        &self.ty
    }

    fn fill_f64(&self, dst: &mut [f64], start_row: i64) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = match self.seconds_at(start_row + k as i64) {
                Some(s) => s as f64,
                None => f64::NAN,
            };
        }
    }

    fn get_object(&self, row: i64) -> Option<ObjectValue> {
        self.seconds_at(row).map(ObjectValue::Int)
    }

    fn get_index(&self, _row: i64) -> Option<u32> {
        None
    }

    fn is_missing(&self, row: i64) -> bool {
        self.seconds_at(row).is_none()
    }

    fn compare_rows(&self, a: i64, b: i64) -> Option<Ordering> {
        Some(match (self.seconds_at(a), self.seconds_at(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| self.nanos_at(a).cmp(&self.nanos_at(b))),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_row_is_missing() {
        let col = DateTimeColumn::from_seconds(vec![100, MISSING_SECONDS]);
        assert!(!col.is_missing(0));
        assert!(col.is_missing(1));
    }

    #[test]
    fn chronological_order_with_nulls_last() {
        let col = DateTimeColumn::from_seconds(vec![200, MISSING_SECONDS, 100]);
        assert_eq!(col.compare_rows(0, 2), Some(Ordering::Greater));
        assert_eq!(col.compare_rows(1, 0), Some(Ordering::Greater));
    }

    #[test]
    fn get_chrono_resolves_a_valid_timestamp() {
        let col = DateTimeColumn::from_seconds(vec![0]);
        let dt = col.get_chrono(0).unwrap();
        assert_eq!(dt.timestamp(), 0);
    }
}
