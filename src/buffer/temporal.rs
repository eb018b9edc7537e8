//! Mutable builders for date-time and time-of-day columns.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::column::datetime::{DateTimeColumn, MISSING_SECONDS};
use crate::column::time::{TimeColumn, MISSING_NANO_OF_DAY, NANOS_PER_DAY};
use crate::error::{Error, Result};

/// A fixed-size date-time buffer (seconds-of-epoch plus optional
/// nanosecond-of-second resolution).
pub struct DateTimeBuffer {
    seconds: Vec<AtomicI64>,
    nanos: Vec<AtomicU32>,
    frozen: AtomicBool,
}

impl DateTimeBuffer {
    /// Allocates a buffer of `size` slots, all initially missing.
    pub fn new(size: usize) -> Self {
        Self {
            seconds: (0..size).map(|_| AtomicI64::new(MISSING_SECONDS)).collect(),
            nanos: (0..size).map(|_| AtomicU32::new(0)).collect(),
            frozen: AtomicBool::new(false),
        }
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.seconds.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.frozen.load(Ordering::Acquire) {
            Err(Error::Frozen)
        } else {
            Ok(())
        }
    }

    fn check_bounds(&self, i: usize) -> Result<()> {
        if i >= self.seconds.len() {
            Err(Error::OutOfBounds { index: i as i64, size: self.seconds.len() })
        } else {
            Ok(())
        }
    }

    /// Sets slot `i` from raw seconds-of-epoch and nanosecond-of-second.
    /// Fails with [`Error::OutOfBounds`] if `i >= size`,
    /// [`Error::DomainViolation`] if `nanos >= 1_000_000_000`, or if
    /// `seconds` collides with the missing sentinel.
    pub fn set_raw(&self, i: usize, seconds: i64, nanos: u32) -> Result<()> {
        self.check_writable()?;
        self.check_bounds(i)?;
        if seconds == MISSING_SECONDS {
            return Err(Error::DomainViolation(
                "seconds value collides with the missing sentinel".to_string(),
            ));
        }
        if nanos >= 1_000_000_000 {
            return Err(Error::DomainViolation(format!("{nanos} is not a valid nanosecond offset")));
        }
        self.seconds[i].store(seconds, Ordering::Release);
        self.nanos[i].store(nanos, Ordering::Release);
        Ok(())
    }

    /// Sets slot `i` from a high-level [`chrono::DateTime<Utc>`].
    pub fn set(&self, i: usize, value: DateTime<Utc>) -> Result<()> {
        self.set_raw(i, value.timestamp(), value.timestamp_subsec_nanos())
    }

    /// Clears slot `i` to missing. Fails with [`Error::OutOfBounds`] if
    /// `i >= size`.
    pub fn set_missing(&self, i: usize) -> Result<()> {
        self.check_writable()?;
        self.check_bounds(i)?;
        self.seconds[i].store(MISSING_SECONDS, Ordering::Release);
        self.nanos[i].store(0, Ordering::Release);
        Ok(())
    }

    /// Freezes the buffer; subsequent setters fail with [`Error::Frozen`].
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
        tracing::debug!(
            target: "tablecore::buffer::temporal",
            size = self.size(),
            "froze date-time buffer"
        );
    }

    /// Freezes the buffer (if not already) and consumes it into an
    /// immutable [`DateTimeColumn`].
    pub fn to_column(self) -> DateTimeColumn {
        self.freeze();
        let seconds: Vec<i64> = self.seconds.into_iter().map(|a| a.into_inner()).collect();
        let nanos: Vec<u32> = self.nanos.into_iter().map(|a| a.into_inner()).collect();
        DateTimeColumn::from_seconds_and_nanos(seconds, nanos)
    }
}

/// A fixed-size time-of-day buffer (nanoseconds since midnight).
pub struct TimeBuffer {
    nano_of_day: Vec<AtomicU64>,
    frozen: AtomicBool,
}

impl TimeBuffer {
    /// Allocates a buffer of `size` slots, all initially missing.
    pub fn new(size: usize) -> Self {
        Self {
            nano_of_day: (0..size).map(|_| AtomicU64::new(MISSING_NANO_OF_DAY)).collect(),
            frozen: AtomicBool::new(false),
        }
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.nano_of_day.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.frozen.load(Ordering::Acquire) {
            Err(Error::Frozen)
        } else {
            Ok(())
        }
    }

    fn check_bounds(&self, i: usize) -> Result<()> {
        if i >= self.nano_of_day.len() {
            Err(Error::OutOfBounds { index: i as i64, size: self.nano_of_day.len() })
        } else {
            Ok(())
        }
    }

    /// Sets slot `i` to `nano_of_day`. Fails with [`Error::OutOfBounds`] if
    /// `i >= size`, or [`Error::DomainViolation`] if
    /// `nano_of_day >= NANOS_PER_DAY`.
    pub fn set(&self, i: usize, nano_of_day: u64) -> Result<()> {
        self.check_writable()?;
        self.check_bounds(i)?;
        if nano_of_day >= NANOS_PER_DAY {
            return Err(Error::DomainViolation(format!(
                "{nano_of_day} is not a valid nano-of-day value (must be < {NANOS_PER_DAY})"
            )));
        }
        self.nano_of_day[i].store(nano_of_day, Ordering::Release);
        Ok(())
    }

    /// Clears slot `i` to missing. Fails with [`Error::OutOfBounds`] if
    /// `i >= size`.
    pub fn set_missing(&self, i: usize) -> Result<()> {
        self.check_writable()?;
        self.check_bounds(i)?;
        self.nano_of_day[i].store(MISSING_NANO_OF_DAY, Ordering::Release);
        Ok(())
    }

    /// Freezes the buffer; subsequent setters fail with [`Error::Frozen`].
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
        tracing::debug!(
            target: "tablecore::buffer::temporal",
            size = self.size(),
            "froze time-of-day buffer"
        );
    }

    /// Freezes the buffer (if not already) and consumes it into an
    /// immutable [`TimeColumn`].
    pub fn to_column(self) -> TimeColumn {
        self.freeze();
        let values: Vec<u64> = self.nano_of_day.into_iter().map(|a| a.into_inner()).collect();
        TimeColumn::from_nanos(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    #[test]
    fn datetime_rejects_sentinel_seconds_and_bad_nanos() {
        let buf = DateTimeBuffer::new(1);
        assert!(matches!(
            buf.set_raw(0, MISSING_SECONDS, 0),
            Err(Error::DomainViolation(_))
        ));
        assert!(matches!(
            buf.set_raw(0, 0, 1_000_000_000),
            Err(Error::DomainViolation(_))
        ));
    }

    #[test]
    fn datetime_round_trips_through_column() {
        let buf = DateTimeBuffer::new(2);
        buf.set_raw(0, 1_000, 5).unwrap();
        let col = buf.to_column();
        assert_eq!(col.get_object(0), Some(crate::column::ObjectValue::Int(1_000)));
        assert!(col.is_missing(1));
    }

    #[test]
    fn time_rejects_values_at_or_past_a_full_day() {
        let buf = TimeBuffer::new(1);
        assert!(matches!(buf.set(0, NANOS_PER_DAY), Err(Error::DomainViolation(_))));
        assert!(buf.set(0, NANOS_PER_DAY - 1).is_ok());
    }

    #[test]
    fn datetime_setters_reject_out_of_range_index() {
        let buf = DateTimeBuffer::new(1);
        assert!(matches!(
            buf.set_raw(1, 0, 0),
            Err(Error::OutOfBounds { index: 1, size: 1 })
        ));
        assert!(matches!(
            buf.set_missing(1),
            Err(Error::OutOfBounds { index: 1, size: 1 })
        ));
    }

    #[test]
    fn time_setters_reject_out_of_range_index() {
        let buf = TimeBuffer::new(1);
        assert!(matches!(buf.set(1, 0), Err(Error::OutOfBounds { index: 1, size: 1 })));
        assert!(matches!(
            buf.set_missing(1),
            Err(Error::OutOfBounds { index: 1, size: 1 })
        ));
    }

    #[test]
    fn time_round_trips_through_column() {
        let buf = TimeBuffer::new(2);
        buf.set(0, 123).unwrap();
        let col = buf.to_column();
        assert!(!col.is_missing(0));
        assert!(col.is_missing(1));
    }
}
