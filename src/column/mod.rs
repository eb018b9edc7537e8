//! Column variants and the public [`Column`] contract.
//!
//! A column is a polymorphic, frozen value with a fixed `size` and a
//! [`TypeDescriptor`]. Concrete storage lives in one of the sibling modules
//! ([`dense`], [`categorical`], [`object`], [`datetime`], [`time`],
//! [`mapped`]); [`Column`] is the capability set every variant implements,
//! kept dyn-compatible so columns can be stored and passed as
//! `Arc<dyn Column>`.

pub mod categorical;
pub mod dense;
pub mod mapped;
pub mod object;
pub mod datetime;
pub mod time;

use std::any::Any;
use std::cmp::Ordering;
use std::sync::Arc;

/// Reference to a frozen column, cheaply cloneable.
pub type ColumnRef = Arc<dyn Column>;

/// The broad value-class a column's elements belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueClass {
    /// Floating-point real numbers.
    Real,
    /// Whole numbers stored as `f64` (categorical indices, integer maps).
    Integer,
    /// A dictionary-backed category, including the boolean special case.
    Categorical,
    /// An opaque object value ([`crate::column::object::ObjectValue`]).
    Object,
    /// Calendar date-time.
    DateTime,
    /// Time of day.
    Time,
}

/// A column's declared type: its value class, a stable numeric id, and an
/// optional flag marking it as the two-valued boolean special case of
/// [`ValueClass::Categorical`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// Implementation-defined stable identifier for this type, used by the
    /// binary format's type table.
    pub id: u32,
    /// The broad value class.
    pub value_class: ValueClass,
    /// Whether this categorical type is a two-class boolean view.
    pub is_boolean: bool,
}

impl TypeDescriptor {
    /// Constructs a non-boolean descriptor for the given class.
    pub fn new(id: u32, value_class: ValueClass) -> Self {
        Self { id, value_class, is_boolean: false }
    }

    /// Constructs a boolean categorical descriptor.
    pub fn boolean(id: u32) -> Self {
        Self { id, value_class: ValueClass::Categorical, is_boolean: true }
    }
}

/// A closed set of object-column value kinds.
///
/// The declared class of object columns is left unspecified
/// beyond "references to values of the declared class"; this crate closes
/// that over the kinds its transform and format layers need to move
/// end-to-end.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectValue {
    /// A UTF-8 string value.
    Str(String),
    /// A signed 64-bit integer value.
    Int(i64),
    /// A 64-bit floating point value.
    Float(f64),
    /// An opaque byte blob.
    Bytes(Vec<u8>),
}

/// Comparator over object values, required by [`crate::sort::sort`] for
/// object columns that have no intrinsic order.
pub type ObjectComparator = Arc<dyn Fn(&ObjectValue, &ObjectValue) -> Ordering + Send + Sync>;

/// Every column variant implements this contract. Kept dyn-compatible (no
/// generic methods, no `Self`-returning methods) so columns are passed
/// around as `Arc<dyn Column>`.
pub trait Column: Send + Sync {
    /// Number of logical rows.
    fn size(&self) -> usize;

    /// This column's declared type.
    fn column_type(&self) -> &TypeDescriptor;

    /// Writes up to `dst.len()` logical rows starting at `start_row` as
    /// `f64`. Rows `< 0` or `>= size()` produce `NaN`. Categorical columns
    /// report their dictionary index (`0.0` = missing); temporal columns
    /// report seconds-of-epoch or nanos-of-day.
    fn fill_f64(&self, dst: &mut [f64], start_row: i64);

    /// Interleaved variant of [`fill_f64`](Self::fill_f64): logical row
    /// `start_row + k` is written to `dst[offset + k * stride]`.
    fn fill_f64_strided(&self, dst: &mut [f64], start_row: i64, offset: usize, stride: usize) {
        let mut row = start_row;
        let mut buf = [0.0f64; 1];
        let mut k = 0usize;
        while offset + k * stride < dst.len() {
            self.fill_f64(&mut buf, row);
            dst[offset + k * stride] = buf[0];
            row += 1;
            k += 1;
        }
    }

    /// Reads logical row `row` as an object value. Returns `None` when the
    /// row is missing or out of range. The default implementation is
    /// appropriate only for non-object variants that override
    /// [`fill_f64`](Self::fill_f64) meaningfully and never holds object
    /// data; concrete variants override this.
    fn get_object(&self, row: i64) -> Option<ObjectValue>;

    /// Writes up to `dst.len()` logical rows starting at `start_row` as
    /// object values (`None` = missing/out of range).
    fn fill_object(&self, dst: &mut [Option<ObjectValue>], start_row: i64) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = self.get_object(start_row + k as i64);
        }
    }

    /// Categorical-only: the dictionary index at `row`, or `None` if this
    /// column is not categorical.
    fn get_index(&self, row: i64) -> Option<u32>;

    /// Categorical-only: writes dictionary indices for `dst.len()` rows
    /// starting at `start_row`. Panics if this column is not categorical;
    /// callers should check [`column_type`](Self::column_type) first.
    fn fill_indices(&self, dst: &mut [i32], start_row: i64) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = self.get_index(start_row + k as i64).map(|i| i as i32).unwrap_or(0);
        }
    }

    /// True if logical row `row` is missing (out-of-range rows count as
    /// missing).
    fn is_missing(&self, row: i64) -> bool;

    /// Compares two logical rows of `self`, with missing values sorting
    /// greatest. Returns `None` if this column has no intrinsic order and
    /// no comparator (caller should fail with
    /// [`crate::error::Error::Unordered`]).
    fn compare_rows(&self, a: i64, b: i64) -> Option<Ordering>;

    /// Whether [`compare_rows`](Self::compare_rows) can return `Some` for
    /// every pair of rows in this column (intrinsic order, or a dictionary
    /// / object comparator is present).
    fn supports_sort(&self) -> bool;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
    /// Downcast support, mutable.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
