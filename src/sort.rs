//! The sort operator: order-by-column, with or without a user-supplied
//! comparator.

use std::cmp::Ordering;

use crate::column::ColumnRef;
use crate::error::{Error, Result};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Smallest-to-largest, missing last.
    Ascending,
    /// Largest-to-smallest, missing last.
    Descending,
}

/// Compares rows `a` and `b` of `column` under `order`, always sorting
/// missing values last regardless of direction. Shared by [`sort`] and by
/// `transform::parallel_sort`'s batch-local sort and merge passes.
pub(crate) fn row_cmp(column: &ColumnRef, order: Order, a: i64, b: i64) -> Ordering {
    let cmp = column.compare_rows(a, b).unwrap_or(Ordering::Equal);
    match order {
        Order::Ascending => cmp,
        Order::Descending => {
            if column.is_missing(a) || column.is_missing(b) {
                cmp
            } else {
                cmp.reverse()
            }
        }
    }
}

/// Returns a stable permutation `p` of `0..column.size()` such that
/// `column` indexed through `p` is in the requested order.
///
/// Missing values always sort last, regardless of `order`. Fails with
/// [`Error::Unordered`] if `column` has no intrinsic order and no
/// comparator.
pub fn sort(column: &ColumnRef, order: Order) -> Result<Vec<i32>> {
    if !column.supports_sort() {
        return Err(Error::Unordered);
    }
    let n = column.size();
    let mut idx: Vec<i32> = (0..n as i32).collect();
    idx.sort_by(|&a, &b| row_cmp(column, order, a as i64, b as i64));
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::dense::DenseDoubleColumn;
    use std::sync::Arc;

    #[test]
    fn ascending_sort_puts_nan_last() {
        let col: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![3.0, f64::NAN, 1.0, 2.0]));
        let p = sort(&col, Order::Ascending).unwrap();
        assert_eq!(p, vec![2, 3, 0, 1]);
    }

    #[test]
    fn descending_sort_still_puts_missing_last() {
        let col: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![3.0, f64::NAN, 1.0, 2.0]));
        let p = sort(&col, Order::Descending).unwrap();
        assert_eq!(p, vec![0, 3, 2, 1]);
    }

    #[test]
    fn sort_is_stable_for_equal_elements() {
        let col: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![1.0, 1.0, 0.0]));
        let p = sort(&col, Order::Ascending).unwrap();
        assert_eq!(p, vec![2, 0, 1]);
    }

    #[test]
    fn unordered_object_column_fails() {
        use crate::column::object::ObjectColumn;
        use crate::column::ObjectValue;
        let col: ColumnRef = Arc::new(ObjectColumn::new(1, vec![Some(ObjectValue::Int(1))]));
        assert!(matches!(sort(&col, Order::Ascending), Err(Error::Unordered)));
    }
}
