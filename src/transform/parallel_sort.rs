//! Executor-driven sort: each batch is sorted sequentially, then completed
//! batches are merged pairwise into the final permutation.

use std::sync::{Arc, Mutex};

use crate::column::ColumnRef;
use crate::error::{Error, Result};
use crate::executor::host::Host;
use crate::executor::{plan_batches, run, Calculator, ProgressSink, WorkloadClass};
use crate::sort::{row_cmp, Order};

struct SortBatchCalculator {
    column: ColumnRef,
    order: Order,
    output: Mutex<Vec<i32>>,
}

impl Calculator for SortBatchCalculator {
    type Output = Vec<i32>;

    fn init(&self, _number_of_batches: usize) {}

    fn do_part(&self, from: usize, to: usize, _batch_index: usize) -> Result<()> {
        let mut rows: Vec<i32> = (from as i32..to as i32).collect();
        rows.sort_by(|&a, &b| row_cmp(&self.column, self.order, a as i64, b as i64));
        self.output.lock().expect("sort output lock poisoned")[from..to].copy_from_slice(&rows);
        Ok(())
    }

    fn get_result(&self) -> Vec<i32> {
        self.output.lock().expect("sort output lock poisoned").clone()
    }

    fn number_of_operations(&self) -> usize {
        self.column.size()
    }
}

/// Merges two row-index lists, each already sorted under `order`, into one.
fn merge_two(column: &ColumnRef, order: Order, a: Vec<i32>, b: Vec<i32>) -> Vec<i32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if row_cmp(column, order, a[i] as i64, b[j] as i64) != std::cmp::Ordering::Greater {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Sorts `column` through the executor: each batch is sorted sequentially
/// inside `do_part` (so `doPart` never blocks on another submission), then
/// the batch-local permutations are merged pairwise into the final global
/// permutation. Fails with [`Error::Unordered`] up front if `column` has no
/// intrinsic order and no comparator.
pub async fn parallel_sort(
    host: &dyn Host,
    column: ColumnRef,
    order: Order,
    class: WorkloadClass,
    progress: Option<ProgressSink>,
) -> Result<Vec<i32>> {
    if !column.supports_sort() {
        return Err(Error::Unordered);
    }
    let n = column.size();
    let batches = plan_batches(n, class, host.parallelism());
    let calc = Arc::new(SortBatchCalculator {
        column: column.clone(),
        order,
        output: Mutex::new(vec![0; n]),
    });
    let locally_sorted = run(host, calc, class, progress).await?;

    let mut segments: Vec<Vec<i32>> =
        batches.iter().map(|&(from, to)| locally_sorted[from..to].to_vec()).collect();
    while segments.len() > 1 {
        let mut merged = Vec::with_capacity(segments.len().div_ceil(2));
        let mut it = segments.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => merged.push(merge_two(&column, order, a, b)),
                None => merged.push(a),
            }
        }
        segments = merged;
    }
    Ok(segments.into_iter().next().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::dense::DenseDoubleColumn;
    use crate::executor::TokioHost;

    #[tokio::test]
    async fn sorts_across_many_batches_ascending() {
        let mut values: Vec<f64> = (0..5000).map(|i| (5000 - i) as f64).collect();
        values[10] = f64::NAN;
        let col: ColumnRef = Arc::new(DenseDoubleColumn::from_values(values.clone()));
        let host = TokioHost::with_parallelism(4);
        let perm = parallel_sort(&host, col, Order::Ascending, WorkloadClass::Default, None).await.unwrap();
        assert_eq!(perm.len(), values.len());
        let resolved: Vec<f64> = perm.iter().map(|&i| values[i as usize]).collect();
        for w in resolved.windows(2) {
            if !w[0].is_nan() && !w[1].is_nan() {
                assert!(w[0] <= w[1]);
            }
        }
        assert!(resolved.last().unwrap().is_nan());
    }

    #[tokio::test]
    async fn unordered_column_fails_before_dispatch() {
        use crate::column::object::ObjectColumn;
        use crate::column::ObjectValue;
        let col: ColumnRef = Arc::new(ObjectColumn::new(1, vec![Some(ObjectValue::Int(1))]));
        let host = TokioHost::with_parallelism(1);
        let err = parallel_sort(&host, col, Order::Ascending, WorkloadClass::Default, None).await.unwrap_err();
        assert!(matches!(err, Error::Unordered));
    }
}
