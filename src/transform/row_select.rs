//! Row-select: a pure permutation operation, routed through the executor so
//! cancellation and progress reporting apply to it like any other
//! transform.

use std::sync::Mutex;

use crate::column::mapped::map_column;
use crate::column::ColumnRef;
use crate::error::Result;
use crate::executor::host::Host;
use crate::executor::{run, Calculator, ProgressSink, WorkloadClass};

/// A calculator that copies a row-map into a pre-sized output buffer,
/// batch by batch. The copy itself is trivial; running it through the
/// executor is what gives row-select cooperative cancellation and progress
/// reporting.
struct RowSelectCalculator {
    indices: Vec<i32>,
    output: Mutex<Vec<i32>>,
}

impl Calculator for RowSelectCalculator {
    type Output = Vec<i32>;

    fn init(&self, _number_of_batches: usize) {
        *self.output.lock().expect("row-select output lock poisoned") = vec![0; self.indices.len()];
    }

    fn do_part(&self, from: usize, to: usize, _batch_index: usize) -> Result<()> {
        self.output.lock().expect("row-select output lock poisoned")[from..to]
            .copy_from_slice(&self.indices[from..to]);
        Ok(())
    }

    fn get_result(&self) -> Vec<i32> {
        self.output.lock().expect("row-select output lock poisoned").clone()
    }

    fn number_of_operations(&self) -> usize {
        self.indices.len()
    }
}

/// Runs `indices` through the executor and applies it as a row-map over
/// `column`, producing a new overlay column of `indices.len()` rows.
pub async fn select_rows(
    host: &dyn Host,
    column: &ColumnRef,
    indices: Vec<i32>,
    class: WorkloadClass,
    progress: Option<ProgressSink>,
) -> Result<ColumnRef> {
    let calc = std::sync::Arc::new(RowSelectCalculator { indices, output: Mutex::new(Vec::new()) });
    let row_map = run(host, calc, class, progress).await?;
    Ok(map_column(column, row_map, true))
}

/// Like [`select_rows`], but selects a contiguous `[start, end)` range of
/// rows by index.
pub async fn select_range(
    host: &dyn Host,
    column: &ColumnRef,
    start: usize,
    end: usize,
    class: WorkloadClass,
    progress: Option<ProgressSink>,
) -> Result<ColumnRef> {
    let indices: Vec<i32> = (start as i32..end as i32).collect();
    select_rows(host, column, indices, class, progress).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::dense::DenseDoubleColumn;
    use crate::executor::TokioHost;
    use std::sync::Arc;

    #[tokio::test]
    async fn select_rows_reorders_and_drops() {
        let col: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![10.0, 20.0, 30.0, 40.0]));
        let host = TokioHost::with_parallelism(2);
        let selected = select_rows(&host, &col, vec![3, 0, -1], WorkloadClass::Default, None).await.unwrap();
        assert_eq!(selected.size(), 3);
        let mut dst = [0.0; 3];
        selected.fill_f64(&mut dst, 0);
        assert_eq!(dst[0], 40.0);
        assert_eq!(dst[1], 10.0);
        assert!(dst[2].is_nan());
    }

    #[tokio::test]
    async fn select_range_picks_a_contiguous_window() {
        let col: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![1.0, 2.0, 3.0, 4.0, 5.0]));
        let host = TokioHost::with_parallelism(2);
        let selected = select_range(&host, &col, 1, 4, WorkloadClass::Default, None).await.unwrap();
        let mut dst = [0.0; 3];
        selected.fill_f64(&mut dst, 0);
        assert_eq!(dst, [2.0, 3.0, 4.0]);
    }
}
