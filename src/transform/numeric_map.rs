//! Numeric map: fills a dense-double payload from a user function applied
//! to rows materialized from one or more source columns.

use std::sync::Mutex;

use crate::column::dense::DenseDoubleColumn;
use crate::column::{ColumnRef, TypeDescriptor, ValueClass};
use crate::error::Result;
use crate::executor::Calculator;

/// Rounds `v` half-to-even, matching the integer-output rounding rule of
/// a column-to-column elementwise transform.
pub fn round_half_even(v: f64) -> f64 {
    if !v.is_finite() {
        return v;
    }
    let floor = v.floor();
    let diff = v - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

/// A calculator that fills a dense-double output column by applying `f` to
/// the numeric values of one or more source columns, row by row.
pub struct NumericMapCalculator<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    sources: Vec<ColumnRef>,
    f: F,
    output: Mutex<Vec<f64>>,
    value_class: ValueClass,
    type_id: u32,
}

impl<F> NumericMapCalculator<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    /// Builds a calculator mapping `sources` (materialized row-by-row as
    /// `f64`) through `f`. `value_class` must be [`ValueClass::Real`] or
    /// [`ValueClass::Integer`]; integer output is rounded half-to-even.
    pub fn new(sources: Vec<ColumnRef>, f: F, value_class: ValueClass, type_id: u32) -> Self {
        assert!(!sources.is_empty(), "numeric map requires at least one source column");
        let n = sources[0].size();
        Self { sources, f, output: Mutex::new(vec![0.0; n]), value_class, type_id }
    }
}

impl<F> Calculator for NumericMapCalculator<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    type Output = DenseDoubleColumn;

    fn init(&self, _number_of_batches: usize) {}

    fn do_part(&self, from: usize, to: usize, _batch_index: usize) -> Result<()> {
        let mut row_values = vec![0.0; self.sources.len()];
        let mut out = self.output.lock().expect("numeric map output lock poisoned");
        for row in from..to {
            let mut one = [0.0f64; 1];
            for (i, src) in self.sources.iter().enumerate() {
                src.fill_f64(&mut one, row as i64);
                row_values[i] = one[0];
            }
            let v = (self.f)(&row_values);
            out[row] = if self.value_class == ValueClass::Integer { round_half_even(v) } else { v };
        }
        Ok(())
    }

    fn get_result(&self) -> DenseDoubleColumn {
        let payload = self.output.lock().expect("numeric map output lock poisoned").clone();
        DenseDoubleColumn::with_type(TypeDescriptor::new(self.type_id, self.value_class), payload)
    }

    fn number_of_operations(&self) -> usize {
        self.sources[0].size()
    }
}
