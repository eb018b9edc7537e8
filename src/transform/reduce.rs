//! Object reducer: a batch-local accumulator folded over rows, then
//! combined across batches.

use std::sync::Mutex;

use crate::column::{ColumnRef, ObjectValue};
use crate::error::{Error, Result};
use crate::executor::Calculator;

/// A calculator folding one or more source columns into a single
/// accumulator of type `A`.
///
/// `supplier` creates a fresh, batch-local accumulator (called once per
/// batch); `reducer` folds one row's materialized values into it;
/// `combiner` folds two accumulators into one and must be associative and
/// compatible with the supplier's identity value, since combining order
/// across batches is unspecified.
pub struct ObjectReduceCalculator<A, S, R, Cm>
where
    A: Send + 'static,
    S: Fn() -> Option<A> + Send + Sync,
    R: Fn(&mut A, &[Option<ObjectValue>]) + Send + Sync,
    Cm: Fn(A, A) -> A + Send + Sync,
{
    sources: Vec<ColumnRef>,
    supplier: S,
    reducer: R,
    combiner: Cm,
    partials: Mutex<Vec<Option<A>>>,
}

impl<A, S, R, Cm> ObjectReduceCalculator<A, S, R, Cm>
where
    A: Send + 'static,
    S: Fn() -> Option<A> + Send + Sync,
    R: Fn(&mut A, &[Option<ObjectValue>]) + Send + Sync,
    Cm: Fn(A, A) -> A + Send + Sync,
{
    /// Builds a reducer over `sources`, all of which must share the same
    /// [`Column::size`].
    pub fn new(sources: Vec<ColumnRef>, supplier: S, reducer: R, combiner: Cm) -> Self {
        assert!(!sources.is_empty(), "object reduce requires at least one source column");
        Self { sources, supplier, reducer, combiner, partials: Mutex::new(Vec::new()) }
    }
}

impl<A, S, R, Cm> Calculator for ObjectReduceCalculator<A, S, R, Cm>
where
    A: Send + 'static,
    S: Fn() -> Option<A> + Send + Sync,
    R: Fn(&mut A, &[Option<ObjectValue>]) + Send + Sync,
    Cm: Fn(A, A) -> A + Send + Sync,
{
    type Output = Option<A>;

    fn init(&self, number_of_batches: usize) {
        *self.partials.lock().expect("reduce partials lock poisoned") = (0..number_of_batches).map(|_| None).collect();
    }

    fn do_part(&self, from: usize, to: usize, batch_index: usize) -> Result<()> {
        let mut acc = (self.supplier)().ok_or(Error::NullAccumulator)?;
        let mut row_values: Vec<Option<ObjectValue>> = vec![None; self.sources.len()];
        for row in from..to {
            for (i, src) in self.sources.iter().enumerate() {
                row_values[i] = src.get_object(row as i64);
            }
            (self.reducer)(&mut acc, &row_values);
        }
        self.partials.lock().expect("reduce partials lock poisoned")[batch_index] = Some(acc);
        Ok(())
    }

    fn get_result(&self) -> Option<A> {
        let mut partials = self.partials.lock().expect("reduce partials lock poisoned");
        let taken = std::mem::take(&mut *partials);
        taken
            .into_iter()
            .flatten()
            .reduce(|a, b| (self.combiner)(a, b))
    }

    fn number_of_operations(&self) -> usize {
        self.sources[0].size()
    }
}
