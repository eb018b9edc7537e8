//! The data-parallel executor: workload-classed batch planning, dispatch
//! through a [`Host`], progress reporting, and cooperative cancellation.

pub mod host;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

pub use host::{Host, Job, TokioHost};

use crate::error::{Error, Result};

/// A small constant `>= 4` controlling when the executor prefers splitting
/// `N` into `parallelism` equal parts over fixed-size batches.
const THRESHOLD_FACTOR_EQUAL_PARTS: usize = 4;

/// Declared workload size, selecting the executor's batch-size and
/// parallelization-threshold constants.
///
/// `batch_size` and `threshold_parallel` are both monotonically
/// non-decreasing from `Default` through `Huge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadClass {
    /// The smallest batch size; suitable for cheap per-row work.
    Default,
    /// Small workloads.
    Small,
    /// Medium workloads.
    Medium,
    /// Large workloads.
    Large,
    /// The largest batch size; suitable for expensive per-row work.
    Huge,
}

impl WorkloadClass {
    /// The batch size used by the fixed-size-batches regime.
    pub fn batch_size(self) -> usize {
        match self {
            WorkloadClass::Default => 128,
            WorkloadClass::Small => 256,
            WorkloadClass::Medium => 1024,
            WorkloadClass::Large => 4096,
            WorkloadClass::Huge => 16384,
        }
    }

    /// The minimum `N` before the executor leaves the sequential regime.
    pub fn threshold_parallel(self) -> usize {
        self.batch_size()
    }
}

/// The capability set a unit of parallel work must implement.
///
/// `do_part`/`get_result` take `&self` because batches may run
/// concurrently; implementations hold their batch-local state behind
/// interior mutability (a `Mutex`, atomics, or per-batch slices of a
/// pre-sized buffer indexed by `batch_index`).
///
/// A calculator must never call [`run`] (or otherwise submit to a [`Host`])
/// from within its own `do_part` — nested submission is unsupported.
pub trait Calculator: Send + Sync {
    /// The value [`get_result`](Self::get_result) produces once every batch
    /// has completed.
    type Output;

    /// Called once before any batch runs, with the batch count that will be
    /// dispatched.
    fn init(&self, number_of_batches: usize);

    /// Processes rows `[from, to)` as batch `batch_index`. Batches are
    /// contiguous and `batch_index` values match those implied by `init`.
    fn do_part(&self, from: usize, to: usize, batch_index: usize) -> Result<()>;

    /// Assembles the final result after every batch has completed
    /// successfully. Not called if the run was aborted or any batch failed.
    fn get_result(&self) -> Self::Output;

    /// The total number of indexed operations this calculator will process
    /// (`N`).
    fn number_of_operations(&self) -> usize;
}

/// A caller-supplied sink for monotonically non-decreasing progress values
/// in `[0, 1]`. Called from whichever worker completes a batch, so it must
/// itself be thread-safe if it stores cross-worker state.
pub type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;

/// Rounds `boundary` down to the nearest multiple of 4, without going below
/// `min`.
fn align_down(boundary: usize, min: usize) -> usize {
    let aligned = (boundary / 4) * 4;
    aligned.max(min)
}

/// Computes the `(from, to)` batch boundaries for `n` operations under
/// `class`, given `parallelism`. Implements the three-branch
/// decision rule; see also its `N == 0` special case.
pub fn plan_batches(n: usize, class: WorkloadClass, parallelism: usize) -> Vec<(usize, usize)> {
    let p = parallelism.max(1);
    if n == 0 {
        return vec![(0, 0)];
    }

    let t = class.threshold_parallel();
    let b = class.batch_size();

    if n < t {
        return vec![(0, n)];
    }

    if n <= b * THRESHOLD_FACTOR_EQUAL_PARTS * p {
        return equal_parts_aligned(n, p);
    }

    fixed_size_batches(n, b)
}

/// Splits `[0, n)` into up to `p` equal parts, aligning interior boundaries
/// to a multiple of 4 and dropping any part left empty by the alignment.
/// The remainder of `n / p` is distributed to the leading parts before
/// alignment.
fn equal_parts_aligned(n: usize, p: usize) -> Vec<(usize, usize)> {
    let base = n / p;
    let rem = n % p;

    let mut raw_bounds = Vec::with_capacity(p + 1);
    raw_bounds.push(0usize);
    let mut cursor = 0usize;
    for i in 0..p {
        cursor += base + usize::from(i < rem);
        raw_bounds.push(cursor);
    }

    let last = raw_bounds.len() - 1;
    for bound in raw_bounds.iter_mut().take(last).skip(1) {
        *bound = align_down(*bound, 0);
    }
    *raw_bounds.last_mut().unwrap() = n;

    for i in 1..raw_bounds.len() {
        if raw_bounds[i] < raw_bounds[i - 1] {
            raw_bounds[i] = raw_bounds[i - 1];
        }
    }

    raw_bounds.windows(2).filter(|w| w[1] > w[0]).map(|w| (w[0], w[1])).collect()
}

/// Splits `[0, n)` into fixed-size batches of `b` elements; the final batch
/// absorbs any remainder.
fn fixed_size_batches(n: usize, b: usize) -> Vec<(usize, usize)> {
    let mut batches = Vec::with_capacity(n.div_ceil(b));
    let mut start = 0;
    while start < n {
        let end = (start + b).min(n);
        batches.push((start, end));
        start = end;
    }
    batches
}

/// Runs `calculator` over `[0, calculator.number_of_operations())`,
/// partitioned according to `class`, dispatched through `host`.
///
/// Before submitting each batch the executor consults `host.is_active()`;
/// if inactive, no further batches are submitted, already in-flight batches
/// still run to completion, and the call fails with
/// [`Error::TaskAborted`] without invoking `get_result`. If any batch's
/// `do_part` returns an error, remaining (not-yet-submitted) batches are
/// dropped, in-flight batches still run to completion, and the call fails
/// with [`Error::ComputationFailed`].
pub async fn run<C>(
    host: &dyn Host,
    calculator: Arc<C>,
    class: WorkloadClass,
    progress: Option<ProgressSink>,
) -> Result<C::Output>
where
    C: Calculator + 'static,
{
    let n = calculator.number_of_operations();
    let batches = plan_batches(n, class, host.parallelism());
    calculator.init(batches.len());

    tracing::debug!(
        target: "tablecore::executor",
        operations = n,
        batches = batches.len(),
        parallelism = host.parallelism(),
        "dispatching batches"
    );

    let total = batches.len();
    let completed = Arc::new(AtomicUsize::new(0));
    let max_in_flight = host.parallelism().max(1);

    let mut pending = batches.into_iter().enumerate();
    let mut in_flight = FuturesUnordered::new();
    let mut aborted = false;
    let mut first_error: Option<Error> = None;

    loop {
        while in_flight.len() < max_in_flight && first_error.is_none() && !aborted {
            if !host.is_active() {
                aborted = true;
                break;
            }
            let Some((batch_index, (from, to))) = pending.next() else { break };
            let calc = calculator.clone();
            let job: Job = Box::pin(async move { calc.do_part(from, to, batch_index) });
            in_flight.push(host.submit(job));
        }

        let Some(result) = in_flight.next().await else { break };
        match result {
            Ok(()) => {
                let done = completed.fetch_add(1, Ordering::AcqRel) + 1;
                if let Some(cb) = &progress {
                    cb(done as f64 / total as f64);
                }
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if aborted {
        tracing::debug!(target: "tablecore::executor", "run aborted: host went inactive");
        return Err(Error::TaskAborted);
    }
    if let Some(e) = first_error {
        tracing::debug!(target: "tablecore::executor", error = %e, "run failed: batch error");
        return Err(Error::ComputationFailed(e.to_string()));
    }
    Ok(calculator.get_result())
}
