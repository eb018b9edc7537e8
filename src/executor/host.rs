//! The pluggable runtime host the executor submits work to.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// A single unit of work submitted to a [`Host`]: runs a calculator's
/// `do_part` for one batch.
pub type Job = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// The runtime boundary the executor submits batches through.
///
/// The core never creates threads directly; all concurrency flows through
/// `submit`. A single-threaded host (`parallelism() == 1`) is allowed and
/// makes the executor take only the sequential branch of its decision rule.
#[async_trait]
pub trait Host: Send + Sync {
    /// Whether the host is still accepting and running work. Consulted
    /// before every batch submission; cooperative cancellation is built on
    /// top of this.
    fn is_active(&self) -> bool;

    /// The host's declared degree of parallelism (`>= 1`).
    fn parallelism(&self) -> usize;

    /// Runs `job` to completion, returning its result. Implementations must
    /// not resolve the returned future before `job` itself resolves.
    async fn submit(&self, job: Job) -> Result<()>;
}

/// A [`Host`] backed by the ambient `tokio` runtime.
///
/// Batches are dispatched via [`tokio::spawn`]; `parallelism` defaults to
/// [`std::thread::available_parallelism`] and `is_active` defaults to an
/// [`Arc<AtomicBool>`] flag the embedder can flip to request cancellation.
pub struct TokioHost {
    parallelism: usize,
    active: Arc<AtomicBool>,
}

impl TokioHost {
    /// Creates a host with parallelism read from the environment and always
    /// active.
    pub fn new() -> Self {
        let parallelism = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self { parallelism, active: Arc::new(AtomicBool::new(true)) }
    }

    /// Creates a host with an explicit parallelism.
    pub fn with_parallelism(parallelism: usize) -> Self {
        Self { parallelism: parallelism.max(1), active: Arc::new(AtomicBool::new(true)) }
    }

    /// A clonable handle that can deactivate this host, for cooperative
    /// cancellation from outside the executor.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.active.clone()
    }
}

impl Default for TokioHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for TokioHost {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn parallelism(&self) -> usize {
        self.parallelism
    }

    async fn submit(&self, job: Job) -> Result<()> {
        match tokio::spawn(job).await {
            Ok(result) => result,
            Err(join_err) => Err(Error::ComputationFailed(format!("batch task panicked: {join_err}"))),
        }
    }
}
