//! Bounded parallel dispatch for mediafire-dl
//!
//! Every item gets its own task, but at most `concurrency` of them hold a
//! semaphore permit at any moment. The scheduler joins every task before
//! returning, so a caller never observes the filesystem mid-mutation, and
//! cancellation drains waiters immediately instead of letting them queue up
//! behind permits that will never do useful work.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::core::error::Error;
use crate::core::task::TaskOutcome;

/// Default worker-pool size for downloads
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Progress callback: (files settled, files discovered so far)
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Hook invoked once per task as it reaches a terminal outcome
pub type SettledHook = Arc<dyn Fn(&TaskOutcome) + Send + Sync>;

/// Options for a folder fetch
#[derive(Clone)]
pub struct FetchOptions {
    /// Concurrency ceiling for downloads (strictly positive)
    pub concurrency: usize,

    /// Cancellation signal observed by the walker, scheduler and every task
    pub cancel: CancellationToken,

    /// Optional progress callback
    pub progress: Option<ProgressCallback>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }
}

/// Runs `job` over every item with at most `concurrency` running at once.
///
/// Outcomes are returned in input order; completion order is whatever the
/// network decides. Tasks waiting for a permit race the cancellation token,
/// so an interrupt converges without admitting new work, and the function
/// returns only after every spawned task has been joined.
pub async fn run<T, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    cancel: CancellationToken,
    on_settled: Option<SettledHook>,
    job: F,
) -> Vec<TaskOutcome>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskOutcome> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let job = Arc::new(job);

    let mut handles = Vec::with_capacity(items.len());
    for item in items {
        let semaphore = Arc::clone(&semaphore);
        let job = Arc::clone(&job);
        let cancel = cancel.clone();
        let on_settled = on_settled.clone();

        handles.push(tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;

                _ = cancel.cancelled() => TaskOutcome::Cancelled,

                permit = semaphore.acquire_owned() => match permit {
                    Ok(_permit) => (*job)(item).await,
                    Err(_) => TaskOutcome::Cancelled,
                },
            };
            if let Some(hook) = &on_settled {
                hook(&outcome);
            }
            outcome
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(match handle.await {
            Ok(outcome) => outcome,
            Err(e) => TaskOutcome::Failed(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("download worker panicked: {e}"),
            ))),
        });
    }
    outcomes
}
