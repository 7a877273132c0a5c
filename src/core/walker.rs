//! Recursive folder traversal for mediafire-dl
//!
//! Walks the remote folder tree depth-first, mirroring it into a local
//! directory tree. Discovery is sequential per branch; all parallelism is
//! spent inside the scheduler on file downloads, and a folder's downloads
//! fully drain before the walker descends into its sub-folders.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{info, warn};

use crate::core::api::{ApiClient, ApiConfig, FileRef};
use crate::core::error::Result;
use crate::core::naming;
use crate::core::scheduler::{self, FetchOptions};
use crate::core::task::{self, TaskOutcome};

/// Per-run bookkeeping of terminal task outcomes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Files fetched that were not present locally
    pub completed: u64,
    /// Files skipped because the local copy matched the listing
    pub skipped: u64,
    /// Stale local files replaced with verified content
    pub redownloaded: u64,
    /// Files or branches that failed
    pub failed: u64,
    /// Tasks that observed the cancellation signal
    pub cancelled: u64,
}

impl Summary {
    fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Completed => self.completed += 1,
            TaskOutcome::SkippedExisting => self.skipped += 1,
            TaskOutcome::Redownloaded => self.redownloaded += 1,
            TaskOutcome::Failed(_) => self.failed += 1,
            TaskOutcome::Cancelled => self.cancelled += 1,
        }
    }

    fn merge(&mut self, other: Summary) {
        self.completed += other.completed;
        self.skipped += other.skipped;
        self.redownloaded += other.redownloaded;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
    }

    /// Total number of recorded outcomes.
    pub fn total(&self) -> u64 {
        self.completed + self.skipped + self.redownloaded + self.failed + self.cancelled
    }
}

/// Mirrors a remote folder tree into a local directory
pub struct Walker {
    api: ApiClient,
    options: FetchOptions,
    dispatched: Arc<AtomicU64>,
    settled: Arc<AtomicU64>,
}

impl Walker {
    /// Create a walker against the public MediaFire API
    pub fn new(options: FetchOptions) -> Self {
        Self::with_config(ApiConfig::default(), options)
    }

    /// Create a walker with a custom endpoint configuration
    pub fn with_config(config: ApiConfig, options: FetchOptions) -> Self {
        Self {
            api: ApiClient::with_config(config),
            options,
            dispatched: Arc::new(AtomicU64::new(0)),
            settled: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Walks the folder identified by `folder_key` into `output_dir`.
    ///
    /// The root directory is named after the folder's own remote display
    /// name, not the user-supplied link. A failure here (metadata or listing
    /// of the root unreachable/malformed) is fatal; failures below the root
    /// are contained per branch.
    pub async fn run(&self, folder_key: &str, output_dir: &Path) -> Result<Summary> {
        let name = self.api.folder_name(folder_key).await?;
        let root = output_dir.join(naming::normalize(&name));
        info!("mirroring folder '{}' into {}", name, root.display());
        self.walk(folder_key.to_string(), root).await
    }

    fn walk(&self, key: String, dir: PathBuf) -> BoxFuture<'_, Result<Summary>> {
        async move {
            let mut summary = Summary::default();
            if self.options.cancel.is_cancelled() {
                return Ok(summary);
            }

            // The directory exists before anything inside it is listed or
            // fetched; pre-existing directories are reused, never wiped.
            tokio::fs::create_dir_all(&dir).await?;

            let files = self.api.list_files(&key).await?;
            if !files.is_empty() {
                self.dispatched
                    .fetch_add(files.len() as u64, Ordering::Relaxed);
                self.notify_progress();

                let outcomes = scheduler::run(
                    files,
                    self.options.concurrency,
                    self.options.cancel.clone(),
                    Some(self.settled_hook()),
                    self.download_job(&dir),
                )
                .await;

                for outcome in &outcomes {
                    summary.record(outcome);
                }
            }

            if self.options.cancel.is_cancelled() {
                return Ok(summary);
            }

            for sub in self.api.list_folders(&key).await? {
                if self.options.cancel.is_cancelled() {
                    break;
                }
                let sub_dir = dir.join(naming::normalize(&sub.name));
                match self.walk(sub.key.clone(), sub_dir).await {
                    Ok(nested) => summary.merge(nested),
                    Err(e) => {
                        // One bad branch must not take down its siblings.
                        warn!("skipping folder '{}': {e}", sub.name);
                        summary.failed += 1;
                    }
                }
            }

            Ok(summary)
        }
        .boxed()
    }

    fn download_job(
        &self,
        dir: &Path,
    ) -> impl Fn(FileRef) -> futures::future::BoxFuture<'static, TaskOutcome> + Send + Sync + 'static
    {
        let client = self.api.http().clone();
        let dir = dir.to_path_buf();
        let cancel = self.options.cancel.clone();
        move |item: FileRef| {
            let client = client.clone();
            let dir = dir.clone();
            let cancel = cancel.clone();
            async move { task::execute(&client, &item, &dir, &cancel).await }.boxed()
        }
    }

    fn settled_hook(&self) -> scheduler::SettledHook {
        let settled = Arc::clone(&self.settled);
        let dispatched = Arc::clone(&self.dispatched);
        let progress = self.options.progress.clone();
        Arc::new(move |_outcome| {
            let done = settled.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = &progress {
                progress(done, dispatched.load(Ordering::Relaxed));
            }
        })
    }

    fn notify_progress(&self) {
        if let Some(progress) = &self.options.progress {
            progress(
                self.settled.load(Ordering::Relaxed),
                self.dispatched.load(Ordering::Relaxed),
            );
        }
    }
}
