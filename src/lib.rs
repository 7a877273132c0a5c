//! # mediafire-dl Library
//!
//! A bulk MediaFire folder downloader: mirrors a remote folder tree into a
//! local directory with bounded parallelism, SHA-256 integrity verification
//! and clean cancellation.
//!
//! ## Features
//!
//! - **Recursive mirroring**: sub-folders become sub-directories, 1:1
//! - **Bounded parallelism**: at most N files stream at once
//! - **Idempotent re-runs**: files whose local copy matches the listed hash
//!   are skipped without a network call; stale files are replaced atomically
//! - **Clean cancellation**: a cancellation token drains every in-flight
//!   download before control returns, leaving no partial files behind
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Mirror into the current directory
//!     let summary = mediafire_dl::get("https://www.mediafire.com/folder/abc123xyz", None).await?;
//!     println!("{} files downloaded, {} skipped", summary.completed, summary.skipped);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Progress Tracking
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     mediafire_dl::get_with_progress(
//!         "https://www.mediafire.com/folder/abc123xyz",
//!         Some("./downloads"),
//!         |settled, discovered| {
//!             println!("Progress: {}/{} files", settled, discovered);
//!         }
//!     ).await?;
//!
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

// Re-export core types that users might need
pub use crate::core::api::{parse_folder_key, ApiConfig};
pub use crate::core::error::{Error, Result};
pub use crate::core::scheduler::{FetchOptions, ProgressCallback, DEFAULT_CONCURRENCY};
pub use crate::core::task::TaskOutcome;
pub use crate::core::walker::{Summary, Walker};

// Internal modules
mod core;

/// Download a MediaFire folder tree
///
/// # Arguments
/// * `folder_url` - A MediaFire folder URL (anything containing `folder/<key>`)
/// * `output_dir` - Optional output directory. Defaults to the current directory;
///   the folder's own remote name becomes the root directory inside it
///
/// # Examples
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// mediafire_dl::get("https://www.mediafire.com/folder/abc123xyz", Some("./downloads")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn get(folder_url: &str, output_dir: Option<&str>) -> Result<Summary> {
    get_with_options(folder_url, output_dir, FetchOptions::default()).await
}

/// Download with progress tracking
///
/// The callback receives `(files settled, files discovered so far)`; the
/// second number grows as the walker descends into sub-folders.
pub async fn get_with_progress<F>(
    folder_url: &str,
    output_dir: Option<&str>,
    progress: F,
) -> Result<Summary>
where
    F: Fn(u64, u64) + Send + Sync + 'static,
{
    let options = FetchOptions {
        progress: Some(Arc::new(progress)),
        ..Default::default()
    };
    get_with_options(folder_url, output_dir, options).await
}

/// Download with custom options
///
/// Provides full control over concurrency, cancellation and progress
/// tracking.
///
/// # Examples
/// ```rust,no_run
/// use mediafire_dl::FetchOptions;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cancel = CancellationToken::new();
/// let options = FetchOptions {
///     concurrency: 4,
///     cancel: cancel.clone(),
///     ..Default::default()
/// };
///
/// // cancel.cancel() from a signal handler aborts cleanly
/// mediafire_dl::get_with_options("https://www.mediafire.com/folder/abc123xyz", None, options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn get_with_options(
    folder_url: &str,
    output_dir: Option<&str>,
    options: FetchOptions,
) -> Result<Summary> {
    let folder_key = parse_folder_key(folder_url)?;
    let output = Path::new(output_dir.unwrap_or("."));
    Walker::new(options).run(&folder_key, output).await
}
