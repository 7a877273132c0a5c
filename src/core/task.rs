//! The download task for mediafire-dl
//!
//! One task owns one file: skip/stale decision, direct-link resolution,
//! streaming to disk and integrity verification. New bytes land in a
//! `.part` file that is renamed over the destination only after the digest
//! checks out, so the destination is always either fully valid or absent.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::StreamExt;
use log::{info, warn};
use reqwest::{Client, Response};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::core::api::FileRef;
use crate::core::digest;
use crate::core::error::{Error, Result};
use crate::core::naming;
use crate::core::resolver;

/// Terminal state of one download task
#[derive(Debug)]
pub enum TaskOutcome {
    /// Fetched and verified a file that was not present locally
    Completed,
    /// Local copy already matched the listing; no network call issued
    SkippedExisting,
    /// Local copy was stale and has been replaced with verified content
    Redownloaded,
    /// The task failed; the destination path holds no partial artifact
    Failed(Error),
    /// The cancellation signal was observed before completion
    Cancelled,
}

impl TaskOutcome {
    /// True for outcomes that leave a valid file at the destination.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TaskOutcome::Completed | TaskOutcome::SkippedExisting | TaskOutcome::Redownloaded
        )
    }
}

enum Existing {
    Absent,
    Valid,
    Stale,
}

enum StreamEnd {
    /// Fully streamed; carries the hex digest of the received bytes
    Done(String),
    Cancelled,
}

/// Runs one file download to a terminal outcome.
///
/// Checks the cancellation token before any work and between streamed
/// chunks; a cancelled task never leaves a partial file behind.
pub async fn execute(
    client: &Client,
    item: &FileRef,
    dir: &Path,
    cancel: &CancellationToken,
) -> TaskOutcome {
    if cancel.is_cancelled() {
        return TaskOutcome::Cancelled;
    }

    let dest = dir.join(naming::normalize(&item.name));

    let stale = match classify_existing(&dest, item).await {
        Ok(Existing::Valid) => {
            info!("'{}' already present, skipping", item.name);
            return TaskOutcome::SkippedExisting;
        }
        Ok(Existing::Stale) => {
            info!("'{}' is stale, re-downloading", item.name);
            true
        }
        Ok(Existing::Absent) => false,
        Err(e) => {
            warn!("'{}': cannot inspect existing file: {e}", item.name);
            return TaskOutcome::Failed(e);
        }
    };

    let direct_url = match resolver::resolve_direct_url(client, item).await {
        Ok(url) => url,
        Err(e) => {
            warn!("{e}");
            return TaskOutcome::Failed(e);
        }
    };

    if cancel.is_cancelled() {
        return TaskOutcome::Cancelled;
    }

    info!("downloading '{}'", item.name);

    match fetch_to(client, &direct_url, &dest, item, cancel).await {
        Ok(true) => {
            info!("'{}' downloaded", item.name);
            if stale {
                TaskOutcome::Redownloaded
            } else {
                TaskOutcome::Completed
            }
        }
        Ok(false) => {
            warn!("'{}' cancelled, partial file removed", item.name);
            TaskOutcome::Cancelled
        }
        Err(e) => {
            warn!("'{}' failed: {e}", item.name);
            TaskOutcome::Failed(e)
        }
    }
}

/// Decides whether an existing destination can be trusted.
///
/// Strongest available evidence wins: content hash, then expected size,
/// then bare presence when the listing carried no metadata at all.
async fn classify_existing(dest: &Path, item: &FileRef) -> Result<Existing> {
    if !dest.exists() {
        return Ok(Existing::Absent);
    }

    if let Some(expected) = item.hash.as_deref() {
        let actual = digest::file_digest(dest).await?;
        return Ok(if digest::matches(expected, &actual) {
            Existing::Valid
        } else {
            Existing::Stale
        });
    }

    if let Some(expected) = item.expected_size() {
        let metadata = tokio::fs::metadata(dest).await?;
        return Ok(if metadata.len() == expected {
            Existing::Valid
        } else {
            Existing::Stale
        });
    }

    Ok(Existing::Valid)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Ok(true) = fully written, verified and renamed into place;
/// Ok(false) = cancelled mid-stream, partial file removed.
async fn fetch_to(
    client: &Client,
    url: &str,
    dest: &Path,
    item: &FileRef,
    cancel: &CancellationToken,
) -> Result<bool> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Transport(format!(
            "download returned status {status}"
        )));
    }

    let part = part_path(dest);
    match stream_body(response, &part, cancel).await {
        Ok(StreamEnd::Done(actual)) => {
            if let Some(expected) = item.hash.as_deref() {
                if !digest::matches(expected, &actual) {
                    let _ = tokio::fs::remove_file(&part).await;
                    return Err(Error::Transport(format!(
                        "digest mismatch: expected {expected}, got {actual}"
                    )));
                }
            }
            // Replaces a stale destination atomically; the old file only
            // disappears once the new content is verified.
            if let Err(e) = tokio::fs::rename(&part, dest).await {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e.into());
            }
            Ok(true)
        }
        Ok(StreamEnd::Cancelled) => {
            let _ = tokio::fs::remove_file(&part).await;
            Ok(false)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            Err(e)
        }
    }
}

/// Streams the response body into `path`, hashing as it goes and checking
/// the cancellation token between chunks.
async fn stream_body(
    response: Response,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<StreamEnd> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut hasher = Sha256::new();
    let mut stream = response.bytes_stream();

    while let Some(next) = stream.next().await {
        let chunk: Bytes =
            next.map_err(|e| Error::Transport(format!("stream read error: {e}")))?;
        if cancel.is_cancelled() {
            return Ok(StreamEnd::Cancelled);
        }
        hasher.update(&chunk);
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(StreamEnd::Done(hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::api::FileLinks;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &[u8] = b"the quick brown fox jumps over the lazy dog";

    fn body_digest() -> String {
        hex::encode(Sha256::digest(BODY))
    }

    fn item(server_uri: &str, hash: Option<String>) -> FileRef {
        FileRef {
            key: "q1".to_string(),
            name: "fox.txt".to_string(),
            hash,
            size: Some(BODY.len().to_string()),
            links: FileLinks {
                normal_download: format!("{server_uri}/file/q1"),
            },
        }
    }

    async fn mount_happy_path(server: &MockServer, expected_downloads: u64) {
        Mock::given(method("GET"))
            .and(url_path("/file/q1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<a class="input popsok" href="{}/direct/q1">Download</a>"#,
                server.uri()
            )))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(url_path("/direct/q1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(BODY, "application/octet-stream"),
            )
            .expect(expected_downloads)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fresh_download_completes_and_verifies() {
        let server = MockServer::start().await;
        mount_happy_path(&server, 1).await;
        let dir = tempdir().unwrap();

        let outcome = execute(
            &Client::new(),
            &item(&server.uri(), Some(body_digest())),
            dir.path(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Completed));
        let dest = dir.path().join("fox.txt");
        assert_eq!(std::fs::read(&dest).unwrap(), BODY);
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_valid_existing_file_is_skipped_without_network() {
        let server = MockServer::start().await;
        // Any request at all would trip these expectations.
        mount_happy_path(&server, 0).await;
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("fox.txt"), BODY).unwrap();

        let outcome = execute(
            &Client::new(),
            &item(&server.uri(), Some(body_digest())),
            dir.path(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::SkippedExisting));
    }

    #[tokio::test]
    async fn test_stale_file_is_redownloaded_and_replaced() {
        let server = MockServer::start().await;
        mount_happy_path(&server, 1).await;
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("fox.txt"), b"old corrupted bytes").unwrap();

        let outcome = execute(
            &Client::new(),
            &item(&server.uri(), Some(body_digest())),
            dir.path(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Redownloaded));
        assert_eq!(std::fs::read(dir.path().join("fox.txt")).unwrap(), BODY);
    }

    #[tokio::test]
    async fn test_size_fallback_detects_stale_when_no_hash() {
        let server = MockServer::start().await;
        mount_happy_path(&server, 1).await;
        let dir = tempdir().unwrap();
        // Wrong length, and the listing carries no hash: size decides.
        std::fs::write(dir.path().join("fox.txt"), b"short").unwrap();

        let outcome = execute(
            &Client::new(),
            &item(&server.uri(), None),
            dir.path(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Redownloaded));
        assert_eq!(std::fs::read(dir.path().join("fox.txt")).unwrap(), BODY);
    }

    #[tokio::test]
    async fn test_blocked_page_fails_resolution_with_no_side_effects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/file/q1"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        let dir = tempdir().unwrap();

        let outcome = execute(
            &Client::new(),
            &item(&server.uri(), Some(body_digest())),
            dir.path(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Failed(Error::Resolution(_))));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_non_success_download_leaves_nothing_behind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/file/q1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<a class="input popsok" href="{}/direct/q1">Download</a>"#,
                server.uri()
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(url_path("/direct/q1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = tempdir().unwrap();

        let outcome = execute(
            &Client::new(),
            &item(&server.uri(), Some(body_digest())),
            dir.path(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Failed(Error::Transport(_))));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_digest_mismatch_is_transport_failure_with_cleanup() {
        let server = MockServer::start().await;
        mount_happy_path(&server, 1).await;
        let dir = tempdir().unwrap();

        let wrong = "0".repeat(64);
        let outcome = execute(
            &Client::new(),
            &item(&server.uri(), Some(wrong)),
            dir.path(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Failed(Error::Transport(_))));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_pre_cancelled_task_has_no_side_effects() {
        let server = MockServer::start().await;
        mount_happy_path(&server, 0).await;
        let dir = tempdir().unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = execute(
            &Client::new(),
            &item(&server.uri(), Some(body_digest())),
            dir.path(),
            &cancel,
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Cancelled));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/out/archive.tar.gz")),
            Path::new("/tmp/out/archive.tar.gz.part")
        );
    }
}
