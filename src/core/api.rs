//! MediaFire folder API client for mediafire-dl
//!
//! Handles folder metadata and content listing calls. Listing payloads are
//! permissive JSON; they are parsed into a `serde_json::Value` first and then
//! deserialized into typed models, so a response missing a required field
//! surfaces as `Error::InvalidContainer` instead of a generic parse failure.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::core::error::{Error, Result};

/// Default base URL for the MediaFire folder API
pub const DEFAULT_API_BASE: &str = "https://www.mediafire.com/api/1.4";

/// Global HTTP client shared by listing, resolution and download calls
static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(20)
        .read_timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("mediafire-dl/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// Matches the folder key inside a MediaFire folder URL
static FOLDER_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"folder/([A-Za-z0-9]+)").expect("folder key regex"));

/// Extracts the opaque folder key from a user-supplied folder URL.
///
/// Accepts anything containing a `folder/<key>` segment, the same shapes the
/// MediaFire web UI hands out. Fails with `Error::InvalidLink` otherwise.
pub fn parse_folder_key(url: &str) -> Result<String> {
    FOLDER_KEY_RE
        .captures(url)
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| Error::InvalidLink(url.to_string()))
}

/// Configuration for the folder API endpoints
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL for folder API calls
    pub api_base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// A remote sub-folder discovered by a folders listing
#[derive(Debug, Clone, Deserialize)]
pub struct FolderRef {
    #[serde(rename = "folderkey")]
    pub key: String,
    pub name: String,
}

/// One downloadable file discovered by a files listing
#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    #[serde(rename = "quickkey")]
    pub key: String,
    #[serde(rename = "filename")]
    pub name: String,
    /// Expected SHA-256 hex digest, when the listing reports one
    #[serde(default)]
    pub hash: Option<String>,
    /// Expected size in bytes; MediaFire serializes it as a string
    #[serde(default)]
    pub size: Option<String>,
    pub links: FileLinks,
}

impl FileRef {
    /// Expected byte count, when the listing carried a parseable size.
    pub fn expected_size(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Links block of a file listing entry
#[derive(Debug, Clone, Deserialize)]
pub struct FileLinks {
    /// Landing page the direct byte-stream URL is resolved from
    pub normal_download: String,
}

#[derive(Debug, Deserialize)]
struct FolderInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct FilesPage {
    files: Vec<FileRef>,
    #[serde(default)]
    more_chunks: Option<String>,
}

impl FilesPage {
    fn has_more(&self) -> bool {
        self.more_chunks.as_deref() == Some("yes")
    }
}

#[derive(Debug, Deserialize)]
struct FoldersPage {
    #[serde(default)]
    folders: Vec<FolderRef>,
}

/// Client for the MediaFire folder API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    /// Create a client against the public MediaFire API
    pub fn new() -> Self {
        Self::with_config(ApiConfig::default())
    }

    /// Create a client with a custom endpoint configuration
    pub fn with_config(config: ApiConfig) -> Self {
        Self {
            client: GLOBAL_CLIENT.clone(),
            config,
        }
    }

    /// The underlying HTTP client, shared with resolution and downloads
    pub fn http(&self) -> &Client {
        &self.client
    }

    fn info_url(&self, folder_key: &str) -> String {
        format!(
            "{}/folder/get_info.php?folder_key={folder_key}&response_format=json",
            self.config.api_base_url
        )
    }

    fn content_url(&self, folder_key: &str, content_type: &str, chunk: u32) -> String {
        format!(
            "{}/folder/get_content.php?content_type={content_type}&filter=all&order_by=name&order_direction=asc&chunk={chunk}&version=1.5&folder_key={folder_key}&response_format=json",
            self.config.api_base_url
        )
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Resolution(format!("folder listing request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Resolution(format!(
                "folder listing failed with status {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidContainer(format!("listing is not valid JSON: {e}")))
    }

    fn folder_content<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T> {
        let content = value
            .pointer("/response/folder_content")
            .ok_or_else(|| Error::InvalidContainer("missing folder_content in response".to_string()))?;
        serde_json::from_value(content.clone())
            .map_err(|e| Error::InvalidContainer(format!("malformed folder_content: {e}")))
    }

    /// Fetches the remote display name of a folder.
    pub async fn folder_name(&self, folder_key: &str) -> Result<String> {
        let value = self.fetch_json(&self.info_url(folder_key)).await?;
        let info = value
            .pointer("/response/folder_info")
            .ok_or_else(|| Error::InvalidContainer("missing folder_info in response".to_string()))?;
        let info: FolderInfo = serde_json::from_value(info.clone())
            .map_err(|e| Error::InvalidContainer(format!("malformed folder_info: {e}")))?;
        Ok(info.name)
    }

    /// Lists every file in a folder, following chunked pagination.
    ///
    /// Pages are fetched sequentially; pagination state is server-driven, so
    /// this is the one strictly serial path in the system.
    pub async fn list_files(&self, folder_key: &str) -> Result<Vec<FileRef>> {
        let mut files = Vec::new();
        let mut chunk = 1u32;

        loop {
            let value = self
                .fetch_json(&self.content_url(folder_key, "files", chunk))
                .await?;
            let page: FilesPage = Self::folder_content(&value)?;
            let has_more = page.has_more();
            files.extend(page.files);
            if !has_more {
                break;
            }
            chunk += 1;
        }

        Ok(files)
    }

    /// Lists the direct sub-folders of a folder.
    pub async fn list_folders(&self, folder_key: &str) -> Result<Vec<FolderRef>> {
        let value = self
            .fetch_json(&self.content_url(folder_key, "folders", 1))
            .await?;
        let page: FoldersPage = Self::folder_content(&value)?;
        Ok(page.folders)
    }
}
