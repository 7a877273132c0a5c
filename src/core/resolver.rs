//! Direct-link resolution for mediafire-dl
//!
//! A file listing only carries the URL of a landing page; the actual
//! byte-stream URL sits in the page's download anchor. Blocked or deleted
//! files serve a page without that anchor, which surfaces here as a
//! resolution failure.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;

use crate::core::api::FileRef;
use crate::core::error::{Error, Result};

/// Matches the href of the download anchor on a file landing page
static DIRECT_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"class="input popsok"[^>]*href="([^"]+)""#).expect("direct link regex")
});

/// Resolves a file's landing page into its direct download URL.
///
/// Any failure here (unreachable page, non-success status, anchor missing)
/// is an `Error::Resolution`; the file has not been touched on disk yet.
pub async fn resolve_direct_url(client: &Client, item: &FileRef) -> Result<String> {
    let page_url = &item.links.normal_download;

    let response = client
        .get(page_url)
        .send()
        .await
        .map_err(|e| Error::Resolution(format!("'{}': download page unreachable: {e}", item.name)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Resolution(format!(
            "'{}': download page returned {status} (deleted or blocked file?)",
            item.name
        )));
    }

    let html = response.text().await.map_err(|e| {
        Error::Resolution(format!("'{}': failed reading download page: {e}", item.name))
    })?;

    extract_direct_link(&html).ok_or_else(|| {
        Error::Resolution(format!(
            "'{}': no direct download link on {page_url}",
            item.name
        ))
    })
}

fn extract_direct_link(html: &str) -> Option<String> {
    DIRECT_LINK_RE
        .captures(html)
        .map(|captures| captures[1].to_string())
}
