//! BLS time-series sync
//!
//! Scrapes the BLS directory listing for the `pr.data.0.Current` file(s),
//! downloads each with bounded retry, and uploads to the object store under
//! the `rearc-data-quest/bls/` prefix. Uploads carry a `local_md5` metadata
//! entry; a file whose digest is unchanged since the last run is skipped.

use anyhow::{bail, Context, Result};
use quest_common::checksum::{md5_hex, MD5_METADATA_KEY};
use quest_common::types::{content_type, BLS_PREFIX};
use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::store::{ObjectStore, PutOptions};

/// Counters for one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlsSyncStats {
    pub uploaded: usize,
    pub skipped: usize,
}

/// Syncs BLS source files into the object store
pub struct BlsSync {
    client: Client,
    config: IngestConfig,
}

impl BlsSync {
    pub fn new(client: Client, config: IngestConfig) -> Self {
        Self { client, config }
    }

    /// Sync all discovered files, uploading only those whose content changed.
    pub async fn sync(&self, store: &dyn ObjectStore) -> Result<BlsSyncStats> {
        let listing = self
            .fetch_index()
            .await
            .context("Failed to fetch BLS index")?;
        let files = extract_data_files(&listing);
        info!(files = files.len(), "Discovered BLS source files");

        let mut stats = BlsSyncStats::default();

        for name in &files {
            let url = join_url(&self.config.bls_base, name)?;
            info!(%url, "Fetching BLS file");

            let blob = self.download_with_retry(&url).await?;
            let digest = md5_hex(&blob);
            let key = format!("{}{}", BLS_PREFIX, file_name(name));

            let stored_digest = store
                .head(&key)
                .await?
                .and_then(|meta| meta.metadata.get(MD5_METADATA_KEY).cloned());

            if stored_digest.as_deref() == Some(digest.as_str()) {
                info!(%key, "Already up-to-date, skipping upload");
                stats.skipped += 1;
                continue;
            }

            info!(%key, bytes = blob.len(), "Uploading BLS file");
            store
                .put(
                    &key,
                    blob,
                    PutOptions::with_content_type(content_type::CSV)
                        .metadata(MD5_METADATA_KEY, digest),
                )
                .await?;
            stats.uploaded += 1;
        }

        Ok(stats)
    }

    async fn fetch_index(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.config.bls_index)
            .send()
            .await
            .context("Index request failed")?;

        if !response.status().is_success() {
            bail!("Index request returned {}", response.status());
        }

        Ok(response.text().await.context("Failed to read index body")?)
    }

    /// Download a URL with exponential backoff on throttling/server errors.
    pub async fn download_with_retry(&self, url: &str) -> Result<Vec<u8>> {
        for attempt in 0..self.config.max_retries {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .with_context(|| format!("Request to {url} failed"))?;

            let status = response.status();
            if status.is_success() {
                return Ok(response.bytes().await.context("Failed to read body")?.to_vec());
            }

            if is_retryable(status) && attempt + 1 < self.config.max_retries {
                let backoff_secs = 2u64.pow(attempt);
                warn!(
                    %url,
                    %status,
                    attempt = attempt + 1,
                    max_retries = self.config.max_retries,
                    "Download failed, retrying in {}s",
                    backoff_secs
                );
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                continue;
            }

            bail!("Download of {url} failed with status {status}");
        }

        bail!(
            "Download of {url} failed after {} attempts",
            self.config.max_retries
        )
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status.as_u16(),
        403 | 429 | 500 | 502 | 503 | 504
    )
}

/// Extract data-file hrefs from the BLS listing page.
///
/// Falls back to the well-known current file when the HTML listing yields
/// nothing, so a changed listing format degrades to syncing the one file the
/// analytics task actually needs.
pub fn extract_data_files(html: &str) -> Vec<String> {
    // The listing format is stable enough that a full HTML parser is overkill
    let pattern =
        Regex::new(r#"href="([^"]+pr\.data\.0\.Current[^"]*)""#).expect("static pattern is valid");

    let files: BTreeSet<String> = pattern
        .captures_iter(html)
        .map(|cap| cap[1].to_string())
        .collect();

    if files.is_empty() {
        vec!["pr.data.0.Current".to_string()]
    } else {
        files.into_iter().collect()
    }
}

/// Final path segment of an href, used as the artifact file name
fn file_name(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or(href)
}

/// Resolve an href against the base URL with standard relative-reference
/// semantics: a base without a trailing slash has its last path segment
/// replaced, not appended to.
fn join_url(base: &str, href: &str) -> Result<String> {
    let resolved = Url::parse(base)
        .and_then(|b| b.join(href))
        .with_context(|| format!("Cannot resolve href '{href}' against base '{base}'"))?;
    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = r#"
        <html><body>
        <a href="/pub/time.series/pr/pr.data.0.Current">pr.data.0.Current</a>
        <a href="/pub/time.series/pr/pr.data.0.Current">pr.data.0.Current</a>
        <a href="/pub/time.series/pr/pr.series">pr.series</a>
        </body></html>
    "#;

    fn test_config(base: &str) -> IngestConfig {
        IngestConfig {
            bls_base: base.to_string(),
            bls_index: base.to_string(),
            max_retries: 3,
            ..IngestConfig::default()
        }
    }

    #[test]
    fn test_extract_data_files_dedupes() {
        let files = extract_data_files(LISTING);
        assert_eq!(files, vec!["/pub/time.series/pr/pr.data.0.Current".to_string()]);
    }

    #[test]
    fn test_extract_data_files_fallback() {
        let files = extract_data_files("<html>no matching links</html>");
        assert_eq!(files, vec!["pr.data.0.Current".to_string()]);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://download.bls.gov/pub/time.series/pr/", "/pub/time.series/pr/pr.data.0.Current").unwrap(),
            "https://download.bls.gov/pub/time.series/pr/pr.data.0.Current"
        );
        assert_eq!(
            join_url("https://download.bls.gov/pub/time.series/pr/", "pr.data.0.Current").unwrap(),
            "https://download.bls.gov/pub/time.series/pr/pr.data.0.Current"
        );
        assert_eq!(
            join_url("https://a.example/base/", "https://b.example/file").unwrap(),
            "https://b.example/file"
        );
    }

    #[test]
    fn test_join_url_replaces_last_segment_without_trailing_slash() {
        // A base ending in a bare segment resolves like any relative
        // reference: the segment is replaced, not appended to
        assert_eq!(
            join_url("https://download.bls.gov/pub/time.series/pr", "pr.data.0.Current").unwrap(),
            "https://download.bls.gov/pub/time.series/pr.data.0.Current"
        );
    }

    #[test]
    fn test_join_url_rejects_invalid_base() {
        assert!(join_url("not a url", "pr.data.0.Current").is_err());
    }

    #[tokio::test]
    async fn test_sync_uploads_and_then_skips_unchanged() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="/pr.data.0.Current">x</a>"#,
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/pr.data.0.Current"))
            .respond_with(ResponseTemplate::new(200).set_body_string("series_id\tyear"))
            .mount(&server)
            .await;

        let sync = BlsSync::new(Client::new(), test_config(&format!("{}/", server.uri())));
        let store = MemoryStore::new();

        let first = sync.sync(&store).await.unwrap();
        assert_eq!(first, BlsSyncStats { uploaded: 1, skipped: 0 });

        let stored = store
            .get("rearc-data-quest/bls/pr.data.0.Current")
            .await
            .unwrap();
        assert_eq!(stored, b"series_id\tyear");

        // Second run sees the same digest and skips the upload
        let second = sync.sync(&store).await.unwrap();
        assert_eq!(second, BlsSyncStats { uploaded: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn test_download_retries_on_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let sync = BlsSync::new(Client::new(), test_config(&server.uri()));
        let body = sync
            .download_with_retry(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_download_gives_up_on_client_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let sync = BlsSync::new(Client::new(), test_config(&server.uri()));
        let err = sync
            .download_with_retry(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
