//! Input source resolution for the properties payload
//!
//! The payload comes from exactly one place: standard input when the caller
//! passes the reserved `-` indicator, otherwise a path or URL handed to the
//! [`Fetcher`] capability. Resolution is all-or-nothing; the chosen source is
//! drained fully into memory.

use crate::error::{PackerError, Result};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use url::Url;

/// Reserved location value meaning "read the payload from standard input"
pub const STDIN_INDICATOR: &str = "-";

/// Where the properties payload comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropsSource {
    Stdin,
    Located(String),
}

impl PropsSource {
    pub fn from_arg(arg: &str) -> Self {
        if arg == STDIN_INDICATOR {
            PropsSource::Stdin
        } else {
            PropsSource::Located(arg.to_string())
        }
    }

    /// Resolve the payload bytes, consuming exactly one source
    pub async fn resolve(&self, fetcher: &dyn Fetcher) -> Result<Vec<u8>> {
        match self {
            PropsSource::Stdin => read_to_end(tokio::io::stdin()).await,
            PropsSource::Located(location) => fetcher.fetch(location).await,
        }
    }
}

async fn read_to_end<R: tokio::io::AsyncRead + Unpin>(mut reader: R) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    reader
        .read_to_end(&mut payload)
        .await
        .map_err(|e| PackerError::Input(format!("Failed to read standard input: {}", e)))?;
    Ok(payload)
}

/// Capability for fetching a location's content as one byte payload
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}

/// Production fetcher: local paths, `file` URLs and HTTP(S) URLs
pub struct UrlFetcher {
    client: reqwest::Client,
}

impl UrlFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PackerError::Input(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn fetch_url(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PackerError::Input(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(PackerError::Input(format!(
                "Failed to fetch {}: HTTP status {}",
                url,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PackerError::Input(format!("Failed to read body of {}: {}", url, e)))?;
        Ok(body.to_vec())
    }

    async fn fetch_path(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| PackerError::Input(format!("Failed to read {}: {}", path, e)))
    }
}

#[async_trait]
impl Fetcher for UrlFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                self.fetch_url(&url).await
            }
            Ok(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|_| {
                    PackerError::Input(format!("Invalid file URL: {}", location))
                })?;
                self.fetch_path(&path.to_string_lossy()).await
            }
            // Not a URL (or a bare scheme-less path like C:\...) - treat as a path
            _ => self.fetch_path(location).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_arg_sentinel() {
        assert_eq!(PropsSource::from_arg("-"), PropsSource::Stdin);
        assert_eq!(
            PropsSource::from_arg("props.properties"),
            PropsSource::Located("props.properties".to_string())
        );
    }

    #[tokio::test]
    async fn test_read_to_end_exact_bytes() {
        let payload = read_to_end(Cursor::new(b"image=busybox\n".to_vec()))
            .await
            .unwrap();
        assert_eq!(payload, b"image=busybox\n");
    }

    #[tokio::test]
    async fn test_read_to_end_empty_input() {
        let payload = read_to_end(Cursor::new(Vec::new())).await.unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.properties");
        std::fs::write(&path, b"app=busybox\n").unwrap();

        let fetcher = UrlFetcher::new(30).unwrap();
        let payload = fetcher.fetch(&path.to_string_lossy()).await.unwrap();
        assert_eq!(payload, b"app=busybox\n");
    }

    #[tokio::test]
    async fn test_fetch_missing_path_fails() {
        let fetcher = UrlFetcher::new(30).unwrap();
        let err = fetcher.fetch("/definitely/not/here.properties").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_resolve_located_uses_fetcher() {
        struct Fixed;

        #[async_trait]
        impl Fetcher for Fixed {
            async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
                assert_eq!(location, "anywhere");
                Ok(b"payload".to_vec())
            }
        }

        let source = PropsSource::Located("anywhere".to_string());
        assert_eq!(source.resolve(&Fixed).await.unwrap(), b"payload");
    }
}
