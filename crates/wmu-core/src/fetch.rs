// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, warn};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A fetched static resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub path: String,
    pub body: Vec<u8>,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}

impl Asset {
    pub fn new(path: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            body,
            fetched_at: chrono::Utc::now(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("{path} not found")]
    NotFound { path: String },
    #[error("{path} returned HTTP {status}")]
    Status { path: String, status: u16 },
    #[error("{path}: {message}")]
    Transport { path: String, message: String },
}

impl FetchError {
    pub fn path(&self) -> &str {
        match self {
            FetchError::NotFound { path }
            | FetchError::Status { path, .. }
            | FetchError::Transport { path, .. } => path,
        }
    }
}

/// Network capability. Every boundary, dataset and asset request goes through it.
///
/// Futures are local: the application runs on a single cooperative thread.
pub trait Fetch {
    fn fetch<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Asset, FetchError>>;
}

/// Request paths are compared with a leading slash.
pub fn normalize_request_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

pub struct HttpFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Transport {
                path: base_url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, normalize_request_path(path))
    }
}

impl Fetch for HttpFetcher {
    fn fetch<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Asset, FetchError>> {
        async move {
            let url = self.url_for(path);
            debug!("HTTP fetch — url={}", url);
            let transport = |e: reqwest::Error| FetchError::Transport {
                path: path.to_string(),
                message: e.to_string(),
            };

            let response = self.client.get(&url).send().await.map_err(transport)?;
            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound {
                    path: path.to_string(),
                });
            }
            if !status.is_success() {
                warn!("HTTP fetch failed — url={} status={}", url, status);
                return Err(FetchError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                });
            }
            let bytes = response.bytes().await.map_err(transport)?;
            Ok(Asset::new(path, bytes.to_vec()))
        }
        .boxed_local()
    }
}

/// Serves static files from a local directory, the way a static host would.
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_for(&self, path: &str) -> PathBuf {
        let normalized = normalize_request_path(path);
        let relative = normalized.trim_start_matches('/');
        if relative.is_empty() {
            self.root.join("index.html")
        } else {
            self.root.join(relative)
        }
    }
}

impl Fetch for FsFetcher {
    fn fetch<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Asset, FetchError>> {
        async move {
            let file = self.file_for(path);
            match std::fs::read(&file) {
                Ok(body) => {
                    debug!(
                        "Read static file — path={} bytes={}",
                        file.display(),
                        body.len()
                    );
                    Ok(Asset::new(path, body))
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                    path: path.to_string(),
                }),
                Err(e) => Err(FetchError::Transport {
                    path: path.to_string(),
                    message: e.to_string(),
                }),
            }
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_normalize_request_path() {
        assert_eq!(normalize_request_path("index.html"), "/index.html");
        assert_eq!(normalize_request_path("/app.js"), "/app.js");
        assert_eq!(normalize_request_path(" / "), "/");
    }

    #[tokio::test]
    async fn test_fs_fetcher_serves_root_as_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("deer_seasons.json"), "{}").unwrap();

        let fetcher = FsFetcher::new(dir.path());
        let root = fetcher.fetch("/").await.unwrap();
        assert_eq!(root.body, b"<html></html>");

        let deer = fetcher.fetch("deer_seasons.json").await.unwrap();
        assert_eq!(deer.body, b"{}");
        assert_eq!(deer.path, "deer_seasons.json");
    }

    #[tokio::test]
    async fn test_fs_fetcher_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path());
        let err = fetcher.fetch("/nope.json").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::NotFound {
                path: "/nope.json".to_string()
            }
        );
    }
}
