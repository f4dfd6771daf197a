// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Cache-first interception of static asset requests.
//!
//! A fixed manifest is pre-fetched into a versioned store during `install`.
//! Installation is all-or-nothing: every entry must fetch before anything is
//! written. Once active, manifest hits are served from the store and all other
//! requests go to the network. Responses are never written back.

use crate::fetch::{normalize_request_path, Asset, Fetch, FetchError};
use crate::WmuError;
use futures::future::{try_join_all, FutureExt, LocalBoxFuture};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Uninstalled,
    Installing,
    Active,
}

/// Persistent key-value store scoped by a version key.
pub trait CacheStore {
    fn lookup(&self, version: &str, path: &str) -> Result<Option<Asset>, WmuError>;
    /// Replaces the contents of `version` with `assets` as one unit.
    fn put_all(&mut self, version: &str, assets: Vec<Asset>) -> Result<(), WmuError>;
    fn versions(&self) -> Result<Vec<String>, WmuError>;
    fn delete_version(&mut self, version: &str) -> Result<bool, WmuError>;
}

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    versions: HashMap<String, HashMap<String, Asset>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn lookup(&self, version: &str, path: &str) -> Result<Option<Asset>, WmuError> {
        Ok(self
            .versions
            .get(version)
            .and_then(|entries| entries.get(&normalize_request_path(path)))
            .cloned())
    }

    fn put_all(&mut self, version: &str, assets: Vec<Asset>) -> Result<(), WmuError> {
        let entries = assets
            .into_iter()
            .map(|a| (normalize_request_path(&a.path), a))
            .collect();
        self.versions.insert(version.to_string(), entries);
        Ok(())
    }

    fn versions(&self) -> Result<Vec<String>, WmuError> {
        let mut versions: Vec<String> = self.versions.keys().cloned().collect();
        versions.sort();
        Ok(versions)
    }

    fn delete_version(&mut self, version: &str) -> Result<bool, WmuError> {
        Ok(self.versions.remove(version).is_some())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    blob: String,
    fetched_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VersionIndex {
    entries: HashMap<String, IndexEntry>,
}

/// On-disk store: `<root>/<version>/index.json` plus one blob per asset.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    root: PathBuf,
}

fn blob_name(path: &str) -> String {
    let mut s = DefaultHasher::new();
    path.hash(&mut s);
    format!("{:x}.bin", s.finish())
}

impl FileCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    fn read_index(&self, version: &str) -> Result<Option<VersionIndex>, WmuError> {
        let path = self.version_dir(version).join("index.json");
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| WmuError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

impl CacheStore for FileCacheStore {
    fn lookup(&self, version: &str, path: &str) -> Result<Option<Asset>, WmuError> {
        let key = normalize_request_path(path);
        let Some(index) = self.read_index(version)? else {
            return Ok(None);
        };
        let Some(entry) = index.entries.get(&key) else {
            return Ok(None);
        };
        let body = fs::read(self.version_dir(version).join(&entry.blob))?;
        Ok(Some(Asset {
            path: key,
            body,
            fetched_at: entry.fetched_at,
        }))
    }

    fn put_all(&mut self, version: &str, assets: Vec<Asset>) -> Result<(), WmuError> {
        // Stage next to the final directory, then swap it in with a rename.
        let staging = self.root.join(format!(".{}.partial", version));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let mut index = VersionIndex::default();
        for asset in assets {
            let key = normalize_request_path(&asset.path);
            let blob = blob_name(&key);
            fs::write(staging.join(&blob), &asset.body)?;
            index.entries.insert(
                key,
                IndexEntry {
                    blob,
                    fetched_at: asset.fetched_at,
                },
            );
        }
        let content = serde_json::to_string_pretty(&index).map_err(|e| WmuError::Parse {
            path: "index.json".to_string(),
            reason: e.to_string(),
        })?;
        fs::write(staging.join("index.json"), content)?;

        let target = self.version_dir(version);
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        fs::rename(&staging, &target)?;
        debug!(
            "Asset cache written — dir={} entries={}",
            target.display(),
            index.entries.len()
        );
        Ok(())
    }

    fn versions(&self) -> Result<Vec<String>, WmuError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().join("index.json").exists() && !name.starts_with('.') {
                versions.push(name);
            }
        }
        versions.sort();
        Ok(versions)
    }

    fn delete_version(&mut self, version: &str) -> Result<bool, WmuError> {
        let dir = self.version_dir(version);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(dir)?;
        Ok(true)
    }
}

pub struct AssetCache<S: CacheStore> {
    version: String,
    manifest: Vec<String>,
    store: RefCell<S>,
    network: Rc<dyn Fetch>,
    state: Cell<CacheState>,
}

impl<S: CacheStore> AssetCache<S> {
    /// Starts `Active` when `store` already holds the whole manifest for `version`.
    pub fn new(
        version: impl Into<String>,
        manifest: &[String],
        store: S,
        network: Rc<dyn Fetch>,
    ) -> Self {
        let version = version.into();
        let manifest: Vec<String> = manifest.iter().map(|p| normalize_request_path(p)).collect();

        let complete = manifest.iter().all(|path| match store.lookup(&version, path) {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!("Asset cache unreadable — version={} error={}", version, e);
                false
            }
        });
        let state = if complete && !manifest.is_empty() {
            CacheState::Active
        } else {
            CacheState::Uninstalled
        };
        debug!("Asset cache opened — version={} state={:?}", version, state);

        Self {
            version,
            manifest,
            store: RefCell::new(store),
            network,
            state: Cell::new(state),
        }
    }

    pub fn state(&self) -> CacheState {
        self.state.get()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    /// Fetches every manifest entry, then writes them in one `put_all`.
    /// A single failure aborts the install with nothing written.
    pub async fn install(&self) -> Result<(), WmuError> {
        let previous = self.state.replace(CacheState::Installing);
        info!(
            "Installing asset cache — version={} entries={}",
            self.version,
            self.manifest.len()
        );

        let fetches = self.manifest.iter().map(|path| self.network.fetch(path));
        let assets = match try_join_all(fetches).await {
            Ok(assets) => assets,
            Err(e) => {
                error!("Asset cache install aborted — version={} error={}", self.version, e);
                self.state.set(previous);
                return Err(WmuError::InstallFailed {
                    path: e.path().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let written = self.store.borrow_mut().put_all(&self.version, assets);
        if let Err(e) = written {
            error!("Asset cache write failed — version={} error={}", self.version, e);
            self.state.set(previous);
            return Err(WmuError::InstallFailed {
                path: self.version.clone(),
                reason: e.to_string(),
            });
        }

        self.state.set(CacheState::Active);
        info!("Asset cache active — version={}", self.version);
        Ok(())
    }

    /// Whether a request for `path` would be answered from the store.
    pub fn is_cached(&self, path: &str) -> bool {
        self.state.get() == CacheState::Active
            && matches!(
                self.store.borrow().lookup(&self.version, path),
                Ok(Some(_))
            )
    }

    pub fn with_store<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.store.borrow_mut())
    }
}

impl<S: CacheStore> Fetch for AssetCache<S> {
    fn fetch<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Asset, FetchError>> {
        async move {
            if self.state.get() == CacheState::Active {
                let cached = self.store.borrow().lookup(&self.version, path);
                match cached {
                    Ok(Some(asset)) => {
                        debug!("Asset cache hit — path={}", path);
                        return Ok(asset);
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Asset cache lookup failed — path={} error={}", path, e),
                }
            }
            self.network.fetch(path).await
        }
        .boxed_local()
    }
}

/// Deletes every stored version other than `keep`. Never called implicitly.
pub fn purge_stale_versions<S: CacheStore>(
    store: &mut S,
    keep: &str,
) -> Result<Vec<String>, WmuError> {
    let mut removed = Vec::new();
    for version in store.versions()? {
        if version != keep && store.delete_version(&version)? {
            info!("Removed stale asset cache — version={}", version);
            removed.push(version);
        }
    }
    Ok(removed)
}
