// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

mod common;

use common::MockHost;
use std::rc::Rc;
use wmu_core::asset_cache::{AssetCache, CacheState, CacheStore, FileCacheStore, MemoryCacheStore};
use wmu_core::fetch::Fetch;
use wmu_core::WmuError;

fn manifest() -> Vec<String> {
    ["/", "/index.html", "/app.js", "/deer_seasons.json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn host() -> Rc<MockHost> {
    Rc::new(
        MockHost::new()
            .with_file("/", "<html>root</html>")
            .with_file("/index.html", "<html>index</html>")
            .with_file("/app.js", "console.log('v1')")
            .with_file("/deer_seasons.json", "{}")
            .with_file("/wmu.json", "{\"features\": []}"),
    )
}

#[tokio::test]
async fn test_manifest_hits_skip_the_network() {
    let host = host();
    let cache = AssetCache::new("v1", &manifest(), MemoryCacheStore::new(), host.clone());
    assert_eq!(cache.state(), CacheState::Uninstalled);

    cache.install().await.unwrap();
    assert_eq!(cache.state(), CacheState::Active);
    let after_install = host.total_calls();
    assert_eq!(after_install, 4);

    // Content changes upstream; the cached copy is still served.
    host.put("/app.js", "console.log('v2')");
    let asset = cache.fetch("app.js").await.unwrap();
    assert_eq!(asset.body, b"console.log('v1')");
    assert_eq!(host.total_calls(), after_install);
    assert!(cache.is_cached("/app.js"));
}

#[tokio::test]
async fn test_non_manifest_paths_always_hit_the_network() {
    let host = host();
    let cache = AssetCache::new("v1", &manifest(), MemoryCacheStore::new(), host.clone());
    cache.install().await.unwrap();

    cache.fetch("/wmu.json").await.unwrap();
    cache.fetch("/wmu.json").await.unwrap();

    assert_eq!(host.calls_for("/wmu.json"), 2, "No write-back");
    assert!(!cache.is_cached("/wmu.json"));
}

#[tokio::test]
async fn test_requests_before_install_go_to_network() {
    let host = host();
    let cache = AssetCache::new("v1", &manifest(), MemoryCacheStore::new(), host.clone());

    cache.fetch("/index.html").await.unwrap();
    assert_eq!(host.calls_for("/index.html"), 1);
    assert!(!cache.is_cached("/index.html"));
}

#[tokio::test]
async fn test_install_is_all_or_nothing() {
    let host = host();
    host.break_path("/deer_seasons.json");
    let cache = AssetCache::new("v1", &manifest(), MemoryCacheStore::new(), host.clone());

    let err = cache.install().await.unwrap_err();
    assert!(matches!(err, WmuError::InstallFailed { ref path, .. } if path == "/deer_seasons.json"));
    assert_eq!(cache.state(), CacheState::Uninstalled);
    for path in manifest() {
        assert!(!cache.is_cached(&path), "{} reported cached", path);
    }
    cache.with_store(|store| {
        assert!(store.versions().unwrap().is_empty());
    });

    // Retry once the asset is reachable.
    host.heal("/deer_seasons.json");
    cache.install().await.unwrap();
    assert_eq!(cache.state(), CacheState::Active);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let host = host();

    {
        let cache = AssetCache::new(
            "v1",
            &manifest(),
            FileCacheStore::new(dir.path()),
            host.clone(),
        );
        cache.install().await.unwrap();
    }
    let calls = host.total_calls();

    let reopened = AssetCache::new(
        "v1",
        &manifest(),
        FileCacheStore::new(dir.path()),
        host.clone(),
    );
    assert_eq!(reopened.state(), CacheState::Active);
    let root = reopened.fetch("/").await.unwrap();
    assert_eq!(root.body, b"<html>root</html>");
    assert_eq!(host.total_calls(), calls);

    // A new version key starts a fresh install cycle.
    let bumped = AssetCache::new(
        "v2",
        &manifest(),
        FileCacheStore::new(dir.path()),
        host.clone(),
    );
    assert_eq!(bumped.state(), CacheState::Uninstalled);
}
