// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

#![allow(dead_code)]

use futures::future::{FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use wmu_core::fetch::{normalize_request_path, Asset, Fetch, FetchError};

/// Routes library logs to the test harness output.
pub fn init_logging() {
    let _ = simplelog::TestLogger::init(simplelog::LevelFilter::Debug, simplelog::Config::default());
}

/// In-memory static host that records every request and yields once
/// before answering, so concurrent callers overlap.
#[derive(Default)]
pub struct MockHost {
    files: RefCell<HashMap<String, Vec<u8>>>,
    failing: RefCell<HashSet<String>>,
    calls: RefCell<Vec<String>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, body: &str) -> Self {
        self.put(path, body);
        self
    }

    pub fn put(&self, path: &str, body: &str) {
        self.files
            .borrow_mut()
            .insert(normalize_request_path(path), body.as_bytes().to_vec());
    }

    /// Makes `path` fail with a transport error until `heal` is called.
    pub fn break_path(&self, path: &str) {
        self.failing.borrow_mut().insert(normalize_request_path(path));
    }

    pub fn heal(&self, path: &str) {
        self.failing.borrow_mut().remove(&normalize_request_path(path));
    }

    pub fn calls_for(&self, path: &str) -> usize {
        let key = normalize_request_path(path);
        self.calls
            .borrow()
            .iter()
            .filter(|p| normalize_request_path(p) == key)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Fetch for MockHost {
    fn fetch<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Asset, FetchError>> {
        async move {
            self.calls.borrow_mut().push(path.to_string());
            tokio::task::yield_now().await;

            let key = normalize_request_path(path);
            if self.failing.borrow().contains(&key) {
                return Err(FetchError::Transport {
                    path: path.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            match self.files.borrow().get(&key) {
                Some(body) => Ok(Asset::new(path, body.clone())),
                None => Err(FetchError::NotFound {
                    path: path.to_string(),
                }),
            }
        }
        .boxed_local()
    }
}

/// Three WMUs: 49 and 50 side by side, and 11A split over two polygons.
pub const BOUNDARIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {"WMU": "49", "NAME": "Lake Country"},
         "geometry": {"type": "Polygon", "coordinates": [[[-80,45],[-79,45],[-79,46],[-80,46],[-80,45]]]}},
        {"type": "Feature", "properties": {"WMU_ID": 50},
         "geometry": {"type": "Polygon", "coordinates": [[[-79,45],[-78,45],[-78,46],[-79,46],[-79,45]]]}},
        {"type": "Feature", "properties": {"wmu": "11a"},
         "geometry": {"type": "MultiPolygon", "coordinates": [
            [[[-90,48],[-89,48],[-89,49],[-90,49],[-90,48]]],
            [[[-88,48],[-87,48],[-87,49],[-88,49],[-88,48]]]
         ]}},
        {"type": "Feature", "properties": {"NAME": "Unnumbered"},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}
    ]
}"#;

pub const DEER: &str = r#"{
    "49": {"bow": ["Oct 1–31"], "firearms": ["Nov 5–18"]},
    "11a": {"general-seasons": ["Sep 15 - Dec 15"], "controlled-hunt": []}
}"#;

pub const MOOSE: &str = r#"{
    "49": {"bow": ["Sep 20 - Oct 5"]}
}"#;

pub fn standard_host() -> MockHost {
    MockHost::new()
        .with_file("wmu.json", BOUNDARIES)
        .with_file("deer_seasons.json", DEER)
        .with_file("moose_seasons.json", MOOSE)
}
