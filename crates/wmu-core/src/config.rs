// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::region::CodeProbe;
use crate::selector::MissPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// GeoJSON boundary dataset, relative to the static root.
    pub boundary_path: String,
    /// Property names probed, in order, for a region code.
    pub code_fields: Vec<String>,
    /// Property names collected as tooltip labels.
    pub label_fields: Vec<String>,
    pub miss_policy: MissPolicy,
    pub fit_padding: (u32, u32),
    /// Species key → season dataset file.
    pub species: BTreeMap<String, String>,
    pub asset_manifest: Vec<String>,
    pub cache_version: String,
    /// Local directory serving the static files when no `base_url` is set.
    pub static_dir: PathBuf,
    pub base_url: Option<String>,
    pub geolocation_timeout_secs: u64,
    pub notice_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let species = [
            ("deer", "deer_seasons.json"),
            ("moose", "moose_seasons.json"),
            ("bear", "bear_seasons.json"),
            ("wolf_coyote", "wolf_coyote_seasons.json"),
            ("small_game", "small_game_seasons.json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            boundary_path: "wmu.json".to_string(),
            code_fields: ["WMU", "WMU_ID", "WMU_CODE", "WMUNUM", "WMU_NUM", "wmu", "wmu_id"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            label_fields: vec!["NAME".to_string(), "WMU_NAME".to_string()],
            miss_policy: MissPolicy::Clear,
            fit_padding: (20, 20),
            species,
            asset_manifest: [
                "/",
                "/index.html",
                "/styles.css",
                "/app.js",
                "/manifest.json",
                "/icon-192.png",
                "/icon-512.png",
                "/deer_seasons.json",
                "/moose_seasons.json",
                "/bear_seasons.json",
                "/wolf_coyote_seasons.json",
                "/small_game_seasons.json",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            cache_version: "hunting-pwa-v1".to_string(),
            static_dir: PathBuf::from("."),
            base_url: None,
            geolocation_timeout_secs: 5,
            notice_secs: 4,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("config.json")
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn code_probe(&self) -> CodeProbe {
        CodeProbe::new(self.code_fields.iter().cloned())
    }

    pub fn cache_dir(&self) -> PathBuf {
        crate::get_config_root().join("asset-cache")
    }
}
