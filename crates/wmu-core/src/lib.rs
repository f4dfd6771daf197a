// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod app;
pub mod asset_cache;
pub mod config;
pub mod fetch;
pub mod geo;
pub mod map;
pub mod presenter;
pub mod region;
pub mod seasons;
pub mod selector;

use std::path::PathBuf;
use thiserror::Error;

pub use app::WmuApp;
pub use config::AppConfig;

/// Errors surfaced by the core library.
///
/// `Clone`: one load failure is handed to every waiter on that load.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WmuError {
    #[error("Failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),
    #[error("Season data for {0} has not been loaded")]
    NotLoaded(String),
    #[error("Asset cache install failed on {path}: {reason}")]
    InstallFailed { path: String, reason: String },
    #[error("Geolocation unavailable: {0}")]
    Geolocation(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for WmuError {
    fn from(e: std::io::Error) -> Self {
        WmuError::Io(e.to_string())
    }
}

impl From<fetch::FetchError> for WmuError {
    fn from(e: fetch::FetchError) -> Self {
        WmuError::Fetch {
            path: e.path().to_string(),
            reason: e.to_string(),
        }
    }
}

/// Root directory for config and the persistent asset cache.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "wmu-finder", "WMU-Finder")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".wmu-finder"))
}
