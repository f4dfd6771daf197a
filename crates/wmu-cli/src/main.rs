// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::rc::Rc;
use wmu_core::app::{LocateOutcome, SeasonsOutcome};
use wmu_core::asset_cache::{
    purge_stale_versions, AssetCache, CacheState, CacheStore, FileCacheStore,
};
use wmu_core::fetch::{Fetch, FsFetcher, HttpFetcher};
use wmu_core::map::{HeadlessMap, ViewState};
use wmu_core::{AppConfig, WmuApp};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.json
    #[arg(short, long, env = "WMU_CONFIG")]
    config: Option<PathBuf>,

    /// Directory serving wmu.json and the season files
    #[arg(long, env = "WMU_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Base URL of a deployed site; takes precedence over --static-dir
    #[arg(long, env = "WMU_BASE_URL")]
    base_url: Option<String>,

    /// More log output (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Highlight a WMU by code and show where the view would fit
    Locate { code: String },
    /// Show hunting seasons for a WMU
    Seasons {
        code: String,
        #[arg(short, long, default_value = "deer")]
        species: String,
    },
    /// Find the WMU containing a coordinate
    RegionAt {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
    /// List configured species
    Species,
    /// Manage the offline asset cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Pre-fetch every manifest entry into the cache
    Install,
    /// Show cache state and stored versions
    Status,
    /// Fetch one path through the cache
    Fetch { path: String },
    /// Delete cached versions other than the current one
    Purge,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write the default configuration
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .build();
    // A second init only fails if a logger is already set.
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn network_for(config: &AppConfig) -> Result<Rc<dyn Fetch>> {
    match &config.base_url {
        Some(url) => Ok(Rc::new(
            HttpFetcher::new(url).context("Failed to build HTTP client")?,
        )),
        None => Ok(Rc::new(FsFetcher::new(&config.static_dir))),
    }
}

fn print_locate(outcome: &LocateOutcome, map: &HeadlessMap) {
    let LocateOutcome::Found(code) = outcome else {
        return;
    };
    println!("WMU {} highlighted ({} shape(s))", code, map.highlighted().len());
    if let Some(ViewState::Fitted { bounds, padding }) = map.view() {
        println!(
            "View: lat {:.4}..{:.4}, lon {:.4}..{:.4} (padding {}x{})",
            bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon, padding.0, padding.1
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path)?;
    if let Some(dir) = cli.static_dir {
        config.static_dir = dir;
    }
    if let Some(url) = cli.base_url {
        config.base_url = Some(url);
    }

    let network = network_for(&config)?;
    let cache = Rc::new(AssetCache::new(
        config.cache_version.clone(),
        &config.asset_manifest,
        FileCacheStore::new(config.cache_dir()),
        network,
    ));

    match cli.command {
        Commands::Locate { code } => {
            let app = WmuApp::new(config, cache, HeadlessMap::new());
            app.load_boundaries().await?;
            app.set_input(&code);
            let outcome = app.locate();
            print_locate(&outcome, &app.map());
            if app.presenter().is_open() {
                print!("{}", app.presenter().render_text());
            }
        }
        Commands::Seasons { code, species } => {
            let app = WmuApp::new(config, cache, HeadlessMap::new());
            if let Err(e) = app.load_boundaries().await {
                log::warn!("Continuing without map data: {}", e);
            }
            app.set_input(&code);
            let outcome = app.show_seasons(&species).await;
            print!("{}", app.presenter().render_text());
            if outcome == SeasonsOutcome::LoadFailed {
                anyhow::bail!("Season data for {} is unavailable", species);
            }
        }
        Commands::RegionAt { lat, lon } => {
            let app = WmuApp::new(config, cache, HeadlessMap::new());
            app.load_boundaries().await?;
            let index = app.index();
            match index.as_ref().and_then(|i| i.region_at(lat, lon)) {
                Some(code) => println!("{}", code),
                None => println!("No WMU contains ({}, {})", lat, lon),
            }
        }
        Commands::Species => {
            for (key, file) in &config.species {
                println!("{:<12} {}", key, file);
            }
        }
        Commands::Cache { action } => match action {
            CacheCommand::Install => {
                cache.install().await?;
                println!(
                    "Cached {} assets as {}",
                    cache.manifest().len(),
                    cache.version()
                );
            }
            CacheCommand::Status => {
                println!("Version: {}", cache.version());
                println!("State:   {:?}", cache.state());
                let versions = cache.with_store(|store| store.versions())?;
                println!("Stored:  {}", versions.join(", "));
                if cache.state() == CacheState::Active {
                    for path in cache.manifest() {
                        println!("  {}", path);
                    }
                }
            }
            CacheCommand::Fetch { path } => {
                let served_from_cache = cache.is_cached(&path);
                let asset = cache.fetch(&path).await?;
                println!(
                    "{} ({} bytes, {})",
                    asset.path,
                    asset.body.len(),
                    if served_from_cache { "cache" } else { "network" }
                );
            }
            CacheCommand::Purge => {
                let keep = cache.version().to_string();
                let removed = cache.with_store(|store| purge_stale_versions(store, &keep))?;
                if removed.is_empty() {
                    println!("Nothing to purge");
                } else {
                    println!("Removed: {}", removed.join(", "));
                }
            }
        },
        Commands::Config { action } => match action {
            ConfigCommand::Init { force } => {
                if config_path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists; pass --force to overwrite",
                        config_path.display()
                    );
                }
                AppConfig::default().save(&config_path)?;
                println!("Wrote {}", config_path.display());
            }
            ConfigCommand::Show => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}
