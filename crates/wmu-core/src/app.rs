// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::AppConfig;
use crate::fetch::Fetch;
use crate::map::MapSurface;
use crate::presenter::ResultsPresenter;
use crate::region::{normalize_code, RegionIndex};
use crate::seasons::SeasonStore;
use crate::selector::{RegionSelector, SelectOutcome};
use crate::WmuError;
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::LocalBoxFuture;
use log::{debug, error, info, warn};
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

pub const MSG_MISSING_INPUT: &str = "Please enter a WMU number.";
pub const MSG_LOAD_FAILED: &str = "Error loading season data. Please try again.";
pub const MSG_MAP_LOADING: &str = "The WMU map is still loading. Please try again shortly.";
pub const MSG_MAP_FAILED: &str = "Could not load the WMU map data.";
pub const MSG_NO_LOCATION: &str = "Unable to determine your location.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
}

/// Device location capability.
pub trait Geolocator {
    fn current_position(&self) -> LocalBoxFuture<'_, Result<GeoPosition, WmuError>>;
}

/// Transient, auto-dismissing notice.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    MissingInput,
    Found(String),
    NotFound(String),
    NotReady,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeasonsOutcome {
    Shown,
    MissingInput,
    NoData,
    LoadFailed,
    /// A newer request started while this one was loading.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocateMeOutcome {
    Selected(String),
    Centered,
    Failed,
    Superseded,
}

/// Application context: owns every piece of process-wide state and wires
/// the "locate" and "show seasons" actions through it.
///
/// Everything runs on one thread. Borrows are never held across an await,
/// and requests that span one are tagged with a generation number so a
/// late response cannot overwrite a newer one.
pub struct WmuApp<M: MapSurface> {
    config: AppConfig,
    fetcher: Rc<dyn Fetch>,
    map: RefCell<M>,
    index: RefCell<Option<RegionIndex>>,
    selector: RefCell<RegionSelector>,
    seasons: SeasonStore,
    presenter: RefCell<ResultsPresenter>,
    input: RefCell<String>,
    notice: RefCell<Option<Notice>>,
    locate_generation: Cell<u64>,
    seasons_generation: Cell<u64>,
}

impl<M: MapSurface> WmuApp<M> {
    pub fn new(config: AppConfig, fetcher: Rc<dyn Fetch>, map: M) -> Self {
        let selector = RegionSelector::new(config.miss_policy, config.fit_padding);
        let seasons = SeasonStore::new(config.species.clone(), Rc::clone(&fetcher));
        Self {
            config,
            fetcher,
            map: RefCell::new(map),
            index: RefCell::new(None),
            selector: RefCell::new(selector),
            seasons,
            presenter: RefCell::new(ResultsPresenter::new()),
            input: RefCell::new(String::new()),
            notice: RefCell::new(None),
            locate_generation: Cell::new(0),
            seasons_generation: Cell::new(0),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn map(&self) -> Ref<'_, M> {
        self.map.borrow()
    }

    pub fn index(&self) -> Ref<'_, Option<RegionIndex>> {
        self.index.borrow()
    }

    pub fn presenter(&self) -> Ref<'_, ResultsPresenter> {
        self.presenter.borrow()
    }

    pub fn seasons(&self) -> &SeasonStore {
        &self.seasons
    }

    pub fn selected(&self) -> Option<String> {
        self.selector.borrow().current().map(str::to_string)
    }

    pub fn input(&self) -> String {
        self.input.borrow().clone()
    }

    pub fn set_input(&self, text: &str) {
        *self.input.borrow_mut() = text.to_string();
    }

    /// Fetches and indexes the boundary dataset, then fits the view to it.
    /// On failure the previous index (if any) stays in place.
    pub async fn load_boundaries(&self) -> Result<usize, WmuError> {
        let path = self.config.boundary_path.as_str();
        let asset = match self.fetcher.fetch(path).await {
            Ok(asset) => asset,
            Err(e) => {
                error!("Error loading WMU boundaries — path={} error={}", path, e);
                self.presenter.borrow_mut().show_message(MSG_MAP_FAILED);
                return Err(e.into());
            }
        };

        let mut map = self.map.borrow_mut();
        let index = match RegionIndex::parse(
            path,
            &asset.body,
            &self.config.code_probe(),
            &self.config.label_fields,
            &mut *map,
        ) {
            Ok(index) => index,
            Err(e) => {
                error!("Error parsing WMU boundaries — path={} error={}", path, e);
                self.presenter.borrow_mut().show_message(MSG_MAP_FAILED);
                return Err(e);
            }
        };

        match index.total_bounds() {
            Some(bounds) => map.fit_bounds(bounds, self.config.fit_padding),
            None => warn!("Could not fit bounds — boundary dataset has no polygons"),
        }
        let count = index.len();
        let mut selector = self.selector.borrow_mut();
        selector.clear(&mut *map);
        *selector = RegionSelector::new(self.config.miss_policy, self.config.fit_padding);
        *self.index.borrow_mut() = Some(index);
        info!("WMU boundaries loaded — shapes={}", count);
        Ok(count)
    }

    // Shared by typed input, shape clicks and geolocation.
    fn select_code(&self, raw: &str) -> Option<SelectOutcome> {
        let index = self.index.borrow();
        let index = index.as_ref()?;
        let outcome = self
            .selector
            .borrow_mut()
            .select(raw, index, &mut *self.map.borrow_mut());
        Some(outcome)
    }

    /// The "locate" action: select whatever is in the input field.
    pub fn locate(&self) -> LocateOutcome {
        self.locate_generation.set(self.locate_generation.get() + 1);
        // A pending season load must not overwrite this selection's panel.
        self.seasons_generation.set(self.seasons_generation.get() + 1);
        let raw = self.input();

        let outcome = match self.select_code(&raw) {
            None if raw.trim().is_empty() => LocateOutcome::MissingInput,
            None => LocateOutcome::NotReady,
            Some(SelectOutcome::MissingInput) => LocateOutcome::MissingInput,
            Some(SelectOutcome::Found { code, .. }) => LocateOutcome::Found(code),
            Some(SelectOutcome::NotFound { code }) => LocateOutcome::NotFound(code),
        };

        let mut presenter = self.presenter.borrow_mut();
        match &outcome {
            LocateOutcome::MissingInput => presenter.show_message(MSG_MISSING_INPUT),
            LocateOutcome::NotReady => presenter.show_message(MSG_MAP_LOADING),
            LocateOutcome::NotFound(code) => {
                presenter.show_message(format!("WMU {} was not found on the map.", code))
            }
            LocateOutcome::Found(_) => {}
        }
        outcome
    }

    /// A click on a boundary shape, reported with the code it was bound to.
    /// Goes through the input field so clicks and typing stay consistent.
    pub fn region_clicked(&self, code: &str) -> LocateOutcome {
        debug!("Shape clicked — code={}", code);
        self.set_input(code);
        self.locate()
    }

    /// The "show seasons" action for the code in the input field.
    pub async fn show_seasons(&self, species: &str) -> SeasonsOutcome {
        let raw = self.input().trim().to_string();
        if raw.is_empty() {
            self.presenter.borrow_mut().show_message(MSG_MISSING_INPUT);
            return SeasonsOutcome::MissingInput;
        }

        let generation = self.seasons_generation.get() + 1;
        self.seasons_generation.set(generation);
        self.locate_generation.set(self.locate_generation.get() + 1);

        let code = match self.select_code(&raw) {
            Some(SelectOutcome::Found { code, .. }) => code,
            _ => normalize_code(&raw),
        };

        let loaded = self.seasons.ensure_loaded(species).await;
        if self.seasons_generation.get() != generation {
            debug!(
                "Discarding superseded season response — species={} code={}",
                species, code
            );
            return SeasonsOutcome::Superseded;
        }

        let mut presenter = self.presenter.borrow_mut();
        if let Err(e) = loaded {
            error!("Error loading species data — species={} error={}", species, e);
            match e {
                WmuError::UnknownSpecies(_) => {
                    presenter.show_message(format!("Unknown species: {}.", species))
                }
                _ => presenter.show_message(MSG_LOAD_FAILED),
            }
            return SeasonsOutcome::LoadFailed;
        }

        // Dataset keys are matched as typed first, then by canonical code.
        let record = match self.seasons.lookup(species, &raw) {
            Ok(None) => self.seasons.lookup(species, &code),
            other => other,
        };
        match record {
            Ok(Some(record)) => {
                presenter.show_record(&code, species, &record);
                SeasonsOutcome::Shown
            }
            Ok(None) => {
                presenter.show_message(format!(
                    "No season data found for WMU {} and {}.",
                    code, species
                ));
                SeasonsOutcome::NoData
            }
            Err(e) => {
                error!("Season lookup failed — species={} error={}", species, e);
                presenter.show_message(MSG_LOAD_FAILED);
                SeasonsOutcome::LoadFailed
            }
        }
    }

    pub fn close_results(&self) {
        self.presenter.borrow_mut().close();
    }

    /// Centers on the device position and selects the region under it.
    /// Waits at most `geolocation_timeout_secs`; failures post a notice only.
    pub async fn locate_me(&self, geolocator: &dyn Geolocator) -> LocateMeOutcome {
        let generation = self.locate_generation.get() + 1;
        self.locate_generation.set(generation);

        let wait = Duration::from_secs(self.config.geolocation_timeout_secs);
        let position = match tokio::time::timeout(wait, geolocator.current_position()).await {
            Ok(result) => result,
            Err(_) => Err(WmuError::Geolocation("timed out".to_string())),
        };

        if self.locate_generation.get() != generation {
            debug!("Discarding superseded geolocation result");
            return LocateMeOutcome::Superseded;
        }

        let position = match position {
            Ok(position) => position,
            Err(e) => {
                warn!("Geolocation failed — error={}", e);
                self.post_notice(MSG_NO_LOCATION);
                return LocateMeOutcome::Failed;
            }
        };

        let code = self
            .index
            .borrow()
            .as_ref()
            .and_then(|index| index.region_at(position.lat, position.lon))
            .map(str::to_string);

        match code {
            Some(code) => {
                self.seasons_generation.set(self.seasons_generation.get() + 1);
                self.set_input(&code);
                self.select_code(&code);
                LocateMeOutcome::Selected(code)
            }
            None => {
                self.map
                    .borrow_mut()
                    .center_on(position.lat, position.lon);
                LocateMeOutcome::Centered
            }
        }
    }

    fn post_notice(&self, text: &str) {
        let now = Utc::now();
        let expires_at = i64::try_from(self.config.notice_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        *self.notice.borrow_mut() = Some(Notice {
            text: text.to_string(),
            expires_at,
        });
    }

    /// The current notice, if it has not expired by `now`.
    pub fn notice(&self, now: DateTime<Utc>) -> Option<Notice> {
        let mut notice = self.notice.borrow_mut();
        if notice.as_ref().is_some_and(|n| n.expires_at <= now) {
            *notice = None;
        }
        notice.clone()
    }
}
