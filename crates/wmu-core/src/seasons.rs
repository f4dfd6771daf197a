// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::fetch::Fetch;
use crate::WmuError;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Season text for one region and species: category label → lines,
/// in the order the dataset lists them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct SeasonRecord {
    categories: Vec<(String, Vec<String>)>,
}

impl From<Map<String, Value>> for SeasonRecord {
    fn from(map: Map<String, Value>) -> Self {
        let categories = map
            .into_iter()
            .filter_map(|(category, value)| {
                let Value::Array(items) = value else {
                    return None;
                };
                let lines = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect();
                Some((category, lines))
            })
            .collect();
        Self { categories }
    }
}

impl SeasonRecord {
    pub fn from_pairs<C, L>(pairs: impl IntoIterator<Item = (C, Vec<L>)>) -> Self
    where
        C: Into<String>,
        L: Into<String>,
    {
        Self {
            categories: pairs
                .into_iter()
                .map(|(c, lines)| (c.into(), lines.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    pub fn categories(&self) -> &[(String, Vec<String>)] {
        &self.categories
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct SpeciesDataset {
    records: HashMap<String, SeasonRecord>,
}

impl SpeciesDataset {
    pub fn parse(path: &str, bytes: &[u8]) -> Result<Self, WmuError> {
        serde_json::from_slice(bytes).map_err(|e| WmuError::Parse {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Tries `code` as given, then lower-cased. Region codes are uppercase
    /// while dataset keys are whatever the author typed.
    pub fn get(&self, code: &str) -> Option<&SeasonRecord> {
        self.records
            .get(code)
            .or_else(|| self.records.get(&code.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

type LoadResult = Result<Rc<SpeciesDataset>, WmuError>;
type SharedLoad = Shared<LocalBoxFuture<'static, LoadResult>>;

enum Slot {
    Loaded(Rc<SpeciesDataset>),
    Loading(SharedLoad),
}

/// Lazily loads one dataset per species and keeps it for the process lifetime.
pub struct SeasonStore {
    files: BTreeMap<String, String>,
    fetcher: Rc<dyn Fetch>,
    slots: Rc<RefCell<HashMap<String, Slot>>>,
}

impl SeasonStore {
    pub fn new(files: BTreeMap<String, String>, fetcher: Rc<dyn Fetch>) -> Self {
        Self {
            files,
            fetcher,
            slots: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn is_loaded(&self, species: &str) -> bool {
        matches!(self.slots.borrow().get(species), Some(Slot::Loaded(_)))
    }

    /// Completes immediately when cached. Concurrent callers for the same
    /// species await one shared fetch. Failures are not cached.
    pub async fn ensure_loaded(&self, species: &str) -> LoadResult {
        let load = {
            let mut slots = self.slots.borrow_mut();
            match slots.get(species) {
                Some(Slot::Loaded(dataset)) => return Ok(Rc::clone(dataset)),
                Some(Slot::Loading(load)) => {
                    debug!("Joining in-flight season load — species={}", species);
                    load.clone()
                }
                None => {
                    let file = self
                        .files
                        .get(species)
                        .ok_or_else(|| WmuError::UnknownSpecies(species.to_string()))?
                        .clone();
                    let load = load_dataset(
                        species.to_string(),
                        file,
                        Rc::clone(&self.fetcher),
                        Rc::clone(&self.slots),
                    )
                    .boxed_local()
                    .shared();
                    slots.insert(species.to_string(), Slot::Loading(load.clone()));
                    load
                }
            }
        };
        load.await
    }

    pub fn lookup(&self, species: &str, code: &str) -> Result<Option<SeasonRecord>, WmuError> {
        match self.slots.borrow().get(species) {
            Some(Slot::Loaded(dataset)) => Ok(dataset.get(code).cloned()),
            _ => Err(WmuError::NotLoaded(species.to_string())),
        }
    }
}

async fn load_dataset(
    species: String,
    file: String,
    fetcher: Rc<dyn Fetch>,
    slots: Rc<RefCell<HashMap<String, Slot>>>,
) -> LoadResult {
    info!("Loading season data — species={} file={}", species, file);
    let result = match fetcher.fetch(&file).await {
        Ok(asset) => SpeciesDataset::parse(&file, &asset.body).map(Rc::new),
        Err(e) => Err(e.into()),
    };

    let mut slots = slots.borrow_mut();
    match &result {
        Ok(dataset) => {
            debug!(
                "Season data cached — species={} regions={}",
                species,
                dataset.len()
            );
            slots.insert(species, Slot::Loaded(Rc::clone(dataset)));
        }
        Err(e) => {
            warn!("Season data load failed — species={} error={}", species, e);
            slots.remove(&species);
        }
    }
    result
}
