// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::{BoundingBox, FeatureCollection, Polygon};
use crate::map::{MapSurface, ShapeId, ShapeStyle};
use crate::WmuError;
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Canonical form of a region code: trimmed, uppercase.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Ordered list of property names that may carry a region code.
/// Deployments disagree on the field name, so the list is configurable.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeProbe {
    fields: Vec<String>,
}

impl CodeProbe {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// First present non-empty value, trimmed. Numbers are accepted as-is.
    pub fn probe(&self, properties: &Map<String, Value>) -> Option<String> {
        self.fields.iter().find_map(|field| {
            let value = match properties.get(field)? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            if value.is_empty() {
                None
            } else {
                Some(value)
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegionShape {
    pub id: ShapeId,
    /// Code as it appeared in the dataset (trimmed).
    pub raw_code: String,
    pub code: String,
    pub labels: Vec<String>,
    pub polygons: Vec<Polygon>,
    pub bounds: Option<BoundingBox>,
}

impl RegionShape {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.bounds.is_some_and(|b| b.contains(lat, lon))
            && self.polygons.iter().any(|p| p.contains(lat, lon))
    }
}

/// Owns the code → shapes mapping for a loaded boundary dataset.
#[derive(Debug, Default)]
pub struct RegionIndex {
    shapes: Vec<RegionShape>,
    by_code: HashMap<String, Vec<ShapeId>>,
    skipped: usize,
}

impl RegionIndex {
    /// Parses a GeoJSON feature collection and builds the index from it.
    pub fn parse(
        path: &str,
        bytes: &[u8],
        probe: &CodeProbe,
        label_fields: &[String],
        map: &mut dyn MapSurface,
    ) -> Result<Self, WmuError> {
        let collection: FeatureCollection =
            serde_json::from_slice(bytes).map_err(|e| WmuError::Parse {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::build(collection, probe, label_fields, map))
    }

    /// Indexes every feature with a resolvable code, styles it with the
    /// default outline and binds its click to that code.
    pub fn build(
        collection: FeatureCollection,
        probe: &CodeProbe,
        label_fields: &[String],
        map: &mut dyn MapSurface,
    ) -> Self {
        let mut index = RegionIndex::default();

        for feature in collection.features {
            let Some(raw_code) = probe.probe(&feature.properties) else {
                index.skipped += 1;
                continue;
            };
            let code = normalize_code(&raw_code);
            let id = ShapeId(index.shapes.len());

            let labels = label_fields
                .iter()
                .filter_map(|field| match feature.properties.get(field)? {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            let polygons = feature
                .geometry
                .as_ref()
                .map(|g| g.polygons())
                .unwrap_or_default();
            let bounds = BoundingBox::from_rings(polygons.iter().flat_map(|p| p.rings.iter()));

            map.set_style(id, ShapeStyle::default_outline());
            map.bind_click(id, &code);

            index.by_code.entry(code.clone()).or_default().push(id);
            index.shapes.push(RegionShape {
                id,
                raw_code,
                code,
                labels,
                polygons,
                bounds,
            });
        }

        if index.skipped > 0 {
            debug!(
                "Skipped boundary features without a code — skipped={}",
                index.skipped
            );
        }
        info!(
            "Region index built — shapes={} codes={}",
            index.shapes.len(),
            index.by_code.len()
        );
        index
    }

    /// Shapes registered under `code`, after normalization.
    pub fn lookup(&self, code: &str) -> Option<&[ShapeId]> {
        self.by_code.get(&normalize_code(code)).map(Vec::as_slice)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&RegionShape> {
        self.shapes.get(id.0)
    }

    pub fn code_of(&self, id: ShapeId) -> Option<&str> {
        self.shape(id).map(|s| s.code.as_str())
    }

    /// Union of the bounds of `ids`; shapes without geometry are ignored.
    pub fn bounds_of(&self, ids: &[ShapeId]) -> Option<BoundingBox> {
        ids.iter()
            .filter_map(|id| self.shape(*id)?.bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn total_bounds(&self) -> Option<BoundingBox> {
        self.shapes
            .iter()
            .filter_map(|s| s.bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Code of the first region whose polygons contain the point.
    pub fn region_at(&self, lat: f64, lon: f64) -> Option<&str> {
        self.shapes
            .iter()
            .find(|s| s.contains(lat, lon))
            .map(|s| s.code.as_str())
    }

    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.by_code.keys().map(String::as_str).collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
