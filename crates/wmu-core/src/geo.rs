// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `[lon, lat]` as stored in GeoJSON.
pub type Position = (f64, f64);
pub type Ring = Vec<Position>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    pub fn from_rings<'a>(rings: impl IntoIterator<Item = &'a Ring>) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        for &(lon, lat) in rings.into_iter().flatten() {
            let point = BoundingBox::new(lat, lat, lon, lon);
            bounds = Some(match bounds {
                Some(b) => b.union(&point),
                None => point,
            });
        }
        bounds
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub coordinates: Value,
}

/// One polygon: outer ring first, holes after.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let Some((outer, holes)) = self.rings.split_first() else {
            return false;
        };
        ring_contains(outer, lat, lon) && !holes.iter().any(|h| ring_contains(h, lat, lon))
    }
}

impl Geometry {
    /// Polygons carried by this geometry. Points and lines have none.
    pub fn polygons(&self) -> Vec<Polygon> {
        match self.ty.as_str() {
            "Polygon" => parse_polygon(&self.coordinates).into_iter().collect(),
            "MultiPolygon" => self
                .coordinates
                .as_array()
                .map(|polys| polys.iter().filter_map(parse_polygon).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

fn parse_polygon(value: &Value) -> Option<Polygon> {
    let rings = value
        .as_array()?
        .iter()
        .filter_map(parse_ring)
        .collect::<Vec<_>>();
    if rings.is_empty() {
        None
    } else {
        Some(Polygon { rings })
    }
}

fn parse_ring(value: &Value) -> Option<Ring> {
    let ring: Ring = value
        .as_array()?
        .iter()
        .filter_map(|pos| {
            let pos = pos.as_array()?;
            Some((pos.first()?.as_f64()?, pos.get(1)?.as_f64()?))
        })
        .collect();
    if ring.len() < 3 {
        None
    } else {
        Some(ring)
    }
}

// Even-odd ray cast along the longitude axis.
fn ring_contains(ring: &Ring, lat: f64, lon: f64) -> bool {
    if ring.is_empty() {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
