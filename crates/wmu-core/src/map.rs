// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::BoundingBox;
use std::collections::HashMap;

/// Handle to one boundary shape on the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub color: String,
    pub weight: f32,
    pub opacity: f32,
    pub fill_opacity: f32,
}

impl ShapeStyle {
    pub fn default_outline() -> Self {
        Self {
            color: "#666666".to_string(),
            weight: 1.0,
            opacity: 1.0,
            fill_opacity: 0.0,
        }
    }

    pub fn highlight() -> Self {
        Self {
            color: "#ff8800".to_string(),
            weight: 4.0,
            opacity: 1.0,
            fill_opacity: 0.0,
        }
    }

    pub fn is_highlight(&self) -> bool {
        *self == Self::highlight()
    }
}

/// Map/view capability: per-shape styling, click subscription and view fitting.
pub trait MapSurface {
    /// Subscribe to clicks on `shape`; the surface reports them back with `code`.
    fn bind_click(&mut self, shape: ShapeId, code: &str);
    fn set_style(&mut self, shape: ShapeId, style: ShapeStyle);
    fn fit_bounds(&mut self, bounds: BoundingBox, padding: (u32, u32));
    fn center_on(&mut self, lat: f64, lon: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Fitted {
        bounds: BoundingBox,
        padding: (u32, u32),
    },
    Centered {
        lat: f64,
        lon: f64,
    },
}

/// In-memory surface for the CLI and tests.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    styles: HashMap<ShapeId, ShapeStyle>,
    bindings: HashMap<ShapeId, String>,
    view: Option<ViewState>,
    fit_count: usize,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style_of(&self, shape: ShapeId) -> Option<&ShapeStyle> {
        self.styles.get(&shape)
    }

    pub fn highlighted(&self) -> Vec<ShapeId> {
        let mut ids: Vec<ShapeId> = self
            .styles
            .iter()
            .filter(|(_, style)| style.is_highlight())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn view(&self) -> Option<&ViewState> {
        self.view.as_ref()
    }

    pub fn fit_count(&self) -> usize {
        self.fit_count
    }

    /// Code bound to `shape`, as a click on it would report.
    pub fn click(&self, shape: ShapeId) -> Option<&str> {
        self.bindings.get(&shape).map(String::as_str)
    }
}

impl MapSurface for HeadlessMap {
    fn bind_click(&mut self, shape: ShapeId, code: &str) {
        self.bindings.insert(shape, code.to_string());
    }

    fn set_style(&mut self, shape: ShapeId, style: ShapeStyle) {
        self.styles.insert(shape, style);
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, padding: (u32, u32)) {
        self.fit_count += 1;
        self.view = Some(ViewState::Fitted { bounds, padding });
    }

    fn center_on(&mut self, lat: f64, lon: f64) {
        self.view = Some(ViewState::Centered { lat, lon });
    }
}
