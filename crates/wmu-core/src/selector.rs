// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::map::{MapSurface, ShapeId, ShapeStyle};
use crate::region::{normalize_code, RegionIndex};
use log::debug;
use serde::{Deserialize, Serialize};

/// What happens to the current highlight when a lookup misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissPolicy {
    #[default]
    Clear,
    Retain,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    MissingInput,
    Found { code: String, shapes: Vec<ShapeId> },
    NotFound { code: String },
}

/// The single highlighted region, plus the shapes carrying its decoration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub current: Option<String>,
    pub decoration: Vec<ShapeId>,
}

#[derive(Debug)]
pub struct RegionSelector {
    state: SelectionState,
    miss_policy: MissPolicy,
    padding: (u32, u32),
}

impl RegionSelector {
    pub fn new(miss_policy: MissPolicy, padding: (u32, u32)) -> Self {
        Self {
            state: SelectionState::default(),
            miss_policy,
            padding,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn current(&self) -> Option<&str> {
        self.state.current.as_deref()
    }

    /// Resolves `raw` through the index and moves the highlight to it.
    /// All state changes happen before returning; nothing here suspends.
    pub fn select(
        &mut self,
        raw: &str,
        index: &RegionIndex,
        map: &mut dyn MapSurface,
    ) -> SelectOutcome {
        if raw.trim().is_empty() {
            return SelectOutcome::MissingInput;
        }
        let code = normalize_code(raw);

        let Some(shapes) = index.lookup(&code) else {
            debug!("Region lookup miss — code={} policy={:?}", code, self.miss_policy);
            if self.miss_policy == MissPolicy::Clear {
                self.clear(map);
            }
            return SelectOutcome::NotFound { code };
        };
        let shapes = shapes.to_vec();

        self.clear(map);
        for id in &shapes {
            map.set_style(*id, ShapeStyle::highlight());
        }
        if let Some(bounds) = index.bounds_of(&shapes) {
            map.fit_bounds(bounds, self.padding);
        }

        self.state = SelectionState {
            current: Some(code.clone()),
            decoration: shapes.clone(),
        };
        debug!("Region selected — code={} shapes={}", code, shapes.len());
        SelectOutcome::Found { code, shapes }
    }

    /// Restores the decorated shapes to the default style.
    pub fn clear(&mut self, map: &mut dyn MapSurface) {
        for id in self.state.decoration.drain(..) {
            map.set_style(id, ShapeStyle::default_outline());
        }
        self.state.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::FeatureCollection;
    use crate::map::{HeadlessMap, ViewState};
    use crate::region::CodeProbe;
    use serde_json::json;

    fn setup() -> (RegionIndex, HeadlessMap) {
        let fc: FeatureCollection = serde_json::from_value(json!({
            "features": [
                {"properties": {"WMU": "49"}, "geometry": {"type": "Polygon",
                    "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
                {"properties": {"WMU": "50"}, "geometry": {"type": "Polygon",
                    "coordinates": [[[1,0],[2,0],[2,1],[1,1],[1,0]]]}}
            ]
        }))
        .unwrap();
        let mut map = HeadlessMap::new();
        let index = RegionIndex::build(fc, &CodeProbe::new(["WMU"]), &[], &mut map);
        (index, map)
    }

    #[test]
    fn test_empty_input_is_missing() {
        let (index, mut map) = setup();
        let mut selector = RegionSelector::new(MissPolicy::Clear, (20, 20));
        assert_eq!(
            selector.select("   ", &index, &mut map),
            SelectOutcome::MissingInput
        );
        assert_eq!(map.fit_count(), 0);
    }

    #[test]
    fn test_second_select_moves_highlight() {
        let (index, mut map) = setup();
        let mut selector = RegionSelector::new(MissPolicy::Clear, (20, 20));

        selector.select("49", &index, &mut map);
        selector.select("50", &index, &mut map);

        assert_eq!(map.highlighted(), vec![ShapeId(1)]);
        assert_eq!(
            map.style_of(ShapeId(0)),
            Some(&ShapeStyle::default_outline())
        );
        assert_eq!(selector.current(), Some("50"));
        match map.view() {
            Some(ViewState::Fitted { padding, .. }) => assert_eq!(*padding, (20, 20)),
            other => panic!("Expected fitted view, got {:?}", other),
        }
    }

    #[test]
    fn test_reselect_is_idempotent() {
        let (index, mut map) = setup();
        let mut selector = RegionSelector::new(MissPolicy::Clear, (20, 20));

        selector.select("49", &index, &mut map);
        let again = selector.select(" 49 ", &index, &mut map);

        assert!(matches!(again, SelectOutcome::Found { .. }));
        assert_eq!(map.highlighted(), vec![ShapeId(0)]);
        assert_eq!(map.fit_count(), 2);
    }

    #[test]
    fn test_miss_policy() {
        let (index, mut map) = setup();

        let mut clearing = RegionSelector::new(MissPolicy::Clear, (0, 0));
        clearing.select("49", &index, &mut map);
        assert_eq!(
            clearing.select("999", &index, &mut map),
            SelectOutcome::NotFound {
                code: "999".to_string()
            }
        );
        assert!(map.highlighted().is_empty());
        assert_eq!(clearing.current(), None);

        let mut retaining = RegionSelector::new(MissPolicy::Retain, (0, 0));
        retaining.select("50", &index, &mut map);
        retaining.select("999", &index, &mut map);
        assert_eq!(map.highlighted(), vec![ShapeId(1)]);
        assert_eq!(retaining.current(), Some("50"));
    }
}
