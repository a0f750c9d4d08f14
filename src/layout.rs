use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::density::{Density, Thresholds, Tier, classify};
use crate::geometry::{CoordinateMapper, Point, Rect};
use crate::model::{GraphDescription, StateSnapshot, ZoneKind};

/// Smallest area used for sizing, in m².
pub const MIN_ZONE_AREA: f64 = 1.0;

const DANGER_BORDER_WIDTH: f32 = 4.0;
const NEUTRAL_BORDER_WIDTH: f32 = 1.5;

/// Pixels per sqrt(m²) along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeFactors {
    #[serde(default = "default_width_factor")]
    pub width: f32,
    #[serde(default = "default_height_factor")]
    pub height: f32,
}

fn default_width_factor() -> f32 {
    6.0
}
fn default_height_factor() -> f32 {
    4.0
}

impl Default for SizeFactors {
    fn default() -> Self {
        Self {
            width: default_width_factor(),
            height: default_height_factor(),
        }
    }
}

/// Rectangle size for a zone of the given area.
pub fn zone_size(area: f64, factors: SizeFactors) -> (f32, f32) {
    let area = if area.is_finite() { area.max(MIN_ZONE_AREA) } else { MIN_ZONE_AREA };
    let side = area.sqrt() as f32;
    (side * factors.width.max(0.0), side * factors.height.max(0.0))
}

/// Border stroke width for a tier. Danger gets the alert weight.
pub fn border_width(tier: Tier) -> f32 {
    match tier {
        Tier::Danger => DANGER_BORDER_WIDTH,
        Tier::Safe | Tier::Warning => NEUTRAL_BORDER_WIDTH,
    }
}

/// A zone resolved for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneBox {
    pub id: String,
    pub label: String,
    pub kind: ZoneKind,
    pub rect: Rect,
    pub count: u64,
    pub capacity: Option<u64>,
    pub density: Density,
    pub blocked: bool,
}

impl ZoneBox {
    pub fn center(&self) -> Point {
        self.rect.center()
    }

    pub fn tier(&self) -> Tier {
        self.density.tier
    }
}

/// All zone rectangles of a frame, in graph order.
#[derive(Debug, Clone, Default)]
pub struct FloorLayout {
    zones: Vec<ZoneBox>,
    index: HashMap<String, usize>,
    thresholds: Thresholds,
}

impl FloorLayout {
    pub fn build(
        graph: &GraphDescription,
        state: &StateSnapshot,
        mapper: &CoordinateMapper,
        factors: SizeFactors,
        thresholds: Thresholds,
    ) -> Self {
        let mut zones = Vec::with_capacity(graph.nodes.len());
        let mut index = HashMap::with_capacity(graph.nodes.len());

        for node in &graph.nodes {
            if index.contains_key(&node.id) {
                warn!(zone = %node.id, "duplicate zone id, keeping the first");
                continue;
            }
            if !(node.area.is_finite() && node.area > 0.0) {
                warn!(zone = %node.id, area = node.area, "non-positive zone area clamped");
            }

            let count = state.count_for(&node.id);
            let (width, height) = zone_size(node.area, factors);
            let center = mapper.to_pixel(clamp_unit(node.x), clamp_unit(node.y));

            index.insert(node.id.clone(), zones.len());
            zones.push(ZoneBox {
                id: node.id.clone(),
                label: node.display_label().to_string(),
                kind: node.kind,
                rect: Rect::centered(center, width, height),
                count,
                capacity: node.capacity,
                density: classify(count, node.area, thresholds),
                blocked: state.is_blocked(&node.id),
            });
        }

        Self {
            zones,
            index,
            thresholds,
        }
    }

    pub fn zones(&self) -> &[ZoneBox] {
        &self.zones
    }

    pub fn get(&self, id: &str) -> Option<&ZoneBox> {
        self.index.get(id).map(|&i| &self.zones[i])
    }

    /// Draw-order index of a zone.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Topmost zone under a pixel, honoring draw order.
    pub fn hit_test(&self, p: Point) -> Option<&ZoneBox> {
        self.zones.iter().rev().find(|z| z.rect.contains(p))
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 }
}
