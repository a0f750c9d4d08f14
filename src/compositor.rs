use std::collections::BTreeMap;
use std::time::Instant;

use tiny_skia::Pixmap;
use tracing::{debug, warn};

use crate::config::RenderConfig;
use crate::density::Tier;
use crate::fonts::{EstimateMeasure, TextMeasure};
use crate::geometry::CoordinateMapper;
use crate::layout::{FloorLayout, border_width};
use crate::model::{GraphDescription, Occupant, StateSnapshot};
use crate::overlay;
use crate::packer;
use crate::paths::resolve_segments;
use crate::raster::{self, Rasterizer};
use crate::svg::{Stroke, SvgWriter};
use crate::theme::Theme;
use crate::view::{ViewMessage, ViewOptions};
use crate::{Error, Result};

const GRID_STEP: f32 = 10.0;
const PATH_WIDTH: f32 = 2.0;
const DIMMED_OPACITY: f32 = 0.35;

/// What a frame can draw with the inputs at hand.
#[derive(Debug, Clone, Copy)]
pub enum FrameState<'a> {
    /// Graph or snapshot missing: background only.
    Idle,
    Rendering {
        graph: &'a GraphDescription,
        state: &'a StateSnapshot,
    },
}

impl<'a> FrameState<'a> {
    pub fn from_inputs(
        graph: Option<&'a GraphDescription>,
        state: Option<&'a StateSnapshot>,
    ) -> Self {
        match (graph, state) {
            (Some(graph), Some(state)) => FrameState::Rendering { graph, state },
            _ => FrameState::Idle,
        }
    }
}

/// Counters describing what the last frame drew.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub idle: bool,
    /// Zone id and tier, in draw order.
    pub zones: Vec<(String, Tier)>,
    pub segments: usize,
    pub markers: usize,
    pub skipped_edges: usize,
    pub skipped_occupants: usize,
}

impl FrameStats {
    pub fn tier_of(&self, zone_id: &str) -> Option<Tier> {
        self.zones
            .iter()
            .find(|(id, _)| id == zone_id)
            .map(|(_, tier)| *tier)
    }
}

/// One composed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub svg: String,
    pub stats: FrameStats,
}

/// Compose a frame as SVG. Layers are written bottom to top: background
/// and grid, paths, zones, occupant markers, then labels, badges, legend
/// and stats.
pub fn compose(
    input: FrameState<'_>,
    canvas: CoordinateMapper,
    config: &RenderConfig,
    theme: &Theme,
    view: &ViewOptions,
    measure: &mut dyn TextMeasure,
) -> Frame {
    let mut svg = SvgWriter::new(canvas.width(), canvas.height());
    let mut stats = FrameStats::default();

    svg.rect(0.0, 0.0, canvas.width(), canvas.height(), 0.0, &theme.background, 1.0, None);
    if view.show_grid {
        draw_grid(&mut svg, &canvas, theme);
    }

    let (graph, state) = match input {
        FrameState::Idle => {
            stats.idle = true;
            return Frame {
                svg: svg.finish(),
                stats,
            };
        }
        FrameState::Rendering { graph, state } => (graph, state),
    };

    let thresholds = graph.effective_thresholds(config.thresholds);
    let layout = FloorLayout::build(graph, state, &canvas, config.zone_scale, thresholds);

    let (segments, skipped_edges) = resolve_segments(&graph.edges, &layout, state);
    svg.open_group("paths", None);
    for segment in &segments {
        let color = theme.path_color(segment.congestion);
        svg.line(
            segment.from.x,
            segment.from.y,
            segment.to.x,
            segment.to.y,
            Stroke {
                color: &color,
                width: PATH_WIDTH * (1.0 + segment.congestion as f32),
                dashed: false,
            },
        );
    }
    svg.close_group();

    svg.open_group("zones", None);
    for zone in layout.zones() {
        let tier = zone.tier();
        let color = theme.tier_color(tier);
        let opacity = view.is_dimmed(tier).then_some(DIMMED_OPACITY);
        svg.open_group("zone", opacity);
        svg.rect(
            zone.rect.x,
            zone.rect.y,
            zone.rect.width,
            zone.rect.height,
            3.0,
            color,
            theme.zone_fill_opacity,
            Some(Stroke {
                color,
                width: border_width(tier),
                dashed: zone.blocked,
            }),
        );
        svg.close_group();
        stats.zones.push((zone.id.clone(), tier));
    }
    svg.close_group();

    let (residents, skipped_occupants) = group_residents(state, &layout);
    svg.open_group("occupants", None);
    for (zone, occupants) in layout.zones().iter().zip(&residents) {
        if occupants.is_empty() {
            continue;
        }
        let slots = packer::pack(occupants.len(), zone.rect);
        let radius = packer::marker_radius(occupants.len(), zone.rect, config.marker_radius);
        let opacity = view.is_dimmed(zone.tier()).then_some(DIMMED_OPACITY);
        svg.open_group("markers", opacity);
        for (occupant, slot) in occupants.iter().zip(&slots) {
            svg.circle(slot.x, slot.y, radius, theme.marker_color(occupant.kind.as_deref()));
        }
        svg.close_group();
        stats.markers += slots.len();
    }
    svg.close_group();

    svg.open_group("overlay", None);
    for zone in layout.zones() {
        if view.show_labels {
            overlay::draw_label(&mut svg, zone, theme);
        }
        if view.show_badges {
            overlay::draw_badge(&mut svg, zone, theme, measure);
        }
    }
    if view.show_legend {
        overlay::draw_legend(&mut svg, thresholds, theme, measure, canvas.height());
    }
    if view.show_stats {
        overlay::draw_stats(&mut svg, state, thresholds, theme, measure, canvas.width());
    }
    svg.close_group();

    stats.segments = segments.len();
    stats.skipped_edges = skipped_edges;
    stats.skipped_occupants = skipped_occupants;

    Frame {
        svg: svg.finish(),
        stats,
    }
}

/// Bucket roster entries by zone, keeping roster order inside each bucket.
fn group_residents<'a>(
    state: &'a StateSnapshot,
    layout: &FloorLayout,
) -> (Vec<Vec<&'a Occupant>>, usize) {
    let mut residents: Vec<Vec<&Occupant>> = vec![Vec::new(); layout.zones().len()];
    let mut unknown: BTreeMap<&str, usize> = BTreeMap::new();

    for occupant in state.agents.values() {
        match layout.position(&occupant.current_node) {
            Some(i) => residents[i].push(occupant),
            None => *unknown.entry(occupant.current_node.as_str()).or_default() += 1,
        }
    }

    for (zone, count) in &unknown {
        warn!(zone = %zone, occupants = count, "skipping occupants in unknown zone");
    }

    (residents, unknown.values().sum())
}

fn draw_grid(svg: &mut SvgWriter, canvas: &CoordinateMapper, theme: &Theme) {
    let stroke = Stroke {
        color: &theme.grid,
        width: 1.0,
        dashed: false,
    };
    svg.open_group("grid", None);
    let mut step = GRID_STEP;
    while step < 100.0 {
        let p = canvas.to_pixel(step, step);
        svg.line(p.x, 0.0, p.x, canvas.height(), stroke);
        svg.line(0.0, p.y, canvas.width(), p.y, stroke);
        step += GRID_STEP;
    }
    svg.close_group();
}

/// Owns the pixel surface and redraws it in full for every input change.
pub struct Compositor {
    config: RenderConfig,
    theme: Theme,
    view: ViewOptions,
    measure: Box<dyn TextMeasure>,
    rasterizer: Rasterizer,
    pixmap: Pixmap,
    last: Option<Frame>,
}

impl Compositor {
    pub fn new(
        config: RenderConfig,
        measure: Box<dyn TextMeasure>,
        rasterizer: Rasterizer,
    ) -> Result<Self> {
        let theme = config.resolve_theme()?;
        let pixmap = Pixmap::new(1, 1).ok_or(Error::Pixmap {
            width: 1,
            height: 1,
        })?;
        Ok(Self {
            config,
            theme,
            view: ViewOptions::default(),
            measure,
            rasterizer,
            pixmap,
            last: None,
        })
    }

    /// Font-free compositor with deterministic text metrics.
    pub fn headless(config: RenderConfig) -> Result<Self> {
        Self::new(
            config,
            Box::new(EstimateMeasure::default()),
            Rasterizer::without_fonts(),
        )
    }

    pub fn view(&self) -> ViewOptions {
        self.view
    }

    pub fn set_view(&mut self, view: ViewOptions) {
        self.view = view;
    }

    pub fn dispatch(&mut self, message: ViewMessage) {
        self.view = self.view.update(message);
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Compose the frame without touching the pixel surface.
    pub fn compose_svg(
        &mut self,
        graph: Option<&GraphDescription>,
        state: Option<&StateSnapshot>,
        width: u32,
        height: u32,
    ) -> Frame {
        compose(
            FrameState::from_inputs(graph, state),
            CoordinateMapper::new(width.max(1) as f32, height.max(1) as f32),
            &self.config,
            &self.theme,
            &self.view,
            self.measure.as_mut(),
        )
    }

    /// Redraw the surface from scratch. Never fails: problems with the
    /// inputs are logged and the affected elements skipped.
    pub fn render(
        &mut self,
        graph: Option<&GraphDescription>,
        state: Option<&StateSnapshot>,
        width: u32,
        height: u32,
    ) -> &Pixmap {
        let started = Instant::now();
        let (width, height) = (width.max(1), height.max(1));

        if self.pixmap.width() != width || self.pixmap.height() != height {
            match Pixmap::new(width, height) {
                Some(pixmap) => self.pixmap = pixmap,
                None => {
                    warn!(width, height, "cannot allocate canvas, keeping previous frame");
                    return &self.pixmap;
                }
            }
        }

        let frame = self.compose_svg(graph, state, width, height);
        self.pixmap.fill(raster::solid_color(&self.theme.background));
        if let Err(err) = self.rasterizer.rasterize(&frame.svg, &mut self.pixmap) {
            warn!(error = %err, "frame rasterization failed");
        }

        debug!(
            zones = frame.stats.zones.len(),
            segments = frame.stats.segments,
            markers = frame.stats.markers,
            idle = frame.stats.idle,
            elapsed_us = started.elapsed().as_micros() as u64,
            "frame rendered"
        );

        self.last = Some(frame);
        &self.pixmap
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn export_png(&self) -> Result<Vec<u8>> {
        raster::encode_png(&self.pixmap)
    }

    pub fn export_svg(&self) -> Option<&str> {
        self.last.as_ref().map(|f| f.svg.as_str())
    }

    pub fn export_pdf(&self) -> Result<Vec<u8>> {
        let svg = self
            .export_svg()
            .ok_or_else(|| Error::Pdf("no frame rendered yet".to_string()))?;
        raster::svg_to_pdf(svg)
    }

    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (GraphDescription, StateSnapshot) {
        let graph = GraphDescription::from_json(
            r#"{
                "nodes": [
                    {"id": "gate", "label": "Gate", "type": "entry", "area": 50, "x": 20, "y": 50},
                    {"id": "hall", "label": "Hall", "area": 200, "x": 70, "y": 50}
                ],
                "edges": [{"from": "gate", "to": "hall"}]
            }"#,
        )
        .expect("graph");
        let state = StateSnapshot::from_json(
            r#"{
                "nodes": {"gate": {"current_count": 2}, "hall": {"current_count": 3}},
                "agents": {
                    "a1": {"current_node": "gate"},
                    "a2": {"current_node": "gate"},
                    "a3": {"current_node": "hall"},
                    "a4": {"current_node": "hall"},
                    "a5": {"current_node": "hall"},
                    "a6": {"current_node": "gone"}
                },
                "reached_goal": 1
            }"#,
        )
        .expect("state");
        (graph, state)
    }

    fn compose_default(graph: Option<&GraphDescription>, state: Option<&StateSnapshot>) -> Frame {
        compose(
            FrameState::from_inputs(graph, state),
            CoordinateMapper::new(400.0, 300.0),
            &RenderConfig::default(),
            &Theme::default(),
            &ViewOptions::default(),
            &mut EstimateMeasure::default(),
        )
    }

    #[test]
    fn missing_input_is_idle() {
        let (graph, state) = sample();
        for frame in [
            compose_default(None, Some(&state)),
            compose_default(Some(&graph), None),
            compose_default(None, None),
        ] {
            assert!(frame.stats.idle);
            assert!(frame.stats.zones.is_empty());
            assert!(!frame.svg.contains("<circle"));
        }
    }

    #[test]
    fn layers_follow_draw_order() {
        let (graph, state) = sample();
        let frame = compose_default(Some(&graph), Some(&state));
        let layers = ["grid", "paths", "zones", "occupants", "overlay"];
        let order: Vec<usize> = layers
            .iter()
            .map(|name| format!(r#"class="{name}""#))
            .map(|needle| frame.svg.find(&needle).expect("layer present"))
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");
    }

    #[test]
    fn unknown_occupant_zone_is_skipped() {
        let (graph, state) = sample();
        let frame = compose_default(Some(&graph), Some(&state));
        assert_eq!(frame.stats.markers, 5);
        assert_eq!(frame.stats.skipped_occupants, 1);
        assert_eq!(frame.svg.matches("<circle").count(), 5);
    }

    #[test]
    fn hidden_layers_are_not_drawn() {
        let (graph, state) = sample();
        let view = ViewOptions::default()
            .update(ViewMessage::ToggleStats)
            .update(ViewMessage::ToggleLegend)
            .update(ViewMessage::ToggleLabels);
        let frame = compose(
            FrameState::from_inputs(Some(&graph), Some(&state)),
            CoordinateMapper::new(400.0, 300.0),
            &RenderConfig::default(),
            &Theme::default(),
            &view,
            &mut EstimateMeasure::default(),
        );
        assert!(!frame.svg.contains("reached goal"));
        assert!(!frame.svg.contains("Density"));
        assert!(!frame.svg.contains(">Hall<"));
    }

    #[test]
    fn venue_thresholds_override_config() {
        let (mut graph, state) = sample();
        // gate: 2 people on 50 m² is 0.04/m²
        graph.thresholds = crate::density::Thresholds::new(0.02, 0.03);
        let frame = compose_default(Some(&graph), Some(&state));
        assert_eq!(frame.stats.tier_of("gate"), Some(Tier::Danger));
        assert_eq!(frame.stats.tier_of("hall"), Some(Tier::Safe));
    }

    #[test]
    fn venue_override_hides_producer_danger_count() {
        let mut graph = GraphDescription::from_json(
            r#"{"nodes": [{"id": "a", "area": 100, "x": 50, "y": 50}]}"#,
        )
        .expect("graph");
        let state = StateSnapshot::from_json(
            r#"{"nodes": {"a": {"current_count": 370}}, "danger_zones": []}"#,
        )
        .expect("state");

        let frame = compose_default(Some(&graph), Some(&state));
        assert_eq!(frame.stats.tier_of("a"), Some(Tier::Warning));
        assert!(frame.svg.contains(">0 danger zones</text>"));

        graph.thresholds = crate::density::Thresholds::new(3.0, 3.5);
        let frame = compose_default(Some(&graph), Some(&state));
        assert_eq!(frame.stats.tier_of("a"), Some(Tier::Danger));
        assert!(!frame.svg.contains("danger zone"));
    }

    #[test]
    fn congested_paths_shift_toward_danger() {
        let (graph, mut state) = sample();
        let theme = Theme::default();
        let calm = compose_default(Some(&graph), Some(&state));
        assert!(calm.svg.contains(&format!(r#"stroke="{}" stroke-width="2.00""#, theme.path)));

        state.edges.push(crate::model::EdgeLoad {
            from: "hall".into(),
            to: "gate".into(),
            congestion: 1.0,
        });
        let jammed = compose_default(Some(&graph), Some(&state));
        assert!(jammed.svg.contains(&format!(r#"stroke="{}" stroke-width="4.00""#, theme.danger)));
    }

    #[test]
    fn render_resizes_surface_and_clamps_zero() {
        let (graph, state) = sample();
        let mut compositor = Compositor::headless(RenderConfig::default()).expect("compositor");
        let pixmap = compositor.render(Some(&graph), Some(&state), 320, 200);
        assert_eq!((pixmap.width(), pixmap.height()), (320, 200));
        let pixmap = compositor.render(Some(&graph), Some(&state), 0, 0);
        assert_eq!((pixmap.width(), pixmap.height()), (1, 1));
    }
}
