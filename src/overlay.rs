//! Labels, count badges, the tier legend and the live-stats panel.
//!
//! Every colored element takes its tier from the zone's [`ZoneBox`], which
//! was classified once per frame, so widgets never disagree about a zone.

use crate::density::{Thresholds, Tier};
use crate::fonts::TextMeasure;
use crate::layout::ZoneBox;
use crate::model::StateSnapshot;
use crate::svg::{Anchor, Stroke, SvgWriter};
use crate::theme::Theme;

const PANEL_MARGIN: f32 = 12.0;
const PANEL_PADDING: f32 = 8.0;
const SWATCH_SIZE: f32 = 10.0;
const BADGE_PADDING_X: f32 = 4.0;
const LABEL_GAP: f32 = 4.0;

pub fn label_text(zone: &ZoneBox) -> String {
    if zone.blocked {
        format!("{} (closed)", zone.label)
    } else {
        zone.label.clone()
    }
}

pub fn badge_text(zone: &ZoneBox) -> String {
    match zone.capacity {
        Some(capacity) => format!("{}/{}", zone.count, capacity),
        None => zone.count.to_string(),
    }
}

pub fn draw_label(svg: &mut SvgWriter, zone: &ZoneBox, theme: &Theme) {
    let fill = if zone.blocked { &theme.closed } else { &theme.text };
    svg.text(
        zone.rect.center().x,
        zone.rect.y - LABEL_GAP,
        &label_text(zone),
        &theme.font_family,
        theme.font_size,
        fill,
        Anchor::Middle,
        true,
    );
}

/// Chip centered on the zone's top-right corner.
pub fn draw_badge(
    svg: &mut SvgWriter,
    zone: &ZoneBox,
    theme: &Theme,
    measure: &mut dyn TextMeasure,
) {
    let text = badge_text(zone);
    let font_size = theme.font_size * 0.85;
    let (text_w, _) = measure.measure_text(&text, font_size, true);
    let width = text_w + BADGE_PADDING_X * 2.0;
    let height = font_size + 4.0;
    let x = zone.rect.right() - width / 2.0;
    let y = zone.rect.y - height / 2.0;

    svg.rect(
        x,
        y,
        width,
        height,
        height / 2.0,
        theme.tier_color(zone.tier()),
        1.0,
        None,
    );
    svg.text(
        x + width / 2.0,
        y + height / 2.0 + font_size / 3.0,
        &text,
        &theme.font_family,
        font_size,
        &theme.badge_text,
        Anchor::Middle,
        true,
    );
}

/// Shortest form with at least one decimal that still tells `low` and
/// `high` apart, up to six decimals.
fn threshold_labels(thresholds: Thresholds) -> (String, String) {
    let mut precision = 1;
    loop {
        let low = format!("{:.*}", precision, thresholds.low);
        let high = format!("{:.*}", precision, thresholds.high);
        let exact = |text: &str, value: f64| text.parse::<f64>().is_ok_and(|p| p == value);
        let done = low != high && exact(&low, thresholds.low) && exact(&high, thresholds.high);
        if done || precision >= 6 {
            return (low, high);
        }
        precision += 1;
    }
}

pub fn legend_entries(thresholds: Thresholds) -> [(Tier, String); 3] {
    let (low, high) = threshold_labels(thresholds);
    Tier::ALL.map(|tier| {
        let range = match tier {
            Tier::Safe => format!("< {}", low),
            Tier::Warning => format!("{}-{}", low, high),
            Tier::Danger => format!(">= {}", high),
        };
        (tier, format!("{} {}", tier.name(), range))
    })
}

/// Legend pinned to the bottom-left corner of the canvas.
pub fn draw_legend(
    svg: &mut SvgWriter,
    thresholds: Thresholds,
    theme: &Theme,
    measure: &mut dyn TextMeasure,
    canvas_height: f32,
) {
    let entries = legend_entries(thresholds);
    let title = "Density (people/m²)";
    let line_h = theme.font_size * 1.5;

    let mut content_w = measure.measure_text(title, theme.font_size, true).0;
    for (_, text) in &entries {
        let (w, _) = measure.measure_text(text, theme.font_size, false);
        content_w = content_w.max(SWATCH_SIZE + 6.0 + w);
    }

    let width = content_w + PANEL_PADDING * 2.0;
    let height = line_h * (entries.len() + 1) as f32 + PANEL_PADDING * 2.0;
    let x = PANEL_MARGIN;
    let y = canvas_height - PANEL_MARGIN - height;

    draw_panel(svg, x, y, width, height, theme);
    svg.text(
        x + PANEL_PADDING,
        y + PANEL_PADDING + theme.font_size,
        title,
        &theme.font_family,
        theme.font_size,
        &theme.text,
        Anchor::Start,
        true,
    );

    for (i, (tier, text)) in entries.iter().enumerate() {
        let row_y = y + PANEL_PADDING + line_h * (i + 1) as f32;
        svg.rect(
            x + PANEL_PADDING,
            row_y + (line_h - SWATCH_SIZE) / 2.0,
            SWATCH_SIZE,
            SWATCH_SIZE,
            2.0,
            theme.tier_color(*tier),
            1.0,
            None,
        );
        svg.text(
            x + PANEL_PADDING + SWATCH_SIZE + 6.0,
            row_y + theme.font_size,
            text,
            &theme.font_family,
            theme.font_size,
            &theme.text,
            Anchor::Start,
            false,
        );
    }
}

/// Lines shown in the stats panel. Aggregates come from the snapshot as-is.
///
/// The producer's `danger_zones` list is classified with its own pair, so
/// it is only shown while the frame uses that same pair; otherwise the
/// count could contradict the zone colors.
pub fn stats_lines(state: &StateSnapshot, thresholds: Thresholds) -> Vec<String> {
    let mut lines = vec![
        format!("{} active", state.active_total()),
        format!("{} reached goal", state.reached_goal),
    ];
    let producer_pair = thresholds == Thresholds::PRODUCER;
    if let Some(zones) = state.danger_zones.as_ref().filter(|_| producer_pair) {
        let suffix = if zones.len() == 1 { "" } else { "s" };
        lines.push(format!("{} danger zone{}", zones.len(), suffix));
    }
    if let Some(time) = state.time.filter(|t| t.is_finite()) {
        lines.push(format!("t = {:.1}s", time));
    }
    lines
}

/// Stats panel pinned to the top-right corner of the canvas.
pub fn draw_stats(
    svg: &mut SvgWriter,
    state: &StateSnapshot,
    thresholds: Thresholds,
    theme: &Theme,
    measure: &mut dyn TextMeasure,
    canvas_width: f32,
) {
    let lines = stats_lines(state, thresholds);
    let line_h = theme.font_size * 1.5;
    let content_w = lines
        .iter()
        .map(|l| measure.measure_text(l, theme.font_size, false).0)
        .fold(0.0_f32, f32::max);

    let width = content_w + PANEL_PADDING * 2.0;
    let height = line_h * lines.len() as f32 + PANEL_PADDING * 2.0;
    let x = canvas_width - PANEL_MARGIN - width;
    let y = PANEL_MARGIN;

    draw_panel(svg, x, y, width, height, theme);
    for (i, line) in lines.iter().enumerate() {
        svg.text(
            x + PANEL_PADDING,
            y + PANEL_PADDING + line_h * i as f32 + theme.font_size,
            line,
            &theme.font_family,
            theme.font_size,
            &theme.text,
            Anchor::Start,
            i == 0,
        );
    }
}

fn draw_panel(svg: &mut SvgWriter, x: f32, y: f32, width: f32, height: f32, theme: &Theme) {
    svg.rect(
        x,
        y,
        width,
        height,
        6.0,
        &theme.panel,
        0.92,
        Some(Stroke {
            color: &theme.panel_border,
            width: 1.0,
            dashed: false,
        }),
    );
}
