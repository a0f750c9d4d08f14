use std::num::NonZeroUsize;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Weight};
use lru::LruCache;

const MEASURE_CACHE_ENTRIES: usize = 4096;

#[derive(Hash, PartialEq, Eq, Clone)]
struct MeasureKey {
    text: String,
    font_size_bits: u32,
    is_bold: bool,
}

/// Width and height of a single line of text, in pixels.
pub trait TextMeasure {
    fn measure_text(&mut self, text: &str, font_size: f32, is_bold: bool) -> (f32, f32);
}

/// Shapes text with the system fonts.
pub struct CosmicTextMeasure {
    font_system: FontSystem,
    cache: LruCache<MeasureKey, (f32, f32)>,
}

impl CosmicTextMeasure {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            cache: LruCache::new(
                NonZeroUsize::new(MEASURE_CACHE_ENTRIES).unwrap_or(NonZeroUsize::MIN),
            ),
        }
    }
}

impl Default for CosmicTextMeasure {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for CosmicTextMeasure {
    fn measure_text(&mut self, text: &str, font_size: f32, is_bold: bool) -> (f32, f32) {
        let key = MeasureKey {
            text: text.to_string(),
            font_size_bits: font_size.to_bits(),
            is_bold,
        };

        if let Some(cached) = self.cache.get(&key) {
            return *cached;
        }

        let line_height = font_size * 1.2;
        let mut buffer = Buffer::new(
            &mut self.font_system,
            Metrics {
                font_size,
                line_height,
            },
        );
        buffer.set_size(&mut self.font_system, None, None);

        let attrs = Attrs::new()
            .family(Family::SansSerif)
            .weight(if is_bold { Weight::BOLD } else { Weight::NORMAL });

        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);

        let mut width: f32 = 0.0;
        let mut height: f32 = 0.0;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            height += run.line_height;
        }

        let measured = (width, height.max(line_height));
        self.cache.put(key, measured);
        measured
    }
}

/// Fixed per-character advance. Deterministic and font-free.
#[derive(Debug, Clone, Copy)]
pub struct EstimateMeasure {
    pub advance_ratio: f32,
}

impl Default for EstimateMeasure {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
        }
    }
}

impl TextMeasure for EstimateMeasure {
    fn measure_text(&mut self, text: &str, font_size: f32, is_bold: bool) -> (f32, f32) {
        let ratio = if is_bold {
            self.advance_ratio * 1.08
        } else {
            self.advance_ratio
        };
        let width = text.chars().count() as f32 * font_size * ratio;
        (width, font_size * 1.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_with_length_and_size() {
        let mut m = EstimateMeasure::default();
        let (w1, h1) = m.measure_text("12", 10.0, false);
        let (w2, _) = m.measure_text("1234", 10.0, false);
        let (w3, h3) = m.measure_text("12", 20.0, false);
        assert_eq!(w2, w1 * 2.0);
        assert_eq!(w3, w1 * 2.0);
        assert_eq!(h3, h1 * 2.0);
        assert!(m.measure_text("12", 10.0, true).0 > w1);
    }
}
