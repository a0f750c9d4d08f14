use std::path::Path;
use std::sync::Arc;

use resvg::usvg;
use tiny_skia::{Color, Pixmap, Transform};

use crate::theme::parse_hex_rgb;
use crate::{Error, Result};

/// Turns frame SVG into pixels. Holds the parsed font database so it is
/// loaded once per process rather than once per frame.
pub struct Rasterizer {
    options: usvg::Options<'static>,
}

impl Rasterizer {
    /// Rasterizer with system fonts plus anything under `./fonts`.
    pub fn with_system_fonts() -> Self {
        let mut options = usvg::Options::default();
        {
            let fontdb = options.fontdb_mut();
            fontdb.load_system_fonts();

            let local_fonts = Path::new("fonts");
            if local_fonts.is_dir() {
                fontdb.load_fonts_dir(local_fonts);
            }

            configure_font_fallbacks(fontdb);
        }
        Self { options }
    }

    /// Rasterizer with an empty font database. Text is skipped; shapes are
    /// unaffected and output stays reproducible across machines.
    pub fn without_fonts() -> Self {
        Self {
            options: usvg::Options::default(),
        }
    }

    /// Draw `svg` over `pixmap`, scaling the document to fill it.
    pub fn rasterize(&self, svg: &str, pixmap: &mut Pixmap) -> Result<()> {
        let tree = usvg::Tree::from_str(svg, &self.options)?;
        let size = tree.size();
        let transform = Transform::from_scale(
            pixmap.width() as f32 / size.width(),
            pixmap.height() as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Ok(())
    }

    pub fn svg_to_png(&self, svg: &str, scale: f32) -> Result<Vec<u8>> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::Config(format!("invalid PNG scale: {}", scale)));
        }

        let tree = usvg::Tree::from_str(svg, &self.options)?;
        let width = (tree.size().width() * scale).ceil() as u32;
        let height = (tree.size().height() * scale).ceil() as u32;

        let mut pixmap = Pixmap::new(width, height).ok_or(Error::Pixmap { width, height })?;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        encode_png(&pixmap)
    }
}

pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    pixmap.encode_png().map_err(|e| Error::Encode(e.to_string()))
}

/// Solid color for a `#rrggbb` string, white when unparsable.
pub fn solid_color(hex: &str) -> Color {
    parse_hex_rgb(hex)
        .map(|(r, g, b)| Color::from_rgba(r, g, b, 1.0).unwrap_or(Color::WHITE))
        .unwrap_or(Color::WHITE)
}

pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    use svg2pdf::usvg::fontdb;

    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();

    let local_fonts = Path::new("fonts");
    if local_fonts.is_dir() {
        fontdb.load_fonts_dir(local_fonts);
    }

    let opts = svg2pdf::usvg::Options {
        fontdb: Arc::new(fontdb),
        ..Default::default()
    };

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Pdf(format!("failed to parse SVG: {}", e)))?;

    // Text as paths keeps PDFs readable when font embedding fails.
    let options = svg2pdf::ConversionOptions {
        embed_text: false,
        ..Default::default()
    };

    svg2pdf::to_pdf(&tree, options, svg2pdf::PageOptions::default())
        .map_err(|e| Error::Pdf(e.to_string()))
}

fn configure_font_fallbacks(fontdb: &mut usvg::fontdb::Database) {
    let mut sans_family: Option<String> = None;
    let mut first_family: Option<String> = None;

    for face in fontdb.faces() {
        for (family, _) in &face.families {
            if first_family.is_none() {
                first_family = Some(family.clone());
            }
            if sans_family.is_none() && family.to_ascii_lowercase().contains("sans") {
                sans_family = Some(family.clone());
            }
        }
    }

    if let Some(family) = sans_family.as_deref().or(first_family.as_deref()) {
        fontdb.set_sans_serif_family(family);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4" viewBox="0 0 4 4"><rect x="0" y="0" width="4" height="4" fill="#ff0000" /></svg>"##;

    #[test]
    fn rasterize_fills_pixmap() {
        let mut pixmap = Pixmap::new(4, 4).expect("pixmap");
        Rasterizer::without_fonts()
            .rasterize(SQUARE, &mut pixmap)
            .expect("rasterizes");
        let px = pixmap.pixel(2, 2).expect("in bounds");
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 0, 0, 255));
    }

    #[test]
    fn png_scale_must_be_positive() {
        let r = Rasterizer::without_fonts();
        assert!(r.svg_to_png(SQUARE, 0.0).is_err());
        let png = r.svg_to_png(SQUARE, 2.0).expect("png");
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn malformed_svg_is_an_error() {
        let mut pixmap = Pixmap::new(4, 4).expect("pixmap");
        assert!(Rasterizer::without_fonts().rasterize("<svg", &mut pixmap).is_err());
    }

    #[test]
    fn solid_color_falls_back_to_white() {
        assert_eq!(solid_color("nonsense"), Color::WHITE);
        assert_eq!(solid_color("#000000"), Color::BLACK);
    }
}
