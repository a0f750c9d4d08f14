//! Minimal SVG document writer. Numbers are written with two decimals so a
//! given scene always serializes to the same bytes.

use std::fmt::Write as _;

/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// Escape text for element content or attribute values, dropping characters
/// XML cannot carry.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars().filter(|&c| is_valid_xml_char(c)) {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Text anchoring for [`SvgWriter::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// Stroke description shared by shapes.
#[derive(Debug, Clone, Copy)]
pub struct Stroke<'a> {
    pub color: &'a str,
    pub width: f32,
    pub dashed: bool,
}

pub struct SvgWriter {
    width: f32,
    height: f32,
    body: String,
}

impl SvgWriter {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    pub fn open_group(&mut self, class: &str, opacity: Option<f32>) {
        match opacity {
            Some(o) => {
                let _ = write!(self.body, r#"<g class="{}" opacity="{:.2}">"#, class, o);
            }
            None => {
                let _ = write!(self.body, r#"<g class="{}">"#, class);
            }
        }
    }

    pub fn close_group(&mut self) {
        self.body.push_str("</g>");
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rx: f32,
        fill: &str,
        fill_opacity: f32,
        stroke: Option<Stroke<'_>>,
    ) {
        let _ = write!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}" fill-opacity="{:.2}""#,
            x, y, width, height, rx, fill, fill_opacity
        );
        self.push_stroke(stroke);
        self.body.push_str(" />");
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, stroke: Stroke<'_>) {
        let _ = write!(
            self.body,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke-linecap="round""#,
            x1, y1, x2, y2
        );
        self.push_stroke(Some(stroke));
        self.body.push_str(" />");
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32, fill: &str) {
        let _ = write!(
            self.body,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" />"#,
            cx, cy, r, fill
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn text(
        &mut self,
        x: f32,
        y: f32,
        content: &str,
        font_family: &str,
        font_size: f32,
        fill: &str,
        anchor: Anchor,
        bold: bool,
    ) {
        let weight_attr = if bold { r#" font-weight="700""# } else { "" };
        let _ = write!(
            self.body,
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" fill="{}" text-anchor="{}"{}>{}</text>"#,
            x,
            y,
            escape_xml(font_family),
            font_size,
            fill,
            anchor.as_str(),
            weight_attr,
            escape_xml(content),
        );
    }

    fn push_stroke(&mut self, stroke: Option<Stroke<'_>>) {
        match stroke {
            Some(s) => {
                let _ = write!(
                    self.body,
                    r#" stroke="{}" stroke-width="{:.2}""#,
                    s.color, s.width
                );
                if s.dashed {
                    let dash = (s.width * 3.0).max(4.0);
                    let _ = write!(self.body, r#" stroke-dasharray="{:.2} {:.2}""#, dash, dash);
                }
            }
            None => self.body.push_str(r#" stroke="none""#),
        }
    }

    pub fn finish(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">{body}</svg>"#,
            w = self.width,
            h = self.height,
            body = self.body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_invalid_control_chars() {
        assert_eq!(escape_xml("A\u{0007}B\u{000C}C"), "ABC");
        assert_eq!(escape_xml("a\tb\nc"), "a\tb\nc");
    }

    #[test]
    fn escape_special_xml_chars() {
        assert_eq!(
            escape_xml(r#"<Gate "A" & 'B'>"#),
            "&lt;Gate &quot;A&quot; &amp; &apos;B&apos;&gt;"
        );
    }

    #[test]
    fn document_has_fixed_precision() {
        let mut svg = SvgWriter::new(100.0, 50.0);
        svg.circle(1.0 / 3.0, 2.0, 0.5, "#000000");
        svg.rect(
            0.0,
            0.0,
            10.0,
            10.0,
            0.0,
            "#ffffff",
            1.0,
            Some(Stroke {
                color: "#ff0000",
                width: 2.0,
                dashed: true,
            }),
        );
        let out = svg.finish();
        assert!(out.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50""#));
        assert!(out.contains(r#"cx="0.33""#));
        assert!(out.contains(r#"stroke-dasharray="6.00 6.00""#));
        assert!(out.ends_with("</svg>"));
    }
}
