//! Drawing surface abstraction and its `lopdf` backed PDF implementation.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner.
//! `PdfCanvas` uses the standard Helvetica fonts, so no font data is
//! embedded; text is encoded as WinAnsi.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use scribe_core::error::ScribeError;

/// A4 portrait, in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

/// Bezier control-point factor for quarter-circle corners.
const KAPPA: f32 = 0.552_284_8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }
}

/// Axis-aligned rectangle; `(x, y)` is the bottom-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }
}

/// Primitive drawing operations used by the document renderer.
pub trait Canvas {
    /// Page size as `(width, height)`.
    fn page_size(&self) -> (f32, f32);

    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    /// Filled and stroked rectangle with rounded corners.
    fn rounded_rect(&mut self, rect: Rect, radius: f32, fill: Rgb, stroke: Rgb);

    /// Single-line text with its baseline starting at `(x, y)`.
    fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str);

    fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgb);
}

/// Canvas that records content-stream operations for a single page.
pub struct PdfCanvas {
    width: f32,
    height: f32,
    title: String,
    operations: Vec<Operation>,
}

impl PdfCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            title: String::new(),
            operations: Vec::new(),
        }
    }

    pub fn a4() -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT)
    }

    /// Document title recorded in the info dictionary.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Assemble the page into a complete PDF file.
    pub fn finish(self) -> Result<Vec<u8>, ScribeError> {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for font in [Font::Regular, Font::Bold] {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource(), id);
        }
        let resources_id = doc.add_object(dictionary! { "Font" => fonts });

        let content = Content {
            operations: self.operations,
        }
        .encode()
        .map_err(pdf_error)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(self.width), real(self.height)],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(win_ansi_bytes(&self.title)),
            "Producer" => Object::string_literal("CivicScribe"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).map_err(pdf_error)?;
        Ok(out)
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn set_fill(&mut self, c: Rgb) {
        self.push("rg", vec![real(c.r), real(c.g), real(c.b)]);
    }

    fn set_stroke(&mut self, c: Rgb) {
        self.push("RG", vec![real(c.r), real(c.g), real(c.b)]);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.push("m", vec![real(x), real(y)]);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push("l", vec![real(x), real(y)]);
    }

    fn curve_to(&mut self, c1: (f32, f32), c2: (f32, f32), end: (f32, f32)) {
        self.push(
            "c",
            vec![real(c1.0), real(c1.1), real(c2.0), real(c2.1), real(end.0), real(end.1)],
        );
    }
}

impl Canvas for PdfCanvas {
    fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.set_fill(color);
        self.push(
            "re",
            vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)],
        );
        self.push("f", vec![]);
    }

    fn rounded_rect(&mut self, rect: Rect, radius: f32, fill: Rgb, stroke: Rgb) {
        let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
        let k = r * KAPPA;
        let (x0, y0) = (rect.x, rect.y);
        let (x1, y1) = (rect.x + rect.width, rect.top());

        self.set_fill(fill);
        self.set_stroke(stroke);
        self.push("w", vec![real(0.75)]);
        self.move_to(x0 + r, y0);
        self.line_to(x1 - r, y0);
        self.curve_to((x1 - r + k, y0), (x1, y0 + r - k), (x1, y0 + r));
        self.line_to(x1, y1 - r);
        self.curve_to((x1, y1 - r + k), (x1 - r + k, y1), (x1 - r, y1));
        self.line_to(x0 + r, y1);
        self.curve_to((x0 + r - k, y1), (x0, y1 - r + k), (x0, y1 - r));
        self.line_to(x0, y0 + r);
        self.curve_to((x0, y0 + r - k), (x0 + r - k, y0), (x0 + r, y0));
        self.push("h", vec![]);
        self.push("B", vec![]);
    }

    fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        self.set_fill(color);
        self.push("BT", vec![]);
        self.push("Tf", vec![font.resource().into(), real(size)]);
        self.push("Td", vec![real(x), real(y)]);
        self.push("Tj", vec![Object::string_literal(win_ansi_bytes(text))]);
        self.push("ET", vec![]);
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgb) {
        self.set_stroke(color);
        self.push("w", vec![real(width)]);
        self.move_to(from.0, from.1);
        self.line_to(to.0, to.1);
        self.push("S", vec![]);
    }
}

fn real(v: f32) -> Object {
    v.into()
}

fn pdf_error(e: impl std::fmt::Display) -> ScribeError {
    ScribeError::Serialization(format!("Failed to write PDF: {}", e))
}

/// Encode text for the WinAnsi standard fonts.
///
/// Characters outside WinAnsi become `?`; control characters become spaces.
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            if c.is_control() {
                return b' ';
            }
            match c {
                '\u{20AC}' => 0x80,
                '\u{2026}' => 0x85,
                '\u{2018}' => 0x91,
                '\u{2019}' => 0x92,
                '\u{201C}' => 0x93,
                '\u{201D}' => 0x94,
                '\u{2022}' => 0x95,
                '\u{2013}' => 0x96,
                '\u{2014}' => 0x97,
                '\u{2122}' => 0x99,
                ' '..='~' => c as u8,
                '\u{A0}'..='\u{FF}' => c as u32 as u8,
                _ => b'?',
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Text operands of every `Tj` on the first page, decoded by `lopdf`.
    fn page_texts(pdf: &[u8]) -> Vec<Vec<u8>> {
        let doc = Document::load_mem(pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    fn sample_pdf() -> Vec<u8> {
        let navy = Rgb::new(0.13, 0.27, 0.53);
        let mut canvas = PdfCanvas::a4().with_title("Test (draft)");
        canvas.fill_rect(Rect::new(0.0, 750.0, A4_WIDTH, 90.0), navy);
        canvas.rounded_rect(Rect::new(36.0, 500.0, 200.0, 100.0), 8.0, Rgb::WHITE, navy);
        canvas.text(40.0, 520.0, Font::Bold, 12.0, navy, "Hello \u{2014} (world)");
        canvas.line((36.0, 60.0), (559.28, 60.0), 0.5, navy);
        canvas.finish().unwrap()
    }

    #[test]
    fn test_output_is_a_single_page_pdf() {
        let pdf = sample_pdf();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        let texts = page_texts(&pdf);
        assert_eq!(texts, vec![b"Hello \x97 (world)".to_vec()]);
    }

    #[test]
    fn test_title_in_info_dictionary() {
        let pdf = sample_pdf();
        let doc = Document::load_mem(&pdf).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        match info.get(b"Title").unwrap() {
            Object::String(bytes, _) => assert_eq!(bytes.as_slice(), b"Test (draft)"),
            other => panic!("unexpected title {:?}", other),
        }
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(win_ansi_bytes("\u{2014}"), vec![0x97]);
        assert_eq!(win_ansi_bytes("caf\u{e9}"), b"caf\xe9".to_vec());
        assert_eq!(win_ansi_bytes("line\nbreak"), b"line break".to_vec());
        assert_eq!(win_ansi_bytes("\u{4e2d}"), b"?".to_vec());
    }

    #[test]
    fn test_rounded_rect_radius_is_clamped() {
        let mut canvas = PdfCanvas::new(100.0, 100.0);
        canvas.rounded_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 50.0, Rgb::WHITE, Rgb::WHITE);
        // Radius clamps to 5, so the path starts at the bottom edge midpoint.
        let start = canvas
            .operations
            .iter()
            .find(|op| op.operator == "m")
            .unwrap();
        assert_eq!(
            format!("{:?}", start.operands),
            format!("{:?}", vec![real(5.0), real(0.0)])
        );
        assert_eq!(canvas.operations.last().unwrap().operator, "B");
    }
}
