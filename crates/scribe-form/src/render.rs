//! Fixed-layout document rendering for a `FormRecord`.

use scribe_core::error::ScribeError;
use tracing::debug;

use crate::canvas::{Canvas, Font, PdfCanvas, Rect, Rgb};
use crate::record::{FormField, FormRecord};

/// Drawn in place of an empty field value.
pub const PLACEHOLDER: &str = "\u{2014}";

const MARGIN: f32 = 36.0;
const HEADER_HEIGHT: f32 = 90.0;
const SECTION_HEIGHT: f32 = 118.0;
const SECTION_GAP: f32 = 14.0;
const SECTION_RADIUS: f32 = 8.0;
const ROW_HEIGHT: f32 = 40.0;
const MAX_VALUE_CHARS: usize = 42;

const NAVY: Rgb = Rgb::new(0.13, 0.27, 0.53);
const PANEL: Rgb = Rgb::new(0.96, 0.97, 0.99);
const BORDER: Rgb = Rgb::new(0.78, 0.82, 0.88);
const LABEL: Rgb = Rgb::new(0.42, 0.45, 0.5);
const INK: Rgb = Rgb::new(0.1, 0.1, 0.12);
const HEADER_SUB: Rgb = Rgb::new(0.85, 0.9, 1.0);

const FOOTER: &str = "This summary was generated from your interview answers. \
                      Review every field before submitting it to your benefits agency.";

/// Section titles and the fields they hold, top to bottom.
const SECTIONS: &[(&str, &[FormField])] = &[
    (
        "Applicant Information",
        &[
            FormField::FullName,
            FormField::DateOfBirth,
            FormField::SsnLast4,
            FormField::Citizenship,
        ],
    ),
    (
        "Contact & Residence",
        &[
            FormField::Phone,
            FormField::Address,
            FormField::State,
            FormField::Language,
        ],
    ),
    (
        "Household Members",
        &[
            FormField::HouseholdSize,
            FormField::Member1,
            FormField::Member2,
        ],
    ),
    (
        "Income & Expenses",
        &[
            FormField::Employment,
            FormField::Income,
            FormField::OtherIncome1,
            FormField::OtherIncome2,
        ],
    ),
    (
        "Housing & Assets",
        &[FormField::Rent, FormField::Utilities, FormField::Assets],
    ),
];

/// Lays a record out as a one-page summary document.
///
/// Every field has a fixed position; empty values are drawn as
/// [`PLACEHOLDER`]. Rendering does not modify the record.
pub struct DocumentRenderer {
    form_type: String,
    page_width: f32,
    page_height: f32,
}

impl DocumentRenderer {
    pub fn new(form_type: impl Into<String>) -> Self {
        let canvas = PdfCanvas::a4();
        let (page_width, page_height) = canvas.page_size();
        Self {
            form_type: form_type.into(),
            page_width,
            page_height,
        }
    }

    pub fn title(&self) -> String {
        format!("{} Benefits Application", self.form_type)
    }

    /// Render `record` to PDF bytes.
    pub fn render(&self, record: &FormRecord) -> Result<Vec<u8>, ScribeError> {
        let mut canvas = PdfCanvas::new(self.page_width, self.page_height).with_title(self.title());
        self.draw(record, &mut canvas);
        let bytes = canvas.finish()?;
        debug!(
            filled = record.filled_count(),
            "Rendered {} document ({} bytes)",
            self.form_type,
            bytes.len()
        );
        Ok(bytes)
    }

    /// Draw `record` onto any canvas.
    pub fn draw(&self, record: &FormRecord, canvas: &mut dyn Canvas) {
        let (width, height) = canvas.page_size();

        canvas.fill_rect(Rect::new(0.0, height - HEADER_HEIGHT, width, HEADER_HEIGHT), NAVY);
        canvas.text(MARGIN, height - 42.0, Font::Bold, 20.0, Rgb::WHITE, &self.title());
        canvas.text(
            MARGIN,
            height - 60.0,
            Font::Regular,
            10.0,
            HEADER_SUB,
            "Prepared from your CivicScribe interview",
        );
        canvas.text(
            MARGIN,
            height - 76.0,
            Font::Regular,
            9.0,
            HEADER_SUB,
            &format!(
                "{} of {} fields completed",
                record.filled_count(),
                FormField::COUNT
            ),
        );

        for (index, (title, fields)) in SECTIONS.iter().enumerate() {
            let rect = self.section_rect(index);
            canvas.rounded_rect(rect, SECTION_RADIUS, PANEL, BORDER);
            canvas.text(rect.x + 16.0, rect.top() - 22.0, Font::Bold, 12.0, NAVY, title);
            canvas.line(
                (rect.x + 16.0, rect.top() - 30.0),
                (rect.x + rect.width - 16.0, rect.top() - 30.0),
                0.5,
                BORDER,
            );

            for (slot, field) in fields.iter().enumerate() {
                let (x, value_y) = self.slot_position(&rect, slot);
                canvas.text(x, value_y + 14.0, Font::Regular, 8.0, LABEL, field.label());
                let value = display_value(record.get(*field));
                canvas.text(x, value_y, Font::Regular, 11.0, INK, &value);
            }
        }

        canvas.line((MARGIN, 60.0), (width - MARGIN, 60.0), 0.5, BORDER);
        canvas.text(MARGIN, 40.0, Font::Regular, 8.0, LABEL, FOOTER);
    }

    /// Baseline position of a field's value.
    pub fn field_position(&self, field: FormField) -> Option<(f32, f32)> {
        SECTIONS.iter().enumerate().find_map(|(index, (_, fields))| {
            let slot = fields.iter().position(|f| *f == field)?;
            Some(self.slot_position(&self.section_rect(index), slot))
        })
    }

    fn section_rect(&self, index: usize) -> Rect {
        let first_top = self.page_height - HEADER_HEIGHT - 20.0;
        let top = first_top - index as f32 * (SECTION_HEIGHT + SECTION_GAP);
        Rect::new(
            MARGIN,
            top - SECTION_HEIGHT,
            self.page_width - 2.0 * MARGIN,
            SECTION_HEIGHT,
        )
    }

    fn slot_position(&self, rect: &Rect, slot: usize) -> (f32, f32) {
        let column = slot % 2;
        let row = slot / 2;
        let x = if column == 0 {
            rect.x + 16.0
        } else {
            rect.x + rect.width / 2.0 + 8.0
        };
        let label_y = rect.top() - 50.0 - row as f32 * ROW_HEIGHT;
        (x, label_y - 14.0)
    }
}

/// Empty values become the placeholder; long values are cut with "...".
fn display_value(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return PLACEHOLDER.to_string();
    }
    if value.chars().count() <= MAX_VALUE_CHARS {
        return value.to_string();
    }
    let cut: String = value.chars().take(MAX_VALUE_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}
