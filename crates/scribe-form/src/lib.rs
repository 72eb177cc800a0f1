//! Structured form records derived from interview transcripts.
//!
//! The field extractor projects user turns onto a fixed set of form
//! fields; the renderer lays a record out as a one-page PDF summary.

pub mod canvas;
pub mod extract;
pub mod record;
pub mod render;

pub use canvas::{Canvas, Font, PdfCanvas, Rect, Rgb};
pub use extract::{ExtractionRule, FieldExtractor, Target};
pub use record::{FormField, FormRecord};
pub use render::{DocumentRenderer, PLACEHOLDER};
