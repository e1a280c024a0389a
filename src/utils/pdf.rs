//! Renders plain line items into a paginated A4 PDF.

use printpdf::{BuiltinFont, Mm, PdfDocument};
use thiserror::Error;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const LEFT_MARGIN_MM: f32 = 10.0;
const TOP_MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 10.0;
const LINES_PER_PAGE: usize = 27;

#[derive(Debug, Error)]
#[error("failed to render document: {0}")]
pub struct RenderError(String);

impl From<printpdf::Error> for RenderError {
    fn from(e: printpdf::Error) -> Self {
        RenderError(e.to_string())
    }
}

/// Number of pages `line_count` lines occupy; an empty document still has one.
fn page_count(line_count: usize) -> usize {
    line_count.div_ceil(LINES_PER_PAGE).max(1)
}

pub fn render_lines(title: &str, font_size: f32, lines: &[String]) -> Result<Vec<u8>, RenderError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    for index in 0..page_count(lines.len()) {
        let start = index * LINES_PER_PAGE;
        let chunk = &lines[start..lines.len().min(start + LINES_PER_PAGE)];
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Layer {}", index + 1),
            )
        };
        let layer = doc.get_page(page).get_layer(layer);

        for (row, line) in chunk.iter().enumerate() {
            let y = PAGE_HEIGHT_MM - TOP_MARGIN_MM - LINE_HEIGHT_MM * row as f32;
            layer.use_text(line.as_str(), font_size, Mm(LEFT_MARGIN_MM), Mm(y), &font);
        }
    }

    Ok(doc.save_to_bytes()?)
}
