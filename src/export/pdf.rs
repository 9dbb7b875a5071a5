//! PDF export via printpdf.
//!
//! Lays text out line by line on A4 pages with a moving cursor,
//! breaking to a new page when the cursor reaches the bottom margin.
//! Built-in Helvetica only, so all chart content is plain text.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};

use crate::export::{dashboard_lines, ExportError};
use crate::report::{detail_block, PortfolioStats, REPORT_TITLE};
use crate::types::EnrichedRecord;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;

const TITLE_PT: f32 = 18.0;
const HEADING_PT: f32 = 13.0;
const BODY_PT: f32 = 10.0;

struct PageWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    layer: printpdf::PdfLayerReference,
    y: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            font,
            font_bold,
            layer,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        })
    }

    fn ensure_room(&mut self, line_height: f32) {
        if self.y - line_height < MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn line(&mut self, text: &str, size_pt: f32, bold: bool) {
        // ~0.5mm of leading over the nominal point height
        let line_height = size_pt * 0.42 + 1.5;
        self.ensure_room(line_height);
        self.y -= line_height;

        if !text.is_empty() {
            let font = if bold { &self.font_bold } else { &self.font };
            self.layer
                .use_text(text, size_pt, Mm(MARGIN_MM), Mm(self.y), font);
        }
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ExportError::Pdf(e.to_string()))
    }
}

/// Build the portfolio PDF in memory.
pub fn build_pdf(records: &[EnrichedRecord], now: DateTime<Utc>) -> Result<Vec<u8>, ExportError> {
    let stats = PortfolioStats::collect(records);
    let mut writer = PageWriter::new(REPORT_TITLE)?;

    writer.line(REPORT_TITLE, TITLE_PT, true);
    writer.line(
        &format!("Generated on: {}", now.format("%Y-%m-%d %H:%M")),
        BODY_PT,
        false,
    );
    writer.line("", BODY_PT, false);

    writer.line("1. Portfolio Dashboard", HEADING_PT, true);
    for line in dashboard_lines(&stats) {
        writer.line(&line, BODY_PT, false);
    }
    writer.line("", BODY_PT, false);

    writer.line("2. Project Details", HEADING_PT, true);
    for e in records {
        writer.line("", BODY_PT, false);
        for (i, line) in detail_block(e).iter().enumerate() {
            if i == 0 {
                writer.line(line, HEADING_PT - 1.0, true);
            } else {
                writer.line(line, BODY_PT, false);
            }
        }
    }

    writer.finish()
}
