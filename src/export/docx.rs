//! DOCX export.
//!
//! A DOCX file is a ZIP package with a fixed part layout; the document
//! body is assembled as escaped WordprocessingML rather than through an
//! XML writer, since the structure is a flat run of headings and
//! paragraphs.

use std::io::Write;

use chrono::{DateTime, Utc};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::export::{dashboard_lines, ExportError};
use crate::report::{detail_block, PortfolioStats, REPORT_TITLE};
use crate::types::EnrichedRecord;
use crate::util::escape_xml;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Half-point font sizes for the heading levels.
const TITLE_SIZE: u32 = 48;
const H1_SIZE: u32 = 32;
const H2_SIZE: u32 = 26;

fn paragraph(text: &str) -> String {
    format!(
        "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        escape_xml(text)
    )
}

fn heading(text: &str, half_points: u32) -> String {
    format!(
        "<w:p><w:r><w:rPr><w:b/><w:sz w:val=\"{}\"/></w:rPr>\
         <w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        half_points,
        escape_xml(text)
    )
}

fn document_xml(records: &[EnrichedRecord], now: DateTime<Utc>) -> String {
    let stats = PortfolioStats::collect(records);

    let mut body = String::new();
    body.push_str(&heading(REPORT_TITLE, TITLE_SIZE));
    body.push_str(&paragraph(&format!(
        "Generated on: {}",
        now.format("%Y-%m-%d %H:%M")
    )));

    body.push_str(&heading("1. Portfolio Dashboard", H1_SIZE));
    for line in dashboard_lines(&stats) {
        body.push_str(&paragraph(&line));
    }

    body.push_str(&heading("2. Project Details", H1_SIZE));
    for e in records {
        for (i, line) in detail_block(e).iter().enumerate() {
            if i == 0 {
                body.push_str(&heading(line, H2_SIZE));
            } else {
                body.push_str(&paragraph(line));
            }
        }
        body.push_str(&paragraph(""));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    )
}

/// Build the DOCX package in memory.
pub fn build_docx(records: &[EnrichedRecord], now: DateTime<Utc>) -> Result<Vec<u8>, ExportError> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file("[Content_Types].xml", options)?;
    writer.write_all(CONTENT_TYPES.as_bytes())?;

    writer.start_file("_rels/.rels", options)?;
    writer.write_all(ROOT_RELS.as_bytes())?;

    writer.start_file("word/document.xml", options)?;
    writer.write_all(document_xml(records, now).as_bytes())?;

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::enrich;
    use crate::types::ProjectRecord;

    fn enriched(name: &str) -> EnrichedRecord {
        let record = ProjectRecord {
            id: "dem_1".into(),
            name: name.to_string(),
            ..Default::default()
        };
        enrich(&record, Utc::now())
    }

    #[test]
    fn test_build_docx_is_zip_with_document_part() {
        let bytes = build_docx(&[enriched("Migration X")], Utc::now()).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("word/document.xml").is_ok());
        assert!(archive.by_name("[Content_Types].xml").is_ok());
    }

    #[test]
    fn test_document_xml_escapes_fields() {
        let xml = document_xml(&[enriched("A & B <Rollout>")], Utc::now());
        assert!(xml.contains("A &amp; B &lt;Rollout&gt;"));
        assert!(!xml.contains("<Rollout>"));
    }

    #[test]
    fn test_document_xml_has_dashboard_and_details() {
        let xml = document_xml(&[enriched("a"), enriched("b")], Utc::now());
        assert!(xml.contains("1. Portfolio Dashboard"));
        assert!(xml.contains("2. Project Details"));
        assert_eq!(xml.matches("DEM: ").count(), 2);
    }
}
