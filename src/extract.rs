//! Text extraction from uploaded documents.
//!
//! Converts PDF, DOCX, XLSX, and PPTX uploads into plain text for the
//! summarization prompt. Anything else is read as text with a lossy
//! UTF-8 fallback, so a mislabeled upload still produces something
//! rather than an error.

use std::path::Path;

use thiserror::Error;

/// Maximum extracted text length (100KB). Keeps summarization prompts
/// bounded regardless of upload size.
const MAX_EXTRACT_BYTES: usize = 100_000;

/// Supported document formats, detected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFormat {
    /// .txt, .md, .csv, .tsv, .json, .log and the like
    PlainText,
    /// .pdf
    Pdf,
    /// .docx
    Docx,
    /// .xlsx, .xls, .xlsm, .ods
    Xlsx,
    /// .pptx
    Pptx,
    /// Everything else; read as text with lossy fallback.
    Unknown,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

/// Detect the document format from the file extension.
pub fn detect_format(path: &Path) -> SupportedFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "txt" | "md" | "markdown" | "csv" | "tsv" | "json" | "yaml" | "yml" | "log" | "xml"
        | "toml" => SupportedFormat::PlainText,
        "pdf" => SupportedFormat::Pdf,
        "docx" => SupportedFormat::Docx,
        "xlsx" | "xls" | "xlsm" | "ods" => SupportedFormat::Xlsx,
        "pptx" => SupportedFormat::Pptx,
        _ => SupportedFormat::Unknown,
    }
}

/// Extract text from a file, truncated to [`MAX_EXTRACT_BYTES`] at a
/// UTF-8 boundary.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let raw = match detect_format(path) {
        SupportedFormat::PlainText | SupportedFormat::Unknown => extract_plaintext(path)?,
        SupportedFormat::Pdf => extract_pdf(path)?,
        SupportedFormat::Docx => extract_docx(path)?,
        SupportedFormat::Xlsx => extract_xlsx(path)?,
        SupportedFormat::Pptx => extract_pptx(path)?,
    };

    Ok(truncate_text(&raw, MAX_EXTRACT_BYTES))
}

// ---------------------------------------------------------------------------
// Format-specific extractors
// ---------------------------------------------------------------------------

fn extract_plaintext(path: &Path) -> Result<String, ExtractError> {
    // Try UTF-8, fall back to lossy conversion
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(_) => {
            let bytes = std::fs::read(path)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    // pdf-extract can panic on malformed PDFs, so wrap in catch_unwind
    let path_buf = path.to_path_buf();
    let result = std::panic::catch_unwind(move || pdf_extract::extract_text(&path_buf));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::ExtractionFailed(format!("PDF: {}", e))),
        Err(_) => Err(ExtractError::ExtractionFailed(
            "PDF extraction panicked (malformed file)".to_string(),
        )),
    }
}

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    // DOCX = ZIP archive containing word/document.xml.
    // Walk <w:t> tags for text runs, <w:p> for paragraph breaks.
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ExtractError::ExtractionFailed(format!("DOCX zip: {}", e)))?;

    let doc = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::ExtractionFailed(format!("DOCX missing document.xml: {}", e)))?;

    let mut reader = quick_xml::Reader::from_reader(std::io::BufReader::new(doc));
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_text_tag = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_tag = true;
                }
            }
            Ok(quick_xml::events::Event::End(ref e)) => {
                let local = e.local_name();
                if local.as_ref() == b"t" {
                    in_text_tag = false;
                } else if local.as_ref() == b"p" && !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Text(ref e)) => {
                if in_text_tag {
                    if let Ok(s) = e.unescape() {
                        text.push_str(&s);
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::ExtractionFailed(format!("DOCX XML: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

fn extract_xlsx(path: &Path) -> Result<String, ExtractError> {
    use calamine::{open_workbook_auto, Reader};

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ExtractError::ExtractionFailed(format!("XLSX: {}", e)))?;

    let mut output = String::new();

    for sheet_name in workbook.sheet_names().to_vec() {
        if let Ok(range) = workbook.worksheet_range(&sheet_name) {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&format!("--- Sheet: {} ---\n", sheet_name));
            for row in range.rows() {
                let cells: Vec<String> = row.iter().map(cell_to_string).collect();
                output.push_str(&cells.join(" | "));
                output.push('\n');
            }
        }
    }

    Ok(output)
}

fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn extract_pptx(path: &Path) -> Result<String, ExtractError> {
    // PPTX = ZIP archive containing ppt/slides/slideN.xml.
    // Walk <a:t> tags for text runs, slide by slide.
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ExtractError::ExtractionFailed(format!("PPTX zip: {}", e)))?;

    let mut slide_names: Vec<String> = (0..archive.len())
        .filter_map(|i| {
            let name = archive.by_index(i).ok()?.name().to_string();
            if name.starts_with("ppt/slides/slide") && name.ends_with(".xml") {
                Some(name)
            } else {
                None
            }
        })
        .collect();
    slide_names.sort();

    let mut text = String::new();

    for (idx, slide_name) in slide_names.iter().enumerate() {
        let slide = archive.by_name(slide_name).map_err(|e| {
            ExtractError::ExtractionFailed(format!("PPTX slide {}: {}", slide_name, e))
        })?;

        if idx > 0 {
            text.push('\n');
        }
        text.push_str(&format!("--- Slide {} ---\n", idx + 1));

        let mut reader = quick_xml::Reader::from_reader(std::io::BufReader::new(slide));
        let mut buf = Vec::new();
        let mut in_text_tag = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"t" {
                        in_text_tag = true;
                    }
                }
                Ok(quick_xml::events::Event::End(ref e)) => {
                    if e.local_name().as_ref() == b"t" {
                        in_text_tag = false;
                    }
                }
                Ok(quick_xml::events::Event::Text(ref e)) => {
                    if in_text_tag {
                        if let Ok(s) = e.unescape() {
                            text.push_str(&s);
                            text.push(' ');
                        }
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(_) => break,
                _ => {}
            }
            buf.clear();
        }
    }

    Ok(text)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn truncate_text(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut result = crate::util::truncate_utf8(text, max_bytes).to_string();
    result.push_str("\n\n[... content truncated at 100KB ...]");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(Path::new("notes.txt")),
            SupportedFormat::PlainText
        );
        assert_eq!(detect_format(Path::new("brief.PDF")), SupportedFormat::Pdf);
        assert_eq!(detect_format(Path::new("req.docx")), SupportedFormat::Docx);
        assert_eq!(detect_format(Path::new("plan.xlsx")), SupportedFormat::Xlsx);
        assert_eq!(detect_format(Path::new("deck.pptx")), SupportedFormat::Pptx);
        assert_eq!(
            detect_format(Path::new("image.png")),
            SupportedFormat::Unknown
        );
        assert_eq!(
            detect_format(Path::new("no_extension")),
            SupportedFormat::Unknown
        );
    }

    #[test]
    fn test_extract_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::write(&path, "Hello, world!\nLine two.").unwrap();

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "Hello, world!\nLine two.");
    }

    #[test]
    fn test_unknown_format_falls_back_to_lossy_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [b'h', b'i', 0xFF, b'!']).unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.starts_with("hi"));
        assert!(text.ends_with('!'));
    }

    #[test]
    fn test_extract_docx_text_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.docx");

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer
            .write_all(
                br#"<?xml version="1.0"?><w:document xmlns:w="ns"><w:body>
                <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second.</w:t></w:r></w:p>
                </w:body></w:document>"#,
            )
            .unwrap();
        writer.finish().unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second."));
    }

    #[test]
    fn test_extract_pptx_slide_markers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (n, body) in [(1, "Kickoff"), (2, "Timeline")] {
            writer
                .start_file(
                    format!("ppt/slides/slide{}.xml", n),
                    SimpleFileOptions::default(),
                )
                .unwrap();
            writer
                .write_all(
                    format!(r#"<p:sld xmlns:a="ns"><a:t>{}</a:t></p:sld>"#, body).as_bytes(),
                )
                .unwrap();
        }
        writer.finish().unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.contains("--- Slide 1 ---"));
        assert!(text.contains("Kickoff"));
        assert!(text.contains("--- Slide 2 ---"));
        assert!(text.contains("Timeline"));
    }

    #[test]
    fn test_extract_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.txt");
        std::fs::write(&path, "x".repeat(150_000)).unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.len() < 150_000);
        assert!(text.contains("[... content truncated at 100KB ...]"));
    }
}
