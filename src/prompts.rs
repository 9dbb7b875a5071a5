//! Prompt text for the AI features.
//!
//! Kept in one place so wording changes don't touch the client code.
//! Extracted document text is clipped to [`PROMPT_TEXT_LIMIT`] chars
//! before it goes into a prompt.

use crate::types::EnrichedRecord;
use crate::util::truncate_utf8;

pub const PROMPT_TEXT_LIMIT: usize = 8_000;

pub const HIGHLIGHT_SYSTEM: &str = "You are a helpful project manager assistant. Be concise.";

pub const PORTFOLIO_ADVISOR_SYSTEM: &str = "You are a Senior IT Strategic Advisor specializing in ERP platforms, Cloud Migrations, and Enterprise Architecture. \
Your goal is to provide a high-level executive summary and actionable strategic advice for the following portfolio of projects.\n\n\
Focus on providing REAL, USEFUL feedback:\n\
1. CRITICAL RISK ASSESSMENT: Identify projects at risk based on status, priority, and lack of recent updates.\n\
2. STRATEGIC ALIGNMENT: Suggest how these projects align with modern enterprise best practices.\n\
3. ACCELERATION OPPORTUNITIES: Where can we move faster? What blockers can be removed?\n\
4. TECHNICAL ADVICE: Use the Document Summaries to give specific technical recommendations.\n\n\
IMPORTANT: Output the report as valid HTML code with inline CSS for styling. \
The container already provides a dark background, so use transparent backgrounds. \
Format with <h2>, <h3>, <ul>, <li>, <p> tags. \
Do NOT include <html>, <head>, or <body> tags, just the content div.";

pub const SOLUTION_ARCHITECT_SYSTEM: &str = "You are an Expert Solution Architect. \
Analyze the following project request and provide a comprehensive solution analysis.\n\
Include:\n\
1. Problem Statement Analysis\n\
2. Proposed Solution Architecture (High Level)\n\
3. Key Technical Components (ERP modules, cloud services, etc.)\n\
4. Implementation Steps & Risks\n\n\
Use the Document Summary as the primary source of requirements.\n\n\
IMPORTANT: Output the report as valid HTML code with inline CSS for styling. \
The container already provides a dark background, so use transparent backgrounds. \
Format with <h2>, <h3>, <ul>, <li>, <p> tags. \
Do NOT include <html>, <head>, or <body> tags, just the content div.";

/// Context for the solution analysis of one record: name, title,
/// document summary, and the last five notes.
pub fn solution_analysis_prompt(record: &EnrichedRecord) -> String {
    let r = &record.record;
    let notes_text: Vec<&str> = r.notes.iter().rev().take(5).map(|n| n.text.as_str()).collect();
    let notes_text: Vec<&str> = notes_text.into_iter().rev().collect();
    let doc_summary = if r.doc_summary.is_empty() {
        "No document summary available."
    } else {
        r.doc_summary.as_str()
    };

    format!(
        "Project: {} - {}\nDocument Summary: {}\nRecent Notes: {}\n",
        r.name,
        r.title,
        doc_summary,
        notes_text.join("\n")
    )
}

/// One-sentence highlight for a single record, built from its name,
/// status, and the last three notes.
pub fn highlight_prompt(record: &EnrichedRecord) -> String {
    let notes_text: Vec<&str> = record
        .record
        .notes
        .iter()
        .rev()
        .take(3)
        .map(|n| n.text.as_str())
        .collect();
    let notes_text: Vec<&str> = notes_text.into_iter().rev().collect();

    format!(
        "Project: {}\nStatus: {}\nRecent Notes: {}\n\n\
         Write a single, very short sentence (max 15 words) highlighting \
         the most important thing about this project's current status or risk.",
        record.record.name,
        record.record.status,
        notes_text.join("\n")
    )
}

/// Bullet-point summary for a file uploaded from the chat page.
pub fn upload_summary_prompt(text: &str) -> String {
    format!(
        "Summarize the following document in a few bullet points, \
         highlighting key information useful for IT, business analysis \
         and project follow-up:\n\n{}",
        truncate_utf8(text, PROMPT_TEXT_LIMIT)
    )
}

/// Executive summary for a document attached to a record.
pub fn executive_summary_prompt(text: &str) -> String {
    format!(
        "Create an executive summary of the following document for a DEM \
         (Digital Enhancement Management) portfolio. \
         Focus on: business problem, scope, key requirements, risks, \
         dependencies, recommended IT solutions (for example ERP platforms \
         or other enterprise systems), and clear next actions. \
         Write in concise, professional English. \
         Do NOT mention that this text was generated by any AI model and \
         do not describe any internal technical process.\n\n{}",
        truncate_utf8(text, PROMPT_TEXT_LIMIT)
    )
}

/// Context block handed to the portfolio advisor, one stanza per record.
pub fn portfolio_context(records: &[EnrichedRecord]) -> String {
    let mut context = String::new();
    for e in records {
        let r = &e.record;
        let doc_summary = if r.doc_summary.is_empty() {
            "No document summary available."
        } else {
            r.doc_summary.as_str()
        };
        context.push_str(&format!("- Project: {} | Title: {}\n", r.name, r.title));
        context.push_str(&format!(
            "  Status: {} | Workflow: {} | Priority: {}\n",
            r.status,
            r.workflow_status,
            r.priority.code()
        ));
        context.push_str(&format!("  Document Summary: {}\n", doc_summary));
        context.push_str("  ---\n");
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::enrich;
    use crate::types::{Note, ProjectRecord};
    use chrono::Utc;

    #[test]
    fn test_highlight_prompt_uses_last_three_notes() {
        let mut record = ProjectRecord {
            name: "Migration X".into(),
            ..Default::default()
        };
        for i in 0..5 {
            record.notes.push(Note {
                text: format!("note {}", i),
                date: String::new(),
            });
        }
        let prompt = highlight_prompt(&enrich(&record, Utc::now()));
        assert!(!prompt.contains("note 1"));
        assert!(prompt.contains("note 2\nnote 3\nnote 4"));
    }

    #[test]
    fn test_solution_analysis_prompt_uses_last_five_notes() {
        let mut record = ProjectRecord {
            name: "Billing Hub".into(),
            title: "Invoice automation".into(),
            ..Default::default()
        };
        for i in 0..7 {
            record.notes.push(Note {
                text: format!("note {}", i),
                date: String::new(),
            });
        }
        let prompt = solution_analysis_prompt(&enrich(&record, Utc::now()));
        assert!(prompt.contains("Billing Hub - Invoice automation"));
        assert!(prompt.contains("No document summary available."));
        assert!(!prompt.contains("note 1"));
        assert!(prompt.contains("note 2\nnote 3\nnote 4\nnote 5\nnote 6"));
    }

    #[test]
    fn test_upload_prompt_clips_long_text() {
        let prompt = upload_summary_prompt(&"x".repeat(20_000));
        assert!(prompt.len() < 9_000);
    }
}
