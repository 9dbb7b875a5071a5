//! Report export adapters.
//!
//! Each adapter consumes the enriched-record sequence (not the rendered
//! text report) and produces bytes of the target format in memory. The
//! TXT download is just [`crate::report::build_portfolio_text`] encoded
//! as UTF-8, so it has no adapter here.

pub mod docx;
pub mod html;
pub mod pdf;
pub mod xlsx;

use thiserror::Error;

use crate::report::PortfolioStats;
use crate::types::Priority;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("XLSX export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF export failed: {0}")]
    Pdf(String),

    #[error("DOCX export failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

const BAR_WIDTH: usize = 20;

/// Render one labeled bar of a text chart, scaled so the largest value
/// fills [`BAR_WIDTH`] characters. `#` is used as the fill because it
/// survives the WinAnsi encoding of the built-in PDF fonts.
fn bar_line(label: &str, value: usize, max: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        (value * BAR_WIDTH).div_ceil(max).min(BAR_WIDTH)
    };
    format!("{:<14} {:<width$} {}", label, "#".repeat(filled), value, width = BAR_WIDTH)
}

/// The dashboard rendered as text bar charts, shared by the DOCX and
/// PDF exporters.
pub(crate) fn dashboard_lines(stats: &PortfolioStats) -> Vec<String> {
    let mut lines = vec![format!("Active Projects: {}", stats.total), String::new()];

    lines.push("Priority Distribution".to_string());
    let max = stats.by_priority.iter().copied().max().unwrap_or(0);
    for (priority, count) in Priority::ALL.iter().zip(stats.by_priority) {
        lines.push(bar_line(priority.label(), count, max));
    }

    lines.push(String::new());
    lines.push("SLA Status".to_string());
    let max = stats.sla_ok.max(stats.sla_breached);
    lines.push(bar_line("OK", stats.sla_ok, max));
    lines.push(bar_line("Breached", stats.sla_breached, max));

    if !stats.top_statuses.is_empty() {
        lines.push(String::new());
        lines.push("Project Status".to_string());
        let max = stats.top_statuses.iter().map(|(_, n)| *n).max().unwrap_or(0);
        for (status, count) in &stats.top_statuses {
            lines.push(bar_line(status, *count, max));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_line_scaling() {
        let line = bar_line("P1 (Critical)", 4, 4);
        assert!(line.contains(&"#".repeat(BAR_WIDTH)));
        assert!(line.ends_with('4'));

        let line = bar_line("P2 (High)", 0, 4);
        assert!(!line.contains('#'));
    }

    #[test]
    fn test_bar_line_handles_empty_portfolio() {
        let line = bar_line("OK", 0, 0);
        assert!(line.ends_with('0'));
    }

    #[test]
    fn test_dashboard_lines_sections() {
        let stats = PortfolioStats {
            total: 3,
            by_priority: [1, 2, 0, 0],
            sla_ok: 2,
            sla_breached: 1,
            top_statuses: vec![("Build".into(), 2), ("Idea".into(), 1)],
        };
        let lines = dashboard_lines(&stats);
        let text = lines.join("\n");
        assert!(text.contains("Active Projects: 3"));
        assert!(text.contains("Priority Distribution"));
        assert!(text.contains("SLA Status"));
        assert!(text.contains("Project Status"));
    }
}
