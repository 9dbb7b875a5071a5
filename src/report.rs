//! Portfolio report builder.
//!
//! Produces the fixed two-section text report consumed verbatim by the
//! TXT export and the UI panel, and re-used (field by field) by the
//! structured exporters. Callers pass active records only; archived
//! ones are filtered before this layer.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::enrich::format_note;
use crate::types::{EnrichedRecord, Priority};

pub const SEPARATOR_WIDTH: usize = 78;
pub const EMPTY_PORTFOLIO_SENTENCE: &str = "There are currently no DEM projects registered.";
pub const REPORT_TITLE: &str = "DEM Portfolio Status Report";

/// Aggregated counts over the active portfolio. Shared by the text
/// report and the DOCX/PDF dashboard pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioStats {
    pub total: usize,
    pub by_priority: [usize; 4],
    pub sla_ok: usize,
    pub sla_breached: usize,
    /// Up to three most frequent status values, most frequent first.
    pub top_statuses: Vec<(String, usize)>,
}

impl PortfolioStats {
    pub fn collect(records: &[EnrichedRecord]) -> Self {
        let mut stats = PortfolioStats {
            total: records.len(),
            ..Default::default()
        };
        let mut status_counts: HashMap<&str, usize> = HashMap::new();

        for e in records {
            match e.record.priority {
                Priority::P1 => stats.by_priority[0] += 1,
                Priority::P2 => stats.by_priority[1] += 1,
                Priority::P3 => stats.by_priority[2] += 1,
                Priority::P4 => stats.by_priority[3] += 1,
            }
            if e.sla_breached {
                stats.sla_breached += 1;
            } else {
                stats.sla_ok += 1;
            }
            let status = if e.record.status.is_empty() {
                "N/A"
            } else {
                e.record.status.as_str()
            };
            *status_counts.entry(status).or_insert(0) += 1;
        }

        let mut sorted: Vec<(String, usize)> = status_counts
            .into_iter()
            .map(|(s, n)| (s.to_string(), n))
            .collect();
        // count desc, then name for a stable order under ties
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sorted.truncate(3);
        stats.top_statuses = sorted;

        stats
    }
}

fn sla_sentence(breached: bool) -> &'static str {
    if breached {
        "SLA Breached — project requires immediate follow-up with Sponsor and IT lead."
    } else {
        "SLA OK — project updated within acceptable window."
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

fn duration_label(duration: Option<i64>) -> String {
    match duration {
        Some(d) => d.to_string(),
        None => "N/A".to_string(),
    }
}

/// Render the full portfolio report. An empty portfolio yields the
/// fixed single-sentence response, which callers treat as a valid
/// terminal state.
pub fn build_portfolio_text(records: &[EnrichedRecord], now: DateTime<Utc>) -> String {
    if records.is_empty() {
        return EMPTY_PORTFOLIO_SENTENCE.to_string();
    }

    let stats = PortfolioStats::collect(records);
    let separator = "-".repeat(SEPARATOR_WIDTH);

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("{} — {}", now.format("%B %d, %Y"), REPORT_TITLE));
    lines.push(String::new());
    lines.push("1. Projects Resume — Executive Overview".to_string());
    lines.push(String::new());

    lines.push("Key portfolio metrics for active DEM projects:".to_string());
    lines.push(format!("• Total active DEMs: {}", stats.total));
    lines.push("• Priority distribution:".to_string());
    for (priority, count) in Priority::ALL.iter().zip(stats.by_priority) {
        lines.push(format!("   – {}: {}", priority.label(), count));
    }
    lines.push(format!(
        "• SLA window (last 5 days): OK={} | Breached={}",
        stats.sla_ok, stats.sla_breached
    ));
    if !stats.top_statuses.is_empty() {
        let status_str = stats
            .top_statuses
            .iter()
            .map(|(name, count)| format!("{}: {}", name, count))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("• Most common DEM Status: {}", status_str));
    }

    lines.push(String::new());
    lines.push("Active DEM overview (project name + latest comment):".to_string());
    lines.push(String::new());

    for e in records {
        let latest = if e.last_note.is_empty() {
            "No recent notes registered."
        } else {
            e.last_note.as_str()
        };
        lines.push(format!(
            "• {} — Status: {} | Workflow: {} | Priority: P{}",
            or_dash(&e.record.name),
            or_dash(&e.record.status),
            or_dash(&e.record.workflow_status),
            e.record.priority.code()
        ));
        lines.push(format!("  Last update: {}", latest));
        lines.push(String::new());
    }

    lines.push(separator.clone());
    lines.push(String::new());
    lines.push(
        "The following pages contain a detailed section per DEM, including \
         Project Title, Sponsor, BA Owner, Workflow Status, SLA condition and \
         the most recent notes captured during project follow-up."
            .to_string(),
    );
    lines.push(String::new());
    lines.push(separator.clone());
    lines.push(String::new());
    lines.push("2. Projects Details".to_string());
    lines.push(String::new());

    for e in records {
        lines.extend(detail_block(e));
        lines.push(String::new());
        lines.push(separator.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// One record's detail lines, shared with the DOCX/PDF exporters.
pub fn detail_block(e: &EnrichedRecord) -> Vec<String> {
    let r = &e.record;
    let mut lines = vec![
        format!("DEM: {}", or_dash(&r.name)),
        format!("Project Title: {}", r.title),
        format!(
            "Sponsor: {} | Requester: {}",
            or_dash(&r.sponsor),
            or_dash(&r.requester)
        ),
        format!(
            "BA Owner: {} | Current Task Owner: {}",
            or_dash(&r.ba_owner),
            or_dash(&r.current_owner)
        ),
        format!("Cost Center: {}", or_dash(&r.cost_center)),
        format!(
            "Start Date: {} | Duration (days): {}",
            or_dash(&r.start_date),
            duration_label(e.duration_days)
        ),
        format!("DEM Status: {}", or_dash(&r.status)),
        format!("Workflow Status: {}", or_dash(&r.workflow_status)),
        format!("Priority (1–4): {}", r.priority.code()),
        format!("SLA Status: {}", sla_sentence(e.sla_breached)),
    ];

    if r.notes.is_empty() {
        lines.push("Last Notes: (no notes registered)".to_string());
    } else {
        lines.push("Last Notes (most recent entries):".to_string());
        let start = r.notes.len().saturating_sub(2);
        for note in &r.notes[start..] {
            lines.push(format!("- {}", format_note(&note.date, &note.text)));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::enrich;
    use crate::types::{Note, ProjectRecord};

    fn enriched(name: &str, priority: Priority, status: &str) -> EnrichedRecord {
        let record = ProjectRecord {
            id: format!("dem_{}", name),
            name: name.to_string(),
            status: status.to_string(),
            priority,
            created_at: "2026-01-01T00:00:00+00:00".into(),
            updated_at: "2026-01-01T00:00:00+00:00".into(),
            ..Default::default()
        };
        enrich(&record, Utc::now())
    }

    #[test]
    fn test_empty_portfolio_is_single_sentence() {
        let text = build_portfolio_text(&[], Utc::now());
        assert_eq!(text, EMPTY_PORTFOLIO_SENTENCE);
    }

    #[test]
    fn test_stats_counts_priorities_and_sla() {
        let records = vec![
            enriched("a", Priority::P1, "Build"),
            enriched("b", Priority::P2, "Build"),
            enriched("c", Priority::P2, "Idea"),
        ];
        let stats = PortfolioStats::collect(&records);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_priority, [1, 2, 0, 0]);
        assert_eq!(stats.sla_ok + stats.sla_breached, 3);
        assert_eq!(stats.top_statuses[0], ("Build".to_string(), 2));
    }

    #[test]
    fn test_top_statuses_keeps_three() {
        let records = vec![
            enriched("a", Priority::P2, "Idea"),
            enriched("b", Priority::P2, "Build"),
            enriched("c", Priority::P2, "Test"),
            enriched("d", Priority::P2, "Deploy"),
        ];
        let stats = PortfolioStats::collect(&records);
        assert_eq!(stats.top_statuses.len(), 3);
    }

    #[test]
    fn test_report_contains_one_detail_block_per_record() {
        let records = vec![
            enriched("Migration X", Priority::P1, "Build"),
            enriched("Rollout Y", Priority::P3, "Idea"),
        ];
        let text = build_portfolio_text(&records, Utc::now());
        assert_eq!(text.matches("DEM: ").count(), records.len());
        assert!(text.contains("1. Projects Resume — Executive Overview"));
        assert!(text.contains("2. Projects Details"));
        assert!(text.contains(REPORT_TITLE));
    }

    #[test]
    fn test_detail_block_sla_narratives() {
        let mut e = enriched("a", Priority::P2, "Build");

        e.sla_breached = false;
        let block = detail_block(&e).join("\n");
        assert!(block.contains("SLA OK — project updated within acceptable window."));

        e.sla_breached = true;
        let block = detail_block(&e).join("\n");
        assert!(block.contains("requires immediate follow-up"));
    }

    #[test]
    fn test_detail_block_shows_last_two_notes() {
        let mut e = enriched("a", Priority::P2, "Build");
        for i in 0..3 {
            e.record.notes.push(Note {
                text: format!("note {}", i),
                date: format!("2026-01-0{} 10:00", i + 1),
            });
        }
        let block = detail_block(&e).join("\n");
        assert!(!block.contains("note 0"));
        assert!(block.contains("note 1"));
        assert!(block.contains("note 2"));
    }
}
