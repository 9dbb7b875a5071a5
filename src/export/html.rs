//! HTML report for the browser panel.
//!
//! Inline-styled so the panel needs no stylesheet of its own. The
//! per-record AI highlights are produced by the caller (best-effort,
//! placeholder on failure) so this module stays synchronous and pure.

use chrono::{DateTime, Utc};

use crate::report::REPORT_TITLE;
use crate::types::EnrichedRecord;
use crate::util::escape_html;

fn priority_color(code: &str) -> &'static str {
    match code {
        "1" => "#ff2a2a",
        "2" => "#ffaa00",
        "3" => "#00f3ff",
        _ => "#888",
    }
}

/// Render the portfolio panel. `highlights` holds one AI comment per
/// record, aligned by index with `records`.
pub fn build_portfolio_html(
    records: &[EnrichedRecord],
    highlights: &[String],
    now: DateTime<Utc>,
) -> String {
    let now_str = now.format("%Y-%m-%d %H:%M");
    let p1_count = records
        .iter()
        .filter(|e| e.record.priority.code() == "1")
        .count();
    let breached_count = records.iter().filter(|e| e.sla_breached).count();

    let mut html = format!(
        r#"<div style="font-family: 'Rajdhani', sans-serif; color: #e0e0e0;">
  <div style="border-bottom: 2px solid #00f3ff; padding-bottom: 20px; margin-bottom: 30px;">
    <h1 style="color: #fcee0a; font-size: 32px; margin: 0; text-transform: uppercase; letter-spacing: 2px;">{title}</h1>
    <div style="display: flex; justify-content: space-between; margin-top: 10px; font-family: 'Roboto Mono', monospace; font-size: 12px; color: #00f3ff;">
      <span>GENERATED: {now}</span>
      <span>CONFIDENTIAL // INTERNAL USE ONLY</span>
    </div>
  </div>
  <div style="margin-bottom: 40px;">
    <h2 style="color: #ff00ff; border-left: 4px solid #ff00ff; padding-left: 15px; margin-bottom: 20px; text-transform: uppercase;">1. Portfolio Dashboard</h2>
    <div style="display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px;">
      <div style="background: rgba(0, 243, 255, 0.05); border: 1px solid #00f3ff; padding: 20px;">
        <div style="font-size: 12px; color: #888899; text-transform: uppercase;">Active Projects</div>
        <div style="font-size: 36px; color: #fff; font-weight: bold;">{total}</div>
      </div>
      <div style="background: rgba(255, 42, 42, 0.05); border: 1px solid #ff2a2a; padding: 20px;">
        <div style="font-size: 12px; color: #888899; text-transform: uppercase;">Priority 1 (Critical)</div>
        <div style="font-size: 36px; color: #ff2a2a; font-weight: bold;">{p1}</div>
      </div>
      <div style="background: rgba(252, 238, 10, 0.05); border: 1px solid #fcee0a; padding: 20px;">
        <div style="font-size: 12px; color: #888899; text-transform: uppercase;">SLA Breached</div>
        <div style="font-size: 36px; color: #fcee0a; font-weight: bold;">{breached}</div>
      </div>
    </div>
  </div>
  <div>
    <h2 style="color: #00f3ff; border-left: 4px solid #00f3ff; padding-left: 15px; margin-bottom: 20px; text-transform: uppercase;">2. Project Details</h2>
"#,
        title = REPORT_TITLE,
        now = now_str,
        total = records.len(),
        p1 = p1_count,
        breached = breached_count,
    );

    for (i, e) in records.iter().enumerate() {
        let r = &e.record;
        let color = priority_color(r.priority.code());
        let owner = if r.current_owner.is_empty() {
            "Unassigned"
        } else {
            r.current_owner.as_str()
        };
        let (last_date, last_note) = match r.notes.last() {
            Some(note) => (note.date.as_str(), note.text.as_str()),
            None => ("N/A", "No notes available."),
        };
        let highlight = highlights.get(i).map(String::as_str).unwrap_or_default();

        html.push_str(&format!(
            r#"    <div style="background: rgba(10, 10, 15, 0.8); border: 1px solid #333; margin-bottom: 20px; padding: 20px; position: relative;">
      <div style="position: absolute; top: 0; left: 0; width: 4px; height: 100%; background: {color};"></div>
      <div style="display: flex; justify-content: space-between; align-items: flex-start; margin-bottom: 15px; padding-left: 15px;">
        <div>
          <h3 style="margin: 0; font-size: 18px; color: #fff;">{name}</h3>
          <div style="font-family: 'Roboto Mono', monospace; font-size: 11px; color: #888899; margin-top: 4px;">ID: {id} | OWNER: {owner}</div>
        </div>
        <div style="text-align: right;">
          <span style="color: {color}; padding: 4px 8px; border: 1px solid {color}; font-size: 10px; font-family: 'Roboto Mono', monospace;">P{priority}</span>
        </div>
      </div>
      <div style="display: grid; grid-template-columns: 1fr 1fr; gap: 15px; margin-bottom: 15px; padding-left: 15px; font-family: 'Roboto Mono', monospace; font-size: 12px;">
        <div><span style="color: #00f3ff;">STATUS:</span> {status}</div>
        <div><span style="color: #00f3ff;">WORKFLOW:</span> {workflow}</div>
      </div>
      <div style="background: rgba(0, 0, 0, 0.3); padding: 15px; border-left: 2px solid #555; margin-left: 15px;">
        <div style="font-family: 'Roboto Mono', monospace; font-size: 10px; color: #00f3ff; margin-bottom: 5px;">LATEST UPDATE [{last_date}]</div>
        <div style="font-size: 13px; line-height: 1.5; color: #ccc; margin-bottom: 15px;">{last_note}</div>
        <div style="border-top: 1px dashed #333; padding-top: 10px; margin-top: 10px;">
          <div style="font-family: 'Roboto Mono', monospace; font-size: 10px; color: #fcee0a; margin-bottom: 5px; text-transform: uppercase;">AI Insight // Project Summary</div>
          <div style="font-size: 13px; line-height: 1.4; color: #e0e0e0; font-style: italic;">"{highlight}"</div>
        </div>
      </div>
    </div>
"#,
            color = color,
            name = escape_html(&r.name),
            id = escape_html(&r.id),
            owner = escape_html(owner),
            priority = r.priority.code(),
            status = escape_html(&r.status),
            workflow = escape_html(&r.workflow_status),
            last_date = escape_html(last_date),
            last_note = escape_html(last_note),
            highlight = escape_html(highlight),
        ));
    }

    html.push_str(
        r#"    <div style="margin-top: 50px; border-top: 1px solid #333; padding-top: 20px; text-align: center; font-family: 'Roboto Mono', monospace; font-size: 10px; color: #555;">END OF REPORT</div>
  </div>
</div>
"#,
    );

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::enrich;
    use crate::types::{Note, ProjectRecord};

    fn enriched(name: &str) -> EnrichedRecord {
        let record = ProjectRecord {
            id: "dem_1".into(),
            name: name.to_string(),
            ..Default::default()
        };
        enrich(&record, Utc::now())
    }

    #[test]
    fn test_html_escapes_record_fields() {
        let e = enriched("<script>alert(1)</script>");
        let html = build_portfolio_html(&[e], &["ok".into()], Utc::now());
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_html_contains_dashboard_counts_and_highlight() {
        let mut e = enriched("Migration X");
        e.record.notes.push(Note {
            text: "go-live scheduled".into(),
            date: "2026-02-01 09:00".into(),
        });
        e.sla_breached = true;

        let html = build_portfolio_html(&[e], &["On track.".into()], Utc::now());
        assert!(html.contains(REPORT_TITLE));
        assert!(html.contains("go-live scheduled"));
        assert!(html.contains("On track."));
        assert!(html.contains("SLA Breached"));
    }
}
