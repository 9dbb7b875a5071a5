//! Derived-field computation.
//!
//! Enrichment is a pure transform over a stored record: it never writes
//! anything back, so callers can run it on every read without worrying
//! about feedback loops. All the time-dependent fields take `now` as a
//! parameter to keep the function deterministic under test.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::types::{EnrichedRecord, ProjectRecord};

/// Idle window after which a record counts as SLA breached. The
/// boundary is inclusive: exactly this many days idle is a breach.
pub const SLA_BREACH_DAYS: i64 = 5;

/// Strip a duplicated leading timestamp bracket from raw note text so
/// re-imported or pasted notes never render a doubled `[date] —` prefix.
pub fn clean_note_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        if let Some(idx) = trimmed.find("] — ") {
            return trimmed[idx + "] — ".len()..].trim_start().to_string();
        }
    }
    trimmed.to_string()
}

pub fn format_note(date: &str, text: &str) -> String {
    format!("[{}] — {}", date, text)
}

/// Parse a stored timestamp. Accepts RFC 3339, naive ISO (what earlier
/// deployments wrote, no offset), and bare dates.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn duration_days(record: &ProjectRecord, now: DateTime<Utc>) -> Option<i64> {
    let start = parse_timestamp(&record.start_date)?;
    Some((now - start).num_days())
}

fn sla_breached(record: &ProjectRecord, now: DateTime<Utc>) -> bool {
    let reference = if record.updated_at.trim().is_empty() {
        &record.created_at
    } else {
        &record.updated_at
    };
    // Unparsable timestamps read as not breached.
    match parse_timestamp(reference) {
        Some(ts) => now - ts >= TimeDelta::days(SLA_BREACH_DAYS),
        None => false,
    }
}

/// Compute the derived view of a record. Note text is re-cleaned and
/// storage-era defaults re-asserted, so enriching an already enriched
/// record changes nothing.
pub fn enrich(record: &ProjectRecord, now: DateTime<Utc>) -> EnrichedRecord {
    let mut record = record.clone();

    for note in &mut record.notes {
        note.text = clean_note_text(&note.text);
    }
    if record.status.trim().is_empty() {
        record.status = "Idea".to_string();
    }
    if record.workflow_status.trim().is_empty() {
        record.workflow_status = "Intake".to_string();
    }

    let last_note = record
        .notes
        .last()
        .map(|n| format_note(&n.date, &n.text))
        .unwrap_or_default();

    EnrichedRecord {
        duration_days: duration_days(&record, now),
        last_note,
        sla_breached: sla_breached(&record, now),
        record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Note;
    use chrono::TimeZone;

    fn record() -> ProjectRecord {
        ProjectRecord {
            id: "dem_1".into(),
            name: "Test".into(),
            created_at: "2026-01-01T00:00:00+00:00".into(),
            updated_at: "2026-01-01T00:00:00+00:00".into(),
            ..Default::default()
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_clean_note_text_strips_duplicate_prefix() {
        assert_eq!(clean_note_text("[2026-01-01 10:00] — hello"), "hello");
        assert_eq!(clean_note_text("plain note"), "plain note");
        // bracket without the separator is left alone
        assert_eq!(clean_note_text("[draft] idea"), "[draft] idea");
    }

    #[test]
    fn test_parse_timestamp_accepts_naive_iso() {
        assert!(parse_timestamp("2024-01-05T09:30:00.123456").is_some());
        assert!(parse_timestamp("2024-01-05").is_some());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_duration_days_from_start_date() {
        let mut r = record();
        r.start_date = "2024-01-01".into();
        let e = enrich(&r, at("2024-01-11T12:00:00+00:00"));
        assert_eq!(e.duration_days, Some(10));
    }

    #[test]
    fn test_duration_days_none_without_start_date() {
        let e = enrich(&record(), Utc::now());
        assert_eq!(e.duration_days, None);

        let mut r = record();
        r.start_date = "soonish".into();
        assert_eq!(enrich(&r, Utc::now()).duration_days, None);
    }

    #[test]
    fn test_sla_boundary_is_inclusive() {
        let r = record();
        let updated = at("2026-01-01T00:00:00+00:00");

        let just_under = updated + TimeDelta::days(5) - TimeDelta::seconds(1);
        assert!(!enrich(&r, just_under).sla_breached);

        let exactly = updated + TimeDelta::days(5);
        assert!(enrich(&r, exactly).sla_breached);

        let over = updated + TimeDelta::days(9);
        assert!(enrich(&r, over).sla_breached);
    }

    #[test]
    fn test_sla_falls_back_to_created_at() {
        let mut r = record();
        r.updated_at = String::new();
        let e = enrich(&r, at("2026-02-01T00:00:00+00:00"));
        assert!(e.sla_breached);
    }

    #[test]
    fn test_sla_unparsable_timestamp_reads_not_breached() {
        let mut r = record();
        r.updated_at = "garbage".into();
        r.created_at = "also garbage".into();
        assert!(!enrich(&r, Utc::now()).sla_breached);
    }

    #[test]
    fn test_last_note_formats_final_entry() {
        let mut r = record();
        assert_eq!(enrich(&r, Utc::now()).last_note, "");

        r.notes.push(Note {
            text: "hello".into(),
            date: "2026-01-02 09:15".into(),
        });
        assert_eq!(
            enrich(&r, Utc::now()).last_note,
            "[2026-01-02 09:15] — hello"
        );
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let mut r = record();
        r.start_date = "2025-12-01".into();
        r.notes.push(Note {
            text: "[2026-01-02 09:15] — doubled prefix".into(),
            date: "2026-01-02 09:15".into(),
        });

        let now = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let once = enrich(&r, now);
        let twice = enrich(&once.record, now);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_defaults_reasserted() {
        let mut r = record();
        r.status = "  ".into();
        r.workflow_status = String::new();
        let e = enrich(&r, Utc::now());
        assert_eq!(e.record.status, "Idea");
        assert_eq!(e.record.workflow_status, "Intake");
    }
}
