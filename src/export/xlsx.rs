//! XLSX export: one row per record, fixed column order.

use rust_xlsxwriter::{Format, Workbook};

use crate::export::ExportError;
use crate::types::EnrichedRecord;

const HEADERS: [&str; 14] = [
    "ID",
    "Name",
    "Title",
    "Sponsor",
    "Requester",
    "BA Owner",
    "Cost Center",
    "Status",
    "Workflow Status",
    "Current Task Owner",
    "Start Date",
    "Duration Days",
    "SLA",
    "Last Note",
];

/// Build the spreadsheet in memory. `sheet_name` distinguishes the
/// active export from the archived one.
pub fn build_xlsx(records: &[EnrichedRecord], sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    let bold = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, e) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        let r = &e.record;

        sheet.write_string(row, 0, &r.id)?;
        sheet.write_string(row, 1, &r.name)?;
        sheet.write_string(row, 2, &r.title)?;
        sheet.write_string(row, 3, &r.sponsor)?;
        sheet.write_string(row, 4, &r.requester)?;
        sheet.write_string(row, 5, &r.ba_owner)?;
        sheet.write_string(row, 6, &r.cost_center)?;
        sheet.write_string(row, 7, &r.status)?;
        sheet.write_string(row, 8, &r.workflow_status)?;
        sheet.write_string(row, 9, &r.current_owner)?;
        sheet.write_string(row, 10, &r.start_date)?;
        if let Some(days) = e.duration_days {
            sheet.write_number(row, 11, days as f64)?;
        }
        sheet.write_string(row, 12, if e.sla_breached { "Breached" } else { "OK" })?;
        sheet.write_string(row, 13, &e.last_note)?;
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::enrich;
    use crate::types::ProjectRecord;
    use chrono::Utc;

    fn enriched(name: &str) -> EnrichedRecord {
        let record = ProjectRecord {
            id: format!("dem_{}", name),
            name: name.to_string(),
            start_date: "2024-01-01".into(),
            ..Default::default()
        };
        enrich(&record, Utc::now())
    }

    #[test]
    fn test_build_xlsx_produces_workbook_bytes() {
        let records = vec![enriched("a"), enriched("b")];
        let bytes = build_xlsx(&records, "Active DEMs").unwrap();
        // XLSX is a ZIP container, PK magic
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_build_xlsx_empty_portfolio() {
        let bytes = build_xlsx(&[], "Archived DEMs").unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_exported_rows_round_trip_through_calamine() {
        use calamine::Reader;

        let records = vec![enriched("Migration X")];
        let bytes = build_xlsx(&records, "Active DEMs").unwrap();

        let cursor = std::io::Cursor::new(bytes);
        let mut workbook = calamine::Xlsx::new(cursor).unwrap();
        let range = workbook.worksheet_range("Active DEMs").unwrap();

        let header: Vec<String> = range
            .rows()
            .next()
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(header, HEADERS);

        let first: Vec<String> = range
            .rows()
            .nth(1)
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(first[1], "Migration X");
        assert_eq!(first[12], "OK");
    }
}
