//! Bulk-import parser
//!
//! Turns a raw delimited-text payload into candidate rows. Pure: no store
//! or network access, so the same input always yields the same candidate
//! sequence and the parser is testable on its own.
//!
//! Expected layout: one header line, then one data row per line with
//! semicolon-separated fields in this order:
//! holder name; certificate number; protocol number; protocol date;
//! issue date; expiry date; attestation area.

use csv::ReaderBuilder;

use crate::models::CandidateRow;

/// Required column count for a data row
pub const IMPORT_COLUMN_COUNT: usize = 7;

/// Default field delimiter for import files
pub const DEFAULT_DELIMITER: u8 = b';';

/// Parse result: surviving candidates plus line accounting
///
/// Rows with fewer than the required columns never become candidates;
/// they are counted so the operator sees the discrepancy between lines
/// in the file and rows in the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedImport {
    pub candidates: Vec<CandidateRow>,
    /// Non-empty data lines after the header (candidates + skipped)
    pub data_lines: usize,
    /// Malformed lines silently dropped at this stage
    pub skipped_rows: usize,
}

/// Parse the raw import text into candidate rows
pub fn parse_bulk_text(text: &str, delimiter: u8) -> ParsedImport {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut candidates = Vec::new();
    let mut skipped_rows = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(_) => {
                // Unreadable line (e.g. broken quoting): parse-level loss
                skipped_rows += 1;
                continue;
            }
        };

        // A lone empty field is what an all-whitespace line parses to
        if record.len() == 1 && record.get(0).unwrap_or("").is_empty() {
            continue;
        }

        if record.len() < IMPORT_COLUMN_COUNT {
            skipped_rows += 1;
            continue;
        }

        let line_number = record
            .position()
            .map(|p| p.line())
            .unwrap_or(candidates.len() as u64 + 2);

        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        candidates.push(CandidateRow {
            line_number,
            holder_name: field(0),
            certificate_number: field(1),
            protocol_number: field(2),
            protocol_date: field(3),
            issue_date: field(4),
            expiry_date: field(5),
            area: field(6),
        });
    }

    let data_lines = candidates.len() + skipped_rows;
    ParsedImport {
        candidates,
        data_lines,
        skipped_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "ФИО;Номер удостоверения;Номер протокола;Дата протокола;Дата выдачи;Срок действия;Область аттестации\n";

    #[test]
    fn parses_well_formed_rows_in_order() {
        let text = format!(
            "{}Иванов И.И.;УД-2024-001;ПБ-123/2024;2024-01-15;2024-01-15;2029-01-15;А.1\n\
             Петров П.П.;УД-2024-002;ПБ-124/2024;2024-02-20;2024-02-20;2029-02-20;Б.3\n",
            HEADER
        );
        let parsed = parse_bulk_text(&text, DEFAULT_DELIMITER);

        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.skipped_rows, 0);
        assert_eq!(parsed.data_lines, 2);
        assert_eq!(parsed.candidates[0].holder_name, "Иванов И.И.");
        assert_eq!(parsed.candidates[0].certificate_number, "УД-2024-001");
        assert_eq!(parsed.candidates[1].area, "Б.3");
        assert_eq!(parsed.candidates[0].line_number, 2);
    }

    #[test]
    fn short_rows_are_skipped_and_counted() {
        let text = format!(
            "{}Иванов И.И.;УД-1;ПБ-1;2024-01-15;2024-01-15;2029-01-15;А.1\n\
             только-имя;УД-2\n\
             Петров П.П.;УД-3;ПБ-3;2024-01-15;2024-01-15;2029-01-15;А.1\n",
            HEADER
        );
        let parsed = parse_bulk_text(&text, DEFAULT_DELIMITER);

        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.skipped_rows, 1);
        assert_eq!(parsed.data_lines, 3);
    }

    #[test]
    fn empty_lines_are_ignored_entirely() {
        let text = format!(
            "{}\nИванов И.И.;УД-1;ПБ-1;2024-01-15;2024-01-15;2029-01-15;А.1\n\n   \n",
            HEADER
        );
        let parsed = parse_bulk_text(&text, DEFAULT_DELIMITER);

        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.skipped_rows, 0);
        assert_eq!(parsed.data_lines, 1);
    }

    #[test]
    fn fields_are_trimmed() {
        let text = format!(
            "{} Иванов И.И. ; УД-1 ;ПБ-1; 2024-01-15 ;2024-01-15;2029-01-15; А.1 \n",
            HEADER
        );
        let parsed = parse_bulk_text(&text, DEFAULT_DELIMITER);

        assert_eq!(parsed.candidates[0].holder_name, "Иванов И.И.");
        assert_eq!(parsed.candidates[0].certificate_number, "УД-1");
        assert_eq!(parsed.candidates[0].area, "А.1");
    }

    #[test]
    fn missing_trailing_fields_still_skip_the_row() {
        // Six fields: area column missing entirely
        let text = format!("{}Иванов И.И.;УД-1;ПБ-1;2024-01-15;2024-01-15;2029-01-15\n", HEADER);
        let parsed = parse_bulk_text(&text, DEFAULT_DELIMITER);

        assert_eq!(parsed.candidates.len(), 0);
        assert_eq!(parsed.skipped_rows, 1);
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = format!(
            "{}Иванов И.И.;УД-1;ПБ-1;2024-01-15;2024-01-15;2029-01-15;А.1\nкороткая строка\n",
            HEADER
        );
        let first = parse_bulk_text(&text, DEFAULT_DELIMITER);
        let second = parse_bulk_text(&text, DEFAULT_DELIMITER);
        assert_eq!(first, second);
    }

    #[test]
    fn alternate_delimiter_is_honored() {
        let text = "h1,h2,h3,h4,h5,h6,h7\nИванов,УД-1,ПБ-1,2024-01-15,2024-01-15,2029-01-15,А.1\n";
        let parsed = parse_bulk_text(text, b',');
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].certificate_number, "УД-1");
    }
}
