//! Date parsing for credential fields
//!
//! Bulk-import files arrive with free-form date strings. Credential dates are
//! calendar dates only (no times, no timezone), so everything parses to
//! `chrono::NaiveDate`.

use chrono::NaiveDate;

/// Date formats accepted from import files and manual entry,
/// tried in order: ISO first, then the day-first form common in
/// operator-produced spreadsheets.
const ACCEPTED_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parse a free-form date string to a calendar date.
///
/// Returns `None` for empty input or input matching none of the
/// accepted formats.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Format a calendar date for human-readable export output (DD.MM.YYYY).
pub fn format_export_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}
