//! Record validator for bulk-import candidates
//!
//! Classifies each candidate row as accept/reject with the full list of
//! violated rules. The unit of failure is the row, never the batch: a file
//! with one bad row still yields every other row for commit.

use std::collections::HashSet;

use certsync_common::dates::parse_flexible_date;
use chrono::NaiveDate;

use crate::models::{CandidateRow, RowIssue, RowOutcome};

/// Validate one candidate against the field-level and semantic rules
///
/// Rules are applied independently; every violation is collected. The
/// intra-batch duplicate rule is applied separately in [`validate_rows`]
/// because it needs batch context.
pub fn check_row(candidate: &CandidateRow) -> Vec<RowIssue> {
    let mut issues = Vec::new();

    if candidate.holder_name.trim().is_empty() {
        issues.push(RowIssue::MissingHolderName);
    }
    if candidate.certificate_number.trim().is_empty() {
        issues.push(RowIssue::MissingCertificateNumber);
    }
    if candidate.protocol_number.trim().is_empty() {
        issues.push(RowIssue::MissingProtocolNumber);
    }

    let issue_date = check_date(
        &candidate.issue_date,
        RowIssue::MissingIssueDate,
        RowIssue::UnparseableIssueDate,
        &mut issues,
    );
    let expiry_date = check_date(
        &candidate.expiry_date,
        RowIssue::MissingExpiryDate,
        RowIssue::UnparseableExpiryDate,
        &mut issues,
    );

    if let (Some(issue), Some(expiry)) = (issue_date, expiry_date) {
        if expiry < issue {
            issues.push(RowIssue::ExpiryBeforeIssue);
        }
    }

    issues
}

/// Validate a whole batch, including intra-batch duplicate detection
///
/// A certificate number only counts as taken once a row carrying it has
/// been accepted; a rejected row does not block a later valid row with
/// the same number. Duplicate detection against the persistent store is
/// a separate, stricter check at commit time.
pub fn validate_rows(candidates: &[CandidateRow]) -> Vec<RowOutcome> {
    let mut accepted_numbers: HashSet<String> = HashSet::new();

    candidates
        .iter()
        .map(|candidate| {
            let mut issues = check_row(candidate);

            let number = candidate.certificate_number.trim();
            if !number.is_empty() && accepted_numbers.contains(number) {
                issues.push(RowIssue::DuplicateInBatch);
            }
            if issues.is_empty() {
                accepted_numbers.insert(number.to_string());
            }

            RowOutcome {
                candidate: candidate.clone(),
                issues,
            }
        })
        .collect()
}

fn check_date(
    raw: &str,
    missing: RowIssue,
    unparseable: RowIssue,
    issues: &mut Vec<RowIssue>,
) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        issues.push(missing);
        return None;
    }
    match parse_flexible_date(raw) {
        Some(date) => Some(date),
        None => {
            issues.push(unparseable);
            None
        }
    }
}
