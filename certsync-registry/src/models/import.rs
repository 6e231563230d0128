//! Bulk-import candidate rows and validation outcomes

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One data row extracted from the bulk-import text, pre-validation
///
/// All fields are free text exactly as they appeared in the file (trimmed).
/// No identity or well-formedness guarantee at this stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRow {
    /// 1-based line number in the source file (header included in count)
    pub line_number: u64,
    pub holder_name: String,
    pub certificate_number: String,
    pub protocol_number: String,
    pub protocol_date: String,
    pub issue_date: String,
    pub expiry_date: String,
    pub area: String,
}

/// A single validation rule violation on one row
///
/// Rules are applied independently; a row carries every violation it has,
/// not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowIssue {
    #[error("Holder name is missing")]
    MissingHolderName,
    #[error("Certificate number is missing")]
    MissingCertificateNumber,
    #[error("Protocol number is missing")]
    MissingProtocolNumber,
    #[error("Issue date is missing")]
    MissingIssueDate,
    #[error("Issue date is not a recognizable date")]
    UnparseableIssueDate,
    #[error("Expiry date is missing")]
    MissingExpiryDate,
    #[error("Expiry date is not a recognizable date")]
    UnparseableExpiryDate,
    #[error("Expiry date is before issue date")]
    ExpiryBeforeIssue,
    #[error("Certificate number duplicates an earlier row in this batch")]
    DuplicateInBatch,
}

/// Validation verdict for one candidate row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowOutcome {
    pub candidate: CandidateRow,
    pub issues: Vec<RowIssue>,
}

impl RowOutcome {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Human-readable reasons, one per violated rule
    pub fn reasons(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.to_string()).collect()
    }
}

/// Result of parsing and validating a bulk-import payload
///
/// Shown to the operator as the preview: every surviving row with its
/// verdict, plus line accounting for rows the parser dropped outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
    pub rows: Vec<RowOutcome>,
    /// Non-empty data lines found after the header
    pub data_lines: usize,
    /// Malformed lines dropped by the parser (fewer than 7 fields);
    /// reported as a count discrepancy, not a validation failure
    pub skipped_rows: usize,
}

impl ImportPreview {
    pub fn valid_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.rows.len() - self.valid_count()
    }
}
