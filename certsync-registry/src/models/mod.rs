//! Domain models for the registry service

pub mod certificate;
pub mod import;
pub mod qualification;
pub mod sync;

pub use certificate::{CertificateDraft, CertificateStatus, IssuedCertificate, SafetyCategory};
pub use import::{CandidateRow, ImportPreview, RowIssue, RowOutcome};
pub use qualification::QualificationRecord;
pub use sync::{CommitOutcome, CommitRowFailure, SyncDisposition, SyncRecordOutcome, SyncReport};
