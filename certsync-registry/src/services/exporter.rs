//! Registry export
//!
//! Serializes the current (filtered) certificate listing to a
//! semicolon-delimited file for operators. Read-only: the export column
//! set is human-facing and intentionally differs from the import layout,
//! so there is no re-import guarantee.

use certsync_common::dates::format_export_date;
use certsync_common::{Error, Result};
use sqlx::SqlitePool;

use crate::db::certificates::{self, CertificateFilter};
use crate::db::DirectoryReader;
use crate::models::IssuedCertificate;

const EXPORT_HEADERS: [&str; 12] = [
    "ФИО",
    "Организация",
    "ИНН организации",
    "Номер удостоверения",
    "Программа обучения",
    "Категория",
    "Номер протокола",
    "Дата протокола",
    "Дата выдачи",
    "Срок действия",
    "Область аттестации",
    "Статус",
];

/// Export the filtered certificate listing as delimited text
pub async fn export_certificates(
    pool: &SqlitePool,
    directory: &DirectoryReader,
    filter: &CertificateFilter,
) -> Result<String> {
    let listing = certificates::list_certificates(pool, filter).await?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());

    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| Error::Internal(format!("Export serialization failed: {}", e)))?;

    for cert in &listing {
        let (org_name, org_inn) = resolve_organization(directory, cert).await?;

        writer
            .write_record([
                cert.personnel_name.as_str(),
                org_name.as_str(),
                org_inn.as_str(),
                cert.certificate_number.as_str(),
                cert.program_name.as_str(),
                cert.category.label(),
                cert.protocol_number.as_str(),
                cert.protocol_date
                    .map(format_export_date)
                    .unwrap_or_default()
                    .as_str(),
                format_export_date(cert.issue_date).as_str(),
                format_export_date(cert.expiry_date).as_str(),
                cert.area.as_str(),
                cert.status.label(),
            ])
            .map_err(|e| Error::Internal(format!("Export serialization failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Export serialization failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("Export is not UTF-8: {}", e)))
}

/// Resolve the display organization for a certificate row
///
/// The holder's directory membership wins; the certificate's own
/// organization reference is the fallback for holders minted by bulk
/// import who are not in the directory.
async fn resolve_organization(
    directory: &DirectoryReader,
    cert: &IssuedCertificate,
) -> Result<(String, String)> {
    if let Some(person) = directory.load_person(cert.personnel_id).await? {
        if let Some(org_id) = person.organization_id {
            if let Some(org) = directory.load_organization(org_id).await? {
                return Ok((org.name, org.inn));
            }
        }
    }

    if let Some(org_id) = cert.organization_id {
        if let Some(org) = directory.load_organization(org_id).await? {
            return Ok((org.name, org.inn));
        }
    }

    Ok(("Не указана".to_string(), String::new()))
}
