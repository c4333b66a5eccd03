//! Document record operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Repository, Result};
use crate::models::{Document, DocumentStatus};

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    let status_str: String = row.get("status")?;
    let status = DocumentStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown document status: {}", status_str).into(),
        )
    })?;

    Ok(Document {
        id: row.get("id")?,
        filename: row.get("filename")?,
        status,
        ocr_job_ref: row.get("ocr_job_ref")?,
        file_location: row.get("file_location")?,
        created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        updated_at: parse_datetime(&row.get::<_, String>("updated_at")?),
    })
}

impl Repository {
    /// Insert a new document record.
    pub fn insert_document(&self, doc: &Document) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO documents (id, filename, status, ocr_job_ref, file_location, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                doc.id,
                doc.filename,
                doc.status.as_str(),
                doc.ocr_job_ref,
                doc.file_location,
                doc.created_at.to_rfc3339(),
                doc.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a document by ID.
    pub fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM documents WHERE id = ?1")?;
        stmt.query_row(params![id], row_to_document).optional()
    }

    /// Conditionally advance a document's status.
    ///
    /// The update is applied only when it moves the lifecycle forward,
    /// and is compare-and-set against the status that was read, so two
    /// concurrent finalizers cannot interleave a backward write.
    /// Returns whether a row was updated; re-applying the current
    /// status is a successful no-op.
    pub fn advance_status(&self, id: &str, next: DocumentStatus) -> Result<bool> {
        let conn = self.connect()?;
        let current_str: String =
            conn.query_row("SELECT status FROM documents WHERE id = ?1", params![id], |row| {
                row.get(0)
            })?;
        let current = DocumentStatus::parse(&current_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown document status: {}", current_str).into(),
            )
        })?;

        if !current.can_advance(next) {
            return Ok(false);
        }

        let updated = conn.execute(
            "UPDATE documents SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![
                next.as_str(),
                chrono::Utc::now().to_rfc3339(),
                id,
                current.as_str(),
            ],
        )?;
        Ok(updated > 0)
    }

    /// Scan all documents currently in the given status.
    pub fn documents_with_status(&self, status: DocumentStatus) -> Result<Vec<Document>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT * FROM documents WHERE status = ?1 ORDER BY id")?;
        let docs = stmt
            .query_map(params![status.as_str()], row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(docs)
    }

    /// Count documents grouped by status, for operational reporting.
    pub fn count_by_status(&self) -> Result<Vec<(DocumentStatus, u64)>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM documents GROUP BY status ORDER BY status")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(s, n)| DocumentStatus::parse(&s).map(|status| (status, n)))
            .collect())
    }
}
