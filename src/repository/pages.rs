//! Page record operations.

use rusqlite::{params, Row};

use super::{parse_datetime, Repository, Result};
use crate::models::Page;

fn row_to_page(row: &Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        document_id: row.get("document_id")?,
        page_number: row.get::<_, i64>("page_number")? as u32,
        text: row.get("text")?,
        confidence: row.get("confidence")?,
        file_location: row.get("file_location")?,
        updated_at: parse_datetime(&row.get::<_, String>("updated_at")?),
    })
}

impl Repository {
    /// Write a page record, overwriting any prior record for the same
    /// `(document_id, page_number)`. Finalize retries therefore update
    /// in place rather than duplicating.
    pub fn upsert_page(&self, page: &Page) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO pages (document_id, page_number, text, confidence, file_location, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (document_id, page_number) DO UPDATE SET
                text = excluded.text,
                confidence = excluded.confidence,
                file_location = excluded.file_location,
                updated_at = excluded.updated_at",
            params![
                page.document_id,
                page.page_number,
                page.text,
                page.confidence,
                page.file_location,
                page.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Read one batch of a document's pages in page order, starting
    /// after the continuation key. Returns the batch and the key for
    /// the next call, or `None` when the range is exhausted.
    pub fn pages_for_document(
        &self,
        document_id: &str,
        after: Option<u32>,
        limit: usize,
    ) -> Result<(Vec<Page>, Option<u32>)> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM pages
             WHERE document_id = ?1 AND page_number > ?2
             ORDER BY page_number
             LIMIT ?3",
        )?;

        let pages = stmt
            .query_map(
                params![document_id, after.unwrap_or(0), limit as i64],
                row_to_page,
            )?
            .collect::<std::result::Result<Vec<Page>, _>>()?;

        let next = if pages.len() == limit {
            pages.last().map(|p| p.page_number)
        } else {
            None
        };
        Ok((pages, next))
    }

    /// Count pages stored for a document.
    pub fn count_pages(&self, document_id: &str) -> Result<u64> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE document_id = ?1",
            params![document_id],
            |row| Ok(row.get::<_, i64>(0)? as u64),
        )
    }
}
