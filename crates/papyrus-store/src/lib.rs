//! Papyrus Storage Layer
//!
//! Implements the DocumentStore trait on top of SQLite.
//!
//! # Architecture
//!
//! - One `documents` table keyed by `(collection, id)`
//! - Extraction results are stored as JSON text in `legal_initiatives`
//! - Listing order is insertion order (`rowid`), so batch runs are stable
//!
//! # Examples
//!
//! ```no_run
//! use papyrus_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for document operations
//! ```

#![warn(missing_docs)]

use papyrus_domain::traits::{DocumentQuery, DocumentStore};
use papyrus_domain::{Document, DocumentRef, ExtractionResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Document not found
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Extraction result could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

const DOCUMENT_COLUMNS: &str =
    "collection, id, contenido, url_pdf, url_html, fecha_publicacion, legal_initiatives";

/// SQLite-based implementation of DocumentStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store across tasks behind
/// a mutex, or give each thread its own SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use papyrus_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("papyrus.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Number of documents in a collection
    pub fn count_documents(&self, collection: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Names of all collections, sorted
    pub fn collections(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn decode_extraction(raw: Option<String>, column: usize) -> rusqlite::Result<Option<ExtractionResult>> {
        match raw {
            None => Ok(None),
            Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    column,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
        }
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let extraction = Self::decode_extraction(row.get(6)?, 6)?;
        Ok(Document {
            collection: row.get(0)?,
            id: row.get(1)?,
            body: row.get(2)?,
            pdf_url: row.get(3)?,
            html_url: row.get(4)?,
            published_on: row.get(5)?,
            extraction,
        })
    }
}

impl DocumentStore for SqliteStore {
    type Error = StoreError;

    fn get_document(&self, doc: &DocumentRef) -> Result<Option<Document>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM documents WHERE collection = ?1 AND id = ?2",
            DOCUMENT_COLUMNS
        );
        let document = self
            .conn
            .query_row(&sql, params![&doc.collection, &doc.id], Self::row_to_document)
            .optional()?;
        Ok(document)
    }

    fn find_documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRef>, Self::Error> {
        let mut sql = String::from("SELECT collection, id FROM documents WHERE collection = ?");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(query.collection.clone())];

        if let Some(from) = &query.published_from {
            sql.push_str(" AND fecha_publicacion >= ?");
            params.push(Box::new(from.clone()));
        }

        if let Some(to) = &query.published_to {
            sql.push_str(" AND fecha_publicacion <= ?");
            params.push(Box::new(to.clone()));
        }

        sql.push_str(" ORDER BY rowid");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let refs = stmt
            .query_map(&param_refs[..], |row| {
                Ok(DocumentRef {
                    collection: row.get(0)?,
                    id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(refs)
    }

    fn set_extraction(
        &mut self,
        doc: &DocumentRef,
        result: &ExtractionResult,
    ) -> Result<(), Self::Error> {
        let json = serde_json::to_string(result)?;
        let updated = self.conn.execute(
            "UPDATE documents
             SET legal_initiatives = ?3, extracted_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
             WHERE collection = ?1 AND id = ?2",
            params![&doc.collection, &doc.id, json],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(doc.to_string()));
        }
        Ok(())
    }

    fn extraction_results(&self, collection: &str) -> Result<Vec<ExtractionResult>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT legal_initiatives FROM documents
             WHERE collection = ?1 AND legal_initiatives IS NOT NULL
             ORDER BY rowid",
        )?;

        let results = stmt
            .query_map(params![collection], |row| {
                Self::decode_extraction(row.get(0)?, 0)
            })?
            .filter_map(|r| r.transpose())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(results)
    }

    fn upsert_document(&mut self, document: &Document) -> Result<(), Self::Error> {
        if document.collection.is_empty() || document.id.is_empty() {
            return Err(StoreError::InvalidData(
                "document collection and id must not be empty".to_string(),
            ));
        }

        let extraction = document
            .extraction
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "INSERT INTO documents (collection, id, contenido, url_pdf, url_html, fecha_publicacion, legal_initiatives)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(collection, id) DO UPDATE SET
             contenido = excluded.contenido,
             url_pdf = excluded.url_pdf,
             url_html = excluded.url_html,
             fecha_publicacion = excluded.fecha_publicacion,
             legal_initiatives = COALESCE(excluded.legal_initiatives, documents.legal_initiatives)",
            params![
                &document.collection,
                &document.id,
                &document.body,
                &document.pdf_url,
                &document.html_url,
                &document.published_on,
                extraction,
            ],
        )?;

        Ok(())
    }
}
