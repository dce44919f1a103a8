//! Stored documents and their content sources

use crate::record::ExtractionResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a document: collection name plus unique key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Collection the document lives in (e.g. "BOCG")
    pub collection: String,

    /// Key unique within the collection
    pub id: String,
}

impl DocumentRef {
    /// Create a new document reference
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A legal document as held by the document store
///
/// Field names on the wire follow the store's contract (`contenido`,
/// `url_pdf`, `url_html`, `fecha_publicacion`, `legal_initiatives`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Collection name
    pub collection: String,

    /// Key unique within the collection
    pub id: String,

    /// Inline body text, already decoded
    #[serde(rename = "contenido", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Remote PDF location
    #[serde(rename = "url_pdf", default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,

    /// Remote HTML location
    #[serde(rename = "url_html", default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,

    /// Publication date (ISO `YYYY-MM-DD`), used for date-range filtering
    #[serde(rename = "fecha_publicacion", default, skip_serializing_if = "Option::is_none")]
    pub published_on: Option<String>,

    /// Prior extraction result, if this document was already processed
    #[serde(rename = "legal_initiatives", default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionResult>,
}

impl Document {
    /// Create an empty document with no content source
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            body: None,
            pdf_url: None,
            html_url: None,
            published_on: None,
            extraction: None,
        }
    }

    /// Set the inline body text
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the PDF URL
    pub fn with_pdf_url(mut self, url: impl Into<String>) -> Self {
        self.pdf_url = Some(url.into());
        self
    }

    /// Set the HTML URL
    pub fn with_html_url(mut self, url: impl Into<String>) -> Self {
        self.html_url = Some(url.into());
        self
    }

    /// Set the publication date
    pub fn with_published_on(mut self, date: impl Into<String>) -> Self {
        self.published_on = Some(date.into());
        self
    }

    /// Attach a prior extraction result
    pub fn with_extraction(mut self, extraction: ExtractionResult) -> Self {
        self.extraction = Some(extraction);
        self
    }

    /// Reference to this document
    pub fn doc_ref(&self) -> DocumentRef {
        DocumentRef::new(&self.collection, &self.id)
    }

    /// Whether an extraction result is already attached
    pub fn is_processed(&self) -> bool {
        self.extraction.is_some()
    }
}

/// Where a document's text has to come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Text stored with the document; no network access needed
    Inline(String),

    /// PDF that must be downloaded and parsed page by page
    Pdf(String),

    /// HTML page that must be downloaded and scraped
    Html(String),
}

impl ContentSource {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ContentSource::Inline(_) => "inline",
            ContentSource::Pdf(_) => "pdf",
            ContentSource::Html(_) => "html",
        }
    }

    /// Whether reading this source requires network I/O
    pub fn requires_fetch(&self) -> bool {
        !matches!(self, ContentSource::Inline(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("BOCG", "doc-1")
            .with_pdf_url("https://example.org/a.pdf")
            .with_published_on("2024-05-20");

        assert_eq!(doc.doc_ref(), DocumentRef::new("BOCG", "doc-1"));
        assert_eq!(doc.pdf_url.as_deref(), Some("https://example.org/a.pdf"));
        assert!(doc.body.is_none());
        assert!(!doc.is_processed());
    }

    #[test]
    fn test_document_wire_names() {
        let doc = Document::new("BOE", "x").with_body("texto");
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["contenido"], "texto");
        assert!(json.get("url_pdf").is_none());
        assert!(json.get("legal_initiatives").is_none());
    }

    #[test]
    fn test_document_ref_display() {
        assert_eq!(DocumentRef::new("BOCG", "42").to_string(), "BOCG/42");
    }

    #[test]
    fn test_content_source_kind() {
        assert_eq!(ContentSource::Inline("x".into()).kind(), "inline");
        assert!(!ContentSource::Inline("x".into()).requires_fetch());
        assert!(ContentSource::Pdf("u".into()).requires_fetch());
        assert!(ContentSource::Html("u".into()).requires_fetch());
    }
}
