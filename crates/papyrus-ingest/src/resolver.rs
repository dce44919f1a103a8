//! Source resolution
//!
//! Picks the content source of a document and turns it into normalized text.

use crate::error::{IngestError, Result};
use crate::fetch::ContentFetcher;
use crate::html::extract_html_text;
use crate::normalize::{decode_bytes, normalize};
use crate::pdf::extract_pdf_text;
use papyrus_domain::traits::DocumentStore;
use papyrus_domain::{ContentSource, Document, DocumentRef};
use tracing::debug;

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.trim().is_empty())
}

/// Choose the content source of a document
///
/// First match wins: inline body, then PDF URL, then HTML URL.
///
/// # Examples
///
/// ```
/// use papyrus_domain::{ContentSource, Document};
/// use papyrus_ingest::resolve;
///
/// let doc = Document::new("BOE", "1")
///     .with_body("  ")
///     .with_pdf_url("https://example.org/1.pdf")
///     .with_html_url("https://example.org/1.html");
/// assert_eq!(resolve(&doc).unwrap(), ContentSource::Pdf("https://example.org/1.pdf".into()));
/// ```
pub fn resolve(document: &Document) -> Result<ContentSource> {
    if let Some(body) = non_empty(&document.body) {
        return Ok(ContentSource::Inline(body.to_string()));
    }
    if let Some(url) = non_empty(&document.pdf_url) {
        return Ok(ContentSource::Pdf(url.trim().to_string()));
    }
    if let Some(url) = non_empty(&document.html_url) {
        return Ok(ContentSource::Html(url.trim().to_string()));
    }
    Err(IngestError::NoContentSource(document.doc_ref().to_string()))
}

/// Look up a document and choose its content source
pub fn resolve_ref<S>(store: &S, doc_ref: &DocumentRef) -> Result<ContentSource>
where
    S: DocumentStore,
    S::Error: std::fmt::Display,
{
    let document = store
        .get_document(doc_ref)
        .map_err(|e| IngestError::Store(e.to_string()))?
        .ok_or_else(|| IngestError::NotFound(doc_ref.to_string()))?;
    resolve(&document)
}

/// Reads a content source into normalized text
pub struct SourceReader<F> {
    fetcher: F,
}

impl<F: ContentFetcher> SourceReader<F> {
    /// Create a reader over a fetcher
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Underlying fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Produce normalized text for a source
    ///
    /// Inline text never touches the network.
    pub async fn read(&self, source: &ContentSource) -> Result<String> {
        let raw = match source {
            ContentSource::Inline(text) => text.clone(),
            ContentSource::Pdf(url) => {
                let bytes = self.fetcher.fetch(url).await?;
                extract_pdf_text(&bytes)?
            }
            ContentSource::Html(url) => {
                let bytes = self.fetcher.fetch(url).await?;
                extract_html_text(&decode_bytes(&bytes))
            }
        };

        let text = normalize(&raw);
        debug!(source = source.kind(), raw_chars = raw.len(), chars = text.len(), "Source read");
        Ok(text)
    }
}
