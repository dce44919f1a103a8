//! PDF text extraction
//!
//! Pages are read in order; a page that fails to parse or yields only
//! whitespace is skipped with a warning. The document fails only when no
//! page yields text.

use crate::error::{IngestError, Result};
use tracing::{debug, warn};

/// Extract the text of a PDF held in memory
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| IngestError::PdfUnreadable(format!("Failed to load PDF: {}", e)))?;

    let pages = document.get_pages();
    debug!(pages = pages.len(), "PDF loaded");

    assemble_pages(pages.keys().map(|&number| {
        let text = document
            .extract_text(&[number])
            .map_err(|e| e.to_string());
        (number, text)
    }))
}

/// Join per-page extraction outcomes, in the order given
///
/// Pages are separated by a newline.
pub fn assemble_pages<I>(pages: I) -> Result<String>
where
    I: IntoIterator<Item = (u32, std::result::Result<String, String>)>,
{
    let mut texts = Vec::new();
    let mut total = 0usize;

    for (number, outcome) in pages {
        total += 1;
        match outcome {
            Ok(text) if !text.trim().is_empty() => texts.push(text),
            Ok(_) => debug!(page = number, "PDF page has no text"),
            Err(reason) => warn!(page = number, error = %reason, "Skipping unreadable PDF page"),
        }
    }

    if texts.is_empty() {
        return Err(IngestError::PdfUnreadable(format!(
            "none of {} pages yielded text",
            total
        )));
    }

    Ok(texts.join("\n"))
}
