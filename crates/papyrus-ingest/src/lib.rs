//! Papyrus Ingest
//!
//! Turns a stored document into clean text ready for extraction.
//!
//! ## Overview
//!
//! - **Resolver**: picks the one content source of a document (inline body,
//!   PDF URL or HTML URL, first match wins)
//! - **Fetcher**: downloads remote sources with bounded timeout and retry
//! - **PDF / HTML readers**: page-by-page PDF text, main-region HTML text
//! - **Normalizer**: total text repair (encoding, mojibake, lost accents,
//!   controls, whitespace)
//!
//! ## Examples
//!
//! ```
//! use papyrus_ingest::normalize;
//!
//! assert_eq!(normalize("\u{FEFF}Proyecto  de\tley\n"), "Proyecto de ley");
//! ```

#![warn(missing_docs)]

mod error;
mod fetch;
mod html;
pub mod normalize;
mod pdf;
mod resolver;

pub use error::{IngestError, Result};
pub use fetch::{ContentFetcher, FetchConfig, HttpFetcher, MockFetcher, DEFAULT_USER_AGENT};
pub use html::extract_html_text;
pub use normalize::{decode_bytes, normalize, normalize_bytes, normalize_utf16};
pub use pdf::{assemble_pages, extract_pdf_text};
pub use resolver::{resolve, resolve_ref, SourceReader};
