//! Integration tests for papyrus-store
//!
//! These tests verify the full cycle for documents and extraction results.

use papyrus_domain::traits::{DocumentQuery, DocumentStore};
use papyrus_domain::{Document, DocumentRef, ExtractionMetadata, ExtractionRecord, ExtractionResult};
use papyrus_store::{SqliteStore, StoreError};
use tempfile::TempDir;

fn result_with(count: usize) -> ExtractionResult {
    ExtractionResult {
        iniciativas: (0..count)
            .map(|i| {
                let mut record = ExtractionRecord::unspecified();
                record.id = format!("PL-{}", i);
                record.sector = "Salud".to_string();
                record
            })
            .collect(),
        extraction_metadata: ExtractionMetadata {
            model: "gpt-5-mini".to_string(),
            total_initiatives: count,
            ..Default::default()
        },
    }
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_upsert_and_get_document() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let doc = Document::new("BOCG", "doc-1")
        .with_pdf_url("https://example.org/doc-1.pdf")
        .with_published_on("2024-03-01");
    store.upsert_document(&doc).unwrap();

    let retrieved = store.get_document(&doc.doc_ref()).unwrap();
    assert_eq!(retrieved, Some(doc));
}

#[test]
fn test_get_missing_document() {
    let store = SqliteStore::new(":memory:").unwrap();
    let retrieved = store.get_document(&DocumentRef::new("BOCG", "nope")).unwrap();
    assert!(retrieved.is_none());
}

#[test]
fn test_set_extraction_replaces_previous() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let doc = Document::new("BOE", "a").with_body("texto");
    store.upsert_document(&doc).unwrap();

    store.set_extraction(&doc.doc_ref(), &result_with(3)).unwrap();
    store.set_extraction(&doc.doc_ref(), &result_with(1)).unwrap();

    let stored = store.get_document(&doc.doc_ref()).unwrap().unwrap();
    assert!(stored.is_processed());
    assert_eq!(stored.extraction.unwrap().record_count(), 1);
}

#[test]
fn test_set_extraction_on_missing_document() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let err = store
        .set_extraction(&DocumentRef::new("BOE", "ghost"), &result_with(0))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn test_upsert_keeps_existing_extraction() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let doc = Document::new("BOE", "a").with_body("v1");
    store.upsert_document(&doc).unwrap();
    store.set_extraction(&doc.doc_ref(), &result_with(2)).unwrap();

    store
        .upsert_document(&Document::new("BOE", "a").with_body("v2"))
        .unwrap();

    let stored = store.get_document(&doc.doc_ref()).unwrap().unwrap();
    assert_eq!(stored.body.as_deref(), Some("v2"));
    assert_eq!(stored.extraction.unwrap().record_count(), 2);
}

#[test]
fn test_upsert_rejects_empty_key() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let err = store.upsert_document(&Document::new("BOE", "")).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[test]
fn test_find_documents_in_insertion_order() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    for id in ["c", "a", "b"] {
        store.upsert_document(&Document::new("BOCG", id)).unwrap();
    }
    store.upsert_document(&Document::new("BOE", "x")).unwrap();

    let refs = store.find_documents(&DocumentQuery::collection("BOCG")).unwrap();
    let ids: Vec<_> = refs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn test_find_documents_by_date_range_and_limit() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let dates = ["2024-01-10", "2024-02-10", "2024-03-10", "2024-04-10"];
    for (i, date) in dates.iter().enumerate() {
        store
            .upsert_document(&Document::new("BOCG", format!("d{}", i)).with_published_on(*date))
            .unwrap();
    }
    // Undated documents never match a date filter
    store.upsert_document(&Document::new("BOCG", "undated")).unwrap();

    let query = DocumentQuery::collection("BOCG")
        .with_date_range(Some("2024-02-01".into()), Some("2024-03-31".into()));
    let refs = store.find_documents(&query).unwrap();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].id, "d1");
    assert_eq!(refs[1].id, "d2");

    let limited = store
        .find_documents(&DocumentQuery::collection("BOCG").with_limit(Some(2)))
        .unwrap();
    assert_eq!(limited.len(), 2);
}

#[test]
fn test_extraction_results_skip_unprocessed() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    for id in ["a", "b", "c"] {
        store.upsert_document(&Document::new("BOCG", id)).unwrap();
    }
    store
        .set_extraction(&DocumentRef::new("BOCG", "a"), &result_with(2))
        .unwrap();
    store
        .set_extraction(&DocumentRef::new("BOCG", "c"), &result_with(0))
        .unwrap();

    let results = store.extraction_results("BOCG").unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].record_count(), 2);
    assert_eq!(results[1].record_count(), 0);

    assert!(store.extraction_results("BOE").unwrap().is_empty());
}

#[test]
fn test_collections_and_counts() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.upsert_document(&Document::new("BOE", "1")).unwrap();
    store.upsert_document(&Document::new("BOCG", "1")).unwrap();
    store.upsert_document(&Document::new("BOCG", "2")).unwrap();

    assert_eq!(store.collections().unwrap(), vec!["BOCG", "BOE"]);
    assert_eq!(store.count_documents("BOCG").unwrap(), 2);
    assert_eq!(store.count_documents("DOG").unwrap(), 0);
}

#[test]
fn test_persistence_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("papyrus.db");

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store
            .upsert_document(&Document::new("BOE", "a").with_body("texto"))
            .unwrap();
        store
            .set_extraction(&DocumentRef::new("BOE", "a"), &result_with(1))
            .unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    let doc = store.get_document(&DocumentRef::new("BOE", "a")).unwrap().unwrap();
    assert_eq!(doc.body.as_deref(), Some("texto"));
    assert_eq!(doc.extraction.unwrap().iniciativas[0].id, "PL-0");
}
