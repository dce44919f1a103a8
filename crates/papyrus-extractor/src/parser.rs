//! Parse service output into extraction records

use crate::error::ExtractorError;
use papyrus_domain::ExtractionRecord;
use serde_json::Value;
use tracing::warn;

/// Parse a JSON response into extraction records
///
/// A missing or non-array `iniciativas` yields no records. Entries that are
/// not JSON objects are skipped. Only text that is not JSON at all fails.
pub fn parse_response(response: &str) -> Result<Vec<ExtractionRecord>, ExtractorError> {
    let json_str = extract_json(response);
    let json: Value = serde_json::from_str(json_str)?;

    let entries = match json.get("iniciativas") {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warn!(kind = value_kind(other), "'iniciativas' is not an array, treating as empty");
            return Ok(Vec::new());
        }
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            warn!(index = idx, kind = value_kind(entry), "Skipping non-object record");
            continue;
        }
        match serde_json::from_value::<ExtractionRecord>(entry.clone()) {
            Ok(record) => records.push(record),
            Err(e) => warn!(index = idx, error = %e, "Skipping unreadable record"),
        }
    }

    Ok(records)
}

/// Strip a markdown code fence, if present
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (```json) up to the first newline
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start_matches("json"),
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
