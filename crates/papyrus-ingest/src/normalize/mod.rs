//! Text normalization
//!
//! `normalize` is total: it never fails, it only removes or repairs. The
//! output is valid UTF-8 (by construction of `String`), NFC, free of U+FFFD,
//! BOM, noncharacters and control characters, with whitespace runs collapsed
//! to one space and trimmed.
//!
//! One repair pass runs, in order:
//!
//! 1. strip BOM and C0 controls (C1 survives: it may be half of a
//!    double-encoded capital)
//! 2. double-encoding repair, when a fingerprint is present
//! 3. U+FFFD recovery
//! 4. NFC
//! 5. strip residual U+FFFD, BOM, C0/C1 controls and noncharacters
//! 6. collapse whitespace and trim
//!
//! The pass is repeated until the text stops changing, so `normalize` is
//! idempotent: `normalize(normalize(x)) == normalize(x)`.
//!
//! Surrogate code points cannot occur in a Rust `String`; they are removed
//! at the byte and UTF-16 entry points instead ([`decode_bytes`],
//! [`normalize_utf16`]).

mod accents;
mod mojibake;

pub use mojibake::looks_double_encoded;

use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

/// Upper bound on repair passes
///
/// After the first pass every changing pass shortens the text, so real input
/// converges in a handful of passes.
const MAX_PASSES: usize = 1024;

const BOM: char = '\u{FEFF}';
const REPLACEMENT: char = '\u{FFFD}';

/// Decode raw bytes to text
///
/// CESU-8 surrogate triplets (`ED A0..BF 80..BF`) are dropped first, then the
/// bytes are read as UTF-8, falling back to Latin-1, which maps every byte.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let cleaned = strip_encoded_surrogates(bytes);
    match String::from_utf8(cleaned) {
        Ok(text) => text,
        Err(e) => {
            debug!(valid_up_to = e.utf8_error().valid_up_to(), "Input is not UTF-8, decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

fn strip_encoded_surrogates(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0xED
            && i + 2 < bytes.len()
            && (0xA0..=0xBF).contains(&bytes[i + 1])
            && (0x80..=0xBF).contains(&bytes[i + 2])
        {
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Normalize raw bytes of unknown encoding
pub fn normalize_bytes(bytes: &[u8]) -> String {
    normalize(&decode_bytes(bytes))
}

/// Normalize UTF-16 code units, dropping unpaired surrogates
pub fn normalize_utf16(units: &[u16]) -> String {
    let decoded: String = char::decode_utf16(units.iter().copied())
        .filter_map(Result::ok)
        .collect();
    normalize(&decoded)
}

/// Normalize text for extraction
///
/// # Examples
///
/// ```
/// use papyrus_ingest::normalize;
///
/// assert_eq!(normalize("  Ã\u{81}mbito\u{0007} de   aplicaciÃ³n\n"), "Ámbito de aplicación");
/// assert_eq!(normalize("p\u{FFFD}blico"), "público");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut current = raw.to_string();
    let mut passes = 0;

    loop {
        let next = pass(&current);
        passes += 1;
        if next == current {
            break;
        }
        current = next;
        if passes >= MAX_PASSES {
            warn!(passes, "Normalization did not converge");
            break;
        }
    }

    let before = raw.chars().count();
    let after = current.chars().count();
    if after * 10 < before * 9 {
        warn!(
            input_chars = before,
            output_chars = after,
            "Normalization shrank text by more than 10%"
        );
    }

    current
}

fn pass(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|&c| c != BOM && !is_c0_control(c))
        .collect();
    let repaired = mojibake::repair(&stripped);
    let recovered = accents::recover(&repaired);
    let composed: String = recovered.nfc().collect();
    let cleaned = composed.chars().filter(|&c| keep(c));
    collapse_whitespace(cleaned)
}

fn is_c0_control(c: char) -> bool {
    c.is_ascii_control() && !c.is_whitespace()
}

fn is_noncharacter(c: char) -> bool {
    let code = c as u32;
    (0xFDD0..=0xFDEF).contains(&code) || (code & 0xFFFE) == 0xFFFE
}

fn keep(c: char) -> bool {
    if c == REPLACEMENT || c == BOM || is_noncharacter(c) {
        return false;
    }
    !c.is_control() || c.is_whitespace()
}

fn collapse_whitespace(chars: impl Iterator<Item = char>) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    for c in chars {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}
