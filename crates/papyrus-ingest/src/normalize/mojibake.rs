//! Double-encoding repair
//!
//! Text that was UTF-8, read as Latin-1 (or Windows-1252) and written back as
//! UTF-8 shows a characteristic two-character pattern per accented letter:
//! `á` becomes `Ã¡`, `¿` becomes `Â¿`, `“` becomes `â€œ`. Repair maps each
//! character back to the byte it was decoded from and re-decodes candidate
//! byte sequences as UTF-8. Sequences that do not decode are left untouched.

/// Two-character sequences that only appear in double-encoded Spanish text
const FINGERPRINTS: &[&str] = &[
    "Ã¡", "Ã©", "Ã­", "Ã³", "Ãº", "Ã±", "Ã\u{81}", "Ã‰", "Ã\u{8d}", "Ã“", "Ãš", "Ã‘", "Ã¼",
    "Â¿", "Â¡", "Â°", "Âº", "Âª", "â€", "Ãƒ", "Ã‚",
];

/// Windows-1252 characters occupying bytes 0x80..=0x9F
const CP1252_HIGH: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

/// Whether the text carries a known double-encoding fingerprint
pub fn looks_double_encoded(text: &str) -> bool {
    FINGERPRINTS.iter().any(|fp| text.contains(fp))
}

/// Byte a character would have had under Latin-1 / Windows-1252
fn byte_of(c: char) -> Option<u8> {
    let code = c as u32;
    if code <= 0xFF {
        return Some(code as u8);
    }
    CP1252_HIGH
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, b)| *b)
}

fn sequence_width(lead: u8) -> Option<usize> {
    match lead {
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Decode one double-encoded sequence starting at `chars[0]`
fn decode_sequence(chars: &[char]) -> Option<(char, usize)> {
    let lead = byte_of(chars[0])?;
    let width = sequence_width(lead)?;
    if chars.len() < width {
        return None;
    }

    let mut bytes = [0u8; 4];
    bytes[0] = lead;
    for (slot, c) in bytes[1..width].iter_mut().zip(&chars[1..width]) {
        let b = byte_of(*c)?;
        if !(0x80..=0xBF).contains(&b) {
            return None;
        }
        *slot = b;
    }

    let decoded = std::str::from_utf8(&bytes[..width]).ok()?;
    let mut it = decoded.chars();
    let c = it.next()?;
    Some((c, width))
}

/// Reverse double encoding until no sequence is left
///
/// Characters are pushed one at a time and the tail is re-decoded after every
/// push, so a decoded character can complete the sequence before it. Stacked
/// layers (`ÃƒÂ³`) and runs of `Â` collapse in a single call, and the output
/// contains no decodable sequence.
///
/// Only applied when [`looks_double_encoded`] holds; text without a
/// fingerprint is returned unchanged.
pub fn repair(text: &str) -> String {
    if !looks_double_encoded(text) {
        return text.to_string();
    }

    let mut out: Vec<char> = Vec::with_capacity(text.len());
    for c in text.chars() {
        out.push(c);
        while let Some((decoded, width)) = decode_tail(&out) {
            out.truncate(out.len() - width);
            out.push(decoded);
        }
    }

    out.into_iter().collect()
}

/// Decode a sequence ending at the last character of `chars`
fn decode_tail(chars: &[char]) -> Option<(char, usize)> {
    (2..=4).filter(|&width| width <= chars.len()).find_map(|width| {
        let start = chars.len() - width;
        decode_sequence(&chars[start..]).filter(|&(_, w)| w == width)
    })
}
