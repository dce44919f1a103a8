//! Point-of-loss recovery for U+FFFD
//!
//! A replacement character in Spanish text almost always stands for a lost
//! accented vowel. When it is followed by a short lowercase run, the vowel is
//! guessed: first from a table of word stems that begin with an accented
//! vowel, then from the class of the following consonant. Guesses are best
//! effort and logged at debug level; anything not guessed stays as U+FFFD for
//! the caller to strip.

use tracing::debug;

const REPLACEMENT: char = '\u{FFFD}';

/// Longest trailing run considered
const MAX_RUN: usize = 15;

/// Word stems (after a lost leading vowel) and the vowel they imply
const STEMS: &[(&str, char)] = &[
    ("mbito", 'á'),
    ("rea", 'á'),
    ("rbol", 'á'),
    ("nimo", 'á'),
    ("rabe", 'á'),
    ("lgebra", 'á'),
    ("ngulo", 'á'),
    ("guila", 'á'),
    ("lbum", 'á'),
    ("tomo", 'á'),
    ("rbitro", 'á'),
    ("mbar", 'á'),
    ("xito", 'é'),
    ("poca", 'é'),
    ("nfasis", 'é'),
    ("ndice", 'í'),
    ("ntegro", 'í'),
    ("ndole", 'í'),
    ("tem", 'í'),
    ("rgano", 'ó'),
    ("rbita", 'ó'),
    ("ptimo", 'ó'),
    ("pera", 'ó'),
    ("leo", 'ó'),
    ("valo", 'ó'),
    ("ltimo", 'ú'),
    ("nico", 'ú'),
    ("til", 'ú'),
];

fn vowel_for_consonant(c: char) -> Option<char> {
    match c {
        'n' | 'm' => Some('ó'),
        's' | 'z' => Some('é'),
        't' | 'd' | 'c' => Some('í'),
        'b' | 'p' | 'v' | 'f' => Some('ú'),
        'g' | 'j' | 'q' => Some('ó'),
        'l' | 'r' => Some('á'),
        _ => None,
    }
}

fn uppercase(vowel: char) -> char {
    vowel.to_uppercase().next().unwrap_or(vowel)
}

/// Whether position `idx` starts a sentence (skipping whitespace backwards)
fn at_sentence_start(chars: &[char], idx: usize) -> bool {
    match chars[..idx].iter().rev().find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?' | '¡' | '¿' | ':'),
    }
}

fn guess(chars: &[char], idx: usize) -> Option<char> {
    let run: String = chars[idx + 1..]
        .iter()
        .take(MAX_RUN + 1)
        .take_while(|c| c.is_ascii_lowercase())
        .collect();
    if run.is_empty() || run.len() > MAX_RUN {
        return None;
    }

    let word_start = idx == 0 || !chars[idx - 1].is_alphabetic();

    let from_stem = if word_start {
        STEMS
            .iter()
            .find(|(stem, _)| run.starts_with(stem))
            .map(|(_, vowel)| *vowel)
    } else {
        None
    };

    let vowel = from_stem.or_else(|| run.chars().next().and_then(vowel_for_consonant))?;

    let vowel = if word_start && at_sentence_start(chars, idx) {
        uppercase(vowel)
    } else {
        vowel
    };

    debug!(run = %run, guess = %vowel, stem = from_stem.is_some(), "Recovered lost accented vowel");
    Some(vowel)
}

/// Replace recoverable U+FFFD occurrences with a guessed accented vowel
pub fn recover(text: &str) -> String {
    if !text.contains(REPLACEMENT) {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(idx, &c)| {
            if c == REPLACEMENT {
                guess(&chars, idx).unwrap_or(REPLACEMENT)
            } else {
                c
            }
        })
        .collect()
}
