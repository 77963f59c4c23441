//! Unicode helpers for matching and extraction.
//!
//! NFKC is used throughout so ligatures and presentation forms compare
//! equal to their base letters. Case-insensitive comparison uses a 1:1
//! uppercase fold (the first scalar of the full uppercase mapping), which
//! keeps offsets stable against the normalized buffer.

use unicode_normalization::UnicodeNormalization;

/// NFKC-normalize a sequence of code points.
pub fn nfkc(text: &[char]) -> Vec<char> {
    text.iter().copied().nfkc().collect()
}

/// NFKC-normalize a string into code points.
pub fn nfkc_str(text: &str) -> Vec<char> {
    text.chars().nfkc().collect()
}

/// One-to-one uppercase fold.
pub fn fold_upper(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}

/// Whether the code point belongs to a right-to-left script block
/// (Hebrew, Arabic and their presentation forms).
pub fn is_rtl(c: char) -> bool {
    matches!(c,
        '\u{0590}'..='\u{05FF}'   // Hebrew
        | '\u{0600}'..='\u{06FF}' // Arabic
        | '\u{0700}'..='\u{074F}' // Syriac
        | '\u{0750}'..='\u{077F}' // Arabic Supplement
        | '\u{0780}'..='\u{07BF}' // Thaana
        | '\u{08A0}'..='\u{08FF}' // Arabic Extended-A
        | '\u{FB1D}'..='\u{FB4F}' // Hebrew presentation forms
        | '\u{FB50}'..='\u{FDFF}' // Arabic presentation forms A
        | '\u{FE70}'..='\u{FEFF}' // Arabic presentation forms B
    )
}

/// Whether the code point counts as a left-to-right strong letter.
pub fn is_ltr(c: char) -> bool {
    c.is_alphabetic() && !is_rtl(c)
}
