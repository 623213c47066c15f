use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Clean the text of one extracted table cell.
///
/// NFC-normalizes (PDF producers often emit `a` + combining tilde for `ã`),
/// expands ligatures, drops replacement and control characters and collapses
/// all whitespace runs into single spaces.
pub fn clean_cell(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ];
    for (lig, replacement) in &ligatures {
        result = result.replace(lig, replacement);
    }

    result.retain(|c| c != '\u{FFFD}' && (!c.is_control() || c.is_whitespace()));

    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_spaces.replace_all(result.trim(), " ").into_owned()
}
