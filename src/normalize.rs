//! Unicode canonicalization for page text and queries.
//!
//! Complex scripts frequently arrive with combining marks in different
//! orders, or with invisible joiners sprinkled between logical
//! characters by the text extractor. Every page text and every query goes
//! through [`normalize`] before any matching step so that visually
//! identical strings compare equal.

use std::borrow::Cow;

use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

/// Zero-width space.
pub const ZWSP: char = '\u{200B}';
/// Zero-width non-joiner.
pub const ZWNJ: char = '\u{200C}';
/// Zero-width joiner.
pub const ZWJ: char = '\u{200D}';
/// Byte-order mark / zero-width no-break space.
pub const BOM: char = '\u{FEFF}';

/// Apply canonical composition (NFC).
///
/// Pure and total: any input yields a valid string.
pub fn normalize(value: &str) -> String {
    normalized(value).into_owned()
}

/// [`normalize`] that borrows when `value` is already NFC.
pub fn normalized(value: &str) -> Cow<'_, str> {
    // Most extracted text is already NFC; skip the allocation-heavy pass.
    if is_nfc_quick(value.chars()) == IsNormalized::Yes {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.nfc().collect())
}

/// Returns `true` for the invisible formatting characters that text
/// extractors insert between logical characters.
pub fn is_invisible_separator(ch: char) -> bool {
    matches!(ch, ZWSP | ZWNJ | ZWJ | BOM)
}

/// Number of Unicode scalar values in `value`.
///
/// All span arithmetic in this crate is done in chars, not bytes.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
