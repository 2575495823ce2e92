//! Utility module for UTF-8 data handling

use std::borrow::Cow;

/// Maximum number of UTF-8 bytes needed to encode one Unicode `char`
pub(crate) const MAX_BYTES_PER_CHAR: usize = 4;

/// Whether the byte is a 1 byte UTF-8 encoded char; that means the byte itself represents an ASCII character
pub(crate) fn is_1byte(b: u8) -> bool {
    b <= 0x7F
}

/// Whether the code point is a UTF-16 high (leading) surrogate
pub(crate) fn is_high_surrogate(code_point: u32) -> bool {
    (0xD800..=0xDBFF).contains(&code_point)
}

/// Whether the code point is a UTF-16 low (trailing) surrogate
pub(crate) fn is_low_surrogate(code_point: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&code_point)
}

/// Combines a UTF-16 surrogate pair into the code point it represents
pub(crate) fn combine_surrogates(high: u32, low: u32) -> u32 {
    debug_assert!(is_high_surrogate(high) && is_low_surrogate(low));
    ((high - 0xD800) << 10 | (low - 0xDC00)) + 0x10000
}

/// Encodes the code point as UTF-8 into `buf`, returning the encoded bytes
///
/// Code points which are not valid Unicode scalar values (such as unpaired
/// surrogates) are encoded as U+FFFD REPLACEMENT CHARACTER.
pub(crate) fn encode_code_point(code_point: u32, buf: &mut [u8; MAX_BYTES_PER_CHAR]) -> &[u8] {
    let c = char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER);
    c.encode_utf8(buf).as_bytes()
}

/// Converts bytes to a `str`, replacing malformed UTF-8 data
///
/// Borrows the bytes if they are valid UTF-8, which is the common case.
pub(crate) fn to_str_lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
