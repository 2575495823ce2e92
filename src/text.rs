//! Internal module for the reusable text buffers of the reader
//!
//! A [`GrowableText`] is allocated once per role (element name, element value,
//! current path) and reused for the whole parse; clearing it never releases
//! its storage.

use std::borrow::Cow;

use crate::utf8;

/// Default number of bytes allocated for a new text buffer
pub(crate) const DEFAULT_CAPACITY: usize = 1024;
/// Factor by which the capacity grows when a buffer runs out of space
const GROWTH_FACTOR: f32 = 1.2;

/// Append-only byte buffer with tracked length and capacity
///
/// The length is always smaller than the capacity; one slot is kept free for a
/// terminator, like the NUL terminated strings this buffer is modelled on.
#[derive(Clone, Debug)]
pub(crate) struct GrowableText {
    /// Allocated storage; `bytes.len()` is the capacity
    bytes: Vec<u8>,
    length: usize,
    is_ascii: bool,
    is_quoted: bool,
}

/// Location of a part of a [`GrowableText`], used to refer to an element name
/// within the path without copying it
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub(crate) struct TextSpan {
    pub start: usize,
    pub len: usize,
}

impl GrowableText {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        // At least one content byte plus the terminator slot
        let capacity = capacity.max(2);
        GrowableText {
            bytes: vec![0; capacity],
            length: 0,
            is_ascii: true,
            is_quoted: false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.length
    }

    pub(crate) fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn is_ascii(&self) -> bool {
        self.is_ascii
    }

    pub(crate) fn set_ascii(&mut self, is_ascii: bool) {
        self.is_ascii = is_ascii;
    }

    pub(crate) fn is_quoted(&self) -> bool {
        self.is_quoted
    }

    pub(crate) fn set_quoted(&mut self, is_quoted: bool) {
        self.is_quoted = is_quoted;
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.length]
    }

    /// Gets the content as UTF-8 string, replacing malformed data
    pub(crate) fn to_str_lossy(&self) -> Cow<'_, str> {
        utf8::to_str_lossy(self.as_bytes())
    }

    /// Overwrites the content
    ///
    /// The ASCII flag is only recomputed if `check_encoding` is set; otherwise the
    /// caller knows the source is ASCII (for example the literal `true`).
    pub(crate) fn copy_from(&mut self, source: &[u8], check_encoding: bool) {
        self.reserve_for(source.len());
        self.bytes[..source.len()].copy_from_slice(source);
        self.length = source.len();
        self.is_ascii = !check_encoding || source.iter().all(|b| utf8::is_1byte(*b));
        self.is_quoted = false;
    }

    /// Grows the capacity to `new_capacity`, preserving the content; never shrinks
    pub(crate) fn resize(&mut self, new_capacity: usize) {
        if new_capacity > self.bytes.len() {
            self.bytes.resize(new_capacity, 0);
        }
    }

    /// Sets the logical length
    ///
    /// Returns `false` and leaves the length unchanged if `new_length` does not fit
    /// the capacity.
    pub(crate) fn set_length(&mut self, new_length: usize) -> bool {
        if new_length < self.bytes.len() {
            self.length = new_length;
            true
        } else {
            false
        }
    }

    /// Resets length and flags; keeps the allocated storage
    pub(crate) fn clear(&mut self) {
        self.length = 0;
        self.is_ascii = true;
        self.is_quoted = false;
    }

    pub(crate) fn push(&mut self, byte: u8) {
        self.reserve_for(self.length + 1);
        self.bytes[self.length] = byte;
        self.length += 1;
    }

    pub(crate) fn extend_from_slice(&mut self, source: &[u8]) {
        let new_length = self.length + source.len();
        self.reserve_for(new_length);
        self.bytes[self.length..new_length].copy_from_slice(source);
        self.length = new_length;
    }

    /// Makes sure content of `length` bytes plus the terminator slot fits
    fn reserve_for(&mut self, length: usize) {
        let capacity = self.capacity();
        if length < capacity {
            return;
        }
        let grown = (capacity as f32 * GROWTH_FACTOR) as usize;
        self.resize(grown.max(length + 1));
    }
}

impl Default for GrowableText {
    fn default() -> Self {
        GrowableText::with_capacity(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_grows_without_truncating() {
        let mut text = GrowableText::with_capacity(4);
        let expected: Vec<u8> = (0..200_u8).collect();
        for b in &expected {
            text.push(*b);
        }
        assert_eq!(expected.as_slice(), text.as_bytes());
        assert!(text.len() < text.capacity());
    }

    #[test]
    fn extend_grows_at_least_to_length() {
        let mut text = GrowableText::with_capacity(2);
        text.extend_from_slice(b"a");
        // Growth factor alone (2 * 1.2) would not be enough
        text.extend_from_slice(&[b'b'; 100]);
        assert_eq!(101, text.len());
        assert_eq!(b'a', text.as_bytes()[0]);
        assert!(text.as_bytes()[1..].iter().all(|b| *b == b'b'));
        assert!(text.capacity() > 101);
    }

    #[test]
    fn growth_factor() {
        let mut text = GrowableText::with_capacity(100);
        text.extend_from_slice(&[b'x'; 99]);
        assert_eq!(100, text.capacity());
        text.push(b'y');
        assert_eq!(120, text.capacity());
    }

    #[test]
    fn copy_from_encoding_check() {
        let mut text = GrowableText::with_capacity(8);
        text.set_quoted(true);
        text.copy_from("caf\u{e9}".as_bytes(), true);
        assert_eq!(false, text.is_ascii());
        assert_eq!(false, text.is_quoted());
        assert_eq!("caf\u{e9}", text.to_str_lossy());

        // Without check the caller vouches for ASCII content
        text.copy_from(b"true", false);
        assert_eq!(true, text.is_ascii());
        assert_eq!(b"true", text.as_bytes());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut text = GrowableText::with_capacity(2);
        text.extend_from_slice(&[b'a'; 50]);
        let capacity = text.capacity();
        text.set_ascii(false);
        text.set_quoted(true);

        text.clear();
        assert_eq!(0, text.len());
        assert_eq!(capacity, text.capacity());
        assert_eq!(true, text.is_ascii());
        assert_eq!(false, text.is_quoted());
    }

    #[test]
    fn set_length_and_resize() {
        let mut text = GrowableText::with_capacity(4);
        text.extend_from_slice(b"abc");
        assert_eq!(false, text.set_length(4));
        assert_eq!(3, text.len());
        assert_eq!(true, text.set_length(1));
        assert_eq!(b"a", text.as_bytes());

        text.resize(2);
        assert_eq!(4, text.capacity());
        text.resize(10);
        assert_eq!(10, text.capacity());
        assert_eq!(b"a", text.as_bytes());
    }
}
