//! Recursive descent parser driving the event notifications
//!
//! The path of the current element is kept in a single buffer. Every parse
//! function receives the length of the path at which it starts, appends to the
//! buffer and the next sibling simply truncates back to that length.

use crate::{
    convert::TextConverter,
    events::{Element, EventKind, Publishers},
    input::JsonInput,
    text::{GrowableText, TextSpan},
    utf8,
};

use super::{Failure, ParseErrorKind};

/// Kind of a parsed JSON value
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub(super) enum ValueKind {
    /// Object or array
    Container,
    Null,
    /// String, number or boolean; the text is in the value buffer
    Scalar,
}

const LITERALS: [(&[u8], ValueKind); 3] = [
    (b"true", ValueKind::Scalar),
    (b"false", ValueKind::Scalar),
    (b"null", ValueKind::Null),
];

fn is_number_char(byte: u8) -> bool {
    matches!(byte, b'0'..=b'9' | b'.' | b'+' | b'-' | b'e' | b'E')
}

/// Appends the content of a string whose opening quote was consumed to `text`
fn read_string(input: &mut JsonInput<'_, '_>, text: &mut GrowableText) -> Result<(), Failure> {
    text.clear();
    loop {
        match input.next_char_required(true)? {
            b'"' => break,
            b'\\' => input.read_escape_sequence(text)?,
            byte => {
                if !utf8::is_1byte(byte) {
                    text.set_ascii(false);
                }
                text.push(byte);
            }
        }
    }
    text.set_quoted(true);
    Ok(())
}

pub(super) struct Parser<'r, 's, 'a> {
    pub(super) input: JsonInput<'s, 'a>,
    pub(super) publishers: &'r mut Publishers<'a>,
    pub(super) converter: &'r TextConverter,
    /// Path of the current element
    pub(super) path: &'r mut GrowableText,
    /// Name of the object member whose value is parsed next
    pub(super) name: &'r mut GrowableText,
    /// Text of the last parsed string, number or boolean
    pub(super) value: &'r mut GrowableText,
    pub(super) max_nesting_depth: Option<u32>,
    pub(super) depth: u32,
}

impl Parser<'_, '_, '_> {
    /// Parses the value starting at the current character
    ///
    /// The pending element name is appended to the path at `path_len`. Values which
    /// are not array items are notified as [`EventKind::Pair`].
    pub(super) fn parse_value(
        &mut self,
        path_len: usize,
        is_array_item: bool,
    ) -> Result<ValueKind, Failure> {
        let name = TextSpan {
            start: path_len,
            len: self.name.len(),
        };
        self.truncate_path(path_len);
        let was_path_ascii = self.path.is_ascii();
        self.path.extend_from_slice(self.name.as_bytes());
        if !self.name.is_ascii() {
            self.path.set_ascii(false);
        }
        let path_len = name.start + name.len;

        let kind = match self.input.current_char() {
            b'{' => {
                self.parse_object(path_len, name)?;
                ValueKind::Container
            }
            b'[' => {
                self.parse_array(path_len, name)?;
                ValueKind::Container
            }
            b'"' => {
                read_string(&mut self.input, self.value)?;
                ValueKind::Scalar
            }
            b'-' | b'0'..=b'9' => {
                self.parse_number()?;
                ValueKind::Scalar
            }
            _ => self.parse_literal()?,
        };

        if kind != ValueKind::Container && !is_array_item {
            self.notify(EventKind::Pair, name, path_len, kind)?;
        }
        self.path.set_ascii(was_path_ascii);
        Ok(kind)
    }

    fn parse_object(&mut self, path_len: usize, name: TextSpan) -> Result<(), Failure> {
        self.enter_container()?;
        self.path.push(b'{');
        let path_len = path_len + 1;
        self.notify(EventKind::ObjectBegin, name, path_len, ValueKind::Container)?;

        while self.input.next_char_required(false)? != b'}' {
            self.input.go_to_next_quote()?;
            read_string(&mut self.input, self.name)?;
            // Skips the `:` separator
            self.input.next_char_required(false)?;
            self.parse_value(path_len, false)?;
        }

        self.name.clear();
        self.value.clear();
        self.notify(EventKind::ObjectEnd, name, path_len, ValueKind::Container)?;
        self.depth -= 1;
        Ok(())
    }

    fn parse_array(&mut self, path_len: usize, name: TextSpan) -> Result<(), Failure> {
        self.enter_container()?;
        self.path.push(b'[');
        let path_len = path_len + 1;
        self.notify(EventKind::ArrayBegin, name, path_len, ValueKind::Container)?;

        while self.input.next_char_required(false)? != b']' {
            self.name.clear();
            self.value.clear();
            let item = self.parse_value(path_len, true)?;
            self.notify(EventKind::ArrayItem, name, path_len, item)?;
        }

        self.name.clear();
        self.value.clear();
        self.notify(EventKind::ArrayEnd, name, path_len, ValueKind::Container)?;
        self.depth -= 1;
        Ok(())
    }

    fn enter_container(&mut self) -> Result<(), Failure> {
        self.depth += 1;
        match self.max_nesting_depth {
            Some(max_depth) if self.depth > max_depth => {
                Err(Failure::Parse(ParseErrorKind::NestingTooDeep))
            }
            _ => Ok(()),
        }
    }

    /// Reads the number starting at the current character; its text is not validated
    fn parse_number(&mut self) -> Result<(), Failure> {
        self.value.clear();
        self.value.push(self.input.current_char());
        loop {
            let byte = self.input.next_char(true)?;
            if !is_number_char(byte) || self.input.is_eof() {
                // Leave the terminating character for the enclosing container
                self.input.go_to_previous_char();
                return Ok(());
            }
            self.value.push(byte);
        }
    }

    fn parse_literal(&mut self) -> Result<ValueKind, Failure> {
        for (literal, kind) in LITERALS {
            if self.match_literal(literal)? {
                match kind {
                    ValueKind::Scalar => self.value.copy_from(literal, false),
                    _ => self.value.clear(),
                }
                return Ok(kind);
            }
        }

        Err(if self.input.is_eof() {
            Failure::UnexpectedEof
        } else {
            Failure::Parse(ParseErrorKind::UnexpectedCharacter)
        })
    }

    /// Compares the literal with the input starting at the current character
    ///
    /// On mismatch the cursor stays at the diverging character.
    fn match_literal(&mut self, literal: &[u8]) -> Result<bool, Failure> {
        let Some((first, rest)) = literal.split_first() else {
            return Ok(true);
        };
        if self.input.current_char() != *first {
            return Ok(false);
        }
        for expected in rest {
            if self.input.next_char(true)? != *expected {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn truncate_path(&mut self, path_len: usize) {
        let truncated = self.path.set_length(path_len);
        debug_assert!(truncated, "path length {path_len} exceeds capacity");
    }

    /// Notifies the callbacks for the element whose path has length `path_len`
    fn notify(
        &mut self,
        kind: EventKind,
        name: TextSpan,
        path_len: usize,
        value: ValueKind,
    ) -> Result<(), Failure> {
        self.truncate_path(path_len);
        self.input.check_cancelled()?;

        let publisher = &mut self.publishers[kind];
        if publisher.is_empty() {
            return Ok(());
        }
        let element = Element {
            kind,
            path: self.path.as_bytes(),
            name,
            is_path_ascii: self.path.is_ascii(),
            is_value_quoted: value == ValueKind::Scalar && self.value.is_quoted(),
            is_array_item_value: kind == EventKind::ArrayItem && value != ValueKind::Container,
            converter: self.converter,
        };
        log::trace!("notifying {kind} for path '{}'", element.path());
        let value = (value == ValueKind::Scalar).then(|| self.value.as_bytes());
        publisher.notify(&element, value);
        Ok(())
    }
}
