//! Module for reading JSON data
//!
//! [`JsonReader`] reads a JSON document in a single pass and notifies the subscribed
//! callbacks about the elements it encounters, without building a document tree.
//!
//! # Names and paths
//!
//! Callbacks are subscribed either for all elements, for elements with a certain
//! *name*, or for the element at a certain *path*. The name of an element is the
//! name of the object member it is the value of; array items and the top-level
//! value have an empty name.
//!
//! The path of an element is built by concatenating the names of its ancestors and
//! of the element itself, where `{` is appended when entering an object and `[` when
//! entering an array. For example in the document
//! ```json
//! {"data": {"users": [{"id": 1}]}}
//! ```
//! the member `id` has the path `{data{users[{id`. A subscription key containing
//! `{` or `[` is considered a path, every other key is a name.
//!
//! [`JsonReader::paths_from_buffer`] and [`JsonReader::paths_from_file`] can be used
//! to find out the paths of a document.

mod parser;

use std::{
    cell::RefCell,
    collections::BTreeSet,
    fmt::{Debug, Display, Formatter},
    io::Error as IoError,
    path::Path,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use thiserror::Error;

use crate::{
    convert::TextConverter,
    events::{Callback, Element, EventKind, Publishers},
    input::{JsonInput, ProgressListener, Source},
    text::{GrowableText, DEFAULT_CAPACITY},
};

use self::parser::Parser;

/// Default number of bytes read from a file at once
const DEFAULT_FILE_BUFFER_SIZE: usize = 1024 * 1024;
/// Default value for [`ReaderSettings::max_nesting_depth`]
const DEFAULT_MAX_NESTING_DEPTH: u32 = 1024;

/// Settings to customize the JSON reader behavior
///
/// These settings are used by [`JsonReader::new_custom`]. To avoid repeating the
/// default values for unchanged settings `..Default::default()` can be used:
/// ```
/// # use json_notify::reader::ReaderSettings;
/// ReaderSettings {
///     max_nesting_depth: Some(64),
///     // For all other settings use the default
///     ..Default::default()
/// }
/// # ;
/// ```
#[derive(PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderSettings {
    /// Number of bytes read from a file at once
    ///
    /// Has no effect when reading from an in-memory buffer.
    pub file_buffer_size: usize,

    /// Initial capacity in bytes of the buffers for names, values and paths
    ///
    /// The buffers grow as needed, so this only affects how often they have to be
    /// reallocated while reading documents with long names or values.
    pub initial_text_capacity: usize,

    /// Maximum nesting depth of JSON arrays and objects
    ///
    /// The reader parses nested values recursively, so malicious JSON data with an
    /// extreme nesting depth could otherwise exhaust the stack. When the limit is
    /// exceeded a [`ParseErrorKind::NestingTooDeep`] error is returned. `None`
    /// disables the limit.
    pub max_nesting_depth: Option<u32>,
}

impl Default for ReaderSettings {
    /// Creates the default JSON reader settings
    ///
    /// - file buffer size: 1 MiB
    /// - initial text capacity: 1024 bytes
    /// - max nesting depth: 1024
    fn default() -> Self {
        ReaderSettings {
            file_buffer_size: DEFAULT_FILE_BUFFER_SIZE,
            initial_text_capacity: DEFAULT_CAPACITY,
            max_nesting_depth: Some(DEFAULT_MAX_NESTING_DEPTH),
        }
    }
}

/// Location in the JSON document where an error occurred
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ErrorLocation {
    /// Number of bytes consumed from the start of the document, including the byte
    /// which caused the error
    pub byte_pos: u64,
    /// Path of the element which was being read
    ///
    /// See the [module documentation](crate::reader) for the path format.
    pub path: String,
}

impl Display for ErrorLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "byte {}", self.byte_pos)?;
        if !self.path.is_empty() {
            write!(f, ", path '{}'", self.path)?;
        }
        Ok(())
    }
}

/// Describes why a parse error occurred
#[non_exhaustive]
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum ParseErrorKind {
    /// A character was encountered which cannot start a JSON value, or a literal
    /// such as `true` is malformed
    UnexpectedCharacter,
    /// An unknown escape sequence (`\...`) was encountered
    InvalidEscapeSequence,
    /// A `\uXXXX` escape sequence contains a character which is not a hex digit
    InvalidHexDigit,
    /// Arrays and objects are nested deeper than [`ReaderSettings::max_nesting_depth`]
    NestingTooDeep,
}

/// Error which occurred while reading JSON data
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The file could not be opened or read
    #[error("IO error '{error}' at {location}")]
    IoError {
        /// The IO error which occurred
        error: IoError,
        /// Location where the error occurred
        location: ErrorLocation,
    },
    /// The JSON document ended while a value was still incomplete
    #[error("unexpected end of input at {location}")]
    UnexpectedEof {
        /// Location where the end of the input was reached
        location: ErrorLocation,
    },
    /// The JSON document is malformed
    #[error("parse error {kind} at {location}")]
    ParseError {
        /// Kind of the error
        kind: ParseErrorKind,
        /// Location where the error occurred
        location: ErrorLocation,
    },
    /// Reading was cancelled through a [`CancelHandle`]
    #[error("reading was cancelled")]
    Cancelled,
    /// The locale passed to [`JsonReader::use_locale`] does not name a known encoding
    #[error("unknown locale '{0}'")]
    UnknownLocale(String),
}

/// Error of the internal read operations; the location is added when the error
/// is returned to the user
#[derive(Debug)]
pub(crate) enum Failure {
    Io(IoError),
    UnexpectedEof,
    Parse(ParseErrorKind),
    Cancelled,
}

impl Failure {
    fn into_error(self, location: ErrorLocation) -> ReaderError {
        match self {
            Failure::Io(error) => ReaderError::IoError { error, location },
            Failure::UnexpectedEof => ReaderError::UnexpectedEof { location },
            Failure::Parse(kind) => ReaderError::ParseError { kind, location },
            Failure::Cancelled => ReaderError::Cancelled,
        }
    }
}

/// Handle for cancelling an ongoing read
///
/// The handle can be cloned, moved to other threads or into callbacks. Once
/// [`cancel`](Self::cancel) was called the read fails with [`ReaderError::Cancelled`]
/// the next time the reader checks the flag, which happens between tokens and
/// before every callback invocation. The flag is reset when the read ends.
#[derive(Clone, Default, Debug)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests cancellation of the current or next read
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Streaming JSON reader notifying callbacks
///
/// Subscriptions are only valid for a single read: after [`read_buffer`](Self::read_buffer)
/// or [`read_file`](Self::read_file) returned, regardless of whether successfully or not,
/// all callbacks are unsubscribed and the progress listener is removed. The same
/// reader can then be reused for another read.
///
/// Callbacks may borrow local state. Since the reader owns the callbacks, such
/// state has to be declared before the reader, so that it outlives it.
///
/// # Examples
/// ```
/// # use json_notify::reader::JsonReader;
/// let json = r#"{"users": [{"id": 1, "name": "a"}, {"id": 2, "name": null}]}"#;
/// let mut ids = Vec::new();
/// let mut names = Vec::new();
///
/// let mut json_reader = JsonReader::new();
/// json_reader.on_pair(Some("id"), |_, value| ids.push(value.unwrap_or_default().to_owned()));
/// json_reader.on_pair(Some("{users[{name"), |_, value| names.push(value.map(str::to_owned)));
/// json_reader.read_buffer(json.as_bytes())?;
/// drop(json_reader);
///
/// assert_eq!(vec!["1", "2"], ids);
/// assert_eq!(vec![Some("a".to_owned()), None], names);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JsonReader<'a> {
    settings: ReaderSettings,
    publishers: Publishers<'a>,
    converter: TextConverter,
    path: GrowableText,
    name: GrowableText,
    value: GrowableText,
    progress: Option<ProgressListener<'a>>,
    cancel: CancelHandle,
}

impl Debug for JsonReader<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonReader")
            .field("settings", &self.settings)
            .field("publishers", &self.publishers)
            .field("converter", &self.converter)
            .field("has_progress_listener", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Default for JsonReader<'_> {
    fn default() -> Self {
        JsonReader::new()
    }
}

// Implementation with subscription methods
impl<'a> JsonReader<'a> {
    /// Creates a JSON reader with [default settings](ReaderSettings::default)
    pub fn new() -> Self {
        JsonReader::new_custom(ReaderSettings::default())
    }

    /// Creates a JSON reader with custom settings
    pub fn new_custom(settings: ReaderSettings) -> Self {
        let capacity = settings.initial_text_capacity;
        JsonReader {
            publishers: Publishers::default(),
            converter: TextConverter::utf8(),
            path: GrowableText::with_capacity(capacity),
            name: GrowableText::with_capacity(capacity),
            value: GrowableText::with_capacity(capacity),
            progress: None,
            cancel: CancelHandle::default(),
            settings,
        }
    }

    /// Subscribes a callback for an event kind
    ///
    /// `key` is either a name or a path, see the [module documentation](crate::reader).
    /// If it is `None` the callback is invoked for every event of that kind. A callback
    /// subscribed with the same key before is replaced.
    ///
    /// Callbacks subscribed for a name, a path and for all elements are independent:
    /// when an element matches more than one of them, all of them are invoked, in
    /// that order.
    pub fn subscribe(&mut self, kind: EventKind, key: Option<&str>, callback: Callback<'a>) {
        self.publishers[kind].subscribe(key, callback);
    }

    /// Removes all subscribed callbacks
    ///
    /// This happens automatically at the end of every read.
    pub fn unsubscribe(&mut self) {
        self.publishers.unsubscribe();
    }

    /// Subscribes a callback for the start of JSON objects
    pub fn on_object_begin(&mut self, key: Option<&str>, f: impl FnMut(&Element<'_>) + 'a) {
        self.subscribe(EventKind::ObjectBegin, key, Callback::no_value(f));
    }

    /// Subscribes a callback for the end of JSON objects
    pub fn on_object_end(&mut self, key: Option<&str>, f: impl FnMut(&Element<'_>) + 'a) {
        self.subscribe(EventKind::ObjectEnd, key, Callback::no_value(f));
    }

    /// Subscribes a callback for the start of JSON arrays
    pub fn on_array_begin(&mut self, key: Option<&str>, f: impl FnMut(&Element<'_>) + 'a) {
        self.subscribe(EventKind::ArrayBegin, key, Callback::no_value(f));
    }

    /// Subscribes a callback for the end of JSON arrays
    pub fn on_array_end(&mut self, key: Option<&str>, f: impl FnMut(&Element<'_>) + 'a) {
        self.subscribe(EventKind::ArrayEnd, key, Callback::no_value(f));
    }

    /// Subscribes a callback for the items of JSON arrays
    ///
    /// The key refers to the array, not to the item. The value is `None` for items
    /// which are `null`, objects or arrays; [`Element::is_array_item_value`]
    /// distinguishes `null` from the latter.
    pub fn on_array_item(
        &mut self,
        key: Option<&str>,
        f: impl FnMut(&Element<'_>, Option<&str>) + 'a,
    ) {
        self.subscribe(EventKind::ArrayItem, key, Callback::utf8(f));
    }

    /// Like [`on_array_item`](Self::on_array_item), receiving the value in the narrow encoding
    pub fn on_array_item_narrow(
        &mut self,
        key: Option<&str>,
        f: impl FnMut(&Element<'_>, Option<&[u8]>) + 'a,
    ) {
        self.subscribe(EventKind::ArrayItem, key, Callback::narrow(f));
    }

    /// Like [`on_array_item`](Self::on_array_item), receiving the value as UTF-16 code units
    pub fn on_array_item_wide(
        &mut self,
        key: Option<&str>,
        f: impl FnMut(&Element<'_>, Option<&[u16]>) + 'a,
    ) {
        self.subscribe(EventKind::ArrayItem, key, Callback::wide(f));
    }

    /// Subscribes a callback for object members with a string, number, boolean or
    /// `null` value, and for such a value at the top-level
    ///
    /// The value is `None` for `null`.
    pub fn on_pair(&mut self, key: Option<&str>, f: impl FnMut(&Element<'_>, Option<&str>) + 'a) {
        self.subscribe(EventKind::Pair, key, Callback::utf8(f));
    }

    /// Like [`on_pair`](Self::on_pair), receiving the value in the narrow encoding
    pub fn on_pair_narrow(
        &mut self,
        key: Option<&str>,
        f: impl FnMut(&Element<'_>, Option<&[u8]>) + 'a,
    ) {
        self.subscribe(EventKind::Pair, key, Callback::narrow(f));
    }

    /// Like [`on_pair`](Self::on_pair), receiving the value as UTF-16 code units
    pub fn on_pair_wide(
        &mut self,
        key: Option<&str>,
        f: impl FnMut(&Element<'_>, Option<&[u16]>) + 'a,
    ) {
        self.subscribe(EventKind::Pair, key, Callback::wide(f));
    }

    /// Sets a listener notified about the reading progress of the next read
    ///
    /// The listener is called with the percentage of the input consumed each time
    /// another `step_percent` percent have been read, and with 100 once reading
    /// finished successfully. `step_percent` is clamped to 1 - 100.
    pub fn set_progress_listener(&mut self, step_percent: u8, listener: impl FnMut(u8) + 'a) {
        self.progress = Some(ProgressListener {
            step_percent,
            callback: Box::new(listener),
        });
    }

    /// Gets a handle for cancelling reads of this reader
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Sets the encoding of narrow strings
    ///
    /// When disabled, narrow strings are UTF-8. When enabled, they are encoded in the
    /// encoding of `locale`, for example `de_DE.ISO-8859-1` or `GB18030`, or if `locale`
    /// is `None` in the encoding of the locale configured by the environment variables
    /// `LC_ALL`, `LC_CTYPE` and `LANG`.
    ///
    /// # Errors
    /// [`ReaderError::UnknownLocale`] if `locale` does not name a known encoding. The
    /// previous setting is kept in that case.
    pub fn use_locale(&mut self, enabled: bool, locale: Option<&str>) -> Result<(), ReaderError> {
        self.converter = if enabled {
            TextConverter::for_locale(locale).map_err(ReaderError::UnknownLocale)?
        } else {
            TextConverter::utf8()
        };
        Ok(())
    }
}

// Implementation with read methods
impl JsonReader<'_> {
    /// Reads the JSON document from an in-memory buffer
    ///
    /// The buffer is not copied. If it contains a NUL byte the document ends there.
    /// An empty document or one consisting only of whitespace is read successfully
    /// without any notification.
    ///
    /// Only the first top-level value is read; trailing data is ignored.
    pub fn read_buffer(&mut self, buffer: &[u8]) -> Result<(), ReaderError> {
        self.read(Source::Buffer(buffer))
    }

    /// Reads the JSON document from a file
    ///
    /// The file is read in chunks of [`ReaderSettings::file_buffer_size`] bytes.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<(), ReaderError> {
        self.read(Source::File(path.as_ref()))
    }

    /// Collects the distinct paths of all objects, arrays and object members of the
    /// JSON document in an in-memory buffer
    ///
    /// Callbacks subscribed before are invoked as for [`read_buffer`](Self::read_buffer),
    /// except for the callbacks for all elements of the [`ObjectBegin`](EventKind::ObjectBegin),
    /// [`ArrayBegin`](EventKind::ArrayBegin) and [`Pair`](EventKind::Pair) events,
    /// which are replaced.
    pub fn paths_from_buffer(&mut self, buffer: &[u8]) -> Result<BTreeSet<String>, ReaderError> {
        self.collect_paths(Source::Buffer(buffer))
    }

    /// Collects the distinct paths of the JSON document in a file
    ///
    /// See [`paths_from_buffer`](Self::paths_from_buffer).
    pub fn paths_from_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<BTreeSet<String>, ReaderError> {
        self.collect_paths(Source::File(path.as_ref()))
    }

    fn collect_paths(&mut self, source: Source<'_>) -> Result<BTreeSet<String>, ReaderError> {
        let paths = Rc::new(RefCell::new(BTreeSet::new()));
        for kind in [EventKind::ObjectBegin, EventKind::ArrayBegin, EventKind::Pair] {
            let paths = Rc::clone(&paths);
            self.publishers[kind].subscribe(
                None,
                Callback::no_value(move |element| {
                    let path = element.path();
                    let mut paths = paths.borrow_mut();
                    if !paths.contains(path.as_ref()) {
                        paths.insert(path.into_owned());
                    }
                }),
            );
        }

        self.read(source)?;
        Ok(paths.take())
    }

    fn read(&mut self, source: Source<'_>) -> Result<(), ReaderError> {
        match source {
            Source::File(path) => log::debug!("starting read of file {}", path.display()),
            Source::Buffer(buffer) => log::debug!("starting read of {} byte buffer", buffer.len()),
        }
        let result = self.parse(source);
        match &result {
            Ok(()) => log::debug!("finished read"),
            Err(e) => log::debug!("read failed: {e}"),
        }

        self.path.clear();
        self.name.clear();
        self.value.clear();
        self.publishers.unsubscribe();
        self.progress = None;
        self.cancel.reset();
        result
    }

    fn parse(&mut self, source: Source<'_>) -> Result<(), ReaderError> {
        let start_location = || ErrorLocation {
            byte_pos: 0,
            path: String::new(),
        };
        let input = JsonInput::open(
            source,
            self.settings.file_buffer_size,
            self.progress.take(),
            self.cancel.clone(),
        )
        .map_err(|e| e.into_error(start_location()))?;

        self.path.clear();
        self.name.clear();
        self.value.clear();
        let mut parser = Parser {
            input,
            publishers: &mut self.publishers,
            converter: &self.converter,
            path: &mut self.path,
            name: &mut self.name,
            value: &mut self.value,
            max_nesting_depth: self.settings.max_nesting_depth,
            depth: 0,
        };

        let result = match parser.input.find_first_char() {
            Ok(true) => parser.parse_value(0, false).map(|_| ()),
            // Empty document
            Ok(false) => Ok(()),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                parser.input.notify_progress_end();
                Ok(())
            }
            Err(e) => {
                let location = ErrorLocation {
                    byte_pos: parser.input.position(),
                    path: parser.path.to_str_lossy().into_owned(),
                };
                Err(e.into_error(location))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    /// Reads the JSON data and records all events in the format `kind path=value`
    fn events(json: &str) -> Result<Vec<String>, ReaderError> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut json_reader = JsonReader::new();
        for kind in [
            EventKind::ObjectBegin,
            EventKind::ObjectEnd,
            EventKind::ArrayBegin,
            EventKind::ArrayEnd,
            EventKind::ArrayItem,
            EventKind::Pair,
        ] {
            let events = Rc::clone(&events);
            json_reader.subscribe(
                kind,
                None,
                Callback::utf8(move |element, value| {
                    let mut event = format!("{kind} {}", element.path());
                    if let Some(value) = value {
                        event.push('=');
                        event.push_str(value);
                    }
                    events.borrow_mut().push(event);
                }),
            );
        }
        json_reader.read_buffer(json.as_bytes())?;
        drop(json_reader);
        Ok(events.take())
    }

    #[test]
    fn event_order() -> TestResult {
        assert_eq!(
            vec![
                "ObjectBegin {",
                "Pair {a=1",
                "ArrayBegin {b[",
                "ArrayItem {b[=true",
                "ObjectBegin {b[{",
                "ObjectEnd {b[{",
                "ArrayItem {b[",
                "ArrayEnd {b[",
                "ObjectBegin {c{",
                "Pair {c{d",
                "ObjectEnd {c{",
                "ObjectEnd {",
            ],
            events(r#"{"a": 1, "b": [true, {}], "c": {"d": null}}"#)?
        );
        Ok(())
    }

    #[test]
    fn top_level_scalar() -> TestResult {
        assert_eq!(vec!["Pair =abc"], events(r#""abc""#)?);
        assert_eq!(vec!["Pair =-1.5e3"], events("-1.5e3")?);
        assert_eq!(vec!["Pair "], events(" null ")?);
        Ok(())
    }

    #[test]
    fn numbers_not_validated() -> TestResult {
        assert_eq!(
            vec!["ArrayBegin [", "ArrayItem [=1.2.3", "ArrayItem [=--5", "ArrayEnd ["],
            events("[1.2.3, --5]")?
        );
        Ok(())
    }

    #[test]
    fn separators_are_insignificant() -> TestResult {
        // Commas and colons are skipped like whitespace
        assert_eq!(
            events(r#"{"a": [1, 2], "b": "c"}"#)?,
            events(r#"{"a" [1 2] "b" "c",}"#)?
        );
        Ok(())
    }

    #[test]
    fn errors() {
        match events(r#"{"a": tru}"#) {
            Err(ReaderError::ParseError {
                kind: ParseErrorKind::UnexpectedCharacter,
                location,
            }) => {
                assert_eq!(
                    ErrorLocation {
                        byte_pos: 10,
                        path: "{a".to_owned()
                    },
                    location
                );
            }
            r => panic!("Unexpected result: {r:?}"),
        }

        match events(r#"{"a": [1, "b"#) {
            Err(ReaderError::UnexpectedEof { location }) => {
                assert_eq!(12, location.byte_pos);
                assert_eq!("{a[", location.path);
            }
            r => panic!("Unexpected result: {r:?}"),
        }

        match events("[x]") {
            Err(ReaderError::ParseError {
                kind: ParseErrorKind::UnexpectedCharacter,
                location,
            }) => {
                assert_eq!(2, location.byte_pos);
            }
            r => panic!("Unexpected result: {r:?}"),
        }

        match events("[tr") {
            Err(ReaderError::UnexpectedEof { .. }) => {}
            r => panic!("Unexpected result: {r:?}"),
        }

        // Only whitespace may precede the top-level value
        for (json, byte_pos) in [("xyz", 1), (" }{\"a\": 1}", 2), (", ]", 3)] {
            match events(json) {
                Err(ReaderError::ParseError {
                    kind: ParseErrorKind::UnexpectedCharacter,
                    location,
                }) => {
                    assert_eq!(byte_pos, location.byte_pos);
                    assert_eq!("", location.path);
                }
                r => panic!("Unexpected result for {json:?}: {r:?}"),
            }
        }
    }

    #[test]
    fn error_display() {
        let error = ReaderError::ParseError {
            kind: ParseErrorKind::InvalidEscapeSequence,
            location: ErrorLocation {
                byte_pos: 12,
                path: "{a[".to_owned(),
            },
        };
        assert_eq!(
            "parse error InvalidEscapeSequence at byte 12, path '{a['",
            error.to_string()
        );

        let error = ReaderError::UnexpectedEof {
            location: ErrorLocation {
                byte_pos: 0,
                path: String::new(),
            },
        };
        assert_eq!("unexpected end of input at byte 0", error.to_string());
        assert_eq!("reading was cancelled", ReaderError::Cancelled.to_string());
    }

    #[test]
    fn nesting_depth() -> TestResult {
        let mut json_reader = JsonReader::new_custom(ReaderSettings {
            max_nesting_depth: Some(3),
            ..Default::default()
        });
        json_reader.read_buffer(b"[[[1]], {\"a\": [2]}]")?;

        match json_reader.read_buffer(b"[[[[1]]]]") {
            Err(ReaderError::ParseError {
                kind: ParseErrorKind::NestingTooDeep,
                location,
            }) => {
                assert_eq!(4, location.byte_pos);
                // Path of the innermost array which was entered
                assert_eq!("[[[", location.path);
            }
            r => panic!("Unexpected result: {r:?}"),
        }

        let mut json_reader = JsonReader::new_custom(ReaderSettings {
            max_nesting_depth: None,
            ..Default::default()
        });
        let json = "[".repeat(1100) + &"]".repeat(1100);
        json_reader.read_buffer(json.as_bytes())?;
        Ok(())
    }

    #[test]
    fn subscriptions_end_with_read() -> TestResult {
        let count = Rc::new(RefCell::new(0));
        let mut json_reader = JsonReader::new();
        let count_clone = Rc::clone(&count);
        json_reader.on_pair(None, move |_, _| *count_clone.borrow_mut() += 1);

        json_reader.read_buffer(br#"{"a": 1}"#)?;
        assert_eq!(1, *count.borrow());
        json_reader.read_buffer(br#"{"a": 1}"#)?;
        assert_eq!(1, *count.borrow());

        // Also after a failed read
        let count_clone = Rc::clone(&count);
        json_reader.on_pair(None, move |_, _| *count_clone.borrow_mut() += 1);
        assert!(json_reader.read_buffer(br#"{"a": 1, "b": x}"#).is_err());
        assert_eq!(2, *count.borrow());
        json_reader.read_buffer(br#"{"a": 1}"#)?;
        assert_eq!(2, *count.borrow());
        Ok(())
    }

    #[test]
    fn cancel_before_read() -> TestResult {
        let mut json_reader = JsonReader::new();
        let cancel = json_reader.cancel_handle();
        cancel.cancel();
        assert!(matches!(
            json_reader.read_buffer(b"[1]"),
            Err(ReaderError::Cancelled)
        ));
        // Flag is reset after the read
        assert!(!cancel.is_cancelled());
        json_reader.read_buffer(b"[1]")?;
        Ok(())
    }

    #[test]
    fn unknown_locale() -> TestResult {
        let mut json_reader = JsonReader::new();
        match json_reader.use_locale(true, Some("xx_XX.UNKNOWN")) {
            Err(ReaderError::UnknownLocale(locale)) => assert_eq!("xx_XX.UNKNOWN", locale),
            r => panic!("Unexpected result: {r:?}"),
        }
        json_reader.use_locale(true, Some("en_US.ISO-8859-1"))?;
        json_reader.use_locale(false, None)?;
        Ok(())
    }

    #[test]
    fn missing_file() {
        let mut json_reader = JsonReader::new();
        match json_reader.read_file("does/not/exist.json") {
            Err(ReaderError::IoError { error, location }) => {
                assert_eq!(std::io::ErrorKind::NotFound, error.kind());
                assert_eq!(0, location.byte_pos);
            }
            r => panic!("Unexpected result: {r:?}"),
        }
    }
}
