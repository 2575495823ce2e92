//! Module for subscribing callbacks to the events of the JSON reader
//!
//! Each [`EventKind`] has its own registry of callbacks. A callback is subscribed
//! either for all elements, for elements with a certain *name*, or for the element
//! at a certain *path*. See [`JsonReader`](crate::reader::JsonReader) for the
//! format of names and paths.

use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::{Debug, Formatter},
    ops::{Index, IndexMut},
};

use strum::EnumCount;

use crate::{convert::TextConverter, text::TextSpan, utf8};

/// Type of event notified by the JSON reader
#[derive(
    PartialEq, Eq, Clone, Copy, Hash, strum::Display, strum::EnumIter, strum::EnumCount, Debug,
)]
pub enum EventKind {
    /// Start of a JSON object: `{`
    ObjectBegin,
    /// End of a JSON object: `}`
    ObjectEnd,
    /// Start of a JSON array: `[`
    ArrayBegin,
    /// End of a JSON array: `]`
    ArrayEnd,
    /// An item of a JSON array was read
    ///
    /// The element is the array itself. The value is only present if the item is a
    /// string, number or boolean.
    ArrayItem,
    /// An object member with a string, number, boolean or `null` value was read
    ///
    /// Members whose value is an object or array are notified with
    /// [`ObjectBegin`](Self::ObjectBegin) and [`ArrayBegin`](Self::ArrayBegin) instead.
    Pair,
}

/// Information about the element which caused an event
///
/// The data is only valid during the callback invocation; the reader reuses its
/// buffers for the next event.
pub struct Element<'e> {
    pub(crate) kind: EventKind,
    /// Path up to and including this element
    pub(crate) path: &'e [u8],
    /// Location of the element name within `path`
    pub(crate) name: TextSpan,
    pub(crate) is_path_ascii: bool,
    pub(crate) is_value_quoted: bool,
    pub(crate) is_array_item_value: bool,
    pub(crate) converter: &'e TextConverter,
}

impl<'e> Element<'e> {
    /// Kind of the event
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Raw UTF-8 bytes of the element name
    pub fn name_bytes(&self) -> &'e [u8] {
        let path: &'e [u8] = self.path;
        path.get(self.name.start..self.name.start + self.name.len)
            .unwrap_or_default()
    }

    /// Name of the element
    ///
    /// The name is empty for the top-level value and for array items.
    pub fn name(&self) -> Cow<'e, str> {
        utf8::to_str_lossy(self.name_bytes())
    }

    /// Name of the element in the narrow encoding (see [`JsonReader::use_locale`](crate::reader::JsonReader::use_locale))
    pub fn name_narrow(&self) -> Cow<'e, [u8]> {
        self.converter.to_narrow(self.name_bytes())
    }

    /// Name of the element as UTF-16 code units
    pub fn name_wide(&self) -> Vec<u16> {
        self.converter.to_wide(self.name_bytes())
    }

    /// Raw UTF-8 bytes of the element path
    pub fn path_bytes(&self) -> &'e [u8] {
        self.path
    }

    /// Path of the element
    pub fn path(&self) -> Cow<'e, str> {
        utf8::to_str_lossy(self.path)
    }

    /// Path of the element in the narrow encoding
    pub fn path_narrow(&self) -> Cow<'e, [u8]> {
        self.converter.to_narrow(self.path)
    }

    /// Path of the element as UTF-16 code units
    pub fn path_wide(&self) -> Vec<u16> {
        self.converter.to_wide(self.path)
    }

    /// Whether the path consists only of ASCII characters
    pub fn is_path_ascii(&self) -> bool {
        self.is_path_ascii
    }

    /// Whether the value was a JSON string
    ///
    /// Distinguishes for example the number `123` from the string `"123"`, which are
    /// both delivered as text `123`.
    pub fn is_value_quoted(&self) -> bool {
        self.is_value_quoted
    }

    /// For [`EventKind::ArrayItem`]: whether the item was a string, number, boolean or `null`
    /// (and not an object or array)
    pub fn is_array_item_value(&self) -> bool {
        self.is_array_item_value
    }
}

impl Debug for Element<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("name", &self.name())
            .field("path", &self.path())
            .field("is_path_ascii", &self.is_path_ascii)
            .field("is_value_quoted", &self.is_value_quoted)
            .field("is_array_item_value", &self.is_array_item_value)
            .finish()
    }
}

type NoValueFn<'a> = dyn FnMut(&Element<'_>) + 'a;
type Utf8Fn<'a> = dyn FnMut(&Element<'_>, Option<&str>) + 'a;
type NarrowFn<'a> = dyn FnMut(&Element<'_>, Option<&[u8]>) + 'a;
type WideFn<'a> = dyn FnMut(&Element<'_>, Option<&[u16]>) + 'a;

/// Callback which is invoked for an event
///
/// The variant determines in which encoding the value is delivered. A value of
/// `None` means there is no value, for example for JSON `null`, which is different
/// from an empty string.
pub enum Callback<'a> {
    /// Callback which does not receive the value
    NoValue(Box<NoValueFn<'a>>),
    /// Callback receiving the value as UTF-8 string
    ///
    /// Malformed UTF-8 data in the JSON document is replaced with U+FFFD.
    Utf8(Box<Utf8Fn<'a>>),
    /// Callback receiving the value in the narrow encoding
    ///
    /// This is UTF-8, unless [locale mode](crate::reader::JsonReader::use_locale) is enabled.
    Narrow(Box<NarrowFn<'a>>),
    /// Callback receiving the value as UTF-16 code units
    Wide(Box<WideFn<'a>>),
}

impl<'a> Callback<'a> {
    /// Creates a [`Callback::NoValue`]
    pub fn no_value(f: impl FnMut(&Element<'_>) + 'a) -> Self {
        Callback::NoValue(Box::new(f))
    }

    /// Creates a [`Callback::Utf8`]
    pub fn utf8(f: impl FnMut(&Element<'_>, Option<&str>) + 'a) -> Self {
        Callback::Utf8(Box::new(f))
    }

    /// Creates a [`Callback::Narrow`]
    pub fn narrow(f: impl FnMut(&Element<'_>, Option<&[u8]>) + 'a) -> Self {
        Callback::Narrow(Box::new(f))
    }

    /// Creates a [`Callback::Wide`]
    pub fn wide(f: impl FnMut(&Element<'_>, Option<&[u16]>) + 'a) -> Self {
        Callback::Wide(Box::new(f))
    }

    fn invoke(&mut self, element: &Element<'_>, value: Option<&[u8]>, wide_buf: &mut Vec<u16>) {
        match self {
            Callback::NoValue(f) => f(element),
            Callback::Utf8(f) => {
                let value = value.map(utf8::to_str_lossy);
                f(element, value.as_deref())
            }
            Callback::Narrow(f) => {
                let value = value.map(|v| element.converter.to_narrow(v));
                f(element, value.as_deref())
            }
            Callback::Wide(f) => match value {
                Some(value) => {
                    element.converter.to_wide_into(value, wide_buf);
                    f(element, Some(wide_buf.as_slice()))
                }
                None => f(element, None),
            },
        }
    }
}

impl Debug for Callback<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Callback::NoValue(_) => "NoValue",
            Callback::Utf8(_) => "Utf8",
            Callback::Narrow(_) => "Narrow",
            Callback::Wide(_) => "Wide",
        };
        write!(f, "Callback::{name}")
    }
}

/// Whether the subscription key is a path, that means it contains `{` or `[`
fn is_path_key(key: &str) -> bool {
    key.bytes().any(|b| b == b'{' || b == b'[')
}

/// Callbacks subscribed to one kind of event
#[derive(Default, Debug)]
pub(crate) struct Publisher<'a> {
    by_name: HashMap<Box<[u8]>, Callback<'a>>,
    by_path: HashMap<Box<[u8]>, Callback<'a>>,
    all: Option<Callback<'a>>,
    /// Reused for converting values to UTF-16
    wide_buf: Vec<u16>,
}

impl<'a> Publisher<'a> {
    /// Subscribes the callback, replacing a previous callback with the same key
    ///
    /// `None` subscribes to all elements.
    pub(crate) fn subscribe(&mut self, key: Option<&str>, callback: Callback<'a>) {
        let Some(key) = key else {
            self.all = Some(callback);
            return;
        };
        let map = if is_path_key(key) {
            &mut self.by_path
        } else {
            &mut self.by_name
        };
        map.insert(key.as_bytes().into(), callback);
    }

    pub(crate) fn unsubscribe(&mut self) {
        self.by_name.clear();
        self.by_path.clear();
        self.all = None;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.by_path.is_empty() && self.all.is_none()
    }

    /// Invokes the callbacks subscribed for the name of the element, for its path and
    /// for all elements
    ///
    /// The three lookups are independent; up to three callbacks are invoked.
    pub(crate) fn notify(&mut self, element: &Element<'_>, value: Option<&[u8]>) {
        if !self.by_name.is_empty() {
            if let Some(callback) = self.by_name.get_mut(element.name_bytes()) {
                callback.invoke(element, value, &mut self.wide_buf);
            }
        }

        if !element.path.is_empty() && !self.by_path.is_empty() {
            if let Some(callback) = self.by_path.get_mut(element.path) {
                callback.invoke(element, value, &mut self.wide_buf);
            }
        }

        if let Some(callback) = &mut self.all {
            callback.invoke(element, value, &mut self.wide_buf);
        }
    }
}

/// Registries for all event kinds
#[derive(Debug)]
pub(crate) struct Publishers<'a>([Publisher<'a>; EventKind::COUNT]);

impl Default for Publishers<'_> {
    fn default() -> Self {
        Publishers(std::array::from_fn(|_| Publisher::default()))
    }
}

impl Publishers<'_> {
    pub(crate) fn unsubscribe(&mut self) {
        self.0.iter_mut().for_each(Publisher::unsubscribe);
    }
}

impl<'a> Index<EventKind> for Publishers<'a> {
    type Output = Publisher<'a>;

    fn index(&self, kind: EventKind) -> &Self::Output {
        &self.0[kind as usize]
    }
}

impl IndexMut<EventKind> for Publishers<'_> {
    fn index_mut(&mut self, kind: EventKind) -> &mut Self::Output {
        &mut self.0[kind as usize]
    }
}
