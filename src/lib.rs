#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Allow needless `return` because that makes it sometimes more obvious that
// an expression is the result of the function
#![allow(clippy::needless_return)]
// Allow `assert_eq!(true, ...)` because in some cases it is used to check a bool
// value and not a 'flag' / 'state', and `assert_eq!` makes that more explicit
#![allow(clippy::bool_assert_comparison)]
// Enable 'unused' warnings for doc tests (are disabled by default)
#![doc(test(no_crate_inject))]
#![doc(test(attr(warn(unused))))]
// Fail on warnings in doc tests
#![doc(test(attr(deny(warnings))))]
// When `docsrs` configuration flag is set enable banner for features in documentation
// See https://stackoverflow.com/q/61417452
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! json_notify is an event based streaming JSON reader.
//!
//! Instead of building a document tree, the reader reads the JSON data in a single
//! pass and notifies callbacks about the elements it encounters. Callbacks are
//! subscribed for a member *name* such as `id`, or for a *path* such as
//! `{data{users[{id`, which identifies the member `id` inside the objects of the
//! `users` array of the `data` object. This makes it possible to extract a few values
//! from large JSON documents with little memory.
//!
//! # Terminology
//!
//! - *object*: `{ ... }`
//!   - *member*: Entry in an object. For example the JSON object `{"a": 1}` has the member
//!     `"a": 1` where `"a"` is the member *name* and `1` is the member *value*.
//! - *array*: `[ ... ]`
//! - *literal*: `true`, `false` or `null`
//! - *number*: number value, for example `123.4e+10`
//! - *string*: string value, for example `"text in \"quotes\""`
//!
//! # Usage example
//!
//! ```
//! # use json_notify::reader::*;
//! // In this example JSON data comes from a string;
//! // normally it would come from a file, see `JsonReader::read_file`
//! let json = r#"{"a": [1, "x"], "b": {"a": true}}"#;
//!
//! // Callbacks borrow these, so they have to be declared before the reader
//! let mut items = Vec::new();
//! let mut nested_a = None;
//!
//! let mut json_reader = JsonReader::new();
//! // Discover the paths of the document
//! let paths = json_reader.paths_from_buffer(json.as_bytes())?;
//! assert_eq!(vec!["{", "{a[", "{b{", "{b{a"], paths.into_iter().collect::<Vec<_>>());
//!
//! // Subscriptions only last for one read
//! json_reader.on_array_item(Some("a"), |element, value| {
//!     items.push((value.unwrap_or_default().to_owned(), element.is_value_quoted()));
//! });
//! json_reader.on_pair(Some("{b{a"), |_, value| nested_a = value.map(str::to_owned));
//! json_reader.read_buffer(json.as_bytes())?;
//! drop(json_reader);
//!
//! assert_eq!(vec![("1".to_owned(), false), ("x".to_owned(), true)], items);
//! assert_eq!(Some("true".to_owned()), nested_a);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Serde integration
//! With the optional `serde` feature [`ReaderSettings`](reader::ReaderSettings)
//! implements `Serialize` and `Deserialize`, so that it can be part of a configuration file.

pub mod events;
pub mod reader;

mod convert;
mod input;
mod text;
mod utf8;
