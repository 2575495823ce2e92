//! Common library module for integration tests
// See https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

use std::{cell::RefCell, collections::BTreeSet, path::PathBuf, rc::Rc};

use json_notify::{
    events::{Callback, Element, EventKind},
    reader::{JsonReader, ReaderError},
};
use strum::IntoEnumIterator;

pub fn get_test_data_file_path() -> PathBuf {
    // Get path of test file, see https://stackoverflow.com/a/30004252
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/test_data.json");
    path
}

/// Event as seen by a callback
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Event {
    pub kind: EventKind,
    pub name: String,
    pub path: String,
    pub value: Option<String>,
    pub is_value_quoted: bool,
    pub is_array_item_value: bool,
}

impl Event {
    pub fn new(element: &Element<'_>, value: Option<&str>) -> Self {
        Event {
            kind: element.kind(),
            name: element.name().into_owned(),
            path: element.path().into_owned(),
            value: value.map(str::to_owned),
            is_value_quoted: element.is_value_quoted(),
            is_array_item_value: element.is_array_item_value(),
        }
    }
}

/// Subscribes callbacks recording all events of the next read
pub fn subscribe_all(json_reader: &mut JsonReader<'_>) -> Rc<RefCell<Vec<Event>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    for kind in EventKind::iter() {
        let events = Rc::clone(&events);
        json_reader.subscribe(
            kind,
            None,
            Callback::utf8(move |element, value| {
                events.borrow_mut().push(Event::new(element, value));
            }),
        );
    }
    events
}

/// Reads the JSON data and returns all events
pub fn read_events(json: &str) -> Result<Vec<Event>, ReaderError> {
    let mut json_reader = JsonReader::new();
    let events = subscribe_all(&mut json_reader);
    json_reader.read_buffer(json.as_bytes())?;
    Ok(events.take())
}

/// Computes the paths of a JSON document from its `serde_json` representation
pub fn expected_paths(value: &serde_json::Value) -> BTreeSet<String> {
    fn collect(prefix: &str, value: &serde_json::Value, paths: &mut BTreeSet<String>) {
        match value {
            serde_json::Value::Object(members) => {
                let object_path = format!("{prefix}{{");
                for (name, value) in members {
                    collect(&format!("{object_path}{name}"), value, paths);
                }
                paths.insert(object_path);
            }
            serde_json::Value::Array(items) => {
                let array_path = format!("{prefix}[");
                for item in items {
                    // Scalar array items have no path of their own
                    if item.is_object() || item.is_array() {
                        collect(&array_path, item, paths);
                    }
                }
                paths.insert(array_path);
            }
            _ => {
                paths.insert(prefix.to_owned());
            }
        }
    }

    let mut paths = BTreeSet::new();
    collect("", value, &mut paths);
    paths
}
