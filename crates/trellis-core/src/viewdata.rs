//! Persisted view-data store.
//!
//! A hierarchical key/value blob keyed by slash-separated view-data key
//! paths. Views save their restorable state (selected ids, scroll offset,
//! expanded ids) here on every mutating operation and restore it on attach.
//! The host decides when and where the blob itself is persisted; the store
//! round-trips through JSON for that purpose.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct ViewDataStore {
    root: Rc<RefCell<Map<String, Value>>>,
}

impl ViewDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `path` ("a/b/c" creates nested objects).
    /// Serialization failures are logged and dropped; persistence must never
    /// take down an interactive view.
    pub fn save<T: Serialize>(&self, path: &str, value: &T) {
        let json = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("view data for '{path}' failed to serialize: {e}");
                return;
            }
        };
        let mut root = self.root.borrow_mut();
        let mut node = &mut *root;
        let mut parts = path.split('/').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                node.insert(part.to_string(), json);
                return;
            }
            let entry = node
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = entry.as_object_mut().unwrap();
        }
    }

    pub fn load<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let root = self.root.borrow();
        let mut parts = path.split('/');
        let mut node = root.get(parts.next()?)?;
        for part in parts {
            node = node.as_object()?.get(part)?;
        }
        serde_json::from_value(node.clone()).ok()
    }

    pub fn remove(&self, path: &str) {
        let mut root = self.root.borrow_mut();
        let mut node = &mut *root;
        let mut parts = path.split('/').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                node.remove(part);
                return;
            }
            match node.get_mut(part).and_then(|v| v.as_object_mut()) {
                Some(m) => node = m,
                None => return,
            }
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.root.borrow().clone())
    }

    pub fn from_json(value: Value) -> Self {
        let map = value.as_object().cloned().unwrap_or_default();
        Self {
            root: Rc::new(RefCell::new(map)),
        }
    }
}
