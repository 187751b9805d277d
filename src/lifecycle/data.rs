//! Per-element side tables: arbitrary data and animation descriptors.
//!
//! Keys are normalized the way the host names dataset properties: every
//! `-<letter>` collapses into the uppercase letter, so `user-id` and
//! `userId` are the same key and line up with the `data-user-id` attribute.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use slotmap::SecondaryMap;

use crate::css::declarations::{camel_case, kebab_case};
use crate::dom::node::NodeId;
use crate::dom::tree::Dom;

use super::animation::AnimationDescriptor;

const DATA_PREFIX: &str = "data-";

/// Store a value as text: strings verbatim, everything else as JSON.
fn encode(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read stored text back, falling back to the raw string when it is not
/// JSON.
fn decode(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Side tables keyed by node identity.
///
/// Generational keys mean a stale id never reads the data of a node that
/// later reused its slot.
#[derive(Debug, Default)]
pub struct ElementStore {
    data: SecondaryMap<NodeId, BTreeMap<String, String>>,
    pub(crate) animations: SecondaryMap<NodeId, AnimationDescriptor>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under the normalized `key`.
    ///
    /// Strings are kept as text and every read parses text as JSON, the
    /// same as `data-*` attributes. A string that is itself valid JSON
    /// therefore reads back parsed: `"42"` as the number 42, `"true"` as a
    /// bool, `"[1]"` as an array.
    pub fn set_data(&mut self, element: NodeId, key: &str, value: impl Into<Value>) {
        let Some(entry) = self.data.entry(element) else {
            return;
        };
        entry.or_default().insert(camel_case(key), encode(&value.into()));
    }

    /// Read `key`, falling back to the element's `data-*` attribute.
    pub fn data(&self, dom: &Dom, element: NodeId, key: &str) -> Option<Value> {
        let key = camel_case(key);
        if let Some(raw) = self.data.get(element).and_then(|table| table.get(&key)) {
            return Some(decode(raw));
        }
        let attribute = format!("{DATA_PREFIX}{}", kebab_case(&key));
        dom.attr(element, &attribute).map(|raw| decode(&raw))
    }

    /// Every key: `data-*` attributes first, overridden by stored values.
    pub fn data_all(&self, dom: &Dom, element: NodeId) -> Map<String, Value> {
        let mut all = Map::new();
        if let Some(node) = dom.get(element) {
            for (name, raw) in &node.attributes {
                if let Some(suffix) = name.strip_prefix(DATA_PREFIX) {
                    all.insert(camel_case(suffix), decode(raw));
                }
            }
        }
        if let Some(table) = self.data.get(element) {
            for (key, raw) in table {
                all.insert(key.clone(), decode(raw));
            }
        }
        all
    }

    /// Whether anything is stored for `element` in the side table.
    pub fn has_data(&self, element: NodeId) -> bool {
        self.data.get(element).is_some_and(|table| !table.is_empty())
    }

    /// Remove one key, or every key when `key` is `None`, from the side
    /// table and the matching `data-*` attributes.
    pub fn remove_data(&mut self, dom: &mut Dom, element: NodeId, key: Option<&str>) {
        match key {
            Some(key) => {
                let key = camel_case(key);
                if let Some(table) = self.data.get_mut(element) {
                    table.remove(&key);
                    if table.is_empty() {
                        self.data.remove(element);
                    }
                }
                dom.remove_attr(element, &format!("{DATA_PREFIX}{}", kebab_case(&key)));
            }
            None => {
                self.data.remove(element);
                let names: Vec<String> = dom
                    .get(element)
                    .map(|node| {
                        node.attributes
                            .iter()
                            .filter(|(name, _)| name.starts_with(DATA_PREFIX))
                            .map(|(name, _)| name.clone())
                            .collect()
                    })
                    .unwrap_or_default();
                for name in names {
                    dom.remove_attr(element, &name);
                }
            }
        }
    }

    /// Drop the side-table data of a removed element.
    pub fn forget(&mut self, element: NodeId) {
        self.data.remove(element);
        self.animations.remove(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fragment::load_html;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fixture() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        load_html(&mut dom, r#"<div id="el" data-user-id="42" data-label="hi" data-conf='{"a":1}'></div>"#).unwrap();
        let el = dom.get_element_by_id("el").unwrap();
        (dom, el)
    }

    #[test]
    fn object_round_trip() {
        let (dom, el) = fixture();
        let mut store = ElementStore::new();
        store.set_data(el, "foo", json!({"a": 1}));
        assert_eq!(store.data(&dom, el, "foo"), Some(json!({"a": 1})));
    }

    #[test]
    fn strings_are_stored_verbatim() {
        let (dom, el) = fixture();
        let mut store = ElementStore::new();
        store.set_data(el, "name", "plain text");
        assert_eq!(store.data(&dom, el, "name"), Some(json!("plain text")));
        // Malformed JSON reads back as the raw string.
        store.set_data(el, "broken", "{not json");
        assert_eq!(store.data(&dom, el, "broken"), Some(json!("{not json")));
    }

    #[test]
    fn json_looking_strings_read_back_parsed() {
        let (dom, el) = fixture();
        let mut store = ElementStore::new();
        store.set_data(el, "count", "42");
        store.set_data(el, "flag", "true");
        store.set_data(el, "quoted", "\"42\"");
        assert_eq!(store.data(&dom, el, "count"), Some(json!(42)));
        assert_eq!(store.data(&dom, el, "flag"), Some(json!(true)));
        assert_eq!(store.data(&dom, el, "quoted"), Some(json!("42")));
    }

    #[test]
    fn keys_are_normalized() {
        let (dom, el) = fixture();
        let mut store = ElementStore::new();
        store.set_data(el, "last-seen", 3);
        assert_eq!(store.data(&dom, el, "lastSeen"), Some(json!(3)));
        assert_eq!(store.data(&dom, el, "last-seen"), Some(json!(3)));
    }

    #[test]
    fn falls_back_to_dataset_attributes() {
        let (dom, el) = fixture();
        let store = ElementStore::new();
        assert_eq!(store.data(&dom, el, "userId"), Some(json!(42)));
        assert_eq!(store.data(&dom, el, "user-id"), Some(json!(42)));
        assert_eq!(store.data(&dom, el, "label"), Some(json!("hi")));
        assert_eq!(store.data(&dom, el, "conf"), Some(json!({"a": 1})));
        assert_eq!(store.data(&dom, el, "missing"), None);
    }

    #[test]
    fn stored_value_shadows_attribute() {
        let (dom, el) = fixture();
        let mut store = ElementStore::new();
        store.set_data(el, "label", json!([1, 2]));
        assert_eq!(store.data(&dom, el, "label"), Some(json!([1, 2])));
        let all = store.data_all(&dom, el);
        assert_eq!(all.get("label"), Some(&json!([1, 2])));
        assert_eq!(all.get("userId"), Some(&json!(42)));
    }

    #[test]
    fn remove_one_key() {
        let (mut dom, el) = fixture();
        let mut store = ElementStore::new();
        store.set_data(el, "userId", 7);
        store.set_data(el, "other", true);
        store.remove_data(&mut dom, el, Some("user-id"));
        assert_eq!(store.data(&dom, el, "userId"), None);
        assert_eq!(store.data(&dom, el, "other"), Some(json!(true)));
        assert!(dom.attr(el, "data-label").is_some());
    }

    #[test]
    fn remove_all_keys() {
        let (mut dom, el) = fixture();
        let mut store = ElementStore::new();
        store.set_data(el, "x", 1);
        store.remove_data(&mut dom, el, None);
        assert!(!store.has_data(el));
        assert!(store.data_all(&dom, el).is_empty());
        assert_eq!(dom.attr(el, "id").as_deref(), Some("el"));
    }

    #[test]
    fn forget_drops_data() {
        let (dom, el) = fixture();
        let mut store = ElementStore::new();
        store.set_data(el, "x", 1);
        store.forget(el);
        assert!(!store.has_data(el));
        assert_eq!(store.data(&dom, el, "x"), None);
    }
}
