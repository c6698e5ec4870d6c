//! Pure transforms between semantically keyed maps and ordered entry lists,
//! plus the idempotent cleanup applied before serialization and persistence.

use indexmap::IndexMap;
use serde_json::Value;

use crate::domain::{Document, DocumentInfo, InputPort, LinkTarget, OutputPort};

/// One map slot in list-editable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    pub key: String,
    pub value: V,
}

impl<V> Entry<V> {
    pub fn new(key: impl Into<String>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// One entry per key, preserving the map's insertion order 1:1.
pub fn to_entries<V: Clone>(map: &IndexMap<String, V>) -> Vec<Entry<V>> {
    map.iter()
        .map(|(key, value)| Entry::new(key.clone(), value.clone()))
        .collect()
}

/// Left-to-right fold of entries back into a map.
///
/// Entries sharing a key overwrite earlier ones; entries whose key is empty
/// (or whitespace only) are dropped.
pub fn to_map<V: Clone>(entries: &[Entry<V>]) -> IndexMap<String, V> {
    let mut map = IndexMap::new();
    for entry in entries {
        let key = entry.key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_string(), entry.value.clone());
    }
    map
}

/// Entry list of a raw JSON value. Non-object input yields an empty list.
pub fn value_entries(value: &Value) -> Vec<Entry<Value>> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| Entry::new(key.clone(), value.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Deep copy of the document with abandoned optional content removed.
///
/// Optional scalars that are empty become absent, blank tags are dropped,
/// and `custom` entries whose value is `null` or `""` are removed. Empty
/// collections disappear at serialization time. Idempotent.
pub fn clean(document: &Document) -> Document {
    let mut doc = document.clone();
    doc.id = none_if_blank(doc.id.take());
    clean_info(&mut doc.info);
    doc.tags.retain(|tag| !tag.trim().is_empty());
    doc.links = clean_links(&doc.links);
    doc.custom = clean_custom(&doc.custom);
    for port in &mut doc.input_ports {
        clean_input_port(port);
    }
    for port in &mut doc.output_ports {
        clean_output_port(port);
    }
    doc
}

fn clean_info(info: &mut DocumentInfo) {
    info.domain = none_if_blank(info.domain.take());
    info.description = none_if_blank(info.description.take());
    info.status = none_if_blank(info.status.take());
    info.archetype = none_if_blank(info.archetype.take());
}

fn clean_input_port(port: &mut InputPort) {
    port.id = none_if_blank(port.id.take());
    port.description = none_if_blank(port.description.take());
    port.tags.retain(|tag| !tag.trim().is_empty());
    port.links = clean_links(&port.links);
    port.custom = clean_custom(&port.custom);
}

fn clean_output_port(port: &mut OutputPort) {
    port.id = none_if_blank(port.id.take());
    port.description = none_if_blank(port.description.take());
    port.tags.retain(|tag| !tag.trim().is_empty());
    port.links = clean_links(&port.links);
    port.custom = clean_custom(&port.custom);
}

fn clean_links(links: &IndexMap<String, LinkTarget>) -> IndexMap<String, LinkTarget> {
    links
        .iter()
        .map(|(key, target)| {
            (
                key.clone(),
                LinkTarget {
                    url: target.url.clone(),
                    description: none_if_blank(target.description.clone()),
                },
            )
        })
        .collect()
}

fn clean_custom(custom: &IndexMap<String, Value>) -> IndexMap<String, Value> {
    custom
        .iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(text) => !text.is_empty(),
            _ => true,
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
