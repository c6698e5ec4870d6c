use indexmap::IndexMap;
use serde_json::Value;

use crate::domain::{InputPort, LinkTarget, OutputPort};

use super::entry_list::EntryListState;
use super::tags::TagListState;

/// Form-side working copy of one link map entry's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkDraft {
    pub url: String,
    pub description: String,
}

impl LinkDraft {
    pub fn from_target(target: &LinkTarget) -> Self {
        Self {
            url: target.url.clone(),
            description: target.description.clone().unwrap_or_default(),
        }
    }

    pub fn to_target(&self) -> LinkTarget {
        LinkTarget {
            url: self.url.clone(),
            description: if self.description.trim().is_empty() {
                None
            } else {
                Some(self.description.clone())
            },
        }
    }
}

/// Form-side working copy of one port, with its own embedded map editors.
#[derive(Debug, Clone, Default)]
pub struct PortDraft {
    pub id: Option<String>,
    pub name: String,
    /// Source reference for input ports, target reference for output ports.
    pub reference: String,
    pub description: String,
    pub tags: TagListState,
    pub links: EntryListState<LinkDraft>,
    pub custom: EntryListState<Value>,
}

impl PortDraft {
    pub fn from_input(port: &InputPort) -> Self {
        Self {
            id: port.id.clone(),
            name: port.name.clone(),
            reference: port.source.clone(),
            description: port.description.clone().unwrap_or_default(),
            tags: TagListState::seed(port.tags.clone()),
            links: EntryListState::from_map(&link_drafts(&port.links)),
            custom: EntryListState::from_map(&port.custom),
        }
    }

    pub fn from_output(port: &OutputPort) -> Self {
        Self {
            id: port.id.clone(),
            name: port.name.clone(),
            reference: port.target.clone(),
            description: port.description.clone().unwrap_or_default(),
            tags: TagListState::seed(port.tags.clone()),
            links: EntryListState::from_map(&link_drafts(&port.links)),
            custom: EntryListState::from_map(&port.custom),
        }
    }

    pub fn to_input(&self) -> InputPort {
        InputPort {
            id: self.id.clone(),
            name: self.name.clone(),
            source: self.reference.clone(),
            description: optional(&self.description),
            tags: self.tags.to_vec(),
            links: link_targets(&self.links.build_map()),
            custom: self.custom.build_map(),
        }
    }

    pub fn to_output(&self) -> OutputPort {
        OutputPort {
            id: self.id.clone(),
            name: self.name.clone(),
            target: self.reference.clone(),
            description: optional(&self.description),
            tags: self.tags.to_vec(),
            links: link_targets(&self.links.build_map()),
            custom: self.custom.build_map(),
        }
    }
}

fn optional(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn link_drafts(links: &IndexMap<String, LinkTarget>) -> IndexMap<String, LinkDraft> {
    links
        .iter()
        .map(|(key, target)| (key.clone(), LinkDraft::from_target(target)))
        .collect()
}

pub(super) fn link_targets(drafts: &IndexMap<String, LinkDraft>) -> IndexMap<String, LinkTarget> {
    drafts
        .iter()
        .map(|(key, draft)| (key.clone(), draft.to_target()))
        .collect()
}
