use indexmap::IndexMap;
use serde_json::Value;

use super::document::{Document, DocumentInfo, InputPort, LinkTarget, OutputPort};

/// A partial update merged into the canonical document by the store.
///
/// Each populated field replaces the corresponding block of the document;
/// absent fields leave it untouched.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub info: Option<DocumentInfo>,
    pub input_ports: Option<Vec<InputPort>>,
    pub output_ports: Option<Vec<OutputPort>>,
    pub tags: Option<Vec<String>>,
    pub links: Option<IndexMap<String, LinkTarget>>,
    pub custom: Option<IndexMap<String, Value>>,
}

impl DocumentPatch {
    pub fn info(info: DocumentInfo) -> Self {
        Self {
            info: Some(info),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_none()
            && self.input_ports.is_none()
            && self.output_ports.is_none()
            && self.tags.is_none()
            && self.links.is_none()
            && self.custom.is_none()
    }

    pub(crate) fn apply_to(self, document: &mut Document) {
        if let Some(info) = self.info {
            document.info = info;
        }
        if let Some(ports) = self.input_ports {
            document.input_ports = ports;
        }
        if let Some(ports) = self.output_ports {
            document.output_ports = ports;
        }
        if let Some(tags) = self.tags {
            document.tags = tags;
        }
        if let Some(links) = self.links {
            document.links = links;
        }
        if let Some(custom) = self.custom {
            document.custom = custom;
        }
    }
}
