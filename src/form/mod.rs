//! Form-view working state: typed edit buffers the embedding UI binds to,
//! materialized into the canonical document through the codec.

mod entry_list;
mod group;
mod port;
mod tags;

pub use entry_list::EntryListState;
pub use group::{GroupEntry, GroupListState};
pub use port::{LinkDraft, PortDraft};
pub use tags::TagListState;

use serde_json::Value;

use crate::domain::{Document, DocumentInfo};

/// Edit buffers for the `info` block. Optional fields buffer as plain
/// strings; blanks materialize as absent.
#[derive(Debug, Clone, Default)]
pub struct InfoDraft {
    pub title: String,
    pub owner: String,
    pub domain: String,
    pub description: String,
    pub status: String,
    pub archetype: String,
}

impl InfoDraft {
    fn from_info(info: &DocumentInfo) -> Self {
        Self {
            title: info.title.clone(),
            owner: info.owner.clone(),
            domain: info.domain.clone().unwrap_or_default(),
            description: info.description.clone().unwrap_or_default(),
            status: info.status.clone().unwrap_or_default(),
            archetype: info.archetype.clone().unwrap_or_default(),
        }
    }

    fn to_info(&self) -> DocumentInfo {
        DocumentInfo {
            title: self.title.clone(),
            owner: self.owner.clone(),
            domain: optional(&self.domain),
            description: optional(&self.description),
            status: optional(&self.status),
            archetype: optional(&self.archetype),
        }
    }
}

/// The whole form view: one draft per editable block of the document.
#[derive(Debug, Clone, Default)]
pub struct FormModel {
    pub info: InfoDraft,
    pub tags: TagListState,
    pub links: EntryListState<LinkDraft>,
    pub custom: EntryListState<Value>,
    pub input_ports: GroupListState<PortDraft>,
    pub output_ports: GroupListState<PortDraft>,
}

impl FormModel {
    pub fn from_document(document: &Document) -> Self {
        Self {
            info: InfoDraft::from_info(&document.info),
            tags: TagListState::seed(document.tags.clone()),
            links: EntryListState::from_map(
                &document
                    .links
                    .iter()
                    .map(|(key, target)| (key.clone(), LinkDraft::from_target(target)))
                    .collect(),
            ),
            custom: EntryListState::from_map(&document.custom),
            input_ports: GroupListState::seed(
                document.input_ports.iter().map(PortDraft::from_input).collect(),
            ),
            output_ports: GroupListState::seed(
                document.output_ports.iter().map(PortDraft::from_output).collect(),
            ),
        }
    }

    /// Rebuild a document from the form buffers, carrying over the fields
    /// the form does not edit (id, contract version, lifecycle stamps).
    pub fn materialize_into(&self, base: &Document) -> Document {
        let mut document = base.clone();
        document.info = self.info.to_info();
        document.tags = self.tags.to_vec();
        document.links = port::link_targets(&self.links.build_map());
        document.custom = self.custom.build_map();
        document.input_ports = self.input_ports.items().map(PortDraft::to_input).collect();
        document.output_ports = self.output_ports.items().map(PortDraft::to_output).collect();
        document
    }
}

fn optional(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn populated_document() -> Document {
        serde_json::from_value(json!({
            "info": {
                "title": "Orders",
                "owner": "sales",
                "domain": "commerce",
            },
            "id": "d-1",
            "tags": ["gold", "pii", "gold"],
            "links": {"docs": {"url": "http://docs", "description": "manual"}},
            "custom": {"slo": 99.9},
            "inputPorts": [
                {"name": "raw", "source": "warehouse.raw"},
                {"name": "events", "source": "topic.events"},
            ],
            "outputPorts": [{"name": "clean", "target": "lake.clean"}],
        }))
        .unwrap()
    }

    #[test]
    fn seed_then_materialize_round_trips() {
        let document = populated_document();
        let form = FormModel::from_document(&document);
        assert_eq!(form.materialize_into(&document), document);
    }

    #[test]
    fn materialize_carries_unedited_fields_from_base() {
        let document = populated_document();
        let form = FormModel::from_document(&document);
        let rebuilt = form.materialize_into(&document);
        assert_eq!(rebuilt.id.as_deref(), Some("d-1"));
        assert_eq!(rebuilt.data_product_specification, "0.0.1");
    }

    #[test]
    fn port_order_is_preserved_verbatim() {
        let document = populated_document();
        let mut form = FormModel::from_document(&document);
        form.input_ports.append(PortDraft {
            name: "late".to_string(),
            reference: "topic.late".to_string(),
            ..PortDraft::default()
        });
        let rebuilt = form.materialize_into(&document);
        let names: Vec<_> = rebuilt.input_ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["raw", "events", "late"]);
    }

    #[test]
    fn blank_optional_info_fields_materialize_as_absent() {
        let mut form = FormModel::default();
        form.info.title = "T".to_string();
        form.info.owner = "O".to_string();
        form.info.domain = "  ".to_string();
        let document = form.materialize_into(&Document::draft());
        assert_eq!(document.info.domain, None);
        assert_eq!(document.info.title, "T");
    }
}
