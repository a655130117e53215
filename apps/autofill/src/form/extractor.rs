//! Field extraction: a read-only walk that describes every form control on the page.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};
use crate::form::labels::resolve_label;

/// Tags that produce a descriptor.
pub const FIELD_TAGS: &[&str] = &["form", "input", "select", "textarea"];

/// `type` values an `<input>` reports as-is; anything else reads as `"text"`.
const INPUT_TYPES: &[&str] = &[
    "button",
    "checkbox",
    "color",
    "date",
    "datetime-local",
    "email",
    "file",
    "hidden",
    "image",
    "month",
    "number",
    "password",
    "radio",
    "range",
    "reset",
    "search",
    "submit",
    "tel",
    "text",
    "time",
    "url",
    "week",
];

/// Prefix of ids minted for controls with neither `id` nor `name`.
pub const SYNTHETIC_PREFIX: &str = "field-";

/// Normalized description of one form control. Absent attributes are `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    /// Unique within one extraction pass.
    pub id: String,
    pub tag: String,
    #[serde(rename = "type")]
    pub control_type: String,
    pub dom_id: String,
    pub name: String,
    pub placeholder: String,
    pub label: String,
    pub required: bool,
    pub options: Vec<String>,
}

/// Subset of a descriptor sent to the matching collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct PromptField<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub control_type: &'a str,
}

impl FieldDescriptor {
    pub fn for_prompt(&self) -> PromptField<'_> {
        PromptField {
            id: &self.id,
            name: &self.name,
            control_type: &self.control_type,
        }
    }
}

pub fn extract_fields(document: &Document) -> Vec<FieldDescriptor> {
    extract_with_nodes(document)
        .into_iter()
        .map(|(_, descriptor)| descriptor)
        .collect()
}

/// Like [`extract_fields`], keeping the arena node of each descriptor.
pub fn extract_with_nodes(document: &Document) -> Vec<(NodeId, FieldDescriptor)> {
    let mut used: HashSet<String> = HashSet::new();

    document
        .elements_by_tag(FIELD_TAGS)
        .enumerate()
        .map(|(ordinal, node)| {
            let tag = document.tag(node).unwrap_or_default().to_string();
            let attr = |name: &str| document.attr(node, name).unwrap_or_default().to_string();

            let dom_id = attr("id");
            let name = attr("name");
            let id = stable_id(&mut used, ordinal, &dom_id, &name);
            let options = if tag == "select" {
                document
                    .options(node)
                    .into_iter()
                    .map(|option| document.option_text(option))
                    .collect()
            } else {
                Vec::new()
            };

            let descriptor = FieldDescriptor {
                id,
                control_type: control_type(document, node, &tag),
                placeholder: attr("placeholder"),
                label: resolve_label(document, node),
                required: document
                    .element(node)
                    .is_some_and(|element| element.has_attr("required")),
                options,
                dom_id,
                name,
                tag,
            };
            (node, descriptor)
        })
        .collect()
}

fn stable_id(used: &mut HashSet<String>, ordinal: usize, dom_id: &str, name: &str) -> String {
    let candidate = [dom_id, name]
        .into_iter()
        .find(|candidate| !candidate.is_empty() && !used.contains(*candidate))
        .map(str::to_string)
        .unwrap_or_else(|| {
            let base = format!("{SYNTHETIC_PREFIX}{ordinal}");
            let mut candidate = base.clone();
            let mut suffix = 1;
            while used.contains(&candidate) {
                candidate = format!("{base}-{suffix}");
                suffix += 1;
            }
            candidate
        });
    used.insert(candidate.clone());
    candidate
}

fn control_type(document: &Document, node: NodeId, tag: &str) -> String {
    match tag {
        "input" => document
            .attr(node, "type")
            .map(|kind| kind.trim().to_ascii_lowercase())
            .filter(|kind| INPUT_TYPES.contains(&kind.as_str()))
            .unwrap_or_else(|| "text".to_string()),
        "select" if document.attr(node, "multiple").is_some() => "select-multiple".to_string(),
        "select" => "select-one".to_string(),
        "textarea" => "textarea".to_string(),
        _ => String::new(),
    }
}
