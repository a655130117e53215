//! Form Applier: writes validated assignments into the live document.
//!
//! A selector is first looked up among the ids the extractor hands out for the
//! current document, so an id copied from a descriptor always lands on that
//! descriptor's control. Anything else goes through the attribute and label
//! fallbacks. Assignments with no matching control are skipped: dynamic and
//! partially loaded forms routinely lack fields the matcher proposed.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::dom::{Document, NodeId, VALUE_CONTROLS};
use crate::form::extractor::extract_with_nodes;
use crate::form::labels::caption_text;
use crate::models::fill::FillAssignment;

/// How an assignment's selector was resolved to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Id,
    Name,
    Placeholder,
    LabelAdjacent,
    /// A minted `field-N` id from extraction.
    Synthetic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub applied: usize,
    /// Selectors that matched no control, in assignment order.
    pub unresolved: Vec<String>,
}

/// The only component allowed to mutate the document during a fill.
pub trait FormApplier: Send + Sync {
    fn apply(&self, assignments: &[FillAssignment], document: &mut Document) -> ApplyReport;
}

/// Default applier over the owned DOM.
pub struct DomApplier;

impl FormApplier for DomApplier {
    fn apply(&self, assignments: &[FillAssignment], document: &mut Document) -> ApplyReport {
        let mut report = ApplyReport::default();
        // Writing values never changes what extraction sees, so one index serves the pass.
        let fields = FieldIndex::build(document);

        for assignment in assignments {
            let Some((node, resolution)) = fields.resolve(document, &assignment.selector) else {
                debug!(selector = %assignment.selector, "no element for assignment");
                report.unresolved.push(assignment.selector.clone());
                continue;
            };

            if !document.set_value(node, &assignment.value) {
                debug!(
                    selector = %assignment.selector,
                    "control rejected value (no matching option)"
                );
                report.unresolved.push(assignment.selector.clone());
                continue;
            }

            document.dispatch_change(node);
            debug!(selector = %assignment.selector, ?resolution, "applied assignment");
            report.applied += 1;
        }

        report
    }
}

/// Extracted field ids of value controls, mapped back to their nodes.
struct FieldIndex {
    by_id: HashMap<String, (NodeId, Resolution)>,
}

impl FieldIndex {
    fn build(document: &Document) -> Self {
        let by_id = extract_with_nodes(document)
            .into_iter()
            .filter(|(node, _)| is_control(document, *node))
            .map(|(node, field)| {
                let resolution = if field.id == field.dom_id {
                    Resolution::Id
                } else if field.id == field.name {
                    Resolution::Name
                } else {
                    Resolution::Synthetic
                };
                (field.id, (node, resolution))
            })
            .collect();
        Self { by_id }
    }

    fn resolve(&self, document: &Document, selector: &str) -> Option<(NodeId, Resolution)> {
        if selector.is_empty() {
            return None;
        }
        self.by_id
            .get(selector)
            .copied()
            .or_else(|| resolve_by_attributes(document, selector))
    }
}

/// Finds the control a selector refers to. Extracted field ids win; after
/// that the first fallback to hit wins.
pub fn resolve_element(document: &Document, selector: &str) -> Option<(NodeId, Resolution)> {
    FieldIndex::build(document).resolve(document, selector)
}

fn resolve_by_attributes(document: &Document, selector: &str) -> Option<(NodeId, Resolution)> {
    by_attr(document, "id", selector)
        .map(|node| (node, Resolution::Id))
        .or_else(|| by_attr(document, "name", selector).map(|node| (node, Resolution::Name)))
        .or_else(|| {
            by_attr(document, "placeholder", selector).map(|node| (node, Resolution::Placeholder))
        })
        .or_else(|| by_label(document, selector).map(|node| (node, Resolution::LabelAdjacent)))
}

fn is_control(document: &Document, node: NodeId) -> bool {
    document
        .tag(node)
        .is_some_and(|tag| VALUE_CONTROLS.contains(&tag))
}

fn by_attr(document: &Document, attr: &str, selector: &str) -> Option<NodeId> {
    document
        .elements_by_tag(VALUE_CONTROLS)
        .find(|&node| document.attr(node, attr) == Some(selector))
}

/// A label whose text contains `selector`, immediately followed by a control.
fn by_label(document: &Document, selector: &str) -> Option<NodeId> {
    document
        .elements_by_tag(&["label"])
        .filter(|&label| caption_text(document, label).contains(selector))
        .find_map(|label| {
            document
                .next_element_sibling(label)
                .filter(|&sibling| is_control(document, sibling))
        })
}
