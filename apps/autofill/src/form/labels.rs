//! Label resolution for a single form control.

use crate::dom::{collapse_whitespace, Document, NodeId, NodeKind};

/// Subtrees whose text never belongs to a caption.
const CAPTION_SKIP: &[&str] = &["select", "option", "textarea", "script", "style"];

/// Returns the best human-readable caption for `field`, or `""`.
///
/// Priority, first non-empty hit wins:
/// 1. `<label for="...">` pointing at the field's `id` attribute
/// 2. an ancestor `<label>` wrapping the field
/// 3. the first non-empty text node directly under the field's parent
///
/// A matching label with no caption text does not end the search; the next
/// source is tried, so `<label for="x"></label>` never blanks a field that a
/// wrapping label describes.
pub fn resolve_label(document: &Document, field: NodeId) -> String {
    label_by_for(document, field)
        .or_else(|| wrapping_label(document, field))
        .or_else(|| parent_text(document, field))
        .unwrap_or_default()
}

fn label_by_for(document: &Document, field: NodeId) -> Option<String> {
    let dom_id = document.attr(field, "id").filter(|id| !id.is_empty())?;
    document
        .elements_by_tag(&["label"])
        .find(|&label| document.attr(label, "for") == Some(dom_id))
        .map(|label| caption_text(document, label))
        .filter(|text| !text.is_empty())
}

fn wrapping_label(document: &Document, field: NodeId) -> Option<String> {
    document
        .closest(field, "label")
        .map(|label| caption_text(document, label))
        .filter(|text| !text.is_empty())
}

fn parent_text(document: &Document, field: NodeId) -> Option<String> {
    let parent = document.parent(field)?;
    document
        .children(parent)
        .iter()
        .filter_map(|&child| match &document.node(child)?.kind {
            NodeKind::Text(text) => Some(text.trim()),
            NodeKind::Element(_) => None,
        })
        .find(|text| !text.is_empty())
        .map(collapse_whitespace)
}

/// Trimmed, whitespace-collapsed text of a label element.
pub fn caption_text(document: &Document, label: NodeId) -> String {
    collapse_whitespace(&document.text_content_skipping(label, CAPTION_SKIP))
}
