use super::{Document, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(super) fn to_html(document: &Document) -> String {
    let mut out = String::from("<!DOCTYPE html>");
    for &root in document.roots() {
        write_node(document, root, false, &mut out);
    }
    out
}

fn write_node(document: &Document, id: NodeId, raw_text: bool, out: &mut String) {
    let Some(node) = document.node(id) else {
        return;
    };
    let element = match &node.kind {
        NodeKind::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
            return;
        }
        NodeKind::Element(element) => element,
    };
    let tag = element.tag.as_str();

    out.push('<');
    out.push_str(tag);
    let mut wrote_value = false;
    for (key, value) in &element.attrs {
        match (tag, key.as_str()) {
            ("option", "selected") => continue,
            ("input", "value") => {
                write_attr(out, key, document.live_value(id).unwrap_or(value));
                wrote_value = true;
            }
            _ => write_attr(out, key, value),
        }
    }
    if tag == "input" && !wrote_value {
        if let Some(live) = document.live_value(id).filter(|live| !live.is_empty()) {
            write_attr(out, "value", live);
        }
    }
    if tag == "option" && document.is_selected(id) {
        out.push_str(" selected");
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&tag) {
        return;
    }

    if tag == "textarea" {
        out.push_str(&escape_text(document.live_value(id).unwrap_or_default()));
    } else {
        let raw = RAW_TEXT_ELEMENTS.contains(&tag);
        for &child in document.children(id) {
            write_node(document, child, raw, out);
        }
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(input: &str) -> String {
    input.replace('&', "&amp;").replace('"', "&quot;")
}
