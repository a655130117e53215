//! Owned, mutable DOM for one page.
//!
//! HTML is parsed with `scraper` and copied into an arena in pre-order, so node
//! index order is document order. Controls carry a live value separate from
//! their attributes, the way a browser keeps `element.value` apart from the
//! `value` attribute.

mod serialize;

use scraper::{node::Node as ScraperNode, Html};
use serde::Serialize;

pub type NodeId = usize;

/// Tags whose live value can be written by a fill.
pub const VALUE_CONTROLS: &[&str] = &["input", "select", "textarea"];

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercase local name.
    pub tag: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    /// Live value for `input` and `textarea`.
    live_value: Option<String>,
    /// Live selectedness for `option`.
    selected: bool,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }
}

/// A synthetic event fired at an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomEvent {
    pub kind: &'static str,
    pub target: NodeId,
    pub bubbles: bool,
    /// Target first, then every ancestor up to the root.
    pub path: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    events: Vec<DomEvent>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut document = Document::default();

        // (scraper node, arena parent) pairs; children pushed in reverse to keep pre-order.
        let mut stack: Vec<_> = parsed
            .tree
            .root()
            .children()
            .rev()
            .map(|child| (child, None::<NodeId>))
            .collect();

        while let Some((source, parent)) = stack.pop() {
            let kind = match source.value() {
                ScraperNode::Element(element) => NodeKind::Element(ElementData {
                    tag: element.name().to_ascii_lowercase(),
                    attrs: element
                        .attrs()
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect(),
                    live_value: None,
                    selected: false,
                }),
                ScraperNode::Text(text) => {
                    let content: &str = text;
                    NodeKind::Text(content.to_owned())
                }
                _ => continue,
            };

            let id = document.nodes.len();
            document.nodes.push(Node {
                parent,
                children: Vec::new(),
                kind,
            });
            match parent {
                Some(parent) => document.nodes[parent].children.push(id),
                None => document.roots.push(id),
            }

            for child in source.children().rev() {
                stack.push((child, Some(id)));
            }
        }

        document.init_live_values();
        document
    }

    fn init_live_values(&mut self) {
        for id in 0..self.nodes.len() {
            let initial = match self.tag(id) {
                Some("input") => Some(self.attr(id, "value").unwrap_or_default().to_string()),
                Some("textarea") => Some(self.raw_text(id)),
                _ => None,
            };
            if let NodeKind::Element(element) = &mut self.nodes[id].kind {
                element.live_value = initial;
                element.selected = element.tag == "option" && element.has_attr("selected");
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attr(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// All element ids in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|&id| self.element(id).is_some())
    }

    /// Elements with one of `tags`, in document order.
    pub fn elements_by_tag<'a>(&'a self, tags: &'a [&'a str]) -> impl Iterator<Item = NodeId> + 'a {
        self.elements()
            .filter(move |&id| self.tag(id).is_some_and(|tag| tags.contains(&tag)))
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors(id).find(|&ancestor| self.tag(ancestor) == Some(tag))
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = match self.parent(id) {
            Some(parent) => self.children(parent),
            None => self.roots.as_slice(),
        };
        let position = siblings.iter().position(|&sibling| sibling == id)?;
        siblings[position + 1..]
            .iter()
            .copied()
            .find(|&sibling| self.element(sibling).is_some())
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Concatenated descendant text. Subtrees rooted at a tag in `skip` are left out.
    pub fn text_content_skipping(&self, id: NodeId, skip: &[&str]) -> String {
        let mut out = String::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            match &self.nodes[current].kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element(element) => {
                    if skip.contains(&element.tag.as_str()) {
                        continue;
                    }
                    stack.extend(self.children(current).iter().rev());
                }
            }
        }
        out
    }

    fn raw_text(&self, id: NodeId) -> String {
        self.text_content_skipping(id, &[])
    }

    /// Option elements of a select, including those nested in `optgroup`.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|&id| self.tag(id) == Some("option"))
            .collect()
    }

    /// Display text of an option with whitespace collapsed.
    pub fn option_text(&self, option: NodeId) -> String {
        collapse_whitespace(&self.raw_text(option))
    }

    pub fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(value) => value.to_string(),
            None => self.option_text(option),
        }
    }

    fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let options = self.options(select);
        options
            .iter()
            .copied()
            .find(|&option| matches!(self.element(option), Some(el) if el.selected))
            .or_else(|| options.first().copied())
    }

    /// Current live value of a control; empty for anything else.
    pub fn value(&self, id: NodeId) -> String {
        match self.tag(id) {
            Some("select") => self
                .selected_option(id)
                .map(|option| self.option_value(option))
                .unwrap_or_default(),
            Some(_) => self
                .element(id)
                .and_then(|element| element.live_value.clone())
                .unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Overwrites the live value of a control. Returns `false` when nothing was
    /// written: `id` is not a value control, or no option of a select matches.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> bool {
        match self.tag(id) {
            Some("input") | Some("textarea") => {
                if let NodeKind::Element(element) = &mut self.nodes[id].kind {
                    element.live_value = Some(value.to_string());
                }
                true
            }
            Some("select") => {
                let options = self.options(id);
                let chosen = options
                    .iter()
                    .copied()
                    .find(|&option| self.option_value(option) == value)
                    .or_else(|| {
                        options
                            .iter()
                            .copied()
                            .find(|&option| self.option_text(option) == value)
                    })
                    .or_else(|| {
                        options
                            .iter()
                            .copied()
                            .find(|&option| self.option_text(option).eq_ignore_ascii_case(value))
                    });
                let Some(chosen) = chosen else {
                    return false;
                };
                for option in options {
                    if let NodeKind::Element(element) = &mut self.nodes[option].kind {
                        element.selected = option == chosen;
                    }
                }
                true
            }
            _ => false,
        }
    }

    /// Fires a bubbling `change` event at `id`.
    pub fn dispatch_change(&mut self, id: NodeId) {
        let mut path = vec![id];
        path.extend(self.ancestors(id));
        self.events.push(DomEvent {
            kind: "change",
            target: id,
            bubbles: true,
            path,
        });
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    /// Serializes the document, writing live values back as markup.
    pub fn to_html(&self) -> String {
        serialize::to_html(self)
    }

    pub(crate) fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub(crate) fn live_value(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|element| element.live_value.as_deref())
    }

    pub(crate) fn is_selected(&self, id: NodeId) -> bool {
        matches!(self.element(id), Some(element) if element.selected)
    }
}

pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(doc: &Document, tag: &str, attr: &str, value: &str) -> NodeId {
        doc.elements()
            .find(|&id| doc.tag(id) == Some(tag) && doc.attr(id, attr) == Some(value))
            .unwrap()
    }

    #[test]
    fn test_parse_preserves_document_order() {
        let doc = Document::parse(
            r#"<form><input name="a"><select name="b"></select><textarea name="c"></textarea></form>"#,
        );
        let names: Vec<_> = doc
            .elements_by_tag(VALUE_CONTROLS)
            .filter_map(|id| doc.attr(id, "name"))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_initial_values() {
        let doc = Document::parse(
            r#"<input name="a" value="x">
               <textarea name="t">hello</textarea>
               <select name="s"><option>One</option><option value="2" selected>Two</option></select>"#,
        );
        assert_eq!(doc.value(find(&doc, "input", "name", "a")), "x");
        assert_eq!(doc.value(find(&doc, "textarea", "name", "t")), "hello");
        assert_eq!(doc.value(find(&doc, "select", "name", "s")), "2");
    }

    #[test]
    fn test_select_defaults_to_first_option() {
        let doc = Document::parse(
            r#"<select name="s"><option>One</option><option>Two</option></select>"#,
        );
        assert_eq!(doc.value(find(&doc, "select", "name", "s")), "One");
    }

    #[test]
    fn test_set_value_select_by_text_case_insensitive() {
        let mut doc = Document::parse(
            r#"<select name="s"><option value="us">United States</option><option value="ca">Canada</option></select>"#,
        );
        let select = find(&doc, "select", "name", "s");
        assert!(doc.set_value(select, "canada"));
        assert_eq!(doc.value(select), "ca");
        assert!(!doc.set_value(select, "Mars"));
        assert_eq!(doc.value(select), "ca");
    }

    #[test]
    fn test_set_value_rejects_non_controls() {
        let mut doc = Document::parse(r#"<div id="d"></div>"#);
        let div = find(&doc, "div", "id", "d");
        assert!(!doc.set_value(div, "x"));
    }

    #[test]
    fn test_change_event_bubbles_through_ancestors() {
        let mut doc = Document::parse(r#"<form id="f"><div><input id="i"></div></form>"#);
        let input = find(&doc, "input", "id", "i");
        let form = find(&doc, "form", "id", "f");
        doc.dispatch_change(input);
        let event = &doc.events()[0];
        assert_eq!(event.kind, "change");
        assert!(event.bubbles);
        assert_eq!(event.path[0], input);
        assert!(event.path.contains(&form));
    }

    #[test]
    fn test_next_element_sibling_skips_text() {
        let doc = Document::parse(r#"<div><label id="l">Name</label> text <input id="i"></div>"#);
        let label = find(&doc, "label", "id", "l");
        let input = find(&doc, "input", "id", "i");
        assert_eq!(doc.next_element_sibling(label), Some(input));
        assert_eq!(doc.next_element_sibling(input), None);
    }

    #[test]
    fn test_to_html_writes_live_values() {
        let mut doc = Document::parse(
            r#"<form><input name="a" value="old"><textarea name="t">x</textarea>
               <select name="s"><option selected>One</option><option>Two</option></select></form>"#,
        );
        let input = find(&doc, "input", "name", "a");
        let textarea = find(&doc, "textarea", "name", "t");
        let select = find(&doc, "select", "name", "s");
        doc.set_value(input, "new \"quoted\"");
        doc.set_value(textarea, "a < b");
        doc.set_value(select, "Two");

        let html = doc.to_html();
        assert!(html.contains(r#"value="new &quot;quoted&quot;""#));
        assert!(html.contains("<textarea name=\"t\">a &lt; b</textarea>"));
        assert!(html.contains("<option selected>Two</option>"));
        assert!(!html.contains("<option selected>One</option>"));

        let reparsed = Document::parse(&html);
        assert_eq!(reparsed.value(find(&reparsed, "input", "name", "a")), "new \"quoted\"");
        assert_eq!(reparsed.value(find(&reparsed, "select", "name", "s")), "Two");
    }
}
