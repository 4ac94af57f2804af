//! JSON-shaped parse tree, for handing a structured document to another
//! process across a serialization boundary (e.g. the wasm glue).

use crate::node::{Document, NodeId, NodeKind};
use crate::span::{LineIndex, Span};
use crate::token::Attribute;
use serde::Serialize;

/// One endpoint of a [`Position`]: byte offset plus the 1-based line/column
/// it resolves to under a [`LineIndex`].
#[derive(Debug, Serialize)]
pub struct PositionPoint {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

/// A node's location, carrying both the raw byte span and its line/column
/// resolution so consumers that only want offsets never need a `LineIndex`
/// of their own.
#[derive(Debug, Serialize)]
pub struct Position {
    pub start: PositionPoint,
    pub end: PositionPoint,
}

fn to_position(span: Span, lines: &LineIndex) -> Position {
    let (start_line, start_col) = lines.line_col(span.start);
    let (end_line, end_col) = lines.line_col(span.end);
    Position {
        start: PositionPoint { offset: span.start, line: start_line, column: start_col },
        end: PositionPoint { offset: span.end, line: end_line, column: end_col },
    }
}

/// Discriminator set: `root` for the document,
/// `element`/`custom-element`/`component` split by tag-name shape
/// (custom-element when the name contains a `-`; component when the
/// first character is uppercase or the name contains a `.`), plus
/// `fragment`, `expression`, `text`, `comment`, `doctype`, `frontmatter`.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum JsonNode {
    #[serde(rename = "root")]
    Document {
        position: Position,
        children: Vec<JsonNode>,
    },
    #[serde(rename = "element")]
    Element {
        name: String,
        #[serde(rename = "selfClosing")]
        self_closing: bool,
        attributes: Vec<JsonAttribute>,
        position: Position,
        children: Vec<JsonNode>,
    },
    #[serde(rename = "custom-element")]
    CustomElement {
        name: String,
        #[serde(rename = "selfClosing")]
        self_closing: bool,
        attributes: Vec<JsonAttribute>,
        position: Position,
        children: Vec<JsonNode>,
    },
    #[serde(rename = "component")]
    Component {
        name: String,
        #[serde(rename = "selfClosing")]
        self_closing: bool,
        attributes: Vec<JsonAttribute>,
        position: Position,
        children: Vec<JsonNode>,
    },
    #[serde(rename = "fragment")]
    Fragment {
        /// `true` for explicit `<Fragment>`, `false` for `<>` shorthand.
        explicit: bool,
        attributes: Vec<JsonAttribute>,
        position: Position,
        children: Vec<JsonNode>,
    },
    #[serde(rename = "text")]
    Text {
        position: Position,
    },
    #[serde(rename = "comment")]
    Comment {
        position: Position,
    },
    #[serde(rename = "doctype")]
    Doctype {
        position: Position,
    },
    #[serde(rename = "expression")]
    Expression {
        position: Position,
        children: Vec<JsonNode>,
    },
    #[serde(rename = "frontmatter")]
    Frontmatter {
        position: Position,
    },
}

#[derive(Debug, Serialize)]
pub struct JsonAttribute {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
    pub kind: &'static str,
    /// Verbatim source text of the attribute, from the start of its name
    /// to the end of its value (or just the name, for a valueless
    /// attribute) — e.g. `class="a"`, `{...spread}`, `{shorthand}`.
    pub raw: String,
}

impl JsonAttribute {
    fn from_attribute(a: &Attribute, source: &str) -> Self {
        let raw_end = a.value_span.end.max(a.key_span.end);
        Self {
            namespace: a.namespace.clone(),
            name: a.key.clone(),
            value: a.value.clone(),
            kind: a.kind.into(),
            raw: source[a.key_span.start as usize..raw_end as usize].to_string(),
        }
    }
}

/// Converts the whole arena [`Document`] into the serializable
/// [`JsonNode`] tree, following `children` links from the root so the
/// result comes out in document order rather than arena insertion order.
/// `source` is the original text the document's spans index into, needed
/// to resolve each span's line/column.
pub fn to_json_tree(document: &Document, source: &str) -> JsonNode {
    let lines = LineIndex::new(source);
    build(document, crate::node::ROOT, source, &lines)
}

fn build(document: &Document, id: NodeId, source: &str, lines: &LineIndex) -> JsonNode {
    let node = document.get(id);
    let children: Vec<JsonNode> = node
        .children
        .iter()
        .map(|&c| build(document, c, source, lines))
        .collect();
    let position = to_position(node.span, lines);

    match &node.kind {
        NodeKind::Document => JsonNode::Document { position, children },
        NodeKind::Element {
            name,
            attributes,
            is_component,
            self_closing,
            ..
        } => {
            let attrs = attributes
                .iter()
                .map(|a| JsonAttribute::from_attribute(a, source))
                .collect();
            if name.contains('-') {
                JsonNode::CustomElement {
                    name: name.clone(),
                    self_closing: *self_closing,
                    attributes: attrs,
                    position,
                    children,
                }
            } else if *is_component {
                JsonNode::Component {
                    name: name.clone(),
                    self_closing: *self_closing,
                    attributes: attrs,
                    position,
                    children,
                }
            } else {
                JsonNode::Element {
                    name: name.clone(),
                    self_closing: *self_closing,
                    attributes: attrs,
                    position,
                    children,
                }
            }
        }
        NodeKind::Fragment { attributes, explicit } => JsonNode::Fragment {
            explicit: *explicit,
            attributes: attributes
                .iter()
                .map(|a| JsonAttribute::from_attribute(a, source))
                .collect(),
            position,
            children,
        },
        NodeKind::Text => JsonNode::Text { position },
        NodeKind::Comment => JsonNode::Comment { position },
        NodeKind::Doctype => JsonNode::Doctype { position },
        NodeKind::Expression => JsonNode::Expression { position, children },
        NodeKind::Frontmatter => JsonNode::Frontmatter { position },
    }
}

/// Serializes the tree to a JSON string.
pub fn to_json_string(document: &Document, source: &str) -> serde_json::Result<String> {
    serde_json::to_string(&to_json_tree(document, source))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree_constructor::build_tree;

    #[test]
    fn element_with_attribute_round_trips_through_json() {
        let src = r#"<div class="a"><span/></div>"#;
        let (doc, _) = build_tree(src.as_bytes());
        let json = to_json_string(&doc, src).unwrap();
        assert!(json.contains("\"type\":\"element\""));
        assert!(json.contains("\"class\""));
        assert!(json.contains("\"raw\":\"class=\\\"a\\\"\""));
        assert!(json.contains("\"position\""));
        assert!(json.contains("\"line\":1"));
    }

    #[test]
    fn component_and_custom_element_get_distinct_discriminators() {
        let src = "<Foo/><my-el/><div/>";
        let (doc, _) = build_tree(src.as_bytes());
        let json = to_json_string(&doc, src).unwrap();
        assert!(json.contains("\"type\":\"component\""));
        assert!(json.contains("\"type\":\"custom-element\""));
        assert!(json.contains("\"type\":\"element\""));
    }

    #[test]
    fn fragment_shorthand_and_explicit_share_a_discriminator() {
        let src = "<><div/></><Fragment><div/></Fragment>";
        let (doc, _) = build_tree(src.as_bytes());
        let tree = to_json_tree(&doc, src);
        if let JsonNode::Document { children, .. } = tree {
            assert_eq!(children.len(), 2);
            for child in &children {
                assert!(matches!(child, JsonNode::Fragment { .. }));
            }
            match (&children[0], &children[1]) {
                (JsonNode::Fragment { explicit: a, .. }, JsonNode::Fragment { explicit: b, .. }) => {
                    assert!(!a);
                    assert!(b);
                }
                _ => panic!("expected fragments"),
            }
        } else {
            panic!("expected document node");
        }
    }

    #[test]
    fn document_order_not_arena_order() {
        // Children finish (and are appended into the arena) in a
        // different order than document order for nested trees; the
        // JSON walk must still come out in document order.
        let src = "<a><b/></a><c/>";
        let (doc, _) = build_tree(src.as_bytes());
        let tree = to_json_tree(&doc, src);
        if let JsonNode::Document { children, .. } = tree {
            assert_eq!(children.len(), 2);
            match &children[0] {
                JsonNode::Element { name, .. } => assert_eq!(name, "a"),
                _ => panic!("expected element"),
            }
        } else {
            panic!("expected document node");
        }
    }
}
