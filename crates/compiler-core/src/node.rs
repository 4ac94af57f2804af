//! Persisted parse tree, as an arena indexed by [`NodeId`].
//!
//! The open-elements stack used during construction only tracks
//! currently-open ancestors; it never keeps a finished tree around once
//! elements pop. Here every node that closes is appended to its parent's
//! `children` before the parent itself can close, so the arena ends up
//! holding the complete, immutable-once-built document.

use crate::span::Span;
use crate::token::Attribute;

/// Index into a [`Document`]'s arena. `0` is always the document's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element {
        name: String,
        attributes: Vec<Attribute>,
        /// True for components (capitalized or dotted tag name) as
        /// opposed to plain HTML/SVG elements.
        is_component: bool,
        self_closing: bool,
        /// `script`/`style`/`iframe`/… or anything carrying `is:raw`:
        /// content was lexed as raw text rather than markup.
        is_raw: bool,
        /// Set for `<math>`: `{`/`}` inside this subtree are plain text,
        /// not expressions.
        no_expression: bool,
        /// Every source location where this element's tag name was
        /// written: one entry for a self-closing tag, two (opening then
        /// closing) for a tag pair. What IDE go-to-definition consumes.
        tag_name_locations: Vec<Span>,
    },
    /// A group of siblings with no wrapping element. `explicit`
    /// distinguishes the two spellings that share this node kind so the
    /// printer can round-trip whichever one the source used: `true` for
    /// `<Fragment>…</Fragment>`, `false` for the `<>…</>` shorthand.
    Fragment {
        attributes: Vec<Attribute>,
        explicit: bool,
    },
    Text,
    Comment,
    Doctype,
    /// A `{ expr }` interpolation encountered in element/component
    /// children position.
    Expression,
    /// The `---`-fenced frontmatter block, always the first child of the
    /// document root when present.
    Frontmatter,
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Byte span covering this node and all its children.
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The arena-backed parse tree. Nodes are appended in the order the tree
/// constructor finishes them (a child finishes, hence is appended to its
/// parent, strictly before the parent itself finishes), so `NodeId` order
/// is not document order — callers that need document order walk
/// `children` from the root.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
}

pub const ROOT: NodeId = NodeId(0);

impl Document {
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(NodeData {
            kind: NodeKind::Document,
            span: Span::new(0, 0),
            parent: None,
            children: Vec::new(),
        });
        Self { nodes }
    }

    pub fn push(&mut self, kind: NodeKind, span: Span, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            span,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0 as usize]
    }

    pub fn root(&self) -> &NodeData {
        self.get(ROOT)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Sets `span.end` once a node's closing construct (end tag, end
    /// expression, or self-close) has been seen, extending to cover every
    /// byte of the node and its content.
    pub fn extend_span(&mut self, id: NodeId, end: u32) {
        let node = self.get_mut(id);
        node.span = Span::new(node.span.start, node.span.end.max(end));
    }

    /// Depth-first pre-order walk from the root, yielding `(NodeId, depth)`.
    pub fn walk(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        let mut stack = vec![(ROOT, 0usize)];
        std::iter::from_fn(move || {
            let (id, depth) = stack.pop()?;
            let node = self.get(id);
            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
            Some((id, depth))
        })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn push_links_parent_and_child() {
        let mut doc = Document::new();
        let el = doc.push(
            NodeKind::Element {
                name: "div".into(),
                attributes: vec![],
                is_component: false,
                self_closing: false,
                is_raw: false,
                no_expression: false,
                tag_name_locations: vec![],
            },
            Span::new(0, 5),
            ROOT,
        );
        assert_eq!(doc.root().children, vec![el]);
        assert_eq!(doc.get(el).parent, Some(ROOT));
    }

    #[test]
    fn walk_visits_in_document_order() {
        let mut doc = Document::new();
        let a = doc.push(NodeKind::Text, Span::new(0, 1), ROOT);
        let b = doc.push(NodeKind::Text, Span::new(1, 2), ROOT);
        let order: Vec<NodeId> = doc.walk().map(|(id, _)| id).collect();
        assert_eq!(order, vec![ROOT, a, b]);
    }

    #[test]
    fn extend_span_grows_only_forward() {
        let mut doc = Document::new();
        let el = doc.push(
            NodeKind::Element {
                name: "div".into(),
                attributes: vec![],
                is_component: false,
                self_closing: false,
                is_raw: false,
                no_expression: false,
                tag_name_locations: vec![],
            },
            Span::new(0, 5),
            ROOT,
        );
        doc.extend_span(el, 10);
        assert_eq!(doc.get(el).span, Span::new(0, 10));
        doc.extend_span(el, 3);
        assert_eq!(doc.get(el).span, Span::new(0, 10));
    }
}
