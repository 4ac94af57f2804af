//! Source-preserving reconstruction.
//!
//! Every node's span covers exactly its own markup plus its children's
//! spans, so walking the tree and slicing `source` between a node's own
//! start/end and each child's start/end reproduces the original bytes
//! verbatim, with no per-node-kind special casing needed: the tag syntax,
//! attribute syntax, and any inter-sibling whitespace all live in the gaps
//! this walk copies through untouched.
//!
//! There is no implicit `html`/`head`/`body` marker to special-case here:
//! this tree constructor never synthesises those tags, so the one usual
//! exception to byte-exact round-trip never arises.

use crate::node::{Document, NodeId};

/// Reconstructs the source text covered by `id`'s span, recursing through
/// its children in document order.
pub fn print_node_to_source(document: &Document, id: NodeId, source: &str) -> String {
    let node = document.get(id);
    let mut out = String::with_capacity((node.span.end - node.span.start) as usize);
    let mut cursor = node.span.start;
    for &child in &node.children {
        let child_span = document.get(child).span;
        out.push_str(&source[cursor as usize..child_span.start as usize]);
        out.push_str(&print_node_to_source(document, child, source));
        cursor = child_span.end;
    }
    out.push_str(&source[cursor as usize..node.span.end as usize]);
    out
}

/// Reconstructs the whole document: `print_to_source(parse(s), s) == s` up
/// to ignored trailing whitespace.
pub fn print_to_source(document: &Document, source: &str) -> String {
    print_node_to_source(document, crate::node::ROOT, source)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree_constructor::build_tree;

    fn round_trip(src: &str) {
        let (doc, _) = build_tree(src.as_bytes());
        assert_eq!(print_to_source(&doc, src).trim_end(), src.trim_end());
    }

    #[test]
    fn plain_markup_round_trips() {
        round_trip(r#"<div class="a"><span>hi</span></div>"#);
    }

    #[test]
    fn frontmatter_and_expression_round_trip() {
        round_trip("---\nconst x = 1;\n---\n<div>{x}</div>");
    }

    #[test]
    fn fragment_shorthand_round_trips() {
        round_trip("<><div/><span/></>");
    }

    #[test]
    fn self_closing_void_tag_round_trips() {
        round_trip(r#"<img src="a.png">"#);
    }

    #[test]
    fn component_with_spread_and_shorthand_attrs_round_trips() {
        round_trip("<Foo {...rest} {bar} baz=\"1\" />");
    }
}
