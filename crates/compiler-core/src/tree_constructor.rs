//! Tree construction: drives the [`Tokenizer`] and builds
//! the arena [`Document`], resolving misnested close tags with an
//! HTML5-style insertion-mode dispatch, minus every table/select/frameset
//! insertion mode this format's flat component bodies never need.

pub mod active_formatting;
pub mod insertion_mode;
pub mod open_elements;

use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticHandler};
use crate::node::{Document, NodeId, NodeKind, ROOT};
use crate::span::Span;
use crate::token::TokenKind;
use crate::tokenizer::Tokenizer;
use active_formatting::{is_formatting_element, ActiveFormattingElements, FormattingEntry};
use insertion_mode::InsertionMode;
use open_elements::OpenElementsStack;

fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) || name.contains('.')
}

/// `<>…</>` shorthand (empty name) and explicit `<Fragment>` share one
/// node kind.
fn is_fragment_name(name: &str) -> bool {
    name.is_empty() || name == "Fragment"
}

pub struct TreeConstructor<'a> {
    tokenizer: Tokenizer<'a>,
    document: Document,
    open_elements: OpenElementsStack,
    formatting: ActiveFormattingElements,
    mode: InsertionMode,
    pending_reconstruction: Vec<FormattingEntry>,
    /// One entry per currently-open component, holding the
    /// `pending_reconstruction` length at the moment that component was
    /// opened. Closing a component truncates back to its mark, so
    /// misnested formatting elements never reconstruct across a
    /// component boundary into a sibling's content.
    component_reconstruction_marks: Vec<usize>,
    source_len: u32,
    diagnostics: DiagnosticHandler,
}

impl<'a> TreeConstructor<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            tokenizer: Tokenizer::new(src),
            document: Document::new(),
            open_elements: OpenElementsStack::new(),
            formatting: ActiveFormattingElements::new(),
            mode: InsertionMode::Initial,
            pending_reconstruction: Vec::new(),
            component_reconstruction_marks: Vec::new(),
            source_len: src.len() as u32,
            diagnostics: DiagnosticHandler::new(),
        }
    }

    fn current_parent(&self) -> NodeId {
        self.open_elements.current().map(|e| e.id).unwrap_or(ROOT)
    }

    /// Consumes the tokenizer and builds the full document.
    pub fn construct(mut self) -> (Document, DiagnosticHandler) {
        let mut frontmatter_node: Option<NodeId> = None;

        while let Some(token) = self.tokenizer.next_token() {
            match &token.kind {
                TokenKind::Error => break,

                TokenKind::FrontmatterFence => match self.mode {
                    InsertionMode::Initial => {
                        let id = self.document.push(NodeKind::Frontmatter, token.raw, ROOT);
                        frontmatter_node = Some(id);
                        self.mode = InsertionMode::InFrontmatter;
                    }
                    InsertionMode::InFrontmatter => {
                        if let Some(id) = frontmatter_node.take() {
                            self.document.extend_span(id, token.raw.end);
                        }
                        self.mode = InsertionMode::InBody;
                    }
                    InsertionMode::InBody => {
                        // A stray `---` after content is just text.
                        self.insert_text(token.raw);
                    }
                },

                TokenKind::Text => {
                    if self.mode == InsertionMode::InFrontmatter {
                        if let Some(id) = frontmatter_node {
                            self.document.extend_span(id, token.raw.end);
                        }
                    } else {
                        self.reconstruct_formatting();
                        self.insert_text(token.raw);
                    }
                }

                TokenKind::Comment => {
                    self.reconstruct_formatting();
                    self.document
                        .push(NodeKind::Comment, token.raw, self.current_parent());
                }

                TokenKind::Doctype => {
                    self.document.push(NodeKind::Doctype, token.raw, ROOT);
                }

                TokenKind::StartTag(tag) => {
                    self.reconstruct_formatting();
                    let id = if is_fragment_name(&tag.name) {
                        self.document.push(
                            NodeKind::Fragment {
                                attributes: tag.attributes.clone(),
                                explicit: tag.name == "Fragment",
                            },
                            token.raw,
                            self.current_parent(),
                        )
                    } else {
                        let is_component = is_component_name(&tag.name);
                        let id = self.document.push(
                            NodeKind::Element {
                                name: tag.name.clone(),
                                is_raw: crate::tokenizer::is_raw_element_name(&tag.name, &tag.attributes),
                                no_expression: tag.name.eq_ignore_ascii_case("math"),
                                attributes: tag.attributes.clone(),
                                is_component,
                                self_closing: false,
                                tag_name_locations: vec![tag.name_span],
                            },
                            token.raw,
                            self.current_parent(),
                        );
                        if is_formatting_element(&tag.name) {
                            self.formatting.push(id, tag.name.clone(), tag.attributes.clone());
                        }
                        if is_component {
                            // Formatting elements closed inside this component's
                            // subtree must not reconstruct past its boundary.
                            self.component_reconstruction_marks.push(self.pending_reconstruction.len());
                        }
                        id
                    };
                    self.open_elements.push(id, tag.name.clone(), is_component_name(&tag.name));
                }

                TokenKind::SelfClosingTag(tag) => {
                    self.reconstruct_formatting();
                    if is_fragment_name(&tag.name) {
                        self.document.push(
                            NodeKind::Fragment {
                                attributes: tag.attributes.clone(),
                                explicit: tag.name == "Fragment",
                            },
                            token.raw,
                            self.current_parent(),
                        );
                    } else {
                        let is_component = is_component_name(&tag.name);
                        self.document.push(
                            NodeKind::Element {
                                name: tag.name.clone(),
                                is_raw: crate::tokenizer::is_raw_element_name(&tag.name, &tag.attributes),
                                no_expression: tag.name.eq_ignore_ascii_case("math"),
                                attributes: tag.attributes.clone(),
                                is_component,
                                self_closing: true,
                                tag_name_locations: vec![tag.name_span],
                            },
                            token.raw,
                            self.current_parent(),
                        );
                    }
                }

                TokenKind::EndTag(tag) => {
                    self.close_element(&tag.name, tag.name_span, token.raw.end);
                }

                TokenKind::StartExpression => {
                    self.reconstruct_formatting();
                    let id =
                        self.document
                            .push(NodeKind::Expression, token.raw, self.current_parent());
                    self.open_elements.push(id, "#expression", false);
                }

                TokenKind::EndExpression => {
                    if let Some(open) = self.open_elements.pop() {
                        self.document.extend_span(open.id, token.raw.end);
                    }
                }
            }
        }

        self.diagnostics.append(std::mem::take(&mut self.tokenizer.diagnostics));
        self.close_unclosed_at_eof();
        (self.document, self.diagnostics)
    }

    fn insert_text(&mut self, span: Span) {
        self.document.push(NodeKind::Text, span, self.current_parent());
    }

    /// Closes the nearest open element named `name`. If intervening
    /// elements are still open (a misnested close), they are implicitly
    /// closed too, and any formatting elements among them are queued for
    /// reconstruction in the next sibling position.
    fn close_element(&mut self, name: &str, end_name_span: Span, end: u32) {
        let Some(idx) = self.open_elements.position_of(name) else {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticCode::WarningUnmatchedCloseTag,
                Span::at(end),
                format!("closing tag </{name}> has no matching open element"),
            ));
            return;
        };

        let popped = self.open_elements.pop_to(idx);

        for element in &popped {
            self.document.extend_span(element.id, end);
            self.formatting.remove(element.id);
        }

        // `popped[0]` is the matched target itself: record where its
        // closing tag name was written too, alongside the opening one.
        if let Some(matched) = popped.first() {
            if let NodeKind::Element { tag_name_locations, .. } = &mut self.document.get_mut(matched.id).kind {
                tag_name_locations.push(end_name_span);
            }
        }

        // `popped[0]` is always the matched target itself; everything
        // after it was implicitly closed along the way, outermost first.
        // Walk in the order these closes actually happen (innermost, i.e.
        // most recently opened, first; the target itself last) so that a
        // component closed along the way truncates away reconstruction
        // queued by whatever was nested inside it before we ever consider
        // the target's own boundary.
        let implicit_innermost_first = popped[1..].iter().rev();
        for element in implicit_innermost_first.chain(popped.first()) {
            if element.is_component {
                if let Some(mark) = self.component_reconstruction_marks.pop() {
                    self.pending_reconstruction.truncate(mark);
                }
                continue;
            }
            if element.id == popped[0].id {
                // The target itself closed properly; it needs no
                // reconstruction (that's only for implicitly-closed ones).
                continue;
            }
            if is_formatting_element(&element.name) {
                if let NodeKind::Element { attributes, .. } = &self.document.get(element.id).kind {
                    self.pending_reconstruction.push(FormattingEntry {
                        id: element.id,
                        name: element.name.clone(),
                        attributes: attributes.clone(),
                    });
                }
            }
        }
    }

    /// Re-opens any formatting elements implicitly closed by a prior
    /// misnested end tag, before the next text/element/comment is
    /// inserted. Simplified from the full HTML5 adoption-agency algorithm
    /// down to cloning-and-reopening.
    fn reconstruct_formatting(&mut self) {
        if self.pending_reconstruction.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_reconstruction);
        for entry in pending {
            let id = self.document.push(
                NodeKind::Element {
                    name: entry.name.clone(),
                    attributes: entry.attributes.clone(),
                    is_component: false,
                    self_closing: false,
                    is_raw: false,
                    no_expression: false,
                    // Cloned-and-reopened, not a literal tag occurrence in
                    // the source, so it contributes no location of its own.
                    tag_name_locations: Vec::new(),
                },
                Span::at(self.current_end_hint()),
                self.current_parent(),
            );
            self.open_elements.push(id, entry.name.clone(), false);
            self.formatting.push(id, entry.name, entry.attributes);
        }
    }

    fn current_end_hint(&self) -> u32 {
        self.tokenizer.byte_offset() as u32
    }

    /// At EOF, every element still open is unclosed input: extend its
    /// span to the end of the source and warn.
    fn close_unclosed_at_eof(&mut self) {
        while let Some(open) = self.open_elements.pop() {
            if open.name == "#expression" {
                continue;
            }
            self.document.extend_span(open.id, self.source_len);
            self.diagnostics.push(Diagnostic::new(
                DiagnosticCode::WarningUnclosedHtmlTag,
                Span::at(self.source_len),
                format!("<{}> was never closed", open.name),
            ));
        }
        self.document.extend_span(ROOT, self.source_len);
    }
}

/// Convenience entry point used by [`crate::api`] and tests.
pub fn build_tree(src: &[u8]) -> (Document, DiagnosticHandler) {
    TreeConstructor::new(src).construct()
}

#[cfg(test)]
mod test {
    use super::*;

    fn names(doc: &Document) -> Vec<String> {
        doc.walk()
            .filter_map(|(id, _)| match &doc.get(id).kind {
                NodeKind::Element { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn builds_nested_elements() {
        let (doc, diags) = build_tree(b"<div><span>hi</span></div>");
        assert!(diags.is_empty());
        assert_eq!(names(&doc), vec!["div", "span"]);
    }

    #[test]
    fn void_element_is_self_closing_leaf() {
        let (doc, _) = build_tree(b"<div><br></div>");
        let div = doc.root().children[0];
        assert_eq!(doc.get(div).children.len(), 1);
        let br = doc.get(div).children[0];
        assert!(matches!(
            doc.get(br).kind,
            NodeKind::Element { self_closing: true, .. }
        ));
    }

    #[test]
    fn frontmatter_is_first_child() {
        let (doc, _) = build_tree(b"---\nconst a = 1;\n---\n<div/>");
        assert!(matches!(doc.get(doc.root().children[0]).kind, NodeKind::Frontmatter));
    }

    #[test]
    fn unmatched_close_tag_is_diagnosed() {
        let (_doc, diags) = build_tree(b"<div></span></div>");
        assert!(!diags.is_empty());
    }

    #[test]
    fn expression_child_of_element() {
        let (doc, _) = build_tree(b"<div>{ value }</div>");
        let div = doc.root().children[0];
        let expr = doc.get(div).children[0];
        assert!(matches!(doc.get(expr).kind, NodeKind::Expression));
    }

    #[test]
    fn unclosed_tag_at_eof_is_diagnosed() {
        let (_doc, diags) = build_tree(b"<div><span>text");
        assert!(!diags.is_empty());
    }

    #[test]
    fn misnested_formatting_reconstructs() {
        let (doc, _) = build_tree(b"<b><i>x</b>y</i>");
        // <b> and <i> both open, </b> closes both implicitly; <i> should
        // reconstruct around the trailing "y".
        let elements = names(&doc);
        assert_eq!(elements.iter().filter(|n| n.as_str() == "i").count(), 2);
    }

    #[test]
    fn component_boundary_stops_formatting_reconstruction() {
        // `<b>` is implicitly closed by `</Foo>` rather than its own end
        // tag; without the component boundary it would reconstruct around
        // the trailing "y", but a component subtree must not leak
        // reconstruction past its own close.
        let (doc, _) = build_tree(b"<Foo><b>x</Foo>y");
        let elements = names(&doc);
        assert_eq!(elements.iter().filter(|n| n.as_str() == "b").count(), 1);
    }

    #[test]
    fn bare_fragment_shorthand_becomes_a_fragment_node() {
        let (doc, diags) = build_tree(b"<><div/></>");
        assert!(diags.is_empty());
        let frag = doc.root().children[0];
        match &doc.get(frag).kind {
            NodeKind::Fragment { explicit, .. } => assert!(!explicit),
            other => panic!("expected fragment, got {other:?}"),
        }
        assert_eq!(names(&doc), vec!["div"]);
    }

    #[test]
    fn script_element_is_flagged_raw() {
        let (doc, _) = build_tree(b"<script>const x = {};</script>");
        let script = doc.root().children[0];
        match &doc.get(script).kind {
            NodeKind::Element { is_raw, .. } => assert!(is_raw),
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn math_element_is_flagged_no_expression() {
        let (doc, _) = build_tree(b"<math>{test}</math>");
        let math = doc.root().children[0];
        match &doc.get(math).kind {
            NodeKind::Element { no_expression, is_raw, .. } => {
                assert!(no_expression);
                assert!(!is_raw);
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn tag_pair_records_both_name_locations() {
        let (doc, _) = build_tree(b"<div></div>");
        let div = doc.root().children[0];
        match &doc.get(div).kind {
            NodeKind::Element { tag_name_locations, .. } => {
                assert_eq!(tag_name_locations.len(), 2);
                assert_eq!(tag_name_locations[0], Span::new(1, 4));
                assert_eq!(tag_name_locations[1], Span::new(7, 10));
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn self_closing_tag_records_a_single_name_location() {
        let (doc, _) = build_tree(b"<br/>");
        let br = doc.root().children[0];
        match &doc.get(br).kind {
            NodeKind::Element { tag_name_locations, .. } => {
                assert_eq!(tag_name_locations, &vec![Span::new(1, 3)]);
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn explicit_fragment_tag_becomes_a_fragment_node_too() {
        let (doc, _) = build_tree(b"<Fragment><div/></Fragment>");
        let frag = doc.root().children[0];
        match &doc.get(frag).kind {
            NodeKind::Fragment { explicit, .. } => assert!(explicit),
            other => panic!("expected fragment, got {other:?}"),
        }
    }
}
