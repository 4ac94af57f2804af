//! Property tests for core pipeline invariants. Inputs are drawn from a
//! small alphabet biased toward the bytes the tokenizer actually branches
//! on (`<`, `>`, `{`, `}`, quotes, `-`) rather than raw ASCII, since
//! uniform random bytes almost never exercise a tag/expression boundary.

use component_compiler_core::node::NodeKind;
use component_compiler_core::token::TokenKind;
use component_compiler_core::tokenizer::Tokenizer;
use component_compiler_core::tree_constructor::build_tree;
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

const ALPHABET: &[u8] = b"<>/{}=\"' abcdivspn-\n;:@.";

#[derive(Debug, Clone)]
struct Soup(Vec<u8>);

impl Arbitrary for Soup {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 64;
        let bytes = (0..len)
            .map(|_| *g.choose(ALPHABET).unwrap())
            .collect();
        Soup(bytes)
    }
}

#[quickcheck]
fn span_partitioning_holds(soup: Soup) -> bool {
    let mut tok = Tokenizer::new(&soup.0);
    let mut prev_end = 0u32;
    while let Some(t) = tok.next_token() {
        if t.raw.start != prev_end {
            return false;
        }
        prev_end = t.raw.end;
    }
    prev_end as usize == soup.0.len()
}

#[quickcheck]
fn tree_byte_coverage_holds(soup: Soup) -> bool {
    let (doc, _) = build_tree(&soup.0);
    fn check(doc: &component_compiler_core::node::Document, id: component_compiler_core::node::NodeId) -> bool {
        let node = doc.get(id);
        let mut prev_end: Option<u32> = None;
        for &child in &node.children {
            let child_span = doc.get(child).span;
            if child_span.start < node.span.start || child_span.end > node.span.end {
                return false;
            }
            if let Some(p) = prev_end {
                if child_span.start < p {
                    return false;
                }
            }
            prev_end = Some(child_span.end);
            if !check(doc, child) {
                return false;
            }
        }
        true
    }
    check(&doc, component_compiler_core::node::ROOT)
}

#[quickcheck]
fn duplicate_attribute_dedup_keeps_last(values: Vec<u8>) -> bool {
    if values.is_empty() || values.len() > 8 {
        return true;
    }
    let mut src = String::from("<div");
    for v in &values {
        src.push_str(&format!(r#" a="{}""#, v % 10));
    }
    src.push_str("></div>");
    let (doc, _) = build_tree(src.as_bytes());
    let root = doc.root();
    let div = doc.get(root.children[0]);
    match &div.kind {
        NodeKind::Element { attributes, .. } => {
            attributes.len() == 1 && attributes[0].value == format!("{}", values.last().unwrap() % 10)
        }
        _ => false,
    }
}

#[quickcheck]
fn hoisting_imports_is_idempotent(count: u8) -> bool {
    let count = (count % 5) as usize;
    let mut src = String::new();
    for i in 0..count {
        src.push_str(&format!("import m{i} from \"m{i}\";\n"));
    }
    src.push_str("const x = 1;");

    let imports = component_compiler_core::js_scanner::hoist_imports(src.as_bytes());
    let mut hoisted_ranges: Vec<(usize, usize)> = imports
        .iter()
        .map(|s| (s.span.start as usize, s.span.end as usize))
        .collect();
    hoisted_ranges.sort_unstable();

    // Rebuild the body with every hoisted statement's bytes removed,
    // simulating what a caller would feed back in after hoisting once.
    let mut body = Vec::new();
    let mut cursor = 0usize;
    let bytes = src.as_bytes();
    for (start, end) in &hoisted_ranges {
        body.extend_from_slice(&bytes[cursor..*start]);
        cursor = *end;
    }
    body.extend_from_slice(&bytes[cursor..]);

    component_compiler_core::js_scanner::hoist_imports(&body).is_empty()
}

#[quickcheck]
fn print_to_source_round_trips(soup: Soup) -> bool {
    // ALPHABET is pure ASCII, so every byte sequence it produces is valid UTF-8.
    let src = std::str::from_utf8(&soup.0).unwrap();
    let (doc, _) = build_tree(src.as_bytes());
    component_compiler_core::print_to_source(&doc, src) == src
}

#[test]
fn void_elements_round_trip_self_closing_regardless_of_slash() {
    for src in ["<br>", "<br/>", "<BR>"] {
        let (doc, _) = build_tree(src.as_bytes());
        let root = doc.root();
        let node = doc.get(root.children[0]);
        match &node.kind {
            NodeKind::Element { self_closing, .. } => assert!(self_closing, "{src}"),
            other => panic!("{src}: expected element, got {other:?}"),
        }
    }
}

#[test]
fn frontmatter_triple_dash_inside_constructs_does_not_close_fence() {
    let cases = [
        "---\nconst a = \"---\";\n---",
        "---\nconst a = `---`;\n---",
        "---\n// ---\nconst a = 1;\n---",
        "---\n/* --- */\nconst a = 1;\n---",
        "---\nconst a = /---/;\n---",
    ];
    for src in cases {
        let mut tok = Tokenizer::new(src.as_bytes());
        let kinds: Vec<TokenKind> = std::iter::from_fn(|| tok.next_token())
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds.iter().filter(|k| **k == TokenKind::FrontmatterFence).count(),
            2,
            "{src}"
        );
    }
}
