//! Reference implementation of `compiler-core`'s [`Printer`] seam: the
//! printer is an external collaborator whose *interface* is fixed by
//! that trait but whose internals are not.
//!
//! This crate exists to give that trait boundary something real to
//! compile and test against, as a thin, independent consumer of the
//! parser's tree rather than part of the parsing crate itself. It is
//! deliberately not a production JS/TSX emitter: no minification, no
//! scope hashing, no hydration wiring — just enough tree-walking to turn
//! a [`Document`] back into text two ways.

use component_compiler_core::js_scanner::{self, PropBinding};
use component_compiler_core::node::ROOT;
use component_compiler_core::token::{Attribute, AttributeKind};
use component_compiler_core::{
    script_blocks, style_blocks, Document, NodeId, NodeKind, PrintedOutput, Printer, Props,
    TransformOptions, TsxOutput,
};

/// A single zero-sized converter struct: no configuration lives on the
/// printer itself, every call is parameterized by its arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPrinter;

impl Printer for DefaultPrinter {
    fn print(&self, document: &Document, source: &str, options: &TransformOptions) -> PrintedOutput {
        let mut out = String::new();

        match frontmatter_body(document, source) {
            Some(fm) => {
                for stmt in js_scanner::hoist_imports(fm.as_bytes()) {
                    out.push_str(slice(fm, stmt.span.start, stmt.span.end));
                    out.push_str(";\n");
                }
                for stmt in js_scanner::hoist_exports(fm.as_bytes()) {
                    out.push_str(slice(fm, stmt.span.start, stmt.span.end));
                    out.push_str(";\n");
                }
                out.push_str("\nasync function $$render($$result) {\n");
                if let Some(body) = js_scanner::find_render_body(fm.as_bytes()) {
                    out.push_str(slice(fm, body.start, body.end));
                    out.push_str(";\n");
                }
            }
            None => out.push_str("async function $$render($$result) {\n"),
        }

        out.push_str("  return $$result.createHtml(`");
        render_children_as_template(document, ROOT, source, &mut out);
        out.push_str("`);\n}\n\n");
        out.push_str("export default $$render;\n");
        out.push_str(&format!(
            "// component: {}\n",
            options.filename.as_deref().unwrap_or("<anonymous>")
        ));

        PrintedOutput {
            code: out,
            map: None,
            styles: style_blocks(document, source).into_iter().map(String::from).collect(),
            scripts: script_blocks(document, source).into_iter().map(String::from).collect(),
        }
    }

    fn print_tsx(
        &self,
        document: &Document,
        source: &str,
        props_type: &Props,
        bindings: &[PropBinding],
    ) -> TsxOutput {
        let mut out = String::new();

        if let Some(fm) = frontmatter_body(document, source) {
            for stmt in js_scanner::hoist_imports(fm.as_bytes()) {
                out.push_str(slice(fm, stmt.span.start, stmt.span.end));
                out.push_str(";\n");
            }
        }

        // A declared `interface Props`/`type Props`/imported `Props` is
        // passed through verbatim (it already type-checks on its own);
        // otherwise synthesize one from whatever the template destructures
        // off `Astro.props`, matching the bindings' shape at `any`.
        match props_type.statement {
            Some(span) if props_type.ident == "Props" => {
                out.push('\n');
                out.push_str(slice(source, span.start, span.end));
                out.push_str(";\n");
            }
            _ => {
                out.push_str("\nexport interface Props {\n");
                for prop in bindings {
                    out.push_str(&format!("  {}: any;\n", prop.name));
                }
                out.push_str("}\n\n");
            }
        }

        out.push_str(&format!(
            "export default function Component(props: {}) {{\n",
            props_type.ident
        ));
        for prop in bindings {
            match prop.default.as_ref() {
                "" => out.push_str(&format!("  const {{ {} }} = props;\n", prop.name)),
                default => out.push_str(&format!(
                    "  const {{ {0} = {1} }} = props;\n",
                    prop.name, default
                )),
            }
        }
        out.push_str("  return (\n    <>\n");
        render_children_as_jsx(document, ROOT, source, &mut out, 3);
        out.push_str("    </>\n  );\n}\n");

        TsxOutput { code: out, map: None, meta_ranges: Vec::new() }
    }
}

fn slice(source: &str, start: u32, end: u32) -> &str {
    &source[start as usize..end as usize]
}

/// Text strictly between the `---` fences, mirroring
/// `compiler_core::api`'s private helper of the same shape: callers that
/// scan frontmatter as JS should never have to special-case the fences.
fn frontmatter_body<'a>(document: &Document, source: &'a str) -> Option<&'a str> {
    document.root().children.iter().find_map(|&id| {
        let node = document.get(id);
        if !matches!(node.kind, NodeKind::Frontmatter) {
            return None;
        }
        let whole = slice(source, node.span.start, node.span.end);
        Some(
            whole
                .strip_prefix("---")
                .and_then(|s| s.strip_suffix("---"))
                .unwrap_or(whole),
        )
    })
}

/// Escapes a text run so it is safe to splice into a JS template literal:
/// backtick, backslash, and `${` are the only three sequences that would
/// otherwise end or reinterpret the literal early.
fn escape_template_text(text: &str, out: &mut String) {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '$' if text[i..].starts_with("${") => out.push_str("\\$"),
            other => out.push(other),
        }
    }
}

fn render_children_as_template(document: &Document, id: NodeId, source: &str, out: &mut String) {
    for &child in &document.get(id).children {
        render_node_as_template(document, child, source, out);
    }
}

fn render_node_as_template(document: &Document, id: NodeId, source: &str, out: &mut String) {
    let node = document.get(id);
    match &node.kind {
        NodeKind::Frontmatter | NodeKind::Doctype => {}
        NodeKind::Text => escape_template_text(slice(source, node.span.start, node.span.end), out),
        NodeKind::Comment => {
            out.push_str("<!--");
            escape_template_text(slice(source, node.span.start, node.span.end), out);
            out.push_str("-->");
        }
        NodeKind::Expression => {
            out.push_str("${");
            out.push_str(inner_expression_text(document, id, source).trim());
            out.push('}');
        }
        NodeKind::Fragment { .. } => render_children_as_template(document, id, source, out),
        NodeKind::Element { name, attributes, self_closing, .. } => {
            out.push('<');
            out.push_str(name);
            render_attributes_as_template(attributes, out);
            if *self_closing {
                out.push_str("/>");
            } else {
                out.push('>');
                render_children_as_template(document, id, source, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        NodeKind::Document => render_children_as_template(document, id, source, out),
    }
}

fn render_attributes_as_template(attributes: &[Attribute], out: &mut String) {
    for attr in attributes {
        out.push(' ');
        match attr.kind {
            AttributeKind::Spread => out.push_str(&format!("...${{{}}}", attr.key)),
            AttributeKind::Shorthand => {
                out.push_str(&attr.key);
                out.push_str("=${");
                out.push_str(&attr.value);
                out.push('}');
            }
            AttributeKind::Empty => out.push_str(&attr.namespaced_key()),
            AttributeKind::Expression => {
                out.push_str(&attr.namespaced_key());
                out.push_str("=${");
                out.push_str(&attr.value);
                out.push('}');
            }
            AttributeKind::Quoted | AttributeKind::TemplateLiteral => {
                out.push_str(&attr.namespaced_key());
                out.push_str("=\"");
                escape_template_text(&attr.value, out);
                out.push('"');
            }
        }
    }
}

/// Text inside an `Expression` node's braces, taken from its only
/// `Text` child if the tree constructor produced one, else the raw span
/// minus its delimiters.
fn inner_expression_text<'a>(document: &Document, id: NodeId, source: &'a str) -> &'a str {
    let node = document.get(id);
    if let Some(&child) = node.children.first() {
        let child_span = document.get(child).span;
        return slice(source, child_span.start, child_span.end);
    }
    let span = node.span;
    let start = (span.start + 1).min(span.end);
    let end = span.end.saturating_sub(1).max(start);
    slice(source, start, end)
}

fn render_children_as_jsx(document: &Document, id: NodeId, source: &str, out: &mut String, indent: usize) {
    for &child in &document.get(id).children {
        render_node_as_jsx(document, child, source, out, indent);
    }
}

fn render_node_as_jsx(document: &Document, id: NodeId, source: &str, out: &mut String, indent: usize) {
    let node = document.get(id);
    let pad = "  ".repeat(indent);
    match &node.kind {
        NodeKind::Frontmatter | NodeKind::Doctype => {}
        NodeKind::Text => {
            let text = slice(source, node.span.start, node.span.end);
            if !text.trim().is_empty() {
                out.push_str(&pad);
                out.push_str(text.trim());
                out.push('\n');
            }
        }
        NodeKind::Comment => {
            out.push_str(&pad);
            out.push_str("{/*");
            out.push_str(slice(source, node.span.start, node.span.end));
            out.push_str("*/}\n");
        }
        NodeKind::Expression => {
            out.push_str(&pad);
            out.push('{');
            out.push_str(inner_expression_text(document, id, source).trim());
            out.push_str("}\n");
        }
        NodeKind::Fragment { .. } => {
            out.push_str(&pad);
            out.push_str("<>\n");
            render_children_as_jsx(document, id, source, out, indent + 1);
            out.push_str(&pad);
            out.push_str("</>\n");
        }
        NodeKind::Element { name, attributes, self_closing, .. } => {
            out.push_str(&pad);
            out.push('<');
            out.push_str(name);
            render_attributes_as_jsx(attributes, out);
            if *self_closing {
                out.push_str(" />\n");
            } else {
                out.push_str(">\n");
                render_children_as_jsx(document, id, source, out, indent + 1);
                out.push_str(&pad);
                out.push_str("</");
                out.push_str(name);
                out.push_str(">\n");
            }
        }
        NodeKind::Document => render_children_as_jsx(document, id, source, out, indent),
    }
}

fn render_attributes_as_jsx(attributes: &[Attribute], out: &mut String) {
    for attr in attributes {
        out.push(' ');
        match attr.kind {
            AttributeKind::Spread => out.push_str(&format!("{{...{}}}", attr.key)),
            AttributeKind::Shorthand => out.push_str(&format!("{{{}}}", attr.key)),
            AttributeKind::Empty => out.push_str(&attr.namespaced_key()),
            AttributeKind::Expression => {
                out.push_str(&attr.namespaced_key());
                out.push_str("={");
                out.push_str(&attr.value);
                out.push('}');
            }
            AttributeKind::Quoted | AttributeKind::TemplateLiteral => {
                out.push_str(&attr.namespaced_key());
                out.push_str("=\"");
                out.push_str(&attr.value);
                out.push('"');
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use component_compiler_core::api::{convert_to_tsx, transform, ParseOptions};
    use component_compiler_core::parse;

    #[test]
    fn print_emits_a_template_literal_body() {
        let result = transform(
            "<div class=\"a\">hi {name}</div>",
            &TransformOptions::default(),
            &DefaultPrinter,
        );
        assert!(result.code.contains("<div class=\"a\">hi ${name}</div>"));
        assert!(result.code.contains("createHtml"));
    }

    #[test]
    fn print_hoists_frontmatter_imports_above_render() {
        let src = "---\nimport Foo from './foo';\nconst x = 1;\n---\n<Foo/>";
        let result = transform(src, &TransformOptions::default(), &DefaultPrinter);
        let import_pos = result.code.find("import Foo").unwrap();
        let render_pos = result.code.find("async function $$render").unwrap();
        assert!(import_pos < render_pos);
        assert!(result.code.contains("const x = 1"));
    }

    #[test]
    fn print_extracts_styles_and_scripts() {
        let src = "<style>h1{color:red}</style><script>console.log(1)</script><div/>";
        let result = transform(src, &TransformOptions::default(), &DefaultPrinter);
        assert_eq!(result.css, vec!["h1{color:red}"]);
        assert_eq!(result.scripts, vec!["console.log(1)"]);
    }

    #[test]
    fn print_tsx_emits_props_interface() {
        let src = "---\nconst { title } = Astro.props;\n---\n<h1>{title}</h1>";
        let result = convert_to_tsx(src, &TransformOptions::default(), &DefaultPrinter);
        assert!(result.code.contains("title: any;"));
        assert!(result.code.contains("<h1>"));
        assert!(result.code.contains("{title}"));
    }

    #[test]
    fn template_literal_escapes_backticks_in_text() {
        let doc = parse("<p>`a`</p>", &ParseOptions::default()).document;
        let mut out = String::new();
        render_children_as_template(&doc, ROOT, "<p>`a`</p>", &mut out);
        assert!(out.contains("\\`a\\`"));
    }
}
