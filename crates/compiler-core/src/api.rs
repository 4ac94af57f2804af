//! Public facade. Every entry point takes a plain struct of
//! `Option<_>` fields, built with `..Default::default()`, rather than a
//! builder or a config-loading crate.

use crate::diagnostics::PublicDiagnostic;
use crate::js_scanner::{self, PropBinding, Props};
use crate::node::Document;
use crate::span::Span;
use crate::tree_constructor;

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// File name attached to diagnostics; has no effect
    /// on parsing itself.
    pub filename: Option<String>,
}

/// Options threaded through to the [`Printer`]/style-preprocessing
/// collaborators. `compiler-core` stores these opaquely and never
/// interprets them itself: hydration strategy, path resolution, and
/// transition scoping are all printer-side concerns.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub filename: Option<String>,
    /// Stable hash input for style-scoping (`spec.md` §4.5). Opaque to
    /// `compiler-core`: it is handed to the printer verbatim and never
    /// itself hashed here, since the hash function is an out-of-scope
    /// external collaborator (`spec.md` §1).
    pub normalized_filename: Option<String>,
    pub internal_url: Option<String>,
    pub resolve_path: Option<String>,
    pub transition_scope: Option<String>,
    pub hydration: Option<String>,
}

impl TransformOptions {
    fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or("<anonymous>")
    }
}

pub struct ParseResult {
    pub document: Document,
    pub diagnostics: Vec<PublicDiagnostic>,
}

/// Parses `source` into a [`Document`] without printing it
/// (the JSON tree entry point sits on top of this).
pub fn parse(source: &str, options: &ParseOptions) -> ParseResult {
    let (document, diagnostics) = tree_constructor::build_tree(source.as_bytes());
    let filename = options.filename.as_deref().unwrap_or("<anonymous>");
    ParseResult {
        document,
        diagnostics: diagnostics.into_public(source, filename),
    }
}

/// What [`Printer::print`] hands back across the fixed core/printer seam
/// (`spec.md` §6.3: "output_bytes, sourcemap_chunk, extracted_styles?,
/// extracted_scripts?"). The core never inspects `code`; it only
/// assembles these fields into [`TransformResult`].
#[derive(Debug, Clone, Default)]
pub struct PrintedOutput {
    pub code: String,
    pub map: Option<String>,
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

/// What [`Printer::print_tsx`] hands back (`spec.md` §4.5:
/// `convert_to_tsx(..) -> { code, map, meta_ranges, diagnostics }`).
#[derive(Debug, Clone, Default)]
pub struct TsxOutput {
    pub code: String,
    pub map: Option<String>,
    pub meta_ranges: Vec<Span>,
}

/// External collaborator that turns a parsed tree into emitted source
/// text. Printing itself is out of scope for the core pipeline; this
/// trait is the one fixed seam between the two.
pub trait Printer {
    /// Emits the component's target-runtime output (e.g. a framework
    /// render function) plus whatever source map and extracted-block
    /// artifacts the printer produced alongside it.
    fn print(&self, document: &Document, source: &str, options: &TransformOptions) -> PrintedOutput;

    /// Emits a TSX-shaped rendition suitable for type-checking tooling.
    /// Distinct from [`Printer::print`] because the two consumers want
    /// different things from the same tree: a TSX view keeps prop types
    /// and JSX shape; the runtime view does not need either. `props_type`
    /// is the declared `Props` type found by [`js_scanner::find_props`]
    /// (falling back to `Record<string, any>`); `bindings` are the actual
    /// destructured local names the template references, from
    /// [`js_scanner::find_prop_bindings`].
    fn print_tsx(
        &self,
        document: &Document,
        source: &str,
        props_type: &Props,
        bindings: &[PropBinding],
    ) -> TsxOutput;
}

pub struct TransformResult {
    pub code: String,
    pub map: Option<String>,
    pub css: Vec<String>,
    pub scripts: Vec<String>,
    pub diagnostics: Vec<PublicDiagnostic>,
}

/// Parses and prints `source` through `printer`.
pub fn transform(
    source: &str,
    options: &TransformOptions,
    printer: &dyn Printer,
) -> TransformResult {
    let (document, diagnostics) = tree_constructor::build_tree(source.as_bytes());
    let printed = printer.print(&document, source, options);
    TransformResult {
        code: printed.code,
        map: printed.map,
        css: printed.styles,
        scripts: printed.scripts,
        diagnostics: diagnostics.into_public(source, options.filename()),
    }
}

pub struct TsxResult {
    pub code: String,
    pub map: Option<String>,
    pub meta_ranges: Vec<Span>,
    pub diagnostics: Vec<PublicDiagnostic>,
}

/// Parses `source` and emits its TSX rendition, scanning
/// the frontmatter for the `Astro.props` destructure so the printer can
/// annotate prop types.
pub fn convert_to_tsx(
    source: &str,
    options: &TransformOptions,
    printer: &dyn Printer,
) -> TsxResult {
    let (document, diagnostics) = tree_constructor::build_tree(source.as_bytes());
    let fm = frontmatter_text(&document, source);
    let props_type = fm
        .map(|fm| js_scanner::find_props(fm.as_bytes()))
        .unwrap_or_default();
    let bindings = fm
        .map(|fm| js_scanner::find_prop_bindings(fm.as_bytes()))
        .unwrap_or_default();
    let printed = printer.print_tsx(&document, source, &props_type, &bindings);
    TsxResult {
        code: printed.code,
        map: printed.map,
        meta_ranges: printed.meta_ranges,
        diagnostics: diagnostics.into_public(source, options.filename()),
    }
}

/// Text strictly between the `---` fences (exclusive), so callers scanning
/// it as JS never have to account for the fence markers themselves.
fn frontmatter_text<'a>(document: &Document, source: &'a str) -> Option<&'a str> {
    use crate::node::NodeKind;
    document.root().children.iter().find_map(|&id| {
        let node = document.get(id);
        if !matches!(node.kind, NodeKind::Frontmatter) {
            return None;
        }
        let whole = &source[node.span.start as usize..node.span.end as usize];
        Some(
            whole
                .strip_prefix("---")
                .and_then(|s| s.strip_suffix("---"))
                .unwrap_or(whole),
        )
    })
}

/// A CSS (or CSS-in-JS) preprocessor invoked once per `<style>` block.
/// Implementations must be `Sync`: every block in a document is
/// preprocessed concurrently.
pub trait StylePreprocessor: Sync {
    fn preprocess(&self, css: &str, filename: &str) -> String;
}

/// Extracts every top-level `<style>` element's text content, in document
/// order.
pub fn style_blocks<'a>(document: &Document, source: &'a str) -> Vec<&'a str> {
    use crate::node::NodeKind;
    document
        .walk()
        .filter_map(|(id, _)| {
            let node = document.get(id);
            match &node.kind {
                NodeKind::Element { name, .. } if name.eq_ignore_ascii_case("style") => {
                    node.children.first().map(|&child| {
                        let text_span = document.get(child).span;
                        &source[text_span.start as usize..text_span.end as usize]
                    })
                }
                _ => None,
            }
        })
        .collect()
}

/// Extracts every top-level `<script>` element's text content, in
/// document order. Mirrors [`style_blocks`]: the core's job is only to
/// locate the blocks, never to interpret their contents.
pub fn script_blocks<'a>(document: &Document, source: &'a str) -> Vec<&'a str> {
    use crate::node::NodeKind;
    document
        .walk()
        .filter_map(|(id, _)| {
            let node = document.get(id);
            match &node.kind {
                NodeKind::Element { name, .. } if name.eq_ignore_ascii_case("script") => {
                    node.children.first().map(|&child| {
                        let text_span = document.get(child).span;
                        &source[text_span.start as usize..text_span.end as usize]
                    })
                }
                _ => None,
            }
        })
        .collect()
}

/// Upper bound on concurrently-running style-preprocessing threads.
/// A document with more style blocks than this is processed in
/// successive fan-out/await-all waves rather than spawning one thread
/// per block unconditionally.
const MAX_STYLE_WORKERS: usize = 4;

/// Runs `preprocessor` over every block in `css_blocks` concurrently,
/// returning results in the same order the blocks were given
/// (fan-out, then await all, in source order).
///
/// Grounded on `std::thread::scope`'s documented split-mutable-borrow
/// pattern: each wave's blocks get their own pre-sized `Option<String>`
/// slot, so completion order within the wave never matters and no lock is
/// needed to assemble the final `Vec`.
pub fn preprocess_styles(
    css_blocks: &[&str],
    filename: &str,
    preprocessor: &(dyn StylePreprocessor + Sync),
) -> Vec<String> {
    let mut results: Vec<Option<String>> = css_blocks.iter().map(|_| None).collect();
    for (chunk_results, chunk_blocks) in results
        .chunks_mut(MAX_STYLE_WORKERS)
        .zip(css_blocks.chunks(MAX_STYLE_WORKERS))
    {
        std::thread::scope(|scope| {
            for (slot, css) in chunk_results.iter_mut().zip(chunk_blocks.iter()) {
                scope.spawn(move || {
                    *slot = Some(preprocessor.preprocess(css, filename));
                });
            }
        });
    }
    results.into_iter().map(|r| r.expect("every slot filled before scope joins")).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    struct UppercasePrinter;
    impl Printer for UppercasePrinter {
        fn print(&self, _document: &Document, source: &str, _options: &TransformOptions) -> PrintedOutput {
            PrintedOutput {
                code: source.to_ascii_uppercase(),
                ..Default::default()
            }
        }
        fn print_tsx(
            &self,
            _document: &Document,
            _source: &str,
            _props_type: &Props,
            bindings: &[PropBinding],
        ) -> TsxOutput {
            TsxOutput {
                code: bindings.iter().map(|p| p.name.clone()).collect::<Vec<_>>().join(","),
                ..Default::default()
            }
        }
    }

    struct ReversePreprocessor;
    impl StylePreprocessor for ReversePreprocessor {
        fn preprocess(&self, css: &str, _filename: &str) -> String {
            css.chars().rev().collect()
        }
    }

    #[test]
    fn parse_builds_a_document() {
        let result = parse("<div>hi</div>", &ParseOptions::default());
        assert!(result.diagnostics.is_empty());
        assert!(!result.document.is_empty());
    }

    #[test]
    fn transform_delegates_to_printer() {
        let result = transform("<div/>", &TransformOptions::default(), &UppercasePrinter);
        assert_eq!(result.code, "<DIV/>");
    }

    #[test]
    fn convert_to_tsx_passes_scanned_props() {
        let src = "---\nconst { title } = Astro.props;\n---\n<div/>";
        let result = convert_to_tsx(src, &TransformOptions::default(), &UppercasePrinter);
        assert_eq!(result.code, "title");
    }

    #[test]
    fn preprocess_styles_preserves_order() {
        let blocks = vec!["abc", "de", "fghij"];
        let out = preprocess_styles(&blocks, "test.cmp", &ReversePreprocessor);
        assert_eq!(out, vec!["cba", "ed", "jihgf"]);
    }

    #[test]
    fn style_blocks_extracts_text_content() {
        let result = parse("<style>a{color:red}</style>", &ParseOptions::default());
        let blocks = style_blocks(&result.document, "<style>a{color:red}</style>");
        assert_eq!(blocks, vec!["a{color:red}"]);
    }

    #[test]
    fn script_blocks_extracts_text_content() {
        let src = "<script>console.log(1)</script>";
        let result = parse(src, &ParseOptions::default());
        let blocks = script_blocks(&result.document, src);
        assert_eq!(blocks, vec!["console.log(1)"]);
    }
}
