//! Thin `wasm-bindgen` glue over `compiler-core`'s public facade.
//!
//! Same `console_error_panic_hook` feature wiring, same thin
//! pass-through shape — every exported function here does nothing but
//! call into `compiler-core`/`compiler-printer` and hand back a JSON
//! string, since `wasm-bindgen` has no first-class way to hand a Rust
//! enum tree across the boundary without either `serde-wasm-bindgen` or
//! a JSON string, and plain scalar/boxed-slice return types stay simpler
//! than pulling in a richer bridging crate.

use component_compiler_core::api::{self, ParseOptions, TransformOptions};
use component_compiler_core::diagnostics::PublicDiagnostic;
use component_compiler_core::json_tree::{self, JsonNode};
use component_compiler_printer::DefaultPrinter;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[derive(Serialize)]
struct ParseResponse {
    ast: JsonNode,
    diagnostics: Vec<PublicDiagnostic>,
}

#[derive(Serialize)]
struct TransformResponse {
    code: String,
    map: Option<String>,
    css: Vec<String>,
    scripts: Vec<String>,
    diagnostics: Vec<PublicDiagnostic>,
}

#[derive(Serialize)]
struct TsxResponse {
    code: String,
    map: Option<String>,
    meta_ranges: Vec<component_compiler_core::Span>,
    diagnostics: Vec<PublicDiagnostic>,
}

/// `parse(source, options) -> { ast, diagnostics }`.
/// `filename` is optional; all other `ParseOptions` fields have no
/// observable effect on parsing, so the wasm surface doesn't carry them.
#[wasm_bindgen]
pub fn parse(source: &str, filename: Option<String>) -> String {
    let result = api::parse(source, &ParseOptions { filename });
    let response = ParseResponse {
        ast: json_tree::to_json_tree(&result.document, source),
        diagnostics: result.diagnostics,
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// `transform(source, options) -> { code, map, css, scripts, diagnostics }`.
/// Always drives [`DefaultPrinter`]; a host embedding a different printer
/// links against `compiler-core` directly instead of this crate.
#[wasm_bindgen]
pub fn transform(source: &str, filename: Option<String>) -> String {
    let options = TransformOptions {
        filename,
        ..Default::default()
    };
    let result = api::transform(source, &options, &DefaultPrinter);
    let response = TransformResponse {
        code: result.code,
        map: result.map,
        css: result.css,
        scripts: result.scripts,
        diagnostics: result.diagnostics,
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// `convert_to_tsx(source, options) -> { code, map, meta_ranges, diagnostics }`.
#[wasm_bindgen]
pub fn convert_to_tsx(source: &str, filename: Option<String>) -> String {
    let options = TransformOptions {
        filename,
        ..Default::default()
    };
    let result = api::convert_to_tsx(source, &options, &DefaultPrinter);
    let response = TsxResponse {
        code: result.code,
        map: result.map,
        meta_ranges: result.meta_ranges,
        diagnostics: result.diagnostics,
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_returns_ast_and_empty_diagnostics_for_clean_input() {
        let json = parse("<div>hi</div>", None);
        assert!(json.contains("\"ast\""));
        assert!(json.contains("\"diagnostics\":[]"));
    }

    #[test]
    fn transform_embeds_printer_output() {
        let json = transform("<div/>", Some("demo.cmp".to_string()));
        assert!(json.contains("createHtml"));
    }
}
