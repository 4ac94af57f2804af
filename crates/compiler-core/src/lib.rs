//! Core parsing/transform pipeline for the component source format:
//! tokenizer → tree constructor → public facade.
//!
//! `compiler-core` never prints output itself — see [`api::Printer`] for
//! the one seam where an external collaborator takes over.

mod macros;

pub mod api;
pub mod diagnostics;
pub mod js_lex;
pub mod js_scanner;
pub mod json_tree;
pub mod node;
pub mod print_to_source;
pub mod span;
pub mod str_fns;
pub mod token;
pub mod tokenizer;
pub mod tree_constructor;

pub use api::{
    convert_to_tsx, parse, preprocess_styles, script_blocks, style_blocks, transform,
    ParseOptions, ParseResult, PrintedOutput, Printer, StylePreprocessor, TransformOptions,
    TransformResult, TsxOutput, TsxResult,
};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticHandler, PublicDiagnostic, Severity};
pub use js_scanner::Props;
pub use node::{Document, NodeData, NodeId, NodeKind};
pub use print_to_source::{print_node_to_source, print_to_source};
pub use span::{LineIndex, Span};
pub use token::{Attribute, AttributeKind, TagToken, Token, TokenKind};
pub use tokenizer::{Tokenizer, VOID_ELEMENTS};
