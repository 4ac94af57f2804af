//! JS-level scanning over frontmatter source: splitting
//! it into top-level statements, hoisting imports/exports, isolating the
//! render body, locating a declared `Props` type, and reading a
//! destructured `Astro.props` binding.
//!
//! None of this parses JS — every function finds statement/run boundaries
//! using the same lexical primitives the tokenizer's expression loop uses
//! (`js_lex.rs`), so both share one definition of punctuator,
//! identifier-start, and keyword.

use crate::js_lex::{self, is_identifier_start, SkipOutcome, DECLARATION_KEYWORDS};
use crate::span::Span;
use std::borrow::Cow;

/// One top-level statement, delimited by a semicolon at brace depth zero
/// or, failing that, EOF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    pub span: Span,
}

/// Splits `src` (frontmatter body, braces already stripped by the caller)
/// into top-level statements. Brace/bracket/paren nesting, strings,
/// template literals, comments, and regexps are all honored so a `;`
/// inside any of them never ends a statement early.
pub fn split_statements(src: &[u8]) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut i = js_lex::skip_whitespace(src, 0);
    let mut start = i;
    let mut depth: i32 = 0;

    while i < src.len() {
        match src[i] {
            b'{' | b'(' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b')' | b']' => {
                depth -= 1;
                i += 1;
            }
            b'\'' | b'"' => match js_lex::skip_quoted_string(src, i, src[i]) {
                SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
            },
            b'`' => match js_lex::skip_template_literal(src, i) {
                SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
            },
            b'/' if matches!(src.get(i + 1), Some(b'/') | Some(b'*')) => {
                match js_lex::skip_comment(src, i) {
                    SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
                }
            }
            b';' if depth <= 0 => {
                statements.push(Statement {
                    span: Span::new(start as u32, i as u32),
                });
                i += 1;
                i = js_lex::skip_whitespace(src, i);
                start = i;
                depth = 0;
            }
            _ => i += 1,
        }
    }

    let tail = Span::new(start as u32, src.len() as u32);
    if !tail.is_empty() {
        statements.push(Statement { span: tail });
    }
    statements
}

fn leading_keyword<'a>(src: &'a [u8], stmt: Statement) -> Option<&'a [u8]> {
    let start = stmt.span.start as usize;
    js_lex::scan_identifier(src, start)
}

/// Finds every top-level `import ...` statement, in source order.
pub fn hoist_imports(src: &[u8]) -> Vec<Statement> {
    split_statements(src)
        .into_iter()
        .filter(|s| matches!(leading_keyword(src, *s), Some(b"import")))
        .collect()
}

/// Finds every top-level `export ...` statement, in source order.
pub fn hoist_exports(src: &[u8]) -> Vec<Statement> {
    split_statements(src)
        .into_iter()
        .filter(|s| matches!(leading_keyword(src, *s), Some(b"export")))
        .collect()
}

/// The render body starts at the first top-level reserved-word
/// declaration (`var`, `let`, `const`, `async`, `function`, `class`) that
/// follows all top-level `import`/`export` statements, and runs to the end
/// of `src`. A leading expression statement (`doSomething();`) before that
/// first declaration is not part of the render body and is skipped, same
/// as any `import`/`export` statement (whose own leading keyword never
/// matches the reserved-word set, so it's skipped automatically). Returns
/// `None` when no such declaration exists.
pub fn find_render_body(src: &[u8]) -> Option<Span> {
    let statements = split_statements(src);
    let start = statements.iter().find_map(|s| {
        let kw = leading_keyword(src, *s)?;
        DECLARATION_KEYWORDS
            .iter()
            .any(|k| k.as_bytes() == kw)
            .then_some(s.span.start)
    })?;
    let end = statements.last()?.span.end;
    Some(Span::new(start, end))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropBinding {
    pub name: String,
    /// Source text of the default value expression, if any
    /// (`= expr` inside the destructuring pattern). Most props declare no
    /// default, so this stays the zero-allocation `Cow::Borrowed("")`
    /// rather than `Option<String>` paying a `None` allocation-shape cost
    /// per binding.
    pub default: Cow<'static, str>,
}

/// Descriptor for the frontmatter's `Props` type binding, as found by
/// [`find_props`]: the type identifier the printer should annotate the
/// component signature with, the source statement it came from (absent
/// when nothing was found), and the generic parameter list text, if any
/// (e.g. `<T>` off `interface Props<T>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Props {
    /// Type identifier the printer should annotate the component
    /// signature with. Almost always the literal `"Props"`, or the
    /// zero-allocation `Record<string, any>` fallback; `Cow` avoids
    /// paying an allocation for either well-known case.
    pub ident: Cow<'static, str>,
    pub statement: Option<Span>,
    pub generics: Option<String>,
}

impl Default for Props {
    fn default() -> Self {
        Self {
            ident: Cow::Borrowed("Record<string, any>"),
            statement: None,
            generics: None,
        }
    }
}

/// Recognises the first top-level `interface Props`, `type Props =`, or
/// `import { Props }` / `import Props from` in `src`, returning a
/// descriptor the printer can use to annotate a typed component
/// signature. Falls back to `ident: "Record<string, any>"` with no
/// statement when none of the three forms appear.
///
/// Scans for keyword positions directly rather than routing through
/// [`split_statements`]: that splitter only recognizes `;`-terminated
/// statements, but `interface`/`type` declarations are block-bodied and
/// commonly carry no trailing semicolon at all, so a semicolon-seeking
/// split would merge the declaration with whatever follows it. There is
/// no statement-boundary tracking here at all — every candidate match
/// still requires the literal identifier `Props` immediately after the
/// keyword, which already rules out `interface`/`type`/`import` appearing
/// as a field name or property access rather than a real declaration.
pub fn find_props(src: &[u8]) -> Props {
    let mut i = js_lex::skip_whitespace(src, 0);

    while i < src.len() {
        match src[i] {
            b'\'' | b'"' => match js_lex::skip_quoted_string(src, i, src[i]) {
                SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
            },
            b'`' => match js_lex::skip_template_literal(src, i) {
                SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
            },
            b'/' if matches!(src.get(i + 1), Some(b'/') | Some(b'*')) => {
                match js_lex::skip_comment(src, i) {
                    SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
                }
            }
            b if is_identifier_start(b) => {
                let ident = js_lex::scan_identifier(src, i).expect("checked identifier-start");
                let after_kw = js_lex::skip_whitespace(src, i + ident.len());
                match ident {
                    b"interface" => {
                        if let Some(found) = match_props_interface(src, i, after_kw) {
                            return found;
                        }
                    }
                    b"type" => {
                        if let Some(found) = match_props_type_alias(src, i, after_kw) {
                            return found;
                        }
                    }
                    b"import" => {
                        if let Some(found) = match_props_import(src, i, after_kw) {
                            return found;
                        }
                    }
                    _ => {}
                }
                i += ident.len();
            }
            _ => i += 1,
        }
    }

    Props::default()
}

/// `interface Props<generics>? { ... }`: the declaration's span ends at
/// the matching closing brace, not at the next semicolon.
fn match_props_interface(src: &[u8], kw_start: usize, after_kw: usize) -> Option<Props> {
    let (generics, after_ident) = match_props_ident_and_generics(src, after_kw)?;
    let brace_at = skip_to_byte(src, after_ident, b'{')?;
    let SkipOutcome::Ok(close) = js_lex::skip_balanced_braces(src, brace_at) else {
        return None;
    };
    Some(Props {
        ident: Cow::Borrowed("Props"),
        statement: Some(Span::new(kw_start as u32, close as u32)),
        generics,
    })
}

/// `type Props<generics>? = ...;`: the declaration's span ends at the
/// next top-level semicolon (or EOF, under ASI).
fn match_props_type_alias(src: &[u8], kw_start: usize, after_kw: usize) -> Option<Props> {
    let (generics, after_ident) = match_props_ident_and_generics(src, after_kw)?;
    let eq_at = js_lex::skip_whitespace(src, after_ident);
    if src.get(eq_at) != Some(&b'=') {
        return None;
    }
    let end = skip_to_next_top_level_semicolon(src, eq_at + 1);
    Some(Props {
        ident: Cow::Borrowed("Props"),
        statement: Some(Span::new(kw_start as u32, end as u32)),
        generics,
    })
}

/// Matches a `Props` identifier immediately at `at`, plus an optional
/// `<generics>` list right after it. Returns the generics text (if any)
/// and the byte offset just past whichever of the two was present.
fn match_props_ident_and_generics(src: &[u8], at: usize) -> Option<(Option<String>, usize)> {
    let ident = js_lex::scan_identifier(src, at)?;
    if ident != b"Props" {
        return None;
    }
    let after_ident = at + ident.len();
    match src.get(after_ident) {
        Some(b'<') => match js_lex::skip_balanced_angle_brackets(src, after_ident) {
            Some(end) => Some((
                Some(String::from_utf8_lossy(&src[after_ident..end]).into_owned()),
                end,
            )),
            None => Some((None, after_ident)),
        },
        _ => Some((None, after_ident)),
    }
}

fn skip_to_byte(src: &[u8], from: usize, target: u8) -> Option<usize> {
    let mut i = from;
    while i < src.len() {
        if src[i] == target {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn skip_to_next_top_level_semicolon(src: &[u8], from: usize) -> usize {
    let mut i = from;
    let mut depth: i32 = 0;
    while i < src.len() {
        match src[i] {
            b'{' | b'(' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b')' | b']' => {
                depth -= 1;
                i += 1;
            }
            b'\'' | b'"' => match js_lex::skip_quoted_string(src, i, src[i]) {
                SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
            },
            b'`' => match js_lex::skip_template_literal(src, i) {
                SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
            },
            b';' if depth <= 0 => return i,
            b'\n' if depth <= 0 => return i,
            _ => i += 1,
        }
    }
    i
}

/// Matches `import { Props }` or `import Props from "..."` for
/// [`find_props`]. Aliased named imports (`import { Foo as Props }`) bind
/// under the local name `Props`, same as real ES module semantics.
/// `kw_start` is the byte offset of the `import` keyword itself;
/// `after_kw` is just past it (and its trailing whitespace).
fn match_props_import(src: &[u8], kw_start: usize, after_kw: usize) -> Option<Props> {
    match src.get(after_kw) {
        Some(b'{') => {
            let SkipOutcome::Ok(close) = js_lex::skip_balanced_braces(src, after_kw) else {
                return None;
            };
            let inner = &src[after_kw + 1..close - 1];
            let mut i = js_lex::skip_whitespace(inner, 0);
            while i < inner.len() {
                let Some(ident) = js_lex::scan_identifier(inner, i) else {
                    i += 1;
                    continue;
                };
                i = js_lex::skip_whitespace(inner, i + ident.len());
                let mut local = ident;
                if js_lex::scan_identifier(inner, i) == Some(b"as".as_slice()) {
                    let after_as = js_lex::skip_whitespace(inner, i + 2);
                    if let Some(alias) = js_lex::scan_identifier(inner, after_as) {
                        local = alias;
                        i = after_as + alias.len();
                    }
                }
                if local == b"Props" {
                    let end = skip_to_next_top_level_semicolon(src, close);
                    return Some(Props {
                        ident: Cow::Borrowed("Props"),
                        statement: Some(Span::new(kw_start as u32, end as u32)),
                        generics: None,
                    });
                }
                i = skip_to_next_comma(inner, i);
                if inner.get(i) == Some(&b',') {
                    i = js_lex::skip_whitespace(inner, i + 1);
                }
            }
            None
        }
        Some(_) => {
            let ident = js_lex::scan_identifier(src, after_kw)?;
            if ident == b"Props" {
                let end = skip_to_next_top_level_semicolon(src, after_kw + ident.len());
                Some(Props {
                    ident: Cow::Borrowed("Props"),
                    statement: Some(Span::new(kw_start as u32, end as u32)),
                    generics: None,
                })
            } else {
                None
            }
        }
        None => None,
    }
}

/// Finds a top-level `const { a, b: renamed, c = 1 } = Astro.props;`
/// binding and returns its destructured prop names. Only the single
/// well-known `Astro.props` source identifier is recognized; anything
/// else destructured from a different expression is not a props binding.
/// This is a printer-side convenience distinct from [`find_props`],
/// which recognizes a declared `Props` *type*, not the runtime
/// destructure: the printer needs both — the declared type to annotate
/// the signature with when present, and these binding names to know
/// what locals the template actually references when it isn't.
pub fn find_prop_bindings(src: &[u8]) -> Vec<PropBinding> {
    for stmt in split_statements(src) {
        let Some(kw) = leading_keyword(src, stmt) else {
            continue;
        };
        if !DECLARATION_KEYWORDS
            .iter()
            .any(|k| k.as_bytes() == kw && *k != "async" && *k != "function" && *k != "class")
        {
            continue;
        }
        let after_kw = stmt.span.start as usize + kw.len();
        let brace_at = js_lex::skip_whitespace(src, after_kw);
        if src.get(brace_at) != Some(&b'{') {
            continue;
        }
        let SkipOutcome::Ok(brace_end) = js_lex::skip_balanced_braces(src, brace_at) else {
            continue;
        };
        let after_pattern = js_lex::skip_whitespace(src, brace_end);
        if src.get(after_pattern) != Some(&b'=') {
            continue;
        }
        let rhs_start = js_lex::skip_whitespace(src, after_pattern + 1);
        if !src[rhs_start..].starts_with(b"Astro.props") {
            continue;
        }
        return parse_destructure_pattern(&src[brace_at + 1..brace_end - 1]);
    }
    Vec::new()
}

/// Parses the inside of `{ a, b: renamed, c = 1 }` into prop bindings.
/// Renames (`b: renamed`) bind under the destructuring target name
/// (`renamed`), matching how the value is actually referenced in the
/// render body.
fn parse_destructure_pattern(inner: &[u8]) -> Vec<PropBinding> {
    let mut out = Vec::new();
    let mut i = js_lex::skip_whitespace(inner, 0);
    while i < inner.len() {
        let Some(ident) = js_lex::scan_identifier(inner, i) else {
            i += 1;
            continue;
        };
        let mut name = String::from_utf8_lossy(ident).into_owned();
        i = js_lex::skip_whitespace(inner, i + ident.len());

        if inner.get(i) == Some(&b':') {
            i = js_lex::skip_whitespace(inner, i + 1);
            if let Some(renamed) = js_lex::scan_identifier(inner, i) {
                name = String::from_utf8_lossy(renamed).into_owned();
                i = js_lex::skip_whitespace(inner, i + renamed.len());
            }
        }

        let mut default = Cow::Borrowed("");
        if inner.get(i) == Some(&b'=') {
            let value_start = js_lex::skip_whitespace(inner, i + 1);
            let value_end = scan_to_top_level_comma(inner, value_start);
            default = Cow::Owned(
                String::from_utf8_lossy(&inner[value_start..value_end])
                    .trim()
                    .to_string(),
            );
            i = value_end;
        }

        out.push(PropBinding { name, default });

        i = skip_to_next_comma(inner, i);
        if inner.get(i) == Some(&b',') {
            i = js_lex::skip_whitespace(inner, i + 1);
        }
    }
    out
}

fn scan_to_top_level_comma(src: &[u8], start: usize) -> usize {
    skip_to_next_comma(src, start)
}

fn skip_to_next_comma(src: &[u8], start: usize) -> usize {
    let mut i = start;
    let mut depth: i32 = 0;
    while i < src.len() {
        match src[i] {
            b'{' | b'(' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b')' | b']' => {
                depth -= 1;
                i += 1;
            }
            b',' if depth <= 0 => return i,
            b'\'' | b'"' => match js_lex::skip_quoted_string(src, i, src[i]) {
                SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
            },
            b'`' => match js_lex::skip_template_literal(src, i) {
                SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
            },
            _ => i += 1,
        }
    }
    i
}

/// True when `b` can start an identifier, exposed for callers (e.g. the
/// tree constructor's component-name check) that want the exact same
/// notion of "identifier" the scanner itself uses.
pub fn is_identifier_byte(b: u8) -> bool {
    is_identifier_start(b)
}
