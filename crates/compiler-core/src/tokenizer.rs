//! Multi-mode tokenizer: byte-stream → typed token stream.
//!
//! A byte cursor plus a handful of `Option<usize>` span fields, one
//! `next_token` entry point, `strspn!`/`strcspn!` for character-class
//! runs, generalized with an expression-brace state machine and a
//! frontmatter lexer on top of the plain-HTML tokenizing core.

use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticHandler};
use crate::js_lex::{self, SkipOutcome};
use crate::macros::{strcspn, strspn};
use crate::span::Span;
use crate::str_fns::{stripos, strpos};
use crate::token::{Attribute, AttributeKind, TagToken, Token, TokenKind};
use std::collections::VecDeque;

/// HTML void elements: never have children, always round-trip as
/// self-closing.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements whose text content is not parsed for markup at all.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "noembed", "noframes", "plaintext", "xmp",
];

/// Raw-text elements that nonetheless host `{expr}` interpolations.
const RAW_WITH_EXPRESSION_ELEMENTS: &[&str] = &["title", "textarea"];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Whether `name`/`attributes` put an element's text content outside of
/// markup parsing: the fixed raw-text set, the raw-with-expression set
/// (still unparsed markup, just with `{expr}` interpolation), or any
/// element explicitly marked `is:raw`.
pub fn is_raw_element_name(name: &str, attributes: &[Attribute]) -> bool {
    let lower = name.to_ascii_lowercase();
    RAW_TEXT_ELEMENTS.contains(&lower.as_str())
        || RAW_WITH_EXPRESSION_ELEMENTS.contains(&lower.as_str())
        || attributes.iter().any(|a| a.key == "is:raw")
}

fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) || name.contains('.')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterState {
    Initial,
    Open,
    Closed,
}

/// One raw-text-mode the cursor can be inside: pure raw (no expressions)
/// or raw-with-expression (`title`/`textarea`).
#[derive(Debug, Clone)]
enum RawMode {
    Pure(String),
    WithExpression(String),
}

pub struct Tokenizer<'a> {
    src: &'a [u8],
    pos: usize,
    terminal: bool,
    pending: VecDeque<Token>,

    frontmatter_state: FrontmatterState,
    frontmatter_seen_element: bool,

    raw_mode: Option<RawMode>,
    /// Depth of `<math>` ancestors; while non-zero, `{`/`}` are plain text.
    no_expression_depth: u32,

    /// One entry per currently open top-level `{ ... }` expression; the
    /// value counts nested non-expression brace pairs within it.
    expression_stack: Vec<i32>,

    /// True when the previous emitted token was `Text` whose last byte was
    /// not whitespace — feeds the generics-vs-element heuristic.
    prev_text_had_no_trailing_space: bool,

    pub diagnostics: DiagnosticHandler,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            terminal: false,
            pending: VecDeque::new(),
            frontmatter_state: FrontmatterState::Initial,
            frontmatter_seen_element: false,
            raw_mode: None,
            no_expression_depth: 0,
            expression_stack: Vec::new(),
            prev_text_had_no_trailing_space: false,
            diagnostics: DiagnosticHandler::new(),
        }
    }

    pub fn enter_math(&mut self) {
        self.no_expression_depth += 1;
    }
    pub fn exit_math(&mut self) {
        self.no_expression_depth = self.no_expression_depth.saturating_sub(1);
    }

    pub fn enter_raw(&mut self, tag_name: &str) {
        self.raw_mode = Some(RawMode::Pure(tag_name.to_ascii_lowercase()));
    }
    pub fn enter_raw_with_expression(&mut self, tag_name: &str) {
        self.raw_mode = Some(RawMode::WithExpression(tag_name.to_ascii_lowercase()));
    }

    fn in_expression(&self) -> bool {
        !self.expression_stack.is_empty()
    }

    fn error_token(&mut self, at: usize) -> Token {
        self.terminal = true;
        Token::new(TokenKind::Error, Span::new(at as u32, self.src.len() as u32), Span::at(at as u32))
    }

    /// Primary tokenizer operation. Returns
    /// `None` once the stream is exhausted; after a call returns a token
    /// of kind [`TokenKind::Error`] the tokenizer is terminal and every
    /// subsequent call returns `None`.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.terminal {
            return None;
        }
        if let Some(t) = self.pending.pop_front() {
            return Some(t);
        }
        if self.pos >= self.src.len() {
            return None;
        }

        let token = if self.frontmatter_state == FrontmatterState::Open {
            self.next_frontmatter_token()
        } else if let Some(mode) = self.raw_mode.clone().filter(|_| !self.in_expression()) {
            self.next_raw_token(mode)
        } else {
            self.next_markup_token()
        };

        if let Some(t) = &token {
            self.prev_text_had_no_trailing_space = matches!(t.kind, TokenKind::Text)
                && self.src[..t.raw.end as usize]
                    .last()
                    .is_some_and(|b| !b.is_ascii_whitespace());
        }
        token
    }

    // ---------------------------------------------------------------
    // Frontmatter loop
    // ---------------------------------------------------------------

    fn next_frontmatter_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let mut i = self.pos;
        loop {
            if i >= self.src.len() {
                // Unterminated frontmatter: everything left is text, the
                // document never closes the fence.
                let span = Span::new(start as u32, i as u32);
                self.pos = i;
                self.frontmatter_state = FrontmatterState::Closed;
                return Some(Token::new(TokenKind::Text, span, span));
            }
            match self.src[i] {
                b'\'' | b'"' => match js_lex::skip_quoted_string(self.src, i, self.src[i]) {
                    SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
                },
                b'`' => match js_lex::skip_template_literal(self.src, i) {
                    SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
                },
                b'/' => {
                    // Inside open frontmatter, regexps may contain `{`/`}`
                    // freely (spec §4.1: "no boundary characters").
                    match js_lex::skip_comment(self.src, i) {
                        SkipOutcome::Ok(after) if after != i => i = after,
                        _ => match js_lex::skip_regexp(self.src, i, &[]) {
                            SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => i = after,
                        },
                    }
                }
                b'-' if self.src[i..].starts_with(b"---") => {
                    // Close the fence: flush any preceding text, then the
                    // fence token itself is queued for the next call.
                    let text_span = Span::new(start as u32, i as u32);
                    self.pos = i + 3;
                    self.frontmatter_state = FrontmatterState::Closed;
                    self.pending.push_back(Token::new(
                        TokenKind::FrontmatterFence,
                        Span::new(i as u32, self.pos as u32),
                        Span::new(i as u32, self.pos as u32),
                    ));
                    if text_span.is_empty() {
                        return self.pending.pop_front();
                    }
                    return Some(Token::new(TokenKind::Text, text_span, text_span));
                }
                _ => i += 1,
            }
        }
    }

    /// Attempts to open the frontmatter fence at the very start of the
    /// document. Must be called before any other token has been emitted.
    fn try_open_frontmatter(&mut self) -> Option<Token> {
        if self.frontmatter_state != FrontmatterState::Initial || self.frontmatter_seen_element {
            return None;
        }
        let ws = js_lex::skip_whitespace(self.src, self.pos);
        if self.src[ws..].starts_with(b"---") {
            let fence_start = ws;
            let fence_end = ws + 3;
            self.pos = fence_end;
            self.frontmatter_state = FrontmatterState::Open;
            return Some(Token::new(
                TokenKind::FrontmatterFence,
                Span::new(fence_start as u32, fence_end as u32),
                Span::new(fence_start as u32, fence_end as u32),
            ));
        }
        None
    }

    // ---------------------------------------------------------------
    // Raw / raw-with-expression loops
    // ---------------------------------------------------------------

    fn next_raw_token(&mut self, mode: RawMode) -> Option<Token> {
        let tag_name = match &mode {
            RawMode::Pure(n) | RawMode::WithExpression(n) => n.clone(),
        };
        let start = self.pos;
        let mut i = self.pos;
        let with_expr = matches!(mode, RawMode::WithExpression(_));

        loop {
            if i >= self.src.len() {
                self.pos = i;
                self.raw_mode = None;
                if i > start {
                    return Some(Token::new(
                        TokenKind::Text,
                        Span::new(start as u32, i as u32),
                        Span::new(start as u32, i as u32),
                    ));
                }
                return None;
            }
            if with_expr && self.src[i] == b'{' {
                let text_span = Span::new(start as u32, i as u32);
                self.pos = i;
                if !text_span.is_empty() {
                    return Some(Token::new(TokenKind::Text, text_span, text_span));
                }
                return self.next_markup_token();
            }
            if self.src[i] == b'<' {
                if let Some(close_end) = self.match_closing_tag(i, &tag_name) {
                    let text_span = Span::new(start as u32, i as u32);
                    let tag = TagToken::new(tag_name.clone());
                    self.pos = close_end;
                    self.raw_mode = None;
                    self.pending.push_back(Token::new(
                        TokenKind::EndTag(tag),
                        Span::new(i as u32, close_end as u32),
                        Span::new(i as u32, close_end as u32),
                    ));
                    if text_span.is_empty() {
                        return self.pending.pop_front();
                    }
                    return Some(Token::new(TokenKind::Text, text_span, text_span));
                }
            }
            i += 1;
        }
    }

    /// If `src[at..]` is a closing tag for `tag_name` (case-insensitive),
    /// returns the byte offset just past its `>`.
    fn match_closing_tag(&self, at: usize, tag_name: &str) -> Option<usize> {
        if self.src.get(at + 1) != Some(&b'/') {
            return None;
        }
        let name_start = at + 2;
        let name_len = tag_name.len();
        if self.src.len() < name_start + name_len {
            return None;
        }
        if !self.src[name_start..name_start + name_len].eq_ignore_ascii_case(tag_name.as_bytes()) {
            return None;
        }
        let after_name = name_start + name_len;
        let gt = strpos(self.src, b">", after_name)?;
        if self.src[after_name..gt].iter().all(|b| b.is_ascii_whitespace()) {
            Some(gt + 1)
        } else {
            None
        }
    }

    // ---------------------------------------------------------------
    // Markup loop + expression rules
    // ---------------------------------------------------------------

    /// §4.1's `open_brace_is_expression_start`: false once a `{` appears
    /// while already inside an expression, since it is then an
    /// object-literal brace rather than a new expression delimiter.
    fn should_open_brace_start_expression(&self) -> bool {
        self.no_expression_depth == 0 && !self.in_expression()
    }

    fn next_markup_token(&mut self) -> Option<Token> {
        if let Some(t) = self.try_open_frontmatter() {
            return Some(t);
        }

        let b = self.src[self.pos];

        if b == b'}' && self.in_expression() {
            return Some(self.close_or_continue_expression());
        }

        if b == b'{' {
            if self.should_open_brace_start_expression() {
                return Some(self.open_or_nest_expression());
            }
            if self.in_expression() {
                // An object-literal brace landing exactly on a token
                // boundary: count it the same as `scan_text`'s interior
                // `{` handling rather than opening a nested expression.
                *self.expression_stack.last_mut().expect("in_expression") += 1;
                return Some(self.one_byte_text());
            }
            // Inside `<math>` (or any other no-expression context), a
            // brace is literal text, but it's still its own token
            // boundary: `{test}` tokenizes as three separate text runs,
            // not one merged run.
            return Some(self.one_byte_text());
        }

        if b == b'}' && !self.in_expression() {
            return Some(self.one_byte_text());
        }

        if b == b'<' {
            return self.scan_markup_construct();
        }

        Some(self.scan_text())
    }

    fn one_byte_text(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1;
        let span = Span::new(start as u32, self.pos as u32);
        Token::new(TokenKind::Text, span, span)
    }

    fn open_or_nest_expression(&mut self) -> Token {
        let start = self.pos;
        self.expression_stack.push(0);
        self.pos += 1;
        Token::new(
            TokenKind::StartExpression,
            Span::new(start as u32, self.pos as u32),
            Span::new(start as u32, self.pos as u32),
        )
    }

    fn close_or_continue_expression(&mut self) -> Token {
        let start = self.pos;
        let top = self.expression_stack.last_mut().expect("in_expression");
        if *top > 0 {
            *top -= 1;
            self.pos += 1;
            // Treated as ordinary text content; callers scanning for the
            // next token will simply see this byte consumed already, so
            // emit a one-byte Text token for it to keep spans partitioned.
            return Token::new(
                TokenKind::Text,
                Span::new(start as u32, self.pos as u32),
                Span::new(start as u32, self.pos as u32),
            );
        }
        self.expression_stack.pop();
        self.pos += 1;
        Token::new(
            TokenKind::EndExpression,
            Span::new(start as u32, self.pos as u32),
            Span::new(start as u32, self.pos as u32),
        )
    }

    /// Scans a run of plain text. Inside an expression this is
    /// JS-lexically aware (tracks nested braces, skips strings/comments/
    /// regexps) so that the run stops exactly at the byte that will
    /// become the next token boundary: a real `<tag`, a bare `{`/`}` at
    /// depth zero, or EOF.
    fn scan_text(&mut self) -> Token {
        let start = self.pos;
        let mut i = self.pos;
        let in_expr = self.in_expression();

        loop {
            if i >= self.src.len() {
                break;
            }
            match self.src[i] {
                b'<' if self.looks_like_tag_boundary(i, in_expr) => break,
                b'{' | b'}' if !in_expr => break,
                b'{' if in_expr => {
                    *self.expression_stack.last_mut().unwrap() += 1;
                    i += 1;
                }
                b'}' if in_expr => {
                    if *self.expression_stack.last().unwrap() == 0 {
                        break;
                    }
                    *self.expression_stack.last_mut().unwrap() -= 1;
                    i += 1;
                }
                b'\'' | b'"' if in_expr => match js_lex::skip_quoted_string(self.src, i, self.src[i])
                {
                    SkipOutcome::Ok(after) => i = after,
                    SkipOutcome::Unterminated(at) => {
                        self.diagnostics.push(Diagnostic::new(
                            DiagnosticCode::ErrorUnterminatedString,
                            Span::new(i as u32, at as u32),
                            "unterminated string literal",
                        ));
                        i = at;
                    }
                },
                b'`' if in_expr => match js_lex::skip_template_literal(self.src, i) {
                    SkipOutcome::Ok(after) => i = after,
                    SkipOutcome::Unterminated(at) => {
                        self.diagnostics.push(Diagnostic::new(
                            DiagnosticCode::ErrorUnterminatedString,
                            Span::new(i as u32, at as u32),
                            "unterminated template literal",
                        ));
                        i = at;
                    }
                },
                b'/' if in_expr && matches!(self.src.get(i + 1), Some(b'/') | Some(b'*')) => {
                    match js_lex::skip_comment(self.src, i) {
                        SkipOutcome::Ok(after) => i = after,
                        SkipOutcome::Unterminated(at) => {
                            self.diagnostics.push(Diagnostic::new(
                                DiagnosticCode::ErrorUnterminatedJsComment,
                                Span::new(i as u32, at as u32),
                                "unterminated block comment",
                            ));
                            i = at;
                        }
                    }
                }
                b'/' if in_expr => {
                    match js_lex::skip_regexp(self.src, i, b"{}\"'`") {
                        SkipOutcome::Ok(after) => i = after,
                        SkipOutcome::Unterminated(_) => i += 1,
                    }
                }
                _ => i += 1,
            }
        }

        self.pos = i;
        let span = Span::new(start as u32, i as u32);
        Token::new(TokenKind::Text, span, span)
    }

    /// `<` followed by whitespace or a digit is a less-than operator
    /// inside an expression and never opens a tag.
    fn looks_like_tag_boundary(&self, at: usize, in_expr: bool) -> bool {
        if !in_expr {
            return true;
        }
        match self.src.get(at + 1) {
            Some(b) if b.is_ascii_whitespace() || b.is_ascii_digit() => false,
            _ => true,
        }
    }

    fn scan_markup_construct(&mut self) -> Option<Token> {
        let start = self.pos;

        if self.src[start..].starts_with(b"<!--") {
            return Some(self.scan_comment());
        }
        if stripos(self.src, b"<!doctype", start) == Some(start) {
            return Some(self.scan_doctype());
        }
        if self.src.get(start + 1) == Some(&b'!') {
            return Some(self.scan_bogus_comment(start + 1));
        }
        if self.src.get(start + 1) == Some(&b'?') {
            return Some(self.scan_bogus_comment(start + 1));
        }
        if self.src[start..].starts_with(b"</>") {
            self.pos = start + 3;
            let span = Span::new(start as u32, self.pos as u32);
            return Some(Token::new(TokenKind::EndTag(TagToken::new(String::new())), span, span));
        }
        if self.src.get(start + 1) == Some(&b'/') {
            return self.scan_end_tag();
        }

        let after_lt = start + 1;

        // Bare fragment shorthand `<>` — no name, no attributes.
        if self.src.get(after_lt) == Some(&b'>') {
            self.pos = after_lt + 1;
            self.frontmatter_seen_element = true;
            if self.frontmatter_state == FrontmatterState::Initial {
                self.frontmatter_state = FrontmatterState::Closed;
            }
            let span = Span::new(start as u32, self.pos as u32);
            return Some(Token::new(TokenKind::StartTag(TagToken::new(String::new())), span, span));
        }

        if self.src.get(after_lt).is_some_and(|b| b.is_ascii_whitespace()) {
            return Some(self.scan_fragment_shorthand_with_attrs());
        }

        if self.src.get(after_lt).is_some_and(|b| b.is_ascii_alphabetic()) {
            return self.scan_start_tag();
        }

        // Not a recognizable construct: one byte of plain text.
        self.pos = start + 1;
        let span = Span::new(start as u32, self.pos as u32);
        Some(Token::new(TokenKind::Text, span, span))
    }

    fn scan_comment(&mut self) -> Token {
        let start = self.pos;
        let data_start = start + 4;
        match strpos(self.src, b"-->", data_start) {
            Some(close) => {
                self.pos = close + 3;
                Token::new(
                    TokenKind::Comment,
                    Span::new(start as u32, self.pos as u32),
                    Span::new(data_start as u32, close as u32),
                )
            }
            None => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticCode::WarningUnterminatedHtmlComment,
                    Span::new(start as u32, self.src.len() as u32),
                    "unterminated HTML comment",
                ));
                self.pos = self.src.len();
                Token::new(
                    TokenKind::Comment,
                    Span::new(start as u32, self.pos as u32),
                    Span::new(data_start as u32, self.pos as u32),
                )
            }
        }
    }

    fn scan_bogus_comment(&mut self, data_start: usize) -> Token {
        let start = self.pos;
        let (end, data_end) = match strpos(self.src, b">", data_start) {
            Some(gt) => (gt + 1, gt),
            None => (self.src.len(), self.src.len()),
        };
        self.pos = end;
        Token::new(
            TokenKind::Comment,
            Span::new(start as u32, end as u32),
            Span::new(data_start as u32, data_end.max(data_start) as u32),
        )
    }

    fn scan_doctype(&mut self) -> Token {
        let start = self.pos;
        let data_start = start + "<!doctype".len();
        let (end, data_end) = match strpos(self.src, b">", data_start) {
            Some(gt) => (gt + 1, gt),
            None => (self.src.len(), self.src.len()),
        };
        self.pos = end;
        Token::new(
            TokenKind::Doctype,
            Span::new(start as u32, end as u32),
            Span::new(data_start as u32, data_end.max(data_start) as u32),
        )
    }

    fn scan_fragment_shorthand_with_attrs(&mut self) -> Token {
        let start = self.pos;
        let ws = js_lex::skip_whitespace(self.src, start + 1);
        let mut tag = TagToken::new(String::new());
        let close_at = self.scan_attributes_into(&mut tag, ws);
        let end = strpos(self.src, b">", close_at)
            .map(|at| at + 1)
            .unwrap_or(self.src.len());
        self.pos = end;

        let replacement = format!(
            "<Fragment {}>",
            &String::from_utf8_lossy(&self.src[ws..close_at.min(self.src.len())])
        );
        self.diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::ErrorFragmentShorthandAttrs,
                Span::new(start as u32, end as u32),
                "fragment shorthand cannot carry attributes",
            )
            .with_hint(format!(
                "To fix this, please change {} to use the longhand Fragment syntax: {}",
                String::from_utf8_lossy(&self.src[start..end]),
                replacement
            )),
        );

        self.frontmatter_seen_element = true;
        if self.frontmatter_state == FrontmatterState::Initial {
            self.frontmatter_state = FrontmatterState::Closed;
        }
        Token::new(
            TokenKind::StartTag(tag),
            Span::new(start as u32, end as u32),
            Span::new(start as u32, end as u32),
        )
    }

    fn scan_end_tag(&mut self) -> Option<Token> {
        let start = self.pos;
        let name_start = start + 2;
        let name_len = strspn!(self.src, b if is_tag_name_byte(b), name_start);
        if name_len == 0 {
            return Some(self.scan_bogus_comment(start + 1));
        }
        let name = String::from_utf8_lossy(&self.src[name_start..name_start + name_len]).into_owned();
        let end = strpos(self.src, b">", name_start + name_len)
            .map(|at| at + 1)
            .unwrap_or(self.src.len());
        self.pos = end;

        if is_void(&name) {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticCode::WarningUnmatchedCloseTag,
                Span::new(start as u32, end as u32),
                format!("stray closing tag for void element <{name}>"),
            ));
        }

        if name.eq_ignore_ascii_case("math") {
            self.exit_math();
        }

        let mut tag = TagToken::new(name);
        tag.name_span = Span::new(name_start as u32, (name_start + name_len) as u32);
        Some(Token::new(
            TokenKind::EndTag(tag),
            Span::new(start as u32, end as u32),
            Span::new(start as u32, end as u32),
        ))
    }

    fn scan_start_tag(&mut self) -> Option<Token> {
        let start = self.pos;
        let name_start = start + 1;
        let name_len = strspn!(self.src, b if is_tag_name_byte(b), name_start);
        let name = String::from_utf8_lossy(&self.src[name_start..name_start + name_len]).into_owned();

        // Generics heuristic: inside an expression, a `<Name...>`
        // following non-whitespace-terminated text that isn't a known
        // element/Fragment and isn't followed by a space is reclassified
        // as plain text (a TS generic argument list), not a tag.
        if self.in_expression()
            && self.prev_text_had_no_trailing_space
            && name != "Fragment"
            && !is_component_name(&name)
        {
            let probe_end = name_start + name_len;
            let next_is_space = self.src.get(probe_end).is_some_and(|b| b.is_ascii_whitespace());
            if !next_is_space {
                self.pos = start + 1;
                let span = Span::new(start as u32, self.pos as u32);
                return Some(Token::new(TokenKind::Text, span, span));
            }
        }

        let mut tag = TagToken::new(name.clone());
        tag.name_span = Span::new(name_start as u32, (name_start + name_len) as u32);
        let after_attrs = self.scan_attributes_into(&mut tag, name_start + name_len);

        let slash_self_close = self.src.get(after_attrs) == Some(&b'/');
        let gt = strpos(self.src, b">", after_attrs);
        let end = match gt {
            Some(at) => at + 1,
            None => {
                return Some(self.error_token(start));
            }
        };
        self.pos = end;

        self.frontmatter_seen_element = true;
        if self.frontmatter_state == FrontmatterState::Initial {
            self.frontmatter_state = FrontmatterState::Closed;
        }

        let is_raw_attr = tag.attributes.iter().any(|a| a.key == "is:raw");
        let self_closing = slash_self_close || is_void(&name);
        let span = Span::new(start as u32, end as u32);

        if self_closing {
            return Some(Token::new(TokenKind::SelfClosingTag(tag), span, span));
        }

        let lower = name.to_ascii_lowercase();
        if lower == "math" {
            self.enter_math();
        }
        if is_raw_attr {
            self.enter_raw(&lower);
        } else if RAW_TEXT_ELEMENTS.contains(&lower.as_str()) {
            self.enter_raw(&lower);
        } else if RAW_WITH_EXPRESSION_ELEMENTS.contains(&lower.as_str()) {
            self.enter_raw_with_expression(&lower);
        }

        Some(Token::new(TokenKind::StartTag(tag), span, span))
    }

    /// Scans `key[=value]` pairs until `/` or `>`, writing coalesced
    /// attributes into `tag` (duplicate `(namespace, key)` pairs keep the
    /// *last* occurrence's value and key position).
    /// Returns the byte offset just past the last attribute.
    fn scan_attributes_into(&mut self, tag: &mut TagToken, mut pos: usize) -> usize {
        loop {
            pos = js_lex::skip_whitespace(self.src, pos);
            match self.src.get(pos) {
                None => return pos,
                Some(b'/') | Some(b'>') => return pos,
                _ => {}
            }

            if self.src[pos..].starts_with(b"...") {
                // `{...expr}` spread must be wrapped in braces; this bare
                // `...` is the invalid-spread case.
                let text_end = pos + strcspn!(self.src, b' ' | b'\t' | b'\r' | b'\n' | b'>', pos);
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::WarningInvalidSpread,
                        Span::new(pos as u32, text_end as u32),
                        "spread syntax must be wrapped in braces",
                    )
                    .with_hint(format!(
                        "{{{}}}",
                        String::from_utf8_lossy(&self.src[pos..text_end])
                    )),
                );
                pos = text_end;
                continue;
            }

            if self.src.get(pos) == Some(&b'{') {
                let (attr, after) = self.scan_expression_attribute(pos);
                upsert_attribute(tag, attr);
                pos = after;
                continue;
            }

            let key_start = pos;
            let key_len = strcspn!(
                self.src,
                b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/' | b'=' | b'>',
                pos
            );
            if key_len == 0 {
                pos += 1;
                continue;
            }
            let key_end = key_start + key_len;
            let (namespace, key) = split_namespace(&self.src[key_start..key_end]);

            let after_key = js_lex::skip_whitespace(self.src, key_end);
            if self.src.get(after_key) != Some(&b'=') {
                upsert_attribute(
                    tag,
                    Attribute {
                        namespace,
                        key,
                        key_span: Span::new(key_start as u32, key_end as u32),
                        value: String::new(),
                        value_span: Span::new(key_end as u32, key_end as u32),
                        kind: AttributeKind::Empty,
                    },
                );
                pos = key_end;
                continue;
            }

            let value_start = js_lex::skip_whitespace(self.src, after_key + 1);
            let (value, value_end, kind) = self.scan_attribute_value(value_start);
            upsert_attribute(
                tag,
                Attribute {
                    namespace,
                    key,
                    key_span: Span::new(key_start as u32, key_end as u32),
                    value,
                    value_span: Span::new(value_start as u32, value_end as u32),
                    kind,
                },
            );
            pos = value_end;
        }
    }

    fn scan_expression_attribute(&mut self, brace_at: usize) -> (Attribute, usize) {
        let is_spread = self.src[brace_at..].starts_with(b"{...");
        match js_lex::skip_balanced_braces(self.src, brace_at) {
            SkipOutcome::Ok(after) | SkipOutcome::Unterminated(after) => {
                let inner = &self.src[brace_at + 1..after.saturating_sub(1).max(brace_at + 1)];
                let value = String::from_utf8_lossy(inner).into_owned();
                let kind = if is_spread {
                    AttributeKind::Spread
                } else {
                    AttributeKind::Shorthand
                };
                let key = if is_spread {
                    value.trim_start_matches("...").to_string()
                } else {
                    value.clone()
                };
                (
                    Attribute {
                        namespace: None,
                        key,
                        key_span: Span::new(brace_at as u32, after as u32),
                        value,
                        value_span: Span::new(brace_at as u32, after as u32),
                        kind,
                    },
                    after,
                )
            }
        }
    }

    fn scan_attribute_value(&mut self, start: usize) -> (String, usize, AttributeKind) {
        match self.src.get(start) {
            Some(b'"') | Some(b'\'') => {
                let quote = self.src[start];
                match js_lex::skip_quoted_string(self.src, start, quote) {
                    SkipOutcome::Ok(after) => (
                        String::from_utf8_lossy(&self.src[start + 1..after - 1]).into_owned(),
                        after,
                        AttributeKind::Quoted,
                    ),
                    SkipOutcome::Unterminated(at) => {
                        self.diagnostics.push(Diagnostic::new(
                            DiagnosticCode::ErrorUnterminatedString,
                            Span::new(start as u32, at as u32),
                            "unterminated attribute value",
                        ));
                        (
                            String::from_utf8_lossy(&self.src[start + 1..at]).into_owned(),
                            at,
                            AttributeKind::Quoted,
                        )
                    }
                }
            }
            Some(b'`') => match js_lex::skip_template_literal(self.src, start) {
                SkipOutcome::Ok(after) => (
                    String::from_utf8_lossy(&self.src[start..after]).into_owned(),
                    after,
                    AttributeKind::TemplateLiteral,
                ),
                SkipOutcome::Unterminated(at) => {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticCode::ErrorUnterminatedString,
                        Span::new(start as u32, at as u32),
                        "unterminated template-literal attribute value",
                    ));
                    (
                        String::from_utf8_lossy(&self.src[start..at]).into_owned(),
                        at,
                        AttributeKind::TemplateLiteral,
                    )
                }
            },
            Some(b'{') => match js_lex::skip_balanced_braces(self.src, start) {
                SkipOutcome::Ok(after) => (
                    String::from_utf8_lossy(&self.src[start + 1..after - 1]).into_owned(),
                    after,
                    AttributeKind::Expression,
                ),
                SkipOutcome::Unterminated(at) => {
                    (
                        String::from_utf8_lossy(&self.src[start + 1..at]).into_owned(),
                        at,
                        AttributeKind::Expression,
                    )
                }
            },
            _ => {
                let len = strcspn!(self.src, b' ' | b'\t' | b'\r' | b'\n' | 0x0c | b'>', start);
                (
                    String::from_utf8_lossy(&self.src[start..start + len]).into_owned(),
                    start + len,
                    AttributeKind::Quoted,
                )
            }
        }
    }

    pub fn byte_offset(&self) -> usize {
        self.pos
    }
}

fn is_tag_name_byte(b: u8) -> bool {
    !matches!(
        b,
        b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/' | b'>'
    )
}

fn split_namespace(bytes: &[u8]) -> (Option<String>, String) {
    let text = String::from_utf8_lossy(bytes);
    (None, text.into_owned())
}

/// Coalesces `(namespace, key)` duplicates to the last occurrence, keeping
/// that occurrence's position.
fn upsert_attribute(tag: &mut TagToken, attr: Attribute) {
    if let Some(existing) = tag
        .attributes
        .iter_mut()
        .find(|a| a.namespace == attr.namespace && a.key == attr.key)
    {
        *existing = attr;
    } else {
        tag.attributes.push(attr);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut tok = Tokenizer::new(src.as_bytes());
        let mut out = Vec::new();
        while let Some(t) = tok.next_token() {
            out.push(t.kind);
        }
        out
    }

    #[test]
    fn doctype_token() {
        let k = kinds("<!DOCTYPE html>");
        assert_eq!(k, vec![TokenKind::Doctype]);
    }

    #[test]
    fn frontmatter_fence_and_text() {
        let k = kinds("---\nconst a = 0;\n---");
        assert_eq!(
            k,
            vec![
                TokenKind::FrontmatterFence,
                TokenKind::Text,
                TokenKind::FrontmatterFence,
            ]
        );
    }

    #[test]
    fn expression_inside_div() {
        let k = kinds("<div>{ value }</div>");
        assert!(matches!(k[0], TokenKind::StartTag(_)));
        assert_eq!(k[1], TokenKind::StartExpression);
        assert_eq!(k[2], TokenKind::Text);
        assert_eq!(k[3], TokenKind::EndExpression);
        assert!(matches!(k[4], TokenKind::EndTag(_)));
    }

    #[test]
    fn object_literal_brace_at_expression_boundary_stays_one_expression() {
        // `{{a:1}}`: the outer `{` opens the expression; the inner `{`
        // lands exactly on the next token boundary but is still inside
        // that expression, so it's an object-literal brace, not a second
        // `StartExpression`.
        let k = kinds("<p>{{a:1}}</p>");
        assert!(matches!(k[0], TokenKind::StartTag(_)));
        assert_eq!(k[1], TokenKind::StartExpression);
        assert!(k[2..k.len() - 2].iter().all(|kind| *kind == TokenKind::Text));
        assert_eq!(k[k.len() - 2], TokenKind::EndExpression);
        assert!(matches!(k[k.len() - 1], TokenKind::EndTag(_)));
    }

    #[test]
    fn duplicate_attribute_keeps_last() {
        let mut tok = Tokenizer::new(br#"<div a="1" a="2" a="3"></div>"#);
        let first = tok.next_token().unwrap();
        match first.kind {
            TokenKind::StartTag(tag) => {
                assert_eq!(tag.attributes.len(), 1);
                assert_eq!(tag.attributes[0].value, "3");
            }
            _ => panic!("expected start tag"),
        }
    }

    #[test]
    fn fragment_shorthand_with_attrs_is_fatal() {
        let mut tok = Tokenizer::new(br#"< data-test="x"><div/></>"#);
        tok.next_token();
        assert_eq!(tok.diagnostics.len(), 1);
    }

    #[test]
    fn span_partitioning_holds() {
        let src = "<div a=\"1\">{ x }</div><!-- c --><span/>text";
        let mut tok = Tokenizer::new(src.as_bytes());
        let mut prev_end = 0u32;
        while let Some(t) = tok.next_token() {
            assert_eq!(t.raw.start, prev_end);
            prev_end = t.raw.end;
        }
        assert_eq!(prev_end as usize, src.len());
    }

    #[test]
    fn raw_with_expression_closes_its_expression() {
        let k = kinds("<title>{ value }</title>");
        assert!(matches!(k[0], TokenKind::StartTag(_)));
        assert_eq!(k[1], TokenKind::StartExpression);
        assert_eq!(k[2], TokenKind::Text);
        assert_eq!(k[3], TokenKind::EndExpression);
        assert!(matches!(k[4], TokenKind::EndTag(_)));
    }

    #[test]
    fn raw_with_expression_resumes_raw_text_after_expression() {
        let k = kinds("<textarea>a{ b }c</textarea>");
        assert!(matches!(k[0], TokenKind::StartTag(_)));
        assert_eq!(k[1], TokenKind::Text); // "a"
        assert_eq!(k[2], TokenKind::StartExpression);
        assert_eq!(k[3], TokenKind::Text); // " b "
        assert_eq!(k[4], TokenKind::EndExpression);
        assert_eq!(k[5], TokenKind::Text); // "c"
        assert!(matches!(k[6], TokenKind::EndTag(_)));
    }

    #[test]
    fn math_braces_are_text_boundaries_not_expressions() {
        // Braces inside `<math>` never form an expression — each of `{`,
        // `test`, `}` is its own Text token.
        let k = kinds("<math>{test}</math>");
        assert_eq!(
            k,
            vec![
                TokenKind::StartTag(TagToken::new("math".to_string())),
                TokenKind::Text,
                TokenKind::Text,
                TokenKind::Text,
                TokenKind::EndTag(TagToken::new("math".to_string())),
            ]
        );
    }
}
