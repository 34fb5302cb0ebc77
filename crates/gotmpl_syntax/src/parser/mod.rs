//! Recursive-descent parser over the gotmpl token stream.
//!
//! The parser is *total*: [`parse`] always returns a complete [`Ast`]
//! alongside a (possibly empty) list of [`ParseError`]s. A syntax error
//! never aborts the parse — it's recorded and the parser recovers at the
//! next `}}`, at a dropped stray keyword, or by synthesising a zero-length
//! closing node at end of file.

use crate::ast::{ArgKind, Ast, AstBuilder, NodeId, NodeKind, VarDecl};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::lex;
use crate::token::{Keyword, Token, TokenKind};
use gotmpl_base::Span;

/// Parses `source` into a complete AST plus its accumulated error list.
///
/// An empty error list is the total-parser invariant's witness: callers may
/// rely on the returned tree round-tripping byte-for-byte via stored spans
/// when (and only when) `errors` is empty.
pub fn parse(source: &str) -> (Ast, Vec<ParseError>) {
    let tokens = lex(source);
    let mut parser = Parser::new(tokens, source.len() as u32);
    let mut items = Vec::new();
    while !parser.at_eof() {
        if let Some(id) = parser.parse_item() {
            items.push(id);
        }
    }
    let root_span = Span::new(0, parser.source_len);
    let top_level_count = items.len();
    let root = parser.builder.push(None, root_span, NodeKind::Template { nodes: items });
    log::debug!("parsed tree with {top_level_count} top-level nodes, {} errors", parser.errors.len());
    (parser.builder.finish(root), parser.errors)
}

/// Output of scanning the body+close of an `if`-less control block
/// (`range`/`with`, which — unlike `if` — never chain an `else if`).
struct SimpleControlParts {
    pipe: NodeId,
    body: Vec<NodeId>,
    else_body: Option<Vec<NodeId>>,
    else_keyword_span: Option<Span>,
    end_span: Span,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    builder: AstBuilder,
    errors: Vec<ParseError>,
    source_len: u32,
    eof_reported: bool,
}

impl Parser {
    fn new(tokens: Vec<Token>, source_len: u32) -> Self {
        Parser {
            tokens,
            pos: 0,
            builder: AstBuilder::new(),
            errors: Vec::new(),
            source_len,
            eof_reported: false,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn previous_end_offset(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end()
        }
    }

    fn peek_is_keyword(&self, kw: Keyword) -> bool {
        let opens = matches!(
            self.tokens.get(self.pos).map(|t| &t.kind),
            Some(TokenKind::LeftDelim) | Some(TokenKind::LeftDelimTrim)
        );
        let next_is_kw = matches!(
            self.tokens.get(self.pos + 1).map(|t| &t.kind),
            Some(TokenKind::Keyword(k)) if *k == kw
        );
        opens && next_is_kw
    }

    fn push_error(&mut self, kind: ParseErrorKind, span: Span, line: u32, surrounding_token: Option<String>) {
        self.errors.push(ParseError::new(kind, span, line, surrounding_token));
    }

    fn report_eof_once(&mut self) -> Span {
        let span = Span::point(self.source_len);
        if !self.eof_reported {
            self.eof_reported = true;
            self.push_error(ParseErrorKind::UnexpectedEof, span, self.current().line, None);
        }
        span
    }

    fn recover_to_right_delim(&mut self) {
        while !matches!(self.current().kind, TokenKind::RightDelim | TokenKind::RightDelimTrim | TokenKind::Eof) {
            self.advance();
        }
        if matches!(self.current().kind, TokenKind::RightDelim | TokenKind::RightDelimTrim) {
            self.advance();
        }
    }

    fn expect_right_delim(&mut self) -> Option<Span> {
        if matches!(self.current().kind, TokenKind::RightDelim | TokenKind::RightDelimTrim) {
            Some(self.advance().span)
        } else if self.at_eof() {
            None
        } else {
            let tok = self.current().clone();
            self.push_error(ParseErrorKind::UnclosedDelimiter, tok.span, tok.line, Some(tok.text));
            self.recover_to_right_delim();
            None
        }
    }

    /// Consumes `{{end}}` once the caller has already confirmed (via
    /// [`Parser::peek_is_keyword`]) that it's next.
    fn expect_end(&mut self) -> Span {
        self.advance(); // left delim
        let end_tok = self.advance(); // `end`
        self.expect_right_delim();
        end_tok.span
    }

    fn pipe_is_empty(&self, pipe_id: NodeId) -> bool {
        match self.builder.kind(pipe_id) {
            NodeKind::Pipe { decls, cmds } => {
                decls.is_empty()
                    && cmds.len() == 1
                    && matches!(self.builder.kind(cmds[0]), NodeKind::Command { args } if args.is_empty())
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Top-level / body items
    // ------------------------------------------------------------------

    fn parse_control_body(&mut self) -> Vec<NodeId> {
        let mut items = Vec::new();
        while !self.at_eof() && !self.peek_is_keyword(Keyword::Else) && !self.peek_is_keyword(Keyword::End) {
            if let Some(id) = self.parse_item() {
                items.push(id);
            }
        }
        items
    }

    fn parse_item(&mut self) -> Option<NodeId> {
        match &self.current().kind {
            TokenKind::Text => {
                let tok = self.advance();
                Some(self.builder.push(None, tok.span, NodeKind::Text { bytes: tok.text }))
            }
            TokenKind::Error => {
                let tok = self.advance();
                self.push_error(ParseErrorKind::Syntax { detail: tok.text.clone() }, tok.span, tok.line, Some(tok.text));
                None
            }
            TokenKind::LeftDelim | TokenKind::LeftDelimTrim => self.parse_action_like(),
            TokenKind::Eof => None,
            _ => {
                // The lexer never emits any other kind outside an action.
                let tok = self.advance();
                self.push_error(ParseErrorKind::Syntax { detail: format!("unexpected token {:?}", tok.kind) }, tok.span, tok.line, Some(tok.text));
                None
            }
        }
    }

    fn parse_action_like(&mut self) -> Option<NodeId> {
        let open_tok = self.advance();
        let open_start = open_tok.span.offset;

        match self.current().kind.clone() {
            TokenKind::Comment => {
                let body = self.advance().text;
                let right = self.expect_right_delim();
                let end = right.map(|s| s.end()).unwrap_or_else(|| self.previous_end_offset());
                Some(self.builder.push(None, Span::from_range(open_start, end), NodeKind::Comment { body }))
            }
            TokenKind::Keyword(Keyword::If) => {
                let kw_tok = self.advance();
                let (id, _end) = self.parse_if_inner(open_start, kw_tok.span, kw_tok.line);
                Some(id)
            }
            TokenKind::Keyword(Keyword::Range) => {
                let kw_tok = self.advance();
                Some(self.parse_range(open_start, kw_tok.span, kw_tok.line))
            }
            TokenKind::Keyword(Keyword::With) => {
                let kw_tok = self.advance();
                Some(self.parse_with(open_start, kw_tok.span, kw_tok.line))
            }
            TokenKind::Keyword(Keyword::Define) => {
                let kw_tok = self.advance();
                Some(self.parse_define(open_start, kw_tok.span))
            }
            TokenKind::Keyword(Keyword::Block) => {
                let kw_tok = self.advance();
                Some(self.parse_block(open_start, kw_tok.span))
            }
            TokenKind::Keyword(Keyword::Template) => {
                let kw_tok = self.advance();
                Some(self.parse_template_invocation(open_start, kw_tok.span))
            }
            TokenKind::Keyword(Keyword::End) => {
                let end_tok = self.advance();
                self.push_error(ParseErrorKind::UnexpectedEnd, end_tok.span, end_tok.line, Some(end_tok.text));
                self.recover_to_right_delim();
                None
            }
            TokenKind::Keyword(Keyword::Else) => {
                let else_tok = self.advance();
                self.push_error(
                    ParseErrorKind::Syntax { detail: "else outside an if/range/with block".into() },
                    else_tok.span,
                    else_tok.line,
                    Some(else_tok.text),
                );
                self.recover_to_right_delim();
                None
            }
            _ => {
                let pipe_id = self.parse_pipe();
                let right = self.expect_right_delim();
                let end = right.map(|s| s.end()).unwrap_or_else(|| self.previous_end_offset());
                Some(self.builder.push(None, Span::from_range(open_start, end), NodeKind::Action { pipe: pipe_id }))
            }
        }
    }

    // ------------------------------------------------------------------
    // Control blocks
    // ------------------------------------------------------------------

    /// Parses the `if`/`else if`/`else`/`end` chain. Returns the node id
    /// together with the span of the terminal `{{end}}`, since an `else
    /// if` chain shares a single physical `end` across every nesting level
    /// — the innermost frame to actually consume `{{end}}` hands that span
    /// back up through each enclosing `else if`.
    fn parse_if_inner(&mut self, open_start: u32, keyword_span: Span, keyword_line: u32) -> (NodeId, Span) {
        let pipe_id = self.parse_pipe();
        let pipe_empty = self.pipe_is_empty(pipe_id);
        let right_delim_span = self.expect_right_delim();
        let action_end = right_delim_span.map(|s| s.end()).unwrap_or_else(|| self.previous_end_offset());
        if pipe_empty {
            self.push_error(
                ParseErrorKind::MissingValue { keyword: "if" },
                Span::from_range(open_start, action_end),
                keyword_line,
                None,
            );
        }

        let body = self.parse_control_body();

        if self.at_eof() {
            let end_span = self.report_eof_once();
            let node_span = Span::from_range(open_start, end_span.end());
            let id = self.builder.push(
                None,
                node_span,
                NodeKind::If { pipe: pipe_id, body, else_body: None, keyword_span, else_keyword_span: None, end_span },
            );
            return (id, end_span);
        }

        if self.peek_is_keyword(Keyword::Else) {
            self.advance(); // left delim
            let else_tok = self.advance();
            if matches!(self.current().kind, TokenKind::Keyword(Keyword::If)) {
                let if_tok = self.advance();
                let else_keyword_span = else_tok.span.merge(if_tok.span);
                let (inner_id, end_span) = self.parse_if_inner(if_tok.span.offset, if_tok.span, if_tok.line);
                let node_span = Span::from_range(open_start, end_span.end());
                let id = self.builder.push(
                    None,
                    node_span,
                    NodeKind::If {
                        pipe: pipe_id,
                        body,
                        else_body: Some(vec![inner_id]),
                        keyword_span,
                        else_keyword_span: Some(else_keyword_span),
                        end_span,
                    },
                );
                return (id, end_span);
            }

            self.expect_right_delim();
            let else_body = self.parse_control_body();
            if self.at_eof() {
                let end_span = self.report_eof_once();
                let node_span = Span::from_range(open_start, end_span.end());
                let id = self.builder.push(
                    None,
                    node_span,
                    NodeKind::If {
                        pipe: pipe_id,
                        body,
                        else_body: Some(else_body),
                        keyword_span,
                        else_keyword_span: Some(else_tok.span),
                        end_span,
                    },
                );
                return (id, end_span);
            }
            let end_span = self.expect_end();
            let node_span = Span::from_range(open_start, end_span.end());
            let id = self.builder.push(
                None,
                node_span,
                NodeKind::If {
                    pipe: pipe_id,
                    body,
                    else_body: Some(else_body),
                    keyword_span,
                    else_keyword_span: Some(else_tok.span),
                    end_span,
                },
            );
            return (id, end_span);
        }

        let end_span = self.expect_end();
        let node_span = Span::from_range(open_start, end_span.end());
        let id = self.builder.push(
            None,
            node_span,
            NodeKind::If { pipe: pipe_id, body, else_body: None, keyword_span, else_keyword_span: None, end_span },
        );
        (id, end_span)
    }

    fn parse_range(&mut self, open_start: u32, keyword_span: Span, keyword_line: u32) -> NodeId {
        let parts = self.parse_simple_control(open_start, "range", keyword_line);
        self.builder.push(
            None,
            Span::from_range(open_start, parts.end_span.end()),
            NodeKind::Range {
                pipe: parts.pipe,
                body: parts.body,
                else_body: parts.else_body,
                keyword_span,
                else_keyword_span: parts.else_keyword_span,
                end_span: parts.end_span,
            },
        )
    }

    fn parse_with(&mut self, open_start: u32, keyword_span: Span, keyword_line: u32) -> NodeId {
        let parts = self.parse_simple_control(open_start, "with", keyword_line);
        self.builder.push(
            None,
            Span::from_range(open_start, parts.end_span.end()),
            NodeKind::With {
                pipe: parts.pipe,
                body: parts.body,
                else_body: parts.else_body,
                keyword_span,
                else_keyword_span: parts.else_keyword_span,
                end_span: parts.end_span,
            },
        )
    }

    /// Shared body for `range`/`with`: unlike `if`, neither chains an
    /// `else if` — at most one plain `else` before the matching `end`.
    fn parse_simple_control(&mut self, open_start: u32, keyword: &'static str, keyword_line: u32) -> SimpleControlParts {
        let pipe_id = self.parse_pipe();
        let pipe_empty = self.pipe_is_empty(pipe_id);
        let right_delim_span = self.expect_right_delim();
        let action_end = right_delim_span.map(|s| s.end()).unwrap_or_else(|| self.previous_end_offset());
        if pipe_empty {
            self.push_error(
                ParseErrorKind::MissingValue { keyword },
                Span::from_range(open_start, action_end),
                keyword_line,
                None,
            );
        }

        let body = self.parse_control_body();
        if self.at_eof() {
            let end_span = self.report_eof_once();
            return SimpleControlParts { pipe: pipe_id, body, else_body: None, else_keyword_span: None, end_span };
        }

        let (else_body, else_keyword_span) = if self.peek_is_keyword(Keyword::Else) {
            self.advance();
            let else_tok = self.advance();
            self.expect_right_delim();
            (Some(self.parse_control_body()), Some(else_tok.span))
        } else {
            (None, None)
        };

        if self.at_eof() {
            let end_span = self.report_eof_once();
            return SimpleControlParts { pipe: pipe_id, body, else_body, else_keyword_span, end_span };
        }

        let end_span = self.expect_end();
        SimpleControlParts { pipe: pipe_id, body, else_body, else_keyword_span, end_span }
    }

    fn parse_define(&mut self, open_start: u32, keyword_span: Span) -> NodeId {
        let name = self.parse_quoted_name();
        self.expect_right_delim();
        let body = self.parse_control_body();
        if self.at_eof() {
            let end_span = self.report_eof_once();
            return self.builder.push(None, Span::from_range(open_start, end_span.end()), NodeKind::Define { name, body, keyword_span, end_span });
        }
        let end_span = self.expect_end();
        self.builder.push(None, Span::from_range(open_start, end_span.end()), NodeKind::Define { name, body, keyword_span, end_span })
    }

    fn parse_block(&mut self, open_start: u32, keyword_span: Span) -> NodeId {
        let name = self.parse_quoted_name();
        let pipe_id = self.parse_pipe();
        self.expect_right_delim();
        let body = self.parse_control_body();
        if self.at_eof() {
            let end_span = self.report_eof_once();
            return self.builder.push(
                None,
                Span::from_range(open_start, end_span.end()),
                NodeKind::Block { name, pipe: pipe_id, body, keyword_span, end_span },
            );
        }
        let end_span = self.expect_end();
        self.builder.push(None, Span::from_range(open_start, end_span.end()), NodeKind::Block { name, pipe: pipe_id, body, keyword_span, end_span })
    }

    fn parse_template_invocation(&mut self, open_start: u32, _keyword_span: Span) -> NodeId {
        let name = self.parse_quoted_name();
        let pipe = if self.is_arg_start() { Some(self.parse_pipe()) } else { None };
        let right = self.expect_right_delim();
        let end = right.map(|s| s.end()).unwrap_or_else(|| self.previous_end_offset());
        self.builder.push(None, Span::from_range(open_start, end), NodeKind::TemplateInvocation { name, pipe })
    }

    fn parse_quoted_name(&mut self) -> String {
        if matches!(self.current().kind, TokenKind::String) {
            let tok = self.advance();
            tok.text.trim_matches('"').to_string()
        } else {
            let tok = self.current().clone();
            self.push_error(
                ParseErrorKind::Syntax { detail: "expected a quoted template name".into() },
                tok.span,
                tok.line,
                Some(tok.text),
            );
            String::new()
        }
    }

    // ------------------------------------------------------------------
    // Pipes, commands, arguments
    // ------------------------------------------------------------------

    fn parse_pipe(&mut self) -> NodeId {
        let start = self.current().span.offset;

        let mut decls = Vec::new();
        if matches!(self.current().kind, TokenKind::Dollar) {
            let save = self.pos;
            let mut tentative = Vec::new();
            loop {
                if matches!(self.current().kind, TokenKind::Dollar) {
                    let tok = self.advance();
                    tentative.push(VarDecl { name: tok.text.trim_start_matches('$').to_string(), span: tok.span });
                    if matches!(self.current().kind, TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                }
                break;
            }
            if matches!(self.current().kind, TokenKind::Assign) {
                self.advance();
                decls = tentative;
            } else {
                self.pos = save;
            }
        }

        let mut cmds = vec![self.parse_command()];
        while matches!(self.current().kind, TokenKind::Pipe) {
            self.advance();
            cmds.push(self.parse_command());
        }

        let end = self.previous_end_offset().max(start);
        self.builder.push(None, Span::from_range(start, end), NodeKind::Pipe { decls, cmds })
    }

    fn is_arg_start(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Field
                | TokenKind::Dot
                | TokenKind::Dollar
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::Bool
                | TokenKind::Nil
                | TokenKind::Identifier
                | TokenKind::LParen
                | TokenKind::Keyword(Keyword::Break)
                | TokenKind::Keyword(Keyword::Continue)
        )
    }

    fn parse_command(&mut self) -> NodeId {
        let start = self.current().span.offset;
        let mut args = Vec::new();
        loop {
            if matches!(self.current().kind, TokenKind::Error) {
                let tok = self.advance();
                self.push_error(ParseErrorKind::Syntax { detail: tok.text.clone() }, tok.span, tok.line, Some(tok.text));
                continue;
            }
            if !self.is_arg_start() {
                break;
            }
            args.push(self.parse_arg());
        }
        let end = if args.is_empty() { start } else { self.previous_end_offset() };
        self.builder.push(None, Span::from_range(start, end.max(start)), NodeKind::Command { args })
    }

    fn parse_arg(&mut self) -> NodeId {
        let tok = self.advance();
        match &tok.kind {
            TokenKind::Field => {
                let parts = tok.text.trim_start_matches('.').split('.').map(String::from).collect();
                self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::Field(parts)))
            }
            TokenKind::Dot => self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::Dot)),
            TokenKind::Dollar => {
                let name = tok.text.trim_start_matches('$').to_string();
                self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::Variable(name)))
            }
            TokenKind::String => {
                let inner = tok.text.trim_matches('"').to_string();
                self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::String(inner)))
            }
            TokenKind::Number => self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::Number(tok.text.clone()))),
            TokenKind::Bool => {
                let value = tok.text == "true";
                self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::Bool(value)))
            }
            TokenKind::Nil => self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::Nil)),
            TokenKind::Identifier => self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::Identifier(tok.text.clone()))),
            TokenKind::Keyword(kw) => self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::Identifier(kw.as_str().to_string()))),
            TokenKind::LParen => {
                let pipe = self.parse_pipe();
                let rparen_end = if matches!(self.current().kind, TokenKind::RParen) {
                    self.advance().span.end()
                } else {
                    self.previous_end_offset()
                };
                self.builder.push(None, Span::from_range(tok.span.offset, rparen_end), NodeKind::Arg(ArgKind::Nested(pipe)))
            }
            _ => self.builder.push(None, tok.span, NodeKind::Arg(ArgKind::Identifier(tok.text.clone()))),
        }
    }
}
