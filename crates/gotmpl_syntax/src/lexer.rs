//! A hand-written two-state scanner for gotmpl source text.
//!
//! The lexer alternates between two states:
//!
//! - [`State::Text`] — copies raw bytes through as `Text` tokens until the
//!   next `{{`/`{{-`.
//! - [`State::Action`] — tokenises the body of a `{{ … }}` action: keywords,
//!   identifiers, dotted fields, `$`-variables, literals, and punctuation,
//!   until the closing `}}`/`-}}`.
//!
//! Trim markers (`{{-`, `-}}`) consume adjacent whitespace in the
//! neighbouring `Text` token rather than producing tokens of their own —
//! the consumed whitespace simply never appears in the output stream.
//!
//! Unterminated strings and comments do not abort the scan: the lexer
//! emits a single `Error` token for the offending span and resumes in
//! `Text` state at the next line break, so the parser downstream always
//! sees a complete, total token stream.

use crate::token::{Keyword, Token, TokenKind};
use gotmpl_base::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Action,
}

/// Scans `source` into a complete token stream, always terminated by `Eof`.
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    state: State,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            state: State::Text,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.bytes.len() {
            match self.state {
                State::Text => self.scan_text(),
                State::Action => self.scan_action(),
            }
        }
        self.tokens.push(Token::new(TokenKind::Eof, Span::point(self.pos as u32), "", self.line));
        log::trace!("lexed {} tokens from {} bytes", self.tokens.len(), self.bytes.len());
        self.tokens
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn count_newlines(&mut self, slice: &str) {
        self.line += slice.bytes().filter(|&b| b == b'\n').count() as u32;
    }

    fn advance(&mut self, n: usize) -> &'a str {
        let start = self.pos;
        self.pos += n;
        &self.src[start..self.pos]
    }

    // ------------------------------------------------------------------
    // Text state
    // ------------------------------------------------------------------

    fn scan_text(&mut self) {
        let start = self.pos;
        let start_line = self.line;
        let find_from = self.rest();
        let delim_at = find_from.find("{{");

        let (text_end, trim_left) = match delim_at {
            Some(idx) => {
                let abs = start + idx;
                let trim = self.src[abs..].starts_with("{{-");
                (abs, trim)
            }
            None => (self.bytes.len(), false),
        };

        let raw_text = &self.src[start..text_end];
        self.count_newlines(raw_text);

        let emitted_text = if trim_left { raw_text.trim_end() } else { raw_text };
        if !emitted_text.is_empty() {
            self.tokens.push(Token::new(
                TokenKind::Text,
                Span::new(start as u32, emitted_text.len() as u32),
                emitted_text,
                start_line,
            ));
        }

        self.pos = text_end;

        if delim_at.is_none() {
            return; // ran out of input while still in Text state
        }

        let delim_line = self.line;
        if trim_left {
            let slice = self.advance(3);
            self.tokens.push(Token::new(TokenKind::LeftDelimTrim, Span::new(text_end as u32, 3), slice, delim_line));
        } else {
            let slice = self.advance(2);
            self.tokens.push(Token::new(TokenKind::LeftDelim, Span::new(text_end as u32, 2), slice, delim_line));
        }
        self.state = State::Action;
    }

    // ------------------------------------------------------------------
    // Action state
    // ------------------------------------------------------------------

    fn scan_action(&mut self) {
        self.skip_action_whitespace();
        if self.pos >= self.bytes.len() {
            return; // unterminated action at EOF; parser reports UnexpectedEof
        }

        let rest = self.rest();

        if rest.starts_with("-}}") {
            let line = self.line;
            let start = self.pos;
            let slice = self.advance(3);
            self.tokens.push(Token::new(TokenKind::RightDelimTrim, Span::new(start as u32, 3), slice, line));
            self.state = State::Text;
            self.skip_trailing_whitespace_after_trim();
            return;
        }
        if rest.starts_with("}}") {
            let line = self.line;
            let start = self.pos;
            let slice = self.advance(2);
            self.tokens.push(Token::new(TokenKind::RightDelim, Span::new(start as u32, 2), slice, line));
            self.state = State::Text;
            return;
        }
        if rest.starts_with("/*") {
            self.scan_comment();
            return;
        }
        if rest.starts_with('"') {
            self.scan_string();
            return;
        }
        if rest.starts_with(":=") {
            let line = self.line;
            let start = self.pos;
            let slice = self.advance(2);
            self.tokens.push(Token::new(TokenKind::Assign, Span::new(start as u32, 2), slice, line));
            return;
        }

        let c = rest.chars().next().unwrap();
        match c {
            '|' => self.single(TokenKind::Pipe),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ',' => self.single(TokenKind::Comma),
            '$' => self.scan_dollar(),
            '.' => self.scan_dot_or_field(),
            '+' | '-' if rest[1..].starts_with(|d: char| d.is_ascii_digit()) => self.scan_number(),
            _ if c.is_ascii_digit() => self.scan_number(),
            _ if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),
            _ => {
                log::debug!("unexpected character {:?} in action at line {}", c, self.line);
                self.single(TokenKind::Error);
            }
        }
    }

    fn single(&mut self, kind: TokenKind) {
        let line = self.line;
        let start = self.pos;
        let slice = self.advance(1);
        self.tokens.push(Token::new(kind, Span::new(start as u32, 1), slice, line));
    }

    fn skip_action_whitespace(&mut self) {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == b' ' || b == b'\t' || b == b'\r' {
                self.pos += 1;
            } else if b == b'\n' {
                self.pos += 1;
                self.line += 1;
            } else {
                break;
            }
        }
    }

    /// After a `-}}`, the whitespace that opens the following `Text` run is
    /// consumed here rather than left for [`Lexer::scan_text`] to trim,
    /// matching the "consumes following whitespace" rule for both trim
    /// markers.
    fn skip_trailing_whitespace_after_trim(&mut self) {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == b' ' || b == b'\t' || b == b'\r' {
                self.pos += 1;
            } else if b == b'\n' {
                self.pos += 1;
                self.line += 1;
            } else {
                break;
            }
        }
    }

    fn scan_comment(&mut self) {
        let start = self.pos;
        let line = self.line;
        let after_open = self.pos + 2;
        match self.src[after_open..].find("*/") {
            Some(idx) => {
                let body_end = after_open + idx;
                let body = &self.src[after_open..body_end];
                let close_end = body_end + 2;
                let full = &self.src[start..close_end];
                self.count_newlines(full);
                self.pos = close_end;
                self.tokens.push(Token::new(
                    TokenKind::Comment,
                    Span::from_range(start as u32, close_end as u32),
                    body,
                    line,
                ));
            }
            None => self.recover_to_next_line(start, line, "unterminated comment"),
        }
    }

    fn scan_string(&mut self) {
        let start = self.pos;
        let line = self.line;
        let mut i = self.pos + 1; // past opening quote
        loop {
            if i >= self.bytes.len() || self.bytes[i] == b'\n' {
                self.recover_to_next_line(start, line, "unterminated string literal");
                return;
            }
            match self.bytes[i] {
                b'\\' if i + 1 < self.bytes.len() && matches!(self.bytes[i + 1], b'"' | b'\\' | b'n' | b't') => {
                    i += 2;
                }
                b'"' => {
                    i += 1;
                    break;
                }
                _ => i += 1,
            }
        }
        let text = &self.src[start..i];
        self.pos = i;
        self.tokens.push(Token::new(TokenKind::String, Span::from_range(start as u32, i as u32), text, line));
    }

    /// Lexer-level recovery per §4.B: emit one `Error` token for the
    /// offending span and resume in `Text` state at the next line break.
    fn recover_to_next_line(&mut self, start: usize, line: u32, reason: &str) {
        log::debug!("{reason} at line {line}, recovering at next line break");
        let line_end = self.src[start..]
            .find('\n')
            .map(|idx| start + idx)
            .unwrap_or(self.bytes.len());
        let text = &self.src[start..line_end];
        self.tokens.push(Token::new(TokenKind::Error, Span::from_range(start as u32, line_end as u32), text, line));
        if line_end < self.bytes.len() {
            self.pos = line_end + 1;
            self.line += 1;
        } else {
            self.pos = line_end;
        }
        self.state = State::Text;
    }

    fn scan_dollar(&mut self) {
        let start = self.pos;
        let line = self.line;
        let mut i = self.pos + 1;
        while i < self.bytes.len() && is_ident_continue(self.bytes[i]) {
            i += 1;
        }
        let text = &self.src[start..i];
        self.pos = i;
        self.tokens.push(Token::new(TokenKind::Dollar, Span::from_range(start as u32, i as u32), text, line));
    }

    /// Scans a bare `.` or a dotted field chain such as `.User.Address.City`.
    fn scan_dot_or_field(&mut self) {
        let start = self.pos;
        let line = self.line;
        let mut i = self.pos;
        let mut had_segment = false;
        loop {
            if i >= self.bytes.len() || self.bytes[i] != b'.' {
                break;
            }
            let seg_start = i + 1;
            let mut j = seg_start;
            while j < self.bytes.len() && is_ident_continue(self.bytes[j]) {
                j += 1;
            }
            if j == seg_start {
                break; // trailing dot with no identifier after it
            }
            had_segment = true;
            i = j;
        }
        if !had_segment {
            self.pos = start + 1;
            self.tokens.push(Token::new(TokenKind::Dot, Span::new(start as u32, 1), ".", line));
            return;
        }
        let text = &self.src[start..i];
        self.pos = i;
        self.tokens.push(Token::new(TokenKind::Field, Span::from_range(start as u32, i as u32), text, line));
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        let line = self.line;
        let mut i = self.pos;
        if matches!(self.bytes[i], b'+' | b'-') {
            i += 1;
        }
        while i < self.bytes.len() && self.bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i < self.bytes.len() && self.bytes[i] == b'.' && i + 1 < self.bytes.len() && self.bytes[i + 1].is_ascii_digit() {
            i += 1;
            while i < self.bytes.len() && self.bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        let text = &self.src[start..i];
        self.pos = i;
        self.tokens.push(Token::new(TokenKind::Number, Span::from_range(start as u32, i as u32), text, line));
    }

    fn scan_identifier(&mut self) {
        let start = self.pos;
        let line = self.line;
        let mut i = self.pos;
        while i < self.bytes.len() && is_ident_continue(self.bytes[i]) {
            i += 1;
        }
        let text = &self.src[start..i];
        self.pos = i;
        let kind = if let Some(kw) = Keyword::from_ident(text) {
            TokenKind::Keyword(kw)
        } else if text == "true" || text == "false" {
            TokenKind::Bool
        } else if text == "nil" {
            TokenKind::Nil
        } else {
            TokenKind::Identifier
        };
        self.tokens.push(Token::new(kind, Span::from_range(start as u32, i as u32), text, line));
    }
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind.clone()).collect()
    }

    #[test]
    fn lexes_plain_text_as_single_token_plus_eof() {
        let tokens = lex("hello world");
        assert_eq!(kinds(&tokens), vec![TokenKind::Text, TokenKind::Eof]);
        assert_eq!(tokens[0].text, "hello world");
    }

    #[test]
    fn lexes_simple_action() {
        let tokens = lex("{{.Name}}");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::LeftDelim, TokenKind::Field, TokenKind::RightDelim, TokenKind::Eof]
        );
        assert_eq!(tokens[1].text, ".Name");
    }

    #[test]
    fn left_trim_consumes_preceding_whitespace() {
        let tokens = lex("hello   {{- .X -}}world");
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[1].kind, TokenKind::LeftDelimTrim);
    }

    #[test]
    fn right_trim_consumes_following_whitespace() {
        let tokens = lex("{{.X -}}   world");
        let text_tok = tokens.iter().find(|t| t.kind == TokenKind::Text).unwrap();
        assert_eq!(text_tok.text, "world");
    }

    #[test]
    fn recognises_keywords() {
        let tokens = lex("{{if .Ready}}{{end}}");
        assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::If));
        let end_tok = tokens.iter().find(|t| matches!(t.kind, TokenKind::Keyword(Keyword::End))).unwrap();
        assert_eq!(end_tok.text, "end");
    }

    #[test]
    fn recognises_dollar_variable() {
        let tokens = lex("{{$x := .Name}}");
        assert_eq!(tokens[1].kind, TokenKind::Dollar);
        assert_eq!(tokens[1].text, "$x");
        assert_eq!(tokens[2].kind, TokenKind::Assign);
    }

    #[test]
    fn recognises_string_literal_with_escapes() {
        let tokens = lex(r#"{{printf "%s\n" .Name}}"#);
        let string_tok = tokens.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(string_tok.text, r#""%s\n""#);
    }

    #[test]
    fn recognises_number_literals() {
        let tokens = lex("{{42}} {{-3}} {{3.14}}");
        let numbers: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Number).map(|t| t.text.as_str()).collect();
        assert_eq!(numbers, vec!["42", "-3", "3.14"]);
    }

    #[test]
    fn recognises_bool_and_nil() {
        let tokens = lex("{{true}} {{false}} {{nil}}");
        assert_eq!(tokens[1].kind, TokenKind::Bool);
        assert_eq!(tokens[4].kind, TokenKind::Bool);
        assert_eq!(tokens[7].kind, TokenKind::Nil);
    }

    #[test]
    fn recognises_comment() {
        let tokens = lex("{{/*gotype: demo.Person*/}}");
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert_eq!(tokens[1].text, "gotype: demo.Person");
    }

    #[test]
    fn comment_with_trim_markers_on_both_sides() {
        let tokens = lex("{{- /*gotype: demo.Person*/ -}}\n{{.Name}}");
        assert_eq!(tokens[0].kind, TokenKind::LeftDelimTrim);
        let comment = tokens.iter().find(|t| t.kind == TokenKind::Comment).unwrap();
        assert_eq!(comment.text, "gotype: demo.Person");
        let right_trim = tokens.iter().find(|t| t.kind == TokenKind::RightDelimTrim).unwrap();
        assert_eq!(right_trim.kind, TokenKind::RightDelimTrim);
        // the newline + following `{{` text should have been fully consumed
        let text_tok = tokens.iter().find(|t| t.kind == TokenKind::Text);
        assert!(text_tok.is_none());
    }

    #[test]
    fn unterminated_string_recovers_at_next_line() {
        let tokens = lex("{{printf \"oops\nnext}}");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
        // lexer falls back to Text state, so `next}}` is scanned as plain text
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Text && t.text == "next}}"));
    }

    #[test]
    fn unterminated_comment_recovers_at_next_line() {
        let tokens = lex("{{/* oops\nnext");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
    }

    #[test]
    fn pipe_and_function_tokens() {
        let tokens = lex(r#"{{printf "%s" .Name | upper}}"#);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::LeftDelim,
                TokenKind::Identifier,
                TokenKind::String,
                TokenKind::Field,
                TokenKind::Pipe,
                TokenKind::Identifier,
                TokenKind::RightDelim,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let tokens = lex("line1\n{{.X}}\nline3\n{{.Y}}");
        let field_tokens: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Field).collect();
        assert_eq!(field_tokens[0].line, 2);
        assert_eq!(field_tokens[1].line, 4);
    }

    #[test]
    fn every_lex_run_ends_in_eof() {
        for src in ["", "plain text", "{{.X}}", "{{if .A}}{{end}}"] {
            let tokens = lex(src);
            assert!(tokens.last().unwrap().is_eof());
        }
    }
}
