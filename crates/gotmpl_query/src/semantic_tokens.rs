//! `semantic_tokens(file, range?) → [SemToken]` (§4.G.3): a source-order
//! token stream for syntax highlighting, delta-encoded per the `lsp-types`
//! wire convention.
//!
//! The lexer's token stream is the one place every highlighted kind —
//! delimiters, operators, literals, comments — already has a span; walking
//! it directly (rather than re-deriving punctuation spans from the AST)
//! keeps this pass a single linear scan. Two refinements come from the
//! semantic model layered on top: an `else`/`if` pair is merged into one
//! keyword span (the parser already does this for its own `else_keyword_span`,
//! so highlighting matches what a diagnostic would underline), and a
//! function identifier's `defaultLibrary` modifier and a `$variable`'s
//! `declaration`/`definition` modifier both come from looking the token's
//! offset up in the enclosing [`gotmpl_analysis::Block`].

use crate::position::to_position;
use crate::store::AnalyzedDocument;
use gotmpl_base::Span;
use gotmpl_syntax::lexer::lex;
use gotmpl_syntax::token::{Keyword, Token, TokenKind};
use gotmpl_types::lookup_builtin;
use lsp_types::{SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend};

const DELIMITER: u32 = 0;
const KEYWORD: u32 = 1;
const FUNCTION: u32 = 2;
const VARIABLE: u32 = 3;
const OPERATOR: u32 = 4;
const STRING: u32 = 5;
const COMMENT: u32 = 6;
const NUMBER: u32 = 7;

const DECLARATION: u32 = 1;
const DEFINITION: u32 = 2;
const READONLY: u32 = 4;
const DEFAULT_LIBRARY: u32 = 8;

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: vec![
            SemanticTokenType::new("delimiter"),
            SemanticTokenType::KEYWORD,
            SemanticTokenType::FUNCTION,
            SemanticTokenType::VARIABLE,
            SemanticTokenType::OPERATOR,
            SemanticTokenType::STRING,
            SemanticTokenType::COMMENT,
            SemanticTokenType::NUMBER,
        ],
        token_modifiers: vec![
            SemanticTokenModifier::DECLARATION,
            SemanticTokenModifier::DEFINITION,
            SemanticTokenModifier::READONLY,
            SemanticTokenModifier::DEFAULT_LIBRARY,
        ],
    }
}

struct Entry {
    span: Span,
    token_type: u32,
    modifiers: u32,
}

pub fn semantic_tokens(doc: &AnalyzedDocument, range: Option<Span>) -> Vec<SemanticToken> {
    let tokens = lex(doc.document.text());
    let mut entries = Vec::with_capacity(tokens.len());

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if let TokenKind::Keyword(Keyword::Else) = token.kind {
            if let Some(next) = tokens.get(i + 1) {
                if matches!(next.kind, TokenKind::Keyword(Keyword::If)) {
                    entries.push(Entry { span: token.span.merge(next.span), token_type: KEYWORD, modifiers: READONLY });
                    i += 2;
                    continue;
                }
            }
        }
        if let Some(entry) = classify(doc, token) {
            entries.push(entry);
        }
        i += 1;
    }

    if let Some(range) = range {
        entries.retain(|e| e.span.overlaps(&range));
    }
    entries.sort_by(|a, b| a.span.offset.cmp(&b.span.offset).then(b.span.length.cmp(&a.span.length)));

    encode(doc, &entries)
}

fn classify(doc: &AnalyzedDocument, token: &Token) -> Option<Entry> {
    let (token_type, base_modifiers) = match &token.kind {
        TokenKind::LeftDelim | TokenKind::LeftDelimTrim | TokenKind::RightDelim | TokenKind::RightDelimTrim => (DELIMITER, 0),
        TokenKind::Keyword(_) => (KEYWORD, READONLY),
        TokenKind::Identifier => (FUNCTION, function_modifiers(doc, token.span)),
        TokenKind::Field | TokenKind::Dollar | TokenKind::Dot => (VARIABLE, variable_modifiers(doc, token)),
        TokenKind::String => (STRING, READONLY),
        TokenKind::Number => (NUMBER, READONLY),
        TokenKind::Bool | TokenKind::Nil => (KEYWORD, READONLY),
        TokenKind::Pipe | TokenKind::Assign => (OPERATOR, 0),
        TokenKind::Comment => (COMMENT, 0),
        TokenKind::Text | TokenKind::LParen | TokenKind::RParen | TokenKind::Comma | TokenKind::Error | TokenKind::Eof => return None,
    };
    if token.span.is_empty() {
        return None;
    }
    Some(Entry { span: token.span, token_type, modifiers: base_modifiers })
}

fn function_modifiers(doc: &AnalyzedDocument, span: Span) -> u32 {
    let block = doc.semantic.block_at(span.offset);
    let Some(func) = block.functions.iter().find(|f| f.span.offset == span.offset) else { return 0 };
    if lookup_builtin(&func.name).is_some() {
        DEFAULT_LIBRARY
    } else {
        0
    }
}

fn variable_modifiers(doc: &AnalyzedDocument, token: &Token) -> u32 {
    if !matches!(token.kind, TokenKind::Dollar) {
        return 0;
    }
    let block = doc.semantic.block_at(token.span.offset);
    if block.declarations.iter().any(|d| d.span.offset == token.span.offset) {
        return DECLARATION;
    }
    if block.declarations.iter().any(|d| d.name == token.text.trim_start_matches('$')) {
        return DEFINITION;
    }
    0
}

fn encode(doc: &AnalyzedDocument, entries: &[Entry]) -> Vec<SemanticToken> {
    let mut result = Vec::with_capacity(entries.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;

    for entry in entries {
        let start = to_position(&doc.document, entry.span.offset);
        let end = to_position(&doc.document, entry.span.end());
        let length = if start.line == end.line { end.character.saturating_sub(start.character) } else { entry.span.length };
        if length == 0 {
            continue;
        }

        let delta_line = start.line - prev_line;
        let delta_start = if delta_line == 0 { start.character - prev_start } else { start.character };

        result.push(SemanticToken { delta_line, delta_start, length, token_type: entry.token_type, token_modifiers_bitset: entry.modifiers });
        prev_line = start.line;
        prev_start = start.character;
    }
    result
}
