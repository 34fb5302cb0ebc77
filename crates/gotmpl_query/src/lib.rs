#![cfg_attr(docsrs, feature(doc_cfg))]

//! # gotmpl-query
//!
//! The transport-agnostic facade an editor integration sits behind: open a
//! document by URI and text, then ask it for diagnostics, hover content, or
//! semantic tokens by byte offset. Nothing in this crate knows about
//! JSON-RPC, `tower-lsp`, or stdio — wiring a transport on top is the
//! embedding binary's job, not this crate's.
//!
//! [`QueryEngine`] is the single entry point. It owns a concurrent
//! [`store::DocumentStore`] (so one document's edit never blocks another
//! document's query) and a [`gotmpl_types::TypeRegistry`] the host populates
//! before opening any documents that reference its types.

pub mod diagnostics;
pub mod hover;
pub mod position;
pub mod semantic_tokens;
pub mod store;

pub use diagnostics::diagnostics as diagnostics_for;
pub use hover::hover as hover_at;
pub use semantic_tokens::{legend, semantic_tokens as semantic_tokens_for};
pub use store::DocumentId;

use gotmpl_base::{CancellationToken, Span};
use gotmpl_types::TypeRegistry;
use lsp_types::{Diagnostic, Hover, SemanticToken};
use store::DocumentStore;

/// Owns every open document and the type registry they're checked against.
///
/// Cloning isn't supported; a host keeps one `QueryEngine` per project and
/// shares it behind whatever concurrency primitive its transport needs
/// (a `Mutex`, an `Arc`, or nothing at all for a single-threaded stdio loop).
#[derive(Default)]
pub struct QueryEngine {
    documents: DocumentStore,
    registry: TypeRegistry,
}

impl QueryEngine {
    pub fn new() -> Self {
        QueryEngine::default()
    }

    /// Opens a new document and runs the full analysis pipeline over it.
    pub fn open(&self, uri: impl Into<String>, text: impl Into<String>) -> DocumentId {
        self.documents.open(uri, text)
    }

    /// As [`QueryEngine::open`], but the semantic analysis pass polls
    /// `token` at block boundaries (§5), stopping with a consistent partial
    /// result if cancellation fires mid-document.
    pub fn open_cancellable(&self, uri: impl Into<String>, text: impl Into<String>, token: &CancellationToken) -> DocumentId {
        self.documents.open_cancellable(uri, text, Some(token))
    }

    /// Replaces a document's text wholesale and re-derives its AST and
    /// semantic model. A no-op if `id` isn't open.
    pub fn edit(&self, id: DocumentId, text: impl Into<String>) {
        self.documents.edit(id, text);
    }

    /// As [`QueryEngine::edit`], but the semantic analysis pass polls
    /// `token` at block boundaries (§5).
    pub fn edit_cancellable(&self, id: DocumentId, text: impl Into<String>, token: &CancellationToken) {
        self.documents.edit_cancellable(id, text, Some(token));
    }

    pub fn close(&self, id: DocumentId) {
        self.documents.close(id);
    }

    pub fn is_open(&self, id: DocumentId) -> bool {
        self.documents.is_open(id)
    }

    /// Parse errors, type-hint annotations, resolver failures, and unused
    /// declarations for the whole document, as LSP diagnostics. Empty if
    /// `id` isn't open.
    pub fn diagnostics(&self, id: DocumentId) -> Vec<Diagnostic> {
        match self.documents.get(id) {
            Some(doc) => diagnostics::diagnostics(&doc, &self.registry),
            None => Vec::new(),
        }
    }

    /// As [`QueryEngine::diagnostics`], but polls `token` between blocks
    /// (§5). Returns the diagnostics produced before cancellation (if any)
    /// alongside whether it fired.
    pub fn diagnostics_cancellable(&self, id: DocumentId, token: &CancellationToken) -> (Vec<Diagnostic>, bool) {
        match self.documents.get(id) {
            Some(doc) => diagnostics::diagnostics_cancellable(&doc, &self.registry, Some(token)),
            None => (Vec::new(), false),
        }
    }

    /// Hover content for the use (field or function) under `offset`, if any.
    pub fn hover(&self, id: DocumentId, offset: u32) -> Option<Hover> {
        let doc = self.documents.get(id)?;
        hover::hover(&doc, offset, &self.registry)
    }

    /// Delta-encoded semantic tokens for the document, optionally restricted
    /// to the tokens overlapping `range`. Empty if `id` isn't open.
    pub fn semantic_tokens(&self, id: DocumentId, range: Option<Span>) -> Vec<SemanticToken> {
        match self.documents.get(id) {
            Some(doc) => semantic_tokens::semantic_tokens(&doc, range),
            None => Vec::new(),
        }
    }

    /// Mutable access to the type catalogue documents are resolved against.
    /// The host populates this before (or between) opening documents that
    /// reference its types; gotmpl never populates it on its own.
    pub fn type_registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_types::{BasicKind, Package, TypeRef};
    use std::collections::BTreeMap;

    #[test]
    fn open_then_diagnostics_reports_a_parse_error() {
        let engine = QueryEngine::new();
        let id = engine.open("file:///a.tmpl", "{{if}}");
        assert!(!engine.diagnostics(id).is_empty());
    }

    #[test]
    fn closing_a_document_empties_its_query_results() {
        let engine = QueryEngine::new();
        let id = engine.open("file:///a.tmpl", "{{.Name}}");
        engine.close(id);
        assert!(engine.diagnostics(id).is_empty());
        assert!(engine.hover(id, 2).is_none());
        assert!(engine.semantic_tokens(id, None).is_empty());
    }

    #[test]
    fn registering_a_type_then_opening_a_hinted_document_resolves_fields() {
        let mut engine = QueryEngine::new();
        let mut fields = BTreeMap::new();
        fields.insert("Name".to_string(), TypeRef::Basic(BasicKind::String));
        engine.type_registry_mut().insert_package("demo", Package::new().with_type("Person", TypeRef::struct_of(fields, BTreeMap::new())));

        let id = engine.open("file:///a.tmpl", "{{/*gotype: demo.Person*/}}{{.Name}}");
        let diags = engine.diagnostics(id);
        assert!(diags.is_empty());
    }

    #[test]
    fn edit_is_visible_to_a_later_query() {
        let engine = QueryEngine::new();
        let id = engine.open("file:///a.tmpl", "{{if}}");
        assert!(!engine.diagnostics(id).is_empty());
        engine.edit(id, "{{.Name}}");
        assert!(engine.diagnostics(id).is_empty());
    }

    #[test]
    fn cancelled_token_yields_a_partial_diagnostics_result() {
        use gotmpl_base::CancellationToken;
        let engine = QueryEngine::new();
        let token = CancellationToken::new();
        let id = engine.open_cancellable("file:///a.tmpl", r#"{{define "a"}}{{if}}{{end}}{{end}}"#, &token);
        token.cancel();
        let (diags, cancelled) = engine.diagnostics_cancellable(id, &token);
        assert!(cancelled);
        // The parser error inside `define "a"` was recorded up front
        // (parse errors aren't gated by the token), but no block-derived
        // diagnostic ran since cancellation fires before the first block.
        assert!(!diags.is_empty());
    }

    #[test]
    fn semantic_tokens_for_an_unopened_document_is_empty() {
        let engine = QueryEngine::new();
        let id = engine.open("file:///a.tmpl", "x");
        engine.close(id);
        assert!(engine.semantic_tokens(id, None).is_empty());
    }
}
