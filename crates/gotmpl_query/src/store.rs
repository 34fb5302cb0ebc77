//! The concurrent document store the facade sits on top of (§5: "open/edit/
//! close on one document never blocks a diagnostics/hover/semantic_tokens
//! call on another in a multi-document host").

use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use gotmpl_analysis::{analyze_cancellable, SemanticFile};
use gotmpl_base::{CancellationToken, Document};
use gotmpl_syntax::{parse, Ast, ParseError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque handle to an open document. Never reused once issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

/// A document plus every pass the core runs over it eagerly, kept in sync
/// as a unit (§3's lifecycle contract: an edit re-derives AST and semantic
/// model wholesale, never patches them incrementally).
pub struct AnalyzedDocument {
    pub uri: String,
    pub document: Document,
    pub ast: Ast,
    pub parse_errors: Vec<ParseError>,
    pub semantic: SemanticFile,
}

impl AnalyzedDocument {
    fn new(uri: String, text: String) -> Self {
        Self::new_cancellable(uri, text, None)
    }

    /// As `new`, but polls `token` at semantic-analyser block boundaries
    /// (§5). `semantic.cancelled` reflects whether analysis ran to
    /// completion; the document is stored either way, since a
    /// partial-but-consistent semantic model is still a valid one to query.
    fn new_cancellable(uri: String, text: String, token: Option<&CancellationToken>) -> Self {
        let document = Document::new(text);
        let (ast, parse_errors) = parse(document.text());
        let semantic = analyze_cancellable(&ast, token);
        log::debug!("analyzed {uri}: {} parse error(s), cancelled={}", parse_errors.len(), semantic.cancelled);
        AnalyzedDocument { uri, document, ast, parse_errors, semantic }
    }
}

/// A `DashMap`-backed store of open documents, keyed by the id handed back
/// from [`DocumentStore::open`].
#[derive(Default)]
pub struct DocumentStore {
    documents: DashMap<DocumentId, AnalyzedDocument>,
    next_id: AtomicU64,
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore::default()
    }

    pub fn open(&self, uri: impl Into<String>, text: impl Into<String>) -> DocumentId {
        self.open_cancellable(uri, text, None)
    }

    /// As [`DocumentStore::open`], but the semantic analysis pass polls
    /// `token` at block boundaries (§5).
    pub fn open_cancellable(&self, uri: impl Into<String>, text: impl Into<String>, token: Option<&CancellationToken>) -> DocumentId {
        let id = DocumentId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.documents.insert(id, AnalyzedDocument::new_cancellable(uri.into(), text.into(), token));
        id
    }

    /// Replaces the document's text wholesale and re-runs the pipeline.
    /// A no-op if `id` isn't open (already closed, or never opened).
    pub fn edit(&self, id: DocumentId, text: impl Into<String>) {
        self.edit_cancellable(id, text, None);
    }

    /// As [`DocumentStore::edit`], but the semantic analysis pass polls
    /// `token` at block boundaries (§5).
    pub fn edit_cancellable(&self, id: DocumentId, text: impl Into<String>, token: Option<&CancellationToken>) {
        if let Some(mut entry) = self.documents.get_mut(&id) {
            let uri = entry.uri.clone();
            *entry = AnalyzedDocument::new_cancellable(uri, text.into(), token);
        }
    }

    pub fn close(&self, id: DocumentId) {
        self.documents.remove(&id);
    }

    pub fn get(&self, id: DocumentId) -> Option<Ref<'_, DocumentId, AnalyzedDocument>> {
        self.documents.get(&id)
    }

    pub fn is_open(&self, id: DocumentId) -> bool {
        self.documents.contains_key(&id)
    }
}
