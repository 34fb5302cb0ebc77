#![cfg_attr(docsrs, feature(doc_cfg))]

//! # gotmpl-analysis
//!
//! Turns a [`gotmpl_syntax::Ast`] into a [`block::SemanticFile`] of
//! [`block::Block`]s — one per `define`/`block`, plus a synthetic root —
//! and resolves the field chains and function calls each one contains
//! against a [`gotmpl_types::TypeRegistry`].
//!
//! This crate draws the line the query layer sits behind: it never touches
//! a document's text directly, never knows what a caret offset is, and
//! produces only typed, span-tagged facts. `gotmpl-query` is the layer
//! that turns those facts into diagnostics, hover content, and tokens.

pub mod block;
pub mod error;
pub mod resolver;
pub mod semantic;

pub use block::{ArgValue, Block, CommandUse, Declaration, FnUse, PipeUse, SemanticFile, TypeHint, VarUse};
pub use error::CoreError;
pub use resolver::{check_call, resolve_block_type, resolve_field_path, resolve_fn, resolve_var, ResolveError};
pub use semantic::{analyze, analyze_cancellable};
