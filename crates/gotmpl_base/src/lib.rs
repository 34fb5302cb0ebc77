#![cfg_attr(docsrs, feature(doc_cfg))]

//! # gotmpl-base
//!
//! Pure structural atoms for the gotmpl language-service ecosystem.
//!
//! This crate provides the foundational types used throughout gotmpl:
//!
//! - [`Span`] — Source location tracking
//! - [`Document`] — Byte offset ↔ 1-based line/column conversion
//! - [`CancellationToken`] — Cooperative cancellation polled by the query layer (§5)
//!
//! # Design Principles
//!
//! This crate has **no knowledge of the template language's grammar or
//! type system**. It provides only generic, reusable infrastructure that
//! higher-level crates (`gotmpl-syntax`, `gotmpl-types`, `gotmpl-analysis`,
//! `gotmpl-query`) build upon.
//!
//! # Example
//!
//! ```
//! use gotmpl_base::{Document, Span};
//!
//! let span = Span::new(0, 5);
//! let doc = Document::new("hello world");
//! assert_eq!(doc.offset_to_line_col(0), Ok((1, 1)));
//! assert_eq!(&doc.text()[span.offset as usize..span.end() as usize], "hello");
//! ```

pub mod cancel;
pub mod document;
pub mod span;

pub use cancel::CancellationToken;
pub use document::{Document, DocumentError};
pub use span::Span;
