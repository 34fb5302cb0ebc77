#![cfg_attr(docsrs, feature(doc_cfg))]

//! # gotmpl-syntax
//!
//! Lexer, resilient parser, and AST for the gotmpl template language.
//!
//! [`parse`] is the crate's single entry point: it never fails. A
//! malformed template still produces a complete [`ast::Ast`], with the
//! syntax problems collected into the accompanying `Vec<error::ParseError>`
//! instead of aborting the call.
//!
//! ```
//! use gotmpl_syntax::parse;
//!
//! let (ast, errors) = parse("Hello {{.Name}}!");
//! assert!(errors.is_empty());
//! assert_eq!(ast.root_nodes().len(), 2);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Ast, NodeId};
pub use error::{ParseError, ParseErrorKind};
pub use parser::parse;
pub use token::{Keyword, Token, TokenKind};
