#![cfg_attr(docsrs, feature(doc_cfg))]

//! # gotmpl-types
//!
//! The host-language type model gotmpl's resolver checks templates
//! against: [`TypeRef`], a read-only [`TypeRegistry`] populated by the
//! embedding host, single-segment field/method resolution, and the fixed
//! builtin function table.
//!
//! This crate has no knowledge of template syntax — it only models the
//! *target* of a type hint, never the template that references it.

pub mod builtins;
pub mod field;
pub mod registry;
pub mod type_ref;

pub use builtins::{lookup as lookup_builtin, BUILTINS};
pub use field::{resolve_field, FieldError};
pub use registry::{Package, RegistryError, TypeRegistry};
pub use type_ref::{BasicKind, Signature, TypeRef};
