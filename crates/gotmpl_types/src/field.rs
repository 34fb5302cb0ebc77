//! Single-segment field and method lookup against a [`TypeRef`].
//!
//! Walking a whole dotted path (and deciding whether a non-terminal
//! segment landed on a non-struct type) is the resolver's job, one layer
//! up in `gotmpl_analysis`; this module only ever resolves one segment at
//! a time against an already-known receiver type.

use crate::type_ref::{Signature, TypeRef};
use std::fmt;

/// Failure resolving a single field or method segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub type_name: String,
    pub field: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} has no field or method {:?}", self.type_name, self.field)
    }
}

impl std::error::Error for FieldError {}

/// Resolves `field` against `t`, dereferencing `Pointer`/`Named` wrappers
/// first (§4.D). Methods are looked up on both value and pointer
/// receivers, since a struct method set is declared once and usable
/// through either.
pub fn resolve_field(t: &TypeRef, field: &str) -> Result<TypeRef, FieldError> {
    let receiver = t.underlying();
    let (fields, methods) = receiver.as_struct().ok_or_else(|| FieldError { type_name: t.display_name(), field: field.to_string() })?;

    if let Some(field_type) = fields.get(field) {
        return Ok(field_type.clone());
    }
    if let Some(sig) = methods.get(field) {
        return Ok(TypeRef::Signature(sig.clone()));
    }
    Err(FieldError { type_name: t.display_name(), field: field.to_string() })
}

/// Convenience for building a method signature inline when constructing a
/// registry by hand (tests, small embedded fixtures).
pub fn method(params: Vec<TypeRef>, results: Vec<TypeRef>) -> Signature {
    Signature::new(params, results, false)
}
