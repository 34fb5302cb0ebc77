//! Interprets a [`Block`]'s type hint against a [`TypeRegistry`] and
//! answers whether a [`VarUse`]/[`FnUse`] is well-typed.
//!
//! Every function here *reports*, never aborts: a `ResolveError` is data
//! the query layer turns into a diagnostic, not a signal to unwind (§4.F,
//! §7's propagation policy).

use crate::block::{Block, FnUse, VarUse};
use gotmpl_types::{lookup_builtin, FieldError, RegistryError, Signature, TypeRef, TypeRegistry};
use std::fmt;

/// The resolver's closed error taxonomy (§4.F / the failure-semantics
/// table in §4.G).
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// The enclosing block has no `gotype:` hint. Not a hard failure —
    /// the variable still highlights, it just can't be type-checked.
    NoHint,
    MalformedTypePath { path: String },
    PackageNotFound { path: String },
    TypeNotFound { package: String, name: String },
    /// A non-terminal segment of a dotted path resolved to something that
    /// isn't a struct (or pointer/named-to-struct), so there's nothing to
    /// descend into for the remaining segments.
    NonStructField { type_name: String, field: String },
    FieldNotFound { type_name: String, field: String },
    UnknownFunction { name: String },
    Arity { expected: usize, got: usize },
    TypeMismatch { param: usize, expected: String, got: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NoHint => write!(f, "no type hint in scope"),
            ResolveError::MalformedTypePath { path } => write!(f, "malformed type path {path:?}"),
            ResolveError::PackageNotFound { path } => write!(f, "package {path:?} not found in registry"),
            ResolveError::TypeNotFound { package, name } => write!(f, "type {name:?} not found in package {package:?}"),
            ResolveError::NonStructField { type_name, field } => write!(f, "{type_name} is not a struct, cannot resolve field {field:?}"),
            ResolveError::FieldNotFound { type_name, field } => write!(f, "{type_name} has no field or method {field:?}"),
            ResolveError::UnknownFunction { name } => write!(f, "unknown function {name:?}"),
            ResolveError::Arity { expected, got } => write!(f, "expected {expected} argument(s), got {got}"),
            ResolveError::TypeMismatch { param, expected, got } => {
                write!(f, "argument {param} expected {expected}, got {got}")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<RegistryError> for ResolveError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::MalformedTypePath { path } => ResolveError::MalformedTypePath { path },
            RegistryError::PackageNotFound { path } => ResolveError::PackageNotFound { path },
            RegistryError::TypeNotFound { package, name } => ResolveError::TypeNotFound { package, name },
        }
    }
}

impl From<FieldError> for ResolveError {
    fn from(err: FieldError) -> Self {
        ResolveError::FieldNotFound { type_name: err.type_name, field: err.field }
    }
}

/// Resolves `block`'s hint (if any) to the root [`TypeRef`] its dotted
/// paths navigate from.
pub fn resolve_block_type(block: &Block, registry: &TypeRegistry) -> Result<TypeRef, ResolveError> {
    let hint = block.type_hint.as_ref().ok_or(ResolveError::NoHint)?;
    Ok(registry.lookup(&hint.type_path)?)
}

/// Walks a dotted field path (`["User", "Address", "City"]`) against a
/// starting type, failing `NonStructField` if a non-terminal segment
/// lands somewhere that isn't struct-shaped, or `FieldNotFound` if a
/// segment itself doesn't name a field/method of its receiver.
pub fn resolve_field_path(root: &TypeRef, segments: &[&str]) -> Result<TypeRef, ResolveError> {
    let mut current = root.clone();
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        if !is_last && current.as_struct().is_none() {
            return Err(ResolveError::NonStructField { type_name: current.display_name(), field: (*segment).to_string() });
        }
        current = gotmpl_types::resolve_field(&current, segment)?;
    }
    Ok(current)
}

/// Resolves a single [`VarUse`] within `block` against `registry`.
///
/// A `$variable` reference (rather than a `.Field` path) always resolves
/// to [`TypeRef::Unknown`]: the core does not track the type flowing out
/// of a `$x := …` declaration's right-hand side (§9's second open
/// question leaves value-flow typing unresolved; declared variables are
/// a narrower case of the same gap, so the baseline treats them the same
/// way as the `.` override — assignable to and from anything, never
/// itself a source of a diagnostic).
pub fn resolve_var(block: &Block, var: &VarUse, registry: &TypeRegistry) -> Result<TypeRef, ResolveError> {
    if !var.is_field() {
        return Ok(TypeRef::Unknown);
    }
    let root = resolve_block_type(block, registry)?;
    let segments = var.field_segments();
    if segments.is_empty() {
        return Ok(root);
    }
    resolve_field_path(&root, &segments)
}

/// Looks `func.name` up in the builtin table. Returns the signature alone;
/// callers that also need arity/type checking call [`check_call`]
/// separately once they've computed the call site's argument types.
pub fn resolve_fn(func: &FnUse) -> Result<Signature, ResolveError> {
    lookup_builtin(&func.name).cloned().ok_or_else(|| ResolveError::UnknownFunction { name: func.name.clone() })
}

/// Checks a call's argument types against `sig`, respecting a variadic
/// last parameter (§4.F: "respecting variadic last parameter").
///
/// `arg_types` must already include the implicit first argument fed in
/// by a preceding pipe stage when the command sits at pipe position > 0
/// (§4.D: "its first parameter slot is consumed by the previous
/// command's result") — the caller, not this function, is responsible
/// for prepending it.
pub fn check_call(sig: &Signature, arg_types: &[TypeRef]) -> Result<(), ResolveError> {
    check_arity(sig, arg_types.len())?;
    check_types(sig, arg_types)
}

fn check_arity(sig: &Signature, got: usize) -> Result<(), ResolveError> {
    if sig.variadic {
        let min = sig.params.len().saturating_sub(1);
        if got < min {
            return Err(ResolveError::Arity { expected: min, got });
        }
    } else if got != sig.params.len() {
        return Err(ResolveError::Arity { expected: sig.params.len(), got });
    }
    Ok(())
}

fn check_types(sig: &Signature, arg_types: &[TypeRef]) -> Result<(), ResolveError> {
    for (i, arg_ty) in arg_types.iter().enumerate() {
        let param_ty = match sig.params.get(i) {
            Some(p) => p,
            None if sig.variadic => sig.params.last().expect("variadic signature has at least one parameter"),
            None => break,
        };
        if !arg_ty.is_assignable_to(param_ty) {
            return Err(ResolveError::TypeMismatch { param: i, expected: param_ty.display_name(), got: arg_ty.display_name() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_base::Span;
    use gotmpl_types::{BasicKind, Package};
    use std::collections::BTreeMap;

    fn person_registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        let mut fields = BTreeMap::new();
        fields.insert("Name".to_string(), TypeRef::Basic(BasicKind::String));
        fields.insert("Age".to_string(), TypeRef::Basic(BasicKind::Int));
        let person = TypeRef::struct_of(fields, BTreeMap::new());
        reg.insert_package("demo", Package::new().with_type("Person", person));
        reg
    }

    fn hinted_block(type_path: &str) -> Block {
        let mut block = Block::new("", Span::new(0, 10));
        block.type_hint = Some(crate::block::TypeHint { type_path: type_path.to_string(), span: Span::point(0) });
        block
    }

    fn field_use(long_name: &str) -> VarUse {
        VarUse { span: Span::point(0), long_name: long_name.to_string(), is_declaration: false, pipe_args: Vec::new(), scope: String::new() }
    }

    fn fn_use(name: &str) -> FnUse {
        FnUse { span: Span::point(0), name: name.to_string(), pipe_args: Vec::new(), scope: String::new(), pipe_position: 0 }
    }

    #[test]
    fn no_hint_reports_no_hint() {
        let block = Block::new("", Span::new(0, 10));
        let reg = person_registry();
        assert_eq!(resolve_var(&block, &field_use(".Name"), &reg), Err(ResolveError::NoHint));
    }

    #[test]
    fn resolves_a_known_field() {
        let block = hinted_block("demo.Person");
        let reg = person_registry();
        assert_eq!(resolve_var(&block, &field_use(".Name"), &reg), Ok(TypeRef::Basic(BasicKind::String)));
    }

    #[test]
    fn unknown_field_is_field_not_found() {
        let block = hinted_block("demo.Person");
        let reg = person_registry();
        assert_eq!(
            resolve_var(&block, &field_use(".Nickname"), &reg),
            Err(ResolveError::FieldNotFound { type_name: "demo.Person".into(), field: "Nickname".into() })
        );
    }

    #[test]
    fn descending_into_a_scalar_field_is_non_struct() {
        let block = hinted_block("demo.Person");
        let reg = person_registry();
        assert_eq!(
            resolve_var(&block, &field_use(".Name.Length"), &reg),
            Err(ResolveError::NonStructField { type_name: "string".into(), field: "Length".into() })
        );
    }

    #[test]
    fn malformed_type_path_propagates_as_resolve_error() {
        let block = hinted_block("NoDot");
        let reg = person_registry();
        assert_eq!(resolve_var(&block, &field_use(".Name"), &reg), Err(ResolveError::MalformedTypePath { path: "NoDot".into() }));
    }

    #[test]
    fn dollar_variable_resolves_to_unknown() {
        let block = hinted_block("demo.Person");
        let reg = person_registry();
        let var = VarUse { span: Span::point(0), long_name: "x".into(), is_declaration: false, pipe_args: Vec::new(), scope: String::new() };
        assert_eq!(resolve_var(&block, &var, &reg), Ok(TypeRef::Unknown));
    }

    #[test]
    fn unknown_function_is_reported() {
        let func = fn_use("frobnicate");
        assert_eq!(resolve_fn(&func), Err(ResolveError::UnknownFunction { name: "frobnicate".into() }));
    }

    #[test]
    fn known_builtin_resolves_its_signature() {
        let func = fn_use("upper");
        let sig = resolve_fn(&func).unwrap();
        assert_eq!(sig.params, vec![TypeRef::Basic(BasicKind::String)]);
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let sig = resolve_fn(&fn_use("upper")).unwrap();
        assert_eq!(check_call(&sig, &[]), Err(ResolveError::Arity { expected: 1, got: 0 }));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let sig = resolve_fn(&fn_use("upper")).unwrap();
        let err = check_call(&sig, &[TypeRef::Basic(BasicKind::Int)]).unwrap_err();
        assert_eq!(err, ResolveError::TypeMismatch { param: 0, expected: "string".into(), got: "int".into() });
    }

    #[test]
    fn variadic_builtin_accepts_any_count_at_or_above_minimum() {
        let func = fn_use("print");
        let sig = resolve_fn(&func).unwrap();
        assert!(check_call(&sig, &[]).is_ok());
        assert!(check_call(&sig, &[TypeRef::Unknown, TypeRef::Unknown, TypeRef::Unknown]).is_ok());
    }

    #[test]
    fn unknown_argument_type_is_always_assignable() {
        let sig = resolve_fn(&fn_use("upper")).unwrap();
        assert!(check_call(&sig, &[TypeRef::Unknown]).is_ok());
    }
}
