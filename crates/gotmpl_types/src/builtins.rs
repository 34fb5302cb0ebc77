//! The fixed builtin function table.
//!
//! The host language reflects over live function values to build this
//! table; §9 mandates the systems-language re-architecture be a static
//! map instead. `BUILTINS` is initialised once, lazily, and never mutated
//! afterwards — generic builtins (`index`, `len`, `eq`, ...) are expressed
//! with `Interface` parameters since they operate over any comparable or
//! indexable value.

use crate::type_ref::{BasicKind, Signature, TypeRef};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

fn string() -> TypeRef {
    TypeRef::Basic(BasicKind::String)
}

fn bool_() -> TypeRef {
    TypeRef::Basic(BasicKind::Bool)
}

fn int() -> TypeRef {
    TypeRef::Basic(BasicKind::Int)
}

fn variadic(params: Vec<TypeRef>, results: Vec<TypeRef>) -> Signature {
    Signature::new(params, results, true)
}

fn fixed(params: Vec<TypeRef>, results: Vec<TypeRef>) -> Signature {
    Signature::new(params, results, false)
}

/// The fixed template builtin set named in §9: `and, or, not, eq, ne, lt,
/// le, gt, ge, len, index, slice, print, printf, println, html, js,
/// urlquery, upper, lower, call`.
pub static BUILTINS: Lazy<BTreeMap<&'static str, Signature>> = Lazy::new(|| {
    let mut table = BTreeMap::new();
    table.insert("and", variadic(vec![TypeRef::Interface], vec![TypeRef::Interface]));
    table.insert("or", variadic(vec![TypeRef::Interface], vec![TypeRef::Interface]));
    table.insert("not", fixed(vec![TypeRef::Interface], vec![bool_()]));
    table.insert("eq", variadic(vec![TypeRef::Interface], vec![bool_()]));
    table.insert("ne", fixed(vec![TypeRef::Interface, TypeRef::Interface], vec![bool_()]));
    table.insert("lt", fixed(vec![TypeRef::Interface, TypeRef::Interface], vec![bool_()]));
    table.insert("le", fixed(vec![TypeRef::Interface, TypeRef::Interface], vec![bool_()]));
    table.insert("gt", fixed(vec![TypeRef::Interface, TypeRef::Interface], vec![bool_()]));
    table.insert("ge", fixed(vec![TypeRef::Interface, TypeRef::Interface], vec![bool_()]));
    table.insert("len", fixed(vec![TypeRef::Interface], vec![int()]));
    table.insert("index", variadic(vec![TypeRef::Interface], vec![TypeRef::Interface]));
    table.insert("slice", variadic(vec![TypeRef::Interface], vec![TypeRef::Interface]));
    table.insert("print", variadic(vec![TypeRef::Interface], vec![string()]));
    table.insert("printf", variadic(vec![string(), TypeRef::Interface], vec![string()]));
    table.insert("println", variadic(vec![TypeRef::Interface], vec![string()]));
    table.insert("html", variadic(vec![TypeRef::Interface], vec![string()]));
    table.insert("js", variadic(vec![TypeRef::Interface], vec![string()]));
    table.insert("urlquery", variadic(vec![TypeRef::Interface], vec![string()]));
    table.insert("upper", fixed(vec![string()], vec![string()]));
    table.insert("lower", fixed(vec![string()], vec![string()]));
    table.insert("call", variadic(vec![TypeRef::Interface, TypeRef::Interface], vec![TypeRef::Interface]));
    log::debug!("initialised builtin function table with {} entries", table.len());
    table
});

/// Looks up a builtin by name. `None` means the resolver reports
/// `UnknownFunction` for the call site.
pub fn lookup(name: &str) -> Option<&'static Signature> {
    BUILTINS.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_every_named_builtin() {
        let names = [
            "and", "or", "not", "eq", "ne", "lt", "le", "gt", "ge", "len", "index", "slice", "print", "printf", "println", "html", "js",
            "urlquery", "upper", "lower", "call",
        ];
        for name in names {
            assert!(lookup(name).is_some(), "missing builtin {name}");
        }
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        assert!(lookup("frobnicate").is_none());
    }

    #[test]
    fn upper_is_a_fixed_unary_string_function() {
        let sig = lookup("upper").unwrap();
        assert!(!sig.variadic);
        assert_eq!(sig.params.len(), 1);
        assert_eq!(sig.params[0], string());
        assert_eq!(sig.results[0], string());
    }

    #[test]
    fn len_returns_int() {
        let sig = lookup("len").unwrap();
        assert_eq!(sig.results, vec![int()]);
    }
}
