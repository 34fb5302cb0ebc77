//! The host-language type model.
//!
//! `TypeRef` collapses what upstream evolved as several overlapping
//! `TypeInfo`/`FieldInfo` shapes into one sum type (§9's "multiple parallel
//! implementations" note): every type the resolver ever reasons about —
//! struct, pointer, slice, map, builtin signature — is one `TypeRef`.

use std::collections::BTreeMap;
use std::fmt;

/// The built-in scalar kinds a host-language field or literal may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Byte,
    Rune,
}

impl BasicKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::Byte => "byte",
            BasicKind::Rune => "rune",
        }
    }

    /// Whether two basic kinds may stand in for each other under template
    /// assignability rules (§4.F: "any numeric assignable to any numeric").
    pub fn is_numeric(&self) -> bool {
        !matches!(self, BasicKind::Bool | BasicKind::String)
    }
}

/// A function or method signature: ordered parameter types, ordered result
/// types, and whether the last parameter is variadic.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<TypeRef>,
    pub results: Vec<TypeRef>,
    pub variadic: bool,
}

impl Signature {
    pub fn new(params: Vec<TypeRef>, results: Vec<TypeRef>, variadic: bool) -> Self {
        Signature { params, results, variadic }
    }

    /// The effective result list of a command using this signature. Query
    /// callers pass the previous command's result type when this signature
    /// sits at pipe position *n* > 0 purely for documentation; the result
    /// set itself never depends on pipe position, only arity-checking does
    /// (§4.D).
    pub fn result_types(&self) -> &[TypeRef] {
        &self.results
    }
}

/// The host-language type model. See module docs.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Basic(BasicKind),
    Struct {
        fields: BTreeMap<String, TypeRef>,
        methods: BTreeMap<String, Signature>,
    },
    Pointer(Box<TypeRef>),
    Slice(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    /// A defined type, e.g. `demo.Person`, with its underlying
    /// representation (usually a `Struct`).
    Named { package: String, name: String, underlying: Box<TypeRef> },
    Interface,
    Signature(Signature),
    /// The resolver's "don't know, don't complain" type: assignable to and
    /// from anything (§4.F).
    Unknown,
}

impl TypeRef {
    pub fn struct_of(fields: BTreeMap<String, TypeRef>, methods: BTreeMap<String, Signature>) -> Self {
        TypeRef::Struct { fields, methods }
    }

    pub fn named(package: impl Into<String>, name: impl Into<String>, underlying: TypeRef) -> Self {
        TypeRef::Named { package: package.into(), name: name.into(), underlying: Box::new(underlying) }
    }

    /// Strips `Pointer`/`Named` wrappers to reach the representation a
    /// field lookup actually walks (§4.D: "if Pointer(u), dereference; if
    /// Named(_,_,u), unwrap to u").
    pub fn underlying(&self) -> &TypeRef {
        match self {
            TypeRef::Pointer(inner) => inner.underlying(),
            TypeRef::Named { underlying, .. } => underlying.underlying(),
            other => other,
        }
    }

    pub fn as_struct(&self) -> Option<(&BTreeMap<String, TypeRef>, &BTreeMap<String, Signature>)> {
        match self.underlying() {
            TypeRef::Struct { fields, methods } => Some((fields, methods)),
            _ => None,
        }
    }

    /// Assignability per §4.F: identical types, anything into `Interface`,
    /// any numeric into any numeric, and `Unknown` on either side.
    pub fn is_assignable_to(&self, target: &TypeRef) -> bool {
        if self == target || matches!(self, TypeRef::Unknown) || matches!(target, TypeRef::Unknown) {
            return true;
        }
        if matches!(target, TypeRef::Interface) {
            return true;
        }
        if let (TypeRef::Basic(a), TypeRef::Basic(b)) = (self, target) {
            return a.is_numeric() && b.is_numeric();
        }
        false
    }

    /// Human-readable rendering used by hover content, e.g. `*User`,
    /// `[]Item`, `map[string]int`, `demo.Person`.
    pub fn display_name(&self) -> String {
        match self {
            TypeRef::Basic(k) => k.display_name().to_string(),
            TypeRef::Struct { .. } => "struct{...}".to_string(),
            TypeRef::Pointer(inner) => format!("*{}", inner.display_name()),
            TypeRef::Slice(inner) => format!("[]{}", inner.display_name()),
            TypeRef::Map(k, v) => format!("map[{}]{}", k.display_name(), v.display_name()),
            TypeRef::Named { package, name, .. } => format!("{package}.{name}"),
            TypeRef::Interface => "interface{}".to_string(),
            TypeRef::Signature(sig) => {
                let params: Vec<_> = sig.params.iter().map(TypeRef::display_name).collect();
                let results: Vec<_> = sig.results.iter().map(TypeRef::display_name).collect();
                format!("func({}) {}", params.join(", "), results.join(", "))
            }
            TypeRef::Unknown => "<unknown>".to_string(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_assignable_to_anything_and_vice_versa() {
        assert!(TypeRef::Unknown.is_assignable_to(&TypeRef::Basic(BasicKind::String)));
        assert!(TypeRef::Basic(BasicKind::Int).is_assignable_to(&TypeRef::Unknown));
    }

    #[test]
    fn anything_is_assignable_to_interface() {
        assert!(TypeRef::Basic(BasicKind::Bool).is_assignable_to(&TypeRef::Interface));
    }

    #[test]
    fn numerics_are_mutually_assignable() {
        assert!(TypeRef::Basic(BasicKind::Int).is_assignable_to(&TypeRef::Basic(BasicKind::Float64)));
        assert!(!TypeRef::Basic(BasicKind::String).is_assignable_to(&TypeRef::Basic(BasicKind::Int)));
    }

    #[test]
    fn identical_types_are_assignable() {
        let t = TypeRef::Basic(BasicKind::String);
        assert!(t.clone().is_assignable_to(&t));
    }

    #[test]
    fn underlying_unwraps_pointer_and_named() {
        let s = TypeRef::struct_of(BTreeMap::new(), BTreeMap::new());
        let named = TypeRef::named("demo", "Person", s.clone());
        let ptr = TypeRef::Pointer(Box::new(named));
        assert_eq!(ptr.underlying(), &s);
    }

    #[test]
    fn display_name_renders_common_shapes() {
        assert_eq!(TypeRef::Basic(BasicKind::String).display_name(), "string");
        assert_eq!(TypeRef::Pointer(Box::new(TypeRef::Basic(BasicKind::Int))).display_name(), "*int");
        assert_eq!(TypeRef::Slice(Box::new(TypeRef::Basic(BasicKind::Int))).display_name(), "[]int");
        assert_eq!(
            TypeRef::Map(Box::new(TypeRef::Basic(BasicKind::String)), Box::new(TypeRef::Basic(BasicKind::Int))).display_name(),
            "map[string]int"
        );
        assert_eq!(TypeRef::named("demo", "Person", TypeRef::Unknown).display_name(), "demo.Person");
    }
}
