//! The read-only catalogue of host-language packages and their types.
//!
//! A [`TypeRegistry`] is populated once by the embedding host (§6 treats
//! this as the core's only configuration surface) and then shared
//! read-only across every analysis — the core itself never mutates it.

use crate::type_ref::TypeRef;
use std::collections::BTreeMap;
use std::fmt;

/// One host-language package: a flat, case-sensitive name → type map.
#[derive(Debug, Clone, Default)]
pub struct Package {
    types: BTreeMap<String, TypeRef>,
}

impl Package {
    pub fn new() -> Self {
        Package::default()
    }

    pub fn with_type(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.types.insert(name.into(), ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.types.get(name)
    }
}

/// Failure modes for [`TypeRegistry::lookup`] and [`crate::field::resolve_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A type path with no `.` separating the package from the type name.
    MalformedTypePath { path: String },
    PackageNotFound { path: String },
    TypeNotFound { package: String, name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::MalformedTypePath { path } => {
                write!(f, "malformed type path {path:?}: expected <import-path>.<TypeName>")
            }
            RegistryError::PackageNotFound { path } => write!(f, "package {path:?} not found in registry"),
            RegistryError::TypeNotFound { package, name } => write!(f, "type {name:?} not found in package {package:?}"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Maps import paths to [`Package`]s. Lookup is case-sensitive and
/// deterministic, per §9's resolution of the case-insensitive-suffix open
/// question: the core never guesses at a package from a bare suffix.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    packages: BTreeMap<String, Package>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    pub fn insert_package(&mut self, import_path: impl Into<String>, package: Package) {
        let import_path = import_path.into();
        log::debug!("registered package {import_path}");
        self.packages.insert(import_path, package);
    }

    pub fn package(&self, import_path: &str) -> Option<&Package> {
        self.packages.get(import_path)
    }

    /// Splits `path` at its last `.` into `(import-path, name)` and returns
    /// the named type from that package.
    pub fn lookup(&self, path: &str) -> Result<TypeRef, RegistryError> {
        let dot = path.rfind('.').ok_or_else(|| RegistryError::MalformedTypePath { path: path.to_string() })?;
        let (import_path, name) = (&path[..dot], &path[dot + 1..]);
        if import_path.is_empty() || name.is_empty() {
            return Err(RegistryError::MalformedTypePath { path: path.to_string() });
        }
        let package = self.package(import_path).ok_or_else(|| RegistryError::PackageNotFound { path: import_path.to_string() })?;
        package
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::TypeNotFound { package: import_path.to_string(), name: name.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_ref::BasicKind;

    fn demo_registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        let person = TypeRef::struct_of(
            [("Name".to_string(), TypeRef::Basic(BasicKind::String)), ("Age".to_string(), TypeRef::Basic(BasicKind::Int))]
                .into_iter()
                .collect(),
            Default::default(),
        );
        reg.insert_package("demo", Package::new().with_type("Person", person));
        reg
    }

    #[test]
    fn lookup_resolves_a_known_type() {
        let reg = demo_registry();
        let ty = reg.lookup("demo.Person").unwrap();
        assert!(ty.as_struct().is_some());
    }

    #[test]
    fn lookup_rejects_path_without_dot() {
        let reg = demo_registry();
        assert_eq!(reg.lookup("Person"), Err(RegistryError::MalformedTypePath { path: "Person".into() }));
    }

    #[test]
    fn lookup_reports_missing_package() {
        let reg = demo_registry();
        assert_eq!(reg.lookup("other.Thing"), Err(RegistryError::PackageNotFound { path: "other".into() }));
    }

    #[test]
    fn lookup_reports_missing_type() {
        let reg = demo_registry();
        assert_eq!(reg.lookup("demo.Ghost"), Err(RegistryError::TypeNotFound { package: "demo".into(), name: "Ghost".into() }));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let reg = demo_registry();
        assert!(reg.lookup("demo.person").is_err());
        assert!(reg.lookup("Demo.Person").is_err());
    }

    #[test]
    fn import_path_with_multiple_dots_splits_at_the_last_one() {
        let mut reg = TypeRegistry::new();
        reg.insert_package("example.com/demo", Package::new().with_type("Widget", TypeRef::Basic(BasicKind::Int)));
        assert!(reg.lookup("example.com/demo.Widget").is_ok());
    }
}
