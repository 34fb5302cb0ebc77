//! The aggregated error type the query layer sees (§7): every failure mode
//! of every pass this crate drives, folded into one enum so a caller never
//! has to match on `gotmpl_syntax::ParseError` and `ResolveError` and
//! `RegistryError` separately.

use crate::resolver::ResolveError;
use gotmpl_syntax::ParseError;
use gotmpl_types::RegistryError;
use std::fmt;

/// A closed taxonomy covering syntax, resolution, and registry failures,
/// plus the two outcomes a host embedding can hit that have nothing to do
/// with the template itself.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    Syntax(ParseError),
    Resolve(ResolveError),
    Registry(RegistryError),
    /// The document a caller asked about was never opened, or was closed
    /// out from under an in-flight request.
    Cancelled,
    /// A pass found the tree in a shape its own invariants say is
    /// unreachable (e.g. a `Pipe` node outside a `Command`'s argument
    /// list). Surfaced rather than panicked on, per the parser's
    /// never-panic contract extending to every later pass.
    Internal(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Syntax(e) => write!(f, "syntax error: {e}"),
            CoreError::Resolve(e) => write!(f, "resolve error: {e}"),
            CoreError::Registry(e) => write!(f, "registry error: {e}"),
            CoreError::Cancelled => write!(f, "operation cancelled: document not open"),
            CoreError::Internal(detail) => write!(f, "internal error: {detail}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<ParseError> for CoreError {
    fn from(err: ParseError) -> Self {
        CoreError::Syntax(err)
    }
}

impl From<ResolveError> for CoreError {
    fn from(err: ResolveError) -> Self {
        CoreError::Resolve(err)
    }
}

impl From<RegistryError> for CoreError {
    fn from(err: RegistryError) -> Self {
        CoreError::Registry(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_wraps_the_inner_error() {
        let err = CoreError::Resolve(ResolveError::NoHint);
        assert_eq!(err.to_string(), "resolve error: no type hint in scope");
    }

    #[test]
    fn from_resolve_error_converts() {
        let err: CoreError = ResolveError::UnknownFunction { name: "x".into() }.into();
        assert!(matches!(err, CoreError::Resolve(ResolveError::UnknownFunction { .. })));
    }
}
