//! `diagnostics(file) → [Diagnostic]` (§4.G.1): drives the resolver across
//! every use in every block and turns parser/resolver failures into
//! `lsp_types::Diagnostic`s with the severities the spec assigns them.

use crate::position::to_range;
use crate::store::AnalyzedDocument;
use gotmpl_analysis::{check_call, resolve_block_type, resolve_field_path, resolve_fn, resolve_var, ArgValue, Block, FnUse, ResolveError};
use gotmpl_base::{CancellationToken, Document, Span};
use gotmpl_types::{lookup_builtin, BasicKind, TypeRef, TypeRegistry};
use lsp_types::{Diagnostic, DiagnosticSeverity};

pub fn diagnostics(doc: &AnalyzedDocument, registry: &TypeRegistry) -> Vec<Diagnostic> {
    diagnostics_cancellable(doc, registry, None).0
}

/// As [`diagnostics`], but polls `token` between items (§5: "between
/// diagnostics items") — here, between each block's worth of checks. On
/// cancellation the second element is `true` and the returned list holds
/// every diagnostic already produced, a consistent prefix rather than a
/// torn one.
pub fn diagnostics_cancellable(doc: &AnalyzedDocument, registry: &TypeRegistry, token: Option<&CancellationToken>) -> (Vec<Diagnostic>, bool) {
    let mut out = Vec::new();
    for err in &doc.parse_errors {
        out.push(plain(&doc.document, err.span, DiagnosticSeverity::ERROR, err.kind.to_string()));
    }
    for block in &doc.semantic.blocks {
        if let Some(token) = token {
            if token.is_cancelled() {
                return (out, true);
            }
        }
        block_diagnostics(doc, block, registry, &mut out);
    }
    (out, false)
}

fn plain(document: &Document, span: Span, severity: DiagnosticSeverity, message: String) -> Diagnostic {
    Diagnostic { range: to_range(document, span), severity: Some(severity), source: Some("gotmpl".to_string()), message, ..Default::default() }
}

fn block_diagnostics(doc: &AnalyzedDocument, block: &Block, registry: &TypeRegistry, out: &mut Vec<Diagnostic>) {
    // §4.G.1 lists a "Type: <display>" Information echo for a hinted block,
    // but seed scenarios 3/4 (spec §8) require the diagnostics list to be
    // empty resp. a single `FieldNotFound` for the same hinted inputs — an
    // unconditional echo would make both two diagnostics short of that. The
    // echo is dropped from this list entirely; a hint's presence is still
    // observable through `hover` without it being counted here.
    for dup in &block.duplicate_hints {
        out.push(plain(
            &doc.document,
            dup.span,
            DiagnosticSeverity::ERROR,
            format!("duplicate type hint {:?}; the block's type is already {:?}", dup.type_path, block.type_hint.as_ref().map(|h| h.type_path.as_str())),
        ));
    }

    for var in &block.variables {
        if var.is_declaration {
            continue;
        }
        match resolve_var(block, var, registry) {
            Ok(_) | Err(ResolveError::NoHint) => {}
            Err(err) => out.push(plain(&doc.document, var.span, DiagnosticSeverity::ERROR, err.to_string())),
        }
    }

    for func in &block.functions {
        match resolve_fn(func) {
            Err(err) => out.push(plain(&doc.document, func.span, DiagnosticSeverity::ERROR, err.to_string())),
            Ok(sig) => {
                let args = argument_types(block, func, registry);
                if let Err(err) = check_call(&sig, &args) {
                    out.push(plain(&doc.document, func.span, DiagnosticSeverity::ERROR, err.to_string()));
                }
            }
        }
    }

    for decl in &block.declarations {
        if block.declaration_is_unused(decl) {
            out.push(plain(&doc.document, decl.span, DiagnosticSeverity::WARNING, format!("${} is declared but never used", decl.name)));
        }
    }
}

/// Infers a type for every argument after the function name, prepending the
/// previous command's (unknown) result when this command isn't first in its
/// pipe (§4.D: "its first parameter slot is consumed by the previous
/// command's result"). `func.pipe_args` already holds exactly that
/// argument list, captured at analysis time (§3's `FnUse::pipe_args`).
fn argument_types(block: &Block, func: &FnUse, registry: &TypeRegistry) -> Vec<TypeRef> {
    let mut types: Vec<TypeRef> = func.pipe_args.iter().map(|arg| arg_value_type(block, arg, registry)).collect();
    if func.pipe_position > 0 {
        let mut with_piped_input = Vec::with_capacity(types.len() + 1);
        with_piped_input.push(TypeRef::Unknown);
        with_piped_input.append(&mut types);
        types = with_piped_input;
    }
    types
}

fn arg_value_type(block: &Block, arg: &ArgValue, registry: &TypeRegistry) -> TypeRef {
    match arg {
        ArgValue::Field(long_name) => field_chain_type(block, long_name, registry),
        ArgValue::Dot => resolve_block_type(block, registry).unwrap_or(TypeRef::Unknown),
        ArgValue::Variable(_) => TypeRef::Unknown,
        ArgValue::String(_) => TypeRef::Basic(BasicKind::String),
        ArgValue::Number(text) => number_type(text),
        ArgValue::Bool(_) => TypeRef::Basic(BasicKind::Bool),
        ArgValue::Nil => TypeRef::Unknown,
        ArgValue::Nested(head) => nested_head_type(block, head, registry),
        ArgValue::Identifier(_) => TypeRef::Unknown,
    }
}

fn field_chain_type(block: &Block, long_name: &str, registry: &TypeRegistry) -> TypeRef {
    let Ok(root) = resolve_block_type(block, registry) else { return TypeRef::Unknown };
    let segments: Vec<&str> = long_name.trim_start_matches('.').split('.').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return root;
    }
    resolve_field_path(&root, &segments).unwrap_or(TypeRef::Unknown)
}

fn number_type(text: &str) -> TypeRef {
    if text.contains('.') || text.to_ascii_lowercase().contains('e') {
        TypeRef::Basic(BasicKind::Float64)
    } else {
        TypeRef::Basic(BasicKind::Int)
    }
}

/// Best-effort result type of a parenthesised subexpression, used only to
/// feed the enclosing call's arity/type check — a narrower inference than
/// a full pipe evaluator would give, since `ArgValue::Nested` already
/// collapsed the subexpression down to its final command's head argument
/// during semantic analysis.
fn nested_head_type(block: &Block, head: &ArgValue, registry: &TypeRegistry) -> TypeRef {
    match head {
        ArgValue::Identifier(name) => lookup_builtin(name).and_then(|sig| sig.results.first().cloned()).unwrap_or(TypeRef::Unknown),
        ArgValue::Field(long_name) => field_chain_type(block, long_name, registry),
        ArgValue::Dot => resolve_block_type(block, registry).unwrap_or(TypeRef::Unknown),
        _ => TypeRef::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentStore;
    use gotmpl_types::Package;
    use std::collections::BTreeMap;

    fn person_registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        let mut fields = BTreeMap::new();
        fields.insert("Name".to_string(), TypeRef::Basic(BasicKind::String));
        reg.insert_package("demo", Package::new().with_type("Person", TypeRef::struct_of(fields, BTreeMap::new())));
        reg
    }

    #[test]
    fn parse_error_becomes_an_error_diagnostic() {
        let store = DocumentStore::new();
        let id = store.open("t", "Hello {{if}}");
        let doc = store.get(id).unwrap();
        let diags = diagnostics(&doc, &TypeRegistry::new());
        assert!(diags.iter().any(|d| d.severity == Some(DiagnosticSeverity::ERROR)));
    }

    /// Seed scenario 3 (spec §8): a well-typed hinted field produces no
    /// diagnostics at all — in particular, no "Type:" echo.
    #[test]
    fn seed_scenario_3_well_typed_hint_produces_no_diagnostics() {
        let store = DocumentStore::new();
        let id = store.open("t", "{{- /*gotype: demo.Person*/ -}}\n{{.Name}}");
        let doc = store.get(id).unwrap();
        let diags = diagnostics(&doc, &person_registry());
        assert!(diags.is_empty());
    }

    /// Seed scenario 4 (spec §8): the same template against a `demo.Person`
    /// lacking `Name` produces a single `FieldNotFound` diagnostic — still
    /// no "Type:" echo alongside it.
    #[test]
    fn seed_scenario_4_missing_field_produces_a_single_diagnostic() {
        let mut reg = TypeRegistry::new();
        reg.insert_package("demo", Package::new().with_type("Person", TypeRef::struct_of(BTreeMap::new(), BTreeMap::new())));
        let store = DocumentStore::new();
        let id = store.open("t", "{{- /*gotype: demo.Person*/ -}}\n{{.Name}}");
        let doc = store.get(id).unwrap();
        let diags = diagnostics(&doc, &reg);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("Name"));
    }

    #[test]
    fn unknown_field_becomes_an_error_diagnostic() {
        let store = DocumentStore::new();
        let id = store.open("t", "{{/*gotype: demo.Person*/}}{{.Nickname}}");
        let doc = store.get(id).unwrap();
        let diags = diagnostics(&doc, &person_registry());
        assert!(diags.iter().any(|d| d.severity == Some(DiagnosticSeverity::ERROR) && d.message.contains("Nickname")));
    }

    #[test]
    fn field_with_no_hint_produces_no_diagnostic() {
        let store = DocumentStore::new();
        let id = store.open("t", "{{.Name}}");
        let doc = store.get(id).unwrap();
        let diags = diagnostics(&doc, &TypeRegistry::new());
        assert!(diags.is_empty());
    }

    #[test]
    fn unused_declaration_is_a_warning() {
        let store = DocumentStore::new();
        let id = store.open("t", "{{$x := .Name}}{{.Name}}");
        let doc = store.get(id).unwrap();
        let diags = diagnostics(&doc, &person_registry());
        assert!(diags.iter().any(|d| d.severity == Some(DiagnosticSeverity::WARNING) && d.message.contains('x')));
    }

    #[test]
    fn unknown_function_is_an_error() {
        let store = DocumentStore::new();
        let id = store.open("t", "{{frobnicate .Name}}");
        let doc = store.get(id).unwrap();
        let diags = diagnostics(&doc, &person_registry());
        assert!(diags.iter().any(|d| d.message.contains("frobnicate")));
    }

    #[test]
    fn an_already_fired_token_stops_before_the_first_block() {
        let store = DocumentStore::new();
        let id = store.open("t", "{{/*gotype: demo.Person*/}}{{.Nickname}}");
        let doc = store.get(id).unwrap();
        let token = gotmpl_base::CancellationToken::new();
        token.cancel();
        let (diags, cancelled) = diagnostics_cancellable(&doc, &person_registry(), Some(&token));
        assert!(cancelled);
        // Parser errors (there are none here) would still precede the poll;
        // no block-derived diagnostic (the hint echo, the bad field) appears.
        assert!(diags.is_empty());
    }

    #[test]
    fn running_twice_on_identical_bytes_is_deterministic() {
        let store = DocumentStore::new();
        let id = store.open("t", "{{/*gotype: demo.Person*/}}{{.Nickname}}");
        let doc = store.get(id).unwrap();
        let reg = person_registry();
        let first = diagnostics(&doc, &reg);
        let second = diagnostics(&doc, &reg);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.message, b.message);
            assert_eq!(a.range, b.range);
        }
    }
}
