//! `hover(file, offset) → Hover?` (§4.G.2): finds the innermost use under
//! the cursor and renders markdown describing it.

use crate::position::to_range;
use crate::store::AnalyzedDocument;
use gotmpl_analysis::{resolve_block_type, resolve_field_path, resolve_fn, resolve_var, Block, FnUse, VarUse};
use gotmpl_base::Span;
use gotmpl_types::{Signature, TypeRef, TypeRegistry};
use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind};

pub fn hover(doc: &AnalyzedDocument, offset: u32, registry: &TypeRegistry) -> Option<Hover> {
    let block = doc.semantic.block_at(offset);
    let (content, span) = function_hover(block, offset).or_else(|| variable_hover(block, offset, registry))?;
    Some(Hover { contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value: content }), range: Some(to_range(&doc.document, span)) })
}

fn function_hover(block: &Block, offset: u32) -> Option<(String, Span)> {
    let func = innermost(&block.functions, offset, |f: &FnUse| f.span)?;
    let content = match resolve_fn(func) {
        Ok(sig) => format!("```\nfunc {}({}) {}\n```\n\n{}", func.name, join_types(&sig.params), join_types(&sig.results), pipeline_diagram(&func.name, &sig)),
        Err(err) => format!("**{}**\n\n_{}_", func.name, err),
    };
    Some((content, func.span))
}

fn variable_hover(block: &Block, offset: u32, registry: &TypeRegistry) -> Option<(String, Span)> {
    let var = innermost(&block.variables, offset, |v: &VarUse| v.span)?;
    let chain = owner_chain(block, var, registry);
    let content = match resolve_var(block, var, registry) {
        Ok(ty) => format!("{chain}```\n{} {}\n```", var.long_name, ty.display_name()),
        Err(err) => format!("{chain}**{}**\n\n_{}_", var.long_name, err),
    };
    Some((content, var.span))
}

/// Renders the struct types walked en route to `var`'s field/method — the
/// block's declared hint, then the type reached after each intermediate
/// segment — ahead of the field/method declaration line (§4.G.2: "shows
/// the enclosing struct chain and the field/method declaration"). Empty
/// when the block has no hint, since there's no chain to show.
fn owner_chain(block: &Block, var: &VarUse, registry: &TypeRegistry) -> String {
    let Some(hint) = &block.type_hint else { return String::new() };
    let mut chain = vec![hint.type_path.clone()];
    if let Ok(root) = resolve_block_type(block, registry) {
        let segments = var.field_segments();
        let mut current = root;
        // Every segment but the last is an intermediate struct the chain
        // descends through on its way to the field/method itself, which
        // the declaration line below already names.
        for &segment in segments.iter().take(segments.len().saturating_sub(1)) {
            match resolve_field_path(&current, &[segment]) {
                Ok(next) => {
                    chain.push(format!(".{segment} {}", next.display_name()));
                    current = next;
                }
                Err(_) => break,
            }
        }
    }
    format!("{}\n\n", chain.join(" → "))
}

/// The use whose span both overlaps `offset` and is narrowest — the same
/// "most specific wins" rule [`gotmpl_analysis::SemanticFile::block_at`]
/// applies to blocks.
fn innermost<'a, T>(items: &'a [T], offset: u32, span_of: impl Fn(&T) -> Span) -> Option<&'a T> {
    items.iter().filter(|item| span_of(item).contains_offset(offset)).min_by_key(|item| span_of(item).length)
}

fn join_types(types: &[TypeRef]) -> String {
    types.iter().map(TypeRef::display_name).collect::<Vec<_>>().join(", ")
}

/// Renders the "inputs → ▼ name → outputs" chain visualisation (§4.G.2).
fn pipeline_diagram(name: &str, sig: &Signature) -> String {
    let inputs = if sig.params.is_empty() { "(none)".to_string() } else { join_types(&sig.params) };
    let outputs = if sig.results.is_empty() { "(none)".to_string() } else { join_types(&sig.results) };
    format!("{inputs}\n\n▼ {name}\n\n{outputs}")
}
