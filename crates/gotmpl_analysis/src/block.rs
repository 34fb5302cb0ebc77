//! The semantic model: [`Block`] and the uses it collects.
//!
//! A [`Block`] is the unit the resolver operates over — one per
//! `define`/`block`, plus a synthetic root covering everything outside such
//! sections. Unlike the AST, a block flattens its contents into lookup
//! lists (`variables`, `functions`, `pipes`) so the query layer never has
//! to re-walk the tree to answer a hover or diagnostics request.

use gotmpl_base::Span;
use gotmpl_syntax::NodeId;

/// A `gotype:` comment bound to the enclosing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHint {
    /// The `<import-path>.<TypeName>` capture, e.g. `"demo.Person"`.
    pub type_path: String,
    pub span: Span,
}

/// An argument value captured independently of the AST, so a [`VarUse`] or
/// [`FnUse`]'s sibling arguments survive without the query layer re-walking
/// `NodeId`s back into the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// A dotted field path, leading-dot form (`".User.Name"`).
    Field(String),
    /// A `$`-prefixed variable reference, sigil stripped.
    Variable(String),
    String(String),
    /// Kept as source text; callers parse magnitude only where needed.
    Number(String),
    Bool(bool),
    Nil,
    /// A bare `.`.
    Dot,
    /// A bare identifier in function position.
    Identifier(String),
    /// A parenthesised subexpression, collapsed to its last command's head
    /// argument — the same under-approximation the query layer's
    /// nested-pipe type inference already uses, rather than a fully
    /// recursive pipe structure.
    Nested(Box<ArgValue>),
}

/// A dotted field path or `$variable` reference found in argument position.
///
/// `long_name` carries the leading `.` for field paths (`".User.Name"`) and
/// omits the sigil for variables (`"x"`), so [`VarUse::is_field`] can tell
/// the two apart without a separate discriminant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarUse {
    pub span: Span,
    pub long_name: String,
    /// `true` for the `$x` in `$x := …`; `false` for every later reference.
    pub is_declaration: bool,
    /// This use's sibling arguments in the same command invocation (empty
    /// for a declaration site, or a use with no siblings).
    pub pipe_args: Vec<ArgValue>,
    /// Name of the enclosing block (`""` for the root).
    pub scope: String,
}

impl VarUse {
    pub fn is_field(&self) -> bool {
        self.long_name.starts_with('.')
    }

    /// The final dotted segment (for a field) or the bare variable name.
    pub fn name(&self) -> &str {
        self.long_name.rsplit('.').next().unwrap_or(&self.long_name)
    }

    /// Field segments with the leading dot stripped, e.g. `["User", "Name"]`.
    /// Empty for a `$variable` use.
    pub fn field_segments(&self) -> Vec<&str> {
        if !self.is_field() {
            return Vec::new();
        }
        self.long_name.trim_start_matches('.').split('.').collect()
    }
}

/// A bare identifier used in a command's function position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnUse {
    pub span: Span,
    pub name: String,
    /// The command's other arguments (everything but the function name
    /// itself), captured at analysis time so the query layer can check
    /// arity/types without re-walking the AST by `NodeId`.
    pub pipe_args: Vec<ArgValue>,
    /// Name of the enclosing block (`""` for the root).
    pub scope: String,
    /// Index of this command within its enclosing pipe's `cmds` list.
    /// Position 0 takes only its own explicit arguments; position > 0
    /// implicitly receives the previous command's result as argument 0.
    pub pipe_position: usize,
}

/// One command in a pipe chain, kept for the query layer's "chain
/// visualisation" (hover shows inputs → ▼ function name → outputs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandUse {
    pub span: Span,
    pub command: NodeId,
    pub pipe_position: usize,
}

/// An entire `{{ … }}` pipe, as an ordered list of its chained commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeUse {
    pub span: Span,
    pub commands: Vec<CommandUse>,
}

/// A `$x := …` declaration site, tracked separately from [`VarUse`] so the
/// query layer can flag one that's never referenced again in its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub span: Span,
}

/// One semantic unit: the anonymous root, or a named `define`/`block`.
///
/// The root block's name is `""` and its span covers the whole file; it
/// does **not** inherit a hint from an enclosing scope because there is
/// none to inherit from — every named block starts with no hint of its
/// own regardless of what the root declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub span: Span,
    pub type_hint: Option<TypeHint>,
    /// Every `gotype:` comment found in the block after the first, each
    /// reported as a `DuplicateTypeHint` by the query layer.
    pub duplicate_hints: Vec<TypeHint>,
    pub variables: Vec<VarUse>,
    pub functions: Vec<FnUse>,
    pub pipes: Vec<PipeUse>,
    pub declarations: Vec<Declaration>,
}

impl Block {
    pub(crate) fn new(name: impl Into<String>, span: Span) -> Self {
        Block {
            name: name.into(),
            span,
            type_hint: None,
            duplicate_hints: Vec::new(),
            variables: Vec::new(),
            functions: Vec::new(),
            pipes: Vec::new(),
            declarations: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// `true` if `name` has a declaration in this block with no later
    /// [`VarUse`] referencing it — the "unused variable" warning condition.
    pub fn declaration_is_unused(&self, decl: &Declaration) -> bool {
        !self
            .variables
            .iter()
            .any(|v| !v.is_declaration && !v.is_field() && v.long_name == decl.name)
    }
}

/// A complete analysed file: every block the semantic analyser found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SemanticFile {
    pub blocks: Vec<Block>,
    /// Set when [`crate::semantic::analyze_cancellable`] was asked to stop
    /// partway through (§5): `blocks` still holds every block closed before
    /// the cancellation was observed, never a torn one.
    pub cancelled: bool,
}

impl SemanticFile {
    /// The anonymous root block, always present.
    pub fn root(&self) -> &Block {
        self.blocks.iter().find(|b| b.is_root()).expect("semantic analysis always produces a root block")
    }

    pub fn block_named(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// The innermost block whose span contains `offset` — prefers the most
    /// specific (smallest, i.e. most deeply nested `define`/`block`) match.
    pub fn block_at(&self, offset: u32) -> &Block {
        self.blocks
            .iter()
            .filter(|b| b.span.contains_offset(offset))
            .min_by_key(|b| b.span.length)
            .unwrap_or_else(|| self.root())
    }
}
