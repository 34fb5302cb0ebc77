//! Folds a parsed [`Ast`] into a [`SemanticFile`] of [`Block`]s.
//!
//! The analyser walks the tree exactly once, carrying the id of whichever
//! block is currently open. Entering a `Define`/`Block` node pushes a new
//! block onto that walk (closed again once its body is fully visited);
//! every other node contributes its field/variable/function uses to
//! whichever block is open when it's visited.

use crate::block::{ArgValue, Block, CommandUse, Declaration, FnUse, PipeUse, SemanticFile, TypeHint, VarUse};
use gotmpl_base::{CancellationToken, Span};
use gotmpl_syntax::ast::{ArgKind, Ast, NodeKind};
use gotmpl_syntax::NodeId;
use std::collections::HashSet;

/// Matches a comment body against `^gotype:\s*(\S+)\s*$` (§6, bit-exact).
/// Written by hand rather than pulled in via a regex crate — the grammar
/// is one keyword plus one non-whitespace token, well within what a
/// hand-rolled scan covers as directly as the lexer it sits beside.
fn parse_type_hint_body(body: &str) -> Option<&str> {
    let trimmed = body.trim();
    let rest = trimmed.strip_prefix("gotype:")?;
    let path = rest.trim();
    if path.is_empty() || path.contains(char::is_whitespace) {
        return None;
    }
    Some(path)
}

/// Converts one argument node to an owned [`ArgValue`], detached from the
/// AST it came from.
fn arg_to_value(ast: &Ast, arg_id: NodeId) -> ArgValue {
    match &ast.node(arg_id).kind {
        NodeKind::Arg(ArgKind::Field(parts)) => ArgValue::Field(format!(".{}", parts.join("."))),
        NodeKind::Arg(ArgKind::Variable(name)) => ArgValue::Variable(name.clone()),
        NodeKind::Arg(ArgKind::String(s)) => ArgValue::String(s.clone()),
        NodeKind::Arg(ArgKind::Number(n)) => ArgValue::Number(n.clone()),
        NodeKind::Arg(ArgKind::Bool(b)) => ArgValue::Bool(*b),
        NodeKind::Arg(ArgKind::Nil) => ArgValue::Nil,
        NodeKind::Arg(ArgKind::Dot) => ArgValue::Dot,
        NodeKind::Arg(ArgKind::Identifier(name)) => ArgValue::Identifier(name.clone()),
        NodeKind::Arg(ArgKind::Nested(pipe_id)) => ArgValue::Nested(Box::new(nested_head_value(ast, *pipe_id))),
        _ => ArgValue::Nil,
    }
}

/// The head argument of a parenthesised subexpression's last command — the
/// one slice of a nested pipe that feeds its enclosing call's type check.
fn nested_head_value(ast: &Ast, pipe_id: NodeId) -> ArgValue {
    let NodeKind::Pipe { cmds, .. } = &ast.node(pipe_id).kind else { return ArgValue::Nil };
    let Some(&last_cmd) = cmds.last() else { return ArgValue::Nil };
    let NodeKind::Command { args } = &ast.node(last_cmd).kind else { return ArgValue::Nil };
    let Some(&head) = args.first() else { return ArgValue::Nil };
    arg_to_value(ast, head)
}

/// Walks `ast` and returns every block it contains, root first.
pub fn analyze(ast: &Ast) -> SemanticFile {
    analyze_cancellable(ast, None)
}

/// As [`analyze`], but polls `token` at every block boundary (§5: after each
/// `define`/`block` finishes, before the next one starts). When the token
/// fires mid-walk, the walk stops at the next boundary rather than
/// mid-block, and the returned [`SemanticFile::cancelled`] is set — every
/// block present in the result was fully closed, never a partial one.
pub fn analyze_cancellable(ast: &Ast, token: Option<&CancellationToken>) -> SemanticFile {
    let mut file = SemanticFile::default();
    let root_span = ast.node(ast.root()).span;
    let mut walker = Walker { ast, file: &mut file, seen: HashSet::new(), token, cancelled: false };
    let mut root = Block::new("", root_span);
    walker.walk_nodes(ast.root_nodes(), &mut root);
    // The root block itself reflects only the nodes walked before any
    // cancellation boundary fired, so it's still pushed even when cancelled
    // partway through — it's a consistent prefix, not a torn struct.
    walker.file.blocks.push(root);
    file.cancelled = walker.cancelled;
    log::debug!("analyzed {} blocks from a {}-node tree (cancelled={})", file.blocks.len(), ast.len(), file.cancelled);
    file
}

struct Walker<'a> {
    ast: &'a Ast,
    file: &'a mut SemanticFile,
    /// `(text, offset)` pairs already recorded in the *current* block,
    /// reset per block per §4.E's `PositionsSeenMap`.
    seen: HashSet<(String, u32)>,
    token: Option<&'a CancellationToken>,
    cancelled: bool,
}

impl<'a> Walker<'a> {
    fn walk_nodes(&mut self, ids: &[NodeId], block: &mut Block) {
        for &id in ids {
            self.walk_node(id, block);
        }
    }

    fn walk_node(&mut self, id: NodeId, block: &mut Block) {
        if self.cancelled {
            return;
        }
        let span = self.ast.node(id).span;
        let kind = self.ast.node(id).kind.clone();
        match kind {
            NodeKind::Template { nodes } => self.walk_nodes(&nodes, block),
            NodeKind::Text { .. } => {}
            NodeKind::Comment { body } => self.record_comment(&body, span, block),
            NodeKind::Action { pipe } => self.walk_pipe(pipe, block),
            NodeKind::If { pipe, body, else_body, .. } => {
                self.walk_pipe(pipe, block);
                self.walk_nodes(&body, block);
                if let Some(else_body) = else_body {
                    self.walk_nodes(&else_body, block);
                }
            }
            NodeKind::Range { pipe, body, else_body, .. } => {
                self.walk_pipe(pipe, block);
                self.walk_nodes(&body, block);
                if let Some(else_body) = else_body {
                    self.walk_nodes(&else_body, block);
                }
            }
            NodeKind::With { pipe, body, else_body, .. } => {
                self.walk_pipe(pipe, block);
                self.walk_nodes(&body, block);
                if let Some(else_body) = else_body {
                    self.walk_nodes(&else_body, block);
                }
            }
            NodeKind::TemplateInvocation { pipe, .. } => {
                if let Some(pipe) = pipe {
                    self.walk_pipe(pipe, block);
                }
            }
            NodeKind::Define { name, body, .. } => self.walk_named_block(&name, span, &body, block),
            NodeKind::Block { name, pipe, body, .. } => {
                // `pipe` is the dot-rebinding argument (`{{block "name" .X}}`);
                // it's evaluated in the *enclosing* block's scope.
                self.walk_pipe(pipe, block);
                self.walk_named_block(&name, span, &body, block);
            }
            NodeKind::End => {}
            // Pipe/Command/Arg only ever appear reachable through `walk_pipe`.
            NodeKind::Pipe { .. } | NodeKind::Command { .. } | NodeKind::Arg(_) => {}
        }
    }

    /// `define`/`block` open a fresh block: its own `seen` set, its own
    /// hint, recursing into its body with a brand new [`Block`] that gets
    /// pushed onto `self.file` once closed.
    fn walk_named_block(&mut self, name: &str, span: Span, body: &[NodeId], parent: &mut Block) {
        let outer_seen = std::mem::take(&mut self.seen);
        let mut inner = Block::new(name, span);
        self.walk_nodes(body, &mut inner);
        self.file.blocks.push(inner);
        self.seen = outer_seen;
        let _ = parent; // named blocks don't contribute uses to their parent

        // Block boundary (§5): this is where the semantic analyser polls.
        if !self.cancelled {
            if let Some(token) = self.token {
                self.cancelled = token.is_cancelled();
            }
        }
    }

    fn record_comment(&mut self, body: &str, span: Span, block: &mut Block) {
        let Some(type_path) = parse_type_hint_body(body) else { return };
        let hint = TypeHint { type_path: type_path.to_string(), span };
        if block.type_hint.is_none() {
            block.type_hint = Some(hint);
        } else {
            block.duplicate_hints.push(hint);
        }
    }

    fn walk_pipe(&mut self, pipe_id: NodeId, block: &mut Block) {
        let (decls, cmds) = match &self.ast.node(pipe_id).kind {
            NodeKind::Pipe { decls, cmds } => (decls.clone(), cmds.clone()),
            _ => return,
        };
        let pipe_span = self.ast.node(pipe_id).span;

        for decl in &decls {
            block.declarations.push(Declaration { name: decl.name.clone(), span: decl.span });
            let scope = block.name.clone();
            self.record_var(VarUse { span: decl.span, long_name: decl.name.clone(), is_declaration: true, pipe_args: Vec::new(), scope }, block);
        }

        let mut commands = Vec::with_capacity(cmds.len());
        for (position, &cmd_id) in cmds.iter().enumerate() {
            let cmd_span = self.ast.node(cmd_id).span;
            commands.push(CommandUse { span: cmd_span, command: cmd_id, pipe_position: position });
            self.walk_command(cmd_id, position, block);
        }
        block.pipes.push(PipeUse { span: pipe_span, commands });
    }

    fn walk_command(&mut self, cmd_id: NodeId, pipe_position: usize, block: &mut Block) {
        let args = match &self.ast.node(cmd_id).kind {
            NodeKind::Command { args } => args.clone(),
            _ => return,
        };
        for (i, &arg_id) in args.iter().enumerate() {
            let span = self.ast.node(arg_id).span;
            let kind = self.ast.node(arg_id).kind.clone();
            // Every other argument in this same command, i.e. what feeds
            // (or is fed alongside) this one — §3's `pipe_args`.
            let pipe_args: Vec<ArgValue> =
                args.iter().enumerate().filter(|&(j, _)| j != i).map(|(_, &id)| arg_to_value(self.ast, id)).collect();
            match kind {
                // Only the first argument of a command names a function.
                NodeKind::Arg(ArgKind::Identifier(name)) if i == 0 => {
                    self.record_fn(FnUse { span, name, pipe_args, scope: block.name.clone(), pipe_position }, block);
                }
                _ => self.walk_arg(arg_id, block, pipe_args),
            }
        }
    }

    fn walk_arg(&mut self, arg_id: NodeId, block: &mut Block, pipe_args: Vec<ArgValue>) {
        let span = self.ast.node(arg_id).span;
        let kind = self.ast.node(arg_id).kind.clone();
        let scope = block.name.clone();
        match kind {
            NodeKind::Arg(ArgKind::Field(parts)) => {
                let long_name = format!(".{}", parts.join("."));
                self.record_var(VarUse { span, long_name, is_declaration: false, pipe_args, scope }, block);
            }
            NodeKind::Arg(ArgKind::Variable(name)) => {
                self.record_var(VarUse { span, long_name: name, is_declaration: false, pipe_args, scope }, block);
            }
            NodeKind::Arg(ArgKind::Nested(pipe_id)) => self.walk_pipe(pipe_id, block),
            _ => {}
        }
    }

    /// §4.E: each `(span.text, span.offset)` is recorded once per block.
    fn record_var(&mut self, var: VarUse, block: &mut Block) {
        if self.seen.insert((var.long_name.clone(), var.span.offset)) {
            block.variables.push(var);
        }
    }

    fn record_fn(&mut self, func: FnUse, block: &mut Block) {
        if self.seen.insert((func.name.clone(), func.span.offset)) {
            block.functions.push(func);
        }
    }
}
