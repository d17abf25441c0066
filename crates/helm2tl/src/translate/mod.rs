//! Node translator entry points (spec.md §4.4).
//!
//! This module dispatches on [`crate::ast::Node`] and delegates the
//! heavier pipeline/command and control-flow logic to its siblings:
//! [`pipeline`] (command chains, field access, function dispatch),
//! [`control`] (`If`/`With`/`Range`), and [`shortcircuit`] (`and`/`or`).

pub mod control;
pub mod pipeline;
pub mod shortcircuit;

use std::collections::HashSet;

use crate::ast::Node;
use crate::error::TranslateError;
use crate::ir::Expr;
use crate::scope::Scope;
use crate::state::{thread_sequence, State};

pub(crate) use pipeline::read_dot;

/// Context shared read-only across one chart's translation: which
/// template names exist, so `Template` invocation and later lookups can
/// fail with [`TranslateError::TemplateNotFound`] instead of producing a
/// dangling reference into the compiled `$` map (spec.md §4.4 "Template
/// invocation").
pub struct TranslateCtx<'a> {
    pub template_names: &'a HashSet<String>,
}

/// Translates one AST node, returning its printed value and the
/// continuation state fragment (spec.md §4.3, §4.4).
pub fn translate_node(
    node: &Node,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    match node {
        Node::Text(bytes) => Ok((Expr::StringLiteral(bytes.clone()), state)),

        Node::Action(pipe) => {
            let (value, state) = pipeline::translate_pipe(pipe, scope, state, ctx)?;
            let printed = if pipe.declarations.is_empty() { value } else { Expr::string("") };
            Ok((printed, state))
        }

        Node::If(cond, then_node, else_node) => {
            control::translate_if_with(false, cond, then_node, else_node.as_deref(), scope, state, ctx)
        }

        Node::With(cond, then_node, else_node) => {
            control::translate_if_with(true, cond, then_node, else_node.as_deref(), scope, state, ctx)
        }

        Node::Range(pipe, body, else_node) => {
            control::translate_range(pipe, body, else_node.as_deref(), scope, state, ctx)
        }

        Node::List(items) => translate_node_list(items, scope, state, ctx),

        Node::Template(name, pipe) => translate_template_invocation(name, pipe, scope, state, ctx),

        Node::Comment(_) | Node::Break | Node::Continue => {
            Err(TranslateError::UnsupportedNode { kind: node.kind_name() })
        }
    }
}

/// Translates a sequence of nodes and concatenates their printed values
/// via the prologue's `_join(h, list)` (spec.md §4.4 "List (sequence of
/// nodes)"), matching a template's sequential-output-concatenation
/// semantics. A node's printed value may be a heap pointer or a
/// non-string scalar rather than a plain string (spec.md §4.4 "a printed
/// value may be temporarily a non-string to be stringified upon
/// concatenation"); `_join` dereferences and stringifies each item
/// through `stringOf` before joining, so `Expr::Add` (plain string
/// concatenation) would be wrong here.
fn translate_node_list(
    items: &[Node],
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    let (values, mut state) = thread_sequence(state, items, |node, vs, h| {
        translate_node(node, &mut *scope, State::new(vs.clone(), h.clone()), ctx)
    })?;
    let call = Expr::call_named("_join", vec![state.h().clone(), Expr::List(values)]);
    let joined = state.push_bind(call);
    Ok((joined, state))
}

/// `{{template "name" pipeline}}` (spec.md §4.4 "Template invocation").
fn translate_template_invocation(
    name: &str,
    pipe: &crate::ast::Pipe,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    if !ctx.template_names.contains(name) {
        return Err(TranslateError::TemplateNotFound { name: name.to_owned() });
    }
    let (pipeline_value, mut state) = pipeline::translate_pipe(pipe, scope, state, ctx)?;
    let templates = Expr::ident("$");
    let call = Expr::call(Expr::Index(Box::new(templates), Box::new(Expr::string(name))), vec![
        state.h().clone(),
        pipeline_value,
    ]);
    let r = state.push_bind(call);
    let value = state.push_bind(Expr::Index(Box::new(r.clone()), Box::new(Expr::IntLiteral(0))));
    // The callee template is wrapped by `compile_template` below, which
    // finalizes its body as `[v, vs, h]` — the heap is at index 2, not 1
    // (index 1 is the callee's own `vs`, which doesn't propagate back).
    let new_h = state.push_bind(Expr::Index(Box::new(r), Box::new(Expr::IntLiteral(2))));
    state.set_h(new_h);
    Ok((value, state))
}

/// Per-template wrapping (spec.md §4.4 "Per-template wrapping"): compiles
/// one template body into `function(h, dot) local vs = {"$": dot}; <finalized body>`.
pub fn compile_template(body: &Node, ctx: &TranslateCtx) -> Result<Expr, TranslateError> {
    let mut scope = Scope::new();
    scope.define_variable("$")?;
    let mut state = State::new(Expr::Null, Expr::ident("h"));
    let initial_vs = state.push_bind(Expr::MapLiteral(vec![crate::ir::MapEntry {
        key: Expr::string("$"),
        value: Expr::ident("dot"),
    }]));
    state.set_vs(initial_vs);
    let (value, state) = translate_node(body, &mut scope, state, ctx)?;
    let finalized = state.finalize(value);
    Ok(Expr::Function(vec!["h".into(), "dot".into()], Box::new(finalized)))
}
