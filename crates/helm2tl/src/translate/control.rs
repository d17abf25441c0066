//! `If`/`With`/`Range` translation (spec.md §4.4).
//!
//! All three share one shape: enter an outer scope, translate a
//! condition/iterable pipeline, translate one or two branches each in
//! their own nested scope, emit a single IR node that merges the
//! branches' `vs`/`h`, then rebuild the outgoing `vs` by overlaying only
//! the *propagated* (outer-scope) assignments onto the `vs` from before
//! the whole construct — so that names defined only inside a branch
//! never leak out, matching the scope analyzer's defined/assigned split
//! (spec.md §4.2).

use crate::ast::{Node, Pipe};
use crate::error::TranslateError;
use crate::ir::{Expr, MapEntry};
use crate::scope::Scope;
use crate::state::State;

use super::pipeline::{translate_pipe, translate_pipe_commands};
use super::{translate_node, TranslateCtx};

/// Builds the outgoing `vs` for a construct whose outer `scope.with_scope`
/// call returned `propagated`: the pre-construct `vs` overlaid with a
/// fresh entry per propagated name, read out of `final_vs` (spec.md §4.2
/// "Propagation at the IR level").
fn overlay_propagated(original_vs: Expr, final_vs: Expr, propagated: &[String], state: &mut State) -> Expr {
    if propagated.is_empty() {
        return original_vs;
    }
    let entries = propagated
        .iter()
        .map(|name| MapEntry {
            key: Expr::string(name),
            value: Expr::Index(Box::new(final_vs.clone()), Box::new(Expr::string(name))),
        })
        .collect();
    let merged = Expr::Add(Box::new(original_vs), Box::new(Expr::MapLiteral(entries)));
    state.push_bind(merged)
}

/// Translates `node` (or the empty-string/identity default) as a
/// branch arm in its own nested scope, returning its finalized form.
fn translate_branch_finalized(
    node: Option<&Node>,
    outer_scope: &mut Scope,
    vs: &Expr,
    h: &Expr,
    ctx: &TranslateCtx,
) -> Result<Expr, TranslateError> {
    match node {
        Some(node) => {
            let ((value, state), _) = outer_scope
                .with_scope(|inner| translate_node(node, inner, State::new(vs.clone(), h.clone()), ctx))?;
            Ok(state.finalize(value))
        }
        None => Ok(State::new(vs.clone(), h.clone()).finalize(Expr::string(""))),
    }
}

pub fn translate_if_with(
    is_with: bool,
    cond: &Pipe,
    then_node: &Node,
    else_node: Option<&Node>,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    let original_vs = state.vs().clone();

    let ((value, mut state), propagated) = scope.with_scope(|outer| {
        let (cond_expr, mut state1) = translate_pipe(cond, outer, state, ctx)?;
        if is_with {
            outer.define_variable("$")?;
            let new_vs = Expr::Add(
                Box::new(state1.vs().clone()),
                Box::new(Expr::MapLiteral(vec![MapEntry { key: Expr::string("$"), value: cond_expr.clone() }])),
            );
            let bound = state1.push_bind(new_vs);
            state1.set_vs(bound);
        }

        let vs_before_branches = state1.vs().clone();
        let h_before_branches = state1.h().clone();

        let then_expr = translate_branch_finalized(Some(then_node), outer, &vs_before_branches, &h_before_branches, ctx)?;
        let else_expr = translate_branch_finalized(else_node, outer, &vs_before_branches, &h_before_branches, ctx)?;

        let truth = Expr::call_named("isTrueOnHeap", vec![h_before_branches, cond_expr]);
        let if_expr = Expr::If(Box::new(truth), Box::new(then_expr), Box::new(else_expr));
        let r = state1.push_bind(if_expr);
        let value = state1.push_bind(Expr::Index(Box::new(r.clone()), Box::new(Expr::IntLiteral(0))));
        let child_vs = state1.push_bind(Expr::Index(Box::new(r.clone()), Box::new(Expr::IntLiteral(1))));
        let child_h = state1.push_bind(Expr::Index(Box::new(r), Box::new(Expr::IntLiteral(2))));
        state1.set_vs(child_vs);
        state1.set_h(child_h);
        Ok::<_, TranslateError>((value, state1))
    })?;

    let final_vs = state.vs().clone();
    let new_vs = overlay_propagated(original_vs, final_vs, &propagated, &mut state);
    state.set_vs(new_vs);
    Ok((value, state))
}

pub fn translate_range(
    pipe: &Pipe,
    body: &Node,
    else_node: Option<&Node>,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    if pipe.declarations.len() > 2 {
        return Err(TranslateError::TooManyRangeDecls { count: pipe.declarations.len() });
    }
    let original_vs = state.vs().clone();

    let ((value, mut state), propagated) = scope.with_scope(|outer| {
        let (it_expr, mut state1) = translate_pipe_commands(&pipe.commands, outer, state, ctx)?;
        let vs_before = state1.vs().clone();
        let h_before = state1.h().clone();

        let body_thunk = build_body_thunk(pipe, body, outer, ctx)?;
        let else_thunk_expr = translate_branch_finalized(else_node, outer, &vs_before, &h_before, ctx)?;
        let else_thunk = Expr::Function(Vec::new(), Box::new(else_thunk_expr));

        let call = Expr::call_named("range", vec![vs_before, h_before, it_expr, body_thunk, else_thunk]);
        let r = state1.push_bind(call);
        let value = state1.push_bind(Expr::Index(Box::new(r.clone()), Box::new(Expr::IntLiteral(0))));
        let new_vs = state1.push_bind(Expr::Index(Box::new(r.clone()), Box::new(Expr::IntLiteral(1))));
        let new_h = state1.push_bind(Expr::Index(Box::new(r), Box::new(Expr::IntLiteral(2))));
        state1.set_vs(new_vs);
        state1.set_h(new_h);
        Ok::<_, TranslateError>((value, state1))
    })?;

    let final_vs = state.vs().clone();
    let new_vs = overlay_propagated(original_vs, final_vs, &propagated, &mut state);
    state.set_vs(new_vs);
    Ok((value, state))
}

/// Builds `bodyThunk = Function(vs, h, i, dot) finalize(bodyV under bodyState)`
/// (spec.md §4.4 "Range" step 5). Runs in its own nested scope so loop
/// variables and `$` don't leak past the loop; assignments to outer
/// variables still propagate through `outer_scope`'s own with_scope exit.
fn build_body_thunk(pipe: &Pipe, body: &Node, outer_scope: &mut Scope, ctx: &TranslateCtx) -> Result<Expr, TranslateError> {
    let mut vs_entries = vec![MapEntry { key: Expr::string("$"), value: Expr::ident("dot") }];
    match pipe.declarations.as_slice() {
        [] => {}
        [value_var] => vs_entries.push(MapEntry { key: Expr::string(&value_var.0), value: Expr::ident("dot") }),
        [index_var, value_var] => {
            vs_entries.push(MapEntry { key: Expr::string(&index_var.0), value: Expr::ident("i") });
            vs_entries.push(MapEntry { key: Expr::string(&value_var.0), value: Expr::ident("dot") });
        }
        _ => unreachable!("range declaration cardinality already checked"),
    }
    let body_vs_expr = Expr::Add(Box::new(Expr::ident("vs")), Box::new(Expr::MapLiteral(vs_entries)));

    let ((value, body_state), _) = outer_scope.with_scope(|inner| {
        inner.define_variable("$")?;
        for var in &pipe.declarations {
            inner.define_variable(&var.0)?;
        }
        let mut body_state = State::new(Expr::Null, Expr::ident("h"));
        let bound_vs = body_state.push_bind(body_vs_expr);
        body_state.set_vs(bound_vs);
        translate_node(body, inner, body_state, ctx)
    })?;

    let finalized = body_state.finalize(value);
    Ok(Expr::Function(vec!["vs".into(), "h".into(), "i".into(), "dot".into()], Box::new(finalized)))
}
