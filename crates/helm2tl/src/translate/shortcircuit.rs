//! Lazy `and`/`or` translation (spec.md §4.4 "Short-circuit `and`/`or`").
//!
//! Go templates' `and`/`or` return the first falsy/truthy argument
//! (not a boolean), and evaluate arguments left to right, stopping as
//! soon as the result is known. Unlike an ordinary built-in call, whose
//! arguments are all translated up front (`build_args` in
//! [`super::pipeline`]), each argument here is compiled into its own
//! branch of a nested `If`, so the generated TL mirrors the short-circuit
//! control flow instead of unconditionally threading every argument's
//! side effects first.

use crate::ast::Arg;
use crate::error::TranslateError;
use crate::ir::Expr;
use crate::scope::Scope;
use crate::state::{emit_conditional, State};

use super::pipeline::translate_expr_fragment;
use super::TranslateCtx;

/// One item in the lazy chain: either a raw argument still needing
/// translation, or an already-evaluated value (the piped-in prior
/// command's result, which was necessarily evaluated unconditionally
/// before this command was ever reached).
enum Item<'a> {
    Raw(&'a Arg),
    Ready(Expr),
}

pub fn translate_and_or(
    name: &str,
    explicit_args: &[Arg],
    prior: Option<Expr>,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    let mut items: Vec<Item> = explicit_args.iter().map(Item::Raw).collect();
    if let Some(p) = prior {
        items.push(Item::Ready(p));
    }
    if items.is_empty() {
        return Err(TranslateError::EmptyPipelineCommands);
    }
    translate_chain(name, &items, 0, scope, state, ctx)
}

fn translate_chain(
    name: &str,
    items: &[Item],
    idx: usize,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    let (value, arm_state) = match &items[idx] {
        Item::Raw(arg) => scope.with_scope(|inner| translate_expr_fragment(arg, inner, state, ctx))?.0,
        Item::Ready(expr) => (expr.clone(), state),
    };

    if idx + 1 == items.len() {
        return Ok((value, arm_state));
    }

    let next_state = State::new(arm_state.vs().clone(), arm_state.h().clone());
    let (rest_value, rest_state) =
        scope.with_scope(|inner| translate_chain(name, items, idx + 1, inner, next_state, ctx))?.0;

    // The branch that returns the pivot bare needs no binds of its own —
    // `value` is already a bound identifier once `arm_state`'s binds are
    // threaded into the combining state below, visible from inside the
    // `If`'s nested branch scope.
    let pivot_branch_state = State::new(arm_state.vs().clone(), arm_state.h().clone());
    let (then_branch, else_branch) = if name == "and" {
        ((rest_value, rest_state), (value.clone(), pivot_branch_state))
    } else {
        ((value.clone(), pivot_branch_state), (rest_value, rest_state))
    };
    // Carry `arm_state`'s binds forward (not a fresh zero-bind state) so
    // the `If`'s condition can reference the pivot's bind names, the way
    // `control::translate_if_with` keeps the condition's binds alive in
    // `state1` across the whole construct (spec.md §4.4).
    Ok(emit_conditional(value, then_branch, else_branch, arm_state))
}
