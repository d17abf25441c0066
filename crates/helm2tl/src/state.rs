//! The state-plus-writer monad threading `(binds, vs, h)` through
//! translation (spec.md §4.3).
//!
//! `vs` (the variable mapping) and `h` (the heap) are TL expressions
//! denoting the *current* runtime values of those two threaded pieces of
//! state; `binds` accumulates the `let`-style bindings that must wrap the
//! eventual `[v, vs, h]` result tuple at the nearest finalize boundary
//! (spec.md §4.3 "Finalize").

use crate::bindgen::fresh_bind_name;
use crate::ir::{Binding, Expr};

/// A state fragment: accumulated binds plus the current `vs`/`h` pair.
/// "Linear-ish" per spec.md §3: binds only ever grow as fragments chain,
/// and evaluating the fragment is deferred to [`State::finalize`].
#[derive(Debug, Clone)]
pub struct State {
    binds: Vec<Binding>,
    vs: Expr,
    h: Expr,
}

impl State {
    /// Starts a fresh fragment with no binds at the given `vs`/`h`.
    pub fn new(vs: Expr, h: Expr) -> Self {
        Self { binds: Vec::new(), vs, h }
    }

    pub fn vs(&self) -> &Expr {
        &self.vs
    }

    pub fn h(&self) -> &Expr {
        &self.h
    }

    /// Appends `expr` as a fresh immutable bind and returns an identifier
    /// expression referring to it. Later binds and the final `vs`/`h` may
    /// reference any earlier bind in the same fragment.
    pub fn push_bind(&mut self, expr: Expr) -> Expr {
        let name = fresh_bind_name();
        self.binds.push(Binding { name: name.clone(), body: expr });
        Expr::ident(name)
    }

    /// Replaces the current `vs`.
    pub fn set_vs(&mut self, vs: Expr) {
        self.vs = vs;
    }

    /// Replaces the current `h`.
    pub fn set_h(&mut self, h: Expr) {
        self.h = h;
    }

    /// `S.Use(k)`: runs `k` against the current `(vs, h)`, producing a
    /// value and a continuation fragment. The combined fragment's binds
    /// are `self.binds ++ continuation.binds`; its `vs`/`h` become the
    /// continuation's.
    pub fn and_then<T, E>(
        mut self,
        k: impl FnOnce(&Expr, &Expr) -> Result<(T, Self), E>,
    ) -> Result<(T, Self), E> {
        let (value, mut continuation) = k(&self.vs, &self.h)?;
        self.binds.append(&mut continuation.binds);
        continuation.binds = self.binds;
        Ok((value, continuation))
    }

    /// Wraps `[v, vs, h]` in a single `Local` of every accumulated bind
    /// (spec.md §4.3 "Finalize"). When there are no binds, the tuple is
    /// returned unwrapped, since `local ; body` has no binding to attach
    /// and is not well-formed TL syntax.
    pub fn finalize(self, v: Expr) -> Expr {
        let tuple = Expr::List(vec![v, self.vs, self.h]);
        if self.binds.is_empty() {
            tuple
        } else {
            Expr::Local(self.binds, Box::new(tuple))
        }
    }
}

/// Emits `if isTrueOnHeap(h, cond) then <then> else <else>`, binds the
/// result tuple, and extracts `[v, vs, h]` back into `state`'s current
/// position. Both branches are independently finalized (each is a
/// self-contained `Local`), since at runtime only one of them executes.
/// Shared by `If`/`With` and the short-circuit `and`/`or` translation
/// (spec.md §4.4), which both follow this exact shape.
pub fn emit_conditional(
    cond: Expr,
    then_branch: (Expr, State),
    else_branch: (Expr, State),
    mut state: State,
) -> (Expr, State) {
    let (then_value, then_state) = then_branch;
    let (else_value, else_state) = else_branch;
    let truth = Expr::call_named("isTrueOnHeap", vec![state.h().clone(), cond]);
    let if_expr = Expr::If(
        Box::new(truth),
        Box::new(then_state.finalize(then_value)),
        Box::new(else_state.finalize(else_value)),
    );
    let r = state.push_bind(if_expr);
    let value = state.push_bind(Expr::Index(Box::new(r.clone()), Box::new(Expr::IntLiteral(0))));
    let new_vs = state.push_bind(Expr::Index(Box::new(r.clone()), Box::new(Expr::IntLiteral(1))));
    let new_h = state.push_bind(Expr::Index(Box::new(r), Box::new(Expr::IntLiteral(2))));
    state.set_vs(new_vs);
    state.set_h(new_h);
    (value, state)
}

/// Threads `state` through every item in `items`, calling `step` with the
/// current `(vs, h)` for each one and collecting the produced values
/// (spec.md §4.3 "Sequential helper" — used for pipeline command
/// argument lists and `List` node children).
pub fn thread_sequence<T, E>(
    mut state: State,
    items: &[T],
    mut step: impl FnMut(&T, &Expr, &Expr) -> Result<(Expr, State), E>,
) -> Result<(Vec<Expr>, State), E> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        let (value, next) = state.and_then(|vs, h| step(item, vs, h))?;
        values.push(value);
        state = next;
    }
    Ok((values, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindgen::with_reset_lock;

    #[test]
    fn push_bind_returns_identifier_and_accumulates() {
        with_reset_lock(|| {
            let mut state = State::new(Expr::ident("vs0"), Expr::ident("h0"));
            let r1 = state.push_bind(Expr::IntLiteral(1));
            let r2 = state.push_bind(r1.clone());
            assert_eq!(r1, Expr::ident("t1"));
            assert_eq!(r2, Expr::ident("t2"));
            let out = state.finalize(r2);
            assert_eq!(out.print(), "local t1=1, t2=t1; [t2, vs0, h0]");
        });
    }

    #[test]
    fn finalize_without_binds_skips_local_wrapper() {
        let state = State::new(Expr::ident("vs0"), Expr::ident("h0"));
        let out = state.finalize(Expr::string("x"));
        assert_eq!(out.print(), r#"["x", vs0, h0]"#);
    }

    #[test]
    fn and_then_chains_binds_and_updates_vs_h() {
        with_reset_lock(|| {
            let state = State::new(Expr::ident("vs0"), Expr::ident("h0"));
            let (value, state) = state
                .and_then(|vs, h| {
                    let mut next = State::new(vs.clone(), h.clone());
                    let bound = next.push_bind(Expr::IntLiteral(42));
                    Ok::<_, ()>((bound, next))
                })
                .unwrap();
            let out = state.finalize(value);
            assert_eq!(out.print(), "local t1=42; [t1, vs0, h0]");
        });
    }

    #[test]
    fn thread_sequence_collects_values_in_order() {
        let state = State::new(Expr::ident("vs0"), Expr::ident("h0"));
        let items = vec![1, 2, 3];
        let (values, state) = thread_sequence(state, &items, |item, vs, h| {
            Ok::<_, ()>((Expr::IntLiteral(*item), State::new(vs.clone(), h.clone())))
        })
        .unwrap();
        assert_eq!(values, vec![Expr::IntLiteral(1), Expr::IntLiteral(2), Expr::IntLiteral(3)]);
        let out = state.finalize(Expr::Null);
        assert_eq!(out.print(), "[null, vs0, h0]");
    }
}
