//! Lexical scope analysis (spec.md §4.2).
//!
//! A stack of frames, linked by parent, tracking for each variable name in
//! the current frame whether it was *defined* (`:=`) or merely *assigned*
//! (`=`, resolving to an outer frame). [`Scope::with_scope`] is the
//! propagation helper: assignments made inside a child frame become
//! assignments in the parent once the child exits, which is how `if`/
//! `with`/`range` bodies make their side effects visible afterward.

use std::collections::HashMap;

use crate::error::ScopeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    defined: bool,
}

#[derive(Debug, Default)]
struct Frame {
    vars: HashMap<String, Binding>,
}

/// A stack of lexical frames. The root frame (index 0) always exists and
/// has no parent; `$` and template-level declarations live there.
#[derive(Debug)]
pub struct Scope {
    frames: Vec<Frame>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    fn current(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("scope stack is never empty")
    }

    /// `defineVariable(name)`: fails if `name` is already present in the
    /// current frame.
    pub fn define_variable(&mut self, name: &str) -> Result<(), ScopeError> {
        if self.current().vars.contains_key(name) {
            return Err(ScopeError::Redefinition { name: name.to_owned() });
        }
        self.current().vars.insert(name.to_owned(), Binding { defined: true });
        Ok(())
    }

    /// `assignVariable(name)`: no-op if already present in the current
    /// frame; otherwise walks parents and fails if no frame defines it.
    pub fn assign_variable(&mut self, name: &str) -> Result<(), ScopeError> {
        if self.current().vars.contains_key(name) {
            return Ok(());
        }
        if !self.resolves_in_ancestors(name) {
            return Err(ScopeError::Undefined { name: name.to_owned() });
        }
        self.current().vars.insert(name.to_owned(), Binding { defined: false });
        Ok(())
    }

    /// `getVariable(name)`: a linear walk up parents; fails if nothing
    /// resolves.
    pub fn get_variable(&self, name: &str) -> Result<(), ScopeError> {
        if self.resolves(name) {
            Ok(())
        } else {
            Err(ScopeError::Undefined { name: name.to_owned() })
        }
    }

    fn resolves(&self, name: &str) -> bool {
        self.frames.iter().rev().any(|f| f.vars.contains_key(name))
    }

    fn resolves_in_ancestors(&self, name: &str) -> bool {
        // Skip the current (innermost) frame — we already know it doesn't
        // contain `name` when this is called from `assign_variable`.
        self.frames.iter().rev().skip(1).any(|f| f.vars.contains_key(name))
    }

    /// `withScope`: pushes a new child frame, runs `inner`, then
    /// propagates every `defined:false` entry left in the child frame out
    /// to the parent as an assignment, before popping the child.
    ///
    /// Returns whatever `inner` returns, plus the list of propagated
    /// names so the caller can merge the corresponding runtime `vs`
    /// entries (spec.md §4.2 "Propagation at the IR level").
    ///
    /// Generic over the error type so translation code (whose failures
    /// span far more than scope errors) can propagate its own error type
    /// directly, as long as it carries a `From<ScopeError>` conversion
    /// (every error enum in this crate does — see `error.rs`).
    pub fn with_scope<T, E: From<ScopeError>>(
        &mut self,
        inner: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<(T, Vec<String>), E> {
        self.frames.push(Frame::default());
        let result = inner(self);
        let child = self.frames.pop().expect("frame was just pushed");
        let result = result?;

        let propagated: Vec<String> = child
            .vars
            .into_iter()
            .filter(|(_, binding)| !binding.defined)
            .map(|(name, _)| name)
            .collect();
        for name in &propagated {
            self.assign_variable(name)?;
        }
        Ok((result, propagated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_redefine_fails() {
        let mut scope = Scope::new();
        scope.define_variable("x").unwrap();
        assert_eq!(
            scope.define_variable("x"),
            Err(ScopeError::Redefinition { name: "x".into() })
        );
    }

    #[test]
    fn assign_without_outer_definition_fails() {
        let mut scope = Scope::new();
        assert_eq!(
            scope.assign_variable("y"),
            Err(ScopeError::Undefined { name: "y".into() })
        );
    }

    #[test]
    fn assign_resolving_to_outer_frame_succeeds_and_does_not_redefine() {
        let mut scope = Scope::new();
        scope.define_variable("x").unwrap();
        let (_, propagated) = scope
            .with_scope(|s| {
                s.assign_variable("x")?;
                Ok(())
            })
            .unwrap();
        assert_eq!(propagated, vec!["x".to_owned()]);
        // Propagated back into the parent frame; x still resolves.
        assert!(scope.get_variable("x").is_ok());
    }

    #[test]
    fn variables_defined_only_inside_a_scope_do_not_propagate() {
        let mut scope = Scope::new();
        let (_, propagated) = scope
            .with_scope(|s| {
                s.define_variable("local_only")?;
                Ok(())
            })
            .unwrap();
        assert!(propagated.is_empty());
        assert!(scope.get_variable("local_only").is_err());
    }

    #[test]
    fn nested_scope_propagates_through_two_levels() {
        let mut scope = Scope::new();
        scope.define_variable("x").unwrap();
        scope
            .with_scope(|outer| {
                let (_, inner_propagated) = outer.with_scope(|inner| {
                    inner.assign_variable("x")?;
                    Ok(())
                })?;
                assert_eq!(inner_propagated, vec!["x".to_owned()]);
                Ok(())
            })
            .unwrap();
        assert!(scope.get_variable("x").is_ok());
    }
}
