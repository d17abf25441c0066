//! Unique bind-name generation for the state monad's `local` bindings
//! (spec.md §5 "Shared-resource policy").
//!
//! This is process-wide state, matching the teacher crate's use of a
//! module-level `AtomicUsize` for counters that must be both cheap and
//! visible across call sites without being threaded through every
//! function signature. Production runs reset the counter at the start of
//! each top-level [`crate::chart::compile_chart`] call so bind names stay
//! stable across repeated compilations (spec.md §8 "Determinism").

use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(test)]
use std::sync::Mutex;

static NEXT_BIND: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh bind name (`t1`, `t2`, ...) and advances the counter.
pub fn fresh_bind_name() -> String {
    let n = NEXT_BIND.fetch_add(1, Ordering::Relaxed) + 1;
    format!("t{n}")
}

/// Resets the counter to zero. Exposed for test reproducibility and
/// called automatically by [`crate::chart::compile_chart`].
pub fn reset() {
    NEXT_BIND.store(0, Ordering::Relaxed);
}

/// Runs `f` after resetting the counter, holding a process-wide lock so
/// concurrently-run tests in this crate's test binary don't interleave
/// their bind-name sequences. Any test asserting on exact bind names
/// (`t1`, `t2`, ...) should go through this helper rather than calling
/// [`reset`] directly.
#[cfg(test)]
pub(crate) fn with_reset_lock<T>(f: impl FnOnce() -> T) -> T {
    static LOCK: Mutex<()> = Mutex::new(());
    let _guard = LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    reset();
    f()
}
