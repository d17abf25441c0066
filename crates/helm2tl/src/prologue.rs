//! The fixed runtime prologue (spec.md §6 "Runtime prologue").
//!
//! Kept as a standalone `.tl` file rather than a Rust string literal so
//! it can be read and edited as what it is: TL source, not Rust.

/// TL source text prepended to every compiled chart's root expression.
/// Ends mid-`local`-chain with no trailing body; the root expression
/// the chart driver appends becomes this chain's final body.
pub const PROLOGUE_SOURCE: &str = include_str!("../prologue.tl");
