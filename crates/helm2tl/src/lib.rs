//! Compiles Helm chart templates into a single self-contained TL
//! (Jsonnet-style) program (spec.md §1 "Purpose & Scope").
//!
//! The public surface is deliberately small: construct a [`chart::Chart`]
//! tree (by hand, or via [`loader::FsChartLoader`] plus a
//! [`loader::TemplateParser`]), then call [`compile_chart`]. This crate
//! never prints or logs; callers decide how to surface a
//! [`error::CompileError`].

pub mod ast;
pub mod bindgen;
pub mod builtins;
pub mod chart;
pub mod error;
pub mod heap_encode;
pub mod ir;
pub mod loader;
pub mod prologue;
pub mod scope;
pub mod state;
pub mod translate;

pub use chart::{Chart, CompileOptions, RootChart};
pub use error::CompileError;
pub use loader::{FsChartLoader, LoadError, ParsedFile, TemplateParser};

/// Compiles `root` into the final TL document (spec.md §4.5 step 5).
pub fn compile_chart(root: &RootChart, options: &CompileOptions) -> Result<String, CompileError> {
    Ok(chart::compile_chart(root, options)?)
}
