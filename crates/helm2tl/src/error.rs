//! Error taxonomy for the translator, modeled on the teacher crate's
//! `exception_private`/`resource` style: hand-written enums with manual
//! `Display` impls carrying structured fields, rather than pre-formatted
//! strings or a `thiserror` derive.

use std::fmt;

/// Errors raised by the scope analyzer (spec.md §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// `defineVariable` called twice for the same name in one frame.
    Redefinition { name: String },
    /// `assignVariable`/`getVariable` found no binding in any enclosing frame.
    Undefined { name: String },
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redefinition { name } => write!(f, "{name} already defined in scope"),
            Self::Undefined { name } => write!(f, "undefined variable {name}"),
        }
    }
}

impl std::error::Error for ScopeError {}

/// Errors raised while walking the template AST (spec.md §4.4, §4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    Scope(ScopeError),
    /// `Comment`, `Break`, `Continue` nodes: unimplemented by design.
    UnsupportedNode { kind: &'static str },
    /// A number literal that is complex or unsigned-only; TL has no such type.
    UncompilableNumber { text: String },
    /// An integer literal that does not fit the platform's native integer.
    IntegerOverflow { text: String },
    /// `{{range $a, $b, $c := .}}` — more than two range declarations.
    TooManyRangeDecls { count: usize },
    /// A function identifier outside the classified built-in set and not
    /// resolvable as a user-defined template function.
    FunctionNotFound { name: String },
    /// `{{template "name" ...}}` referencing a template the chart never defines.
    TemplateNotFound { name: String },
    /// A field/chain access whose head is `nil`.
    NilIndirection,
    /// A `Chain` node with an empty field list.
    EmptyChain,
    /// Internal invariant violated: a well-formed AST should never produce
    /// these; surfaced as-is rather than recovered from.
    EmptyPipelineCommands,
    UnknownCommandHead,
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scope(e) => write!(f, "{e}"),
            Self::UnsupportedNode { kind } => write!(f, "unsupported node kind: {kind}"),
            Self::UncompilableNumber { text } => write!(f, "uncompilable number literal: {text}"),
            Self::IntegerOverflow { text } => write!(f, "integer literal overflows platform int: {text}"),
            Self::TooManyRangeDecls { count } => {
                write!(f, "range supports at most 2 declarations, got {count}")
            }
            Self::FunctionNotFound { name } => write!(f, "function not found: {name}"),
            Self::TemplateNotFound { name } => write!(f, "template not found: {name}"),
            Self::NilIndirection => write!(f, "nil indirection"),
            Self::EmptyChain => write!(f, "chain has no fields"),
            Self::EmptyPipelineCommands => write!(f, "internal invariant violated: empty pipeline commands list"),
            Self::UnknownCommandHead => write!(f, "internal invariant violated: unknown command head"),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<ScopeError> for TranslateError {
    fn from(e: ScopeError) -> Self {
        Self::Scope(e)
    }
}

/// Errors raised while assembling the chart driver (spec.md §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    MissingMetadata { field: &'static str, chart: String },
    SubchartCycle { chart: String },
    Translate(TranslateError),
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMetadata { field, chart } => {
                write!(f, "chart {chart}: missing required metadata field {field}")
            }
            Self::SubchartCycle { chart } => write!(f, "chart {chart}: subchart graph contains a cycle"),
            Self::Translate(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ChartError {}

impl From<TranslateError> for ChartError {
    fn from(e: TranslateError) -> Self {
        Self::Translate(e)
    }
}

/// Top-level error returned by every public entry point of this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Chart(ChartError),
    /// Raised by the (out-of-scope-but-CLI-needed) chart loader, e.g. an
    /// unreadable `Chart.yaml`. Carries the upstream error's rendered text
    /// since loader failures originate outside this crate's type system.
    Loader { path: String, message: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chart(e) => write!(f, "{e}"),
            Self::Loader { path, message } => write!(f, "failed to load {path}: {message}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ChartError> for CompileError {
    fn from(e: ChartError) -> Self {
        Self::Chart(e)
    }
}

impl From<TranslateError> for CompileError {
    fn from(e: TranslateError) -> Self {
        Self::Chart(ChartError::Translate(e))
    }
}
