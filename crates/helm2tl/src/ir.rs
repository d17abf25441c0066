//! TL (the Target Language, a Jsonnet-like purely functional configuration
//! language) expression IR and its precedence-aware pretty-printer.
//!
//! The IR is write-only once constructed: the translator builds it, then
//! [`Expr::print`] renders it to TL source text. See spec.md §4.1.

use std::fmt::Write as _;

/// Syntactic precedence used by the printer to decide when a child needs
/// parentheses. Higher binds tighter. TL is left-associative, so equal
/// precedences between a parent and its left child never need parens.
pub type Precedence = i8;

pub const PREC_ATOMIC: Precedence = 0;
pub const PREC_POSTFIX: Precedence = -1;
pub const PREC_ADDITIVE: Precedence = -2;
pub const PREC_BLOCK: Precedence = -3;

/// An ordered `(key, value)` entry in a [`Expr::MapLiteral`].
///
/// Ordered rather than a `HashMap` because iteration order is output order
/// and must be deterministic (spec.md §4.1, §5).
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Expr,
    pub value: Expr,
}

/// A `(name, body)` binding in a [`Expr::Local`].
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub body: Expr,
}

/// A named argument in a [`Expr::Call`]; insertion order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArg {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    True,
    False,
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(Vec<u8>),
    Identifier(String),
    /// Verbatim TL source, the escape hatch for hand-written fragments
    /// (e.g. invoking prologue helpers by name). Atomic precedence.
    Raw(String),
    List(Vec<Expr>),
    MapLiteral(Vec<MapEntry>),
    Add(Box<Expr>, Box<Expr>),
    Index(Box<Expr>, Box<Expr>),
    /// `head.k1.k2...`, a chain of bare string-key indexes.
    IndexChain(Box<Expr>, Vec<String>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Function(Vec<String>, Box<Expr>),
    Call {
        func: Box<Expr>,
        positional: Vec<Expr>,
        named: Vec<NamedArg>,
    },
    Local(Vec<Binding>, Box<Expr>),
}

impl Expr {
    /// Convenience constructor for a bare identifier reference.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Convenience constructor for a string literal from a Rust `&str`.
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::StringLiteral(s.as_ref().as_bytes().to_vec())
    }

    /// Convenience constructor for `head.k1.k2...` chains of bare keys.
    pub fn index_chain(head: Expr, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::IndexChain(Box::new(head), keys.into_iter().map(Into::into).collect())
    }

    /// Convenience constructor for a positional-only call.
    pub fn call(func: Expr, positional: Vec<Expr>) -> Self {
        Self::Call {
            func: Box::new(func),
            positional,
            named: Vec::new(),
        }
    }

    /// Convenience constructor for a call to a bare-name prologue helper.
    pub fn call_named(name: &str, positional: Vec<Expr>) -> Self {
        Self::call(Self::ident(name), positional)
    }

    pub fn precedence(&self) -> Precedence {
        match self {
            Self::Null
            | Self::True
            | Self::False
            | Self::IntLiteral(_)
            | Self::FloatLiteral(_)
            | Self::StringLiteral(_)
            | Self::Identifier(_)
            | Self::Raw(_)
            | Self::List(_)
            | Self::MapLiteral(_) => PREC_ATOMIC,
            Self::Index(..) | Self::IndexChain(..) | Self::Call { .. } => PREC_POSTFIX,
            Self::Add(..) => PREC_ADDITIVE,
            Self::If(..) | Self::Function(..) | Self::Local(..) => PREC_BLOCK,
        }
    }

    /// Renders this expression as TL source text, with float literals
    /// formatted to six fractional digits (spec.md §4.1, §9 open question c).
    pub fn print(&self) -> String {
        self.print_with_float_precision(6)
    }

    /// Renders this expression as TL source text, formatting float
    /// literals to `float_precision` fractional digits (SPEC_FULL.md
    /// §4.10 `CompileOptions::float_precision`).
    pub fn print_with_float_precision(&self, float_precision: usize) -> String {
        let mut out = String::new();
        self.write(&mut out, PREC_BLOCK, float_precision);
        out
    }

    /// Writes this expression into `out`, parenthesizing if `self`'s
    /// precedence is strictly lower than the parent's (`parent_prec`).
    fn write(&self, out: &mut String, parent_prec: Precedence, float_precision: usize) {
        let needs_parens = self.precedence() < parent_prec;
        if needs_parens {
            out.push('(');
        }
        self.write_inner(out, float_precision);
        if needs_parens {
            out.push(')');
        }
    }

    fn write_inner(&self, out: &mut String, float_precision: usize) {
        match self {
            Self::Null => out.push_str("null"),
            Self::True => out.push_str("true"),
            Self::False => out.push_str("false"),
            Self::IntLiteral(i) => {
                let _ = write!(out, "{i}");
            }
            Self::FloatLiteral(fl) => {
                let _ = write!(out, "{}", format_float(*fl, float_precision));
            }
            Self::StringLiteral(bytes) => write_string_literal(out, bytes),
            Self::Identifier(name) => out.push_str(name),
            Self::Raw(s) => out.push_str(s),
            Self::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write(out, PREC_BLOCK, float_precision);
                }
                out.push(']');
            }
            Self::MapLiteral(entries) => {
                out.push('{');
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_map_key(out, &entry.key, float_precision);
                    out.push_str(": ");
                    entry.value.write(out, PREC_BLOCK, float_precision);
                }
                out.push('}');
            }
            Self::Add(lhs, rhs) => {
                lhs.write(out, PREC_ADDITIVE, float_precision);
                out.push_str(" + ");
                rhs.write(out, PREC_ADDITIVE + 1, float_precision);
            }
            Self::Index(lhs, rhs) => {
                lhs.write(out, PREC_POSTFIX, float_precision);
                out.push('[');
                rhs.write(out, PREC_BLOCK, float_precision);
                out.push(']');
            }
            Self::IndexChain(head, keys) => {
                head.write(out, PREC_POSTFIX, float_precision);
                for key in keys {
                    out.push('.');
                    out.push_str(key);
                }
            }
            Self::If(cond, then_branch, else_branch) => {
                out.push_str("if ");
                cond.write(out, PREC_BLOCK, float_precision);
                out.push_str(" then ");
                then_branch.write(out, PREC_BLOCK, float_precision);
                out.push_str(" else ");
                else_branch.write(out, PREC_BLOCK, float_precision);
            }
            Self::Function(params, body) => {
                out.push_str("function(");
                out.push_str(&params.join(", "));
                out.push_str(") ");
                body.write(out, PREC_BLOCK, float_precision);
            }
            Self::Call { func, positional, named } => {
                func.write(out, PREC_POSTFIX, float_precision);
                out.push('(');
                let mut first = true;
                for arg in positional {
                    if !first {
                        out.push_str(", ");
                    }
                    arg.write(out, PREC_BLOCK, float_precision);
                    first = false;
                }
                for arg in named {
                    if !first {
                        out.push_str(", ");
                    }
                    out.push_str(&arg.name);
                    out.push('=');
                    arg.value.write(out, PREC_BLOCK, float_precision);
                    first = false;
                }
                out.push(')');
            }
            Self::Local(binds, body) => {
                out.push_str("local ");
                for (i, bind) in binds.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&bind.name);
                    out.push('=');
                    bind.body.write(out, PREC_BLOCK, float_precision);
                }
                out.push_str("; ");
                body.write(out, PREC_BLOCK, float_precision);
            }
        }
    }
}

fn format_float(f: f64, precision: usize) -> String {
    format!("{f:.precision$}")
}

/// Map keys that are valid TL identifiers print bare; everything else
/// prints as a quoted string literal.
fn write_map_key(out: &mut String, key: &Expr, float_precision: usize) {
    if let Expr::StringLiteral(bytes) = key {
        if let Ok(s) = std::str::from_utf8(bytes) {
            if is_bare_identifier(s) {
                out.push_str(s);
                return;
            }
        }
    }
    key.write(out, PREC_BLOCK, float_precision);
}

fn is_bare_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Escapes `\`, `\n`, `\r`, `\t`, `"` with backslashes. Single-quote
/// escaping is optional per spec.md §4.1; this printer always uses double
/// quotes so it is moot.
fn write_string_literal(out: &mut String, bytes: &[u8]) {
    out.push('"');
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                // Pass through the raw byte as a single UTF-8 char when valid;
                // templates operate on UTF-8 text end to end.
                if let Ok(s) = std::str::from_utf8(&[b]) {
                    out.push_str(s);
                } else {
                    let _ = write!(out, "\\u{b:04x}");
                }
            }
        }
    }
    out.push('"');
}
