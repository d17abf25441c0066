//! The template AST node taxonomy consumed by the translator.
//!
//! Parsing template source text into these types is an external concern
//! (see `crate::loader::TemplateParser`); this module only defines the
//! fixed shape the node translator walks.

use serde::{Deserialize, Serialize};

/// A single identifier segment, e.g. the `Name` in `.Values.Name`.
pub type Ident = String;

/// The root node of a parsed template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Text(Vec<u8>),
    Action(Pipe),
    If(Pipe, Box<Node>, Option<Box<Node>>),
    With(Pipe, Box<Node>, Option<Box<Node>>),
    Range(Pipe, Box<Node>, Option<Box<Node>>),
    List(Vec<Node>),
    Template(String, Pipe),
    Comment(String),
    Break,
    Continue,
}

impl Node {
    /// Human-readable node-kind name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "Text",
            Self::Action(_) => "Action",
            Self::If(..) => "If",
            Self::With(..) => "With",
            Self::Range(..) => "Range",
            Self::List(_) => "List",
            Self::Template(..) => "Template",
            Self::Comment(_) => "Comment",
            Self::Break => "Break",
            Self::Continue => "Continue",
        }
    }
}

/// A variable declared by a pipeline, e.g. `$x` in `{{$x := .Foo}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable(pub String);

/// `{{declarations... := | = pipeline}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipe {
    pub declarations: Vec<Variable>,
    pub is_assign: bool,
    pub commands: Vec<Command>,
}

/// A single command in a pipeline: an ordered list of arguments, the first
/// of which determines the command's head (field chain, identifier, etc).
pub type Command = Vec<Arg>;

/// A number literal as captured by the upstream parser, before the
/// translator classifies it as int/float/unsupported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberLit {
    pub is_int: bool,
    pub is_uint: bool,
    pub is_float: bool,
    pub is_complex: bool,
    pub int64: i64,
    pub float64: f64,
    pub text: String,
}

/// A single argument within a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Arg {
    Dot,
    Nil,
    Bool(bool),
    Number(NumberLit),
    String(String),
    /// Field access chain rooted at dot, e.g. `.Values.image.tag`.
    Field(Vec<Ident>),
    /// Field access chain rooted at an arbitrary sub-expression (e.g. the
    /// result of a parenthesized sub-pipeline or a variable reference).
    Chain { base: Box<Arg>, fields: Vec<Ident> },
    Identifier(String),
    /// `$name.sub.sub`.
    Variable(Vec<Ident>),
    Pipe(Box<Pipe>),
}
