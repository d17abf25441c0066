//! Pipeline, command, and field-chain translation (spec.md §4.4).
//!
//! A pipeline is a sequence of commands; a command is an ordered list of
//! [`Arg`]s whose first element is the *head* (what kind of thing this
//! command is) and whose remainder are explicit call arguments. Each
//! command but the first receives the previous command's value appended
//! as a final positional argument — the textbook Unix-pipe reading of Go
//! template pipelines.

use crate::ast::{Arg, Command, NumberLit, Pipe};
use crate::builtins::{self, BuiltinClass};
use crate::error::TranslateError;
use crate::ir::{Expr, MapEntry};
use crate::scope::Scope;
use crate::state::{thread_sequence, State};

use super::shortcircuit;
use super::TranslateCtx;

/// Reads the current dot (`.`) from `vs["$"]` (spec.md §3 "the special
/// name `$` denotes the template's top-level dot").
pub fn read_dot(vs: &Expr) -> Expr {
    Expr::Index(Box::new(vs.clone()), Box::new(Expr::string("$")))
}

fn read_var(vs: &Expr, name: &str) -> Expr {
    Expr::Index(Box::new(vs.clone()), Box::new(Expr::string(name)))
}

/// Translates a full pipeline, applying its declarations (if any) to
/// `scope`/`vs` as a side effect, and always returning the pipeline's
/// *actual* computed value — callers that need the Action-node
/// "declarations blank the printed value" behavior apply that on top
/// (spec.md §4.4 "Action node"). `If`/`With`/`Range` condition pipelines
/// use this function directly since they need the real value even when
/// the pipeline also declares a variable (e.g. `{{with $x := .Foo}}`).
pub fn translate_pipe(
    pipe: &Pipe,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    let (value, mut state) = translate_pipe_commands(&pipe.commands, scope, state, ctx)?;
    if pipe.declarations.is_empty() {
        return Ok((value, state));
    }
    for var in &pipe.declarations {
        if pipe.is_assign {
            scope.assign_variable(&var.0)?;
        } else {
            scope.define_variable(&var.0)?;
        }
    }
    let entries = pipe
        .declarations
        .iter()
        .map(|var| MapEntry { key: Expr::string(&var.0), value: value.clone() })
        .collect();
    let new_vs = Expr::Add(Box::new(state.vs().clone()), Box::new(Expr::MapLiteral(entries)));
    let bound = state.push_bind(new_vs);
    state.set_vs(bound);
    Ok((value, state))
}

/// Translates only the commands of a pipeline, ignoring any
/// declarations — used by `Range`, whose declared variables are the loop
/// variables rather than ordinary pipeline-result bindings (spec.md §4.4
/// "Range", step 1: "translate the pipeline *without* its declarations").
pub fn translate_pipe_commands(
    commands: &[Command],
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    if commands.is_empty() {
        return Err(TranslateError::EmptyPipelineCommands);
    }
    let mut prior: Option<Expr> = None;
    let mut state = state;
    let mut value = Expr::Null;
    for cmd in commands {
        let taken = prior.take();
        let (v, next_state) = state.and_then(|vs, h| {
            translate_command(cmd, taken, scope, State::new(vs.clone(), h.clone()), ctx)
        })?;
        value = v.clone();
        prior = Some(v);
        state = next_state;
    }
    Ok((value, state))
}

/// Translates a single `Arg` used as a value in its own right (a call
/// argument, or the base of a `Chain`) rather than as a pipeline's head
/// command. `Nil` here is a plain null literal; it is only an error when
/// it is the head of a whole command (spec.md §4.7 "`nil` as a command
/// head").
pub(crate) fn translate_expr_fragment(
    arg: &Arg,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    match arg {
        Arg::Nil => Ok((Expr::Null, state)),
        other => translate_command(std::slice::from_ref(other), None, scope, state, ctx),
    }
}

fn build_args(
    rest: &[Arg],
    prior: Option<Expr>,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Vec<Expr>, State), TranslateError> {
    let (mut values, state) = thread_sequence(state, rest, |arg, vs, h| {
        translate_expr_fragment(arg, &mut *scope, State::new(vs.clone(), h.clone()), ctx)
    })?;
    if let Some(p) = prior {
        values.push(p);
    }
    Ok((values, state))
}

/// Translates one pipeline command: `cmd[0]` is the head, `cmd[1..]` are
/// explicit arguments, and `prior` (if this isn't the pipeline's first
/// command) is appended as a final positional argument.
fn translate_command(
    cmd: &[Arg],
    prior: Option<Expr>,
    scope: &mut Scope,
    state: State,
    ctx: &TranslateCtx,
) -> Result<(Expr, State), TranslateError> {
    let (head, rest) = cmd.split_first().ok_or(TranslateError::EmptyPipelineCommands)?;
    match head {
        Arg::Nil => Err(TranslateError::NilIndirection),
        Arg::Dot => Ok((read_dot(state.vs()), state)),
        Arg::Bool(b) => Ok((if *b { Expr::True } else { Expr::False }, state)),
        Arg::Number(n) => Ok((classify_number(n)?, state)),
        Arg::String(s) => Ok((Expr::string(s), state)),

        Arg::Field(path) => {
            if path.is_empty() {
                return Err(TranslateError::EmptyChain);
            }
            let receiver = read_dot(state.vs());
            let (args, state) = build_args(rest, prior, scope, state, ctx)?;
            Ok(translate_field_chain(receiver, path, args, state))
        }

        Arg::Chain { base, fields } => {
            if fields.is_empty() {
                return Err(TranslateError::EmptyChain);
            }
            let (receiver, state) = translate_expr_fragment(base, scope, state, ctx)?;
            let (args, state) = build_args(rest, prior, scope, state, ctx)?;
            Ok(translate_field_chain(receiver, fields, args, state))
        }

        Arg::Identifier(name) => {
            if builtins::is_short_circuit(name) {
                return shortcircuit::translate_and_or(name, rest, prior, scope, state, ctx);
            }
            let (args, state) = build_args(rest, prior, scope, state, ctx)?;
            translate_function_call(name, args, state)
        }

        Arg::Variable(idents) => {
            let (name, sub_path) = idents.split_first().expect("variable reference always has a name");
            let receiver = read_var(state.vs(), name);
            if sub_path.is_empty() {
                Ok((receiver, state))
            } else {
                let (args, state) = build_args(rest, prior, scope, state, ctx)?;
                Ok(translate_field_chain(receiver, sub_path, args, state))
            }
        }

        Arg::Pipe(sub) => translate_pipe(sub, scope, state, ctx),
    }
}

/// Emits one `field(h, receiver, "name", args)` call per identifier in
/// `fields`, threading `h` across the chain and dereferencing
/// `[newHeap, value][1]` at each intermediate step (spec.md §4.4 "Field
/// access"). `trailing_args` (the explicit call args plus any piped-in
/// prior value) apply only to the chain's last segment.
fn translate_field_chain(receiver: Expr, fields: &[String], trailing_args: Vec<Expr>, mut state: State) -> (Expr, State) {
    let mut current = receiver;
    let last = fields.len() - 1;
    for (i, field_name) in fields.iter().enumerate() {
        let args = if i == last { Expr::List(trailing_args.clone()) } else { Expr::List(Vec::new()) };
        let call = Expr::call_named("field", vec![state.h().clone(), current, Expr::string(field_name), args]);
        let bound = state.push_bind(call);
        let new_h = state.push_bind(Expr::Index(Box::new(bound.clone()), Box::new(Expr::IntLiteral(0))));
        state.set_h(new_h);
        current = state.push_bind(Expr::Index(Box::new(bound), Box::new(Expr::IntLiteral(1))));
    }
    (current, state)
}

/// Classifies `name` and emits a call using the appropriate convention
/// (spec.md §4.6). `and`/`or` are intercepted earlier by the caller, so
/// this never sees them.
fn translate_function_call(name: &str, args: Vec<Expr>, mut state: State) -> Result<(Expr, State), TranslateError> {
    match builtins::classify(name) {
        Some(BuiltinClass::PureArgs) => {
            let call = Expr::call_named(name, vec![Expr::List(args)]);
            let value = state.push_bind(call);
            Ok((value, state))
        }
        Some(BuiltinClass::HeapReading) => {
            let call = Expr::call_named("callBuiltin", vec![state.h().clone(), Expr::string(name), Expr::List(args)]);
            let bound = state.push_bind(call);
            let new_h = state.push_bind(Expr::Index(Box::new(bound.clone()), Box::new(Expr::IntLiteral(0))));
            state.set_h(new_h);
            let value = state.push_bind(Expr::Index(Box::new(bound), Box::new(Expr::IntLiteral(1))));
            Ok((value, state))
        }
        Some(BuiltinClass::HeapCapturing) => {
            let ctx_map = Expr::MapLiteral(vec![
                MapEntry { key: Expr::string("$"), value: read_dot(state.vs()) },
                MapEntry { key: Expr::string("args"), value: Expr::List(args) },
                MapEntry { key: Expr::string("vs"), value: state.vs().clone() },
                MapEntry { key: Expr::string("h"), value: state.h().clone() },
            ]);
            let call = Expr::call_named(name, vec![ctx_map]);
            let bound = state.push_bind(call);
            let value = state.push_bind(Expr::Index(Box::new(bound.clone()), Box::new(Expr::IntLiteral(0))));
            let new_vs = state.push_bind(Expr::Index(Box::new(bound.clone()), Box::new(Expr::IntLiteral(1))));
            state.set_vs(new_vs);
            let new_h = state.push_bind(Expr::Index(Box::new(bound), Box::new(Expr::IntLiteral(2))));
            state.set_h(new_h);
            Ok((value, state))
        }
        None => Err(TranslateError::FunctionNotFound { name: name.to_owned() }),
    }
}

/// Classifies a number literal as int/float or rejects it (spec.md §4.7:
/// complex/uint are uncompilable, overflowing integers are an error).
fn classify_number(n: &NumberLit) -> Result<Expr, TranslateError> {
    if n.is_complex || n.is_uint {
        return Err(TranslateError::UncompilableNumber { text: n.text.clone() });
    }
    if n.is_int {
        n.text
            .parse::<i64>()
            .map(Expr::IntLiteral)
            .map_err(|_| TranslateError::IntegerOverflow { text: n.text.clone() })
    } else if n.is_float {
        Ok(Expr::FloatLiteral(n.float64))
    } else {
        Err(TranslateError::UncompilableNumber { text: n.text.clone() })
    }
}
