//! A minimal TL-alike tree-walking evaluator, used only by tests, to check
//! that compiled output actually *means* what spec.md §8's end-to-end
//! scenarios require rather than merely having the right shape.
//!
//! This does not parse TL source text. It evaluates [`Expr`] directly — the
//! same IR `compile_template`/`compile_chart` build before printing — so it
//! only has to understand the fixed vocabulary the translator itself emits
//! (see `ir.rs`: literals, `Add`, `Index`/`IndexChain`, `If`, `Function`,
//! `Call`, `Local`). The handful of runtime-prologue helpers the translator
//! calls by bare name (`_join`, `range`, `isTrueOnHeap`, `field`, `eq`) are
//! reimplemented here natively, mirroring `prologue.tl`'s own definitions,
//! rather than reparsed from prologue source.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::rc::Rc;

use helm2tl::ast::Node;
use helm2tl::heap_encode::{self, HeapBuilder};
use helm2tl::ir::Expr;
use helm2tl::translate::{compile_template, TranslateCtx};

/// A runtime value this evaluator can produce or consume. Mirrors the
/// scalar/list/map/function cases the translator's `Expr` vocabulary
/// actually constructs at runtime.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Ordered, like `Expr::MapLiteral` — object field order is
    /// observable in this crate (spec.md §3, §5).
    Map(Vec<(String, Value)>),
    Closure(Rc<Closure>),
    Native(Rc<dyn Fn(&[Value]) -> Result<Value, String>>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(entries) => f.debug_map().entries(entries.iter().map(|(k, v)| (k, v))).finish(),
            Value::Closure(_) => write!(f, "<closure>"),
            Value::Native(_) => write!(f, "<native>"),
        }
    }
}

impl Value {
    pub fn expect_str(&self, what: &str) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => panic!("expected a string {what}, got {other:?}"),
        }
    }
}

pub struct Closure {
    params: Vec<String>,
    body: Expr,
    env: Env,
}

struct EnvNode {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Env>,
}

type Env = Rc<EnvNode>;

fn child_env(parent: &Env) -> Env {
    Rc::new(EnvNode { vars: RefCell::new(HashMap::new()), parent: Some(parent.clone()) })
}

fn lookup(env: &Env, name: &str) -> Result<Value, String> {
    let mut cur = Some(env.clone());
    while let Some(node) = cur {
        if let Some(v) = node.vars.borrow().get(name) {
            return Ok(v.clone());
        }
        cur = node.parent.clone();
    }
    Err(format!("unbound identifier: {name}"))
}

fn is_ptr(v: &Value) -> bool {
    matches!(v, Value::Map(entries) if entries.iter().any(|(k, v)| k == "p" && matches!(v, Value::List(_))))
}

/// `deref(h, v)` (prologue.tl): follows one pointer indirection through
/// `h`, or returns `v` unchanged if it isn't a pointer.
fn deref(h: &Value, v: &Value) -> Result<Value, String> {
    if !is_ptr(v) {
        return Ok(v.clone());
    }
    let Value::Map(entries) = v else { unreachable!() };
    let Some((_, Value::List(addrs))) = entries.iter().find(|(k, _)| k == "p") else { unreachable!() };
    let Some(Value::Str(addr)) = addrs.first() else {
        return Err("malformed heap pointer".into());
    };
    let Value::Map(cells) = h else {
        return Err("heap is not a map".into());
    };
    cells
        .iter()
        .find(|(k, _)| k == addr)
        .map(|(_, v)| v.clone())
        .ok_or_else(|| format!("dangling heap pointer: {addr}"))
}

/// `truthy(h, v)` (prologue.tl): the reference truth table (spec.md §8
/// "Truthiness coverage").
fn truthy(h: &Value, v: &Value) -> Result<bool, String> {
    if matches!(v, Value::Null) {
        return Ok(false);
    }
    if let Value::Bool(b) = v {
        return Ok(*b);
    }
    if let Value::Int(i) = v {
        return Ok(*i != 0);
    }
    if let Value::Float(x) = v {
        return Ok(*x != 0.0);
    }
    if let Value::Str(s) = v {
        return Ok(!s.is_empty());
    }
    if matches!(v, Value::Closure(_) | Value::Native(_)) {
        return Ok(true);
    }
    if is_ptr(v) {
        let d = deref(h, v)?;
        return truthy(h, &d);
    }
    if let Value::List(items) = v {
        return Ok(!items.is_empty());
    }
    if let Value::Map(entries) = v {
        return Ok(!entries.is_empty());
    }
    Ok(true)
}

/// `stringOf(h, v)` (prologue.tl): dereferences then stringifies, the way
/// `_join` needs for every printed node value.
fn string_of(h: &Value, v: &Value) -> Result<String, String> {
    let d = deref(h, v)?;
    Ok(match d {
        Value::Str(s) => s,
        Value::Null => String::new(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(format!("test evaluator cannot stringify {other:?}")),
    })
}

fn call_value(f: &Value, args: &[Value]) -> Result<Value, String> {
    match f {
        Value::Native(func) => func(args),
        Value::Closure(c) => {
            if c.params.len() != args.len() {
                return Err(format!("arity mismatch: expected {}, got {}", c.params.len(), args.len()));
            }
            let env = child_env(&c.env);
            for (p, a) in c.params.iter().zip(args) {
                env.vars.borrow_mut().insert(p.clone(), a.clone());
            }
            eval(&c.body, &env)
        }
        other => Err(format!("attempted to call a non-function value: {other:?}")),
    }
}

fn add_values(a: Value, b: Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x + y)),
        (Value::Int(x), Value::Float(y)) => Ok(Value::Float(x as f64 + y)),
        (Value::Float(x), Value::Int(y)) => Ok(Value::Float(x + y as f64)),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x + y)),
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(x + &y)),
        (Value::List(mut x), Value::List(y)) => {
            x.extend(y);
            Ok(Value::List(x))
        }
        (Value::Map(x), Value::Map(y)) => {
            let mut merged = x;
            for (k, v) in y {
                match merged.iter_mut().find(|(mk, _)| *mk == k) {
                    Some(slot) => slot.1 = v,
                    None => merged.push((k, v)),
                }
            }
            Ok(Value::Map(merged))
        }
        (a, b) => Err(format!("unsupported `+` between {a:?} and {b:?}")),
    }
}

fn index_value(base: Value, key: Value) -> Result<Value, String> {
    match (base, key) {
        (Value::List(items), Value::Int(i)) => {
            let i = usize::try_from(i).map_err(|_| "negative list index".to_string())?;
            items.get(i).cloned().ok_or_else(|| format!("index {i} out of bounds"))
        }
        (Value::Map(entries), Value::Str(k)) => entries
            .iter()
            .find(|(mk, _)| *mk == k)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| format!("missing key {k:?}")),
        (b, k) => Err(format!("cannot index {b:?} with {k:?}")),
    }
}

fn eval(expr: &Expr, env: &Env) -> Result<Value, String> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::True => Ok(Value::Bool(true)),
        Expr::False => Ok(Value::Bool(false)),
        Expr::IntLiteral(i) => Ok(Value::Int(*i)),
        Expr::FloatLiteral(x) => Ok(Value::Float(*x)),
        Expr::StringLiteral(bytes) => Ok(Value::Str(String::from_utf8_lossy(bytes).into_owned())),
        Expr::Identifier(name) => lookup(env, name),
        Expr::Raw(s) => Err(format!("test evaluator does not support raw TL fragments: {s}")),
        Expr::List(items) => {
            let values = items.iter().map(|item| eval(item, env)).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(values))
        }
        Expr::MapLiteral(entries) => {
            let mut out = Vec::with_capacity(entries.len());
            for entry in entries {
                let key = match eval(&entry.key, env)? {
                    Value::Str(s) => s,
                    other => return Err(format!("map key did not evaluate to a string: {other:?}")),
                };
                out.push((key, eval(&entry.value, env)?));
            }
            Ok(Value::Map(out))
        }
        Expr::Add(lhs, rhs) => add_values(eval(lhs, env)?, eval(rhs, env)?),
        Expr::Index(lhs, rhs) => index_value(eval(lhs, env)?, eval(rhs, env)?),
        Expr::IndexChain(head, keys) => {
            let mut cur = eval(head, env)?;
            for key in keys {
                cur = index_value(cur, Value::Str(key.clone()))?;
            }
            Ok(cur)
        }
        Expr::If(cond, then_branch, else_branch) => match eval(cond, env)? {
            Value::Bool(true) => eval(then_branch, env),
            Value::Bool(false) => eval(else_branch, env),
            other => Err(format!("if-condition did not evaluate to a boolean: {other:?}")),
        },
        Expr::Function(params, body) => {
            Ok(Value::Closure(Rc::new(Closure { params: params.clone(), body: (**body).clone(), env: env.clone() })))
        }
        Expr::Call { func, positional, named } => {
            if !named.is_empty() {
                return Err("test evaluator does not support named call arguments".into());
            }
            let f = eval(func, env)?;
            let args = positional.iter().map(|a| eval(a, env)).collect::<Result<Vec<_>, _>>()?;
            call_value(&f, &args)
        }
        Expr::Local(binds, body) => {
            let frame = child_env(env);
            for bind in binds {
                // `frame` is already the active environment while evaluating
                // each bind's own body, so a bind that builds a closure
                // referencing a name bound later in the same chain (e.g. the
                // compiled templates map binding itself to `$`, whose
                // closures then reference `$`) resolves once every bind has
                // been inserted — mirroring TL's own lazy `local` semantics.
                let v = eval(&bind.body, &frame)?;
                frame.vars.borrow_mut().insert(bind.name.clone(), v);
            }
            eval(body, &frame)
        }
    }
}

fn native_join(args: &[Value]) -> Result<Value, String> {
    let [h, Value::List(items)] = args else {
        return Err("_join expects (h, list)".into());
    };
    let mut out = String::new();
    for item in items {
        out.push_str(&string_of(h, item)?);
    }
    Ok(Value::Str(out))
}

fn native_is_true_on_heap(args: &[Value]) -> Result<Value, String> {
    let [h, v] = args else {
        return Err("isTrueOnHeap expects (h, v)".into());
    };
    Ok(Value::Bool(truthy(h, v)?))
}

fn native_field(args: &[Value]) -> Result<Value, String> {
    let [h, receiver, name, call_args] = args else {
        return Err("field expects (h, receiver, name, args)".into());
    };
    let name = name.expect_str("field name");
    let call_args = match call_args {
        Value::List(v) => v.clone(),
        other => return Err(format!("field args must be a list, got {other:?}")),
    };
    let base = deref(h, receiver)?;
    if matches!(base, Value::Null) {
        return Ok(Value::List(vec![h.clone(), Value::Null]));
    }
    let raw = match &base {
        Value::Map(entries) => entries.iter().find(|(k, _)| *k == name).map(|(_, v)| v.clone()).unwrap_or(Value::Null),
        _ => Value::Null,
    };
    if matches!(raw, Value::Closure(_) | Value::Native(_)) && !call_args.is_empty() {
        let result = call_value(&raw, &call_args)?;
        if let Value::List(items) = &result {
            if items.len() == 2 {
                return Ok(result);
            }
        }
        return Ok(Value::List(vec![h.clone(), result]));
    }
    Ok(Value::List(vec![h.clone(), raw]))
}

fn native_range(args: &[Value]) -> Result<Value, String> {
    let [vs, h, values, fbody, felse] = args else {
        return Err("range expects (vs, h, values, fbody, felse)".into());
    };
    let dereffed = deref(h, values)?;
    let items: Option<Vec<Value>> = match &dereffed {
        Value::Null => None,
        Value::List(items) => (!items.is_empty()).then(|| items.clone()),
        Value::Map(entries) => {
            if entries.is_empty() {
                None
            } else {
                let mut keys: Vec<&String> = entries.iter().map(|(k, _)| k).collect();
                keys.sort();
                Some(keys.into_iter().map(|k| entries.iter().find(|(ek, _)| ek == k).unwrap().1.clone()).collect())
            }
        }
        Value::Int(n) => (*n > 0).then(|| (0..*n).map(Value::Int).collect()),
        _ => None,
    };
    match items {
        None => call_value(felse, &[]),
        Some(items) => {
            let mut acc_str = String::new();
            let mut acc_vs = vs.clone();
            let mut acc_h = h.clone();
            for (i, item) in items.into_iter().enumerate() {
                let r = call_value(fbody, &[acc_vs.clone(), acc_h.clone(), Value::Int(i as i64), item])?;
                let Value::List(triple) = r else {
                    return Err("range body thunk must return a 3-tuple".into());
                };
                let [v, new_vs, new_h] = <[Value; 3]>::try_from(triple).map_err(|_| "range body thunk must return a 3-tuple")?;
                acc_str.push_str(&v.expect_str("range body output"));
                acc_vs = new_vs;
                acc_h = new_h;
            }
            Ok(Value::List(vec![Value::Str(acc_str), acc_vs, acc_h]))
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b)),
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.iter().any(|(k2, v2)| k == k2 && values_equal(v, v2)))
        }
        _ => false,
    }
}

fn native_eq(args: &[Value]) -> Result<Value, String> {
    let [Value::List(pair)] = args else {
        return Err("eq expects a single args-list argument".into());
    };
    let [a, b] = pair.as_slice() else {
        return Err("eq expects exactly two arguments".into());
    };
    Ok(Value::Bool(values_equal(a, b)))
}

fn base_env() -> Env {
    let root = Rc::new(EnvNode { vars: RefCell::new(HashMap::new()), parent: None });
    let mut vars = root.vars.borrow_mut();
    vars.insert("_join".into(), Value::Native(Rc::new(native_join)));
    vars.insert("isTrueOnHeap".into(), Value::Native(Rc::new(native_is_true_on_heap)));
    vars.insert("field".into(), Value::Native(Rc::new(native_field)));
    vars.insert("range".into(), Value::Native(Rc::new(native_range)));
    vars.insert("eq".into(), Value::Native(Rc::new(native_eq)));
    drop(vars);
    root
}

/// Converts a build-time `heap_encode::Value` into this module's runtime
/// `Value`, routing it through the real `HeapBuilder` so pointer/scalar
/// allocation matches production behavior exactly (spec.md §4.1).
/// Returns `(initial_heap, dot)`.
fn allocate(data: &heap_encode::Value) -> Result<(Value, Value), String> {
    let mut builder = HeapBuilder::new();
    let dot_expr = builder.deep_allocate(data);
    let heap_expr = builder.into_heap_expr();
    let env = base_env();
    Ok((eval(&heap_expr, &env)?, eval(&dot_expr, &env)?))
}

/// Compiles and evaluates a single template body against `data`, returning
/// the final printed string (spec.md §8 "Concrete end-to-end scenarios").
pub fn render(node: &Node, data: heap_encode::Value) -> Result<String, String> {
    render_with_templates(&[("main", node.clone())], "main", data)
}

/// Compiles a named set of templates (for `{{define}}`/`{{template}}`
/// cross-invocation scenarios) and evaluates `entry_point` against `data`,
/// wiring `$` to the compiled-templates map the same way `chart.rs`'s
/// `compile_chart` does.
pub fn render_with_templates(templates: &[(&str, Node)], entry_point: &str, data: heap_encode::Value) -> Result<String, String> {
    let names: HashSet<String> = templates.iter().map(|(n, _)| n.to_string()).collect();
    let ctx = TranslateCtx { template_names: &names };

    let env = base_env();
    let frame = child_env(&env);
    let mut templates_map = Vec::with_capacity(templates.len());
    for (name, node) in templates {
        let compiled = compile_template(node, &ctx).map_err(|e| format!("{e:?}"))?;
        templates_map.push((name.to_string(), eval(&compiled, &frame)?));
    }
    frame.vars.borrow_mut().insert("$".into(), Value::Map(templates_map));

    let (h, dot) = allocate(&data)?;
    let entry = lookup(&frame, "$").and_then(|m| index_value(m, Value::Str(entry_point.into())))?;
    let result = call_value(&entry, &[h, dot])?;
    let Value::List(triple) = result else {
        return Err("compiled template did not return a 3-tuple".into());
    };
    let v = triple.into_iter().next().ok_or("compiled template returned an empty tuple")?;
    Ok(v.expect_str("rendered output"))
}
