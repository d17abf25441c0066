//! Built-in function classification (spec.md §4.6).
//!
//! Template built-ins fall into three calling conventions. The translator
//! never emits helper *bodies* — those live in the fixed runtime prologue
//! (`prologue.tl`) — it only emits calls using the convention appropriate
//! to the classified name. This mirrors the teacher crate's `FromStr for
//! Builtins` (`builtins/mod.rs`): a closed, priority-ordered match over a
//! name, rather than a runtime-populated table.

/// The calling convention a classified built-in uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinClass {
    /// `fname(argsList)` — the heap is untouched.
    PureArgs,
    /// `callBuiltin(h, "fname", argsList)` returns `[h', value]` — may
    /// read through pointers.
    HeapReading,
    /// `fname({$, args, vs, h})` returns `[value, vs', h']` — may spawn
    /// sub-template evaluations needing the full translation context.
    HeapCapturing,
}

/// The superset of names listed under each class across the original
/// iterations is authoritative (spec.md §9 open question b).
const PURE_ARGS: &[&str] = &[
    "add",
    "sub",
    "mul",
    "div",
    "mod",
    "eq",
    "ne",
    "lt",
    "le",
    "gt",
    "ge",
    "lower",
    "upper",
    "title",
    "printf",
    "print",
    "println",
    "trim",
    "trimAll",
    "trimPrefix",
    "trimSuffix",
    "contains",
    "hasPrefix",
    "hasSuffix",
    "indent",
    "nindent",
    "trunc",
    "quote",
    "squote",
    "replace",
    "repeat",
    "substr",
    "sha256sum",
    "sha1sum",
    "adler32sum",
    "regexMatch",
    "regexFind",
    "regexFindAll",
    "regexReplaceAll",
    "regexReplaceAllLiteral",
    "regexSplit",
    "semverCompare",
    "toString",
    "toDecimal",
    "abbrev",
    "abbrevboth",
    "wrap",
    "wrapWith",
    "b64enc",
    "b64dec",
    "urlquery",
    "toJson",
    "fail",
];

const HEAP_READING: &[&str] = &[
    "concat",
    "fromYaml",
    "fromJson",
    "has",
    "hasKey",
    "omit",
    "pick",
    "toYaml",
    "toPrettyJson",
    "typeIs",
    "typeIsLike",
    "kindIs",
    "kindOf",
    "now",
    "date",
    "dateInZone",
    "ago",
    "toDate",
];

const HEAP_CAPTURING: &[&str] = &[
    "include",
    "tpl",
    "required",
    "merge",
    "mergeOverwrite",
    "set",
    "unset",
    "default",
    "empty",
    "list",
    "dict",
    "dig",
    "keys",
    "values",
    "len",
    "and",
    "or",
    "not",
    "coalesce",
    "deepCopy",
    "deepEqual",
    "reverse",
    "sortAlpha",
    "uniq",
    "without",
    "split",
    "splitList",
    "join",
    "first",
    "last",
    "rest",
    "initial",
    "append",
    "prepend",
    "until",
    "untilStep",
    "genCA",
    "genSelfSignedCert",
    "genSignedCert",
    "genPrivateKey",
];

/// Classifies a template function identifier into its calling convention,
/// or `None` if it falls outside the classified set (spec.md §4.6
/// "Unclassified identifiers fall through to an error").
pub fn classify(name: &str) -> Option<BuiltinClass> {
    if PURE_ARGS.contains(&name) {
        Some(BuiltinClass::PureArgs)
    } else if HEAP_READING.contains(&name) {
        Some(BuiltinClass::HeapReading)
    } else if HEAP_CAPTURING.contains(&name) {
        Some(BuiltinClass::HeapCapturing)
    } else {
        None
    }
}

/// `and`/`or` are heap-capturing built-ins but also get special-cased
/// short-circuit translation (spec.md §4.4 "Short-circuit `and`/`or`").
pub fn is_short_circuit(name: &str) -> bool {
    matches!(name, "and" | "or")
}
