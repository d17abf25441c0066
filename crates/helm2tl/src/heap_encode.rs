//! Build-time value reification (spec.md §4.1 "Value reifier") and heap
//! encoding (spec.md §4.1 "Heap encoder `deepAllocate`").
//!
//! Two distinct operations share this module because they share the same
//! recursive shape over the same build-time value representation:
//!
//! - [`convert_into_tl`] turns a build-time value (chart default `values`,
//!   a test fixture) into a plain [`Expr`], with no heap involved.
//! - [`HeapBuilder::deep_allocate`] does the same walk but allocates every
//!   container into an addressable heap cell, returning a pointer
//!   expression so the container's identity survives mutation at runtime.

use crate::ir::{Expr, MapEntry};

/// A build-time value: chart defaults loaded from YAML, or a value
/// constructed by a test fixture. Mirrors the null/bool/int/float/string/
/// list/map/struct cases spec.md §4.1 enumerates for the reifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// `None` distinguishes a nil slice/pointer from an empty list
    /// (spec.md §4.1 "a nil slice is null (distinguishable from empty list)").
    List(Option<Vec<Value>>),
    Map(Vec<(String, Value)>),
    /// A struct-like record carrying its exported fields and, per field
    /// name, the companion `XJsonnet` method body a test fixture
    /// registered explicitly (spec.md §9 design note: a registration
    /// table is simpler than runtime reflection and is what this crate
    /// uses instead of the source's reflective dispatch).
    Struct {
        fields: Vec<(String, Value)>,
        jsonnet_methods: Vec<(String, Expr)>,
    },
}

/// Reifies a build-time [`Value`] into a plain [`Expr`], with no heap
/// allocation. Map keys are sorted lexicographically so output is
/// deterministic (spec.md §4.1, §5).
pub fn convert_into_tl(value: &Value) -> Expr {
    match value {
        Value::Null => Expr::Null,
        Value::Bool(true) => Expr::True,
        Value::Bool(false) => Expr::False,
        Value::Int(i) => Expr::IntLiteral(*i),
        Value::Float(f) => Expr::FloatLiteral(*f),
        Value::Str(s) => Expr::string(s),
        Value::List(None) => Expr::Null,
        Value::List(Some(items)) => Expr::List(items.iter().map(convert_into_tl).collect()),
        Value::Map(entries) => Expr::MapLiteral(sorted_entries(entries, convert_into_tl)),
        Value::Struct { fields, jsonnet_methods } => {
            Expr::MapLiteral(struct_entries(fields, jsonnet_methods, convert_into_tl))
        }
    }
}

fn sorted_entries(entries: &[(String, Value)], reify: impl Fn(&Value) -> Expr) -> Vec<MapEntry> {
    let mut sorted: Vec<&(String, Value)> = entries.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
        .into_iter()
        .map(|(k, v)| MapEntry {
            key: Expr::string(k),
            value: reify(v),
        })
        .collect()
}

fn struct_entries(
    fields: &[(String, Value)],
    jsonnet_methods: &[(String, Expr)],
    reify: impl Fn(&Value) -> Expr + Copy,
) -> Vec<MapEntry> {
    let mut all: Vec<(String, Expr)> = fields.iter().map(|(k, v)| (k.clone(), reify(v))).collect();
    for (name, body) in jsonnet_methods {
        all.push((name.clone(), body.clone()));
    }
    all.sort_by(|a, b| a.0.cmp(&b.0));
    all.into_iter()
        .map(|(k, v)| MapEntry {
            key: Expr::string(&k),
            value: v,
        })
        .collect()
}

/// A single heap cell: its address and the `Expr` stored there.
#[derive(Debug, Clone, PartialEq)]
struct HeapCell {
    address: String,
    value: Expr,
}

/// Accumulates heap cells during deep allocation of build-time values, then
/// finalizes them into the TL map literal that is the chart's initial heap
/// (spec.md §4.5 step 2, §3 "Heap (runtime)").
#[derive(Debug, Default)]
pub struct HeapBuilder {
    next_address: u64,
    cells: Vec<HeapCell>,
}

impl HeapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_address(&mut self) -> String {
        let addr = self.next_address;
        self.next_address += 1;
        format!("{addr}")
    }

    /// Deep-allocates `value` into this heap, returning a pointer
    /// expression `{p: [addressString]}` for containers, or the scalar
    /// literal directly for non-containers (spec.md §4.1, "Scalars bypass
    /// allocation").
    pub fn deep_allocate(&mut self, value: &Value) -> Expr {
        match value {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::List(None) => {
                convert_into_tl(value)
            }
            Value::List(Some(items)) => {
                let allocated: Vec<Expr> = items.iter().map(|item| self.deep_allocate(item)).collect();
                self.store(Expr::List(allocated))
            }
            Value::Map(entries) => {
                let allocated = self.allocate_map_entries(entries);
                self.store(Expr::MapLiteral(allocated))
            }
            Value::Struct { fields, jsonnet_methods } => {
                let mut allocated: Vec<(String, Expr)> = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.deep_allocate(v)))
                    .collect();
                for (name, body) in jsonnet_methods {
                    allocated.push((name.clone(), body.clone()));
                }
                allocated.sort_by(|a, b| a.0.cmp(&b.0));
                let entries = allocated
                    .into_iter()
                    .map(|(k, v)| MapEntry {
                        key: Expr::string(&k),
                        value: v,
                    })
                    .collect();
                self.store(Expr::MapLiteral(entries))
            }
        }
    }

    fn allocate_map_entries(&mut self, entries: &[(String, Value)]) -> Vec<MapEntry> {
        let mut sorted: Vec<&(String, Value)> = entries.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
            .into_iter()
            .map(|(k, v)| MapEntry {
                key: Expr::string(k),
                value: self.deep_allocate(v),
            })
            .collect()
    }

    fn store(&mut self, built: Expr) -> Expr {
        let address = self.fresh_address();
        self.cells.push(HeapCell {
            address: address.clone(),
            value: built,
        });
        pointer_expr(&address)
    }

    /// Finalizes the accumulated cells into the initial-heap TL map
    /// literal, in allocation order (deterministic: allocation order is a
    /// function of the fixed input tree and sorted map-key iteration).
    pub fn into_heap_expr(self) -> Expr {
        Expr::MapLiteral(
            self.cells
                .into_iter()
                .map(|cell| MapEntry {
                    key: Expr::string(&cell.address),
                    value: cell.value,
                })
                .collect(),
        )
    }
}

/// A reference to a heap-allocated value: a single-element list of the
/// address string (spec.md §3 "Heap (runtime)").
pub fn pointer_expr(address: &str) -> Expr {
    Expr::MapLiteral(vec![MapEntry {
        key: Expr::string("p"),
        value: Expr::List(vec![Expr::string(address)]),
    }])
}
