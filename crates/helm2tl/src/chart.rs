//! Chart entity and chart driver (spec.md §3 "Chart entity", §4.5 "Chart
//! driver").
//!
//! The driver recursively flattens a chart's (and every subchart's)
//! template set, compiles each one via [`crate::translate::compile_template`],
//! deep-allocates every chart's default values into one shared heap, and
//! wires the result into a single `chartMain(...)` call prepended by the
//! fixed runtime prologue.

use std::collections::HashSet;

use crate::ast::Node;
use crate::bindgen;
use crate::error::ChartError;
use crate::heap_encode::{self, HeapBuilder, Value};
use crate::ir::{Binding, Expr, MapEntry};
use crate::prologue::PROLOGUE_SOURCE;
use crate::translate::{compile_template, TranslateCtx};

/// A chart (or subchart), per spec.md §3 "Chart entity".
#[derive(Debug, Clone)]
pub struct Chart {
    pub name: String,
    pub version: String,
    pub app_version: String,
    pub template_base_path: String,
    pub condition: Option<String>,
    /// Sorted; the set of output keys this chart's templates render.
    pub rendered_keys: Vec<String>,
    pub values: Value,
    pub crds: Vec<(String, Vec<u8>)>,
    pub files: Vec<(String, Vec<u8>)>,
    pub sub_charts: Vec<Chart>,
    /// This chart's own templates, keyed by filename; flattened together
    /// with every subchart's during compilation (spec.md §4.5 step 1).
    pub templates: Vec<(String, Node)>,
}

/// The root chart additionally carries capabilities (spec.md §3: "The
/// root additionally carries `capabilities` (opaque metadata)").
#[derive(Debug, Clone)]
pub struct RootChart {
    pub chart: Chart,
    pub capabilities: Value,
}

/// Knobs that don't change compilation semantics (spec.md §5: sorting
/// and determinism are invariants, not options) — see SPEC_FULL.md §4.10.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub float_precision: usize,
    pub reset_bind_counter: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { float_precision: 6, reset_bind_counter: true }
    }
}

/// Compiles `root` into the final TL document: the fixed prologue, a
/// blank line, then the printed root expression (spec.md §4.5 step 5,
/// §6 "Output format").
pub fn compile_chart(root: &RootChart, options: &CompileOptions) -> Result<String, ChartError> {
    if options.reset_bind_counter {
        bindgen::reset();
    }

    detect_subchart_cycle(&root.chart, &mut Vec::new())?;

    let mut template_names = HashSet::new();
    collect_template_names(&root.chart, &mut template_names);
    let ctx = TranslateCtx { template_names: &template_names };

    let mut compiled = Vec::new();
    collect_compiled_templates(&root.chart, &ctx, &mut compiled)?;
    compiled.sort_by(|a, b| a.0.cmp(&b.0));
    let templates_map = Expr::MapLiteral(
        compiled.into_iter().map(|(name, body)| MapEntry { key: Expr::string(&name), value: body }).collect(),
    );

    let mut heap = HeapBuilder::new();
    let root_metadata = build_chart_metadata(&root.chart, &mut heap);
    let heap_expr = heap.into_heap_expr();
    let capabilities_expr = heap_encode::convert_into_tl(&root.capabilities);

    let chart_main = Expr::call_named("chartMain", vec![
        capabilities_expr,
        root_metadata,
        heap_expr,
        Expr::ident("$"),
    ]);
    let root_expr = Expr::Local(vec![Binding { name: "$".into(), body: templates_map }], Box::new(chart_main));

    Ok(format!("{PROLOGUE_SOURCE}\n\n{}", root_expr.print_with_float_precision(options.float_precision)))
}

fn detect_subchart_cycle<'a>(chart: &'a Chart, stack: &mut Vec<&'a str>) -> Result<(), ChartError> {
    if stack.contains(&chart.name.as_str()) {
        return Err(ChartError::SubchartCycle { chart: chart.name.clone() });
    }
    stack.push(&chart.name);
    for sub in &chart.sub_charts {
        detect_subchart_cycle(sub, stack)?;
    }
    stack.pop();
    Ok(())
}

fn collect_template_names(chart: &Chart, names: &mut HashSet<String>) {
    for (name, _) in &chart.templates {
        names.insert(name.clone());
    }
    for sub in &chart.sub_charts {
        collect_template_names(sub, names);
    }
}

fn collect_compiled_templates(
    chart: &Chart,
    ctx: &TranslateCtx,
    out: &mut Vec<(String, Expr)>,
) -> Result<(), ChartError> {
    for (name, body) in &chart.templates {
        let compiled = compile_template(body, ctx)?;
        out.push((name.clone(), compiled));
    }
    for sub in &chart.sub_charts {
        collect_compiled_templates(sub, ctx, out)?;
    }
    Ok(())
}

/// Builds a `chartMetadata(...)` call for `chart`, deep-allocating its
/// default values into the shared `heap` and recursing into subcharts
/// for `subChartMetadataList` (spec.md §4.5 steps 2-3).
fn build_chart_metadata(chart: &Chart, heap: &mut HeapBuilder) -> Expr {
    let default_values_ptr = heap.deep_allocate(&chart.values);
    let sub_chart_metadata: Vec<Expr> = chart.sub_charts.iter().map(|sub| build_chart_metadata(sub, heap)).collect();
    let condition_expr = match &chart.condition {
        Some(c) => Expr::string(c),
        None => Expr::Null,
    };
    let crds_expr = Expr::List(
        chart
            .crds
            .iter()
            .map(|(name, bytes)| Expr::List(vec![Expr::string(name), bytes_literal(bytes)]))
            .collect(),
    );
    let files_expr = Expr::MapLiteral(
        chart
            .files
            .iter()
            .map(|(name, bytes)| MapEntry { key: Expr::string(name), value: bytes_literal(bytes) })
            .collect(),
    );
    Expr::call_named("chartMetadata", vec![
        Expr::string(&chart.name),
        Expr::string(&chart.version),
        Expr::string(&chart.app_version),
        Expr::string(&chart.template_base_path),
        condition_expr,
        Expr::List(chart.rendered_keys.iter().map(Expr::string).collect()),
        default_values_ptr,
        crds_expr,
        files_expr,
        Expr::List(sub_chart_metadata),
    ])
}

fn bytes_literal(bytes: &[u8]) -> Expr {
    Expr::StringLiteral(bytes.to_vec())
}
