//! Chart filesystem loading (spec.md §6 "Chart filesystem layout",
//! SPEC_FULL.md §4.11 "CLI").
//!
//! Parsing template *text* into [`crate::ast::Node`] is an external
//! concern this library deliberately doesn't own (spec.md §1); this
//! module only reads chart directories off disk and defers the template
//! bodies themselves to a caller-supplied [`TemplateParser`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ast::Node;
use crate::chart::{Chart, RootChart};
use crate::heap_encode::Value;

/// The result of parsing one template file: the file's own top-level
/// content (`root` — what the file renders as itself, keyed by filename),
/// plus any named sub-templates the file defines (`defines` — Helm's
/// `{{define "name"}}...{{end}}` blocks, which contribute entries to the
/// compiled chart's template map under their own name rather than the
/// filename, and never appear in `renderedKeys`).
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub root: Node,
    pub defines: Vec<(String, Node)>,
}

/// Parses one template file's source text into its AST. The library
/// never implements this itself; `helm2tl-cli` supplies a concrete
/// parser (spec.md §1 "parsing... is assumed provided").
pub trait TemplateParser {
    fn parse(&self, source: &str, file_name: &str) -> Result<ParsedFile, String>;
}

#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, message: String },
    Yaml { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Yaml { path, message } => write!(f, "{}: invalid YAML: {message}", path.display()),
            Self::Parse { path, message } => write!(f, "{}: template parse error: {message}", path.display()),
        }
    }
}

impl std::error::Error for LoadError {}

#[derive(Debug, Deserialize)]
struct ChartYaml {
    name: String,
    version: String,
    #[serde(rename = "appVersion", default)]
    app_version: Option<String>,
    #[serde(default)]
    condition: Option<String>,
}

/// Loads a chart directory tree (spec.md §6 "Chart filesystem layout")
/// into a [`RootChart`], recursing into `charts/<subchart>/`.
pub struct FsChartLoader<'p> {
    parser: &'p dyn TemplateParser,
}

impl<'p> FsChartLoader<'p> {
    pub fn new(parser: &'p dyn TemplateParser) -> Self {
        Self { parser }
    }

    pub fn load_root(&self, dir: &Path) -> Result<RootChart, LoadError> {
        let chart = self.load_chart(dir)?;
        Ok(RootChart { chart, capabilities: Value::Map(Vec::new()) })
    }

    fn load_chart(&self, dir: &Path) -> Result<Chart, LoadError> {
        let meta = self.load_chart_yaml(&dir.join("Chart.yaml"))?;
        let values = self.load_values_yaml(&dir.join("values.yaml"))?;
        let (file_names, templates) = self.load_templates(&dir.join("templates"))?;
        let mut rendered_keys: Vec<String> =
            file_names.into_iter().filter(|name| !is_excluded_from_rendered_keys(name)).collect();
        rendered_keys.sort();
        let crds = self.load_byte_files(&dir.join("crds"), "yaml")?;
        let files = self.load_byte_files(&dir.join("templates"), "*")?;
        let sub_charts = self.load_subcharts(&dir.join("charts"))?;

        Ok(Chart {
            name: meta.name,
            version: meta.version,
            app_version: meta.app_version.unwrap_or_default(),
            template_base_path: dir.join("templates").to_string_lossy().into_owned(),
            condition: meta.condition,
            rendered_keys,
            values,
            crds,
            files,
            sub_charts,
            templates,
        })
    }

    fn load_chart_yaml(&self, path: &Path) -> Result<ChartYaml, LoadError> {
        let text = read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|e| LoadError::Yaml { path: path.to_owned(), message: e.to_string() })
    }

    fn load_values_yaml(&self, path: &Path) -> Result<Value, LoadError> {
        if !path.exists() {
            return Ok(Value::Map(Vec::new()));
        }
        let text = read_to_string(path)?;
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&text).map_err(|e| LoadError::Yaml { path: path.to_owned(), message: e.to_string() })?;
        Ok(yaml_to_value(&yaml))
    }

    /// Returns the sorted list of file names (used to compute
    /// `renderedKeys`) and the full set of compiled-template entries: one
    /// per file (keyed by filename) plus one per `{{define}}` block any
    /// file contributes (keyed by its defined name).
    fn load_templates(&self, dir: &Path) -> Result<(Vec<String>, Vec<(String, Node)>), LoadError> {
        let mut file_names = Vec::new();
        let mut templates = Vec::new();
        if !dir.exists() {
            return Ok((file_names, templates));
        }
        for entry in read_dir_sorted(dir)? {
            if !entry.is_file() {
                continue;
            }
            let name = file_name_string(&entry);
            let source = read_to_string(&entry)?;
            let parsed = self
                .parser
                .parse(&source, &name)
                .map_err(|message| LoadError::Parse { path: entry.clone(), message })?;
            file_names.push(name.clone());
            templates.push((name, parsed.root));
            templates.extend(parsed.defines);
        }
        file_names.sort();
        templates.sort_by(|a, b| a.0.cmp(&b.0));
        Ok((file_names, templates))
    }

    fn load_byte_files(&self, dir: &Path, ext_filter: &str) -> Result<Vec<(String, Vec<u8>)>, LoadError> {
        let mut out = Vec::new();
        if !dir.exists() {
            return Ok(out);
        }
        for entry in read_dir_sorted(dir)? {
            if !entry.is_file() {
                continue;
            }
            if ext_filter != "*" && entry.extension().and_then(|e| e.to_str()) != Some(ext_filter) {
                continue;
            }
            let bytes = fs::read(&entry).map_err(|e| LoadError::Io { path: entry.clone(), message: e.to_string() })?;
            out.push((file_name_string(&entry), bytes));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn load_subcharts(&self, dir: &Path) -> Result<Vec<Chart>, LoadError> {
        let mut out = Vec::new();
        if !dir.exists() {
            return Ok(out);
        }
        for entry in read_dir_sorted(dir)? {
            if entry.is_dir() {
                out.push(self.load_chart(&entry)?);
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

/// `templates/_*` (partials) and `templates/NOTES.txt` are excluded from
/// `renderedKeys` but remain compilable for inclusion (spec.md §6).
fn is_excluded_from_rendered_keys(name: &str) -> bool {
    name.starts_with('_') || name == "NOTES.txt"
}

fn read_to_string(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|e| LoadError::Io { path: path.to_owned(), message: e.to_string() })
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| LoadError::Io { path: dir.to_owned(), message: e.to_string() })?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    Ok(entries)
}

fn file_name_string(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn yaml_to_value(yaml: &serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_yaml::Value::String(s) => Value::Str(s.clone()),
        serde_yaml::Value::Sequence(items) => Value::List(Some(items.iter().map(yaml_to_value).collect())),
        serde_yaml::Value::Mapping(map) => {
            let entries = map
                .iter()
                .map(|(k, v)| (yaml_key_to_string(k), yaml_to_value(v)))
                .collect();
            Value::Map(entries)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

fn yaml_key_to_string(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        other => yaml_to_value(other).debug_key(),
    }
}

impl Value {
    /// Best-effort string rendering of a non-string map key (YAML allows
    /// non-string keys; chart values in practice never use them).
    fn debug_key(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Float(f) => f.to_string(),
            _ => String::new(),
        }
    }
}
