use std::{env, fs, path::Path, process::ExitCode, time::Instant};

use helm2tl::loader::{FsChartLoader, ParsedFile, TemplateParser};
use helm2tl::{compile_chart, CompileOptions};

mod parser;

/// Hand-rolled recursive-descent Helm template parser (spec.md §1
/// "parsing... is assumed provided"; SPEC_FULL.md §4.11). Wires
/// [`parser::parse_template`] into the loader's [`TemplateParser`] seam.
struct HelmTemplateParser;

impl TemplateParser for HelmTemplateParser {
    fn parse(&self, source: &str, _file_name: &str) -> Result<ParsedFile, String> {
        parser::parse_template(source).map_err(|e| e.to_string())
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: helm2tl <chart-dir> [output-path]");
        return ExitCode::FAILURE;
    }
    let chart_dir = Path::new(&args[1]);
    let output_path = args.get(2).map(String::as_str);

    let parser = HelmTemplateParser;
    let loader = FsChartLoader::new(&parser);

    let start = Instant::now();
    let root = match loader.load_root(chart_dir) {
        Ok(root) => root,
        Err(err) => {
            eprintln!("error loading chart: {err}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("loading: {:?}", start.elapsed());

    let start = Instant::now();
    let document = match compile_chart(&root, &CompileOptions::default()) {
        Ok(doc) => doc,
        Err(err) => {
            eprintln!("error compiling chart: {err}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("translating + printing: {:?}", start.elapsed());

    match output_path {
        Some(path) => {
            if let Err(err) = fs::write(path, document) {
                eprintln!("error writing {path}: {err}");
                return ExitCode::FAILURE;
            }
        }
        None => println!("{document}"),
    }

    ExitCode::SUCCESS
}
