//! Minimal CLI: catalog(s) → inferred schema (JSON view) or a pass/fail check.
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing::info;

use proto_osi::catalog::Catalog;
use proto_osi::emit::emit_schema;
use proto_osi::inference::{Inference, InferenceOptions, DEFAULT_MAP_ENTRY_NAME};
use proto_osi::ir::Schema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// infer a wire schema (messages, fields, map entries) from JSON type catalogs
#[derive(Parser, Debug)]
#[command(name = "proto-osi")]
pub struct CommandLineInterface {
    /// more logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// infer and print the JSON view of each schema
    Infer(InferOut),
    /// infer every input and report which ones produce a well-formed schema
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JQ pre-process filter for each document (each output is one catalog)
    #[arg(long)]
    jq_expr: Option<String>,

    /// root type to infer from (defaults to each catalog's own `root`)
    #[arg(long)]
    root: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct InferenceSettings {
    /// name of the first synthetic map entry type
    #[arg(long, default_value = DEFAULT_MAP_ENTRY_NAME)]
    map_entry_name: String,

    /// leave documentation strings out of the schema
    #[arg(long)]
    no_documentation: bool,
}

#[derive(clap::Parser, Debug)]
struct InferOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    inference_settings: InferenceSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    inference_settings: InferenceSettings,
}

/// One catalog document and where it came from.
struct Source {
    label: String,
    catalog: Catalog,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Vec<Source>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|error| anyhow!("failed to resolve input file paths: {error}"))?;

        let mut out = Vec::new();
        for source_path in source_paths {
            let label = source_path.to_string_lossy().to_string();
            match self.jq_expr.as_ref() {
                None => {
                    let catalog = Catalog::load(&source_path)?;
                    out.push(Source { label, catalog });
                }
                Some(jq_expr) => {
                    let source = std::fs::read_to_string(&source_path)
                        .with_context(|| format!("failed to read source file ({label})"))?;
                    let json_value = serde_json::from_str::<serde_json::Value>(&source)
                        .with_context(|| format!("failed to parse JSON source file ({label})"))?;
                    let docs = crate::jq_exec::run_jaq(jq_expr, &json_value)
                        .with_context(|| format!("failed to apply jq expression to source file ({label})"))?;
                    for (ix, doc) in docs.into_iter().enumerate() {
                        let catalog = Catalog::from_value(doc)
                            .with_context(|| format!("jq output #{ix} of {label}"))?;
                        out.push(Source { label: format!("{label}#{ix}"), catalog });
                    }
                }
            }
        }
        Ok(out)
    }
}

impl InferenceSettings {
    fn inference(&self) -> Inference {
        Inference::with_options(InferenceOptions {
            map_entry_name: self.map_entry_name.clone(),
            documentation: !self.no_documentation,
        })
    }
}

/// Independent runs, one per source; each run owns its own registry.
fn infer_all(sources: &[Source], root: Option<&str>, inference: &Inference) -> Vec<Result<Schema>> {
    sources
        .par_iter()
        .map(|source| {
            let root = source.catalog.root(root).with_context(|| source.label.clone())?;
            inference
                .infer(&source.catalog, &root)
                .with_context(|| format!("{}: inference from `{root}` failed", source.label))
        })
        .collect()
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Infer(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let sources = target.input_settings.load()?;
                let inference = target.inference_settings.inference();
                let results = infer_all(&sources, target.input_settings.root.as_deref(), &inference);

                let mut views = Vec::with_capacity(results.len());
                for (source, result) in sources.iter().zip(results) {
                    let schema = result?;
                    views.push(serde_json::json!({ "source": source.label, "schema": emit_schema(&schema) }));
                }
                let output = match views.len() {
                    1 => {
                        let mut only = views.remove(0);
                        only["schema"].take()
                    }
                    _ => serde_json::Value::Array(views),
                };
                let schema_src = serde_json::to_string_pretty(&output)?;

                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &schema_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    info!(out = %out.display(), "schema written");
                } else {
                    println!("{schema_src}");
                }
                Ok(())
            }
            Command::Check(target) => {
                let sources = target.input_settings.load()?;
                let inference = target.inference_settings.inference();
                let results = infer_all(&sources, target.input_settings.root.as_deref(), &inference);

                let mut failed = 0usize;
                for (source, result) in sources.iter().zip(results) {
                    match result {
                        Ok(schema) => {
                            let messages = schema.messages().len();
                            println!(
                                "{} {}: {} ({} messages, {} top-level types)",
                                "ok".green().bold(),
                                source.label,
                                schema.root.name,
                                messages,
                                schema.top_level.len(),
                            );
                        }
                        Err(error) => {
                            failed += 1;
                            println!("{} {error:#}", "FAILED".red().bold());
                        }
                    }
                }
                if failed > 0 {
                    return Err(anyhow!("{failed} of {} inputs failed", sources.len()));
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_infer_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "proto-osi", "-vv", "infer", "-i", "a.json", "b.json",
            "--root", "demo.Team", "--map-entry-name", "Entry", "--no-documentation",
        ]).unwrap();
        assert_eq!(cli.verbosity(), 2);
        let Command::Infer(target) = &cli.cmd else { panic!("expected infer") };
        assert_eq!(target.input_settings.input, vec!["a.json", "b.json"]);
        let options = target.inference_settings.inference();
        assert_eq!(options.options().map_entry_name, "Entry");
        assert!(!options.options().documentation);
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["x/y.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("x/y.json")]);
        assert!(resolve_file_path_patterns(["/definitely/not/here/*.json"]).is_err());
    }

    #[test]
    fn runs_are_independent_per_source() {
        let good = Catalog::from_value(serde_json::json!({
            "root": "A", "types": { "A": { "kind": "record", "properties": [{ "name": "x", "type": "string" }] } }
        })).unwrap();
        let bad = Catalog::from_value(serde_json::json!({
            "root": "B", "types": { "B": { "kind": "record", "properties": [
                { "name": "m", "type": { "map": { "key": "float", "value": "string" } } }
            ] } }
        })).unwrap();
        let sources = vec![
            Source { label: "good".into(), catalog: good },
            Source { label: "bad".into(), catalog: bad },
        ];
        let results = infer_all(&sources, None, &Inference::new());
        assert!(results[0].is_ok());
        assert!(format!("{:#}", results[1].as_ref().unwrap_err()).contains("illegal key type"));
    }
}
