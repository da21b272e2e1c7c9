//! Run every bundled sample catalog and check the schema-level guarantees.
//!
//! `*.fail.json` samples must fail inference; all others must succeed with
//! unique tags per message and one definition per name.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use proto_osi::catalog::Catalog;
use proto_osi::ir::Schema;
use proto_osi::Inference;

fn check_invariants(schema: &Schema) -> Result<()> {
    for message in schema.messages() {
        let mut tags = BTreeSet::new();
        for field in &message.fields {
            if !tags.insert(field.tag) {
                bail!("message `{}` reuses tag {}", message.name, field.tag);
            }
        }
    }
    let mut names = BTreeSet::new();
    for name in schema.element_names() {
        if !names.insert(name) {
            bail!("`{name}` is defined more than once");
        }
    }
    Ok(())
}

fn run_sample(path: &Path) -> Result<()> {
    let expect_failure = path.to_string_lossy().ends_with(".fail.json");
    let catalog = Catalog::load(path)?;
    let root = catalog.root(None)?;
    let inference = Inference::new();

    match inference.infer(&catalog, &root) {
        Ok(_) if expect_failure => bail!("expected inference to fail"),
        Ok(schema) => {
            check_invariants(&schema)?;
            // same input, same output
            let again = inference.infer(&catalog, &root)?;
            if again != schema {
                bail!("second run differs from the first");
            }
            Ok(())
        }
        Err(error) if expect_failure => {
            eprintln!("   expected failure: {error}");
            Ok(())
        }
        Err(error) => Err(error).context("inference failed"),
    }
}

fn main() -> ExitCode {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../samples")));
    let pattern = format!("{}/*.json", dir.display());

    let paths: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
        Err(error) => {
            eprintln!("bad sample pattern {pattern}: {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0;
    for path in &paths {
        match run_sample(path) {
            Ok(()) => eprintln!("✅ {}", path.display()),
            Err(error) => {
                failed += 1;
                eprintln!("❌ {}: {error:#}", path.display());
            }
        }
    }
    eprintln!("{} samples, {failed} failed", paths.len());
    if failed == 0 && !paths.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
