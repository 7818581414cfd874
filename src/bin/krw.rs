//! krw - Kubernetes manifest rewrite CLI tool
//!
//! Applies search and mutation recipes to multi-document YAML manifests.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use kube_rewrite::jsonpath::PathExpression;
use kube_rewrite::model::{Manifest, ResourceModel};
use kube_rewrite::recipe::{self, RecipeConfig};
use kube_rewrite::value;

#[derive(Parser, Debug)]
#[command(name = "krw")]
#[command(author, version, about = "Search and rewrite Kubernetes manifests")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a recipe to every document of a manifest
    Run {
        /// Recipe configuration file (YAML)
        #[arg(short, long, value_name = "FILE")]
        recipe: PathBuf,

        /// Output location. Use '-' for stdout
        #[arg(short, long, default_value = "-")]
        output: String,

        /// Manifest to process
        manifest: PathBuf,
    },

    /// Print the locations a path expression selects
    Query {
        /// Path expression, e.g. '$..containers[*].image'
        expression: String,

        /// Manifest to query
        manifest: PathBuf,
    },

    /// Print the resource model of every document as JSON
    Model {
        /// Manifest to inspect
        manifest: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "kube_rewrite=debug,krw=debug"
    } else {
        "kube_rewrite=info,krw=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command) -> Result<()> {
    match command {
        Command::Run {
            recipe,
            output,
            manifest,
        } => run(&recipe, &output, &manifest),
        Command::Query {
            expression,
            manifest,
        } => query(&expression, &manifest),
        Command::Model { manifest } => model(&manifest),
    }
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest = Manifest::parse(&content)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
    debug!(path = %path.display(), documents = manifest.len(), "loaded manifest");
    Ok(manifest)
}

fn open_output(output: &str) -> Result<Box<dyn Write>> {
    if output == "-" {
        return Ok(Box::new(io::stdout()));
    }
    let file = fs::File::create(output)
        .with_context(|| format!("Failed to create output file {}", output))?;
    Ok(Box::new(file))
}

fn run(recipe_path: &Path, output: &str, manifest_path: &Path) -> Result<()> {
    let config = fs::read_to_string(recipe_path)
        .with_context(|| format!("Failed to read recipe {}", recipe_path.display()))?;
    let compiled = RecipeConfig::from_yaml(&config)
        .and_then(|c| c.build())
        .with_context(|| format!("Invalid recipe {}", recipe_path.display()))?;
    let manifest = read_manifest(manifest_path)?;

    let outcome = recipe::run(compiled.as_ref(), &manifest);

    let mut out = open_output(output)?;
    write!(out, "{}", outcome.manifest.to_yaml()?)?;
    out.flush()?;

    let stderr = io::stderr();
    let mut err = stderr.lock();
    for (index, finding) in &outcome.findings {
        writeln!(err, "[{}] {}", index, finding)?;
    }
    for (index, error) in &outcome.errors {
        writeln!(err, "[{}] error: {}", index, error)?;
    }
    if !outcome.is_ok() {
        bail!(
            "Recipe {} failed on {} document(s); they were written unchanged",
            compiled.name(),
            outcome.errors.len()
        );
    }
    Ok(())
}

fn query(expression: &str, manifest_path: &Path) -> Result<()> {
    let expression = PathExpression::parse(expression)?;
    let manifest = read_manifest(manifest_path)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (index, document) in manifest.documents.iter().enumerate() {
        for cursor in expression.find(document.root()) {
            let rendered = value::to_yaml(cursor.node())?;
            writeln!(out, "[{}] {}", index, cursor)?;
            for line in rendered.lines() {
                writeln!(out, "    {}", line)?;
            }
        }
    }
    Ok(())
}

fn model(manifest_path: &Path) -> Result<()> {
    let manifest = read_manifest(manifest_path)?;
    let models: Vec<&ResourceModel> = manifest.documents.iter().map(|d| d.model()).collect();
    let json = serde_json::to_string_pretty(&models).context("Failed to render models")?;
    println!("{}", json);
    Ok(())
}
