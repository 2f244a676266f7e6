//! Minimal CLI: schema file + JSON documents → typed models
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, Args};
use colored::Colorize;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::SchemaFile;
use crate::error::ModelError;
use crate::model::ModelContext;
use crate::properties::{DeserializerTable, Resolution};
use crate::registry::DeserializerRegistry;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// hydrate JSON/NDJSON documents into models declared in a schema file
#[derive(Parser, Debug)]
#[command(name = "json-models", version)]
pub struct CommandLineInterface {
    /// tracing filter, e.g. `debug` or `json_models=trace` (defaults to RUST_LOG, then `warn`)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// hydrate every input document into the given model and print the typed result
    Hydrate(HydrateOut),
    /// print each model's type definitions and deserializer resolution
    Interpret(InterpretOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct HydrateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// schema file declaring the model classes
    #[arg(long)]
    schema: PathBuf,

    /// name of the model every document is hydrated into
    #[arg(long)]
    model: String,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// write the documents that did hydrate even when others failed
    #[arg(long)]
    keep_going: bool,
}

#[derive(clap::Parser, Debug)]
struct InterpretOut {
    /// schema file declaring the model classes
    #[arg(long)]
    schema: PathBuf,

    /// only this model (all models if omitted)
    #[arg(long)]
    model: Option<String>,
}

/// One input document, labelled with where it came from.
#[derive(Debug)]
struct Document {
    source: String,
    value: serde_json::Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            let values = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(index, line)| {
                        serde_json::from_str::<serde_json::Value>(line).with_context(|| {
                            format!("failed to parse NDJSON line {} ({source_path_str})", index + 1)
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                vec![serde_json::from_str::<serde_json::Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?]
            };
            let many = values.len() > 1;
            for (index, json_value) in values.into_iter().enumerate() {
                let label = if many { format!("{source_path_str}:{}", index + 1) } else { source_path_str.clone() };
                self.process(label, json_value, &mut documents)?;
            }
        }
        tracing::debug!(documents = documents.len(), "loaded input documents");
        Ok(documents)
    }

    fn process(&self, source: String, json_value: serde_json::Value, out: &mut Vec<Document>) -> Result<()> {
        let json_value = match self.json_pointer.as_deref() {
            None => json_value,
            Some(pointer) => json_value
                .pointer(pointer)
                .cloned()
                .with_context(|| format!("JSON pointer {pointer} selects nothing in ({source})"))?,
        };
        match self.jq_expr.as_ref() {
            None => out.push(Document { source, value: json_value }),
            Some(jq_expr) => {
                let result = crate::jq_exec::run_jaq(jq_expr, &json_value, &source)?;
                for value in result {
                    out.push(Document { source: source.clone(), value });
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        init_tracing(self.log_level.as_deref());
        match &self.cmd {
            Command::Hydrate(target) => target.run(),
            Command::Interpret(target) => target.run(),
        }
    }
}

impl HydrateOut {
    fn run(&self) -> Result<()> {
        let ctx = load_context(&self.schema)?;
        ctx.model_class(&self.model)?;
        let documents = self.input_settings.load_documents()?;

        let results: Vec<(String, Result<serde_json::Value, ModelError>)> = documents
            .into_par_iter()
            .map(|doc| {
                let hydrated = ctx.model(&self.model, doc.value).map(|model| model.to_json());
                (doc.source, hydrated)
            })
            .collect();

        let mut hydrated = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        for (source, result) in results {
            match result {
                Ok(value) => hydrated.push(value),
                Err(error) => {
                    failed += 1;
                    eprintln!("{} {}: {}", "✗".red().bold(), source, error);
                }
            }
        }
        eprintln!(
            "{} hydrated, {} failed",
            hydrated.len().to_string().green(),
            if failed > 0 { failed.to_string().red() } else { failed.to_string().normal() },
        );
        if failed > 0 && !self.keep_going {
            bail!("{failed} document(s) failed to hydrate into `{}`", self.model);
        }

        let output = match hydrated.len() {
            1 => hydrated.remove(0),
            _ => serde_json::Value::Array(hydrated),
        };
        let output_src = serde_json::to_string_pretty(&output)?;
        write_output(self.out.as_deref(), &output_src)
    }
}

impl InterpretOut {
    fn run(&self) -> Result<()> {
        let ctx = load_context(&self.schema)?;
        let classes = match self.model.as_deref() {
            Some(name) => vec![ctx.model_class(name)?.clone()],
            None => ctx.catalog().models().cloned().collect(),
        };
        for class in classes {
            let definitions = class.definitions(ctx.catalog())?;
            let table = if class.coerces() {
                DeserializerTable::infer(&definitions, class.explicit_deserializers(), &ctx)
            } else {
                DeserializerTable::default()
            };
            println!("{}", class.name().bold());
            for (key, definition) in definitions.iter() {
                let state = match table.resolution(key) {
                    Some(resolution) => paint_resolution(resolution),
                    None => "no coercion".dimmed().to_string(),
                };
                let mandatory = if class.mandatory().contains(key) { " (mandatory)" } else { "" };
                println!("  {key}: {}{mandatory} [{state}]", definition.canonical_form());
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The CLI is the host: it bootstraps the global registry, then applies the
/// schema file on top.
fn load_context(schema_path: &Path) -> Result<ModelContext> {
    let schema = SchemaFile::load(schema_path)
        .with_context(|| format!("failed to load schema file ({})", schema_path.display()))?;
    let registry = DeserializerRegistry::global();
    registry.register_defaults();
    let ctx = schema.context(Arc::clone(&registry))?;
    Ok(ctx)
}

fn paint_resolution(resolution: &Resolution) -> String {
    let name = resolution.state_name();
    match resolution {
        Resolution::Explicit(_) => name.cyan().to_string(),
        Resolution::Inferred(_) => name.green().to_string(),
        Resolution::Fallback(_) => name.yellow().to_string(),
        Resolution::Unavailable => name.dimmed().to_string(),
    }
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, src)?;
        }
        None => println!("{src}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
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
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
