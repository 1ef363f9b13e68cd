//! Minimal CLI: field JSON → zod module, zod module → field JSON.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::diagnostics::Anomaly;
use crate::emit::{emit_module, EmitOptions};
use crate::field::{validation_summary, Field};
use crate::samples::SampleRegistry;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build zod validation schemas from field trees, and field trees back from zod schemas
#[derive(Parser, Debug)]
#[command(name = "zod-designer", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit a zod schema module for each field tree
    Emit(EmitOut),
    /// load a zod schema module and print the reflected field tree
    Reflect(ReflectOut),
    /// print a field tree with its validations
    Tree(TreeOut),
    /// inspect the built-in sample schemas
    #[command(subcommand)]
    Samples(SamplesCmd),
}

#[derive(Args, Debug, Clone)]
struct EmitSettings {
    /// embed labels, descriptions, enum values and patterns without escaping
    #[arg(long, default_value_t = false)]
    verbatim: bool,

    /// fail when any anomaly is reported
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(clap::Parser, Debug)]
struct EmitOut {
    /// One or more field tree JSON files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// write `<stem>.ts` files into this directory (stdout if omitted)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[command(flatten)]
    settings: EmitSettings,
}

#[derive(clap::Parser, Debug)]
struct ReflectOut {
    /// zod schema module (.ts / .js)
    #[arg(long, short)]
    input: PathBuf,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// fail when any anomaly is reported
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(clap::Parser, Debug)]
struct TreeOut {
    /// field tree JSON file
    #[arg(long, short)]
    input: PathBuf,
}

#[derive(Subcommand, Debug)]
enum SamplesCmd {
    /// list the sample collections
    List,
    /// print a sample collection as field tree JSON
    Show { key: String },
    /// emit a sample collection as a zod module
    Emit {
        key: String,
        #[command(flatten)]
        settings: EmitSettings,
    },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl EmitSettings {
    fn options(&self) -> EmitOptions {
        if self.verbatim { EmitOptions::verbatim() } else { EmitOptions::default() }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Emit(target) => {
                let options = target.settings.options();
                let source_paths = resolve_file_path_patterns(&target.input)?;
                for source_path in source_paths {
                    let field = read_field(&source_path)?;
                    let emitted = emit_module(&field, &options);
                    report(&source_path.display().to_string(), &emitted.anomalies, target.settings.strict)?;
                    match target.out_dir.as_ref() {
                        Some(dir) => {
                            let stem = source_path
                                .file_stem()
                                .with_context(|| format!("no file name in {}", source_path.display()))?;
                            let out = dir.join(stem).with_extension("ts");
                            write_output(&out, &emitted.source)?;
                        }
                        None => println!("{}\n", emitted.source),
                    }
                }
            }
            Command::Reflect(target) => {
                let source = std::fs::read_to_string(&target.input)
                    .with_context(|| format!("failed to read {}", target.input.display()))?;
                let module = crate::loader::load(&source)
                    .with_context(|| format!("failed to load schema module {}", target.input.display()))?;
                let reflected = match module.name.as_deref() {
                    Some(name) => crate::reflect::reflect_named(&module.validator, name),
                    None => crate::reflect::reflect(&module.validator),
                };
                report(&target.input.display().to_string(), &reflected.anomalies, target.strict)?;
                let json = serde_json::to_string_pretty(&reflected.field)?;
                match target.out.as_ref() {
                    Some(out) => write_output(out, &json)?,
                    None => println!("{json}"),
                }
            }
            Command::Tree(target) => {
                let field = read_field(&target.input)?;
                print_tree(&field, 0);
            }
            Command::Samples(cmd) => run_samples(cmd)?,
        }
        Ok(())
    }
}

fn run_samples(cmd: &SamplesCmd) -> Result<()> {
    let registry = SampleRegistry::builtin();
    match cmd {
        SamplesCmd::List => {
            for (key, field) in registry.iter() {
                println!("{:<10} {} ({} fields)", key.bold(), field.name, field.count() - 1);
            }
        }
        SamplesCmd::Show { key } => {
            let field = sample(&registry, key)?;
            println!("{}", serde_json::to_string_pretty(field)?);
        }
        SamplesCmd::Emit { key, settings } => {
            let field = sample(&registry, key)?;
            let emitted = emit_module(field, &settings.options());
            report(key, &emitted.anomalies, settings.strict)?;
            println!("{}", emitted.source);
        }
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn sample<'a>(registry: &'a SampleRegistry, key: &str) -> Result<&'a Field> {
    registry.get(key).with_context(|| {
        let known = registry.keys().collect::<Vec<_>>().join(", ");
        format!("no sample named `{key}` (known: {known})")
    })
}

fn read_field(path: &Path) -> Result<Field> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let field = crate::path_de::field_from_json(&source)
        .with_context(|| format!("failed to parse field tree ({})", path.display()))?;
    Ok(field)
}

fn write_output(out: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), "wrote output");
    Ok(())
}

fn report(origin: &str, anomalies: &[Anomaly], strict: bool) -> Result<()> {
    for anomaly in anomalies {
        tracing::warn!(origin, %anomaly, "anomaly");
    }
    if strict && !anomalies.is_empty() {
        bail!("{origin}: {} anomal{} reported", anomalies.len(), if anomalies.len() == 1 { "y" } else { "ies" });
    }
    Ok(())
}

fn print_tree(field: &Field, depth: usize) {
    let summary = validation_summary(field.validations.as_ref());
    let mut line = format!("{}{}: {}", "  ".repeat(depth), field.name.bold(), field.ty.to_string().cyan());
    if let Some(values) = &field.enum_values {
        line.push_str(&format!(" <{}>", values.join(" | ")));
    }
    if !summary.is_empty() {
        line.push_str(&format!(" [{}]", summary.yellow()));
    }
    if let Some(description) = &field.description {
        line.push_str(&format!(" {}", description.dimmed()));
    }
    println!("{line}");
    for child in field.children() {
        print_tree(child, depth + 1);
    }
}

pub(crate) fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
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
