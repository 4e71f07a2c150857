//! Minimal CLI: catalog → (go source | report)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::generate::{GenerateOptions, GeneratedUnit, generate_from_json};
use crate::locate::{ModuleLocator, PackageLocator, write_unit};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate struct-to-struct conversion code from a JSON descriptor catalog
#[derive(Parser, Debug)]
#[command(name = "stos", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate the mapper implementation
    Generate(GenerateOut),
    /// generate in memory and print the run report as JSON
    Inspect(InspectOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more descriptor catalogs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// package path to leave out of the import block (repeatable; default: time)
    #[arg(long = "deny-import")]
    deny_import: Vec<String>,

    /// import every reachable package, ignoring the denylist
    #[arg(long, default_value_t = false, conflicts_with = "deny_import")]
    no_import_denylist: bool,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .go file (stdout if omitted); single input only
    #[arg(short, long, conflicts_with = "module_root")]
    out: Option<PathBuf>,

    /// Go module root (directory holding go.mod); each unit is written next to its interface
    #[arg(long)]
    module_root: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn options(&self) -> GenerateOptions {
        if self.no_import_denylist {
            GenerateOptions { import_denylist: Vec::new() }
        } else if self.deny_import.is_empty() {
            GenerateOptions::default()
        } else {
            GenerateOptions { import_denylist: self.deny_import.clone() }
        }
    }

    /// Generate every input. Each catalog gets its own run, so they go in parallel;
    /// results come back in input order.
    fn load_generate(&self) -> Result<Vec<(PathBuf, GeneratedUnit)>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let options = self.options();
        source_paths
            .into_par_iter()
            .map(|source_path| {
                let source = std::fs::read_to_string(&source_path)
                    .with_context(|| format!("failed to read descriptor {}", source_path.display()))?;
                let unit = generate_from_json(&source, &options)
                    .with_context(|| format!("failed to generate from {}", source_path.display()))?;
                Ok((source_path, unit))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let units = target.input_settings.load_generate()?;
                for (source_path, unit) in &units {
                    report_unresolved(source_path, unit);
                }

                if let Some(out) = target.out.as_ref() {
                    let [(_, unit)] = units.as_slice() else {
                        bail!("--out takes exactly one input, got {}", units.len());
                    };
                    write_file(out, &unit.source)?;
                } else if let Some(root) = target.module_root.as_ref() {
                    let locator = ModuleLocator::from_go_mod(root)?;
                    for (_, unit) in &units {
                        let dir = locator.locate(&unit.package)?;
                        let path = write_unit(unit, &dir)?;
                        eprintln!("{} {}", "wrote".green().bold(), path.display());
                    }
                } else {
                    for (_, unit) in &units {
                        println!("{}", unit.source);
                    }
                }
            }
            Command::Inspect(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let units = target.input_settings.load_generate()?;
                let reports = units.iter().map(|(_, unit)| &unit.report).collect::<Vec<_>>();
                let report_src = serde_json::to_string_pretty(&reports)?;
                if let Some(out) = target.out.as_ref() {
                    write_file(out, &report_src)?;
                } else {
                    println!("{report_src}");
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report_unresolved(source_path: &Path, unit: &GeneratedUnit) {
    for field in &unit.report.unresolved {
        eprintln!(
            "{} {}: {}.{} has no automatic mapping ({} -> {})",
            "warning:".yellow().bold(),
            source_path.display(),
            field.function,
            field.field,
            field.source,
            field.target,
        );
    }
}

fn write_file(out: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
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
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
