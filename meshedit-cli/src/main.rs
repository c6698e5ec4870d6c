use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use meshedit::domain::Document;
use meshedit::{codec, schema};

#[derive(Debug, Parser)]
#[command(
    name = "meshedit",
    version,
    about = "Validate and normalize data product documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a document against a schema (embedded schema by default)
    Validate {
        /// Document file, or "-" for stdin
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Schema file; omit to use the embedded document schema
        #[arg(short = 's', long = "schema", value_name = "PATH")]
        schema: Option<PathBuf>,
    },
    /// Strip empty optional fields and collections from a document
    Clean {
        /// Document file, or "-" for stdin
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Write here instead of stdout
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print an empty draft document
    New,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Validate { document, schema } => validate(&document, schema.as_deref()),
        Command::Clean { document, output } => clean(&document, output.as_deref()),
        Command::New => {
            println!("{}", serde_json::to_string_pretty(&Document::draft())?);
            Ok(())
        }
    }
}

fn validate(document: &Path, schema_path: Option<&Path>) -> Result<()> {
    let value: Value = serde_json::from_str(&read_input(document)?)
        .wrap_err("failed to parse document as JSON")?;
    let raw_schema = match schema_path {
        Some(path) => serde_json::from_str(
            &fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read schema {}", path.display()))?,
        )
        .wrap_err("failed to parse schema as JSON")?,
        None => schema::embedded(),
    };
    let validator = schema::compile(&raw_schema).map_err(|err| eyre!(err.to_string()))?;
    let report = schema::report_for(&validator, &value);
    if report.is_valid() {
        println!("document is valid");
        return Ok(());
    }
    for issue in &report.issues {
        let pointer = if issue.pointer.is_empty() {
            "<root>"
        } else {
            &issue.pointer
        };
        eprintln!("{pointer}: {}", issue.message);
    }
    Err(eyre!(
        "document failed validation with {} issue(s)",
        report.issues.len()
    ))
}

fn clean(document: &Path, output: Option<&Path>) -> Result<()> {
    let parsed: Document = serde_json::from_str(&read_input(document)?)
        .wrap_err("failed to parse document")?;
    let payload = serde_json::to_string_pretty(&codec::clean(&parsed))?;
    match output {
        Some(path) => fs::write(path, format!("{payload}\n"))
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => println!("{payload}"),
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut contents = String::new();
        io::stdin()
            .read_to_string(&mut contents)
            .wrap_err("failed to read stdin")?;
        Ok(contents)
    } else {
        fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
    }
}
