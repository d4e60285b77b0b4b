use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use oneliner::Evaluator;
use oneliner::config::{FieldRule, OnError, RulesConfig, RuntimeConfig};
use oneliner::extract::{RuleSet, evaluate_rules};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input document (.json, .jsonl, .yaml); `-` reads stdin
    #[arg(short, long)]
    pub input: PathBuf,

    /// Query to evaluate (repeatable)
    #[arg(short, long = "query")]
    pub queries: Vec<String>,

    /// Rules file (YAML) of named queries
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Output file; `-` writes to stdout
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Input format (auto-detected if omitted)
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Reference time for age() without a reference path (RFC 3339)
    #[arg(long, env = "ONELINER_NOW")]
    pub now: Option<String>,

    /// Number of threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Pretty-print JSON output (single-document input only)
    #[arg(long)]
    pub pretty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum InputFormat {
    #[value(name = "json")]
    Json,
    #[value(name = "jsonl", alias = "ndjson")]
    Jsonl,
    #[value(name = "yaml", alias = "yml")]
    Yaml,
}

/// What is produced for each document.
pub enum Plan {
    /// A lone `--query`: its result as-is
    Single(String),
    /// Named fields collected into an object
    Fields(RuleSet),
}

pub fn input_format_label(format: &InputFormat) -> &'static str {
    match format {
        InputFormat::Json => "json",
        InputFormat::Jsonl => "jsonl",
        InputFormat::Yaml => "yaml",
    }
}

/// Explicit format, else the input extension; stdin defaults to JSON.
pub fn detect_format(cli: &Cli) -> Result<InputFormat> {
    if let Some(format) = cli.format {
        return Ok(format);
    }
    if cli.input == Path::new("-") {
        return Ok(InputFormat::Json);
    }

    cli.input
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match ext.to_lowercase().as_str() {
            "json" => Some(InputFormat::Json),
            "jsonl" | "ndjson" => Some(InputFormat::Jsonl),
            "yaml" | "yml" => Some(InputFormat::Yaml),
            _ => None,
        })
        .context("CLI: Could not detect input format from extension; use --format")
}

pub fn read_input(path: &Path) -> Result<String> {
    let mut text = String::new();
    if path == Path::new("-") {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Input: Failed to read stdin")?;
    } else {
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut text))
            .with_context(|| format!("Input: Failed to read {:?}", path))?;
    }
    Ok(text)
}

pub fn parse_documents(text: &str, format: InputFormat) -> Result<Vec<Value>> {
    match format {
        InputFormat::Json => {
            let doc = serde_json::from_str(text).context("Input: Invalid JSON document")?;
            Ok(vec![doc])
        }
        InputFormat::Yaml => {
            let doc = serde_yaml::from_str(text).context("Input: Invalid YAML document")?;
            Ok(vec![doc])
        }
        InputFormat::Jsonl => text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Input: Invalid JSON on line {}", i + 1))
            })
            .collect(),
    }
}

/// Combine `--rules` and `--query` into a plan, plus runtime settings. The
/// CLI reference time wins over the rules file's.
pub fn build_plan(cli: &Cli) -> Result<(Plan, RuntimeConfig)> {
    let rules = cli
        .rules
        .as_deref()
        .map(|path| {
            RulesConfig::load(path).with_context(|| format!("Rules: Failed to load {:?}", path))
        })
        .transpose()?;

    let runtime = RuntimeConfig {
        now: cli
            .now
            .clone()
            .or_else(|| rules.as_ref().and_then(|r| r.now.clone())),
        pretty: cli.pretty,
    };

    let plan = match (rules, cli.queries.as_slice()) {
        (None, []) => anyhow::bail!("CLI: Provide at least one --query or a --rules file"),
        (None, [query]) => {
            RuleSet::from_queries(std::slice::from_ref(query))?;
            Plan::Single(query.clone())
        }
        (rules, queries) => {
            let mut config = rules.unwrap_or(RulesConfig {
                now: None,
                fields: Vec::new(),
            });
            config.fields.extend(queries.iter().map(|query| FieldRule {
                name: query.clone(),
                query: query.clone(),
                on_error: OnError::Fail,
            }));
            Plan::Fields(RuleSet::compile(&config)?)
        }
    };

    Ok((plan, runtime))
}

pub fn evaluate_document(
    document: Value,
    plan: &Plan,
    now: Option<OffsetDateTime>,
) -> Result<Value> {
    let mut evaluator = Evaluator::new(document);
    if let Some(now) = now {
        evaluator = evaluator.at(now);
    }

    match plan {
        Plan::Single(query) => Ok(evaluator.query(query)?),
        Plan::Fields(rules) => Ok(Value::Object(evaluate_rules(rules, &evaluator)?)),
    }
}

/// Evaluate documents in parallel, keeping input order.
pub fn evaluate_documents(
    documents: Vec<Value>,
    plan: &Plan,
    runtime: &RuntimeConfig,
) -> Result<Vec<Value>> {
    let now = runtime.reference_time()?;
    documents
        .into_par_iter()
        .enumerate()
        .map(|(i, document)| {
            evaluate_document(document, plan, now)
                .with_context(|| format!("Document {}", i + 1))
        })
        .collect()
}

pub fn write_results(
    output: &Path,
    results: &[Value],
    format: InputFormat,
    pretty: bool,
) -> Result<()> {
    let writer: Box<dyn Write> = if output == Path::new("-") {
        Box::new(std::io::stdout().lock())
    } else {
        let file = File::create(output)
            .with_context(|| format!("Output: Failed to create {:?}", output))?;
        Box::new(file)
    };
    let mut writer = BufWriter::new(writer);

    for result in results {
        if pretty && format != InputFormat::Jsonl {
            serde_json::to_writer_pretty(&mut writer, result)?;
        } else {
            serde_json::to_writer(&mut writer, result)?;
        }
        writeln!(writer)?;
    }

    writer.flush().context("Output: Failed to flush")?;
    Ok(())
}

/// Load, evaluate and write; returns the number of documents evaluated.
pub fn run(cli: &Cli) -> Result<usize> {
    let format = detect_format(cli)?;
    let (plan, runtime) = build_plan(cli)?;

    let documents = parse_documents(&read_input(&cli.input)?, format)?;
    tracing::info!(
        "Input: {} document(s) as {} from {:?}",
        documents.len(),
        input_format_label(&format),
        cli.input
    );

    let results = evaluate_documents(documents, &plan, &runtime)?;
    write_results(&cli.output, &results, format, runtime.pretty)?;
    Ok(results.len())
}
