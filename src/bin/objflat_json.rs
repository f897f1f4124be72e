//! objflat-json: Flatten JSON documents into address/value entries
//!
//! Usage:
//!   # Read from file, output JSON Lines to stdout
//!   objflat-json data.json
//!
//!   # Read NDJSON from stdin under a prefix, as text
//!   cat events.jsonl | objflat-json --ndjson --prefix event --format text
//!
//!   # Interpret numbers as decimals, using a configuration file for the rest
//!   objflat-json --config flatten.json --number-mode decimal data.json

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use objflat::document::{NumberMode, StringMode};
use objflat::{flatten_json, EntryWriter, FlattenConfig, Flattener, NoHandlerPolicy, OutputFormat};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "objflat-json")]
#[command(about = "Flatten JSON documents into address/value entries", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one JSON document per line)
    #[arg(long)]
    ndjson: bool,

    /// Don't treat a top-level array as a stream of records
    #[arg(long)]
    no_ignore_array: bool,

    /// Address prefix for every entry (default: none)
    #[arg(long, default_value = "")]
    prefix: String,

    /// How numbers are read: f64, f32, decimal, i8..i64, u8..u64
    #[arg(long)]
    number_mode: Option<NumberMode>,

    /// How strings are read: string, date-time, date-time-offset, uuid, base64
    #[arg(long)]
    string_mode: Option<StringMode>,

    /// What to do with values no handler accepts: fail, ignore, pass-through
    #[arg(long)]
    policy: Option<NoHandlerPolicy>,

    /// JSON configuration file; flags given on the command line override it
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Output format: jsonl or text
    #[arg(long, default_value = "jsonl")]
    format: OutputFormat,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build config
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            FlattenConfig::from_json_str(&text)?
        }
        None => FlattenConfig::default(),
    };
    if let Some(mode) = args.number_mode {
        config.number_mode = mode;
    }
    if let Some(mode) = args.string_mode {
        config.string_mode = mode;
    }
    if let Some(policy) = args.policy {
        config.no_handler_policy = policy;
    }
    debug!(?config, "Resolved configuration");

    let flattener = Flattener::from_config(&config)?;

    let reader = if let Some(file_path) = &args.input {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open input file: {}", file_path))?;
        Box::new(BufReader::new(file)) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let stdout = std::io::stdout();
    let mut writer = EntryWriter::new(stdout.lock(), args.format);

    let written = if args.ndjson {
        flatten_json(BufReader::new(reader), &mut writer, &flattener, &args.prefix)?
    } else {
        process_document(reader, !args.no_ignore_array, &flattener, &args.prefix, &mut writer)?
    };

    info!(entries = written, "Flattening complete");
    Ok(())
}

/// Flatten a whole document using SIMD-accelerated JSON parsing when possible
fn process_document<W: Write>(
    reader: Box<dyn Read>,
    split_array: bool,
    flattener: &Flattener,
    prefix: &str,
    writer: &mut EntryWriter<W>,
) -> Result<usize> {
    // Read entire content into memory for SIMD parsing
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    let document: Value = match simd_json::serde::from_slice(&mut content.clone()) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "SIMD parse failed, falling back to serde_json");
            serde_json::from_slice(&content).context("Failed to parse JSON document")?
        }
    };

    let mut written = 0;
    match document {
        Value::Array(records) if split_array => {
            for record in &records {
                written += writer.write_entries(flattener.flatten(prefix.to_string(), record))?;
            }
        }
        other => {
            written += writer.write_entries(flattener.flatten(prefix.to_string(), &other))?;
        }
    }

    writer.flush()?;
    Ok(written)
}
