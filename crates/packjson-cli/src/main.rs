//! `packjson` CLI: validate, inspect, query and benchmark JSON documents.
//!
//! ## Usage
//!
//! ```sh
//! # Validate JSON from stdin
//! echo '[1, 2' | packjson check
//!
//! # Node statistics for a file, as text or JSON
//! packjson stats -i data.json
//! packjson stats --json -i data.json
//!
//! # Print the value at a path (object keys and array indices)
//! packjson get /users/0/name -i data.json
//!
//! # Compare parse throughput against serde_json
//! packjson bench -n 20 twitter.json citm_catalog.json
//!
//! # Log arena and parser activity to stderr
//! RUST_LOG=packjson_core=trace packjson check -i data.json
//! ```

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use packjson_core::{str_error, Document, Unpacked, Value};
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "packjson",
    version,
    about = "Arena-backed JSON parser CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and report whether it is valid
    Check {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Count objects, arrays, scalars, members and string bytes
    Stats {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Print the counts as a JSON object
        #[arg(long)]
        json: bool,
    },
    /// Print the value at a `/`-separated path as JSON
    Get {
        /// Path of object keys and array indices, e.g. `/users/0/name`
        path: String,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Parse each file N times with packjson and serde_json and compare
    ///
    /// Both rows count nodes of the parsed trees. packjson keeps every member
    /// of an object while serde_json keeps one per key, so on input with
    /// duplicate keys the serde_json row reports fewer members, strings and
    /// string bytes.
    Bench {
        /// Parses per file and parser
        #[arg(short = 'n', long, default_value_t = 10)]
        iterations: usize,
        /// JSON files to load
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { input } => {
            let bytes = read_input(input.as_deref())?;
            match Document::parse(&bytes) {
                Ok(_) => println!("ok ({} bytes)", bytes.len()),
                Err(err) => {
                    eprintln!("error: {} at byte {}", str_error(err.status()), err.position);
                    process::exit(1);
                }
            }
        }
        Commands::Stats { input, json } => {
            let bytes = read_input(input.as_deref())?;
            let doc = Document::parse(&bytes).context("Failed to parse JSON")?;
            let stat = Stat::of(doc.root());
            debug!(zones = doc.arena().zone_count(), "collected stats");
            if json {
                println!("{}", serde_json::to_string_pretty(&stat)?);
            } else {
                print!("{stat}");
            }
        }
        Commands::Get { path, input } => {
            let bytes = read_input(input.as_deref())?;
            let doc = Document::parse(&bytes).context("Failed to parse JSON")?;
            let value = lookup(doc.root(), &path)?;
            let json = value
                .to_json_value()
                .with_context(|| format!("Failed to convert value at '{path}'"))?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Bench { iterations, files } => {
            if iterations == 0 {
                bail!("-n must be at least 1");
            }
            for file in &files {
                let bytes = std::fs::read(file)
                    .with_context(|| format!("Failed to read file: {}", file.display()))?;
                println!("{}, {}B x {}:", file.display(), bytes.len(), iterations);
                println!(
                    "{:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10} {:>12} {:>12} {:>11}",
                    "Object",
                    "Array",
                    "Number",
                    "String",
                    "True",
                    "False",
                    "Null",
                    "Member",
                    "Element",
                    "StrLen",
                    "Size",
                    "Update(ns)",
                    "Parse(ns)",
                    "Speed(MiB/s)"
                );
                println!("{}", bench_packjson(&bytes, iterations)?);
                println!("{}", bench_serde_json(&bytes, iterations)?);
                println!();
            }
        }
    }

    Ok(())
}

/// Install a stderr subscriber; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Walk a `/`-separated path of object keys and array indices.
///
/// Empty segments are skipped, so `""`, `"/"` and `"a//b"` behave like
/// their normalized forms.
fn lookup<'a>(root: Value<'a>, path: &str) -> Result<Value<'a>> {
    let mut current = root;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = match current.unpack() {
            Unpacked::Object(_) => current.get(segment),
            Unpacked::Array(_) => {
                let index: usize = segment
                    .parse()
                    .with_context(|| format!("'{segment}' is not an array index"))?;
                current.at(index)
            }
            _ => None,
        }
        .with_context(|| format!("No value at path '{path}' (missing '{segment}')"))?;
    }
    Ok(current)
}

// ─────────────────────────────────────────────────────────────────────────────
// Statistics
// ─────────────────────────────────────────────────────────────────────────────

/// Node counts for one or more documents. Object keys count as strings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
struct Stat {
    objects: usize,
    arrays: usize,
    numbers: usize,
    strings: usize,
    trues: usize,
    falses: usize,
    nulls: usize,
    members: usize,
    elements: usize,
    string_length: usize,
}

impl Stat {
    fn of(root: Value<'_>) -> Self {
        let mut stat = Self::default();
        stat.add(root);
        stat
    }

    fn add(&mut self, root: Value<'_>) {
        let mut pending = vec![root];
        while let Some(value) = pending.pop() {
            match value.unpack() {
                Unpacked::Array(elements) => {
                    self.arrays += 1;
                    for element in elements {
                        self.elements += 1;
                        pending.push(element);
                    }
                }
                Unpacked::Object(members) => {
                    self.objects += 1;
                    for (key, member) in members {
                        self.members += 1;
                        self.strings += 1;
                        self.string_length += key.len();
                        pending.push(member);
                    }
                }
                Unpacked::String(s) => {
                    self.strings += 1;
                    self.string_length += s.len();
                }
                Unpacked::Number(_) => self.numbers += 1,
                Unpacked::Bool(true) => self.trues += 1,
                Unpacked::Bool(false) => self.falses += 1,
                Unpacked::Null => self.nulls += 1,
            }
        }
    }

    /// Counts what serde_json kept: duplicate keys are already merged.
    fn add_json(&mut self, root: &serde_json::Value) {
        let mut pending = vec![root];
        while let Some(value) = pending.pop() {
            match value {
                serde_json::Value::Array(items) => {
                    self.arrays += 1;
                    self.elements += items.len();
                    pending.extend(items);
                }
                serde_json::Value::Object(map) => {
                    self.objects += 1;
                    for (key, member) in map {
                        self.members += 1;
                        self.strings += 1;
                        self.string_length += key.len();
                        pending.push(member);
                    }
                }
                serde_json::Value::String(s) => {
                    self.strings += 1;
                    self.string_length += s.len();
                }
                serde_json::Value::Number(_) => self.numbers += 1,
                serde_json::Value::Bool(true) => self.trues += 1,
                serde_json::Value::Bool(false) => self.falses += 1,
                serde_json::Value::Null => self.nulls += 1,
            }
        }
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Objects:    {}", self.objects)?;
        writeln!(f, "Arrays:     {}", self.arrays)?;
        writeln!(f, "Numbers:    {}", self.numbers)?;
        writeln!(f, "Strings:    {}", self.strings)?;
        writeln!(f, "True:       {}", self.trues)?;
        writeln!(f, "False:      {}", self.falses)?;
        writeln!(f, "Null:       {}", self.nulls)?;
        writeln!(f, "Members:    {}", self.members)?;
        writeln!(f, "Elements:   {}", self.elements)?;
        writeln!(f, "String len: {} bytes", self.string_length)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Benchmark
// ─────────────────────────────────────────────────────────────────────────────

/// One row of the benchmark table.
struct BenchRow {
    parser: &'static str,
    stat: Stat,
    source_size: usize,
    parse_time: Duration,
    update_time: Duration,
}

impl std::fmt::Display for BenchRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seconds = self.parse_time.as_secs_f64();
        let speed = if seconds > 0.0 {
            self.source_size as f64 / seconds / f64::from(1u32 << 20)
        } else {
            0.0
        };
        let s = &self.stat;
        write!(
            f,
            "{:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10} {:>12} {:>12} {:>11.3} {}",
            s.objects,
            s.arrays,
            s.numbers,
            s.strings,
            s.trues,
            s.falses,
            s.nulls,
            s.members,
            s.elements,
            s.string_length,
            self.source_size,
            self.update_time.as_nanos(),
            self.parse_time.as_nanos(),
            speed,
            self.parser
        )
    }
}

fn bench_packjson(bytes: &[u8], iterations: usize) -> Result<BenchRow> {
    let start = Instant::now();
    let docs = (0..iterations)
        .map(|_| Document::parse(bytes))
        .collect::<Result<Vec<_>, _>>()
        .context("packjson failed to parse input")?;
    let parse_time = start.elapsed();

    let start = Instant::now();
    let mut stat = Stat::default();
    for doc in &docs {
        stat.add(doc.root());
    }
    let update_time = start.elapsed();

    let reserved: usize = docs.iter().map(|doc| doc.arena().reserved_bytes()).sum();
    info!(iterations, reserved, "packjson run finished");

    Ok(BenchRow {
        parser: "packjson",
        stat,
        source_size: bytes.len() * iterations,
        parse_time,
        update_time,
    })
}

fn bench_serde_json(bytes: &[u8], iterations: usize) -> Result<BenchRow> {
    let start = Instant::now();
    let docs = (0..iterations)
        .map(|_| serde_json::from_slice::<serde_json::Value>(bytes))
        .collect::<Result<Vec<_>, _>>()
        .context("serde_json failed to parse input")?;
    let parse_time = start.elapsed();

    let start = Instant::now();
    let mut stat = Stat::default();
    for doc in &docs {
        stat.add_json(doc);
    }
    let update_time = start.elapsed();
    info!(iterations, "serde_json run finished");

    Ok(BenchRow {
        parser: "serde_json",
        stat,
        source_size: bytes.len() * iterations,
        parse_time,
        update_time,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// I/O helpers
// ─────────────────────────────────────────────────────────────────────────────

fn read_input(path: Option<&str>) -> Result<Vec<u8>> {
    let bytes = match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read file: {}", path))?,
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    debug!(len = bytes.len(), "read input");
    Ok(bytes)
}
