use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::{self, Read};
use survey_insights::ops;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "survey",
    version,
    about = "Survey normalization, branch aggregation, and model-response repair engine"
)]
struct Cli {
    /// Start as an MCP (Model Context Protocol) server on stdio.
    /// AI assistants (Claude Desktop, Cursor, etc.) connect via JSON-RPC.
    #[cfg(feature = "mcp")]
    #[arg(long, exclusive = true)]
    mcp: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV/TSV/JSON survey export into JSON records
    Parse {
        /// Survey file (format from extension); reads stdin if omitted
        #[arg(short, long)]
        input: Option<String>,
        /// Format of stdin input: csv, tsv, json
        #[arg(short, long, default_value = "json")]
        format: String,
    },
    /// Rename columns to their canonical names
    Normalize {
        #[arg(short, long)]
        input: Option<String>,
        /// Keep only rows that have a branch
        #[arg(short, long)]
        branch_only: bool,
    },
    /// Rank branches by average satisfaction
    Rank {
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Histogram of improvement categories across all rows
    Improvements {
        #[arg(short, long)]
        input: Option<String>,
        /// Do not count score reasons that hint at an improvement
        #[arg(long)]
        no_reasons: bool,
    },
    /// Score reasons with branch, date, and callback flag
    Reasons {
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Top three improvement categories per branch
    #[command(name = "branch-improvements")]
    BranchImprovements {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long)]
        no_reasons: bool,
    },
    /// Branch × recommendation-category matrix
    Matrix {
        #[arg(short, long)]
        input: Option<String>,
        /// Path to a category list JSON file
        #[arg(short, long)]
        categories: Option<String>,
    },
    /// Net Promoter Score from AS values
    Nps {
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Every branch aggregate in one document
    Report {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        categories: Option<String>,
        #[arg(long)]
        no_reasons: bool,
    },
    /// Recover a JSON object from model output
    Extract {
        /// Response text; reads stdin if omitted
        text: Option<String>,
    },
    /// Interpret a model response, falling back to heuristics
    Interpret {
        /// Kind: comprehensive, sentiment, themes, kpis
        #[arg(short, long)]
        kind: String,
        /// File holding the response text; reads stdin if omitted
        #[arg(short, long)]
        input: Option<String>,
        /// Verbatim comment used by fallbacks (repeatable)
        #[arg(short, long = "verbatim")]
        verbatims: Vec<String>,
        /// JSON array of verbatim comments
        #[arg(long)]
        verbatims_file: Option<String>,
    },
    /// Show how headers normalize
    Column {
        /// Header names
        #[arg(required = true)]
        headers: Vec<String>,
    },
    /// Categorize improvement phrases; reads stdin lines if none given
    Categorize { texts: Vec<String> },
    /// Coerce rating values
    Rating {
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Print the resolved recommendation category list
    Categories {
        #[arg(short, long)]
        path: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // ── MCP server mode ─────────────────────────────────────────────────
    #[cfg(feature = "mcp")]
    if cli.mcp {
        let rt = tokio::runtime::Runtime::new()
            .unwrap_or_else(|e| fail(format!("failed to create tokio runtime: {e}")));
        rt.block_on(async {
            if let Err(e) = survey_insights::mcp::serve_stdio().await {
                eprintln!("MCP server error: {e}");
                std::process::exit(1);
            }
        });
        return;
    }

    // ── Normal subcommand dispatch ──────────────────────────────────────
    let command = cli.command.unwrap_or_else(|| {
        eprintln!("No subcommand provided. Run `survey --help` for usage.");
        std::process::exit(1);
    });

    let result = match command {
        Commands::Parse { input, format } => match input {
            Some(path) => ops::op_read_file(&path),
            None => ops::op_parse(&read_stdin(), &format),
        },
        Commands::Normalize { input, branch_only } => {
            Ok(ops::op_normalize(&load_records(input.as_deref()), branch_only))
        }
        Commands::Rank { input } => ops::op_rank(&load_records(input.as_deref())),
        Commands::Improvements { input, no_reasons } => {
            ops::op_improvements(&load_records(input.as_deref()), !no_reasons)
        }
        Commands::Reasons { input } => ops::op_reasons(&load_records(input.as_deref())),
        Commands::BranchImprovements { input, no_reasons } => {
            ops::op_branch_improvements(&load_records(input.as_deref()), !no_reasons)
        }
        Commands::Matrix { input, categories } => {
            ops::op_matrix(&load_records(input.as_deref()), None, categories.as_deref())
        }
        Commands::Nps { input } => ops::op_nps(&load_records(input.as_deref())),
        Commands::Report {
            input,
            categories,
            no_reasons,
        } => ops::op_report(
            &load_records(input.as_deref()),
            categories.as_deref(),
            !no_reasons,
        ),
        Commands::Extract { text } => ops::op_extract(&text.unwrap_or_else(read_stdin)),
        Commands::Interpret {
            kind,
            input,
            mut verbatims,
            verbatims_file,
        } => {
            let text = match input {
                Some(path) => read_file(&path),
                None => read_stdin(),
            };
            if let Some(path) = verbatims_file {
                let parsed: Vec<String> =
                    serde_json::from_str(&read_file(&path)).unwrap_or_else(|e| {
                        fail(format!("'{path}' is not a JSON array of strings: {e}"))
                    });
                verbatims.extend(parsed);
            }
            ops::op_interpret(&kind, &text, &verbatims)
        }
        Commands::Column { headers } => Ok(ops::op_column(&headers)),
        Commands::Categorize { texts } => {
            let texts = if texts.is_empty() {
                read_stdin()
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            } else {
                texts
            };
            Ok(ops::op_categorize(&texts))
        }
        Commands::Rating { values } => {
            let values: Vec<Value> = values
                .into_iter()
                .map(|v| serde_json::from_str(&v).unwrap_or(Value::String(v)))
                .collect();
            Ok(ops::op_rating(&values))
        }
        Commands::Categories { path } => ops::op_categories(path.as_deref()),
    };

    match result {
        Ok(value) => print_json(&value),
        Err(e) => fail(e),
    }
}

fn fail(message: String) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => fail(format!("failed to serialize output: {e}")),
    }
}

fn read_stdin() -> String {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .unwrap_or_else(|e| fail(format!("failed to read stdin: {e}")));
    buf
}

fn read_file(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| fail(format!("Failed to read '{path}': {e}")))
}

/// Survey records from a file, or from stdin as JSON (CSV accepted too).
fn load_records(input: Option<&str>) -> Vec<Value> {
    let parsed = match input {
        Some(path) => ops::op_read_file(path),
        None => ops::op_parse(&read_stdin(), "json"),
    };
    match parsed {
        Ok(Value::Array(rows)) => rows,
        Ok(single) => vec![single],
        Err(e) => fail(e),
    }
}
