use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use sqlscope_analyzer::{
    AnalysisCache, AnalyzerConfig, AnalyzerError, CachedAnalyzer, DEFAULT_PROGRAM,
    DEFAULT_TIMEOUT_SECS, ExternalAnalyzer,
};
use sqlscope_sqlite::{Inspector, database_label, open_database};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sqlscope", version)]
#[command(about = "Read-only SQLite schema inspection, row counts, and field analysis")]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List user tables in a database.
    Tables(TablesArgs),
    /// Extract column, foreign key, and index metadata.
    Schema(SchemaArgs),
    /// Count rows per table.
    Counts(CountsArgs),
    /// Analyze field similarity across extracted schemas with an external AI tool.
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
struct TablesArgs {
    /// SQLite database file (any extension).
    database: PathBuf,
    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// SQLite database file (any extension).
    database: PathBuf,
    /// Only extract these tables (default: all).
    tables: Vec<String>,
    /// Write tables.json and schemas.json into this directory.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CountsArgs {
    /// SQLite database file (any extension).
    database: PathBuf,
    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Only report tables with at least this many rows.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    min_rows: i64,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// schemas.json produced by `sqlscope schema -o`.
    schemas: PathBuf,
    /// Write the analysis to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Ignore any cached analysis and run the analyzer again.
    #[arg(long)]
    force: bool,
    /// Cache directory (default: .sqlscope_cache beside the schemas file).
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Analyzer program.
    #[arg(long, env = "SQLSCOPE_ANALYZER", default_value = DEFAULT_PROGRAM)]
    program: String,
    /// Kill the analyzer after this many seconds.
    #[arg(long, env = "SQLSCOPE_ANALYZER_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Tables(args) => run_tables(args),
        Command::Schema(args) => run_schema(args),
        Command::Counts(args) => run_counts(args),
        Command::Analyze(args) => run_analyze(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout carries only JSON.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_tables(args: TablesArgs) -> Result<(), String> {
    let conn = open_database(&args.database).map_err(|e| e.to_string())?;
    let list = Inspector::new(&conn).table_list().map_err(|e| e.to_string())?;
    close(conn)?;

    info!(count = list.len(), "Found tables");
    match args.output {
        Some(path) => {
            write_json(&path, &list)?;
            info!(path = %path.display(), "Wrote table list");
            Ok(())
        }
        None => print_json(&list),
    }
}

fn run_schema(args: SchemaArgs) -> Result<(), String> {
    let conn = open_database(&args.database).map_err(|e| e.to_string())?;
    let inspector = Inspector::new(&conn);

    let list = inspector.table_list().map_err(|e| e.to_string())?;
    info!(count = list.len(), "Found tables");

    let selected: Vec<String> = if args.tables.is_empty() {
        list.tables.clone()
    } else {
        for name in args.tables.iter().filter(|name| !list.contains(name)) {
            warn!(table = %name, "Table not found in database");
        }
        args.tables
    };

    let schemas = inspector
        .table_schemas(&selected)
        .map_err(|e| e.to_string())?;
    close(conn)?;

    match args.output {
        Some(dir) => {
            fs::create_dir_all(&dir).map_err(|err| {
                format!("Failed to create output directory '{}': {err}", dir.display())
            })?;

            let tables_path = dir.join("tables.json");
            write_json(&tables_path, &list)?;
            info!(path = %tables_path.display(), "Wrote table list");

            let schemas_path = dir.join("schemas.json");
            write_json(&schemas_path, &schemas)?;
            info!(path = %schemas_path.display(), tables = schemas.len(), "Wrote schemas");
            Ok(())
        }
        None => print_json(&schemas),
    }
}

fn run_counts(args: CountsArgs) -> Result<(), String> {
    let conn = open_database(&args.database).map_err(|e| e.to_string())?;
    let report = Inspector::new(&conn)
        .count_report(&database_label(&args.database), args.min_rows)
        .map_err(|e| e.to_string())?;
    close(conn)?;

    info!(
        total = report.total_tables,
        kept = report.filtered_tables,
        min_rows = report.min_rows_filter,
        "Counted tables"
    );

    match args.output {
        Some(path) => {
            write_json(&path, &report)?;
            eprintln!("Results saved to: {}", path.display());
            Ok(())
        }
        None => print_json(&report),
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), String> {
    if !args.schemas.is_file() {
        return Err(AnalyzerError::SchemasNotFound(args.schemas).to_string());
    }

    let raw = fs::read(&args.schemas)
        .map_err(|err| format!("Failed to read '{}': {err}", args.schemas.display()))?;

    let cache = match args.cache_dir {
        Some(dir) => AnalysisCache::new(dir),
        None => AnalysisCache::beside(&args.schemas),
    };
    debug!(dir = %cache.dir().display(), "Using analysis cache");

    let analyzer = ExternalAnalyzer::new(AnalyzerConfig {
        program: args.program,
        timeout: Duration::from_secs(args.timeout_secs),
        ..AnalyzerConfig::default()
    });

    let outcome = CachedAnalyzer::new(analyzer, cache)
        .with_force(args.force)
        .analyze_source(&raw)
        .map_err(|e| e.to_string())?;

    match args.output {
        Some(path) => {
            write_json(&path, &outcome.analysis)?;
            info!(path = %path.display(), from_cache = outcome.from_cache, "Wrote analysis");
            Ok(())
        }
        None => print_json(&outcome.analysis),
    }
}

fn close(conn: Connection) -> Result<(), String> {
    conn.close()
        .map_err(|(_, err)| format!("Error closing database: {err}"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to serialize output: {err}"))?;
    println!("{raw}");
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to serialize output: {err}"))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            format!("Failed to create directory '{}': {err}", parent.display())
        })?;
    }
    fs::write(path, raw).map_err(|err| format!("Failed to write '{}': {err}", path.display()))
}
