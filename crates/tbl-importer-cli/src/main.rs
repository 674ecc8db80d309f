//! tbl-importer CLI - Bootstrap SQL Server schemas and import tabular data.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tbl_importer::{
    dataset, render_statements, BackendKind, Config, ImportError, Importer, JsonLinesReporter,
};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

/// Configuration file read when `--config` is not given.
const DEFAULT_CONFIG: &str = "config.yaml";

#[derive(Parser)]
#[command(name = "tbl-importer")]
#[command(about = "Bootstrap SQL Server schemas and import tabular data")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file [default: config.yaml, used only if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override backend: sqlserver or mysql
    #[arg(long)]
    backend: Option<String>,

    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Override database name
    #[arg(long)]
    database: Option<String>,

    /// Override username (SQL Server authentication)
    #[arg(long)]
    user: Option<String>,

    /// Override password
    #[arg(long)]
    password: Option<String>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Print progress updates as JSON lines to stderr
    #[arg(long)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables for a dataset, insert its rows and record the version
    Import {
        /// Path to the JSON dataset file
        #[arg(long)]
        dataset: PathBuf,

        /// Version id recorded in _VERSION
        #[arg(long)]
        version: Option<i32>,

        /// Drop every non-system table before importing
        #[arg(long)]
        drop_existing: bool,

        /// Create the database when it does not exist
        #[arg(long)]
        create_database: bool,

        /// Dry run: print the statements without connecting
        #[arg(long)]
        dry_run: bool,
    },

    /// Drop every non-system table
    DropAll,

    /// Show the recorded import versions
    Version,

    /// Print the CREATE and INSERT statements for a dataset
    Generate {
        /// Path to the JSON dataset file
        #[arg(long)]
        dataset: PathBuf,
    },

    /// Test the database connection
    HealthCheck,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), ImportError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| ImportError::Config(e.to_string()))?;

    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli)?;
    config.validate()?;

    match cli.command {
        Commands::Generate { dataset: ref path } => {
            let data = dataset::load(path)?;
            print_statements(&render_statements(&data)?);
        }

        Commands::Import {
            dataset: ref path,
            version,
            drop_existing,
            create_database,
            dry_run,
        } => {
            if let Some(v) = version {
                config.import.version = v;
            }
            if drop_existing {
                config.import.drop_existing = true;
            }
            if create_database {
                config.import.create_database = true;
            }
            config.validate()?;

            let data = dataset::load(path)?;

            if dry_run {
                info!(
                    "Dry run: {} tables, {} rows, version {}",
                    data.tables.len(),
                    data.row_count(),
                    config.import.version
                );
                print_statements(&render_statements(&data)?);
                return Ok(());
            }

            let mut importer = open_importer(&config, cli.progress)?;
            let result = importer.run(&data)?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nImport completed!");
                println!("  Version: {}", result.version);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!(
                    "  Tables: {}/{}",
                    result.tables_created, result.tables_total
                );
                println!("  Rows inserted: {}", result.rows_inserted);
                if result.rows_failed > 0 {
                    println!("  Rows failed: {}", result.rows_failed);
                }
                if !result.failed_tables.is_empty() {
                    println!("  Failed tables: {:?}", result.failed_tables);
                }
            }
        }

        Commands::DropAll => {
            let mut importer = open_importer(&config, cli.progress)?;
            let report = importer.drop_all()?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Dropped {}/{} tables", report.dropped().len(), report.total);
                if !report.skipped.is_empty() {
                    println!("  Skipped: {:?}", report.skipped);
                }
                for failed in report.failed() {
                    println!(
                        "  Failed: {} ({})",
                        failed.table,
                        failed.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }

        Commands::Version => {
            let mut importer = open_importer(&config, cli.progress)?;
            let entries = importer.version_entries()?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No versions recorded");
            } else {
                println!("Recorded versions:");
                for entry in &entries {
                    match entry.created_at {
                        Some(created) => println!("  {} ({})", entry.version_id, created),
                        None => println!("  {}", entry.version_id),
                    }
                }
            }
        }

        Commands::HealthCheck => {
            let mut importer = open_importer(&config, cli.progress)?;
            let result = importer.health_check();

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  {}: {} ({}ms)",
                    result.backend,
                    if result.connected { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
            }

            if !result.connected {
                return Err(ImportError::backend("Health check failed"));
            }
        }
    }

    Ok(())
}

/// Load the configuration file.
///
/// An explicit path must exist. Without one, `config.yaml` is read when present and
/// built-in defaults are used otherwise.
fn load_config(path: Option<&Path>) -> Result<Config, ImportError> {
    match path {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            let config = Config::load(DEFAULT_CONFIG)?;
            info!("Loaded configuration from {}", DEFAULT_CONFIG);
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), ImportError> {
    if let Some(ref name) = cli.backend {
        config.connection.backend = BackendKind::parse(name).ok_or_else(|| {
            ImportError::Config(format!(
                "unknown backend '{}' (expected sqlserver or mysql)",
                name
            ))
        })?;
    }
    if let Some(ref host) = cli.host {
        config.connection.host = host.clone();
    }
    if let Some(ref database) = cli.database {
        config.connection.database = database.clone();
    }
    if let Some(ref user) = cli.user {
        config.connection.user = user.clone();
    }
    if let Some(ref password) = cli.password {
        config.connection.password = password.clone();
    }
    Ok(())
}

fn open_importer(config: &Config, progress: bool) -> Result<Importer, ImportError> {
    let importer = Importer::from_config(config)?;
    info!(
        "Using {} at {}",
        config.connection.backend,
        config.connection.redacted_connection_string()
    );

    if progress {
        Ok(importer.with_reporter(Box::new(JsonLinesReporter::new(std::io::stderr()))))
    } else {
        Ok(importer)
    }
}

fn print_statements(statements: &[String]) {
    for statement in statements {
        println!("{}", statement);
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so generated SQL and JSON results own stdout
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
