//! mapjitsu CLI - map CSV and JSON records through a mapping configuration
//!
//! # Commands
//!
//! ```bash
//! mapjitsu apply -c mapping.json input.csv   # Map records with a configuration
//! mapjitsu parse input.csv                   # Just parse CSV to JSON
//! mapjitsu operations                        # Show available transform operations
//! mapjitsu example-config                    # Show an example configuration
//! ```
//!
//! `MAPJITSU_CONFIG` (environment or `.env`) provides the default configuration
//! path for `apply`. `-v` flags raise log verbosity, `RUST_LOG` overrides it.

use clap::{ArgAction, Parser, Subcommand};
use mapjitsu::logging::{init_logging, LogConfig};
use mapjitsu::{read_csv_file_auto, Plan};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "MAPJITSU_CONFIG";

#[derive(Parser)]
#[command(name = "mapjitsu")]
#[command(about = "Copy and transform fields between CSV records and JSON documents", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map every record of an input file through a configuration
    Apply {
        /// Input CSV or JSON file
        input: PathBuf,

        /// Mapping configuration (default: $MAPJITSU_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Treat the first row as data
        #[arg(long)]
        no_header: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show example mapping configuration
    ExampleConfig,

    /// Show available transform operations
    Operations,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(&LogConfig::from_verbosity(cli.verbose)) {
        eprintln!("⚠️  Logging disabled: {}", e);
    }

    let result = match cli.command {
        Commands::Apply { input, config, output } => cmd_apply(&input, config, output.as_deref()),

        Commands::Parse {
            input,
            delimiter,
            no_header,
            output,
        } => cmd_parse(&input, delimiter, !no_header, output.as_deref()),

        Commands::ExampleConfig => cmd_example_config(),

        Commands::Operations => cmd_operations(),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_apply(input: &Path, config: Option<PathBuf>, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = config
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .ok_or_else(|| format!("no configuration given, pass --config or set {}", CONFIG_ENV))?;

    eprintln!("📄 Mapping: {}", input.display());

    let plan = Plan::from_path(&config)?;
    eprintln!(
        "   Config: {} ({} mappings)",
        config.display(),
        plan.config().mappings.len()
    );

    let bytes = fs::read(input)?;
    let mapped = plan.run_bytes(&bytes)?;
    tracing::info!(records = mapped.len(), input = %input.display(), "mapping complete");
    eprintln!("✅ Mapped {} records", mapped.len());

    let rendered = mapped.render(plan.output_delimiter())?;
    write_output(&rendered, output)?;

    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    has_header: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = read_csv_file_auto(input, delimiter, has_header)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(result.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    if has_header {
        eprintln!("   Columns: {}", result.header.join(", "));
    }
    eprintln!("✅ Parsed {} records", result.rows.len());

    let json = if has_header {
        serde_json::to_string_pretty(&result.to_objects())?
    } else {
        serde_json::to_string_pretty(&result.rows)?
    };
    write_output(&json, output)?;

    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn cmd_example_config() -> Result<(), Box<dyn std::error::Error>> {
    let config = mapjitsu::example_config();
    println!("{}", config.to_json()?);
    Ok(())
}

fn cmd_operations() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", mapjitsu::operations_description());
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
