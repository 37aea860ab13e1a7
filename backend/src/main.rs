//! Trunkreport CLI - clean and regroup trunk billing exports
//!
//! # Main Commands
//!
//! ```bash
//! trunkreport serve                  # Start HTTP server (port 3000)
//! trunkreport process export.csv     # Transform an export into a report
//! trunkreport files list             # List archived reports
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! trunkreport parse export.csv       # Just parse CSV to JSON
//! trunkreport files delete <name>    # Delete an archived report
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use trunkreport::{
    parse_file_auto, process_file, DeleteOutcome, ReportOptions, ReportStore,
};

#[derive(Parser)]
#[command(name = "trunkreport")]
#[command(about = "Clean and regroup trunk billing exports with subtotals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a billing export into the grouped report
    Process {
        /// Input CSV file
        input: PathBuf,

        /// Output directory (default: processed/, or TRUNKREPORT_OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Comma-separated zero-cost vendor substrings (default: OPS,IVG,PROXY 2)
        #[arg(long)]
        vendors: Option<String>,

        /// Omit the derived Profit % column
        #[arg(long)]
        no_profit_percent: bool,

        /// Number of preview rows to print (default: 20)
        #[arg(long, default_value = "20")]
        preview_rows: usize,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage archived reports
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },
}

#[derive(Subcommand)]
enum FilesAction {
    /// List archived reports, newest first
    List,

    /// Delete an archived report
    Delete {
        /// Report file name
        name: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            input,
            output_dir,
            vendors,
            no_profit_percent,
            preview_rows,
        } => cmd_process(
            &input,
            output_dir,
            vendors,
            no_profit_percent,
            preview_rows,
        ),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Serve { port } => cmd_serve(port).await,

        Commands::Files { action } => cmd_files(action),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_process(
    input: &Path,
    output_dir: Option<PathBuf>,
    vendors: Option<String>,
    no_profit_percent: bool,
    preview_rows: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = ReportOptions::from_env();
    options.preview_rows = preview_rows;
    if no_profit_percent {
        options.include_profit_percent = false;
    }
    if let Some(raw) = vendors {
        let markers: Vec<String> = raw
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if !markers.is_empty() {
            options.zero_cost_vendors = markers;
        }
    }

    let result = process_file(input, &options)?;

    let store = match output_dir {
        Some(dir) => ReportStore::new(dir),
        None => ReportStore::from_env(),
    };
    let source_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("export.csv");
    let stored = store.write(&result.rows, options.include_profit_percent, source_name)?;

    eprintln!();
    eprintln!("{}", result.summary.render(&stored.name));
    eprintln!();
    eprintln!("💾 Written to: {}", store.dir().join(&stored.name).display());

    if !result.preview.is_empty() {
        eprintln!("\n📊 Preview (first {} rows):", result.preview.len());
        eprintln!("   {}", result.header.join(" | "));
        for row in &result.preview {
            eprintln!("   {}", row.join(" | "));
        }
    }

    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'",
        match result.delimiter {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    match output {
        Some(path) => {
            fs::write(path, &json)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    trunkreport::server::start_server(port).await
}

fn cmd_files(action: FilesAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = ReportStore::from_env();

    match action {
        FilesAction::List => {
            let files = store.list()?;
            if files.is_empty() {
                eprintln!("📋 No processed files yet.");
                return Ok(());
            }

            eprintln!("📋 Archived reports ({}):\n", files.len());
            for file in files {
                println!("  📄 {}", file.name);
                println!(
                    "     Created: {} | Size: {:.2} KB",
                    file.created_at,
                    file.size_bytes as f64 / 1024.0
                );
                println!();
            }
        }

        FilesAction::Delete { name, yes } => {
            if !yes {
                eprintln!("⚠️  Deletion is irreversible. Re-run with --yes to confirm.");
                return Ok(());
            }
            match store.delete(&name, true)? {
                DeleteOutcome::Deleted => eprintln!("🗑️  Deleted: {}", name),
                DeleteOutcome::NotFound => {
                    return Err(format!("File not found: {}", name).into());
                }
                DeleteOutcome::NotConfirmed => unreachable!("confirmed above"),
            }
        }
    }

    Ok(())
}
