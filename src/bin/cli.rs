//! fifolog CLI
//!
//! Inspect and edit a log file from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fifolog::{Config, LogStore, Result};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// fifolog CLI
#[derive(Parser, Debug)]
#[command(name = "fifolog-cli")]
#[command(about = "Append-only FIFO record log with tombstones and defragmentation")]
#[command(version)]
struct Args {
    /// Log file
    #[arg(short, long, default_value = "./fifolog.log")]
    file: PathBuf,

    /// Reverse scan block size in bytes
    #[arg(long, default_value = "512")]
    reverse_buffer: usize,

    /// Disable compaction after deletions
    #[arg(long)]
    no_auto_defrag: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a JSON record
    Push {
        /// The record, as JSON
        json: String,
    },

    /// Print the record at an index
    Get {
        index: usize,
    },

    /// Print the oldest records as a JSON array
    First {
        count: usize,
    },

    /// Print the newest record
    Last,

    /// Remove the record at an index
    Remove {
        index: usize,
    },

    /// Remove the oldest records
    RemoveFirst {
        count: usize,
    },

    /// Delete every record
    Clear,

    /// Rewrite the file without tombstoned slots
    Defrag,

    /// Print size, fragmentation and file size
    Stats,

    /// Print every slot, tombstoned ones included
    Dump,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fifolog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let auto_defrag = if args.no_auto_defrag {
        None
    } else {
        Config::default().auto_defrag_threshold
    };
    let config = Config::builder()
        .path(&args.file)
        .reverse_buffer_size(args.reverse_buffer)
        .auto_defrag_threshold(auto_defrag)
        .build();

    match run(config, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config, command: Commands) -> Result<()> {
    let mut log = LogStore::open(config)?;

    match command {
        Commands::Push { json } => {
            let value: Value = serde_json::from_str(&json)
                .map_err(|e| fifolog::FifoLogError::Validation(e.to_string()))?;
            log.push(&value)?;
            println!("{}", log.len());
        }
        Commands::Get { index } => println!("{}", log.get(index)?),
        Commands::First { count } => {
            let records: Vec<Value> = log.get_first(count)?;
            println!("{}", Value::Array(records));
        }
        Commands::Last => {
            if let Some(record) = log.get_last()? {
                println!("{}", record);
            }
        }
        Commands::Remove { index } => {
            if let Some(record) = log.remove(index)? {
                println!("{}", record);
            }
        }
        Commands::RemoveFirst { count } => println!("{}", log.remove_first(count)?),
        Commands::Clear => log.clear()?,
        Commands::Defrag => {
            let outcome = log.defragment()?;
            println!(
                "{} live records, {} -> {} bytes",
                outcome.live_records, outcome.bytes_before, outcome.bytes_after
            );
        }
        Commands::Stats => {
            let stats = log.stats()?;
            println!(
                "{}",
                serde_json::to_string(&stats)
                    .map_err(|e| fifolog::FifoLogError::Encode(e.to_string()))?
            );
        }
        Commands::Dump => {
            for slot in log.slots()? {
                let slot = slot?;
                let marker = if slot.is_live() { ' ' } else { 'x' };
                println!(
                    "{:>8} {} {}",
                    slot.offset,
                    marker,
                    String::from_utf8_lossy(&slot.line)
                );
            }
        }
    }

    Ok(())
}
