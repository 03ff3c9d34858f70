// sellercheck CLI - ads.txt / sellers.json validation from the terminal

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sellercheck_cli::cache_cmd::{cmd_cache, CacheCommands};
use sellercheck_cli::exit_codes::EXIT_SUCCESS;
use sellercheck_cli::fetch::{cmd_fetch, FetchCommands};
use sellercheck_cli::optimize::cmd_optimize;
use sellercheck_cli::validate::cmd_validate;
use sellercheck_cli::CliError;

#[derive(Parser)]
#[command(name = "sellercheck")]
#[command(about = "Validate and canonicalize ads.txt against sellers.json directories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an ads.txt document
    #[command(after_help = "\
Examples:
  sellercheck validate ads.txt --domain pub.example.com
  cat ads.txt | sellercheck validate - --domain pub.example.com --json
  sellercheck validate ads.txt --domain pub.example.com --offline --strict
  sellercheck validate ads.txt --no-crosscheck")]
    Validate {
        /// Input file (`-` reads stdin)
        input: PathBuf,

        /// Publisher domain owning the document. Without it only syntax is
        /// checked: no duplicate detection, no directory cross-check.
        #[arg(long)]
        domain: Option<String>,

        /// Output the full annotated result as JSON
        #[arg(long)]
        json: bool,

        /// Exit non-zero when any record carries warnings
        #[arg(long)]
        strict: bool,

        /// Never touch the network; cross-check from cache only
        #[arg(long)]
        offline: bool,

        /// Skip the sellers.json cross-check entirely
        #[arg(long)]
        no_crosscheck: bool,

        /// Cache database path (default: the per-user data dir)
        #[arg(long)]
        cache_db: Option<PathBuf>,

        /// Directory cache freshness window in hours
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,

        /// Suppress progress on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Canonicalize an ads.txt document
    #[command(after_help = "\
Examples:
  sellercheck optimize ads.txt
  sellercheck optimize ads.txt --domain pub.example.com --out ads.optimized.txt
  cat ads.txt | sellercheck optimize -")]
    Optimize {
        /// Input file (`-` reads stdin)
        input: PathBuf,

        /// Publisher domain; synthesizes OWNERDOMAIN when absent
        #[arg(long)]
        domain: Option<String>,

        /// Output file path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Suppress progress on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Fetch supply-chain documents into the local cache
    Fetch {
        #[command(subcommand)]
        command: FetchCommands,
    },

    /// Inspect or reset the local document cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Validate {
            input,
            domain,
            json,
            strict,
            offline,
            no_crosscheck,
            cache_db,
            ttl_hours,
            quiet,
        } => cmd_validate(
            input,
            domain,
            json,
            strict,
            offline,
            no_crosscheck,
            cache_db,
            ttl_hours,
            quiet,
        ),
        Commands::Optimize { input, domain, out, quiet } => cmd_optimize(input, domain, out, quiet),
        Commands::Fetch { command } => cmd_fetch(command),
        Commands::Cache { command } => cmd_cache(command),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = &err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}
