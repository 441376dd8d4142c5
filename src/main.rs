mod commands;
mod config;
mod menu;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use commands::Shell;
use config::Config;

/// Tailscope - browse, filter and live-tail CMTrace and plain text log files
#[derive(Parser, Debug)]
#[command(name = "tailscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log file to open (optional in the interactive menu)
    #[arg(value_name = "FILE")]
    path: Option<String>,

    /// Config file (default: ~/.tailscope/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Milliseconds between tail polls
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Entries per pager page
    #[arg(long)]
    page_size: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Log debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every entry
    Show,
    /// Show entries whose message contains QUERY, ignoring case
    Search { query: String },
    /// Show errors, failures and warnings
    Errors,
    /// Show entries from the last MINUTES minutes
    Recent { minutes: u32 },
    /// Follow the file and print new entries until q, Esc or Ctrl-C
    Tail {
        /// Only print entries containing this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print entry counts and the covered time range
    Summary,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for debugging
    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    run(args)
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(size) = args.page_size {
        config.page_size = size;
    }
    config.validate()?;

    let shell = Shell::new(config, args.no_color)?;
    let session = args.path.as_deref().map(|p| shell.open(p)).transpose()?;

    let Some(command) = args.command else {
        return menu::run(&shell, session);
    };
    let Some(mut session) = session else {
        bail!("a log file path is required for this command");
    };

    match command {
        Command::Show => shell.show_all(&session),
        Command::Search { query } => shell.search(&session, &query),
        Command::Errors => shell.errors(&session),
        Command::Recent { minutes } => shell.recent(&session, minutes),
        Command::Tail { filter } => shell.tail(&mut session, filter.as_deref()),
        Command::Summary => {
            shell.summary(&session);
            Ok(())
        }
    }
}
