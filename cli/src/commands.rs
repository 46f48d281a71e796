//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for votemute
#[derive(Parser, Debug)]
#[command(name = "votemute")]
#[command(author, version, about = "Vote-mute moderation console")]
#[command(long_about = r#"
votemute drives the moderation engine from a line-oriented console.
Members join and leave channels, get muted directly or by a majority
vote of the people sharing their channel, and are released when their
time runs out.

Commands are read from --script, or from stdin when no script is given.
Type `help` in the console for the command list.

Configuration files are loaded from (in priority order):
1. VOTEMUTE_* environment variables (e.g. VOTEMUTE_VOTE__LIFETIME_SECS=30)
2. --config <path>         Explicit config file
3. ./votemute.toml         Project-level config
4. ~/.config/votemute/config.toml   Global config

Example:
  votemute --script demo.txt
  echo "join alice voice" | votemute -v
"#)]
pub struct Cli {
    /// Read console commands from this file instead of stdin
    #[arg(short, long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append moderation events to this JSONL file (overrides [logging].event_log)
    #[arg(long, value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Do not print moderation notifications
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and the merged configuration, then exit
    #[arg(long)]
    pub show_config: bool,
}
