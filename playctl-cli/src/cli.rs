use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "playctl",
    about = "Resolve stream tokens to playable live or back-play locations",
    version
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PLAYCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Lookup endpoint, overrides the configuration file
    #[arg(long, global = true, env = "PLAYCTL_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds, overrides the configuration file
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a token to its playable location
    Resolve {
        /// Stream token
        token: String,

        /// Back-play from an absolute stream timestamp
        #[arg(long, conflicts_with = "rel", allow_hyphen_values = true)]
        abs: Option<i64>,

        /// Back-play from an offset relative to the live edge
        #[arg(long, allow_hyphen_values = true)]
        rel: Option<i64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        output: OutputFormat,

        /// Write the result to a file instead of stdout
        #[arg(long)]
        output_file: Option<PathBuf>,
    },

    /// Show or locate the configuration
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Print the configuration file path
        #[arg(long, conflicts_with = "show")]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    JsonCompact,
}
