use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Solidity Analyzer - static analysis for Solidity smart contracts
#[derive(Parser, Debug)]
#[command(name = "solidity-analyzer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze Solidity files or directories
    Check {
        /// Files or directories to analyze
        paths: Vec<PathBuf>,

        /// Path to a JSON configuration file
        #[arg(short, long, env = "SOLIDITY_ANALYZER_CONFIG")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Apply fixable issues to the files in place
        #[arg(long)]
        fix: bool,

        /// Print fixes as a diff without touching any file
        #[arg(long)]
        diff: bool,

        /// Keep a .bak copy of every file rewritten by --fix
        #[arg(long)]
        backup: bool,

        /// Parallel files (0 = number of CPUs)
        #[arg(long, default_value_t = 0)]
        max_concurrency: usize,

        /// Directory for the persistent result cache
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Disable the result cache entirely
        #[arg(long)]
        no_cache: bool,

        /// Include suggestions in the report
        #[arg(short, long)]
        verbose: bool,

        /// Suppress the progress bar
        #[arg(short, long)]
        quiet: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// List all registered rules grouped by category
    Rules {
        /// Disable colored output
        #[arg(long)]
        no_color: bool
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json
}
