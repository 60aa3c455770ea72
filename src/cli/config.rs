// CLI configuration
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// m4a-info - MP4/M4A audio tag reader
#[derive(Parser, Debug)]
#[command(name = "m4a-info")]
#[command(about = "Read iTunes-style tags from MP4/M4A audio files", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Parser settings as a JSON file
    #[arg(long, value_name = "JSON", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Key-value pairs
    KeyValue,
    /// Table format
    Table,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read metadata from audio file(s)
    Read {
        /// Audio file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Metadata fields to display (comma-separated)
        #[arg(long)]
        fields: Option<String>,

        /// Output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include the raw cover bytes (base64)
        #[arg(long)]
        with_cover: bool,
    },

    /// Batch read every matching file in a directory
    Batch {
        /// Directory path
        #[arg(short, long)]
        directory: PathBuf,

        /// File pattern (e.g., "*.m4a")
        #[arg(short, long, default_value = "*.m4a")]
        pattern: String,
    },

    /// Detect file format
    Detect {
        /// Audio file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Export cover art
    ExportCover {
        /// Audio file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory for cover images
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show file information
    Info {
        /// Audio file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// List the top-level atoms as well
        #[arg(short, long)]
        detailed: bool,
    },
}
