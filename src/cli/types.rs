use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Main CLI parser structure
#[derive(Parser)]
#[command(name = "epub-tocgen")]
#[command(about = "Rule-driven table of contents generator for EPUB books", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show the full backtrace when an error occurs
    #[arg(short, long, global = true, default_value_t = false)]
    pub trace: bool,

    /// Enable verbose debugging
    #[arg(short = 'g', long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Only report errors
    #[arg(short, long, global = true, default_value_t = false, conflicts_with = "debug")]
    pub quiet: bool,
}

/// Subcommands for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Generate toc.ncx and toc.html for a book
    #[command(alias = "g")]
    Generate {
        /// The book: an .epub archive or an unpacked directory
        #[arg(value_name = "BOOK")]
        book: PathBuf,

        /// Rules file (YAML, TOML or JSON); defaults to a tocgen.* file next to the book
        #[arg(short, long, value_name = "CONFIG_FILE")]
        config: Option<PathBuf>,

        /// Write the result here instead of overwriting the book
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Restrict scanning to these element names
        #[arg(long, value_name = "TAGS", value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// Print the default rules or check a rules file
    Config {
        /// Validate this file instead of printing the defaults
        #[arg(long, value_name = "CONFIG_FILE")]
        validate: Option<PathBuf>,

        /// Output format for the defaults
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Yaml)]
        format: ConfigFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}
