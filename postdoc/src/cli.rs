//! Command-line interface definitions for postdoc

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// What `render` produces
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum RenderMode {
    /// Sanitized static HTML, as published
    #[default]
    Static,
    /// The interactive editor surface, with drag gutters
    Editor,
}

/// CLI structure for the postdoc application
#[derive(Parser)]
#[command(name = "postdoc")]
#[command(version)]
#[command(about = "Rich-text post and snippet document tool", long_about = None)]
pub struct Cli {
    /// Editor configuration file
    #[arg(short, long, global = true, default_value = "postdoc.toml")]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for postdoc
#[derive(Subcommand)]
pub enum Commands {
    /// Render document JSON files (or directories of them) to HTML
    Render {
        /// Document files or directories
        #[arg(value_name = "PATH", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory; HTML goes to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rendering mode
        #[arg(short, long, value_enum, default_value = "static")]
        mode: RenderMode,

        /// Keep data-slate-* attributes in static output
        #[arg(long)]
        keep_data_attributes: bool,

        /// Class name prefix to keep in static output (repeatable)
        #[arg(long = "preserve-class", value_name = "PREFIX")]
        preserve_class: Vec<String>,
    },

    /// Import a markdown file as document JSON
    Import {
        /// Markdown file
        input: PathBuf,

        /// Output file; JSON goes to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the plugin registry and drag metadata for consistency
    Check,

    /// List uploaded images no document references
    Orphans {
        /// Directory holding uploaded images
        #[arg(long, value_name = "DIR")]
        uploads: PathBuf,

        /// Document files or directories
        #[arg(value_name = "PATH", required = true)]
        documents: Vec<PathBuf>,
    },
}
