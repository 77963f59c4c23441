use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Extract, search and select text on PDF pages.
#[derive(Debug, Parser)]
#[command(name = "textpage", about, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dump page text in reading order
    Text {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Apply NFKC normalization to the output
        #[arg(long)]
        normalize: bool,

        /// User password for encrypted files
        #[arg(long)]
        password: Option<String>,
    },

    /// Search for a keyword and print match rectangles
    Search {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// The keyword (multiple words match across word boundaries)
        #[arg(value_name = "QUERY")]
        query: String,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,

        /// User password for encrypted files
        #[arg(long)]
        password: Option<String>,
    },

    /// Select text between two fractional page coordinates
    Select {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Selection start as 'x,y' fractions in [0,1]
        #[arg(long, value_name = "X,Y")]
        from: String,

        /// Selection end as 'x,y' fractions in [0,1]
        #[arg(long, value_name = "X,Y")]
        to: String,

        /// Apply NFKC normalization to the output
        #[arg(long)]
        normalize: bool,

        /// User password for encrypted files
        #[arg(long)]
        password: Option<String>,
    },

    /// Show page count, page sizes and diagnostics
    Info {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// User password for encrypted files
        #[arg(long)]
        password: Option<String>,
    },
}
