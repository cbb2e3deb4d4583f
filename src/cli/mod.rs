//! CLI module for Skriv.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// The video the pipeline runs on when none is given.
pub const DEFAULT_VIDEO_URL: &str = "https://www.youtube.com/watch?v=3CwWGSV0l9o";

/// Skriv - YouTube transcripts to blog posts
///
/// Fetches a video's transcript, extracts structured knowledge from it with an LLM,
/// and drafts a blog post from that knowledge.
/// The name "Skriv" is the Norwegian/Scandinavian word for "write."
#[derive(Parser, Debug)]
#[command(name = "skriv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SKRIV_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for saved results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The blog post as Markdown
    Markdown,
    /// Transcript, knowledge and blog post as JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a transcript, extract knowledge and draft a blog post
    Run {
        /// YouTube URL or video ID
        #[arg(default_value = DEFAULT_VIDEO_URL)]
        video: String,

        /// Transcript language code (defaults to the configured language)
        #[arg(short, long)]
        language: Option<String>,

        /// LLM model for knowledge extraction
        #[arg(long)]
        extraction_model: Option<String>,

        /// LLM model for blog writing
        #[arg(long)]
        blog_model: Option<String>,

        /// Write the result to a file
        #[arg(short, long)]
        output: Option<String>,

        /// Format used with --output
        #[arg(long, value_enum, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Fetch and print a video's transcript only
    Transcript {
        /// YouTube URL or video ID
        video: String,

        /// Transcript language code (defaults to the configured language)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Ask a question about a video, answered from its transcript
    Ask {
        /// The question, including the video URL or ID
        question: String,

        /// Print the fetched transcript instead of an answer
        #[arg(long)]
        raw: bool,

        /// LLM model (defaults to the extraction model)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "blog.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}

/// Tracing filter for the crate: `-v` flags win over the configured level.
pub fn log_filter(verbose: u8, configured: &str) -> String {
    let level = match verbose {
        0 => configured.trim(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let level = if level.is_empty() { "warn" } else { level };
    format!("skriv={}", level)
}
