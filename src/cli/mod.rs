//! CLI module for the Knowledge Assistant server
//!
//! Provides command-line interface parsing for the kassist-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;
pub mod secrets;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Knowledge Assistant server
///
/// Upload documents, search them semantically and chat with them.
#[derive(Parser, Debug)]
#[command(
    name = "kassist-server",
    version,
    about = "Knowledge Assistant - document search and retrieval-augmented chat",
    long_about = "Upload PDF, DOCX, image and text files, search them semantically and ask\n\
                  questions answered from their content.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a new project.",
    after_help = "EXAMPLES:\n    \
                  kassist-server init              # Scaffold kassist.toml, .env.example and directories\n    \
                  kassist-server                   # Start the server (reads kassist.toml)\n    \
                  kassist-server --config my.toml  # Use a custom config file\n    \
                  kassist-server config --validate # Check the configuration\n    \
                  kassist-server secrets           # Print fresh secrets for .env"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "kassist.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new project
    ///
    /// Creates kassist.toml, .env.example, .gitignore and the uploads/ and
    /// data/ directories.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Provider for embeddings and chat (gemini, openai or ollama)
        #[arg(long, default_value = "gemini")]
        provider: String,

        /// Host address for the server
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8000")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Print freshly generated secrets for a .env file
    Secrets {
        /// Length of each generated secret
        #[arg(short, long, default_value = "32")]
        length: usize,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
