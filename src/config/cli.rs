use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the hadith reader.
#[derive(Debug, Parser)]
#[command(
    name = "hadith-reader",
    version,
    about = "Read the hadith catalog through the cached RPC client"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "HADITH_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Language requested from the catalog.
    #[arg(long, global = true, default_value = "en", value_name = "CODE")]
    pub language: String,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List every collection.
    Collections,
    /// Show one collection with its books.
    Collection {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Print the sidebar tree, optionally expanding collections.
    Navigation {
        /// Collection ids to expand after the preload.
        #[arg(long = "expand", value_name = "ID")]
        expand: Vec<String>,
    },
    /// Show one hadith.
    Hadith {
        #[arg(value_name = "URN")]
        urn: String,
    },
    /// Full-text search.
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Log in and print the session user.
    Login {
        #[arg(long)]
        username: String,

        #[arg(long, env = "HADITH_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the public API address.
    #[arg(long = "api-public-url", value_name = "URL", global = true)]
    pub api_public_url: Option<String>,

    /// Override the internal API address.
    #[arg(long = "api-internal-url", value_name = "URL", global = true)]
    pub api_internal_url: Option<String>,

    /// Override the execution context (server|client).
    #[arg(long = "api-context", value_name = "CONTEXT", global = true)]
    pub api_context: Option<String>,

    /// Override the per-request timeout.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS", global = true)]
    pub api_timeout_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}
