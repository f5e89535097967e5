use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod dict;

#[derive(Parser)]
#[command(name = "lexica-cmd")]
#[command(about = "Command-line utility for Lexica dictionary files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a dictionary file from a TSV source (key TAB weight per line)
    Build {
        /// Input TSV file
        tsv_path: String,

        /// Output dictionary file
        dict_path: String,
    },

    /// Look up the id of an exact key
    Lookup {
        /// Dictionary file to query
        dict_path: String,

        /// Key to look up
        key: String,
    },

    /// List stored keys that are prefixes of the query
    Prefix {
        /// Dictionary file to query
        dict_path: String,

        /// Query string
        query: String,
    },

    /// List stored keys that complete the query
    Predict {
        /// Dictionary file to query
        dict_path: String,

        /// Query string
        query: String,
    },

    /// Export a dictionary back to TSV (key TAB id per line)
    Export {
        /// Dictionary file to export
        dict_path: String,

        /// Output TSV file
        tsv_path: String,
    },

    /// Display summary information about a dictionary file
    Inspect {
        /// Dictionary file to inspect
        dict_path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            tsv_path,
            dict_path,
        } => commands::build::run(tsv_path, dict_path),
        Commands::Lookup { dict_path, key } => commands::query::run_lookup(dict_path, key),
        Commands::Prefix { dict_path, query } => commands::query::run_prefix(dict_path, query),
        Commands::Predict { dict_path, query } => commands::query::run_predict(dict_path, query),
        Commands::Export {
            dict_path,
            tsv_path,
        } => commands::export::run(dict_path, tsv_path),
        Commands::Inspect { dict_path } => commands::inspect::run(dict_path),
    }
}
