use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reclass")]
#[command(about = "Bulk re-classification of MRO catalog products", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit one JSON object per log line instead of compact text
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the products table and its indexes
    Setup,

    /// Import products from a catalog CSV export
    Import {
        /// CSV file with Produto / Marca / Modelo / Categoria columns
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Classify every pending product
    Classify(RunArgs),

    /// Reset errored products to pending and classify them again
    ReprocessErrors(RunArgs),

    /// Print progress counters and the category distribution
    Report,

    /// Classify a single ad-hoc description without touching the database
    TestOne {
        /// Product name, e.g. "DISJUNTOR MOTOR 3P 30-36A"
        name: String,

        /// Current catalog path, e.g. "MRO: ... > AUTOMAÇÃO INDUSTRIAL"
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Products fetched per batch
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: u32,

    /// Pause between batches, in seconds
    #[arg(short, long, default_value_t = 2.0, value_name = "SECONDS")]
    pub delay: f64,

    /// Pause between products within a batch, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub item_delay_ms: u64,

    /// Classification attempts per product, including the first call
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        assert!(Cli::try_parse_from(["reclass", "classify", "--max-attempts", "0"]).is_err());
        assert!(Cli::try_parse_from(["reclass", "classify", "--max-attempts", "1"]).is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(Cli::try_parse_from(["reclass", "classify", "--batch-size", "0"]).is_err());
    }
}
