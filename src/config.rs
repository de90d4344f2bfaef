//! CLI configuration

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::fixtures::DEFAULT_FIXTURES_DIR;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Apply a fixture set's offers to a basket and print the receipt.
#[derive(Debug, Parser)]
#[command(name = "rebate", about = "Conditional offers engine", long_about = None)]
pub struct Config {
    /// Fixture set name, loaded from `<fixtures-dir>/<name>.yml`
    #[arg(short, long)]
    pub fixture: String,

    /// Directory holding fixture sets
    #[arg(long, env = "REBATE_FIXTURES_DIR", default_value = DEFAULT_FIXTURES_DIR)]
    pub fixtures_dir: PathBuf,

    /// Product key to add to the basket
    #[arg(short, long)]
    pub product: String,

    /// Number of units to add
    #[arg(
        short,
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub quantity: u32,

    /// Print a receipt after every unit, not just the last
    #[arg(long)]
    pub steps: bool,

    /// Logging
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_arguments() -> TestResult {
        let config = Config::try_parse_from([
            "rebate",
            "--fixture",
            "upsell",
            "--product",
            "widget",
            "--quantity",
            "4",
            "--steps",
            "--log-format",
            "json",
            "--fixtures-dir",
            "/tmp/sets",
        ])?;

        assert_eq!(config.fixture, "upsell");
        assert_eq!(config.product, "widget");
        assert_eq!(config.quantity, 4);
        assert!(config.steps);
        assert_eq!(config.logging.log_format, LogFormat::Json);
        assert_eq!(config.fixtures_dir, PathBuf::from("/tmp/sets"));

        Ok(())
    }

    #[test]
    fn quantity_must_be_positive() {
        let result = Config::try_parse_from([
            "rebate",
            "--fixture",
            "upsell",
            "--product",
            "widget",
            "--quantity",
            "0",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn fixture_and_product_are_required() {
        assert!(Config::try_parse_from(["rebate", "--fixture", "upsell"]).is_err());
    }
}
