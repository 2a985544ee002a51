// ⚙️ Configuration - flags, environment and .env
//
// Every flag can also be set through its ZOO_* environment variable.
// Binaries call `load_dotenv()` before parsing so a local .env file counts.

use crate::cost::PricingPolicy;
use crate::pipeline::SourcePaths;
use clap::Args;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "zoo_feeding=info";

#[derive(Debug, Clone, Args)]
pub struct ZooConfig {
    /// Directory holding the three source files
    #[arg(long, env = "ZOO_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Taxonomy file (relative to the data dir unless absolute)
    #[arg(long, env = "ZOO_TAXONOMY_FILE", default_value = "animals.csv")]
    pub taxonomy_file: PathBuf,

    /// Price list file
    #[arg(long, env = "ZOO_PRICES_FILE", default_value = "prices.txt")]
    pub prices_file: PathBuf,

    /// Zoo inventory XML
    #[arg(long, env = "ZOO_INVENTORY_FILE", default_value = "zoo.xml")]
    pub inventory_file: PathBuf,

    /// SQLite database file
    #[arg(long, env = "ZOO_DB_PATH", default_value = "zoo.db")]
    pub db_path: PathBuf,

    /// How single-diet animals find their price: fixed | generic
    #[arg(long, env = "ZOO_PRICING_POLICY", default_value = "fixed")]
    pub pricing_policy: PricingPolicy,
}

impl ZooConfig {
    /// Source file locations. `Path::join` keeps absolute names as they are.
    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths::new(
            self.data_dir.join(&self.taxonomy_file),
            self.data_dir.join(&self.prices_file),
            self.data_dir.join(&self.inventory_file),
        )
    }
}

/// Read `.env` if there is one. A missing file is not an error.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Install the global subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ZooConfig,
    }

    fn parse(args: &[&str]) -> ZooConfig {
        let mut argv = vec!["zoo"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().config
    }

    #[test]
    fn test_explicit_flags() {
        let config = parse(&[
            "--data-dir",
            "/srv/zoo",
            "--prices-file",
            "tariff.txt",
            "--db-path",
            "/tmp/zoo-test.db",
            "--pricing-policy",
            "generic",
        ]);

        let paths = config.source_paths();
        assert_eq!(paths.taxonomy, Path::new("/srv/zoo").join(&config.taxonomy_file));
        assert_eq!(paths.prices, PathBuf::from("/srv/zoo/tariff.txt"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/zoo-test.db"));
        assert_eq!(config.pricing_policy, PricingPolicy::GenericLookup);
    }

    #[test]
    fn test_absolute_file_ignores_data_dir() {
        let config = parse(&[
            "--data-dir",
            "/srv/zoo",
            "--inventory-file",
            "/mnt/shared/zoo.xml",
        ]);

        assert_eq!(config.source_paths().inventory, PathBuf::from("/mnt/shared/zoo.xml"));
    }

    #[test]
    fn test_unknown_pricing_policy_rejected() {
        let result = TestCli::try_parse_from(["zoo", "--pricing-policy", "cheapest"]);

        assert!(result.is_err());
    }
}
