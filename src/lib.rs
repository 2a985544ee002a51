// Zoo Feeding Cost System - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod cost;
pub mod db;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod reconciliation;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{init_tracing, load_dotenv, ZooConfig};
pub use cost::{
    CostEngine, FeedingCostReport, FeedingCostSummary, PricingPolicy, PricingStatus,
    DAYS_PER_MONTH, OMNIVORE_LABEL,
};
pub use db::{
    compute_source_digest, count_animals, get_migrations, load_snapshot, migrate,
    setup_database, MigrationOutcome, MigrationRecord,
};
pub use error::{ZooError, ZooResult};
pub use model::{AnimalRecord, AnimalTypeRule, PriceEntry, PriceTable, SpeciesRef};
pub use parser::{InventoryParser, PriceParser, RecordParser, SourceKind, TaxonomyParser};
pub use pipeline::{SourcePaths, ZooSnapshot};
pub use reconciliation::{
    ReconciliationEngine, ReconciliationReport, ReconciliationSummary, TypeIndex,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
