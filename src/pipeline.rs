// 🔄 Ingestion Pipeline - three files in, one immutable snapshot out
//
// taxonomy → inventory → reconcile → prices. The resulting snapshot is
// read-only; share it as Arc<ZooSnapshot> and build a CostEngine per request.

use crate::cost::{CostEngine, PricingPolicy};
use crate::error::ZooResult;
use crate::model::{AnimalRecord, AnimalTypeRule, PriceEntry, PriceTable};
use crate::parser::{InventoryParser, PriceParser, RecordParser, SourceKind, TaxonomyParser};
use crate::reconciliation::{ReconciliationEngine, ReconciliationSummary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// SOURCE PATHS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub taxonomy: PathBuf,
    pub prices: PathBuf,
    pub inventory: PathBuf,
}

impl SourcePaths {
    pub fn new(
        taxonomy: impl Into<PathBuf>,
        prices: impl Into<PathBuf>,
        inventory: impl Into<PathBuf>,
    ) -> Self {
        SourcePaths {
            taxonomy: taxonomy.into(),
            prices: prices.into(),
            inventory: inventory.into(),
        }
    }

    /// The default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        SourcePaths::new(
            dir.join(SourceKind::Taxonomy.default_file_name()),
            dir.join(SourceKind::Prices.default_file_name()),
            dir.join(SourceKind::Inventory.default_file_name()),
        )
    }
}

// ============================================================================
// ZOO SNAPSHOT
// ============================================================================

/// Reference data plus reconciled animals, loaded once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct ZooSnapshot {
    rules: Vec<Arc<AnimalTypeRule>>,
    animals: Vec<AnimalRecord>,
    prices: PriceTable,
    reconciliation: Option<ReconciliationSummary>,
}

impl ZooSnapshot {
    /// Parse and reconcile all three sources.
    ///
    /// Animals are numbered 1..n in inventory order. Any missing file or
    /// malformed value aborts the whole ingest.
    pub fn ingest(paths: &SourcePaths) -> ZooResult<Self> {
        info!(
            taxonomy = %paths.taxonomy.display(),
            prices = %paths.prices.display(),
            inventory = %paths.inventory.display(),
            "starting ingestion"
        );

        let rules: Vec<Arc<AnimalTypeRule>> = TaxonomyParser::new()
            .parse(&paths.taxonomy)?
            .into_iter()
            .map(Arc::new)
            .collect();

        let records = InventoryParser::new().parse(&paths.inventory)?;
        let report = ReconciliationEngine::new().reconcile(&rules, records);
        let summary = report.summary();

        let animals = report
            .animals
            .into_iter()
            .zip(1i64..)
            .map(|(animal, id)| animal.with_id(id))
            .collect();

        let prices = PriceParser::new().parse(&paths.prices)?;

        Ok(ZooSnapshot::from_parts(rules, animals, prices).with_reconciliation(summary))
    }

    /// Assemble a snapshot from already-resolved parts (storage, tests).
    pub fn from_parts(
        rules: Vec<Arc<AnimalTypeRule>>,
        animals: Vec<AnimalRecord>,
        prices: Vec<PriceEntry>,
    ) -> Self {
        ZooSnapshot {
            rules,
            animals,
            prices: PriceTable::from_entries(prices),
            reconciliation: None,
        }
    }

    fn with_reconciliation(mut self, summary: ReconciliationSummary) -> Self {
        self.reconciliation = Some(summary);
        self
    }

    pub fn rules(&self) -> &[Arc<AnimalTypeRule>] {
        &self.rules
    }

    pub fn animals(&self) -> &[AnimalRecord] {
        &self.animals
    }

    pub fn animal(&self, id: i64) -> Option<&AnimalRecord> {
        self.animals.iter().find(|a| a.id == Some(id))
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Present only for snapshots built by `ingest`.
    pub fn reconciliation(&self) -> Option<&ReconciliationSummary> {
        self.reconciliation.as_ref()
    }

    pub fn cost_engine(&self, policy: PricingPolicy) -> CostEngine<'_> {
        CostEngine::new(&self.animals, &self.prices).with_policy(policy)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZooError;
    use rust_decimal::Decimal;
    use std::fs;
    use tempfile::TempDir;

    fn write_sources(dir: &TempDir) -> SourcePaths {
        fs::write(
            dir.path().join("animals.csv"),
            "Lion;0.10;meat;\nGiraffe;0.08;fruit;\nWolf;0.07;both;90%\n",
        )
        .unwrap();
        fs::write(dir.path().join("prices.txt"), "Meat=12.56\nFruit=5.60\n").unwrap();
        fs::write(
            dir.path().join("zoo.xml"),
            r#"<Zoo>
  <Lions><Lion name="Simba" kg="160"/><Lion name="Nala" kg="172"/></Lions>
  <Wolves><Wolf name="Pin" kg="78"/></Wolves>
  <Yetis><Yeti name="Bigfoot" kg="300"/></Yetis>
</Zoo>"#,
        )
        .unwrap();
        SourcePaths::in_dir(dir.path())
    }

    #[test]
    fn test_in_dir_uses_default_names() {
        let paths = SourcePaths::in_dir(Path::new("/srv/zoo"));

        assert_eq!(paths.taxonomy, PathBuf::from("/srv/zoo/animals.csv"));
        assert_eq!(paths.prices, PathBuf::from("/srv/zoo/prices.txt"));
        assert_eq!(paths.inventory, PathBuf::from("/srv/zoo/zoo.xml"));
    }

    #[test]
    fn test_ingest_builds_snapshot() {
        let dir = TempDir::new().unwrap();
        let snapshot = ZooSnapshot::ingest(&write_sources(&dir)).unwrap();

        assert_eq!(snapshot.rules().len(), 3);
        assert_eq!(snapshot.animals().len(), 4);
        assert_eq!(snapshot.prices().len(), 2);

        let ids: Vec<_> = snapshot.animals().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4)]);

        let summary = snapshot.reconciliation().unwrap();
        assert_eq!(summary.resolved_count, 3);
        assert_eq!(summary.unresolved_species, vec!["Yeti".to_string()]);
    }

    #[test]
    fn test_ingest_then_cost() {
        let dir = TempDir::new().unwrap();
        let snapshot = ZooSnapshot::ingest(&write_sources(&dir)).unwrap();
        let engine = snapshot.cost_engine(PricingPolicy::FixedCategories);

        // 160 × 0.10 × 12.56
        let simba = engine.cost_for(1).unwrap();
        assert_eq!(simba.daily_cost, Decimal::new(20096, 2));

        let summary = engine.all_costs().unwrap();
        assert_eq!(summary.animals.len(), 4);
        assert_eq!(summary.unpriced_count, 1);
    }

    #[test]
    fn test_ingest_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let paths = write_sources(&dir);
        fs::remove_file(&paths.prices).unwrap();

        let result = ZooSnapshot::ingest(&paths);

        assert!(matches!(result, Err(ZooError::NotFound { .. })));
    }

    #[test]
    fn test_animal_lookup() {
        let dir = TempDir::new().unwrap();
        let snapshot = ZooSnapshot::ingest(&write_sources(&dir)).unwrap();

        assert_eq!(snapshot.animal(3).map(|a| a.name.as_str()), Some("Pin"));
        assert!(snapshot.animal(99).is_none());
    }
}
