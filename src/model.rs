// 🦓 Zoo Data Model
// Species rules, individual animals and food prices after normalization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// ANIMAL TYPE RULE
// ============================================================================

/// Species-level feeding policy, one per taxonomy line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalTypeRule {
    /// Species name, the join key for inventory records
    pub name: String,

    /// kg of food per kg of body weight per day
    pub food_to_weight_ratio: Decimal,

    /// Free-text food label, matched case-insensitively against prices
    pub food_type: String,

    /// Share of the diet that is meat, in [0, 1]. Zero means single-diet.
    pub meat_ratio: Decimal,
}

impl AnimalTypeRule {
    pub fn new(
        name: String,
        food_to_weight_ratio: Decimal,
        food_type: String,
        meat_ratio: Decimal,
    ) -> Self {
        AnimalTypeRule {
            name,
            food_to_weight_ratio,
            food_type,
            meat_ratio,
        }
    }

    /// Omnivores split their daily food between meat and fruit.
    pub fn is_omnivore(&self) -> bool {
        self.meat_ratio > Decimal::ZERO
    }
}

// ============================================================================
// SPECIES REFERENCE
// ============================================================================

/// An animal's link to its taxonomy rule.
///
/// Inventory parsing only knows the species name; reconciliation swaps in the
/// shared rule when the taxonomy has one. Animals whose species never matched
/// stay `Unresolved` and cannot be priced.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeciesRef {
    Resolved(Arc<AnimalTypeRule>),
    Unresolved(String),
}

impl SpeciesRef {
    pub fn name(&self) -> &str {
        match self {
            SpeciesRef::Resolved(rule) => &rule.name,
            SpeciesRef::Unresolved(name) => name,
        }
    }

    pub fn rule(&self) -> Option<&AnimalTypeRule> {
        match self {
            SpeciesRef::Resolved(rule) => Some(rule),
            SpeciesRef::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, SpeciesRef::Resolved(_))
    }
}

// ============================================================================
// ANIMAL RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AnimalRecord {
    /// Assigned when the animal enters a snapshot or the database
    pub id: Option<i64>,
    pub name: String,
    /// Body weight in kg
    pub weight: Decimal,
    pub species: SpeciesRef,
}

impl AnimalRecord {
    /// Create a record holding only a placeholder species name.
    pub fn new(name: String, weight: Decimal, species: String) -> Self {
        AnimalRecord {
            id: None,
            name,
            weight,
            species: SpeciesRef::Unresolved(species),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_rule(mut self, rule: Arc<AnimalTypeRule>) -> Self {
        self.species = SpeciesRef::Resolved(rule);
        self
    }
}

// ============================================================================
// PRICES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub food_type: String,
    /// Currency per kg
    pub price: Decimal,
}

impl PriceEntry {
    pub fn new(food_type: String, price: Decimal) -> Self {
        PriceEntry { food_type, price }
    }
}

/// Read-only price list with case-insensitive lookup.
///
/// When the same food type appears twice the first entry wins.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    entries: Vec<PriceEntry>,
    index: HashMap<String, usize>,
}

impl PriceTable {
    pub fn from_entries(entries: Vec<PriceEntry>) -> Self {
        let mut index = HashMap::new();
        for (pos, entry) in entries.iter().enumerate() {
            index.entry(entry.food_type.to_lowercase()).or_insert(pos);
        }
        PriceTable { entries, index }
    }

    pub fn lookup(&self, food_type: &str) -> Option<&PriceEntry> {
        self.index
            .get(&food_type.to_lowercase())
            .map(|&pos| &self.entries[pos])
    }

    pub fn price_of(&self, food_type: &str) -> Option<Decimal> {
        self.lookup(food_type).map(|entry| entry.price)
    }

    pub fn entries(&self) -> &[PriceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lion() -> AnimalTypeRule {
        AnimalTypeRule::new(
            "Lion".to_string(),
            Decimal::new(10, 2),
            "meat".to_string(),
            Decimal::ZERO,
        )
    }

    #[test]
    fn test_omnivore_flag() {
        let mut rule = lion();
        assert!(!rule.is_omnivore());

        rule.meat_ratio = Decimal::new(5, 1);
        assert!(rule.is_omnivore());
    }

    #[test]
    fn test_species_ref_accessors() {
        let placeholder = SpeciesRef::Unresolved("Dodo".to_string());
        assert_eq!(placeholder.name(), "Dodo");
        assert!(placeholder.rule().is_none());
        assert!(!placeholder.is_resolved());

        let resolved = SpeciesRef::Resolved(Arc::new(lion()));
        assert_eq!(resolved.name(), "Lion");
        assert_eq!(resolved.rule().map(|r| r.food_type.as_str()), Some("meat"));
        assert!(resolved.is_resolved());
    }

    #[test]
    fn test_animal_record_builder() {
        let animal = AnimalRecord::new("Simba".to_string(), Decimal::from(160), "Lion".to_string())
            .with_id(7)
            .with_rule(Arc::new(lion()));

        assert_eq!(animal.id, Some(7));
        assert!(animal.species.is_resolved());
    }

    #[test]
    fn test_price_table_case_insensitive_lookup() {
        let table = PriceTable::from_entries(vec![
            PriceEntry::new("Meat".to_string(), Decimal::new(1256, 2)),
            PriceEntry::new("Fruit".to_string(), Decimal::new(560, 2)),
        ]);

        assert_eq!(table.price_of("meat"), Some(Decimal::new(1256, 2)));
        assert_eq!(table.price_of("FRUIT"), Some(Decimal::new(560, 2)));
        assert_eq!(table.price_of("fish"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_price_table_first_entry_wins() {
        let table = PriceTable::from_entries(vec![
            PriceEntry::new("meat".to_string(), Decimal::from(10)),
            PriceEntry::new("MEAT".to_string(), Decimal::from(99)),
        ]);

        assert_eq!(table.price_of("Meat"), Some(Decimal::from(10)));
        assert_eq!(table.entries().len(), 2);
    }
}
