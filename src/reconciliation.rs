// ⚖️ Reconciliation Engine - Join inventory animals to taxonomy rules
//
// Every inventory record arrives holding only a species name. The engine
// swaps that placeholder for the shared rule with the same name
// (exact, case-sensitive). Species missing from the taxonomy are tolerated:
// the animal stays Unresolved and is reported, never dropped.

use crate::model::{AnimalRecord, AnimalTypeRule, SpeciesRef};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// TYPE INDEX
// ============================================================================

/// Name-keyed view over the taxonomy. The first rule with a given name wins.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    by_name: HashMap<String, Arc<AnimalTypeRule>>,
}

impl TypeIndex {
    pub fn build(rules: &[Arc<AnimalTypeRule>]) -> Self {
        let mut by_name = HashMap::with_capacity(rules.len());
        for rule in rules {
            if by_name.contains_key(&rule.name) {
                warn!(species = %rule.name, "duplicate taxonomy entry ignored");
                continue;
            }
            by_name.insert(rule.name.clone(), Arc::clone(rule));
        }
        TypeIndex { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<AnimalTypeRule>> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    /// Every input record, in input order, with its type resolved where possible
    pub animals: Vec<AnimalRecord>,

    pub resolved_count: usize,

    /// Distinct unmatched species names, in first-seen order
    pub unresolved_species: Vec<String>,
}

impl ReconciliationReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved_species.is_empty()
    }

    pub fn unresolved_count(&self) -> usize {
        self.animals.len() - self.resolved_count
    }

    pub fn summary(&self) -> ReconciliationSummary {
        ReconciliationSummary {
            animal_count: self.animals.len(),
            resolved_count: self.resolved_count,
            unresolved_count: self.unresolved_count(),
            unresolved_species: self.unresolved_species.clone(),
        }
    }
}

/// Serializable counts for logs and API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub animal_count: usize,
    pub resolved_count: usize,
    pub unresolved_count: usize,
    pub unresolved_species: Vec<String>,
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine
    }

    /// Resolve each record's placeholder species against `rules`.
    ///
    /// Performs no I/O. Builds the name index once, so the join is linear in
    /// the number of records.
    pub fn reconcile(
        &self,
        rules: &[Arc<AnimalTypeRule>],
        records: Vec<AnimalRecord>,
    ) -> ReconciliationReport {
        let index = TypeIndex::build(rules);

        let mut animals = Vec::with_capacity(records.len());
        let mut resolved_count = 0;
        let mut unresolved_species = Vec::new();
        let mut seen_unresolved = HashSet::new();

        for mut animal in records {
            let species = animal.species.name().to_string();

            match index.get(&species) {
                Some(rule) => {
                    animal.species = SpeciesRef::Resolved(Arc::clone(rule));
                    resolved_count += 1;
                }
                None => {
                    if seen_unresolved.insert(species.clone()) {
                        warn!(species = %species, "species not in taxonomy; animals of this species cannot be priced");
                        unresolved_species.push(species.clone());
                    }
                    animal.species = SpeciesRef::Unresolved(species);
                }
            }

            animals.push(animal);
        }

        info!(
            animals = animals.len(),
            resolved = resolved_count,
            unresolved_species = unresolved_species.len(),
            "reconciled inventory with taxonomy"
        );

        ReconciliationReport {
            animals,
            resolved_count,
            unresolved_species,
        }
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
