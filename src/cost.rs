// 💰 Feeding Cost Engine
//
//   daily_food_amount = weight × food_to_weight_ratio
//   omnivore (meat_ratio > 0):
//       daily_cost = amount × meat_ratio × price(meat)
//                  + amount × (1 − meat_ratio) × price(fruit)
//   single diet:
//       daily_cost = amount × price(food_type)
//   monthly_cost = daily_cost × 30
//
// A missing price contributes zero. Errors are limited to an unknown animal id
// and figures that overflow the Decimal range.

use crate::error::{ZooError, ZooResult};
use crate::model::{AnimalRecord, AnimalTypeRule, PriceTable, SpeciesRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub const MEAT: &str = "meat";
pub const FRUIT: &str = "fruit";

/// Display label for omnivore diets
pub const OMNIVORE_LABEL: &str = "Meat and Fruit";

/// Display label for animals whose species has no taxonomy rule
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Fixed month length, not calendar-aware
pub const DAYS_PER_MONTH: i64 = 30;

fn checked(animal: &str, step: &'static str, value: Option<Decimal>) -> ZooResult<Decimal> {
    value.ok_or_else(|| ZooError::CostOverflow {
        animal: animal.to_string(),
        step,
    })
}

// ============================================================================
// PRICING POLICY
// ============================================================================

/// How a single-diet animal's food type is turned into a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingPolicy {
    /// Only "meat" and "fruit" are priceable; any other food type costs 0.
    #[default]
    FixedCategories,

    /// The food type is looked up in the whole price table.
    GenericLookup,
}

impl PricingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingPolicy::FixedCategories => "fixed",
            PricingPolicy::GenericLookup => "generic",
        }
    }
}

impl fmt::Display for PricingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "fixed_categories" => Ok(PricingPolicy::FixedCategories),
            "generic" | "generic_lookup" => Ok(PricingPolicy::GenericLookup),
            other => Err(format!(
                "unknown pricing policy '{}' (expected 'fixed' or 'generic')",
                other
            )),
        }
    }
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStatus {
    /// Every price the diet needs was found
    Priced,

    /// At least one needed price is absent; its share counts as zero
    MissingPrice,

    /// Species has no taxonomy rule; all amounts are zero
    UnresolvedSpecies,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedingCostReport {
    /// Unsaved animals report id 0
    pub animal_id: i64,
    pub animal_name: String,
    pub species: String,
    pub weight: Decimal,
    pub food_type: String,
    pub daily_food_amount: Decimal,
    /// Single-diet price per kg; absent for omnivores and unpriced animals
    pub food_price_per_kg: Option<Decimal>,
    pub daily_cost: Decimal,
    pub monthly_cost: Decimal,
    pub pricing: PricingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedingCostSummary {
    pub animals: Vec<FeedingCostReport>,
    pub total_daily_cost: Decimal,
    pub total_monthly_cost: Decimal,
    /// Animals whose status is not `Priced`
    pub unpriced_count: usize,
}

// ============================================================================
// COST ENGINE
// ============================================================================

/// Computes feeding costs over a borrowed animal set and price table.
///
/// Nothing is cached; every call recomputes from the inputs.
pub struct CostEngine<'a> {
    animals: &'a [AnimalRecord],
    prices: &'a PriceTable,
    policy: PricingPolicy,
}

impl<'a> CostEngine<'a> {
    pub fn new(animals: &'a [AnimalRecord], prices: &'a PriceTable) -> Self {
        CostEngine {
            animals,
            prices,
            policy: PricingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PricingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cost for one animal.
    ///
    /// # Errors
    /// `ZooError::AnimalNotFound` if no animal carries `animal_id`,
    /// `ZooError::CostOverflow` if a figure exceeds the `Decimal` range.
    pub fn cost_for(&self, animal_id: i64) -> ZooResult<FeedingCostReport> {
        let animal = self
            .animals
            .iter()
            .find(|a| a.id == Some(animal_id))
            .ok_or(ZooError::AnimalNotFound { id: animal_id })?;

        self.calculate(animal)
    }

    /// Costs for every animal plus totals.
    pub fn all_costs(&self) -> ZooResult<FeedingCostSummary> {
        let animals = self
            .animals
            .iter()
            .map(|a| self.calculate(a))
            .collect::<ZooResult<Vec<_>>>()?;

        let mut total_daily_cost = Decimal::ZERO;
        let mut total_monthly_cost = Decimal::ZERO;
        for report in &animals {
            total_daily_cost = checked(
                &report.animal_name,
                "total daily cost",
                total_daily_cost.checked_add(report.daily_cost),
            )?;
            total_monthly_cost = checked(
                &report.animal_name,
                "total monthly cost",
                total_monthly_cost.checked_add(report.monthly_cost),
            )?;
        }

        let unpriced_count = animals
            .iter()
            .filter(|r| r.pricing != PricingStatus::Priced)
            .count();

        Ok(FeedingCostSummary {
            animals,
            total_daily_cost,
            total_monthly_cost,
            unpriced_count,
        })
    }

    /// Sum of every animal's daily cost.
    pub fn total_daily_cost(&self) -> ZooResult<Decimal> {
        Ok(self.all_costs()?.total_daily_cost)
    }

    /// Sum of every animal's monthly cost.
    pub fn total_monthly_cost(&self) -> ZooResult<Decimal> {
        Ok(self.all_costs()?.total_monthly_cost)
    }

    /// Per-animal calculation. Fails only when a figure overflows.
    pub fn calculate(&self, animal: &AnimalRecord) -> ZooResult<FeedingCostReport> {
        let rule = match &animal.species {
            SpeciesRef::Resolved(rule) => rule,
            SpeciesRef::Unresolved(species) => return Ok(Self::unresolved(animal, species)),
        };

        let daily_food_amount = checked(
            &animal.name,
            "daily food amount",
            animal.weight.checked_mul(rule.food_to_weight_ratio),
        )?;

        let (food_type, food_price_per_kg, daily_cost, pricing) = if rule.is_omnivore() {
            let (cost, pricing) = self.omnivore_cost(animal, daily_food_amount, rule.meat_ratio)?;
            (OMNIVORE_LABEL.to_string(), None, cost, pricing)
        } else {
            match self.single_diet_price(rule) {
                Some(price) => (
                    rule.food_type.clone(),
                    Some(price),
                    checked(&animal.name, "daily cost", daily_food_amount.checked_mul(price))?,
                    PricingStatus::Priced,
                ),
                None => {
                    warn!(
                        animal = %animal.name,
                        food_type = %rule.food_type,
                        policy = %self.policy,
                        "no price for food type; daily cost counted as zero"
                    );
                    (
                        rule.food_type.clone(),
                        None,
                        Decimal::ZERO,
                        PricingStatus::MissingPrice,
                    )
                }
            }
        };

        let monthly_cost = checked(
            &animal.name,
            "monthly cost",
            daily_cost.checked_mul(Decimal::from(DAYS_PER_MONTH)),
        )?;

        Ok(FeedingCostReport {
            animal_id: animal.id.unwrap_or_default(),
            animal_name: animal.name.clone(),
            species: rule.name.clone(),
            weight: animal.weight,
            food_type,
            daily_food_amount,
            food_price_per_kg,
            daily_cost,
            monthly_cost,
            pricing,
        })
    }

    /// Split `amount` between meat and fruit; each side is priced only if
    /// its price exists.
    fn omnivore_cost(
        &self,
        animal: &AnimalRecord,
        amount: Decimal,
        meat_ratio: Decimal,
    ) -> ZooResult<(Decimal, PricingStatus)> {
        let name = animal.name.as_str();
        let meat_amount = checked(name, "meat amount", amount.checked_mul(meat_ratio))?;
        let fruit_share = checked(name, "fruit share", Decimal::ONE.checked_sub(meat_ratio))?;
        let fruit_amount = checked(name, "fruit amount", amount.checked_mul(fruit_share))?;

        let meat_price = self.prices.price_of(MEAT);
        let fruit_price = self.prices.price_of(FRUIT);

        let mut cost = Decimal::ZERO;
        if let Some(price) = meat_price {
            let meat_cost = checked(name, "meat cost", meat_amount.checked_mul(price))?;
            cost = checked(name, "daily cost", cost.checked_add(meat_cost))?;
        }
        if let Some(price) = fruit_price {
            let fruit_cost = checked(name, "fruit cost", fruit_amount.checked_mul(price))?;
            cost = checked(name, "daily cost", cost.checked_add(fruit_cost))?;
        }

        let pricing = if meat_price.is_some() && fruit_price.is_some() {
            PricingStatus::Priced
        } else {
            warn!(
                meat_found = meat_price.is_some(),
                fruit_found = fruit_price.is_some(),
                "omnivore diet missing a price; that share counted as zero"
            );
            PricingStatus::MissingPrice
        };

        Ok((cost, pricing))
    }

    fn single_diet_price(&self, rule: &AnimalTypeRule) -> Option<Decimal> {
        match self.policy {
            PricingPolicy::FixedCategories => {
                let food = rule.food_type.to_lowercase();
                if food == MEAT || food == FRUIT {
                    self.prices.price_of(&food)
                } else {
                    debug!(food_type = %rule.food_type, "food type outside meat/fruit is not priced");
                    None
                }
            }
            PricingPolicy::GenericLookup => self.prices.price_of(&rule.food_type),
        }
    }

    fn unresolved(animal: &AnimalRecord, species: &str) -> FeedingCostReport {
        debug!(animal = %animal.name, species, "unresolved species; reporting zero cost");
        FeedingCostReport {
            animal_id: animal.id.unwrap_or_default(),
            animal_name: animal.name.clone(),
            species: species.to_string(),
            weight: animal.weight,
            food_type: UNKNOWN_LABEL.to_string(),
            daily_food_amount: Decimal::ZERO,
            food_price_per_kg: None,
            daily_cost: Decimal::ZERO,
            monthly_cost: Decimal::ZERO,
            pricing: PricingStatus::UnresolvedSpecies,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
