// 🗄️ Persistence - SQLite store for reconciled zoo data
//
// Decimals are stored as TEXT so prices and weights round-trip exactly.
// Each import is recorded in a migrations ledger keyed by the SHA-256 of the
// three source files; importing the same files twice is a no-op.

use crate::error::ZooError;
use crate::model::{AnimalRecord, AnimalTypeRule, PriceEntry, SpeciesRef};
use crate::pipeline::{SourcePaths, ZooSnapshot};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// MIGRATION LEDGER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub run_id: String,
    pub source_digest: String,
    pub migrated_at: DateTime<Utc>,
    pub animal_types: i64,
    pub animals: i64,
    pub food_prices: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    /// Sources were ingested and the reference tables replaced
    Applied(MigrationRecord),

    /// These exact sources were imported before; nothing changed
    AlreadyApplied(MigrationRecord),
}

impl MigrationOutcome {
    pub fn record(&self) -> &MigrationRecord {
        match self {
            MigrationOutcome::Applied(record) | MigrationOutcome::AlreadyApplied(record) => record,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, MigrationOutcome::Applied(_))
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS animal_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type_name TEXT NOT NULL,
            food_to_weight_ratio TEXT NOT NULL,
            food_type TEXT NOT NULL,
            meat_ratio TEXT NOT NULL
        )",
        [],
    )?;

    // animal_type_id is NULL for species missing from the taxonomy
    conn.execute(
        "CREATE TABLE IF NOT EXISTS animals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            weight TEXT NOT NULL,
            species TEXT NOT NULL,
            animal_type_id INTEGER REFERENCES animal_types(id) ON DELETE SET NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS food_prices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            food_type TEXT NOT NULL,
            price TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            source_digest TEXT NOT NULL,
            migrated_at TEXT NOT NULL,
            animal_types INTEGER NOT NULL,
            animals INTEGER NOT NULL,
            food_prices INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_animals_type ON animals(animal_type_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// IMPORT
// ============================================================================

/// SHA-256 over the bytes of all three sources, in a fixed order.
pub fn compute_source_digest(paths: &SourcePaths) -> Result<String> {
    let mut hasher = Sha256::new();

    for path in [&paths.taxonomy, &paths.prices, &paths.inventory] {
        let bytes = std::fs::read(path).map_err(|e| ZooError::from_io(path, e))?;
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Ingest the sources and persist them, replacing any previous import.
///
/// Runs in one SQL transaction: readers see either the old tables or the new
/// ones, never a half-loaded mix.
pub fn migrate(conn: &mut Connection, paths: &SourcePaths) -> Result<MigrationOutcome> {
    let digest = compute_source_digest(paths)?;

    // Only the latest import describes what the tables hold now
    if let Some(latest) = latest_migration(conn)? {
        if latest.source_digest == digest {
            info!(run_id = %latest.run_id, "sources unchanged since last import; skipping");
            return Ok(MigrationOutcome::AlreadyApplied(latest));
        }
    }

    let snapshot = ZooSnapshot::ingest(paths).context("Failed to ingest source files")?;

    let tx = conn.transaction()?;

    tx.execute("DELETE FROM animals", [])?;
    tx.execute("DELETE FROM animal_types", [])?;
    tx.execute("DELETE FROM food_prices", [])?;
    // Restart ids at 1 so a re-import numbers animals in inventory order again
    tx.execute(
        "DELETE FROM sqlite_sequence WHERE name IN ('animals', 'animal_types', 'food_prices')",
        [],
    )?;

    let mut type_ids: HashMap<*const AnimalTypeRule, i64> = HashMap::new();
    for rule in snapshot.rules() {
        tx.execute(
            "INSERT INTO animal_types (type_name, food_to_weight_ratio, food_type, meat_ratio)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                rule.name,
                rule.food_to_weight_ratio.to_string(),
                rule.food_type,
                rule.meat_ratio.to_string(),
            ],
        )?;
        type_ids.insert(Arc::as_ptr(rule), tx.last_insert_rowid());
    }

    for animal in snapshot.animals() {
        let type_id = match &animal.species {
            SpeciesRef::Resolved(rule) => type_ids.get(&Arc::as_ptr(rule)).copied(),
            SpeciesRef::Unresolved(_) => None,
        };

        tx.execute(
            "INSERT INTO animals (name, weight, species, animal_type_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                animal.name,
                animal.weight.to_string(),
                animal.species.name(),
                type_id,
            ],
        )?;
    }

    for price in snapshot.prices().entries() {
        tx.execute(
            "INSERT INTO food_prices (food_type, price) VALUES (?1, ?2)",
            params![price.food_type, price.price.to_string()],
        )?;
    }

    let record = MigrationRecord {
        run_id: uuid::Uuid::new_v4().to_string(),
        source_digest: digest,
        migrated_at: Utc::now(),
        animal_types: snapshot.rules().len() as i64,
        animals: snapshot.animals().len() as i64,
        food_prices: snapshot.prices().len() as i64,
    };

    tx.execute(
        "INSERT INTO migrations (run_id, source_digest, migrated_at, animal_types, animals, food_prices)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.run_id,
            record.source_digest,
            record.migrated_at.to_rfc3339(),
            record.animal_types,
            record.animals,
            record.food_prices,
        ],
    )?;

    tx.commit()?;

    info!(
        run_id = %record.run_id,
        animal_types = record.animal_types,
        animals = record.animals,
        food_prices = record.food_prices,
        "migration complete"
    );

    Ok(MigrationOutcome::Applied(record))
}

// ============================================================================
// QUERIES
// ============================================================================

fn decimal_column(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn migration_from_row(row: &Row) -> rusqlite::Result<MigrationRecord> {
    let migrated_at: String = row.get(2)?;

    Ok(MigrationRecord {
        run_id: row.get(0)?,
        source_digest: row.get(1)?,
        migrated_at: DateTime::parse_from_rfc3339(&migrated_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
            .with_timezone(&Utc),
        animal_types: row.get(3)?,
        animals: row.get(4)?,
        food_prices: row.get(5)?,
    })
}

/// The most recent import, if any.
fn latest_migration(conn: &Connection) -> Result<Option<MigrationRecord>> {
    let record = conn
        .query_row(
            "SELECT run_id, source_digest, migrated_at, animal_types, animals, food_prices
             FROM migrations
             ORDER BY id DESC
             LIMIT 1",
            [],
            migration_from_row,
        )
        .optional()?;

    Ok(record)
}

/// Every import, oldest first.
pub fn get_migrations(conn: &Connection) -> Result<Vec<MigrationRecord>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, source_digest, migrated_at, animal_types, animals, food_prices
         FROM migrations
         ORDER BY id ASC",
    )?;

    let records = stmt
        .query_map([], migration_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Rebuild a snapshot from the stored tables, keeping database ids.
pub fn load_snapshot(conn: &Connection) -> Result<ZooSnapshot> {
    let mut stmt = conn.prepare(
        "SELECT id, type_name, food_to_weight_ratio, food_type, meat_ratio
         FROM animal_types
         ORDER BY id ASC",
    )?;

    let typed_rules = stmt
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let rule = AnimalTypeRule::new(
                row.get(1)?,
                decimal_column(row, 2)?,
                row.get(3)?,
                decimal_column(row, 4)?,
            );
            Ok((id, Arc::new(rule)))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let by_id: HashMap<i64, Arc<AnimalTypeRule>> = typed_rules
        .iter()
        .map(|(id, rule)| (*id, Arc::clone(rule)))
        .collect();
    let rules = typed_rules.into_iter().map(|(_, rule)| rule).collect();

    let mut stmt = conn.prepare(
        "SELECT id, name, weight, species, animal_type_id
         FROM animals
         ORDER BY id ASC",
    )?;

    let animals = stmt
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let type_id: Option<i64> = row.get(4)?;
            let animal = AnimalRecord::new(row.get(1)?, decimal_column(row, 2)?, row.get(3)?).with_id(id);

            Ok(match type_id.and_then(|t| by_id.get(&t)) {
                Some(rule) => animal.with_rule(Arc::clone(rule)),
                None => animal,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare("SELECT food_type, price FROM food_prices ORDER BY id ASC")?;

    let prices = stmt
        .query_map([], |row| Ok(PriceEntry::new(row.get(0)?, decimal_column(row, 1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ZooSnapshot::from_parts(rules, animals, prices))
}

pub fn count_animals(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM animals", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================
