// 🦁 Zoo Feeding Cost System - CLI
//
// Every query command first brings the store up to date with the source
// files (a no-op when they are unchanged), then answers from the stored data.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use zoo_feeding::{
    get_migrations, init_tracing, load_dotenv, load_snapshot, migrate, setup_database,
    FeedingCostReport, MigrationOutcome, ZooConfig, ZooSnapshot,
};

#[derive(Parser)]
#[command(name = "zoo-feeding")]
#[command(version)]
#[command(about = "Compute daily and monthly feeding costs for a zoo")]
struct Cli {
    #[command(flatten)]
    config: ZooConfig,

    /// Print a plain table instead of JSON
    #[arg(long, global = true)]
    table: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the source files into the database
    Migrate,

    /// Feeding costs for every animal, or one with --id
    Costs {
        #[arg(long)]
        id: Option<i64>,
    },

    /// Total daily and monthly cost for the zoo
    Total,

    /// List animals and whether their species resolved
    Animals,

    /// List food prices
    Prices,

    /// List previous imports
    History,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TotalResponse {
    total_daily_cost: Decimal,
    total_monthly_cost: Decimal,
}

fn main() -> Result<()> {
    load_dotenv();
    init_tracing();

    let cli = Cli::parse();
    let mut conn = open_store(&cli.config)?;

    match cli.command {
        Commands::Migrate => run_migrate(&mut conn, &cli.config, cli.table),
        Commands::History => run_history(&conn, cli.table),
        Commands::Costs { id } => {
            let snapshot = refresh(&mut conn, &cli.config)?;
            run_costs(&snapshot, &cli.config, id, cli.table)
        }
        Commands::Total => {
            let snapshot = refresh(&mut conn, &cli.config)?;
            run_total(&snapshot, &cli.config, cli.table)
        }
        Commands::Animals => {
            let snapshot = refresh(&mut conn, &cli.config)?;
            run_animals(&snapshot, cli.table)
        }
        Commands::Prices => {
            let snapshot = refresh(&mut conn, &cli.config)?;
            run_prices(&snapshot, cli.table)
        }
    }
}

fn open_store(config: &ZooConfig) -> Result<Connection> {
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    setup_database(&conn)?;

    Ok(conn)
}

fn refresh(conn: &mut Connection, config: &ZooConfig) -> Result<ZooSnapshot> {
    migrate(conn, &config.source_paths())?;
    load_snapshot(conn).context("Failed to load stored zoo data")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_migrate(conn: &mut Connection, config: &ZooConfig, table: bool) -> Result<()> {
    let outcome = migrate(conn, &config.source_paths())?;

    if !table {
        return print_json(outcome.record());
    }

    let record = outcome.record();
    match &outcome {
        MigrationOutcome::Applied(_) => println!("✓ Imported sources (run {})", record.run_id),
        MigrationOutcome::AlreadyApplied(_) => {
            println!("✓ Sources unchanged since run {}", record.run_id)
        }
    }
    println!("  Animal types: {}", record.animal_types);
    println!("  Animals:      {}", record.animals);
    println!("  Food prices:  {}", record.food_prices);

    Ok(())
}

fn run_history(conn: &Connection, table: bool) -> Result<()> {
    let records = get_migrations(conn)?;

    if !table {
        return print_json(&records);
    }

    println!("{:<36}  {:<25}  {:>5}  {:>7}  {:>6}", "RUN", "MIGRATED AT", "TYPES", "ANIMALS", "PRICES");
    for r in &records {
        println!(
            "{:<36}  {:<25}  {:>5}  {:>7}  {:>6}",
            r.run_id,
            r.migrated_at.to_rfc3339(),
            r.animal_types,
            r.animals,
            r.food_prices
        );
    }

    Ok(())
}

fn run_costs(snapshot: &ZooSnapshot, config: &ZooConfig, id: Option<i64>, table: bool) -> Result<()> {
    let engine = snapshot.cost_engine(config.pricing_policy);

    match id {
        Some(id) => {
            let report = engine.cost_for(id)?;
            if table {
                print_cost_table(std::slice::from_ref(&report));
                Ok(())
            } else {
                print_json(&report)
            }
        }
        None => {
            let summary = engine.all_costs()?;
            if !table {
                return print_json(&summary);
            }

            print_cost_table(&summary.animals);
            println!();
            println!("Total daily cost:   {}", summary.total_daily_cost);
            println!("Total monthly cost: {}", summary.total_monthly_cost);
            if summary.unpriced_count > 0 {
                println!("⚠️  {} animal(s) could not be fully priced", summary.unpriced_count);
            }
            Ok(())
        }
    }
}

fn print_cost_table(reports: &[FeedingCostReport]) {
    println!(
        "{:>4}  {:<16}  {:<12}  {:<15}  {:>10}  {:>12}  {:<18}",
        "ID", "NAME", "SPECIES", "FOOD", "DAILY", "MONTHLY", "PRICING"
    );
    for r in reports {
        println!(
            "{:>4}  {:<16}  {:<12}  {:<15}  {:>10}  {:>12}  {:<18}",
            r.animal_id,
            r.animal_name,
            r.species,
            r.food_type,
            r.daily_cost.round_dp(2),
            r.monthly_cost.round_dp(2),
            format!("{:?}", r.pricing)
        );
    }
}

fn run_total(snapshot: &ZooSnapshot, config: &ZooConfig, table: bool) -> Result<()> {
    let engine = snapshot.cost_engine(config.pricing_policy);
    let summary = engine.all_costs()?;
    let total = TotalResponse {
        total_daily_cost: summary.total_daily_cost,
        total_monthly_cost: summary.total_monthly_cost,
    };

    if !table {
        return print_json(&total);
    }

    println!("💰 Daily:   {}", total.total_daily_cost);
    println!("💰 Monthly: {}", total.total_monthly_cost);

    Ok(())
}

fn run_animals(snapshot: &ZooSnapshot, table: bool) -> Result<()> {
    if !table {
        let rows: Vec<_> = snapshot
            .animals()
            .iter()
            .map(|a| {
                serde_json::json!({
                    "id": a.id,
                    "name": a.name,
                    "species": a.species.name(),
                    "weight": a.weight,
                    "resolved": a.species.is_resolved(),
                })
            })
            .collect();
        return print_json(&rows);
    }

    println!("{:>4}  {:<16}  {:<12}  {:>8}  {}", "ID", "NAME", "SPECIES", "KG", "RESOLVED");
    for a in snapshot.animals() {
        println!(
            "{:>4}  {:<16}  {:<12}  {:>8}  {}",
            a.id.unwrap_or_default(),
            a.name,
            a.species.name(),
            a.weight,
            if a.species.is_resolved() { "yes" } else { "no" }
        );
    }

    Ok(())
}

fn run_prices(snapshot: &ZooSnapshot, table: bool) -> Result<()> {
    if !table {
        return print_json(&snapshot.prices().entries());
    }

    println!("{:<12}  {:>8}", "FOOD", "PRICE");
    for p in snapshot.prices().entries() {
        println!("{:<12}  {:>8}", p.food_type, p.price);
    }

    Ok(())
}
