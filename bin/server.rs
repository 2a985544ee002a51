// 🌐 Zoo Feeding Cost System - Web Server
//
// Startup order matters: import and load the snapshot first, bind second.
// A source error means the server never starts listening.

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use tracing::info;

use zoo_feeding::api::{router, AppState};
use zoo_feeding::{
    init_tracing, load_dotenv, load_snapshot, migrate, setup_database, ZooConfig, VERSION,
};

#[derive(Parser)]
#[command(name = "zoo-server")]
#[command(version)]
#[command(about = "REST API for zoo feeding costs")]
struct ServerArgs {
    #[command(flatten)]
    config: ZooConfig,

    /// Address to listen on
    #[arg(long, env = "ZOO_BIND", default_value = "0.0.0.0:3000")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_tracing();

    let args = ServerArgs::parse();
    let config = args.config;
    info!(version = VERSION, db = %config.db_path.display(), "🌐 zoo-server starting");

    // Ingestion barrier
    let mut conn = Connection::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    setup_database(&conn)?;

    let outcome = migrate(&mut conn, &config.source_paths())?;
    let snapshot = load_snapshot(&conn)?;
    drop(conn);

    info!(
        run_id = %outcome.record().run_id,
        animals = snapshot.animals().len(),
        prices = snapshot.prices().len(),
        policy = %config.pricing_policy,
        "snapshot loaded"
    );

    let app = router(AppState::new(snapshot, config.pricing_policy));

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    info!(addr = %args.bind, "🚀 server listening; try GET /api/zoo/getDailyCost");

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
