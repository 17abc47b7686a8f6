use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jammer_api::app::{app, AppState};
use jammer_api::config::AppConfig;
use jammer_api::database::{DatabaseManager, PgStore};
use jammer_api::identity::SupabaseAuth;

#[derive(Parser, Debug)]
#[command(name = "jammer-api", version, about = "Establishments and jammers API server")]
struct Args {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jammer_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = Arc::new(AppConfig::from_env());
    tracing::info!("Starting Jammer API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect_lazy(&config.database).context("database configuration")?;
    let store = Arc::new(PgStore::new(pool));
    let identity = Arc::new(SupabaseAuth::new(&config.supabase).context("identity provider configuration")?);

    let state = AppState::new(identity, store, config);

    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Jammer API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server")?;
    Ok(())
}
