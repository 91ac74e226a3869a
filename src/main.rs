//! ratesvc - stars and comments for catalog items

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratesvc::{
    config::Args,
    db::MongoClient,
    server::{self, AppState},
    store::{InMemoryItemStore, ItemStore, MongoItemStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ratesvc={},info", args.log_level).into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  ratesvc {}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen_addr());
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB database: {}", args.mongo_database);
    info!("Auth cookie: {}", args.auth_cookie);
    if args.jwt_key.is_none() {
        warn!("JWT_KEY not set - stars and comments are read-only");
    }
    info!("======================================");

    let store: Arc<dyn ItemStore> =
        match MongoClient::new(&args.mongodb_uri(), &args.mongo_database).await {
            Ok(client) => {
                info!("MongoDB connected successfully");
                Arc::new(MongoItemStore::new(client).await?)
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                    Arc::new(InMemoryItemStore::new())
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        };

    let state = Arc::new(AppState::new(args, store)?);
    server::run(state).await?;

    info!("ratesvc stopped");
    Ok(())
}
