use crate::{
    api::{self, AppState},
    auth::{AuthService, InMemoryUserStore, TokenCodec, UserStore},
    config::{self, Config},
    database::{ConnectionProbe, ConnectionStatus, Database, StaticStatus},
};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub memory_store: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid, the database cannot be
/// reached, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = Arc::new(config::load().map_err(|err| anyhow!(err.detailed()))?);
    log_startup(&config, &args);

    let codec = Arc::new(TokenCodec::new(&config.auth.jwt_secret)?);

    let database = if args.memory_store {
        None
    } else {
        Some(
            Database::connect(&config.database)
                .await
                .context("Failed to connect to database")?,
        )
    };

    let (store, probe): (Arc<dyn UserStore>, Arc<dyn ConnectionProbe>) = match &database {
        Some(database) => (Arc::new(database.users()), Arc::new(database.clone())),
        None => {
            warn!("Using the in-memory user store; accounts are lost on exit");
            (
                Arc::new(InMemoryUserStore::new()),
                Arc::new(StaticStatus(ConnectionStatus::Connected)),
            )
        }
    };

    let state = AppState {
        config,
        auth: AuthService::new(store, codec),
        database: probe,
    };

    api::serve(state, shutdown_signal()).await?;

    if let Some(database) = database {
        database.disconnect().await;
    }

    Ok(())
}

fn log_startup(config: &Config, args: &Args) {
    info!(
        node_env = %config.server.node_env,
        port = config.server.port,
        db_name = %config.database.db_name,
        memory_store = args.memory_store,
        "Starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Gracefully shutdown");
}
