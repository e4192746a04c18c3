//! MongoDB connection lifecycle.
//!
//! `Database` owns the driver client. Whether the server is reachable is
//! answered by pinging it, not by a remembered flag.

mod users;

pub use users::MongoUserStore;

use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions},
    Client, IndexModel,
};
use secrecy::ExposeSecret;
use std::{future::IntoFuture, time::Duration};
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::DatabaseConfig;

pub const USERS_COLLECTION: &str = "users";

const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Unreachable,
}

impl ConnectionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Unreachable => "unreachable",
        }
    }

    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Anything the health endpoint can ask for a connection status.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    async fn status(&self) -> ConnectionStatus;
}

/// Probe with a fixed answer, for the in-memory store.
#[derive(Debug, Clone, Copy)]
pub struct StaticStatus(pub ConnectionStatus);

#[async_trait]
impl ConnectionProbe for StaticStatus {
    async fn status(&self) -> ConnectionStatus {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct Database {
    client: Client,
    db: mongodb::Database,
}

impl Database {
    /// Connect and make sure the `users` collection has its unique email index.
    ///
    /// # Errors
    /// Returns an error if the URI is invalid, the server cannot be reached
    /// within the selection timeout, or the index cannot be created.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(config.uri.expose_secret())
            .await
            .context("invalid MongoDB connection string")?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        let client = Client::with_options(options).context("failed to build MongoDB client")?;
        let database = Self {
            db: client.database(&config.db_name),
            client,
        };

        database.ensure_indexes().await?;
        info!(db_name = %config.db_name, "Connected to MongoDB");

        Ok(database)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        let email_unique = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let span = info_span!(
            "db.query",
            db.system = "mongodb",
            db.operation = "createIndex",
            db.collection = USERS_COLLECTION
        );
        self.db
            .collection::<mongodb::bson::Document>(USERS_COLLECTION)
            .create_index(email_unique)
            .into_future()
            .instrument(span)
            .await
            .context("failed to create unique email index")?;
        Ok(())
    }

    /// Ping the server.
    pub async fn ping(&self) -> ConnectionStatus {
        let span = info_span!("db.ping", db.system = "mongodb", db.operation = "ping");
        let ping = self.db.run_command(doc! { "ping": 1 }).into_future();
        match ping.instrument(span).await {
            Ok(_) => ConnectionStatus::Connected,
            Err(err) => {
                error!("Failed to ping database: {err}");
                ConnectionStatus::Unreachable
            }
        }
    }

    #[must_use]
    pub fn users(&self) -> MongoUserStore {
        MongoUserStore::new(self.db.collection(USERS_COLLECTION))
    }

    /// Close every pooled connection. Other clones of this handle become unusable.
    pub async fn disconnect(self) {
        self.client.shutdown().await;
        debug!("Disconnected from MongoDB");
    }
}

#[async_trait]
impl ConnectionProbe for Database {
    async fn status(&self) -> ConnectionStatus {
        self.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels() {
        assert_eq!(ConnectionStatus::Connected.as_str(), "connected");
        assert_eq!(ConnectionStatus::Unreachable.as_str(), "unreachable");
        assert!(ConnectionStatus::Connected.is_connected());
        assert!(!ConnectionStatus::Unreachable.is_connected());
    }

    #[tokio::test]
    async fn static_probe_reports_its_value() {
        let probe: &dyn ConnectionProbe = &StaticStatus(ConnectionStatus::Unreachable);
        assert_eq!(probe.status().await, ConnectionStatus::Unreachable);
    }
}
