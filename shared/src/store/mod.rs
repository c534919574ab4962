//! Event store abstraction and its implementations.
//!
//! The service only talks to [`EventStore`]; attribute naming and wire
//! details stay inside each implementation.

pub mod dynamodb;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::models::{Event, EventChanges, EventStatus};
use crate::Result;

pub use dynamodb::DynamoEventStore;
pub use memory::InMemoryEventStore;

/// Key-value persistence for events, keyed by `event_id`.
///
/// Writes are conditional: `insert` fails with `Error::Conflict` when the key
/// exists, `update` and `delete` fail with `Error::NotFound` when it doesn't.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Fetch a single event.
    async fn get(&self, event_id: &str) -> Result<Option<Event>>;

    /// Store a new event.
    async fn insert(&self, event: &Event) -> Result<()>;

    /// Apply `changes`, set `updatedAt` and return the full updated record.
    async fn update(
        &self,
        event_id: &str,
        changes: &EventChanges,
        updated_at: &str,
    ) -> Result<Event>;

    /// Remove an event.
    async fn delete(&self, event_id: &str) -> Result<()>;

    /// Read every event, keeping only those with `status` when given.
    async fn scan(&self, status: Option<EventStatus>) -> Result<Vec<Event>>;
}

/// Build the store selected by `config`.
pub async fn from_config(config: &Config) -> Arc<dyn EventStore> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory event store");
            Arc::new(InMemoryEventStore::new())
        }
        StoreBackend::DynamoDb => {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(endpoint) = &config.dynamodb_endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            let sdk_config = loader.load().await;

            info!(
                "Using DynamoDB event store: table={}, endpoint={:?}",
                config.table_name, config.dynamodb_endpoint
            );
            Arc::new(DynamoEventStore::new(
                aws_sdk_dynamodb::Client::new(&sdk_config),
                config.table_name.clone(),
            ))
        }
    }
}
