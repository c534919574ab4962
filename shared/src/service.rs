//! Event operations exposed by the API.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::models::{
    CreateEventRequest, Event, EventList, EventStatus, HealthStatus, ServiceInfo,
    UpdateEventRequest,
};
use crate::store::EventStore;
use crate::{Error, Result};

pub const SERVICE_NAME: &str = "Event Management API";
pub const SERVICE_VERSION: &str = "1.0";

/// Current UTC time as an RFC 3339 timestamp with microseconds.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Validates requests and runs each one against the event store.
///
/// Holds no state of its own besides the store handle.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            message: SERVICE_NAME,
            version: SERVICE_VERSION,
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus { status: "healthy" }
    }

    /// List events, optionally only those with the given status.
    ///
    /// A status outside the known set matches no event.
    pub async fn list(&self, status: Option<&str>) -> Result<EventList> {
        let filter = match status.filter(|s| !s.is_empty()) {
            None => None,
            Some(s) => match s.parse::<EventStatus>() {
                Ok(status) => Some(status),
                Err(_) => return Ok(EventList { events: Vec::new() }),
            },
        };

        let events = self.store.scan(filter).await?;
        info!("Listed {} events (status={:?})", events.len(), filter);
        Ok(EventList { events })
    }

    pub async fn get(&self, event_id: &str) -> Result<Event> {
        self.store
            .get(event_id)
            .await?
            .ok_or_else(|| Error::NotFound(event_id.to_string()))
    }

    /// Create an event and return its id.
    pub async fn create(&self, request: CreateEventRequest) -> Result<String> {
        let event = request.into_event(timestamp_now())?;

        if self.store.get(&event.event_id).await?.is_some() {
            return Err(Error::Conflict(event.event_id));
        }
        self.store.insert(&event).await?;

        info!("Created event {}", event.event_id);
        Ok(event.event_id)
    }

    /// Apply the supplied fields and return the updated event.
    pub async fn update(&self, event_id: &str, request: UpdateEventRequest) -> Result<Event> {
        let changes = request.into_changes()?;

        if self.store.get(event_id).await?.is_none() {
            return Err(Error::NotFound(event_id.to_string()));
        }
        if changes.is_empty() {
            return Err(Error::EmptyUpdate);
        }

        let event = self
            .store
            .update(event_id, &changes, &timestamp_now())
            .await?;

        info!("Updated event {}", event_id);
        Ok(event)
    }

    pub async fn delete(&self, event_id: &str) -> Result<()> {
        if self.store.get(event_id).await?.is_none() {
            return Err(Error::NotFound(event_id.to_string()));
        }
        self.store.delete(event_id).await?;

        info!("Deleted event {}", event_id);
        Ok(())
    }
}
