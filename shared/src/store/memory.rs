//! In-process event store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::EventStore;
use crate::models::{Event, EventChanges, EventStatus};
use crate::{Error, Result};

/// Event store held in memory, ordered by event id.
///
/// Backs local runs (`EVENTS_STORE=memory`) and tests. Contents are lost when
/// the process exits.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<BTreeMap<String, Event>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn get(&self, event_id: &str) -> Result<Option<Event>> {
        Ok(self.events.read().await.get(event_id).cloned())
    }

    async fn insert(&self, event: &Event) -> Result<()> {
        let mut events = self.events.write().await;
        if events.contains_key(&event.event_id) {
            return Err(Error::Conflict(event.event_id.clone()));
        }
        events.insert(event.event_id.clone(), event.clone());
        Ok(())
    }

    async fn update(
        &self,
        event_id: &str,
        changes: &EventChanges,
        updated_at: &str,
    ) -> Result<Event> {
        let mut events = self.events.write().await;
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| Error::NotFound(event_id.to_string()))?;
        changes.apply_to(event, updated_at);
        Ok(event.clone())
    }

    async fn delete(&self, event_id: &str) -> Result<()> {
        self.events
            .write()
            .await
            .remove(event_id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(event_id.to_string()))
    }

    async fn scan(&self, status: Option<EventStatus>) -> Result<Vec<Event>> {
        Ok(self
            .events
            .read()
            .await
            .values()
            .filter(|event| status.map_or(true, |s| event.status == s))
            .cloned()
            .collect())
    }
}
