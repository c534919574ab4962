//! Shared library for the Event Management API Lambda.
//!
//! This crate provides the event model, request validation, the event store
//! abstraction with its DynamoDB and in-memory implementations, and the
//! service operations the HTTP handler dispatches to.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod service;
pub mod store;

pub use config::{Config, StoreBackend};
pub use error::{Error, Result};
pub use models::{
    CreateEventRequest, Event, EventChanges, EventCreated, EventList, EventStatus, HealthStatus,
    Message, ServiceInfo, UpdateEventRequest,
};
pub use service::EventService;
pub use store::{DynamoEventStore, EventStore, InMemoryEventStore};
