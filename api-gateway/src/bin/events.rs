//! Events API Lambda - CRUD operations for events.
//!
//! Endpoints:
//! - GET / - Service name and version
//! - GET /health - Liveness check
//! - GET /events?status={status} - List events, optionally by status
//! - GET /events/{id} - Get a single event
//! - POST /events - Create an event
//! - PUT /events/{id} - Update an event
//! - DELETE /events/{id} - Delete an event

use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use serde::Serialize;
use shared::http::{error_response, from_error, json_response, preflight_response};
use shared::{
    parse_body, store, Config, CreateEventRequest, EventCreated, EventService, Message,
    UpdateEventRequest,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState {
    service: EventService,
    stage_prefix: Option<String>,
}

/// Handler target for a (method, path) pair.
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Root,
    Health,
    ListEvents,
    CreateEvent,
    GetEvent(String),
    UpdateEvent(String),
    DeleteEvent(String),
    Preflight,
    MethodNotAllowed,
    NotFound,
}

/// Strip the stage prefix and any trailing slash from a request path.
fn normalize_path<'a>(raw_path: &'a str, stage_prefix: Option<&str>) -> &'a str {
    let path = match stage_prefix {
        Some(prefix) => match raw_path.strip_prefix(prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => raw_path,
        },
        None => raw_path,
    };

    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

fn route(method: &str, path: &str) -> Route {
    if method == "OPTIONS" {
        return Route::Preflight;
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        ("GET", [""]) => Route::Root,
        ("GET", ["health"]) => Route::Health,
        ("GET", ["events"]) => Route::ListEvents,
        ("POST", ["events"]) => Route::CreateEvent,
        (_, [""]) | (_, ["health"]) | (_, ["events"]) => Route::MethodNotAllowed,
        (method, ["events", id]) if !id.is_empty() => {
            let id = match urlencoding::decode(id) {
                Ok(id) => id.into_owned(),
                Err(_) => return Route::NotFound,
            };
            match method {
                "GET" => Route::GetEvent(id),
                "PUT" => Route::UpdateEvent(id),
                "DELETE" => Route::DeleteEvent(id),
                _ => Route::MethodNotAllowed,
            }
        }
        _ => Route::NotFound,
    }
}

/// Render a service result, mapping errors onto their status codes.
fn respond<T: Serialize>(status: u16, result: shared::Result<T>) -> Result<Response<Body>, Error> {
    match result {
        Ok(data) => json_response(status, &data),
        Err(e) => from_error(&e),
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let raw_path = event.uri().path();
    let path = normalize_path(raw_path, state.stage_prefix.as_deref());

    info!("Events request: {} {} (raw: {})", method, path, raw_path);

    let service = &state.service;

    match route(method, path) {
        Route::Root => json_response(200, &service.info()),

        Route::Health => json_response(200, &service.health()),

        Route::ListEvents => {
            let params = event.query_string_parameters();
            respond(200, service.list(params.first("status")).await)
        }

        Route::GetEvent(event_id) => respond(200, service.get(&event_id).await),

        Route::CreateEvent => {
            let request: CreateEventRequest = parse_body!(event.body());
            let result = service.create(request).await.map(|event_id| EventCreated {
                event_id,
                message: "Event created successfully",
            });
            respond(201, result)
        }

        Route::UpdateEvent(event_id) => {
            let request: UpdateEventRequest = parse_body!(event.body());
            respond(200, service.update(&event_id, request).await)
        }

        Route::DeleteEvent(event_id) => {
            let result = service.delete(&event_id).await.map(|()| Message {
                message: "Event deleted successfully",
            });
            respond(200, result)
        }

        Route::Preflight => preflight_response(),

        Route::MethodNotAllowed => error_response(405, "Method Not Allowed"),

        Route::NotFound => error_response(404, "Not Found"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env()?;
    let store = store::from_config(&config).await;
    let state = Arc::new(AppState {
        service: EventService::new(store),
        stage_prefix: config.stage_prefix,
    });

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
