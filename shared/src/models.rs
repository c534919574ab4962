//! Event data model, request shapes and their validation rules.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{Error, Result};

/// Accepted format for `Event::date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub const ALL: [EventStatus; 3] = [
        EventStatus::Active,
        EventStatus::Cancelled,
        EventStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EventStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("status: {}", STATUS_MESSAGE)))
    }
}

/// A stored event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub capacity: i64,
    pub organizer: String,
    pub status: EventStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Fields of an event as seen by the API.
///
/// Store adapters translate these into their own attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    EventId,
    Title,
    Description,
    Date,
    Location,
    Capacity,
    Organizer,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl EventField {
    pub const ALL: [EventField; 10] = [
        EventField::EventId,
        EventField::Title,
        EventField::Description,
        EventField::Date,
        EventField::Location,
        EventField::Capacity,
        EventField::Organizer,
        EventField::Status,
        EventField::CreatedAt,
        EventField::UpdatedAt,
    ];

    /// JSON name of the field.
    pub fn name(&self) -> &'static str {
        match self {
            EventField::EventId => "eventId",
            EventField::Title => "title",
            EventField::Description => "description",
            EventField::Date => "date",
            EventField::Location => "location",
            EventField::Capacity => "capacity",
            EventField::Organizer => "organizer",
            EventField::Status => "status",
            EventField::CreatedAt => "createdAt",
            EventField::UpdatedAt => "updatedAt",
        }
    }
}

/// Value assigned to a single field by an update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(i64),
}

const DATE_MESSAGE: &str = "Date must be in YYYY-MM-DD format";
const STATUS_MESSAGE: &str = "Status must be active, cancelled, or completed";

/// `YYYY-MM-DD` with ASCII digits only and a real calendar day from year 1 on.
///
/// chrono alone would also take padding spaces and signed years.
pub fn is_calendar_date(value: &str) -> bool {
    let shaped = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });

    shaped
        && NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok_and(|date| date.year() >= 1)
}

fn validate_date(value: &str) -> std::result::Result<(), ValidationError> {
    if is_calendar_date(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("date_format");
        err.message = Some(DATE_MESSAGE.into());
        Err(err)
    }
}

fn validate_status(value: &str) -> std::result::Result<(), ValidationError> {
    if EventStatus::ALL.iter().any(|s| s.as_str() == value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("status");
        err.message = Some(STATUS_MESSAGE.into());
        Err(err)
    }
}

/// Payload of `POST /events`. Every field is required.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub event_id: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: String,
    #[validate(custom(function = "validate_date"))]
    pub date: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub location: String,
    #[validate(range(min = 1, message = "Capacity must be greater than 0"))]
    pub capacity: i64,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub organizer: String,
    #[validate(custom(function = "validate_status"))]
    pub status: String,
}

impl CreateEventRequest {
    /// Validate the payload and build the record to store.
    pub fn into_event(self, created_at: String) -> Result<Event> {
        self.validate().map_err(validation_error)?;
        let status = self.status.parse()?;

        Ok(Event {
            event_id: self.event_id,
            title: self.title,
            description: self.description,
            date: self.date,
            location: self.location,
            capacity: self.capacity,
            organizer: self.organizer,
            status,
            created_at,
            updated_at: None,
        })
    }
}

/// Payload of `PUT /events/{id}`. Absent (or null) fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_date"))]
    pub date: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub location: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be greater than 0"))]
    pub capacity: Option<i64>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub organizer: Option<String>,
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
}

impl UpdateEventRequest {
    /// Validate the payload and collect the supplied fields.
    pub fn into_changes(self) -> Result<EventChanges> {
        self.validate().map_err(validation_error)?;
        let status = self.status.as_deref().map(str::parse).transpose()?;

        Ok(EventChanges {
            title: self.title,
            description: self.description,
            date: self.date,
            location: self.location,
            capacity: self.capacity,
            organizer: self.organizer,
            status,
        })
    }
}

/// Validated partial update of an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    pub organizer: Option<String>,
    pub status: Option<EventStatus>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }

    /// Supplied fields in declaration order.
    pub fn assignments(&self) -> Vec<(EventField, FieldValue)> {
        let text = |field: EventField, value: &Option<String>| {
            value.clone().map(|v| (field, FieldValue::Text(v)))
        };

        [
            text(EventField::Title, &self.title),
            text(EventField::Description, &self.description),
            text(EventField::Date, &self.date),
            text(EventField::Location, &self.location),
            self.capacity
                .map(|c| (EventField::Capacity, FieldValue::Number(c))),
            text(EventField::Organizer, &self.organizer),
            self.status
                .map(|s| (EventField::Status, FieldValue::Text(s.as_str().to_string()))),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Apply the supplied fields to `event` and stamp `updated_at`.
    pub fn apply_to(&self, event: &mut Event, updated_at: &str) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(date) = &self.date {
            event.date = date.clone();
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(capacity) = self.capacity {
            event.capacity = capacity;
        }
        if let Some(organizer) = &self.organizer {
            event.organizer = organizer.clone();
        }
        if let Some(status) = self.status {
            event.status = status;
        }
        event.updated_at = Some(updated_at.to_string());
    }
}

/// Flatten validator output into a single readable reason.
fn validation_error(errors: ValidationErrors) -> Error {
    let mut reasons: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(&field.to_string());
            errs.iter()
                .map(|err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    format!("{}: {}", field, message)
                })
                .collect::<Vec<_>>()
        })
        .collect();
    reasons.sort();

    Error::Validation(reasons.join("; "))
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// Body of `GET /events`.
#[derive(Debug, Serialize)]
pub struct EventList {
    pub events: Vec<Event>,
}

/// Body of `POST /events`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCreated {
    pub event_id: String,
    pub message: &'static str,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_request(overrides: serde_json::Value) -> CreateEventRequest {
        let mut body = json!({
            "eventId": "e1",
            "title": "Launch",
            "description": "d",
            "date": "2025-03-01",
            "location": "HQ",
            "capacity": 50,
            "organizer": "Alice",
            "status": "active"
        });
        for (k, v) in overrides.as_object().unwrap() {
            body[k] = v.clone();
        }
        serde_json::from_value(body).unwrap()
    }

    fn reason(err: Error) -> String {
        match err {
            Error::Validation(reason) => reason,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_create_builds_event() {
        let event = create_request(json!({}))
            .into_event("2025-01-01T00:00:00.000000Z".to_string())
            .unwrap();
        assert_eq!(event.event_id, "e1");
        assert_eq!(event.capacity, 50);
        assert_eq!(event.status, EventStatus::Active);
        assert_eq!(event.created_at, "2025-01-01T00:00:00.000000Z");
        assert_eq!(event.updated_at, None);
    }

    #[test]
    fn test_create_rejects_bad_date() {
        let err = create_request(json!({"date": "03/01/2025"}))
            .into_event(String::new())
            .unwrap_err();
        assert_eq!(reason(err), "date: Date must be in YYYY-MM-DD format");
    }

    #[test]
    fn test_create_rejects_impossible_calendar_date() {
        let err = create_request(json!({"date": "2025-02-30"}))
            .into_event(String::new())
            .unwrap_err();
        assert!(reason(err).starts_with("date:"));
    }

    #[test]
    fn test_dates_must_match_fixed_format() {
        let rejected = [
            " 2025-03-01",
            "2025- 03-01",
            "2025-03- 1",
            "+2025-03-01",
            "0000-03-01",
            "12025-03-01",
            "2025-03-01 ",
            "2025-3-1",
            "2025/03/01",
        ];
        for date in rejected {
            let err = create_request(json!({"date": date}))
                .into_event(String::new())
                .unwrap_err();
            assert_eq!(
                reason(err),
                "date: Date must be in YYYY-MM-DD format",
                "create accepted {:?}",
                date
            );

            let update: UpdateEventRequest =
                serde_json::from_value(json!({"date": date})).unwrap();
            assert!(
                matches!(update.into_changes(), Err(Error::Validation(_))),
                "update accepted {:?}",
                date
            );
        }

        for date in ["2025-03-01", "0001-01-01", "2024-02-29"] {
            assert!(is_calendar_date(date), "{} should be accepted", date);
        }
    }

    #[test]
    fn test_create_rejects_zero_capacity() {
        let err = create_request(json!({"capacity": 0}))
            .into_event(String::new())
            .unwrap_err();
        assert_eq!(reason(err), "capacity: Capacity must be greater than 0");
    }

    #[test]
    fn test_create_rejects_unknown_status() {
        let err = create_request(json!({"status": "postponed"}))
            .into_event(String::new())
            .unwrap_err();
        assert_eq!(
            reason(err),
            "status: Status must be active, cancelled, or completed"
        );
    }

    #[test]
    fn test_create_reports_every_failing_field() {
        let err = create_request(json!({"eventId": "", "title": "", "capacity": -3}))
            .into_event(String::new())
            .unwrap_err();
        assert_eq!(
            reason(err),
            "capacity: Capacity must be greater than 0; eventId: must not be empty; title: must not be empty"
        );
    }

    #[test]
    fn test_create_requires_all_fields() {
        let result = serde_json::from_value::<CreateEventRequest>(json!({"eventId": "e1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_with_no_fields_is_empty() {
        let changes = UpdateEventRequest::default().into_changes().unwrap();
        assert!(changes.is_empty());

        let nulls: UpdateEventRequest =
            serde_json::from_value(json!({"title": null, "eventId": "other"})).unwrap();
        assert!(nulls.into_changes().unwrap().is_empty());
    }

    #[test]
    fn test_update_applies_same_rules_as_create() {
        let request: UpdateEventRequest =
            serde_json::from_value(json!({"description": "", "date": "tomorrow"})).unwrap();
        assert_eq!(
            reason(request.into_changes().unwrap_err()),
            "date: Date must be in YYYY-MM-DD format; description: must not be empty"
        );
    }

    #[test]
    fn test_update_assignments_keep_field_order() {
        let request: UpdateEventRequest =
            serde_json::from_value(json!({"status": "cancelled", "capacity": 10})).unwrap();
        let changes = request.into_changes().unwrap();
        assert_eq!(
            changes.assignments(),
            vec![
                (EventField::Capacity, FieldValue::Number(10)),
                (EventField::Status, FieldValue::Text("cancelled".to_string())),
            ]
        );
    }

    #[test]
    fn test_apply_changes_only_supplied_fields() {
        let mut event = create_request(json!({}))
            .into_event("2025-01-01T00:00:00.000000Z".to_string())
            .unwrap();
        let changes = EventChanges {
            title: Some("Relaunch".to_string()),
            status: Some(EventStatus::Completed),
            ..Default::default()
        };
        changes.apply_to(&mut event, "2025-01-02T00:00:00.000000Z");

        assert_eq!(event.title, "Relaunch");
        assert_eq!(event.status, EventStatus::Completed);
        assert_eq!(event.location, "HQ");
        assert_eq!(event.capacity, 50);
        assert_eq!(event.created_at, "2025-01-01T00:00:00.000000Z");
        assert_eq!(event.updated_at.as_deref(), Some("2025-01-02T00:00:00.000000Z"));
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let event = create_request(json!({}))
            .into_event("2025-01-01T00:00:00.000000Z".to_string())
            .unwrap();
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["eventId"], "e1");
        assert_eq!(value["status"], "active");
        assert_eq!(value["createdAt"], "2025-01-01T00:00:00.000000Z");
        assert!(value.get("updatedAt").is_none());
    }
}
