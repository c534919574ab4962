//! DynamoDB-backed event store.
//!
//! `date`, `capacity` and `status` are DynamoDB reserved words, so they are
//! stored as `eventDate`, `eventCapacity` and `eventStatus`. The renaming is
//! confined to [`ATTRIBUTE_NAMES`]; callers only ever see domain names.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use tracing::{debug, warn};

use super::EventStore;
use crate::models::{Event, EventChanges, EventField, EventStatus, FieldValue};
use crate::{Error, Result};

type Item = HashMap<String, AttributeValue>;

/// Domain field to stored attribute name.
pub const ATTRIBUTE_NAMES: [(EventField, &str); 10] = [
    (EventField::EventId, "eventId"),
    (EventField::Title, "title"),
    (EventField::Description, "description"),
    (EventField::Date, "eventDate"),
    (EventField::Location, "location"),
    (EventField::Capacity, "eventCapacity"),
    (EventField::Organizer, "organizer"),
    (EventField::Status, "eventStatus"),
    (EventField::CreatedAt, "createdAt"),
    (EventField::UpdatedAt, "updatedAt"),
];

/// Stored attribute name for a domain field.
pub fn attribute_name(field: EventField) -> &'static str {
    ATTRIBUTE_NAMES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, name)| *name)
        .unwrap_or_else(|| field.name())
}

/// Domain field for a stored attribute name.
pub fn field_for_attribute(attribute: &str) -> Option<EventField> {
    ATTRIBUTE_NAMES
        .iter()
        .find(|(_, name)| *name == attribute)
        .map(|(field, _)| *field)
}

const KEY_ATTRIBUTE: &str = "eventId";

/// Event store backed by a single DynamoDB table with partition key `eventId`.
#[derive(Debug, Clone)]
pub struct DynamoEventStore {
    client: Client,
    table_name: String,
}

impl DynamoEventStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key(event_id: &str) -> (String, AttributeValue) {
        (KEY_ATTRIBUTE.to_string(), AttributeValue::S(event_id.to_string()))
    }
}

fn store_error<E: std::error::Error + 'static>(operation: &str, err: E) -> Error {
    Error::Store(format!("{} failed: {}", operation, DisplayErrorContext(err)))
}

/// Encode an event as a DynamoDB item.
pub fn to_item(event: &Event) -> Item {
    let mut item = Item::new();
    let mut put_text = |field: EventField, value: &str| {
        item.insert(
            attribute_name(field).to_string(),
            AttributeValue::S(value.to_string()),
        );
    };

    put_text(EventField::EventId, &event.event_id);
    put_text(EventField::Title, &event.title);
    put_text(EventField::Description, &event.description);
    put_text(EventField::Date, &event.date);
    put_text(EventField::Location, &event.location);
    put_text(EventField::Organizer, &event.organizer);
    put_text(EventField::Status, event.status.as_str());
    put_text(EventField::CreatedAt, &event.created_at);
    if let Some(updated_at) = &event.updated_at {
        put_text(EventField::UpdatedAt, updated_at);
    }

    item.insert(
        attribute_name(EventField::Capacity).to_string(),
        AttributeValue::N(event.capacity.to_string()),
    );

    item
}

fn malformed(field: EventField, problem: &str) -> Error {
    Error::Store(format!(
        "Malformed item: attribute {} {}",
        attribute_name(field),
        problem
    ))
}

/// Item attributes re-keyed by domain field; unknown attributes are dropped.
type Fields<'a> = HashMap<EventField, &'a AttributeValue>;

fn fields(item: &Item) -> Fields<'_> {
    item.iter()
        .filter_map(|(attribute, value)| field_for_attribute(attribute).map(|f| (f, value)))
        .collect()
}

fn optional_text(fields: &Fields<'_>, field: EventField) -> Result<Option<String>> {
    match fields.get(&field) {
        None => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(_) => Err(malformed(field, "is not a string")),
    }
}

fn text(fields: &Fields<'_>, field: EventField) -> Result<String> {
    optional_text(fields, field)?.ok_or_else(|| malformed(field, "is missing"))
}

/// Decode a DynamoDB item into an event.
pub fn from_item(item: &Item) -> Result<Event> {
    let fields = fields(item);

    let capacity = match fields.get(&EventField::Capacity) {
        Some(AttributeValue::N(n)) => n
            .parse::<i64>()
            .map_err(|_| malformed(EventField::Capacity, "is not an integer"))?,
        Some(_) => return Err(malformed(EventField::Capacity, "is not a number")),
        None => return Err(malformed(EventField::Capacity, "is missing")),
    };

    let status = text(&fields, EventField::Status)?
        .parse::<EventStatus>()
        .map_err(|_| malformed(EventField::Status, "is not a known status"))?;

    Ok(Event {
        event_id: text(&fields, EventField::EventId)?,
        title: text(&fields, EventField::Title)?,
        description: text(&fields, EventField::Description)?,
        date: text(&fields, EventField::Date)?,
        location: text(&fields, EventField::Location)?,
        capacity,
        organizer: text(&fields, EventField::Organizer)?,
        status,
        created_at: text(&fields, EventField::CreatedAt)?,
        updated_at: optional_text(&fields, EventField::UpdatedAt)?,
    })
}

/// Decode an item read by a scan, skipping it with a warning if malformed.
fn decode_scanned(item: &Item) -> Option<Event> {
    match from_item(item) {
        Ok(event) => Some(event),
        Err(e) => {
            let key = match item.get(KEY_ATTRIBUTE) {
                Some(AttributeValue::S(id)) => id.as_str(),
                _ => "<no key>",
            };
            warn!("Skipping undecodable item {}: {}", key, e);
            None
        }
    }
}

/// `SET` expression plus placeholder maps for an update.
#[derive(Debug, PartialEq)]
pub struct UpdateExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Build the update for `changes`, always refreshing `updatedAt`.
///
/// Every attribute goes through a `#name` placeholder so reserved words never
/// appear in the expression.
pub fn update_expression(changes: &EventChanges, updated_at: &str) -> UpdateExpression {
    let mut assignments = changes.assignments();
    assignments.push((
        EventField::UpdatedAt,
        FieldValue::Text(updated_at.to_string()),
    ));

    let mut parts = Vec::with_capacity(assignments.len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    for (field, value) in assignments {
        let attribute = attribute_name(field);
        let name = format!("#{}", attribute);
        let placeholder = format!(":{}", attribute);

        parts.push(format!("{} = {}", name, placeholder));
        names.insert(name, attribute.to_string());
        values.insert(
            placeholder,
            match value {
                FieldValue::Text(s) => AttributeValue::S(s),
                FieldValue::Number(n) => AttributeValue::N(n.to_string()),
            },
        );
    }

    UpdateExpression {
        expression: format!("SET {}", parts.join(", ")),
        names,
        values,
    }
}

#[async_trait]
impl EventStore for DynamoEventStore {
    async fn get(&self, event_id: &str) -> Result<Option<Event>> {
        let (key, value) = Self::key(event_id);
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(key, value)
            .send()
            .await
            .map_err(|e| store_error("GetItem", e))?;

        output.item().map(from_item).transpose()
    }

    async fn insert(&self, event: &Event) -> Result<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(event)))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", KEY_ATTRIBUTE)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(Error::Conflict(event.event_id.clone()))
            }
            Err(e) => Err(store_error("PutItem", e)),
        }
    }

    async fn update(
        &self,
        event_id: &str,
        changes: &EventChanges,
        updated_at: &str,
    ) -> Result<Event> {
        let UpdateExpression {
            expression,
            mut names,
            values,
        } = update_expression(changes, updated_at);
        names.insert("#pk".to_string(), KEY_ATTRIBUTE.to_string());

        debug!("UpdateItem {}: {}", event_id, expression);

        let (key, value) = Self::key(event_id);
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(key, value)
            .update_expression(expression)
            .condition_expression("attribute_exists(#pk)")
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => output
                .attributes()
                .map(from_item)
                .transpose()?
                .ok_or_else(|| Error::Store("UpdateItem returned no attributes".to_string())),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(Error::NotFound(event_id.to_string()))
            }
            Err(e) => Err(store_error("UpdateItem", e)),
        }
    }

    async fn delete(&self, event_id: &str) -> Result<()> {
        let (key, value) = Self::key(event_id);
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(key, value)
            .condition_expression("attribute_exists(#pk)")
            .expression_attribute_names("#pk", KEY_ATTRIBUTE)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(Error::NotFound(event_id.to_string()))
            }
            Err(e) => Err(store_error("DeleteItem", e)),
        }
    }

    async fn scan(&self, status: Option<EventStatus>) -> Result<Vec<Event>> {
        let mut request = self.client.scan().table_name(&self.table_name);
        if let Some(status) = status {
            request = request
                .filter_expression("#status = :status")
                .expression_attribute_names("#status", attribute_name(EventField::Status))
                .expression_attribute_values(":status", AttributeValue::S(status.to_string()));
        }

        // Follows LastEvaluatedKey across 1 MB pages.
        let mut items = request.into_paginator().items().send();
        let mut events = Vec::new();
        while let Some(item) = items.next().await {
            let item = item.map_err(|e| store_error("Scan", e))?;
            events.extend(decode_scanned(&item));
        }

        Ok(events)
    }
}
