//! Error types for the Event Management API.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving an event request.
#[derive(Error, Debug)]
pub enum Error {
    /// Request payload failed field validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Update request carried no fields
    #[error("No fields to update")]
    EmptyUpdate,

    /// No event stored under the given id
    #[error("Event with ID {0} not found")]
    NotFound(String),

    /// An event with the given id already exists
    #[error("Event with ID {0} already exists")]
    Conflict(String),

    /// Event store (DynamoDB) error
    #[error("Database error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::EmptyUpdate => 400,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            _ => 500,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Store errors pass their cause through; configuration failures are
    /// reduced to a generic message.
    pub fn public_message(&self) -> String {
        match self {
            Error::Config(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Validation("date".into()).status_code(), 400);
        assert_eq!(Error::EmptyUpdate.status_code(), 400);
        assert_eq!(Error::NotFound("e1".into()).status_code(), 404);
        assert_eq!(Error::Conflict("e1".into()).status_code(), 409);
        assert_eq!(Error::Store("throttled".into()).status_code(), 500);
        assert_eq!(Error::Config("missing table".into()).status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_internal_details() {
        assert_eq!(
            Error::Config("EVENTS_STORE must be dynamodb or memory".into()).public_message(),
            "Internal server error"
        );
        assert_eq!(
            Error::Store("ResourceNotFoundException".into()).public_message(),
            "Database error: ResourceNotFoundException"
        );
        assert_eq!(
            Error::NotFound("e1".into()).public_message(),
            "Event with ID e1 not found"
        );
    }
}
