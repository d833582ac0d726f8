//! Transport mapping for repository outcomes.
//!
//! Routing is left to whichever HTTP framework hosts keyward; this module
//! fixes what any such shim must return: the status code for each
//! contract outcome and the `{success, data | error}` envelope.

use http::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use crate::error::KeywardError;

/// Response body shared by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status, optional `location` header and body for one response.
#[derive(Debug, Clone)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Envelope<T>,
}

impl<T: Serialize> Reply<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            location: None,
            body: Envelope {
                success: true,
                data: Some(data),
                error: None,
            },
        }
    }

    pub fn failure(err: &KeywardError) -> Self {
        Self::error(status_for(err), err.public_message())
    }

    fn error(status: StatusCode, message: String) -> Self {
        Self {
            status,
            location: None,
            body: Envelope {
                success: false,
                data: None,
                error: Some(message),
            },
        }
    }
}

impl Reply<Uuid> {
    /// `201 Created` with `location` set to `{request_path}/{id}`.
    pub fn created(request_path: &str, id: Uuid) -> Self {
        Self {
            status: StatusCode::CREATED,
            location: Some(format!("{}/{id}", request_path.trim_end_matches('/'))),
            body: Envelope {
                success: true,
                data: Some(id),
                error: None,
            },
        }
    }
}

impl<T: Serialize> Reply<Vec<T>> {
    /// An empty list is reported as `404`.
    pub fn list(items: Vec<T>) -> Self {
        if items.is_empty() {
            return Self::error(StatusCode::NOT_FOUND, "no records found".into());
        }
        Self::ok(items)
    }
}

/// Transport status for a failed contract call.
pub fn status_for(err: &KeywardError) -> StatusCode {
    match err {
        KeywardError::NotFound { .. } => StatusCode::NOT_FOUND,
        KeywardError::InvalidIdentifier
        | KeywardError::MissingApplicationReference
        | KeywardError::InvalidRoleName { .. }
        | KeywardError::Validation { .. }
        | KeywardError::DuplicateKey { .. } => StatusCode::BAD_REQUEST,
        KeywardError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
