//! Error types for the keyward system.
//!
//! Every repository adapter translates its driver errors into
//! [`KeywardError`] at the contract boundary, so callers above the
//! repository traits never see a driver-specific type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeywardError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    DuplicateKey { entity: String },

    #[error("Invalid identifier: the nil UUID cannot address a record")]
    InvalidIdentifier,

    #[error("role must be associated to an application, 'application_id' missing")]
    MissingApplicationReference,

    #[error("Invalid role name: {reason}")]
    InvalidRoleName { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl KeywardError {
    /// Message that is safe to hand back to an API caller.
    ///
    /// Storage failures carry raw driver text in their `Display` output
    /// for logging; this never does.
    pub fn public_message(&self) -> String {
        match self {
            KeywardError::NotFound { .. } => "no records found".into(),
            KeywardError::DuplicateKey { entity } if entity == "application" => {
                "application already exists, try another `external_id`".into()
            }
            KeywardError::DuplicateKey { entity } => format!("{entity} already exists"),
            KeywardError::InvalidIdentifier => "malformed id, check the request".into(),
            KeywardError::MissingApplicationReference => self.to_string(),
            KeywardError::InvalidRoleName { reason } => reason.clone(),
            KeywardError::Validation { message } => message.clone(),
            KeywardError::StorageFailure(_) => {
                "could not complete the request, try again later".into()
            }
        }
    }
}

pub type KeywardResult<T> = Result<T, KeywardError>;
