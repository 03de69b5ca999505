//! Objects related to reporting errors from this library
use crate::{record::Field, validate::FieldErrors};

/// A list of error types that can occur within this library
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // authentication-related errors
    #[error("authentication error: couldn't hash password")]
    AuthHashFailure(#[from] password_hash::Error),

    #[error("Incorrect username or password")]
    AuthInvalidCredentials,

    #[error("You must be logged in to {0}")]
    Unauthorized(String),

    // errors in the data that was submitted
    #[error("{0}")]
    InputFormat(String),

    #[error("Missing required columns: {}. Expected columns containing: name, latitude, longitude", display_fields(.0))]
    MissingColumns(Vec<Field>),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("can't insert the object, it already exists with id = {}", .0)]
    InvalidInsertObjectAlreadyExists(i64),

    #[error("Invalid state: the object has an unspecified attribute '{}'", .0)]
    InvalidStateMissingAttribute(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // errors reported by the store
    #[error("Store error: {0}")]
    Store(String),

    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),

    #[error(transparent)]
    DatabaseMigrationError(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn display_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A convenience type alias for a [Result] with [Error] as its error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
