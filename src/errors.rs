use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Main error type for the taxi service
#[derive(Debug, thiserror::Error)]
pub enum TaxiError {
    // HTTP errors
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    InternalServer(String),

    // Business logic errors
    #[error("Manufacturer not found: {0}")]
    ManufacturerNotFound(i64),
    #[error("Car not found: {0}")]
    CarNotFound(i64),
    #[error("Driver not found: {0}")]
    DriverNotFound(i64),

    // Validation errors
    #[error("Validation failed: {} errors", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    // Storage errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Session store error: {0}")]
    SessionStore(String),
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Rendering and hashing
    #[error("Template error: {0}")]
    Template(String),
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    // Configuration and setup errors
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("I/O error: {0}")]
    Io(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl IntoResponse for TaxiError {
    fn into_response(self) -> Response {
        let status = match &self {
            TaxiError::BadRequest(_) | TaxiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            TaxiError::Forbidden(_) => StatusCode::FORBIDDEN,
            TaxiError::NotFound(_)
            | TaxiError::ManufacturerNotFound(_)
            | TaxiError::CarNotFound(_)
            | TaxiError::DriverNotFound(_) => StatusCode::NOT_FOUND,
            TaxiError::Conflict(_) => StatusCode::CONFLICT,
            // All other errors are treated as internal server errors
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            return (status, "Internal server error").into_response();
        }

        (status, self.to_string()).into_response()
    }
}

// Convenience type alias for Results
pub type TaxiResult<T> = Result<T, TaxiError>;

impl From<sqlx::Error> for TaxiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => TaxiError::NotFound("No matching row".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                TaxiError::Conflict(db_err.message().to_string())
            }
            other => TaxiError::Database(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for TaxiError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        TaxiError::Database(format!("Migration failed: {}", err))
    }
}

impl From<redis::RedisError> for TaxiError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => TaxiError::SessionStore(format!("connection: {}", err)),
            redis::ErrorKind::AuthenticationFailed => {
                TaxiError::SessionStore("Authentication failed".to_string())
            }
            _ => TaxiError::SessionStore(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for TaxiError {
    fn from(err: serde_json::Error) -> Self {
        TaxiError::Serialization(err.to_string())
    }
}

impl From<tera::Error> for TaxiError {
    fn from(err: tera::Error) -> Self {
        // tera keeps the useful part of the message in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        TaxiError::Template(message)
    }
}

impl From<argon2::password_hash::Error> for TaxiError {
    fn from(err: argon2::password_hash::Error) -> Self {
        TaxiError::PasswordHash(err.to_string())
    }
}

impl From<std::io::Error> for TaxiError {
    fn from(err: std::io::Error) -> Self {
        TaxiError::Io(err.to_string())
    }
}

// Helper functions for creating common errors
impl TaxiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        TaxiError::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        TaxiError::Forbidden(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        TaxiError::NotFound(resource.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        TaxiError::InternalServer(msg.into())
    }

    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        TaxiError::ValidationFailed(vec![ValidationError {
            field: field.into(),
            message: message.into(),
        }])
    }
}
