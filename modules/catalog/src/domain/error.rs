use thiserror::Error;

use super::model::{EntityKind, Method};

/// Domain-specific errors using thiserror.
///
/// Every condition is raised at the point of detection and converted to an
/// HTTP response by the single mapping layer in `api::rest::error`. No
/// retries anywhere; operations are either idempotent by diffing or
/// explicitly unsafe to retry (ACL replacement).
#[derive(Error, Debug)]
pub enum DomainError {
    /// The caller's groups have no configured method-level access to this
    /// entity type at all.
    #[error("Access denied: {method} on {entity}")]
    AccessDenied { entity: EntityKind, method: Method },

    /// The caller lacks a matching ACL entry on the specific resource.
    #[error("Permission denied: {method} on {entity} with id {id}")]
    PermissionDenied {
        entity: EntityKind,
        method: Method,
        id: String,
    },

    #[error("{entity} with id {id} not found")]
    NotFound { entity: EntityKind, id: String },

    /// Malformed or missing input detected before reaching storage.
    #[error("Wrong data in {field}: {message}")]
    WrongData { field: String, message: String },

    /// Login failed. Never discloses which part of the credentials was
    /// wrong.
    #[error("Invalid login or password")]
    InvalidCredentials,

    /// Unclassified storage failure. Surfaced to clients as a fixed
    /// coarse message; the underlying error stays in the server log.
    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    #[must_use]
    pub fn access_denied(entity: EntityKind, method: Method) -> Self {
        Self::AccessDenied { entity, method }
    }

    pub fn permission_denied(entity: EntityKind, method: Method, id: impl Into<String>) -> Self {
        Self::PermissionDenied {
            entity,
            method,
            id: id.into(),
        }
    }

    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn wrong_data(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WrongData {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        tracing::error!(error = %e, "database operation failed");
        Self::database(e.to_string())
    }
}
