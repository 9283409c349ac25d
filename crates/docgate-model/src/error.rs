//! Gateway error types.
//!
//! Every failed request is answered with a JSON body carrying a
//! machine-readable `error` code, a human-readable `message` and the request's
//! correlation token.

use std::fmt;

/// Well-known gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum DataErrorCode {
    /// Document absent at the store.
    DocumentNotFound,
    /// Database absent at the store.
    DatabaseNotFound,
    /// The store rejected a write because the revision is stale.
    DocumentConflict,
    /// No revision supplied and none could be resolved.
    MissingRevision,
    /// The store refused to create a database.
    CreateDatabaseFailed,
    /// The store refused to delete a database.
    DeleteDatabaseFailed,
    /// The store refused to create a document.
    CreateDocumentFailed,
    /// The store refused to replace a document.
    UpdateDocumentFailed,
    /// The store refused to delete a document.
    DeleteDocumentFailed,
    /// The store could not list documents.
    ListDocumentsFailed,
    /// The store could not be reached.
    StoreUnavailable,
    /// The store answered with a payload that could not be decoded.
    BadStoreResponse,
    /// The health probe failed.
    HealthCheckFailed,
    /// The request body is not a JSON object.
    InvalidJson,
    /// The request body exceeds the configured limit.
    PayloadTooLarge,
    /// No route matches the request path.
    RouteNotFound,
    /// The route exists but not for this method.
    MethodNotAllowed,
    /// The request did not complete before its deadline.
    GatewayTimeout,
    /// Unexpected internal failure.
    #[default]
    InternalError,
}

impl DataErrorCode {
    /// Returns the error code string used in the JSON `error` field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentNotFound => "document_not_found",
            Self::DatabaseNotFound => "database_not_found",
            Self::DocumentConflict => "document_conflict",
            Self::MissingRevision => "missing_revision",
            Self::CreateDatabaseFailed => "create_database_failed",
            Self::DeleteDatabaseFailed => "delete_database_failed",
            Self::CreateDocumentFailed => "create_document_failed",
            Self::UpdateDocumentFailed => "update_document_failed",
            Self::DeleteDocumentFailed => "delete_document_failed",
            Self::ListDocumentsFailed => "list_documents_failed",
            Self::StoreUnavailable => "store_unavailable",
            Self::BadStoreResponse => "bad_store_response",
            Self::HealthCheckFailed => "health_check_failed",
            Self::InvalidJson => "invalid_json",
            Self::PayloadTooLarge => "payload_too_large",
            Self::RouteNotFound => "route_not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::GatewayTimeout => "gateway_timeout",
            Self::InternalError => "internal_error",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::DocumentNotFound | Self::DatabaseNotFound | Self::RouteNotFound => {
                http::StatusCode::NOT_FOUND
            }
            Self::DocumentConflict | Self::MissingRevision => http::StatusCode::CONFLICT,
            Self::InvalidJson => http::StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::StoreUnavailable | Self::BadStoreResponse => http::StatusCode::BAD_GATEWAY,
            Self::HealthCheckFailed => http::StatusCode::SERVICE_UNAVAILABLE,
            Self::GatewayTimeout => http::StatusCode::GATEWAY_TIMEOUT,
            Self::CreateDatabaseFailed
            | Self::DeleteDatabaseFailed
            | Self::CreateDocumentFailed
            | Self::UpdateDocumentFailed
            | Self::DeleteDocumentFailed
            | Self::ListDocumentsFailed
            | Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for DataErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gateway error response.
#[derive(Debug)]
pub struct DataError {
    /// The error code.
    pub code: DataErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl DataError {
    /// Create a new `DataError` from an error code.
    #[must_use]
    pub fn new(code: DataErrorCode) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `DataError` with a custom message.
    #[must_use]
    pub fn with_message(code: DataErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // -- Convenience constructors --

    /// Malformed request body.
    #[must_use]
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::with_message(DataErrorCode::InvalidJson, message)
    }

    /// Request body over the size limit.
    #[must_use]
    pub fn payload_too_large(limit: usize) -> Self {
        Self::with_message(
            DataErrorCode::PayloadTooLarge,
            format!("request body exceeds {limit} bytes"),
        )
    }

    /// No route for the path.
    #[must_use]
    pub fn route_not_found(path: &str) -> Self {
        Self::with_message(DataErrorCode::RouteNotFound, format!("no route for {path}"))
    }

    /// Route exists, method does not.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method, path: &str) -> Self {
        Self::with_message(
            DataErrorCode::MethodNotAllowed,
            format!("method {method} is not allowed on {path}"),
        )
    }

    /// Deadline exceeded.
    #[must_use]
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::with_message(DataErrorCode::GatewayTimeout, message)
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(DataErrorCode::InternalError, message)
    }
}
