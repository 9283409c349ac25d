//! Backing-store error types.

use std::fmt;

/// Boxed error used for transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Convenience result type for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Logical store operations, used to give every error its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// `GET /{db}/{id}`
    FetchDocument,
    /// `POST /{db}`
    CreateDocument,
    /// `PUT /{db}/{id}`
    ReplaceDocument,
    /// `DELETE /{db}/{id}?rev=`
    DeleteDocument,
    /// `GET /{db}`
    FetchDatabase,
    /// `PUT /{db}`
    CreateDatabase,
    /// `DELETE /{db}`
    DeleteDatabase,
    /// `GET /{db}/_all_docs?include_docs=true`
    ListDocuments,
    /// `GET /{health_path}`
    CheckHealth,
}

impl StoreOperation {
    /// Short name used in error messages and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchDocument => "fetch document",
            Self::CreateDocument => "create document",
            Self::ReplaceDocument => "replace document",
            Self::DeleteDocument => "delete document",
            Self::FetchDatabase => "fetch database",
            Self::CreateDatabase => "create database",
            Self::DeleteDatabase => "delete database",
            Self::ListDocuments => "list documents",
            Self::CheckHealth => "check health",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single store call.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store answered with a status the operation does not accept.
    #[error("{operation} {target}: store responded with status {status}: {body}")]
    Status {
        operation: StoreOperation,
        target: String,
        status: http::StatusCode,
        body: String,
    },

    /// The store could not be reached or the exchange broke off.
    #[error("{operation} {target}: request to store failed: {source}")]
    Transport {
        operation: StoreOperation,
        target: String,
        #[source]
        source: BoxError,
    },

    /// The store answered with a payload that does not decode.
    #[error("{operation} {target}: failed to decode store response: {source}")]
    Decode {
        operation: StoreOperation,
        target: String,
        #[source]
        source: serde_json::Error,
    },

    /// The liveness probe failed.
    #[error("store health probe {target} failed: {reason}")]
    Unhealthy { target: String, reason: String },

    /// A database name or document id cannot be addressed as a path segment.
    #[error("{operation}: {segment:?} is not a valid path segment")]
    InvalidSegment {
        operation: StoreOperation,
        segment: String,
    },
}

impl StoreError {
    /// The store operation this error belongs to.
    #[must_use]
    pub fn operation(&self) -> StoreOperation {
        match self {
            Self::Status { operation, .. }
            | Self::Transport { operation, .. }
            | Self::Decode { operation, .. }
            | Self::InvalidSegment { operation, .. } => *operation,
            Self::Unhealthy { .. } => StoreOperation::CheckHealth,
        }
    }

    /// The status reported by the store, for [`StoreError::Status`].
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the store reported the target as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(http::StatusCode::NOT_FOUND)
    }

    /// Whether the store rejected a write because of a stale revision.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(http::StatusCode::CONFLICT)
    }

    /// Whether the store was unreachable.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
