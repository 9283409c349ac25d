//! Gateway operation enum and extracted path parameters.

use std::fmt;

use crate::error::DataError;

/// All operations exposed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataOperation {
    /// Probe the backing store.
    Health,

    // Database management
    /// Read database info.
    GetDatabase,
    /// Create a database (idempotent).
    CreateDatabase,
    /// Delete a database.
    DeleteDatabase,

    // Document CRUD
    /// List every document of a database.
    ListDocuments,
    /// Read one document.
    GetDocument,
    /// Create a document with a store-assigned id.
    CreateDocument,
    /// Replace a document, resolving its revision when omitted.
    UpdateDocument,
    /// Delete a document at its current revision.
    DeleteDocument,
}

impl DataOperation {
    /// Returns the snake_case operation name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::GetDatabase => "get_database",
            Self::CreateDatabase => "create_database",
            Self::DeleteDatabase => "delete_database",
            Self::ListDocuments => "list_documents",
            Self::GetDocument => "get_document",
            Self::CreateDocument => "create_document",
            Self::UpdateDocument => "update_document",
            Self::DeleteDocument => "delete_document",
        }
    }
}

impl fmt::Display for DataOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path parameters extracted by the router, already percent-decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    /// The `{db}` segment.
    pub database: Option<String>,
    /// The `{id}` segment.
    pub document_id: Option<String>,
}

impl RouteParams {
    /// Parameters for a database-level route.
    #[must_use]
    pub fn database(database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            document_id: None,
        }
    }

    /// Parameters for a document-level route.
    #[must_use]
    pub fn document(database: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            document_id: Some(document_id.into()),
        }
    }

    /// The database name, or an internal error when the route carried none.
    pub fn require_database(&self) -> Result<&str, DataError> {
        self.database
            .as_deref()
            .ok_or_else(|| DataError::internal_error("route is missing the database segment"))
    }

    /// The document id, or an internal error when the route carried none.
    pub fn require_document_id(&self) -> Result<&str, DataError> {
        self.document_id
            .as_deref()
            .ok_or_else(|| DataError::internal_error("route is missing the document segment"))
    }
}
