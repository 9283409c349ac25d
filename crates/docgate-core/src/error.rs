//! Orchestrator errors and their mapping onto gateway errors.

use docgate_couchdb::StoreError;
use docgate_model::{DataError, DataErrorCode, DataOperation};

/// Failure of a document service operation.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// A store call failed; passed through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An update carried no revision and the current one could not be fetched.
    #[error("missing revision and could not resolve current one for {database}/{id}: {source}")]
    RevisionUnresolved {
        database: String,
        id: String,
        #[source]
        source: StoreError,
    },

    /// The store returned the document without a usable `_rev`.
    #[error("store returned document {database}/{id} without a usable revision")]
    RevisionMissing { database: String, id: String },

    /// The lookup that precedes a delete failed.
    #[error("could not resolve document {database}/{id} for deletion: {source}")]
    DeleteLookup {
        database: String,
        id: String,
        #[source]
        source: StoreError,
    },
}

impl DocumentError {
    /// The store error underneath, if any.
    #[must_use]
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(source)
            | Self::RevisionUnresolved { source, .. }
            | Self::DeleteLookup { source, .. } => Some(source),
            Self::RevisionMissing { .. } => None,
        }
    }
}

/// Convert a document service error into the gateway error for `op`.
///
/// Unreachable or garbled stores map to 502 regardless of the operation. A
/// store-reported conflict on a document write maps to `document_conflict`;
/// every other store status maps to the operation's failure code. The
/// original error is kept as the source.
#[must_use]
pub fn document_error_to_data(op: DataOperation, err: DocumentError) -> DataError {
    let code = classify(op, &err);
    DataError::with_message(code, err.to_string()).with_source(err)
}

fn classify(op: DataOperation, err: &DocumentError) -> DataErrorCode {
    match err.store_error() {
        Some(StoreError::Transport { .. }) => return DataErrorCode::StoreUnavailable,
        Some(StoreError::Decode { .. }) => return DataErrorCode::BadStoreResponse,
        _ => {}
    }

    match err {
        DocumentError::RevisionUnresolved { .. } | DocumentError::RevisionMissing { .. } => {
            DataErrorCode::MissingRevision
        }
        DocumentError::DeleteLookup { source, .. } if source.is_not_found() => {
            DataErrorCode::DocumentNotFound
        }
        DocumentError::DeleteLookup { .. } => DataErrorCode::DeleteDocumentFailed,
        DocumentError::Store(source) if source.is_conflict() && writes_document(op) => {
            DataErrorCode::DocumentConflict
        }
        DocumentError::Store(_) => failure_code(op),
    }
}

fn writes_document(op: DataOperation) -> bool {
    matches!(
        op,
        DataOperation::CreateDocument
            | DataOperation::UpdateDocument
            | DataOperation::DeleteDocument
    )
}

fn failure_code(op: DataOperation) -> DataErrorCode {
    match op {
        DataOperation::Health => DataErrorCode::HealthCheckFailed,
        DataOperation::GetDatabase => DataErrorCode::DatabaseNotFound,
        DataOperation::CreateDatabase => DataErrorCode::CreateDatabaseFailed,
        DataOperation::DeleteDatabase => DataErrorCode::DeleteDatabaseFailed,
        DataOperation::ListDocuments => DataErrorCode::ListDocumentsFailed,
        DataOperation::GetDocument => DataErrorCode::DocumentNotFound,
        DataOperation::CreateDocument => DataErrorCode::CreateDocumentFailed,
        DataOperation::UpdateDocument => DataErrorCode::UpdateDocumentFailed,
        DataOperation::DeleteDocument => DataErrorCode::DeleteDocumentFailed,
    }
}
