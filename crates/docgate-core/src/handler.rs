//! Handler bridging the HTTP layer to the document service.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;

use docgate_couchdb::StoreClient;
use docgate_http::body::DataResponseBody;
use docgate_http::dispatch::{DataHandler, HandlerFuture};
use docgate_http::response::{empty_response, json_response};
use docgate_model::{DataError, DataOperation, Document, RouteParams};

use crate::error::{DocumentError, document_error_to_data};
use crate::service::DocumentService;

/// Handler that bridges the HTTP layer to a [`DocumentService`].
#[derive(Debug)]
pub struct DocGateHandler<C> {
    service: Arc<DocumentService<C>>,
}

impl<C: StoreClient> DocGateHandler<C> {
    /// Create a new handler wrapping a service.
    #[must_use]
    pub fn new(service: Arc<DocumentService<C>>) -> Self {
        Self { service }
    }
}

impl<C: StoreClient + 'static> DataHandler for DocGateHandler<C> {
    fn handle_operation(
        &self,
        op: DataOperation,
        params: RouteParams,
        body: Bytes,
    ) -> HandlerFuture {
        let service = Arc::clone(&self.service);
        Box::pin(async move { dispatch(service.as_ref(), op, &params, &body).await })
    }
}

/// Dispatch a gateway operation to the matching service method.
async fn dispatch<C: StoreClient>(
    service: &DocumentService<C>,
    op: DataOperation,
    params: &RouteParams,
    body: &[u8],
) -> Result<http::Response<DataResponseBody>, DataError> {
    let fail = |err: DocumentError| document_error_to_data(op, err);

    match op {
        DataOperation::Health => {
            service.check_health().await.map_err(fail)?;
            serialize(StatusCode::OK, &serde_json::json!({"status": "ok"}))
        }
        DataOperation::GetDatabase => {
            let info = service
                .get_database(params.require_database()?)
                .await
                .map_err(fail)?;
            serialize(StatusCode::OK, &info)
        }
        DataOperation::CreateDatabase => {
            service
                .create_database(params.require_database()?)
                .await
                .map_err(fail)?;
            Ok(empty_response(StatusCode::CREATED))
        }
        DataOperation::DeleteDatabase => {
            service
                .delete_database(params.require_database()?)
                .await
                .map_err(fail)?;
            Ok(empty_response(StatusCode::OK))
        }
        DataOperation::ListDocuments => {
            let docs = service
                .list_documents(params.require_database()?)
                .await
                .map_err(fail)?;
            serialize(StatusCode::OK, &docs)
        }
        DataOperation::GetDocument => {
            let doc = service
                .get_document(params.require_database()?, params.require_document_id()?)
                .await
                .map_err(fail)?;
            serialize(StatusCode::OK, &doc)
        }
        DataOperation::CreateDocument => {
            let doc = deserialize(body)?;
            service
                .create_document(params.require_database()?, &doc)
                .await
                .map_err(fail)?;
            Ok(empty_response(StatusCode::CREATED))
        }
        DataOperation::UpdateDocument => {
            let doc = deserialize(body)?;
            service
                .update_document(params.require_database()?, params.require_document_id()?, doc)
                .await
                .map_err(fail)?;
            Ok(empty_response(StatusCode::OK))
        }
        DataOperation::DeleteDocument => {
            service
                .delete_document(params.require_database()?, params.require_document_id()?)
                .await
                .map_err(fail)?;
            Ok(empty_response(StatusCode::OK))
        }
    }
}

/// Deserialize a request body into a document; it must be a JSON object.
fn deserialize(body: &[u8]) -> Result<Document, DataError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| DataError::invalid_json(format!("Failed to parse request body: {e}")))?;
    Document::try_from(value)
        .map_err(|_| DataError::invalid_json("Request body must be a JSON object"))
}

/// Serialize a value into a JSON HTTP response.
fn serialize<T: serde::Serialize>(
    status: StatusCode,
    output: &T,
) -> Result<http::Response<DataResponseBody>, DataError> {
    let json = serde_json::to_vec(output)
        .map_err(|e| DataError::internal_error(format!("Failed to serialize response: {e}")))?;
    Ok(json_response(status, json))
}
