//! Gateway handler trait and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use docgate_model::{DataError, DataOperation, RouteParams};

use crate::body::DataResponseBody;

/// Future returned by [`DataHandler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<DataResponseBody>, DataError>> + Send>>;

/// Trait that the document service provider must implement.
///
/// The handler receives the routed operation, the percent-decoded path
/// parameters and the raw request body, and returns a complete HTTP
/// response. This trait is the boundary between the HTTP transport layer and
/// the orchestration layer.
pub trait DataHandler: Send + Sync + 'static {
    /// Handle a gateway operation and produce an HTTP response.
    fn handle_operation(&self, op: DataOperation, params: RouteParams, body: Bytes)
    -> HandlerFuture;
}

/// Dispatch a gateway operation to the handler.
pub async fn dispatch_operation<H: DataHandler>(
    handler: &H,
    op: DataOperation,
    params: RouteParams,
    body: Bytes,
) -> Result<http::Response<DataResponseBody>, DataError> {
    tracing::debug!(operation = %op, "dispatching gateway operation");
    handler.handle_operation(op, params, body).await
}
