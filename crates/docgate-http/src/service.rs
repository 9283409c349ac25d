//! Gateway HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use tracing::Instrument;

use docgate_model::{DataError, DataErrorCode};

use crate::body::DataResponseBody;
use crate::dispatch::{DataHandler, dispatch_operation};
use crate::response::error_to_response;
use crate::router::{allowed_methods, resolve_route};

/// Header carrying the request correlation token.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Longest inbound correlation id that is propagated as-is.
const MAX_CORRELATION_ID_LEN: usize = 128;

/// Configuration for the gateway HTTP service.
#[derive(Debug, Clone)]
pub struct DataHttpConfig {
    /// Deadline for a whole request; `None` disables it.
    pub request_timeout: Option<Duration>,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for DataHttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Hyper `Service` implementation for the gateway.
///
/// Wraps a [`DataHandler`] implementation and routes incoming HTTP requests
/// to the matching operation. Every request runs inside a `request` span
/// carrying its correlation id, and every response echoes that id.
pub struct DataHttpService<H: DataHandler> {
    handler: Arc<H>,
    config: Arc<DataHttpConfig>,
}

impl<H: DataHandler> fmt::Debug for DataHttpService<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataHttpService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<H: DataHandler> DataHttpService<H> {
    /// Create a new `DataHttpService`.
    pub fn new(handler: Arc<H>, config: DataHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }

    /// Serve one request end to end.
    ///
    /// Generic over the request body so the whole pipeline can be driven
    /// without a socket.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<DataResponseBody>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let correlation_id = correlation_id(req.headers());
        let span = tracing::info_span!(
            "request",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        async move {
            let started = Instant::now();
            let response =
                process_request(req, self.handler.as_ref(), &self.config, &correlation_id).await;
            let response = add_common_headers(response, &correlation_id);
            tracing::info!(
                status = response.status().as_u16(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "request completed"
            );
            response
        }
        .instrument(span)
        .await
    }
}

impl<H: DataHandler> Clone for DataHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: DataHandler> hyper::service::Service<http::Request<Incoming>> for DataHttpService<H> {
    type Response = http::Response<DataResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Process a single gateway request through the full pipeline.
async fn process_request<B, H>(
    req: http::Request<B>,
    handler: &H,
    config: &DataHttpConfig,
    correlation_id: &str,
) -> http::Response<DataResponseBody>
where
    B: http_body::Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H: DataHandler,
{
    let (parts, incoming) = req.into_parts();
    let path = parts.uri.path();

    // 1. Route on method and path.
    let route = match resolve_route(&parts.method, path) {
        Ok(route) => route,
        Err(err) => {
            let mut response = error_to_response(&err, correlation_id);
            if err.code == DataErrorCode::MethodNotAllowed {
                if let Some(allow) = allowed_methods(path) {
                    response
                        .headers_mut()
                        .insert(http::header::ALLOW, http::HeaderValue::from_static(allow));
                }
            }
            return response;
        }
    };

    // 2. Collect the body under the size limit.
    let body = match collect_body(incoming, config.max_body_bytes).await {
        Ok(body) => body,
        Err(err) => return failure_response(&err, correlation_id),
    };

    // 3. Dispatch under the request deadline. Expiry drops the handler
    //    future, so no further store call of the sequence is issued.
    let dispatched = dispatch_operation(handler, route.operation, route.params, body);
    let result = match config.request_timeout {
        Some(limit) => tokio::time::timeout(limit, dispatched)
            .await
            .unwrap_or_else(|_| {
                Err(DataError::gateway_timeout(format!(
                    "request did not complete within {} ms",
                    limit.as_millis()
                )))
            }),
        None => dispatched.await,
    };

    match result {
        Ok(response) => response,
        Err(err) => failure_response(&err, correlation_id),
    }
}

/// Log a failed request and render its error response.
fn failure_response(err: &DataError, correlation_id: &str) -> http::Response<DataResponseBody> {
    let cause = std::error::Error::source(err).map(ToString::to_string);
    if err.status_code.is_server_error() {
        tracing::warn!(
            code = %err.code,
            detail = %err.message,
            cause = ?cause,
            "request failed"
        );
    } else {
        tracing::debug!(
            code = %err.code,
            detail = %err.message,
            cause = ?cause,
            "request rejected"
        );
    }
    error_to_response(err, correlation_id)
}

/// Collect the incoming body into a single `Bytes` buffer, up to `limit` bytes.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, DataError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                DataError::payload_too_large(limit)
            } else {
                DataError::internal_error(format!("Failed to read request body: {e}"))
            }
        })
}

/// The inbound correlation id when usable, otherwise a fresh UUID v4.
fn correlation_id(headers: &http::HeaderMap) -> String {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| {
            !v.is_empty()
                && v.len() <= MAX_CORRELATION_ID_LEN
                && v.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), ToOwned::to_owned)
}

/// Add common response headers to every gateway response.
fn add_common_headers(
    mut response: http::Response<DataResponseBody>,
    correlation_id: &str,
) -> http::Response<DataResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(correlation_id) {
        headers.insert(CORRELATION_ID_HEADER, hv);
    }

    headers.insert("server", http::HeaderValue::from_static("DocGate"));

    response
}

#[cfg(test)]
mod tests {
    use docgate_model::{DataOperation, RouteParams};
    use http_body_util::Full;

    use super::*;
    use crate::dispatch::HandlerFuture;
    use crate::response::json_response;

    /// Echoes the routed operation, params and body back as JSON.
    #[derive(Debug)]
    struct EchoHandler;

    impl DataHandler for EchoHandler {
        fn handle_operation(
            &self,
            op: DataOperation,
            params: RouteParams,
            body: Bytes,
        ) -> HandlerFuture {
            Box::pin(async move {
                let echo = serde_json::json!({
                    "operation": op.as_str(),
                    "database": params.database,
                    "id": params.document_id,
                    "body": String::from_utf8_lossy(&body),
                });
                Ok(json_response(http::StatusCode::OK, echo.to_string().into_bytes()))
            })
        }
    }

    /// Fails every operation with a document conflict, or sleeps forever for
    /// `GetDocument`.
    #[derive(Debug)]
    struct FailingHandler;

    impl DataHandler for FailingHandler {
        fn handle_operation(
            &self,
            op: DataOperation,
            _params: RouteParams,
            _body: Bytes,
        ) -> HandlerFuture {
            Box::pin(async move {
                if op == DataOperation::GetDocument {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                Err(DataError::with_message(
                    DataErrorCode::DocumentConflict,
                    "Document update conflict.",
                ))
            })
        }
    }

    fn request(method: http::Method, path: &str, body: &'static str) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn json_of(response: http::Response<DataResponseBody>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn service<H: DataHandler>(handler: H, config: DataHttpConfig) -> DataHttpService<H> {
        DataHttpService::new(Arc::new(handler), config)
    }

    #[tokio::test]
    async fn test_should_route_and_pass_body_to_handler() {
        let svc = service(EchoHandler, DataHttpConfig::default());
        let resp = svc
            .handle(request(http::Method::PUT, "/songs/a%20b", r#"{"x":1}"#))
            .await;
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert!(resp.headers().get(CORRELATION_ID_HEADER).is_some());
        assert_eq!(resp.headers().get("server").unwrap(), "DocGate");

        let echo = json_of(resp).await;
        assert_eq!(echo["operation"], "update_document");
        assert_eq!(echo["database"], "songs");
        assert_eq!(echo["id"], "a b");
        assert_eq!(echo["body"], r#"{"x":1}"#);
    }

    #[tokio::test]
    async fn test_should_echo_inbound_correlation_id() {
        let svc = service(FailingHandler, DataHttpConfig::default());
        let mut req = request(http::Method::DELETE, "/songs/1", "");
        req.headers_mut()
            .insert(CORRELATION_ID_HEADER, http::HeaderValue::from_static("abc-123"));

        let resp = svc.handle(req).await;
        assert_eq!(resp.status(), http::StatusCode::CONFLICT);
        assert_eq!(resp.headers().get(CORRELATION_ID_HEADER).unwrap(), "abc-123");

        let body = json_of(resp).await;
        assert_eq!(body["error"], "document_conflict");
        assert_eq!(body["message"], "Document update conflict.");
        assert_eq!(body["correlationId"], "abc-123");
    }

    #[test]
    fn test_should_replace_unusable_correlation_id() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            CORRELATION_ID_HEADER,
            http::HeaderValue::from_static("has spaces"),
        );
        let generated = correlation_id(&headers);
        assert_ne!(generated, "has spaces");
        assert!(uuid::Uuid::parse_str(&generated).is_ok());

        let long = "x".repeat(MAX_CORRELATION_ID_LEN + 1);
        headers.insert(
            CORRELATION_ID_HEADER,
            http::HeaderValue::from_str(&long).unwrap(),
        );
        assert_ne!(correlation_id(&headers), long);
    }

    #[tokio::test]
    async fn test_should_answer_unknown_route_with_not_found() {
        let svc = service(EchoHandler, DataHttpConfig::default());
        let resp = svc.handle(request(http::Method::GET, "/a/b/c", "")).await;
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(json_of(resp).await["error"], "route_not_found");
    }

    #[tokio::test]
    async fn test_should_set_allow_header_on_wrong_method() {
        let svc = service(EchoHandler, DataHttpConfig::default());
        let resp = svc.handle(request(http::Method::POST, "/songs/1", "")).await;
        assert_eq!(resp.status(), http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            resp.headers().get(http::header::ALLOW).unwrap(),
            "GET, PUT, DELETE"
        );
    }

    #[tokio::test]
    async fn test_should_reject_oversized_body() {
        let config = DataHttpConfig {
            max_body_bytes: 4,
            ..DataHttpConfig::default()
        };
        let svc = service(EchoHandler, config);
        let resp = svc
            .handle(request(http::Method::POST, "/songs", r#"{"too":"long"}"#))
            .await;
        assert_eq!(resp.status(), http::StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_of(resp).await["error"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_should_time_out_slow_operations() {
        let config = DataHttpConfig {
            request_timeout: Some(Duration::from_millis(20)),
            ..DataHttpConfig::default()
        };
        let svc = service(FailingHandler, config);
        let resp = svc.handle(request(http::Method::GET, "/songs/1", "")).await;
        assert_eq!(resp.status(), http::StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(json_of(resp).await["error"], "gateway_timeout");
    }
}
